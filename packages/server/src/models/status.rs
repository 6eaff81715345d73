use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle of a replay job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplayStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ReplayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplayStatus::Pending => "PENDING",
            ReplayStatus::Running => "RUNNING",
            ReplayStatus::Completed => "COMPLETED",
            ReplayStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReplayStatus::Completed | ReplayStatus::Failed)
    }
}

impl fmt::Display for ReplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplayStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReplayStatus::Pending),
            "RUNNING" => Ok(ReplayStatus::Running),
            "COMPLETED" => Ok(ReplayStatus::Completed),
            "FAILED" => Ok(ReplayStatus::Failed),
            other => Err(format!("unknown replay status: {other}")),
        }
    }
}

/// Outcome of one replayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplayMessageStatus {
    Success,
    Failed,
}

impl ReplayMessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplayMessageStatus::Success => "SUCCESS",
            ReplayMessageStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ReplayMessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            ReplayStatus::Pending,
            ReplayStatus::Running,
            ReplayStatus::Completed,
            ReplayStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ReplayStatus>(), Ok(status));
        }
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(!ReplayStatus::Pending.is_terminal());
        assert!(!ReplayStatus::Running.is_terminal());
        assert!(ReplayStatus::Completed.is_terminal());
        assert!(ReplayStatus::Failed.is_terminal());
    }
}
