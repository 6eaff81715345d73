use std::fmt;

use async_trait::async_trait;
use broker::{
    BrokerError, DlqMessage, HeaderCodec, MessageHeaders, PartitionBrowser, ReplayProducer,
};
use sea_orm::DbErr;
use tracing::{info, warn};

use crate::audit::JobAudit;
use crate::entity::{dlq_topic, replay_job};
use crate::models::status::{ReplayMessageStatus, ReplayStatus};

/// Read side of a replay: fetch the exact record to re-send.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn read_at(
        &self,
        topic: &str,
        partition: i32,
        offset: i64,
    ) -> Result<Option<DlqMessage>, BrokerError>;
}

/// Write side of a replay: deliver one message to a destination topic.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
        headers: &MessageHeaders,
    ) -> Result<(i32, i64), BrokerError>;
}

#[async_trait]
impl MessageSource for PartitionBrowser {
    async fn read_at(
        &self,
        topic: &str,
        partition: i32,
        offset: i64,
    ) -> Result<Option<DlqMessage>, BrokerError> {
        PartitionBrowser::read_at(self, topic, partition, offset).await
    }
}

#[async_trait]
impl MessageSink for ReplayProducer {
    async fn send(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
        headers: &MessageHeaders,
    ) -> Result<(i32, i64), BrokerError> {
        ReplayProducer::send(self, topic, key, payload, headers).await
    }
}

/// Why a single message could not be replayed.
#[derive(Debug)]
pub enum AttemptError {
    /// Nothing lives at the requested partition/offset.
    NotFound { partition: i32, offset: i64 },
    Broker(BrokerError),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::NotFound { partition, offset } => {
                write!(f, "No message at partition {partition}, offset {offset}")
            }
            AttemptError::Broker(e) => e.fmt(f),
        }
    }
}

/// Result of one replay attempt. A value, not an exception: bulk mode
/// records failures and moves on.
#[derive(Debug)]
pub enum AttemptOutcome {
    Delivered {
        message_key: Option<String>,
        dest_partition: i32,
        dest_offset: i64,
    },
    Failed {
        message_key: Option<String>,
        error: AttemptError,
    },
}

/// A finished single replay: the terminal job plus the failure, if any,
/// for the handler to surface.
pub struct SingleReplay {
    pub job: replay_job::Model,
    pub failure: Option<AttemptError>,
}

/// Drives replay jobs through PENDING -> RUNNING -> COMPLETED | FAILED,
/// recording every attempt in the audit ledger.
pub struct ReplayOrchestrator<'a> {
    audit: &'a dyn JobAudit,
    source: &'a dyn MessageSource,
    sink: &'a dyn MessageSink,
}

impl<'a> ReplayOrchestrator<'a> {
    pub fn new(
        audit: &'a dyn JobAudit,
        source: &'a dyn MessageSource,
        sink: &'a dyn MessageSink,
    ) -> Self {
        Self {
            audit,
            source,
            sink,
        }
    }

    /// Replay one message. The job goes FAILED on a read miss or send
    /// failure, with the attempt recorded either way.
    pub async fn replay_single(
        &self,
        topic: &dlq_topic::Model,
        partition: i32,
        offset: i64,
        initiated_by: &str,
    ) -> Result<SingleReplay, DbErr> {
        let job = self.audit.create_job(topic.id, initiated_by, 1).await?;
        let job = self.audit.mark_running(job).await?;

        let outcome = self.attempt(topic, partition, offset).await;
        match outcome {
            AttemptOutcome::Delivered {
                message_key,
                dest_partition,
                dest_offset,
            } => {
                self.audit
                    .record_message(
                        job.id,
                        message_key,
                        offset,
                        partition,
                        ReplayMessageStatus::Success,
                        None,
                    )
                    .await?;
                let job = self
                    .audit
                    .finish_job(job, 1, 0, ReplayStatus::Completed)
                    .await?;
                info!(
                    job_id = %job.id,
                    offset,
                    dest_partition,
                    dest_offset,
                    "single replay completed"
                );
                Ok(SingleReplay { job, failure: None })
            }
            AttemptOutcome::Failed { message_key, error } => {
                self.audit
                    .record_message(
                        job.id,
                        message_key,
                        offset,
                        partition,
                        ReplayMessageStatus::Failed,
                        Some(error.to_string()),
                    )
                    .await?;
                let job = self
                    .audit
                    .finish_job(job, 0, 1, ReplayStatus::Failed)
                    .await?;
                warn!(job_id = %job.id, offset, error = %error, "single replay failed");
                Ok(SingleReplay {
                    job,
                    failure: Some(error),
                })
            }
        }
    }

    /// Replay a batch sequentially. Per-message failures are recorded and
    /// suppressed; once every message has been attempted the job finishes
    /// COMPLETED, whatever the per-message results were.
    pub async fn replay_bulk(
        &self,
        topic: &dlq_topic::Model,
        messages: &[(i32, i64)],
        initiated_by: &str,
    ) -> Result<replay_job::Model, DbErr> {
        let job = self
            .audit
            .create_job(topic.id, initiated_by, messages.len() as i32)
            .await?;
        let job = self.audit.mark_running(job).await?;

        let mut succeeded = 0;
        let mut failed = 0;
        for &(partition, offset) in messages {
            match self.attempt(topic, partition, offset).await {
                AttemptOutcome::Delivered { message_key, .. } => {
                    succeeded += 1;
                    self.audit
                        .record_message(
                            job.id,
                            message_key,
                            offset,
                            partition,
                            ReplayMessageStatus::Success,
                            None,
                        )
                        .await?;
                }
                AttemptOutcome::Failed { message_key, error } => {
                    failed += 1;
                    warn!(job_id = %job.id, offset, error = %error, "bulk replay message failed");
                    self.audit
                        .record_message(
                            job.id,
                            message_key,
                            offset,
                            partition,
                            ReplayMessageStatus::Failed,
                            Some(error.to_string()),
                        )
                        .await?;
                }
            }
        }

        let job = self
            .audit
            .finish_job(job, succeeded, failed, ReplayStatus::Completed)
            .await?;
        info!(job_id = %job.id, succeeded, failed, "bulk replay finished");
        Ok(job)
    }

    async fn attempt(
        &self,
        topic: &dlq_topic::Model,
        partition: i32,
        offset: i64,
    ) -> AttemptOutcome {
        let message = match self
            .source
            .read_at(&topic.dlq_topic_name, partition, offset)
            .await
        {
            Ok(Some(message)) => message,
            Ok(None) => {
                return AttemptOutcome::Failed {
                    message_key: None,
                    error: AttemptError::NotFound { partition, offset },
                };
            }
            Err(e) => {
                return AttemptOutcome::Failed {
                    message_key: None,
                    error: AttemptError::Broker(e),
                };
            }
        };

        let headers = HeaderCodec::sanitize_for_replay(&message.headers);
        match self
            .sink
            .send(
                &topic.destination_topic,
                message.key.as_deref(),
                &message.payload,
                &headers,
            )
            .await
        {
            Ok((dest_partition, dest_offset)) => AttemptOutcome::Delivered {
                message_key: message.key,
                dest_partition,
                dest_offset,
            },
            Err(e) => AttemptOutcome::Failed {
                message_key: message.key,
                error: AttemptError::Broker(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use broker::message::headers;
    use chrono::Utc;
    use uuid::Uuid;

    struct MockAudit {
        records: Mutex<Vec<(ReplayMessageStatus, i64, Option<String>)>>,
        transitions: Mutex<Vec<String>>,
    }

    impl MockAudit {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                transitions: Mutex::new(Vec::new()),
            }
        }

        fn records(&self) -> Vec<(ReplayMessageStatus, i64, Option<String>)> {
            self.records.lock().unwrap().clone()
        }

        fn transitions(&self) -> Vec<String> {
            self.transitions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobAudit for MockAudit {
        async fn create_job(
            &self,
            dlq_topic_id: Uuid,
            initiated_by: &str,
            total_messages: i32,
        ) -> Result<replay_job::Model, DbErr> {
            self.transitions.lock().unwrap().push("PENDING".into());
            Ok(replay_job::Model {
                id: Uuid::new_v4(),
                dlq_topic_id,
                initiated_by: initiated_by.to_owned(),
                status: ReplayStatus::Pending.to_string(),
                total_messages,
                succeeded: 0,
                failed: 0,
                started_at: None,
                completed_at: None,
                created_at: Utc::now(),
            })
        }

        async fn mark_running(
            &self,
            mut job: replay_job::Model,
        ) -> Result<replay_job::Model, DbErr> {
            self.transitions.lock().unwrap().push("RUNNING".into());
            job.status = ReplayStatus::Running.to_string();
            job.started_at = Some(Utc::now());
            Ok(job)
        }

        async fn finish_job(
            &self,
            mut job: replay_job::Model,
            succeeded: i32,
            failed: i32,
            status: ReplayStatus,
        ) -> Result<replay_job::Model, DbErr> {
            self.transitions.lock().unwrap().push(status.to_string());
            job.status = status.to_string();
            job.succeeded = succeeded;
            job.failed = failed;
            job.completed_at = Some(Utc::now());
            Ok(job)
        }

        async fn record_message(
            &self,
            _replay_job_id: Uuid,
            _message_key: Option<String>,
            dlq_offset: i64,
            _dlq_partition: i32,
            status: ReplayMessageStatus,
            error_message: Option<String>,
        ) -> Result<(), DbErr> {
            self.records
                .lock()
                .unwrap()
                .push((status, dlq_offset, error_message));
            Ok(())
        }
    }

    struct MapSource {
        messages: HashMap<(i32, i64), DlqMessage>,
    }

    #[async_trait]
    impl MessageSource for MapSource {
        async fn read_at(
            &self,
            _topic: &str,
            partition: i32,
            offset: i64,
        ) -> Result<Option<DlqMessage>, BrokerError> {
            Ok(self.messages.get(&(partition, offset)).cloned())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(String, Option<String>, MessageHeaders)>>,
        timeout: bool,
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn send(
            &self,
            topic: &str,
            key: Option<&str>,
            _payload: &[u8],
            msg_headers: &MessageHeaders,
        ) -> Result<(i32, i64), BrokerError> {
            if self.timeout {
                return Err(BrokerError::SendTimeout(Duration::from_secs(30)));
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push((topic.to_owned(), key.map(str::to_owned), msg_headers.clone()));
            Ok((0, sent.len() as i64 - 1))
        }
    }

    fn topic() -> dlq_topic::Model {
        let now = Utc::now();
        dlq_topic::Model {
            id: Uuid::new_v4(),
            dlq_topic_name: "orders-dlq".into(),
            destination_topic: "orders".into(),
            description: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn dlq_message(offset: i64) -> DlqMessage {
        let mut h = MessageHeaders::new();
        h.insert(headers::ERROR_MESSAGE, "Timeout");
        h.insert("correlation-id", "corr-1");
        DlqMessage {
            key: Some(format!("KEY-{offset}")),
            payload: b"{}".to_vec(),
            partition: 0,
            offset,
            timestamp_ms: None,
            headers: h,
        }
    }

    fn source_with(offsets: &[i64]) -> MapSource {
        MapSource {
            messages: offsets
                .iter()
                .map(|&o| ((0, o), dlq_message(o)))
                .collect(),
        }
    }

    #[tokio::test]
    async fn single_replay_walks_the_full_state_machine() {
        let audit = MockAudit::new();
        let source = source_with(&[42]);
        let sink = RecordingSink::default();
        let orchestrator = ReplayOrchestrator::new(&audit, &source, &sink);

        let result = orchestrator
            .replay_single(&topic(), 0, 42, "alice")
            .await
            .unwrap();

        assert!(result.failure.is_none());
        assert_eq!(result.job.status, "COMPLETED");
        assert_eq!((result.job.succeeded, result.job.failed), (1, 0));
        assert!(result.job.completed_at.is_some());
        assert_eq!(audit.transitions(), vec!["PENDING", "RUNNING", "COMPLETED"]);
    }

    #[tokio::test]
    async fn single_replay_read_miss_fails_the_job_and_records_it() {
        let audit = MockAudit::new();
        let source = source_with(&[]);
        let sink = RecordingSink::default();
        let orchestrator = ReplayOrchestrator::new(&audit, &source, &sink);

        let result = orchestrator
            .replay_single(&topic(), 0, 99, "alice")
            .await
            .unwrap();

        assert!(matches!(
            result.failure,
            Some(AttemptError::NotFound { offset: 99, .. })
        ));
        assert_eq!(result.job.status, "FAILED");
        assert_eq!((result.job.succeeded, result.job.failed), (0, 1));

        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, ReplayMessageStatus::Failed);
        assert!(records[0].2.as_deref().unwrap().contains("offset 99"));
    }

    #[tokio::test]
    async fn single_replay_send_timeout_fails_the_job() {
        let audit = MockAudit::new();
        let source = source_with(&[42]);
        let sink = RecordingSink {
            timeout: true,
            ..Default::default()
        };
        let orchestrator = ReplayOrchestrator::new(&audit, &source, &sink);

        let result = orchestrator
            .replay_single(&topic(), 0, 42, "alice")
            .await
            .unwrap();

        assert!(matches!(result.failure, Some(AttemptError::Broker(_))));
        assert_eq!(result.job.status, "FAILED");
        let records = audit.records();
        assert!(records[0].2.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn bulk_replay_suppresses_per_message_failures() {
        let audit = MockAudit::new();
        let source = source_with(&[1, 3]);
        let sink = RecordingSink::default();
        let orchestrator = ReplayOrchestrator::new(&audit, &source, &sink);

        let job = orchestrator
            .replay_bulk(&topic(), &[(0, 1), (0, 2), (0, 3)], "system")
            .await
            .unwrap();

        assert_eq!(job.status, "COMPLETED");
        assert_eq!(job.total_messages, 3);
        assert_eq!((job.succeeded, job.failed), (2, 1));
        assert_eq!(job.succeeded + job.failed, job.total_messages);

        let records = audit.records();
        assert_eq!(records.len(), 3);
        // Attempt order is preserved in the ledger.
        assert_eq!(
            records.iter().map(|r| r.1).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(records[1].0, ReplayMessageStatus::Failed);
    }

    #[tokio::test]
    async fn bulk_replay_of_all_misses_still_completes() {
        let audit = MockAudit::new();
        let source = source_with(&[]);
        let sink = RecordingSink::default();
        let orchestrator = ReplayOrchestrator::new(&audit, &source, &sink);

        let job = orchestrator
            .replay_bulk(&topic(), &[(0, 10), (0, 11)], "system")
            .await
            .unwrap();

        assert_eq!(job.status, "COMPLETED");
        assert_eq!((job.succeeded, job.failed), (0, 2));
        assert_eq!(audit.transitions(), vec!["PENDING", "RUNNING", "COMPLETED"]);
    }

    #[tokio::test]
    async fn replay_sends_sanitized_headers_to_the_destination() {
        let audit = MockAudit::new();
        let source = source_with(&[42]);
        let sink = RecordingSink::default();
        let orchestrator = ReplayOrchestrator::new(&audit, &source, &sink);

        orchestrator
            .replay_single(&topic(), 0, 42, "alice")
            .await
            .unwrap();

        let sent = sink.sent.lock().unwrap();
        let (dest, key, sent_headers) = &sent[0];
        assert_eq!(dest, "orders");
        assert_eq!(key.as_deref(), Some("KEY-42"));
        assert!(!sent_headers.contains_key(headers::ERROR_MESSAGE));
        assert_eq!(sent_headers.get("correlation-id"), Some("corr-1"));
        assert!(sent_headers.contains_key(headers::REPLAYED_AT));
    }
}
