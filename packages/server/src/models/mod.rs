pub mod browse;
pub mod replay;
pub mod status;
pub mod topic;
