pub mod dlq_topic;
pub mod replay_job;
pub mod replay_message;
