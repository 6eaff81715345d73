pub mod admin;
pub mod analyzer;
pub mod browser;
pub mod config;
pub mod error;
pub mod message;
pub mod producer;

pub use admin::ClusterAdmin;
pub use analyzer::{ErrorAnalyzer, ErrorBreakdownEntry};
pub use browser::PartitionBrowser;
pub use config::BrokerConfig;
pub use error::BrokerError;
pub use message::{DlqMessage, HeaderCodec, MessageHeaders};
pub use producer::ReplayProducer;
