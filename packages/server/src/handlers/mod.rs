pub mod browse;
pub mod replay;
pub mod topics;
