pub mod agents;
pub mod analyze;
pub mod config;
pub mod fallback;
pub mod generate;
pub mod init;
pub mod resolve;
