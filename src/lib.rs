pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod extract;
pub mod idempotency;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod storage;
pub mod tasks;
pub mod types;
pub mod vendors;

// Collaborator ports and their adapters
pub mod app;
pub mod infra;
