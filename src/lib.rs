pub mod agents;
pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod exit;
pub mod perf;
pub mod reporting;
pub mod retry;
pub mod rules;
pub mod source;
pub mod types;
pub mod workflow;
