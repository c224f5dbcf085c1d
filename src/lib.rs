pub mod constants;
pub mod error;
pub mod types;

pub mod config;
pub mod logging;
pub mod metrics;

// Blocking ports and their adapters
pub mod app;
pub mod infra;

pub mod gateway;
pub mod parser;
pub mod pipeline;
pub mod tools;
