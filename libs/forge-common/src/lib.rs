pub mod config;
pub mod error;
pub mod evaluator;
pub mod redis;
pub mod stats;
pub mod store;
pub mod types;
pub mod validation;
