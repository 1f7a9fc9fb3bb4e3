// Domain module - Configuration store and error types
pub mod config;
pub mod error;
