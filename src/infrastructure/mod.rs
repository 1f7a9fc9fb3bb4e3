// Infrastructure module - File access and logging
pub mod config;
pub mod logging;
