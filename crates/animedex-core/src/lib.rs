pub mod browse;
pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod favorites;
pub mod kv;
pub mod models;
pub mod stats;
pub mod watch_status;
