//! Core StatsScout library (stream decoding, chat state, backend client, config).

pub mod chat;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod logging;
pub mod poller;
pub mod stream;
pub mod types;
