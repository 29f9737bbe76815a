//! Local system status monitor: an interactive console and an HTTP endpoint
//! serving the same on-demand CPU, memory, and disk snapshot.

pub mod config;
pub mod console;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod server;
pub mod system;
