//! forkhttp - process-per-connection HTTP/1.1 server
//!
//! Incremental request-head parsing over chunked socket reads, with
//! pluggable connection dispatch (fork, thread, event).

pub mod buffer;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod server;
pub mod table;

pub use error::Error;
