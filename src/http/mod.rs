//! HTTP request intake and response output.
//!
//! # Architecture
//!
//! - **`boundary`**: finds the blank line ending the header block, across read seams
//! - **`parser`**: byte-at-a-time state machine for the request line and headers
//! - **`request`**: per-connection request value and its chunked read lifecycle
//! - **`response`**: response representation and status codes
//! - **`writer`**: serializes and writes responses
//! - **`handler`**: application hook producing the response
//! - **`uri`**: path/query split, percent-decoding, query parameters
//! - **`connection`**: the per-connection state machine
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Chunked reads until "\r\n\r\n", then parse
//!        └──────┬──────┘
//!               │ Request parsed        (failure → Closed, no response)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Handler builds the response
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ▼
//!            Closed
//! ```

pub mod boundary;
pub mod connection;
pub mod handler;
pub mod parser;
pub mod request;
pub mod response;
pub mod uri;
pub mod writer;
