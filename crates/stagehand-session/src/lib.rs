//! Connection pumps and client bookkeeping for Stagehand.
//!
//! This crate sits between raw streams and the session state machine:
//!
//! 1. **Connection pump** ([`Connection`]): per-socket receiver and
//!    sender tasks feeding lock-free queues.
//! 2. **Clients** ([`Client`]): stable id, owned connection, staging role.
//! 3. **Registry** ([`SessionRegistry`]): ordered roster with broadcast
//!    and non-blocking inbound draining.
//!
//! ```text
//! Game layer (above)   ← reads roles, queues broadcasts, drains intents
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol layer (below) ← frames, ids, roles
//! ```

mod client;
mod connection;
mod error;
mod registry;

pub use client::Client;
pub use connection::Connection;
pub use error::SessionError;
pub use registry::SessionRegistry;
