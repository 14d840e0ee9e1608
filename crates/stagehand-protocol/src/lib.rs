//! Wire protocol for Stagehand.
//!
//! This crate defines the bytes that clients and the server exchange:
//!
//! - **Frames** ([`Frame`], [`read_frame`], [`write_frame`]): the
//!   one-byte length prefix and the short-read/short-write loops.
//! - **Types** ([`MessageType`], [`ClientId`], [`Role`], [`Recipient`]):
//!   tags and identities shared by every layer.
//! - **Messages** ([`Message`]): typed server broadcasts.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (streams) → Protocol (frames) → Session (per-client queues)
//! ```

mod error;
mod frame;
mod message;
mod types;

pub use error::ProtocolError;
pub use frame::{Frame, MAX_PAYLOAD_LEN, read_frame, write_frame};
pub use message::{Message, intent, parse_role_request, role_request};
pub use types::{ClientId, MessageType, Recipient, Role};
