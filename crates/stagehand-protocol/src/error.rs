//! Error types for the protocol layer.
//!
//! Each crate in Stagehand defines its own error enum. A `ProtocolError`
//! always means the problem is in framing or message layout, never in
//! session bookkeeping or socket setup.

use crate::MessageType;

/// Errors that can occur while framing, encoding, or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A frame header announced a zero-length payload.
    ///
    /// Every valid frame carries at least the message-type tag, so this
    /// is a protocol violation and is fatal for the connection.
    #[error("zero-length frame header")]
    ZeroLengthFrame,

    /// The payload does not fit in a one-byte length prefix.
    #[error("payload of {0} bytes exceeds the 255-byte frame limit")]
    PayloadTooLarge(usize),

    /// A frame was built from an empty payload.
    #[error("frame payload is empty")]
    EmptyPayload,

    /// The type tag does not name any known message.
    #[error("unknown message type tag {0}")]
    UnknownMessageType(u8),

    /// The body does not have the layout its type tag requires.
    #[error("malformed {kind} message: {reason}")]
    Malformed {
        kind: MessageType,
        reason: &'static str,
    },

    /// A role byte outside the known role set.
    #[error("invalid role byte {0}")]
    InvalidRole(u8),

    /// The underlying stream reported an error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream accepted zero bytes of a pending write.
    #[error("stream accepted zero bytes")]
    WriteZero,
}
