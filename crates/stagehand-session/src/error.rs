//! Error types for the session layer.

use stagehand_protocol::ClientId;

/// Errors that can occur while registering or addressing clients.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Every assignable one-byte id has been handed out.
    ///
    /// Ids are never reused, so this is permanent for the process.
    #[error("client ids exhausted")]
    IdsExhausted,

    /// No client with this id is registered.
    #[error("client {0} not found")]
    UnknownClient(ClientId),
}
