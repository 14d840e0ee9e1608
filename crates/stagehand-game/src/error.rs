//! Error types for the game layer.

use stagehand_protocol::ProtocolError;
use stagehand_session::SessionError;

/// Errors raised while handling one message or event.
///
/// None of these are fatal to the session: the tick loop logs them and
/// discards the message that caused them.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The message body could not be parsed, or a reply could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The message named a client the registry does not know.
    #[error(transparent)]
    Session(#[from] SessionError),
}
