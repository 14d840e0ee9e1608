//! Unified error type for Stagehand.

use stagehand_game::GameError;
use stagehand_protocol::ProtocolError;
use stagehand_session::SessionError;
use stagehand_transport::TransportError;

use crate::ConfigError;

/// Top-level error wrapping every layer's error.
///
/// Each variant has a `#[from]` impl, so `?` converts layer errors without
/// ceremony.
#[derive(Debug, thiserror::Error)]
pub enum StagehandError {
    /// Binding or accepting failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Framing or message encoding failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Client registration failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A staging or gameplay event failed.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The configuration could not be loaded or is out of range.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
