//! Typed server-to-client messages.
//!
//! [`Message`] is what the staging state machine produces. It converts to a
//! [`Frame`] for the wire and can be parsed back, which the integration tests
//! and client tooling rely on. Client-to-server intents are small enough
//! that the handlers read their bodies directly; see [`parse_role_request`].

use crate::{ClientId, Frame, MAX_PAYLOAD_LEN, MessageType, ProtocolError, Role};

/// A message sent by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A new client joined.
    PlayerConnect { id: ClientId },
    /// A client left the session.
    PlayerDisconnect { id: ClientId },
    /// `id` voted to start; the countdown is running.
    VoteToStart { id: ClientId },
    /// `id` vetoed the start; the countdown is cancelled.
    VetoStart { id: ClientId },
    /// The countdown elapsed and the session is now active.
    StartGame,
    /// `id` now holds `role`.
    RoleChange { id: ClientId, role: Role },
    /// The exclusive role is taken by `holder`.
    RoleChangeRejection { holder: ClientId },
    /// Sent to a joining client: its own id plus everyone already present.
    PlayerSync {
        new_id: ClientId,
        roster: Vec<(ClientId, Role)>,
    },
}

impl Message {
    /// Most roster entries a single `PlayerSync` frame can carry: the tag
    /// and the new id take two bytes, each entry two more.
    pub const MAX_SYNC_ROSTER: usize = (MAX_PAYLOAD_LEN - 2) / 2;

    /// The type tag this message is sent with.
    pub fn kind(&self) -> MessageType {
        match self {
            Self::PlayerConnect { .. } => MessageType::PlayerConnect,
            Self::PlayerDisconnect { .. } => MessageType::PlayerDisconnect,
            Self::VoteToStart { .. } => MessageType::VoteToStart,
            Self::VetoStart { .. } => MessageType::VetoStart,
            Self::StartGame => MessageType::StartGame,
            Self::RoleChange { .. } => MessageType::RoleChange,
            Self::RoleChangeRejection { .. } => MessageType::RoleChangeRejection,
            Self::PlayerSync { .. } => MessageType::PlayerSync,
        }
    }

    /// Encodes the message into a frame.
    ///
    /// # Errors
    /// [`ProtocolError::PayloadTooLarge`] if a `PlayerSync` roster is too
    /// long for one frame.
    pub fn to_frame(&self) -> Result<Frame, ProtocolError> {
        let body = match self {
            Self::PlayerConnect { id }
            | Self::PlayerDisconnect { id }
            | Self::VoteToStart { id }
            | Self::VetoStart { id } => vec![id.0],
            Self::StartGame => vec![ClientId::SENTINEL.0],
            Self::RoleChange { id, role } => vec![id.0, u8::from(*role)],
            Self::RoleChangeRejection { holder } => vec![holder.0],
            Self::PlayerSync { new_id, roster } => {
                let mut body = Vec::with_capacity(1 + roster.len() * 2);
                body.push(new_id.0);
                for (id, role) in roster {
                    body.push(id.0);
                    body.push(u8::from(*role));
                }
                body
            }
        };
        Frame::encode(self.kind(), &body)
    }

    /// Parses a server frame back into a message.
    ///
    /// # Errors
    /// - [`ProtocolError::UnknownMessageType`] for tags outside
    ///   [`MessageType`].
    /// - [`ProtocolError::Malformed`] if the body has the wrong shape, or
    ///   the tag is not a server message.
    pub fn from_frame(frame: &Frame) -> Result<Self, ProtocolError> {
        let kind = MessageType::try_from(frame.tag())?;
        let body = frame.body();
        let malformed = |reason| ProtocolError::Malformed { kind, reason };

        let single_id = || match body {
            [id] => Ok(ClientId(*id)),
            _ => Err(malformed("expected exactly one id byte")),
        };

        Ok(match kind {
            MessageType::PlayerConnect => Self::PlayerConnect { id: single_id()? },
            MessageType::PlayerDisconnect => Self::PlayerDisconnect { id: single_id()? },
            MessageType::VoteToStart => Self::VoteToStart { id: single_id()? },
            MessageType::VetoStart => Self::VetoStart { id: single_id()? },
            MessageType::StartGame => {
                if single_id()? != ClientId::SENTINEL {
                    return Err(malformed("missing start sentinel"));
                }
                Self::StartGame
            }
            MessageType::RoleChange => match body {
                [id, role] => Self::RoleChange {
                    id: ClientId(*id),
                    role: Role::try_from(*role)?,
                },
                _ => return Err(malformed("expected id and role")),
            },
            MessageType::RoleChangeRejection => Self::RoleChangeRejection {
                holder: single_id()?,
            },
            MessageType::PlayerSync => {
                let Some((new_id, pairs)) = body.split_first() else {
                    return Err(malformed("missing new id"));
                };
                if pairs.len() % 2 != 0 {
                    return Err(malformed("roster has a dangling byte"));
                }
                let roster = pairs
                    .chunks_exact(2)
                    .map(|pair| -> Result<(ClientId, Role), ProtocolError> {
                        Ok((ClientId(pair[0]), Role::try_from(pair[1])?))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Self::PlayerSync {
                    new_id: ClientId(*new_id),
                    roster,
                }
            }
            MessageType::Input => return Err(malformed("not a server message")),
        })
    }
}

/// Reads the requested role from a client's `RoleChange` body (`[role]`).
pub fn parse_role_request(body: &[u8]) -> Result<Role, ProtocolError> {
    match body {
        [role] => Role::try_from(*role),
        _ => Err(ProtocolError::Malformed {
            kind: MessageType::RoleChange,
            reason: "expected exactly one role byte",
        }),
    }
}

/// Builds the frame a client sends to request `role`.
pub fn role_request(role: Role) -> Frame {
    Frame::encode(MessageType::RoleChange, &[u8::from(role)])
        .expect("two-byte frame fits")
}

/// Builds a body-less client intent such as `VoteToStart` or `VetoStart`.
pub fn intent(kind: MessageType) -> Frame {
    Frame::encode(kind, &[]).expect("one-byte frame fits")
}
