//! Identity and addressing types shared by every layer.

use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable identifier of a connected client.
///
/// Ids are handed out sequentially at join time and never reused within a
/// process. They travel on the wire as a single byte, and `0xFF` is
/// reserved as a sentinel ([`ClientId::SENTINEL`]), so a server can hold at
/// most [`ClientId::MAX_CLIENTS`] clients over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u8);

impl ClientId {
    /// Wire value used where a message needs an id slot but names nobody.
    pub const SENTINEL: ClientId = ClientId(u8::MAX);

    /// Number of distinct assignable ids (`0..=254`).
    pub const MAX_CLIENTS: usize = u8::MAX as usize;
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The role a client selects while staging.
///
/// A client is "ready" once it holds anything other than
/// [`Role::Unassigned`]. [`Role::Robber`] is exclusive: at most one client
/// may hold it at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Role {
    /// No role picked yet. Every client starts here.
    #[default]
    Unassigned = 0,
    /// The exclusive role.
    Robber = 1,
    /// The shared role.
    Cop = 2,
}

impl Role {
    /// Returns `true` if at most one client may hold this role.
    pub fn is_exclusive(self) -> bool {
        matches!(self, Self::Robber)
    }

    /// Returns `true` once a role has actually been chosen.
    pub fn is_ready(self) -> bool {
        !matches!(self, Self::Unassigned)
    }
}

impl TryFrom<u8> for Role {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(Self::Unassigned),
            1 => Ok(Self::Robber),
            2 => Ok(Self::Cop),
            other => Err(ProtocolError::InvalidRole(other)),
        }
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> u8 {
        role as u8
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unassigned => write!(f, "Unassigned"),
            Self::Robber => write!(f, "Robber"),
            Self::Cop => write!(f, "Cop"),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who an outbound frame is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every live client.
    All,
    /// Exactly one client.
    Client(ClientId),
    /// Every live client except the given one.
    AllExcept(ClientId),
}

impl Recipient {
    /// Returns `true` if a frame addressed this way reaches `id`.
    pub fn includes(self, id: ClientId) -> bool {
        match self {
            Self::All => true,
            Self::Client(target) => target == id,
            Self::AllExcept(excluded) => excluded != id,
        }
    }
}

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// The one-byte tag at the front of every frame payload.
///
/// Tags are assigned in declaration order and are part of the wire format;
/// new types are appended, never inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    PlayerConnect = 0,
    PlayerDisconnect = 1,
    VoteToStart = 2,
    VetoStart = 3,
    StartGame = 4,
    /// Reserved for the active phase.
    Input = 5,
    RoleChange = 6,
    RoleChangeRejection = 7,
    PlayerSync = 8,
}

impl MessageType {
    /// The wire tag for this type.
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Ok(match tag {
            0 => Self::PlayerConnect,
            1 => Self::PlayerDisconnect,
            2 => Self::VoteToStart,
            3 => Self::VetoStart,
            4 => Self::StartGame,
            5 => Self::Input,
            6 => Self::RoleChange,
            7 => Self::RoleChangeRejection,
            8 => Self::PlayerSync,
            other => return Err(ProtocolError::UnknownMessageType(other)),
        })
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_tags_are_stable() {
        assert_eq!(MessageType::PlayerConnect.tag(), 0);
        assert_eq!(MessageType::StartGame.tag(), 4);
        assert_eq!(MessageType::PlayerSync.tag(), 8);
        for tag in 0..=8u8 {
            let ty = MessageType::try_from(tag).unwrap();
            assert_eq!(ty.tag(), tag);
        }
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let err = MessageType::try_from(9).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownMessageType(9)));
    }

    #[test]
    fn test_role_bytes() {
        assert_eq!(Role::try_from(1).unwrap(), Role::Robber);
        assert_eq!(u8::from(Role::Cop), 2);
        assert!(matches!(
            Role::try_from(3),
            Err(ProtocolError::InvalidRole(3))
        ));
    }

    #[test]
    fn test_role_readiness_and_exclusivity() {
        assert!(!Role::Unassigned.is_ready());
        assert!(Role::Cop.is_ready());
        assert!(Role::Robber.is_exclusive());
        assert!(!Role::Cop.is_exclusive());
        assert_eq!(Role::default(), Role::Unassigned);
    }

    #[test]
    fn test_recipient_includes() {
        let a = ClientId(0);
        let b = ClientId(1);
        assert!(Recipient::All.includes(a));
        assert!(Recipient::Client(a).includes(a));
        assert!(!Recipient::Client(a).includes(b));
        assert!(!Recipient::AllExcept(a).includes(a));
        assert!(Recipient::AllExcept(a).includes(b));
    }

    #[test]
    fn test_client_id_display() {
        assert_eq!(ClientId(3).to_string(), "C-3");
    }
}
