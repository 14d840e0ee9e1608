//! Top-level session phase.

use std::fmt;

/// The session's mode.
///
/// ```text
/// Staging ──(countdown elapsed)──→ Active
/// ```
///
/// The only transition is Staging → Active. It happens at most once per
/// process and is never reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Pre-game negotiation: joins, roles, start votes.
    #[default]
    Staging,
    /// Gameplay in progress.
    Active,
}

impl Phase {
    /// The phase that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Staging => Some(Self::Active),
            Self::Active => None,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Staging => write!(f, "Staging"),
            Self::Active => write!(f, "Active"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_only_moves_forward() {
        assert_eq!(Phase::Staging.next(), Some(Phase::Active));
        assert_eq!(Phase::Active.next(), None);
        assert_eq!(Phase::default(), Phase::Staging);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Staging.to_string(), "Staging");
        assert_eq!(Phase::Active.to_string(), "Active");
    }
}
