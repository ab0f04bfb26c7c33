//! Three-position policy lever with lockable extremes.
//!
//! A lever only knows its position and which ends are locked. What a
//! position *means* is decided by [`crate::outcome`].

use serde::{Deserialize, Serialize};

/// Ordinal lever position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LeverPosition {
    /// Reduced setting.
    Low,
    /// Standard setting.
    #[default]
    Mid,
    /// Increased setting.
    High,
}

impl LeverPosition {
    pub const ALL: [LeverPosition; 3] = [LeverPosition::Low, LeverPosition::Mid, LeverPosition::High];
}

/// Rejected lever move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeverError {
    /// The requested extreme is locked; the lever now sits at `Mid`.
    Locked { requested: LeverPosition },
}

impl std::fmt::Display for LeverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeverError::Locked { requested } => {
                write!(f, "lever position {:?} is locked", requested)
            }
        }
    }
}

impl std::error::Error for LeverError {}

/// A single lever.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyLever {
    position: LeverPosition,
    low_locked: bool,
    high_locked: bool,
}

impl PolicyLever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> LeverPosition {
        self.position
    }

    pub fn is_locked(&self, position: LeverPosition) -> bool {
        match position {
            LeverPosition::Low => self.low_locked,
            LeverPosition::Mid => false,
            LeverPosition::High => self.high_locked,
        }
    }

    /// Move the lever. Returns whether the position changed.
    ///
    /// Asking for a locked extreme snaps the lever back to `Mid` and
    /// reports [`LeverError::Locked`].
    pub fn set(&mut self, position: LeverPosition) -> Result<bool, LeverError> {
        if self.is_locked(position) {
            self.position = LeverPosition::Mid;
            return Err(LeverError::Locked {
                requested: position,
            });
        }
        let changed = self.position != position;
        self.position = position;
        Ok(changed)
    }

    /// Lock or unlock one extreme. Returns `true` when locking forced the
    /// lever off that extreme (the change notification).
    pub fn set_locked(&mut self, extreme: LeverPosition, locked: bool) -> bool {
        match extreme {
            LeverPosition::Low => self.low_locked = locked,
            LeverPosition::High => self.high_locked = locked,
            LeverPosition::Mid => return false,
        }
        if locked && self.position == extreme {
            self.position = LeverPosition::Mid;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_mid() {
        let lever = PolicyLever::new();
        assert_eq!(lever.position(), LeverPosition::Mid);
        assert!(!lever.is_locked(LeverPosition::Low));
        assert!(!lever.is_locked(LeverPosition::High));
    }

    #[test]
    fn set_reports_change() {
        let mut lever = PolicyLever::new();
        assert_eq!(lever.set(LeverPosition::High), Ok(true));
        assert_eq!(lever.set(LeverPosition::High), Ok(false));
        assert_eq!(lever.position(), LeverPosition::High);
    }

    #[test]
    fn locked_extreme_snaps_to_mid() {
        let mut lever = PolicyLever::new();
        lever.set(LeverPosition::Low).unwrap();
        lever.set_locked(LeverPosition::High, true);

        let err = lever.set(LeverPosition::High).unwrap_err();
        assert_eq!(
            err,
            LeverError::Locked {
                requested: LeverPosition::High
            }
        );
        assert_eq!(lever.position(), LeverPosition::Mid);
    }

    #[test]
    fn locking_current_extreme_forces_mid() {
        let mut lever = PolicyLever::new();
        lever.set(LeverPosition::High).unwrap();
        assert!(lever.set_locked(LeverPosition::High, true));
        assert_eq!(lever.position(), LeverPosition::Mid);

        lever.set(LeverPosition::Low).unwrap();
        assert!(lever.set_locked(LeverPosition::Low, true));
        assert_eq!(lever.position(), LeverPosition::Mid);
    }

    #[test]
    fn locking_other_extreme_is_silent() {
        let mut lever = PolicyLever::new();
        lever.set(LeverPosition::Low).unwrap();
        assert!(!lever.set_locked(LeverPosition::High, true));
        assert_eq!(lever.position(), LeverPosition::Low);
    }

    #[test]
    fn unlock_allows_extreme_again() {
        let mut lever = PolicyLever::new();
        lever.set_locked(LeverPosition::Low, true);
        assert!(lever.set(LeverPosition::Low).is_err());
        lever.set_locked(LeverPosition::Low, false);
        assert_eq!(lever.set(LeverPosition::Low), Ok(true));
    }

    #[test]
    fn mid_cannot_be_locked() {
        let mut lever = PolicyLever::new();
        assert!(!lever.set_locked(LeverPosition::Mid, true));
        assert!(!lever.is_locked(LeverPosition::Mid));
    }
}
