use std::fmt;

use serde::{Serialize, Serializer};

/// A binary choice on one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::IsVariant)]
pub enum Action {
    /// Left response, coded `0`.
    Left,
    /// Right response, coded `1`.
    Right,
}

impl Action {
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    /// Decodes the numeric action code used in behavior exports.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Left),
            1 => Some(Self::Right),
            _ => None,
        }
    }

    /// Decodes a response side label (`"left"` / `"right"`).
    #[must_use]
    pub fn from_side(side: &str) -> Option<Self> {
        match side {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// Column index of this action in a Q-table row.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    #[must_use]
    pub const fn side(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Binarized liking rating of the stimulus shown on a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::IsVariant)]
pub enum LikingBin {
    /// Coded `0`.
    Dislike,
    /// Coded `1`.
    Like,
}

impl LikingBin {
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Dislike),
            1 => Some(Self::Like),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Dislike => 0,
            Self::Like => 1,
        }
    }
}

impl fmt::Display for LikingBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.code(), f)
    }
}

impl Serialize for LikingBin {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.code())
    }
}

/// One cleaned behavioral trial.
///
/// `state_id` and `action` stay optional here because the upstream export may
/// leave them blank; [`TrialSequence`](crate::TrialSequence) decides what to
/// do with such trials.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub participant_id: String,
    pub round: u32,
    /// 1-based position of the trial within its round.
    pub trial_index: u32,
    pub state_id: Option<u32>,
    pub action: Option<Action>,
    /// Feedback received, `0.0` or `1.0`.
    pub reward: f64,
    pub difficulty: String,
    pub liking_bin: Option<LikingBin>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_codes() {
        assert_eq!(Action::from_code(0), Some(Action::Left));
        assert_eq!(Action::from_code(1), Some(Action::Right));
        assert_eq!(Action::from_code(2), None);
        for action in Action::ALL {
            assert_eq!(Action::from_side(action.side()), Some(action));
        }
        assert_eq!(Action::from_side("up"), None);
    }

    #[test]
    fn test_liking_bin_order_and_display() {
        assert!(LikingBin::Dislike < LikingBin::Like);
        assert!(None < Some(LikingBin::Dislike));
        assert_eq!(LikingBin::Like.to_string(), "1");
        assert_eq!(LikingBin::from_code(7), None);
    }
}
