//! Two-player score states.
//!
//! States are always expressed from player 1's point of view:
//! `p1` is the player choosing a threshold, `p2` is the opponent.

use std::fmt;
use std::str::FromStr;

/// Width of a score bucket on the standard grid.
pub const SCORE_STEP: u32 = 10;

/// Highest score bucket on the standard grid.
pub const MAX_SCORE_STEP: u32 = 190;

/// Round a running total down to the nearest multiple of 10, capped at 190.
///
/// Idempotent and monotonic non-decreasing.
#[inline]
pub fn round_to_10(score: u32) -> u32 {
    ((score / SCORE_STEP) * SCORE_STEP).min(MAX_SCORE_STEP)
}

/// A `(p1, p2)` score pair used as a strategy table key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameState {
    /// Score of the player choosing a threshold.
    pub p1: u32,
    /// Score of the opponent.
    pub p2: u32,
}

impl GameState {
    /// Create a state from two scores.
    #[inline]
    pub const fn new(p1: u32, p2: u32) -> Self {
        Self { p1, p2 }
    }

    /// The same position seen from the opponent's seat.
    #[inline]
    pub fn mirrored(&self) -> Self {
        Self::new(self.p2, self.p1)
    }

    /// Combined score, the ordering key for backwards induction.
    #[inline]
    pub fn sum(&self) -> u32 {
        self.p1 + self.p2
    }

    /// Stable string key (`"p1,p2"`) used in persisted tables.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.p1, self.p2)
    }
}

/// A state key that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStateError(pub String);

impl fmt::Display for ParseStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid state key {:?}, expected \"p1,p2\"", self.0)
    }
}

impl std::error::Error for ParseStateError {}

impl FromStr for GameState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseStateError(s.to_string());
        let (p1, p2) = s.split_once(',').ok_or_else(err)?;
        let p1 = p1.trim().parse().map_err(|_| err())?;
        let p2 = p2.trim().parse().map_err(|_| err())?;
        Ok(Self::new(p1, p2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_10_properties() {
        let mut previous = 0;
        for s in 0..1000 {
            let r = round_to_10(s);
            assert_eq!(round_to_10(r), r);
            assert!(r >= previous);
            assert!(r <= 190);
            assert_eq!(r % 10, 0);
            previous = r;
        }
        assert_eq!(round_to_10(u32::MAX), 190);
    }

    #[test]
    fn test_key_encoding() {
        let state = GameState::new(120, 40);
        assert_eq!(state.key(), "120,40");
        assert_eq!("120,40".parse::<GameState>(), Ok(state));
        assert_eq!(" 7 , 3 ".parse::<GameState>(), Ok(GameState::new(7, 3)));

        assert!("120".parse::<GameState>().is_err());
        assert!("a,b".parse::<GameState>().is_err());
        assert!("1,2,3".parse::<GameState>().is_err());
        assert!("-10,0".parse::<GameState>().is_err());
    }

    #[test]
    fn test_mirrored() {
        let state = GameState::new(30, 170);
        assert_eq!(state.mirrored(), GameState::new(170, 30));
        assert_eq!(state.mirrored().mirrored(), state);
        assert_eq!(state.sum(), 200);
    }
}
