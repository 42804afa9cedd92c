use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two sides of a match.
///
/// Role assignment happens at matchmaking time: the first client of a pair
/// becomes `A`, the second `B`. The id is stable for the whole match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerId {
    A,
    B,
}

impl PlayerId {
    /// Both players, in role order.
    pub const BOTH: [PlayerId; 2] = [PlayerId::A, PlayerId::B];

    /// The other side of the match.
    #[inline]
    pub fn opponent(self) -> Self {
        match self {
            PlayerId::A => PlayerId::B,
            PlayerId::B => PlayerId::A,
        }
    }

    /// Dense index for per-player arrays (`A` = 0, `B` = 1).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            PlayerId::A => 0,
            PlayerId::B => 1,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerId::A => f.write_str("A"),
            PlayerId::B => f.write_str("B"),
        }
    }
}
