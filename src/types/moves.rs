//! Opaque encoded move as stored in the transposition table.

use std::fmt;
use std::num::NonZeroU32;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A move in the rules engine's own 32-bit encoding.
///
/// The core never interprets the bits. Zero is reserved for "no move",
/// so `Option<Move>` packs into the same 32 bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Move(NonZeroU32);

impl Move {
    /// Wrap a raw encoded move. Returns `None` for the reserved value 0.
    #[inline]
    #[must_use]
    pub const fn from_u32(raw: u32) -> Option<Move> {
        match NonZeroU32::new(raw) {
            Some(v) => Some(Move(v)),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.as_u32())
    }
}
