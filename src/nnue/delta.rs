//! Feature changes produced by a single board mutation.
//!
//! The board layer describes each make/unmake as the pieces that left or
//! entered a square; the evaluation context replays them as remove/add
//! calls. One change per piece whose feature set changed, never more.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{Color, Piece, Square};

/// Maximum feature changes of one move (castling touches four).
pub const MAX_CHANGES: usize = 4;

/// A piece of some color standing on some square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    pub piece: Piece,
    pub square: Square,
    pub color: Color,
}

impl Placement {
    #[must_use]
    pub const fn new(piece: Piece, square: Square, color: Color) -> Self {
        Self {
            piece,
            square,
            color,
        }
    }
}

impl From<(Piece, Square, Color)> for Placement {
    fn from((piece, square, color): (Piece, Square, Color)) -> Self {
        Self::new(piece, square, color)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FeatureChange {
    Add(Placement),
    Remove(Placement),
}

impl FeatureChange {
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            FeatureChange::Add(p) => FeatureChange::Remove(p),
            FeatureChange::Remove(p) => FeatureChange::Add(p),
        }
    }
}

/// Feature changes for one move, in application order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FeatureDelta {
    changes: [Option<FeatureChange>; MAX_CHANGES],
    len: usize,
}

impl FeatureDelta {
    /// Append a change. Changes beyond [`MAX_CHANGES`] are a caller bug.
    pub fn push(&mut self, change: FeatureChange) {
        debug_assert!(self.len < MAX_CHANGES, "feature delta overflow");
        if let Some(slot) = self.changes.get_mut(self.len) {
            *slot = Some(change);
            self.len += 1;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = FeatureChange> + '_ {
        self.changes[..self.len].iter().flatten().copied()
    }

    fn from_changes(changes: &[FeatureChange]) -> Self {
        let mut delta = Self::default();
        for &change in changes {
            delta.push(change);
        }
        delta
    }

    /// Non-capturing move of a single piece.
    #[must_use]
    pub fn quiet(piece: Piece, color: Color, from: Square, to: Square) -> Self {
        Self::from_changes(&[
            FeatureChange::Remove(Placement::new(piece, from, color)),
            FeatureChange::Add(Placement::new(piece, to, color)),
        ])
    }

    /// `piece` moves onto `to`, removing the enemy `captured` standing there.
    #[must_use]
    pub fn capture(piece: Piece, color: Color, from: Square, to: Square, captured: Piece) -> Self {
        Self::from_changes(&[
            FeatureChange::Remove(Placement::new(captured, to, color.opponent())),
            FeatureChange::Remove(Placement::new(piece, from, color)),
            FeatureChange::Add(Placement::new(piece, to, color)),
        ])
    }

    /// Pawn advances to the last rank and becomes `promoted`.
    #[must_use]
    pub fn promotion(color: Color, from: Square, to: Square, promoted: Piece) -> Self {
        Self::from_changes(&[
            FeatureChange::Remove(Placement::new(Piece::Pawn, from, color)),
            FeatureChange::Add(Placement::new(promoted, to, color)),
        ])
    }

    #[must_use]
    pub fn capture_promotion(
        color: Color,
        from: Square,
        to: Square,
        promoted: Piece,
        captured: Piece,
    ) -> Self {
        Self::from_changes(&[
            FeatureChange::Remove(Placement::new(captured, to, color.opponent())),
            FeatureChange::Remove(Placement::new(Piece::Pawn, from, color)),
            FeatureChange::Add(Placement::new(promoted, to, color)),
        ])
    }

    /// En passant: the captured pawn stands on `captured_square`, not `to`.
    #[must_use]
    pub fn en_passant(color: Color, from: Square, to: Square, captured_square: Square) -> Self {
        Self::from_changes(&[
            FeatureChange::Remove(Placement::new(Piece::Pawn, captured_square, color.opponent())),
            FeatureChange::Remove(Placement::new(Piece::Pawn, from, color)),
            FeatureChange::Add(Placement::new(Piece::Pawn, to, color)),
        ])
    }

    #[must_use]
    pub fn castle(
        color: Color,
        king_from: Square,
        king_to: Square,
        rook_from: Square,
        rook_to: Square,
    ) -> Self {
        Self::from_changes(&[
            FeatureChange::Remove(Placement::new(Piece::King, king_from, color)),
            FeatureChange::Add(Placement::new(Piece::King, king_to, color)),
            FeatureChange::Remove(Placement::new(Piece::Rook, rook_from, color)),
            FeatureChange::Add(Placement::new(Piece::Rook, rook_to, color)),
        ])
    }
}
