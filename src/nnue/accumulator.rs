//! Incrementally updated accumulators and the per-line evaluation context.

use std::fmt;
use std::sync::Arc;

use super::delta::{FeatureChange, FeatureDelta, Placement};
use super::network::{Network, HIDDEN_SIZE};
use super::simd;
use crate::types::{Color, Piece, Square};

/// Hidden layer pre-activations for one perspective.
#[derive(Clone, PartialEq, Eq)]
#[repr(C, align(64))]
pub struct Accumulator {
    vals: [i16; HIDDEN_SIZE],
}

impl Accumulator {
    #[must_use]
    pub fn new(bias: &[i16; HIDDEN_SIZE]) -> Self {
        Self { vals: *bias }
    }

    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            vals: [0; HIDDEN_SIZE],
        }
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[i16; HIDDEN_SIZE] {
        &self.vals
    }

    #[cfg(test)]
    pub(crate) fn values_mut(&mut self) -> &mut [i16; HIDDEN_SIZE] {
        &mut self.vals
    }

    #[inline]
    fn add(&mut self, row: &[i16; HIDDEN_SIZE]) {
        simd::add_weights(&mut self.vals, row);
    }

    #[inline]
    fn sub(&mut self, row: &[i16; HIDDEN_SIZE]) {
        simd::sub_weights(&mut self.vals, row);
    }
}

impl fmt::Debug for Accumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.vals.iter()).finish()
    }
}

/// Compute the input feature index of a piece as seen from `perspective`.
///
/// Pieces of the perspective's own color use blocks 0-5, enemy pieces
/// blocks 6-11. Black's perspective sees the board rank-mirrored.
#[inline]
#[must_use]
pub fn feature_index(piece: Piece, square: Square, piece_color: Color, perspective: Color) -> usize {
    let oriented = match perspective {
        Color::White => square,
        Color::Black => square.flip_vertical(),
    };
    let block = if piece_color == perspective {
        piece.index()
    } else {
        6 + piece.index()
    };
    block * 64 + oriented.index()
}

/// Accumulator pair for one search line.
///
/// Each thread owns its own context; clone it when handing a position to
/// another thread. Updates mutate in place without synchronization.
#[derive(Clone)]
pub struct EvalContext {
    network: Arc<Network>,
    white: Accumulator,
    black: Accumulator,
}

impl EvalContext {
    /// Create a context for the empty board.
    #[must_use]
    pub fn new(network: Arc<Network>) -> Self {
        let white = Accumulator::new(network.feature_bias());
        let black = Accumulator::new(network.feature_bias());
        Self {
            network,
            white,
            black,
        }
    }

    /// Build a context by replaying every piece of a position.
    #[must_use]
    pub fn from_pieces<I>(network: Arc<Network>, pieces: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Placement>,
    {
        let mut ctx = Self::new(network);
        ctx.refresh(pieces);
        ctx
    }

    /// Reset both accumulators to the bias (empty board).
    pub fn reset(&mut self) {
        self.white = Accumulator::new(self.network.feature_bias());
        self.black = Accumulator::new(self.network.feature_bias());
    }

    /// Rebuild from scratch for a new position.
    pub fn refresh<I>(&mut self, pieces: I)
    where
        I: IntoIterator,
        I::Item: Into<Placement>,
    {
        self.reset();
        for placement in pieces {
            let p = placement.into();
            self.add_piece(p.piece, p.square, p.color);
        }
    }

    /// Piece appeared on `square`.
    #[inline]
    pub fn add_piece(&mut self, piece: Piece, square: Square, color: Color) {
        let white_feat = feature_index(piece, square, color, Color::White);
        let black_feat = feature_index(piece, square, color, Color::Black);
        self.white.add(self.network.feature_row(white_feat));
        self.black.add(self.network.feature_row(black_feat));
    }

    /// Piece disappeared from `square`.
    #[inline]
    pub fn remove_piece(&mut self, piece: Piece, square: Square, color: Color) {
        let white_feat = feature_index(piece, square, color, Color::White);
        let black_feat = feature_index(piece, square, color, Color::Black);
        self.white.sub(self.network.feature_row(white_feat));
        self.black.sub(self.network.feature_row(black_feat));
    }

    #[inline]
    pub fn move_piece(&mut self, piece: Piece, color: Color, from: Square, to: Square) {
        self.remove_piece(piece, from, color);
        self.add_piece(piece, to, color);
    }

    /// Apply every feature change of one board mutation.
    pub fn apply_delta(&mut self, delta: &FeatureDelta) {
        for change in delta.iter() {
            self.apply_change(change);
        }
    }

    /// Revert a delta previously passed to [`EvalContext::apply_delta`].
    pub fn undo_delta(&mut self, delta: &FeatureDelta) {
        for change in delta.iter().rev() {
            self.apply_change(change.inverse());
        }
    }

    #[inline]
    fn apply_change(&mut self, change: FeatureChange) {
        match change {
            FeatureChange::Add(p) => self.add_piece(p.piece, p.square, p.color),
            FeatureChange::Remove(p) => self.remove_piece(p.piece, p.square, p.color),
        }
    }

    /// Score in centipawns from the side to move's perspective.
    #[inline]
    #[must_use]
    pub fn evaluate(&self, side_to_move: Color) -> i32 {
        match side_to_move {
            Color::White => self.network.evaluate(&self.white, &self.black),
            Color::Black => self.network.evaluate(&self.black, &self.white),
        }
    }

    #[inline]
    #[must_use]
    pub fn accumulator(&self, perspective: Color) -> &Accumulator {
        match perspective {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    #[must_use]
    pub fn network(&self) -> &Arc<Network> {
        &self.network
    }
}

impl fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("white", &self.white)
            .field("black", &self.black)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nnue::test_support::{sq, start_position, test_network};

    #[test]
    fn test_feature_index_white_piece() {
        let e2 = sq("e2");
        assert_eq!(feature_index(Piece::Pawn, e2, Color::White, Color::White), 12);
        // Enemy block, mirrored square e7 = 52
        assert_eq!(
            feature_index(Piece::Pawn, e2, Color::White, Color::Black),
            6 * 64 + 52
        );
    }

    #[test]
    fn test_feature_index_black_piece() {
        let d8 = sq("d8");
        assert_eq!(
            feature_index(Piece::Queen, d8, Color::Black, Color::White),
            (6 + 4) * 64 + 59
        );
        // Own block, mirrored to d1 = 3
        assert_eq!(feature_index(Piece::Queen, d8, Color::Black, Color::Black), 4 * 64 + 3);
    }

    #[test]
    fn test_feature_indices_cover_input_range() {
        let mut seen = vec![false; crate::nnue::INPUT_SIZE];
        for piece in Piece::ALL {
            for color in Color::BOTH {
                for square in Square::all() {
                    seen[feature_index(piece, square, color, Color::White)] = true;
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_new_context_holds_bias() {
        let net = test_network();
        let ctx = EvalContext::new(Arc::clone(&net));
        assert_eq!(ctx.accumulator(Color::White).values(), net.feature_bias());
        assert_eq!(ctx.accumulator(Color::Black).values(), net.feature_bias());
    }

    #[test]
    fn test_add_then_remove_restores() {
        let mut ctx = EvalContext::from_pieces(test_network(), start_position());
        let before = ctx.clone();

        ctx.add_piece(Piece::Knight, sq("e4"), Color::Black);
        assert_ne!(ctx.accumulator(Color::White), before.accumulator(Color::White));
        ctx.remove_piece(Piece::Knight, sq("e4"), Color::Black);

        assert_eq!(ctx.accumulator(Color::White), before.accumulator(Color::White));
        assert_eq!(ctx.accumulator(Color::Black), before.accumulator(Color::Black));
    }

    #[test]
    fn test_reset_matches_fresh_context() {
        let net = test_network();
        let mut ctx = EvalContext::from_pieces(Arc::clone(&net), start_position());
        ctx.reset();
        let fresh = EvalContext::new(net);
        assert_eq!(ctx.accumulator(Color::White), fresh.accumulator(Color::White));
        assert_eq!(ctx.accumulator(Color::Black), fresh.accumulator(Color::Black));
    }

    #[test]
    fn test_move_piece_matches_rebuild() {
        let net = test_network();
        let mut ctx = EvalContext::from_pieces(Arc::clone(&net), start_position());
        ctx.move_piece(Piece::Pawn, Color::White, sq("e2"), sq("e4"));

        let rebuilt = EvalContext::from_pieces(
            net,
            start_position().into_iter().map(|(p, s, c)| {
                if s == sq("e2") {
                    (p, sq("e4"), c)
                } else {
                    (p, s, c)
                }
            }),
        );
        assert_eq!(ctx.evaluate(Color::Black), rebuilt.evaluate(Color::Black));
        assert_eq!(ctx.accumulator(Color::White), rebuilt.accumulator(Color::White));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut main = EvalContext::from_pieces(test_network(), start_position());
        let ponder = main.clone();
        main.remove_piece(Piece::Queen, sq("d1"), Color::White);
        assert_ne!(main.accumulator(Color::White), ponder.accumulator(Color::White));
    }
}
