//! NNUE (Efficiently Updatable Neural Network) evaluation.
//!
//! Provides neural network based position evaluation with:
//! - Incremental accumulator updates for efficiency
//! - SIMD-optimized inference (AVX2/NEON)
//! - `SCReLU` activation function
//!
//! Architecture: (768 -> 128) x 2 perspectives -> 1
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use eval_core::nnue::{EvalContext, Network};
//! use eval_core::{Color, Piece, Square};
//!
//! let network = Arc::new(Network::load("net.nnue")?);
//! let mut ctx = EvalContext::new(network);
//! ctx.add_piece(Piece::King, "e1".parse()?, Color::White);
//! ctx.add_piece(Piece::King, "e8".parse()?, Color::Black);
//! let score = ctx.evaluate(Color::White);
//! # let _ = score;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod accumulator;
pub mod delta;
pub mod network;
pub mod simd;

use std::sync::Arc;

pub use accumulator::{feature_index, Accumulator, EvalContext};
pub use delta::{FeatureChange, FeatureDelta, Placement};
pub use network::{Network, HIDDEN_SIZE, INPUT_SIZE, NETWORK_BYTES};

use crate::types::Color;

/// Weight quantization factor for feature weights
pub const QA: i32 = 255;

/// Output weight quantization factor
pub const QB: i32 = 64;

/// Evaluation scale factor
pub const SCALE: i32 = 400;

/// Evaluate a position from scratch by replaying every piece.
///
/// Prefer keeping an [`EvalContext`] alive and updating it incrementally;
/// this is for one-off scoring of arbitrary positions.
#[must_use]
pub fn evaluate_position<I>(network: &Arc<Network>, pieces: I, side_to_move: Color) -> i32
where
    I: IntoIterator,
    I::Item: Into<Placement>,
{
    EvalContext::from_pieces(Arc::clone(network), pieces).evaluate(side_to_move)
}
