//! Position evaluation and search memoization core.
//!
//! - [`nnue`]: incrementally updated fixed-point network evaluation
//! - [`tt`]: lock-free transposition table shared by search and ponder threads
//! - [`Core`]: owned handles to both, built once from a [`CoreConfig`]

pub mod config;
pub mod engine;
pub mod error;
pub mod nnue;
pub mod ponder;
pub mod pv;
pub mod score;
pub mod sync;
pub mod tt;
pub mod types;

pub use config::{CoreConfig, TtConfig};
pub use engine::Core;
pub use error::{NetworkError, SquareError};
pub use nnue::{EvalContext, FeatureDelta, Network};
pub use tt::{BoundType, TranspositionTable, TtEntry};
pub use types::{Color, Move, Piece, Square};
