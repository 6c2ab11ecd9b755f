//! Domain value types shared by the evaluator and the cache.

mod moves;
mod piece;
mod square;

pub use moves::Move;
pub use piece::{Color, Piece};
pub use square::Square;
