//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use eval_core::nnue::{Placement, HIDDEN_SIZE, INPUT_SIZE, NETWORK_BYTES};
use eval_core::{Color, Network, Piece, Square};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic network with trained-network-like weight magnitudes.
pub fn network(seed: u64) -> Arc<Network> {
    let mut rng = StdRng::seed_from_u64(seed);
    let words = (INPUT_SIZE + 3) * HIDDEN_SIZE + 1;
    let mut blob = Vec::with_capacity(NETWORK_BYTES);
    for i in 0..words {
        let v: i16 = if i == words - 1 {
            rng.gen_range(-200..=200)
        } else {
            rng.gen_range(-64..=64)
        };
        blob.extend_from_slice(&v.to_le_bytes());
    }
    blob.resize(NETWORK_BYTES, 0);
    Arc::new(Network::from_bytes(&blob).expect("valid blob"))
}

pub fn sq(name: &str) -> Square {
    name.parse().expect("valid square")
}

/// The 32 pieces of the standard starting arrangement.
pub fn start_position() -> Vec<Placement> {
    let back_rank = [
        Piece::Rook,
        Piece::Knight,
        Piece::Bishop,
        Piece::Queen,
        Piece::King,
        Piece::Bishop,
        Piece::Knight,
        Piece::Rook,
    ];

    let mut pieces = Vec::with_capacity(32);
    for (file, piece) in back_rank.into_iter().enumerate() {
        let at = |rank| Square::new(rank, file).expect("on board");
        pieces.push(Placement::new(piece, at(0), Color::White));
        pieces.push(Placement::new(Piece::Pawn, at(1), Color::White));
        pieces.push(Placement::new(Piece::Pawn, at(6), Color::Black));
        pieces.push(Placement::new(piece, at(7), Color::Black));
    }
    pieces
}

/// Colors swapped and ranks mirrored.
pub fn mirrored(pieces: &[Placement]) -> Vec<Placement> {
    pieces
        .iter()
        .map(|p| Placement::new(p.piece, p.square.flip_vertical(), p.color.opponent()))
        .collect()
}
