//! Principal variation reconstruction from the transposition table.

use crate::score::MAX_PLY;
use crate::tt::TranspositionTable;
use crate::types::Move;

/// The slice of a rules engine needed to walk stored best moves.
pub trait PvPosition {
    /// State needed to take a move back
    type Undo;

    fn hash(&self) -> u64;

    /// Whether an encoded move is legal here. Table moves may come from a
    /// colliding position, so this must be a real check.
    fn is_legal(&self, mv: Move) -> bool;

    fn make_move(&mut self, mv: Move) -> Self::Undo;

    fn unmake_move(&mut self, mv: Move, undo: Self::Undo);
}

/// Extract the principal variation stored in the table.
///
/// Follows best moves from `position` until an entry is missing, a move is
/// illegal, a position repeats, or `max_len` moves (capped at `MAX_PLY`)
/// are collected. The position is restored before returning.
pub fn principal_variation<P: PvPosition>(
    tt: &TranspositionTable,
    position: &mut P,
    max_len: usize,
) -> Vec<Move> {
    let max_len = max_len.min(MAX_PLY);
    let mut pv = Vec::with_capacity(max_len);
    let mut seen_hashes = [0u64; MAX_PLY];
    let mut undo_stack = Vec::with_capacity(max_len);

    for seen_count in 0..max_len {
        // Avoid infinite loops from collisions or repetitions
        let hash = position.hash();
        if seen_hashes[..seen_count].contains(&hash) {
            break;
        }
        seen_hashes[seen_count] = hash;

        let Some(mv) = tt
            .probe(hash)
            .and_then(|entry| entry.verified_move(|m| position.is_legal(m)))
        else {
            break;
        };

        pv.push(mv);
        let undo = position.make_move(mv);
        undo_stack.push((mv, undo));
    }

    for (mv, undo) in undo_stack.into_iter().rev() {
        position.unmake_move(mv, undo);
    }

    pv
}
