//! Score space shared by the evaluator and the transposition table.
//!
//! Centipawn evaluations live strictly inside `(-MATE_THRESHOLD, MATE_THRESHOLD)`.
//! Scores at or beyond the threshold encode a forced mate: `MATE_SCORE - n`
//! means "mate in n plies" from the node that produced it. The table stores
//! mate scores relative to the node, not the root, so they stay valid when
//! the same position is reached at a different ply.

/// Maximum search depth in plies
pub const MAX_PLY: usize = 128;

/// Score of delivering mate at the current node
pub const MATE_SCORE: i32 = 32_000;

/// Scores with absolute value >= this are considered checkmate scores
pub const MATE_THRESHOLD: i32 = MATE_SCORE - MAX_PLY as i32;

const _: () = assert!(MATE_SCORE <= i16::MAX as i32);

#[inline]
#[must_use]
pub const fn is_mate(score: i32) -> bool {
    score >= MATE_THRESHOLD || score <= -MATE_THRESHOLD
}

/// Score for the side to move being mated `ply` plies from the root.
#[inline]
#[must_use]
pub const fn mated_in(ply: usize) -> i32 {
    -MATE_SCORE + ply as i32
}

/// Keep a static evaluation out of the mate range.
#[inline]
#[must_use]
pub fn clamp_eval(score: i32) -> i32 {
    score.clamp(-MATE_THRESHOLD + 1, MATE_THRESHOLD - 1)
}

/// Convert a root-relative search score to the node-relative form stored in the table.
#[inline]
#[must_use]
pub const fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply as i32
    } else if score <= -MATE_THRESHOLD {
        score - ply as i32
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`] for a probe made `ply` plies from the root.
#[inline]
#[must_use]
pub const fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply as i32
    } else if score <= -MATE_THRESHOLD {
        score + ply as i32
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mate_detection() {
        assert!(is_mate(MATE_SCORE));
        assert!(is_mate(mated_in(10)));
        assert!(!is_mate(0));
        assert!(!is_mate(MATE_THRESHOLD - 1));
    }

    #[test]
    fn test_tt_conversion_roundtrip() {
        for ply in [0usize, 1, 7, 40] {
            for score in [0, 250, -250, MATE_SCORE - 50, mated_in(60)] {
                assert_eq!(score_from_tt(score_to_tt(score, ply), ply), score);
            }
        }
    }

    #[test]
    fn test_mate_distance_is_node_relative() {
        // Mate found 5 plies below a node at ply 3: root-relative MATE - 8
        let root_relative = MATE_SCORE - 8;
        let stored = score_to_tt(root_relative, 3);
        assert_eq!(stored, MATE_SCORE - 5);
        // Same node reached at ply 1 reports mate in 6 from the root
        assert_eq!(score_from_tt(stored, 1), MATE_SCORE - 6);
    }

    #[test]
    fn test_clamp_eval() {
        assert_eq!(clamp_eval(123), 123);
        assert!(!is_mate(clamp_eval(1_000_000)));
        assert!(!is_mate(clamp_eval(-1_000_000)));
    }
}
