//! Behavioral properties of the shared transposition table.

use std::sync::Arc;
use std::thread;

use eval_core::tt::GENERATION_CYCLE;
use eval_core::{BoundType, Move, TranspositionTable};
use proptest::prelude::*;

fn mv(raw: u32) -> Option<Move> {
    Move::from_u32(raw)
}

/// Hashes that land in the same bucket of a table with `buckets` buckets.
fn colliding(buckets: usize, count: usize) -> Vec<u64> {
    (0..count as u64).map(|i| 5 + i * buckets as u64).collect()
}

#[test]
fn store_then_probe_returns_the_entry() {
    let tt = TranspositionTable::with_buckets(1024);
    tt.store(0xDEAD_BEEF, BoundType::LowerBound, 9, -321, mv(0x1234));

    let entry = tt.probe(0xDEAD_BEEF).expect("stored entry");
    assert_eq!(entry.hash, 0xDEAD_BEEF);
    assert_eq!(entry.bound_type(), BoundType::LowerBound);
    assert_eq!(entry.depth(), 9);
    assert_eq!(entry.score(), -321);
    assert_eq!(entry.best_move(), mv(0x1234));
}

#[test]
fn probe_misses_on_other_hash_in_same_bucket() {
    let tt = TranspositionTable::with_buckets(16);
    let hashes = colliding(16, 2);
    tt.store(hashes[0], BoundType::Exact, 3, 10, None);

    assert!(tt.probe(hashes[1]).is_none());
}

#[test]
fn bucket_holds_two_entries() {
    let tt = TranspositionTable::with_buckets(16);
    let hashes = colliding(16, 2);
    tt.store(hashes[0], BoundType::Exact, 3, 10, None);
    tt.store(hashes[1], BoundType::Exact, 4, 20, None);

    assert_eq!(tt.probe(hashes[0]).map(|e| e.score()), Some(10));
    assert_eq!(tt.probe(hashes[1]).map(|e| e.score()), Some(20));
}

#[test]
fn full_bucket_evicts_shallowest_current_entry() {
    let tt = TranspositionTable::with_buckets(16);
    let hashes = colliding(16, 3);
    tt.store(hashes[0], BoundType::Exact, 8, 1, None);
    tt.store(hashes[1], BoundType::Exact, 2, 2, None);
    tt.store(hashes[2], BoundType::Exact, 5, 3, None);

    assert!(tt.probe(hashes[0]).is_some());
    assert!(tt.probe(hashes[1]).is_none());
    assert_eq!(tt.probe(hashes[2]).map(|e| e.depth()), Some(5));
}

#[test]
fn same_hash_overwrites_in_place() {
    let tt = TranspositionTable::with_buckets(16);
    let hashes = colliding(16, 2);
    tt.store(hashes[0], BoundType::Exact, 8, 1, None);
    tt.store(hashes[1], BoundType::Exact, 9, 2, None);
    tt.store(hashes[0], BoundType::UpperBound, 1, -7, mv(3));

    let entry = tt.probe(hashes[0]).expect("overwritten entry");
    assert_eq!(entry.depth(), 1);
    assert_eq!(entry.score(), -7);
    assert_eq!(entry.bound_type(), BoundType::UpperBound);
    assert!(tt.probe(hashes[1]).is_some());
}

#[test]
fn stale_entry_is_evicted_before_deeper_current_one() {
    let tt = TranspositionTable::with_buckets(16);
    let hashes = colliding(16, 3);
    tt.store(hashes[0], BoundType::Exact, 40, 1, None);
    tt.advance_generation();
    tt.store(hashes[1], BoundType::Exact, 1, 2, None);
    tt.store(hashes[2], BoundType::Exact, 1, 3, None);

    assert!(tt.probe(hashes[0]).is_none());
    assert!(tt.probe(hashes[1]).is_some());
    assert!(tt.probe(hashes[2]).is_some());
}

#[test]
fn generation_wraps_after_full_cycle() {
    let tt = TranspositionTable::with_buckets(16);
    let start = tt.generation();
    for _ in 0..GENERATION_CYCLE {
        tt.advance_generation();
    }
    assert_eq!(tt.generation(), start);

    // Enough advances to wrap the raw counter as well
    for _ in 0..300 {
        tt.advance_generation();
        assert!(tt.generation() < GENERATION_CYCLE);
    }
    assert_eq!(tt.generation(), (start + (300 % 64) as u8) % GENERATION_CYCLE);
}

#[test]
fn entries_carry_their_generation() {
    let tt = TranspositionTable::with_buckets(64);
    tt.advance_generation();
    tt.advance_generation();
    tt.store(11, BoundType::Exact, 1, 0, None);

    assert_eq!(tt.probe(11).map(|e| e.generation), Some(tt.generation()));
}

#[test]
fn new_game_empties_table() {
    let tt = TranspositionTable::with_buckets(64);
    for hash in 0..64 {
        tt.store(hash, BoundType::Exact, 1, 0, None);
    }
    assert!(tt.hashfull_per_mille() > 0);

    tt.new_game();

    assert_eq!(tt.hashfull_per_mille(), 0);
    assert!((0..64).all(|hash| tt.probe(hash).is_none()));
}

/// Payload derived from the hash, so a reader can tell if fields were mixed.
fn payload(hash: u64) -> (i32, i32, u32) {
    let depth = (hash % 200) as i32;
    let score = (hash % 20_000) as i32 - 10_000;
    let raw_move = (hash as u32) | 1;
    (depth, score, raw_move)
}

#[test]
fn concurrent_store_and_probe_never_mixes_entries() {
    // Few buckets so writers and readers contend on the same slots
    let tt = Arc::new(TranspositionTable::with_buckets(8));
    let writers: Vec<_> = (0..2u64)
        .map(|t| {
            let tt = Arc::clone(&tt);
            thread::spawn(move || {
                for i in 0..50_000u64 {
                    let hash = (i * 2 + t).wrapping_mul(0x9E37_79B9_7F4A_7C15);
                    let (depth, score, raw_move) = payload(hash);
                    tt.store(hash, BoundType::Exact, depth, score, Move::from_u32(raw_move));
                }
            })
        })
        .collect();

    let reader = {
        let tt = Arc::clone(&tt);
        thread::spawn(move || {
            let mut hits = 0u32;
            for i in 0..100_000u64 {
                let hash = i.wrapping_mul(0x9E37_79B9_7F4A_7C15);
                if let Some(entry) = tt.probe(hash) {
                    let (depth, score, raw_move) = payload(hash);
                    assert_eq!(entry.hash, hash);
                    assert_eq!(entry.depth(), depth as u32);
                    assert_eq!(entry.score(), score);
                    assert_eq!(entry.best_move(), Move::from_u32(raw_move));
                    hits += 1;
                }
            }
            hits
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();
}

proptest! {
    /// Property: the most recent store for a hash is always what a probe returns,
    /// as long as no other hash shares the bucket
    #[test]
    fn prop_last_store_wins(
        hash in any::<u64>(),
        writes in prop::collection::vec((0..4u8, 0..300i32, -40_000..40_000i32, any::<u32>()), 1..16),
    ) {
        let tt = TranspositionTable::with_buckets(256);
        for &(bound, depth, score, raw_move) in &writes {
            let bound = match bound {
                0 => BoundType::Exact,
                1 => BoundType::LowerBound,
                2 => BoundType::UpperBound,
                _ => BoundType::Exact,
            };
            tt.store(hash, bound, depth, score, Move::from_u32(raw_move));
        }

        let &(_, depth, score, raw_move) = writes.last().unwrap();
        let entry = tt.probe(hash).unwrap();
        prop_assert_eq!(entry.depth(), depth.clamp(0, 255) as u32);
        prop_assert_eq!(entry.score(), score.clamp(i32::from(i16::MIN), i32::from(i16::MAX)));
        prop_assert_eq!(entry.best_move(), Move::from_u32(raw_move));
    }

    /// Property: probing a hash that was never stored misses
    #[test]
    fn prop_unstored_hash_misses(
        stored in prop::collection::hash_set(any::<u64>(), 0..64),
        other in any::<u64>(),
    ) {
        prop_assume!(!stored.contains(&other));
        let tt = TranspositionTable::with_buckets(32);
        for &hash in &stored {
            tt.store(hash, BoundType::Exact, 1, 0, None);
        }
        prop_assert!(tt.probe(other).is_none());
    }
}
