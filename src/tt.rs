//! Transposition table for caching search results.
//!
//! Uses 64-bit position hashes to store and retrieve search outcomes,
//! enabling significant search tree pruning.
//!
//! This implementation uses lockless hashing for thread-safe access by
//! the main search and the ponder thread. Each 16-byte entry is a pair of
//! atomic u64 words (hash tag and packed payload) using XOR verification
//! to detect torn reads, which are reported as misses.

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::TtConfig;
use crate::score::score_from_tt;
use crate::types::Move;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoundType {
    Empty,      // Unused slot
    Exact,      // Score is the exact value
    LowerBound, // Score is at least this value (failed high - score >= beta)
    UpperBound, // Score is at most this value (failed low - score <= alpha)
}

impl BoundType {
    const fn to_u8(self) -> u8 {
        match self {
            BoundType::Empty => 0,
            BoundType::Exact => 1,
            BoundType::LowerBound => 2,
            BoundType::UpperBound => 3,
        }
    }

    const fn from_u8(v: u8) -> Self {
        match v & 0x3 {
            0 => BoundType::Empty,
            1 => BoundType::Exact,
            2 => BoundType::LowerBound,
            _ => BoundType::UpperBound,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            BoundType::Empty => "invalid",
            BoundType::Exact => "exact",
            BoundType::LowerBound => "lowerbound",
            BoundType::UpperBound => "upperbound",
        }
    }
}

/// Number of distinct generations; the counter wraps at this value
pub const GENERATION_CYCLE: u8 = 64;
const GENERATION_MASK: u8 = GENERATION_CYCLE - 1;

/// Unpacked TT entry for reading.
///
/// The move is unverified: a different position may share the hash, so
/// callers must check legality before playing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtEntry {
    pub hash: u64,
    pub score: i16,
    pub bound_type: BoundType,
    pub generation: u8,
    pub depth: u8,
    pub best_move: Option<Move>,
}

impl TtEntry {
    pub fn depth(&self) -> u32 {
        u32::from(self.depth)
    }

    pub fn score(&self) -> i32 {
        i32::from(self.score)
    }

    pub fn bound_type(&self) -> BoundType {
        self.bound_type
    }

    pub fn best_move(&self) -> Option<Move> {
        self.best_move
    }

    /// Stored move, only if the caller's legality check accepts it.
    pub fn verified_move(&self, is_legal: impl FnOnce(Move) -> bool) -> Option<Move> {
        self.best_move.filter(|&mv| is_legal(mv))
    }

    /// Score usable as a cutoff for a node searched to `depth` with window
    /// `(alpha, beta)` at `ply` from the root, if the entry proves one.
    #[must_use]
    pub fn cutoff_score(&self, depth: u32, alpha: i32, beta: i32, ply: usize) -> Option<i32> {
        if self.depth() < depth {
            return None;
        }
        let score = score_from_tt(self.score(), ply);
        match self.bound_type {
            BoundType::Exact => Some(score),
            BoundType::LowerBound if score >= beta => Some(score),
            BoundType::UpperBound if score <= alpha => Some(score),
            _ => None,
        }
    }
}

impl fmt::Display for TtEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Score: {:.2} ({}), Depth: {}",
            f64::from(self.score) / 100.0,
            self.bound_type.name(),
            self.depth
        )?;
        if let Some(mv) = self.best_move {
            write!(f, ", Move: {mv}")?;
        }
        Ok(())
    }
}

/// Packed payload format (64 bits):
/// - bits 0-15:  score (i16 as u16)
/// - bits 16-17: bound
/// - bits 18-23: generation (6 bits)
/// - bits 24-31: depth (u8)
/// - bits 32-63: move (u32, 0 = no move)
const BOUND_SHIFT: u32 = 16;
const AGE_SHIFT: u32 = 18;
const DEPTH_SHIFT: u32 = 24;
const MOVE_SHIFT: u32 = 32;

fn pack_entry(
    score: i16,
    bound_type: BoundType,
    generation: u8,
    depth: u8,
    best_move: Option<Move>,
) -> u64 {
    let mv = best_move.map_or(0, Move::as_u32);

    u64::from(score as u16)
        | (u64::from(bound_type.to_u8()) << BOUND_SHIFT)
        | (u64::from(generation & GENERATION_MASK) << AGE_SHIFT)
        | (u64::from(depth) << DEPTH_SHIFT)
        | (u64::from(mv) << MOVE_SHIFT)
}

#[inline]
fn bound_of(data: u64) -> BoundType {
    BoundType::from_u8((data >> BOUND_SHIFT) as u8)
}

#[inline]
fn generation_of(data: u64) -> u8 {
    (data >> AGE_SHIFT) as u8 & GENERATION_MASK
}

#[inline]
fn depth_of(data: u64) -> u8 {
    (data >> DEPTH_SHIFT) as u8
}

fn unpack_entry(hash: u64, data: u64) -> TtEntry {
    TtEntry {
        hash,
        score: data as u16 as i16,
        bound_type: bound_of(data),
        generation: generation_of(data),
        depth: depth_of(data),
        best_move: Move::from_u32((data >> MOVE_SHIFT) as u32),
    }
}

/// A single TT slot using lockless hashing.
///
/// Uses the XOR technique: stores (key ^ data) and data separately.
/// On read, the hash is recovered as (stored_key ^ data); a write torn
/// between the two words yields a hash that matches no probe.
#[repr(C)]
struct TtSlot {
    /// Stores: hash_key ^ packed_data
    key_xor: AtomicU64,
    /// Stores: packed_data
    data: AtomicU64,
}

impl TtSlot {
    fn new() -> Self {
        TtSlot {
            key_xor: AtomicU64::new(0),
            data: AtomicU64::new(0),
        }
    }

    fn write(&self, hash: u64, packed: u64) {
        self.data.store(packed, Ordering::Relaxed);
        self.key_xor.store(hash ^ packed, Ordering::Relaxed);
    }

    /// Returns (hash, data) as currently visible.
    fn read(&self) -> (u64, u64) {
        let key_xor = self.key_xor.load(Ordering::Relaxed);
        let data = self.data.load(Ordering::Relaxed);
        (key_xor ^ data, data)
    }

    fn probe(&self, hash: u64) -> Option<TtEntry> {
        let (stored, data) = self.read();
        if stored == hash && bound_of(data) != BoundType::Empty {
            Some(unpack_entry(stored, data))
        } else {
            None
        }
    }

    fn clear(&self) {
        self.key_xor.store(0, Ordering::Relaxed);
        self.data.store(0, Ordering::Relaxed);
    }
}

/// Number of slots per bucket for collision resolution
pub const BUCKET_SIZE: usize = 2;

/// A bucket containing multiple slots, one per half cache line
#[repr(C, align(32))]
struct TtBucket {
    slots: [TtSlot; BUCKET_SIZE],
}

impl TtBucket {
    fn new() -> Self {
        TtBucket {
            slots: [TtSlot::new(), TtSlot::new()],
        }
    }
}

const _: () = assert!(mem::size_of::<TtSlot>() == 16);
const _: () = assert!(mem::size_of::<TtBucket>() == 32);

/// Thread-safe transposition table using lockless hashing.
///
/// Multiple threads can read and write concurrently without locks.
/// Torn reads are detected via XOR verification and discarded.
pub struct TranspositionTable {
    buckets: Box<[TtBucket]>,
    generation: AtomicU8,
}

impl TranspositionTable {
    /// Create a new transposition table with the given size in megabytes.
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        Self::from_config(&TtConfig::with_megabytes(size_mb))
    }

    #[must_use]
    pub fn from_config(config: &TtConfig) -> Self {
        Self::with_buckets(config.size_bytes / mem::size_of::<TtBucket>())
    }

    /// Create a table with an exact bucket count (at least one).
    #[must_use]
    pub fn with_buckets(num_buckets: usize) -> Self {
        let num_buckets = num_buckets.max(1);
        let buckets: Box<[TtBucket]> = (0..num_buckets).map(|_| TtBucket::new()).collect();

        log::debug!(
            "allocated transposition table: {num_buckets} buckets, {} bytes",
            num_buckets * mem::size_of::<TtBucket>()
        );

        TranspositionTable {
            buckets,
            generation: AtomicU8::new(0),
        }
    }

    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.buckets.len() * mem::size_of::<TtBucket>()
    }

    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    /// Current 6-bit generation stamped into new entries.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u8 {
        // The raw counter wraps at 256, a multiple of the cycle, so masking
        // on read keeps the sequence continuous.
        self.generation.load(Ordering::Relaxed) & GENERATION_MASK
    }

    /// Start a new generation; called once per game reset.
    pub fn advance_generation(&self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
        log::trace!("transposition table generation now {}", self.generation());
    }

    /// Probe the table for an entry matching the given hash.
    /// Returns None if no valid entry is found.
    pub fn probe(&self, hash: u64) -> Option<TtEntry> {
        let bucket = &self.buckets[self.index(hash)];
        bucket.slots.iter().find_map(|slot| slot.probe(hash))
    }

    /// Store an entry in the table.
    ///
    /// Slot choice within the bucket:
    /// 1. The slot already holding this hash
    /// 2. An empty slot
    /// 3. The slot with the lowest priority, where any entry from an older
    ///    generation ranks below every current one and shallower depth
    ///    ranks lower within a generation
    ///
    /// Depth is clamped to 0-255 and score to the i16 range. A store with
    /// [`BoundType::Empty`] is ignored and leaves the bucket untouched.
    pub fn store(
        &self,
        hash: u64,
        bound_type: BoundType,
        depth: i32,
        score: i32,
        best_move: Option<Move>,
    ) {
        if bound_type == BoundType::Empty {
            log::warn!("ignoring transposition table store without a bound");
            return;
        }

        let current = self.generation();
        let depth_u8 = depth.clamp(0, i32::from(u8::MAX)) as u8;
        let score_i16 = score.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;

        let packed = pack_entry(score_i16, bound_type, current, depth_u8, best_move);
        let bucket = &self.buckets[self.index(hash)];

        let snapshot: [(u64, u64); BUCKET_SIZE] =
            [bucket.slots[0].read(), bucket.slots[1].read()];

        let same_hash = snapshot
            .iter()
            .position(|&(h, d)| h == hash && bound_of(d) != BoundType::Empty);
        let empty = || {
            snapshot
                .iter()
                .position(|&(_, d)| bound_of(d) == BoundType::Empty)
        };
        let weakest = || {
            let mut replace_idx = 0;
            let mut worst_priority = u32::MAX;
            for (idx, &(_, data)) in snapshot.iter().enumerate() {
                let priority = replacement_priority(data, current);
                if priority < worst_priority {
                    replace_idx = idx;
                    worst_priority = priority;
                }
            }
            replace_idx
        };

        let idx = same_hash.or_else(empty).unwrap_or_else(weakest);
        bucket.slots[idx].write(hash, packed);
    }

    /// Returns hash table fullness in per mille (0-1000), counting only
    /// entries of the current generation.
    #[must_use]
    pub fn hashfull_per_mille(&self) -> u32 {
        // Sample first 1000 buckets for efficiency
        let sample_size = self.buckets.len().min(1000);
        let current = self.generation();

        let occupied = self
            .buckets
            .iter()
            .take(sample_size)
            .flat_map(|bucket| bucket.slots.iter())
            .filter(|slot| {
                let (_, data) = slot.read();
                bound_of(data) != BoundType::Empty && generation_of(data) == current
            })
            .count();

        let total_slots = sample_size * BUCKET_SIZE;
        ((occupied as u64 * 1000) / total_slots as u64) as u32
    }

    /// Clear all entries from the table. The generation is left unchanged.
    pub fn clear(&self) {
        for bucket in self.buckets.iter() {
            for slot in &bucket.slots {
                slot.clear();
            }
        }
    }

    /// Game reset hook: clear every entry and start a new generation.
    pub fn new_game(&self) {
        self.clear();
        self.advance_generation();
    }
}

/// Lower value is replaced first.
#[inline]
fn replacement_priority(data: u64, current_generation: u8) -> u32 {
    let depth = u32::from(depth_of(data));
    if generation_of(data) == current_generation {
        depth + 256
    } else {
        depth
    }
}

impl fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("buckets", &self.buckets.len())
            .field("generation", &self.generation())
            .finish()
    }
}
