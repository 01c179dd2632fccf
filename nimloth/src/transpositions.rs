//! The shared transposition table.
//!
//! Positions recur all over the search tree, so every searched node stores
//! its result keyed by the position's Zobrist hash: how deep the subtree
//! was searched, the score, whether that score is exact or just a bound,
//! and the best move found.
//!
//! All workers share one table and access it without locks. Every slot is a
//! pair of `AtomicU64`s (the key and the packed payload), so a reader can
//! never see a torn half-entry; what it *can* see is a key from one write
//! and a payload from another. That race is benign: the key comparison on
//! probe rejects mismatches, and a stale-but-matching payload is just a
//! cache hit from a moment ago. A corrupted best move is harmless too,
//! because the move picker only plays moves it generated itself.
//!
//! Mate scores are stored relative to the node (see [`ScoreExt::relative`])
//! so that a mate found deep in one branch reads correctly when probed from
//! a different distance to the root.

use crate::evaluate::Score;
use crate::evaluate::ScoreExt;
use crate::zobrist::ZHash;
use chess::movegen::moves::Move;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// What a stored score means relative to the search window it was found in
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Bound {
    /// The score is exact: alpha was raised, beta never crossed
    Exact = 0,

    /// The node failed low: the score is an upper bound
    Upper = 1,

    /// The node failed high: the score is a lower bound
    Lower = 2,
}

/// One decoded table entry
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TTEntry {
    hash: ZHash,
    best: Move,
    score: i16,
    depth: i8,
    bound: Bound,
}

impl TTEntry {
    /// Create an entry for storage at `ply`, normalising mate scores to be
    /// node-relative.
    pub fn new(
        hash: ZHash,
        best: Move,
        score: Score,
        depth: i32,
        bound: Bound,
        ply: usize,
    ) -> Self {
        Self {
            hash,
            best,
            score: score.relative(ply) as i16,
            depth: depth.clamp(i8::MIN as i32, i8::MAX as i32) as i8,
            bound,
        }
    }

    /// The stored best move, if there is one
    pub fn best_move(&self) -> Move {
        self.best
    }

    pub fn depth(&self) -> i32 {
        self.depth as i32
    }

    pub fn bound(&self) -> Bound {
        self.bound
    }

    /// Whether the stored result settles this node outright, and the score
    /// to return if so. The entry must have searched at least as deep as we
    /// are about to, and a bounded score only counts when it falls outside
    /// the window on the right side.
    pub fn try_score(&self, depth: i32, alpha: Score, beta: Score, ply: usize) -> Option<Score> {
        if self.depth() < depth {
            return None;
        }

        let score = (self.score as Score).absolute(ply);

        match self.bound {
            Bound::Exact => Some(score),
            Bound::Upper if score <= alpha => Some(score),
            Bound::Lower if score >= beta => Some(score),
            _ => None,
        }
    }

    /// Pack the payload into one word: move, score, depth, bound
    fn encode(&self) -> u64 {
        self.best.0 as u64
            | (self.score as u16 as u64) << 16
            | (self.depth as u8 as u64) << 32
            | (self.bound as u64) << 40
    }

    fn decode(hash: u64, data: u64) -> Self {
        Self {
            hash: ZHash(hash),
            best: Move((data & 0xFFFF) as u16),
            score: (data >> 16) as u16 as i16,
            depth: (data >> 32) as u8 as i8,
            bound: match (data >> 40) & 0b11 {
                0 => Bound::Exact,
                1 => Bound::Upper,
                _ => Bound::Lower,
            },
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// The table
//
////////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
struct Slot {
    hash: AtomicU64,
    data: AtomicU64,
}

pub struct TTable {
    slots: Vec<Slot>,

    /// Slot count minus one; the count is a power of two so this doubles as
    /// the index mask.
    mask: usize,
}

impl TTable {
    /// Create a table with the requested capacity in MiB, rounded down to a
    /// power-of-two number of slots.
    pub fn with_capacity_mb(mb: usize) -> Self {
        let bytes = mb.max(1) << 20;
        let count = (bytes / std::mem::size_of::<Slot>() + 1).next_power_of_two() / 2;
        let count = count.max(1024);

        let mut slots = Vec::with_capacity(count);
        slots.resize_with(count, Slot::default);

        Self { slots, mask: count - 1 }
    }

    /// Look up a position, returning the entry if the keys match
    pub fn probe(&self, hash: ZHash) -> Option<TTEntry> {
        let slot = &self.slots[hash.0 as usize & self.mask];
        let key = slot.hash.load(Ordering::Relaxed);

        if key != hash.0 || key == 0 {
            return None;
        }

        Some(TTEntry::decode(key, slot.data.load(Ordering::Relaxed)))
    }

    /// Store an entry. Within a slot, deeper searches win; a different
    /// position always evicts.
    pub fn insert(&self, entry: TTEntry) {
        let slot = &self.slots[entry.hash.0 as usize & self.mask];
        let key = slot.hash.load(Ordering::Relaxed);

        if key == entry.hash.0 {
            let existing = TTEntry::decode(key, slot.data.load(Ordering::Relaxed));

            if entry.depth < existing.depth && entry.bound != Bound::Exact {
                return;
            }
        }

        slot.hash.store(entry.hash.0, Ordering::Relaxed);
        slot.data.store(entry.encode(), Ordering::Relaxed);
    }

    /// Wipe the table. Only needs `&self` thanks to the atomic slots, so it
    /// works on a shared handle between searches.
    pub fn clear(&self) {
        for slot in &self.slots {
            slot.hash.store(0, Ordering::Relaxed);
            slot.data.store(0, Ordering::Relaxed);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Tests
//
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use chess::movegen::moves::MoveKind;
    use chess::square::Square::*;

    #[test]
    fn roundtrip_through_the_packed_slots() {
        let tt = TTable::with_capacity_mb(1);
        let hash = ZHash(0x1234_5678_9ABC_DEF0);
        let best = Move::new(E2, E4, MoveKind::DoublePush);

        let entry = TTEntry::new(hash, best, -123, 7, Bound::Lower, 0);
        tt.insert(entry);

        let probed = tt.probe(hash).unwrap();
        assert_eq!(probed, entry);
        assert_eq!(probed.best_move(), best);
        assert_eq!(probed.depth(), 7);
        assert_eq!(probed.bound(), Bound::Lower);
    }

    #[test]
    fn mismatched_keys_miss() {
        let tt = TTable::with_capacity_mb(1);
        let entry = TTEntry::new(ZHash(42), Move::NULL, 0, 1, Bound::Exact, 0);
        tt.insert(entry);

        assert!(tt.probe(ZHash(42)).is_some());
        assert!(tt.probe(ZHash(43)).is_none());

        tt.clear();
        assert!(tt.probe(ZHash(42)).is_none());
    }

    #[test]
    fn shallower_entries_dont_evict_deeper_ones() {
        let tt = TTable::with_capacity_mb(1);
        let hash = ZHash(0xABCD);

        tt.insert(TTEntry::new(hash, Move::NULL, 50, 9, Bound::Lower, 0));
        tt.insert(TTEntry::new(hash, Move::NULL, -10, 3, Bound::Upper, 0));

        assert_eq!(tt.probe(hash).unwrap().depth(), 9);

        // But an exact score does replace
        tt.insert(TTEntry::new(hash, Move::NULL, 20, 3, Bound::Exact, 0));
        assert_eq!(tt.probe(hash).unwrap().depth(), 3);
    }

    #[test]
    fn bounds_gate_the_score() {
        let entry = TTEntry::new(ZHash(1), Move::NULL, 100, 5, Bound::Lower, 0);

        // A lower bound of 100 settles any window below it
        assert_eq!(entry.try_score(5, 0, 50, 0), Some(100));
        assert_eq!(entry.try_score(5, 0, 200, 0), None);

        // Too shallow: no cutoff at all
        assert_eq!(entry.try_score(6, 0, 50, 0), None);

        let entry = TTEntry::new(ZHash(1), Move::NULL, 100, 5, Bound::Upper, 0);
        assert_eq!(entry.try_score(5, 150, 300, 0), Some(100));
        assert_eq!(entry.try_score(5, 0, 300, 0), None);
    }

    #[test]
    fn mate_scores_travel_between_plies() {
        let tt = TTable::with_capacity_mb(1);
        let hash = ZHash(0xFEED);

        // A mate-in-3-plies seen at ply 5
        let found = Score::MATE - 8;
        tt.insert(TTEntry::new(hash, Move::NULL, found, 10, Bound::Exact, 5));

        // Probed at ply 7, the same position is mate at ply 10 from the root
        let probed = tt.probe(hash).unwrap();
        assert_eq!(probed.try_score(1, -Score::INF, Score::INF, 7), Some(Score::MATE - 10));
    }
}
