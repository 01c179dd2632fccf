//! Refutations: the quiet reply that last cut off after a given move.
//!
//! Where killers are indexed by ply, refutations are indexed by the move
//! they answer, so they survive transpositions into entirely different
//! parts of the tree.

use chess::movegen::moves::Move;

/// One slot per from/to pair of the move being answered
const NB_REFUTATIONS: usize = 4096;

pub struct Refutations {
    moves: Box<[Move]>,
}

impl Refutations {
    pub fn new() -> Self {
        Self {
            moves: vec![Move::NULL; NB_REFUTATIONS].into_boxed_slice(),
        }
    }

    /// The stored reply to the move with the given from/to key
    #[inline(always)]
    pub fn get(&self, parent_key: usize) -> Move {
        self.moves[parent_key & (NB_REFUTATIONS - 1)]
    }

    pub fn store(&mut self, parent_key: usize, mv: Move) {
        self.moves[parent_key & (NB_REFUTATIONS - 1)] = mv;
    }
}
