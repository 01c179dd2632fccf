//! Killer moves: one quiet move per ply that last produced a beta cutoff.
//!
//! A refutation that worked in one branch very often works in its siblings
//! too, since most moves at the previous ply don't defend against it.

use crate::search::params::MAX_PLY;
use chess::movegen::moves::Move;

pub struct Killers {
    moves: [Move; MAX_PLY + 1],
}

impl Killers {
    pub fn new() -> Self {
        Self {
            moves: [Move::NULL; MAX_PLY + 1],
        }
    }

    #[inline(always)]
    pub fn get(&self, ply: usize) -> Move {
        self.moves[ply]
    }

    pub fn store(&mut self, ply: usize, mv: Move) {
        self.moves[ply] = mv;
    }
}
