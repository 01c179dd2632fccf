//! Heuristic move-ordering state, owned by each worker.
//!
//! None of this is required for correctness; it exists purely to get likely
//! cutoff moves to the front of the move list. Three sources, from most to
//! least specific:
//!
//! - killers: the quiet move that last cut off at the same ply;
//! - refutations: the quiet move that last cut off in reply to the same
//!   preceding move;
//! - history: a long-running per-side score for every from/to pair.
//!
//! Everything here is reset at the start of each search.

pub mod history;
pub mod killers;
pub mod refutations;

use chess::movegen::moves::Move;
use chess::piece::Color;
use history::HistoryTable;
use killers::Killers;
use refutations::Refutations;

/// All per-worker ordering state in one bundle
pub struct History {
    pub main: HistoryTable,
    pub killers: Killers,
    pub refutations: Refutations,
}

impl History {
    pub fn new() -> Self {
        Self {
            main: HistoryTable::new(),
            killers: Killers::new(),
            refutations: Refutations::new(),
        }
    }

    /// Record a quiet move that caused a beta cutoff, and penalize the
    /// quiet moves that were tried before it and failed.
    pub fn quiet_cutoff(
        &mut self,
        us: Color,
        ply: usize,
        parent_key: usize,
        cutoff: Move,
        tried: &[Move],
        bonus: i32,
    ) {
        self.killers.store(ply, cutoff);
        self.refutations.store(parent_key, cutoff);
        self.main.update(us, cutoff, bonus);

        for &mv in tried.iter().filter(|&&mv| mv != cutoff) {
            self.main.update(us, mv, -bonus);
        }
    }
}
