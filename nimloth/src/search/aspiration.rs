//! Aspiration windows.
//!
//! From depth 2 onwards, instead of opening the root search with a full
//! window, start with a narrow one around the previous iteration's score.
//! Most of the time the new score lands inside it and the search gets all
//! the extra cutoffs a tight window buys. When it doesn't, widen towards
//! the side that failed (pulling the other bound to the midpoint) and try
//! again, growing the step exponentially so a wildly different score is
//! found in a handful of re-searches.

use super::pv::PVTable;
use super::Abort;
use super::Worker;
use crate::evaluate::Score;
use crate::evaluate::ScoreExt;

impl Worker<'_> {
    /// Search the root to `depth`, starting from a window around `score`
    /// (the previous iteration's result).
    pub fn aspirate(
        &mut self,
        depth: usize,
        pv: &mut PVTable,
        mut score: Score,
    ) -> Result<Score, Abort> {
        let root = self.root();

        // The first iteration has no score to center a window on
        if depth == 1 {
            return self.recurse::<false>(&root, 0, 1, -Score::INF, Score::INF, pv);
        }

        let mut delta = 15;
        let mut alpha = score - delta;
        let mut beta = score + delta;

        loop {
            score = self.recurse::<false>(&root, 0, depth as i32, alpha, beta, pv)?;

            if score <= alpha {
                beta = (alpha + beta) / 2;
                alpha -= delta;
            } else if score >= beta {
                alpha = (alpha + beta) / 2;
                beta += delta;
            } else {
                return Ok(score);
            }

            delta += delta * 876 / 1000;
        }
    }
}
