//! The search recursion.
//!
//! One generic function covers both the full-width search and quiescence;
//! the `QS` const parameter selects the variant and the compiler emits the
//! two specialisations. The shared shape:
//!
//! 1. count the node and poll the abort signal;
//! 2. statically evaluate (positions in check have no static eval);
//! 3. handle rule draws, the ply ceiling, and the quiescence stand-pat;
//! 4. probe the transposition table, possibly cutting off outright;
//! 5. run the move loop: pick moves best-first, skip illegal ones, recurse
//!    with principal-variation windows and late-move reductions;
//! 6. conclude: mate/stalemate if nothing was legal, otherwise update the
//!    ordering tables on a beta cutoff and store the result in the table.
//!
//! Full-width nodes generate every move and switch to quiescence when the
//! remaining depth runs out. Quiescence nodes generate only captures and
//! promotions (or evasions while in check), may stand pat, and guard
//! against deep capture-fests by trusting `eval + see` past a depth floor.

use super::params::reduction;
use super::params::LMR_MIN_DEPTH;
use super::params::MAX_PLY;
use super::params::QSEARCH_DEPTH_FLOOR;
use super::pv::PVTable;
use super::Abort;
use super::Worker;
use super::STOP;
use crate::evaluate::evaluate;
use crate::evaluate::Score;
use crate::evaluate::ScoreExt;
use crate::history_tables::history::HISTORY_MAX;
use crate::move_picker::MovePicker;
use crate::position::Position;
use crate::transpositions::Bound;
use crate::transpositions::TTEntry;
use arrayvec::ArrayVec;
use chess::movegen::moves::Move;
use std::sync::atomic::Ordering;

/// Only this many early quiet moves are remembered for the history penalty
/// on a cutoff; with decent ordering the cutoff rarely comes later anyway.
const MAX_QUIETS_TRIED: usize = 32;

impl Worker<'_> {
    pub fn recurse<const QS: bool>(
        &mut self,
        pos: &Position,
        ply: usize,
        depth: i32,
        mut alpha: Score,
        beta: Score,
        pv: &mut PVTable,
    ) -> Result<Score, Abort> {
        self.count_node();
        pv.clear();

        // Cooperative cancellation, observed at every node entry
        let signal = self.shared.signal.load(Ordering::Relaxed);

        if signal == STOP {
            return Err(Abort::All);
        }

        if signal & (1 << self.id) != 0 {
            return Err(Abort::One);
        }

        let in_check = pos.board.in_check();

        let eval = if in_check {
            -Score::INF
        } else {
            evaluate(pos, &mut self.pawn_cache)
        };

        if ply >= MAX_PLY {
            return Ok(eval);
        }

        if ply > 0 && (pos.board.half_moves >= 100 || self.is_repetition(pos)) {
            return Ok(self.draw_score(ply));
        }

        let mut best_score = -Score::INF;

        // Stand pat: in quiescence the side to move can decline to capture
        // anything and take the static eval instead.
        if QS && !in_check {
            best_score = eval;

            if best_score > alpha {
                alpha = best_score;
            }

            if best_score >= beta {
                return Ok(best_score);
            }
        }

        let tt_entry = self.shared.tt.probe(pos.key);
        let mut tt_move = Move::NULL;

        if let Some(entry) = tt_entry {
            tt_move = entry.best_move();

            // The root always plays a move, so no early outs there
            if ply > 0 {
                if let Some(score) = entry.try_score(depth, alpha, beta, ply) {
                    return Ok(score);
                }
            }
        }

        ////////////////////////////////////////////////////////////////////////
        //
        // The move loop
        //
        ////////////////////////////////////////////////////////////////////////

        let us = pos.board.current;
        let parent_key = self.parent_move_key();
        let pins = pos.board.pin_info();

        let mut picker = MovePicker::new(
            &pos.board,
            depth,
            tt_move,
            self.history.killers.get(ply),
            self.history.refutations.get(parent_key),
            &self.history.main,
        );

        let original_alpha = alpha;
        let mut best_move = Move::NULL;
        let mut move_count = 0;
        let mut quiets_tried: ArrayVec<Move, MAX_QUIETS_TRIED> = ArrayVec::new();
        let mut local_pv = PVTable::new();

        while let Some((mv, see)) = picker.next(&pos.board) {
            if !pos.board.pseudo_is_legal(mv, &pins) {
                continue;
            }

            move_count += 1;
            local_pv.clear();

            // Losing captures don't stabilise anything; quiescence skips
            // them outright (evasions excepted).
            if QS && !in_check && see < 0 {
                continue;
            }

            let next_depth = depth - 1;

            let score = if QS && !in_check && depth <= QSEARCH_DEPTH_FLOOR {
                // Deep capture chains stopped paying for themselves a while
                // ago; settle for the static exchange estimate.
                eval + see
            } else {
                let next = pos.play_move(mv);
                self.push(&next, mv);

                let score = if QS || move_count == 1 {
                    -self.child(&next, ply + 1, next_depth, -beta, -alpha, &mut local_pv)?
                } else {
                    // Zero-window scout for later moves, reduced when the
                    // move is a late quiet one.
                    let mut r = 0;

                    if depth >= LMR_MIN_DEPTH && mv.is_quiet() && !in_check {
                        r = reduction(depth, move_count);
                    }

                    let mut score = -self.child(
                        &next,
                        ply + 1,
                        next_depth - r,
                        -alpha - 1,
                        -alpha,
                        &mut local_pv,
                    )?;

                    // A reduced search that beats alpha proves nothing yet;
                    // repeat at full depth.
                    if score > alpha && r > 0 {
                        score = -self.child(
                            &next,
                            ply + 1,
                            next_depth,
                            -alpha - 1,
                            -alpha,
                            &mut local_pv,
                        )?;
                    }

                    // Inside the window the scout only proves "better than
                    // alpha"; get the exact score.
                    if score > alpha && score < beta {
                        score = -self.child(
                            &next,
                            ply + 1,
                            next_depth,
                            -beta,
                            -alpha,
                            &mut local_pv,
                        )?;
                    }

                    score
                };

                self.pop();
                score
            };

            if score > best_score {
                best_score = score;
            }

            if score >= beta {
                best_move = mv;
                break;
            }

            if score > alpha {
                alpha = score;
                best_move = mv;
                pv.prepend(mv, &local_pv);
            }

            if mv.is_quiet() && !quiets_tried.is_full() {
                quiets_tried.push(mv);
            }
        }

        ////////////////////////////////////////////////////////////////////////
        //
        // Conclusion
        //
        ////////////////////////////////////////////////////////////////////////

        if move_count == 0 {
            // In the full-width search (and for evasion nodes) no legal
            // move means the game is over right here. A quiet quiescence
            // node just keeps its stand-pat score.
            if in_check {
                return Ok(ply as Score - Score::MATE);
            }

            if !QS {
                return Ok(self.draw_score(ply));
            }
        }

        if !QS && best_score >= beta && best_move.is_quiet() {
            let bonus = (depth * depth).min(HISTORY_MAX);
            self.history
                .quiet_cutoff(us, ply, parent_key, best_move, &quiets_tried, bonus);
        }

        let bound = if best_score >= beta {
            Bound::Lower
        } else if best_score > original_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };

        self.shared
            .tt
            .insert(TTEntry::new(pos.key, best_move, best_score, depth, bound, ply));

        Ok(best_score)
    }

    /// Recurse into a child node: the full-width form while depth remains,
    /// the quiescence form once it runs out.
    fn child(
        &mut self,
        next: &Position,
        ply: usize,
        depth: i32,
        alpha: Score,
        beta: Score,
        pv: &mut PVTable,
    ) -> Result<Score, Abort> {
        if depth > 0 {
            self.recurse::<false>(next, ply, depth, alpha, beta, pv)
        } else {
            self.recurse::<true>(next, ply, depth, alpha, beta, pv)
        }
    }
}
