//! The search: a pool of workers running iterative deepening over a shared
//! transposition table, coordinated through a single atomic signal word.
//!
//! Each worker owns everything it mutates per node (pawn cache, history
//! tables, game stack), so the only shared mutable state is the signal, the
//! per-worker depth table behind the scheduling mutex, the transposition
//! table (lock-free by design) and the reporter.
//!
//! Cancellation is cooperative. Bit `i` of the signal tells worker `i` to
//! abandon its current iteration; all bits set tells everyone to stop
//! altogether. Workers poll the signal at every node and unwind by
//! propagating an [`Abort`] error value up the recursion, restoring their
//! game stack at the top of the iterate loop.

pub mod aspiration;
pub mod params;
pub mod pv;
pub mod recurse;

use crate::evaluate::params::PAWN_EG;
use crate::evaluate::pawn_cache::PawnCache;
use crate::evaluate::Score;
use crate::history_tables::History;
use crate::position::Position;
use crate::transpositions::TTable;
use crate::uci::Reporter;
use params::MAX_WORKERS;
use pv::PVTable;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

/// The signal value that stops every worker
pub const STOP: u64 = u64::MAX;

/// How a search may be bounded. Zero means unbounded for every field but
/// `depth`.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub depth: usize,
    pub movetime: u64,
    pub nodes: u64,
    pub time: u64,
    pub inc: u64,
    pub movestogo: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            depth: params::MAX_DEPTH,
            movetime: 0,
            nodes: 0,
            time: 0,
            inc: 0,
            movestogo: 0,
        }
    }
}

/// Why the recursion is being unwound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abort {
    /// This worker's iteration is obsolete; move on to the next depth
    One,

    /// The whole search is over
    All,
}

/// One entry of a worker's game stack: a position that has been reached,
/// and the from/to key of the move that reached it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackFrame {
    pub key: u64,
    pub move_key: usize,
}

////////////////////////////////////////////////////////////////////////////////
//
// Shared search state
//
////////////////////////////////////////////////////////////////////////////////

pub struct Shared<'a> {
    /// Bit `i` set: worker `i` must abort its iteration. All ones: stop.
    pub signal: AtomicU64,

    /// The depth every worker is currently searching. The mutex protects
    /// scheduling decisions made from this table, not the signal itself.
    pub schedule: Mutex<Vec<usize>>,

    /// Per-worker node counters; the report total is their sum
    pub nodes: Vec<AtomicU64>,

    pub tt: &'a TTable,
    pub reporter: Reporter,
    pub lim: Limits,
    pub contempt: Score,
}

impl<'a> Shared<'a> {
    pub fn new(tt: &'a TTable, lim: Limits, workers: usize, contempt: Score) -> Self {
        Self {
            signal: AtomicU64::new(0),
            schedule: Mutex::new(vec![0; workers]),
            nodes: (0..workers).map(|_| AtomicU64::new(0)).collect(),
            tt,
            reporter: Reporter::new(),
            lim,
            contempt,
        }
    }

    /// Total nodes searched so far, summed over all workers
    pub fn total_nodes(&self) -> u64 {
        self.nodes.iter().map(|n| n.load(Ordering::Relaxed)).sum()
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Workers
//
////////////////////////////////////////////////////////////////////////////////

pub struct Worker<'a> {
    pub id: usize,
    pub shared: &'a Shared<'a>,

    /// The root position this worker searches from
    root: Position,

    /// The game so far plus the moves of the current line. Used for
    /// repetition detection and for keying the refutation table. Restored
    /// to the root portion whenever an iteration is aborted.
    stack: Vec<StackFrame>,
    root_len: usize,

    pub history: History,
    pub pawn_cache: PawnCache,
}

impl<'a> Worker<'a> {
    /// Create a worker. `game_history` holds a frame per position reached
    /// in the game so far, the root included.
    pub fn new(id: usize, shared: &'a Shared<'a>, root: Position, game_history: &[StackFrame]) -> Self {
        let mut stack = game_history.to_vec();

        if stack.is_empty() {
            stack.push(StackFrame { key: root.key.0, move_key: 0 });
        }

        Self {
            id,
            shared,
            root,
            root_len: stack.len(),
            stack,
            history: History::new(),
            pawn_cache: PawnCache::new(),
        }
    }

    /// A clone of the root position, for starting an iteration
    pub fn root(&self) -> Position {
        self.root.clone()
    }

    /// Record a position the current line just reached
    pub(crate) fn push(&mut self, next: &Position, mv: chess::movegen::moves::Move) {
        self.stack.push(StackFrame { key: next.key.0, move_key: mv.from_to() });
    }

    pub(crate) fn pop(&mut self) {
        self.stack.pop();
    }

    /// The from/to key of the move that led to the current node
    pub(crate) fn parent_move_key(&self) -> usize {
        self.stack.last().map(|frame| frame.move_key).unwrap_or(0)
    }

    /// Has the current position occurred before, within the reach of the
    /// halfmove clock? The stack's top frame is the current position, so
    /// the scan starts two plies back and steps by two.
    pub(crate) fn is_repetition(&self, pos: &Position) -> bool {
        self.stack
            .iter()
            .rev()
            .skip(2)
            .step_by(2)
            .take(pos.board.half_moves as usize / 2)
            .any(|frame| frame.key == pos.key.0)
    }

    /// The score of a drawn position. Contempt steers the engine away from
    /// (positive values) or towards (negative values) draws, measured in
    /// hundredths of an endgame pawn, and flips sign with the side to move.
    pub(crate) fn draw_score(&self, ply: usize) -> Score {
        let contempt = self.shared.contempt * PAWN_EG / 100;

        if ply % 2 == 1 {
            contempt
        } else {
            -contempt
        }
    }

    /// Bump this worker's node counter
    pub(crate) fn count_node(&self) {
        self.shared.nodes[self.id].fetch_add(1, Ordering::Relaxed);
    }

    /// The iterative deepening loop for one worker.
    ///
    /// Workers schedule themselves: before starting a depth, a worker
    /// checks (under the scheduling mutex) whether half of the other
    /// workers are already on that depth or beyond, and if so skips ahead.
    /// When a worker completes an iteration, it signals everyone still
    /// working on that depth or shallower to move on.
    pub fn iterate(&mut self) {
        let shared = self.shared;
        let workers = shared.nodes.len();
        let mut pv = PVTable::new();
        let mut score: Score = 0;

        for depth in 1..=shared.lim.depth {
            {
                let mut depths = shared.schedule.lock().unwrap();

                if shared.signal.load(Ordering::Relaxed) == STOP {
                    return;
                }

                // A fresh iteration starts with a clean slate
                shared.signal.fetch_and(!(1 << self.id), Ordering::Relaxed);

                // Skip depths enough other workers already cover. Not at
                // depth 1 (everyone should finish it fast) and not at the
                // last depth (there is nothing to skip ahead to).
                if workers >= 2 && depth >= 2 && depth < shared.lim.depth {
                    let covered = depths
                        .iter()
                        .enumerate()
                        .filter(|&(id, &d)| id != self.id && d >= depth)
                        .count();

                    if covered >= workers / 2 {
                        continue;
                    }
                }

                depths[self.id] = depth;
            }

            match self.aspirate(depth, &mut pv, score) {
                Ok(s) => {
                    score = s;

                    // Everyone still on an obsolete iteration gets signalled
                    // to move on to the next depth.
                    {
                        let depths = shared.schedule.lock().unwrap();
                        let mut obsolete = 0u64;

                        for (id, &d) in depths.iter().enumerate() {
                            if id != self.id && d <= depth {
                                obsolete |= 1 << id;
                            }
                        }

                        shared.signal.fetch_or(obsolete, Ordering::Relaxed);
                    }

                    shared
                        .reporter
                        .update(depth, score, shared.total_nodes(), &pv, false);
                }

                Err(Abort::One) => {
                    self.stack.truncate(self.root_len);
                    continue;
                }

                Err(Abort::All) => {
                    self.stack.truncate(self.root_len);
                    break;
                }
            }
        }

        // This worker is done; everyone should stop.
        let _guard = shared.schedule.lock().unwrap();
        shared.signal.store(STOP, Ordering::Relaxed);
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// The controller
//
////////////////////////////////////////////////////////////////////////////////

/// Run a full search: spawn the workers, poll for termination, and print
/// the best move when everything has come back. Returns the total node
/// count.
pub fn search_go(
    root: &Position,
    game_history: &[StackFrame],
    lim: Limits,
    tt: &TTable,
    threads: usize,
    contempt: Score,
    stop: &AtomicBool,
) -> u64 {
    let start = Instant::now();
    let workers = threads.clamp(1, MAX_WORKERS);
    let shared = Shared::new(tt, lim, workers, contempt);

    std::thread::scope(|scope| {
        for id in 0..workers {
            let shared = &shared;
            let root = root.clone();

            scope.spawn(move || Worker::new(id, shared, root, game_history).iterate());
        }

        // Poll for termination conditions, but only enforce them once depth
        // 1 has completed, so there is always a move to play.
        loop {
            std::thread::sleep(Duration::from_millis(5));

            if shared.signal.load(Ordering::Relaxed) == STOP {
                break;
            }

            if shared.reporter.last_depth() >= 1 {
                let out_of_nodes =
                    shared.lim.nodes != 0 && shared.total_nodes() >= shared.lim.nodes;
                let out_of_time = shared.lim.movetime != 0
                    && start.elapsed().as_millis() as u64 >= shared.lim.movetime;

                if out_of_nodes || out_of_time || stop.load(Ordering::Relaxed) {
                    let _guard = shared.schedule.lock().unwrap();
                    shared.signal.store(STOP, Ordering::Relaxed);
                }
            }
        }
    });

    shared.reporter.print_bestmove();
    shared.total_nodes()
}
