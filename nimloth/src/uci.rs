//! The UCI front end.
//!
//! Reads commands from stdin, keeps the current position and game history,
//! and hands searches off to a background thread so `stop` stays
//! responsive. Search output (the `info` lines and the final `bestmove`)
//! goes through the [`Reporter`], which the search controller also consults
//! for its "has depth 1 completed yet" guard.
//!
//! Only the workaday subset of the protocol is spoken: `uci`, `isready`,
//! `ucinewgame`, `position`, `go`, `setoption`, `stop`, `quit`, plus `d`
//! and `perft` for debugging at the prompt.

use crate::evaluate::Score;
use crate::evaluate::ScoreExt;
use crate::position::Position;
use crate::search::params::MAX_WORKERS;
use crate::search::pv::PVTable;
use crate::search::search_go;
use crate::search::Limits;
use crate::search::StackFrame;
use crate::transpositions::TTable;
use anyhow::anyhow;
use chess::board::Board;
use chess::movegen::moves::BareMove;
use chess::movegen::moves::Move;
use std::io::BufRead;
use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Instant;

const NAME: &str = "Nimloth";
const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_HASH_MB: usize = 64;
const DEFAULT_CONTEMPT: Score = 10;

////////////////////////////////////////////////////////////////////////////////
//
// The reporter
//
////////////////////////////////////////////////////////////////////////////////

/// Collects search progress and prints the UCI `info`/`bestmove` lines.
///
/// Workers report completed iterations concurrently, so the state sits
/// behind its own mutex; only strictly deeper results are accepted.
pub struct Reporter {
    start: Instant,
    state: Mutex<ReportState>,
}

#[derive(Default)]
struct ReportState {
    last_depth: usize,
    best: Move,
    ponder: Move,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            state: Mutex::new(ReportState::default()),
        }
    }

    /// Report a completed iteration. Shallower results than the best so far
    /// are dropped; a `partial` result is printed but doesn't update the
    /// best move.
    pub fn update(&self, depth: usize, score: Score, nodes: u64, pv: &PVTable, partial: bool) {
        let mut state = self.state.lock().unwrap();

        if depth <= state.last_depth {
            return;
        }

        if !partial {
            state.last_depth = depth;

            if let Some(best) = pv.best_move() {
                state.best = best;
                state.ponder = pv.moves().get(1).copied().unwrap_or(Move::NULL);
            }
        }

        let millis = self.start.elapsed().as_millis() as u64;
        let nps = nodes * 1000 / millis.max(1);

        println!(
            "info depth {depth} score {} nodes {nodes} nps {nps} time {millis} pv {pv}",
            format_score(score)
        );
    }

    /// The deepest fully completed iteration so far
    pub fn last_depth(&self) -> usize {
        self.state.lock().unwrap().last_depth
    }

    /// The best move found so far
    pub fn best(&self) -> Move {
        self.state.lock().unwrap().best
    }

    /// Print the final `bestmove` line
    pub fn print_bestmove(&self) {
        let state = self.state.lock().unwrap();

        if state.ponder == Move::NULL {
            println!("bestmove {}", state.best);
        } else {
            println!("bestmove {} ponder {}", state.best, state.ponder);
        }
    }
}

fn format_score(score: Score) -> String {
    if score.is_mate() {
        let moves = (score.mate_distance() + 1) / 2;

        if score > 0 {
            format!("mate {moves}")
        } else {
            format!("mate -{moves}")
        }
    } else {
        format!("cp {score}")
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// The UCI loop
//
////////////////////////////////////////////////////////////////////////////////

struct UciState {
    position: Position,
    game_history: Vec<StackFrame>,
    tt: Arc<TTable>,
    threads: usize,
    contempt: Score,
    stop: Arc<AtomicBool>,
    search: Option<JoinHandle<u64>>,
}

/// Run the UCI loop until `quit` or the end of input
pub fn run() -> anyhow::Result<()> {
    let mut state = UciState::new();
    let stdin = std::io::stdin().lock();

    for line in stdin.lines() {
        let line = line?;

        if !state.handle(line.trim())? {
            break;
        }

        std::io::stdout().flush()?;
    }

    state.finish_search();
    Ok(())
}

impl UciState {
    fn new() -> Self {
        let position = Position::new(Board::default());
        let game_history = vec![StackFrame { key: position.key.0, move_key: 0 }];

        Self {
            position,
            game_history,
            tt: Arc::new(TTable::with_capacity_mb(DEFAULT_HASH_MB)),
            threads: 1,
            contempt: DEFAULT_CONTEMPT,
            stop: Arc::new(AtomicBool::new(false)),
            search: None,
        }
    }

    /// Handle one line of input. Returns false when the loop should end.
    fn handle(&mut self, line: &str) -> anyhow::Result<bool> {
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("uci") => {
                println!("id name {NAME} {VERSION}");
                println!("id author the Nimloth developers");
                println!(
                    "option name Hash type spin default {DEFAULT_HASH_MB} min 1 max 65536"
                );
                println!(
                    "option name Threads type spin default 1 min 1 max {MAX_WORKERS}"
                );
                println!(
                    "option name Contempt type spin default {DEFAULT_CONTEMPT} min -100 max 100"
                );
                println!("option name Clear Hash type button");
                println!("uciok");
            }

            Some("isready") => println!("readyok"),

            Some("ucinewgame") => {
                self.finish_search();
                self.tt.clear();
                self.set_position(Board::default());
            }

            Some("position") => {
                if let Err(err) = self.parse_position(line) {
                    eprintln!("{err}");
                }
            }

            Some("go") => self.go(tokens),

            Some("stop") => self.stop.store(true, Ordering::Relaxed),

            Some("setoption") => {
                if let Err(err) = self.parse_setoption(line) {
                    eprintln!("{err}");
                }
            }

            Some("d") => println!("{}", self.position.board),

            Some("perft") => {
                let depth = tokens.next().and_then(|d| d.parse().ok()).unwrap_or(1);
                self.perft(depth);
            }

            Some("quit") => {
                self.stop.store(true, Ordering::Relaxed);
                return Ok(false);
            }

            Some(other) => eprintln!("Unknown command: {other}"),

            None => {}
        }

        Ok(true)
    }

    /// Install a fresh starting board and reset the game history
    fn set_position(&mut self, board: Board) {
        self.position = Position::new(board);
        self.game_history = vec![StackFrame { key: self.position.key.0, move_key: 0 }];
    }

    /// `position [startpos | fen <FEN>] [moves <move>...]`
    fn parse_position(&mut self, line: &str) -> anyhow::Result<()> {
        let rest = line.strip_prefix("position").unwrap_or(line).trim();

        let (board, moves) = if let Some(moves) = rest.strip_prefix("startpos") {
            (Board::default(), moves)
        } else if let Some(rest) = rest.strip_prefix("fen") {
            let fen = rest.split("moves").next().unwrap_or(rest).trim();
            (fen.parse()?, rest)
        } else {
            return Err(anyhow!("Not a valid position command: {line}"));
        };

        self.set_position(board);

        let move_list = moves
            .split("moves")
            .nth(1)
            .map(str::trim)
            .unwrap_or("");

        for mv in move_list.split_whitespace() {
            let bare: BareMove = mv.parse()?;

            let mv = self
                .position
                .board
                .find_move(bare)
                .ok_or(anyhow!("Illegal move: {bare}"))?;

            self.position = self.position.play_move(mv);
            self.game_history.push(StackFrame {
                key: self.position.key.0,
                move_key: mv.from_to(),
            });
        }

        Ok(())
    }

    /// `go [depth|nodes|movetime|wtime|btime|winc|binc|movestogo|infinite]*`
    fn go<'a>(&mut self, mut tokens: impl Iterator<Item = &'a str>) {
        let mut lim = Limits::default();
        let us = self.position.board.current;

        while let Some(token) = tokens.next() {
            let mut value = || tokens.next().and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);

            match token {
                "depth" => lim.depth = (value() as usize).clamp(1, Limits::default().depth),
                "nodes" => lim.nodes = value(),
                "movetime" => lim.movetime = value(),
                "wtime" if us.is_white() => lim.time = value(),
                "btime" if !us.is_white() => lim.time = value(),
                "winc" if us.is_white() => lim.inc = value(),
                "binc" if !us.is_white() => lim.inc = value(),
                "movestogo" => lim.movestogo = value(),
                "infinite" => {}
                _ => {}
            }
        }

        // A clock but no explicit movetime: budget a simple slice of the
        // remaining time. Anything smarter is the GUI's problem.
        if lim.movetime == 0 && lim.time != 0 {
            let togo = if lim.movestogo != 0 { lim.movestogo } else { 30 };
            let budget = lim.time / togo + lim.inc / 2;
            lim.movetime = budget.min(lim.time.saturating_sub(50)).max(1);
        }

        self.finish_search();
        self.stop.store(false, Ordering::Relaxed);

        let position = self.position.clone();
        let history = self.game_history.clone();
        let tt = Arc::clone(&self.tt);
        let stop = Arc::clone(&self.stop);
        let threads = self.threads;
        let contempt = self.contempt;

        self.search = Some(std::thread::spawn(move || {
            search_go(&position, &history, lim, &tt, threads, contempt, &stop)
        }));
    }

    /// `setoption name <name> [value <value>]`
    fn parse_setoption(&mut self, line: &str) -> anyhow::Result<()> {
        let rest = line.strip_prefix("setoption").unwrap_or(line).trim();
        let rest = rest.strip_prefix("name").unwrap_or(rest).trim();

        let (name, value) = match rest.split_once("value") {
            Some((name, value)) => (name.trim(), value.trim()),
            None => (rest, ""),
        };

        match name {
            "Hash" => {
                let mb = value.parse()?;
                self.finish_search();
                self.tt = Arc::new(TTable::with_capacity_mb(mb));
            }

            "Threads" => {
                self.threads = value.parse::<usize>()?.clamp(1, MAX_WORKERS);
            }

            "Contempt" => {
                self.contempt = value.parse::<Score>()?.clamp(-100, 100);
            }

            "Clear Hash" => {
                self.finish_search();
                self.tt.clear();
            }

            _ => return Err(anyhow!("Unknown option: {name}")),
        }

        Ok(())
    }

    fn perft(&self, depth: usize) {
        let start = Instant::now();
        let results = chess::perft::divide(&self.position.board, depth);
        let total: u64 = results.iter().map(|(_, nodes)| nodes).sum();

        for (mv, nodes) in results {
            println!("{mv}: {nodes}");
        }

        let millis = start.elapsed().as_millis().max(1) as u64;
        println!();
        println!("Nodes: {total}");
        println!("NPS:   {}", total * 1000 / millis);
    }

    /// Wait for a running search to come back (signalling it to stop first
    /// would be rude: `go movetime`/`depth` searches finish on their own,
    /// and `stop` has already raised the flag when appropriate).
    fn finish_search(&mut self) {
        if let Some(handle) = self.search.take() {
            let _ = handle.join();
        }
    }
}
