//! Crate-level search tests: whole-search behavior that no single module
//! owns, exercised through a one-worker harness.

use crate::evaluate::Score;
use crate::evaluate::ScoreExt;
use crate::position::Position;
use crate::search::params::MAX_DEPTH;
use crate::search::pv::PVTable;
use crate::search::search_go;
use crate::search::Limits;
use crate::search::Shared;
use crate::search::StackFrame;
use crate::search::Worker;
use crate::transpositions::TTable;
use chess::movegen::moves::Move;
use chess::movegen::moves::MoveList;
use std::sync::atomic::AtomicBool;

/// Run a single-worker iterative search to `depth` with a fresh table,
/// without spawning any threads. Returns the final score, the best move
/// and the node count.
fn run_search(fen: &str, depth: usize) -> (Score, Option<Move>, u64) {
    let position = Position::new(fen.parse().unwrap());
    let tt = TTable::with_capacity_mb(16);
    let shared = Shared::new(&tt, Limits { depth, ..Limits::default() }, 1, 10);
    let mut worker = Worker::new(0, &shared, position, &[]);

    let mut pv = PVTable::new();
    let mut score = 0;

    for d in 1..=depth {
        score = worker
            .aspirate(d, &mut pv, score)
            .expect("nothing raises the abort signal here");
    }

    (score, pv.best_move(), shared.total_nodes())
}

#[test]
fn mate_in_one_is_found() {
    // Back-rank mate: Ra8#
    let (score, best, _) = run_search("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 2);

    assert_eq!(score, Score::MATE - 1);
    assert_eq!(best.unwrap().to_string(), "a1a8");
}

#[test]
fn mate_in_two_is_found() {
    // 1. Kb6 Kb8 (forced) 2. Rh8#
    let (score, best, _) = run_search("k7/8/8/1K6/8/8/8/7R w - - 0 1", 6);

    assert_eq!(score, Score::MATE - 3);
    assert_eq!(best.unwrap().to_string(), "b5b6");
}

#[test]
fn stalemate_scores_as_a_draw() {
    let position = Position::new("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1".parse().unwrap());
    let tt = TTable::with_capacity_mb(1);
    let shared = Shared::new(&tt, Limits::default(), 1, 10);
    let mut worker = Worker::new(0, &shared, position.clone(), &[]);

    let mut pv = PVTable::new();
    let score = worker
        .recurse::<false>(&position, 0, 4, -Score::INF, Score::INF, &mut pv)
        .unwrap();

    // Stalemate is a draw, scored with contempt from the mover's view, and
    // emphatically not a mate.
    assert_eq!(score, worker.draw_score(0));
    assert!(!score.is_mate());
}

#[test]
fn single_worker_search_is_deterministic() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    let (score_a, best_a, nodes_a) = run_search(fen, 5);
    let (score_b, best_b, nodes_b) = run_search(fen, 5);

    assert_eq!(score_a, score_b);
    assert_eq!(best_a, best_b);
    assert_eq!(nodes_a, nodes_b);
}

#[test]
fn kiwipete_search_produces_a_legal_best_move() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let (_, best, nodes) = run_search(fen, 6);

    let board: chess::board::Board = fen.parse().unwrap();
    let mut legal = MoveList::new();
    board.all_moves(&mut legal);
    let pins = board.pin_info();

    let best = best.expect("a completed search always has a best move");
    assert!(nodes > 0);
    assert!(legal
        .into_iter()
        .filter(|&mv| board.pseudo_is_legal(mv, &pins))
        .any(|mv| mv == best));
}

#[test]
fn windowed_searches_respect_fail_soft_bounds() {
    let fen = "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10";
    let depth = 4;

    let (reference, _, _) = run_search(fen, depth);

    // A window entirely above the true score must fail low...
    let position = Position::new(fen.parse().unwrap());
    let tt = TTable::with_capacity_mb(16);
    let shared = Shared::new(&tt, Limits::default(), 1, 10);
    let mut worker = Worker::new(0, &shared, position.clone(), &[]);
    let mut pv = PVTable::new();

    let failed_low = worker
        .recurse::<false>(&position, 0, depth as i32, reference + 200, reference + 300, &mut pv)
        .unwrap();
    assert!(failed_low <= reference + 200);

    // ...and a window entirely below it must fail high.
    let tt = TTable::with_capacity_mb(16);
    let shared = Shared::new(&tt, Limits::default(), 1, 10);
    let mut worker = Worker::new(0, &shared, position.clone(), &[]);

    let failed_high = worker
        .recurse::<false>(&position, 0, depth as i32, reference - 300, reference - 200, &mut pv)
        .unwrap();
    assert!(failed_high >= reference - 200);
}

#[test]
fn repetitions_are_recognized() {
    let mut position = Position::new(chess::board::Board::default());
    let mut history = vec![StackFrame { key: position.key.0, move_key: 0 }];

    for mv in ["g1f3", "g8f6", "f3g1", "f6g8"] {
        let mv = position.board.find_move(mv.parse().unwrap()).unwrap();
        position = position.play_move(mv);
        history.push(StackFrame { key: position.key.0, move_key: mv.from_to() });
    }

    let tt = TTable::with_capacity_mb(1);
    let shared = Shared::new(&tt, Limits::default(), 1, 10);
    let worker = Worker::new(0, &shared, position.clone(), &history);

    // The knights have shuffled home: the root repeats the start position
    assert!(worker.is_repetition(&position));
}

#[test]
fn node_limit_stops_the_search() {
    let position = Position::new(chess::board::Board::default());
    let tt = TTable::with_capacity_mb(16);
    let stop = AtomicBool::new(false);

    let lim = Limits { nodes: 10_000, ..Limits::default() };
    let nodes = search_go(&position, &[], lim, &tt, 1, 10, &stop);

    // The limit is enforced between 5ms polls, so allow generous overshoot,
    // but the search must not have run anywhere near to completion.
    assert!(nodes >= 1);
    assert!(nodes < 50_000_000, "the node limit failed to stop the search");
}

#[test]
fn parallel_search_terminates_and_agrees_roughly() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let position = Position::new(fen.parse().unwrap());
    let tt = TTable::with_capacity_mb(16);
    let stop = AtomicBool::new(false);

    let lim = Limits { depth: 6, ..Limits::default() };
    let nodes = search_go(&position, &[], lim, &tt, 4, 10, &stop);

    assert!(nodes > 0);
}

#[test]
fn depth_one_search_of_every_bench_position_terminates() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    ];

    for fen in fens {
        let (score, best, _) = run_search(fen, 1);
        assert!(best.is_some(), "no best move for {fen}");
        assert!(score.abs() <= Score::MATE, "wild score for {fen}");
    }
}

#[test]
fn deeper_searches_visit_more_nodes() {
    let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    let (_, _, shallow) = run_search(fen, 3);
    let (_, _, deep) = run_search(fen, 6);

    assert!(deep > shallow);
}

#[test]
fn max_depth_limit_is_sane() {
    // The signal word has one bit per worker, the history bonus squares the
    // depth: both need the constants to stay in range.
    assert!(MAX_DEPTH <= 127);
    assert!((MAX_DEPTH * MAX_DEPTH) as i32 <= i32::MAX / 2);
}
