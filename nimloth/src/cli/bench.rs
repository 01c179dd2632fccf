//! The `bench` subcommand: search a fixed suite of positions at a fixed
//! depth with a single worker and report the node total.
//!
//! Because a one-worker search with a clean table is deterministic, the
//! node count doubles as a quick regression check: if a change was meant
//! to be search-neutral and the bench count moved, it wasn't.

use crate::position::Position;
use crate::search::search_go;
use crate::search::Limits;
use crate::transpositions::TTable;
use colored::Colorize;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

const BENCH_POSITIONS: [&str; 8] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "3r1rk1/p5pp/bpp1pp2/8/q1PP1P2/b3P3/P2NQRPP/1R2B1K1 b - - 6 22",
    "8/8/1p1k2p1/p1prp2p/P2n3P/6P1/5P2/4R1K1 b - - 14 36",
];

pub fn bench(depth: usize) -> anyhow::Result<()> {
    let mut total_nodes = 0u64;
    let start = Instant::now();
    let stop = AtomicBool::new(false);

    for fen in BENCH_POSITIONS {
        println!("{} {fen}", "bench:".blue());

        let position = Position::new(fen.parse()?);
        let tt = TTable::with_capacity_mb(16);
        let lim = Limits { depth, ..Limits::default() };

        total_nodes += search_go(&position, &[], lim, &tt, 1, 10, &stop);
    }

    let elapsed = start.elapsed();
    let nps = (total_nodes as f64 / elapsed.as_secs_f64()) as u64;

    println!();
    println!("{} {total_nodes} nodes", "Total:".blue());
    println!("{} {:.3}s ({nps} nps)", "Time:".blue(), elapsed.as_secs_f64());

    Ok(())
}
