//! The `perft` subcommand: count move generation leaf nodes, split by root
//! move, for validating the generator against known totals.

use anyhow::Context;
use chess::board::Board;
use chess::perft::divide;
use colored::Colorize;
use itertools::Itertools;
use std::time::Instant;

pub fn perft(depth: usize, fen: Option<String>) -> anyhow::Result<()> {
    let board: Board = match fen {
        Some(fen) => fen.parse().context("invalid FEN string")?,
        None => Board::default(),
    };

    println!("{board}\n");

    let start = Instant::now();
    let results = divide(&board, depth);
    let elapsed = start.elapsed();

    for (mv, nodes) in results.iter().sorted_by_key(|(mv, _)| mv.to_string()) {
        println!("{:>6}: {nodes}", mv.to_string());
    }

    let total: u64 = results.iter().map(|(_, nodes)| nodes).sum();
    let nps = (total as f64 / elapsed.as_secs_f64()) as u64;

    println!();
    println!("{} {total}", "Total:".blue());
    println!("{} {:.3}s ({nps} nps)", "Time:".blue(), elapsed.as_secs_f64());

    Ok(())
}
