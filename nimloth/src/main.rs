//! Nimloth, a UCI chess engine.
//!
//! Run without arguments to speak UCI on stdin/stdout; the subcommands are
//! developer tools.

mod cli;
mod evaluate;
mod history_tables;
mod move_picker;
mod position;
mod search;
#[cfg(test)]
mod tests;
mod transpositions;
mod uci;
mod zobrist;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "nimloth", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Count move-generation leaf nodes, split by root move
    Perft {
        depth: usize,

        /// Position to run on, as a FEN string (default: starting position)
        #[arg(long)]
        fen: Option<String>,
    },

    /// Search a fixed suite of positions and report nodes and nps
    Bench {
        #[arg(long, default_value_t = 8)]
        depth: usize,
    },
}

fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        None => uci::run(),
        Some(Command::Perft { depth, fen }) => cli::perft(depth, fen),
        Some(Command::Bench { depth }) => cli::bench(depth),
    }
}
