//! Perft: exhaustively count leaf nodes of the move generation tree.
//!
//! The counts for well-known positions are the ground truth the move
//! generator is validated against. A single missing or extra move anywhere
//! in the tree shows up as a wrong total.

use crate::board::Board;
use crate::movegen::moves::Move;
use crate::movegen::moves::MoveList;

/// Count the leaf nodes of the legal move tree, `depth` plies deep
pub fn perft(board: &Board, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut list = MoveList::new();
    board.all_moves(&mut list);

    let pins = board.pin_info();
    let mut nodes = 0;

    for mv in list {
        if !board.pseudo_is_legal(mv, &pins) {
            continue;
        }

        nodes += if depth == 1 {
            1
        } else {
            perft(&board.play_move(mv), depth - 1)
        };
    }

    nodes
}

/// Perft split by root move, the classic debugging view
pub fn divide(board: &Board, depth: usize) -> Vec<(Move, u64)> {
    let mut list = MoveList::new();
    board.all_moves(&mut list);

    let pins = board.pin_info();

    list.into_iter()
        .filter(|&mv| board.pseudo_is_legal(mv, &pins))
        .map(|mv| {
            let nodes = if depth <= 1 {
                1
            } else {
                perft(&board.play_move(mv), depth - 1)
            };

            (mv, nodes)
        })
        .collect()
}

////////////////////////////////////////////////////////////////////////////////
//
// Tests
//
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_perft(fen: &str, expected: &[u64]) {
        let board: Board = fen.parse().unwrap();

        for (depth, &nodes) in expected.iter().enumerate() {
            assert_eq!(
                perft(&board, depth + 1),
                nodes,
                "perft({}) of {fen}",
                depth + 1
            );
        }
    }

    #[test]
    fn perft_startpos() {
        assert_perft(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            &[20, 400, 8_902, 197_281, 4_865_609],
        );
    }

    #[test]
    fn perft_kiwipete() {
        assert_perft(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            &[48, 2_039, 97_862, 4_085_603],
        );
    }

    #[test]
    fn perft_kiwipete_deep() {
        let board: Board =
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"
                .parse()
                .unwrap();

        assert_eq!(perft(&board, 5), 193_690_690);
    }

    #[test]
    fn perft_endgame() {
        // Position 3 from the CPW perft suite, heavy on en-passant edge cases
        assert_perft(
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            &[14, 191, 2_812, 43_238, 674_624],
        );
    }

    #[test]
    fn perft_promotion_heavy() {
        // Position 4 from the CPW perft suite
        assert_perft(
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            &[6, 264, 9_467, 422_333],
        );
    }

    #[test]
    fn perft_talkchess() {
        // Position 5, catches castling-rights and promotion bugs
        assert_perft(
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            &[44, 1_486, 62_379, 2_103_487],
        );
    }

    #[test]
    fn divide_sums_to_perft() {
        let board = Board::default();
        let total: u64 = divide(&board, 3).into_iter().map(|(_, n)| n).sum();
        assert_eq!(total, perft(&board, 3));
    }
}
