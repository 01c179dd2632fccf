//! A `Position` wraps a `Board` with the incrementally-maintained quantities
//! the search and evaluation need: the Zobrist keys, the piece-square total
//! and the per-side piece material.
//!
//! Like the board itself, a position is a value: playing a move returns the
//! child position and leaves the parent untouched, so the search recursion
//! never has to unmake anything.

use crate::evaluate::params::PIECE_SQUARE_TABLES;
use crate::evaluate::params::PIECE_VALUES;
use crate::evaluate::S;
use crate::zobrist::ZHash;
use chess::board::Board;
use chess::movegen::castling::CastleType;
use chess::movegen::moves::promo_piece;
use chess::movegen::moves::Move;
use chess::piece::Piece;
use chess::piece::PieceType;
use chess::square::Square;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// The wrapped board state
    pub board: Board,

    /// Zobrist hash of the full position
    pub key: ZHash,

    /// Zobrist hash of the pawn-king skeleton, keying the pawn cache
    pub pawn_key: ZHash,

    /// Material plus piece-square total for the whole board, from White's
    /// point of view
    pub pst: S,

    /// Piece (non-pawn, non-king) material per side. The endgame component
    /// drives the phase blend and the endgame scaling rule.
    pub piece_material: [S; 2],
}

/// The material-plus-placement term a single piece contributes, from
/// White's point of view.
fn psqt(piece: Piece, square: Square) -> S {
    let ptype = piece.piece_type();

    if piece.color().is_white() {
        PIECE_VALUES[ptype] + PIECE_SQUARE_TABLES[ptype][square.flip()]
    } else {
        -(PIECE_VALUES[ptype] + PIECE_SQUARE_TABLES[ptype][square])
    }
}

/// Whether a piece type counts towards the game phase material
fn is_phase_material(ptype: PieceType) -> bool {
    !matches!(ptype, PieceType::Pawn | PieceType::King)
}

impl Position {
    /// Build a position from a board, computing every derived quantity from
    /// scratch.
    pub fn new(board: Board) -> Self {
        let mut pst = S::default();
        let mut piece_material = [S::default(); 2];

        for square in Square::ALL {
            if let Some(piece) = board.get_at(square) {
                pst += psqt(piece, square);

                if is_phase_material(piece.piece_type()) {
                    piece_material[piece.color()] += PIECE_VALUES[piece.piece_type()];
                }
            }
        }

        Self {
            key: ZHash::from_board(&board),
            pawn_key: ZHash::pawn_king(&board),
            pst,
            piece_material,
            board,
        }
    }

    /// Play a move, updating the board and all derived quantities
    /// incrementally.
    pub fn play_move(&self, mv: Move) -> Self {
        let us = self.board.current;
        let mut key = self.key;
        let mut pawn_key = self.pawn_key;
        let mut pst = self.pst;
        let mut piece_material = self.piece_material;

        let piece = self
            .board
            .get_at(mv.src())
            .expect("the move's source square holds a piece");

        if mv.is_capture() {
            let capture_sq = mv.capture_square(us);
            let victim = self
                .board
                .get_at(capture_sq)
                .expect("the capture square holds a piece");

            key.toggle_piece(victim, capture_sq);
            pst -= psqt(victim, capture_sq);

            if victim.is_pawn() {
                pawn_key.toggle_piece(victim, capture_sq);
            } else {
                piece_material[!us] -= PIECE_VALUES[victim.piece_type()];
            }
        }

        // Lift the piece, put down whatever it lands as
        let landed = promo_piece(mv, us).unwrap_or(piece);

        key.toggle_piece(piece, mv.src());
        key.toggle_piece(landed, mv.tgt());
        pst -= psqt(piece, mv.src());
        pst += psqt(landed, mv.tgt());

        if piece.is_pawn() {
            pawn_key.toggle_piece(piece, mv.src());
        }

        if landed.is_pawn() {
            pawn_key.toggle_piece(landed, mv.tgt());
        }

        if piece.is_king() {
            pawn_key.toggle_piece(piece, mv.src());
            pawn_key.toggle_piece(piece, mv.tgt());
        }

        if mv.is_promotion() {
            piece_material[us] += PIECE_VALUES[landed.piece_type()];
        }

        if mv.is_castle() {
            let rook_move = CastleType::from_move(mv)
                .expect("castling moves come from the generator")
                .rook_move();

            let rook = Piece::new(PieceType::Rook, us);
            key.toggle_piece(rook, rook_move.src());
            key.toggle_piece(rook, rook_move.tgt());
            pst -= psqt(rook, rook_move.src());
            pst += psqt(rook, rook_move.tgt());
        }

        let board = self.board.play_move(mv);

        // Castling rights, en-passant and the side to move
        key.toggle_castling(self.board.castling_rights);
        key.toggle_castling(board.castling_rights);

        if let Some(ep) = self.board.en_passant {
            key.toggle_ep(ep);
        }

        if let Some(ep) = board.en_passant {
            key.toggle_ep(ep);
        }

        key.toggle_side();

        Self { board, key, pawn_key, pst, piece_material }
    }
}

impl From<Board> for Position {
    fn from(board: Board) -> Self {
        Self::new(board)
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Tests
//
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use chess::movegen::moves::MoveList;
    use chess::piece::Color;

    const TEST_POSITIONS: [&str; 6] = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
    ];

    /// Every incrementally updated quantity must agree with a from-scratch
    /// rebuild, after every legal move of every test position.
    #[test]
    fn incremental_updates_match_rebuild() {
        for fen in TEST_POSITIONS {
            let board: Board = fen.parse().unwrap();
            let position = Position::new(board);

            let mut moves = MoveList::new();
            board.all_moves(&mut moves);
            let pins = board.pin_info();

            for mv in moves {
                if !board.pseudo_is_legal(mv, &pins) {
                    continue;
                }

                let played = position.play_move(mv);
                let rebuilt = Position::new(played.board);

                assert_eq!(played.key, rebuilt.key, "{fen} after {mv}");
                assert_eq!(played.pawn_key, rebuilt.pawn_key, "{fen} after {mv}");
                assert_eq!(played.pst, rebuilt.pst, "{fen} after {mv}");
                assert_eq!(played.piece_material, rebuilt.piece_material, "{fen} after {mv}");
            }
        }
    }

    #[test]
    fn transpositions_share_a_key() {
        let a = Position::new(Board::default())
            .play_move(Board::default().find_move("g1f3".parse().unwrap()).unwrap());
        let a = a.play_move(a.board.find_move("g8f6".parse().unwrap()).unwrap());
        let a = a.play_move(a.board.find_move("b1c3".parse().unwrap()).unwrap());

        let b = Position::new(Board::default())
            .play_move(Board::default().find_move("b1c3".parse().unwrap()).unwrap());
        let b = b.play_move(b.board.find_move("g8f6".parse().unwrap()).unwrap());
        let b = b.play_move(b.board.find_move("g1f3".parse().unwrap()).unwrap());

        assert_eq!(a.key, b.key);
    }

    #[test]
    fn startpos_is_balanced() {
        let position = Position::new(Board::default());
        assert_eq!(position.pst, S::default());
        assert_eq!(position.piece_material[Color::White], position.piece_material[Color::Black]);
    }
}
