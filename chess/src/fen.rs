//! Parsing and serialising FEN strings.
//!
//! A FEN string captures a full board state in six space-separated fields:
//! piece placement (8th rank first), side to move, castling rights,
//! en-passant square, halfmove clock and fullmove counter, e.g.
//!
//!   rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::movegen::castling::CastlingRights;
use crate::piece::Color;
use crate::piece::Piece;
use crate::piece::PieceType;
use crate::square::Square;
use anyhow::anyhow;
use itertools::Itertools;
use std::str::FromStr;

impl Board {
    /// Serialise the board into a FEN string
    pub fn to_fen(&self) -> String {
        let mut ranks: Vec<String> = Vec::with_capacity(8);

        for rank in (0..8).rev() {
            let squares = &self.piece_list[8 * rank..8 * rank + 8];
            let mut fields: Vec<String> = Vec::new();

            for (occupied, group) in &squares.iter().group_by(|piece| piece.is_some()) {
                if occupied {
                    for piece in group.flatten() {
                        fields.push(piece.to_string());
                    }
                } else {
                    fields.push(group.count().to_string());
                }
            }

            ranks.push(fields.concat());
        }

        let en_passant = self
            .en_passant
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| String::from("-"));

        format!(
            "{} {} {} {} {} {}",
            ranks.join("/"),
            self.current,
            self.castling_rights,
            en_passant,
            self.half_moves,
            self.full_moves,
        )
    }

    /// Parse a board from a FEN string
    pub fn from_fen(fen: &str) -> anyhow::Result<Board> {
        let mut parts = fen.split_whitespace();

        let placement = parts.next().ok_or(anyhow!("Empty FEN string"))?;

        let mut piece_bbs = [Bitboard::EMPTY; PieceType::COUNT];
        let mut occupied_squares = [Bitboard::EMPTY; Color::COUNT];
        let mut piece_list = [None; Square::COUNT];

        // The placement field starts at the 8th rank, so walk the ranks in
        // reverse to get ascending square indices.
        for (rank, rank_str) in placement.split('/').rev().enumerate() {
            if rank > 7 {
                return Err(anyhow!("Too many ranks in FEN string"));
            }

            let mut file = 0;

            for ch in rank_str.chars() {
                if let Some(gap) = ch.to_digit(10) {
                    file += gap as usize;
                } else {
                    let piece: Piece = ch.to_string().parse()?;
                    let square = Square::try_new(8 * rank + file)
                        .ok_or(anyhow!("Too many squares in FEN rank"))?;

                    piece_list[square] = Some(piece);
                    piece_bbs[piece.piece_type()] |= Bitboard::from(square);
                    occupied_squares[piece.color()] |= Bitboard::from(square);
                    file += 1;
                }
            }
        }

        let current: Color = parts
            .next()
            .ok_or(anyhow!("FEN string is missing the side to move"))?
            .parse()?;

        let castling_rights: CastlingRights = parts
            .next()
            .ok_or(anyhow!("FEN string is missing the castling rights"))?
            .parse()?;

        let en_passant: Option<Square> = parts
            .next()
            .ok_or(anyhow!("FEN string is missing the en-passant square"))?
            .parse()
            .ok();

        // The counters are optional in a lot of the wild's FEN strings
        let half_moves = parts.next().map(u8::from_str).transpose()?.unwrap_or(0);
        let full_moves = parts.next().map(u16::from_str).transpose()?.unwrap_or(1);

        Ok(Board::new(
            piece_list,
            piece_bbs,
            occupied_squares,
            current,
            castling_rights,
            en_passant,
            half_moves,
            full_moves,
        ))
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

    #[test]
    fn fen_roundtrips() {
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 3 17",
        ];

        for fen in fens {
            let board: Board = fen.parse().unwrap();
            assert_eq!(board.to_fen(), fen);
        }
    }

    #[test]
    fn missing_counters_default() {
        let board: Board = "8/8/8/8/8/8/8/K6k w - -".parse().unwrap();
        assert_eq!(board.half_moves, 0);
        assert_eq!(board.full_moves, 1);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!("not a fen".parse::<Board>().is_err());
        assert!("8/8/8/8/8/8/8/K6k x - - 0 1".parse::<Board>().is_err());
    }
}
