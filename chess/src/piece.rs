//! Pieces, piece types and colors

use anyhow::anyhow;
use std::fmt::Display;
use std::ops::{Index, IndexMut, Not};
use std::str::FromStr;
use Color::*;
use Piece::*;
use PieceType::*;

/// The color of a piece, also used to identify the two players.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const COUNT: usize = 2;

    #[inline(always)]
    pub fn is_white(self) -> bool {
        self == White
    }
}

impl Not for Color {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self {
        match self {
            White => Black,
            Black => White,
        }
    }
}

/// The kind of a piece, independent of its owner.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum PieceType {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceType {
    pub const COUNT: usize = 6;

    /// The non-pawn, non-king piece kinds, in ascending value order
    pub const MINORS_AND_MAJORS: [Self; 4] = [Knight, Bishop, Rook, Queen];
}

/// A concrete piece: a piece type owned by a color.
///
/// The discriminant is laid out so that the color is the low bit, which makes
/// color extraction a single mask.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Piece {
    WP, BP, WN, BN, WB, BB, WR, BR, WQ, BQ, WK, BK,
}

impl Piece {
    pub const COUNT: usize = 12;

    pub const ALL: [Self; Self::COUNT] =
        [WP, BP, WN, BN, WB, BB, WR, BR, WQ, BQ, WK, BK];

    pub fn new(ptype: PieceType, color: Color) -> Self {
        Self::ALL[2 * ptype as usize + color as usize]
    }

    #[inline(always)]
    pub fn color(self) -> Color {
        if self as u8 & 1 == 0 {
            White
        } else {
            Black
        }
    }

    #[inline(always)]
    pub fn piece_type(self) -> PieceType {
        match self as u8 >> 1 {
            0 => Pawn,
            1 => Knight,
            2 => Bishop,
            3 => Rook,
            4 => Queen,
            _ => King,
        }
    }

    pub fn is_pawn(self) -> bool {
        self.piece_type() == Pawn
    }

    pub fn is_king(self) -> bool {
        self.piece_type() == King
    }

    /// The same piece, owned by the other player
    pub fn mirror(self) -> Self {
        Self::new(self.piece_type(), !self.color())
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Utility traits
//
////////////////////////////////////////////////////////////////////////////////

impl Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WP => "P", WN => "N", WB => "B", WR => "R", WQ => "Q", WK => "K",
            BP => "p", BN => "n", BB => "b", BR => "r", BQ => "q", BK => "k",
        };

        write!(f, "{label}")
    }
}

impl FromStr for Piece {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "P" => Ok(WP), "N" => Ok(WN), "B" => Ok(WB),
            "R" => Ok(WR), "Q" => Ok(WQ), "K" => Ok(WK),
            "p" => Ok(BP), "n" => Ok(BN), "b" => Ok(BB),
            "r" => Ok(BR), "q" => Ok(BQ), "k" => Ok(BK),
            _ => Err(anyhow!("Not a valid piece label: {s}")),
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            White => write!(f, "w"),
            Black => write!(f, "b"),
        }
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "w" => Ok(White),
            "b" => Ok(Black),
            _ => Err(anyhow!("Not a valid color label: {s}")),
        }
    }
}

impl<T> Index<Color> for [T; 2] {
    type Output = T;

    #[inline(always)]
    fn index(&self, index: Color) -> &Self::Output {
        &self[index as usize]
    }
}

impl<T> IndexMut<Color> for [T; 2] {
    #[inline(always)]
    fn index_mut(&mut self, index: Color) -> &mut Self::Output {
        &mut self[index as usize]
    }
}

impl<T> Index<PieceType> for [T; 6] {
    type Output = T;

    #[inline(always)]
    fn index(&self, index: PieceType) -> &Self::Output {
        &self[index as usize]
    }
}

impl<T> IndexMut<PieceType> for [T; 6] {
    #[inline(always)]
    fn index_mut(&mut self, index: PieceType) -> &mut Self::Output {
        &mut self[index as usize]
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
    fn piece_roundtrips() {
        for piece in Piece::ALL {
            assert_eq!(Piece::new(piece.piece_type(), piece.color()), piece);
            assert_eq!(piece.to_string().parse::<Piece>().unwrap(), piece);
        }
    }

    #[test]
    fn mirroring() {
        assert_eq!(WP.mirror(), BP);
        assert_eq!(BQ.mirror(), WQ);
        assert_eq!(WK.mirror().color(), Black);
    }
}
