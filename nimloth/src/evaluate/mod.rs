//! Assign a static score to a board position.
//!
//! The evaluation is a sum of midgame/endgame score pairs, collapsed to one
//! centipawn number at the very end by interpolating on the remaining piece
//! material. Terms, in the order they are computed:
//!
//! - the incrementally maintained material + piece-square total;
//! - mobility, which doubles as the pass that fills the attack map every
//!   later term reads;
//! - the bishop pair;
//! - tactical threats (hanging pieces, pieces ahead of their own pawns),
//!   midgame only;
//! - king safety (ring attacks, safe checks, x-rays), midgame only;
//! - pawn structure, cached per worker under the pawn-king key;
//! - an endgame scaling rule that pulls pawnless material edges towards a
//!   draw.
//!
//! The score is returned from the side to move's perspective. Positions in
//! check have no static evaluation; the search never asks for one.

pub mod lookups;
pub mod params;
pub mod pawn_cache;
pub mod pawns;
pub mod util;

use crate::position::Position;
use chess::bitboard::Bitboard;
use chess::bitboard::DARK_SQUARES;
use chess::bitboard::LIGHT_SQUARES;
use chess::board::Board;
use chess::movegen::lookups::bishop_attacks;
use chess::movegen::lookups::rook_attacks;
use chess::movegen::lookups::BETWEEN;
use chess::movegen::lookups::BISHOP_RAYS;
use chess::movegen::lookups::KING_ATTACKS;
use chess::movegen::lookups::KNIGHT_ATTACKS;
use chess::movegen::lookups::ROOK_RAYS;
use chess::piece::Color;
use chess::piece::PieceType;
use params::*;
use pawn_cache::PawnCache;
use pawns::pawns;
pub use util::Score;
pub use util::ScoreExt;
pub use util::S;

/// Attack sets per color and piece type, with one extra slot for the union
/// of all piece (non-pawn, non-king) attacks. Filled by the mobility pass,
/// read by the threat and king safety terms.
const ALL_PIECES: usize = PieceType::COUNT;
type AttackMap = [[Bitboard; PieceType::COUNT + 1]; Color::COUNT];

/// Statically evaluate a position, in centipawns from the side to move's
/// perspective. The position must not be in check.
pub fn evaluate(pos: &Position, pawn_cache: &mut PawnCache) -> Score {
    use Color::*;

    debug_assert!(!pos.board.in_check());

    let board = &pos.board;
    let us = board.current;
    let them = !us;

    let mut attacks: AttackMap = [[Bitboard::EMPTY; PieceType::COUNT + 1]; Color::COUNT];
    let mut e = [S::default(); 2];
    e[White] = pos.pst;

    // Mobility first: it populates the attack map for everything below
    for color in [White, Black] {
        e[color] += mobility(board, color, &mut attacks);
    }

    for color in [White, Black] {
        e[color] += bishop_pair(board, color);
        e[color] += S::new(tactics(board, color, &attacks), 0);
        e[color] += S::new(safety(board, color, &attacks), 0);
    }

    e[White] += pawns(pos, pawn_cache);

    let stm = e[us] - e[them];
    let (mg, mut eg) = (stm.mg(), stm.eg());

    // Scaling rule: a material edge short of a rook, with no pawns left to
    // promote, is a long way from a win.
    let winner = if eg > 0 { us } else { them };
    let loser = !winner;
    let winner_pawns = board.pawns(winner);
    let edge = pos.piece_material[winner].eg() - pos.piece_material[loser].eg();

    if !winner_pawns.several() && edge < ROOK_EG {
        if winner_pawns.is_empty() {
            eg /= 2;
        } else {
            eg -= eg / 4;
        }
    }

    blend(pos, mg, eg)
}

/// Interpolate between the midgame and endgame components by the endgame
/// piece material still on the board.
fn blend(pos: &Position, mg: Score, eg: Score) -> Score {
    let total = (pos.piece_material[Color::White] + pos.piece_material[Color::Black]).eg();

    mg * total / FULL_MATERIAL + eg * (FULL_MATERIAL - total) / FULL_MATERIAL
}

////////////////////////////////////////////////////////////////////////////////
//
// Mobility
//
////////////////////////////////////////////////////////////////////////////////

/// Score how many squares each piece reaches, not counting squares holding
/// our own king or pawns, nor squares covered by enemy pawns. Rooks and
/// queens see through each other on files, bishops and queens on diagonals.
///
/// As a side effect this fills `attacks[us]` for every piece kind, the
/// enemy's pawn attack set, and the union slot.
fn mobility(board: &Board, us: Color, attacks: &mut AttackMap) -> S {
    use PieceType::*;

    let them = !us;
    let mut result = S::default();

    attacks[us][King as usize] = KING_ATTACKS[board.king_sq(us)];
    attacks[them][Pawn as usize] = board.pawn_attacks(them);

    for ptype in PieceType::MINORS_AND_MAJORS {
        attacks[us][ptype as usize] = Bitboard::EMPTY;
    }

    let targets = !(board.kings(us) | board.pawns(us) | attacks[them][Pawn as usize]);

    // Knights
    for square in board.knights(us) {
        let tss = KNIGHT_ATTACKS[square];
        attacks[us][Knight as usize] |= tss;
        result += MOBILITY_WEIGHT[Knight] * ADJUST_KNIGHT[(tss & targets).count() as usize];
    }

    // Lateral movers; rooks and queens see through each other
    let movers = board.hv_sliders(us);
    let occupied = board.all_occupied() ^ movers;

    for square in movers {
        let tss = rook_attacks(square, occupied);
        let ptype = board.get_at(square).expect("mover squares are occupied").piece_type();

        attacks[us][ptype as usize] |= tss;
        result += MOBILITY_WEIGHT[ptype] * ADJUST_ROOK[(tss & targets).count() as usize];
    }

    // Diagonal movers; bishops and queens see through each other
    let movers = board.diag_sliders(us);
    let occupied = board.all_occupied() ^ movers;

    for square in movers {
        let tss = bishop_attacks(square, occupied);
        let ptype = board.get_at(square).expect("mover squares are occupied").piece_type();

        attacks[us][ptype as usize] |= tss;
        result += MOBILITY_WEIGHT[ptype] * ADJUST_BISHOP[(tss & targets).count() as usize];
    }

    attacks[us][ALL_PIECES] = attacks[us][Knight as usize]
        | attacks[us][Bishop as usize]
        | attacks[us][Rook as usize]
        | attacks[us][Queen as usize];

    result
}

////////////////////////////////////////////////////////////////////////////////
//
// Bishop pair
//
////////////////////////////////////////////////////////////////////////////////

fn bishop_pair(board: &Board, us: Color) -> S {
    let bishops = board.bishops(us);

    if !(bishops & LIGHT_SQUARES).is_empty() && !(bishops & DARK_SQUARES).is_empty() {
        BISHOP_PAIR
    } else {
        S::default()
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Tactical threats
//
////////////////////////////////////////////////////////////////////////////////

/// Penalize our pieces that hang to a structurally cheaper attacker: any
/// non-pawn piece under pawn attack, rooks and queens under minor attack,
/// and queens under rook attack. On top of that, a small penalty per piece
/// standing directly ahead of one of its own pawns.
fn tactics(board: &Board, us: Color, attacks: &AttackMap) -> Score {
    use PieceType::*;

    let them = !us;
    let non_pawns = board.occupied_by(us) ^ board.pawns(us);

    let mut threatened = attacks[them][Pawn as usize] & non_pawns;
    threatened |= (attacks[them][Knight as usize] | attacks[them][Bishop as usize])
        & board.hv_sliders(us);
    threatened |= attacks[them][Rook as usize] & board.queens(us);

    let mut result = 0;

    for square in threatened {
        let ptype = board.get_at(square).expect("threatened squares hold pieces").piece_type();
        result -= HANGING[ptype];
    }

    let ahead = board.pawns(us).forward(us) & non_pawns;
    result -= AHEAD_OF_PAWN * ahead.count() as Score;

    result
}

////////////////////////////////////////////////////////////////////////////////
//
// King safety
//
////////////////////////////////////////////////////////////////////////////////

/// Penalize pressure against our king: enemy pieces bearing on the king
/// ring (minus anything our pawns cover), safe checking squares, and
/// sliders x-raying the king with no pawn in between. Every contributing
/// source also bumps a counter that scales the total, so several mild
/// threats combine into a serious one.
fn safety(board: &Board, us: Color, attacks: &AttackMap) -> Score {
    use PieceType::*;

    let them = !us;
    let mut result = 0;
    let mut cnt = 0;

    // Attacks on the king ring
    let danger_zone = attacks[us][King as usize] & !attacks[us][Pawn as usize];

    for ptype in PieceType::MINORS_AND_MAJORS {
        let attacked = attacks[them][ptype as usize] & danger_zone;

        if !attacked.is_empty() {
            cnt += 1;
            result -= attacked.count() as Score * RING_ATTACK[ptype];
            result += (attacked & attacks[us][ALL_PIECES]).count() as Score
                * RING_DEFENSE[ptype];
        }
    }

    // Safe check threats: squares a piece could give check from, that are
    // not held by our pawns or king and not occupied by the enemy.
    let king = board.king_sq(us);
    let occupied = board.all_occupied();

    let check_squares = [
        KNIGHT_ATTACKS[king] & attacks[them][Knight as usize],
        bishop_attacks(king, occupied) & attacks[them][Bishop as usize],
        rook_attacks(king, occupied) & attacks[them][Rook as usize],
        (bishop_attacks(king, occupied) | rook_attacks(king, occupied))
            & attacks[them][Queen as usize],
    ];

    let cover = board.occupied_by(them)
        | attacks[us][Pawn as usize]
        | attacks[us][King as usize];

    for (ptype, &checks) in PieceType::MINORS_AND_MAJORS.iter().zip(&check_squares) {
        let safe = checks & !cover;

        if !safe.is_empty() {
            cnt += 1;
            result -= safe.count() as Score * CHECK_ATTACK[*ptype];
            result += (safe & attacks[us][ALL_PIECES]).count() as Score
                * CHECK_DEFENSE[*ptype];
        }
    }

    // X-ray threats: sliders aimed at the king with only non-pawn material
    // in between.
    for square in BISHOP_RAYS[king] & board.diag_sliders(them) {
        if (BETWEEN[king as usize][square as usize] & board.piece_bbs[Pawn]).is_empty() {
            cnt += 1;
            result -= BISHOP_XRAY;
        }
    }

    for square in ROOK_RAYS[king] & board.hv_sliders(them) {
        if (BETWEEN[king as usize][square as usize] & board.piece_bbs[Pawn]).is_empty() {
            cnt += 1;
            result -= ROOK_XRAY;
        }
    }

    result * (2 + cnt) / 4
}

////////////////////////////////////////////////////////////////////////////////
//
// Tests
//
////////////////////////////////////////////////////////////////////////////////
