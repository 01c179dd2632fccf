//! Static exchange evaluation.
//!
//! SEE estimates the material outcome of a move by playing out the full
//! capture sequence on the target square, each side always recapturing with
//! its least valuable attacker, and each side free to stand pat once
//! continuing would lose material. The result is a signed centipawn gain for
//! the side making the move, without any search.
//!
//! The search leans on this in two places: ordering captures (winning ones
//! early, losing ones last) and pruning losing captures in quiescence.

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::movegen::lookups::bishop_attacks;
use crate::movegen::lookups::rook_attacks;
use crate::movegen::moves::Move;
use crate::piece::Color;
use crate::piece::PieceType;
use crate::square::Square;

/// Exchange values per piece type. The king never actually gets captured,
/// so its value is never read.
pub const SEE_VALUES: [i32; PieceType::COUNT] = [100, 325, 335, 500, 975, 0];

impl Board {
    /// The signed static-exchange gain of a move, in centipawns, from the
    /// point of view of the side playing it.
    pub fn see(&self, mv: Move) -> i32 {
        use PieceType::*;

        // Castles can't be recaptured, and don't win anything either
        if mv.is_castle() {
            return 0;
        }

        let us = self.current;
        let tgt = mv.tgt();

        // The speculative gains per capture in the sequence
        let mut gain = [0i32; 32];
        let mut depth = 0;

        let mut occupied = self.all_occupied();

        // What the first capture wins, and what the piece standing on the
        // target square is then worth to the opponent.
        gain[0] = match self.get_at(mv.capture_square(us)) {
            _ if mv.is_en_passant() => SEE_VALUES[Pawn],
            Some(victim) => SEE_VALUES[victim.piece_type()],
            None => 0,
        };

        let mut next_victim = self
            .get_at(mv.src())
            .expect("SEE is called with a real move")
            .piece_type();

        if let Some(promo) = mv.promo_type() {
            gain[0] += SEE_VALUES[promo] - SEE_VALUES[Pawn];
            next_victim = promo;
        }

        occupied ^= Bitboard::from(mv.src());

        if mv.is_en_passant() {
            occupied ^= Bitboard::from(mv.capture_square(us));
        }

        let mut attackers = self.attackers(tgt, occupied) & occupied;
        let mut side = !us;

        loop {
            let our_attackers = attackers & self.occupied_by(side);

            if our_attackers.is_empty() {
                break;
            }

            let (from, attacker) = self.least_valuable(our_attackers);

            // The king may only join the exchange if the opponent has no
            // defender left to punish it.
            if attacker == King && !(attackers & self.occupied_by(!side)).is_empty() {
                break;
            }

            depth += 1;
            gain[depth] = SEE_VALUES[next_victim] - gain[depth - 1];

            next_victim = attacker;
            occupied ^= Bitboard::from(from);

            // Removing an attacker can uncover a slider behind it
            if matches!(attacker, Pawn | Bishop | Queen) {
                attackers |= bishop_attacks(tgt, occupied)
                    & (self.diag_sliders(Color::White) | self.diag_sliders(Color::Black));
            }

            if matches!(attacker, Rook | Queen) {
                attackers |= rook_attacks(tgt, occupied)
                    & (self.hv_sliders(Color::White) | self.hv_sliders(Color::Black));
            }

            attackers &= occupied;
            side = !side;
        }

        // Resolve the speculative gains back to front: at every point, the
        // side to move picks the better of standing pat and capturing on.
        while depth > 0 {
            gain[depth - 1] = -i32::max(-gain[depth - 1], gain[depth]);
            depth -= 1;
        }

        gain[0]
    }

    /// The least valuable piece of the attacking set, with its square
    fn least_valuable(&self, attackers: Bitboard) -> (Square, PieceType) {
        for ptype in [
            PieceType::Pawn,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Rook,
            PieceType::Queen,
            PieceType::King,
        ] {
            let candidates = attackers & self.piece_bbs[ptype];

            if !candidates.is_empty() {
                return (candidates.lsb(), ptype);
            }
        }

        unreachable!("least_valuable is only called with a non-empty attacker set")
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

    const KIWIPETE: &str =
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    fn see_of(fen: &str, mv: &str) -> i32 {
        let board: Board = fen.parse().unwrap();
        let mv = board.find_move(mv.parse().unwrap()).unwrap();
        board.see(mv)
    }

    #[test]
    fn hanging_piece() {
        // A rook takes an undefended pawn
        assert_eq!(see_of("4k3/8/8/4p3/8/8/8/4K2R w K - 0 1", "h1h5"), 0);
        assert_eq!(see_of("4k3/8/8/7p/8/8/8/4K2R w K - 0 1", "h1h5"), 100);
    }

    #[test]
    fn defended_pawn() {
        // Taking a defended pawn with a rook loses the exchange
        assert_eq!(
            see_of("4k3/6p1/7p/8/8/8/8/4K2R w K - 0 1", "h1h6"),
            100 - 500
        );
    }

    #[test]
    fn queen_grabs_defended_pawn() {
        let board: Board = KIWIPETE.parse().unwrap();
        let mv = board.find_move("f3h3".parse().unwrap()).unwrap();

        // Qxh3 wins a pawn but loses the queen to gxh3
        assert_eq!(board.see(mv), 100 - 975);
    }

    #[test]
    fn even_exchange() {
        let board: Board = KIWIPETE.parse().unwrap();
        let mv = board.find_move("e2b5".parse().unwrap()).unwrap();

        // Bb5 hangs the bishop to nothing; SEE of a quiet move is zero here
        assert_eq!(board.see(mv), 0);
    }

    #[test]
    fn quiet_move_into_attack() {
        // Rook steps onto a square covered by a pawn: SEE sees the loss
        assert_eq!(see_of("4k3/8/2p5/8/8/8/8/3RK3 w - - 0 1", "d1d5"), -500);
    }

    #[test]
    fn xray_recapture() {
        // Doubled rooks vs a defended pawn: RxP, pxR?? No: pawn d5 defended
        // by pawn c6; white rooks doubled on the d-file. Rxd5 cxd5 Rxd5 nets
        // a pawn for a rook then wins the pawn back: -500 + 100 + 100.
        let board: Board = "3qk3/8/2p5/3p4/8/8/8/3RK3 w - - 0 1".parse().unwrap();
        let mv = board.find_move("d1d5".parse().unwrap()).unwrap();

        // Single rook: Rxd5 cxd5 loses rook for pawn
        assert_eq!(board.see(mv), 100 - 500);

        let board: Board = "4k3/8/2p5/3p4/8/8/3R4/3RK3 w - - 0 1".parse().unwrap();
        let mv = board.find_move("d2d5".parse().unwrap()).unwrap();

        // Doubled rooks: Rxd5 cxd5 Rxd5 wins two pawns for a rook
        assert_eq!(board.see(mv), 100 - 500 + 100);
    }

    #[test]
    fn promotion_gain() {
        // A clean queen promotion gains queen-minus-pawn
        assert_eq!(see_of("4k3/8/8/8/8/8/6p1/4K3 b - - 0 1", "g2g1q"), 975 - 100);
    }
}
