//! Pseudo-legal move generation, filtered by target masks.
//!
//! Every generator takes a `targets` bitboard and only produces moves that
//! land inside it. The search uses this to generate only captures in
//! quiescence (targets = enemy occupation) and only covering moves when
//! evading a sliding check (targets = the checking segment). Moves produced
//! here may still leave the king in check; [`Board::pseudo_is_legal`] makes
//! the final call, so the cost of full legality is only paid for moves that
//! are actually searched.

use crate::bitboard::Bitboard;
use crate::bitboard::RANKS;
use crate::board::Board;
use crate::movegen::lookups::bishop_attacks;
use crate::movegen::lookups::pawn_attacks;
use crate::movegen::lookups::rook_attacks;
use crate::movegen::lookups::BETWEEN;
use crate::movegen::lookups::KING_ATTACKS;
use crate::movegen::lookups::KNIGHT_ATTACKS;
use crate::movegen::moves::Move;
use crate::movegen::moves::MoveKind;
use crate::movegen::moves::MoveList;
use crate::piece::PieceType;
use crate::square::Square;

impl Board {
    /// Generate pawn moves (pushes, captures, en-passant, promotions) that
    /// land inside `targets`.
    pub fn pawn_moves(&self, list: &mut MoveList, targets: Bitboard) {
        use MoveKind::*;

        let us = self.current;
        let them = !us;
        let occupied = self.all_occupied();
        let theirs = self.occupied_by(them);
        let capturable = theirs | self.ep_bb();
        let seventh = RANKS[if us.is_white() { 6 } else { 1 }];

        // Everything but promotions
        for src in self.pawns(us) & !seventh {
            let push = src.forward(us).expect("pawn is not on the back rank");
            let mut tss = pawn_attacks(src, us) & capturable & targets;

            if !occupied.contains(push) {
                if targets.contains(push) {
                    tss |= Bitboard::from(push);
                }

                if src.relative_rank(us) == 1 {
                    let dbl = push.forward(us).expect("double push stays on the board");

                    if targets.contains(dbl) && !occupied.contains(dbl) {
                        tss |= Bitboard::from(dbl);
                    }
                }
            }

            for tgt in tss {
                // Only a diagonal move onto the en-passant square is the
                // capture; a push landing there is a plain quiet move.
                let kind = if Some(tgt) == self.en_passant && src.file() != tgt.file() {
                    EnPassant
                } else if theirs.contains(tgt) {
                    Capture
                } else if src.rank().abs_diff(tgt.rank()) == 2 {
                    DoublePush
                } else {
                    Quiet
                };

                list.push(Move::new(src, tgt, kind));
            }
        }

        // Promotions, all four choices per target square
        for src in self.pawns(us) & seventh {
            let push = src.forward(us).expect("pawn is not on the back rank");
            let mut tss = pawn_attacks(src, us) & theirs & targets;

            if !occupied.contains(push) && targets.contains(push) {
                tss |= Bitboard::from(push);
            }

            for tgt in tss {
                let capture = theirs.contains(tgt);

                for ptype in [
                    PieceType::Queen,
                    PieceType::Rook,
                    PieceType::Bishop,
                    PieceType::Knight,
                ] {
                    list.push(Move::new(src, tgt, MoveKind::promotions(ptype, capture)));
                }
            }
        }
    }

    /// Generate knight, slider and (optionally) king moves landing inside
    /// `targets`. Queens are covered by visiting them in both slider scans.
    pub fn piece_moves(&self, list: &mut MoveList, targets: Bitboard, include_king: bool) {
        let us = self.current;
        let occupied = self.all_occupied();
        let theirs = self.occupied_by(!us);

        let mut serialize = |src: Square, tss: Bitboard| {
            for tgt in tss {
                let kind = if theirs.contains(tgt) {
                    MoveKind::Capture
                } else {
                    MoveKind::Quiet
                };

                list.push(Move::new(src, tgt, kind));
            }
        };

        if include_king {
            let src = self.king_sq(us);
            serialize(src, KING_ATTACKS[src] & targets);
        }

        for src in self.knights(us) {
            serialize(src, KNIGHT_ATTACKS[src] & targets);
        }

        for src in self.hv_sliders(us) {
            serialize(src, rook_attacks(src, occupied) & targets);
        }

        for src in self.diag_sliders(us) {
            serialize(src, bishop_attacks(src, occupied) & targets);
        }
    }

    /// Generate the available castling moves. Path occupancy and path safety
    /// are checked here, so castles that come out of this generator don't
    /// need a separate legality pass. Must not be called while in check.
    pub fn castling_moves(&self, list: &mut MoveList) {
        let us = self.current;
        let them = !us;
        let occupied = self.all_occupied();

        for ctype in self.castling_rights.for_side(us) {
            if !(ctype.los_squares() & occupied).is_empty() {
                continue;
            }

            let path_attacked = ctype
                .king_path()
                .into_iter()
                .any(|sq| self.attacked(sq, them, occupied));

            if !path_attacked {
                list.push(ctype.king_move());
            }
        }
    }

    /// Generate evasions for a position in check: king steps, and for a
    /// single checker also captures of the checker and interpositions on the
    /// checking segment.
    pub fn check_escapes(&self, list: &mut MoveList) {
        use PieceType::*;

        let us = self.current;
        let king = self.king_sq(us);
        let ours = self.occupied_by(us);
        let theirs = self.occupied_by(!us);

        for tgt in KING_ATTACKS[king] & !ours {
            let kind = if theirs.contains(tgt) {
                MoveKind::Capture
            } else {
                MoveKind::Quiet
            };

            list.push(Move::new(king, tgt, kind));
        }

        // Double check can only be answered by the king
        if self.checkers.several() {
            return;
        }

        let checker = self.checkers.lsb();
        let checker_type = self
            .get_at(checker)
            .expect("the checkers bitboard holds pieces")
            .piece_type();

        let mut targets = Bitboard::from(checker);

        if matches!(checker_type, Bishop | Rook | Queen) {
            targets |= BETWEEN[king as usize][checker as usize];
        }

        self.piece_moves(list, targets, false);

        // A checking pawn that just double-pushed can also be removed
        // en-passant.
        let mut pawn_targets = targets;

        if checker_type == Pawn {
            pawn_targets |= self.ep_bb();
        }

        self.pawn_moves(list, pawn_targets);
    }

    /// Generate every pseudo-legal move in the position
    pub fn all_moves(&self, list: &mut MoveList) {
        if self.in_check() {
            self.check_escapes(list);
        } else {
            let targets = !self.occupied_by(self.current);
            self.piece_moves(list, targets, true);
            self.pawn_moves(list, targets);
            self.castling_moves(list);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Tests
//
////////////////////////////////////////////////////////////////////////////////
