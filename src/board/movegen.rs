// Copyright 2023 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

use once_cell::sync::Lazy;
use strum::IntoEnumIterator;

use super::castling::CastleSide;
use super::check::CheckDetector;
use super::material::{Color, Pair, Piece, PieceKind};
use super::moves::Move;
use super::square::{Direction, Mask, Offset, Position, Square};
use super::{Board, Notify};

use PieceKind::*;

/// Whether generated moves are filtered by the safety of the mover's
/// own king. Only legal-move lists enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Safety {
    Enforced,
    /// Raw movement shapes, as used for attack patterns. Check detection
    /// scans its own patterns, so legal-move lists never pass this.
    Ignored,
}

/// Generates destinations for the piece on a square and answers
/// "would this move expose my king".
///
/// The generator borrows the board mutably because the safety probe
/// writes each candidate to the board, tests for check and writes the
/// previous contents back. All of those writes are made with
/// `Notify::Suppressed`, and no history flag is touched, so the board
/// is observably unchanged once any method returns.
pub struct MoveGenerator<'a> {
    board: &'a mut Board,
    kings: Pair<Position>,
    last_move: Option<&'a Move>,
}

impl<'a> MoveGenerator<'a> {
    pub fn new(board: &'a mut Board, kings: Pair<Position>, last_move: Option<&'a Move>) -> Self {
        Self {
            board,
            kings,
            last_move,
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        self.board
    }

    /// Candidate destinations for the piece at `from`; empty if there is
    /// no piece there.
    pub fn destinations(&mut self, from: Position, safety: Safety) -> Mask {
        let Some(piece) = self.board.get(from) else {
            return Mask::empty();
        };
        match piece.kind() {
            Pawn => self.pawn_moves(from, piece, safety),
            Knight => self.knight_moves(from, piece, safety),
            Bishop => self.line_moves(from, piece, Direction::diagonals(), safety),
            Rook => self.line_moves(from, piece, Direction::horizontals(), safety),
            Queen => self.line_moves(from, piece, Direction::iter(), safety),
            King => self.king_moves(from, piece, safety),
        }
    }

    pub fn is_move_legal(&mut self, from: Position, to: Position) -> bool {
        self.destinations(from, Safety::Enforced).contains_position(to)
    }

    /// Number of legal moves available to `color`.
    pub fn count_legal_moves(&mut self, color: Color) -> usize {
        self.board
            .occupied_by(color)
            .iter()
            .map(|from| self.destinations(from.into(), Safety::Enforced).len())
            .sum()
    }

    pub fn has_any_legal_move(&mut self, color: Color) -> bool {
        self.board
            .occupied_by(color)
            .iter()
            .any(|from| !self.destinations(from.into(), Safety::Enforced).is_empty())
    }

    /// Plays `mv` on the board with notifications suppressed, asks whether
    /// `player`'s king is then in check, and restores every touched square.
    pub fn is_checked_after_move(&mut self, player: Color, mv: &Move) -> bool {
        let start = mv.start();
        let end = mv.end();
        let captured_at = mv.captured_position();
        let saved_start = self.board.get(start);
        let saved_end = self.board.get(end);
        let saved_captured = self.board.get(captured_at);

        if mv.is_en_passant() {
            self.board.set(captured_at, None, Notify::Suppressed);
        }
        self.board.set(end, Some(mv.piece()), Notify::Suppressed);
        self.board.set(start, None, Notify::Suppressed);

        let king = if mv.piece().kind().is_king() {
            end
        } else {
            self.kings[player]
        };
        let checked = self.board.is_king_in_check(player, king);

        self.board.set(start, saved_start, Notify::Suppressed);
        self.board.set(end, saved_end, Notify::Suppressed);
        if mv.is_en_passant() {
            self.board.set(captured_at, saved_captured, Notify::Suppressed);
        }
        checked
    }

    /// The square a pawn at `from` may capture onto en passant, or the
    /// null position.
    ///
    /// That requires the previous ply to have been an opposing pawn's
    /// double step landing right beside `from`, with that pawn still
    /// flagged as having just moved.
    pub fn en_passant_target(&self, from: Position) -> Position {
        let Some(pawn) = self.board.get(from) else {
            return Position::NULL;
        };
        let Some(last) = self.last_move else {
            return Position::NULL;
        };
        if !pawn.kind().is_pawn() || !last.piece().kind().is_pawn() || !last.is_double_advance() {
            return Position::NULL;
        }
        for side in [-1, 1] {
            let beside = from.offset(side, 0);
            if !beside.is_valid() || beside != last.end() {
                continue;
            }
            let just_moved = self
                .board
                .get(beside)
                .is_some_and(|p| p.is(!pawn.color(), Pawn) && p.has_just_moved());
            if just_moved {
                return from.offset(side, pawn.color().forward());
            }
        }
        Position::NULL
    }

    /// Adds `to` to `result` if it is on the board, not held by the
    /// mover's own color, and (when enforced) leaves the mover's king safe.
    fn admit(
        &mut self,
        piece: Piece,
        from: Position,
        to: Position,
        en_passant: bool,
        safety: Safety,
        result: &mut Mask,
    ) {
        let Some(square) = to.square() else {
            return;
        };
        if self.board.is_occupied(to, Some(piece.color())) {
            return;
        }
        if safety == Safety::Enforced {
            let mut mv = Move::trial(piece, from, to);
            if en_passant {
                mv = mv.en_passant();
            }
            if self.is_checked_after_move(piece.color(), &mv) {
                return;
            }
        }
        result.set(square);
    }

    fn pawn_moves(&mut self, from: Position, piece: Piece, safety: Safety) -> Mask {
        let mut result = Mask::empty();
        let forward = piece.color().forward();

        let one = from.offset(0, forward);
        if one.is_valid() && !self.board.is_occupied(one, None) {
            self.admit(piece, from, one, false, safety, &mut result);
            let two = from.offset(0, 2 * forward);
            if !piece.has_moved() && two.is_valid() && !self.board.is_occupied(two, None) {
                self.admit(piece, from, two, false, safety, &mut result);
            }
        }

        for side in [-1, 1] {
            let to = from.offset(side, forward);
            if self.board.is_occupied(to, Some(!piece.color())) {
                self.admit(piece, from, to, false, safety, &mut result);
            }
        }

        let target = self.en_passant_target(from);
        if target.is_valid() {
            self.admit(piece, from, target, true, safety, &mut result);
        }
        result
    }

    fn knight_moves(&mut self, from: Position, piece: Piece, safety: Safety) -> Mask {
        let mut result = Mask::empty();
        let Some(square) = from.square() else {
            return result;
        };
        let candidates = KNIGHT_MOVES[square.to_index()] - self.board.occupied_by(piece.color());
        for to in candidates.iter() {
            self.admit(piece, from, to.into(), false, safety, &mut result);
        }
        result
    }

    /// Sliding moves: each ray runs until the edge or the first occupied
    /// square, which is included only if it holds an opposing piece.
    fn line_moves<I>(&mut self, from: Position, piece: Piece, directions: I, safety: Safety) -> Mask
    where
        I: Iterator<Item = Direction>,
    {
        let mut result = Mask::empty();
        let Some(start) = from.square() else {
            return result;
        };
        for dir in directions {
            let mut next = start + dir;
            while let Some(square) = next {
                let to: Position = square.into();
                match self.board.get(to) {
                    None => {
                        self.admit(piece, from, to, false, safety, &mut result);
                        next = square + dir;
                    }
                    Some(other) => {
                        if other.color() != piece.color() {
                            self.admit(piece, from, to, false, safety, &mut result);
                        }
                        break;
                    }
                }
            }
        }
        result
    }

    fn king_moves(&mut self, from: Position, piece: Piece, safety: Safety) -> Mask {
        let mut result = Mask::empty();
        let Some(square) = from.square() else {
            return result;
        };
        let candidates = KING_MOVES[square.to_index()] - self.board.occupied_by(piece.color());
        for to in candidates.iter() {
            self.admit(piece, from, to.into(), false, safety, &mut result);
        }
        // Castling is never an attack, so only legal-move lists include it.
        if safety == Safety::Enforced {
            if let Some(rank) = from.rank() {
                for side in CastleSide::iter() {
                    let dest = side.king_dest(rank);
                    if self.castle_valid(from, dest).is_some() {
                        if let Some(dest) = dest.square() {
                            result.set(dest);
                        }
                    }
                }
            }
        }
        result
    }
}

pub(crate) static KING_MOVES: Lazy<[Mask; 64]> = Lazy::new(|| {
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square.to_index()] =
            Mask::from_squares(Direction::iter().filter_map(|dir| square + dir));
    }
    array
});

pub(crate) static KNIGHT_MOVES: Lazy<[Mask; 64]> = Lazy::new(|| {
    const OFFSETS: [Offset; 8] = [
        Offset::new(-2, -1),
        Offset::new(-2, 1),
        Offset::new(2, -1),
        Offset::new(2, 1),
        Offset::new(-1, -2),
        Offset::new(-1, 2),
        Offset::new(1, -2),
        Offset::new(1, 2),
    ];
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square.to_index()] =
            Mask::from_squares(OFFSETS.into_iter().filter_map(|offset| square + offset));
    }
    array
});
