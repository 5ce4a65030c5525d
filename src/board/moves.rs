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

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::castling::CastleSide;
use super::material::{Color, Piece, PieceKind};
use super::square::{Position, Rank};

/// Why a move attempt was turned down. A rejected attempt leaves the game
/// exactly as it was, including the current selection.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveError {
    #[error("No piece selected")]
    NoPieceSelected,
    #[error("End position is not on the board")]
    EndPositionInvalid,
    #[error("Start and end positions are the same")]
    SameStartEndPosition,
    #[error("Cannot move onto your own piece")]
    MoveOntoOwnPiece,
    #[error("Move is not well formed")]
    MoveStructurallyInvalid,
    #[error("Not a legal move")]
    MoveIllegal,
    #[error("A promotion must be chosen first")]
    PromotionPending,
    #[error("The game is over")]
    GameOver,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromotionError {
    #[error("No promotion is pending")]
    NotPending,
    #[error("Cannot promote to {0}")]
    InvalidPromotion(PieceKind),
}

/// What an accepted move led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveOutcome {
    Accepted,
    /// The pawn reached the last rank. The move settles once `promote`
    /// is called with the chosen piece kind.
    PromotionRequired(Color),
}

/// A transition from `start` to `end`. Applying it to a board is the
/// game's job; the move itself only describes what happened.
///
/// `number` counts plies from 1, so White's moves are odd and Black's
/// are even.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    number: usize,
    piece: Piece,
    start: Position,
    end: Position,
    captured: Option<PieceKind>,
    promotion: Option<PieceKind>,
    castle: Option<CastleSide>,
    en_passant: bool,
    check: Option<Color>,
}

impl Move {
    pub fn new(number: usize, piece: Piece, start: Position, end: Position) -> Self {
        Self {
            number,
            piece,
            start,
            end,
            captured: None,
            promotion: None,
            castle: None,
            en_passant: false,
            check: None,
        }
    }

    /// A hypothetical move used only to probe check safety.
    pub fn trial(piece: Piece, start: Position, end: Position) -> Self {
        Self::new(0, piece, start, end)
    }

    pub fn capturing(mut self, kind: PieceKind) -> Self {
        self.captured = Some(kind);
        self
    }
    pub fn promoting(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self
    }
    pub fn castling(mut self, side: CastleSide) -> Self {
        self.castle = Some(side);
        self
    }
    pub fn en_passant(mut self) -> Self {
        self.en_passant = true;
        self
    }
    pub fn checking(mut self, color: Option<Color>) -> Self {
        self.check = color;
        self
    }

    #[inline]
    pub fn number(&self) -> usize {
        self.number
    }
    #[inline]
    pub fn piece(&self) -> Piece {
        self.piece
    }
    #[inline]
    pub fn start(&self) -> Position {
        self.start
    }
    #[inline]
    pub fn end(&self) -> Position {
        self.end
    }
    #[inline]
    pub fn captured(&self) -> Option<PieceKind> {
        self.captured
    }
    #[inline]
    pub fn promotion(&self) -> Option<PieceKind> {
        self.promotion
    }
    #[inline]
    pub fn castle(&self) -> Option<CastleSide> {
        self.castle
    }
    #[inline]
    pub fn is_en_passant(&self) -> bool {
        self.en_passant
    }
    /// The color left in check by this move, if any.
    #[inline]
    pub fn check(&self) -> Option<Color> {
        self.check
    }

    /// The square of the captured piece. For en passant this is beside
    /// the start square, not the landing square.
    pub fn captured_position(&self) -> Position {
        match (self.en_passant, self.start.rank(), self.end.file()) {
            (true, Some(rank), Some(file)) => Position::new(file, rank),
            (true, _, _) => Position::NULL,
            (false, _, _) => self.end,
        }
    }

    /// True if the pawn moved two ranks in one step.
    pub fn is_double_advance(&self) -> bool {
        match (self.start.rank(), self.end.rank()) {
            (Some(from), Some(to)) => self.piece.kind().is_pawn() && (to - from).abs() == 2,
            _ => false,
        }
    }

    /// Structural well-formedness. This says nothing about whether the
    /// move is legal on any particular board.
    pub fn is_valid(&self) -> bool {
        let (Some(start), Some(end)) = (self.start.square(), self.end.square()) else {
            return false;
        };
        if self.number == 0 || (self.number % 2 == 1) != (self.piece.color() == Color::White) {
            return false;
        }
        if let Some(kind) = self.promotion {
            if !kind.is_promotion_target() || !self.piece.kind().is_pawn() {
                return false;
            }
        }
        if let Some(side) = self.castle {
            return self.piece.kind().is_king()
                && start.rank() == Rank::back_rank(self.piece.color())
                && CastleSide::from_king_move(start, end) == Some(side);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use Square::*;

    #[test]
    fn test_move_number_parity() {
        assert!(Move::new(1, Piece::WP, E2.into(), E4.into()).is_valid());
        assert!(!Move::new(2, Piece::WP, E2.into(), E4.into()).is_valid());
        assert!(Move::new(2, Piece::BP, E7.into(), E5.into()).is_valid());
        assert!(!Move::new(3, Piece::BP, E7.into(), E5.into()).is_valid());
        assert!(!Move::trial(Piece::WP, E2.into(), E4.into()).is_valid());
    }
    #[test]
    fn test_null_positions_invalid() {
        assert!(!Move::new(1, Piece::WP, Position::NULL, E4.into()).is_valid());
        assert!(!Move::new(1, Piece::WP, E2.into(), Position::NULL).is_valid());
    }
    #[test]
    fn test_castle_shape() {
        let mv = Move::new(1, Piece::WK, E1.into(), G1.into()).castling(CastleSide::Kingside);
        assert!(mv.is_valid());
        let mv = Move::new(1, Piece::WK, E1.into(), G1.into()).castling(CastleSide::Queenside);
        assert!(!mv.is_valid());
        let mv = Move::new(1, Piece::WK, E2.into(), G2.into()).castling(CastleSide::Kingside);
        assert!(!mv.is_valid());
        let mv = Move::new(2, Piece::BK, E8.into(), C8.into()).castling(CastleSide::Queenside);
        assert!(mv.is_valid());
        let mv = Move::new(1, Piece::WR, E1.into(), G1.into()).castling(CastleSide::Kingside);
        assert!(!mv.is_valid());
    }
    #[test]
    fn test_promotion_kinds() {
        let mv = Move::new(1, Piece::WP, E7.into(), E8.into());
        assert!(mv.promoting(PieceKind::Queen).is_valid());
        assert!(mv.promoting(PieceKind::Knight).is_valid());
        assert!(!mv.promoting(PieceKind::King).is_valid());
        assert!(!mv.promoting(PieceKind::Pawn).is_valid());
    }
    #[test]
    fn test_en_passant_captured_position() {
        let mv = Move::new(5, Piece::WP, E5.into(), D6.into())
            .en_passant()
            .capturing(PieceKind::Pawn);
        assert_eq!(mv.captured_position(), Position::from(D5));
        let mv = Move::new(5, Piece::WP, E5.into(), D6.into());
        assert_eq!(mv.captured_position(), Position::from(D6));
    }
}
