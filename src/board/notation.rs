// Copyright 2026 Tobin Edwards
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

use std::fmt;

use super::material::{Color, PieceKind};
use super::moves::Move;

/// Result token appended to a finished game's move list. `None` means
/// the game ended without a winner.
pub const fn result_token(winner: Option<Color>) -> &'static str {
    match winner {
        Some(Color::White) => "1-0",
        Some(Color::Black) => "0-1",
        None => "½-½",
    }
}

impl Move {
    /// Long-form notation: `<n>. [Piece]<start>[x]<end>[=Promotion][+]`,
    /// or `<n>. O-O` / `<n>. O-O-O` for castles. Pawns carry no letter.
    pub fn long_notation(&self) -> String {
        let mut s = format!("{}. ", self.number());
        if let Some(side) = self.castle() {
            s.push_str(side.notation());
        } else {
            let kind = self.piece().kind();
            if kind != PieceKind::Pawn {
                s.push(kind.letter());
            }
            s.push_str(&self.start().to_string());
            if self.captured().is_some() {
                s.push('x');
            }
            s.push_str(&self.end().to_string());
            if let Some(promotion) = self.promotion() {
                s.push('=');
                s.push(promotion.letter());
            }
        }
        if self.check().is_some() {
            s.push('+');
        }
        s
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.long_notation())
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use Square::*;

    #[test]
    fn test_pawn_move_has_no_letter() {
        let mv = Move::new(1, Piece::WP, E2.into(), E4.into());
        assert_eq!(mv.long_notation(), "1. e2e4");
    }
    #[test]
    fn test_capture_and_check() {
        let mv = Move::new(4, Piece::BQ, D8.into(), H4.into()).checking(Some(Color::White));
        assert_eq!(mv.to_string(), "4. Qd8h4+");
        let mv = Move::new(7, Piece::WN, F3.into(), E5.into()).capturing(PieceKind::Pawn);
        assert_eq!(mv.to_string(), "7. Nf3xe5");
    }
    #[test]
    fn test_promotion_suffix() {
        let mv = Move::new(9, Piece::WP, B7.into(), A8.into())
            .capturing(PieceKind::Rook)
            .promoting(PieceKind::Queen);
        assert_eq!(mv.long_notation(), "9. b7xa8=Q");
    }
    #[test]
    fn test_castles() {
        let mv = Move::new(5, Piece::WK, E1.into(), G1.into()).castling(CastleSide::Kingside);
        assert_eq!(mv.long_notation(), "5. O-O");
        let mv = Move::new(6, Piece::BK, E8.into(), C8.into())
            .castling(CastleSide::Queenside)
            .checking(Some(Color::White));
        assert_eq!(mv.long_notation(), "6. O-O-O+");
    }
    #[test]
    fn test_result_tokens() {
        assert_eq!(result_token(Some(Color::White)), "1-0");
        assert_eq!(result_token(Some(Color::Black)), "0-1");
        assert_eq!(result_token(None), "½-½");
    }
}
