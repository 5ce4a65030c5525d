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

use log::error;

use super::material::{Color, Piece, PieceKind};
use super::movegen::{KING_MOVES, KNIGHT_MOVES};
use super::square::{Direction, Position};
use super::Board;

use PieceKind::*;

impl AsRef<Board> for Board {
    fn as_ref(&self) -> &Board {
        self
    }
}

impl CheckDetector for Board {}

/// Attack detection by pattern tests around a square.
pub trait CheckDetector: AsRef<Board> {
    /// Returns true if the king of `player`, standing at `king`, is
    /// attacked by the opponent on the current board.
    ///
    /// A null `king` means the caller lost track of the king. That is a
    /// bug upstream, so it is logged and reported as "not in check".
    fn is_king_in_check(&self, player: Color, king: Position) -> bool {
        if !king.is_valid() {
            error!("is_king_in_check: no king position for {}", player);
            return false;
        }
        self.is_attacked(king, !player)
    }

    /// Returns true if any piece of `attacker` attacks `target`.
    fn is_attacked(&self, target: Position, attacker: Color) -> bool {
        let board: &Board = self.as_ref();
        let Some(square) = target.square() else {
            return false;
        };
        let theirs = board.occupied_by(attacker);

        // A pawn attacking `target` stands one rank behind it, from the
        // attacker's point of view.
        let behind = -attacker.forward();
        for right in [-1, 1] {
            if is_piece(board.get(target.offset(right, behind)), attacker, &[Pawn]) {
                return true;
            }
        }

        if (KNIGHT_MOVES[square.to_index()] & theirs)
            .iter()
            .any(|from| is_piece(board.get(from.into()), attacker, &[Knight]))
        {
            return true;
        }

        if Direction::horizontals()
            .any(|dir| is_piece(self.first_occupant(target, dir), attacker, &[Rook, Queen]))
        {
            return true;
        }

        if Direction::diagonals()
            .any(|dir| is_piece(self.first_occupant(target, dir), attacker, &[Bishop, Queen]))
        {
            return true;
        }

        // Kings may never stand next to each other.
        (KING_MOVES[square.to_index()] & theirs)
            .iter()
            .any(|from| is_piece(board.get(from.into()), attacker, &[King]))
    }

    /// Walks from `from` (exclusive) in `dir` and returns the first piece
    /// found, friend or foe. The walk stops there.
    fn first_occupant(&self, from: Position, dir: Direction) -> Option<Piece> {
        let board: &Board = self.as_ref();
        let Some(mut square) = from.square() else {
            return None;
        };
        while let Some(next) = square + dir {
            if let Some(piece) = board.get(next.into()) {
                return Some(piece);
            }
            square = next;
        }
        None
    }
}

#[inline]
fn is_piece(piece: Option<Piece>, color: Color, kinds: &[PieceKind]) -> bool {
    piece.is_some_and(|p| p.color() == color && kinds.contains(&p.kind()))
}

#[cfg(test)]
mod tests {
    use crate::*;
    use Color::*;
    use Square::*;

    fn board(grid: &str) -> Board {
        Board::from_grid(grid).unwrap()
    }

    #[test]
    fn test_start_position_no_check() {
        let board = Board::new();
        assert!(!board.is_king_in_check(White, E1.into()));
        assert!(!board.is_king_in_check(Black, E8.into()));
    }
    #[test]
    fn test_null_king_is_not_in_check() {
        let board = Board::new();
        assert!(!board.is_king_in_check(White, Position::NULL));
    }
    #[test]
    fn test_pawn_check_direction() {
        // A black pawn on d2 attacks e1; one on d1 (behind) does not.
        let b = board(
            "\
____k___
________
________
________
________
________
___p____
____K___
",
        );
        assert!(b.is_king_in_check(White, E1.into()));
        let b = board(
            "\
____k___
________
________
________
________
________
________
___pK___
",
        );
        assert!(!b.is_king_in_check(White, E1.into()));
    }
    #[test]
    fn test_white_pawn_checks_black_king() {
        let b = board(
            "\
____k___
_____P__
________
________
________
________
________
____K___
",
        );
        assert!(b.is_king_in_check(Black, E8.into()));
        assert!(!b.is_king_in_check(White, E1.into()));
    }
    #[test]
    fn test_knight_check() {
        let b = board(
            "\
____k___
________
________
________
________
___n____
________
____K___
",
        );
        assert!(b.is_king_in_check(White, E1.into()));
    }
    #[test]
    fn test_rook_check_blocked_by_own_piece() {
        let open = board(
            "\
____r___
________
________
________
________
________
________
____K__k
",
        );
        assert!(open.is_king_in_check(White, E1.into()));
        let blocked = board(
            "\
____r___
________
________
________
____B___
________
________
____K__k
",
        );
        assert!(!blocked.is_king_in_check(White, E1.into()));
    }
    #[test]
    fn test_ray_stops_at_first_occupant() {
        // The queen behind a black knight on the file does not give check.
        let b = board(
            "\
____q___
________
____n___
________
________
________
________
____K__k
",
        );
        assert!(!b.is_king_in_check(White, E1.into()));
    }
    #[test]
    fn test_bishop_and_queen_diagonals() {
        let b = board(
            "\
____k___
________
________
________
_______b
________
________
____K___
",
        );
        assert!(b.is_king_in_check(White, E1.into()));
        let b = board(
            "\
____k___
________
________
________
_q______
________
________
____K___
",
        );
        assert!(b.is_king_in_check(White, E1.into()));
    }
    #[test]
    fn test_rook_does_not_check_diagonally() {
        let b = board(
            "\
____k___
________
________
________
_r______
________
________
____K___
",
        );
        assert!(!b.is_king_in_check(White, E1.into()));
    }
    #[test]
    fn test_adjacent_kings() {
        let b = board(
            "\
________
________
________
________
________
________
____k___
____K___
",
        );
        assert!(b.is_king_in_check(White, E1.into()));
        assert!(b.is_king_in_check(Black, E2.into()));
    }
}
