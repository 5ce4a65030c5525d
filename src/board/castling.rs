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
use strum_macros::EnumIter;

use super::check::CheckDetector;
use super::material::PieceKind;
use super::movegen::MoveGenerator;
use super::moves::Move;
use super::square::{File, Position, Rank, Square};

use File::*;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

use CastleSide::*;

impl CastleSide {
    /// Recognizes a castling shape: the king leaves file E for file G or
    /// file C on the same rank.
    pub fn from_king_move(start: Square, end: Square) -> Option<Self> {
        if start.rank() != end.rank() || start.file() != FileE {
            return None;
        }
        match end.file() {
            FileG => Some(Kingside),
            FileC => Some(Queenside),
            _ => None,
        }
    }

    #[inline]
    pub const fn king_file(&self) -> File {
        match self {
            Kingside => FileG,
            Queenside => FileC,
        }
    }
    #[inline]
    pub const fn rook_file(&self) -> File {
        match self {
            Kingside => FileH,
            Queenside => FileA,
        }
    }
    #[inline]
    pub const fn rook_dest_file(&self) -> File {
        match self {
            Kingside => FileF,
            Queenside => FileD,
        }
    }
    #[inline]
    pub fn king_dest(&self, rank: Rank) -> Position {
        Position::new(self.king_file(), rank)
    }
    #[inline]
    pub fn rook_src(&self, rank: Rank) -> Position {
        Position::new(self.rook_file(), rank)
    }
    #[inline]
    pub fn rook_dest(&self, rank: Rank) -> Position {
        Position::new(self.rook_dest_file(), rank)
    }

    /// Squares strictly between the king and the rook. All must be empty.
    pub fn blocking_lane(&self, rank: Rank) -> impl Iterator<Item = Position> {
        let (from, to) = match self {
            Kingside => (FileF, FileH),
            Queenside => (FileB, FileE),
        };
        File::range(from, to).map(move |file| Position::new(file, rank))
    }

    /// Squares the king passes through or lands on. None may be attacked.
    pub fn king_path(&self, rank: Rank) -> impl Iterator<Item = Position> {
        let (from, to) = match self {
            Kingside => (FileF, FileH),
            Queenside => (FileC, FileE),
        };
        File::range(from, to).map(move |file| Position::new(file, rank))
    }

    pub const fn notation(&self) -> &'static str {
        match self {
            Kingside => "O-O",
            Queenside => "O-O-O",
        }
    }
}

impl MoveGenerator<'_> {
    /// Decides whether the king at `start` may castle to `end`.
    ///
    /// The king and the rook on the chosen side must both be unmoved and
    /// on the mover's back rank, every square between them must be empty,
    /// and the king may not start in check nor cross or land on a square
    /// where it would be in check. The crossing test reuses the
    /// simulate-and-revert probe with a synthetic king step per square.
    pub fn castle_valid(&mut self, start: Position, end: Position) -> Option<CastleSide> {
        let king = self.board().get(start)?;
        if !king.kind().is_king() || king.has_moved() {
            return None;
        }
        let side = CastleSide::from_king_move(start.square()?, end.square()?)?;
        let rank = start.rank()?;
        let color = king.color();
        if rank != Rank::back_rank(color) {
            return None;
        }
        let rook = self.board().get(side.rook_src(rank))?;
        if !rook.is(color, PieceKind::Rook) || rook.has_moved() {
            return None;
        }
        if side
            .blocking_lane(rank)
            .any(|square| self.board().is_occupied(square, None))
        {
            return None;
        }
        if self.board().is_king_in_check(color, start) {
            return None;
        }
        for square in side.king_path(rank) {
            if self.is_checked_after_move(color, &Move::trial(king, start, square)) {
                return None;
            }
        }
        Some(side)
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use Color::*;
    use Square::*;

    fn castle(grid: &str, start: Square, end: Square) -> Option<CastleSide> {
        let mut board = Board::from_grid(grid).unwrap();
        let kings = Pair::new(board.find_king(White), board.find_king(Black));
        MoveGenerator::new(&mut board, kings, None).castle_valid(start.into(), end.into())
    }

    const OPEN: &str = "\
r___k__r
pppppppp
________
________
________
________
PPPPPPPP
R___K__R
";

    #[test]
    fn test_both_sides_open() {
        assert_eq!(castle(OPEN, E1, G1), Some(CastleSide::Kingside));
        assert_eq!(castle(OPEN, E1, C1), Some(CastleSide::Queenside));
        assert_eq!(castle(OPEN, E8, G8), Some(CastleSide::Kingside));
        assert_eq!(castle(OPEN, E8, C8), Some(CastleSide::Queenside));
    }
    #[test]
    fn test_not_a_castle_shape() {
        assert_eq!(castle(OPEN, E1, F1), None);
        assert_eq!(castle(OPEN, E1, H1), None);
    }
    #[test]
    fn test_lane_blocked() {
        let grid = OPEN.replace("R___K__R", "RN__K_NR");
        assert_eq!(castle(&grid, E1, G1), None);
        assert_eq!(castle(&grid, E1, C1), None);
    }
    #[test]
    fn test_moved_rook() {
        let mut board = Board::from_grid(OPEN).unwrap();
        let rook = board.get(H1.into()).unwrap().with_moved();
        board.place(H1.into(), rook);
        let kings = Pair::new(E1.into(), E8.into());
        let mut gen = MoveGenerator::new(&mut board, kings, None);
        assert_eq!(gen.castle_valid(E1.into(), G1.into()), None);
        assert_eq!(gen.castle_valid(E1.into(), C1.into()), Some(CastleSide::Queenside));
    }
    #[test]
    fn test_path_attacked() {
        // A black rook on f8 with the f-pawns gone covers f1.
        let grid = "\
r___kr__
ppppp_pp
________
________
________
________
PPPPP_PP
R___K__R
";
        assert_eq!(castle(grid, E1, G1), None);
        assert_eq!(castle(grid, E1, C1), Some(CastleSide::Queenside));
    }
    #[test]
    fn test_attacked_b_file_does_not_matter() {
        let grid = "\
_r__k___
________
________
________
________
________
________
R___K___
";
        assert_eq!(castle(grid, E1, C1), Some(CastleSide::Queenside));
    }
    #[test]
    fn test_destination_attacked() {
        // The knight on h3 covers g1 but not f1.
        let grid = "\
rnbqkbnr
pppppppp
________
________
________
_______n
PPPPPPPP
RNBQK__R
";
        assert_eq!(castle(grid, E1, G1), None);
    }
    #[test]
    fn test_cannot_castle_out_of_check() {
        let grid = "\
____r_k_
________
________
________
________
________
________
R___K__R
";
        assert_eq!(castle(grid, E1, G1), None);
        assert_eq!(castle(grid, E1, C1), None);
    }
    #[test]
    fn test_probe_leaves_board_untouched() {
        let mut board = Board::from_grid(OPEN).unwrap();
        let before = board.clone();
        let kings = Pair::new(E1.into(), E8.into());
        MoveGenerator::new(&mut board, kings, None).castle_valid(E1.into(), G1.into());
        assert_eq!(board, before);
    }
}
