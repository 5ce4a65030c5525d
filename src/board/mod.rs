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

//! Chess board and the rules that operate on it
//!
//! Some of the key abstractions include:
//!
//! * A `Square` is one of the 64 coordinates on the board, named by the
//!   letter of its `File` followed by the number of its `Rank` (`A1` ..
//!   `H8`). A `Position` wraps an optional square: coordinate arithmetic
//!   that would leave the board produces `Position::NULL` instead of an
//!   error, so callers can chain offsets freely and test validity once.
//!
//! * A `Mask` is a 64-bit set of squares. Move generators return masks
//!   of destinations and the board keeps one mask of occupied squares per
//!   color.
//!
//! * A `Piece` is a `PieceKind` of a specific `Color` plus the two
//!   history flags the rules depend on: `has_moved` (castling and the
//!   pawn double step) and `has_just_moved` (en passant).
//!
//! * The `Board` is a plain mutable grid. It knows nothing about turns or
//!   legality. Every write goes through `Board::set`, which keeps the
//!   per-color masks consistent and, unless told otherwise, reports the
//!   write to an optional `SquareListener`.
//!
//! * `MoveGenerator` produces candidate destinations per piece kind and
//!   filters them by check safety. A candidate is tested by writing it to
//!   the board with notifications suppressed, asking the `check` module
//!   whether the mover's king is attacked, and writing the old contents
//!   back. Listeners never see these trial writes.

use anyhow::Result;
use std::fmt;
use std::ops::{Index, IndexMut};
use strum::IntoEnumIterator;
use thiserror::Error;

mod castling;
mod check;
mod material;
mod movegen;
mod moves;
mod notation;
mod square;

pub use castling::*;
pub use check::*;
pub use material::*;
pub use movegen::*;
pub use moves::*;
pub use notation::*;
pub use square::*;

use Color::*;
use PieceKind::*;

/// Receives every committed write to a board square.
pub trait SquareListener {
    fn on_set(&mut self, position: Position, piece: Option<Piece>);
}

impl<F> SquareListener for F
where
    F: FnMut(Position, Option<Piece>),
{
    fn on_set(&mut self, position: Position, piece: Option<Piece>) {
        self(position, piece)
    }
}

/// Whether a write to the board is reported to the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notify {
    Listener,
    Suppressed,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GridError {
    #[error("Expecting 8 ranks, found {0}")]
    RankCount(usize),
    #[error("Expecting 8 squares on rank {rank}, found {found}")]
    RankLength { rank: usize, found: usize },
    #[error("Unknown piece code '{0}'")]
    PieceCode(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Squares([Option<Piece>; 64]);

impl Squares {
    fn empty() -> Self {
        Self([None; 64])
    }
}

impl Index<Square> for Squares {
    type Output = Option<Piece>;
    fn index(&self, index: Square) -> &Self::Output {
        &self.0[index.to_index()]
    }
}

impl IndexMut<Square> for Squares {
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        &mut self.0[index.to_index()]
    }
}

pub struct Board {
    squares: Squares,
    occupied: Pair<Mask>,
    listener: Option<Box<dyn SquareListener>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// A clone is a detached snapshot: it carries the contents but not the
/// listener.
impl Clone for Board {
    fn clone(&self) -> Self {
        Self {
            squares: self.squares,
            occupied: self.occupied,
            listener: None,
        }
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("grid", &self.to_string())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.squares == other.squares
    }
}

impl Board {
    /// A board set up in the standard starting position.
    pub fn new() -> Self {
        let mut board = Self::empty();
        board.reset();
        board
    }

    pub fn empty() -> Self {
        Self {
            squares: Squares::empty(),
            occupied: Pair::default(),
            listener: None,
        }
    }

    /// Parses the grid text form produced by `Display`: eight ranks from
    /// rank 8 down to rank 1, each eight piece codes from file A to H,
    /// with `_`, `.` or a space for an empty square. Pieces standing
    /// anywhere but their starting squares are marked as having moved.
    pub fn from_grid(text: &str) -> Result<Self> {
        let rows: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches(['\r', '\n']))
            .filter(|line| !line.trim().is_empty())
            .collect();
        if rows.len() != 8 {
            return Err(GridError::RankCount(rows.len()).into());
        }
        let mut board = Self::empty();
        for (row, line) in rows.iter().enumerate() {
            let rank = Rank::from_index(7 - row);
            let codes: Vec<char> = line.trim().chars().collect();
            if codes.len() != 8 {
                return Err(GridError::RankLength {
                    rank: rank.number(),
                    found: codes.len(),
                }
                .into());
            }
            for (file, code) in File::iter().zip(codes) {
                if matches!(code, '_' | '.' | ' ') {
                    continue;
                }
                let piece = Piece::try_from_char(code).ok_or(GridError::PieceCode(code))?;
                let square = Square::new(file, rank);
                let piece = if is_home_square(piece, square) {
                    piece
                } else {
                    piece.with_moved()
                };
                board.set(square.into(), Some(piece), Notify::Suppressed);
            }
        }
        Ok(board)
    }

    pub fn set_listener<L: SquareListener + 'static>(&mut self, listener: L) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Returns the piece at `position`, or `None` for an empty square or
    /// the null position.
    #[inline]
    pub fn get(&self, position: Position) -> Option<Piece> {
        position.square().and_then(|square| self.squares[square])
    }

    /// Overwrites the square at `position`. Returns false without effect
    /// for the null position.
    pub fn set(&mut self, position: Position, piece: Option<Piece>, notify: Notify) -> bool {
        let Some(square) = position.square() else {
            return false;
        };
        self.squares[square] = piece;
        match piece {
            Some(piece) => {
                self.occupied[piece.color()].set(square);
                self.occupied[!piece.color()].reset(square);
            }
            None => {
                self.occupied[White].reset(square);
                self.occupied[Black].reset(square);
            }
        }
        if notify == Notify::Listener {
            if let Some(listener) = self.listener.as_mut() {
                listener.on_set(position, piece);
            }
        }
        true
    }

    #[inline]
    pub fn place(&mut self, position: Position, piece: Piece) -> bool {
        self.set(position, Some(piece), Notify::Listener)
    }

    #[inline]
    pub fn remove(&mut self, position: Position) -> bool {
        self.set(position, None, Notify::Listener)
    }

    #[inline]
    pub fn relative_position(&self, base: Position, right: isize, up: isize) -> Position {
        base.offset(right, up)
    }

    /// True if `position` holds a piece, and when `by` names a color,
    /// only if that color owns it.
    pub fn is_occupied(&self, position: Position, by: Option<Color>) -> bool {
        match (self.get(position), by) {
            (Some(piece), Some(color)) => piece.color() == color,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    #[inline]
    pub fn occupied_by(&self, color: Color) -> Mask {
        self.occupied[color]
    }

    #[inline]
    pub fn occupied(&self) -> Mask {
        self.occupied[White] | self.occupied[Black]
    }

    /// Locates the king of `color` by scanning the board, or returns the
    /// null position if there is none.
    pub fn find_king(&self, color: Color) -> Position {
        self.occupied[color]
            .iter()
            .find(|&square| self.squares[square].is_some_and(|p| p.kind() == King))
            .into()
    }

    /// Sum of conventional piece values for `color`.
    pub fn material(&self, color: Color) -> u32 {
        self.occupied[color]
            .iter()
            .filter_map(|square| self.squares[square])
            .map(|piece| piece.kind().points())
            .sum()
    }

    /// Restores the standard starting position. Every square is written,
    /// so a listener sees all 64.
    pub fn reset(&mut self) {
        const BACK_RANK: [PieceKind; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        for rank in Rank::iter() {
            for file in File::iter() {
                let piece = match rank {
                    Rank::Rank1 => Some(Piece::new(White, BACK_RANK[file.to_index()])),
                    Rank::Rank2 => Some(Piece::WP),
                    Rank::Rank7 => Some(Piece::BP),
                    Rank::Rank8 => Some(Piece::new(Black, BACK_RANK[file.to_index()])),
                    _ => None,
                };
                self.set(Position::new(file, rank), piece, Notify::Listener);
            }
        }
    }

    /// Clears `has_just_moved` on every piece except the one at `keep`.
    pub(crate) fn settle_except(&mut self, keep: Position) {
        for square in self.occupied().iter() {
            if keep == Position::from(square) {
                continue;
            }
            if let Some(piece) = self.squares[square] {
                if piece.has_just_moved() {
                    self.squares[square] = Some(piece.settled());
                }
            }
        }
    }
}

fn is_home_square(piece: Piece, square: Square) -> bool {
    let rank = square.rank();
    match piece.kind() {
        Pawn => rank == Rank::pawn_rank(piece.color()),
        King => rank == Rank::back_rank(piece.color()) && square.file() == File::FileE,
        Rook => {
            rank == Rank::back_rank(piece.color())
                && matches!(square.file(), File::FileA | File::FileH)
        }
        _ => rank == Rank::back_rank(piece.color()),
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            for file in File::iter() {
                let code = self.squares[Square::new(file, rank)].map_or('_', |p| p.to_char());
                write!(f, "{}", code)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use Square::*;

    const START: &str = "\
rnbqkbnr
pppppppp
________
________
________
________
PPPPPPPP
RNBQKBNR
";

    #[test]
    fn test_reset_grid_text() {
        let board = Board::new();
        assert_eq!(board.to_string(), START);
    }
    #[test]
    fn test_from_grid_round_trip() {
        let board = Board::from_grid(START).unwrap();
        assert_eq!(board, Board::new());
        assert_eq!(board.to_string(), START);
    }
    #[test]
    fn test_from_grid_errors() {
        assert!(Board::from_grid("rnbqkbnr").is_err());
        let bad = START.replace("RNBQKBNR", "RNBQKBNX");
        assert!(Board::from_grid(&bad).is_err());
        let short = START.replace("RNBQKBNR", "RNBQKBN");
        assert!(Board::from_grid(&short).is_err());
    }
    #[test]
    fn test_from_grid_marks_displaced_pieces_moved() {
        let board = Board::from_grid(
            "\
____k___
________
________
________
____P___
________
P_______
R___K__R
",
        )
        .unwrap();
        assert!(board.get(E4.into()).unwrap().has_moved());
        assert!(!board.get(A2.into()).unwrap().has_moved());
        assert!(!board.get(E1.into()).unwrap().has_moved());
        assert!(!board.get(H1.into()).unwrap().has_moved());
        assert!(!board.get(E8.into()).unwrap().has_moved());
    }
    #[test]
    fn test_get_null_position() {
        let board = Board::new();
        assert_eq!(board.get(Position::NULL), None);
    }
    #[test]
    fn test_set_null_position_has_no_effect() {
        let mut board = Board::new();
        assert!(!board.set(Position::NULL, Some(Piece::WQ), Notify::Listener));
        assert_eq!(board, Board::new());
    }
    #[test]
    fn test_occupancy_tracks_captures() {
        let mut board = Board::new();
        assert_eq!(board.occupied_by(White).len(), 16);
        assert_eq!(board.occupied_by(Black).len(), 16);
        board.place(E7.into(), Piece::WQ);
        assert!(board.occupied_by(White).contains(E7));
        assert!(!board.occupied_by(Black).contains(E7));
        assert_eq!(board.occupied_by(Black).len(), 15);
        board.remove(E7.into());
        assert!(!board.occupied().contains(E7));
    }
    #[test]
    fn test_is_occupied() {
        let board = Board::new();
        assert!(board.is_occupied(E2.into(), None));
        assert!(board.is_occupied(E2.into(), Some(White)));
        assert!(!board.is_occupied(E2.into(), Some(Black)));
        assert!(!board.is_occupied(E4.into(), None));
        assert!(!board.is_occupied(Position::NULL, None));
    }
    #[test]
    fn test_relative_position() {
        let board = Board::new();
        let e1: Position = E1.into();
        assert_eq!(board.relative_position(e1, 3, 0), H1.into());
        assert_eq!(board.relative_position(e1, -4, 0), A1.into());
        assert_eq!(board.relative_position(e1, 0, -1), Position::NULL);
    }
    #[test]
    fn test_listener_sees_only_notified_writes() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut board = Board::new();
        let sink = events.clone();
        board.set_listener(move |pos: Position, piece: Option<Piece>| {
            sink.borrow_mut().push((pos, piece))
        });
        board.set(E4.into(), Some(Piece::WP), Notify::Suppressed);
        assert!(events.borrow().is_empty());
        board.set(E4.into(), None, Notify::Listener);
        assert_eq!(events.borrow().as_slice(), &[(Position::from(E4), None)]);
        board.reset();
        assert_eq!(events.borrow().len(), 65);
    }
    #[test]
    fn test_clone_is_detached() {
        let events = Rc::new(RefCell::new(0));
        let mut board = Board::new();
        let sink = events.clone();
        board.set_listener(move |_: Position, _: Option<Piece>| *sink.borrow_mut() += 1);
        let mut copy = board.clone();
        copy.remove(E2.into());
        assert_eq!(*events.borrow(), 0);
        assert_ne!(copy, board);
    }
    #[test]
    fn test_settle_except_keeps_only_the_mover_flagged() {
        let mut board = Board::empty();
        board.place(E4.into(), Piece::WP.moved());
        board.place(D5.into(), Piece::BP.moved());
        board.settle_except(D5.into());
        assert!(!board.get(E4.into()).unwrap().has_just_moved());
        assert!(board.get(D5.into()).unwrap().has_just_moved());
        assert!(board.get(E4.into()).unwrap().has_moved());
    }
    #[test]
    fn test_find_king_and_material() {
        let board = Board::new();
        assert_eq!(board.find_king(White), E1.into());
        assert_eq!(board.find_king(Black), E8.into());
        assert_eq!(board.material(White), 39);
        assert_eq!(Board::empty().find_king(White), Position::NULL);
    }
}
