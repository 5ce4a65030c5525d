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
use std::fmt;
use std::ops::{Index, IndexMut, Not};
use strum_macros::Display;
use strum_macros::EnumIter;

/// A piece on the board together with the history flags the rules need.
///
/// `has_just_moved` is only ever true for the piece that made the most
/// recent committed move, and only if that was its first move. It is what
/// makes a pawn's double step capturable en passant on the very next ply.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    color: Color,
    kind: PieceKind,
    has_moved: bool,
    has_just_moved: bool,
}

impl Piece {
    pub const WK: Self = Self::new(White, King);
    pub const WQ: Self = Self::new(White, Queen);
    pub const WR: Self = Self::new(White, Rook);
    pub const WB: Self = Self::new(White, Bishop);
    pub const WN: Self = Self::new(White, Knight);
    pub const WP: Self = Self::new(White, Pawn);

    pub const BK: Self = Self::new(Black, King);
    pub const BQ: Self = Self::new(Black, Queen);
    pub const BR: Self = Self::new(Black, Rook);
    pub const BB: Self = Self::new(Black, Bishop);
    pub const BN: Self = Self::new(Black, Knight);
    pub const BP: Self = Self::new(Black, Pawn);

    #[inline]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self {
            color,
            kind,
            has_moved: false,
            has_just_moved: false,
        }
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }
    #[inline]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }
    #[inline]
    pub fn has_moved(&self) -> bool {
        self.has_moved
    }
    #[inline]
    pub fn has_just_moved(&self) -> bool {
        self.has_just_moved
    }
    #[inline]
    pub fn is(&self, color: Color, kind: PieceKind) -> bool {
        self.color == color && self.kind == kind
    }

    #[inline]
    pub(crate) fn set_kind(&mut self, kind: PieceKind) {
        self.kind = kind;
    }

    /// Returns this piece as it stands after a committed move.
    pub(crate) fn moved(mut self) -> Self {
        self.has_just_moved = !self.has_moved;
        self.has_moved = true;
        self
    }

    /// Returns this piece with `has_just_moved` cleared.
    pub(crate) fn settled(mut self) -> Self {
        self.has_just_moved = false;
        self
    }

    /// Returns a copy marked as already moved, for building mid-game setups.
    pub fn with_moved(mut self) -> Self {
        self.has_moved = true;
        self
    }

    /// The single-character code used by the grid text form: uppercase
    /// for White, lowercase for Black.
    pub fn to_char(&self) -> char {
        let c = self.kind.letter();
        match self.color {
            White => c,
            Black => c.to_ascii_lowercase(),
        }
    }

    pub fn try_from_char(c: char) -> Option<Self> {
        let kind = PieceKind::try_from_letter(c)?;
        let color = if c.is_ascii_uppercase() { White } else { Black };
        Some(Self::new(color, kind))
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.kind)
    }
}

use Color::{Black, White};

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const fn to_index(&self) -> usize {
        *self as usize
    }
    /// Rank direction pawns of this color advance in.
    pub const fn forward(&self) -> isize {
        match self {
            White => 1,
            Black => -1,
        }
    }
}

impl Not for Color {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        match self {
            White => Black,
            Black => White,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pair<T>((T, T));

impl<T> Pair<T> {
    pub const fn new(white: T, black: T) -> Self {
        Self((white, black))
    }
    pub fn white(&self) -> &T {
        &self.0 .0
    }
    pub fn white_mut(&mut self) -> &mut T {
        &mut self.0 .0
    }
    pub fn black(&self) -> &T {
        &self.0 .1
    }
    pub fn black_mut(&mut self) -> &mut T {
        &mut self.0 .1
    }
}

impl<T> Index<Color> for Pair<T> {
    type Output = T;

    #[inline(always)]
    fn index(&self, index: Color) -> &Self::Output {
        match index {
            White => self.white(),
            Black => self.black(),
        }
    }
}

impl<T> IndexMut<Color> for Pair<T> {
    #[inline(always)]
    fn index_mut(&mut self, index: Color) -> &mut Self::Output {
        match index {
            White => self.white_mut(),
            Black => self.black_mut(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}
use PieceKind::{Bishop, King, Knight, Pawn, Queen, Rook};

impl PieceKind {
    /// Uppercase notation letter.
    pub const fn letter(&self) -> char {
        match self {
            Pawn => 'P',
            Knight => 'N',
            Bishop => 'B',
            Rook => 'R',
            Queen => 'Q',
            King => 'K',
        }
    }

    pub fn try_from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'P' => Some(Pawn),
            'N' => Some(Knight),
            'B' => Some(Bishop),
            'R' => Some(Rook),
            'Q' => Some(Queen),
            'K' => Some(King),
            _ => None,
        }
    }

    /// Conventional material value. The king is not counted.
    pub const fn points(&self) -> u32 {
        match self {
            Pawn => 1,
            Knight | Bishop => 3,
            Rook => 5,
            Queen => 9,
            King => 0,
        }
    }

    pub fn is_promotion_target(&self) -> bool {
        matches!(*self, Queen | Rook | Bishop | Knight)
    }
    pub fn is_king(&self) -> bool {
        matches!(*self, King)
    }
    pub fn is_pawn(&self) -> bool {
        matches!(*self, Pawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moved_sets_just_moved_once() {
        let pawn = Piece::WP.moved();
        assert!(pawn.has_moved());
        assert!(pawn.has_just_moved());
        let pawn = pawn.moved();
        assert!(pawn.has_moved());
        assert!(!pawn.has_just_moved());
    }
    #[test]
    fn test_piece_chars() {
        assert_eq!(Piece::WQ.to_char(), 'Q');
        assert_eq!(Piece::BN.to_char(), 'n');
        assert_eq!(Piece::try_from_char('k'), Some(Piece::BK));
        assert_eq!(Piece::try_from_char('R'), Some(Piece::WR));
        assert_eq!(Piece::try_from_char('_'), None);
    }
    #[test]
    fn test_promotion_targets() {
        assert!(Queen.is_promotion_target());
        assert!(Knight.is_promotion_target());
        assert!(!King.is_promotion_target());
        assert!(!Pawn.is_promotion_target());
    }
}
