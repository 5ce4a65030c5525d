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
use std::ops::{Add, BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Sub};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use super::material::Color;

use Color::*;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Square {
    A1, B1, C1, D1, E1, F1, G1, H1,
    A2, B2, C2, D2, E2, F2, G2, H2,
    A3, B3, C3, D3, E3, F3, G3, H3,
    A4, B4, C4, D4, E4, F4, G4, H4,
    A5, B5, C5, D5, E5, F5, G5, H5,
    A6, B6, C6, D6, E6, F6, G6, H6,
    A7, B7, C7, D7, E7, F7, G7, H7,
    A8, B8, C8, D8, E8, F8, G8, H8,
}

use Square::{
    A1, B1, C1, D1, E1, F1, G1, H1,
    A2, B2, C2, D2, E2, F2, G2, H2,
    A3, B3, C3, D3, E3, F3, G3, H3,
    A4, B4, C4, D4, E4, F4, G4, H4,
    A5, B5, C5, D5, E5, F5, G5, H5,
    A6, B6, C6, D6, E6, F6, G6, H6,
    A7, B7, C7, D7, E7, F7, G7, H7,
    A8, B8, C8, D8, E8, F8, G8, H8,
};

impl Square {
    #[inline]
    pub const fn new(file: File, rank: Rank) -> Self {
        Self::from_index(rank.to_index() * 8 + file.to_index())
    }

    #[inline]
    pub const fn from_index(index: usize) -> Self {
        const VALUES: [Square; 64] = [
            A1, B1, C1, D1, E1, F1, G1, H1,
            A2, B2, C2, D2, E2, F2, G2, H2,
            A3, B3, C3, D3, E3, F3, G3, H3,
            A4, B4, C4, D4, E4, F4, G4, H4,
            A5, B5, C5, D5, E5, F5, G5, H5,
            A6, B6, C6, D6, E6, F6, G6, H6,
            A7, B7, C7, D7, E7, F7, G7, H7,
            A8, B8, C8, D8, E8, F8, G8, H8,
        ];
        debug_assert!(index < 64);
        VALUES[index]
    }
    #[inline]
    pub fn try_from_string(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let f = chars.next()?;
        let r = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        Self::try_from_chars(f, r)
    }
    #[inline]
    pub fn try_from_chars(f: char, r: char) -> Option<Self> {
        let file = File::try_from_char(f)?;
        let rank = Rank::try_from_char(r)?;
        Some(Self::new(file, rank))
    }

    #[inline]
    pub const fn to_index(&self) -> usize {
        *self as usize
    }
    #[inline]
    pub const fn to_mask(&self) -> Mask {
        Mask::new(0x1 << self.to_index())
    }
    #[inline]
    pub const fn file(&self) -> File {
        File::from_index(self.to_index() % 8)
    }
    #[inline]
    pub const fn rank(&self) -> Rank {
        Rank::from_index(self.to_index() / 8)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

impl From<Square> for usize {
    fn from(value: Square) -> Self {
        value.to_index()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
pub enum File {
    FileA, FileB, FileC, FileD, FileE, FileF, FileG, FileH,
}

use File::{FileA, FileB, FileC, FileD, FileE, FileF, FileG, FileH};

impl File {
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        const VALUES: [File; 8] = [
            FileA, FileB, FileC, FileD, FileE, FileF, FileG, FileH,
        ];
        debug_assert!(index < 8);
        VALUES[index]
    }
    #[inline]
    pub const fn try_from_char(c: char) -> Option<Self> {
        match c {
            'a' | 'A' => Some(FileA),
            'b' | 'B' => Some(FileB),
            'c' | 'C' => Some(FileC),
            'd' | 'D' => Some(FileD),
            'e' | 'E' => Some(FileE),
            'f' | 'F' => Some(FileF),
            'g' | 'G' => Some(FileG),
            'h' | 'H' => Some(FileH),
            _ => None,
        }
    }
    #[inline]
    pub const fn to_index(&self) -> usize {
        *self as usize
    }
    #[inline]
    pub const fn to_char(&self) -> char {
        const VALUES: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];
        VALUES[self.to_index()]
    }
    #[inline]
    pub fn range(start: File, end: File) -> impl Iterator<Item = File> {
        (start.to_index()..end.to_index()).map(File::from_index)
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl Add<isize> for File {
    type Output = Option<Self>;
    fn add(self, rhs: isize) -> Self::Output {
        match self.to_index().checked_add_signed(rhs) {
            Some(i) if i < 8 => Some(Self::from_index(i)),
            _ => None,
        }
    }
}

impl Sub for File {
    type Output = isize;
    fn sub(self, rhs: Self) -> Self::Output {
        self.to_index() as isize - rhs.to_index() as isize
    }
}

/// Ranks run bottom-up from White's side, so a positive `y` offset
/// always moves "up" the board.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
pub enum Rank {
    Rank1, Rank2, Rank3, Rank4, Rank5, Rank6, Rank7, Rank8,
}

use Rank::{Rank1, Rank2, Rank3, Rank4, Rank5, Rank6, Rank7, Rank8};

impl Rank {
    #[inline]
    pub fn is_back_rank(&self, color: Color) -> bool {
        Self::back_rank(color) == *self
    }
    #[inline]
    pub const fn back_rank(color: Color) -> Self {
        match color {
            White => Rank1,
            Black => Rank8,
        }
    }
    #[inline]
    pub const fn pawn_rank(color: Color) -> Self {
        match color {
            White => Rank2,
            Black => Rank7,
        }
    }
    /// The rank a pawn of `color` promotes on.
    #[inline]
    pub const fn promotion_rank(color: Color) -> Self {
        match color {
            White => Rank8,
            Black => Rank1,
        }
    }
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        const VALUES: [Rank; 8] = [
            Rank1, Rank2, Rank3, Rank4, Rank5, Rank6, Rank7, Rank8,
        ];
        debug_assert!(index < 8);
        VALUES[index]
    }
    #[inline]
    pub fn try_from_char(c: char) -> Option<Self> {
        match c {
            '1' => Some(Rank1),
            '2' => Some(Rank2),
            '3' => Some(Rank3),
            '4' => Some(Rank4),
            '5' => Some(Rank5),
            '6' => Some(Rank6),
            '7' => Some(Rank7),
            '8' => Some(Rank8),
            _ => None,
        }
    }
    #[inline]
    pub const fn to_index(&self) -> usize {
        *self as usize
    }
    /// The rank number as written on the board (1..=8).
    #[inline]
    pub const fn number(&self) -> usize {
        self.to_index() + 1
    }
    #[inline]
    pub const fn to_char(&self) -> char {
        const VALUES: [char; 8] = ['1', '2', '3', '4', '5', '6', '7', '8'];
        VALUES[self.to_index()]
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl Add<isize> for Rank {
    type Output = Option<Self>;
    fn add(self, rhs: isize) -> Self::Output {
        match self.to_index().checked_add_signed(rhs) {
            Some(i) if i < 8 => Some(Self::from_index(i)),
            _ => None,
        }
    }
}

impl Sub for Rank {
    type Output = isize;
    fn sub(self, rhs: Self) -> Self::Output {
        self.to_index() as isize - rhs.to_index() as isize
    }
}

/// A board coordinate that may be the null sentinel.
///
/// Every coordinate computation that would leave the 8x8 board yields
/// [`Position::NULL`] rather than an error. The null position compares
/// equal only to itself, never to a square on the board.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position(Option<Square>);

impl Position {
    pub const NULL: Self = Self(None);

    #[inline]
    pub const fn new(file: File, rank: Rank) -> Self {
        Self(Some(Square::new(file, rank)))
    }

    /// Builds a position from a zero-based file (0..8) and a one-based
    /// rank (1..=8).
    pub fn from_coords(file: isize, rank: isize) -> Self {
        if !(0..8).contains(&file) || !(1..=8).contains(&rank) {
            return Self::NULL;
        }
        Self::new(
            File::from_index(file as usize),
            Rank::from_index(rank as usize - 1),
        )
    }

    /// Parses a square name such as `"e4"`. Malformed input degrades to
    /// [`Position::NULL`].
    pub fn parse(name: &str) -> Self {
        Self(Square::try_from_string(name.trim()))
    }

    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0.is_some()
    }
    #[inline]
    pub const fn square(&self) -> Option<Square> {
        self.0
    }
    #[inline]
    pub fn file(&self) -> Option<File> {
        self.0.map(|square| square.file())
    }
    #[inline]
    pub fn rank(&self) -> Option<Rank> {
        self.0.map(|square| square.rank())
    }

    /// Returns the position `right` files and `up` ranks away, or
    /// [`Position::NULL`] if that falls off the board. The null position
    /// is absorbing.
    pub fn offset(self, right: isize, up: isize) -> Self {
        match self.0 {
            Some(square) => Self(square + Offset::new(right, up)),
            None => Self::NULL,
        }
    }
}

impl From<Square> for Position {
    fn from(value: Square) -> Self {
        Self(Some(value))
    }
}

impl From<Option<Square>> for Position {
    fn from(value: Option<Square>) -> Self {
        Self(value)
    }
}

impl From<&str> for Position {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(square) => write!(f, "{}", square),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(square) => write!(f, "Position({})", square),
            None => write!(f, "Position(NULL)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
    pub x: isize,
    pub y: isize,
}

impl Offset {
    pub const fn new(x: isize, y: isize) -> Self {
        Self { x, y }
    }
}

impl Add<Offset> for Square {
    type Output = Option<Square>;
    fn add(self, rhs: Offset) -> Self::Output {
        let file = (self.file() + rhs.x)?;
        let rank = (self.rank() + rhs.y)?;
        Some(Square::new(file, rank))
    }
}

impl Sub for Square {
    type Output = Offset;
    fn sub(self, rhs: Self) -> Self::Output {
        Offset::new(self.file() - rhs.file(), self.rank() - rhs.rank())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Direction {
    UpLeft,
    Up,
    UpRight,
    Left,
    Right,
    DownLeft,
    Down,
    DownRight,
}

use Direction::{Down, DownLeft, DownRight, Left, Right, Up, UpLeft, UpRight};

impl Direction {
    #[inline]
    pub fn is_horizontal(&self) -> bool {
        matches!(*self, Up | Left | Right | Down)
    }
    #[inline]
    pub fn is_diagonal(&self) -> bool {
        matches!(*self, UpLeft | UpRight | DownLeft | DownRight)
    }
    pub fn horizontals() -> impl Iterator<Item = Self> {
        [Up, Left, Right, Down].into_iter()
    }
    pub fn diagonals() -> impl Iterator<Item = Self> {
        [UpLeft, UpRight, DownLeft, DownRight].into_iter()
    }
}

impl From<Direction> for Offset {
    fn from(value: Direction) -> Self {
        match value {
            UpLeft => Self::new(-1, 1),
            Up => Self::new(0, 1),
            UpRight => Self::new(1, 1),
            Left => Self::new(-1, 0),
            Right => Self::new(1, 0),
            DownLeft => Self::new(-1, -1),
            Down => Self::new(0, -1),
            DownRight => Self::new(1, -1),
        }
    }
}

impl Add<Direction> for Square {
    type Output = Option<Square>;
    fn add(self, rhs: Direction) -> Self::Output {
        let offset: Offset = rhs.into();
        self + offset
    }
}

/// A set of squares, one bit per square (`A1` is bit 0, `H8` bit 63).
#[derive(Clone, Serialize, Deserialize, Copy, PartialEq, Eq, Hash, Default)]
pub struct Mask(u64);

impl Mask {
    #[inline]
    pub const fn new(val: u64) -> Self {
        Self(val)
    }
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn from_squares<I>(squares: I) -> Self
    where
        I: IntoIterator<Item = Square>,
    {
        squares
            .into_iter()
            .map(|square| square.to_mask())
            .reduce(|m1, m2| m1 | m2)
            .unwrap_or_default()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
    #[inline]
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }
    #[inline]
    pub const fn contains(&self, square: Square) -> bool {
        (self.0 & square.to_mask().0) != 0
    }
    /// Like `contains`, but the null position is never a member.
    #[inline]
    pub fn contains_position(&self, position: Position) -> bool {
        position.square().is_some_and(|square| self.contains(square))
    }
    #[inline]
    pub fn set(&mut self, square: Square) {
        self.0 |= square.to_mask().0;
    }
    #[inline]
    pub fn reset(&mut self, square: Square) {
        self.0 &= !square.to_mask().0;
    }

    pub fn iter(&self) -> MaskIter {
        MaskIter(self.0)
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> {
        self.iter().map(Position::from)
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            for file in File::iter() {
                let square = Square::new(file, rank);
                write!(f, "{}", if self.contains(square) { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Sub for Mask {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 & !rhs.0)
    }
}

impl Not for Mask {
    type Output = Self;
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl BitOr for Mask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Mask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitOr<Square> for Mask {
    type Output = Self;
    fn bitor(self, rhs: Square) -> Self {
        Self(self.0 | rhs.to_mask().0)
    }
}

impl BitOrAssign<Square> for Mask {
    fn bitor_assign(&mut self, rhs: Square) {
        self.0 |= rhs.to_mask().0;
    }
}

impl BitAnd for Mask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Mask {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl FromIterator<Square> for Mask {
    fn from_iter<T: IntoIterator<Item = Square>>(iter: T) -> Self {
        Self::from_squares(iter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaskIter(u64);

impl Iterator for MaskIter {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 != 0 {
            let square = Square::from_index(self.0.trailing_zeros() as usize);
            self.0 &= self.0 - 1;
            return Some(square);
        }
        None
    }
}

impl DoubleEndedIterator for MaskIter {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.0 != 0 {
            let square = Square::from_index(63 - self.0.leading_zeros() as usize);
            self.0 &= !square.to_mask().0;
            return Some(square);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_coordinates() {
        assert_eq!(E4.file(), FileE);
        assert_eq!(E4.rank(), Rank4);
        assert_eq!(Square::new(FileH, Rank8), H8);
        assert_eq!(A1.to_index(), 0);
        assert_eq!(H8.to_index(), 63);
    }
    #[test]
    fn test_parse_position() {
        assert_eq!(Position::parse("e4"), Position::from(E4));
        assert_eq!(Position::parse("H8"), Position::from(H8));
        assert_eq!(Position::parse("i1"), Position::NULL);
        assert_eq!(Position::parse("a9"), Position::NULL);
        assert_eq!(Position::parse("a"), Position::NULL);
        assert_eq!(Position::parse("a11"), Position::NULL);
        assert_eq!(Position::parse(""), Position::NULL);
    }
    #[test]
    fn test_null_never_equals_a_square() {
        for square in Square::iter() {
            assert_ne!(Position::NULL, Position::from(square));
        }
        assert_eq!(Position::NULL, Position::NULL);
        assert!(!Position::NULL.is_valid());
        assert_eq!(Position::NULL.to_string(), "");
    }
    #[test]
    fn test_position_equality_against_converted_squares() {
        let e4 = Position::parse("e4");
        assert_eq!(e4, E4.into());
        assert_ne!(e4, D4.into());
        assert_ne!(Position::NULL, A1.into());
    }
    #[test]
    fn test_from_coords() {
        assert_eq!(Position::from_coords(0, 1), Position::from(A1));
        assert_eq!(Position::from_coords(7, 8), Position::from(H8));
        assert_eq!(Position::from_coords(8, 1), Position::NULL);
        assert_eq!(Position::from_coords(0, 0), Position::NULL);
        assert_eq!(Position::from_coords(-1, 4), Position::NULL);
    }
    #[test]
    fn test_offset() {
        let e1 = Position::from(E1);
        assert_eq!(e1.offset(2, 0), Position::from(G1));
        assert_eq!(e1.offset(-4, 0), Position::from(A1));
        assert_eq!(e1.offset(1, 2), Position::from(F3));
        assert_eq!(e1.offset(0, -1), Position::NULL);
        assert_eq!(e1.offset(4, 0), Position::NULL);
        assert_eq!(Position::NULL.offset(0, 0), Position::NULL);
    }
    #[test]
    fn test_direction_up_increases_rank() {
        assert_eq!(E4 + Direction::Up, Some(E5));
        assert_eq!(E4 + Direction::DownLeft, Some(D3));
        assert_eq!(A1 + Direction::Left, None);
    }
    #[test]
    fn test_mask_iter_order() {
        let mask = Mask::from_squares([H8, A1, E4]);
        assert_eq!(mask.len(), 3);
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![A1, E4, H8]);
        assert_eq!(mask.iter().rev().collect::<Vec<_>>(), vec![H8, E4, A1]);
        assert!(mask.contains_position(Position::from(E4)));
        assert!(!mask.contains_position(Position::NULL));
    }
}
