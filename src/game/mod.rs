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

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use strum::IntoEnumIterator;

use crate::{
    result_token, Board, CastleSide, CheckDetector, Color, Mask, Move, MoveError,
    MoveGenerator, MoveOutcome, Pair, Piece, PieceKind, Position, PromotionError, Rank, Safety,
};

mod config;
mod observer;

pub use config::*;
pub use observer::*;

use observer::{SharedObserver, SquareForwarder};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    Win(Color, WinReason),
    Draw(DrawReason),
}

impl GameResult {
    pub fn winner(&self) -> Option<Color> {
        match self {
            GameResult::Win(color, _) => Some(*color),
            GameResult::Draw(_) => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinReason {
    CheckMate,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawReason {
    StaleMate,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Active,
    /// A pawn of this color stands on the last rank waiting for `promote`.
    AwaitingPromotion(Color),
    Over(GameResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Selection {
    position: Position,
    piece: Piece,
    destinations: Mask,
}

/// The game state machine. It owns the board and is the only place
/// committed moves are made.
///
/// A turn is `select` then `move_to`. A pawn reaching the last rank
/// suspends the turn until `promote` names the new piece, unless the
/// config promotes automatically. All notifications go to the observer
/// set with [`Game::set_observer`], including every committed square
/// write on the board.
pub struct Game {
    board: Board,
    config: GameConfig,
    observer: Option<SharedObserver>,
    turn: Color,
    first_number: usize,
    history: Vec<Move>,
    selection: Option<Selection>,
    kings: Pair<Position>,
    in_check: Option<Color>,
    result: Option<GameResult>,
    pending: Option<Move>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("board", &self.board.to_string())
            .field("turn", &self.turn)
            .field("moves", &self.history.len())
            .field("in_check", &self.in_check)
            .field("status", &self.status())
            .finish()
    }
}

impl Game {
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    pub fn with_config(config: GameConfig) -> Self {
        Self::with_board(Board::new(), Color::White, config)
    }

    /// Starts from an arbitrary position with `turn` to move. There is no
    /// previous move, so en passant is not available on the first ply.
    pub fn with_board(mut board: Board, turn: Color, config: GameConfig) -> Self {
        board.clear_listener();
        let mut game = Self {
            board,
            config,
            observer: None,
            turn,
            first_number: first_number(turn),
            history: Vec::new(),
            selection: None,
            kings: Pair::default(),
            in_check: None,
            result: None,
            pending: None,
        };
        game.locate_kings();
        game.in_check = game.compute_check();
        game.evaluate_end();
        game
    }

    pub fn set_observer<O: GameObserver + 'static>(&mut self, observer: O) {
        let shared: SharedObserver = Rc::new(RefCell::new(observer));
        self.board.set_listener(SquareForwarder(shared.clone()));
        self.observer = Some(shared);
    }

    pub fn clear_observer(&mut self) {
        self.board.clear_listener();
        self.observer = None;
    }

    /// Selects the piece at `position` if it belongs to the side to move.
    ///
    /// Returns true if the selection changed. Selecting the current
    /// selection again, an empty square or an opposing piece does nothing,
    /// as does any selection while the game is over or a promotion is
    /// pending.
    pub fn select(&mut self, position: Position) -> bool {
        if self.result.is_some() || self.pending.is_some() {
            return false;
        }
        if self.selection.is_some_and(|s| s.position == position) {
            return false;
        }
        let Some(piece) = self.board.get(position) else {
            return false;
        };
        if piece.color() != self.turn {
            return false;
        }
        let destinations = self.generator().destinations(position, Safety::Enforced);
        self.selection = Some(Selection {
            position,
            piece,
            destinations,
        });
        self.notify(|o| o.selection_changed(Some(position)));
        true
    }

    pub fn deselect(&mut self) {
        if self.selection.take().is_some() {
            self.notify(|o| o.selection_changed(None));
        }
    }

    /// Moves the selected piece to `end`.
    ///
    /// Checks run in a fixed order and the first failure is returned.
    /// A rejected move changes nothing, and the selection stays active so
    /// the caller can try another square.
    pub fn move_to(&mut self, end: Position) -> Result<MoveOutcome, MoveError> {
        if self.result.is_some() {
            return reject(MoveError::GameOver);
        }
        if self.pending.is_some() {
            return reject(MoveError::PromotionPending);
        }
        let Some(selection) = self.selection else {
            return reject(MoveError::NoPieceSelected);
        };
        if !end.is_valid() {
            return reject(MoveError::EndPositionInvalid);
        }
        let start = selection.position;
        let end = self.castle_by_rook(selection, end);
        if end == start {
            return reject(MoveError::SameStartEndPosition);
        }
        if self.board.is_occupied(end, Some(selection.piece.color())) {
            return reject(MoveError::MoveOntoOwnPiece);
        }
        let mv = self.build_move(selection.piece, start, end);
        if !mv.is_valid() {
            return reject(MoveError::MoveStructurallyInvalid);
        }
        if !selection.destinations.contains_position(end) {
            return reject(MoveError::MoveIllegal);
        }
        Ok(self.apply(mv))
    }

    /// Settles a pending promotion by turning the pawn into `kind`.
    pub fn promote(&mut self, kind: PieceKind) -> Result<(), PromotionError> {
        let Some(mv) = self.pending else {
            warn!("promote({}) with no promotion pending", kind);
            return Err(PromotionError::NotPending);
        };
        if !kind.is_promotion_target() {
            warn!("cannot promote to {}", kind);
            return Err(PromotionError::InvalidPromotion(kind));
        }
        self.pending = None;
        if let Some(mut piece) = self.board.get(mv.end()) {
            piece.set_kind(kind);
            self.board.place(mv.end(), piece);
        }
        debug!("{} promotes to {} on {}", mv.piece().color(), kind, mv.end());
        self.complete(mv.promoting(kind));
        Ok(())
    }

    /// Back to the starting position with an empty history.
    pub fn reset(&mut self) {
        self.board.reset();
        self.history.clear();
        self.turn = Color::White;
        self.first_number = first_number(Color::White);
        self.pending = None;
        self.result = None;
        self.locate_kings();
        if self.selection.take().is_some() {
            self.notify(|o| o.selection_changed(None));
        }
        if self.in_check.take().is_some() {
            self.notify(|o| o.check_changed(None));
        }
        debug!("game reset");
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }
    #[inline]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }
    #[inline]
    pub fn get(&self, position: Position) -> Option<Piece> {
        self.board.get(position)
    }
    #[inline]
    pub fn is_occupied(&self, position: Position, by: Option<Color>) -> bool {
        self.board.is_occupied(position, by)
    }
    #[inline]
    pub fn turn(&self) -> Color {
        self.turn
    }
    /// The color currently in check, if any.
    #[inline]
    pub fn in_check(&self) -> Option<Color> {
        self.in_check
    }
    #[inline]
    pub fn history(&self) -> &[Move] {
        &self.history
    }
    #[inline]
    pub fn king_position(&self, color: Color) -> Position {
        self.kings[color]
    }
    #[inline]
    pub fn result(&self) -> Option<GameResult> {
        self.result
    }
    #[inline]
    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }
    pub fn pending_promotion(&self) -> Option<Color> {
        self.pending.map(|mv| mv.piece().color())
    }
    pub fn status(&self) -> GameStatus {
        match (self.result, self.pending_promotion()) {
            (Some(result), _) => GameStatus::Over(result),
            (None, Some(color)) => GameStatus::AwaitingPromotion(color),
            (None, None) => GameStatus::Active,
        }
    }

    pub fn selection(&self) -> Option<Position> {
        self.selection.map(|s| s.position)
    }

    /// Legal destinations of the selected piece.
    pub fn movable_positions(&self) -> Mask {
        self.selection.map_or(Mask::empty(), |s| s.destinations)
    }

    /// True if the selected piece may legally move to `end`.
    pub fn is_move_legal(&self, end: Position) -> bool {
        self.movable_positions().contains_position(end)
    }

    /// Legal destinations for the piece at `from`, computed on demand.
    /// Empty unless that piece belongs to the side to move.
    pub fn legal_destinations(&mut self, from: Position) -> Mask {
        if self.result.is_some() || self.pending.is_some() {
            return Mask::empty();
        }
        match self.board.get(from) {
            Some(piece) if piece.color() == self.turn => {
                self.generator().destinations(from, Safety::Enforced)
            }
            _ => Mask::empty(),
        }
    }

    /// Long-form notation of every move played, followed by the result
    /// once the game is over.
    pub fn notation(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.history.iter().map(Move::long_notation).collect();
        if let Some(result) = self.result {
            lines.push(result_token(result.winner()).to_string());
        }
        lines
    }

    fn generator(&mut self) -> MoveGenerator<'_> {
        MoveGenerator::new(&mut self.board, self.kings, self.history.last())
    }

    fn notify<F>(&self, f: F)
    where
        F: FnOnce(&mut dyn GameObserver),
    {
        if let Some(observer) = &self.observer {
            f(&mut *observer.borrow_mut());
        }
    }

    fn locate_kings(&mut self) {
        for color in Color::iter() {
            let king = self.board.find_king(color);
            if !king.is_valid() {
                error!("no {} king on the board", color);
            }
            self.kings[color] = king;
        }
    }

    fn compute_check(&self) -> Option<Color> {
        Color::iter().find(|&color| self.board.is_king_in_check(color, self.kings[color]))
    }

    /// With the unmoved king selected, choosing one of its own unmoved
    /// rooks means castling toward that rook.
    fn castle_by_rook(&self, selection: Selection, end: Position) -> Position {
        let king = selection.piece;
        if !king.kind().is_king() || king.has_moved() {
            return end;
        }
        let Some(rank) = selection.position.rank() else {
            return end;
        };
        let is_rook = self
            .board
            .get(end)
            .is_some_and(|p| p.is(king.color(), PieceKind::Rook) && !p.has_moved());
        if !is_rook {
            return end;
        }
        CastleSide::iter()
            .find(|side| side.rook_src(rank) == end)
            .map_or(end, |side| side.king_dest(rank))
    }

    fn build_move(&mut self, piece: Piece, start: Position, end: Position) -> Move {
        let number = self.first_number + self.history.len();
        let mut mv = Move::new(number, piece, start, end);
        if let Some(captured) = self.board.get(end) {
            mv = mv.capturing(captured.kind());
        } else if piece.kind().is_pawn() && self.generator().en_passant_target(start) == end {
            mv = mv.en_passant().capturing(PieceKind::Pawn);
        }
        if piece.kind().is_king() {
            if let (Some(from), Some(to)) = (start.square(), end.square()) {
                if let Some(side) = CastleSide::from_king_move(from, to) {
                    mv = mv.castling(side);
                }
            }
        }
        mv
    }

    /// Commits a legal move to the board. Completion waits for `promote`
    /// when a pawn reaches the last rank without an automatic choice.
    fn apply(&mut self, mut mv: Move) -> MoveOutcome {
        let color = mv.piece().color();
        let start = mv.start();
        let end = mv.end();

        if mv.is_en_passant() {
            let captured_at = mv.captured_position();
            self.board.remove(captured_at);
            debug!("{} captures en passant, removing the pawn on {}", color, captured_at);
        }
        if let (Some(side), Some(rank)) = (mv.castle(), start.rank()) {
            let rook_src = side.rook_src(rank);
            if let Some(rook) = self.board.get(rook_src) {
                self.board.remove(rook_src);
                self.board.place(side.rook_dest(rank), rook.moved());
            }
            debug!("{} castles {}", color, side.notation());
        }

        let mut piece = mv.piece().moved();
        let promoting = piece.kind().is_pawn() && end.rank() == Some(Rank::promotion_rank(color));
        let automatic = self
            .config
            .auto_promotion
            .filter(|kind| promoting && kind.is_promotion_target());
        if let Some(kind) = automatic {
            piece.set_kind(kind);
            mv = mv.promoting(kind);
            debug!("{} promotes to {} on {}", color, kind, end);
        }
        self.board.place(end, piece);
        self.board.remove(start);
        self.board.settle_except(end);
        if piece.kind().is_king() {
            self.kings[color] = end;
        }
        self.deselect();

        if promoting && automatic.is_none() {
            debug!("{} pawn on {} awaits promotion", color, end);
            self.pending = Some(mv);
            self.notify(|o| o.promotion_required(color));
            return MoveOutcome::PromotionRequired(color);
        }
        self.complete(mv);
        MoveOutcome::Accepted
    }

    /// Records a finished move, hands the turn over and looks for the end
    /// of the game.
    fn complete(&mut self, mv: Move) {
        let previous = self.in_check;
        self.in_check = self.compute_check();
        let mv = mv.checking(self.in_check);
        debug!("{}", mv);
        self.history.push(mv);
        self.turn = !self.turn;
        self.notify(|o| o.move_applied(&mv));
        if self.in_check != previous {
            let in_check = self.in_check;
            if let Some(color) = in_check {
                info!("{} is in check", color);
            }
            self.notify(|o| o.check_changed(in_check));
        }
        self.evaluate_end();
    }

    fn evaluate_end(&mut self) {
        let turn = self.turn;
        if self.generator().has_any_legal_move(turn) {
            return;
        }
        if self.in_check == Some(turn) {
            info!("checkmate, {} wins", !turn);
            self.result = Some(GameResult::Win(!turn, WinReason::CheckMate));
            self.notify(|o| o.checkmate(turn));
        } else if self.config.detect_stalemate {
            info!("stalemate with {} to move", turn);
            self.result = Some(GameResult::Draw(DrawReason::StaleMate));
            self.notify(|o| o.stalemate());
        }
    }
}

/// Plies are numbered from 1 with White on the odd numbers.
fn first_number(turn: Color) -> usize {
    match turn {
        Color::White => 1,
        Color::Black => 2,
    }
}

fn reject(error: MoveError) -> Result<MoveOutcome, MoveError> {
    warn!("move rejected: {}", error);
    Err(error)
}
