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

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::{Color, Move, Piece, Position, SquareListener};

/// Outbound notifications from a [`Game`](crate::Game).
///
/// Every method is called synchronously from inside the game call that
/// caused it. Legality probes never reach an observer.
pub trait GameObserver {
    /// A board square was overwritten by a committed move or a reset.
    fn square_changed(&mut self, _position: Position, _piece: Option<Piece>) {}
    fn selection_changed(&mut self, _selection: Option<Position>) {}
    fn move_applied(&mut self, _mv: &Move) {}
    /// The color now in check, if any, after it differs from before.
    fn check_changed(&mut self, _in_check: Option<Color>) {}
    /// `loser` is in check with no legal move.
    fn checkmate(&mut self, _loser: Color) {}
    fn stalemate(&mut self) {}
    /// A pawn of `color` reached the last rank and awaits `promote`.
    fn promotion_required(&mut self, _color: Color) {}
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEvent {
    SquareChanged(Position, Option<Piece>),
    SelectionChanged(Option<Position>),
    MoveApplied(Move),
    CheckChanged(Option<Color>),
    Checkmate(Color),
    Stalemate,
    PromotionRequired(Color),
}

/// An observer that records every notification. Clones share the log,
/// so one clone can be handed to the game and another kept for reading.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<GameEvent>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn events(&self) -> Vec<GameEvent> {
        self.0.borrow().clone()
    }
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
    fn push(&self, event: GameEvent) {
        self.0.borrow_mut().push(event);
    }
}

impl GameObserver for EventLog {
    fn square_changed(&mut self, position: Position, piece: Option<Piece>) {
        self.push(GameEvent::SquareChanged(position, piece));
    }
    fn selection_changed(&mut self, selection: Option<Position>) {
        self.push(GameEvent::SelectionChanged(selection));
    }
    fn move_applied(&mut self, mv: &Move) {
        self.push(GameEvent::MoveApplied(*mv));
    }
    fn check_changed(&mut self, in_check: Option<Color>) {
        self.push(GameEvent::CheckChanged(in_check));
    }
    fn checkmate(&mut self, loser: Color) {
        self.push(GameEvent::Checkmate(loser));
    }
    fn stalemate(&mut self) {
        self.push(GameEvent::Stalemate);
    }
    fn promotion_required(&mut self, color: Color) {
        self.push(GameEvent::PromotionRequired(color));
    }
}

pub(crate) type SharedObserver = Rc<RefCell<dyn GameObserver>>;

/// Forwards the board's square writes to the game's observer.
pub(crate) struct SquareForwarder(pub(crate) SharedObserver);

impl SquareListener for SquareForwarder {
    fn on_set(&mut self, position: Position, piece: Option<Piece>) {
        self.0.borrow_mut().square_changed(position, piece);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Square::*;

    #[test]
    fn test_event_log_clones_share_events() {
        let log = EventLog::new();
        let mut handle = log.clone();
        handle.checkmate(Color::White);
        handle.stalemate();
        assert_eq!(log.len(), 2);
        assert_eq!(
            log.events(),
            vec![GameEvent::Checkmate(Color::White), GameEvent::Stalemate]
        );
        log.clear();
        assert!(handle.is_empty());
    }
    #[test]
    fn test_forwarder_reports_square_changes() {
        let log = EventLog::new();
        let shared: SharedObserver = Rc::new(RefCell::new(log.clone()));
        let mut forwarder = SquareForwarder(shared);
        forwarder.on_set(E4.into(), Some(Piece::WP));
        assert_eq!(
            log.events(),
            vec![GameEvent::SquareChanged(E4.into(), Some(Piece::WP))]
        );
    }
}
