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

use crate::PieceKind;

/// End-of-game and promotion rules a game is played under.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct GameConfig {
    /// End the game as a draw when the side to move has no legal move
    /// and is not in check. When false, such a position is left open.
    pub detect_stalemate: bool,
    /// Promote to this kind without asking.
    pub auto_promotion: Option<PieceKind>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            detect_stalemate: true,
            auto_promotion: None,
        }
    }
}

impl GameConfig {
    pub fn with_stalemate_detection(mut self, detect: bool) -> Self {
        self.detect_stalemate = detect;
        self
    }
    pub fn with_auto_promotion(mut self, kind: Option<PieceKind>) -> Self {
        self.auto_promotion = kind;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert!(config.detect_stalemate);
        assert_eq!(config.auto_promotion, None);
    }
    #[test]
    fn test_json_round_trip() {
        let config = GameConfig::default()
            .with_stalemate_detection(false)
            .with_auto_promotion(Some(PieceKind::Queen));
        let text = serde_json::to_string(&config).unwrap();
        let back: GameConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
    #[test]
    fn test_missing_fields_take_defaults() {
        let config: GameConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GameConfig::default());
        let config: GameConfig = serde_json::from_str(r#"{"auto_promotion":"Knight"}"#).unwrap();
        assert!(config.detect_stalemate);
        assert_eq!(config.auto_promotion, Some(PieceKind::Knight));
    }
}
