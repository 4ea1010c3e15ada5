use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use ts_rs::TS;

use crate::{ActiveOffers, Player, PlayerId, RoomId, RoomMessage};

pub type ScoreMap = HashMap<PlayerId, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

/// Seat map. Serializes as `{ "white": id | null, "black": id | null }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SeatAssignments {
    pub white: Option<PlayerId>,
    pub black: Option<PlayerId>,
}

impl SeatAssignments {
    pub fn with_seat(color: Color, player_id: PlayerId) -> Self {
        let mut seats = Self::default();
        seats.set(color, Some(player_id));
        seats
    }

    pub fn get(&self, color: Color) -> Option<&PlayerId> {
        match color {
            Color::White => self.white.as_ref(),
            Color::Black => self.black.as_ref(),
        }
    }

    pub fn set(&mut self, color: Color, player_id: Option<PlayerId>) {
        match color {
            Color::White => self.white = player_id,
            Color::Black => self.black = player_id,
        }
    }

    /// First unoccupied seat, white preferred
    pub fn empty_seat(&self) -> Option<Color> {
        if self.white.is_none() {
            Some(Color::White)
        } else if self.black.is_none() {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.white, &mut self.black);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum RoomType {
    PlayerVsPlayer, // Two humans, one per seat
    SelfPlay,       // One human moving for both sides
    PlayerVsComputer,
}

impl RoomType {
    /// How many humans may be seated in a room of this type
    pub fn max_players(&self) -> usize {
        match self {
            RoomType::PlayerVsPlayer => 2,
            RoomType::SelfPlay | RoomType::PlayerVsComputer => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TimeControl {
    pub initial_seconds: u32,
    pub increment_seconds: u32,
}

/// Status reported by the chess rules engine for the current game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum GameStatus {
    InProgress,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
    #[serde(rename = "50-move-draw")]
    FiftyMoveDraw,
    /// Any status this server does not score, such as a resignation
    #[serde(other)]
    Other,
}

impl GameStatus {
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            GameStatus::Stalemate
                | GameStatus::InsufficientMaterial
                | GameStatus::ThreefoldRepetition
                | GameStatus::FiftyMoveDraw
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameOutcome {
    pub status: GameStatus,
    pub winner: Option<Color>,
}

impl GameOutcome {
    pub fn checkmate(winner: Color) -> Self {
        Self {
            status: GameStatus::Checkmate,
            winner: Some(winner),
        }
    }

    pub fn with_status(status: GameStatus) -> Self {
        Self {
            status,
            winner: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameRoom {
    pub id: RoomId,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub time_control: Option<TimeControl>,
    pub players: Vec<Player>,
    pub player_id_to_display_name: HashMap<PlayerId, String>,
    pub player_id_to_score: ScoreMap,
    pub color_to_player_id: SeatAssignments,
    pub messages: Vec<RoomMessage>,
    pub active_offers: ActiveOffers,
    pub game_count: u32,
    pub created_at: String, // ISO 8601 string
}

impl GameRoom {
    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn display_name(&self, player_id: &str) -> Option<&str> {
        self.player_id_to_display_name
            .get(player_id)
            .map(String::as_str)
    }

    pub fn score(&self, player_id: &str) -> Option<f64> {
        self.player_id_to_score.get(player_id).copied()
    }
}
