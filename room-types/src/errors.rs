use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use ts_rs::TS;

use crate::{Color, MessageType, OfferKind, PlayerId, RoomId};

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoomError {
    #[error("Game room not found")]
    RoomNotFound { room_id: RoomId },
    #[error("Player not found")]
    PlayerNotFound { player_id: PlayerId },
    #[error("Player not found in game room")]
    PlayerNotInRoom { room_id: RoomId, player_id: PlayerId },
    #[error("Game room is full")]
    GameRoomIsFull { room_id: RoomId },
    #[error("There is already an active {offer_type}")]
    DuplicateOffer { offer_type: MessageType },
    #[error("{message_type} messages can only be created by responding to an offer")]
    InvalidOperation { message_type: MessageType },
    #[error("No active offer to respond to")]
    NoActiveOffer { offer: OfferKind },
    #[error("Player cannot respond to their own offer")]
    Unauthorized { player_id: PlayerId },
    #[error("Content is required for {message_type} messages")]
    MissingContent { message_type: MessageType },
    #[error("Expected winner to have a valid player ID")]
    InvalidWinner { winner: Option<Color> },
    #[error("Failed to generate a unique ID after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },
}

impl RoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoomError::RoomNotFound { .. }
            | RoomError::PlayerNotFound { .. }
            | RoomError::PlayerNotInRoom { .. } => ErrorKind::NotFound,
            RoomError::GameRoomIsFull { .. } => ErrorKind::Capacity,
            RoomError::DuplicateOffer { .. } => ErrorKind::Conflict,
            RoomError::InvalidOperation { .. } | RoomError::NoActiveOffer { .. } => {
                ErrorKind::InvalidOperation
            }
            RoomError::Unauthorized { .. } => ErrorKind::Unauthorized,
            RoomError::MissingContent { .. } | RoomError::InvalidWinner { .. } => {
                ErrorKind::Validation
            }
            RoomError::ExhaustedRetries { .. } => ErrorKind::ResourceExhaustion,
        }
    }

    pub fn room_not_found(room_id: &str) -> Self {
        RoomError::RoomNotFound {
            room_id: room_id.to_string(),
        }
    }

    pub fn player_not_found(player_id: &str) -> Self {
        RoomError::PlayerNotFound {
            player_id: player_id.to_string(),
        }
    }
}

/// Coarse classification used by transports to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum ErrorKind {
    NotFound,
    Capacity,
    Conflict,
    InvalidOperation,
    Unauthorized,
    Validation,
    ResourceExhaustion,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::Capacity => "capacity",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidOperation => "invalid-operation",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Validation => "validation",
            ErrorKind::ResourceExhaustion => "resource-exhaustion",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RoomError::DuplicateOffer {
            offer_type: MessageType::DrawOffer,
        };
        assert_eq!(err.to_string(), "There is already an active draw-offer");
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = RoomError::Unauthorized {
            player_id: "p1".to_string(),
        };
        assert_eq!(err.to_string(), "Player cannot respond to their own offer");

        let err = RoomError::player_not_found("ghost");
        assert_eq!(err.to_string(), "Player not found");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_exhaustion_is_its_own_kind() {
        let err = RoomError::ExhaustedRetries { attempts: 10 };
        assert_eq!(err.kind(), ErrorKind::ResourceExhaustion);
        assert!(err.to_string().contains("10 attempts"));
    }
}
