use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{ErrorKind, GameOutcome, GameRoom, OfferKind, PlayerId, RoomId, RoomMessage, ScoreMap};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    JoinRoom { room_id: RoomId, player_id: PlayerId },
    SendMessage { content: String },
    OfferDraw,
    OfferRematch,
    RespondToOffer { offer: OfferKind, accept: bool },
    ReportResult { outcome: GameOutcome },
    LeaveRoom,
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    RoomState { room: GameRoom },
    MessagePosted { message: RoomMessage },
    OfferResolved { message: RoomMessage },
    ScoresUpdated { scores: ScoreMap },
    NewGameStarted { room: GameRoom },
    Error { message: String, kind: Option<ErrorKind> },
}

impl ServerMessage {
    pub fn error(err: &crate::RoomError) -> Self {
        ServerMessage::Error {
            message: err.to_string(),
            kind: Some(err.kind()),
        }
    }
}
