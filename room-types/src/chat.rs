use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::{MessageId, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum MessageType {
    Standard,
    DrawOffer,
    DrawAccept,
    DrawDecline,
    RematchOffer,
    RematchAccept,
    RematchDecline,
    PlayerLeftRoom,
    PlayerRejoinedRoom,
}

impl MessageType {
    /// Wire name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Standard => "standard",
            MessageType::DrawOffer => "draw-offer",
            MessageType::DrawAccept => "draw-accept",
            MessageType::DrawDecline => "draw-decline",
            MessageType::RematchOffer => "rematch-offer",
            MessageType::RematchAccept => "rematch-accept",
            MessageType::RematchDecline => "rematch-decline",
            MessageType::PlayerLeftRoom => "player-left-room",
            MessageType::PlayerRejoinedRoom => "player-rejoined-room",
        }
    }

    /// The offer slot this message type opens, if it is an offer
    pub fn offer_kind(&self) -> Option<OfferKind> {
        match self {
            MessageType::DrawOffer => Some(OfferKind::Draw),
            MessageType::RematchOffer => Some(OfferKind::Rematch),
            _ => None,
        }
    }

    /// Accept/decline types can only be produced by responding to an offer
    pub fn is_offer_response(&self) -> bool {
        matches!(
            self,
            MessageType::DrawAccept
                | MessageType::DrawDecline
                | MessageType::RematchAccept
                | MessageType::RematchDecline
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomMessage {
    pub id: MessageId,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub author_id: PlayerId,
    pub content: String,
    pub created_at: String, // ISO 8601 string
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum OfferKind {
    Draw,
    Rematch,
}

impl OfferKind {
    pub fn offer_type(&self) -> MessageType {
        match self {
            OfferKind::Draw => MessageType::DrawOffer,
            OfferKind::Rematch => MessageType::RematchOffer,
        }
    }

    pub fn response_type(&self, response: OfferResponse) -> MessageType {
        match (self, response) {
            (OfferKind::Draw, OfferResponse::Accept) => MessageType::DrawAccept,
            (OfferKind::Draw, OfferResponse::Decline) => MessageType::DrawDecline,
            (OfferKind::Rematch, OfferResponse::Accept) => MessageType::RematchAccept,
            (OfferKind::Rematch, OfferResponse::Decline) => MessageType::RematchDecline,
        }
    }

    pub fn response_content(&self, response: OfferResponse) -> &'static str {
        match (self, response) {
            (OfferKind::Draw, OfferResponse::Accept) => "Draw accepted.",
            (OfferKind::Draw, OfferResponse::Decline) => "Draw declined.",
            (OfferKind::Rematch, OfferResponse::Accept) => "Rematch accepted.",
            (OfferKind::Rematch, OfferResponse::Decline) => "Rematch declined.",
        }
    }
}

impl fmt::Display for OfferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.offer_type().as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum OfferResponse {
    Accept,
    Decline,
}

impl From<bool> for OfferResponse {
    fn from(accept: bool) -> Self {
        if accept {
            OfferResponse::Accept
        } else {
            OfferResponse::Decline
        }
    }
}

/// Pending offer per slot. Both slots are always present; `None` means idle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActiveOffers {
    #[serde(rename = "draw-offer")]
    pub draw: Option<RoomMessage>,
    #[serde(rename = "rematch-offer")]
    pub rematch: Option<RoomMessage>,
}

impl ActiveOffers {
    pub fn get(&self, kind: OfferKind) -> Option<&RoomMessage> {
        match kind {
            OfferKind::Draw => self.draw.as_ref(),
            OfferKind::Rematch => self.rematch.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, kind: OfferKind) -> &mut Option<RoomMessage> {
        match kind {
            OfferKind::Draw => &mut self.draw,
            OfferKind::Rematch => &mut self.rematch,
        }
    }

    pub fn is_pending(&self, kind: OfferKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn clear(&mut self) {
        self.draw = None;
        self.rematch = None;
    }
}
