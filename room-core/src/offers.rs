//! Draw and rematch negotiation.
//!
//! Each room has one slot per offer kind. A slot is idle (`None`) or holds the
//! pending offer message; posting an offer fills it (see
//! [`GameRoomStore::add_message_to_game_room`]) and a response from the other
//! player empties it again. The response rewrites the offer message in place:
//! the id and author stay, the type and content become the accept/decline form.

use room_types::{OfferKind, OfferResponse, RoomError, RoomMessage};
use tracing::info;

use crate::room_events::RoomEvent;
use crate::room_store::GameRoomStore;

/// The accepted or declined form of a pending offer message
pub fn resolve_offer(offer: &RoomMessage, kind: OfferKind, response: OfferResponse) -> RoomMessage {
    RoomMessage {
        message_type: kind.response_type(response),
        content: kind.response_content(response).to_string(),
        ..offer.clone()
    }
}

impl GameRoomStore {
    pub fn respond_to_offer(
        &mut self,
        room_id: &str,
        kind: OfferKind,
        response: OfferResponse,
        responding_player_id: &str,
    ) -> Result<RoomMessage, RoomError> {
        let entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::room_not_found(room_id))?;
        let room = &mut entry.room;

        let offer = room
            .active_offers
            .get(kind)
            .ok_or(RoomError::NoActiveOffer { offer: kind })?;

        if offer.author_id == responding_player_id {
            return Err(RoomError::Unauthorized {
                player_id: responding_player_id.to_string(),
            });
        }
        if !room.has_player(responding_player_id) {
            return Err(RoomError::PlayerNotInRoom {
                room_id: room_id.to_string(),
                player_id: responding_player_id.to_string(),
            });
        }

        let resolved = resolve_offer(offer, kind, response);

        // The offer may already have been trimmed out of the retained history
        if let Some(stored) = room.messages.iter_mut().find(|m| m.id == resolved.id) {
            *stored = resolved.clone();
        }
        *room.active_offers.slot_mut(kind) = None;
        entry.touch();

        info!(
            "{} answered {} in room {}: {}",
            responding_player_id,
            kind,
            room_id,
            resolved.message_type
        );
        self.event_bus.publish(RoomEvent::OfferResolved {
            room_id: room_id.to_string(),
            message: resolved.clone(),
        });

        Ok(resolved)
    }

    pub fn accept_draw(
        &mut self,
        room_id: &str,
        responding_player_id: &str,
    ) -> Result<RoomMessage, RoomError> {
        self.respond_to_offer(room_id, OfferKind::Draw, OfferResponse::Accept, responding_player_id)
    }

    pub fn decline_draw(
        &mut self,
        room_id: &str,
        responding_player_id: &str,
    ) -> Result<RoomMessage, RoomError> {
        self.respond_to_offer(room_id, OfferKind::Draw, OfferResponse::Decline, responding_player_id)
    }

    pub fn accept_rematch(
        &mut self,
        room_id: &str,
        responding_player_id: &str,
    ) -> Result<RoomMessage, RoomError> {
        self.respond_to_offer(
            room_id,
            OfferKind::Rematch,
            OfferResponse::Accept,
            responding_player_id,
        )
    }

    pub fn decline_rematch(
        &mut self,
        room_id: &str,
        responding_player_id: &str,
    ) -> Result<RoomMessage, RoomError> {
        self.respond_to_offer(
            room_id,
            OfferKind::Rematch,
            OfferResponse::Decline,
            responding_player_id,
        )
    }
}
