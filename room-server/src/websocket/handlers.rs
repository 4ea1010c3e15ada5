use std::sync::Arc;
use tracing::{error, info, warn};

use crate::coordinator::RoomCoordinator;
use crate::websocket::connection::{ConnectionId, ConnectionManager, RoomSubscription};
use room_types::{ClientMessage, MessageType, OfferResponse, RoomError, ServerMessage};

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    coordinator: Arc<RoomCoordinator>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        coordinator: Arc<RoomCoordinator>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            coordinator,
        }
    }

    /// Dispatch one client message. Domain failures are reported back to the
    /// client as `Error`; only a dead connection is returned as `Err`.
    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), String> {
        // Update connection activity
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        let result = match message {
            ClientMessage::JoinRoom { room_id, player_id } => {
                self.handle_join_room(room_id, player_id).await
            }
            ClientMessage::SendMessage { content } => {
                self.handle_post(MessageType::Standard, Some(content)).await
            }
            ClientMessage::OfferDraw => self.handle_post(MessageType::DrawOffer, None).await,
            ClientMessage::OfferRematch => self.handle_post(MessageType::RematchOffer, None).await,
            ClientMessage::RespondToOffer { offer, accept } => {
                match self.subscription().await {
                    Some(sub) => self
                        .coordinator
                        .respond_to_offer(
                            &sub.room_id,
                            offer,
                            OfferResponse::from(accept),
                            &sub.player_id,
                        )
                        .await
                        .map(|_| ()),
                    None => return self.send_not_in_room().await,
                }
            }
            ClientMessage::ReportResult { outcome } => match self.subscription().await {
                Some(sub) => self
                    .coordinator
                    .report_result(&sub.room_id, &outcome)
                    .await
                    .map(|_| ()),
                None => return self.send_not_in_room().await,
            },
            ClientMessage::LeaveRoom => match self.subscription().await {
                Some(sub) => self.leave(sub).await,
                None => return self.send_not_in_room().await,
            },
            // Heartbeat just updates activity (already done above)
            ClientMessage::Heartbeat => Ok(()),
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Request from {} failed: {}", self.connection_id, e);
                self.send_message(ServerMessage::error(&e)).await
            }
        }
    }

    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);

        if let Some(sub) = self.subscription().await {
            if let Err(e) = self.leave(sub).await {
                error!(
                    "Failed to run leave flow for {}: {}",
                    self.connection_id, e
                );
            }
        }
    }

    async fn handle_join_room(&self, room_id: String, player_id: String) -> Result<(), RoomError> {
        info!(
            "Connection {} joining room {} as {}",
            self.connection_id, room_id, player_id
        );

        if let Some(previous) = self.subscription().await {
            if previous.room_id != room_id || previous.player_id != player_id {
                self.leave(previous).await?;
            }
        }

        // Subscribe first so this connection sees the join broadcast
        let subscription = RoomSubscription {
            room_id: room_id.clone(),
            player_id: player_id.clone(),
        };
        self.connection_manager
            .set_subscription(self.connection_id, Some(subscription))
            .await;

        if let Err(e) = self.coordinator.connect_player(&room_id, &player_id).await {
            self.connection_manager
                .set_subscription(self.connection_id, None)
                .await;
            return Err(e);
        }
        Ok(())
    }

    async fn handle_post(
        &self,
        message_type: MessageType,
        content: Option<String>,
    ) -> Result<(), RoomError> {
        let Some(sub) = self.subscription().await else {
            let _ = self.send_not_in_room().await;
            return Ok(());
        };

        self.coordinator
            .post_message(&sub.room_id, &sub.player_id, message_type, content)
            .await
            .map(|_| ())
    }

    async fn leave(&self, sub: RoomSubscription) -> Result<(), RoomError> {
        self.connection_manager
            .set_subscription(self.connection_id, None)
            .await;
        self.coordinator
            .leave_room(&sub.room_id, &sub.player_id)
            .await
            .map(|_| ())
    }

    async fn subscription(&self) -> Option<RoomSubscription> {
        self.connection_manager
            .get_subscription(self.connection_id)
            .await
    }

    /// Tell the client its last frame could not be understood
    pub async fn report_invalid(&self, message: ServerMessage) -> Result<(), String> {
        self.send_message(message).await
    }

    async fn send_not_in_room(&self) -> Result<(), String> {
        self.send_message(ServerMessage::Error {
            message: "Join a room first".to_string(),
            kind: None,
        })
        .await
    }

    async fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.connection_manager
            .send_to_connection(self.connection_id, message)
            .await
    }
}
