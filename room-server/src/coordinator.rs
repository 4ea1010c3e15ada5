use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::websocket::connection::ConnectionManager;
use room_core::{
    GameRoomStore, IdGenerator, PlayerRegistry, RandomIdGenerator, RoomCleanup, RoomEvent,
    RoomEventHandler, RoomStoreConfig,
};
use room_types::{
    Color, GameOutcome, GameRoom, MessageType, OfferKind, OfferResponse, Player, RoomError,
    RoomId, RoomMessage, RoomType, ScoreMap, SeatAssignments, ServerMessage, TimeControl,
};

/// Result of answering an offer. An accepted rematch also carries the
/// room as it stands after the new game started.
#[derive(Debug, Clone, Serialize)]
pub struct OfferResolution {
    pub message: RoomMessage,
    pub new_game: Option<GameRoom>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinOutcome {
    pub room: GameRoom,
    pub joined: bool,
}

struct EventLog;

impl RoomEventHandler for EventLog {
    fn handle_event(&mut self, event: &RoomEvent) {
        debug!("Room event in {}: {:?}", event.room_id(), event);
    }
}

/// Serialises access to the room store and player registry and fans updates
/// out to the room's live connections.
///
/// Operations that need both locks always take the store first.
pub struct RoomCoordinator {
    store: RwLock<GameRoomStore>,
    registry: RwLock<PlayerRegistry>,
    cleanup: RoomCleanup,
    connection_manager: Arc<ConnectionManager>,
}

impl RoomCoordinator {
    pub fn new(
        connection_manager: Arc<ConnectionManager>,
        store_config: RoomStoreConfig,
        cleanup: RoomCleanup,
    ) -> Self {
        let id_generator: Arc<dyn IdGenerator> = Arc::new(RandomIdGenerator);
        Self::with_id_generator(connection_manager, store_config, cleanup, id_generator)
    }

    pub fn with_id_generator(
        connection_manager: Arc<ConnectionManager>,
        store_config: RoomStoreConfig,
        cleanup: RoomCleanup,
        id_generator: Arc<dyn IdGenerator>,
    ) -> Self {
        let mut store = GameRoomStore::with_generator(id_generator.clone(), store_config);
        store.add_event_handler(Box::new(EventLog));

        Self {
            store: RwLock::new(store),
            registry: RwLock::new(PlayerRegistry::with_generator(id_generator, store_config.ids)),
            cleanup,
            connection_manager,
        }
    }

    pub fn from_config(connection_manager: Arc<ConnectionManager>, config: &Config) -> Self {
        Self::new(
            connection_manager,
            config.room_store_config(),
            config.room_cleanup(),
        )
    }

    pub async fn create_player(&self, display_name: &str) -> Result<Player, RoomError> {
        let player = self.registry.write().await.create_player(display_name)?;
        info!("Registered player {} ({})", player.id, player.display_name);
        Ok(player)
    }

    pub async fn get_player(&self, player_id: &str) -> Option<Player> {
        self.registry.read().await.get_player_by_id(player_id)
    }

    pub async fn delete_player(&self, player_id: &str) -> bool {
        let deleted = self.registry.write().await.delete_player(player_id);
        if deleted {
            info!("Deleted player {}", player_id);
        }
        deleted
    }

    pub async fn create_room(
        &self,
        creator_id: &str,
        room_type: RoomType,
        time_control: Option<TimeControl>,
        creator_color: Option<Color>,
    ) -> Result<GameRoom, RoomError> {
        let mut store = self.store.write().await;
        let creator = self
            .registry
            .read()
            .await
            .get_player_by_id(creator_id)
            .ok_or_else(|| RoomError::player_not_found(creator_id))?;

        store.create_game_room(time_control, room_type, creator, creator_color)
    }

    pub async fn get_room(&self, room_id: &str) -> Option<GameRoom> {
        self.store.read().await.get_game_room_by_id(room_id)
    }

    pub async fn room_count(&self) -> usize {
        self.store.read().await.len()
    }

    /// Seat a registered player. Joining a room twice is a no-op.
    pub async fn join_room(&self, room_id: &str, player_id: &str) -> Result<JoinOutcome, RoomError> {
        let outcome = {
            let mut store = self.store.write().await;
            let player = self
                .registry
                .read()
                .await
                .get_player_by_id(player_id)
                .ok_or_else(|| RoomError::player_not_found(player_id))?;

            let joined = store.join_game_room(room_id, player)?;
            let room = store
                .get_game_room_by_id(room_id)
                .ok_or_else(|| RoomError::room_not_found(room_id))?;
            JoinOutcome { room, joined }
        };

        if outcome.joined {
            self.broadcast_room_state(&outcome.room).await;
        }
        Ok(outcome)
    }

    /// Bring a player's live connection into a room. New players are seated,
    /// players who had left are announced as back, and all come online.
    pub async fn connect_player(&self, room_id: &str, player_id: &str) -> Result<GameRoom, RoomError> {
        let (room, rejoin_message) = {
            let mut store = self.store.write().await;
            let mut registry = self.registry.write().await;
            let player = registry
                .get_player_by_id(player_id)
                .ok_or_else(|| RoomError::player_not_found(player_id))?;

            let joined = store.join_game_room(room_id, player)?;
            registry.update_status(player_id, true)?;

            let returning = !joined
                && store
                    .get_game_room_by_id(room_id)
                    .is_some_and(|room| has_left(&room, player_id));
            let rejoin_message = if returning {
                Some(store.add_message_to_game_room(
                    room_id,
                    MessageType::PlayerRejoinedRoom,
                    player_id,
                    None,
                )?)
            } else {
                None
            };
            let room = store
                .get_game_room_by_id(room_id)
                .ok_or_else(|| RoomError::room_not_found(room_id))?;
            (room, rejoin_message)
        };

        info!("Player {} connected to room {}", player_id, room_id);
        if let Some(message) = rejoin_message {
            self.broadcast(room_id, ServerMessage::MessagePosted { message })
                .await;
        }
        self.broadcast_room_state(&room).await;
        Ok(room)
    }

    pub async fn post_message(
        &self,
        room_id: &str,
        author_id: &str,
        message_type: MessageType,
        content: Option<String>,
    ) -> Result<RoomMessage, RoomError> {
        let message = self.store.write().await.add_message_to_game_room(
            room_id,
            message_type,
            author_id,
            content,
        )?;

        self.broadcast(
            room_id,
            ServerMessage::MessagePosted {
                message: message.clone(),
            },
        )
        .await;
        Ok(message)
    }

    /// Answer a pending offer. Accepting a rematch starts the next game with
    /// colors swapped.
    pub async fn respond_to_offer(
        &self,
        room_id: &str,
        kind: OfferKind,
        response: OfferResponse,
        player_id: &str,
    ) -> Result<OfferResolution, RoomError> {
        let resolution = {
            let mut store = self.store.write().await;
            let message = store.respond_to_offer(room_id, kind, response, player_id)?;

            let new_game = if kind == OfferKind::Rematch && response == OfferResponse::Accept {
                store.start_new_game_in_room(room_id)?;
                store.swap_player_colors(room_id)?;
                store.get_game_room_by_id(room_id)
            } else {
                None
            };
            OfferResolution { message, new_game }
        };

        self.broadcast(
            room_id,
            ServerMessage::OfferResolved {
                message: resolution.message.clone(),
            },
        )
        .await;
        if let Some(room) = &resolution.new_game {
            info!("Rematch accepted in room {}, game {}", room_id, room.game_count);
            self.broadcast(room_id, ServerMessage::NewGameStarted { room: room.clone() })
                .await;
        }
        Ok(resolution)
    }

    pub async fn report_result(
        &self,
        room_id: &str,
        outcome: &GameOutcome,
    ) -> Result<ScoreMap, RoomError> {
        let scores = self
            .store
            .write()
            .await
            .update_player_scores(room_id, outcome)?;

        self.broadcast(
            room_id,
            ServerMessage::ScoresUpdated {
                scores: scores.clone(),
            },
        )
        .await;
        Ok(scores)
    }

    pub async fn start_new_game(&self, room_id: &str) -> Result<GameRoom, RoomError> {
        let room = {
            let mut store = self.store.write().await;
            store.start_new_game_in_room(room_id)?;
            store
                .get_game_room_by_id(room_id)
                .ok_or_else(|| RoomError::room_not_found(room_id))?
        };

        self.broadcast(room_id, ServerMessage::NewGameStarted { room: room.clone() })
            .await;
        Ok(room)
    }

    pub async fn swap_colors(&self, room_id: &str) -> Result<SeatAssignments, RoomError> {
        let room = {
            let mut store = self.store.write().await;
            store.swap_player_colors(room_id)?;
            store
                .get_game_room_by_id(room_id)
                .ok_or_else(|| RoomError::room_not_found(room_id))?
        };

        self.broadcast_room_state(&room).await;
        Ok(room.color_to_player_id)
    }

    pub async fn delete_room(&self, room_id: &str) -> bool {
        let deleted = self.store.write().await.delete_game_room(room_id);
        if deleted {
            self.close_room(room_id).await;
        }
        deleted
    }

    /// Mark the player offline and announce it. Their seat, name and score stay.
    pub async fn leave_room(&self, room_id: &str, player_id: &str) -> Result<RoomMessage, RoomError> {
        let message = {
            let mut store = self.store.write().await;
            let message = store.add_message_to_game_room(
                room_id,
                MessageType::PlayerLeftRoom,
                player_id,
                None,
            )?;
            if let Err(e) = self.registry.write().await.update_status(player_id, false) {
                warn!("Player {} left room {} without a registry entry: {}", player_id, room_id, e);
            }
            message
        };

        info!("Player {} left room {}", player_id, room_id);
        self.broadcast(
            room_id,
            ServerMessage::MessagePosted {
                message: message.clone(),
            },
        )
        .await;
        Ok(message)
    }

    /// Mark a seated player online again and announce it
    pub async fn rejoin_room(&self, room_id: &str, player_id: &str) -> Result<RoomMessage, RoomError> {
        let message = {
            let mut store = self.store.write().await;
            let room = store
                .get_game_room_by_id(room_id)
                .ok_or_else(|| RoomError::room_not_found(room_id))?;
            if !room.has_player(player_id) {
                return Err(RoomError::PlayerNotInRoom {
                    room_id: room_id.to_string(),
                    player_id: player_id.to_string(),
                });
            }

            self.registry.write().await.update_status(player_id, true)?;
            store.add_message_to_game_room(
                room_id,
                MessageType::PlayerRejoinedRoom,
                player_id,
                None,
            )?
        };

        info!("Player {} rejoined room {}", player_id, room_id);
        self.broadcast(
            room_id,
            ServerMessage::MessagePosted {
                message: message.clone(),
            },
        )
        .await;
        Ok(message)
    }

    /// Sweep abandoned rooms and detach any connections still watching them
    pub async fn run_cleanup(&self) -> Vec<RoomId> {
        let removed = {
            let mut store = self.store.write().await;
            let registry = self.registry.read().await;
            self.cleanup.cleanup_abandoned_rooms(&mut store, &registry)
        };

        for room_id in &removed {
            self.close_room(room_id).await;
        }
        if !removed.is_empty() {
            info!("Cleanup removed {} room(s)", removed.len());
        }
        removed
    }

    async fn close_room(&self, room_id: &str) {
        self.broadcast(room_id, ServerMessage::error(&RoomError::room_not_found(room_id)))
            .await;
        let detached = self.connection_manager.clear_room(room_id).await;
        debug!("Detached {} connection(s) from room {}", detached, room_id);
    }

    async fn broadcast_room_state(&self, room: &GameRoom) {
        self.broadcast(&room.id, ServerMessage::RoomState { room: room.clone() })
            .await;
    }

    async fn broadcast(&self, room_id: &str, message: ServerMessage) {
        self.connection_manager.send_to_room(room_id, message).await;
    }
}

/// Whether the player's latest presence message in the retained history is a departure
fn has_left(room: &GameRoom, player_id: &str) -> bool {
    room.messages
        .iter()
        .rev()
        .find(|m| {
            m.author_id == player_id
                && matches!(
                    m.message_type,
                    MessageType::PlayerLeftRoom | MessageType::PlayerRejoinedRoom
                )
        })
        .is_some_and(|m| m.message_type == MessageType::PlayerLeftRoom)
}
