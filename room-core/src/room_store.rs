use rand::Rng;
use room_types::{
    ActiveOffers, Color, GameRoom, MessageType, Player, RoomError, RoomId, RoomMessage, RoomType,
    SeatAssignments, TimeControl,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

use crate::ids::{IdGenerator, IdPolicy, RandomIdGenerator, generate_unique_id};
use crate::room_events::{RoomEvent, RoomEventBus, RoomEventHandler};

pub const DEFAULT_MESSAGE_RETENTION: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomStoreConfig {
    pub message_retention: usize,
    pub ids: IdPolicy,
}

impl Default for RoomStoreConfig {
    fn default() -> Self {
        Self {
            message_retention: DEFAULT_MESSAGE_RETENTION,
            ids: IdPolicy::default(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct RoomEntry {
    pub(crate) room: GameRoom,
    pub(crate) last_activity: SystemTime,
}

impl RoomEntry {
    fn new(room: GameRoom) -> Self {
        Self {
            room,
            last_activity: SystemTime::now(),
        }
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity = SystemTime::now();
    }

    pub(crate) fn idle_for(&self) -> Duration {
        self.last_activity.elapsed().unwrap_or(Duration::ZERO)
    }
}

/// Authoritative in-memory map of rooms. The store is the only writer of room
/// state; every read hands out an owned copy.
pub struct GameRoomStore {
    pub(crate) rooms: HashMap<RoomId, RoomEntry>,
    pub(crate) event_bus: RoomEventBus,
    id_generator: Arc<dyn IdGenerator>,
    config: RoomStoreConfig,
}

impl GameRoomStore {
    pub fn new() -> Self {
        Self::with_config(RoomStoreConfig::default())
    }

    pub fn with_config(config: RoomStoreConfig) -> Self {
        Self::with_generator(Arc::new(RandomIdGenerator), config)
    }

    pub fn with_generator(id_generator: Arc<dyn IdGenerator>, config: RoomStoreConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            event_bus: RoomEventBus::new(),
            id_generator,
            config,
        }
    }

    pub fn add_event_handler(&mut self, handler: Box<dyn RoomEventHandler>) {
        self.event_bus.add_handler(handler);
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Create a room seated with its creator. The creator's color is the one
    /// requested, or a fair coin flip when none is given.
    pub fn create_game_room(
        &mut self,
        time_control: Option<TimeControl>,
        room_type: RoomType,
        creator: Player,
        creator_color: Option<Color>,
    ) -> Result<GameRoom, RoomError> {
        let id = generate_unique_id(self.id_generator.as_ref(), self.config.ids, |candidate| {
            self.rooms.contains_key(candidate)
        })?;
        let color = creator_color.unwrap_or_else(random_color);
        let creator_id = creator.id.clone();

        let room = GameRoom {
            id: id.clone(),
            room_type,
            time_control,
            player_id_to_display_name: HashMap::from([(
                creator_id.clone(),
                creator.display_name.clone(),
            )]),
            player_id_to_score: HashMap::from([(creator_id.clone(), 0.0)]),
            color_to_player_id: SeatAssignments::with_seat(color, creator_id.clone()),
            players: vec![creator],
            messages: Vec::new(),
            active_offers: ActiveOffers::default(),
            game_count: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        self.rooms.insert(id.clone(), RoomEntry::new(room.clone()));
        info!(
            "Created {:?} room {} with creator {} as {}",
            room_type, id, creator_id, color
        );

        self.event_bus.publish(RoomEvent::RoomCreated {
            room_id: id,
            creator_id,
            creator_color: color,
        });

        Ok(room)
    }

    pub fn get_game_room_by_id(&self, room_id: &str) -> Option<GameRoom> {
        self.rooms.get(room_id).map(|entry| entry.room.clone())
    }

    /// Seat a player in the room. Returns `false` when the player was already
    /// a member, in which case nothing changes.
    pub fn join_game_room(&mut self, room_id: &str, player: Player) -> Result<bool, RoomError> {
        let entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::room_not_found(room_id))?;
        let room = &mut entry.room;

        if room.has_player(&player.id) {
            debug!("Player {} already in room {}", player.id, room_id);
            return Ok(false);
        }

        let Some(color) = room
            .color_to_player_id
            .empty_seat()
            .filter(|_| room.players.len() < room.room_type.max_players())
        else {
            return Err(RoomError::GameRoomIsFull {
                room_id: room_id.to_string(),
            });
        };

        let player_id = player.id.clone();
        room.player_id_to_display_name
            .entry(player_id.clone())
            .or_insert_with(|| player.display_name.clone());
        room.player_id_to_score
            .entry(player_id.clone())
            .or_insert(0.0);
        room.color_to_player_id.set(color, Some(player_id.clone()));
        room.players.push(player);
        entry.touch();

        info!("Player {} joined room {} as {}", player_id, room_id, color);
        self.event_bus.publish(RoomEvent::PlayerJoined {
            room_id: room_id.to_string(),
            player_id,
            color,
        });

        Ok(true)
    }

    /// Append a message to the room history. Offer messages also open their
    /// offer slot; accept/decline messages are only produced by responding.
    pub fn add_message_to_game_room(
        &mut self,
        room_id: &str,
        message_type: MessageType,
        author_id: &str,
        content: Option<String>,
    ) -> Result<RoomMessage, RoomError> {
        let entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::room_not_found(room_id))?;

        if message_type.is_offer_response() {
            return Err(RoomError::InvalidOperation { message_type });
        }

        let offer_kind = message_type.offer_kind();
        if let Some(kind) = offer_kind {
            if entry.room.active_offers.is_pending(kind) {
                return Err(RoomError::DuplicateOffer {
                    offer_type: message_type,
                });
            }
        }

        let author_name =
            entry
                .room
                .display_name(author_id)
                .ok_or_else(|| RoomError::PlayerNotInRoom {
                    room_id: room_id.to_string(),
                    player_id: author_id.to_string(),
                })?;
        let content = message_content(message_type, author_name, content)?;

        let room = &entry.room;
        let id = generate_unique_id(self.id_generator.as_ref(), self.config.ids, |candidate| {
            room.messages.iter().any(|m| m.id == candidate)
                || room.active_offers.draw.as_ref().is_some_and(|m| m.id == candidate)
                || room.active_offers.rematch.as_ref().is_some_and(|m| m.id == candidate)
        })?;

        let message = RoomMessage {
            id,
            message_type,
            author_id: author_id.to_string(),
            content,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let messages = &mut entry.room.messages;
        messages.push(message.clone());
        if messages.len() > self.config.message_retention {
            let excess = messages.len() - self.config.message_retention;
            messages.drain(..excess);
        }

        if let Some(kind) = offer_kind {
            *entry.room.active_offers.slot_mut(kind) = Some(message.clone());
            info!("{} opened {} in room {}", author_id, kind, room_id);
        }
        entry.touch();

        self.event_bus.publish(RoomEvent::MessagePosted {
            room_id: room_id.to_string(),
            message: message.clone(),
        });

        Ok(message)
    }

    pub fn swap_player_colors(&mut self, room_id: &str) -> Result<SeatAssignments, RoomError> {
        let entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::room_not_found(room_id))?;
        entry.room.color_to_player_id.swap();
        entry.touch();

        let seats = entry.room.color_to_player_id.clone();
        info!(
            "Swapped colors in room {}: white={:?} black={:?}",
            room_id, seats.white, seats.black
        );
        self.event_bus.publish(RoomEvent::ColorsSwapped {
            room_id: room_id.to_string(),
            seats: seats.clone(),
        });

        Ok(seats)
    }

    /// Bump the game counter and drop any negotiation left over from the previous game
    pub fn start_new_game_in_room(&mut self, room_id: &str) -> Result<u32, RoomError> {
        let entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::room_not_found(room_id))?;
        entry.room.game_count += 1;
        entry.room.active_offers.clear();
        entry.touch();

        let game_count = entry.room.game_count;
        info!("Started game {} in room {}", game_count, room_id);
        self.event_bus.publish(RoomEvent::NewGameStarted {
            room_id: room_id.to_string(),
            game_count,
        });

        Ok(game_count)
    }

    /// Remove the room along with its offer tracking
    pub fn delete_game_room(&mut self, room_id: &str) -> bool {
        if self.rooms.remove(room_id).is_none() {
            return false;
        }

        info!("Deleted room {}", room_id);
        self.event_bus.publish(RoomEvent::RoomDeleted {
            room_id: room_id.to_string(),
        });
        true
    }
}

impl Default for GameRoomStore {
    fn default() -> Self {
        Self::new()
    }
}

fn random_color() -> Color {
    if rand::thread_rng().gen_bool(0.5) {
        Color::White
    } else {
        Color::Black
    }
}

fn message_content(
    message_type: MessageType,
    author_name: &str,
    content: Option<String>,
) -> Result<String, RoomError> {
    if let Some(content) = content.filter(|c| !c.trim().is_empty()) {
        return Ok(content);
    }

    match message_type {
        MessageType::DrawOffer => Ok(format!("{author_name} is offering a draw...")),
        MessageType::RematchOffer => Ok(format!("{author_name} is offering a rematch...")),
        MessageType::PlayerLeftRoom => Ok(format!("{author_name} has left the room.")),
        MessageType::PlayerRejoinedRoom => Ok(format!("{author_name} has rejoined the room.")),
        _ => Err(RoomError::MissingContent { message_type }),
    }
}
