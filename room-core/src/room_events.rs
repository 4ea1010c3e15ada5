use room_types::{Color, PlayerId, RoomId, RoomMessage, ScoreMap, SeatAssignments};

#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    RoomCreated {
        room_id: RoomId,
        creator_id: PlayerId,
        creator_color: Color,
    },
    PlayerJoined {
        room_id: RoomId,
        player_id: PlayerId,
        color: Color,
    },
    MessagePosted {
        room_id: RoomId,
        message: RoomMessage,
    },
    OfferResolved {
        room_id: RoomId,
        message: RoomMessage,
    },
    ScoresUpdated {
        room_id: RoomId,
        scores: ScoreMap,
    },
    ColorsSwapped {
        room_id: RoomId,
        seats: SeatAssignments,
    },
    NewGameStarted {
        room_id: RoomId,
        game_count: u32,
    },
    RoomDeleted {
        room_id: RoomId,
    },
}

impl RoomEvent {
    pub fn room_id(&self) -> &str {
        match self {
            RoomEvent::RoomCreated { room_id, .. }
            | RoomEvent::PlayerJoined { room_id, .. }
            | RoomEvent::MessagePosted { room_id, .. }
            | RoomEvent::OfferResolved { room_id, .. }
            | RoomEvent::ScoresUpdated { room_id, .. }
            | RoomEvent::ColorsSwapped { room_id, .. }
            | RoomEvent::NewGameStarted { room_id, .. }
            | RoomEvent::RoomDeleted { room_id } => room_id,
        }
    }
}

/// Receives every event the room store publishes
pub trait RoomEventHandler: Send + Sync {
    fn handle_event(&mut self, event: &RoomEvent);
}

/// Fan-out of store events to registered handlers, in registration order
pub struct RoomEventBus {
    handlers: Vec<Box<dyn RoomEventHandler>>,
}

impl RoomEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn RoomEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, event: RoomEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(&event);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for RoomEventBus {
    fn default() -> Self {
        Self::new()
    }
}
