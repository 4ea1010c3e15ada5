#![allow(dead_code)]

use room_core::{GameRoomStore, IdGenerator, PlayerRegistry, RoomEvent, RoomEventHandler, RoomStoreConfig};
use room_types::{Color, Player, PlayerStatus, RoomId, RoomType};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Creates a test player with a fixed id derived from the name
pub fn create_test_player(name: &str) -> Player {
    Player {
        id: format!("test-player-{}", name.to_lowercase()),
        display_name: name.to_string(),
        status: PlayerStatus::Online,
    }
}

/// Creates a player-vs-player room with Alice as white and Bob as black
pub fn create_standard_room(store: &mut GameRoomStore) -> (RoomId, Player, Player) {
    let alice = create_test_player("Alice");
    let bob = create_test_player("Bob");

    let room = store
        .create_game_room(None, RoomType::PlayerVsPlayer, alice.clone(), Some(Color::White))
        .unwrap();
    store.join_game_room(&room.id, bob.clone()).unwrap();

    (room.id, alice, bob)
}

/// Id generator that replays a script, then falls back to numbered ids
pub struct ScriptedIdGenerator {
    script: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedIdGenerator {
    pub fn new(script: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.iter().map(|s| s.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IdGenerator for ScriptedIdGenerator {
    fn generate(&self, _length: usize) -> String {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| format!("generated-{}", call))
    }
}

pub fn store_with_generator(generator: Arc<ScriptedIdGenerator>) -> GameRoomStore {
    GameRoomStore::with_generator(generator, RoomStoreConfig::default())
}

pub fn registry_with_generator(generator: Arc<ScriptedIdGenerator>) -> PlayerRegistry {
    PlayerRegistry::with_generator(generator, Default::default())
}

/// Event collector for testing event emissions
#[derive(Clone)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<RoomEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_events(&self) -> Vec<RoomEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn last_event(&self) -> Option<RoomEvent> {
        self.events.lock().unwrap().last().cloned()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&RoomEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl RoomEventHandler for EventCollector {
    fn handle_event(&mut self, event: &RoomEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
