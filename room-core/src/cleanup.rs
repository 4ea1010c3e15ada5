use room_types::{GameRoom, RoomId};
use std::time::Duration;
use tracing::info;

use crate::player_registry::PlayerRegistry;
use crate::room_store::{GameRoomStore, RoomEntry};

pub struct RoomCleanup {
    pub idle_threshold: Duration, // no activity and nobody online
    pub offline_grace: Duration,  // everyone offline and quiet this long
}

impl Default for RoomCleanup {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::from_secs(3600), // 1 hour
            offline_grace: Duration::from_secs(300),   // 5 minutes
        }
    }
}

impl RoomCleanup {
    pub fn new(idle_threshold: Duration, offline_grace: Duration) -> Self {
        Self {
            idle_threshold,
            offline_grace,
        }
    }

    /// Delete abandoned rooms through the store and return their ids
    pub fn cleanup_abandoned_rooms(
        &self,
        store: &mut GameRoomStore,
        registry: &PlayerRegistry,
    ) -> Vec<RoomId> {
        let rooms_to_remove: Vec<(RoomId, &'static str)> = store
            .rooms
            .iter()
            .filter_map(|(room_id, entry)| {
                self.cleanup_reason(entry, registry)
                    .map(|reason| (room_id.clone(), reason))
            })
            .collect();

        let mut removed = Vec::with_capacity(rooms_to_remove.len());
        for (room_id, reason) in rooms_to_remove {
            if store.delete_game_room(&room_id) {
                info!("Cleaned up room {}: {}", room_id, reason);
                removed.push(room_id);
            }
        }

        removed
    }

    fn cleanup_reason(&self, entry: &RoomEntry, registry: &PlayerRegistry) -> Option<&'static str> {
        // Rooms with an online player are never swept
        if !self.is_all_players_offline(&entry.room, registry) {
            return None;
        }

        let idle = entry.idle_for();
        if idle > self.offline_grace {
            Some("All players offline")
        } else if idle > self.idle_threshold {
            Some("Inactivity timeout")
        } else {
            None
        }
    }

    /// Players deleted from the registry count as offline
    fn is_all_players_offline(&self, room: &GameRoom, registry: &PlayerRegistry) -> bool {
        room.players.iter().all(|player| !registry.is_online(&player.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use room_types::{Color, RoomType};

    fn setup() -> (GameRoomStore, PlayerRegistry, RoomId, String) {
        let mut registry = PlayerRegistry::new();
        let mut store = GameRoomStore::new();

        let alice = registry.create_player("Alice").unwrap();
        let room = store
            .create_game_room(None, RoomType::PlayerVsPlayer, alice.clone(), Some(Color::White))
            .unwrap();

        (store, registry, room.id, alice.id)
    }

    #[test]
    fn test_cleanup_configuration() {
        let cleanup = RoomCleanup::default();

        assert_eq!(cleanup.idle_threshold, Duration::from_secs(3600));
        assert_eq!(cleanup.offline_grace, Duration::from_secs(300));
    }

    #[test]
    fn test_fresh_room_is_kept() {
        let (mut store, registry, room_id, _) = setup();
        let cleanup = RoomCleanup::default();

        assert!(cleanup.cleanup_abandoned_rooms(&mut store, &registry).is_empty());
        assert!(store.get_game_room_by_id(&room_id).is_some());
    }

    #[test]
    fn test_quiet_room_with_online_player_is_kept() {
        let (mut store, mut registry, room_id, alice_id) = setup();
        let bob = registry.create_player("Bob").unwrap();
        store.join_game_room(&room_id, bob.clone()).unwrap();
        registry.update_status(&alice_id, true).unwrap();
        registry.update_status(&bob.id, true).unwrap();
        let cleanup = RoomCleanup::new(Duration::from_millis(1), Duration::from_secs(3600));

        std::thread::sleep(Duration::from_millis(5));

        assert!(cleanup.cleanup_abandoned_rooms(&mut store, &registry).is_empty());
        assert!(store.get_game_room_by_id(&room_id).is_some());
    }

    #[test]
    fn test_idle_room_is_removed_once_everyone_is_offline() {
        let (mut store, mut registry, room_id, alice_id) = setup();
        registry.update_status(&alice_id, true).unwrap();
        let cleanup = RoomCleanup::new(Duration::from_millis(1), Duration::from_secs(3600));

        std::thread::sleep(Duration::from_millis(5));
        assert!(cleanup.cleanup_abandoned_rooms(&mut store, &registry).is_empty());

        registry.update_status(&alice_id, false).unwrap();
        let removed = cleanup.cleanup_abandoned_rooms(&mut store, &registry);
        assert_eq!(removed, vec![room_id.clone()]);
        assert!(store.get_game_room_by_id(&room_id).is_none());
    }

    #[test]
    fn test_offline_room_removed_after_grace() {
        let (mut store, mut registry, room_id, alice_id) = setup();
        let cleanup = RoomCleanup::new(Duration::from_secs(3600), Duration::from_millis(1));

        registry.update_status(&alice_id, true).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert!(cleanup.cleanup_abandoned_rooms(&mut store, &registry).is_empty());

        registry.update_status(&alice_id, false).unwrap();
        let removed = cleanup.cleanup_abandoned_rooms(&mut store, &registry);
        assert_eq!(removed, vec![room_id]);
    }
}
