use room_types::{Player, PlayerId, PlayerStatus, RoomError};
use std::collections::HashMap;
use std::sync::Arc;

use crate::ids::{IdGenerator, IdPolicy, RandomIdGenerator, generate_unique_id};

pub struct PlayerRegistry {
    players: HashMap<PlayerId, Player>,
    id_generator: Arc<dyn IdGenerator>,
    id_policy: IdPolicy,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::with_generator(Arc::new(RandomIdGenerator), IdPolicy::default())
    }

    pub fn with_generator(id_generator: Arc<dyn IdGenerator>, id_policy: IdPolicy) -> Self {
        Self {
            players: HashMap::new(),
            id_generator,
            id_policy,
        }
    }

    /// Register a new player. Players start offline until a connection claims them.
    pub fn create_player(&mut self, display_name: impl Into<String>) -> Result<Player, RoomError> {
        let id = generate_unique_id(self.id_generator.as_ref(), self.id_policy, |candidate| {
            self.players.contains_key(candidate)
        })?;

        let player = Player {
            id: id.clone(),
            display_name: display_name.into(),
            status: PlayerStatus::Offline,
        };
        self.players.insert(id, player.clone());

        Ok(player)
    }

    pub fn get_player_by_id(&self, id: &str) -> Option<Player> {
        self.players.get(id).cloned()
    }

    pub fn get_player_status(&self, id: &str) -> Option<PlayerStatus> {
        self.players.get(id).map(|p| p.status)
    }

    pub fn delete_player(&mut self, id: &str) -> bool {
        self.players.remove(id).is_some()
    }

    pub fn update_status(&mut self, id: &str, is_online: bool) -> Result<(), RoomError> {
        let player = self
            .players
            .get_mut(id)
            .ok_or_else(|| RoomError::player_not_found(id))?;
        player.status = PlayerStatus::from_online(is_online);
        Ok(())
    }

    pub fn is_online(&self, id: &str) -> bool {
        self.get_player_status(id)
            .is_some_and(|status| status.is_online())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
