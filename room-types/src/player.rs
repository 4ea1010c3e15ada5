use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PlayerStatus {
    Online,
    Offline,
}

impl PlayerStatus {
    pub fn from_online(is_online: bool) -> Self {
        if is_online {
            PlayerStatus::Online
        } else {
            PlayerStatus::Offline
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, PlayerStatus::Online)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub status: PlayerStatus,
}
