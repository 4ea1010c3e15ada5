pub mod chat;
pub mod errors;
pub mod messages;
pub mod player;
pub mod room;

// Re-export all types
pub use chat::*;
pub use errors::*;
pub use messages::*;
pub use player::*;
pub use room::*;

pub type RoomId = String;
pub type PlayerId = String;
pub type MessageId = String;
