pub mod cleanup;
pub mod ids;
pub mod offers;
pub mod player_registry;
pub mod room_events;
pub mod room_store;
pub mod scoring;

// Re-export main components
pub use cleanup::*;
pub use ids::*;
pub use offers::*;
pub use player_registry::*;
pub use room_events::*;
pub use room_store::*;
pub use scoring::*;
