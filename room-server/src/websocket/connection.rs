use room_types::{PlayerId, RoomId, ServerMessage};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The room a connection has joined and the player it speaks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSubscription {
    pub room_id: RoomId,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub last_activity: Instant,
    pub subscription: Option<RoomSubscription>,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        let connection = Self {
            id,
            last_activity: Instant::now(),
            subscription: None,
            sender,
        };

        (connection, receiver)
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_in_room(&self, room_id: &str) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|sub| sub.room_id == room_id)
    }

    pub fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|_| "Connection closed".to_string())
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_connection(
        &self,
        id: ConnectionId,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (conn, receiver) = Connection::new(id);

        {
            let mut connections = self.connections.write().await;
            connections.insert(id, conn);
        }

        receiver
    }

    /// Drop the connection, returning it so the caller can unwind its room membership
    pub async fn remove_connection(&self, id: ConnectionId) -> Option<Connection> {
        let mut connections = self.connections.write().await;
        connections.remove(&id)
    }

    pub async fn get_connection(&self, id: ConnectionId) -> Option<Connection> {
        let connections = self.connections.read().await;
        connections.get(&id).cloned()
    }

    pub async fn get_subscription(&self, id: ConnectionId) -> Option<RoomSubscription> {
        let connections = self.connections.read().await;
        connections.get(&id).and_then(|conn| conn.subscription.clone())
    }

    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }

    pub async fn update_activity(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.update_activity();
        }
    }

    pub async fn send_to_connection(
        &self,
        id: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), String> {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(&id) {
            connection.send_message(message)
        } else {
            Err("Connection not found".to_string())
        }
    }

    pub async fn send_to_room(&self, room_id: &str, message: ServerMessage) {
        let connections = self.connections.read().await;
        for connection in connections.values() {
            if connection.is_in_room(room_id) {
                let _ = connection.send_message(message.clone());
            }
        }
    }

    pub async fn set_subscription(&self, id: ConnectionId, subscription: Option<RoomSubscription>) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.subscription = subscription;
        }
    }

    /// Unsubscribe every connection from a room that no longer exists
    pub async fn clear_room(&self, room_id: &str) -> usize {
        let mut connections = self.connections.write().await;
        let mut cleared = 0;
        for connection in connections.values_mut() {
            if connection.is_in_room(room_id) {
                connection.subscription = None;
                cleared += 1;
            }
        }
        cleared
    }

    pub async fn get_connections_in_room(&self, room_id: &str) -> Vec<ConnectionId> {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|conn| conn.is_in_room(room_id))
            .map(|conn| conn.id)
            .collect()
    }

    /// Remove connections idle past `timeout` and hand them back for unwinding
    pub async fn cleanup_inactive_connections(&self, timeout: Duration) -> Vec<Connection> {
        let inactive_connections: Vec<ConnectionId> = {
            let connections = self.connections.read().await;
            connections
                .values()
                .filter(|conn| conn.is_inactive(timeout))
                .map(|conn| conn.id)
                .collect()
        };

        let mut removed = Vec::with_capacity(inactive_connections.len());
        for connection_id in inactive_connections {
            tracing::info!("Removing inactive connection: {}", connection_id);
            if let Some(connection) = self.remove_connection(connection_id).await {
                removed.push(connection);
            }
        }
        removed
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
