//! Client connection management for the dummy spawner server
//!
//! This module handles the server-side management of connected clients:
//! - Connection lifecycle (connect, disconnect, timeout)
//! - Connection health monitoring and automatic cleanup
//! - Client capacity enforcement and address tracking
//!
//! The client id handed out here is the owner identity everything else keys
//! on: the registry records dummies under it and the world validates input
//! against it. Requests are attributed by resolving the sender's address to
//! a connected client, never by trusting identity fields in the payload.

use log::info;
use shared::OwnerId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Represents a connected client
///
/// Tracks the connection metadata needed to route responses and detect
/// silent disconnects.
#[derive(Debug)]
pub struct Client {
    /// Unique client identifier assigned by the server
    pub id: OwnerId,
    /// Network address for sending responses
    pub addr: SocketAddr,
    /// Last time we received any packet from this client
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: OwnerId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    /// Checks if the client has exceeded the connection timeout
    ///
    /// Returns true if no packets have been received from this client
    /// within the given duration, indicating a likely disconnect.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Manages all connected clients
///
/// Provides centralized control over client connections and enforces the
/// server's capacity limit. Client ids start from 1, increment for each new
/// connection and are never reused, so a reconnecting client is a new owner
/// and never inherits dummies from its previous session.
pub struct ClientManager {
    /// Connected clients indexed by their unique id
    clients: HashMap<OwnerId, Client>,
    /// Next available client id for new connections
    next_client_id: OwnerId,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Attempts to add a new client connection
    ///
    /// Returns Some(client_id) if successful, None if the server is at
    /// capacity. Logs the new connection for server monitoring.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<OwnerId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        let client = Client::new(client_id, addr);
        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, client);

        Some(client_id)
    }

    /// Removes a client from the server
    ///
    /// Returns true if the client was found and removed, false if it was
    /// already gone. Handles both explicit disconnects and timeout cleanup.
    pub fn remove_client(&mut self, client_id: OwnerId) -> bool {
        if let Some(client) = self.clients.remove(&client_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    /// Finds a client id by network address
    ///
    /// Used to attribute incoming packets to existing connections. Returns
    /// None if no client is connected from the given address.
    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<OwnerId> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Refreshes a client's activity timestamp
    ///
    /// Called for every packet received from a known client so that any
    /// traffic keeps the connection alive.
    pub fn mark_seen(&mut self, client_id: OwnerId) {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.last_seen = Instant::now();
        }
    }

    /// Checks for and removes timed-out clients
    ///
    /// Disconnects clients that haven't sent packets within the timeout
    /// threshold and returns their ids so other systems can clean up the
    /// state owned by them.
    pub fn check_timeouts(&mut self) -> Vec<OwnerId> {
        let timeout = Duration::from_secs(5);
        let timed_out: Vec<OwnerId> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(*client_id);
        }

        timed_out
    }

    /// Gets all client ids and their network addresses
    ///
    /// Used for broadcasting world state updates to all connected clients.
    pub fn get_client_addrs(&self) -> Vec<(OwnerId, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_client_creation() {
        let addr = test_addr();
        let client = Client::new(1, addr);

        assert_eq!(client.id, 1);
        assert_eq!(client.addr, addr);
        assert!(!client.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_client_timeout() {
        let addr = test_addr();
        let mut client = Client::new(1, addr);

        assert!(!client.is_timed_out(Duration::from_secs(1)));

        client.last_seen = Instant::now() - Duration::from_secs(2);

        assert!(client.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_client_manager_creation() {
        let manager = ClientManager::new(5);
        assert_eq!(manager.max_clients, 5);
        assert!(manager.is_empty());
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn test_add_client() {
        let mut manager = ClientManager::new(2);
        let addr = test_addr();

        let client_id = manager.add_client(addr).unwrap();
        assert_eq!(client_id, 1);
        assert_eq!(manager.len(), 1);
        assert!(!manager.is_empty());
    }

    #[test]
    fn test_add_multiple_clients() {
        let mut manager = ClientManager::new(3);

        let client_id1 = manager.add_client(test_addr()).unwrap();
        let client_id2 = manager.add_client(test_addr2()).unwrap();

        assert_eq!(client_id1, 1);
        assert_eq!(client_id2, 2);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_add_client_max_capacity() {
        let mut manager = ClientManager::new(1);

        let client_id1 = manager.add_client(test_addr());
        assert!(client_id1.is_some());
        assert_eq!(manager.len(), 1);

        let client_id2 = manager.add_client(test_addr2());
        assert!(client_id2.is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_remove_client() {
        let mut manager = ClientManager::new(2);

        let client_id = manager.add_client(test_addr()).unwrap();
        assert_eq!(manager.len(), 1);

        let removed = manager.remove_client(client_id);
        assert!(removed);
        assert_eq!(manager.len(), 0);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_remove_nonexistent_client() {
        let mut manager = ClientManager::new(2);

        let removed = manager.remove_client(999);
        assert!(!removed);
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn test_client_ids_are_never_reused() {
        let mut manager = ClientManager::new(2);

        let first = manager.add_client(test_addr()).unwrap();
        manager.remove_client(first);
        let second = manager.add_client(test_addr()).unwrap();

        assert_ne!(first, second);
        assert_eq!(second, 2);
    }

    #[test]
    fn test_find_client_by_addr() {
        let mut manager = ClientManager::new(2);
        let addr1 = test_addr();
        let addr2 = test_addr2();

        let client_id1 = manager.add_client(addr1).unwrap();
        let _client_id2 = manager.add_client(addr2).unwrap();

        let found_id = manager.find_client_by_addr(addr1);
        assert_eq!(found_id, Some(client_id1));

        let unknown_addr: SocketAddr = "192.168.1.1:9999".parse().unwrap();
        let not_found = manager.find_client_by_addr(unknown_addr);
        assert_eq!(not_found, None);
    }

    #[test]
    fn test_mark_seen_refreshes_activity() {
        let mut manager = ClientManager::new(2);
        let client_id = manager.add_client(test_addr()).unwrap();

        if let Some(client) = manager.clients.get_mut(&client_id) {
            client.last_seen = Instant::now() - Duration::from_secs(10);
        }
        manager.mark_seen(client_id);

        assert!(manager.check_timeouts().is_empty());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_check_timeouts_removes_stale_clients() {
        let mut manager = ClientManager::new(3);
        let stale_id = manager.add_client(test_addr()).unwrap();
        let live_id = manager.add_client(test_addr2()).unwrap();

        if let Some(client) = manager.clients.get_mut(&stale_id) {
            client.last_seen = Instant::now() - Duration::from_secs(10);
        }

        let timed_out = manager.check_timeouts();

        assert_eq!(timed_out, vec![stale_id]);
        assert_eq!(manager.len(), 1);
        assert!(manager.find_client_by_addr(test_addr2()) == Some(live_id));
    }

    #[test]
    fn test_get_client_addrs() {
        let mut manager = ClientManager::new(3);
        let client_id1 = manager.add_client(test_addr()).unwrap();
        let client_id2 = manager.add_client(test_addr2()).unwrap();

        let mut addrs = manager.get_client_addrs();
        addrs.sort_by_key(|(id, _)| *id);

        assert_eq!(addrs, vec![(client_id1, test_addr()), (client_id2, test_addr2())]);
    }
}
