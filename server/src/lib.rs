//! # Dummy Spawner Server Library
//!
//! This library provides the authoritative server for the networked dummy
//! spawner demo. Clients connect and ask the server to spawn batches of
//! autonomous "dummy" characters on their behalf; the server owns every
//! dummy, simulates it, and broadcasts the resulting world state to all
//! connected clients.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Spawn Bookkeeping
//! Every dummy in existence was created here in response to a client
//! request. The server records which client owns which dummies and keeps a
//! single replicated counter of the population, so deleting a client's
//! dummies (on request or on disconnect) is exact: nothing owned by a
//! departed client survives it, and nothing owned by anyone else is touched.
//!
//! ### Client Management
//! Handles the complete lifecycle of client connections including:
//! - Connection establishment and owner id assignment
//! - Request attribution by sender address, never by payload fields
//! - Disconnection handling, timeouts and per-owner cleanup
//!
//! ### State Broadcasting
//! Regularly transmits the current world state (all live dummies plus the
//! replicated counter) to all connected clients, which render it directly.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Connection tracking, owner id assignment, capacity enforcement and
//! timeout detection.
//!
//! ### Registry Module (`registry`)
//! The per-owner record of spawned dummies and the replicated dummy
//! counter. Owns the delete-all and disconnect cleanup semantics.
//!
//! ### Spawner Module (`spawner`)
//! Turns spawn requests into world entities: template loading, per-request
//! count clamping, sequential naming and color assignment.
//!
//! ### World Module (`world`)
//! The live dummies and their simulation: spawn/despawn, owner-validated
//! input application and the per-tick movement step.
//!
//! ### Network Module (`network`)
//! UDP socket management, packet serialization, the async receive/send/
//! timeout tasks and the main tick loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use server::spawner::{DummySpawner, DummyTemplate};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let template = DummyTemplate::load(Path::new("dummy_template.json")).ok();
//!     let spawner = DummySpawner::new(template, 100);
//!
//!     // 30Hz tick rate, up to 32 clients
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         Duration::from_millis(33),
//!         32,
//!         spawner,
//!     ).await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! The server uses an event-driven architecture with internal async tasks:
//! - **Network Receiver**: continuously listens for incoming packets
//! - **Network Sender**: processes the outgoing packet queue and broadcasts
//! - **Timeout Checker**: monitors client health and removes inactive connections
//! - **Main Loop**: handles requests, steps the simulation and broadcasts state
//!
//! ## Request Attribution
//!
//! Spawn, delete and input packets carry no sender identity. The server
//! resolves the UDP sender address to a connected client and uses that as
//! the owner for everything the request does, so a client can only ever
//! spawn for itself, delete its own dummies and steer its own dummies.
//! Requests from unknown addresses are dropped.

pub mod client_manager;
pub mod network;
pub mod registry;
pub mod spawner;
pub mod world;
