//! # Dummy Spawner Client Library
//!
//! This library provides the client for the networked dummy spawner demo.
//! The client connects to the authoritative server, requests dummies to be
//! spawned or deleted on its behalf, generates wandering input for every
//! dummy it owns, and renders the replicated world together with a
//! diagnostics overlay.
//!
//! ## Architecture Overview
//!
//! The client is deliberately thin. The server owns every dummy and runs
//! the only simulation; the client renders world state exactly as received,
//! with no prediction, reconciliation or interpolation. What the client
//! does own is intent: for each dummy spawned on its behalf it runs a small
//! behavior that picks a random walking direction every few seconds, jumps
//! every few seconds and submits the resulting input every tick, as a
//! stand-in for real players at scale.
//!
//! ## Module Organization
//!
//! ### Dummy Module (`dummy`)
//! Wandering behavior for owned dummies: heading/jump scheduling, input
//! sequencing and reconciliation of the behavior set against world state.
//!
//! ### Input Module (`input`)
//! Edge-detected keyboard commands for spawning, deleting, overlay control
//! and quitting.
//!
//! ### Network Module (`network`)
//! UDP socket management, packet serialization, the connect handshake,
//! ping/pong round-trip sampling and the main client loop.
//!
//! ### Overlay Module (`overlay`)
//! The diagnostics readout: rolling FPS average, round-trip time and the
//! replicated dummy counter, each classified against load thresholds.
//!
//! ### Rendering Module (`rendering`)
//! Top-down arena view of the replicated dummies plus the overlay text.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to a local server, requesting batches of 10 dummies,
//!     // with no preferred color, in an 800x600 window.
//!     let mut client = Client::new("127.0.0.1:8080", 10, None, 800, 600).await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Controls
//!
//! - **1**: spawn one dummy
//! - **2**: spawn a batch of dummies
//! - **3**: delete all own dummies
//! - **O**: toggle the diagnostics overlay
//! - **Escape**: disconnect and quit

pub mod dummy;
pub mod input;
pub mod network;
pub mod overlay;
pub mod rendering;
