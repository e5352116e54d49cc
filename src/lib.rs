//! Uptown Client Library
//!
//! Client-side session engine for Uptown, a turn-based board game played
//! against an authoritative server over a persistent connection.
//!
//! # Overview
//!
//! - **Connection Management** - One logical connection with a three-state
//!   lifecycle, a single queued-message slot and reconnect-on-send.
//!
//! - **Action Protocol** - JSON encoding of `get`/`join`/`leave`/`start`/`move`
//!   and decoding of partial server snapshots.
//!
//! - **Session Store** - Partial-merge mirror of players, board, rack and
//!   counters, with an append-only event log derived from each update.
//!
//! - **Tile Selection** - A state machine guaranteeing at most one selected
//!   rack tile.
//!
//! # Design Principles
//!
//! 1. **The server decides** - No rules, legality or scoring live here; the
//!    client relays tiles and locations and shows what comes back.
//!
//! 2. **No networking** - Sockets sit behind the [`state::Transport`] trait.
//!
//! 3. **Nothing is fatal** - Every error leaves the session usable.
//!
//! # Example
//!
//! ```rust
//! use uptown_client::{
//!     ClientConfig, GameClient, MemoryIdentityStore, RecordingTransport, TileRef,
//! };
//!
//! let config = ClientConfig::new("wss://example.test/default").with_game_id("friday");
//! let mut client = GameClient::new(config, RecordingTransport::new(), MemoryIdentityStore::new());
//!
//! client.connect().unwrap();
//! client.handle_open().unwrap(); // requests the current snapshot
//!
//! client
//!     .handle_message(r#"{"players": {"1": {"name": "Ann", "self": true}}, "rack": ["A", "7"]}"#)
//!     .unwrap();
//!
//! client.select(TileRef::Rack(1)).unwrap();
//! client.play(40).unwrap();
//!
//! assert_eq!(client.transport().sent.len(), 2);
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod state;

pub use config::{game_id_from_query, ClientConfig};
pub use error::{ClientError, Result, TransportError};
pub use identity::{IdentityStore, MemoryIdentityStore};
pub use logging::{init_logging, LogConfig};

// Re-export everything from state module at crate root
pub use state::*;
