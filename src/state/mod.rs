//! Session synchronization engine.
//!
//! This module provides the client-side state types and the [`GameClient`]
//! that ties them together:
//!
//! - `protocol` - outbound actions and inbound snapshots on the wire
//! - `connection` - the single server connection and its one-slot queue
//! - `session` - local mirror of server state, merged snapshot by snapshot
//! - `event_log` - human-readable lines derived while merging
//! - `selection` - which rack tile the user has picked
//! - `board` - the 9x9 board mirror
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           GameClient                              │
//! │                                                                   │
//! │  select(tile) ─────▶ ┌───────────┐                                │
//! │                      │ Selection │──┐ symbol                      │
//! │  play(location) ────▶└───────────┘  │                             │
//! │  join/leave/start/create ───────────┴──▶ ┌───────────────────┐    │
//! │                                          │ ConnectionManager │────┼──▶ Transport
//! │  handle_open/error/close ───────────────▶│  status + queue   │    │
//! │  handle_message(raw) ───────────────────▶└─────────┬─────────┘    │
//! │                                                    │ Snapshot     │
//! │                                                    ▼              │
//! │                                          ┌───────────────────┐    │
//! │                                          │      Session      │    │
//! │                                          │ merge + EventLog  │    │
//! │                                          └───────────────────┘    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All mutation happens through `GameClient` methods, called from one event
//! loop in arrival order. The presentation layer reads [`Session`] and
//! [`Selection`] and never writes to them.

pub mod board;
pub mod connection;
pub mod event_log;
pub mod protocol;
pub mod selection;
pub mod session;

// Re-export commonly used types
pub use board::{decoration, Board, Cell, Position, BOARD_CELLS, BOARD_SIDE};
pub use connection::{
    ConnectionManager, ConnectionStatus, RecordingTransport, SendOutcome, Transport,
};
pub use event_log::{ordinal, prior_player, EventLog, LogCategory, LogEntry};
pub use protocol::{
    Action, BoardUpdate, CellIndex, OutboundMessage, PlayerNumber, PlayerUpdate, ScoreEntry,
    Snapshot, Tile,
};
pub use selection::{
    InvalidTransition, Selection, SelectionChange, TileEvent, TileRef, TileState,
};
pub use session::{GamePhase, MergeOutcome, Player, Session};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::identity::{self, IdentityStore};

/// Client runtime for one player's view of a game.
#[derive(Debug)]
pub struct GameClient<T, S> {
    config: ClientConfig,
    identity: S,
    connection: ConnectionManager<T>,
    session: Session,
    selection: Selection,
}

impl<T: Transport, S: IdentityStore> GameClient<T, S> {
    /// Create a client, loading or generating the identity token.
    pub fn new(config: ClientConfig, transport: T, mut identity: S) -> Self {
        let token = identity::load_or_create(&mut identity);
        let session = match &config.game_id {
            Some(game_id) => Session::for_game(game_id.clone(), token),
            None => Session::new(token),
        };

        Self {
            config,
            identity,
            connection: ConnectionManager::new(transport),
            session,
            selection: Selection::new(),
        }
    }

    /// Open the connection to the configured endpoint.
    pub fn connect(&mut self) -> Result<()> {
        self.config.validate().map_err(|e| self.report(e))?;
        let endpoint = self.config.endpoint.clone();
        self.connection.open(&endpoint).map_err(|e| self.report(e))
    }

    // Transport events

    /// The transport finished opening.
    ///
    /// Sends the queued action if any; otherwise re-requests the snapshot
    /// of the selected game, which is how a restarted client catches up.
    pub fn handle_open(&mut self) -> Result<Option<OutboundMessage>> {
        let resync = self.message(Action::Get).ok();
        self.connection.on_open(resync).map_err(|e| self.report(e))
    }

    pub fn handle_error(&mut self, detail: &str) {
        self.connection.on_error(detail);
        self.session.log_error(format!("Connection error: {}", detail));
    }

    /// The transport closed. A drop nobody reported yet gets a log line.
    pub fn handle_close(&mut self) {
        if self.connection.on_close() {
            self.session.log_error("Connection closed");
        }
    }

    /// A frame arrived from the server.
    ///
    /// Undecodable or malformed snapshots are returned as errors and leave
    /// the session unchanged.
    pub fn handle_message(&mut self, raw: &str) -> Result<MergeOutcome> {
        let snapshot = self.connection.on_message(raw)?;
        let outcome = self.session.merge(snapshot).map_err(|e| {
            tracing::warn!(error = %e, "Rejected snapshot");
            e
        })?;

        if outcome.rack_replaced && self.selection_stale() {
            tracing::debug!("Rack changed under the selection; selection cleared");
        }
        Ok(outcome)
    }

    fn selection_stale(&mut self) -> bool {
        self.selection.sync_rack(self.session.rack())
    }

    // User intents

    /// Choose a game. Starts a fresh session (and event log) for it.
    pub fn create(&mut self, game_id: &str) -> Result<SendOutcome> {
        let game_id = game_id.trim();
        if game_id.is_empty() {
            return Err(self.report(ClientError::NoGameSelected));
        }

        tracing::info!(game_id, "Selecting game");
        let token = self.session.auth_token().to_string();
        self.session = Session::for_game(game_id, token);
        self.selection = Selection::new();
        self.send(Action::Get)
    }

    pub fn join(&mut self, name: &str) -> Result<SendOutcome> {
        self.send(Action::Join {
            name: name.trim().to_string(),
        })
    }

    pub fn leave(&mut self) -> Result<SendOutcome> {
        self.send(Action::Leave)
    }

    pub fn start(&mut self) -> Result<SendOutcome> {
        self.send(Action::Start)
    }

    /// Pick or re-pick a tile.
    pub fn select(&mut self, tile: TileRef) -> Result<SelectionChange> {
        let change = self.selection.select(tile)?;
        tracing::debug!(?change, "Selection changed");
        Ok(change)
    }

    pub fn deselect(&mut self) {
        self.selection.deselect();
    }

    /// Place the selected tile on a board cell.
    ///
    /// Needs exactly one selected tile. With none, the user gets an error
    /// line in the log and nothing is sent. The selection is cleared after
    /// the move is handed to the connection, whatever the outcome.
    pub fn play(&mut self, location: CellIndex) -> Result<SendOutcome> {
        let selected = self.selection.selected_slots().len();
        let symbol = self.selection.selected_symbol().map(str::to_string);
        let tile = match (selected, symbol) {
            (1, Some(symbol)) => symbol,
            (0, _) | (1, None) => return Err(self.report(ClientError::NoTileSelected)),
            (n, _) => {
                tracing::error!(selected = n, "More than one tile selected");
                return Err(self.report(ClientError::SelectionFault(n)));
            }
        };

        if location >= BOARD_CELLS {
            return Err(self.report(ClientError::InvalidLocation(location)));
        }

        tracing::debug!(tile = %tile, location, "Sending move");
        let outcome = self.send(Action::Move { tile, location });
        self.selection.submit();
        outcome
    }

    fn send(&mut self, action: Action) -> Result<SendOutcome> {
        let message = self.message(action).map_err(|e| self.report(e))?;

        if self.connection.endpoint().is_none() {
            self.connect()?;
        }
        self.connection.send(message).map_err(|e| self.report(e))
    }

    fn message(&self, action: Action) -> Result<OutboundMessage> {
        let game_id = self.session.game_id().ok_or(ClientError::NoGameSelected)?;
        Ok(OutboundMessage::new(
            game_id,
            self.session.auth_token(),
            action,
        ))
    }

    /// Log a user-facing error and hand it back.
    fn report(&mut self, error: ClientError) -> ClientError {
        if error.is_user_facing() {
            self.session.log_error(error.to_string());
        }
        error
    }

    // Read access for the presentation layer

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn log(&self) -> &EventLog {
        self.session.log()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn connection(&self) -> &ConnectionManager<T> {
        &self.connection
    }

    pub fn transport(&self) -> &T {
        self.connection.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.connection.transport_mut()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn identity(&self) -> &S {
        &self.identity
    }

    /// Full view for rendering.
    pub fn to_json(&self) -> serde_json::Value {
        let mut view = self.session.to_json();
        view["connection"] = serde_json::json!(self.connection.status().as_str());
        view["selection"] = self.selection.to_json();
        view
    }
}
