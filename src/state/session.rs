//! Session state store.
//!
//! The local mirror of what the server has told this client. Every inbound
//! snapshot is folded in with [`Session::merge`], which is a partial update:
//! keys absent from the snapshot leave the current values alone. Merging
//! also derives the human-readable event log.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::board::{Board, BOARD_CELLS};
use super::event_log::{self, EventLog, LogCategory};
use super::protocol::{CellIndex, PlayerNumber, PlayerUpdate, ScoreEntry, Snapshot, Tile};
use crate::error::{ClientError, Result};

/// A seated player as last reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// 1-based seat number
    pub number: PlayerNumber,

    pub name: String,

    /// Whether this record is the local user
    pub is_self: bool,

    /// Tiles taken from other players
    pub captured: Vec<Tile>,

    /// Cell of this player's most recent placement
    pub last_move: Option<CellIndex>,
}

impl Player {
    pub fn new(number: PlayerNumber, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            is_self: false,
            captured: Vec::new(),
            last_move: None,
        }
    }

    fn apply(&mut self, update: &PlayerUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(is_self) = update.is_self {
            self.is_self = is_self;
        }
        if let Some(captured) = &update.captured {
            self.captured = captured.clone();
        }
        if let Some(last) = update.last {
            self.last_move = Some(last);
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let captured: Vec<serde_json::Value> = self.captured.iter().map(|t| t.to_json()).collect();
        serde_json::json!({
            "number": self.number,
            "name": self.name,
            "is_self": self.is_self,
            "captured": captured,
            "last_move": self.last_move
        })
    }
}

/// Coarse phase of the game, derived from what has been received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// No game chosen yet
    NoGame,
    /// Game chosen, waiting for the first snapshot
    Loading,
    /// Players known, board not dealt
    Lobby,
    InProgress,
    /// Final scores received
    Finished,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoGame => "no_game",
            Self::Loading => "loading",
            Self::Lobby => "lobby",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
        }
    }
}

/// What a merge did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Log entries appended by this merge
    pub logged: usize,

    /// The rack was replaced
    pub rack_replaced: bool,

    /// Standings were announced and derivation stopped there
    pub scores_announced: bool,
}

/// Local mirror of one game as seen by this client.
#[derive(Debug, Clone)]
pub struct Session {
    game_id: Option<String>,
    auth_token: String,
    players: BTreeMap<PlayerNumber, Player>,
    board: Option<Board>,
    rack: Vec<String>,
    tiles_left: Option<u32>,
    next_player: Option<PlayerNumber>,
    scores: Option<Vec<ScoreEntry>>,
    last_error: Option<String>,

    /// Banner text from the latest non-error snapshot
    message: Option<String>,

    log: EventLog,

    pub started_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub snapshots_merged: u64,
}

impl Session {
    /// Create a session with no game selected.
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            game_id: None,
            auth_token: auth_token.into(),
            players: BTreeMap::new(),
            board: None,
            rack: Vec::new(),
            tiles_left: None,
            next_player: None,
            scores: None,
            last_error: None,
            message: None,
            log: EventLog::new(),
            started_at: Utc::now(),
            updated_at: None,
            snapshots_merged: 0,
        }
    }

    /// Create a session for a chosen game.
    pub fn for_game(game_id: impl Into<String>, auth_token: impl Into<String>) -> Self {
        let mut session = Self::new(auth_token);
        session.game_id = Some(game_id.into());
        session
    }

    /// Fold a snapshot into the session.
    ///
    /// Without a server `error`, the snapshot is validated before anything
    /// changes, so a malformed snapshot leaves the session untouched.
    pub fn merge(&mut self, mut snapshot: Snapshot) -> Result<MergeOutcome> {
        let in_error = snapshot.error.is_some();
        if !in_error {
            self.validate(&snapshot)?;
        }

        let board = match snapshot.board.take().map(Board::from_update) {
            Some(Ok(board)) => Some(board),
            Some(Err(e)) if in_error => {
                tracing::warn!(error = %e, "Dropping malformed board alongside server error");
                None
            }
            Some(Err(e)) => return Err(e),
            None => None,
        };

        let log_start = self.log.len();
        let mut outcome = MergeOutcome::default();

        // 1. Server-reported error: logged, remembered, and merging continues
        if let Some(error) = &snapshot.error {
            self.log.error(error.clone());
            self.last_error = Some(error.clone());
            self.message = Some(error.clone());
        } else {
            self.message = snapshot.message.clone();
        }

        // 2. Partial merge of top-level fields
        if let Some(game_id) = snapshot.game_id.take() {
            self.game_id = Some(game_id);
        }
        if let Some(token) = &snapshot.auth_token {
            if *token != self.auth_token {
                tracing::warn!("Server echoed a different auth token; keeping ours");
            }
        }
        if let Some(players) = &snapshot.players {
            self.merge_players(players);
        }
        if let Some(board) = board {
            self.board = Some(board);
        }
        if let Some(rack) = snapshot.rack.take() {
            self.rack = rack;
            outcome.rack_replaced = true;
        }
        if let Some(tiles_left) = snapshot.tiles_left {
            self.tiles_left = Some(tiles_left);
        }
        if let Some(next_player) = snapshot.next_player {
            self.next_player = Some(next_player);
        }

        // 3. Free-text message
        if let Some(message) = &snapshot.message {
            self.log.info(message.clone());
        }

        // 4. Final standings end derivation for this snapshot
        if let Some(scores) = snapshot.scores.take() {
            for (index, entry) in scores.iter().enumerate() {
                let names: Vec<String> = entry.players.iter().map(|&n| self.name_of(n)).collect();
                self.log
                    .info(event_log::ranking_line(index + 1, &names, entry));
            }
            self.scores = Some(scores);
            outcome.scores_announced = true;
        } else if let Some(next_player) = snapshot.next_player {
            // 5. Announce the move that just ended
            self.announce_last_move(next_player, snapshot.players.as_ref());
        }

        outcome.logged = self.log.len() - log_start;
        self.updated_at = Some(Utc::now());
        self.snapshots_merged += 1;
        Ok(outcome)
    }

    fn validate(&self, snapshot: &Snapshot) -> Result<()> {
        if let (Some(ours), Some(theirs)) = (&self.game_id, &snapshot.game_id) {
            if ours != theirs {
                return Err(ClientError::MalformedSnapshot(format!(
                    "snapshot for game {} while {} is selected",
                    theirs, ours
                )));
            }
        }

        if snapshot.next_player == Some(0) {
            return Err(ClientError::MalformedSnapshot(
                "next player is 0".to_string(),
            ));
        }

        if let Some(players) = &snapshot.players {
            let mut self_count = 0;
            for (number, update) in players {
                if *number == 0 {
                    return Err(ClientError::MalformedSnapshot(
                        "player number 0".to_string(),
                    ));
                }
                if update.name.is_none() && !self.players.contains_key(number) {
                    return Err(ClientError::MalformedSnapshot(format!(
                        "new player {} has no name",
                        number
                    )));
                }
                if update.last.is_some_and(|cell| cell >= BOARD_CELLS) {
                    return Err(ClientError::MalformedSnapshot(format!(
                        "player {} last move is off the board",
                        number
                    )));
                }
                if update.is_self == Some(true) {
                    self_count += 1;
                }
            }
            if self_count > 1 {
                return Err(ClientError::MalformedSnapshot(
                    "more than one player marked as self".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn merge_players(&mut self, updates: &BTreeMap<PlayerNumber, PlayerUpdate>) {
        for (&number, update) in updates {
            match self.players.get_mut(&number) {
                Some(player) => player.apply(update),
                None => match &update.name {
                    Some(name) => {
                        let mut player = Player::new(number, name.clone());
                        player.apply(update);
                        self.players.insert(number, player);
                    }
                    None => {
                        tracing::warn!(player = number, "Skipping unnamed new player");
                    }
                },
            }

            if update.is_self == Some(true) {
                for (other, player) in self.players.iter_mut() {
                    if *other != number {
                        player.is_self = false;
                    }
                }
            }
        }
    }

    fn announce_last_move(
        &mut self,
        next_player: PlayerNumber,
        updates: Option<&BTreeMap<PlayerNumber, PlayerUpdate>>,
    ) {
        let highest = self.players.keys().next_back().copied().unwrap_or(0);
        let Some(mover) = event_log::prior_player(next_player, highest) else {
            return;
        };
        let Some(cell) = updates
            .and_then(|players| players.get(&mover))
            .and_then(|update| update.last)
        else {
            return;
        };
        let Some(symbol) = self
            .board
            .as_ref()
            .and_then(|board| board.get(cell))
            .map(|tile| tile.symbol.clone())
        else {
            tracing::debug!(player = mover, cell, "Last move points at an empty cell");
            return;
        };

        let line = event_log::move_line(&self.name_of(mover), &symbol);
        self.log.push(line, Some(LogCategory::Player(mover)));
    }

    /// Record a client-side error (user input or transport) in the log.
    pub(crate) fn log_error(&mut self, text: impl Into<String>) {
        self.log.error(text);
    }

    /// Display name for a player number, with a fallback for unknown seats.
    pub fn name_of(&self, number: PlayerNumber) -> String {
        self.players
            .get(&number)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("Player {}", number))
    }

    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn player(&self, number: PlayerNumber) -> Option<&Player> {
        self.players.get(&number)
    }

    /// Players in seat order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// The local user's player record, once joined.
    pub fn self_player(&self) -> Option<&Player> {
        self.players.values().find(|p| p.is_self)
    }

    pub fn has_self(&self) -> bool {
        self.self_player().is_some()
    }

    /// Check if it's the local user's turn.
    pub fn is_my_turn(&self) -> bool {
        match (self.self_player(), self.next_player) {
            (Some(me), Some(next)) => me.number == next,
            _ => false,
        }
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn rack(&self) -> &[String] {
        &self.rack
    }

    pub fn tiles_left(&self) -> Option<u32> {
        self.tiles_left
    }

    pub fn next_player(&self) -> Option<PlayerNumber> {
        self.next_player
    }

    pub fn scores(&self) -> Option<&[ScoreEntry]> {
        self.scores.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn phase(&self) -> GamePhase {
        if self.game_id.is_none() {
            GamePhase::NoGame
        } else if self.scores.is_some() {
            GamePhase::Finished
        } else if self.board.is_some() {
            GamePhase::InProgress
        } else if !self.players.is_empty() {
            GamePhase::Lobby
        } else {
            GamePhase::Loading
        }
    }

    /// Convert the session to JSON for the presentation layer.
    pub fn to_json(&self) -> serde_json::Value {
        let players: Vec<serde_json::Value> = self.players.values().map(|p| p.to_json()).collect();
        let scores: Option<Vec<serde_json::Value>> = self
            .scores
            .as_ref()
            .map(|s| s.iter().map(|e| e.to_json()).collect());

        serde_json::json!({
            "game_id": self.game_id,
            "phase": self.phase().as_str(),
            "players": players,
            "board": self.board.as_ref().map(|b| b.to_json()),
            "rack": self.rack,
            "tiles_left": self.tiles_left,
            "next_player": self.next_player,
            "scores": scores,
            "last_error": self.last_error,
            "message": self.message,
            "log": self.log.to_json()
        })
    }
}
