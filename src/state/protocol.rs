//! Wire protocol.
//!
//! Outbound actions are JSON objects carrying the game id, the client's
//! auth token and an `action` tag. Inbound messages are partial snapshots:
//! every key is optional and absent keys mean "unchanged".

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

/// 1-based seat number assigned by the server.
pub type PlayerNumber = u32;

/// Board position, `0..BOARD_CELLS`.
pub type CellIndex = usize;

/// A symbol as it may appear on the wire: usually a one-character string,
/// occasionally a bare number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireSymbol {
    Text(String),
    Number(i64),
}

impl From<WireSymbol> for String {
    fn from(symbol: WireSymbol) -> Self {
        match symbol {
            WireSymbol::Text(s) => s,
            WireSymbol::Number(n) => n.to_string(),
        }
    }
}

/// A placed or captured tile. Encoded as `[owner, symbol]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(PlayerNumber, WireSymbol)", into = "(PlayerNumber, String)")]
pub struct Tile {
    /// Owning player, 0 for unowned
    pub owner: PlayerNumber,
    pub symbol: String,
}

impl Tile {
    pub fn new(owner: PlayerNumber, symbol: impl Into<String>) -> Self {
        Self {
            owner,
            symbol: symbol.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!([self.owner, self.symbol])
    }
}

impl From<(PlayerNumber, WireSymbol)> for Tile {
    fn from((owner, symbol): (PlayerNumber, WireSymbol)) -> Self {
        Self {
            owner,
            symbol: symbol.into(),
        }
    }
}

impl From<Tile> for (PlayerNumber, String) {
    fn from(tile: Tile) -> Self {
        (tile.owner, tile.symbol)
    }
}

/// One line of the final standings: `[[winners...], groups, captured]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(Vec<PlayerNumber>, u32, u32)")]
pub struct ScoreEntry {
    pub players: Vec<PlayerNumber>,
    pub groups: u32,
    pub captured: u32,
}

impl From<(Vec<PlayerNumber>, u32, u32)> for ScoreEntry {
    fn from((players, groups, captured): (Vec<PlayerNumber>, u32, u32)) -> Self {
        Self {
            players,
            groups,
            captured,
        }
    }
}

impl ScoreEntry {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!([self.players, self.groups, self.captured])
    }
}

/// Per-player fields of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlayerUpdate {
    pub name: Option<String>,

    /// Present (and true) only on the receiving client's own record
    #[serde(rename = "self")]
    pub is_self: Option<bool>,

    pub captured: Option<Vec<Tile>>,

    /// Cell the player last placed a tile on
    pub last: Option<CellIndex>,
}

/// Board as sent by the server.
///
/// The server normally sends a sparse object keyed by cell index, but a
/// dense array of `null | [owner, symbol]` is accepted too. Sparse keys stay
/// strings here; integer keys do not survive untagged buffering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BoardUpdate {
    Dense(Vec<Option<Tile>>),
    Sparse(BTreeMap<String, Tile>),
}

/// Inbound server message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Snapshot {
    pub error: Option<String>,

    pub message: Option<String>,

    #[serde(rename = "gameid")]
    pub game_id: Option<String>,

    #[serde(rename = "authtoken")]
    pub auth_token: Option<String>,

    pub players: Option<BTreeMap<PlayerNumber, PlayerUpdate>>,

    pub board: Option<BoardUpdate>,

    #[serde(default, deserialize_with = "deserialize_rack")]
    pub rack: Option<Vec<String>>,

    #[serde(rename = "tilesleft")]
    pub tiles_left: Option<u32>,

    #[serde(rename = "nextplayer")]
    pub next_player: Option<PlayerNumber>,

    pub scores: Option<Vec<ScoreEntry>>,
}

fn deserialize_rack<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<WireSymbol>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|symbols| symbols.into_iter().map(String::from).collect()))
}

/// Outbound action and its action-specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    /// Request the current snapshot
    Get,
    Join { name: String },
    Leave,
    Start,
    Move { tile: String, location: CellIndex },
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Join { .. } => "join",
            Self::Leave => "leave",
            Self::Start => "start",
            Self::Move { .. } => "move",
        }
    }
}

/// A complete outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    #[serde(rename = "gameid")]
    pub game_id: String,

    #[serde(rename = "authtoken")]
    pub auth_token: String,

    #[serde(flatten)]
    pub action: Action,
}

impl OutboundMessage {
    pub fn new(game_id: impl Into<String>, auth_token: impl Into<String>, action: Action) -> Self {
        Self {
            game_id: game_id.into(),
            auth_token: auth_token.into(),
            action,
        }
    }
}

/// Encode an outbound message as a JSON text frame.
pub fn encode(message: &OutboundMessage) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Decode an inbound JSON text frame.
pub fn decode(raw: &str) -> Result<Snapshot> {
    Ok(serde_json::from_str(raw)?)
}
