//! Tile selection state machine.
//!
//! Tracks which rack tile the user has marked for placement. The server
//! knows nothing about this; it is purely local interaction state.
//!
//! # State Diagram
//!
//! ```text
//!                  pick
//! ┌──────────┐ ──────────────▶ ┌──────────┐
//! │ Playable │                 │ Selected │
//! └──────────┘ ◀────────────── └──────────┘
//!               pick (again) /
//!               release / submit
//!
//! ┌──────────┐
//! │  Inert   │  board tiles: every event is rejected
//! └──────────┘
//! ```
//!
//! Picking a tile while another is selected releases the previous holder
//! first, so at most one tile is `Selected` at any time.

use std::fmt;

use super::protocol::CellIndex;

/// State of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileState {
    /// On the rack, not selected
    #[default]
    Playable,

    /// Marked for the next move
    Selected,

    /// Placed on the board; not interactive
    Inert,
}

impl TileState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Playable => "playable",
            Self::Selected => "selected",
            Self::Inert => "inert",
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected)
    }
}

impl fmt::Display for TileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events applied to a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileEvent {
    /// User tapped the tile
    Pick,
    /// Another tile took the selection
    Release,
    /// A move using this tile was transmitted
    Submit,
}

/// Error when a tile transition is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: TileState,
    pub event: TileEvent,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid tile transition from {} via {:?}: {}",
            self.from, self.event, self.reason
        )
    }
}

impl std::error::Error for InvalidTransition {}

/// Calculate the next state of a tile for an event.
pub fn transition(from: TileState, event: TileEvent) -> Result<TileState, InvalidTransition> {
    use TileEvent::*;
    use TileState::*;

    let invalid = |reason: &'static str| InvalidTransition {
        from,
        event,
        reason,
    };

    match (from, event) {
        (Inert, _) => Err(invalid("Tile is not on your rack")),

        (Playable, Pick) => Ok(Selected),
        (Selected, Pick) => Ok(Playable),

        (Selected, Release) => Ok(Playable),
        (Playable, Release) => Err(invalid("Tile is not selected")),

        (Selected, Submit) => Ok(Playable),
        (Playable, Submit) => Err(invalid("Tile is not selected")),
    }
}

/// Reference to a tile the user interacted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileRef {
    /// Slot on the user's own rack
    Rack(usize),
    /// Tile already placed on the board
    Board(CellIndex),
}

/// Result of a `select` call, for the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    /// `slot` now holds the selection; `previous` was released to make room
    Selected {
        slot: usize,
        symbol: String,
        previous: Option<usize>,
    },
    /// The selected tile was picked again and released
    Cleared { slot: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RackTile {
    symbol: String,
    state: TileState,
}

/// Selection state for the user's rack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    tiles: Vec<RackTile>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a selection over a rack with nothing selected.
    pub fn from_rack(rack: &[String]) -> Self {
        Self {
            tiles: rack
                .iter()
                .map(|symbol| RackTile {
                    symbol: symbol.clone(),
                    state: TileState::Playable,
                })
                .collect(),
        }
    }

    /// State of a referenced tile.
    pub fn state(&self, tile: TileRef) -> TileState {
        match tile {
            TileRef::Rack(slot) => self
                .tiles
                .get(slot)
                .map(|t| t.state)
                .unwrap_or(TileState::Inert),
            TileRef::Board(_) => TileState::Inert,
        }
    }

    /// Handle a user pick.
    ///
    /// Re-picking the selected tile releases it. Picking a different tile
    /// releases the current holder before selecting the new one.
    pub fn select(&mut self, tile: TileRef) -> Result<SelectionChange, InvalidTransition> {
        let slot = match tile {
            TileRef::Rack(slot) if slot < self.tiles.len() => slot,
            _ => {
                return Err(InvalidTransition {
                    from: TileState::Inert,
                    event: TileEvent::Pick,
                    reason: "Tile is not on your rack",
                })
            }
        };

        if self.tiles[slot].state.is_selected() {
            self.tiles[slot].state = transition(TileState::Selected, TileEvent::Pick)?;
            return Ok(SelectionChange::Cleared { slot });
        }

        let previous = self.release_all(TileEvent::Release).into_iter().next();
        let next = transition(self.tiles[slot].state, TileEvent::Pick)?;
        self.tiles[slot].state = next;

        Ok(SelectionChange::Selected {
            slot,
            symbol: self.tiles[slot].symbol.clone(),
            previous,
        })
    }

    /// Release any selection.
    pub fn deselect(&mut self) -> Vec<usize> {
        self.release_all(TileEvent::Release)
    }

    /// Clear the selection after a move was sent.
    pub fn submit(&mut self) -> Vec<usize> {
        self.release_all(TileEvent::Submit)
    }

    fn release_all(&mut self, event: TileEvent) -> Vec<usize> {
        let mut released = Vec::new();
        for (slot, tile) in self.tiles.iter_mut().enumerate() {
            if tile.state.is_selected() {
                if let Ok(next) = transition(tile.state, event) {
                    tile.state = next;
                    released.push(slot);
                }
            }
        }
        released
    }

    /// Slots currently selected. More than one means the invariant broke.
    pub fn selected_slots(&self) -> Vec<usize> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.state.is_selected())
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Symbol of the single selected tile, if exactly one is selected.
    pub fn selected_symbol(&self) -> Option<&str> {
        match self.selected_slots().as_slice() {
            [slot] => Some(self.tiles[*slot].symbol.as_str()),
            _ => None,
        }
    }

    /// Replace the rack contents after a snapshot.
    ///
    /// The selection survives only if its slot still holds the same symbol.
    /// Returns true if a selection was dropped.
    pub fn sync_rack(&mut self, rack: &[String]) -> bool {
        let kept = self
            .selected_slots()
            .into_iter()
            .find(|&slot| {
                rack.get(slot)
                    .is_some_and(|symbol| *symbol == self.tiles[slot].symbol)
            });
        let had_selection = !self.selected_slots().is_empty();

        *self = Self::from_rack(rack);
        if let Some(slot) = kept {
            self.tiles[slot].state = TileState::Selected;
        }

        had_selection && kept.is_none()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let tiles: Vec<serde_json::Value> = self
            .tiles
            .iter()
            .map(|t| serde_json::json!({"symbol": t.symbol, "state": t.state.as_str()}))
            .collect();
        serde_json::Value::Array(tiles)
    }

    #[cfg(test)]
    pub(crate) fn force_selected(&mut self, slot: usize) {
        self.tiles[slot].state = TileState::Selected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rack(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_initial_state() {
        let selection = Selection::from_rack(&rack(&["A", "3", "~"]));
        assert_eq!(selection.len(), 3);
        assert!(selection.selected_slots().is_empty());
        assert_eq!(selection.state(TileRef::Rack(0)), TileState::Playable);
        assert_eq!(selection.state(TileRef::Board(10)), TileState::Inert);
    }

    #[test]
    fn test_pick_and_repick() {
        let mut selection = Selection::from_rack(&rack(&["A", "3"]));

        let change = selection.select(TileRef::Rack(1)).unwrap();
        assert_eq!(
            change,
            SelectionChange::Selected {
                slot: 1,
                symbol: "3".to_string(),
                previous: None
            }
        );
        assert_eq!(selection.selected_symbol(), Some("3"));

        let change = selection.select(TileRef::Rack(1)).unwrap();
        assert_eq!(change, SelectionChange::Cleared { slot: 1 });
        assert_eq!(selection.selected_symbol(), None);
    }

    #[test]
    fn test_pick_other_releases_previous() {
        let mut selection = Selection::from_rack(&rack(&["A", "3", "~"]));

        selection.select(TileRef::Rack(0)).unwrap();
        let change = selection.select(TileRef::Rack(2)).unwrap();

        assert_eq!(
            change,
            SelectionChange::Selected {
                slot: 2,
                symbol: "~".to_string(),
                previous: Some(0)
            }
        );
        assert_eq!(selection.selected_slots(), vec![2]);
        assert_eq!(selection.state(TileRef::Rack(0)), TileState::Playable);
    }

    #[test]
    fn test_at_most_one_selected() {
        let mut selection = Selection::from_rack(&rack(&["1", "2", "3", "4", "5"]));
        for slot in [0, 3, 3, 1, 4, 2, 2, 0, 1] {
            selection.select(TileRef::Rack(slot)).unwrap();
            assert!(selection.selected_slots().len() <= 1);
        }
    }

    #[test]
    fn test_board_tiles_are_inert() {
        let mut selection = Selection::from_rack(&rack(&["A"]));
        let err = selection.select(TileRef::Board(4)).unwrap_err();
        assert_eq!(err.from, TileState::Inert);
        assert!(selection.select(TileRef::Rack(7)).is_err());
    }

    #[test]
    fn test_submit_clears() {
        let mut selection = Selection::from_rack(&rack(&["A", "B"]));
        selection.select(TileRef::Rack(1)).unwrap();

        assert_eq!(selection.submit(), vec![1]);
        assert!(selection.selected_slots().is_empty());
        assert!(selection.submit().is_empty());
    }

    #[test]
    fn test_transitions() {
        assert_eq!(
            transition(TileState::Playable, TileEvent::Pick),
            Ok(TileState::Selected)
        );
        assert!(transition(TileState::Playable, TileEvent::Release).is_err());
        assert!(transition(TileState::Playable, TileEvent::Submit).is_err());
        assert!(transition(TileState::Inert, TileEvent::Pick).is_err());
    }

    #[test]
    fn test_sync_rack_keeps_matching_selection() {
        let mut selection = Selection::from_rack(&rack(&["A", "B", "C"]));
        selection.select(TileRef::Rack(1)).unwrap();

        let dropped = selection.sync_rack(&rack(&["X", "B", "C", "D"]));
        assert!(!dropped);
        assert_eq!(selection.selected_symbol(), Some("B"));
        assert_eq!(selection.len(), 4);
    }

    #[test]
    fn test_sync_rack_drops_stale_selection() {
        let mut selection = Selection::from_rack(&rack(&["A", "B"]));
        selection.select(TileRef::Rack(1)).unwrap();

        let dropped = selection.sync_rack(&rack(&["A"]));
        assert!(dropped);
        assert!(selection.selected_slots().is_empty());
    }

    #[test]
    fn test_display() {
        let err = transition(TileState::Inert, TileEvent::Pick).unwrap_err();
        assert_eq!(
            format!("{}", err),
            "Invalid tile transition from inert via Pick: Tile is not on your rack"
        );
    }
}
