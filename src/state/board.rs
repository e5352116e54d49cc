//! Board mirror.
//!
//! The board is a 9x9 grid of cells, each either empty or holding a tile.
//! The client never decides what goes where; it only stores what the server
//! sends.

use super::protocol::{BoardUpdate, CellIndex, Tile};
use crate::error::{ClientError, Result};

/// Cells per row and per column.
pub const BOARD_SIDE: usize = 9;

/// Total number of cells.
pub const BOARD_CELLS: usize = BOARD_SIDE * BOARD_SIDE;

/// Decorative symbols shown on empty cells, indexed by
/// `[column block][row block]`.
const DECORATIONS: [[char; 3]; 3] = [['~', '#', '^'], ['!', '?', '&'], ['@', '%', '*']];

/// Fixed decorative symbol for an empty cell.
///
/// Returns `None` for positions off the board.
pub fn decoration(index: CellIndex) -> Option<char> {
    if index >= BOARD_CELLS {
        return None;
    }
    let row = index / BOARD_SIDE;
    let column_block = (index % BOARD_SIDE) / 3;
    Some(DECORATIONS[column_block][row / 3])
}

/// Board position as (row, column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn from_index(index: CellIndex) -> Option<Self> {
        (index < BOARD_CELLS).then(|| Self::new(index / BOARD_SIDE, index % BOARD_SIDE))
    }

    /// Check if position is valid (within board bounds).
    pub fn is_valid(&self) -> bool {
        self.row < BOARD_SIDE && self.col < BOARD_SIDE
    }

    pub fn index(&self) -> Option<CellIndex> {
        self.is_valid().then(|| self.row * BOARD_SIDE + self.col)
    }
}

/// A single board cell.
pub type Cell = Option<Tile>;

/// The 81-cell board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Cell>,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            cells: vec![None; BOARD_CELLS],
        }
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from its wire form.
    pub fn from_update(update: BoardUpdate) -> Result<Self> {
        let mut board = Self::new();
        match update {
            BoardUpdate::Dense(cells) => {
                if cells.len() > BOARD_CELLS {
                    return Err(ClientError::MalformedSnapshot(format!(
                        "board has {} cells",
                        cells.len()
                    )));
                }
                for (index, cell) in cells.into_iter().enumerate() {
                    board.cells[index] = cell;
                }
            }
            BoardUpdate::Sparse(cells) => {
                for (key, tile) in cells {
                    let index: CellIndex = key.parse().map_err(|_| {
                        ClientError::MalformedSnapshot(format!("board key {:?} is not a cell", key))
                    })?;
                    if index >= BOARD_CELLS {
                        return Err(ClientError::MalformedSnapshot(format!(
                            "board cell {} is off the board",
                            index
                        )));
                    }
                    board.cells[index] = Some(tile);
                }
            }
        }
        Ok(board)
    }

    /// Get the tile at a cell, if any.
    pub fn get(&self, index: CellIndex) -> Option<&Tile> {
        self.cells.get(index).and_then(|c| c.as_ref())
    }

    pub fn get_at(&self, pos: Position) -> Option<&Tile> {
        pos.index().and_then(|i| self.get(i))
    }

    pub fn is_empty_cell(&self, index: CellIndex) -> bool {
        index < BOARD_CELLS && self.cells[index].is_none()
    }

    /// Symbol to show for a cell: the tile's symbol, or the cell's decoration.
    pub fn display_symbol(&self, index: CellIndex) -> Option<String> {
        match self.get(index) {
            Some(tile) => Some(tile.symbol.clone()),
            None => decoration(index).map(String::from),
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Occupied cells as a sparse object keyed by index, matching the wire form.
    pub fn to_json(&self) -> serde_json::Value {
        let cells: serde_json::Map<String, serde_json::Value> = self
            .cells
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|t| (i.to_string(), t.to_json())))
            .collect();
        serde_json::Value::Object(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    #[test]
    fn test_decorations() {
        assert_eq!(decoration(0), Some('~'));
        assert_eq!(decoration(3), Some('!'));
        assert_eq!(decoration(8), Some('@'));
        assert_eq!(decoration(27), Some('#'));
        assert_eq!(decoration(40), Some('?'));
        assert_eq!(decoration(80), Some('*'));
        assert_eq!(decoration(81), None);
    }

    #[test]
    fn test_position_index() {
        let pos = Position::from_index(40).unwrap();
        assert_eq!(pos, Position::new(4, 4));
        assert_eq!(pos.index(), Some(40));
        assert!(Position::from_index(81).is_none());
        assert_eq!(Position::new(9, 0).index(), None);
    }

    #[test]
    fn test_from_sparse() {
        let mut cells = BTreeMap::new();
        cells.insert("5".to_string(), Tile::new(2, "A"));
        let board = Board::from_update(BoardUpdate::Sparse(cells)).unwrap();

        assert_eq!(board.get(5), Some(&Tile::new(2, "A")));
        assert_eq!(board.occupied_count(), 1);
        assert_eq!(board.display_symbol(5).as_deref(), Some("A"));
        assert_eq!(board.display_symbol(0).as_deref(), Some("~"));
        assert!(board.is_empty_cell(0));
        assert!(!board.is_empty_cell(5));
    }

    #[test]
    fn test_from_dense_pads_short_boards() {
        let board =
            Board::from_update(BoardUpdate::Dense(vec![None, Some(Tile::new(1, "9"))])).unwrap();
        assert_eq!(board.cells().len(), BOARD_CELLS);
        assert_eq!(board.get_at(Position::new(0, 1)), Some(&Tile::new(1, "9")));
    }

    #[test]
    fn test_rejects_off_board_cells() {
        let mut cells = BTreeMap::new();
        cells.insert("81".to_string(), Tile::new(1, "A"));
        assert!(Board::from_update(BoardUpdate::Sparse(cells)).is_err());

        let mut cells = BTreeMap::new();
        cells.insert("middle".to_string(), Tile::new(1, "A"));
        assert!(Board::from_update(BoardUpdate::Sparse(cells)).is_err());

        let dense = vec![None; BOARD_CELLS + 1];
        assert!(Board::from_update(BoardUpdate::Dense(dense)).is_err());
    }

    #[test]
    fn test_to_json() {
        let mut cells = BTreeMap::new();
        cells.insert("12".to_string(), Tile::new(3, "#"));
        let board = Board::from_update(BoardUpdate::Sparse(cells)).unwrap();
        assert_eq!(board.to_json(), serde_json::json!({"12": [3, "#"]}));
    }
}
