use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    Position,
    catalog::{EntityKind, TileKind},
    map::{Grid, GridError},
};

/// The 8x8 level the game ships with.
pub const REFERENCE_LEVEL: &str = concat!(
    "########", //
    "#%b   x#", //
    "# b #  #", //
    "#   #  #", //
    "#   #  #", //
    "#   #  #", //
    "#     x#", //
    "########",
);
pub const REFERENCE_WIDTH: usize = 8;
pub const REFERENCE_HEIGHT: usize = 8;

/// Fatal problems found while loading a level descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("Level descriptor ends after {found} cells, expected {expected}")]
    TruncatedDescriptor { expected: usize, found: usize },
    #[error("Level size {width}x{height} is too large")]
    DimensionOverflow { width: usize, height: usize },
    #[error("No player ('%') found in level")]
    MissingPlayer,
    #[error("Multiple players ('%') found in level: {first} and {second}")]
    MultiplePlayers { first: Position, second: Position },
}

/// Non-fatal problems found while loading; the affected cell became an empty wall.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadWarning {
    #[error("Unrecognized symbol {symbol:?} at {at}, using an empty wall")]
    UnrecognizedSymbol { symbol: char, at: Position },
}

/// One square of the board: its terrain plus at most one occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub tile: TileKind,
    pub entity: EntityKind,
}

impl Cell {
    pub const fn new(tile: TileKind, entity: EntityKind) -> Self {
        Cell { tile, entity }
    }

    /// What this cell looks like in text: the occupant if any, else the terrain.
    pub fn symbol(&self) -> char {
        self.entity
            .attributes()
            .symbol
            .unwrap_or(self.tile.attributes().symbol)
    }

    fn from_symbol(symbol: char) -> Option<Cell> {
        let cell = match symbol {
            '#' => Cell::new(TileKind::Wall, EntityKind::None),
            ' ' => Cell::new(TileKind::Floor, EntityKind::None),
            '%' => Cell::new(TileKind::Floor, EntityKind::Player),
            'b' => Cell::new(TileKind::Floor, EntityKind::Box),
            'x' => Cell::new(TileKind::Goal, EntityKind::None),
            _ => return None,
        };
        Some(cell)
    }
}

/// The puzzle state.
///
/// Exactly one cell holds the player and `player` always points at it;
/// walls are never occupied. Only level loading and the movement rules
/// write to the cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: Grid<Cell>,
    player: Position,
}

impl Board {
    #[inline]
    pub fn width(&self) -> usize {
        self.cells.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.cells.height()
    }

    #[inline]
    pub fn player(&self) -> Position {
        self.player
    }

    #[inline]
    pub fn is_inside(&self, pos: Position) -> bool {
        self.cells.contains(pos)
    }

    pub fn get_cell(&self, pos: Position) -> Result<Cell, GridError> {
        self.cells.try_get(pos).copied()
    }

    pub fn cells(&self) -> &Grid<Cell> {
        &self.cells
    }

    pub(crate) fn set_entity(&mut self, pos: Position, entity: EntityKind) {
        self.cells[pos].entity = entity;
    }

    pub(crate) fn set_player(&mut self, pos: Position) {
        self.player = pos;
    }

    /// Row-major text picture of the board, rows separated by `'\n'`.
    pub fn render_text(&self) -> String {
        let mut out = String::with_capacity((self.width() + 1) * self.height());
        for (y, row) in self.cells.rows().enumerate() {
            if y > 0 {
                out.push('\n');
            }
            out.extend(row.iter().map(Cell::symbol));
        }
        out
    }

    /// Positions of every cell matching `pred`, row-major.
    pub fn positions_where<F>(&self, mut pred: F) -> Vec<Position>
    where
        F: FnMut(&Cell) -> bool,
    {
        self.cells
            .enumerate()
            .filter_map(|(pos, cell)| pred(cell).then_some(pos))
            .collect()
    }
}

/// Loads a board from a flat descriptor of `width * height` characters.
///
/// Characters past the board size are ignored. A `'\0'` or the end of the
/// string before the board is full is fatal; an unknown symbol is not, it
/// becomes an empty wall and is reported in the returned warnings.
pub fn load_level(
    descriptor: &str,
    width: usize,
    height: usize,
) -> Result<(Board, Vec<LoadWarning>), LoadError> {
    let expected = width
        .checked_mul(height)
        .ok_or(LoadError::DimensionOverflow { width, height })?;

    let mut symbols = descriptor.chars().take_while(|&c| c != '\0');
    let mut consumed = 0;
    let mut truncated = false;
    let mut warnings = Vec::new();
    let mut player: Option<Position> = None;
    let mut second_player: Option<Position> = None;

    let cells = Grid::from_generator(width, height, |pos| {
        let Some(symbol) = symbols.next() else {
            truncated = true;
            return Cell::default();
        };
        consumed += 1;
        match Cell::from_symbol(symbol) {
            Some(cell) => {
                if cell.entity == EntityKind::Player {
                    if player.is_none() {
                        player = Some(pos);
                    } else if second_player.is_none() {
                        second_player = Some(pos);
                    }
                }
                cell
            }
            None => {
                warn!(symbol = ?symbol, x = pos.x, y = pos.y, "unrecognized level symbol");
                warnings.push(LoadWarning::UnrecognizedSymbol { symbol, at: pos });
                Cell::default()
            }
        }
    })
    .ok_or(LoadError::DimensionOverflow { width, height })?;

    if truncated {
        return Err(LoadError::TruncatedDescriptor {
            expected,
            found: consumed,
        });
    }

    let player = player.ok_or(LoadError::MissingPlayer)?;
    if let Some(second) = second_player {
        return Err(LoadError::MultiplePlayers {
            first: player,
            second,
        });
    }

    Ok((Board { cells, player }, warnings))
}
