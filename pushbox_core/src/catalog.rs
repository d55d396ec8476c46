//! Static display and lighting attributes for every tile and entity kind.
//!
//! The tables are immutable statics indexed by variant, so there is exactly one
//! place where the attributes are defined and nothing can write to them.

use serde::{Deserialize, Serialize};

/// LED color byte understood by the controller.
///
/// Red intensity lives in bits 0-1, green intensity in bits 4-5, each in
/// `0..=3`. Mixing both gives amber/yellow shades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LightColor(u8);

impl LightColor {
    pub const OFF: LightColor = LightColor::new(0, 0);
    pub const RED: LightColor = LightColor::new(3, 0);
    pub const GREEN: LightColor = LightColor::new(0, 3);
    pub const AMBER: LightColor = LightColor::new(3, 3);
    pub const DIM_AMBER: LightColor = LightColor::new(1, 1);
    pub const ORANGE: LightColor = LightColor::new(3, 1);
    pub const LIME: LightColor = LightColor::new(1, 3);

    /// Packs the two intensities; values above 3 are truncated to two bits.
    pub const fn new(red: u8, green: u8) -> Self {
        LightColor((red & 0x03) | ((green & 0x03) << 4))
    }

    pub const fn red(self) -> u8 {
        self.0 & 0x03
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 4) & 0x03
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Static terrain of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Wall,
    Floor,
    Goal,
}

/// Movable occupant of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityKind {
    #[default]
    None,
    Player,
    Box,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileAttributes {
    pub passable: bool,
    pub symbol: char,
    pub color: LightColor,
}

/// `None` fields mean the entity draws no overlay and the tile shows through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityAttributes {
    pub symbol: Option<char>,
    pub color: Option<LightColor>,
}

static TILES: [TileAttributes; 3] = [
    // Wall
    TileAttributes {
        passable: false,
        symbol: '#',
        color: LightColor::DIM_AMBER,
    },
    // Floor
    TileAttributes {
        passable: true,
        symbol: ' ',
        color: LightColor::OFF,
    },
    // Goal
    TileAttributes {
        passable: true,
        symbol: 'x',
        color: LightColor::GREEN,
    },
];

static ENTITIES: [EntityAttributes; 3] = [
    // None
    EntityAttributes {
        symbol: None,
        color: None,
    },
    // Player
    EntityAttributes {
        symbol: Some('%'),
        color: Some(LightColor::RED),
    },
    // Box
    EntityAttributes {
        symbol: Some('b'),
        color: Some(LightColor::AMBER),
    },
];

impl TileKind {
    #[inline]
    pub fn attributes(self) -> &'static TileAttributes {
        &TILES[self as usize]
    }

    #[inline]
    pub fn passable(self) -> bool {
        self.attributes().passable
    }
}

impl EntityKind {
    #[inline]
    pub fn attributes(self) -> &'static EntityAttributes {
        &ENTITIES[self as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_packs_red_low_and_green_high() {
        assert_eq!(LightColor::new(3, 0).bits(), 0x03);
        assert_eq!(LightColor::new(0, 3).bits(), 0x30);
        assert_eq!(LightColor::new(2, 1).bits(), 0x12);
        let amber = LightColor::AMBER;
        assert_eq!((amber.red(), amber.green()), (3, 3));
    }

    #[test]
    fn intensities_are_truncated_to_two_bits() {
        assert_eq!(LightColor::new(7, 5).bits(), 0x13);
    }

    #[test]
    fn only_walls_block() {
        assert!(!TileKind::Wall.passable());
        assert!(TileKind::Floor.passable());
        assert!(TileKind::Goal.passable());
    }

    #[test]
    fn empty_entity_has_no_overlay() {
        let none = EntityKind::None.attributes();
        assert_eq!(none.symbol, None);
        assert_eq!(none.color, None);
        assert_eq!(EntityKind::Player.attributes().symbol, Some('%'));
        assert_eq!(EntityKind::Box.attributes().symbol, Some('b'));
    }

    #[test]
    fn defaults_match_an_unrecognized_cell() {
        assert_eq!(TileKind::default(), TileKind::Wall);
        assert_eq!(EntityKind::default(), EntityKind::None);
    }
}
