//! Tile value type and its bit sets.

use serde::{Deserialize, Serialize};

use holdout_core::constants::INDESTRUCTIBLE_DURABILITY;
use holdout_core::enums::{TileBase, TileEffect};

/// Movement/visibility bits. Independent of each other and of the base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileFlags(pub u8);

impl TileFlags {
    pub const WALKABLE: u8 = 1 << 0;
    pub const BLOCKED: u8 = 1 << 1;
    pub const BLOCKS_LOS: u8 = 1 << 2;

    pub fn walkable(self) -> bool {
        self.0 & Self::WALKABLE != 0
    }

    pub fn blocked(self) -> bool {
        self.0 & Self::BLOCKED != 0
    }

    pub fn blocks_los(self) -> bool {
        self.0 & Self::BLOCKS_LOS != 0
    }

    /// Flags of an open floor tile.
    pub fn open() -> Self {
        Self(Self::WALKABLE)
    }

    /// Flags of a solid wall tile.
    pub fn solid() -> Self {
        Self(Self::BLOCKED | Self::BLOCKS_LOS)
    }
}

/// Persistent condition bits (burning, poisoned, wet, cracked).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileState(pub u8);

impl TileState {
    pub const BURNING: u8 = 1 << 0;
    pub const POISONED: u8 = 1 << 1;
    pub const WET: u8 = 1 << 2;
    pub const CRACKED: u8 = 1 << 3;

    pub fn has(self, bit: u8) -> bool {
        self.0 & bit != 0
    }
}

/// Unpacked view of one grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub base: TileBase,
    pub flags: TileFlags,
    /// Cosmetic overlay index (0 = none).
    pub decor: u8,
    pub effect: TileEffect,
    /// Remaining overlay lifetime in milliseconds.
    pub effect_ttl_ms: u16,
    pub state: TileState,
    /// Remaining wall durability. Signed so overkill is visible before clamping.
    pub hp: i16,
    /// Max hp class. Values at or above 200 mark the tile indestructible.
    pub durability: u8,
    /// Reserved counter.
    pub usage: u16,
}

impl Tile {
    pub fn floor() -> Self {
        Self {
            base: TileBase::Floor,
            flags: TileFlags::open(),
            ..Default::default()
        }
    }

    pub fn wall(durability: u8) -> Self {
        Self {
            base: TileBase::Wall,
            flags: TileFlags::solid(),
            hp: durability as i16,
            durability,
            ..Default::default()
        }
    }

    pub fn is_indestructible(&self) -> bool {
        self.durability >= INDESTRUCTIBLE_DURABILITY
    }
}
