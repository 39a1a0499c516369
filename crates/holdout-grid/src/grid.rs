//! WorldGrid: fixed-size struct-of-arrays tile store.
//!
//! Allocated once per level and mutated in place; never resized.
//! Row-major, `index = y * width + x`.

use glam::Vec2;
use tracing::trace;

use holdout_core::constants::{DEBRIS_OVERLAY_TTL_MS, TILE_SIZE};
use holdout_core::enums::{TileBase, TileEffect};
use holdout_core::types::{EntityId, TileCoord, WorldBounds};

use crate::tile::{Tile, TileFlags, TileState};

/// Packed per-tile state for the whole level.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldGrid {
    width: u32,
    height: u32,
    tile_size: f32,
    base: Vec<u8>,
    flags: Vec<u8>,
    decor: Vec<u8>,
    effect: Vec<u8>,
    effect_ttl_ms: Vec<u16>,
    state: Vec<u8>,
    hp: Vec<i16>,
    durability: Vec<u8>,
    usage: Vec<u16>,
    /// Weak references for spatial queries; rebuilt by the simulation each step.
    occupants: Vec<Vec<EntityId>>,
    /// Indices with a live overlay, so `tick` never scans the full grid.
    live_effects: Vec<usize>,
    /// Membership flags for `live_effects`, one per tile.
    effect_tracked: Vec<bool>,
    dirty: Vec<bool>,
    dirty_list: Vec<TileCoord>,
}

impl WorldGrid {
    /// Allocate an all-`Empty` grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_tile_size(width, height, TILE_SIZE)
    }

    pub fn with_tile_size(width: u32, height: u32, tile_size: f32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            tile_size,
            base: vec![TileBase::Empty as u8; len],
            flags: vec![0; len],
            decor: vec![0; len],
            effect: vec![0; len],
            effect_ttl_ms: vec![0; len],
            state: vec![0; len],
            hp: vec![0; len],
            durability: vec![0; len],
            usage: vec![0; len],
            occupants: vec![Vec::new(); len],
            live_effects: Vec::new(),
            effect_tracked: vec![false; len],
            dirty: vec![false; len],
            dirty_list: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Total number of tiles.
    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// World-space extent of the grid.
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::new(
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    fn coord_of(&self, idx: usize) -> TileCoord {
        let w = self.width as usize;
        TileCoord::new((idx % w) as u32, (idx / w) as u32)
    }

    /// Tile containing a world position, or `None` outside the grid.
    pub fn world_to_tile(&self, pos: Vec2) -> Option<TileCoord> {
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let x = (pos.x / self.tile_size).floor() as i32;
        let y = (pos.y / self.tile_size).floor() as i32;
        self.index(x, y).map(|_| TileCoord::new(x as u32, y as u32))
    }

    /// World-space center of a tile.
    pub fn tile_center(&self, coord: TileCoord) -> Vec2 {
        Vec2::new(
            (coord.x as f32 + 0.5) * self.tile_size,
            (coord.y as f32 + 0.5) * self.tile_size,
        )
    }

    // --- Tile read/write ---

    pub fn tile(&self, x: i32, y: i32) -> Option<Tile> {
        let i = self.index(x, y)?;
        Some(Tile {
            base: TileBase::from_u8(self.base[i]),
            flags: TileFlags(self.flags[i]),
            decor: self.decor[i],
            effect: TileEffect::from_u8(self.effect[i]),
            effect_ttl_ms: self.effect_ttl_ms[i],
            state: TileState(self.state[i]),
            hp: self.hp[i],
            durability: self.durability[i],
            usage: self.usage[i],
        })
    }

    /// Overwrite a tile. Returns false outside the grid.
    pub fn set_tile(&mut self, x: i32, y: i32, tile: Tile) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        self.write(i, tile);
        true
    }

    fn write(&mut self, i: usize, tile: Tile) {
        self.base[i] = tile.base as u8;
        self.flags[i] = tile.flags.0;
        self.decor[i] = tile.decor;
        self.state[i] = tile.state.0;
        self.hp[i] = tile.hp;
        self.durability[i] = tile.durability;
        self.usage[i] = tile.usage;
        self.write_effect(i, tile.effect, tile.effect_ttl_ms);
        self.mark_dirty_index(i);
    }

    fn write_effect(&mut self, i: usize, effect: TileEffect, ttl_ms: u16) {
        self.effect[i] = effect as u8;
        self.effect_ttl_ms[i] = ttl_ms;
        // A cleared tile stays listed until the next tick; never list it twice.
        if effect != TileEffect::None && !self.effect_tracked[i] {
            self.effect_tracked[i] = true;
            self.live_effects.push(i);
        }
    }

    /// Paint every tile with the same value. Used by level generation.
    pub fn fill(&mut self, tile: Tile) {
        self.live_effects.clear();
        self.effect_tracked.fill(false);
        for i in 0..self.len() {
            self.effect[i] = TileEffect::None as u8;
            self.write(i, tile);
        }
    }

    /// Turn a tile into open floor.
    pub fn set_floor(&mut self, x: i32, y: i32) -> bool {
        self.set_tile(x, y, Tile::floor())
    }

    /// Place a wall with the given durability (hp starts at durability).
    pub fn place_wall(&mut self, x: i32, y: i32, durability: u8) -> bool {
        self.set_tile(x, y, Tile::wall(durability))
    }

    pub fn base(&self, x: i32, y: i32) -> Option<TileBase> {
        self.index(x, y).map(|i| TileBase::from_u8(self.base[i]))
    }

    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.index(x, y)
            .is_some_and(|i| TileFlags(self.flags[i]).walkable())
    }

    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.index(x, y)
            .is_some_and(|i| TileFlags(self.flags[i]).blocked())
    }

    pub fn blocks_los(&self, x: i32, y: i32) -> bool {
        self.index(x, y)
            .is_some_and(|i| TileFlags(self.flags[i]).blocks_los())
    }

    /// Whether the tile under a world position can be walked on.
    pub fn is_walkable_at(&self, pos: Vec2) -> bool {
        self.world_to_tile(pos)
            .is_some_and(|c| self.is_walkable(c.x as i32, c.y as i32))
    }

    /// Whether the tile is a wall that can still be damaged.
    pub fn is_destructible(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|i| {
            self.base[i] == TileBase::Wall as u8
                && self.durability[i] < holdout_core::constants::INDESTRUCTIBLE_DURABILITY
        })
    }

    // --- Walls ---

    /// Apply damage to a wall tile. Returns true if the wall was destroyed.
    ///
    /// Indestructible tiles (durability >= 200), non-wall tiles and
    /// out-of-bounds coordinates never take damage.
    pub fn damage_wall_tile(&mut self, x: i32, y: i32, amount: i32) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        if self.base[i] != TileBase::Wall as u8 || amount <= 0 {
            return false;
        }
        if self.durability[i] >= holdout_core::constants::INDESTRUCTIBLE_DURABILITY {
            return false;
        }

        let remaining = (self.hp[i] as i32 - amount).max(i16::MIN as i32) as i16;
        self.hp[i] = remaining;
        self.state[i] |= TileState::CRACKED;
        self.mark_dirty_index(i);
        trace!(x, y, remaining, "wall damaged");

        if remaining > 0 {
            return false;
        }

        self.base[i] = TileBase::Floor as u8;
        self.flags[i] = TileFlags::open().0;
        self.hp[i] = 0;
        self.durability[i] = 0;
        self.state[i] &= !TileState::CRACKED;
        self.write_effect(i, TileEffect::Debris, DEBRIS_OVERLAY_TTL_MS);
        true
    }

    // --- Overlays and state ---

    /// Set a transient overlay with a time-to-live in milliseconds.
    pub fn set_effect(&mut self, x: i32, y: i32, effect: TileEffect, ttl_ms: u16) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        self.write_effect(i, effect, ttl_ms);
        self.mark_dirty_index(i);
        true
    }

    pub fn set_state_bits(&mut self, x: i32, y: i32, bits: u8) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        self.state[i] |= bits;
        self.mark_dirty_index(i);
        true
    }

    pub fn clear_state_bits(&mut self, x: i32, y: i32, bits: u8) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        self.state[i] &= !bits;
        self.mark_dirty_index(i);
        true
    }

    pub fn set_decor(&mut self, x: i32, y: i32, decor: u8) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        self.decor[i] = decor;
        self.mark_dirty_index(i);
        true
    }

    /// Advance overlay lifetimes; expired overlays are cleared.
    pub fn tick(&mut self, delta_ms: u32) {
        let step = delta_ms.min(u16::MAX as u32) as u16;
        let mut live = std::mem::take(&mut self.live_effects);
        live.retain(|&i| {
            if self.effect[i] == TileEffect::None as u8 {
                self.effect_tracked[i] = false;
                return false;
            }
            let ttl = self.effect_ttl_ms[i].saturating_sub(step);
            self.effect_ttl_ms[i] = ttl;
            if ttl == 0 {
                self.effect[i] = TileEffect::None as u8;
                self.effect_tracked[i] = false;
                self.mark_dirty_index(i);
                return false;
            }
            true
        });
        self.live_effects = live;
    }

    /// Number of tiles currently carrying an overlay.
    pub fn live_effect_count(&self) -> usize {
        self.live_effects.len()
    }

    // --- Dirty tracking ---

    fn mark_dirty_index(&mut self, i: usize) {
        if !self.dirty[i] {
            self.dirty[i] = true;
            let coord = self.coord_of(i);
            self.dirty_list.push(coord);
        }
    }

    pub fn mark_dirty(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.mark_dirty_index(i);
        }
    }

    /// Take every tile changed since the previous drain.
    pub fn drain_dirty(&mut self) -> Vec<TileCoord> {
        let drained = std::mem::take(&mut self.dirty_list);
        for c in &drained {
            let i = c.y as usize * self.width as usize + c.x as usize;
            self.dirty[i] = false;
        }
        drained
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty_list.len()
    }

    // --- Presentation ---

    /// Display color of a tile (0xRRGGBB). Overlays tint, cracks darken.
    pub fn tile_color(&self, x: i32, y: i32) -> u32 {
        let Some(i) = self.index(x, y) else {
            return 0;
        };
        let mut color = TileBase::from_u8(self.base[i]).color();
        if let Some(tint) = TileEffect::from_u8(self.effect[i]).tint() {
            color = blend(color, tint);
        }
        let state = TileState(self.state[i]);
        if state.has(TileState::BURNING) {
            color = blend(color, 0xc8461e);
        }
        if state.has(TileState::POISONED) {
            color = blend(color, 0x6a9c2f);
        }
        if state.has(TileState::WET) {
            color = blend(color, 0x2f5f9c);
        }
        if state.has(TileState::CRACKED) {
            color = darken(color);
        }
        color
    }

    // --- Occupancy ---

    pub fn clear_occupants(&mut self) {
        for list in &mut self.occupants {
            list.clear();
        }
    }

    /// Register an entity as occupying the tile under `pos`.
    pub fn add_occupant(&mut self, pos: Vec2, id: EntityId) {
        if let Some(c) = self.world_to_tile(pos) {
            let i = c.y as usize * self.width as usize + c.x as usize;
            self.occupants[i].push(id);
        }
    }

    pub fn occupants(&self, x: i32, y: i32) -> &[EntityId] {
        match self.index(x, y) {
            Some(i) => &self.occupants[i],
            None => &[],
        }
    }

    // --- Queries ---

    /// Nearest walkable, unblocked tile within a square search radius.
    /// Ties break by scan order, so the result is deterministic.
    pub fn nearest_walkable(&self, from: TileCoord, radius: i32) -> Option<TileCoord> {
        let (fx, fy) = (from.x as i32, from.y as i32);
        if self.is_walkable(fx, fy) && !self.is_blocked(fx, fy) {
            return Some(from);
        }
        let mut best: Option<(i64, TileCoord)> = None;
        for ring in 1..=radius.max(0) {
            for dy in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs() != ring && dy.abs() != ring {
                        continue;
                    }
                    let (x, y) = (fx + dx, fy + dy);
                    if !self.is_walkable(x, y) || self.is_blocked(x, y) {
                        continue;
                    }
                    let c = TileCoord::new(x as u32, y as u32);
                    let d = from.distance_sq(&c);
                    if best.is_none_or(|(bd, _)| d < bd) {
                        best = Some((d, c));
                    }
                }
            }
            if best.is_some() {
                break;
            }
        }
        best.map(|(_, c)| c)
    }
}

fn blend(a: u32, b: u32) -> u32 {
    let ch = |c: u32, shift: u32| (c >> shift) & 0xff;
    let mix = |shift: u32| ((ch(a, shift) + ch(b, shift)) / 2) << shift;
    mix(16) | mix(8) | mix(0)
}

fn darken(c: u32) -> u32 {
    let ch = |shift: u32| (((c >> shift) & 0xff) * 3 / 4) << shift;
    ch(16) | ch(8) | ch(0)
}
