//! Seeded level generator with a reachability retry loop.

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use holdout_core::constants::{BORDER_DURABILITY, GENERATION_RETRY_PRIME, MAX_OBSTACLE_BLOBS};
use holdout_core::types::TileCoord;
use holdout_grid::{Tile, WorldGrid};

use crate::config::GenerationConfig;
use crate::connectivity::flood_fill;

/// Outcome of [`generate`]. Degraded connectivity is reported, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Seed of the attempt whose grid was kept.
    pub seed_used: u64,
    /// Attempts made (1-based).
    pub attempts: u32,
    /// Whether the connectivity threshold was met.
    pub accepted: bool,
    /// Spawn tile actually used (after clamping).
    pub spawn: TileCoord,
    /// Reachable tiles from spawn / total tiles.
    pub reachable_ratio: f32,
    /// Walkable tiles / total tiles.
    pub walkable_ratio: f32,
    pub reachable_count: usize,
    pub walkable_tiles: Vec<TileCoord>,
    pub obstacle_tiles: Vec<TileCoord>,
    /// One flag per tile (row-major), true where movement is blocked.
    pub collision: Vec<bool>,
    /// Walkable tiles outside the expanded safe zone whose four
    /// cardinal neighbours are walkable too.
    pub spawnable_tiles: Vec<TileCoord>,
}

/// Generate a level into `grid`.
///
/// Retries with `seed + attempt * GENERATION_RETRY_PRIME` until the
/// reachable ratio meets `required_connected_ratio` or `max_attempts` is
/// exhausted, in which case the final attempt's grid is kept.
pub fn generate(grid: &mut WorldGrid, config: &GenerationConfig) -> GenerationResult {
    let spawn = clamp_spawn(grid, config.spawn);
    let total = grid.len().max(1);
    let max_attempts = config.max_attempts.max(1);

    let mut attempts = 0;
    let mut seed_used = config.seed;
    let mut reachable = Vec::new();
    let mut accepted = false;

    for attempt in 0..max_attempts {
        attempts = attempt + 1;
        seed_used = config
            .seed
            .wrapping_add(attempt as u64 * GENERATION_RETRY_PRIME);
        let mut rng = ChaCha8Rng::seed_from_u64(seed_used);

        build_level(grid, config, spawn, &mut rng);

        reachable = flood_fill(grid, spawn);
        let count = reachable.iter().filter(|&&v| v).count();
        let ratio = count as f32 / total as f32;
        debug!(attempt, seed = seed_used, ratio, "generation attempt");
        if ratio >= config.required_connected_ratio {
            accepted = true;
            break;
        }
    }

    let result = summarize(grid, config, spawn, &reachable, seed_used, attempts, accepted);
    if accepted {
        info!(
            seed = result.seed_used,
            attempts = result.attempts,
            reachable_ratio = result.reachable_ratio,
            walkable_ratio = result.walkable_ratio,
            "level generated"
        );
    } else {
        warn!(
            seed = result.seed_used,
            attempts = result.attempts,
            reachable_ratio = result.reachable_ratio,
            required = config.required_connected_ratio,
            "connectivity threshold not met, keeping final attempt"
        );
    }
    result
}

fn clamp_spawn(grid: &WorldGrid, spawn: TileCoord) -> TileCoord {
    let max_x = grid.width().saturating_sub(2).max(1);
    let max_y = grid.height().saturating_sub(2).max(1);
    TileCoord::new(spawn.x.clamp(1, max_x), spawn.y.clamp(1, max_y))
}

/// One full generation pass, steps (1)-(6).
fn build_level(
    grid: &mut WorldGrid,
    config: &GenerationConfig,
    spawn: TileCoord,
    rng: &mut ChaCha8Rng,
) {
    grid.fill(Tile::floor());
    carve_jagged_borders(grid, config, rng);
    scatter_blobs(grid, config, rng);
    clear_disk(grid, spawn.x as i32, spawn.y as i32, config.safe_zone_radius as i32);
    carve_loops(grid, config, spawn, rng);
    reinforce_outer_wall(grid);
}

/// Random-walk a border thickness along each edge and wall it in.
fn carve_jagged_borders(grid: &mut WorldGrid, config: &GenerationConfig, rng: &mut ChaCha8Rng) {
    let (w, h) = (grid.width() as i32, grid.height() as i32);
    let min_t = config.edge_min_thickness as i32;
    let max_t = (config.edge_max_thickness as i32).max(min_t);
    let jag = config.edge_jaggedness.clamp(0.0, 1.0) as f64;

    let walk = |rng: &mut ChaCha8Rng, t: &mut i32| {
        if rng.gen_bool(jag) {
            *t = (*t + rng.gen_range(-1..=1)).clamp(min_t, max_t);
        }
    };

    // Top and bottom, per column.
    let mut top = rng.gen_range(min_t..=max_t);
    let mut bottom = rng.gen_range(min_t..=max_t);
    for x in 0..w {
        for y in 0..top {
            grid.place_wall(x, y, BORDER_DURABILITY);
        }
        for y in (h - bottom).max(0)..h {
            grid.place_wall(x, y, BORDER_DURABILITY);
        }
        walk(rng, &mut top);
        walk(rng, &mut bottom);
    }

    // Left and right, per row.
    let mut left = rng.gen_range(min_t..=max_t);
    let mut right = rng.gen_range(min_t..=max_t);
    for y in 0..h {
        for x in 0..left {
            grid.place_wall(x, y, BORDER_DURABILITY);
        }
        for x in (w - right).max(0)..w {
            grid.place_wall(x, y, BORDER_DURABILITY);
        }
        walk(rng, &mut left);
        walk(rng, &mut right);
    }
}

/// Scatter soft-edged wall discs until the wall fraction reaches the target.
fn scatter_blobs(grid: &mut WorldGrid, config: &GenerationConfig, rng: &mut ChaCha8Rng) {
    let (w, h) = (grid.width() as i32, grid.height() as i32);
    if w < 3 || h < 3 {
        return;
    }
    let target = (config.obstacle_density.clamp(0.0, 1.0) * grid.len() as f32) as usize;
    let mut walls = (0..h)
        .flat_map(|y| (0..w).map(move |x| (x, y)))
        .filter(|&(x, y)| grid.is_blocked(x, y))
        .count();

    let r_min = config.blob_radius_min.max(1) as i32;
    let r_max = (config.blob_radius_max as i32).max(r_min);
    let jitter = config.blob_edge_jitter.clamp(0.0, 1.0);

    let mut blobs = 0;
    while walls < target && blobs < MAX_OBSTACLE_BLOBS {
        blobs += 1;
        let cx = rng.gen_range(1..w - 1);
        let cy = rng.gen_range(1..h - 1);
        let r = rng.gen_range(r_min..=r_max);
        let rf = r as f32;

        for y in (cy - r)..=(cy + r) {
            for x in (cx - r)..=(cx + r) {
                if !grid.in_bounds(x, y) || grid.is_blocked(x, y) {
                    continue;
                }
                let d = (((x - cx).pow(2) + (y - cy).pow(2)) as f32).sqrt() / rf;
                let threshold = 1.0 - jitter * rng.gen::<f32>();
                if d <= threshold {
                    grid.place_wall(x, y, config.wall_durability);
                    walls += 1;
                }
            }
        }
    }
}

/// Force a disk of tiles back to floor.
fn clear_disk(grid: &mut WorldGrid, cx: i32, cy: i32, radius: i32) {
    let r2 = radius * radius;
    for y in (cy - radius)..=(cy + radius) {
        for x in (cx - radius)..=(cx + radius) {
            if (x - cx).pow(2) + (y - cy).pow(2) <= r2 && grid.in_bounds(x, y) {
                grid.set_floor(x, y);
            }
        }
    }
}

/// Carve jittered ring corridors at increasing radii around spawn.
fn carve_loops(
    grid: &mut WorldGrid,
    config: &GenerationConfig,
    spawn: TileCoord,
    rng: &mut ChaCha8Rng,
) {
    let (sx, sy) = (spawn.x as f32, spawn.y as f32);
    let brush = config.carve_loop_radius as i32;
    let jitter = config.carve_loop_jitter.max(0.0);

    for ring in 0..config.carve_loop_count {
        let radius = (config.safe_zone_radius + config.carve_loop_spacing * (ring + 1)) as f32;
        let points = ((radius * 6.0) as usize).max(16);

        let ring_points: Vec<(i32, i32)> = (0..points)
            .map(|k| {
                let angle = k as f32 / points as f32 * TAU;
                let rr = radius * (1.0 + jitter * (rng.gen::<f32>() * 2.0 - 1.0));
                (
                    (sx + rr * angle.cos()).round() as i32,
                    (sy + rr * angle.sin()).round() as i32,
                )
            })
            .collect();

        for k in 0..ring_points.len() {
            let a = ring_points[k];
            let b = ring_points[(k + 1) % ring_points.len()];
            bresenham(a, b, |x, y| clear_disk(grid, x, y, brush));
        }
    }
}

/// Visit every cell on the line from `a` to `b`, inclusive.
fn bresenham(a: (i32, i32), b: (i32, i32), mut visit: impl FnMut(i32, i32)) {
    let (mut x, mut y) = a;
    let dx = (b.0 - a.0).abs();
    let dy = -(b.1 - a.1).abs();
    let sx = if a.0 < b.0 { 1 } else { -1 };
    let sy = if a.1 < b.1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        visit(x, y);
        if x == b.0 && y == b.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Solid indestructible one-tile frame around the grid.
fn reinforce_outer_wall(grid: &mut WorldGrid) {
    let (w, h) = (grid.width() as i32, grid.height() as i32);
    for x in 0..w {
        grid.place_wall(x, 0, BORDER_DURABILITY);
        grid.place_wall(x, h - 1, BORDER_DURABILITY);
    }
    for y in 0..h {
        grid.place_wall(0, y, BORDER_DURABILITY);
        grid.place_wall(w - 1, y, BORDER_DURABILITY);
    }
}

fn summarize(
    grid: &WorldGrid,
    config: &GenerationConfig,
    spawn: TileCoord,
    reachable: &[bool],
    seed_used: u64,
    attempts: u32,
    accepted: bool,
) -> GenerationResult {
    let (w, h) = (grid.width() as i32, grid.height() as i32);
    let total = grid.len().max(1) as f32;
    let exclusion = (config.safe_zone_radius + config.spawnable_margin) as i64;
    let exclusion_sq = exclusion * exclusion;

    let mut walkable_tiles = Vec::new();
    let mut obstacle_tiles = Vec::new();
    let mut spawnable_tiles = Vec::new();
    let mut collision = Vec::with_capacity(grid.len());

    for y in 0..h {
        for x in 0..w {
            let coord = TileCoord::new(x as u32, y as u32);
            let walkable = grid.is_walkable(x, y);
            collision.push(!walkable);
            if !walkable {
                obstacle_tiles.push(coord);
                continue;
            }
            walkable_tiles.push(coord);

            let cardinal_open = grid.is_walkable(x + 1, y)
                && grid.is_walkable(x - 1, y)
                && grid.is_walkable(x, y + 1)
                && grid.is_walkable(x, y - 1);
            if cardinal_open && coord.distance_sq(&spawn) > exclusion_sq {
                spawnable_tiles.push(coord);
            }
        }
    }

    let reachable_count = reachable.iter().filter(|&&v| v).count();
    GenerationResult {
        seed_used,
        attempts,
        accepted,
        spawn,
        reachable_ratio: reachable_count as f32 / total,
        walkable_ratio: walkable_tiles.len() as f32 / total,
        reachable_count,
        walkable_tiles,
        obstacle_tiles,
        collision,
        spawnable_tiles,
    }
}
