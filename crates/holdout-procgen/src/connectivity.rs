//! Breadth-first reachability over walkable tiles.

use std::collections::VecDeque;

use holdout_core::types::TileCoord;
use holdout_grid::WorldGrid;

/// Flood fill from `start` over 4-connected walkable tiles.
/// Returns one flag per tile (row-major); empty-start yields all false.
pub fn flood_fill(grid: &WorldGrid, start: TileCoord) -> Vec<bool> {
    let w = grid.width() as usize;
    let mut visited = vec![false; grid.len()];
    let (sx, sy) = (start.x as i32, start.y as i32);
    if !grid.is_walkable(sx, sy) {
        return visited;
    }

    let mut queue = VecDeque::new();
    visited[sy as usize * w + sx as usize] = true;
    queue.push_back((sx, sy));

    while let Some((x, y)) = queue.pop_front() {
        for (nx, ny) in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
            if !grid.is_walkable(nx, ny) {
                continue;
            }
            let i = ny as usize * w + nx as usize;
            if !visited[i] {
                visited[i] = true;
                queue.push_back((nx, ny));
            }
        }
    }
    visited
}

/// Number of tiles reachable from `start`.
pub fn reachable_count(grid: &WorldGrid, start: TileCoord) -> usize {
    flood_fill(grid, start).iter().filter(|&&v| v).count()
}
