//! Rebuilds the grid's weak occupant lists from entity positions.

use holdout_core::components::{EntityRecord, Transform};
use holdout_grid::WorldGrid;

use crate::entities::EntityStore;

pub fn run(grid: &mut WorldGrid, store: &EntityStore) {
    grid.clear_occupants();
    let mut query = store.world().query::<(&EntityRecord, &Transform)>();
    for (_entity, (record, transform)) in query.iter() {
        if record.active {
            grid.add_occupant(transform.position, record.id);
        }
    }
}
