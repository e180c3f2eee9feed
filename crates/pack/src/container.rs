//! A single container instance with its height map and capacity bookkeeping.

use crate::height_map::{HeightMap, SupportRule};
use crate::item::Item;
use cartonize_core::{CatalogEntry, ContainerId};

/// One physical container being filled.
#[derive(Debug, Clone)]
pub struct Container {
    id: ContainerId,
    type_name: String,
    label: String,
    grid: [usize; 3],
    max_weight: f64,
    max_volume: f64,
    height_map: HeightMap,
    rule: SupportRule,
    placed: Vec<Item>,
    placed_weight: f64,
    placed_volume: f64,
}

impl Container {
    /// Opens an empty container of a catalog type.
    pub fn new(entry: &CatalogEntry, label: impl Into<String>, rule: SupportRule) -> Self {
        Self {
            id: entry.id,
            type_name: entry.name.clone(),
            label: label.into(),
            grid: entry.grid,
            max_weight: entry.max_weight,
            max_volume: entry.grid_volume(),
            height_map: HeightMap::new(entry.grid[0], entry.grid[1]),
            rule,
            placed: Vec::new(),
            placed_weight: 0.0,
            placed_volume: 0.0,
        }
    }

    /// Catalog type.
    pub fn id(&self) -> ContainerId {
        self.id
    }

    /// Catalog display name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Instance label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Grid dimensions.
    pub fn grid(&self) -> [usize; 3] {
        self.grid
    }

    /// Current height map.
    pub fn height_map(&self) -> &HeightMap {
        &self.height_map
    }

    /// Items in placement order.
    pub fn placed(&self) -> &[Item] {
        &self.placed
    }

    /// Returns true if nothing has been placed yet.
    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    /// Total placed weight.
    pub fn placed_weight(&self) -> f64 {
        self.placed_weight
    }

    /// Total placed grid volume.
    pub fn placed_volume(&self) -> f64 {
        self.placed_volume
    }

    /// Remaining weight capacity.
    pub fn free_weight(&self) -> f64 {
        self.max_weight - self.placed_weight
    }

    /// Remaining grid volume.
    pub fn free_volume(&self) -> f64 {
        self.max_volume - self.placed_volume
    }

    /// Returns true if weight and volume leave room for the item.
    pub fn has_capacity_for(&self, item: &Item) -> bool {
        item.weight() <= self.free_weight() && item.volume() <= self.free_volume()
    }

    /// Resting height of a footprint of `size` at `(x, y)` if the support rule
    /// accepts it.
    pub fn check_placement(&self, size: [usize; 3], x: usize, y: usize) -> Option<usize> {
        self.height_map
            .support_height(x, y, size, self.grid[2], &self.rule)
    }

    /// Drops an item (in its current rotation) at `(x, y)`.
    ///
    /// Returns the placed item, or `None` if capacity or the support rule
    /// rejects it. A rejected drop leaves the container unchanged.
    pub fn drop_item(&mut self, item: &Item, x: usize, y: usize) -> Option<&Item> {
        if !self.has_capacity_for(item) {
            return None;
        }
        let size = item.size();
        let z = self.check_placement(size, x, y)?;

        let mut placed = item.clone();
        placed.place([x, y, z]).ok()?;
        placed.assign(self.id, self.label.clone());

        self.height_map.stamp(x, y, size[0], size[1], z + size[2]);
        self.placed.push(placed);
        self.placed_weight = self.placed.iter().map(Item::weight).sum();
        self.placed_volume = self.placed.iter().map(Item::volume).sum();

        log::trace!(
            "{} <- {} at ({}, {}, {}) size {:?}",
            self.label,
            item.name,
            x,
            y,
            z,
            size
        );
        self.placed.last()
    }
}
