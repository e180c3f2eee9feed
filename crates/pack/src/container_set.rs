//! The set of containers open during one packing episode.
//!
//! At most one container per catalog type is active at a time. Replacing the
//! active set retires every open container (they keep their items and still
//! count towards the outcome) and opens a single fresh one.

use crate::action::{Action, ActionSpace};
use crate::container::Container;
use crate::height_map::SupportRule;
use crate::item::Item;
use crate::observation::Observation;
use cartonize_core::{
    Catalog, ContainerId, Error, InstanceLabels, PackedContainer, PackingOutcome, Result,
    Rotation, Strategy,
};
use rayon::prelude::*;
use std::sync::Arc;

/// A committed placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Item id.
    pub item_id: usize,
    /// Action that placed it.
    pub action: Action,
    /// Label of the receiving container instance.
    pub label: String,
}

/// Containers opened during an episode, in opening order.
#[derive(Debug, Clone)]
pub struct ContainerSet {
    catalog: Arc<Catalog>,
    rule: SupportRule,
    instances: Vec<Container>,
    active: Vec<Option<usize>>,
    labels: InstanceLabels,
    placements: Vec<Placement>,
}

impl ContainerSet {
    /// Creates an empty set over a catalog.
    pub fn new(catalog: Arc<Catalog>, rule: SupportRule) -> Self {
        let slots = catalog.len();
        Self {
            catalog,
            rule,
            instances: Vec::new(),
            active: vec![None; slots],
            labels: InstanceLabels::new(),
            placements: Vec::new(),
        }
    }

    /// Discards everything and opens one fresh container per listed type.
    pub fn reset(&mut self, ids: &[ContainerId]) -> Result<()> {
        self.instances.clear();
        self.active = vec![None; self.catalog.len()];
        self.labels = InstanceLabels::new();
        self.placements.clear();
        for &id in ids {
            self.open(id)?;
        }
        Ok(())
    }

    /// Retires all active containers and opens a fresh one of type `id`.
    pub fn replace(&mut self, id: ContainerId) -> Result<()> {
        for slot in self.active.iter_mut() {
            *slot = None;
        }
        self.open(id)
    }

    fn open(&mut self, id: ContainerId) -> Result<()> {
        let entry = self
            .catalog
            .get(id)
            .ok_or_else(|| Error::InvalidContainer(format!("unknown catalog id {}", id)))?;
        let label = self.labels.next_label(&entry.name);
        log::debug!("opening container {}", label);
        self.instances.push(Container::new(entry, label, self.rule));
        self.active[id] = Some(self.instances.len() - 1);
        Ok(())
    }

    /// Active container of a catalog type.
    pub fn active(&self, id: ContainerId) -> Option<&Container> {
        self.active
            .get(id)
            .copied()
            .flatten()
            .map(|idx| &self.instances[idx])
    }

    /// Catalog ids with an active container, in catalog order.
    pub fn active_ids(&self) -> Vec<ContainerId> {
        self.active
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.map(|_| id))
            .collect()
    }

    /// Every container opened so far, retired ones included.
    pub fn instances(&self) -> &[Container] {
        &self.instances
    }

    /// Placements in commit order.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Number of container instances holding at least one item.
    pub fn used_count(&self) -> usize {
        self.instances.iter().filter(|c| !c.is_empty()).count()
    }

    /// Drops a rotated copy of `item` into the active container named by the
    /// action. Returns the placed item, or `None` when the drop is rejected.
    pub fn commit(&mut self, item: &Item, action: Action) -> Option<Item> {
        let idx = self.active.get(action.container).copied().flatten()?;
        let rotated = item.rotated(action.rotation);
        let container = &mut self.instances[idx];
        let placed = container.drop_item(&rotated, action.x, action.y)?.clone();
        self.placements.push(Placement {
            item_id: item.id,
            action,
            label: container.label().to_string(),
        });
        Some(placed)
    }

    /// Legality mask for `item` over the whole action space.
    ///
    /// An entry is true when the active container of that type has weight and
    /// volume room for the item and the support rule accepts the rotated
    /// footprint at that anchor. Containers are evaluated in parallel.
    pub fn legality_mask(
        &self,
        item: &Item,
        space: &ActionSpace,
        rotations: &[Rotation],
    ) -> Vec<bool> {
        let mut mask = vec![false; space.len()];
        let depth = space.depth();
        let plane = space.width() * depth;

        mask.par_chunks_mut(space.per_container())
            .enumerate()
            .for_each(|(id, chunk)| {
                let container = match self.active(id) {
                    Some(c) if c.has_capacity_for(item) => c,
                    _ => return,
                };
                let [cx, cy, _] = container.grid();
                for &rotation in rotations {
                    let size = item.size_for(rotation);
                    if size[0] > cx || size[1] > cy {
                        continue;
                    }
                    let offset = rotation.index() * plane;
                    for x in 0..=cx - size[0] {
                        for y in 0..=cy - size[1] {
                            if container.check_placement(size, x, y).is_some() {
                                chunk[offset + x * depth + y] = true;
                            }
                        }
                    }
                }
            });
        mask
    }

    /// Appends three planes per catalog type: padded height map, free weight
    /// and free volume.
    ///
    /// Heights are shifted by the gap to the catalog's tallest container so
    /// every container reads as a column of the same height; padding cells
    /// and types without an active container read as full.
    pub fn observe(&self, obs: &mut Observation) {
        let max_z = self.catalog.max_grid()[2];
        for id in 0..self.catalog.len() {
            match self.active(id) {
                Some(container) => {
                    let [cx, cy, cz] = container.grid();
                    let shift = max_z.saturating_sub(cz);
                    let map = container.height_map();
                    obs.push_with(|x, y| {
                        if x < cx && y < cy {
                            (map.get(x, y) + shift) as f32
                        } else {
                            max_z as f32
                        }
                    });
                    obs.push_constant(container.free_weight() as f32);
                    obs.push_constant(container.free_volume() as f32);
                }
                None => {
                    obs.push_constant(max_z as f32);
                    obs.push_constant(0.0);
                    obs.push_constant(0.0);
                }
            }
        }
    }

    /// Outcome view of the used containers, in opening order, relabeled per type.
    pub fn to_outcome(&self, strategy: Strategy) -> PackingOutcome {
        let mut labels = InstanceLabels::new();
        let mut outcome = PackingOutcome::new(strategy);
        for container in self.instances.iter().filter(|c| !c.is_empty()) {
            outcome.containers.push(PackedContainer {
                container_id: container.id(),
                type_name: container.type_name().to_string(),
                label: labels.next_label(container.type_name()),
                items: container.placed().iter().map(Item::to_packed).collect(),
            });
        }
        outcome
    }
}
