//! Greedy corner-anchored heuristic packer.
//!
//! # Algorithm
//!
//! 1. **Partitioning**: over the items not yet packed, in order, grow a prefix
//!    one item at a time and try to fit it into a single fresh container. An
//!    item whose inclusion breaks feasibility is deferred to a later pass; the
//!    largest feasible prefix becomes one container.
//! 2. **Container choice**: catalog types are tried smallest volume first,
//!    skipping those whose volume, weight limit or per-axis extent cannot
//!    possibly hold the group.
//! 3. **Placement**: each item is tried at the free anchors (far-face anchors,
//!    then right-face anchors, then top anchors) and in every allowed
//!    orientation; the first placement accepted by the support rule wins and
//!    contributes three new anchors.

use crate::height_map::{HeightMap, SupportRule};
use crate::item::Item;
use cartonize_core::{
    Catalog, CatalogEntry, ContainerId, Error, InstanceLabels, PackedContainer, PackingConfig,
    PackingOutcome, Result, Rotation, Strategy,
};
use std::sync::Arc;
use std::time::Instant;

/// Placement of one item inside a single-container packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchoredPlacement {
    /// Front-left-bottom corner.
    pub position: [usize; 3],
    /// Orientation relative to the item's axis-sorted base.
    pub rotation: Rotation,
}

/// A group of items that fits one container.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Indices into the packed item slice.
    pub item_indices: Vec<usize>,
    /// Catalog type holding the group.
    pub container_id: ContainerId,
    /// One placement per item, in `item_indices` order.
    pub placements: Vec<AnchoredPlacement>,
}

/// Greedy multi-container packer.
#[derive(Debug, Clone)]
pub struct HeuristicPacker {
    config: Arc<PackingConfig>,
    catalog: Arc<Catalog>,
    rule: SupportRule,
}

impl HeuristicPacker {
    /// Creates a heuristic packer.
    pub fn new(config: Arc<PackingConfig>, catalog: Arc<Catalog>) -> Self {
        let rule = SupportRule::from_config(&config);
        Self {
            config,
            catalog,
            rule,
        }
    }

    /// Packs every item, opening as many containers as needed.
    pub fn pack(&self, items: &[Item]) -> Result<PackingOutcome> {
        let start = Instant::now();
        let partitions = self.partition(items)?;

        let mut labels = InstanceLabels::new();
        let mut outcome = PackingOutcome::new(Strategy::Heuristic);
        for partition in &partitions {
            let entry = self.entry(partition.container_id)?;
            let label = labels.next_label(&entry.name);
            let mut packed = Vec::with_capacity(partition.item_indices.len());
            for (&idx, placement) in partition.item_indices.iter().zip(&partition.placements) {
                let mut item = items[idx].rotated(placement.rotation);
                item.place(placement.position)?;
                item.assign(entry.id, label.clone());
                packed.push(item.to_packed());
            }
            outcome.containers.push(PackedContainer {
                container_id: entry.id,
                type_name: entry.name.clone(),
                label,
                items: packed,
            });
        }

        log::debug!(
            "heuristic packed {} items into {} containers",
            items.len(),
            outcome.container_count()
        );
        Ok(outcome.with_computation_time(start.elapsed().as_millis() as u64))
    }

    /// Splits the items into single-container groups.
    pub fn partition(&self, items: &[Item]) -> Result<Vec<Partition>> {
        let mut left: Vec<usize> = (0..items.len()).collect();
        let mut partitions = Vec::new();

        while !left.is_empty() {
            let mut deferred: Vec<usize> = Vec::new();
            let mut accepted: Option<Partition> = None;

            for end in 1..=left.len() {
                let ids: Vec<usize> = left[..end]
                    .iter()
                    .copied()
                    .filter(|id| !deferred.contains(id))
                    .collect();
                match self.pack_single_container(items, &ids) {
                    Some(partition) => accepted = Some(partition),
                    None => deferred.push(left[end - 1]),
                }
            }

            let partition = accepted.ok_or_else(|| {
                let names: Vec<&str> = left.iter().map(|&i| items[i].name.as_str()).collect();
                Error::Unpackable(format!("no container can hold any of {:?}", names))
            })?;
            log::debug!(
                "partition {}: {} items, {} deferred",
                partitions.len() + 1,
                partition.item_indices.len(),
                deferred.len()
            );
            partitions.push(partition);
            left = deferred;
        }
        Ok(partitions)
    }

    /// Packs a group into the smallest catalog type that takes all of it.
    pub fn pack_single_container(&self, items: &[Item], ids: &[usize]) -> Option<Partition> {
        if ids.is_empty() {
            return None;
        }
        let group: Vec<&Item> = ids.iter().map(|&i| &items[i]).collect();
        let volume: f64 = group.iter().map(|i| i.real_volume()).sum();
        let weight: f64 = group.iter().map(|i| i.weight()).sum();
        let mut extent = [0usize; 3];
        for item in &group {
            for (axis, &side) in item.base_size().iter().enumerate() {
                extent[axis] = extent[axis].max(side);
            }
        }

        self.catalog
            .ids_by_volume()
            .into_iter()
            .map(|id| &self.catalog.entries()[id])
            .filter(|entry| {
                entry.is_usable()
                    && volume <= entry.volume
                    && weight <= entry.max_weight
                    && (0..3).all(|axis| extent[axis] <= entry.grid[axis])
            })
            .find_map(|entry| {
                self.place_in_container(entry, &group)
                    .map(|placements| Partition {
                        item_indices: ids.to_vec(),
                        container_id: entry.id,
                        placements,
                    })
            })
    }

    /// Corner-anchored placement of a group into one container type.
    fn place_in_container(
        &self,
        entry: &CatalogEntry,
        group: &[&Item],
    ) -> Option<Vec<AnchoredPlacement>> {
        let [cx, cy, cz] = entry.grid;
        let mut map = HeightMap::new(cx, cy);
        let mut top: Vec<[usize; 3]> = vec![[0, 0, 0]];
        let mut right: Vec<[usize; 3]> = Vec::new();
        let mut far: Vec<[usize; 3]> = Vec::new();
        let mut used: Vec<[usize; 3]> = Vec::new();
        let mut placements = Vec::with_capacity(group.len());

        for item in group {
            let (anchor, rotation, size, z) = far
                .iter()
                .chain(&right)
                .chain(&top)
                .filter(|anchor| !used.contains(anchor))
                .find_map(|&anchor| {
                    self.config.allowed_rotations.iter().find_map(|&rotation| {
                        let size = item.size_for(rotation);
                        map.support_height(anchor[0], anchor[1], size, cz, &self.rule)
                            .map(|z| (anchor, rotation, size, z))
                    })
                })?;

            let [x, y, _] = anchor;
            let [dx, dy, dz] = size;
            log::trace!(
                "{}: {} at ({}, {}, {}) as {}",
                entry.name,
                item.name,
                x,
                y,
                z,
                rotation.label()
            );
            map.stamp(x, y, dx, dy, z + dz);
            used.push(anchor);
            top.push([x, y, z + dz]);
            right.push([x + dx, y, z]);
            far.push([x, y + dy, z]);
            placements.push(AnchoredPlacement {
                position: [x, y, z],
                rotation,
            });
        }
        Some(placements)
    }

    fn entry(&self, id: ContainerId) -> Result<&CatalogEntry> {
        self.catalog
            .get(id)
            .ok_or_else(|| Error::Internal(format!("partition refers to unknown container {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartonize_core::ContainerSpec;

    fn cube_packer() -> HeuristicPacker {
        let catalog =
            Catalog::new(vec![ContainerSpec::new("CUBE", 30.0, 12.0, 12.0, 12.0)]).unwrap();
        HeuristicPacker::new(Arc::new(PackingConfig::default()), Arc::new(catalog))
    }

    fn fixture() -> Vec<Item> {
        vec![
            Item::on_grid(0, "A", [10, 8, 4], 1.0),
            Item::on_grid(1, "B", [6, 6, 6], 1.0),
            Item::on_grid(2, "C", [5, 5, 5], 1.0),
        ]
    }

    #[test]
    fn test_fixture_partitions() {
        let packer = cube_packer();
        let partitions = packer.partition(&fixture()).unwrap();
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].item_indices, vec![0, 1]);
        assert_eq!(partitions[0].placements[0].position, [0, 0, 0]);
        assert_eq!(partitions[0].placements[1].position, [0, 0, 4]);
        assert_eq!(partitions[1].item_indices, vec![2]);
        assert_eq!(partitions[1].placements[0].position, [0, 0, 0]);
    }

    #[test]
    fn test_labels_count_per_type() {
        let outcome = cube_packer().pack(&fixture()).unwrap();
        assert_eq!(outcome.used_labels(), vec!["CUBE(1)", "CUBE(2)"]);
        assert_eq!(outcome.item_count(), 3);
        assert_eq!(outcome.strategy, Strategy::Heuristic);
    }

    #[test]
    fn test_side_by_side_uses_right_anchor() {
        let items = vec![
            Item::on_grid(0, "A", [6, 12, 12], 1.0),
            Item::on_grid(1, "B", [6, 12, 12], 1.0),
        ];
        let partitions = cube_packer().partition(&items).unwrap();
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].placements[1].position, [6, 0, 0]);
    }

    #[test]
    fn test_too_heavy_item_is_unpackable() {
        let items = vec![Item::on_grid(0, "H", [1, 1, 1], 31.0)];
        assert!(matches!(cube_packer().pack(&items), Err(Error::Unpackable(_))));
    }

    #[test]
    fn test_single_item_gets_smallest_fitting_carton() {
        let packer = HeuristicPacker::new(
            Arc::new(PackingConfig::default()),
            Arc::new(Catalog::reference()),
        );
        let item = Item::new(0, "ITEM", "ORDER", [5.0, 5.0, 5.0], 1.0).unwrap();
        let outcome = packer.pack(&[item]).unwrap();
        assert_eq!(outcome.used_labels(), vec!["BOX-014(1)"]);
    }
}
