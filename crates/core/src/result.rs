//! Packing outcome representation.

use crate::catalog::{Catalog, ContainerId};
use crate::geometry::Rotation;
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Strategy that produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Strategy {
    /// Greedy corner-based heuristic.
    #[default]
    Heuristic,
    /// Oracle-guided tree search refinement.
    TreeSearch,
}

impl Strategy {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Heuristic => "Heuristic",
            Strategy::TreeSearch => "TreeSearch",
        }
    }
}

/// A single item as it ended up inside a container.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackedItem {
    /// Item display name.
    pub name: String,
    /// Source order identifier.
    pub order_id: String,
    /// Front-left-bottom corner on the container grid.
    pub position: [usize; 3],
    /// Grid size after rotation.
    pub size: [usize; 3],
    /// Real size after rotation.
    pub real_size: [f64; 3],
    /// Item weight.
    pub weight: f64,
    /// Rotation applied before placement.
    pub rotation: Rotation,
}

/// One physical container of an outcome.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackedContainer {
    /// Catalog type.
    pub container_id: ContainerId,
    /// Catalog display name.
    pub type_name: String,
    /// Instance label, e.g. `BOX-012(2)`.
    pub label: String,
    /// Items in placement order.
    pub items: Vec<PackedItem>,
}

impl PackedContainer {
    /// Total weight of the contained items.
    pub fn total_weight(&self) -> f64 {
        self.items.iter().map(|i| i.weight).sum()
    }

    /// One line description used in reports.
    pub fn describe(&self) -> String {
        let details: Vec<String> = self
            .items
            .iter()
            .map(|i| {
                format!(
                    "{} Pos:({}, {}, {}) Pack_XYZ:({}, {}, {})",
                    i.name,
                    i.position[0],
                    i.position[1],
                    i.position[2],
                    i.size[0],
                    i.size[1],
                    i.size[2]
                )
            })
            .collect();
        format!(
            "{} <= #items:{} details => [{}]",
            self.label,
            self.items.len(),
            details.join(", ")
        )
    }
}

/// Final assignment of an order's items to containers.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackingOutcome {
    /// Containers actually used, in first-use order.
    pub containers: Vec<PackedContainer>,
    /// Strategy that produced this outcome.
    pub strategy: Strategy,
    /// Computation time in milliseconds.
    pub computation_time_ms: u64,
}

impl PackingOutcome {
    /// Creates an empty outcome.
    pub fn new(strategy: Strategy) -> Self {
        Self {
            containers: Vec::new(),
            strategy,
            computation_time_ms: 0,
        }
    }

    /// Number of containers used.
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Number of items placed.
    pub fn item_count(&self) -> usize {
        self.containers.iter().map(|c| c.items.len()).sum()
    }

    /// Instance labels of the used containers.
    pub fn used_labels(&self) -> Vec<String> {
        self.containers.iter().map(|c| c.label.clone()).collect()
    }

    /// Catalog ids of the used containers (one per container, repeats allowed).
    pub fn used_container_ids(&self) -> Vec<ContainerId> {
        self.containers.iter().map(|c| c.container_id).collect()
    }

    /// Distinct catalog ids in first-use order.
    pub fn distinct_container_ids(&self) -> Vec<ContainerId> {
        let mut ids = Vec::new();
        for c in &self.containers {
            if !ids.contains(&c.container_id) {
                ids.push(c.container_id);
            }
        }
        ids
    }

    /// Ratio of packed real item volume to the real volume of the used containers.
    pub fn utilization(&self, catalog: &Catalog) -> f64 {
        let container_volume: f64 = self
            .containers
            .iter()
            .filter_map(|c| catalog.get(c.container_id))
            .map(|e| e.volume)
            .sum();
        if container_volume <= 0.0 {
            return 0.0;
        }
        let item_volume: f64 = self
            .containers
            .iter()
            .flat_map(|c| c.items.iter())
            .map(|i| i.real_size[0] * i.real_size[1] * i.real_size[2])
            .sum();
        item_volume / container_volume
    }

    /// Container-wise packing report, one line per container.
    pub fn summary(&self) -> String {
        self.containers
            .iter()
            .map(PackedContainer::describe)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Sets the computation time.
    pub fn with_computation_time(mut self, ms: u64) -> Self {
        self.computation_time_ms = ms;
        self
    }
}

/// Hands out per-type instance labels: `Name(1)`, `Name(2)`, ...
#[derive(Debug, Clone, Default)]
pub struct InstanceLabels {
    counts: HashMap<String, usize>,
}

impl InstanceLabels {
    /// Creates an empty label counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next label for a container type.
    pub fn next_label(&mut self, type_name: &str) -> String {
        let count = self.counts.entry(type_name.to_string()).or_insert(0);
        *count += 1;
        format!("{}({})", type_name, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, size: [usize; 3]) -> PackedItem {
        PackedItem {
            name: name.to_string(),
            order_id: "ORDER_1".to_string(),
            position: [0, 0, 0],
            size,
            real_size: size.map(|v| v as f64),
            weight: 1.5,
            rotation: Rotation::None,
        }
    }

    #[test]
    fn test_instance_labels() {
        let mut labels = InstanceLabels::new();
        assert_eq!(labels.next_label("BOX-012"), "BOX-012(1)");
        assert_eq!(labels.next_label("BOX-014"), "BOX-014(1)");
        assert_eq!(labels.next_label("BOX-012"), "BOX-012(2)");
    }

    #[test]
    fn test_outcome_counts() {
        let mut outcome = PackingOutcome::new(Strategy::Heuristic);
        outcome.containers.push(PackedContainer {
            container_id: 0,
            type_name: "BOX-012".to_string(),
            label: "BOX-012(1)".to_string(),
            items: vec![item("A", [6, 6, 6]), item("B", [6, 6, 6])],
        });
        outcome.containers.push(PackedContainer {
            container_id: 0,
            type_name: "BOX-012".to_string(),
            label: "BOX-012(2)".to_string(),
            items: vec![item("C", [12, 12, 12])],
        });

        assert_eq!(outcome.container_count(), 2);
        assert_eq!(outcome.item_count(), 3);
        assert_eq!(outcome.distinct_container_ids(), vec![0]);
        assert_eq!(outcome.used_labels(), vec!["BOX-012(1)", "BOX-012(2)"]);
        assert!((outcome.containers[0].total_weight() - 3.0).abs() < 1e-12);

        let catalog = Catalog::reference();
        let expected = (2.0 * 216.0 + 1728.0) / (2.0 * 1728.0);
        assert!((outcome.utilization(&catalog) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_summary_lines() {
        let mut outcome = PackingOutcome::new(Strategy::TreeSearch);
        outcome.containers.push(PackedContainer {
            container_id: 1,
            type_name: "BOX-014".to_string(),
            label: "BOX-014(1)".to_string(),
            items: vec![item("A", [2, 2, 2])],
        });
        let summary = outcome.summary();
        assert!(summary.starts_with("BOX-014(1) <= #items:1 details => [A Pos:(0, 0, 0)"));
        assert_eq!(outcome.strategy.name(), "TreeSearch");
    }
}
