//! Container catalog.
//!
//! The catalog is static data: one entry per carton type with its display name,
//! weight limit and real-valued outer dimensions. On construction every entry is
//! axis-sorted (longest side first) and projected onto the integer grid by
//! rounding down, and catalog-wide maxima are derived to size observations and
//! the action space.

use crate::geometry::{floor_to_grid, sort_desc};
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Catalog index of a container type.
pub type ContainerId = usize;

/// Raw description of a carton type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContainerSpec {
    /// Display name, e.g. `BOX-012`.
    pub name: String,
    /// Maximum payload weight.
    pub max_weight: f64,
    /// Length (real units).
    pub length: f64,
    /// Width (real units).
    pub width: f64,
    /// Height (real units).
    pub height: f64,
}

impl ContainerSpec {
    /// Creates a new container spec.
    pub fn new(name: impl Into<String>, max_weight: f64, length: f64, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            max_weight,
            length,
            width,
            height,
        }
    }
}

/// A catalog entry with derived sorted and grid dimensions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CatalogEntry {
    /// Catalog index.
    pub id: ContainerId,
    /// Display name.
    pub name: String,
    /// Maximum payload weight.
    pub max_weight: f64,
    /// Real dimensions, longest first.
    pub dims: [f64; 3],
    /// Integer grid dimensions, rounded down.
    pub grid: [usize; 3],
    /// Real volume.
    pub volume: f64,
}

impl CatalogEntry {
    /// Volume of the integer grid.
    pub fn grid_volume(&self) -> f64 {
        crate::geometry::grid_volume(self.grid)
    }

    /// Returns true if the grid has no zero-length axis.
    pub fn is_usable(&self) -> bool {
        self.grid.iter().all(|&v| v > 0)
    }
}

/// Container catalog with catalog-wide maxima.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    max_grid: [usize; 3],
    max_weight: f64,
    max_volume: f64,
}

impl Catalog {
    /// Builds a catalog from raw specs.
    pub fn new(specs: Vec<ContainerSpec>) -> Result<Self> {
        if specs.is_empty() {
            return Err(Error::InvalidContainer("catalog is empty".into()));
        }

        let mut entries = Vec::with_capacity(specs.len());
        for (id, spec) in specs.into_iter().enumerate() {
            if spec.max_weight <= 0.0 {
                return Err(Error::InvalidContainer(format!(
                    "{}: max weight must be positive",
                    spec.name
                )));
            }
            if spec.length <= 0.0 || spec.width <= 0.0 || spec.height <= 0.0 {
                return Err(Error::InvalidContainer(format!(
                    "{}: dimensions must be positive",
                    spec.name
                )));
            }
            let dims = sort_desc([spec.length, spec.width, spec.height]);
            entries.push(CatalogEntry {
                id,
                name: spec.name,
                max_weight: spec.max_weight,
                dims,
                grid: floor_to_grid(dims),
                volume: dims[0] * dims[1] * dims[2],
            });
        }

        let mut max_grid = [0usize; 3];
        for entry in &entries {
            for axis in 0..3 {
                max_grid[axis] = max_grid[axis].max(entry.grid[axis]);
            }
        }
        if max_grid.iter().any(|&v| v == 0) {
            return Err(Error::InvalidContainer(
                "no catalog container spans a full grid unit on every axis".into(),
            ));
        }

        let max_weight = entries.iter().map(|e| e.max_weight).fold(0.0, f64::max);
        let max_volume = entries.iter().map(|e| e.volume).fold(0.0, f64::max);

        Ok(Self {
            entries,
            max_grid,
            max_weight,
            max_volume,
        })
    }

    /// Parses a JSON array of [`ContainerSpec`].
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let specs: Vec<ContainerSpec> = serde_json::from_str(json)?;
        Self::new(specs)
    }

    /// The built-in reference catalog of 18 cartons.
    ///
    /// The table is constant and every entry has positive weight and
    /// dimensions, so construction cannot fail.
    pub fn reference() -> Self {
        let specs = vec![
            ContainerSpec::new("BOX-012", 30.0, 12.0, 12.0, 12.0),
            ContainerSpec::new("BOX-014", 30.0, 5.5, 9.0, 12.0),
            ContainerSpec::new("BOX-018", 30.0, 7.5, 13.0, 18.0),
            ContainerSpec::new("BOX-024", 30.0, 9.75, 18.0, 24.0),
            ContainerSpec::new("BOX-028", 30.0, 16.0, 20.0, 28.0),
            ContainerSpec::new("BOX-075", 30.0, 15.0, 18.0, 24.0),
            ContainerSpec::new("BOX-32C", 30.0, 41.0, 24.0, 8.0),
            ContainerSpec::new("BOX-540", 30.0, 11.0, 13.0, 21.0),
            ContainerSpec::new("BOX-681", 30.0, 10.0, 20.0, 20.0),
            ContainerSpec::new("BOX-GOX", 30.0, 24.0, 14.0, 8.0),
            ContainerSpec::new("BOX-LRG", 30.0, 3.0, 13.0, 18.0),
            ContainerSpec::new("BOX-MED", 30.0, 3.0, 11.0, 16.0),
            ContainerSpec::new("BOX-SML", 30.0, 2.0, 11.0, 13.0),
            ContainerSpec::new("BOX-TUB", 10.0, 6.0, 6.0, 36.0),
            ContainerSpec::new("Box-GOH", 50.0, 48.0, 20.0, 24.0),
            ContainerSpec::new("ENV-001", 1.0, 7.25, 0.5, 12.0),
            ContainerSpec::new("ENV-005", 1.0, 10.5, 0.5, 15.0),
            ContainerSpec::new("ENV-007", 1.0, 14.25, 0.5, 20.0),
        ];
        Self::new(specs).expect("reference catalog table is well formed")
    }

    /// Number of container types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry for a catalog id.
    pub fn get(&self, id: ContainerId) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    /// All entries in catalog order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Catalog ids sorted by real volume, smallest first.
    pub fn ids_by_volume(&self) -> Vec<ContainerId> {
        let mut ids: Vec<ContainerId> = (0..self.entries.len()).collect();
        ids.sort_by(|&a, &b| {
            self.entries[a]
                .volume
                .partial_cmp(&self.entries[b].volume)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ids
    }

    /// Largest grid extent per axis over all entries.
    pub fn max_grid(&self) -> [usize; 3] {
        self.max_grid
    }

    /// Largest weight limit over all entries.
    pub fn max_weight(&self) -> f64 {
        self.max_weight
    }

    /// Largest real volume over all entries.
    pub fn max_volume(&self) -> f64 {
        self.max_volume
    }
}
