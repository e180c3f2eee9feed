//! Synthetic orders cut out of a single container.
//!
//! The container grid is recursively bisected along a random axis until every
//! side of every piece lies within `[min_side, max_side]`. The pieces tile the
//! container exactly, so the full set always has a perfect packing; a random
//! subset of them is returned.

use crate::item::Item;
use cartonize_core::{CatalogEntry, Error, Result, Rotation};
use rand::prelude::*;

/// Generator of orders with a known perfect packing.
#[derive(Debug, Clone)]
pub struct CuttingGenerator {
    rng: StdRng,
    side_limits: Option<(usize, usize)>,
}

impl Default for CuttingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CuttingGenerator {
    /// Creates a generator with a random seed.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            side_limits: None,
        }
    }

    /// Creates a generator with a specific seed for reproducibility.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            side_limits: None,
        }
    }

    /// Overrides the piece side limits.
    ///
    /// By default they are derived from the container's shortest side `s`:
    /// `max(1, s / 5)` and `max(1, s / 1.1)`.
    pub fn with_side_limits(mut self, min_side: usize, max_side: usize) -> Self {
        self.side_limits = Some((min_side, max_side));
        self
    }

    fn limits(&self, grid: [usize; 3]) -> (usize, usize) {
        self.side_limits.unwrap_or_else(|| {
            let shortest = grid.iter().copied().min().unwrap_or(0);
            ((shortest / 5).max(1), ((shortest as f64 / 1.1) as usize).max(1))
        })
    }

    /// Cuts `entry` into pieces and returns up to `max_items` of them,
    /// shuffled and randomly rotated. Piece weights are proportional to volume
    /// and sum to the container's weight limit before truncation.
    pub fn generate(&mut self, entry: &CatalogEntry, max_items: usize) -> Result<Vec<Item>> {
        let grid = entry.grid;
        let (min_side, max_side) = self.limits(grid);
        let longest = grid.iter().copied().max().unwrap_or(0);
        let shortest = grid.iter().copied().min().unwrap_or(0);
        if shortest == 0 || min_side == 0 || min_side > max_side || min_side * 2 > longest {
            return Err(Error::InvalidContainer(format!(
                "{} cannot be cut into pieces with sides in [{}, {}]",
                entry.name, min_side, max_side
            )));
        }

        let mut pieces = Vec::new();
        self.cut(grid, entry.max_weight, min_side, max_side, &mut pieces);
        pieces.shuffle(&mut self.rng);
        pieces.truncate(max_items);

        let mut items = Vec::with_capacity(pieces.len());
        for (id, (size, weight)) in pieces.into_iter().enumerate() {
            let dims = size.map(|v| v as f64);
            let mut item = Item::new(id, format!("cut_{}", id + 1), entry.name.clone(), dims, weight)?;
            if let Some(&rotation) = Rotation::ALL.choose(&mut self.rng) {
                item.rotate(rotation)?;
            }
            items.push(item);
        }
        Ok(items)
    }

    fn cut(
        &mut self,
        size: [usize; 3],
        weight: f64,
        min_side: usize,
        max_side: usize,
        out: &mut Vec<([usize; 3], f64)>,
    ) {
        let axes: Vec<usize> = (0..3)
            .filter(|&axis| size[axis] >= min_side * 2 && size[axis] > max_side)
            .collect();
        let Some(&axis) = axes.choose(&mut self.rng) else {
            out.push((size, weight));
            return;
        };

        let at = self.rng.gen_range(min_side..=size[axis] - min_side);
        let mut a = size;
        let mut b = size;
        a[axis] = at;
        b[axis] = size[axis] - at;

        let volume = (size[0] * size[1] * size[2]) as f64;
        let share = |s: [usize; 3]| {
            let fraction = (s[0] * s[1] * s[2]) as f64 / volume;
            (weight * fraction * 100.0).round() / 100.0
        };
        let (wa, wb) = (share(a), share(b));
        self.cut(a, wa, min_side, max_side, out);
        self.cut(b, wb, min_side, max_side, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartonize_core::{Catalog, ContainerSpec};

    fn entry() -> CatalogEntry {
        Catalog::new(vec![ContainerSpec::new("BOX", 30.0, 24.0, 14.0, 8.0)])
            .unwrap()
            .get(0)
            .unwrap()
            .clone()
    }

    #[test]
    fn test_full_cut_tiles_container() {
        let entry = entry();
        let items = CuttingGenerator::with_seed(9).generate(&entry, usize::MAX).unwrap();
        let volume: f64 = items.iter().map(Item::volume).sum();
        assert_eq!(volume, entry.grid_volume());
        let (min_side, max_side) = (1, 7);
        for item in &items {
            for side in item.base_size() {
                assert!(side >= min_side && side <= max_side, "side {}", side);
            }
        }
    }

    #[test]
    fn test_truncation_and_reproducibility() {
        let entry = entry();
        let a = CuttingGenerator::with_seed(4).generate(&entry, 5).unwrap();
        let b = CuttingGenerator::with_seed(4).generate(&entry, 5).unwrap();
        assert!(a.len() <= 5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let entry = entry();
        let mut generator = CuttingGenerator::with_seed(1).with_side_limits(20, 30);
        assert!(generator.generate(&entry, 10).is_err());
    }
}
