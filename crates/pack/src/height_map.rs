//! Height maps and the placement support rule.
//!
//! A height map stores, for every `(x, y)` cell of a container floor, the height
//! of the highest occupied point above it. Items are always lowered onto the
//! highest cell of their footprint, so a placement is described by its floor
//! anchor alone.
//!
//! # Support Rule
//!
//! A footprint `[x, x+dx) x [y, y+dy)` is legal when, in order:
//!
//! 1. it lies inside the floor;
//! 2. at least `min_supported_corners` of its four corner cells sit at the
//!    highest corner height `rm`;
//! 3. the item fits under the ceiling when lowered onto the highest cell `h`;
//! 4. the share `r` of cells at height `h` exceeds the primary threshold, or
//!    `rm == h` and `r` exceeds the three-corner threshold with exactly three
//!    supported corners, or the four-corner threshold with four.

use cartonize_core::SupportThresholds;

/// Per-cell height of the highest occupied point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightMap {
    width: usize,
    depth: usize,
    cells: Vec<usize>,
}

impl HeightMap {
    /// Creates a flat height map.
    pub fn new(width: usize, depth: usize) -> Self {
        Self {
            width,
            depth,
            cells: vec![0; width * depth],
        }
    }

    /// Creates a height map from row-major cells (`x` major, `y` minor).
    pub fn from_cells(width: usize, depth: usize, cells: Vec<usize>) -> Option<Self> {
        (cells.len() == width * depth).then_some(Self {
            width,
            depth,
            cells,
        })
    }

    /// Floor extent along x.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Floor extent along y.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Height at a cell.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> usize {
        self.cells[x * self.depth + y]
    }

    /// Sets the height at a cell.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, h: usize) {
        self.cells[x * self.depth + y] = h;
    }

    /// Highest cell in a footprint. The footprint must be in bounds.
    pub fn max_in(&self, x: usize, y: usize, dx: usize, dy: usize) -> usize {
        let mut max_h = 0;
        for i in x..x + dx {
            for j in y..y + dy {
                max_h = max_h.max(self.get(i, j));
            }
        }
        max_h
    }

    /// Raises the whole footprint to `max(h_max, top)`.
    pub fn stamp(&mut self, x: usize, y: usize, dx: usize, dy: usize, top: usize) {
        let level = self.max_in(x, y, dx, dy).max(top);
        for i in x..x + dx {
            for j in y..y + dy {
                self.set(i, j, level);
            }
        }
    }

    /// Highest cell over the whole map.
    pub fn peak(&self) -> usize {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Evaluates the support rule for an item of grid size `size` at `(x, y)`
    /// under a ceiling of `ceiling`. Returns the resting height when legal.
    pub fn support_height(
        &self,
        x: usize,
        y: usize,
        size: [usize; 3],
        ceiling: usize,
        rule: &SupportRule,
    ) -> Option<usize> {
        let [dx, dy, dz] = size;
        if dx == 0 || dy == 0 || x + dx > self.width || y + dy > self.depth {
            return None;
        }

        let corners = [
            self.get(x, y),
            self.get(x + dx - 1, y),
            self.get(x, y + dy - 1),
            self.get(x + dx - 1, y + dy - 1),
        ];
        let corner_max = corners.iter().copied().max().unwrap_or(0);
        let supported_corners = corners.iter().filter(|&&h| h == corner_max).count();
        if supported_corners < rule.min_supported_corners {
            return None;
        }

        let base = self.max_in(x, y, dx, dy);
        if base + dz > ceiling {
            return None;
        }

        let mut at_base = 0usize;
        for i in x..x + dx {
            for j in y..y + dy {
                if self.get(i, j) == base {
                    at_base += 1;
                }
            }
        }
        let ratio = at_base as f64 / (dx * dy) as f64;

        let t = &rule.thresholds;
        let accepted = ratio > t.primary
            || (corner_max == base
                && ((supported_corners == 3 && ratio > t.three_corners)
                    || (supported_corners == 4 && ratio > t.four_corners)));
        accepted.then_some(base)
    }
}

/// Parameters of the support rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportRule {
    /// Corners that must sit at the highest corner height.
    pub min_supported_corners: usize,
    /// Area-support ratios.
    pub thresholds: SupportThresholds,
}

impl SupportRule {
    /// Reads the rule out of a packing configuration.
    pub fn from_config(config: &cartonize_core::PackingConfig) -> Self {
        Self {
            min_supported_corners: config.min_supported_corners,
            thresholds: config.support_thresholds,
        }
    }
}

impl Default for SupportRule {
    fn default() -> Self {
        Self {
            min_supported_corners: 3,
            thresholds: SupportThresholds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 6x6 map whose listed cells are raised to `h`.
    fn map_with(raised: &[(usize, usize)], h: usize) -> HeightMap {
        let mut map = HeightMap::new(6, 6);
        for &(x, y) in raised {
            map.set(x, y, h);
        }
        map
    }

    fn non_corner_cells(count: usize) -> Vec<(usize, usize)> {
        (0..6)
            .flat_map(|x| (0..6).map(move |y| (x, y)))
            .filter(|&(x, y)| !((x == 0 || x == 5) && (y == 0 || y == 5)))
            .take(count)
            .collect()
    }

    #[test]
    fn test_empty_floor_accepts_full_footprint() {
        let map = HeightMap::new(10, 10);
        let rule = SupportRule::default();
        assert_eq!(map.support_height(0, 0, [10, 10, 5], 5, &rule), Some(0));
        assert_eq!(map.support_height(0, 0, [10, 10, 6], 5, &rule), None);
        assert_eq!(map.support_height(1, 0, [10, 10, 5], 5, &rule), None);
        assert_eq!(map.support_height(0, 0, [0, 10, 5], 5, &rule), None);
    }

    #[test]
    fn test_primary_threshold_boundary() {
        // Corners stay at 0 while an interior plateau sits at 1: only the
        // primary ratio can accept.
        let rule = SupportRule::default();
        let pass = map_with(&non_corner_cells(12), 1);
        assert_eq!(pass.support_height(0, 0, [6, 6, 1], 10, &rule), Some(1));

        let fail = map_with(&non_corner_cells(11), 1);
        assert_eq!(fail.support_height(0, 0, [6, 6, 1], 10, &rule), None);
    }

    #[test]
    fn test_four_corner_threshold_boundary() {
        let rule = SupportRule::default();
        let corners = [(0, 0), (5, 0), (0, 5), (5, 5)];

        let mut raised: Vec<_> = corners.to_vec();
        raised.extend(non_corner_cells(3));
        let pass = map_with(&raised, 2);
        assert_eq!(pass.support_height(0, 0, [6, 6, 1], 10, &rule), Some(2));

        let mut raised: Vec<_> = corners.to_vec();
        raised.extend(non_corner_cells(1));
        let fail = map_with(&raised, 2);
        assert_eq!(fail.support_height(0, 0, [6, 6, 1], 10, &rule), None);
    }

    #[test]
    fn test_three_corner_threshold_boundary() {
        let rule = SupportRule::default();
        let corners = [(0, 0), (5, 0), (0, 5)];

        let mut raised: Vec<_> = corners.to_vec();
        raised.extend(non_corner_cells(8));
        let pass = map_with(&raised, 2);
        assert_eq!(pass.support_height(0, 0, [6, 6, 1], 10, &rule), Some(2));

        let mut raised: Vec<_> = corners.to_vec();
        raised.extend(non_corner_cells(7));
        let fail = map_with(&raised, 2);
        assert_eq!(fail.support_height(0, 0, [6, 6, 1], 10, &rule), None);
    }

    #[test]
    fn test_two_corners_rejected_despite_full_support() {
        let rule = SupportRule::default();
        let mut map = HeightMap::new(6, 6);
        for x in 0..6 {
            for y in 0..6 {
                map.set(x, y, 2);
            }
        }
        map.set(0, 0, 0);
        map.set(5, 5, 0);
        assert_eq!(map.support_height(0, 0, [6, 6, 1], 10, &rule), None);

        let relaxed = SupportRule {
            min_supported_corners: 2,
            ..rule
        };
        assert_eq!(map.support_height(0, 0, [6, 6, 1], 10, &relaxed), Some(2));
    }

    #[test]
    fn test_stamp_levels_footprint() {
        let mut map = HeightMap::new(4, 4);
        map.set(1, 1, 3);
        map.stamp(0, 0, 2, 2, 2);
        assert_eq!(map.get(0, 0), 3);
        assert_eq!(map.get(1, 1), 3);
        map.stamp(2, 2, 2, 2, 5);
        assert_eq!(map.get(3, 3), 5);
        assert_eq!(map.get(0, 3), 0);
        assert_eq!(map.peak(), 5);
    }
}
