//! Axis conventions, rotations and grid projections.
//!
//! Coordinates follow a front-left-bottom origin:
//!
//! - `x`: length (small = left, large = right)
//! - `y`: width/depth (small = front, large = far)
//! - `z`: height (small = low, large = high)
//!
//! Item and container dimensions are axis-sorted so that `x` holds the longest
//! side and `z` the shortest before any rotation is applied.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the four axis-swap rotations an item may take before placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rotation {
    /// Keep the item as is.
    #[default]
    None,
    /// Swap the X and Y sides.
    SwapXY,
    /// Swap the X and Z sides.
    SwapXZ,
    /// Swap the Y and Z sides.
    SwapYZ,
}

impl Rotation {
    /// All rotations in action-space order.
    pub const ALL: [Rotation; 4] = [
        Rotation::None,
        Rotation::SwapXY,
        Rotation::SwapXZ,
        Rotation::SwapYZ,
    ];

    /// Index of this rotation in [`Rotation::ALL`].
    pub fn index(self) -> usize {
        match self {
            Rotation::None => 0,
            Rotation::SwapXY => 1,
            Rotation::SwapXZ => 2,
            Rotation::SwapYZ => 3,
        }
    }

    /// Rotation for an index in [`Rotation::ALL`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Applies the axis swap to a size triple.
    pub fn apply<T: Copy>(self, dims: [T; 3]) -> [T; 3] {
        let [x, y, z] = dims;
        match self {
            Rotation::None => [x, y, z],
            Rotation::SwapXY => [y, x, z],
            Rotation::SwapXZ => [z, y, x],
            Rotation::SwapYZ => [x, z, y],
        }
    }

    /// Short human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Rotation::None => "None",
            Rotation::SwapXY => "X<->Y",
            Rotation::SwapXZ => "X<->Z",
            Rotation::SwapYZ => "Y<->Z",
        }
    }
}

/// Sorts a dimension triple so that the largest side comes first.
pub fn sort_desc(dims: [f64; 3]) -> [f64; 3] {
    let mut sorted = dims;
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

/// Projects item dimensions onto the integer grid (rounded up).
pub fn ceil_to_grid(dims: [f64; 3]) -> [usize; 3] {
    dims.map(|v| v.max(0.0).ceil() as usize)
}

/// Projects container dimensions onto the integer grid (rounded down).
pub fn floor_to_grid(dims: [f64; 3]) -> [usize; 3] {
    dims.map(|v| v.max(0.0).floor() as usize)
}

/// Volume of an integer grid box.
pub fn grid_volume(dims: [usize; 3]) -> f64 {
    (dims[0] * dims[1] * dims[2]) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_swaps_two_axes() {
        let dims = [10, 8, 4];
        assert_eq!(Rotation::None.apply(dims), [10, 8, 4]);
        assert_eq!(Rotation::SwapXY.apply(dims), [8, 10, 4]);
        assert_eq!(Rotation::SwapXZ.apply(dims), [4, 8, 10]);
        assert_eq!(Rotation::SwapYZ.apply(dims), [10, 4, 8]);
    }

    #[test]
    fn test_rotation_is_involution() {
        let dims = [3.5, 2.0, 1.25];
        for rotation in Rotation::ALL {
            assert_eq!(rotation.apply(rotation.apply(dims)), dims);
        }
    }

    #[test]
    fn test_rotation_index_round_trip() {
        for (i, rotation) in Rotation::ALL.iter().enumerate() {
            assert_eq!(rotation.index(), i);
            assert_eq!(Rotation::from_index(i), Some(*rotation));
        }
        assert_eq!(Rotation::from_index(4), None);
    }

    #[test]
    fn test_grid_projection() {
        let dims = sort_desc([5.5, 12.0, 9.0]);
        assert_eq!(dims, [12.0, 9.0, 5.5]);
        assert_eq!(ceil_to_grid(dims), [12, 9, 6]);
        assert_eq!(floor_to_grid(dims), [12, 9, 5]);
        assert_eq!(floor_to_grid([0.5, 7.25, 12.0]), [0, 7, 12]);
    }
}
