//! Order items (boxes).
//!
//! An item keeps its axis-sorted base dimensions twice: the real values used for
//! reporting, and the integer grid projection (rounded up) used for placement.
//! Rotations are expressed relative to the base orientation. Once placed, an
//! item is frozen.

use cartonize_core::{
    ceil_to_grid, grid_volume, sort_desc, ContainerId, Error, PackedItem, Result, Rotation,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where an item ended up.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assignment {
    /// Catalog type of the container.
    pub container_id: ContainerId,
    /// Instance label of the container.
    pub label: String,
}

/// A single unit of a customer order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Item {
    /// Position in the prepared order.
    pub id: usize,
    /// Display name.
    pub name: String,
    /// Source order identifier.
    pub order_id: String,
    base_real: [f64; 3],
    base_grid: [usize; 3],
    weight: f64,
    rotation: Rotation,
    position: Option<[usize; 3]>,
    assignment: Option<Assignment>,
}

impl Item {
    /// Creates an item from real dimensions (any order) and weight.
    pub fn new(
        id: usize,
        name: impl Into<String>,
        order_id: impl Into<String>,
        dims: [f64; 3],
        weight: f64,
    ) -> Result<Self> {
        let name = name.into();
        if dims.iter().any(|&v| !v.is_finite() || v <= 0.0) {
            return Err(Error::InvalidItem(format!(
                "{}: dimensions must be positive, got {:?}",
                name, dims
            )));
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidItem(format!(
                "{}: weight must be non-negative, got {}",
                name, weight
            )));
        }
        let base_real = sort_desc(dims);
        Ok(Self {
            id,
            name,
            order_id: order_id.into(),
            base_real,
            base_grid: ceil_to_grid(base_real),
            weight,
            rotation: Rotation::None,
            position: None,
            assignment: None,
        })
    }

    /// Creates an item directly on the grid; the size is used as given.
    pub fn on_grid(id: usize, name: impl Into<String>, size: [usize; 3], weight: f64) -> Self {
        Self {
            id,
            name: name.into(),
            order_id: String::new(),
            base_real: size.map(|v| v as f64),
            base_grid: size,
            weight,
            rotation: Rotation::None,
            position: None,
            assignment: None,
        }
    }

    /// Sets the source order identifier.
    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = order_id.into();
        self
    }

    /// Grid size in the current rotation.
    pub fn size(&self) -> [usize; 3] {
        self.rotation.apply(self.base_grid)
    }

    /// Grid size the item would have under a rotation.
    pub fn size_for(&self, rotation: Rotation) -> [usize; 3] {
        rotation.apply(self.base_grid)
    }

    /// Real size in the current rotation.
    pub fn real_size(&self) -> [f64; 3] {
        self.rotation.apply(self.base_real)
    }

    /// Axis-sorted grid size, independent of rotation.
    pub fn base_size(&self) -> [usize; 3] {
        self.base_grid
    }

    /// Axis-sorted real size, independent of rotation.
    pub fn base_real_size(&self) -> [f64; 3] {
        self.base_real
    }

    /// Item weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Grid volume.
    pub fn volume(&self) -> f64 {
        grid_volume(self.base_grid)
    }

    /// Real volume.
    pub fn real_volume(&self) -> f64 {
        self.base_real[0] * self.base_real[1] * self.base_real[2]
    }

    /// Current rotation.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Front-left-bottom corner once placed.
    pub fn position(&self) -> Option<[usize; 3]> {
        self.position
    }

    /// Container assignment once placed.
    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    /// Returns true once the item has been placed.
    pub fn is_placed(&self) -> bool {
        self.position.is_some()
    }

    /// Rotates the item relative to its axis-sorted base orientation.
    pub fn rotate(&mut self, rotation: Rotation) -> Result<()> {
        if self.is_placed() {
            return Err(Error::ItemFrozen(self.name.clone()));
        }
        self.rotation = rotation;
        Ok(())
    }

    /// Returns a rotated, unplaced copy.
    pub fn rotated(&self, rotation: Rotation) -> Self {
        let mut copy = self.clone();
        copy.position = None;
        copy.assignment = None;
        copy.rotation = rotation;
        copy
    }

    /// Fixes the item at a grid position. Placing is a one-way transition.
    pub(crate) fn place(&mut self, position: [usize; 3]) -> Result<()> {
        if self.is_placed() {
            return Err(Error::ItemFrozen(self.name.clone()));
        }
        self.position = Some(position);
        Ok(())
    }

    /// Records the container the item was packed into.
    pub(crate) fn assign(&mut self, container_id: ContainerId, label: impl Into<String>) {
        self.assignment = Some(Assignment {
            container_id,
            label: label.into(),
        });
    }

    /// Report view of a placed item.
    pub fn to_packed(&self) -> PackedItem {
        PackedItem {
            name: self.name.clone(),
            order_id: self.order_id.clone(),
            position: self.position.unwrap_or([0, 0, 0]),
            size: self.size(),
            real_size: self.real_size(),
            weight: self.weight,
            rotation: self.rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_sorts_and_rounds_up() {
        let item = Item::new(0, "A", "ORDER_1", [3.2, 10.0, 7.5], 2.0).unwrap();
        assert_eq!(item.base_real_size(), [10.0, 7.5, 3.2]);
        assert_eq!(item.size(), [10, 8, 4]);
        assert_eq!(item.volume(), 320.0);
        assert!((item.real_volume() - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_item_rejected() {
        assert!(Item::new(0, "A", "O", [0.0, 1.0, 1.0], 1.0).is_err());
        assert!(Item::new(0, "A", "O", [1.0, 1.0, 1.0], -1.0).is_err());
        assert!(Item::new(0, "A", "O", [f64::NAN, 1.0, 1.0], 1.0).is_err());
    }

    #[test]
    fn test_rotate_is_relative_to_base() {
        let mut item = Item::on_grid(0, "A", [10, 8, 4], 1.0);
        item.rotate(Rotation::SwapXZ).unwrap();
        assert_eq!(item.size(), [4, 8, 10]);
        item.rotate(Rotation::SwapXY).unwrap();
        assert_eq!(item.size(), [8, 10, 4]);
        assert_eq!(item.volume(), 320.0);
    }

    #[test]
    fn test_placed_item_is_frozen() {
        let mut item = Item::on_grid(0, "A", [2, 2, 2], 1.0);
        item.place([0, 0, 0]).unwrap();
        assert!(matches!(item.rotate(Rotation::SwapXY), Err(Error::ItemFrozen(_))));
        assert!(item.place([1, 1, 1]).is_err());
        assert_eq!(item.position(), Some([0, 0, 0]));

        let copy = item.rotated(Rotation::SwapYZ);
        assert!(!copy.is_placed());
    }
}
