//! Dense action encoding.
//!
//! An action is `(container, rotation, x, y)`. Ids are laid out container-major
//! so that the legality mask of one container is a contiguous slice:
//!
//! ```text
//! id = ((container * R + rotation) * X + x) * Y + y
//! ```
//!
//! where `R` is the number of rotations and `X x Y` the largest catalog floor.

use cartonize_core::{Catalog, ContainerId, Error, Result, Rotation};

/// A decoded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action {
    /// Catalog type to drop into.
    pub container: ContainerId,
    /// Rotation applied to the item.
    pub rotation: Rotation,
    /// Floor anchor along x.
    pub x: usize,
    /// Floor anchor along y.
    pub y: usize,
}

/// Bijection between actions and dense ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpace {
    containers: usize,
    width: usize,
    depth: usize,
}

impl ActionSpace {
    /// Action space spanning every catalog type and all four rotations.
    pub fn for_catalog(catalog: &Catalog) -> Self {
        let [width, depth, _] = catalog.max_grid();
        Self {
            containers: catalog.len(),
            width,
            depth,
        }
    }

    /// Number of rotations in the encoding.
    pub fn rotations(&self) -> usize {
        Rotation::ALL.len()
    }

    /// Floor extent along x.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Floor extent along y.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of container types.
    pub fn containers(&self) -> usize {
        self.containers
    }

    /// Ids per container type.
    pub fn per_container(&self) -> usize {
        self.rotations() * self.width * self.depth
    }

    /// Total number of ids.
    pub fn len(&self) -> usize {
        self.containers * self.per_container()
    }

    /// Returns true if the space holds no ids.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encodes an action, or `None` if it lies outside the space.
    pub fn encode(&self, action: Action) -> Option<usize> {
        if action.container >= self.containers || action.x >= self.width || action.y >= self.depth {
            return None;
        }
        Some(((action.container * self.rotations() + action.rotation.index()) * self.width
            + action.x)
            * self.depth
            + action.y)
    }

    /// Decodes an id.
    pub fn decode(&self, id: usize) -> Result<Action> {
        if id >= self.len() {
            return Err(Error::UnknownAction(id));
        }
        let y = id % self.depth;
        let rest = id / self.depth;
        let x = rest % self.width;
        let rest = rest / self.width;
        let rotation = Rotation::from_index(rest % self.rotations())
            .ok_or_else(|| Error::Internal(format!("rotation index out of range for id {}", id)))?;
        let container = rest / self.rotations();
        Ok(Action {
            container,
            rotation,
            x,
            y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_action_space_size() {
        let space = ActionSpace::for_catalog(&Catalog::reference());
        assert_eq!(space.len(), 18 * 4 * 48 * 24);
        assert_eq!(space.per_container(), 4 * 48 * 24);
    }

    #[test]
    fn test_encode_decode_corners() {
        let space = ActionSpace::for_catalog(&Catalog::reference());
        let first = Action {
            container: 0,
            rotation: Rotation::None,
            x: 0,
            y: 0,
        };
        assert_eq!(space.encode(first).unwrap(), 0);

        let last = Action {
            container: 17,
            rotation: Rotation::SwapYZ,
            x: 47,
            y: 23,
        };
        let id = space.encode(last).unwrap();
        assert_eq!(id, space.len() - 1);
        assert_eq!(space.decode(id).unwrap(), last);

        let mid = Action {
            container: 5,
            rotation: Rotation::SwapXZ,
            x: 3,
            y: 17,
        };
        assert_eq!(space.decode(space.encode(mid).unwrap()).unwrap(), mid);
    }

    #[test]
    fn test_out_of_range() {
        let space = ActionSpace::for_catalog(&Catalog::reference());
        assert!(matches!(space.decode(space.len()), Err(Error::UnknownAction(_))));
        let bad = Action {
            container: 0,
            rotation: Rotation::None,
            x: 48,
            y: 0,
        };
        assert!(space.encode(bad).is_none());
    }
}
