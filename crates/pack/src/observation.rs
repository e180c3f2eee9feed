//! Channel-stacked observation tensor handed to the oracle.

/// A stack of `channels` planes, each `width x depth` cells, stored row-major
/// (`channel`, then `x`, then `y`).
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    width: usize,
    depth: usize,
    channels: usize,
    data: Vec<f32>,
}

impl Observation {
    /// Creates an empty stack.
    pub fn new(width: usize, depth: usize) -> Self {
        Self {
            width,
            depth,
            channels: 0,
            data: Vec::new(),
        }
    }

    /// Creates an empty stack with room for `channels` planes.
    pub fn with_capacity(width: usize, depth: usize, channels: usize) -> Self {
        Self {
            width,
            depth,
            channels: 0,
            data: Vec::with_capacity(width * depth * channels),
        }
    }

    /// Plane extent along x.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Plane extent along y.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of planes.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Raw values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// One plane.
    pub fn plane(&self, channel: usize) -> &[f32] {
        let n = self.width * self.depth;
        &self.data[channel * n..(channel + 1) * n]
    }

    /// Value at `(channel, x, y)`.
    pub fn get(&self, channel: usize, x: usize, y: usize) -> f32 {
        self.plane(channel)[x * self.depth + y]
    }

    /// Appends a constant plane.
    pub fn push_constant(&mut self, value: f32) {
        self.data
            .extend(std::iter::repeat(value).take(self.width * self.depth));
        self.channels += 1;
    }

    /// Appends a plane computed per cell.
    pub fn push_with(&mut self, mut cell: impl FnMut(usize, usize) -> f32) {
        for x in 0..self.width {
            for y in 0..self.depth {
                self.data.push(cell(x, y));
            }
        }
        self.channels += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planes_are_stacked_in_order() {
        let mut obs = Observation::with_capacity(3, 2, 2);
        obs.push_constant(1.5);
        obs.push_with(|x, y| (x * 10 + y) as f32);
        assert_eq!(obs.channels(), 2);
        assert_eq!(obs.data().len(), 12);
        assert_eq!(obs.get(0, 2, 1), 1.5);
        assert_eq!(obs.get(1, 2, 1), 21.0);
        assert_eq!(obs.plane(1), &[0.0, 1.0, 10.0, 11.0, 20.0, 21.0]);
    }
}
