//! Packing and search configuration.

use crate::geometry::Rotation;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Area-support ratios accepted by the placement legality check.
///
/// A placement is accepted when the fraction of the footprint resting on the
/// footprint's highest cell exceeds `primary`, or exceeds `three_corners` with
/// exactly three supported corners at that height, or exceeds `four_corners`
/// with all four corners supported.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SupportThresholds {
    /// Ratio accepted regardless of corner support.
    pub primary: f64,
    /// Ratio accepted with three corners at the base height.
    pub three_corners: f64,
    /// Ratio accepted with four corners at the base height.
    pub four_corners: f64,
}

impl Default for SupportThresholds {
    fn default() -> Self {
        Self {
            primary: 0.95 / 3.0,
            three_corners: 0.85 / 3.0,
            four_corners: 0.50 / 3.0,
        }
    }
}

/// Immutable configuration shared by every packing component.
///
/// Build it once, validate it, and hand it to the packers and the search
/// (usually wrapped in an `Arc`).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackingConfig {
    /// Minimum number of footprint corners that must rest at the highest corner.
    pub min_supported_corners: usize,

    /// Area-support ratios.
    pub support_thresholds: SupportThresholds,

    /// Rotations the search may choose from.
    pub allowed_rotations: Vec<Rotation>,

    /// Exploration constant of the selection score.
    pub c_puct: f64,

    /// Weight of oracle priors against a uniform prior (0.0 - 1.0).
    pub credit: f64,

    /// Discount factor applied during backup.
    pub gamma: f64,

    /// Simulation passes per committed decision.
    pub simulations: usize,

    /// Maximum number of simulated steps below the root.
    pub search_depth: usize,

    /// Heuristic container count above which refinement is attempted.
    pub refine_container_threshold: usize,

    /// Largest order (in units) that is refined with the search.
    pub refine_max_items: usize,

    /// Largest order (in units) accepted at all.
    pub max_order_items: usize,

    /// Divisor applied to volumes in oracle observations.
    pub volume_scale: f32,

    /// Seed for search tie-breaking (None = from entropy).
    pub seed: Option<u64>,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            min_supported_corners: 3,
            support_thresholds: SupportThresholds::default(),
            allowed_rotations: Rotation::ALL.to_vec(),
            c_puct: 1.0,
            credit: 1.0,
            gamma: 1.0,
            simulations: 3,
            search_depth: 10,
            refine_container_threshold: 6,
            refine_max_items: 20,
            max_order_items: 700,
            volume_scale: 20.0,
            seed: None,
        }
    }
}

impl PackingConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum number of supported corners (1 - 4).
    pub fn with_min_supported_corners(mut self, corners: usize) -> Self {
        self.min_supported_corners = corners.clamp(1, 4);
        self
    }

    /// Sets the area-support thresholds.
    pub fn with_support_thresholds(mut self, thresholds: SupportThresholds) -> Self {
        self.support_thresholds = thresholds;
        self
    }

    /// Sets the rotations available to the search.
    pub fn with_allowed_rotations(mut self, rotations: Vec<Rotation>) -> Self {
        self.allowed_rotations = rotations;
        self
    }

    /// Sets the exploration constant.
    pub fn with_c_puct(mut self, c: f64) -> Self {
        self.c_puct = c;
        self
    }

    /// Sets the prior credit.
    pub fn with_credit(mut self, credit: f64) -> Self {
        self.credit = credit.clamp(0.0, 1.0);
        self
    }

    /// Sets the discount factor.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the simulation budget per decision.
    pub fn with_simulations(mut self, simulations: usize) -> Self {
        self.simulations = simulations.max(1);
        self
    }

    /// Sets the maximum search depth.
    pub fn with_search_depth(mut self, depth: usize) -> Self {
        self.search_depth = depth.max(1);
        self
    }

    /// Sets the refinement gate on the heuristic container count.
    pub fn with_refine_container_threshold(mut self, threshold: usize) -> Self {
        self.refine_container_threshold = threshold;
        self
    }

    /// Sets the largest order size that is refined.
    pub fn with_refine_max_items(mut self, items: usize) -> Self {
        self.refine_max_items = items;
        self
    }

    /// Sets the largest accepted order size.
    pub fn with_max_order_items(mut self, items: usize) -> Self {
        self.max_order_items = items;
        self
    }

    /// Sets the RNG seed used for tie-breaking.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if !(1..=4).contains(&self.min_supported_corners) {
            return Err(Error::InvalidConfig(format!(
                "min_supported_corners must be in 1..=4, got {}",
                self.min_supported_corners
            )));
        }
        if self.allowed_rotations.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one rotation must be allowed".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.credit) {
            return Err(Error::InvalidConfig(format!(
                "credit must be in [0, 1], got {}",
                self.credit
            )));
        }
        if !(self.gamma > 0.0 && self.gamma <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "gamma must be in (0, 1], got {}",
                self.gamma
            )));
        }
        if !self.c_puct.is_finite() || self.c_puct < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "c_puct must be a non-negative number, got {}",
                self.c_puct
            )));
        }
        if self.simulations == 0 || self.search_depth == 0 {
            return Err(Error::InvalidConfig(
                "simulations and search_depth must be positive".into(),
            ));
        }
        if self.volume_scale <= 0.0 {
            return Err(Error::InvalidConfig("volume_scale must be positive".into()));
        }
        Ok(())
    }
}
