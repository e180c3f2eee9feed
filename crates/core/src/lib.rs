//! # Cartonize Core
//!
//! Core types shared by the cartonize order packing engine.
//!
//! ## Core Components
//!
//! - **Catalog**: [`Catalog`], [`CatalogEntry`], [`ContainerSpec`] - carton types and
//!   their integer grid projection
//! - **Configuration**: [`PackingConfig`], [`SupportThresholds`] - one immutable value
//!   handed to every packer
//! - **Geometry**: [`Rotation`] and grid projection helpers
//! - **Outcome**: [`PackingOutcome`], [`PackedContainer`], [`PackedItem`]
//!
//! ## Configuration
//!
//! ```rust
//! use cartonize_core::PackingConfig;
//!
//! let config = PackingConfig::new()
//!     .with_simulations(8)
//!     .with_search_depth(12)
//!     .with_seed(42);
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support and JSON catalog loading

pub mod catalog;
pub mod config;
pub mod error;
pub mod geometry;
pub mod result;

// Re-exports
pub use catalog::{Catalog, CatalogEntry, ContainerId, ContainerSpec};
pub use config::{PackingConfig, SupportThresholds};
pub use error::{Error, Result};
pub use geometry::{ceil_to_grid, floor_to_grid, grid_volume, sort_desc, Rotation};
pub use result::{InstanceLabels, PackedContainer, PackedItem, PackingOutcome, Strategy};
