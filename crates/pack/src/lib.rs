//! # Cartonize Pack
//!
//! Multi-container 3D order packing on an integer grid.
//!
//! An order is expanded into unit items and packed into catalog cartons by a
//! greedy corner-anchored heuristic. Small mixed orders that needed many
//! cartons are then replayed as a sequential packing episode driven by an
//! oracle-guided Monte Carlo tree search; the search result replaces the
//! heuristic one only if it uses strictly fewer cartons.
//!
//! ## Features
//!
//! - Height-map containers with a corner and area support rule
//! - Greedy partitioning heuristic choosing the smallest fitting carton
//! - Packing episode with a dense action space, legality masks and observations
//! - Arena-backed PUCT search with tree reuse between decisions
//! - Pluggable policy/value [`Oracle`]
//! - Synthetic order generation with a known perfect packing
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use cartonize_pack::{Catalog, OrderLine, OrderPacker, PackingConfig, UniformOracle};
//!
//! let packer = OrderPacker::new(
//!     Arc::new(PackingConfig::default()),
//!     Arc::new(Catalog::reference()),
//! )
//! .unwrap();
//!
//! let lines = vec![
//!     OrderLine::new("MUG", "ORDER-1", [12.0, 9.0, 10.0], 0.4).with_quantity(2),
//!     OrderLine::new("PLATE", "ORDER-1", [20.0, 18.0, 3.0], 0.9),
//! ];
//! let outcome = packer.pack_order(&lines, Some(&UniformOracle::new())).unwrap();
//!
//! assert_eq!(outcome.item_count(), 3);
//! println!("{}", outcome.summary());
//! ```
//!
//! ## Driving an Episode
//!
//! ```rust
//! use std::sync::Arc;
//! use cartonize_pack::{Catalog, Item, PackingConfig, PackingEnv};
//!
//! let items = vec![Item::on_grid(0, "A", [4, 3, 2], 1.0)];
//! let mut env = PackingEnv::new(
//!     Arc::new(PackingConfig::default()),
//!     Arc::new(Catalog::reference()),
//!     items,
//!     &[0],
//! )
//! .unwrap();
//!
//! let action = env.legal_actions().iter().position(|&legal| legal).unwrap();
//! let step = env.step(action).unwrap();
//! assert!(step.done);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod action;
pub mod container;
pub mod container_set;
pub mod env;
pub mod height_map;
pub mod heuristic;
pub mod item;
pub mod mcts;
pub mod observation;
pub mod oracle;
pub mod order;
pub mod packer;
pub mod synthetic;

// Re-exports
pub use action::{Action, ActionSpace};
pub use container::Container;
pub use container_set::{ContainerSet, Placement};
pub use env::{EpisodeState, PackingEnv, StepOutcome, Termination};
pub use height_map::{HeightMap, SupportRule};
pub use heuristic::{AnchoredPlacement, HeuristicPacker, Partition};
pub use item::{Assignment, Item};
pub use mcts::{NodeId, SearchNode, SearchStats, SearchTree, TreeSearch};
pub use observation::Observation;
pub use oracle::{Oracle, Prediction, UniformOracle};
pub use order::{Order, OrderLine};
pub use packer::{select_outcome, OrderPacker};
pub use synthetic::CuttingGenerator;
pub use cartonize_core::{
    Catalog, CatalogEntry, ContainerId, ContainerSpec, Error, PackedContainer, PackedItem,
    PackingConfig, PackingOutcome, Result, Rotation, Strategy, SupportThresholds,
};
