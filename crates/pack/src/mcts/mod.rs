//! Monte Carlo tree search refinement.
//!
//! - [`SearchTree`]: arena of [`SearchNode`]s with backup, selection and re-rooting
//! - [`TreeSearch`]: simulation passes over a cloned [`PackingEnv`](crate::PackingEnv)
//!   guided by an [`Oracle`](crate::Oracle)

mod node;
mod search;
mod tree;

pub use node::{NodeId, SearchNode};
pub use search::{SearchStats, TreeSearch};
pub use tree::SearchTree;
