//! Search tree nodes.

use std::collections::BTreeMap;

/// Arena index of a node.
pub type NodeId = usize;

/// One node of the search tree.
///
/// Statistics follow the usual PUCT bookkeeping: `visits` (N), `total_value`
/// (W), `mean_value` (Q = W / N) and the prior `prior` (P) of the edge that
/// leads here.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchNode {
    /// Parent node; `None` for the root.
    pub parent: Option<NodeId>,
    /// Children keyed by action id.
    pub children: BTreeMap<usize, NodeId>,
    /// Visit count.
    pub visits: u32,
    /// Accumulated backed-up value.
    pub total_value: f64,
    /// Mean backed-up value.
    pub mean_value: f64,
    /// Prior of the incoming edge.
    pub prior: f64,
    /// Episode ended on the incoming edge.
    pub terminal: bool,
    /// Reward collected on the incoming edge.
    pub reward: f64,
    /// Oracle value estimate, set on expansion.
    pub value: f64,
}

impl SearchNode {
    /// Creates an unvisited node.
    pub fn new(parent: Option<NodeId>, prior: f64) -> Self {
        Self {
            parent,
            children: BTreeMap::new(),
            visits: 0,
            total_value: 0.0,
            mean_value: 0.0,
            prior,
            terminal: false,
            reward: 0.0,
            value: 0.0,
        }
    }

    /// Returns true once children have been created.
    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }

    /// Adds one backed-up value.
    pub fn record(&mut self, value: f64) {
        self.visits += 1;
        self.total_value += value;
        self.mean_value = self.total_value / self.visits as f64;
    }
}
