//! Arena-backed search tree.
//!
//! Nodes live in a `Vec<Option<SearchNode>>` and refer to each other by index.
//! Freed slots go on a free list and are reused by later allocations, so
//! re-rooting the tree after every committed decision does not grow the arena.

use super::node::{NodeId, SearchNode};
use cartonize_core::{Error, Result};
use rand::Rng;

/// Relative tolerance under which two selection scores count as tied.
const TIE_TOLERANCE: f64 = 1e-5;

fn is_close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= TIE_TOLERANCE * a.abs().max(b.abs())
}

/// Search tree with a movable root.
#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<Option<SearchNode>>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTree {
    /// Creates a tree holding a single root with prior 1.
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(SearchNode::new(None, 1.0))],
            free: Vec::new(),
            root: 0,
        }
    }

    /// Current root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Returns true if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of arena slots, live or free.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Result<&SearchNode> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::Internal(format!("search node {} is not live", id)))
    }

    /// Mutable node by id.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut SearchNode> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::Internal(format!("search node {} is not live", id)))
    }

    fn alloc(&mut self, node: SearchNode) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    /// Creates a child of `parent` under `action`.
    pub fn add_child(&mut self, parent: NodeId, action: usize, prior: f64) -> Result<NodeId> {
        self.node(parent)?;
        let id = self.alloc(SearchNode::new(Some(parent), prior));
        self.node_mut(parent)?.children.insert(action, id);
        Ok(id)
    }

    /// Child of `parent` under `action`.
    pub fn child(&self, parent: NodeId, action: usize) -> Option<NodeId> {
        self.node(parent).ok()?.children.get(&action).copied()
    }

    /// Propagates `value` from `leaf` to the root.
    ///
    /// At every node on the path the value is first discounted and combined
    /// with the node's edge reward (`value = reward + gamma * value`) and then
    /// recorded.
    pub fn backup(&mut self, leaf: NodeId, value: f64, gamma: f64) -> Result<()> {
        let mut value = value;
        let mut current = Some(leaf);
        while let Some(id) = current {
            let node = self.node_mut(id)?;
            value = node.reward + gamma * value;
            node.record(value);
            current = node.parent;
        }
        Ok(())
    }

    /// Selection score of `child` seen from `parent`.
    pub fn score(parent: &SearchNode, child: &SearchNode, c_puct: f64) -> f64 {
        let exploration = c_puct * child.prior * (parent.visits as f64).sqrt();
        if child.visits > 0 {
            (child.mean_value - parent.mean_value) + exploration / (child.visits as f64 + 1.0)
        } else {
            exploration
        }
    }

    /// Highest-scoring action below `id`; near ties are broken uniformly at
    /// random. Returns `None` for a node without children.
    pub fn choose_best<R: Rng + ?Sized>(
        &self,
        id: NodeId,
        c_puct: f64,
        rng: &mut R,
    ) -> Result<Option<usize>> {
        let parent = self.node(id)?;
        let mut best = f64::NEG_INFINITY;
        let mut best_actions: Vec<usize> = Vec::new();
        for (&action, &child_id) in &parent.children {
            let score = Self::score(parent, self.node(child_id)?, c_puct);
            if is_close(score, best) {
                best_actions.push(action);
            } else if score > best {
                best = score;
                best_actions.clear();
                best_actions.push(action);
            }
        }
        Ok(match best_actions.len() {
            0 => None,
            1 => Some(best_actions[0]),
            n => Some(best_actions[rng.gen_range(0..n)]),
        })
    }

    /// Makes the child under `action` the new root.
    ///
    /// The old root and every sibling subtree are freed; the new root keeps
    /// its own subtree and statistics, loses its parent and gets prior 1.
    pub fn succeed(&mut self, action: usize) -> Result<()> {
        let old_root = self.root;
        let new_root = self.child(old_root, action).ok_or(Error::UnknownAction(action))?;

        let siblings: Vec<NodeId> = self
            .node(old_root)?
            .children
            .values()
            .copied()
            .filter(|&id| id != new_root)
            .collect();
        for id in siblings {
            self.free_subtree(id);
        }
        self.nodes[old_root] = None;
        self.free.push(old_root);

        let root = self.node_mut(new_root)?;
        root.parent = None;
        root.prior = 1.0;
        self.root = new_root;
        Ok(())
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(id).and_then(Option::take) {
                stack.extend(node.children.values().copied());
                self.free.push(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_backup_along_chain() {
        let mut tree = SearchTree::new();
        let a = tree.add_child(tree.root(), 4, 0.5).unwrap();
        let b = tree.add_child(a, 7, 0.5).unwrap();
        tree.node_mut(b).unwrap().reward = 1.0;

        tree.backup(b, 0.5, 0.9).unwrap();

        let leaf = tree.node(b).unwrap();
        assert_eq!(leaf.visits, 1);
        assert!((leaf.mean_value - 1.45).abs() < 1e-12);
        let mid = tree.node(a).unwrap();
        assert!((mid.total_value - 1.305).abs() < 1e-12);
        let root = tree.node(tree.root()).unwrap();
        assert!((root.mean_value - 1.1745).abs() < 1e-12);

        tree.backup(b, 0.5, 0.9).unwrap();
        let root = tree.node(tree.root()).unwrap();
        assert_eq!(root.visits, 2);
        assert!((root.total_value - 2.349).abs() < 1e-12);
    }

    #[test]
    fn test_choose_best_prefers_prior_then_value() {
        let mut tree = SearchTree::new();
        let root = tree.root();
        tree.add_child(root, 1, 0.2).unwrap();
        let strong = tree.add_child(root, 2, 0.8).unwrap();
        tree.backup(strong, 0.0, 1.0).unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        // root N = 1: unvisited child 1 scores 0.2, visited child 2 scores 0.4.
        assert_eq!(tree.choose_best(root, 1.0, &mut rng).unwrap(), Some(2));
        assert_eq!(tree.choose_best(strong, 1.0, &mut rng).unwrap(), None);
    }

    #[test]
    fn test_ties_are_broken_randomly() {
        let mut tree = SearchTree::new();
        let root = tree.root();
        for action in 0..4 {
            tree.add_child(root, action, 0.25).unwrap();
        }
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..64 {
            seen.insert(tree.choose_best(root, 1.0, &mut rng).unwrap().unwrap());
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn test_succeed_frees_siblings_and_keeps_subtree() {
        let mut tree = SearchTree::new();
        let root = tree.root();
        let keep = tree.add_child(root, 0, 0.5).unwrap();
        let drop = tree.add_child(root, 1, 0.5).unwrap();
        tree.add_child(drop, 0, 1.0).unwrap();
        let grandchild = tree.add_child(keep, 3, 1.0).unwrap();
        tree.backup(grandchild, 1.0, 1.0).unwrap();
        assert_eq!(tree.len(), 5);

        tree.succeed(0).unwrap();
        assert_eq!(tree.root(), keep);
        assert_eq!(tree.len(), 2);
        let new_root = tree.node(keep).unwrap();
        assert_eq!(new_root.parent, None);
        assert_eq!(new_root.prior, 1.0);
        assert_eq!(new_root.visits, 1);
        assert_eq!(tree.child(keep, 3), Some(grandchild));
        assert!(tree.node(drop).is_err());

        // freed slots are reused
        let capacity = tree.capacity();
        tree.add_child(keep, 5, 1.0).unwrap();
        assert_eq!(tree.capacity(), capacity);

        assert!(matches!(tree.succeed(9), Err(Error::UnknownAction(9))));
    }
}
