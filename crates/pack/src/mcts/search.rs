//! Oracle-guided tree search over packing decisions.

use super::node::NodeId;
use super::tree::SearchTree;
use crate::env::{PackingEnv, StepOutcome};
use crate::oracle::Oracle;
use cartonize_core::{Error, PackingConfig, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Counters of the most recent decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Deepest simulated step below the root.
    pub reached_depth: usize,
    /// Passes that ended on a terminal node.
    pub terminated_passes: usize,
    /// Live nodes after the passes.
    pub nodes: usize,
}

/// Monte Carlo tree search with a persistent, re-rootable tree.
///
/// Each decision runs `simulations` passes from the root. A pass clones the
/// environment and descends with the PUCT selection rule until it reaches a
/// terminal node, an unexpanded node (which is expanded with the oracle) or
/// the depth limit, then backs the value up to the root.
#[derive(Debug, Clone)]
pub struct TreeSearch {
    config: Arc<PackingConfig>,
    tree: SearchTree,
    rng: StdRng,
    stats: SearchStats,
}

impl TreeSearch {
    /// Creates a search with an empty tree.
    pub fn new(config: Arc<PackingConfig>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            tree: SearchTree::new(),
            rng,
            stats: SearchStats::default(),
        }
    }

    /// The underlying tree.
    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    /// Counters of the last call to [`TreeSearch::select_action`].
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Runs the simulation passes and returns the action to commit.
    pub fn select_action<O: Oracle + ?Sized>(
        &mut self,
        env: &PackingEnv,
        oracle: &O,
    ) -> Result<usize> {
        if env.is_done() {
            return Err(Error::Internal("select_action on a terminated episode".into()));
        }
        self.stats = SearchStats::default();
        for _ in 0..self.config.simulations {
            self.simulate(env, oracle)?;
        }
        self.stats.nodes = self.tree.len();
        log::debug!(
            "search: depth {} terminated {} nodes {}",
            self.stats.reached_depth,
            self.stats.terminated_passes,
            self.stats.nodes
        );

        let root = self.tree.root();
        self.tree
            .choose_best(root, self.config.c_puct, &mut self.rng)?
            .ok_or_else(|| Error::Internal("search root has no children".into()))
    }

    /// Moves the root to the child reached by `action`, keeping its subtree.
    pub fn succeed(&mut self, action: usize) -> Result<()> {
        self.tree.succeed(action)
    }

    fn simulate<O: Oracle + ?Sized>(&mut self, env: &PackingEnv, oracle: &O) -> Result<()> {
        let mut env = env.clone();
        let mut node = self.tree.root();
        let mut depth = 0;

        let value = loop {
            let current = self.tree.node(node)?;
            if current.terminal {
                self.stats.terminated_passes += 1;
                break 0.0;
            }
            if !current.is_expanded() {
                break self.expand(node, &env, oracle)?;
            }
            if depth >= self.config.search_depth {
                break current.value;
            }

            let action = self
                .tree
                .choose_best(node, self.config.c_puct, &mut self.rng)?
                .ok_or_else(|| Error::Internal("expanded node has no children".into()))?;
            node = self
                .tree
                .child(node, action)
                .ok_or_else(|| Error::Internal(format!("missing child for action {}", action)))?;
            depth += 1;

            let outcome = match env.step(action) {
                Ok(outcome) => outcome,
                Err(Error::CatalogExhausted { .. }) => StepOutcome {
                    reward: -1.0,
                    done: true,
                    placed: None,
                },
                Err(e) => return Err(e),
            };
            if outcome.done {
                let child = self.tree.node_mut(node)?;
                child.reward = outcome.reward;
                child.terminal = true;
                child.prior = 0.0;
                self.stats.terminated_passes += 1;
                break 0.0;
            }
        };

        self.stats.reached_depth = self.stats.reached_depth.max(depth);
        self.tree.backup(node, value, self.config.gamma)
    }

    fn expand<O: Oracle + ?Sized>(
        &mut self,
        node: NodeId,
        env: &PackingEnv,
        oracle: &O,
    ) -> Result<f64> {
        let mask = env.legal_actions();
        let legal: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(a, &m)| m.then_some(a))
            .collect();
        if legal.is_empty() {
            self.tree.add_child(node, 0, 1.0)?;
            return Ok(0.0);
        }

        let prediction = oracle.predict(&env.observation(), mask)?;
        prediction.check(mask)?;

        let credit = self.config.credit;
        let uniform = 1.0 / legal.len() as f64;
        for action in legal {
            let prior = credit * prediction.probability(action) + (1.0 - credit) * uniform;
            self.tree.add_child(node, action, prior)?;
        }
        let value = prediction.value();
        self.tree.node_mut(node)?.value = value;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use crate::oracle::UniformOracle;
    use cartonize_core::{Catalog, ContainerSpec};

    fn small_env(items: Vec<Item>) -> PackingEnv {
        let catalog = Arc::new(
            Catalog::new(vec![ContainerSpec::new("CUBE", 10.0, 4.0, 4.0, 4.0)]).unwrap(),
        );
        PackingEnv::new(Arc::new(PackingConfig::default()), catalog, items, &[0]).unwrap()
    }

    fn seeded(simulations: usize) -> Arc<PackingConfig> {
        Arc::new(
            PackingConfig::new()
                .with_simulations(simulations)
                .with_seed(5),
        )
    }

    #[test]
    fn test_selected_action_is_legal() {
        let env = small_env(vec![
            Item::on_grid(0, "A", [2, 2, 2], 1.0),
            Item::on_grid(1, "B", [2, 2, 2], 1.0),
        ]);
        let mut search = TreeSearch::new(seeded(8));
        let action = search.select_action(&env, &UniformOracle::new()).unwrap();
        assert!(env.legal_actions()[action]);
        assert_eq!(search.tree().node(search.tree().root()).unwrap().visits, 8);
        assert!(search.stats().nodes > 1);
    }

    #[test]
    fn test_expansion_priors_mix_credit() {
        let env = small_env(vec![Item::on_grid(0, "A", [4, 4, 4], 1.0)]);
        let config = Arc::new(
            PackingConfig::new()
                .with_simulations(1)
                .with_credit(0.5)
                .with_seed(1),
        );
        let mut search = TreeSearch::new(config);
        search.select_action(&env, &UniformOracle::new()).unwrap();

        let root = search.tree().node(search.tree().root()).unwrap();
        let legal = env.legal_count();
        assert_eq!(root.children.len(), legal);
        let total: f64 = root
            .children
            .values()
            .map(|&id| search.tree().node(id).unwrap().prior)
            .sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_terminal_child_carries_reward() {
        // A single item filling the container: every step ends the episode.
        let env = small_env(vec![Item::on_grid(0, "A", [4, 4, 4], 1.0)]);
        let mut search = TreeSearch::new(seeded(4));
        let action = search.select_action(&env, &UniformOracle::new()).unwrap();
        assert!(env.legal_actions()[action]);

        let tree = search.tree();
        let root = tree.node(tree.root()).unwrap();
        let terminal: Vec<_> = root
            .children
            .values()
            .map(|&id| tree.node(id).unwrap())
            .filter(|n| n.terminal)
            .collect();
        assert!(!terminal.is_empty());
        for child in terminal {
            assert_eq!(child.reward, 1.0);
            assert_eq!(child.prior, 0.0);
            assert!(child.mean_value > 0.99);
        }
        assert!(search.stats().terminated_passes >= 1);
    }

    #[test]
    fn test_search_is_reproducible_with_seed() {
        let items = vec![
            Item::on_grid(0, "A", [2, 2, 1], 1.0),
            Item::on_grid(1, "B", [2, 1, 1], 1.0),
            Item::on_grid(2, "C", [3, 2, 1], 1.0),
        ];
        let env = small_env(items);
        let a = TreeSearch::new(seeded(6))
            .select_action(&env, &UniformOracle::new())
            .unwrap();
        let b = TreeSearch::new(seeded(6))
            .select_action(&env, &UniformOracle::new())
            .unwrap();
        assert_eq!(a, b);
    }
}
