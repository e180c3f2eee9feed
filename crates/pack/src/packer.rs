//! Order-level packing: heuristic first, tree-search refinement when worth it.

use crate::env::PackingEnv;
use crate::heuristic::HeuristicPacker;
use crate::item::Item;
use crate::mcts::TreeSearch;
use crate::oracle::Oracle;
use crate::order::{Order, OrderLine};
use cartonize_core::{Catalog, Error, PackingConfig, PackingOutcome, Result};
use std::sync::Arc;
use std::time::Instant;

/// Packs customer orders.
///
/// Every order is first packed by the [`HeuristicPacker`]. When an oracle is
/// supplied and the order is small, mixed and needed many containers, a
/// [`TreeSearch`] episode restricted to the container types the heuristic
/// chose tries to beat it. The refined packing is returned only when it uses
/// strictly fewer containers.
#[derive(Debug, Clone)]
pub struct OrderPacker {
    config: Arc<PackingConfig>,
    catalog: Arc<Catalog>,
    heuristic: HeuristicPacker,
}

impl OrderPacker {
    /// Creates a packer after validating the configuration.
    pub fn new(config: Arc<PackingConfig>, catalog: Arc<Catalog>) -> Result<Self> {
        config.validate()?;
        let heuristic = HeuristicPacker::new(config.clone(), catalog.clone());
        Ok(Self {
            config,
            catalog,
            heuristic,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &PackingConfig {
        &self.config
    }

    /// The catalog in use.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Expands `lines` and packs them.
    pub fn pack_order(
        &self,
        lines: &[OrderLine],
        oracle: Option<&dyn Oracle>,
    ) -> Result<PackingOutcome> {
        let order = Order::from_lines(lines, &self.config)?;
        self.pack(&order, oracle)
    }

    /// Packs an expanded order.
    pub fn pack(&self, order: &Order, oracle: Option<&dyn Oracle>) -> Result<PackingOutcome> {
        let heuristic = self.heuristic.pack(order.items())?;
        let oracle = match oracle {
            Some(oracle) if self.should_refine(order, &heuristic) => oracle,
            _ => return Ok(heuristic),
        };

        let refined = self.refine(order.items(), &heuristic, oracle);
        Ok(settle(heuristic, refined))
    }

    /// Returns true if the order qualifies for refinement.
    pub fn should_refine(&self, order: &Order, heuristic: &PackingOutcome) -> bool {
        order.distinct_lines() > 1
            && order.len() <= self.config.refine_max_items
            && heuristic.container_count() > self.config.refine_container_threshold
    }

    /// Runs one search episode over the container types used by `heuristic`.
    pub fn refine(
        &self,
        items: &[Item],
        heuristic: &PackingOutcome,
        oracle: &dyn Oracle,
    ) -> Result<PackingOutcome> {
        let start = Instant::now();
        let allowed = heuristic.distinct_container_ids();
        let mut env = PackingEnv::new(
            self.config.clone(),
            self.catalog.clone(),
            items.to_vec(),
            &allowed,
        )?;
        let mut search = TreeSearch::new(self.config.clone());

        while !env.is_done() {
            let action = search.select_action(&env, oracle)?;
            commit_decision(&mut env, &mut search, action)?;
        }

        let outcome = env.to_outcome();
        log::debug!(
            "refinement packed {} items into {} containers (heuristic {})",
            outcome.item_count(),
            outcome.container_count(),
            heuristic.container_count()
        );
        Ok(outcome.with_computation_time(start.elapsed().as_millis() as u64))
    }
}

/// Commits `action` in the real episode and moves the search root along.
///
/// A rejected drop ends the episode and is reported as
/// [`Error::IllegalAction`].
fn commit_decision(env: &mut PackingEnv, search: &mut TreeSearch, action: usize) -> Result<()> {
    let outcome = env.step(action)?;
    if outcome.done && outcome.reward < 0.0 {
        return Err(Error::IllegalAction {
            action,
            reason: "search committed a rejected drop".into(),
        });
    }
    if !outcome.done {
        search.succeed(action)?;
    }
    Ok(())
}

/// Resolves a refinement attempt against the heuristic packing; failures keep
/// the heuristic result.
fn settle(heuristic: PackingOutcome, refined: Result<PackingOutcome>) -> PackingOutcome {
    match refined {
        Ok(refined) => select_outcome(heuristic, Some(refined)),
        Err(e) => {
            log::warn!("refinement failed, keeping heuristic packing: {}", e);
            heuristic
        }
    }
}

/// Picks the refined packing only if it uses strictly fewer containers.
pub fn select_outcome(heuristic: PackingOutcome, refined: Option<PackingOutcome>) -> PackingOutcome {
    match refined {
        Some(refined) if refined.container_count() < heuristic.container_count() => refined,
        _ => heuristic,
    }
}
