//! Sequential packing episode.
//!
//! Items are committed one at a time. Before each decision the environment
//! guarantees that the current item has at least one legal action, reordering
//! the queue or replacing the open containers when necessary:
//!
//! 1. pull the nearest later item that does have a legal action forward;
//! 2. otherwise retire all open containers and open the largest allowed type;
//! 3. otherwise fail with [`Error::CatalogExhausted`].

use crate::action::{Action, ActionSpace};
use crate::container_set::ContainerSet;
use crate::height_map::SupportRule;
use crate::item::Item;
use crate::observation::Observation;
use cartonize_core::{
    Catalog, ContainerId, Error, PackingConfig, PackingOutcome, Result, Strategy,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// How an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every item was placed.
    Success,
    /// A drop was rejected.
    Failure,
}

/// Episode state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeState {
    /// Waiting for an action for the item with this id.
    Ready(usize),
    /// No further actions are accepted.
    Terminated(Termination),
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// `1 / containers used` on success of the last item, `-1` on a rejected
    /// drop, `0` otherwise.
    pub reward: f64,
    /// True once the episode has terminated.
    pub done: bool,
    /// The placed item, if the drop succeeded.
    pub placed: Option<Item>,
}

/// Packing episode over a fixed list of items and allowed container types.
#[derive(Debug, Clone)]
pub struct PackingEnv {
    config: Arc<PackingConfig>,
    catalog: Arc<Catalog>,
    space: ActionSpace,
    allowed: Vec<ContainerId>,
    initial_items: Vec<Item>,
    items: Vec<Item>,
    containers: ContainerSet,
    current: usize,
    used_types: BTreeSet<ContainerId>,
    mask: Vec<bool>,
    state: EpisodeState,
}

impl PackingEnv {
    /// Creates an environment and resets it.
    ///
    /// `allowed` lists the catalog types the episode may open; one container of
    /// each is opened on reset.
    pub fn new(
        config: Arc<PackingConfig>,
        catalog: Arc<Catalog>,
        items: Vec<Item>,
        allowed: &[ContainerId],
    ) -> Result<Self> {
        if allowed.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one container type must be allowed".into(),
            ));
        }
        if let Some(&bad) = allowed.iter().find(|&&id| catalog.get(id).is_none()) {
            return Err(Error::InvalidContainer(format!("unknown catalog id {}", bad)));
        }

        let mut by_volume: Vec<ContainerId> = allowed.to_vec();
        by_volume.sort_unstable();
        by_volume.dedup();
        by_volume.sort_by(|&a, &b| {
            let (va, vb) = (catalog.entries()[a].volume, catalog.entries()[b].volume);
            vb.partial_cmp(&va).unwrap_or(std::cmp::Ordering::Equal)
        });

        let space = ActionSpace::for_catalog(&catalog);
        let rule = SupportRule::from_config(&config);
        let containers = ContainerSet::new(catalog.clone(), rule);
        let mut env = Self {
            config,
            catalog,
            space,
            allowed: by_volume,
            initial_items: items.clone(),
            items,
            containers,
            current: 0,
            used_types: BTreeSet::new(),
            mask: Vec::new(),
            state: EpisodeState::Terminated(Termination::Success),
        };
        env.reset()?;
        Ok(env)
    }

    /// Restores the initial queue and opens one fresh container per allowed type.
    pub fn reset(&mut self) -> Result<()> {
        self.items = self.initial_items.clone();
        self.containers.reset(&self.allowed)?;
        self.current = 0;
        self.used_types.clear();
        if self.items.is_empty() {
            self.mask = vec![false; self.space.len()];
            self.state = EpisodeState::Terminated(Termination::Success);
            return Ok(());
        }
        self.ensure_legal_action()?;
        self.state = EpisodeState::Ready(self.items[self.current].id);
        Ok(())
    }

    /// Commits an action for the current item.
    pub fn step(&mut self, action_id: usize) -> Result<StepOutcome> {
        if let EpisodeState::Terminated(_) = self.state {
            return Err(Error::Internal("step on a terminated episode".into()));
        }
        let action = self.space.decode(action_id)?;
        let item = &self.items[self.current];

        let placed = match self.containers.commit(item, action) {
            Some(placed) => placed,
            None => {
                log::debug!("rejected {:?} for {}", action, item.name);
                self.state = EpisodeState::Terminated(Termination::Failure);
                return Ok(StepOutcome {
                    reward: -1.0,
                    done: true,
                    placed: None,
                });
            }
        };

        self.items[self.current] = placed.clone();
        self.used_types.insert(action.container);
        self.current += 1;

        if self.current == self.items.len() {
            self.state = EpisodeState::Terminated(Termination::Success);
            self.mask.iter_mut().for_each(|m| *m = false);
            return Ok(StepOutcome {
                reward: 1.0 / self.containers.used_count() as f64,
                done: true,
                placed: Some(placed),
            });
        }

        self.ensure_legal_action()?;
        self.state = EpisodeState::Ready(self.items[self.current].id);
        Ok(StepOutcome {
            reward: 0.0,
            done: false,
            placed: Some(placed),
        })
    }

    fn mask_for(&self, queue_pos: usize) -> Vec<bool> {
        self.containers.legality_mask(
            &self.items[queue_pos],
            &self.space,
            &self.config.allowed_rotations,
        )
    }

    fn ensure_legal_action(&mut self) -> Result<()> {
        self.mask = self.mask_for(self.current);
        if self.mask.iter().any(|&m| m) {
            return Ok(());
        }

        let ahead = (self.current + 1..self.items.len()).find_map(|j| {
            let mask = self.mask_for(j);
            mask.iter().any(|&m| m).then_some((j, mask))
        });
        if let Some((j, mask)) = ahead {
            let item = self.items.remove(j);
            log::debug!(
                "no legal action for {}, moving {} forward",
                self.items[self.current].name,
                item.name
            );
            self.items.insert(self.current, item);
            self.mask = mask;
            return Ok(());
        }

        let largest = self.allowed[0];
        log::warn!(
            "no legal action for any remaining item, replacing open containers with {}",
            self.catalog.entries()[largest].name
        );
        self.containers.replace(largest)?;
        self.mask = self.mask_for(self.current);
        if self.mask.iter().any(|&m| m) {
            return Ok(());
        }
        Err(Error::CatalogExhausted {
            item: self.items[self.current].name.clone(),
        })
    }

    /// Legality mask for the current item.
    pub fn legal_actions(&self) -> &[bool] {
        &self.mask
    }

    /// Number of legal actions for the current item.
    pub fn legal_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Builds the oracle observation for the current state.
    ///
    /// Channels: three per catalog type (height, free weight, free volume),
    /// five for the current item (three sides, weight, scaled volume), two for
    /// the remaining load (weight, scaled volume), and one legality plane per
    /// catalog type and rotation.
    pub fn observation(&self) -> Observation {
        let [width, depth, _] = self.catalog.max_grid();
        let n = self.catalog.len();
        let rotations = self.space.rotations();
        let scale = self.config.volume_scale;
        let mut obs = Observation::with_capacity(width, depth, n * 3 + 7 + n * rotations);

        self.containers.observe(&mut obs);

        match self.current_item() {
            Some(item) => {
                let [dx, dy, dz] = item.size();
                obs.push_constant(dx as f32);
                obs.push_constant(dy as f32);
                obs.push_constant(dz as f32);
                obs.push_constant(item.weight() as f32);
                obs.push_constant(item.volume() as f32 / scale);
            }
            None => (0..5).for_each(|_| obs.push_constant(0.0)),
        }

        let pending = self.items.get(self.current + 1..).unwrap_or(&[]);
        obs.push_constant(pending.iter().map(Item::weight).sum::<f64>() as f32);
        obs.push_constant(pending.iter().map(Item::volume).sum::<f64>() as f32 / scale);

        for chunk in self.mask.chunks(width * depth) {
            obs.push_with(|x, y| if chunk[x * depth + y] { 1.0 } else { 0.0 });
        }
        obs
    }

    /// Item awaiting a decision.
    pub fn current_item(&self) -> Option<&Item> {
        match self.state {
            EpisodeState::Ready(_) => self.items.get(self.current),
            EpisodeState::Terminated(_) => None,
        }
    }

    /// Current state.
    pub fn state(&self) -> EpisodeState {
        self.state
    }

    /// Returns true once the episode has terminated.
    pub fn is_done(&self) -> bool {
        matches!(self.state, EpisodeState::Terminated(_))
    }

    /// Queue in its current order; placed items come first.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Number of items placed so far.
    pub fn placed_count(&self) -> usize {
        self.current
    }

    /// Allowed container types, largest first.
    pub fn allowed(&self) -> &[ContainerId] {
        &self.allowed
    }

    /// Distinct container types that received at least one item.
    pub fn used_types(&self) -> &BTreeSet<ContainerId> {
        &self.used_types
    }

    /// Open and retired containers.
    pub fn containers(&self) -> &ContainerSet {
        &self.containers
    }

    /// Action encoding in use.
    pub fn action_space(&self) -> &ActionSpace {
        &self.space
    }

    /// Decodes an action id.
    pub fn decode(&self, action_id: usize) -> Result<Action> {
        self.space.decode(action_id)
    }

    /// Outcome view of the containers used so far.
    pub fn to_outcome(&self) -> PackingOutcome {
        self.containers.to_outcome(Strategy::TreeSearch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartonize_core::{ContainerSpec, Rotation};

    fn cube_catalog(weight: f64) -> Arc<Catalog> {
        Arc::new(Catalog::new(vec![ContainerSpec::new("CUBE", weight, 4.0, 4.0, 4.0)]).unwrap())
    }

    fn env_with(catalog: Arc<Catalog>, items: Vec<Item>) -> Result<PackingEnv> {
        PackingEnv::new(Arc::new(PackingConfig::default()), catalog, items, &[0])
    }

    fn first_legal(env: &PackingEnv) -> usize {
        env.legal_actions().iter().position(|&m| m).unwrap()
    }

    #[test]
    fn test_single_item_episode_rewards_one() {
        let catalog = cube_catalog(10.0);
        let items = vec![Item::on_grid(0, "A", [2, 2, 2], 1.0)];
        let mut env = env_with(catalog, items).unwrap();
        assert_eq!(env.state(), EpisodeState::Ready(0));

        let outcome = env.step(first_legal(&env)).unwrap();
        assert!(outcome.done);
        assert_eq!(outcome.reward, 1.0);
        assert_eq!(env.state(), EpisodeState::Terminated(Termination::Success));
        assert!(env.step(0).is_err());
    }

    #[test]
    fn test_rejected_drop_terminates_with_penalty() {
        let catalog = cube_catalog(10.0);
        let items = vec![
            Item::on_grid(0, "A", [2, 2, 2], 1.0),
            Item::on_grid(1, "B", [2, 2, 2], 1.0),
        ];
        let mut env = env_with(catalog, items).unwrap();
        let illegal = env
            .action_space()
            .encode(Action {
                container: 0,
                rotation: Rotation::None,
                x: 3,
                y: 3,
            })
            .unwrap();
        assert!(!env.legal_actions()[illegal]);
        let outcome = env.step(illegal).unwrap();
        assert_eq!(outcome.reward, -1.0);
        assert!(outcome.done);
        assert_eq!(env.state(), EpisodeState::Terminated(Termination::Failure));
    }

    #[test]
    fn test_lookahead_then_replacement() {
        let catalog = cube_catalog(10.0);
        let items = vec![
            Item::on_grid(0, "A", [2, 2, 2], 6.0),
            Item::on_grid(1, "B", [2, 2, 2], 6.0),
            Item::on_grid(2, "C", [2, 2, 2], 1.0),
        ];
        let mut env = env_with(catalog, items).unwrap();

        env.step(first_legal(&env)).unwrap();
        // B exceeds the remaining weight, C is pulled forward.
        assert_eq!(env.state(), EpisodeState::Ready(2));
        assert_eq!(env.items()[1].name, "C");

        env.step(first_legal(&env)).unwrap();
        // Nothing left fits: a fresh container is opened for B.
        assert_eq!(env.state(), EpisodeState::Ready(1));
        assert_eq!(env.containers().instances().len(), 2);

        let outcome = env.step(first_legal(&env)).unwrap();
        assert!(outcome.done);
        assert_eq!(outcome.reward, 0.5);
        assert_eq!(env.to_outcome().used_labels(), vec!["CUBE(1)", "CUBE(2)"]);
    }

    #[test]
    fn test_oversized_item_exhausts_catalog() {
        let catalog = cube_catalog(10.0);
        let items = vec![Item::on_grid(0, "XL", [5, 1, 1], 1.0)];
        let err = env_with(catalog, items).unwrap_err();
        assert!(matches!(err, Error::CatalogExhausted { .. }));
    }

    #[test]
    fn test_observation_channel_count() {
        let catalog = Arc::new(Catalog::reference());
        let items = vec![Item::on_grid(0, "A", [6, 6, 6], 1.0)];
        let env = env_with(catalog, items).unwrap();
        let obs = env.observation();
        assert_eq!(obs.channels(), 18 * 3 + 7 + 18 * 4);
        assert_eq!((obs.width(), obs.depth()), (48, 24));
        // current item planes follow the container planes
        assert_eq!(obs.get(54, 0, 0), 6.0);
        assert_eq!(obs.get(58, 0, 0), 216.0 / 20.0);
    }

    #[test]
    fn test_remaining_load_excludes_current_item() {
        let items = vec![
            Item::on_grid(0, "A", [2, 2, 2], 3.0),
            Item::on_grid(1, "B", [1, 1, 1], 0.5),
        ];
        let env = env_with(cube_catalog(10.0), items).unwrap();
        let obs = env.observation();
        assert_eq!(obs.get(6, 1, 1), 3.0);
        assert_eq!(obs.get(8, 1, 1), 0.5);
        assert!((obs.get(9, 1, 1) - 0.05).abs() < 1e-6);

        let single = vec![Item::on_grid(0, "A", [2, 2, 2], 3.0)];
        let single = env_with(cube_catalog(10.0), single).unwrap();
        let obs = single.observation();
        assert_eq!(obs.get(8, 0, 0), 0.0);
        assert_eq!(obs.get(9, 0, 0), 0.0);
    }
}
