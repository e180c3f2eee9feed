//! Policy/value oracle interface.
//!
//! The tree search asks an [`Oracle`] for a prior over actions and a scalar
//! value estimate whenever it expands a node. The oracle is usually a trained
//! model served by the caller; [`UniformOracle`] is a model-free stand-in.

use crate::observation::Observation;
use cartonize_core::{Error, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Oracle output for one observation.
#[derive(Debug, Clone)]
pub struct Prediction {
    scores: Vec<f32>,
    probabilities: Vec<f64>,
    distribution: WeightedIndex<f64>,
    value: f64,
}

impl Prediction {
    /// Wraps already normalized probabilities.
    pub fn new(scores: Vec<f32>, probabilities: Vec<f64>, value: f64) -> Result<Self> {
        if scores.len() != probabilities.len() {
            return Err(Error::Oracle(format!(
                "{} scores but {} probabilities",
                scores.len(),
                probabilities.len()
            )));
        }
        if !value.is_finite() {
            return Err(Error::Oracle(format!("value {} is not finite", value)));
        }
        let distribution = WeightedIndex::new(&probabilities)
            .map_err(|e| Error::Oracle(format!("invalid probabilities: {}", e)))?;
        Ok(Self {
            scores,
            probabilities,
            distribution,
            value,
        })
    }

    /// Builds a prediction from raw scores with a masked softmax: illegal
    /// actions get probability zero and the legal ones sum to one.
    pub fn from_scores(scores: Vec<f32>, mask: &[bool], value: f64) -> Result<Self> {
        if scores.len() != mask.len() {
            return Err(Error::Oracle(format!(
                "{} scores for {} actions",
                scores.len(),
                mask.len()
            )));
        }
        let max = scores
            .iter()
            .zip(mask)
            .filter(|(_, legal)| **legal)
            .map(|(&s, _)| s as f64)
            .fold(f64::NEG_INFINITY, f64::max);
        if max == f64::NEG_INFINITY {
            return Err(Error::Oracle("no legal action to score".into()));
        }

        let mut probabilities: Vec<f64> = scores
            .iter()
            .zip(mask)
            .map(|(&s, &legal)| if legal { (s as f64 - max).exp() } else { 0.0 })
            .collect();
        let total: f64 = probabilities.iter().sum();
        probabilities.iter_mut().for_each(|p| *p /= total);
        Self::new(scores, probabilities, value)
    }

    /// Raw scores as produced by the oracle.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Masked, renormalized probabilities.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Probability of one action.
    pub fn probability(&self, action: usize) -> f64 {
        self.probabilities.get(action).copied().unwrap_or(0.0)
    }

    /// Scalar value estimate of the state.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Draws an action from the categorical distribution.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.distribution.sample(rng)
    }

    /// Checks the oracle contract against a legality mask.
    pub fn check(&self, mask: &[bool]) -> Result<()> {
        if self.probabilities.len() != mask.len() {
            return Err(Error::Oracle(format!(
                "prediction covers {} actions, expected {}",
                self.probabilities.len(),
                mask.len()
            )));
        }
        if let Some(action) = self
            .probabilities
            .iter()
            .zip(mask)
            .position(|(&p, &legal)| p > 0.0 && !legal)
        {
            return Err(Error::Oracle(format!(
                "illegal action {} has probability {}",
                action, self.probabilities[action]
            )));
        }
        Ok(())
    }
}

/// Policy/value model consulted by the tree search.
pub trait Oracle: Send + Sync {
    /// Predicts action probabilities and a state value.
    ///
    /// Probabilities must be zero wherever `mask` is false.
    fn predict(&self, observation: &Observation, mask: &[bool]) -> Result<Prediction>;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn predict(&self, observation: &Observation, mask: &[bool]) -> Result<Prediction> {
        (**self).predict(observation, mask)
    }
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn predict(&self, observation: &Observation, mask: &[bool]) -> Result<Prediction> {
        (**self).predict(observation, mask)
    }
}

/// Uniform prior over legal actions with a constant value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UniformOracle {
    value: f64,
}

impl UniformOracle {
    /// Uniform oracle reporting a value of zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reported value.
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }
}

impl Oracle for UniformOracle {
    fn predict(&self, _observation: &Observation, mask: &[bool]) -> Result<Prediction> {
        Prediction::from_scores(vec![0.0; mask.len()], mask, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_masked_softmax() {
        let mask = [true, false, true, true];
        let p = Prediction::from_scores(vec![1.0, 100.0, 1.0, 2.0], &mask, 0.5).unwrap();
        assert_eq!(p.probability(1), 0.0);
        let total: f64 = p.probabilities().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(p.probability(3) > p.probability(0));
        assert!((p.probability(0) - p.probability(2)).abs() < 1e-12);
        assert!(p.check(&mask).is_ok());
        assert_eq!(p.value(), 0.5);
    }

    #[test]
    fn test_contract_violation_detected() {
        let p = Prediction::new(vec![0.0; 3], vec![0.5, 0.5, 0.0], 0.0).unwrap();
        assert!(p.check(&[true, false, true]).is_err());
        assert!(p.check(&[true, true]).is_err());
        assert!(Prediction::from_scores(vec![0.0; 2], &[false, false], 0.0).is_err());
    }

    #[test]
    fn test_uniform_oracle_samples_legal_actions() {
        let mask = [false, true, false, true];
        let obs = Observation::new(1, 1);
        let p = UniformOracle::new().predict(&obs, &mask).unwrap();
        assert_eq!(p.probability(1), 0.5);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..32 {
            assert!(mask[p.sample(&mut rng)]);
        }
    }
}
