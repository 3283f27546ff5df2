//! Picks exactly one candidate from the pool.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::ingest::types::Candidate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    #[default]
    UniformRandom,
    FirstAvailable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectConfig {
    pub policy: SelectionPolicy,
    /// Fixed seed for reproducible picks; OS entropy when absent.
    pub seed: Option<u64>,
}

#[derive(Debug)]
pub struct Selector {
    policy: SelectionPolicy,
    rng: StdRng,
}

impl Selector {
    pub fn new(policy: SelectionPolicy, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self { policy, rng }
    }

    pub fn from_config(cfg: &SelectConfig) -> Self {
        Self::new(cfg.policy, cfg.seed)
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// `None` on an empty pool: nothing new to post.
    pub fn select(&mut self, pool: Vec<Candidate>) -> Option<Candidate> {
        if pool.is_empty() {
            return None;
        }
        let idx = match self.policy {
            SelectionPolicy::FirstAvailable => 0,
            SelectionPolicy::UniformRandom => self.rng.random_range(0..pool.len()),
        };
        pool.into_iter().nth(idx)
    }
}
