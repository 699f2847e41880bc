//! Endpoint rotation
//!
//! Decides which cluster node receives the next request and when a request
//! round has exhausted the cluster:
//!
//! ```text
//! start:    current = random(0..N), failures = 0
//! failure:  failures += 1
//!           failures == N  -> Exhausted, restart at a fresh random index
//!           otherwise      -> Retry, current = (current + 1) mod N
//! success:  failures = 0, current unchanged
//! ```
//!
//! The random start spreads independent clients over the cluster, while the
//! sticky-on-success rule keeps a client on a node that answers.

use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform index generator, seeded once per client instance
#[derive(Debug)]
pub struct RandomIndex {
    rng: StdRng,
}

impl RandomIndex {
    /// Generator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator, for reproducible rotation
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Index uniformly drawn from `[0, n)`; `n` must be non-zero
    pub fn pick(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }
}

impl Default for RandomIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of recording a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Another endpoint is available in this round
    Retry,
    /// Every endpoint failed in this round
    Exhausted,
}

/// Owns the endpoint list and the rotation state
#[derive(Debug)]
pub struct EndpointRotation {
    endpoints: Vec<String>,
    current: usize,
    failures: usize,
    random: RandomIndex,
}

impl EndpointRotation {
    /// Create a rotation over a non-empty endpoint list
    pub fn new(endpoints: Vec<String>) -> Result<Self> {
        Self::with_random(endpoints, RandomIndex::new())
    }

    pub fn with_random(endpoints: Vec<String>, mut random: RandomIndex) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(Error::NoEndpoints);
        }
        let current = random.pick(endpoints.len());
        Ok(Self {
            endpoints,
            current,
            failures: 0,
            random,
        })
    }

    /// Endpoint the next attempt goes to
    pub fn current(&self) -> &str {
        &self.endpoints[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Consecutive failures in the running round
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Record a failure of the current endpoint and move on
    pub fn advance_after_failure(&mut self) -> Advance {
        self.failures += 1;
        if self.failures >= self.endpoints.len() {
            self.restart();
            return Advance::Exhausted;
        }
        self.current = (self.current + 1) % self.endpoints.len();
        Advance::Retry
    }

    /// Record a success; the current endpoint stays selected
    pub fn reset_after_success(&mut self) {
        self.failures = 0;
    }

    fn restart(&mut self) {
        self.current = self.random.pick(self.endpoints.len());
        self.failures = 0;
    }
}
