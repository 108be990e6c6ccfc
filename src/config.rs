/*!
Run configuration for the Metropolis–Hastings samplers.

[`SamplerConfig`] collects everything a run needs besides the target density and
the random source. Its defaults reproduce the classic teaching setup: a chain
started at `0.0`, Gaussian proposals with scale `2.0`, `100_000` iterations of
which the first `1_000` are discarded as burn-in.

```rust
use mini_metropolis::config::SamplerConfig;

let config = SamplerConfig::default().set_seed(42).set_n_chains(4);
assert!(config.validate().is_ok());
assert_eq!(config.n_chains, 4);
```
*/

use std::convert::Infallible;

use crate::error::SamplerError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    /// Starting state shared by all chains.
    pub initial_state: f64,
    /// Scale of the symmetric proposal offset.
    pub scale: f64,
    /// Number of iterations per chain, burn-in included.
    pub n_steps: usize,
    /// Number of leading iterations dropped from every chain.
    pub burn_in: usize,
    /// Number of independent chains.
    pub n_chains: usize,
    /// Global seed; chain `i` uses `seed + i`. Drawn from entropy if `None`.
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            initial_state: 0.0,
            scale: 2.0,
            n_steps: 100_000,
            burn_in: 1_000,
            n_chains: 1,
            seed: None,
        }
    }
}

impl SamplerConfig {
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn set_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn set_initial_state(mut self, initial_state: f64) -> Self {
        self.initial_state = initial_state;
        self
    }

    pub fn set_n_steps(mut self, n_steps: usize) -> Self {
        self.n_steps = n_steps;
        self
    }

    pub fn set_burn_in(mut self, burn_in: usize) -> Self {
        self.burn_in = burn_in;
        self
    }

    pub fn set_n_chains(mut self, n_chains: usize) -> Self {
        self.n_chains = n_chains;
        self
    }

    /// Number of samples each chain yields once burn-in is removed.
    pub fn n_kept(&self) -> usize {
        self.n_steps.saturating_sub(self.burn_in)
    }

    /// Checks the configuration without touching a target density.
    pub fn validate(&self) -> Result<(), SamplerError<Infallible>> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(SamplerError::InvalidScale(self.scale));
        }
        if !self.initial_state.is_finite() {
            return Err(SamplerError::NonFiniteInitialState(self.initial_state));
        }
        if self.n_chains == 0 {
            return Err(SamplerError::NoChains);
        }
        if self.burn_in > self.n_steps {
            return Err(SamplerError::BurnInTooLong {
                burn_in: self.burn_in,
                n_steps: self.n_steps,
            });
        }
        Ok(())
    }
}
