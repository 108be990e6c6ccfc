//! Error types shared by the samplers.

use std::convert::Infallible;
use thiserror::Error;

/// Errors raised while configuring or running a Metropolis–Hastings chain.
///
/// `E` is the error type of the target density. Failures of the density are
/// passed through untouched in [`SamplerError::Density`].
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SamplerError<E> {
    #[error("Proposal scale must be finite and positive, got {0}")]
    InvalidScale(f64),
    #[error("Initial state must be finite, got {0}")]
    NonFiniteInitialState(f64),
    #[error("Expected at least one chain")]
    NoChains,
    #[error("Cannot discard {burn_in} burn-in steps from a run of {n_steps} steps")]
    BurnInTooLong { burn_in: usize, n_steps: usize },
    #[error("Target density returned non-finite value {value} at x = {x}")]
    NonFiniteDensity { x: f64, value: f64 },
    #[error("Target density returned negative value {value} at x = {x}")]
    NegativeDensity { x: f64, value: f64 },
    #[error("Target density evaluation failed")]
    Density(#[source] E),
}

impl<E> SamplerError<E> {
    /// Returns `true` if the error was detected before any iteration ran.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidScale(_)
                | Self::NonFiniteInitialState(_)
                | Self::NoChains
                | Self::BurnInTooLong { .. }
        )
    }
}

impl SamplerError<Infallible> {
    /// Re-types an error that cannot carry a density failure.
    pub fn relabel<E>(self) -> SamplerError<E> {
        match self {
            Self::InvalidScale(scale) => SamplerError::InvalidScale(scale),
            Self::NonFiniteInitialState(x) => SamplerError::NonFiniteInitialState(x),
            Self::NoChains => SamplerError::NoChains,
            Self::BurnInTooLong { burn_in, n_steps } => {
                SamplerError::BurnInTooLong { burn_in, n_steps }
            }
            Self::NonFiniteDensity { x, value } => SamplerError::NonFiniteDensity { x, value },
            Self::NegativeDensity { x, value } => SamplerError::NegativeDensity { x, value },
            Self::Density(never) => match never {},
        }
    }
}

pub type Result<T, E> = std::result::Result<T, SamplerError<E>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Error, Debug)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn density_error_is_exposed_as_source() {
        let err: SamplerError<Boom> = SamplerError::Density(Boom);
        let source = err.source().expect("Expected a source error.");
        assert_eq!(source.to_string(), "boom");
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err: SamplerError<Infallible> = SamplerError::InvalidScale(-1.0);
        assert_eq!(
            err.to_string(),
            "Proposal scale must be finite and positive, got -1"
        );
        assert!(err.is_configuration_error());

        let err: SamplerError<Infallible> = SamplerError::NonFiniteDensity {
            x: 0.5,
            value: f64::NAN,
        };
        assert_eq!(
            err.to_string(),
            "Target density returned non-finite value NaN at x = 0.5"
        );
    }
}
