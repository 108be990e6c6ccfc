/*!
Target densities and random sources for one-dimensional Metropolis–Hastings.

A sampler talks to two collaborators supplied by the caller:

- a **target density** ([`TargetDensity`]) returning the possibly unnormalized,
  non-negative density at a point. Evaluation may fail; the error type is chosen
  by the implementor and handed back to the caller unchanged.
- a **random source** ([`RandomSource`]) producing symmetric, zero-centred
  proposal offsets and uniform draws.

Both are generic over the floating-point precision via [`num_traits::Float`].

# Examples

```rust
use mini_metropolis::distributions::{
    FnDensity, Gaussian1D, GaussianWalk, Normalized, RandomSource, TargetDensity,
};

// An analytic target...
let gauss = Gaussian1D::<f64>::standard();
assert_eq!(gauss.density(0.0).unwrap(), 1.0);
assert!((gauss.cdf(0.0) - 0.5_f64).abs() < 1e-7);

// ...or any closure.
let bimodal = FnDensity(|x: f64| (-(x - 2.0).powi(2)).exp() + (-(x + 2.0).powi(2)).exp());
assert!(bimodal.density(2.0).unwrap() > bimodal.density(0.0).unwrap());

// A seeded Gaussian random walk.
let mut rng = GaussianWalk::<f64>::new().set_seed(42);
let offset = rng.proposal_offset(2.0);
let u = rng.uniform();
assert!(offset.is_finite());
assert!((0.0..1.0).contains(&u));
```
*/

use num_traits::Float;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Standard, StandardNormal};
use special::Error as _;
use std::convert::Infallible;
use std::f64::consts::{PI, SQRT_2};
use std::marker::PhantomData;

/// A (possibly unnormalized) density over the real line.
pub trait TargetDensity<T> {
    /// Error produced when the density cannot be evaluated.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns `π(x) ≥ 0`.
    fn density(&self, x: T) -> Result<T, Self::Error>;
}

impl<T, D: TargetDensity<T> + ?Sized> TargetDensity<T> for &D {
    type Error = D::Error;

    fn density(&self, x: T) -> Result<T, Self::Error> {
        (**self).density(x)
    }
}

/// Densities whose normalization is known, used to compare chains against the
/// analytic distribution.
pub trait Normalized<T> {
    /// Normalized probability density at `x`.
    fn pdf(&self, x: T) -> T;

    /// Cumulative distribution function at `x`.
    fn cdf(&self, x: T) -> T;
}

/// Source of the two kinds of randomness a random-walk sampler consumes.
pub trait RandomSource<T> {
    /// Draws an offset from a symmetric distribution centred at zero with the given scale.
    fn proposal_offset(&mut self, scale: T) -> T;

    /// Draws from the uniform distribution on `[0, 1)`.
    fn uniform(&mut self) -> T;
}

impl<T, R: RandomSource<T> + ?Sized> RandomSource<T> for &mut R {
    fn proposal_offset(&mut self, scale: T) -> T {
        (**self).proposal_offset(scale)
    }

    fn uniform(&mut self) -> T {
        (**self).uniform()
    }
}

/**
Adapts an infallible closure into a [`TargetDensity`].

```rust
use mini_metropolis::distributions::{FnDensity, TargetDensity};

let flat = FnDensity(|_x: f64| 1.0);
assert_eq!(flat.density(123.0).unwrap(), 1.0);
```
*/
#[derive(Debug, Clone, Copy)]
pub struct FnDensity<F>(pub F);

impl<T, F> TargetDensity<T> for FnDensity<F>
where
    F: Fn(T) -> T,
{
    type Error = Infallible;

    fn density(&self, x: T) -> Result<T, Self::Error> {
        Ok((self.0)(x))
    }
}

/**
Adapts a fallible closure into a [`TargetDensity`]. Errors returned by the
closure surface as [`SamplerError::Density`](crate::error::SamplerError::Density).

```rust
use mini_metropolis::distributions::{TargetDensity, TryFnDensity};

let positive_only = TryFnDensity::new(|x: f64| {
    if x > 0.0 {
        Ok(1.0)
    } else {
        Err(std::io::Error::other("left half-line is not modelled"))
    }
});
assert!(positive_only.density(1.0).is_ok());
assert!(positive_only.density(-1.0).is_err());
```
*/
#[derive(Debug, Clone, Copy)]
pub struct TryFnDensity<F, E> {
    f: F,
    phantom: PhantomData<fn() -> E>,
}

impl<F, E> TryFnDensity<F, E> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            phantom: PhantomData,
        }
    }
}

impl<T, F, E> TargetDensity<T> for TryFnDensity<F, E>
where
    F: Fn(T) -> Result<T, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn density(&self, x: T) -> Result<T, Self::Error> {
        (self.f)(x)
    }
}

/**
A univariate Gaussian. As a [`TargetDensity`] it evaluates the unnormalized
kernel `exp(-(x - mean)² / (2 std²))`, which peaks at `1` in the mean.

# Examples

```rust
use mini_metropolis::distributions::{Gaussian1D, Normalized};

let gauss = Gaussian1D { mean: 1.0, std: 2.0 };
assert!((gauss.pdf(1.0) - 0.19947114020071635_f64).abs() < 1e-12);
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian1D<T: Float> {
    pub mean: T,
    pub std: T,
}

impl<T: Float> Gaussian1D<T> {
    /// The standard normal distribution.
    pub fn standard() -> Self {
        Self {
            mean: T::zero(),
            std: T::one(),
        }
    }

    fn standardize(&self, x: T) -> T {
        (x - self.mean) / self.std
    }
}

impl<T: Float> TargetDensity<T> for Gaussian1D<T> {
    type Error = Infallible;

    fn density(&self, x: T) -> Result<T, Self::Error> {
        let z = self.standardize(x);
        Ok((-(z * z) / (T::one() + T::one())).exp())
    }
}

impl<T: Float> Normalized<T> for Gaussian1D<T> {
    fn pdf(&self, x: T) -> T {
        let z = self.standardize(x).to_f64().unwrap_or(f64::NAN);
        let std = self.std.to_f64().unwrap_or(f64::NAN);
        let p = (-0.5 * z * z).exp() / (std * (2.0 * PI).sqrt());
        T::from(p).unwrap_or_else(T::nan)
    }

    fn cdf(&self, x: T) -> T {
        let z = self.standardize(x).to_f64().unwrap_or(f64::NAN);
        T::from(0.5 * (-z / SQRT_2).compl_error()).unwrap_or_else(T::nan)
    }
}

/**
The exponential distribution with the given `rate`. Its density vanishes on the
negative half-line, so chains started there have to escape a zero-density region.

```rust
use mini_metropolis::distributions::{Exponential, TargetDensity};

let expo = Exponential { rate: 1.5 };
assert_eq!(expo.density(-1.0).unwrap(), 0.0);
assert_eq!(expo.density(0.0).unwrap(), 1.0);
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential<T: Float> {
    pub rate: T,
}

impl<T: Float> TargetDensity<T> for Exponential<T> {
    type Error = Infallible;

    fn density(&self, x: T) -> Result<T, Self::Error> {
        if x < T::zero() {
            Ok(T::zero())
        } else {
            Ok((-self.rate * x).exp())
        }
    }
}

impl<T: Float> Normalized<T> for Exponential<T> {
    fn pdf(&self, x: T) -> T {
        if x < T::zero() {
            T::zero()
        } else {
            self.rate * (-self.rate * x).exp()
        }
    }

    fn cdf(&self, x: T) -> T {
        if x < T::zero() {
            T::zero()
        } else {
            T::one() - (-self.rate * x).exp()
        }
    }
}

/**
Gaussian random-walk source: offsets are drawn from `N(0, scale²)`.

Seeded from entropy by default; call [`GaussianWalk::set_seed`] for reproducible runs.
*/
#[derive(Debug, Clone)]
pub struct GaussianWalk<T> {
    rng: SmallRng,
    phantom: PhantomData<T>,
}

impl<T> GaussianWalk<T> {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
            phantom: PhantomData,
        }
    }

    /// Returns the source re-seeded with `seed`.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }
}

impl<T> Default for GaussianWalk<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> RandomSource<T> for GaussianWalk<T>
where
    StandardNormal: Distribution<T>,
    Standard: Distribution<T>,
{
    fn proposal_offset(&mut self, scale: T) -> T {
        let z: T = self.rng.sample(StandardNormal);
        z * scale
    }

    fn uniform(&mut self) -> T {
        self.rng.gen()
    }
}

/// Uniform random-walk source: offsets are drawn from `U(-scale, scale)`.
#[derive(Debug, Clone)]
pub struct UniformWalk<T> {
    rng: SmallRng,
    phantom: PhantomData<T>,
}

impl<T> UniformWalk<T> {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
            phantom: PhantomData,
        }
    }

    /// Returns the source re-seeded with `seed`.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }
}

impl<T> Default for UniformWalk<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> RandomSource<T> for UniformWalk<T>
where
    Standard: Distribution<T>,
{
    fn proposal_offset(&mut self, scale: T) -> T {
        let u: T = self.rng.gen();
        (u + u - T::one()) * scale
    }

    fn uniform(&mut self) -> T {
        self.rng.gen()
    }
}
