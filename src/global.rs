//! Sequential black-box optimizer with an Expected Improvement acquisition.
//!
//! The optimizer never evaluates the objective itself. Callers ask for a
//! point with [`GlobalOptimizer::propose_next`], evaluate it however they
//! like, and report the value with [`GlobalOptimizer::update`]. Values are
//! **maximized**.
//!
//! # Algorithm overview
//!
//! 1. **Startup phase**: while fewer than `n_startup` observations exist,
//!    points are drawn uniformly at random inside the bounds.
//! 2. **Surrogate**: every observation contributes a kernel weight
//!    `k = exp(-0.5 · ‖x − xᵢ‖)` with a fixed bandwidth. The surrogate mean is
//!    `Σ kᵢ·yᵢ / n` (divided by the observation count, not by `Σ kᵢ`, so it
//!    shrinks towards zero away from the data). The surrogate spread starts at
//!    1 and is multiplied by `1 − 0.1·kᵢ` per observation, floored at 0.01.
//! 3. **Acquisition**: `n_candidates` uniform random points are scored by
//!    Expected Improvement over the best observed value and the best scoring
//!    candidate is returned.
//!
//! The standard normal CDF inside Expected Improvement uses the
//! Abramowitz-Stegun polynomial approximation (absolute error below about
//! 1e-7) rather than an exact `erf`, so EI scores can differ from an
//! `erf`-based evaluation in the seventh decimal.
//!
//! This is a deliberately cheap stand-in for a Gaussian process: it has no
//! fitted hyperparameters and its spread is not a calibrated posterior.
//!
//! # Configuration
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `n_startup` | 5 | Random proposals before the surrogate is used |
//! | `n_candidates` | 100 | Random candidates scored per proposal |
//! | `seed` | random | RNG seed for reproducibility |
//!
//! # Examples
//!
//! ```
//! use pricer::GlobalOptimizer;
//!
//! let mut opt = GlobalOptimizer::with_seed(vec![(20.0, 50.0)], 42).unwrap();
//! for _ in 0..15 {
//!     let x = opt.propose_next();
//!     let y = -(x[0] - 32.5).powi(2) + 150.0;
//!     opt.update(x, y).unwrap();
//! }
//! let best = opt.best();
//! assert_eq!(best.params.len(), 1);
//! assert!(best.value <= 150.0);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ensure_finite};
use crate::rng_util;

/// Default number of random proposals before EI-guided sampling begins.
const DEFAULT_N_STARTUP: usize = 5;
/// Default number of candidate points for EI maximization.
const DEFAULT_N_CANDIDATES: usize = 100;
/// Lower limit of the surrogate spread.
const MIN_SIGMA: f64 = 0.01;
/// Per-observation shrink rate of the surrogate spread.
const SIGMA_DECAY: f64 = 0.1;

/// A single evaluated point.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SamplePoint {
    /// Coordinates, one per dimension.
    pub x: Vec<f64>,
    /// Objective value reported by the caller.
    pub y: f64,
}

/// Best observation so far, or an empty point with value 0 when nothing has
/// been observed.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BestPoint {
    /// Coordinates of the best observation.
    pub params: Vec<f64>,
    /// Its objective value.
    pub value: f64,
}

/// Ask/tell maximizer over an axis-aligned box.
pub struct GlobalOptimizer {
    bounds: Vec<(f64, f64)>,
    observations: Vec<SamplePoint>,
    rng: fastrand::Rng,
    n_startup: usize,
    n_candidates: usize,
}

impl GlobalOptimizer {
    /// Creates an optimizer over `bounds` with a random seed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBounds`] for an empty bounds vector and
    /// [`Error::InvalidBounds`] for a pair with `lo > hi` or a non-finite end.
    pub fn new(bounds: Vec<(f64, f64)>) -> Result<Self> {
        GlobalOptimizerBuilder::new().build(bounds)
    }

    /// Creates an optimizer over `bounds` with a fixed seed.
    ///
    /// # Errors
    ///
    /// Same conditions as [`GlobalOptimizer::new`].
    pub fn with_seed(bounds: Vec<(f64, f64)>, seed: u64) -> Result<Self> {
        GlobalOptimizerBuilder::new().seed(seed).build(bounds)
    }

    /// Creates a builder for configuring a `GlobalOptimizer`.
    #[must_use]
    pub fn builder() -> GlobalOptimizerBuilder {
        GlobalOptimizerBuilder::new()
    }

    /// Proposes the next point to evaluate. Always inside the bounds.
    pub fn propose_next(&mut self) -> Vec<f64> {
        if self.observations.len() < self.n_startup {
            trace_debug!(n_observations = self.observations.len(), "startup proposal");
            return rng_util::point_in_bounds(&mut self.rng, &self.bounds);
        }

        let best_y = self.best_value();
        let mut best_ei = f64::NEG_INFINITY;
        let mut best_x = Vec::new();
        for _ in 0..self.n_candidates {
            let x = rng_util::point_in_bounds(&mut self.rng, &self.bounds);
            let ei = self.expected_improvement(&x, best_y);
            if ei > best_ei || best_x.is_empty() {
                best_ei = ei;
                best_x = x;
            }
        }
        // Zero candidates configured: fall back to a random point.
        if best_x.is_empty() {
            best_x = rng_util::point_in_bounds(&mut self.rng, &self.bounds);
        }
        trace_debug!(best_ei, "acquisition maximized");
        best_x
    }

    /// Expected Improvement of `x` over `best_y` under the kernel surrogate.
    ///
    /// With no observations the surrogate is `mu = 0`, `sigma = 1`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn expected_improvement(&self, x: &[f64], best_y: f64) -> f64 {
        let mut mu = 0.0;
        let mut sigma = 1.0;
        for obs in &self.observations {
            let k = (-0.5 * euclidean_distance(x, &obs.x)).exp();
            mu += k * obs.y;
            sigma *= 1.0 - k * SIGMA_DECAY;
        }
        if !self.observations.is_empty() {
            mu /= self.observations.len() as f64;
            sigma = sigma.max(MIN_SIGMA);
        }

        let z = (mu - best_y) / sigma;
        (mu - best_y) * norm_cdf(z) + sigma * norm_pdf(z)
    }

    /// Records an evaluated point. Duplicates are kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `x` does not have one
    /// coordinate per dimension and [`Error::NonFiniteValue`] for a NaN or
    /// infinite `y`.
    pub fn update(&mut self, x: Vec<f64>, y: f64) -> Result<()> {
        if x.len() != self.bounds.len() {
            return Err(Error::DimensionMismatch {
                expected: self.bounds.len(),
                got: x.len(),
            });
        }
        ensure_finite("objective value", y)?;
        self.observations.push(SamplePoint { x, y });
        Ok(())
    }

    /// Best observation; the earliest one wins ties.
    #[must_use]
    pub fn best(&self) -> BestPoint {
        self.best_observation()
            .map(|obs| BestPoint {
                params: obs.x.clone(),
                value: obs.y,
            })
            .unwrap_or_default()
    }

    /// Runs `n_iterations` rounds of propose, evaluate, update.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteValue`] as soon as `objective` yields NaN
    /// or an infinite value; earlier observations are kept.
    pub fn optimize<F>(&mut self, n_iterations: usize, mut objective: F) -> Result<BestPoint>
    where
        F: FnMut(&[f64]) -> f64,
    {
        for _ in 0..n_iterations {
            let x = self.propose_next();
            let y = objective(&x);
            self.update(x, y)?;
        }
        let best = self.best();
        trace_info!(
            n_observations = self.observations.len(),
            best_value = best.value,
            "global optimization finished"
        );
        Ok(best)
    }

    /// All observations in insertion order.
    #[must_use]
    pub fn observations(&self) -> &[SamplePoint] {
        &self.observations
    }

    /// Search space, one `(lo, hi)` pair per dimension.
    #[must_use]
    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    fn best_observation(&self) -> Option<&SamplePoint> {
        self.observations
            .iter()
            .fold(None, |best: Option<&SamplePoint>, obs| match best {
                Some(b) if b.y >= obs.y => Some(b),
                _ => Some(obs),
            })
    }

    fn best_value(&self) -> f64 {
        self.best_observation().map_or(0.0, |obs| obs.y)
    }
}

/// Builder for configuring a [`GlobalOptimizer`].
///
/// All options have sensible defaults:
/// - `n_startup`: 5
/// - `n_candidates`: 100
/// - `seed`: random
#[derive(Debug, Clone, Default)]
pub struct GlobalOptimizerBuilder {
    n_startup: Option<usize>,
    n_candidates: Option<usize>,
    seed: Option<u64>,
}

impl GlobalOptimizerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of random proposals before EI-guided sampling begins.
    #[must_use]
    pub fn n_startup(mut self, n: usize) -> Self {
        self.n_startup = Some(n);
        self
    }

    /// Sets the number of random candidates scored per proposal.
    #[must_use]
    pub fn n_candidates(mut self, n: usize) -> Self {
        self.n_candidates = Some(n);
        self
    }

    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds an optimizer over `bounds`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBounds`] for an empty bounds vector and
    /// [`Error::InvalidBounds`] for a pair with `lo > hi` or a non-finite end.
    pub fn build(self, bounds: Vec<(f64, f64)>) -> Result<GlobalOptimizer> {
        if bounds.is_empty() {
            return Err(Error::EmptyBounds);
        }
        if let Some(&(low, high)) = bounds
            .iter()
            .find(|(lo, hi)| !(lo.is_finite() && hi.is_finite()) || lo > hi)
        {
            return Err(Error::InvalidBounds { low, high });
        }

        Ok(GlobalOptimizer {
            bounds,
            observations: Vec::new(),
            rng: self
                .seed
                .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed),
            n_startup: self.n_startup.unwrap_or(DEFAULT_N_STARTUP),
            n_candidates: self.n_candidates.unwrap_or(DEFAULT_N_CANDIDATES),
        })
    }
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(p, q)| (p - q) * (p - q))
        .sum::<f64>()
        .sqrt()
}

// ---------------------------------------------------------------------------
// Normal distribution helpers (Abramowitz-Stegun approximation)
// ---------------------------------------------------------------------------

/// Standard normal PDF.
fn norm_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF (Abramowitz-Stegun rational approximation).
fn norm_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }

    let abs_x = x.abs();
    let t = 1.0 / (1.0 + 0.231_641_9 * abs_x);
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;

    let poly = 0.319_381_530 * t - 0.356_563_782 * t2 + 1.781_477_937 * t3 - 1.821_255_978 * t4
        + 1.330_274_429 * t5;
    let cdf = 1.0 - norm_pdf(abs_x) * poly;

    if x >= 0.0 { cdf } else { 1.0 - cdf }
}
