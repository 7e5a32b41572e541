//! Gamma-Poisson demand model.
//!
//! Purchase counts are modelled as Poisson draws whose rate is itself
//! Gamma-distributed. [`DemandModel::fit`] moves the Gamma parameters with a
//! coupled fixed-point recurrence over the observed counts, and
//! [`DemandModel::predict_demand`] draws predictive counts by first sampling
//! a rate and then a Poisson count at that rate.
//!
//! The recurrence is **not** the textbook conjugate update
//! (`alpha0 + S`, `beta0 + n`). Each iteration runs
//!
//! ```text
//! alpha <- (alpha + S) / (1 + n / beta)
//! beta  <- (beta + n) / (alpha + S / n)
//! ```
//!
//! where the second line already sees the freshly updated `alpha`. Its fixed
//! point matches the sample mean, which is what downstream pricing relies on.
//!
//! # Examples
//!
//! ```
//! use pricer::DemandModel;
//!
//! let mut model = DemandModel::with_seed(42);
//! model.fit(&[12, 15, 18, 14, 16, 13, 17, 15, 14, 16], 1000).unwrap();
//!
//! assert!((model.mean() - 15.0).abs() < 1e-6);
//! let draws = model.predict_demand(100).unwrap();
//! assert_eq!(draws.len(), 100);
//! ```

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Gamma, Poisson};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ensure_positive};

/// Default Gamma shape before fitting.
const DEFAULT_ALPHA: f64 = 2.0;
/// Default Gamma rate before fitting.
const DEFAULT_BETA: f64 = 1.0;

/// Shape/rate pair of the Gamma distribution over the Poisson demand rate.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GammaPosterior {
    /// Shape parameter, always strictly positive.
    pub alpha: f64,
    /// Rate parameter, always strictly positive.
    pub beta: f64,
}

impl GammaPosterior {
    /// Mean of the Gamma distribution, `alpha / beta`.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.alpha / self.beta
    }

    /// Variance of the Gamma distribution, `alpha / beta²`.
    ///
    /// This is the spread of the demand *rate*, not of the predictive counts
    /// (the negative-binomial mixture has an additional `mean` term).
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.alpha / (self.beta * self.beta)
    }
}

/// Gamma-Poisson demand model with an instance-owned random generator.
///
/// # Examples
///
/// ```
/// use pricer::DemandModel;
///
/// let model = DemandModel::builder().alpha(3.0).beta(0.5).seed(7).build().unwrap();
/// assert_eq!(model.alpha(), 3.0);
/// assert_eq!(model.variance(), 12.0);
/// ```
pub struct DemandModel {
    posterior: GammaPosterior,
    rng: StdRng,
}

impl DemandModel {
    /// Creates a model with the default prior and an entropy-seeded RNG.
    #[must_use]
    pub fn new() -> Self {
        Self {
            posterior: GammaPosterior {
                alpha: DEFAULT_ALPHA,
                beta: DEFAULT_BETA,
            },
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates a model with the default prior and a fixed seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            posterior: GammaPosterior {
                alpha: DEFAULT_ALPHA,
                beta: DEFAULT_BETA,
            },
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a builder for configuring a `DemandModel`.
    #[must_use]
    pub fn builder() -> DemandModelBuilder {
        DemandModelBuilder::new()
    }

    /// Runs the coupled fixed-point update `iterations` times over `counts`.
    ///
    /// With zero iterations the parameters are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] when `counts` is empty, and
    /// [`Error::NonFiniteValue`] / [`Error::NonPositiveValue`] when the
    /// recurrence leaves the positive reals (for example an all-zero series
    /// drives `beta` to infinity). The model is unchanged on error.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(&mut self, counts: &[u64], iterations: usize) -> Result<GammaPosterior> {
        if counts.is_empty() {
            return Err(Error::EmptyInput {
                what: "purchase counts",
            });
        }
        let n = counts.len() as f64;
        let sum = counts.iter().map(|&c| c as f64).sum::<f64>();

        let GammaPosterior {
            mut alpha,
            mut beta,
        } = self.posterior;
        for _ in 0..iterations {
            alpha = (alpha + sum) / (1.0 + n / beta);
            beta = (beta + n) / (alpha + sum / n);
        }

        let posterior = GammaPosterior {
            alpha: ensure_positive("posterior alpha", alpha)?,
            beta: ensure_positive("posterior beta", beta)?,
        };
        self.posterior = posterior;
        trace_debug!(
            alpha = posterior.alpha,
            beta = posterior.beta,
            n_counts = counts.len(),
            iterations,
            "demand model fitted"
        );
        Ok(posterior)
    }

    /// Draws `n_samples` predictive demand counts.
    ///
    /// Each draw samples a rate from `Gamma(shape = alpha, scale = 1 / beta)`
    /// and then a count from `Poisson(rate)`. Every call continues the
    /// model's RNG stream, so repeated calls yield fresh samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the Gamma distribution cannot be built
    /// from the current parameters, which the positivity invariant rules out.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn predict_demand(&mut self, n_samples: usize) -> Result<Vec<u64>> {
        let gamma = Gamma::new(self.posterior.alpha, 1.0 / self.posterior.beta)
            .map_err(|_| Error::Internal("gamma parameters must be positive and finite"))?;

        let mut draws = Vec::with_capacity(n_samples);
        for _ in 0..n_samples {
            let rate: f64 = gamma.sample(&mut self.rng);
            // A rate that underflows to zero can only produce a zero count.
            let count = match Poisson::new(rate) {
                Ok(poisson) => {
                    let draw: f64 = poisson.sample(&mut self.rng);
                    draw as u64
                }
                Err(_) => 0,
            };
            draws.push(count);
        }
        Ok(draws)
    }

    /// Percentile interval of `n_samples` predictive draws.
    ///
    /// Percentiles are in `[0, 100]` and use linear interpolation between
    /// order statistics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] for zero samples and
    /// [`Error::InvalidParameter`] for percentiles outside `[0, 100]` or in
    /// the wrong order.
    #[allow(clippy::cast_precision_loss)]
    pub fn demand_interval(
        &mut self,
        n_samples: usize,
        lower_pct: f64,
        upper_pct: f64,
    ) -> Result<(f64, f64)> {
        if n_samples == 0 {
            return Err(Error::EmptyInput {
                what: "demand samples",
            });
        }
        if !(0.0..=100.0).contains(&lower_pct)
            || !(0.0..=100.0).contains(&upper_pct)
            || lower_pct > upper_pct
        {
            return Err(Error::InvalidParameter {
                name: "percentiles",
                reason: format!(
                    "need 0 <= lower <= upper <= 100, got {lower_pct} and {upper_pct}"
                ),
            });
        }

        let mut draws: Vec<f64> = self
            .predict_demand(n_samples)?
            .into_iter()
            .map(|c| c as f64)
            .collect();
        draws.sort_by(f64::total_cmp);
        Ok((
            percentile(&draws, lower_pct),
            percentile(&draws, upper_pct),
        ))
    }

    /// Current Gamma parameters.
    #[must_use]
    pub fn posterior(&self) -> GammaPosterior {
        self.posterior
    }

    /// Current shape parameter.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.posterior.alpha
    }

    /// Current rate parameter.
    #[must_use]
    pub fn beta(&self) -> f64 {
        self.posterior.beta
    }

    /// Mean of the Gamma rate distribution, see [`GammaPosterior::mean`].
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.posterior.mean()
    }

    /// Variance of the Gamma rate distribution, see [`GammaPosterior::variance`].
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.posterior.variance()
    }
}

impl Default for DemandModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring a [`DemandModel`].
///
/// All options have sensible defaults:
/// - `alpha`: 2.0
/// - `beta`: 1.0
/// - `seed`: random
#[derive(Debug, Clone, Default)]
pub struct DemandModelBuilder {
    alpha: Option<f64>,
    beta: Option<f64>,
    seed: Option<u64>,
    rng: Option<StdRng>,
}

impl DemandModelBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the starting shape parameter.
    #[must_use]
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Sets the starting rate parameter.
    #[must_use]
    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = Some(beta);
        self
    }

    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Injects an already constructed generator. Takes precedence over `seed`.
    #[must_use]
    pub fn rng(mut self, rng: StdRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Builds the configured [`DemandModel`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if either prior parameter is not
    /// a positive finite number.
    pub fn build(self) -> Result<DemandModel> {
        let alpha = self.alpha.unwrap_or(DEFAULT_ALPHA);
        let beta = self.beta.unwrap_or(DEFAULT_BETA);
        for (name, value) in [("alpha", alpha), ("beta", beta)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidParameter {
                    name,
                    reason: format!("must be positive and finite, got {value}"),
                });
            }
        }

        let rng = match (self.rng, self.seed) {
            (Some(rng), _) => rng,
            (None, Some(seed)) => StdRng::seed_from_u64(seed),
            (None, None) => StdRng::from_os_rng(),
        };
        Ok(DemandModel {
            posterior: GammaPosterior { alpha, beta },
            rng,
        })
    }
}

/// Linearly interpolated percentile of an ascending, non-empty slice.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
