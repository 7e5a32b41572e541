//! Log-log price elasticity estimation.
//!
//! Fits `ln(q) = c + e * ln(p)` by ordinary least squares per product and
//! predicts demand at a counterfactual price with the constant-elasticity
//! curve `base_demand * (new_price / current_price)^e`.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ensure_positive};

/// Offset added before taking logarithms.
const LOG_EPSILON: f64 = 1e-10;

/// Trained demand response of a single product.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElasticityRecord {
    /// Slope of log-quantity on log-price. `None` when only a baseline
    /// demand has been recorded.
    pub elasticity: Option<f64>,
    /// Mean observed quantity, used as demand at the current price.
    pub base_demand: f64,
}

/// Per-product elasticity store.
///
/// # Examples
///
/// ```
/// use pricer::ElasticityEstimator;
///
/// let prices = [10.0, 20.0, 40.0];
/// let quantities: Vec<f64> = prices.iter().map(|p: &f64| 800.0 / (p * p)).collect();
///
/// let mut estimator = ElasticityEstimator::new();
/// let e = estimator.calculate_elasticity(&prices, &quantities, "sku-1").unwrap();
/// assert!((e + 2.0).abs() < 1e-6);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ElasticityEstimator {
    records: HashMap<String, ElasticityRecord>,
}

impl ElasticityEstimator {
    /// Creates an empty estimator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fits the elasticity of `product_id` and stores it together with the
    /// mean quantity, replacing any earlier record for that product.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] if no observations are given.
    /// - [`Error::LengthMismatch`] if the series differ in length.
    /// - [`Error::NonPositiveValue`] / [`Error::NonFiniteValue`] for prices or
    ///   quantities that cannot enter the logarithm.
    /// - [`Error::SingularRegression`] for a single observation or constant
    ///   prices.
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn calculate_elasticity(
        &mut self,
        prices: &[f64],
        quantities: &[f64],
        product_id: &str,
    ) -> Result<f64> {
        if prices.len() != quantities.len() {
            return Err(Error::LengthMismatch {
                prices: prices.len(),
                quantities: quantities.len(),
            });
        }
        if prices.is_empty() {
            return Err(Error::EmptyInput {
                what: "price history",
            });
        }
        for (&p, &q) in prices.iter().zip(quantities) {
            ensure_positive("price", p)?;
            ensure_positive("quantity", q)?;
        }

        let n = prices.len() as f64;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut sum_xy = 0.0;
        let mut sum_xx = 0.0;
        for (&p, &q) in prices.iter().zip(quantities) {
            let x = (p + LOG_EPSILON).ln();
            let y = (q + LOG_EPSILON).ln();
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_xx += x * x;
        }

        // Rounding can leave a tiny nonzero denominator for constant prices,
        // so compare the prices themselves as well.
        let constant_price = prices.iter().all(|&p| p == prices[0]);
        let denominator = n * sum_xx - sum_x * sum_x;
        if constant_price || denominator <= 0.0 {
            return Err(Error::SingularRegression { n: prices.len() });
        }
        let elasticity = (n * sum_xy - sum_x * sum_y) / denominator;
        let base_demand = quantities.iter().sum::<f64>() / n;

        self.records.insert(
            product_id.to_owned(),
            ElasticityRecord {
                elasticity: Some(elasticity),
                base_demand,
            },
        );
        trace_info!(product_id, elasticity, base_demand, "elasticity trained");
        Ok(elasticity)
    }

    /// Records a baseline demand for `product_id` without touching its
    /// elasticity. Untrained products then predict this constant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteValue`] for NaN or infinite demand.
    pub fn record_base_demand(&mut self, product_id: &str, base_demand: f64) -> Result<()> {
        let base_demand = crate::error::ensure_finite("base demand", base_demand)?;
        self.records
            .entry(product_id.to_owned())
            .and_modify(|r| r.base_demand = base_demand)
            .or_insert(ElasticityRecord {
                elasticity: None,
                base_demand,
            });
        Ok(())
    }

    /// Demand of `product_id` at `new_price` relative to `current_price`.
    ///
    /// Without an elasticity this is the recorded base demand, or 0 for an
    /// unknown product.
    #[must_use]
    pub fn predict_demand(&self, current_price: f64, new_price: f64, product_id: &str) -> f64 {
        match self.records.get(product_id) {
            None => 0.0,
            Some(ElasticityRecord {
                elasticity: None,
                base_demand,
            }) => *base_demand,
            Some(ElasticityRecord {
                elasticity: Some(elasticity),
                base_demand,
            }) => base_demand * (new_price / current_price).powf(*elasticity),
        }
    }

    /// Stored elasticity of `product_id`, 0 if it was never trained.
    #[must_use]
    pub fn elasticity(&self, product_id: &str) -> f64 {
        self.records
            .get(product_id)
            .and_then(|r| r.elasticity)
            .unwrap_or(0.0)
    }

    /// Full record of `product_id`, if any.
    #[must_use]
    pub fn record(&self, product_id: &str) -> Option<&ElasticityRecord> {
        self.records.get(product_id)
    }

    /// Iterates over all stored records.
    pub fn records(&self) -> impl Iterator<Item = (&str, &ElasticityRecord)> {
        self.records.iter().map(|(id, r)| (id.as_str(), r))
    }
}
