//! Revenue-maximizing price search.
//!
//! [`PriceSearch`] derives a price interval from cost, competitor prices and
//! inventory pressure, then maximizes `(price - cost) * demand(price)` on that
//! interval with [golden-section search](crate::golden), using the trained
//! [`ElasticityEstimator`] as the demand oracle.
//!
//! # Interval construction
//!
//! | Step | Rule (defaults) |
//! |------|-----------------|
//! | competitor band | min/max of competitor prices, or `0.8 x` / `1.2 x` current price when none are given |
//! | inventory factor | `0.95` when stock exceeds `1.2 x` target, `1.05` below `0.8 x` target, else `1.0` |
//! | lower | `max(1.1 x cost, 0.95 x min_comp x factor)` |
//! | upper | `min(1.5 x current, 1.05 x max_comp x factor)` |
//!
//! A derived interval with `lower > upper` is reported as
//! [`Error::InvalidPriceInterval`] and never searched.
//!
//! # Examples
//!
//! ```
//! use pricer::{PriceRequest, PriceSearch};
//!
//! let prices = [26.0, 30.0, 34.0, 38.0, 42.0];
//! let quantities: Vec<f64> = prices.iter().map(|p: &f64| 1.0e5 / (p * p)).collect();
//!
//! let mut search = PriceSearch::new();
//! search.train_elasticity("sku-1", &prices, &quantities).unwrap();
//!
//! let result = search
//!     .optimize_price("sku-1", &PriceRequest::new(35.0, 20.0))
//!     .unwrap();
//! // Elasticity -2 puts the revenue optimum at twice the unit cost.
//! assert!((result.optimal_price - 40.0).abs() < 1e-3);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::elasticity::ElasticityEstimator;
use crate::error::{Error, Result, ensure_finite, ensure_positive};
use crate::golden;

/// Policy constants used to derive the search interval.
///
/// Defaults reproduce the rules listed in the [module docs](self).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PricingConfig {
    /// Minimum markup over cost for the lower bound.
    pub cost_markup: f64,
    /// Multiplier on the cheapest competitor price for the lower bound.
    pub competitor_floor: f64,
    /// Multiplier on the dearest competitor price for the upper bound.
    pub competitor_ceiling: f64,
    /// Maximum multiple of the current price for the upper bound.
    pub max_price_ratio: f64,
    /// Assumed cheapest competitor, as a multiple of the current price, when
    /// no competitor prices are known.
    pub fallback_min_ratio: f64,
    /// Assumed dearest competitor, as a multiple of the current price, when
    /// no competitor prices are known.
    pub fallback_max_ratio: f64,
    /// Stock above `surplus_threshold x target` counts as surplus.
    pub surplus_threshold: f64,
    /// Stock below `scarcity_threshold x target` counts as scarce.
    pub scarcity_threshold: f64,
    /// Band multiplier applied on surplus.
    pub surplus_factor: f64,
    /// Band multiplier applied on scarcity.
    pub scarcity_factor: f64,
    /// Absolute bracket width at which the golden-section search stops.
    pub tolerance: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            cost_markup: 1.1,
            competitor_floor: 0.95,
            competitor_ceiling: 1.05,
            max_price_ratio: 1.5,
            fallback_min_ratio: 0.8,
            fallback_max_ratio: 1.2,
            surplus_threshold: 1.2,
            scarcity_threshold: 0.8,
            surplus_factor: 0.95,
            scarcity_factor: 1.05,
            tolerance: golden::DEFAULT_TOLERANCE,
        }
    }
}

impl PricingConfig {
    /// Sets the golden-section tolerance.
    #[must_use]
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Band multiplier for the given stock situation.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn inventory_factor(&self, inventory_level: u64, target_inventory: u64) -> f64 {
        let level = inventory_level as f64;
        let target = target_inventory as f64;
        if level > target * self.surplus_threshold {
            self.surplus_factor
        } else if level < target * self.scarcity_threshold {
            self.scarcity_factor
        } else {
            1.0
        }
    }

    fn validate(&self) -> Result<()> {
        let multipliers = [
            ("cost_markup", self.cost_markup),
            ("competitor_floor", self.competitor_floor),
            ("competitor_ceiling", self.competitor_ceiling),
            ("max_price_ratio", self.max_price_ratio),
            ("fallback_min_ratio", self.fallback_min_ratio),
            ("fallback_max_ratio", self.fallback_max_ratio),
            ("surplus_threshold", self.surplus_threshold),
            ("scarcity_threshold", self.scarcity_threshold),
            ("surplus_factor", self.surplus_factor),
            ("scarcity_factor", self.scarcity_factor),
            ("tolerance", self.tolerance),
        ];
        for (name, value) in multipliers {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidParameter {
                    name,
                    reason: format!("must be positive and finite, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Market situation for a single pricing decision.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceRequest {
    /// Price currently charged.
    pub current_price: f64,
    /// Unit cost.
    pub cost: f64,
    /// Observed competitor prices, possibly empty.
    pub competitor_prices: Vec<f64>,
    /// Units in stock.
    pub inventory_level: u64,
    /// Desired units in stock.
    pub target_inventory: u64,
}

impl PriceRequest {
    /// Request without competitor data and with balanced inventory.
    #[must_use]
    pub fn new(current_price: f64, cost: f64) -> Self {
        Self {
            current_price,
            cost,
            competitor_prices: Vec::new(),
            inventory_level: 0,
            target_inventory: 0,
        }
    }

    /// Sets the observed competitor prices.
    #[must_use]
    pub fn competitor_prices(mut self, prices: impl Into<Vec<f64>>) -> Self {
        self.competitor_prices = prices.into();
        self
    }

    /// Sets the current and desired stock.
    #[must_use]
    pub fn inventory(mut self, level: u64, target: u64) -> Self {
        self.inventory_level = level;
        self.target_inventory = target;
        self
    }

    fn validate(&self) -> Result<()> {
        ensure_positive("current price", self.current_price)?;
        ensure_finite("cost", self.cost)?;
        for &p in &self.competitor_prices {
            ensure_positive("competitor price", p)?;
        }
        Ok(())
    }
}

/// Closed price interval searched for the optimum.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PriceBounds {
    /// Lowest admissible price.
    pub lower: f64,
    /// Highest admissible price.
    pub upper: f64,
}

impl PriceBounds {
    /// Whether `price` lies in the closed interval.
    #[must_use]
    pub fn contains(&self, price: f64) -> bool {
        (self.lower..=self.upper).contains(&price)
    }
}

/// Outcome of a price optimization.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizationResult {
    /// Revenue-maximizing price in the searched interval.
    pub optimal_price: f64,
    /// Predicted demand at the optimal price.
    pub expected_demand: f64,
    /// `(optimal_price - cost) x expected_demand`.
    pub expected_revenue: f64,
    /// Relative change against revenue at the current price, in percent.
    pub revenue_lift_percent: f64,
}

/// Price optimizer backed by per-product elasticity estimates.
#[derive(Clone, Debug, Default)]
pub struct PriceSearch {
    estimator: ElasticityEstimator,
    config: PricingConfig,
}

impl PriceSearch {
    /// Creates a search with default policy and no trained products.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a search with a custom policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if any policy constant is not a
    /// positive finite number.
    pub fn with_config(config: PricingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            estimator: ElasticityEstimator::new(),
            config,
        })
    }

    /// Fits the elasticity of `product_id`, see
    /// [`ElasticityEstimator::calculate_elasticity`].
    ///
    /// # Errors
    ///
    /// Propagates the estimator's validation errors.
    pub fn train_elasticity(
        &mut self,
        product_id: &str,
        prices: &[f64],
        quantities: &[f64],
    ) -> Result<f64> {
        self.estimator
            .calculate_elasticity(prices, quantities, product_id)
    }

    /// Stored elasticity of `product_id`, 0 if untrained.
    #[must_use]
    pub fn elasticity(&self, product_id: &str) -> f64 {
        self.estimator.elasticity(product_id)
    }

    /// The underlying demand oracle.
    #[must_use]
    pub fn estimator(&self) -> &ElasticityEstimator {
        &self.estimator
    }

    /// Mutable access to the demand oracle, e.g. to record baselines.
    pub fn estimator_mut(&mut self) -> &mut ElasticityEstimator {
        &mut self.estimator
    }

    /// Active policy.
    #[must_use]
    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Derives the interval searched for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPriceInterval`] when the rules produce
    /// `lower > upper`, and validation errors for non-positive or non-finite
    /// prices.
    pub fn price_bounds(&self, request: &PriceRequest) -> Result<PriceBounds> {
        request.validate()?;
        let cfg = &self.config;

        let (min_comp, max_comp) = if request.competitor_prices.is_empty() {
            (
                request.current_price * cfg.fallback_min_ratio,
                request.current_price * cfg.fallback_max_ratio,
            )
        } else {
            request
                .competitor_prices
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
                    (lo.min(p), hi.max(p))
                })
        };
        let factor = cfg.inventory_factor(request.inventory_level, request.target_inventory);

        let lower = (request.cost * cfg.cost_markup).max(min_comp * cfg.competitor_floor * factor);
        let upper = (request.current_price * cfg.max_price_ratio)
            .min(max_comp * cfg.competitor_ceiling * factor);
        trace_debug!(lower, upper, factor, "price interval derived");

        if lower > upper {
            return Err(Error::InvalidPriceInterval { lower, upper });
        }
        Ok(PriceBounds { lower, upper })
    }

    /// Searches the derived interval for the revenue-maximizing price of
    /// `product_id`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPriceInterval`] for a degenerate interval.
    /// - [`Error::ZeroBaselineRevenue`] when revenue at the current price is
    ///   zero (e.g. an untrained product), since the lift is undefined.
    /// - Validation errors for the request.
    pub fn optimize_price(
        &self,
        product_id: &str,
        request: &PriceRequest,
    ) -> Result<OptimizationResult> {
        let bounds = self.price_bounds(request)?;
        let revenue = |price: f64| {
            (price - request.cost)
                * self
                    .estimator
                    .predict_demand(request.current_price, price, product_id)
        };

        let optimal_price =
            golden::maximize(revenue, bounds.lower, bounds.upper, self.config.tolerance)?;
        let expected_demand =
            self.estimator
                .predict_demand(request.current_price, optimal_price, product_id);
        let expected_revenue = (optimal_price - request.cost) * expected_demand;

        let current_revenue = revenue(request.current_price);
        if current_revenue == 0.0 {
            return Err(Error::ZeroBaselineRevenue);
        }
        let revenue_lift_percent = (expected_revenue - current_revenue) / current_revenue * 100.0;

        trace_info!(
            product_id,
            optimal_price,
            expected_revenue,
            revenue_lift_percent,
            "price optimized"
        );
        Ok(OptimizationResult {
            optimal_price,
            expected_demand,
            expected_revenue,
            revenue_lift_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elastic_search(e: f64) -> PriceSearch {
        let prices: Vec<f64> = (0..10).map(|i| 20.0 + 3.0 * f64::from(i)).collect();
        let quantities: Vec<f64> = prices.iter().map(|p| 1.0e5 * p.powf(-e)).collect();
        let mut search = PriceSearch::new();
        search.train_elasticity("sku", &prices, &quantities).unwrap();
        search
    }

    #[test]
    fn test_inventory_factor() {
        let cfg = PricingConfig::default();
        assert_eq!(cfg.inventory_factor(500, 400), 0.95);
        assert_eq!(cfg.inventory_factor(300, 400), 1.05);
        assert_eq!(cfg.inventory_factor(450, 400), 1.0);
        assert_eq!(cfg.inventory_factor(480, 400), 1.0);
        assert_eq!(cfg.inventory_factor(0, 0), 1.0);
    }

    #[test]
    fn test_bounds_with_competitors() {
        let search = PriceSearch::new();
        let request = PriceRequest::new(35.0, 20.0)
            .competitor_prices(vec![33.0, 37.0, 36.5])
            .inventory(450, 400);
        let bounds = search.price_bounds(&request).unwrap();
        assert!((bounds.lower - 33.0 * 0.95).abs() < 1e-12);
        assert!((bounds.upper - 37.0 * 1.05).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_without_competitors_surplus() {
        let search = PriceSearch::new();
        let request = PriceRequest::new(50.0, 10.0).inventory(1000, 100);
        let bounds = search.price_bounds(&request).unwrap();
        assert!((bounds.lower - 40.0 * 0.95 * 0.95).abs() < 1e-12);
        assert!((bounds.upper - 60.0 * 1.05 * 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_cost_floor_dominates() {
        let search = PriceSearch::new();
        let bounds = search.price_bounds(&PriceRequest::new(35.0, 30.0)).unwrap();
        assert!((bounds.lower - 33.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_interval_is_an_error() {
        let search = elastic_search(2.0);
        let err = search
            .optimize_price("sku", &PriceRequest::new(35.0, 100.0))
            .unwrap_err();
        match err {
            Error::InvalidPriceInterval { lower, upper } => {
                assert!((lower - 110.0).abs() < 1e-9);
                assert!(lower > upper);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_optimum_of_elastic_demand() {
        let search = elastic_search(2.0);
        let request = PriceRequest::new(35.0, 20.0);
        let bounds = search.price_bounds(&request).unwrap();
        let result = search.optimize_price("sku", &request).unwrap();

        assert!(bounds.lower < result.optimal_price && result.optimal_price < bounds.upper);
        assert!((result.optimal_price - 40.0).abs() < 1e-3);

        let base = search.estimator().record("sku").unwrap().base_demand;
        let demand = base * (result.optimal_price / 35.0).powf(search.elasticity("sku"));
        assert!((result.expected_demand - demand).abs() < 1e-9);
        assert!(
            (result.expected_revenue - (result.optimal_price - 20.0) * result.expected_demand)
                .abs()
                < 1e-9
        );
        let current = 15.0 * base;
        let lift = (result.expected_revenue - current) / current * 100.0;
        assert!((result.revenue_lift_percent - lift).abs() < 1e-9);
        assert!(result.revenue_lift_percent > 0.0);
    }

    #[test]
    fn test_inelastic_demand_pushes_to_upper_bound() {
        let search = elastic_search(0.5);
        let request = PriceRequest::new(35.0, 20.0).competitor_prices([33.0, 37.0, 36.5]);
        let bounds = search.price_bounds(&request).unwrap();
        let result = search.optimize_price("sku", &request).unwrap();
        assert!(bounds.upper - result.optimal_price < 1e-4);
        assert!(result.optimal_price < bounds.upper);
    }

    #[test]
    fn test_untrained_product_has_zero_baseline() {
        let search = PriceSearch::new();
        assert!(matches!(
            search.optimize_price("unknown", &PriceRequest::new(35.0, 20.0)),
            Err(Error::ZeroBaselineRevenue)
        ));
    }

    #[test]
    fn test_request_validation() {
        let search = elastic_search(2.0);
        assert!(matches!(
            search.optimize_price("sku", &PriceRequest::new(0.0, 20.0)),
            Err(Error::NonPositiveValue { .. })
        ));
        assert!(matches!(
            search.optimize_price("sku", &PriceRequest::new(35.0, f64::NAN)),
            Err(Error::NonFiniteValue { .. })
        ));
        assert!(matches!(
            search.optimize_price(
                "sku",
                &PriceRequest::new(35.0, 20.0).competitor_prices([-1.0])
            ),
            Err(Error::NonPositiveValue { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(PriceSearch::with_config(PricingConfig::default().tolerance(1e-8)).is_ok());
        assert!(matches!(
            PriceSearch::with_config(PricingConfig::default().tolerance(-1.0)),
            Err(Error::InvalidParameter {
                name: "tolerance",
                ..
            })
        ));
    }
}
