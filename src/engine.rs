//! High-level pricing engine.
//!
//! [`PricingEngine`] keeps one [`DemandModel`] per product next to a shared
//! [`PriceSearch`] and [`AbTest`], records every price recommendation it
//! makes, and can summarize what it knows in a [`PricingReport`].

use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ab_test::{AbTest, VariantPosterior};
use crate::demand::{DemandModel, GammaPosterior};
use crate::error::{Error, Result};
use crate::global::{BestPoint, GlobalOptimizer};
use crate::pricing::{OptimizationResult, PriceRequest, PriceSearch, PricingConfig};
use crate::rng_util;

/// Fixed-point iterations used when training demand models.
const DEMAND_FIT_ITERATIONS: usize = 1000;
/// Predictive draws behind a demand interval.
const INTERVAL_SAMPLES: usize = 1000;
/// Posterior draws behind A/B comparisons.
const AB_SAMPLES: usize = 10_000;

/// Price recommendation for one product.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PriceRecommendation {
    /// Search outcome.
    pub result: OptimizationResult,
    /// Elasticity the search was based on.
    pub elasticity: f64,
    /// 5th and 95th percentile of predictive demand, when a demand model
    /// has been trained for the product.
    pub demand_interval: Option<(f64, f64)>,
}

/// Log entry for a recommendation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PricingDecision {
    /// Position in the engine's decision log.
    pub sequence: u64,
    /// Product the decision applies to.
    pub product_id: String,
    /// Recommended price.
    pub recommended_price: f64,
    /// Price charged when the recommendation was made.
    pub current_price: f64,
    /// Stock when the recommendation was made.
    pub inventory_level: u64,
}

/// Outcome of an A/B comparison.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AbTestSummary {
    /// Probability of each variant being best.
    pub probabilities: BTreeMap<String, f64>,
    /// Expected loss of choosing each variant.
    pub expected_loss: BTreeMap<String, f64>,
    /// Posterior of each variant.
    pub variants: BTreeMap<String, VariantPosterior>,
}

/// Result of a global optimization run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizationRun {
    /// Best point found.
    pub best: BestPoint,
    /// Number of objective evaluations.
    pub n_iterations: usize,
}

/// What the engine knows about one product.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProductReport {
    /// Fitted demand distribution, if trained.
    pub demand_model: Option<GammaPosterior>,
    /// Fitted elasticity, if trained.
    pub elasticity: Option<f64>,
}

/// Aggregate figures of a report.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReportSummary {
    /// Number of products requested.
    pub total_products: usize,
    /// Mean elasticity over the requested products that have one, 0 if none.
    pub avg_elasticity: f64,
    /// Length of the decision log.
    pub decision_count: usize,
}

/// Snapshot of the engine for a set of products.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PricingReport {
    /// Per-product details.
    pub products: BTreeMap<String, ProductReport>,
    /// Aggregates.
    pub summary: ReportSummary,
}

/// Facade combining demand models, elasticity-based price search, A/B testing
/// and global optimization.
///
/// # Examples
///
/// ```
/// use pricer::{PriceRequest, PricingEngine};
///
/// let mut engine = PricingEngine::with_seed(42);
/// engine.train_demand_model("sku", &[12, 15, 18, 14, 16]).unwrap();
///
/// let prices = [26.0, 30.0, 34.0, 38.0, 42.0];
/// let quantities: Vec<f64> = prices.iter().map(|p: &f64| 1.0e5 / (p * p)).collect();
/// engine.train_elasticity("sku", &prices, &quantities).unwrap();
///
/// let rec = engine.optimize_price("sku", &PriceRequest::new(35.0, 20.0)).unwrap();
/// assert!(rec.demand_interval.is_some());
/// assert_eq!(engine.decisions().len(), 1);
/// ```
pub struct PricingEngine {
    seed: Option<u64>,
    demand_models: HashMap<String, DemandModel>,
    search: PriceSearch,
    ab_test: AbTest,
    decisions: Vec<PricingDecision>,
}

impl PricingEngine {
    /// Creates an engine with default policy and random seeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seed: None,
            demand_models: HashMap::new(),
            search: PriceSearch::new(),
            ab_test: AbTest::new(),
            decisions: Vec::new(),
        }
    }

    /// Creates an engine whose random components all derive from `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ab_test: AbTest::with_seed(rng_util::derive_seed(seed, "ab-test")),
            ..Self::new()
        }
    }

    /// Creates an engine with a custom pricing policy.
    ///
    /// # Errors
    ///
    /// Propagates [`PriceSearch::with_config`] validation errors.
    pub fn with_config(config: PricingConfig, seed: Option<u64>) -> Result<Self> {
        let mut engine = seed.map_or_else(Self::new, Self::with_seed);
        engine.search = PriceSearch::with_config(config)?;
        Ok(engine)
    }

    /// Fits a fresh demand model for `product_id`, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Propagates [`DemandModel::fit`] errors; the previous model is kept.
    pub fn train_demand_model(
        &mut self,
        product_id: &str,
        purchases: &[u64],
    ) -> Result<GammaPosterior> {
        let mut model = match self.seed {
            Some(seed) => DemandModel::with_seed(rng_util::derive_seed(seed, product_id)),
            None => DemandModel::new(),
        };
        let posterior = model.fit(purchases, DEMAND_FIT_ITERATIONS)?;
        self.demand_models.insert(product_id.to_owned(), model);
        Ok(posterior)
    }

    /// Fits the price elasticity of `product_id`.
    ///
    /// # Errors
    ///
    /// Propagates [`PriceSearch::train_elasticity`] errors.
    pub fn train_elasticity(
        &mut self,
        product_id: &str,
        prices: &[f64],
        quantities: &[f64],
    ) -> Result<f64> {
        self.search.train_elasticity(product_id, prices, quantities)
    }

    /// Recommends a price for `product_id` and logs the decision.
    ///
    /// # Errors
    ///
    /// Propagates [`PriceSearch::optimize_price`] errors; nothing is logged
    /// on failure.
    pub fn optimize_price(
        &mut self,
        product_id: &str,
        request: &PriceRequest,
    ) -> Result<PriceRecommendation> {
        let result = self.search.optimize_price(product_id, request)?;
        let demand_interval = match self.demand_models.get_mut(product_id) {
            Some(model) => Some(model.demand_interval(INTERVAL_SAMPLES, 5.0, 95.0)?),
            None => None,
        };

        let sequence = self.decisions.len() as u64;
        self.decisions.push(PricingDecision {
            sequence,
            product_id: product_id.to_owned(),
            recommended_price: result.optimal_price,
            current_price: request.current_price,
            inventory_level: request.inventory_level,
        });
        trace_info!(
            product_id,
            sequence,
            recommended_price = result.optimal_price,
            "price recommendation logged"
        );

        Ok(PriceRecommendation {
            result,
            elasticity: self.search.elasticity(product_id),
            demand_interval,
        })
    }

    /// Records the given `(name, conversions, trials)` outcomes and compares
    /// all recorded variants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidObservation`] if any entry has more
    /// conversions than trials. Entries are checked before any is recorded,
    /// so a rejected call leaves the variant set unchanged.
    pub fn run_ab_test(&mut self, variants: &[(&str, u64, u64)]) -> Result<AbTestSummary> {
        if let Some(&(name, conversions, trials)) =
            variants.iter().find(|&&(_, conversions, trials)| conversions > trials)
        {
            return Err(Error::InvalidObservation {
                name: name.to_owned(),
                conversions,
                trials,
            });
        }
        for &(name, conversions, trials) in variants {
            self.ab_test.update_variant(name, conversions, trials)?;
        }
        let probabilities = self.ab_test.probability_best(AB_SAMPLES)?;
        let names: Vec<String> = self.ab_test.variants().keys().cloned().collect();
        let mut expected_loss = BTreeMap::new();
        for name in names {
            let loss = self.ab_test.expected_loss(&name, AB_SAMPLES)?;
            expected_loss.insert(name, loss);
        }
        Ok(AbTestSummary {
            probabilities,
            expected_loss,
            variants: self.ab_test.variants().clone(),
        })
    }

    /// Maximizes `objective` over `bounds` with a fresh [`GlobalOptimizer`].
    ///
    /// # Errors
    ///
    /// Propagates optimizer construction and update errors.
    pub fn run_global_optimization<F>(
        &self,
        bounds: Vec<(f64, f64)>,
        n_iterations: usize,
        objective: F,
    ) -> Result<OptimizationRun>
    where
        F: FnMut(&[f64]) -> f64,
    {
        let mut optimizer = match self.seed {
            Some(seed) => {
                GlobalOptimizer::with_seed(bounds, rng_util::derive_seed(seed, "global"))?
            }
            None => GlobalOptimizer::new(bounds)?,
        };
        let best = optimizer.optimize(n_iterations, objective)?;
        Ok(OptimizationRun {
            best,
            n_iterations: optimizer.observations().len(),
        })
    }

    /// Summarizes the engine's knowledge about `product_ids`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn report(&self, product_ids: &[&str]) -> PricingReport {
        let mut products = BTreeMap::new();
        let mut elasticities = Vec::new();
        for &id in product_ids {
            let elasticity = self
                .search
                .estimator()
                .record(id)
                .and_then(|r| r.elasticity);
            elasticities.extend(elasticity);
            products.insert(
                id.to_owned(),
                ProductReport {
                    demand_model: self.demand_models.get(id).map(DemandModel::posterior),
                    elasticity,
                },
            );
        }

        let avg_elasticity = if elasticities.is_empty() {
            0.0
        } else {
            elasticities.iter().sum::<f64>() / elasticities.len() as f64
        };
        PricingReport {
            products,
            summary: ReportSummary {
                total_products: product_ids.len(),
                avg_elasticity,
                decision_count: self.decisions.len(),
            },
        }
    }

    /// Logged recommendations, oldest first.
    #[must_use]
    pub fn decisions(&self) -> &[PricingDecision] {
        &self.decisions
    }

    /// Demand model of `product_id`, if trained.
    #[must_use]
    pub fn demand_model(&self, product_id: &str) -> Option<&DemandModel> {
        self.demand_models.get(product_id)
    }

    /// The underlying price search.
    #[must_use]
    pub fn price_search(&self) -> &PriceSearch {
        &self.search
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new()
    }
}
