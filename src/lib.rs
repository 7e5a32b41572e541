#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Decision support for dynamic pricing: estimate demand uncertainty, fit
//! price elasticity from historical observations, search for the
//! revenue-maximizing price under cost, competitor and inventory
//! constraints, and run a generic sequential black-box optimizer.
//!
//! # Getting Started
//!
//! ```
//! use pricer::prelude::*;
//!
//! let prices = [20.0, 24.0, 28.0, 32.0, 36.0, 40.0];
//! let quantities: Vec<f64> = prices.iter().map(|p: &f64| 4.0e5 / (p * p)).collect();
//!
//! let mut search = PriceSearch::new();
//! search.train_elasticity("sku-1", &prices, &quantities).unwrap();
//!
//! let request = PriceRequest::new(35.0, 20.0)
//!     .competitor_prices([33.0, 37.0, 36.5])
//!     .inventory(450, 400);
//! let result = search.optimize_price("sku-1", &request).unwrap();
//! println!("charge {:.2} for a {:.1}% lift", result.optimal_price, result.revenue_lift_percent);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`DemandModel`] | Gamma-Poisson model of purchase counts; predictive demand draws. |
//! | [`ElasticityEstimator`] | Per-product log-log elasticity and constant-elasticity demand curve. |
//! | [`PriceSearch`] | Derives a price interval and maximizes revenue on it with [`golden`] search. |
//! | [`GlobalOptimizer`] | Ask/tell maximizer with a kernel surrogate and Expected Improvement. |
//! | [`AbTest`] | Beta-Bernoulli comparison of price variants. |
//! | [`PricingEngine`] | Facade tying the above together with a decision log and reports. |
//!
//! Every random component owns its generator and can be seeded, so runs are
//! reproducible.
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on public records | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) when models are trained and prices are chosen | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

mod demand;
mod elasticity;
mod engine;
mod error;
mod global;
pub mod golden;
mod pricing;
mod rng_util;

pub use ab_test::{AbTest, VariantPosterior};
pub use demand::{DemandModel, DemandModelBuilder, GammaPosterior};
pub use elasticity::{ElasticityEstimator, ElasticityRecord};
pub use engine::{
    AbTestSummary, OptimizationRun, PriceRecommendation, PricingDecision, PricingEngine,
    PricingReport, ProductReport, ReportSummary,
};
pub use error::{Error, Result};
pub use global::{BestPoint, GlobalOptimizer, GlobalOptimizerBuilder, SamplePoint};
pub use pricing::{OptimizationResult, PriceBounds, PriceRequest, PriceSearch, PricingConfig};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use pricer::prelude::*;
/// ```
pub mod prelude {
    pub use crate::ab_test::AbTest;
    pub use crate::demand::{DemandModel, GammaPosterior};
    pub use crate::elasticity::ElasticityEstimator;
    pub use crate::engine::{PriceRecommendation, PricingEngine};
    pub use crate::error::{Error, Result};
    pub use crate::global::{BestPoint, GlobalOptimizer};
    pub use crate::pricing::{OptimizationResult, PriceRequest, PriceSearch, PricingConfig};
}
