use pricer::{ElasticityEstimator, Error, PriceRequest, PriceSearch, PricingConfig};

/// Prices 20, 22, ..., 40.
fn price_grid() -> Vec<f64> {
    (0..11).map(|i| 20.0 + 2.0 * f64::from(i)).collect()
}

fn linear_demand(prices: &[f64], seed: u64) -> Vec<f64> {
    let mut rng = fastrand::Rng::with_seed(seed);
    prices
        .iter()
        .map(|p| 2000.0 - 30.0 * p + (rng.f64() * 100.0 - 50.0))
        .collect()
}

#[test]
fn test_linear_demand_elasticity_without_noise() {
    let prices = price_grid();
    let quantities: Vec<f64> = prices.iter().map(|p| 2000.0 - 30.0 * p).collect();
    let mut estimator = ElasticityEstimator::new();
    let e = estimator
        .calculate_elasticity(&prices, &quantities, "PROD001")
        .unwrap();
    assert!((e + 0.797_101_184_616_772).abs() < 1e-9, "elasticity {e}");
    assert!((estimator.record("PROD001").unwrap().base_demand - 1100.0).abs() < 1e-9);
}

#[test]
fn test_linear_demand_elasticity_with_bounded_noise() {
    let prices = price_grid();
    for seed in 0..20 {
        let quantities = linear_demand(&prices, seed);
        let mut estimator = ElasticityEstimator::new();
        let e = estimator
            .calculate_elasticity(&prices, &quantities, "PROD001")
            .unwrap();
        assert!((e + 0.797).abs() < 0.2, "seed {seed}: elasticity {e}");
    }
}

#[test]
fn test_power_law_recovery_with_optimum() {
    let prices = price_grid();
    let quantities: Vec<f64> = prices.iter().map(|p| 5.0e4 / p.powf(3.0)).collect();
    let mut search = PriceSearch::new();
    let e = search.train_elasticity("sku", &prices, &quantities).unwrap();
    assert!((e + 3.0).abs() < 1e-6);

    // Revenue (p - c) p^-3 peaks at p = 1.5 c.
    let request = PriceRequest::new(30.0, 20.0);
    let bounds = search.price_bounds(&request).unwrap();
    let result = search.optimize_price("sku", &request).unwrap();
    assert!(bounds.contains(result.optimal_price));
    assert!((result.optimal_price - 30.0).abs() < 1e-3);
    assert!(result.revenue_lift_percent.abs() < 1e-6);
}

#[test]
fn test_reference_scenario() {
    let prices = price_grid();
    let quantities = linear_demand(&prices, 7);
    let mut search = PriceSearch::new();
    search.train_elasticity("PROD001", &prices, &quantities).unwrap();

    let request = PriceRequest::new(35.0, 20.0)
        .competitor_prices([33.0, 37.0, 36.5])
        .inventory(450, 400);
    let bounds = search.price_bounds(&request).unwrap();
    assert!((bounds.lower - 31.35).abs() < 1e-9);
    assert!((bounds.upper - 38.85).abs() < 1e-9);

    let result = search.optimize_price("PROD001", &request).unwrap();
    // Inelastic demand: revenue grows with price up to the ceiling.
    assert!(result.optimal_price > bounds.lower && result.optimal_price < bounds.upper);
    assert!(bounds.upper - result.optimal_price < 1e-4);
    assert!(result.expected_demand > 0.0);
    assert!(result.revenue_lift_percent > 0.0);
}

#[test]
fn test_scarcity_raises_the_band() {
    let prices = price_grid();
    let quantities: Vec<f64> = prices.iter().map(|p| 1.0e5 / (p * p)).collect();
    let mut search = PriceSearch::new();
    search.train_elasticity("sku", &prices, &quantities).unwrap();

    let balanced = PriceRequest::new(35.0, 20.0).competitor_prices([30.0, 34.0]);
    let scarce = balanced.clone().inventory(10, 400);
    let surplus = balanced.clone().inventory(1000, 400);

    let b = search.price_bounds(&balanced).unwrap();
    let s = search.price_bounds(&scarce).unwrap();
    let p = search.price_bounds(&surplus).unwrap();
    assert!(s.lower > b.lower && s.upper > b.upper);
    assert!(p.lower < b.lower && p.upper < b.upper);
}

#[test]
fn test_degenerate_interval_is_reported() {
    let prices = price_grid();
    let quantities: Vec<f64> = prices.iter().map(|p| 1.0e5 / (p * p)).collect();
    let mut search = PriceSearch::new();
    search.train_elasticity("sku", &prices, &quantities).unwrap();

    // Competitors far below cost: the cost floor exceeds the competitor ceiling.
    let request = PriceRequest::new(35.0, 30.0).competitor_prices([10.0, 12.0]);
    assert!(matches!(
        search.optimize_price("sku", &request),
        Err(Error::InvalidPriceInterval { .. })
    ));
}

#[test]
fn test_zero_baseline_revenue() {
    let mut search = PriceSearch::new();
    search.estimator_mut().record_base_demand("flat", 0.0).unwrap();
    assert!(matches!(
        search.optimize_price("flat", &PriceRequest::new(35.0, 20.0)),
        Err(Error::ZeroBaselineRevenue)
    ));

    // Cost equal to the current price also leaves no margin to compare against.
    search.estimator_mut().record_base_demand("flat", 50.0).unwrap();
    assert!(matches!(
        search.optimize_price("flat", &PriceRequest::new(20.0, 20.0)),
        Err(Error::ZeroBaselineRevenue)
    ));
}

#[test]
fn test_baseline_only_product_maximizes_margin() {
    let mut search = PriceSearch::new();
    search.estimator_mut().record_base_demand("flat", 50.0).unwrap();
    let request = PriceRequest::new(35.0, 20.0);
    let bounds = search.price_bounds(&request).unwrap();
    let result = search.optimize_price("flat", &request).unwrap();
    assert!(bounds.upper - result.optimal_price < 1e-4);
    assert_eq!(result.expected_demand, 50.0);
}

#[test]
fn test_custom_tolerance() {
    let prices = price_grid();
    let quantities: Vec<f64> = prices.iter().map(|p| 1.0e5 / (p * p)).collect();
    let mut search =
        PriceSearch::with_config(PricingConfig::default().tolerance(1e-9)).unwrap();
    search.train_elasticity("sku", &prices, &quantities).unwrap();
    let result = search
        .optimize_price("sku", &PriceRequest::new(35.0, 20.0))
        .unwrap();
    assert!((result.optimal_price - 40.0).abs() < 1e-4);
}

#[test]
fn test_search_terminates_for_large_prices() {
    let prices: Vec<f64> = (0..7).map(|i| 0.9e12 + 0.05e12 * f64::from(i)).collect();
    let quantities: Vec<f64> = prices.iter().map(|p| 1.0e30 / (p * p)).collect();
    let mut search = PriceSearch::new();
    search.train_elasticity("big", &prices, &quantities).unwrap();

    let request = PriceRequest::new(1.0e12, 1.0e11);
    let bounds = search.price_bounds(&request).unwrap();
    let result = search.optimize_price("big", &request).unwrap();
    assert!(bounds.contains(result.optimal_price));
    assert!((result.optimal_price - bounds.lower) / bounds.lower < 1e-6);
}
