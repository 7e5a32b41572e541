use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pricer::{DemandModel, GlobalOptimizer, PriceRequest, PriceSearch};

const PURCHASE_HISTORY: [u64; 10] = [12, 15, 18, 14, 16, 13, 17, 15, 14, 16];

fn trained_search() -> PriceSearch {
    let prices: Vec<f64> = (0..11).map(|i| 20.0 + 2.0 * f64::from(i)).collect();
    let quantities: Vec<f64> = prices.iter().map(|p| 2000.0 - 30.0 * p).collect();
    let mut search = PriceSearch::new();
    search
        .train_elasticity("PROD001", &prices, &quantities)
        .unwrap();
    search
}

fn bench_price_search(c: &mut Criterion) {
    let search = trained_search();
    let request = PriceRequest::new(35.0, 20.0)
        .competitor_prices([33.0, 37.0, 36.5])
        .inventory(450, 400);
    c.bench_function("optimize_price", |b| {
        b.iter(|| search.optimize_price("PROD001", &request).unwrap());
    });
}

fn bench_demand_fit(c: &mut Criterion) {
    c.bench_function("demand_fit_1000", |b| {
        b.iter(|| {
            let mut model = DemandModel::with_seed(42);
            model.fit(&PURCHASE_HISTORY, 1000).unwrap()
        });
    });
}

fn bench_global_optimizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("global_optimizer");
    group.sample_size(10);

    for dims in [1, 5, 20] {
        let bounds = vec![(-5.0, 5.0); dims];
        group.bench_with_input(BenchmarkId::new("dims", dims), &bounds, |b, bounds| {
            b.iter(|| {
                let mut opt = GlobalOptimizer::with_seed(bounds.clone(), 42).unwrap();
                opt.optimize(50, |x| -x.iter().map(|v| v * v).sum::<f64>())
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_price_search,
    bench_demand_fit,
    bench_global_optimizer
);
criterion_main!(benches);
