use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kolosal_impute::imputation::{Imputer, InitialStrategy, MICEImputer, MiceConfig, SimpleImputer};
use ndarray::Array2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_missing_data(n_rows: usize, n_features: usize) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    // Low-rank signal plus noise, a fifth of the cells missing
    let a = Array2::from_shape_fn((n_rows, 3), |_| rng.gen::<f64>());
    let b = Array2::from_shape_fn((3, n_features), |_| rng.gen::<f64>());
    a.dot(&b).mapv(|v| {
        if rng.gen::<f64>() < 0.2 {
            f64::NAN
        } else {
            v + rng.gen::<f64>() * 0.01
        }
    })
}

fn bench_mice_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("mice_fit");
    group.sample_size(10); // Fewer samples for full imputation runs

    for n_rows in [100, 500, 1000].iter() {
        let x = create_missing_data(*n_rows, 10);

        group.bench_with_input(BenchmarkId::new("fit_transform", n_rows), &x, |b, x| {
            b.iter(|| {
                let config = MiceConfig::new()
                    .with_n_burn_in(5)
                    .with_n_imputations(5)
                    .with_random_state(0);
                let mut imputer = MICEImputer::with_config(config);
                imputer.fit_transform(black_box(x)).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_nearest_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("mice_nearest_features");
    group.sample_size(10);

    let x = create_missing_data(300, 30);
    for cap in [5, 15, 29].iter() {
        group.bench_with_input(BenchmarkId::new("cap", cap), &x, |b, x| {
            b.iter(|| {
                let config = MiceConfig::new()
                    .with_n_burn_in(2)
                    .with_n_imputations(3)
                    .with_n_nearest_features(*cap)
                    .with_random_state(0);
                let mut imputer = MICEImputer::with_config(config);
                imputer.fit_transform(black_box(x)).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("mice_transform");

    // Fit once, replay on fresh data
    let train = create_missing_data(1000, 10);
    let config = MiceConfig::new()
        .with_n_burn_in(5)
        .with_n_imputations(5)
        .with_random_state(0);
    let mut imputer = MICEImputer::with_config(config);
    imputer.fit(&train).unwrap();

    for n_rows in [100, 1000].iter() {
        let x = create_missing_data(*n_rows, 10);
        group.bench_with_input(BenchmarkId::new("replay", n_rows), &x, |b, x| {
            b.iter(|| imputer.transform(black_box(x)).unwrap())
        });
    }

    group.finish();
}

fn bench_initial_imputer(c: &mut Criterion) {
    let mut group = c.benchmark_group("initial_imputer");
    let x = create_missing_data(10000, 20);

    for strategy in [
        InitialStrategy::Mean,
        InitialStrategy::Median,
        InitialStrategy::MostFrequent,
    ] {
        group.bench_with_input(BenchmarkId::new("fit_transform", strategy), &x, |b, x| {
            b.iter(|| {
                let mut imputer = SimpleImputer::new(strategy);
                imputer.fit_transform(black_box(x)).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_mice_fit,
    bench_nearest_features,
    bench_transform,
    bench_initial_imputer
);
criterion_main!(benches);
