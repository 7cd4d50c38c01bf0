use anchored_profile::accumulator::HistoricalRecord;
use anchored_profile::anchor::AnchorMode;
use anchored_profile::history::HistoryStore;
use anchored_profile::market_data::Bar;
use anchored_profile::pipeline::{ProfileEngine, ProfilerConfig};
use anchored_profile::volume_profile::{AllocationModel, BucketedProfile, PeakRange, ProfileSummary, SplitModel};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn wave_bars(count: u64) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let price = 100.0 + 10.0 * (i as f64 * 0.157).sin() + 5.0 * (i as f64 / 80.0).sin();
            Bar::new(i as i64 * 60_000, price - 0.25, price + 1.0, price - 1.0, price + 0.5, 100.0)
        })
        .collect()
}

fn bench_engine(c: &mut Criterion) {
    let bars = wave_bars(10_000);
    let mut group = c.benchmark_group("engine_evaluate");
    group.throughput(Throughput::Elements(bars.len() as u64));

    for (name, allocation, split, mode) in [
        ("classic_structure", AllocationModel::Classic, SplitModel::Classic, AnchorMode::Structure),
        ("pdf_dynamic_swing", AllocationModel::Pdf, SplitModel::Dynamic, AnchorMode::Swing),
    ] {
        let config = ProfilerConfig {
            allocation_model: allocation,
            split_model: split,
            anchor_mode: mode,
            ..ProfilerConfig::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(name), &config, |b, config| {
            b.iter(|| {
                let Ok(mut engine) = ProfileEngine::new(config.clone()) else {
                    return;
                };
                for bar in &bars {
                    black_box(engine.evaluate(bar));
                }
            })
        });
    }
    group.finish();
}

fn bench_value_area(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_area");
    for buckets in [24usize, 96, 384] {
        let volumes: Vec<f64> = (0..buckets).map(|i| ((i * 7919) % 1000) as f64).collect();
        let profile = BucketedProfile::from_bucket_volumes(100.0, 200.0, &volumes);
        group.bench_with_input(BenchmarkId::from_parameter(buckets), &profile, |b, profile| {
            b.iter(|| black_box(profile.get_value_area(black_box(0.70))))
        });
    }
    group.finish();
}

fn bench_history_eviction(c: &mut Criterion) {
    let record = HistoricalRecord {
        start_bar: 0,
        end_bar: 99,
        peaks: vec![PeakRange { low: 1.0, high: 2.0 }; 4],
        summary: ProfileSummary::default(),
    };
    c.bench_function("history_append_evict", |b| {
        b.iter(|| {
            let mut store = HistoryStore::new(50);
            for _ in 0..500 {
                store.append(record.clone());
                store.evict_if_over_capacity();
            }
            black_box(store.len())
        })
    });
}

criterion_group!(benches, bench_engine, bench_value_area, bench_history_eviction);
criterion_main!(benches);
