#[path = "../tests/fixtures/mod.rs"]
mod fixtures;

use crate::fixtures::{load_reference_bars, load_reference_series};

use bist_ta::{
    Atr, AtrConfig, Bb, BbConfig, Ema, EmaConfig, Engine, EngineConfig, IndicatorConfig,
    IndicatorConfigBuilder, Macd, MacdConfig, Rsi, RsiConfig, Sma, SmaConfig, Smoothing, engine,
};
use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use std::{hint::black_box, num::NonZero, time::Duration};

fn nz(n: usize) -> NonZero<usize> {
    NonZero::new(n).expect("non zero value")
}

fn stream_benchmarks(c: &mut Criterion) {
    let bars = load_reference_bars();
    let mut group = c.benchmark_group("stream");
    group.throughput(Throughput::Elements(bars.len() as u64));
    group.warm_up_time(Duration::from_secs(3));
    group.measurement_time(Duration::from_secs(5));

    macro_rules! stream_bench {
        ($name:expr, $ind_type:ty, $config:expr) => {
            group.bench_function($name, |b| {
                b.iter_batched(
                    || <$ind_type>::new($config),
                    |mut ind| {
                        for bar in &bars {
                            black_box(ind.compute(bar));
                        }
                    },
                    BatchSize::SmallInput,
                );
            });
        };
    }

    stream_bench!("sma20", Sma, SmaConfig::close(nz(20)));
    stream_bench!("sma50", Sma, SmaConfig::close(nz(50)));
    stream_bench!("ema20", Ema, EmaConfig::close(nz(20)));
    stream_bench!("rsi14", Rsi, RsiConfig::default_14());
    stream_bench!(
        "rsi14_wilder",
        Rsi,
        RsiConfig::builder()
            .length(nz(14))
            .smoothing(Smoothing::Wilder)
            .build()
    );
    stream_bench!("macd", Macd, MacdConfig::default_12_26_9());
    stream_bench!("bb20", Bb, BbConfig::default_20());
    stream_bench!("atr14", Atr, AtrConfig::default_14());

    group.finish();
}

fn batch_benchmarks(c: &mut Criterion) {
    let series = load_reference_series();
    let mut group = c.benchmark_group("batch");
    group.throughput(Throughput::Elements(series.len() as u64));
    group.warm_up_time(Duration::from_secs(3));
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("sma20", |b| {
        b.iter(|| black_box(engine::sma(&series, SmaConfig::close(nz(20)))));
    });
    group.bench_function("bollinger20", |b| {
        b.iter(|| black_box(engine::bollinger(&series, BbConfig::default_20())));
    });
    group.bench_function("monthly_change", |b| {
        b.iter(|| black_box(engine::monthly_percent_change(&series)));
    });

    let report_engine = Engine::new(&EngineConfig::default()).expect("default config is valid");
    group.bench_function("report", |b| {
        b.iter(|| black_box(report_engine.compute(&series)));
    });

    group.finish();
}

criterion_group!(benches, stream_benchmarks, batch_benchmarks);
criterion_main!(benches);
