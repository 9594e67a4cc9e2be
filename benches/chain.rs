use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rusteq::audio::{ChainController, RecomputePolicy};
use rusteq::eq::stages::Stage;
use rusteq::eq::{ChainCoefficients, ChainParameters, ChannelChain, ParameterId, Slope};
use std::hint::black_box;
use std::sync::Arc;

const SAMPLE_RATE: f32 = 48000.0;
const BUFFER_SIZE: usize = 128;

fn parameters(slope: Slope) -> Arc<ChainParameters> {
    let params = Arc::new(ChainParameters::new());
    params.set(ParameterId::LowCutFreq, 80.0);
    params.set(ParameterId::HighCutFreq, 12_000.0);
    params.set(ParameterId::PeakFreq, 1_500.0);
    params.set(ParameterId::PeakGain, 4.5);
    params.set_slope(ParameterId::LowCutSlope, slope);
    params.set_slope(ParameterId::HighCutSlope, slope);
    params
}

fn bench_sample_vs_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sample vs Block Processing");

    for slope in Slope::ALL {
        let coefficients = ChainCoefficients::design(&parameters(slope).snapshot(), SAMPLE_RATE);

        group.bench_with_input(
            BenchmarkId::new("sample-by-sample", slope.db_per_octave()),
            &coefficients,
            |b, coefficients| {
                let mut chain = ChannelChain::new();
                chain.install(coefficients);
                let input: Vec<f32> = vec![0.5f32; BUFFER_SIZE];

                b.iter(|| {
                    for &sample in &input {
                        black_box(chain.process(black_box(sample)));
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("block", slope.db_per_octave()),
            &coefficients,
            |b, coefficients| {
                let mut chain = ChannelChain::new();
                chain.install(coefficients);
                let mut buffer: Vec<f32> = vec![0.5f32; BUFFER_SIZE];

                b.iter(|| {
                    chain.process_block(black_box(&mut buffer));
                    black_box(&buffer);
                });
            },
        );
    }

    group.finish();
}

fn bench_controller_policies(c: &mut Criterion) {
    let mut group = c.benchmark_group("Controller Recompute Policy");

    for policy in [RecomputePolicy::EveryBlock, RecomputePolicy::OnChange] {
        group.bench_with_input(
            BenchmarkId::new("stereo block", format!("{policy:?}")),
            &policy,
            |b, &policy| {
                let (mut controller, _handle) = ChainController::new(parameters(Slope::Db48), policy);
                controller.prepare(SAMPLE_RATE, BUFFER_SIZE);
                let mut left = vec![0.5f32; BUFFER_SIZE];
                let mut right = vec![0.5f32; BUFFER_SIZE];

                b.iter(|| {
                    controller.process_block(black_box(&mut left), black_box(&mut right));
                    black_box((&left, &right));
                });
            },
        );
    }

    group.finish();
}

fn bench_design(c: &mut Criterion) {
    let snapshot = parameters(Slope::Db48).snapshot();
    c.bench_function("design full chain", |b| {
        b.iter(|| black_box(ChainCoefficients::design(black_box(&snapshot), SAMPLE_RATE)));
    });
}

criterion_group!(
    benches,
    bench_sample_vs_block,
    bench_controller_policies,
    bench_design
);
criterion_main!(benches);
