use assert_no_alloc::{AllocDisabler, assert_no_alloc};
use rusteq::audio::{ChainController, RecomputePolicy};
use rusteq::eq::{ChainParameters, ParameterId, Slope};
use std::sync::Arc;

#[global_allocator]
static ALLOCATOR: AllocDisabler = AllocDisabler;

const SAMPLE_RATE: f32 = 48_000.0;
const BUFFER_SIZE: usize = 128;

fn run_blocks(policy: RecomputePolicy) {
    let params = Arc::new(ChainParameters::new());
    let (mut controller, handle) = ChainController::new(Arc::clone(&params), policy);
    controller.prepare(SAMPLE_RATE, BUFFER_SIZE);

    let mut left = vec![0.25f32; BUFFER_SIZE];
    let mut right = vec![-0.25f32; BUFFER_SIZE];
    let mut extra = vec![0.5f32; BUFFER_SIZE];

    for block in 0..64 {
        params.set(ParameterId::PeakGain, (block % 10) as f32);
        params.set_slope(ParameterId::HighCutSlope, Slope::ALL[block % 4]);

        assert_no_alloc(|| {
            controller.process_block(&mut left, &mut right);
            controller.process_mono(&mut left);
            let mut channels: [&mut [f32]; 3] = [&mut left, &mut right, &mut extra];
            controller.process_channels(&mut channels);
            controller.set_peak_bypassed(block % 2 == 0);
        });
    }

    handle.refresh();
    assert!(left.iter().all(|x| x.is_finite()));
}

#[test]
fn every_block_recompute_does_not_allocate() {
    run_blocks(RecomputePolicy::EveryBlock);
}

#[test]
fn on_change_recompute_does_not_allocate() {
    run_blocks(RecomputePolicy::OnChange);
}
