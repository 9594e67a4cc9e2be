use crate::eq::coefficients::{CutCoefficients, MAX_CUT_STAGES};
use crate::eq::stages::Stage;
use crate::eq::stages::filter::FilterStage;

/// Fixed bank of four biquads realising a 12/24/36/48 dB/oct cut.
///
/// Stages `0..active` run in series, the rest are bypassed. Bypassed slots
/// keep whatever coefficients they last had; they are not cleared.
#[derive(Debug, Clone)]
pub struct CutCascade {
    stages: [FilterStage; MAX_CUT_STAGES],
    active: usize,
}

impl Default for CutCascade {
    fn default() -> Self {
        Self::new()
    }
}

impl CutCascade {
    pub fn new() -> Self {
        Self {
            stages: std::array::from_fn(|_| {
                let mut stage = FilterStage::default();
                stage.set_bypassed(true);
                stage
            }),
            active: 0,
        }
    }

    /// Bypass every stage, then install and enable the leading `stages`
    /// sections of `coefficients`.
    pub fn set_order(&mut self, stages: usize, coefficients: &CutCoefficients) {
        for stage in &mut self.stages {
            stage.set_bypassed(true);
        }

        let count = stages.min(coefficients.len()).min(MAX_CUT_STAGES);
        for (stage, section) in self
            .stages
            .iter_mut()
            .zip(coefficients.as_slice())
            .take(count)
        {
            stage.replace_coefficients(*section);
            stage.set_bypassed(false);
        }
        self.active = count;
    }

    pub const fn active_stages(&self) -> usize {
        self.active
    }

    pub fn stage(&self, index: usize) -> Option<&FilterStage> {
        self.stages.get(index)
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }
}

impl Stage for CutCascade {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mut signal = input;
        for stage in &mut self.stages {
            signal = stage.process(signal);
        }
        signal
    }

    fn process_block(&mut self, input: &mut [f32]) {
        for stage in self.stages.iter_mut().filter(|s| !s.is_bypassed()) {
            stage.process_block(input);
        }
    }

    fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    fn magnitude_at(&self, frequency: f32, sample_rate: f32) -> f32 {
        self.stages
            .iter()
            .filter(|s| !s.is_bypassed())
            .map(|s| s.magnitude_at(frequency, sample_rate))
            .product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eq::design::design_low_cut;
    use crate::eq::parameters::Slope;

    const SR: f32 = 48_000.0;

    #[test]
    fn new_cascade_is_transparent() {
        let mut cascade = CutCascade::new();
        assert_eq!(cascade.active_stages(), 0);
        assert_eq!(cascade.process(0.42), 0.42);
        assert_eq!(cascade.magnitude_at(50.0, SR), 1.0);
    }

    #[test]
    fn active_stage_count_follows_slope() {
        let mut cascade = CutCascade::new();
        for slope in Slope::ALL {
            let cut = design_low_cut(100.0, SR, slope.order());
            cascade.set_order(slope.stages(), &cut);

            assert_eq!(cascade.active_stages(), slope.stages());
            let enabled = cascade.stages().iter().filter(|s| !s.is_bypassed()).count();
            assert_eq!(enabled, slope.order() / 2);

            // Enabled stages are contiguous from index 0.
            for (i, stage) in cascade.stages().iter().enumerate() {
                assert_eq!(stage.is_bypassed(), i >= slope.stages());
            }
        }
    }

    #[test]
    fn dropping_slope_leaves_extra_slots_untouched() {
        let mut cascade = CutCascade::new();
        let steep = design_low_cut(100.0, SR, 8);
        cascade.set_order(4, &steep);

        let gentle = design_low_cut(300.0, SR, 2);
        cascade.set_order(1, &gentle);

        assert_eq!(cascade.stage(0).map(FilterStage::coefficients), gentle.get(0));
        assert_eq!(cascade.stage(3).map(FilterStage::coefficients), steep.get(3));
        assert!(cascade.stage(3).is_some_and(FilterStage::is_bypassed));
    }

    #[test]
    fn magnitude_is_product_of_enabled_stages() {
        let mut cascade = CutCascade::new();
        let cut = design_low_cut(1000.0, SR, 6);
        cascade.set_order(3, &cut);

        for f in [100.0, 700.0, 1000.0, 5000.0] {
            let expected = cut.magnitude_at(f, SR);
            let got = cascade.magnitude_at(f, SR);
            assert!((expected - got).abs() < 1e-6);
        }
    }

    #[test]
    fn sample_and_block_paths_agree() {
        let cut = design_low_cut(250.0, SR, 4);
        let mut a = CutCascade::new();
        let mut b = CutCascade::new();
        a.set_order(2, &cut);
        b.set_order(2, &cut);

        let mut block: Vec<f32> = (0..256).map(|i| (i as f32 * 0.05).sin()).collect();
        let expected: Vec<f32> = block.iter().map(|&x| a.process(x)).collect();
        b.process_block(&mut block);

        for (x, y) in expected.iter().zip(&block) {
            assert!((x - y).abs() < 1e-6);
        }
    }
}
