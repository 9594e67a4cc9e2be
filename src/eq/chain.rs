use crate::eq::coefficients::{Coefficients, CutCoefficients};
use crate::eq::design::{design_high_cut, design_low_cut, design_peak};
use crate::eq::parameters::{ParameterSnapshot, Slope};
use crate::eq::stages::Stage;
use crate::eq::stages::cascade::CutCascade;
use crate::eq::stages::filter::FilterStage;

/// Output of one design pass: everything a channel chain needs to install.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChainCoefficients {
    pub low_cut: CutCoefficients,
    pub low_cut_slope: Slope,
    pub peak: Coefficients,
    pub high_cut: CutCoefficients,
    pub high_cut_slope: Slope,
}

impl ChainCoefficients {
    /// Design all three filters for `snapshot`. The cut filters are always
    /// designed at the full order of their slope.
    pub fn design(snapshot: &ParameterSnapshot, sample_rate: f32) -> Self {
        Self {
            low_cut: design_low_cut(
                snapshot.low_cut_freq,
                sample_rate,
                snapshot.low_cut_slope.order(),
            ),
            low_cut_slope: snapshot.low_cut_slope,
            peak: design_peak(
                snapshot.peak_freq,
                snapshot.peak_quality,
                snapshot.peak_gain_db,
                sample_rate,
            ),
            high_cut: design_high_cut(
                snapshot.high_cut_freq,
                sample_rate,
                snapshot.high_cut_slope.order(),
            ),
            high_cut_slope: snapshot.high_cut_slope,
        }
    }

    /// Combined gain of the designed chain, ignoring any bypass state.
    pub fn magnitude_at(&self, frequency: f32, sample_rate: f32) -> f32 {
        self.low_cut.magnitude_at(frequency, sample_rate)
            * self.peak.magnitude_at(frequency, sample_rate)
            * self.high_cut.magnitude_at(frequency, sample_rate)
    }
}

// ChannelChain is the per-channel signal path: low cut -> peak -> high cut.
#[derive(Debug, Clone, Default)]
pub struct ChannelChain {
    low_cut: CutCascade,
    peak: FilterStage,
    high_cut: CutCascade,
}

impl ChannelChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, coefficients: &ChainCoefficients) {
        self.low_cut
            .set_order(coefficients.low_cut_slope.stages(), &coefficients.low_cut);
        self.peak.replace_coefficients(coefficients.peak);
        self.high_cut
            .set_order(coefficients.high_cut_slope.stages(), &coefficients.high_cut);
    }

    pub const fn set_peak_bypassed(&mut self, bypassed: bool) {
        self.peak.set_bypassed(bypassed);
    }

    pub const fn low_cut(&self) -> &CutCascade {
        &self.low_cut
    }

    pub const fn peak(&self) -> &FilterStage {
        &self.peak
    }

    pub const fn high_cut(&self) -> &CutCascade {
        &self.high_cut
    }
}

impl Stage for ChannelChain {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let signal = self.low_cut.process(input);
        let signal = self.peak.process(signal);
        self.high_cut.process(signal)
    }

    // Stage-major order; equivalent to per-sample order for these linear stages.
    fn process_block(&mut self, input: &mut [f32]) {
        self.low_cut.process_block(input);
        self.peak.process_block(input);
        self.high_cut.process_block(input);
    }

    fn reset(&mut self) {
        self.low_cut.reset();
        self.peak.reset();
        self.high_cut.reset();
    }

    fn magnitude_at(&self, frequency: f32, sample_rate: f32) -> f32 {
        self.low_cut.magnitude_at(frequency, sample_rate)
            * self.peak.magnitude_at(frequency, sample_rate)
            * self.high_cut.magnitude_at(frequency, sample_rate)
    }
}
