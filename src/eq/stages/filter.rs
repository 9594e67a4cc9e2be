use crate::eq::coefficients::Coefficients;
use crate::eq::stages::Stage;
use crate::eq::stages::common::zap_denormal;

/// Single biquad section in transposed direct form II.
///
/// The stage owns its coefficient set by value. Replacing it is a plain
/// overwrite done by whoever holds `&mut self`, so the audio path can never
/// observe a half-written set.
#[derive(Debug, Clone)]
pub struct FilterStage {
    coefficients: Coefficients,
    s1: f32,
    s2: f32,
    bypassed: bool,
}

impl Default for FilterStage {
    fn default() -> Self {
        Self::new(Coefficients::IDENTITY)
    }
}

impl FilterStage {
    pub const fn new(coefficients: Coefficients) -> Self {
        Self {
            coefficients,
            s1: 0.0,
            s2: 0.0,
            bypassed: false,
        }
    }

    /// Swap in a new coefficient set. Delay registers are kept so the
    /// running signal carries over without a reset click.
    #[inline]
    pub const fn replace_coefficients(&mut self, coefficients: Coefficients) {
        self.coefficients = coefficients;
    }

    pub const fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    pub const fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub const fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    pub const fn state(&self) -> (f32, f32) {
        (self.s1, self.s2)
    }
}

impl Stage for FilterStage {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        if self.bypassed {
            return input;
        }

        let c = &self.coefficients;
        let output = c.b0.mul_add(input, self.s1);
        self.s1 = zap_denormal(c.b1.mul_add(input, -c.a1 * output) + self.s2);
        self.s2 = zap_denormal(c.b2.mul_add(input, -c.a2 * output));
        output
    }

    fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }

    fn magnitude_at(&self, frequency: f32, sample_rate: f32) -> f32 {
        if self.bypassed {
            1.0
        } else {
            self.coefficients.magnitude_at(frequency, sample_rate)
        }
    }
}
