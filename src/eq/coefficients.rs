use std::f64::consts::TAU;

/// Most second-order sections a cut cascade can hold (48 dB/oct).
pub const MAX_CUT_STAGES: usize = 4;

/// Biquad transfer function coefficients, normalised so that `a0 == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Coefficients {
    /// Pass-through section.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Normalise a raw `b0..b2 / a0..a2` set by `a0`.
    pub fn from_raw(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        let inv_a0 = 1.0 / a0;
        Self {
            b0: (b0 * inv_a0) as f32,
            b1: (b1 * inv_a0) as f32,
            b2: (b2 * inv_a0) as f32,
            a1: (a1 * inv_a0) as f32,
            a2: (a2 * inv_a0) as f32,
        }
    }

    /// Linear gain of this section at `frequency`, evaluated on the unit circle.
    pub fn magnitude_at(&self, frequency: f32, sample_rate: f32) -> f32 {
        let w = TAU * f64::from(frequency) / f64::from(sample_rate);
        let (s1, c1) = w.sin_cos();
        let (s2, c2) = (2.0 * w).sin_cos();

        let (b0, b1, b2) = (f64::from(self.b0), f64::from(self.b1), f64::from(self.b2));
        let (a1, a2) = (f64::from(self.a1), f64::from(self.a2));

        let num_re = b0 + b1 * c1 + b2 * c2;
        let num_im = -(b1 * s1 + b2 * s2);
        let den_re = 1.0 + a1 * c1 + a2 * c2;
        let den_im = -(a1 * s1 + a2 * s2);

        let num = num_re * num_re + num_im * num_im;
        let den = den_re * den_re + den_im * den_im;

        if den <= f64::EPSILON {
            return 0.0;
        }

        (num / den).sqrt() as f32
    }

    pub fn is_finite(&self) -> bool {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
            .iter()
            .all(|c| c.is_finite())
    }
}

/// Sections produced for one cut filter design.
///
/// Only the leading `len()` sections are meaningful; the remaining slots hold
/// [`Coefficients::IDENTITY`]. Fixed size so a design pass never allocates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutCoefficients {
    sections: [Coefficients; MAX_CUT_STAGES],
    len: usize,
}

impl Default for CutCoefficients {
    fn default() -> Self {
        Self {
            sections: [Coefficients::IDENTITY; MAX_CUT_STAGES],
            len: 0,
        }
    }
}

impl CutCoefficients {
    pub(crate) fn push(&mut self, section: Coefficients) {
        if self.len < MAX_CUT_STAGES {
            self.sections[self.len] = section;
            self.len += 1;
        }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<&Coefficients> {
        self.sections[..self.len].get(index)
    }

    pub fn as_slice(&self) -> &[Coefficients] {
        &self.sections[..self.len]
    }

    /// Combined gain of all designed sections.
    pub fn magnitude_at(&self, frequency: f32, sample_rate: f32) -> f32 {
        self.as_slice()
            .iter()
            .map(|c| c.magnitude_at(frequency, sample_rate))
            .product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_flat() {
        for f in [20.0, 440.0, 1000.0, 12_000.0, 23_000.0] {
            let m = Coefficients::IDENTITY.magnitude_at(f, 48_000.0);
            assert!((m - 1.0).abs() < 1e-6, "identity gain at {f} Hz was {m}");
        }
    }

    #[test]
    fn from_raw_normalises_by_a0() {
        let c = Coefficients::from_raw(2.0, 4.0, 6.0, 2.0, 1.0, 0.5);
        assert_eq!(c.b0, 1.0);
        assert_eq!(c.b1, 2.0);
        assert_eq!(c.b2, 3.0);
        assert_eq!(c.a1, 0.5);
        assert_eq!(c.a2, 0.25);
    }

    #[test]
    fn simple_averager_has_expected_response() {
        // y = 0.5 x[n] + 0.5 x[n-1]: unity at DC, null at Nyquist.
        let c = Coefficients {
            b0: 0.5,
            b1: 0.5,
            ..Coefficients::IDENTITY
        };
        assert!((c.magnitude_at(0.0, 48_000.0) - 1.0).abs() < 1e-6);
        assert!(c.magnitude_at(24_000.0, 48_000.0) < 1e-6);
    }

    #[test]
    fn cut_coefficients_cap_at_four_sections() {
        let mut cut = CutCoefficients::default();
        assert!(cut.is_empty());
        for _ in 0..6 {
            cut.push(Coefficients::IDENTITY);
        }
        assert_eq!(cut.len(), MAX_CUT_STAGES);
        assert!(cut.get(4).is_none());
    }
}
