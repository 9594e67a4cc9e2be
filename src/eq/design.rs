//! Coefficient design for the three filter families of the equaliser.
//!
//! All designs use the bilinear transform of the usual analog prototypes
//! (RBJ cookbook peaking EQ, Butterworth high/low pass). Maths is done in
//! `f64` and rounded to `f32` once per coefficient.
//!
//! Reference: <https://www.w3.org/TR/audio-eq-cookbook/>

use std::f64::consts::{PI, TAU};

use crate::eq::coefficients::{Coefficients, CutCoefficients, MAX_CUT_STAGES};
use crate::eq::stages::common::db_to_lin;

/// Lowest frequency any design will accept.
pub const MIN_DESIGN_FREQ_HZ: f32 = 1.0;
/// Designs are clamped to this fraction of Nyquist.
pub const NYQUIST_GUARD: f32 = 0.999;
const MIN_Q: f64 = 1.0e-3;

/// Keep `freq` strictly inside `(0, nyquist)`.
#[inline]
pub fn clamp_frequency(freq: f32, sample_rate: f32) -> f32 {
    let upper = (sample_rate * 0.5 * NYQUIST_GUARD).max(MIN_DESIGN_FREQ_HZ);
    if freq.is_nan() {
        return upper;
    }
    freq.clamp(MIN_DESIGN_FREQ_HZ, upper)
}

// Non-positive or tiny rates are raised so the clamp range stays non-empty.
#[inline]
fn sane_sample_rate(sample_rate: f32) -> f64 {
    f64::from(sample_rate.max(2.0 * MIN_DESIGN_FREQ_HZ / NYQUIST_GUARD + 1.0))
}

/// Peaking EQ centred on `freq` with bandwidth `q` and `gain_db` of boost or cut.
pub fn design_peak(freq: f32, q: f32, gain_db: f32, sample_rate: f32) -> Coefficients {
    let fs = sane_sample_rate(sample_rate);
    let f0 = f64::from(clamp_frequency(freq, fs as f32));
    let q = f64::from(q).max(MIN_Q);
    let gain = f64::from(db_to_lin(gain_db));

    let a = gain.max(0.0).sqrt();
    let w0 = TAU * f0 / fs;
    let (sin_w0, cos_w0) = w0.sin_cos();
    let alpha = sin_w0 / (2.0 * q);

    Coefficients::from_raw(
        1.0 + alpha * a,
        -2.0 * cos_w0,
        1.0 - alpha * a,
        1.0 + alpha / a,
        -2.0 * cos_w0,
        1.0 - alpha / a,
    )
}

/// Q of section `index` when an even-order Butterworth response of `order`
/// is split into `order / 2` biquads.
pub fn butterworth_q(order: usize, index: usize) -> f64 {
    let n = order as f64;
    let k = index as f64;
    1.0 / (2.0 * ((2.0 * k + 1.0) * PI / (2.0 * n)).cos())
}

#[derive(Clone, Copy)]
enum CutKind {
    Highpass,
    Lowpass,
}

fn design_butterworth(kind: CutKind, freq: f32, sample_rate: f32, order: usize) -> CutCoefficients {
    let fs = sane_sample_rate(sample_rate);
    let fc = f64::from(clamp_frequency(freq, fs as f32));
    let sections = (order / 2).clamp(1, MAX_CUT_STAGES);
    let order = sections * 2;

    // Pre-warped analog cutoff.
    let k = (PI * fc / fs).tan();
    let k2 = k * k;

    let mut out = CutCoefficients::default();
    for i in 0..sections {
        let q = butterworth_q(order, i);
        let a0 = 1.0 + k / q + k2;
        let a1 = 2.0 * (k2 - 1.0);
        let a2 = 1.0 - k / q + k2;

        let section = match kind {
            CutKind::Highpass => Coefficients::from_raw(1.0, -2.0, 1.0, a0, a1, a2),
            CutKind::Lowpass => Coefficients::from_raw(k2, 2.0 * k2, k2, a0, a1, a2),
        };
        out.push(section);
    }
    out
}

/// Butterworth highpass of `order` (2, 4, 6 or 8) as cascaded biquads.
///
/// Odd or out-of-range orders are rounded down and clamped to 2..=8.
pub fn design_low_cut(freq: f32, sample_rate: f32, order: usize) -> CutCoefficients {
    design_butterworth(CutKind::Highpass, freq, sample_rate, order)
}

/// Butterworth lowpass of `order` (2, 4, 6 or 8) as cascaded biquads.
pub fn design_high_cut(freq: f32, sample_rate: f32, order: usize) -> CutCoefficients {
    design_butterworth(CutKind::Lowpass, freq, sample_rate, order)
}
