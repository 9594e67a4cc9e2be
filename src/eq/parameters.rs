//! Parameter layout, the lock-free parameter store and immutable snapshots.

use anyhow::{Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Roll-off steepness of a cut filter.
#[derive(ValueEnum, Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Slope {
    #[default]
    #[value(name = "12")]
    Db12,
    #[value(name = "24")]
    Db24,
    #[value(name = "36")]
    Db36,
    #[value(name = "48")]
    Db48,
}

impl Slope {
    pub const ALL: [Self; 4] = [Self::Db12, Self::Db24, Self::Db36, Self::Db48];

    /// Butterworth order: 2, 4, 6 or 8.
    pub const fn order(self) -> usize {
        self.stages() * 2
    }

    /// Number of cascaded biquads.
    pub const fn stages(self) -> usize {
        match self {
            Self::Db12 => 1,
            Self::Db24 => 2,
            Self::Db36 => 3,
            Self::Db48 => 4,
        }
    }

    pub const fn db_per_octave(self) -> u32 {
        self.stages() as u32 * 12
    }

    pub const fn index(self) -> usize {
        self.stages() - 1
    }

    /// Choice index as stored in the parameter store; out-of-range values clamp.
    pub fn from_index(index: f32) -> Self {
        let i = if index.is_nan() { 0.0 } else { index.round() };
        match i as i32 {
            i32::MIN..=0 => Self::Db12,
            1 => Self::Db24,
            2 => Self::Db36,
            _ => Self::Db48,
        }
    }
}

impl std::fmt::Display for Slope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} db/Oct", self.db_per_octave())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterId {
    LowCutFreq,
    HighCutFreq,
    PeakFreq,
    PeakGain,
    PeakQuality,
    LowCutSlope,
    HighCutSlope,
}

/// How a control renders its value, declared per parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueFormat {
    Hertz,
    Decibels,
    Plain,
    Choice,
}

impl ValueFormat {
    pub fn format(self, value: f32) -> String {
        match self {
            Self::Hertz => with_unit(value, "Hz"),
            Self::Decibels => with_unit(value, "dB"),
            Self::Plain => format!("{value:.2}"),
            Self::Choice => Slope::from_index(value).to_string(),
        }
    }
}

fn with_unit(value: f32, unit: &str) -> String {
    if value > 999.0 {
        format!("{:.2} k{unit}", value / 1000.0)
    } else {
        format!("{value:.0} {unit}")
    }
}

/// Range metadata for one parameter.
///
/// `skew` below 1 gives more of the normalised travel to the low end, which
/// is what a frequency knob wants.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub skew: f32,
    pub default: f32,
}

impl ParameterRange {
    const fn new(min: f32, max: f32, step: f32, skew: f32, default: f32) -> Self {
        Self {
            min,
            max,
            step,
            skew,
            default,
        }
    }

    /// Round to the nearest step and clamp into range. NaN maps to the default.
    pub fn snap(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        let snapped = if self.step > 0.0 {
            let (min, step) = (f64::from(self.min), f64::from(self.step));
            (min + ((f64::from(value) - min) / step).round() * step) as f32
        } else {
            value
        };
        snapped.clamp(self.min, self.max)
    }

    /// Map a plain value to 0..1.
    pub fn normalise(&self, value: f32) -> f32 {
        let p = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        if (self.skew - 1.0).abs() > f32::EPSILON {
            p.powf(self.skew)
        } else {
            p
        }
    }

    /// Map 0..1 back to a plain value (not snapped).
    pub fn denormalise(&self, proportion: f32) -> f32 {
        let mut p = proportion.clamp(0.0, 1.0);
        if (self.skew - 1.0).abs() > f32::EPSILON && p > 0.0 {
            p = (p.ln() / self.skew).exp();
        }
        self.min + (self.max - self.min) * p
    }
}

const FREQ_SKEW: f32 = 0.25;
const PARAMETER_COUNT: usize = 7;

impl ParameterId {
    pub const ALL: [Self; PARAMETER_COUNT] = [
        Self::LowCutFreq,
        Self::HighCutFreq,
        Self::PeakFreq,
        Self::PeakGain,
        Self::PeakQuality,
        Self::LowCutSlope,
        Self::HighCutSlope,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::LowCutFreq => "LowCut Freq",
            Self::HighCutFreq => "HighCut Freq",
            Self::PeakFreq => "Peak Freq",
            Self::PeakGain => "Peak Gain",
            Self::PeakQuality => "Peak Quality",
            Self::LowCutSlope => "LowCut Slope",
            Self::HighCutSlope => "HighCut Slope",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(name.trim()))
    }

    pub const fn range(self) -> ParameterRange {
        match self {
            Self::LowCutFreq => ParameterRange::new(20.0, 20_000.0, 1.0, FREQ_SKEW, 20.0),
            Self::HighCutFreq => ParameterRange::new(20.0, 20_000.0, 1.0, FREQ_SKEW, 20_000.0),
            Self::PeakFreq => ParameterRange::new(20.0, 20_000.0, 1.0, FREQ_SKEW, 750.0),
            Self::PeakGain => ParameterRange::new(-24.0, 24.0, 0.5, 1.0, 0.0),
            Self::PeakQuality => ParameterRange::new(0.1, 10.0, 0.05, 1.0, 1.0),
            Self::LowCutSlope | Self::HighCutSlope => ParameterRange::new(0.0, 3.0, 1.0, 1.0, 0.0),
        }
    }

    pub const fn format(self) -> ValueFormat {
        match self {
            Self::LowCutFreq | Self::HighCutFreq | Self::PeakFreq => ValueFormat::Hertz,
            Self::PeakGain => ValueFormat::Decibels,
            Self::PeakQuality => ValueFormat::Plain,
            Self::LowCutSlope | Self::HighCutSlope => ValueFormat::Choice,
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Every value the filter chain depends on, captured at one instant.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub peak_freq: f32,
    pub peak_gain_db: f32,
    pub peak_quality: f32,
    pub low_cut_freq: f32,
    pub high_cut_freq: f32,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            peak_freq: ParameterId::PeakFreq.range().default,
            peak_gain_db: ParameterId::PeakGain.range().default,
            peak_quality: ParameterId::PeakQuality.range().default,
            low_cut_freq: ParameterId::LowCutFreq.range().default,
            high_cut_freq: ParameterId::HighCutFreq.range().default,
            low_cut_slope: Slope::default(),
            high_cut_slope: Slope::default(),
        }
    }
}

/// Lock-free parameter store shared between the control side and the audio thread.
///
/// Each parameter is its own atomic cell holding `f32` bits. There is no
/// cross-parameter atomicity: a snapshot may mix values written at slightly
/// different times.
pub struct ChainParameters {
    values: [AtomicU32; PARAMETER_COUNT],
    version: AtomicU64,
}

impl Default for ChainParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainParameters {
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|i| {
                AtomicU32::new(ParameterId::ALL[i].range().default.to_bits())
            }),
            version: AtomicU64::new(0),
        }
    }

    pub fn from_snapshot(snapshot: &ParameterSnapshot) -> Self {
        let params = Self::new();
        params.apply(snapshot);
        params
    }

    #[inline]
    pub fn get(&self, id: ParameterId) -> f32 {
        f32::from_bits(self.values[id.slot()].load(Ordering::Acquire))
    }

    /// Store `value` after snapping it to the parameter's range and step.
    /// Returns the value actually stored.
    pub fn set(&self, id: ParameterId, value: f32) -> f32 {
        let snapped = id.range().snap(value);
        self.values[id.slot()].store(snapped.to_bits(), Ordering::Release);
        self.version.fetch_add(1, Ordering::AcqRel);
        snapped
    }

    pub fn set_by_name(&self, name: &str, value: f32) -> Result<f32> {
        let Some(id) = ParameterId::from_name(name) else {
            bail!("unknown parameter name '{name}'");
        };
        Ok(self.set(id, value))
    }

    pub fn set_slope(&self, id: ParameterId, slope: Slope) {
        self.set(id, slope.index() as f32);
    }

    /// Bumped on every `set`. Readers compare it before loading a snapshot.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn display_value(&self, id: ParameterId) -> String {
        id.format().format(self.get(id))
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            peak_freq: self.get(ParameterId::PeakFreq),
            peak_gain_db: self.get(ParameterId::PeakGain),
            peak_quality: self.get(ParameterId::PeakQuality),
            low_cut_freq: self.get(ParameterId::LowCutFreq),
            high_cut_freq: self.get(ParameterId::HighCutFreq),
            low_cut_slope: Slope::from_index(self.get(ParameterId::LowCutSlope)),
            high_cut_slope: Slope::from_index(self.get(ParameterId::HighCutSlope)),
        }
    }

    pub fn apply(&self, snapshot: &ParameterSnapshot) {
        self.set(ParameterId::PeakFreq, snapshot.peak_freq);
        self.set(ParameterId::PeakGain, snapshot.peak_gain_db);
        self.set(ParameterId::PeakQuality, snapshot.peak_quality);
        self.set(ParameterId::LowCutFreq, snapshot.low_cut_freq);
        self.set(ParameterId::HighCutFreq, snapshot.high_cut_freq);
        self.set_slope(ParameterId::LowCutSlope, snapshot.low_cut_slope);
        self.set_slope(ParameterId::HighCutSlope, snapshot.high_cut_slope);
    }

    pub fn reset_to_defaults(&self) {
        for id in ParameterId::ALL {
            self.set(id, id.range().default);
        }
    }
}
