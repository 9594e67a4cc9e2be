use arc_swap::ArcSwap;
use crossbeam::channel::Receiver;
use serde::Serialize;
use std::sync::Arc;

use crate::eq::ChainCoefficients;
use crate::eq::stages::common::lin_to_db;

pub const MIN_DISPLAY_FREQ_HZ: f32 = 20.0;
pub const MAX_DISPLAY_FREQ_HZ: f32 = 20_000.0;
/// Floor for dB readings of a response curve.
pub const RESPONSE_FLOOR_DB: f32 = -120.0;

/// What the audio thread last installed, as seen by a display.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChainState {
    pub coefficients: ChainCoefficients,
    pub sample_rate: f32,
    pub peak_bypassed: bool,
}

impl ChainState {
    pub fn magnitude_at(&self, frequency: f32) -> f32 {
        if self.sample_rate <= 0.0 {
            return 1.0;
        }
        let c = &self.coefficients;
        let peak = if self.peak_bypassed {
            1.0
        } else {
            c.peak.magnitude_at(frequency, self.sample_rate)
        };
        c.low_cut.magnitude_at(frequency, self.sample_rate)
            * peak
            * c.high_cut.magnitude_at(frequency, self.sample_rate)
    }

    pub fn magnitude_db_at(&self, frequency: f32) -> f32 {
        lin_to_db(self.magnitude_at(frequency), RESPONSE_FLOOR_DB)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResponsePoint {
    pub frequency: f32,
    pub magnitude_db: f32,
}

/// `points` frequencies spaced evenly on a log axis from `lo` to `hi`.
pub fn log_frequencies(points: usize, lo: f32, hi: f32) -> Vec<f32> {
    match points {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let (lo, hi) = (f64::from(lo).ln(), f64::from(hi).ln());
            let step = (hi - lo) / (points - 1) as f64;
            (0..points)
                .map(|i| (lo + step * i as f64).exp() as f32)
                .collect()
        }
    }
}

pub fn response_curve(state: &ChainState, frequencies: &[f32]) -> Vec<ResponsePoint> {
    frequencies
        .iter()
        .map(|&frequency| ResponsePoint {
            frequency,
            magnitude_db: state.magnitude_db_at(frequency),
        })
        .collect()
}

/// Read side of the controller's state feed, for displays and analysis.
///
/// Never touched by the audio thread; it only drains what the controller
/// pushed and keeps the newest state.
pub struct ResponseHandle {
    rx: Receiver<ChainState>,
    latest: ArcSwap<ChainState>,
}

impl ResponseHandle {
    pub(crate) fn new(rx: Receiver<ChainState>) -> Self {
        Self {
            rx,
            latest: ArcSwap::from_pointee(ChainState::default()),
        }
    }

    /// Pull any pending states, keeping the last. Returns true if it changed.
    pub fn refresh(&self) -> bool {
        let mut newest = None;
        while let Ok(state) = self.rx.try_recv() {
            newest = Some(state);
        }

        match newest {
            Some(state) if state != **self.latest.load() => {
                self.latest.store(Arc::new(state));
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> ChainState {
        **self.latest.load()
    }

    pub fn magnitude_at(&self, frequency: f32) -> f32 {
        self.latest.load().magnitude_at(frequency)
    }

    /// Log-spaced 20 Hz to 20 kHz response, in dB.
    pub fn curve(&self, points: usize) -> Vec<ResponsePoint> {
        let frequencies = log_frequencies(points, MIN_DISPLAY_FREQ_HZ, MAX_DISPLAY_FREQ_HZ);
        response_curve(&self.latest.load(), &frequencies)
    }
}
