use crossbeam::channel::{Receiver, Sender, TrySendError, bounded};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::audio::denormals::ScopedNoDenormals;
use crate::audio::response::{ChainState, ResponseHandle};
use crate::eq::stages::Stage;
use crate::eq::{ChainCoefficients, ChainParameters, ChannelChain, ParameterSnapshot};

const STATE_CHANNEL_CAPACITY: usize = 4;

/// When `process_block` re-derives coefficients from the parameter store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RecomputePolicy {
    /// Redesign every block, whether or not anything moved.
    #[default]
    EveryBlock,
    /// Redesign only when the store's version moved and the snapshot
    /// differs from the last one applied.
    OnChange,
}

/// Owns the left and right channel chains and keeps their coefficients in
/// step with the parameter store.
///
/// Lives on the audio thread. Parameters come in through lock-free atomics,
/// installed state goes out through a bounded channel to a [`ResponseHandle`].
pub struct ChainController {
    params: Arc<ChainParameters>,
    policy: RecomputePolicy,
    left: ChannelChain,
    right: ChannelChain,
    coefficients: ChainCoefficients,
    last_snapshot: Option<ParameterSnapshot>,
    // Store version seen by the last refresh.
    last_version: Option<u64>,
    sample_rate: f32,
    max_block_size: usize,
    peak_bypassed: bool,
    tx_state: Sender<ChainState>,
    // Second end of the state channel, used to evict the oldest entry when full.
    rx_evict: Receiver<ChainState>,
}

impl ChainController {
    pub fn new(params: Arc<ChainParameters>, policy: RecomputePolicy) -> (Self, ResponseHandle) {
        let (tx_state, rx_state) = bounded(STATE_CHANNEL_CAPACITY);

        (
            Self {
                params,
                policy,
                left: ChannelChain::new(),
                right: ChannelChain::new(),
                coefficients: ChainCoefficients::default(),
                last_snapshot: None,
                last_version: None,
                sample_rate: 0.0,
                max_block_size: 0,
                peak_bypassed: false,
                tx_state,
                rx_evict: rx_state.clone(),
            },
            ResponseHandle::new(rx_state),
        )
    }

    /// Set the stream format. Clears both chains and installs coefficients
    /// for the current parameters. Call again whenever the host restarts the
    /// stream or changes sample rate.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        debug!("Preparing filter chain: {sample_rate} Hz, up to {max_block_size} frames per block");

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.left.reset();
        self.right.reset();
        self.last_snapshot = None;

        let snapshot = self.params.snapshot();
        self.update_from_parameters(&snapshot);
    }

    /// Design once and install the same coefficients in both channels.
    ///
    /// The snapshot need not match the store; the next block under
    /// [`RecomputePolicy::OnChange`] re-reads the store either way.
    pub fn update_from_parameters(&mut self, snapshot: &ParameterSnapshot) {
        self.coefficients = ChainCoefficients::design(snapshot, self.sample_rate);
        self.left.install(&self.coefficients);
        self.right.install(&self.coefficients);
        self.last_snapshot = Some(*snapshot);
        self.last_version = None;
        self.publish();
    }

    /// Filter one stereo block in place.
    ///
    /// If the slices differ in length only the common prefix is processed.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        let _no_denormals = ScopedNoDenormals::new();
        self.refresh_coefficients();

        let frames = left.len().min(right.len());
        self.left.process_block(&mut left[..frames]);
        self.right.process_block(&mut right[..frames]);
    }

    /// Filter a mono block through the left chain.
    pub fn process_mono(&mut self, samples: &mut [f32]) {
        let _no_denormals = ScopedNoDenormals::new();
        self.refresh_coefficients();
        self.left.process_block(samples);
    }

    /// Host-style entry point taking any number of channel buffers.
    ///
    /// One channel runs through the left chain, two are treated as stereo,
    /// and anything past the second is silenced.
    pub fn process_channels(&mut self, channels: &mut [&mut [f32]]) {
        match channels {
            [] => {}
            [mono] => self.process_mono(mono),
            [left, right, rest @ ..] => {
                self.process_block(left, right);
                for extra in rest {
                    extra.fill(0.0);
                }
            }
        }
    }

    // The version is read before the values, so a write racing this call
    // bumps it past what gets recorded and is picked up next block.
    fn refresh_coefficients(&mut self) {
        let version = self.params.version();
        if self.policy == RecomputePolicy::OnChange && self.last_version == Some(version) {
            return;
        }

        let snapshot = self.params.snapshot();
        let changed = self.last_snapshot.as_ref() != Some(&snapshot);

        if changed || self.policy == RecomputePolicy::EveryBlock {
            self.update_from_parameters(&snapshot);
        }
        self.last_version = Some(version);
    }

    // Never blocks or allocates. If the reader is behind, the oldest queued
    // state is dropped so the newest one always lands.
    fn publish(&self) {
        if let Err(TrySendError::Full(state)) = self.tx_state.try_send(self.state()) {
            let _ = self.rx_evict.try_recv();
            let _ = self.tx_state.try_send(state);
        }
    }

    pub fn set_peak_bypassed(&mut self, bypassed: bool) {
        self.peak_bypassed = bypassed;
        self.left.set_peak_bypassed(bypassed);
        self.right.set_peak_bypassed(bypassed);
        self.publish();
    }

    pub fn state(&self) -> ChainState {
        ChainState {
            coefficients: self.coefficients,
            sample_rate: self.sample_rate,
            peak_bypassed: self.peak_bypassed,
        }
    }

    /// Response of the installed left chain. Left and right always share
    /// coefficients, so this is the response of both. Unity until `prepare`
    /// has set a sample rate.
    pub fn magnitude_at(&self, frequency: f32) -> f32 {
        if self.sample_rate <= 0.0 {
            return 1.0;
        }
        self.left.magnitude_at(frequency, self.sample_rate)
    }

    pub const fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub const fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub const fn last_snapshot(&self) -> Option<&ParameterSnapshot> {
        self.last_snapshot.as_ref()
    }

    pub const fn left(&self) -> &ChannelChain {
        &self.left
    }

    pub const fn right(&self) -> &ChannelChain {
        &self.right
    }
}
