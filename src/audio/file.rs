use anyhow::{Context, Result, bail};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

use crate::audio::controller::ChainController;
use crate::eq::ChainParameters;
use crate::settings::Settings;

/// What `process_file` did, for the caller to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSummary {
    pub channels: u16,
    pub sample_rate: u32,
    pub frames: usize,
}

/// Run a WAV file through the filter chain and write the result as 32-bit
/// float WAV with the same channel count and sample rate.
///
/// Audio goes through a [`ChainController`] in `settings.audio.block_size`
/// chunks, the same way a live host would drive it.
pub fn process_file(
    input: &Path,
    output: &Path,
    params: &ChainParameters,
    settings: &Settings,
) -> Result<FileSummary> {
    let reader = WavReader::open(input)
        .with_context(|| format!("failed to open '{}'", input.display()))?;
    let spec = reader.spec();
    debug!("Input format: {spec:?}");

    if spec.channels == 0 || spec.channels > 2 {
        bail!(
            "'{}' has {} channels, only mono and stereo are supported",
            input.display(),
            spec.channels
        );
    }

    let interleaved = read_samples(reader)
        .with_context(|| format!("failed to read samples from '{}'", input.display()))?;
    let mut channels = deinterleave(&interleaved, usize::from(spec.channels));
    let frames = channels.first().map_or(0, Vec::len);

    let block_size = settings.audio.block_size.max(1);
    let params = Arc::new(ChainParameters::from_snapshot(&params.snapshot()));
    let (mut controller, _) = ChainController::new(params, settings.recompute);
    controller.prepare(spec.sample_rate as f32, block_size);

    match channels.as_mut_slice() {
        [mono] => {
            for block in mono.chunks_mut(block_size) {
                controller.process_mono(block);
            }
        }
        [left, right] => {
            for (l, r) in left.chunks_mut(block_size).zip(right.chunks_mut(block_size)) {
                controller.process_block(l, r);
            }
        }
        _ => bail!("unsupported channel count {}", spec.channels),
    }

    let out_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(output, out_spec)
        .with_context(|| format!("failed to create '{}'", output.display()))?;
    for frame in 0..frames {
        for channel in &channels {
            writer
                .write_sample(channel[frame])
                .context("failed to write sample")?;
        }
    }
    writer
        .finalize()
        .with_context(|| format!("failed to finalize '{}'", output.display()))?;

    info!(
        "Processed {frames} frames ({} ch, {} Hz) into {}",
        spec.channels,
        spec.sample_rate,
        output.display()
    );

    Ok(FileSummary {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        frames,
    })
}

fn read_samples<R: std::io::Read>(mut reader: WavReader<R>) -> Result<Vec<f32>> {
    let spec = reader.spec();
    let samples = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 * scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(samples)
}

fn deinterleave(interleaved: &[f32], channels: usize) -> Vec<Vec<f32>> {
    (0..channels)
        .map(|c| interleaved.iter().skip(c).step_by(channels).copied().collect())
        .collect()
}
