use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use rusteq::audio::file::process_file;
use rusteq::audio::response::{MAX_DISPLAY_FREQ_HZ, MIN_DISPLAY_FREQ_HZ, log_frequencies, response_curve};
use rusteq::audio::{ChainController, RecomputePolicy};
use rusteq::eq::{ChainParameters, ParameterId, Slope};
use rusteq::settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "rusteq")]
#[command(version)]
#[command(about = "Low cut, peak and high cut EQ for WAV files.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter a mono or stereo WAV file
    Process {
        input: PathBuf,
        /// Defaults to eq_<timestamp>.wav in the current directory
        output: Option<PathBuf>,
        #[command(flatten)]
        eq: EqArgs,
        #[arg(long, env = "RUSTEQ_BLOCK_SIZE", help = "Frames per processing block")]
        block_size: Option<usize>,
        #[arg(long, value_enum, help = "When to redesign coefficients")]
        recompute: Option<RecomputePolicy>,
    },
    /// Print the magnitude response of the chain
    Response {
        #[command(flatten)]
        eq: EqArgs,
        #[arg(long, help = "Number of log-spaced points")]
        points: Option<usize>,
        #[arg(long, env = "RUSTEQ_SAMPLE_RATE", help = "Sample rate to design for")]
        sample_rate: Option<u32>,
        #[arg(long, help = "Print JSON instead of a table")]
        json: bool,
    },
    /// List parameters with ranges and defaults
    Params,
}

#[derive(Args, Debug)]
struct EqArgs {
    #[arg(long, help = "Low cut frequency in Hz")]
    low_cut: Option<f32>,
    #[arg(long, value_enum, help = "Low cut slope in dB/oct")]
    low_cut_slope: Option<Slope>,
    #[arg(long, help = "Peak frequency in Hz")]
    peak_freq: Option<f32>,
    #[arg(long, allow_negative_numbers = true, help = "Peak gain in dB")]
    peak_gain: Option<f32>,
    #[arg(long, help = "Peak quality")]
    peak_q: Option<f32>,
    #[arg(long, help = "High cut frequency in Hz")]
    high_cut: Option<f32>,
    #[arg(long, value_enum, help = "High cut slope in dB/oct")]
    high_cut_slope: Option<Slope>,
}

impl EqArgs {
    fn to_parameters(&self) -> ChainParameters {
        let params = ChainParameters::new();
        let values = [
            (ParameterId::LowCutFreq, self.low_cut),
            (ParameterId::PeakFreq, self.peak_freq),
            (ParameterId::PeakGain, self.peak_gain),
            (ParameterId::PeakQuality, self.peak_q),
            (ParameterId::HighCutFreq, self.high_cut),
        ];
        for (id, value) in values {
            if let Some(value) = value {
                params.set(id, value);
            }
        }
        if let Some(slope) = self.low_cut_slope {
            params.set_slope(ParameterId::LowCutSlope, slope);
        }
        if let Some(slope) = self.high_cut_slope {
            params.set_slope(ParameterId::HighCutSlope, slope);
        }
        params
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    info!("rusteq v{}", env!("CARGO_PKG_VERSION"));
    info!("Args: {cli:?}");

    let mut settings = Settings::load().context("failed to load settings")?;
    info!("{settings}");

    match cli.command {
        Command::Process {
            input,
            output,
            eq,
            block_size,
            recompute,
        } => {
            if let Some(block_size) = block_size {
                settings.audio.block_size = block_size;
            }
            if let Some(recompute) = recompute {
                settings.recompute = recompute;
            }
            let output = output.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "eq_{}.wav",
                    chrono::Local::now().format("%Y%m%d_%H%M%S")
                ))
            });

            let params = eq.to_parameters();
            let summary = process_file(&input, &output, &params, &settings)
                .with_context(|| format!("failed to process '{}'", input.display()))?;
            println!(
                "{} -> {} ({} frames, {} ch, {} Hz)",
                input.display(),
                output.display(),
                summary.frames,
                summary.channels,
                summary.sample_rate
            );
        }
        Command::Response {
            eq,
            points,
            sample_rate,
            json,
        } => {
            let points = points.unwrap_or(settings.response_points);
            let sample_rate = sample_rate.unwrap_or(settings.audio.sample_rate);

            let (mut controller, _) = ChainController::new(Arc::new(eq.to_parameters()), settings.recompute);
            controller.prepare(sample_rate as f32, settings.audio.block_size);

            let frequencies = log_frequencies(points, MIN_DISPLAY_FREQ_HZ, MAX_DISPLAY_FREQ_HZ);
            let curve = response_curve(&controller.state(), &frequencies);

            if json {
                let text = serde_json::to_string_pretty(&curve).context("failed to serialize response")?;
                println!("{text}");
            } else {
                for point in &curve {
                    println!("{:>10.1} Hz {:>9.2} dB", point.frequency, point.magnitude_db);
                }
            }
        }
        Command::Params => {
            let params = ChainParameters::new();
            for id in ParameterId::ALL {
                let range = id.range();
                // Where a knob's centre lands once the skew is applied.
                let centre = id.format().format(range.snap(range.denormalise(0.5)));
                println!(
                    "{:<14} {:>8} .. {:<8} step {:<5} default {:<12} centre {}",
                    id.name(),
                    range.min,
                    range.max,
                    range.step,
                    params.display_value(id),
                    centre
                );
            }
        }
    }

    Ok(())
}
