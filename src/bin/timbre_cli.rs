use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use timbre_features::{FeatureFrame, FeaturePipeline, HarmonicConfig, PipelineConfig};

#[derive(Parser, Debug)]
#[command(
    name = "timbre_cli",
    about = "Per-frame spectral and harmonic feature extraction for WAV files"
)]
struct Cli {
    /// WAV file to analyse (multi-channel input is mixed down to mono)
    input: PathBuf,
    /// JSON pipeline configuration; its sample rate must match the WAV
    #[arg(long)]
    config: Option<PathBuf>,
    /// Spectral feature specification (overrides the config), e.g. "c,s,f,r"
    #[arg(long)]
    features: Option<String>,
    /// Harmonic feature specification; enables the harmonic stage
    #[arg(long)]
    harmonic: Option<String>,
    /// Frame duration in seconds
    #[arg(long)]
    frame: Option<f64>,
    /// Hop duration in seconds
    #[arg(long)]
    hop: Option<f64>,
    /// Requested FFT size
    #[arg(long)]
    fft_size: Option<usize>,
    /// Worker threads; more than one runs chunked parallel extraction
    #[arg(long, default_value_t = 1)]
    workers: usize,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Log pipeline progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One JSON object per frame
    Json,
    /// Header row of feature descriptions, one row per frame
    Csv,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(io::stderr)
        .init();

    let (signal, wav_rate) = read_wav_mono(&cli.input)?;
    let config = build_config(&cli, wav_rate)?;

    let mut pipeline = FeaturePipeline::with_config(&config)
        .with_context(|| format!("configuring pipeline for {}", cli.input.display()))?;
    if let Err(err) = pipeline.validate() {
        bail!("{err}");
    }

    let frames = if cli.workers > 1 {
        pipeline.extract_parallel(&signal, 0, signal.len(), cli.workers)
    } else {
        pipeline.extract_all(&signal)
    }
    .with_context(|| format!("extracting features from {}", cli.input.display()))?;

    tracing::info!(
        "[timbre_cli] {} frames x {} features from {}",
        frames.len(),
        pipeline.feature_count(),
        cli.input.display()
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match cli.format {
        OutputFormat::Json => emit_json(&mut out, &frames)?,
        OutputFormat::Csv => emit_csv(&mut out, &pipeline.descriptions(), &frames)?,
    }
    out.flush()?;

    Ok(ExitCode::from(0))
}

fn build_config(cli: &Cli, wav_rate: u32) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = PipelineConfig::load_from_file(path)?;
            if config.sample_rate != wav_rate {
                bail!(
                    "{} is sampled at {} Hz but the configuration expects {} Hz",
                    cli.input.display(),
                    wav_rate,
                    config.sample_rate
                );
            }
            config
        }
        None => PipelineConfig::new(wav_rate, "all"),
    };

    if let Some(features) = &cli.features {
        config.features = features.clone();
    }
    if let Some(harmonic) = &cli.harmonic {
        config.harmonic = Some(HarmonicConfig::new(harmonic));
    }
    if let Some(frame) = cli.frame {
        config.frame_duration = frame;
    }
    if let Some(hop) = cli.hop {
        config.hop_duration = hop;
    }
    if cli.fft_size.is_some() {
        config.fft_size = cli.fft_size;
    }

    Ok(config)
}

/// Read a WAV file and average its channels into one mono signal
fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(|err| anyhow!(err)))
            .collect::<Result<Vec<f32>>>()?,
        hound::SampleFormat::Int => {
            let max = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f32;
            match spec.bits_per_sample {
                8 | 16 | 24 | 32 => reader
                    .samples::<i32>()
                    .map(|sample| {
                        sample
                            .map(|value| value as f32 / max)
                            .map_err(|err| anyhow!(err))
                    })
                    .collect::<Result<Vec<f32>>>()?,
                other => bail!(
                    "Unsupported bits per sample {} in {}",
                    other,
                    path.display()
                ),
            }
        }
    };

    let signal = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    tracing::debug!(
        "[timbre_cli] Read {} samples at {} Hz ({} channels) from {}",
        signal.len(),
        spec.sample_rate,
        channels,
        path.display()
    );

    Ok((signal, spec.sample_rate))
}

fn emit_json<W: Write>(out: &mut W, frames: &[FeatureFrame]) -> Result<()> {
    for frame in frames {
        writeln!(out, "{}", serde_json::to_string(frame)?)?;
    }
    Ok(())
}

fn emit_csv<W: Write>(out: &mut W, descriptions: &[&str], frames: &[FeatureFrame]) -> Result<()> {
    writeln!(out, "time,{}", descriptions.join(","))?;
    for frame in frames {
        let values: Vec<String> = frame.values.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{},{}", frame.time, values.join(","))?;
    }
    Ok(())
}
