// FeaturePipeline - configurable per-frame spectral/harmonic feature extraction
//
// This module coordinates the per-frame pipeline. The set of features is
// chosen at configuration time from the name-based catalog, and every frame
// yields one fixed-length feature vector.
//
// Module organization:
// - types: Data structures (FeatureFrame)
// - fft: FFT computation into reusable buffers
// - spectral: Frequency-domain feature routines
// - harmonic: Pitch estimation, harmonic peak picking, harmonic routines
// - mod.rs: Coordinator (FeaturePipeline)
//
// Per frame:
// 1. Reset the time block from the zero block, copy the frame in
// 2. Compute the magnitude spectrum
// 3. Project it onto the frequency map
// 4. Evaluate each spectral routine over (mapped spectrum, frequencies)
// 5. Optionally: obtain pitch, locate harmonic peaks, evaluate each
//    harmonic routine over (full spectrum, peak bins, peak frequencies)
//
// Working buffers are allocated once at construction and owned by a single
// pipeline instance. Parallel use goes through `replicate`, which allocates
// a fresh set.

mod fft;
pub mod harmonic;
pub mod spectral;
mod types;

pub use harmonic::{PitchEstimator, PitchRoutine};
pub use types::FeatureFrame;

use std::sync::Arc;

use fft::FftProcessor;

use super::catalog::{
    self, FeatureEntry, HarmonicFeature, HarmonicRoutine, SpectralFeature, SpectralRoutine,
};
use super::frequency_map::FrequencyMap;
use crate::config::{FeatureParams, HarmonicConfig, PipelineConfig};
use crate::error::{log_pipeline_error, PipelineError};

/// Reusable per-frame buffers
struct Buffers {
    /// Time block fed to the FFT (length = fft_size)
    time_block: Vec<f32>,
    /// All zeros, same length as the time block
    zero_block: Vec<f32>,
    /// Full magnitude spectrum (length = fft_size / 2 + 1)
    spectrum: Vec<f32>,
    /// Spectrum projected onto the frequency map
    mapped: Vec<f32>,
    /// Working space for band-sorting routines (length = mapped length)
    band_scratch: Vec<f32>,
}

impl Buffers {
    fn new(fft_size: usize, mapped_len: usize) -> Self {
        Self {
            time_block: vec![0.0; fft_size],
            zero_block: vec![0.0; fft_size],
            spectrum: vec![0.0; fft_size / 2 + 1],
            mapped: vec![0.0; mapped_len],
            band_scratch: vec![0.0; mapped_len],
        }
    }
}

/// Harmonic sub-pipeline, present only once harmonics are enabled
struct HarmonicStage {
    features: Vec<FeatureEntry<HarmonicFeature>>,
    max_peaks: usize,
    estimator: PitchEstimator,
    peak_positions: Vec<usize>,
    peak_frequencies: Vec<f32>,
}

impl HarmonicStage {
    fn new(
        features: Vec<FeatureEntry<HarmonicFeature>>,
        max_peaks: usize,
        estimator: PitchEstimator,
    ) -> Self {
        Self {
            features,
            max_peaks,
            estimator,
            peak_positions: vec![0; max_peaks],
            peak_frequencies: vec![0.0; max_peaks],
        }
    }

    /// Same routines, estimator and peak count over fresh peak buffers
    fn replicate(&self) -> Self {
        let features = self
            .features
            .iter()
            .map(|entry| {
                if entry.feature.is_custom() {
                    entry.clone()
                } else {
                    HarmonicFeature::resolve(&entry.description)
                }
            })
            .collect();
        Self::new(features, self.max_peaks, self.estimator.clone())
    }
}

/// Configured feature extraction pipeline
///
/// Not safe for concurrent use: every call mutates the instance's working
/// buffers. Use [`FeaturePipeline::replicate`] to obtain an independent
/// instance per thread.
pub struct FeaturePipeline {
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
    fft_size: usize,
    params: FeatureParams,
    strict: bool,
    frequency_map: FrequencyMap,
    spectral: Vec<FeatureEntry<SpectralFeature>>,
    harmonic: Option<HarmonicStage>,
    pitch_track: Option<Arc<[f32]>>,
    fft: FftProcessor,
    buffers: Buffers,
}

/// FFT size actually used for a frame of `frame_size` samples
///
/// A requested size smaller than the frame is replaced by the next power of
/// two >= frame size.
pub fn select_fft_size(requested: Option<usize>, frame_size: usize) -> usize {
    match requested {
        Some(size) if size >= frame_size => size,
        _ => frame_size.next_power_of_two(),
    }
}

/// Sample count for a duration, rounded to the nearest sample
fn samples_for(duration: f64, sample_rate: u32, what: &str) -> Result<usize, PipelineError> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(PipelineError::InvalidTiming {
            reason: format!("{} duration must be positive (got {})", what, duration),
        });
    }
    let samples = (duration * sample_rate as f64).round() as usize;
    if samples == 0 {
        return Err(PipelineError::InvalidTiming {
            reason: format!(
                "{} duration {} s is shorter than one sample at {} Hz",
                what, duration, sample_rate
            ),
        });
    }
    Ok(samples)
}

impl FeaturePipeline {
    /// Create a pipeline for a sample rate and feature specification with
    /// default framing (25 ms frames, 10 ms hop)
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz (e.g., 16000)
    /// * `features` - Delimited feature specification, or `all` / `full`
    pub fn new(sample_rate: u32, features: &str) -> Result<Self, PipelineError> {
        Self::with_config(&PipelineConfig::new(sample_rate, features))
    }

    /// Create a pipeline with explicit configuration parameters
    pub fn with_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        if config.sample_rate == 0 {
            return Err(PipelineError::InvalidTiming {
                reason: "sample rate must be positive".to_string(),
            });
        }

        let frame_size = samples_for(config.frame_duration, config.sample_rate, "frame")?;
        let hop_size = samples_for(config.hop_duration, config.sample_rate, "hop")?;
        let fft_size = select_fft_size(config.fft_size, frame_size);
        if let Some(requested) = config.fft_size {
            if requested != fft_size {
                tracing::warn!(
                    "[FeaturePipeline] FFT size {} is smaller than the {}-sample frame, using {}",
                    requested,
                    frame_size,
                    fft_size
                );
            }
        }

        let frequency_map = FrequencyMap::new(
            config.sample_rate,
            fft_size,
            config.center_frequencies.as_deref(),
        )?;

        let spectral = catalog::resolve_spectral(&config.features, &config.params);
        if spectral.is_empty() {
            return Err(PipelineError::EmptySpecification {
                stage: "spectral".to_string(),
            });
        }

        let mut pipeline = Self {
            sample_rate: config.sample_rate,
            frame_size,
            hop_size,
            fft_size,
            params: config.params,
            strict: config.strict,
            buffers: Buffers::new(fft_size, frequency_map.len()),
            fft: FftProcessor::new(fft_size),
            frequency_map,
            spectral,
            harmonic: None,
            pitch_track: None,
        };

        if pipeline.strict {
            pipeline.validate()?;
        }

        if let Some(harmonic) = &config.harmonic {
            pipeline.enable_harmonics(harmonic)?;
        }

        tracing::info!(
            "[FeaturePipeline] Configured {} features at {} Hz (frame {}, hop {}, fft {})",
            pipeline.feature_count(),
            pipeline.sample_rate,
            frame_size,
            hop_size,
            fft_size
        );

        Ok(pipeline)
    }

    /// Enable the harmonic stage with the default spectral-peak pitch
    /// estimator searching [low_hz, high_hz]
    ///
    /// Re-enabling replaces the previous harmonic stage.
    pub fn enable_harmonics(&mut self, config: &HarmonicConfig) -> Result<(), PipelineError> {
        if !(config.low_hz.is_finite() && config.high_hz.is_finite())
            || config.low_hz < 0.0
            || config.low_hz >= config.high_hz
        {
            return Err(PipelineError::InvalidHarmonicConfig {
                reason: format!(
                    "pitch band [{}, {}] Hz must satisfy 0 <= low < high",
                    config.low_hz, config.high_hz
                ),
            });
        }

        let estimator = PitchEstimator::SpectralPeak {
            low_hz: config.low_hz,
            high_hz: config.high_hz,
        };
        self.install_harmonics(&config.features, config.max_peaks, estimator)
    }

    /// Enable the harmonic stage with a caller-supplied pitch estimator
    ///
    /// The pitch band in `config` is ignored.
    pub fn enable_harmonics_with_estimator(
        &mut self,
        config: &HarmonicConfig,
        estimator: PitchRoutine,
    ) -> Result<(), PipelineError> {
        self.install_harmonics(
            &config.features,
            config.max_peaks,
            PitchEstimator::Custom(estimator),
        )
    }

    fn install_harmonics(
        &mut self,
        specification: &str,
        max_peaks: usize,
        estimator: PitchEstimator,
    ) -> Result<(), PipelineError> {
        if max_peaks == 0 {
            return Err(PipelineError::InvalidHarmonicConfig {
                reason: "peak count must be at least 1".to_string(),
            });
        }

        let features = catalog::resolve_harmonic(specification);
        if features.is_empty() {
            return Err(PipelineError::EmptySpecification {
                stage: "harmonic".to_string(),
            });
        }
        if self.strict {
            if let Some(token) = features.iter().find_map(|e| e.feature.unresolved_token()) {
                return Err(PipelineError::UnknownFeature {
                    token: token.to_string(),
                });
            }
        }

        tracing::debug!(
            "[FeaturePipeline] Harmonic stage enabled: {} features, {} peaks, {:?}",
            features.len(),
            max_peaks,
            estimator
        );
        self.harmonic = Some(HarmonicStage::new(features, max_peaks, estimator));
        Ok(())
    }

    /// Use a precomputed pitch track (one value per hop) instead of
    /// estimating pitch per frame
    ///
    /// Frames past the end of the track get pitch 0.0 (no harmonic peaks).
    pub fn set_pitch_track(&mut self, track: impl Into<Arc<[f32]>>) {
        self.pitch_track = Some(track.into());
    }

    /// Return to per-frame pitch estimation
    pub fn clear_pitch_track(&mut self) {
        self.pitch_track = None;
    }

    /// Append a custom spectral routine after the existing spectral features
    pub fn add_feature(&mut self, name: &str, routine: SpectralRoutine) {
        self.spectral.push(FeatureEntry {
            description: name.to_string(),
            feature: SpectralFeature::Custom(routine),
        });
    }

    /// Append a custom harmonic routine after the existing harmonic features
    ///
    /// # Returns
    /// `false` (and nothing is registered) when harmonics are not enabled
    pub fn add_harmonic_feature(&mut self, name: &str, routine: HarmonicRoutine) -> bool {
        match &mut self.harmonic {
            Some(stage) => {
                stage.features.push(FeatureEntry {
                    description: name.to_string(),
                    feature: HarmonicFeature::Custom(routine),
                });
                true
            }
            None => {
                tracing::debug!(
                    "[FeaturePipeline] Ignoring harmonic feature '{}': harmonics not enabled",
                    name
                );
                false
            }
        }
    }

    /// Total number of features per frame (spectral + harmonic)
    pub fn feature_count(&self) -> usize {
        self.spectral.len() + self.harmonic.as_ref().map_or(0, |h| h.features.len())
    }

    /// Ordered feature descriptions matching the layout of every frame:
    /// spectral features first, then harmonic features
    pub fn descriptions(&self) -> Vec<&str> {
        let harmonic = self.harmonic.iter().flat_map(|h| h.features.iter());
        self.spectral
            .iter()
            .map(|e| e.description.as_str())
            .chain(harmonic.map(|e| e.description.as_str()))
            .collect()
    }

    /// Tokens that did not resolve to any routine, in layout order
    pub fn unresolved_tokens(&self) -> Vec<&str> {
        let harmonic = self
            .harmonic
            .iter()
            .flat_map(|h| h.features.iter())
            .filter_map(|e| e.feature.unresolved_token());
        self.spectral
            .iter()
            .filter_map(|e| e.feature.unresolved_token())
            .chain(harmonic)
            .collect()
    }

    /// Fail with `UnknownFeature` naming the first unresolved token
    pub fn validate(&self) -> Result<(), PipelineError> {
        match self.unresolved_tokens().first() {
            Some(token) => Err(PipelineError::UnknownFeature {
                token: token.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Frequency axis the spectral features are evaluated on
    pub fn frequencies(&self) -> &[f32] {
        self.frequency_map.frequencies()
    }

    pub fn frequency_map(&self) -> &FrequencyMap {
        &self.frequency_map
    }

    pub fn params(&self) -> &FeatureParams {
        &self.params
    }

    pub fn has_harmonics(&self) -> bool {
        self.harmonic.is_some()
    }

    /// Number of frames `extract` produces over [start, end)
    ///
    /// Counts positions start, start + hop, ... with position + frame < end.
    pub fn frame_count(&self, start: usize, end: usize) -> usize {
        let fitted = end.saturating_sub(start);
        if fitted <= self.frame_size {
            return 0;
        }
        (fitted - self.frame_size).div_ceil(self.hop_size)
    }

    /// Extract feature frames over the whole signal
    pub fn extract_all(&mut self, signal: &[f32]) -> Result<Vec<FeatureFrame>, PipelineError> {
        self.extract(signal, 0, signal.len())
    }

    /// Extract feature frames for frame positions in [start, end)
    ///
    /// Frames start at `start` and advance by the hop size. A trailing
    /// frame that would reach `end` is dropped.
    ///
    /// # Errors
    /// * `InvalidRange` - start >= end, or end past the signal
    /// * `UnknownFeature` - a configured token never resolved
    pub fn extract(
        &mut self,
        signal: &[f32],
        start: usize,
        end: usize,
    ) -> Result<Vec<FeatureFrame>, PipelineError> {
        if start >= end || end > signal.len() {
            let err = PipelineError::InvalidRange { start, end };
            log_pipeline_error(&err, "extract");
            return Err(err);
        }
        if let Err(err) = self.validate() {
            log_pipeline_error(&err, "extract");
            return Err(err);
        }

        let mut frames = Vec::with_capacity(self.frame_count(start, end));
        let mut position = start;
        let mut hop_index = start / self.hop_size;

        while position + self.frame_size < end {
            let frame = &signal[position..position + self.frame_size];
            let values = self.compute_frame(frame, hop_index)?;
            frames.push(FeatureFrame {
                time: position as f64 / self.sample_rate as f64,
                values,
            });
            position += self.hop_size;
            hop_index += 1;
        }

        tracing::debug!(
            "[FeaturePipeline] Extracted {} frames from samples {}..{}",
            frames.len(),
            start,
            end
        );

        Ok(frames)
    }

    /// Compute the feature vector of a single frame
    ///
    /// Frames shorter than the FFT size are zero-padded; samples beyond the
    /// FFT size are ignored. `hop_index` selects the pitch track entry when
    /// a pitch track is set.
    pub fn process_frame(
        &mut self,
        frame: &[f32],
        hop_index: usize,
    ) -> Result<Vec<f32>, PipelineError> {
        self.validate()?;
        self.compute_frame(frame, hop_index)
    }

    fn compute_frame(&mut self, frame: &[f32], hop_index: usize) -> Result<Vec<f32>, PipelineError> {
        let Self {
            fft,
            buffers,
            frequency_map,
            spectral,
            harmonic: harmonic_stage,
            pitch_track,
            ..
        } = self;

        // Re-zero so frames shorter than the FFT are zero-padded
        buffers.time_block.copy_from_slice(&buffers.zero_block);
        let n = frame.len().min(buffers.time_block.len());
        buffers.time_block[..n].copy_from_slice(&frame[..n]);

        fft.magnitude_spectrum(&buffers.time_block, &mut buffers.spectrum);
        frequency_map.project_into(&buffers.spectrum, &mut buffers.mapped);

        let frequencies = frequency_map.frequencies();
        let harmonic_count = harmonic_stage.as_ref().map_or(0, |h| h.features.len());
        let mut values = Vec::with_capacity(spectral.len() + harmonic_count);

        for entry in spectral.iter() {
            values.push(entry.feature.evaluate(
                &buffers.mapped,
                frequencies,
                &mut buffers.band_scratch,
            )?);
        }

        if let Some(stage) = harmonic_stage {
            let resolution = frequency_map.resolution();
            let pitch = match pitch_track {
                Some(track) => track.get(hop_index).copied().unwrap_or(0.0),
                None => stage.estimator.estimate(&buffers.spectrum, resolution),
            };

            harmonic::locate_harmonic_peaks(
                &buffers.spectrum,
                resolution,
                pitch,
                &mut stage.peak_positions,
                &mut stage.peak_frequencies,
            );

            for entry in stage.features.iter() {
                values.push(entry.feature.evaluate(
                    &buffers.spectrum,
                    &stage.peak_positions,
                    &stage.peak_frequencies,
                )?);
            }
        }

        Ok(values)
    }

    /// Build an independent copy of this pipeline
    ///
    /// Spectral and harmonic routines are re-resolved from the description
    /// list with the same parameters; custom routines are shared. The
    /// frequency map and pitch track are shared read-only. All working
    /// buffers are freshly allocated.
    pub fn replicate(&self) -> Self {
        let spectral = self
            .spectral
            .iter()
            .map(|entry| {
                if entry.feature.is_custom() {
                    entry.clone()
                } else {
                    SpectralFeature::resolve(&entry.description, &self.params)
                }
            })
            .collect();

        Self {
            sample_rate: self.sample_rate,
            frame_size: self.frame_size,
            hop_size: self.hop_size,
            fft_size: self.fft_size,
            params: self.params,
            strict: self.strict,
            frequency_map: self.frequency_map.clone(),
            spectral,
            harmonic: self.harmonic.as_ref().map(HarmonicStage::replicate),
            pitch_track: self.pitch_track.clone(),
            fft: FftProcessor::new(self.fft_size),
            buffers: Buffers::new(self.fft_size, self.frequency_map.len()),
        }
    }
}

impl Clone for FeaturePipeline {
    fn clone(&self) -> Self {
        self.replicate()
    }
}

impl std::fmt::Debug for FeaturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeaturePipeline")
            .field("sample_rate", &self.sample_rate)
            .field("frame_size", &self.frame_size)
            .field("hop_size", &self.hop_size)
            .field("fft_size", &self.fft_size)
            .field("descriptions", &self.descriptions())
            .field("pitch_track", &self.pitch_track.as_ref().map(|t| t.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Generate pure sine wave for testing
    fn generate_sine_wave(sample_rate: u32, frequency: f32, duration_samples: usize) -> Vec<f32> {
        (0..duration_samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_fft_size_selection() {
        assert_eq!(select_fft_size(None, 400), 512);
        assert_eq!(select_fft_size(Some(256), 400), 512);
        assert_eq!(select_fft_size(Some(1024), 400), 1024);
        assert_eq!(select_fft_size(Some(512), 512), 512);
    }

    #[test]
    fn test_pipeline_creation() {
        let pipeline = FeaturePipeline::new(16000, "centroid,spread").unwrap();
        assert_eq!(pipeline.frame_size(), 400);
        assert_eq!(pipeline.hop_size(), 160);
        assert_eq!(pipeline.fft_size(), 512);
        assert_eq!(pipeline.feature_count(), 2);
        assert_eq!(pipeline.frequencies().len(), 257);
        assert!(!pipeline.has_harmonics());
    }

    #[test]
    fn test_invalid_timing_rejected() {
        let mut config = PipelineConfig::new(16000, "c");
        config.hop_duration = 0.0;
        assert!(matches!(
            FeaturePipeline::with_config(&config),
            Err(PipelineError::InvalidTiming { .. })
        ));

        let config = PipelineConfig::new(0, "c");
        assert!(matches!(
            FeaturePipeline::with_config(&config),
            Err(PipelineError::InvalidTiming { .. })
        ));
    }

    #[test]
    fn test_durations_round_to_nearest_sample() {
        // 0.009 s × 48000 Hz evaluates to 431.99999999999994 in f64
        let mut config = PipelineConfig::new(48000, "c");
        config.frame_duration = 0.009;
        config.hop_duration = 0.0045;
        let pipeline = FeaturePipeline::with_config(&config).unwrap();
        assert_eq!(pipeline.frame_size(), 432);
        assert_eq!(pipeline.hop_size(), 216);

        // 0.0123 s × 16000 Hz = 196.8 samples
        let mut config = PipelineConfig::new(16000, "c");
        config.frame_duration = 0.0123;
        assert_eq!(FeaturePipeline::with_config(&config).unwrap().frame_size(), 197);
    }

    #[test]
    fn test_empty_specification_rejected() {
        assert!(matches!(
            FeaturePipeline::new(16000, " , ;"),
            Err(PipelineError::EmptySpecification { .. })
        ));
    }

    #[test]
    fn test_zero_padding_resets_between_frames() {
        let mut pipeline = FeaturePipeline::new(16000, "energy").unwrap();
        let loud = vec![1.0; 512];
        let short_quiet = vec![0.0; 100];

        let loud_values = pipeline.process_frame(&loud, 0).unwrap();
        assert!(loud_values[0] > 0.0);

        // Tail of the previous block must not survive into a shorter frame
        let quiet_values = pipeline.process_frame(&short_quiet, 1).unwrap();
        assert_eq!(quiet_values[0], 0.0);
    }

    #[test]
    fn test_centroid_tracks_sine_frequency() {
        let mut pipeline = FeaturePipeline::new(16000, "centroid").unwrap();
        let low = generate_sine_wave(16000, 500.0, 400);
        let high = generate_sine_wave(16000, 4000.0, 400);

        let low_centroid = pipeline.process_frame(&low, 0).unwrap()[0];
        let high_centroid = pipeline.process_frame(&high, 0).unwrap()[0];
        println!("500 Hz centroid: {}, 4000 Hz centroid: {}", low_centroid, high_centroid);
        assert!(
            high_centroid > low_centroid,
            "Expected 4000 Hz centroid above 500 Hz centroid"
        );
    }

    #[test]
    fn test_harmonic_stage_appends_after_spectral() {
        let mut pipeline = FeaturePipeline::new(16000, "centroid").unwrap();
        pipeline
            .enable_harmonics(&HarmonicConfig::new("t1,oer"))
            .unwrap();
        pipeline.add_feature("custom", Arc::new(|_: &[f32], _: &[f32]| 1.0f32));

        assert_eq!(
            pipeline.descriptions(),
            vec!["centroid", "custom", "tristimulus1", "oddeven"]
        );
        assert_eq!(pipeline.feature_count(), 4);
    }

    #[test]
    fn test_add_harmonic_feature_without_stage_is_noop() {
        let mut pipeline = FeaturePipeline::new(16000, "centroid").unwrap();
        let added = pipeline.add_harmonic_feature(
            "h",
            Arc::new(|_: &[f32], _: &[usize], _: &[f32]| 0.0f32),
        );
        assert!(!added);
        assert_eq!(pipeline.feature_count(), 1);
    }

    #[test]
    fn test_invalid_harmonic_config() {
        let mut pipeline = FeaturePipeline::new(16000, "centroid").unwrap();
        let mut config = HarmonicConfig::new("t1");
        config.max_peaks = 0;
        assert!(matches!(
            pipeline.enable_harmonics(&config),
            Err(PipelineError::InvalidHarmonicConfig { .. })
        ));

        let mut config = HarmonicConfig::new("t1");
        config.low_hz = 500.0;
        config.high_hz = 100.0;
        assert!(pipeline.enable_harmonics(&config).is_err());
        assert!(!pipeline.has_harmonics());
    }

    #[test]
    fn test_pitch_track_drives_peak_search() {
        let sample_rate = 16000;
        let signal = generate_sine_wave(sample_rate, 250.0, 512);
        let mut pipeline = FeaturePipeline::new(sample_rate, "centroid").unwrap();
        pipeline
            .enable_harmonics(&HarmonicConfig::new("harmoniccentroid"))
            .unwrap();

        // Pitch track entry 0 is silent (no peaks), entry 1 points at 250 Hz
        pipeline.set_pitch_track(vec![0.0, 250.0]);
        assert_eq!(pipeline.process_frame(&signal, 0).unwrap()[1], 0.0);
        assert!(pipeline.process_frame(&signal, 1).unwrap()[1] > 0.0);
        // Past the end of the track
        assert_eq!(pipeline.process_frame(&signal, 5).unwrap()[1], 0.0);
    }

    #[test]
    fn test_replicate_allocates_fresh_buffers() {
        let mut pipeline = FeaturePipeline::new(16000, "centroid,flatness").unwrap();
        pipeline
            .enable_harmonics(&HarmonicConfig::new("all"))
            .unwrap();
        pipeline.set_pitch_track(vec![200.0; 4]);
        let copy = pipeline.replicate();

        assert_ne!(
            pipeline.buffers.time_block.as_ptr(),
            copy.buffers.time_block.as_ptr()
        );
        assert_ne!(
            pipeline.buffers.spectrum.as_ptr(),
            copy.buffers.spectrum.as_ptr()
        );
        assert_ne!(
            pipeline.buffers.band_scratch.as_ptr(),
            copy.buffers.band_scratch.as_ptr()
        );
        assert_ne!(
            pipeline.harmonic.as_ref().unwrap().peak_positions.as_ptr(),
            copy.harmonic.as_ref().unwrap().peak_positions.as_ptr()
        );
        assert_eq!(
            pipeline.pitch_track.as_ref().unwrap().as_ptr(),
            copy.pitch_track.as_ref().unwrap().as_ptr()
        );
        assert_eq!(pipeline.descriptions(), copy.descriptions());
    }

    #[test]
    fn test_frame_count_formula() {
        let pipeline = FeaturePipeline::new(16000, "c").unwrap();
        // frame 400, hop 160
        assert_eq!(pipeline.frame_count(0, 400), 0);
        assert_eq!(pipeline.frame_count(0, 401), 1);
        assert_eq!(pipeline.frame_count(0, 561), 2);
        assert_eq!(pipeline.frame_count(0, 16000), 98);
        assert_eq!(pipeline.frame_count(100, 50), 0);
    }
}
