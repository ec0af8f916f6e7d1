// FrequencyMap - frequency axis for spectral feature evaluation
//
// Computed once per pipeline configuration and immutable afterwards. Either
// the identity over uniform FFT bins (bin k at k × resolution Hz), or an
// explicit list of center frequencies with a precomputed bin lookup used to
// gather the full magnitude spectrum onto exactly those frequencies.

use std::sync::Arc;

use crate::error::PipelineError;

/// Frequency axis and spectrum projection
///
/// Cloning shares the underlying arrays; they are never mutated.
#[derive(Debug, Clone)]
pub struct FrequencyMap {
    resolution: f32,
    frequencies: Arc<[f32]>,
    positions: Option<Arc<[usize]>>,
}

impl FrequencyMap {
    /// Build the map for a sample rate and FFT size
    ///
    /// # Arguments
    /// * `sample_rate` - Sampling rate in Hz
    /// * `fft_size` - Transform length in samples
    /// * `center_frequencies` - Optional explicit frequency list in Hz
    ///
    /// # Errors
    /// `PipelineError::InvalidFrequency` when an explicit frequency is
    /// negative, not finite, or maps past the Nyquist bin
    pub fn new(
        sample_rate: u32,
        fft_size: usize,
        center_frequencies: Option<&[f32]>,
    ) -> Result<Self, PipelineError> {
        match center_frequencies {
            Some(freqs) => Self::explicit(sample_rate, fft_size, freqs),
            None => Ok(Self::uniform(sample_rate, fft_size)),
        }
    }

    /// Identity map over the uniform FFT bins [0, fft_size / 2]
    pub fn uniform(sample_rate: u32, fft_size: usize) -> Self {
        let resolution = sample_rate as f32 / fft_size as f32;
        let frequencies: Arc<[f32]> = (0..=fft_size / 2)
            .map(|k| k as f32 * resolution)
            .collect();

        Self {
            resolution,
            frequencies,
            positions: None,
        }
    }

    /// Map onto an explicit list of center frequencies
    ///
    /// Bin lookup: `position[i] = floor(freq[i] / resolution) + 1`
    pub fn explicit(
        sample_rate: u32,
        fft_size: usize,
        center_frequencies: &[f32],
    ) -> Result<Self, PipelineError> {
        if center_frequencies.is_empty() {
            return Err(PipelineError::InvalidFrequency {
                frequency: 0.0,
                reason: "center frequency list is empty".to_string(),
            });
        }

        let resolution = sample_rate as f32 / fft_size as f32;
        let nyquist_bin = fft_size / 2;

        let positions = center_frequencies
            .iter()
            .map(|&freq| {
                if !freq.is_finite() || freq < 0.0 {
                    return Err(PipelineError::InvalidFrequency {
                        frequency: freq,
                        reason: "must be finite and non-negative".to_string(),
                    });
                }
                let position = bin_position(freq, resolution);
                if position > nyquist_bin {
                    return Err(PipelineError::InvalidFrequency {
                        frequency: freq,
                        reason: format!(
                            "maps to bin {} beyond the Nyquist bin {}",
                            position, nyquist_bin
                        ),
                    });
                }
                Ok(position)
            })
            .collect::<Result<Arc<[usize]>, _>>()?;

        tracing::debug!(
            "[FrequencyMap] {} explicit center frequencies at {:.3} Hz resolution",
            center_frequencies.len(),
            resolution
        );

        Ok(Self {
            resolution,
            frequencies: Arc::from(center_frequencies),
            positions: Some(positions),
        })
    }

    /// Spectral bin resolution in Hz (sample_rate / fft_size)
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// Ordered frequency axis the mapped spectrum is defined on
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Bin lookup table, present only for explicit center frequencies
    pub fn positions(&self) -> Option<&[usize]> {
        self.positions.as_deref()
    }

    /// Number of frequencies (length of the mapped spectrum)
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// True when the map has no frequencies
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// True when built from an explicit center-frequency list
    pub fn is_explicit(&self) -> bool {
        self.positions.is_some()
    }

    /// Project a full magnitude spectrum onto the frequency axis
    ///
    /// Identity copy for uniform maps, gather through the lookup table
    /// otherwise.
    ///
    /// # Arguments
    /// * `spectrum` - Full magnitude spectrum (length = fft_size / 2 + 1)
    /// * `mapped` - Output (length = `self.len()`)
    pub fn project_into(&self, spectrum: &[f32], mapped: &mut [f32]) {
        match &self.positions {
            None => mapped.copy_from_slice(spectrum),
            Some(positions) => {
                for (out, &position) in mapped.iter_mut().zip(positions.iter()) {
                    *out = spectrum[position];
                }
            }
        }
    }

    /// Allocating form of [`FrequencyMap::project_into`]
    pub fn project(&self, spectrum: &[f32]) -> Vec<f32> {
        let mut mapped = vec![0.0; self.len()];
        self.project_into(spectrum, &mut mapped);
        mapped
    }
}

/// Bin index for a center frequency
pub fn bin_position(frequency: f32, resolution: f32) -> usize {
    (frequency / resolution).floor() as usize + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_map_is_identity() {
        let map = FrequencyMap::uniform(16000, 512);
        assert_eq!(map.resolution(), 31.25);
        assert_eq!(map.len(), 257);
        assert_eq!(map.frequencies()[0], 0.0);
        assert_eq!(map.frequencies()[256], 8000.0);
        assert!(!map.is_explicit());

        let spectrum: Vec<f32> = (0..257).map(|k| k as f32).collect();
        assert_eq!(map.project(&spectrum), spectrum);
    }

    #[test]
    fn test_explicit_positions_follow_formula() {
        let freqs = [0.0, 100.0, 250.0, 1000.0, 3999.0];
        let map = FrequencyMap::explicit(8000, 256, &freqs).unwrap();
        let resolution = 8000.0f32 / 256.0;

        let positions = map.positions().unwrap();
        for (i, &f) in freqs.iter().enumerate() {
            assert_eq!(positions[i], (f / resolution).floor() as usize + 1);
        }
        assert_eq!(map.frequencies(), &freqs);
    }

    #[test]
    fn test_explicit_projection_gathers_bins() {
        let map = FrequencyMap::explicit(1000, 100, &[0.0, 25.0, 40.0]).unwrap();
        // resolution 10 Hz -> positions 1, 3, 5
        let spectrum: Vec<f32> = (0..51).map(|k| k as f32 * 2.0).collect();
        assert_eq!(map.project(&spectrum), vec![2.0, 6.0, 10.0]);
    }

    #[test]
    fn test_explicit_rejects_bad_frequencies() {
        assert!(matches!(
            FrequencyMap::explicit(8000, 256, &[-1.0]),
            Err(PipelineError::InvalidFrequency { .. })
        ));
        assert!(matches!(
            FrequencyMap::explicit(8000, 256, &[f32::NAN]),
            Err(PipelineError::InvalidFrequency { .. })
        ));
        // 4000 Hz is Nyquist: floor(128) + 1 = 129 > 128
        assert!(matches!(
            FrequencyMap::explicit(8000, 256, &[4000.0]),
            Err(PipelineError::InvalidFrequency { .. })
        ));
        assert!(FrequencyMap::explicit(8000, 256, &[]).is_err());
    }

    #[test]
    fn test_clone_shares_frequencies() {
        let map = FrequencyMap::explicit(8000, 256, &[100.0, 200.0]).unwrap();
        let copy = map.clone();
        assert_eq!(map.frequencies().as_ptr(), copy.frequencies().as_ptr());
    }
}
