// Harmonic module - pitch estimation, harmonic peak picking and harmonic
// feature routines
//
// Harmonic routines receive the full (unmapped) magnitude spectrum together
// with the located peak bins and their frequencies. A peak slot with bin 0
// is unresolved (no harmonic fitted below Nyquist) and is skipped.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Pollard, H. F. & Jansson, E. V. (1982). A tristimulus method for the
//   specification of musical timbre

use std::sync::Arc;

/// Custom pitch estimator: full magnitude spectrum -> frequency in Hz
pub type PitchRoutine = Arc<dyn Fn(&[f32]) -> f32 + Send + Sync>;

/// Half-width in bins of the search window around each expected harmonic
pub const PEAK_SEARCH_HALF_WIDTH: usize = 2;

/// Amplitude sums below this are treated as silence
const SILENCE_EPSILON: f32 = 1e-10;

/// Estimate pitch as the strongest spectral peak inside a frequency band
///
/// # Arguments
/// * `spectrum` - Full magnitude spectrum (bin k at k × resolution Hz)
/// * `resolution` - Bin spacing in Hz
/// * `low_hz` - Lower bound of the search band
/// * `high_hz` - Upper bound of the search band
///
/// # Returns
/// Frequency of the strongest bin in Hz, or 0.0 when the band is silent
pub fn spectral_peak_pitch(spectrum: &[f32], resolution: f32, low_hz: f32, high_hz: f32) -> f32 {
    if spectrum.is_empty() || resolution <= 0.0 {
        return 0.0;
    }

    let first = (low_hz / resolution).ceil().max(1.0) as usize;
    let last = ((high_hz / resolution).floor() as usize).min(spectrum.len() - 1);
    if first > last {
        return 0.0;
    }

    let mut best_bin = 0;
    let mut best_mag = 0.0;
    for (bin, &mag) in spectrum.iter().enumerate().take(last + 1).skip(first) {
        if mag > best_mag {
            best_mag = mag;
            best_bin = bin;
        }
    }

    if best_mag <= SILENCE_EPSILON {
        0.0
    } else {
        best_bin as f32 * resolution
    }
}

/// Per-frame pitch source used when no precomputed pitch track is set
#[derive(Clone)]
pub enum PitchEstimator {
    /// Strongest spectral peak inside [low_hz, high_hz]
    SpectralPeak { low_hz: f32, high_hz: f32 },
    /// Caller-supplied routine
    Custom(PitchRoutine),
}

impl PitchEstimator {
    /// Estimate the pitch of a full magnitude spectrum
    pub fn estimate(&self, spectrum: &[f32], resolution: f32) -> f32 {
        match self {
            PitchEstimator::SpectralPeak { low_hz, high_hz } => {
                spectral_peak_pitch(spectrum, resolution, *low_hz, *high_hz)
            }
            PitchEstimator::Custom(routine) => routine(spectrum),
        }
    }
}

impl std::fmt::Debug for PitchEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PitchEstimator::SpectralPeak { low_hz, high_hz } => write!(
                f,
                "SpectralPeak {{ low_hz: {}, high_hz: {} }}",
                low_hz, high_hz
            ),
            PitchEstimator::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Locate harmonic peaks of `pitch` in `spectrum`
///
/// For each harmonic h = 1..=positions.len(), the strongest bin within
/// ±PEAK_SEARCH_HALF_WIDTH bins of h × pitch is written to `positions`
/// and its frequency to `frequencies`. Slots whose harmonic falls at or
/// above Nyquist, and all slots when pitch is not positive, are reset to 0.
///
/// # Returns
/// Number of harmonics located
pub fn locate_harmonic_peaks(
    spectrum: &[f32],
    resolution: f32,
    pitch: f32,
    positions: &mut [usize],
    frequencies: &mut [f32],
) -> usize {
    positions.fill(0);
    frequencies.fill(0.0);

    if pitch <= 0.0 || !pitch.is_finite() || resolution <= 0.0 || spectrum.len() < 2 {
        return 0;
    }

    let nyquist_bin = spectrum.len() - 1;
    let nyquist_hz = nyquist_bin as f32 * resolution;
    let mut located = 0;

    for (slot, (position, frequency)) in positions.iter_mut().zip(frequencies.iter_mut()).enumerate() {
        let expected = pitch * (slot + 1) as f32;
        if expected >= nyquist_hz {
            break;
        }

        let center = (expected / resolution).round() as usize;
        let lo = center.saturating_sub(PEAK_SEARCH_HALF_WIDTH).max(1);
        let hi = (center + PEAK_SEARCH_HALF_WIDTH).min(nyquist_bin);

        let mut best_bin = center.clamp(lo, hi);
        let mut best_mag = spectrum[best_bin];
        for (bin, &mag) in spectrum.iter().enumerate().take(hi + 1).skip(lo) {
            if mag > best_mag {
                best_mag = mag;
                best_bin = bin;
            }
        }

        *position = best_bin;
        *frequency = best_bin as f32 * resolution;
        located += 1;
    }

    located
}

/// Amplitudes of the resolved harmonic slots, in harmonic order, with the
/// 1-based harmonic number and frequency
fn resolved<'a>(
    spectrum: &'a [f32],
    positions: &'a [usize],
    frequencies: &'a [f32],
) -> impl Iterator<Item = (usize, f32, f32)> + 'a {
    positions
        .iter()
        .zip(frequencies)
        .enumerate()
        .filter(move |&(_, (&pos, _))| pos > 0 && pos < spectrum.len())
        .map(move |(slot, (&pos, &freq))| (slot + 1, spectrum[pos], freq))
}

/// Compute inharmonicity (energy-weighted deviation of partials from exact
/// multiples of the first located harmonic)
///
/// Formula: inh = 2 / f0 × Σ|f_h − h·f0|·a_h² / Σ a_h²
pub fn inharmonicity(spectrum: &[f32], positions: &[usize], frequencies: &[f32]) -> f32 {
    let f0 = match (positions.first(), frequencies.first()) {
        (Some(&pos), Some(&freq)) if pos > 0 && freq > 0.0 => freq,
        _ => return 0.0,
    };

    let (mut weighted, mut energy) = (0.0f32, 0.0f32);
    for (h, amp, freq) in resolved(spectrum, positions, frequencies) {
        let a2 = amp * amp;
        weighted += (freq - h as f32 * f0).abs() * a2;
        energy += a2;
    }

    if energy <= SILENCE_EPSILON {
        0.0
    } else {
        2.0 / f0 * weighted / energy
    }
}

/// Compute one tristimulus component
///
/// T1 = a_1 / Σa, T2 = (a_2 + a_3 + a_4) / Σa, T3 = Σ_{h≥5} a_h / Σa.
/// Any other component number yields 0.0.
pub fn tristimulus(
    spectrum: &[f32],
    positions: &[usize],
    frequencies: &[f32],
    component: usize,
) -> f32 {
    let harmonics = match component {
        1 => 1..=1,
        2 => 2..=4,
        3 => 5..=usize::MAX,
        _ => return 0.0,
    };

    let (mut part, mut total) = (0.0f32, 0.0f32);
    for (h, amp, _) in resolved(spectrum, positions, frequencies) {
        total += amp;
        if harmonics.contains(&h) {
            part += amp;
        }
    }

    if total <= SILENCE_EPSILON {
        0.0
    } else {
        part / total
    }
}

/// Compute odd-to-even harmonic energy ratio
pub fn odd_even_ratio(spectrum: &[f32], positions: &[usize], frequencies: &[f32]) -> f32 {
    let (mut odd, mut even) = (0.0f32, 0.0f32);
    for (h, amp, _) in resolved(spectrum, positions, frequencies) {
        if h % 2 == 1 {
            odd += amp * amp;
        } else {
            even += amp * amp;
        }
    }

    if even <= SILENCE_EPSILON {
        0.0
    } else {
        odd / even
    }
}

/// Compute harmonic centroid (amplitude-weighted mean harmonic frequency)
pub fn harmonic_centroid(spectrum: &[f32], positions: &[usize], frequencies: &[f32]) -> f32 {
    let (mut weighted, mut total) = (0.0f32, 0.0f32);
    for (_, amp, freq) in resolved(spectrum, positions, frequencies) {
        weighted += amp * freq;
        total += amp;
    }

    if total <= SILENCE_EPSILON {
        0.0
    } else {
        weighted / total
    }
}

/// Compute harmonic spectral deviation (mean distance of each harmonic
/// amplitude from the local envelope of its neighbours)
pub fn harmonic_deviation(spectrum: &[f32], positions: &[usize], frequencies: &[f32]) -> f32 {
    let (mut before, mut current) = (0.0f32, 0.0f32);
    let (mut count, mut total, mut deviation) = (0usize, 0.0f32, 0.0f32);

    // Sliding window of three consecutive resolved amplitudes
    for (_, amp, _) in resolved(spectrum, positions, frequencies) {
        if count >= 2 {
            deviation += (current - (before + current + amp) / 3.0).abs();
        }
        before = current;
        current = amp;
        total += amp;
        count += 1;
    }

    if count < 3 || total <= SILENCE_EPSILON {
        return 0.0;
    }
    deviation / (count - 2) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Spectrum with unit-spaced bins and peaks at multiples of `pitch_bin`
    fn harmonic_spectrum(len: usize, pitch_bin: usize, amps: &[f32]) -> Vec<f32> {
        let mut spectrum = vec![0.0; len];
        for (h, &amp) in amps.iter().enumerate() {
            let bin = pitch_bin * (h + 1);
            if bin < len {
                spectrum[bin] = amp;
            }
        }
        spectrum
    }

    #[test]
    fn test_spectral_peak_pitch_in_band() {
        let spectrum = harmonic_spectrum(257, 10, &[1.0, 0.5, 0.25]);
        // resolution 20 Hz: fundamental at 200 Hz, 2nd at 400 Hz, 3rd at 600 Hz
        assert_eq!(spectral_peak_pitch(&spectrum, 20.0, 80.0, 400.0), 200.0);
        // Band that excludes the fundamental finds the 2nd harmonic
        assert_eq!(spectral_peak_pitch(&spectrum, 20.0, 300.0, 500.0), 400.0);
        assert_eq!(spectral_peak_pitch(&vec![0.0; 257], 20.0, 80.0, 400.0), 0.0);
    }

    #[test]
    fn test_estimator_variants() {
        let spectrum = harmonic_spectrum(257, 10, &[1.0, 0.5]);
        let default = PitchEstimator::SpectralPeak {
            low_hz: 80.0,
            high_hz: 400.0,
        };
        assert_eq!(default.estimate(&spectrum, 20.0), 200.0);

        let fixed = PitchEstimator::Custom(Arc::new(|_: &[f32]| 123.0f32));
        assert_eq!(fixed.estimate(&spectrum, 20.0), 123.0);
    }

    #[test]
    fn test_locate_peaks_snaps_to_local_maximum() {
        let mut spectrum = vec![0.0; 129];
        spectrum[10] = 1.0;
        spectrum[21] = 0.8; // slightly sharp second harmonic
        spectrum[30] = 0.6;
        let mut positions = vec![0; 4];
        let mut freqs = vec![0.0; 4];

        let found = locate_harmonic_peaks(&spectrum, 10.0, 100.0, &mut positions, &mut freqs);
        assert_eq!(found, 4);
        assert_eq!(&positions[..3], &[10, 21, 30]);
        assert_eq!(&freqs[..3], &[100.0, 210.0, 300.0]);
    }

    #[test]
    fn test_locate_peaks_stops_at_nyquist() {
        let spectrum = vec![1.0; 33]; // nyquist bin 32 at 320 Hz
        let mut positions = vec![7; 10];
        let mut freqs = vec![7.0; 10];

        let found = locate_harmonic_peaks(&spectrum, 10.0, 100.0, &mut positions, &mut freqs);
        assert_eq!(found, 3);
        assert!(positions[3..].iter().all(|&p| p == 0));
        assert!(freqs[3..].iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_zero_pitch_clears_slots() {
        let spectrum = vec![1.0; 33];
        let mut positions = vec![5; 4];
        let mut freqs = vec![50.0; 4];
        assert_eq!(locate_harmonic_peaks(&spectrum, 10.0, 0.0, &mut positions, &mut freqs), 0);
        assert!(positions.iter().all(|&p| p == 0));
        assert!(freqs.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_tristimulus_sums_to_one() {
        let amps = [1.0, 0.5, 0.5, 0.5, 0.25, 0.25];
        let spectrum = harmonic_spectrum(257, 10, &amps);
        let positions: Vec<usize> = (1..=6).map(|h| h * 10).collect();
        let freqs: Vec<f32> = positions.iter().map(|&p| p as f32 * 10.0).collect();

        let t1 = tristimulus(&spectrum, &positions, &freqs, 1);
        let t2 = tristimulus(&spectrum, &positions, &freqs, 2);
        let t3 = tristimulus(&spectrum, &positions, &freqs, 3);
        assert!((t1 - 1.0 / 3.0).abs() < 1e-6);
        assert!((t2 - 0.5).abs() < 1e-6);
        assert!((t1 + t2 + t3 - 1.0).abs() < 1e-6);
        assert_eq!(tristimulus(&spectrum, &positions, &freqs, 4), 0.0);
    }

    #[test]
    fn test_perfectly_harmonic_has_zero_inharmonicity() {
        let spectrum = harmonic_spectrum(257, 10, &[1.0, 0.5, 0.3]);
        let positions = vec![10, 20, 30];
        let freqs = vec![100.0, 200.0, 300.0];
        assert_eq!(inharmonicity(&spectrum, &positions, &freqs), 0.0);

        let stretched = vec![100.0, 210.0, 330.0];
        assert!(inharmonicity(&spectrum, &positions, &stretched) > 0.0);
    }

    #[test]
    fn test_odd_even_ratio() {
        let spectrum = harmonic_spectrum(257, 10, &[1.0, 1.0, 1.0, 1.0]);
        let positions = vec![10, 20, 30, 40];
        let freqs = vec![100.0, 200.0, 300.0, 400.0];
        assert!((odd_even_ratio(&spectrum, &positions, &freqs) - 1.0).abs() < 1e-6);
        assert!((harmonic_centroid(&spectrum, &positions, &freqs) - 250.0).abs() < 1e-4);
        assert_eq!(harmonic_deviation(&spectrum, &positions, &freqs), 0.0);
    }

    #[test]
    fn test_harmonic_deviation_of_alternating_partials() {
        let spectrum = harmonic_spectrum(257, 10, &[1.0, 0.4, 1.0, 0.4]);
        let positions = vec![10, 20, 30, 40, 0, 0];
        let freqs = vec![100.0, 200.0, 300.0, 400.0, 0.0, 0.0];
        // Each inner harmonic sits 0.4 away from its 3-point local mean
        let deviation = harmonic_deviation(&spectrum, &positions, &freqs);
        assert!((deviation - 0.4).abs() < 1e-6, "Deviation was {}", deviation);

        // Fewer than three resolved harmonics carry no envelope
        assert_eq!(harmonic_deviation(&spectrum, &positions[..2], &freqs[..2]), 0.0);
    }

    #[test]
    fn test_unresolved_slots_are_ignored() {
        let spectrum = vec![0.0; 129];
        let positions = vec![0; 10];
        let freqs = vec![0.0; 10];
        assert_eq!(inharmonicity(&spectrum, &positions, &freqs), 0.0);
        assert_eq!(tristimulus(&spectrum, &positions, &freqs, 1), 0.0);
        assert_eq!(odd_even_ratio(&spectrum, &positions, &freqs), 0.0);
        assert_eq!(harmonic_centroid(&spectrum, &positions, &freqs), 0.0);
        assert_eq!(harmonic_deviation(&spectrum, &positions, &freqs), 0.0);
    }
}
