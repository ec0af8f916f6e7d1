// Spectral module - Frequency-domain feature routines
//
// Every routine is a pure function of a magnitude spectrum and the matching
// frequency axis (both of equal length). The axis may be uniform FFT bins or
// an arbitrary list of center frequencies. Routines return 0.0 for a silent
// spectrum.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

/// Magnitude sums below this are treated as silence
const SILENCE_EPSILON: f64 = 1e-10;

/// Base frequency of the first octave contrast band in Hz
pub const CONTRAST_BASE_HZ: f32 = 200.0;

/// Number of octave contrast bands
pub const CONTRAST_BANDS: usize = 6;

/// Fraction of band bins averaged for peak and valley in spectral contrast
const CONTRAST_QUANTILE: f32 = 0.2;

fn magnitude_sum(spectrum: &[f32]) -> f64 {
    spectrum.iter().map(|&m| m as f64).sum()
}

fn energy_sum(spectrum: &[f32]) -> f64 {
    spectrum.iter().map(|&m| (m as f64) * (m as f64)).sum()
}

/// Centroid and weighted central moments (orders 2-4) in one pass
fn moments(spectrum: &[f32], frequencies: &[f32]) -> Option<(f64, f64, f64, f64)> {
    let total = magnitude_sum(spectrum);
    if total < SILENCE_EPSILON {
        return None;
    }

    let centroid = spectrum
        .iter()
        .zip(frequencies)
        .map(|(&m, &f)| m as f64 * f as f64)
        .sum::<f64>()
        / total;

    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for (&m, &f) in spectrum.iter().zip(frequencies) {
        let d = f as f64 - centroid;
        let w = m as f64;
        m2 += d * d * w;
        m3 += d * d * d * w;
        m4 += d * d * d * d * w;
    }

    Some((centroid, m2 / total, m3 / total, m4 / total))
}

/// Compute spectral centroid (weighted mean frequency)
///
/// Formula: centroid = Σ(f_i × |X[i]|) / Σ|X[i]|
pub fn centroid(spectrum: &[f32], frequencies: &[f32]) -> f32 {
    moments(spectrum, frequencies)
        .map(|(c, _, _, _)| c as f32)
        .unwrap_or(0.0)
}

/// Compute spectral spread (standard deviation around the centroid)
pub fn spread(spectrum: &[f32], frequencies: &[f32]) -> f32 {
    moments(spectrum, frequencies)
        .map(|(_, var, _, _)| var.sqrt() as f32)
        .unwrap_or(0.0)
}

/// Compute spectral skewness (third standardized moment)
pub fn skewness(spectrum: &[f32], frequencies: &[f32]) -> f32 {
    match moments(spectrum, frequencies) {
        Some((_, var, m3, _)) if var > SILENCE_EPSILON => (m3 / var.powf(1.5)) as f32,
        _ => 0.0,
    }
}

/// Compute spectral kurtosis (fourth standardized moment)
pub fn kurtosis(spectrum: &[f32], frequencies: &[f32]) -> f32 {
    match moments(spectrum, frequencies) {
        Some((_, var, _, m4)) if var > SILENCE_EPSILON => (m4 / (var * var)) as f32,
        _ => 0.0,
    }
}

/// Compute spectral flatness (tonality measure)
///
/// Formula: flatness = geometric_mean(max(|X[i]|, floor)) / arithmetic_mean(max(|X[i]|, floor))
///
/// Returns value between 0 (tonal) and 1 (noise-like).
///
/// # Arguments
/// * `spectrum` - Magnitude spectrum
/// * `min_level` - Floor applied to each magnitude before averaging
pub fn flatness(spectrum: &[f32], min_level: f32) -> f32 {
    if spectrum.is_empty() || magnitude_sum(spectrum) < SILENCE_EPSILON {
        return 0.0;
    }

    let floor = (min_level.max(f32::MIN_POSITIVE)) as f64;
    let n = spectrum.len() as f64;
    let (mut log_sum, mut sum) = (0.0, 0.0);
    for &m in spectrum {
        let v = (m as f64).max(floor);
        log_sum += v.ln();
        sum += v;
    }

    let geometric_mean = (log_sum / n).exp();
    let arithmetic_mean = sum / n;
    (geometric_mean / arithmetic_mean).min(1.0) as f32
}

/// Compute spectral crest (peak to mean ratio)
pub fn crest(spectrum: &[f32]) -> f32 {
    let total = magnitude_sum(spectrum);
    if total < SILENCE_EPSILON {
        return 0.0;
    }
    let peak = spectrum.iter().copied().fold(0.0f32, f32::max) as f64;
    (peak / (total / spectrum.len() as f64)) as f32
}

/// Compute spectral rolloff
///
/// Finds the frequency below which `fraction` of the spectral energy is
/// contained.
///
/// # Arguments
/// * `spectrum` - Magnitude spectrum
/// * `frequencies` - Frequency axis
/// * `fraction` - Energy fraction in (0, 1]
pub fn rolloff(spectrum: &[f32], frequencies: &[f32], fraction: f32) -> f32 {
    let total_energy = energy_sum(spectrum);
    if total_energy < SILENCE_EPSILON {
        return 0.0;
    }

    let threshold = fraction as f64 * total_energy;
    let mut cumulative_energy = 0.0;
    for (&m, &f) in spectrum.iter().zip(frequencies) {
        cumulative_energy += (m as f64) * (m as f64);
        if cumulative_energy >= threshold {
            return f;
        }
    }

    frequencies.last().copied().unwrap_or(0.0)
}

/// Compute spectral slope (linear regression of magnitude over frequency,
/// normalised by total magnitude)
pub fn slope(spectrum: &[f32], frequencies: &[f32]) -> f32 {
    let total = magnitude_sum(spectrum);
    if total < SILENCE_EPSILON || spectrum.len() < 2 {
        return 0.0;
    }

    let n = spectrum.len() as f64;
    let (mut sum_f, mut sum_ff, mut sum_fm) = (0.0, 0.0, 0.0);
    for (&m, &f) in spectrum.iter().zip(frequencies) {
        let f = f as f64;
        sum_f += f;
        sum_ff += f * f;
        sum_fm += f * m as f64;
    }

    let denominator = n * sum_ff - sum_f * sum_f;
    if denominator.abs() < SILENCE_EPSILON {
        return 0.0;
    }
    ((n * sum_fm - sum_f * total) / denominator / total) as f32
}

/// Compute spectral decrease (average slope relative to the first bin)
///
/// Formula: decrease = Σ_{k≥1} (|X[k]| - |X[0]|) / k / Σ_{k≥1} |X[k]|
pub fn decrease(spectrum: &[f32]) -> f32 {
    if spectrum.len() < 2 {
        return 0.0;
    }
    let tail = magnitude_sum(&spectrum[1..]);
    if tail < SILENCE_EPSILON {
        return 0.0;
    }

    let first = spectrum[0] as f64;
    let weighted: f64 = spectrum[1..]
        .iter()
        .enumerate()
        .map(|(k, &m)| (m as f64 - first) / (k + 1) as f64)
        .sum();
    (weighted / tail) as f32
}

/// Compute normalised spectral entropy of the power distribution (0.0 to 1.0)
pub fn entropy(spectrum: &[f32]) -> f32 {
    let total_energy = energy_sum(spectrum);
    if total_energy < SILENCE_EPSILON || spectrum.len() < 2 {
        return 0.0;
    }

    let h: f64 = spectrum
        .iter()
        .map(|&m| (m as f64) * (m as f64) / total_energy)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.ln())
        .sum();
    (h / (spectrum.len() as f64).ln()) as f32
}

/// Compute spectral noiseness (share of energy at or above `noise_frequency`)
pub fn noiseness(spectrum: &[f32], frequencies: &[f32], noise_frequency: f32) -> f32 {
    let total_energy = energy_sum(spectrum);
    if total_energy < SILENCE_EPSILON {
        return 0.0;
    }

    let high: f64 = spectrum
        .iter()
        .zip(frequencies)
        .filter(|&(_, &f)| f >= noise_frequency)
        .map(|(&m, _)| (m as f64) * (m as f64))
        .sum();
    (high / total_energy) as f32
}

/// Compute total spectral energy (Σ|X[i]|²)
pub fn energy(spectrum: &[f32]) -> f32 {
    energy_sum(spectrum) as f32
}

/// Compute spectral contrast for one octave band
///
/// Band `band` (1-based) covers [200·2^(band-1), 200·2^band) Hz. Contrast is
/// the log ratio of the mean of the strongest bins to the mean of the
/// weakest bins within the band.
///
/// `scratch` receives the in-band magnitudes and is sorted in place; it must
/// be at least as long as `spectrum`.
pub fn contrast(spectrum: &[f32], frequencies: &[f32], band: usize, scratch: &mut [f32]) -> f32 {
    debug_assert!(scratch.len() >= spectrum.len());
    if band == 0 {
        return 0.0;
    }
    let low = CONTRAST_BASE_HZ * 2f32.powi(band as i32 - 1);
    let high = low * 2.0;

    let band_magnitudes = spectrum
        .iter()
        .zip(frequencies)
        .filter(|&(_, &f)| f >= low && f < high)
        .map(|(&m, _)| m);
    let mut count = 0;
    for (slot, m) in scratch.iter_mut().zip(band_magnitudes) {
        *slot = m;
        count += 1;
    }

    let in_band = &mut scratch[..count];
    if in_band.is_empty() || magnitude_sum(in_band) < SILENCE_EPSILON {
        return 0.0;
    }

    in_band.sort_unstable_by(|a, b| a.total_cmp(b));
    let k = ((in_band.len() as f32 * CONTRAST_QUANTILE).round() as usize).max(1);
    let valley = magnitude_sum(&in_band[..k]) / k as f64;
    let peak = magnitude_sum(&in_band[in_band.len() - k..]) / k as f64;
    ((peak + SILENCE_EPSILON).ln() - (valley + SILENCE_EPSILON).ln()) as f32
}
