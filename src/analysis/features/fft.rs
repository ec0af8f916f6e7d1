// FFT module - Fast Fourier Transform computation
//
// This module computes magnitude spectra from zero-padded time blocks.
// The transform is planned once per processor and all complex buffers are
// reused across frames, so a processor never allocates after construction.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// FFT processor that computes magnitude spectra from time blocks
pub struct FftProcessor {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl FftProcessor {
    /// Create a new FFT processor
    ///
    /// # Arguments
    /// * `fft_size` - Transform length in samples
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();

        Self {
            fft,
            fft_size,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// Compute the magnitude spectrum of `block` into `magnitudes`
    ///
    /// # Arguments
    /// * `block` - Time-domain block (length = fft_size)
    /// * `magnitudes` - Output spectrum (length = fft_size / 2 + 1)
    pub fn magnitude_spectrum(&mut self, block: &[f32], magnitudes: &mut [f32]) {
        debug_assert_eq!(block.len(), self.fft_size);
        debug_assert_eq!(magnitudes.len(), self.fft_size / 2 + 1);

        for (slot, &sample) in self.buffer.iter_mut().zip(block) {
            *slot = Complex::new(sample, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        // Only positive frequencies (real input is conjugate-symmetric)
        for (out, bin) in magnitudes.iter_mut().zip(&self.buffer) {
            *out = bin.norm();
        }
    }
}
