//! Hilbert transform for computing analytic signals.
//!
//! The Hilbert transform is fundamental for extracting instantaneous phase and
//! amplitude (envelope) from signals, which is essential for phase-amplitude
//! coupling analysis in biosignal research.
//!
//! # Algorithm
//!
//! The Hilbert transform is computed using the FFT method:
//! 1. Compute FFT of the real signal
//! 2. Zero out negative frequencies (bins N/2+1 to N-1)
//! 3. Double positive frequencies (bins 1 to N/2-1)
//! 4. Keep DC and Nyquist unchanged
//! 5. Inverse FFT gives the analytic signal
//!
//! From the analytic signal:
//! - Instantaneous amplitude = |analytic|
//! - Instantaneous phase = arg(analytic)
//!
//! # Example
//!
//! ```rust
//! use fretgraph_analysis::hilbert::HilbertTransform;
//! use std::f32::consts::PI;
//!
//! let hilbert = HilbertTransform::new(1024);
//!
//! // Create a sine wave
//! let signal: Vec<f32> = (0..1024)
//!     .map(|i| (2.0 * PI * 10.0 * i as f32 / 1024.0).sin())
//!     .collect();
//!
//! // Get the analytic signal
//! let analytic = hilbert.analytic_signal(&signal);
//!
//! // Amplitude should be ~1.0, phase should increase linearly
//! let amplitude = hilbert.instantaneous_amplitude(&signal);
//! let phase = hilbert.instantaneous_phase(&signal);
//! ```

use crate::fft::Fft;
use rustfft::num_complex::Complex;
use std::f32::consts::PI;

/// Hilbert transform processor for computing analytic signals.
///
/// Uses FFT-based Hilbert transform to compute the analytic signal,
/// from which instantaneous phase and amplitude can be extracted.
pub struct HilbertTransform {
    fft: Fft,
    fft_size: usize,
}

impl HilbertTransform {
    /// Create a new Hilbert transform processor.
    ///
    /// # Arguments
    ///
    /// * `fft_size` - Size of the FFT. Input signals will be zero-padded or truncated
    ///   to this size. Should be a power of 2 for efficiency.
    pub fn new(fft_size: usize) -> Self {
        Self {
            fft: Fft::new(fft_size),
            fft_size,
        }
    }

    /// Get the FFT size.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Compute the analytic signal using the Hilbert transform.
    ///
    /// The analytic signal z(t) = x(t) + i*H{x(t)} where H{} is the Hilbert transform.
    /// This is computed efficiently using the FFT method.
    ///
    /// # Arguments
    ///
    /// * `signal` - Input real signal (will be zero-padded or truncated to FFT size)
    ///
    /// # Returns
    ///
    /// Complex analytic signal of length equal to input signal length (up to FFT size)
    pub fn analytic_signal(&self, signal: &[f32]) -> Vec<Complex<f32>> {
        let n = signal.len().min(self.fft_size);

        // Create complex buffer from input signal
        let mut buffer: Vec<Complex<f32>> = signal[..n]
            .iter()
            .map(|&x| Complex::new(x, 0.0))
            .collect();

        // Zero-pad to FFT size
        buffer.resize(self.fft_size, Complex::new(0.0, 0.0));

        // Forward FFT
        self.fft.forward_complex(&mut buffer);

        // Apply Hilbert transform in frequency domain:
        // - DC (bin 0): unchanged
        // - Positive frequencies (bins 1 to N/2-1): multiply by 2
        // - Nyquist (bin N/2): unchanged (if N is even)
        // - Negative frequencies (bins N/2+1 to N-1): set to zero
        let half = self.fft_size / 2;

        // Double positive frequencies
        for sample in buffer.iter_mut().take(half).skip(1) {
            *sample *= 2.0;
        }

        // Zero negative frequencies
        for sample in buffer.iter_mut().take(self.fft_size).skip(half + 1) {
            *sample = Complex::new(0.0, 0.0);
        }

        // Inverse FFT
        self.fft.inverse_complex(&mut buffer);

        // Return only the original signal length
        buffer.truncate(n);
        buffer
    }

    /// Compute the instantaneous phase of the signal.
    ///
    /// The instantaneous phase is the argument (angle) of the analytic signal,
    /// ranging from -PI to PI radians.
    ///
    /// # Arguments
    ///
    /// * `signal` - Input real signal
    ///
    /// # Returns
    ///
    /// Instantaneous phase in radians for each sample
    pub fn instantaneous_phase(&self, signal: &[f32]) -> Vec<f32> {
        self.analytic_signal(signal)
            .iter()
            .map(|c| c.arg())
            .collect()
    }

    /// Compute the instantaneous amplitude (envelope) of the signal.
    ///
    /// The instantaneous amplitude is the magnitude of the analytic signal,
    /// representing the envelope of the oscillation.
    ///
    /// # Arguments
    ///
    /// * `signal` - Input real signal
    ///
    /// # Returns
    ///
    /// Instantaneous amplitude for each sample
    pub fn instantaneous_amplitude(&self, signal: &[f32]) -> Vec<f32> {
        self.analytic_signal(signal)
            .iter()
            .map(|c| c.norm())
            .collect()
    }

    /// Compute both phase and amplitude simultaneously.
    ///
    /// More efficient than calling `instantaneous_phase` and `instantaneous_amplitude`
    /// separately as it only computes the Hilbert transform once.
    ///
    /// # Returns
    ///
    /// Tuple of (phase vector, amplitude vector)
    pub fn phase_and_amplitude(&self, signal: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let analytic = self.analytic_signal(signal);

        let phase: Vec<f32> = analytic.iter().map(|c| c.arg()).collect();
        let amplitude: Vec<f32> = analytic.iter().map(|c| c.norm()).collect();

        (phase, amplitude)
    }

    /// Unwrap the phase to remove discontinuities.
    ///
    /// Phase values jump from PI to -PI (or vice versa) at discontinuities.
    /// This function unwraps the phase to create a continuous curve.
    ///
    /// # Arguments
    ///
    /// * `phase` - Wrapped phase values in radians
    ///
    /// # Returns
    ///
    /// Unwrapped phase values
    pub fn unwrap_phase(phase: &[f32]) -> Vec<f32> {
        if phase.is_empty() {
            return Vec::new();
        }

        let mut unwrapped = Vec::with_capacity(phase.len());
        unwrapped.push(phase[0]);

        let mut offset = 0.0;

        for i in 1..phase.len() {
            let delta = phase[i] - phase[i - 1];

            // Detect discontinuity and adjust offset
            if delta > PI {
                offset -= 2.0 * PI;
            } else if delta < -PI {
                offset += 2.0 * PI;
            }

            unwrapped.push(phase[i] + offset);
        }

        unwrapped
    }

    /// Compute the instantaneous frequency from the phase.
    ///
    /// The instantaneous frequency is the derivative of the unwrapped phase
    /// divided by 2*PI, giving frequency in Hz.
    ///
    /// # Arguments
    ///
    /// * `signal` - Input signal
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    ///
    /// Instantaneous frequency in Hz for each sample (length = signal length - 1)
    pub fn instantaneous_frequency(&self, signal: &[f32], sample_rate: f32) -> Vec<f32> {
        let phase = self.instantaneous_phase(signal);
        let unwrapped = Self::unwrap_phase(&phase);

        // Compute derivative (central difference)
        let mut freq = Vec::with_capacity(unwrapped.len().saturating_sub(1));

        for i in 0..unwrapped.len().saturating_sub(1) {
            let dphi = unwrapped[i + 1] - unwrapped[i];
            let f = dphi * sample_rate / (2.0 * PI);
            freq.push(f);
        }

        freq
    }
}
