//! Allpass filter for reverb diffusion.
//!
//! A Schroeder allpass filter that adds diffusion without coloring the
//! frequency response. Essential for creating dense, smooth reverb tails.

use crate::InterpolatedDelay;
use crate::Interpolation;
use crate::flush_denormal;

/// Schroeder allpass filter for diffusion.
///
/// Allpass filters pass all frequencies at equal amplitude but modify
/// the phase. In reverb, they "smear" the impulse response, creating
/// a denser, more diffuse sound.
///
/// # Example
///
/// ```rust
/// use fretgraph_core::AllpassFilter;
///
/// let mut allpass = AllpassFilter::new(500);
/// allpass.set_feedback(0.5);
///
/// let output = allpass.process(1.0);
/// ```
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    delay: InterpolatedDelay,
    feedback: f32,
}

impl AllpassFilter {
    /// Create a new allpass filter with the given delay size in samples.
    ///
    /// # Arguments
    ///
    /// * `delay_samples` - The delay length in samples
    pub fn new(delay_samples: usize) -> Self {
        Self {
            delay: InterpolatedDelay::new(delay_samples),
            feedback: 0.5,
        }
    }

    /// Set the feedback coefficient.
    ///
    /// Typical values are around 0.5 for reverb diffusion.
    /// The allpass is stable for |feedback| < 1.0.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-0.99, 0.99);
    }

    /// Get the current feedback value.
    #[inline]
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Process a single sample through the allpass filter.
    ///
    /// Uses the Schroeder allpass structure:
    /// output = -input + delayed
    /// delay_input = input + delayed * feedback
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delay_samples = (self.delay.capacity() - 1) as f32;
        let delayed = self.delay.read(delay_samples);

        // Schroeder allpass: output = -input + delayed
        let output = -input + delayed;

        // Feed forward: input + delayed * feedback
        self.delay
            .write(flush_denormal(input + delayed * self.feedback));

        output
    }

    /// Clear the allpass filter state.
    pub fn clear(&mut self) {
        self.delay.clear();
    }

    /// Get the delay capacity in samples.
    pub fn capacity(&self) -> usize {
        self.delay.capacity()
    }
}


/// Allpass filter with LFO-modulated delay time for diffusion in FDN reverbs.
///
/// A Schroeder allpass with sinusoidal modulation of the delay read position.
/// The modulation decorrelates reflections, reducing metallic coloration and
/// flutter echoes in dense reverb tails.
///
/// ## Parameters
///
/// - `delay_samples`: Base delay length in samples
/// - `feedback`: Allpass feedback coefficient (clamped to −0.99…0.99)
/// - `mod_rate`: LFO frequency in Hz (typical 0.5–1.0 Hz)
/// - `mod_depth`: Modulation depth in milliseconds (typical 0.1–0.3 ms)
/// - `sample_rate`: Sample rate in Hz
///
/// ## DSP Structure
///
/// ```text
///          ┌──────── −g ──────────┐
///          │                      ↓
/// input ─→(+)─→ [delay line] ─→ (+) ─→ output
///                ↑ read pos = base + depth·sin(phase)
///                │
///                └─── g × delayed ───┘
/// ```
///
/// ## Reference
///
/// Jon Dattorro, "Effect Design, Part 1: Reverberator and Other Filters",
/// J. Audio Eng. Soc., Vol. 45, No. 9, 1997.
#[derive(Debug, Clone)]
pub struct ModulatedAllpass {
    delay: InterpolatedDelay,
    feedback: f32,
    base_delay: f32,
    mod_depth_samples: f32,
    mod_phase: f32,
    mod_phase_inc: f32,
}

impl ModulatedAllpass {
    /// Create a new modulated allpass filter.
    ///
    /// # Arguments
    ///
    /// * `delay_samples` - Base delay length in samples
    /// * `feedback` - Allpass feedback coefficient (clamped to −0.99…0.99)
    /// * `mod_rate` - LFO rate in Hz (typical 0.5–1.0 Hz)
    /// * `mod_depth_ms` - Modulation depth in milliseconds (typical 0.1–0.3 ms)
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(
        delay_samples: f32,
        feedback: f32,
        mod_rate: f32,
        mod_depth_ms: f32,
        sample_rate: f32,
    ) -> Self {
        let mod_depth_samples = mod_depth_ms * 0.001 * sample_rate;
        // Extra capacity for modulation excursion + margin for cubic interpolation
        let capacity = (delay_samples + mod_depth_samples) as usize + 4;
        let mut delay = InterpolatedDelay::new(capacity);
        delay.set_interpolation(Interpolation::Cubic);

        Self {
            delay,
            feedback: feedback.clamp(-0.99, 0.99),
            base_delay: delay_samples,
            mod_depth_samples,
            mod_phase: 0.0,
            mod_phase_inc: core::f32::consts::TAU * mod_rate / sample_rate,
        }
    }

    /// Process a single sample through the modulated allpass filter.
    ///
    /// Uses the Schroeder allpass structure with a modulated read position:
    /// `output = -g·input + delayed`, `write = input + g·delayed`.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let modulated_delay = self.base_delay + self.mod_depth_samples * libm::sinf(self.mod_phase);
        let delayed = self.delay.read(modulated_delay);

        // Advance LFO phase with wrap
        self.mod_phase += self.mod_phase_inc;
        if self.mod_phase >= core::f32::consts::TAU {
            self.mod_phase -= core::f32::consts::TAU;
        }

        // Schroeder allpass: output = -input + delayed
        let output = -input + delayed;
        self.delay
            .write(flush_denormal(input + delayed * self.feedback));

        output
    }

    /// Set the feedback coefficient.
    ///
    /// Range: −0.99 to 0.99. Typical reverb values are around 0.5–0.7.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-0.99, 0.99);
    }

    /// Get the current feedback value.
    #[inline]
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Reset all internal state (delay line, LFO phase).
    pub fn reset(&mut self) {
        self.delay.clear();
        self.mod_phase = 0.0;
    }
}
