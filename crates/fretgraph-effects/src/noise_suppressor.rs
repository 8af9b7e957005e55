//! Spectral noise suppressor: FFT-domain spectral subtraction with a
//! learned noise profile.
//!
//! # Theory
//!
//! The suppressor runs a short-time Fourier transform (STFT) with a Hann
//! analysis/synthesis window at 75% overlap (2048-point FFT, 512-sample hop).
//! While "learn" is active and the block is quiet, it accumulates a running
//! mean magnitude spectrum — the *noise profile*. Once the profile has seen
//! enough frames, every subsequent frame has `oversubtract · reduction ·
//! profile` subtracted from its magnitude spectrum, the result floored to
//! avoid musical-noise artifacts, and the per-bin gain smoothed across
//! frames with a one-pole (EMA) filter before the spectrum is reconstructed
//! with the original phase and overlap-added back into a continuous signal.
//!
//! Reference: Boll, "Suppression of Acoustic Noise in Speech Using Spectral
//! Subtraction", IEEE Trans. ASSP, 1979; Berouti et al., oversubtraction and
//! spectral floor refinement, ICASSP 1979.
//!
//! # Latency
//!
//! The analysis window must fill before the first frame can be processed,
//! so the effect reports [`FFT_SIZE`] samples of latency — the output at
//! time `t` reflects input up to time `t`, delayed by one full window.

use std::sync::Arc;

use rustfft::{Fft as RustFft, FftPlanner, num_complex::Complex};

use fretgraph_core::{Effect, ParamDescriptor, ParamFlags, ParamId, ParamUnit, ParameterInfo};

/// FFT size in samples (spec: 2048).
pub const FFT_SIZE: usize = 2048;

/// Hop size in samples (spec: 512, 75% overlap with [`FFT_SIZE`]).
pub const HOP_SIZE: usize = 512;

/// Number of positive-frequency bins, DC through Nyquist inclusive.
const NUM_BINS: usize = FFT_SIZE / 2 + 1;

/// Minimum number of quiet learning frames before the profile is "ready".
const LEARN_FRAMES_REQUIRED: u32 = 10;

/// Smallest magnitude treated as non-zero, avoids division by zero.
const EPS: f32 = 1e-10;

/// Precomputes the Hann analysis/synthesis window for [`FFT_SIZE`].
fn hann_window() -> Vec<f32> {
    (0..FFT_SIZE)
        .map(|i| {
            0.5 * (1.0
                - (2.0 * core::f32::consts::PI * i as f32 / FFT_SIZE as f32).cos())
        })
        .collect()
}

/// A fixed-capacity FIFO used for the overlap-add output queue.
///
/// Grows lazily up to `capacity` via `push_back`/`pop_front`; never
/// reallocates once `prepare` has called [`OutputQueue::reserve`].
struct OutputQueue {
    buf: Vec<f32>,
    head: usize,
    len: usize,
}

impl OutputQueue {
    fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0.0; capacity],
            head: 0,
            len: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn push(&mut self, value: f32) {
        debug_assert!(self.len < self.capacity(), "output queue overrun");
        let tail = (self.head + self.len) % self.capacity();
        self.buf[tail] = value;
        self.len += 1;
    }

    fn pop(&mut self) -> f32 {
        if self.len == 0 {
            return 0.0;
        }
        let value = self.buf[self.head];
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        value
    }

    fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        for v in self.buf.iter_mut() {
            *v = 0.0;
        }
    }
}

/// FFT-domain spectral noise suppressor with a learned noise profile.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Learn | 0/1 | 0 |
/// | 1 | Reduction | 0–100% | 70.0 |
/// | 2 | Oversubtract | 1.0–6.0 | 2.0 |
/// | 3 | Floor | -60.0–0.0 dB | -24.0 |
/// | 4 | Smoothing | 0–100% | 60.0 |
/// | 5 | Output | -20.0–20.0 dB | 0.0 |
pub struct NoiseSuppressor {
    sample_rate: f32,

    // ── STFT plumbing ──
    window: Vec<f32>,
    ola_scale: f32,
    fft: Arc<dyn RustFft<f32>>,
    ifft: Arc<dyn RustFft<f32>>,
    fft_scratch: Vec<Complex<f32>>,
    spectrum: Vec<Complex<f32>>,

    /// Circular history of raw input samples, one full [`FFT_SIZE`] window.
    input_history: Vec<f32>,
    hist_write: usize,
    hop_countdown: usize,

    /// Reusable ordered analysis frame, refilled from `input_history` each hop.
    frame: Vec<f32>,

    /// Circular overlap-add accumulator, one full [`FFT_SIZE`] window.
    accum: Vec<f32>,
    accum_write: usize,

    output_queue: OutputQueue,

    magnitude: Vec<f32>,
    phase: Vec<f32>,
    noise_profile: Vec<f32>,
    smoothed_gain: Vec<f32>,

    learn_frames_collected: u32,

    // ── Parameters ──
    learn: bool,
    reduction: f32,
    oversubtract: f32,
    floor_db: f32,
    smoothing: f32,
    output_level: fretgraph_core::SmoothedParam,
}

impl NoiseSuppressor {
    /// Creates a new noise suppressor at the given sample rate.
    ///
    /// The FFT size and hop are fixed regardless of sample rate; only the
    /// reported latency in seconds changes.
    pub fn new(sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let ifft = planner.plan_fft_inverse(FFT_SIZE);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());

        let window = hann_window();
        // COLA normalization for a Hann analysis+synthesis pair: divide by
        // (sum of window^2) / hop so overlap-add gain is unity.
        let window_energy: f32 = window.iter().map(|w| w * w).sum();
        let ola_scale = HOP_SIZE as f32 / window_energy;

        Self {
            sample_rate,
            window,
            ola_scale,
            fft,
            ifft,
            fft_scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            spectrum: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            input_history: vec![0.0; FFT_SIZE],
            hist_write: 0,
            hop_countdown: HOP_SIZE,
            frame: vec![0.0; FFT_SIZE],
            accum: vec![0.0; FFT_SIZE],
            accum_write: 0,
            output_queue: OutputQueue::new(FFT_SIZE + HOP_SIZE),
            magnitude: vec![0.0; NUM_BINS],
            phase: vec![0.0; NUM_BINS],
            noise_profile: vec![0.0; NUM_BINS],
            smoothed_gain: vec![1.0; NUM_BINS],
            learn_frames_collected: 0,
            learn: false,
            reduction: 0.70,
            oversubtract: 2.0,
            floor_db: -24.0,
            smoothing: 0.6,
            output_level: fretgraph_core::gain::output_level_param(sample_rate),
        }
        .primed()
    }

    /// Seeds the output queue with [`FFT_SIZE`] samples of silence, the
    /// fixed processing latency before the first real frame is ready.
    fn primed(mut self) -> Self {
        for _ in 0..FFT_SIZE {
            self.output_queue.push(0.0);
        }
        self
    }

    /// Enables or disables noise-profile learning.
    pub fn set_learn(&mut self, learn: bool) {
        self.learn = learn;
    }

    /// Returns whether learning is currently enabled.
    pub fn learn(&self) -> bool {
        self.learn
    }

    /// Discards the accumulated noise profile and restarts learning.
    pub fn clear_profile(&mut self) {
        for bin in self.noise_profile.iter_mut() {
            *bin = 0.0;
        }
        self.learn_frames_collected = 0;
    }

    /// Returns `true` once enough quiet frames have been learned to suppress.
    pub fn profile_ready(&self) -> bool {
        self.learn_frames_collected >= LEARN_FRAMES_REQUIRED
    }

    /// Sets the suppression strength (0.0 = off, 1.0 = full subtraction).
    pub fn set_reduction(&mut self, reduction: f32) {
        self.reduction = reduction.clamp(0.0, 1.0);
    }

    /// Returns the current suppression strength.
    pub fn reduction(&self) -> f32 {
        self.reduction
    }

    /// Sets the oversubtraction factor (typically 1.0–6.0).
    pub fn set_oversubtract(&mut self, factor: f32) {
        self.oversubtract = factor.clamp(1.0, 6.0);
    }

    /// Returns the current oversubtraction factor.
    pub fn oversubtract(&self) -> f32 {
        self.oversubtract
    }

    /// Sets the per-bin gain floor in dB (the quietest a suppressed bin
    /// can go relative to its original magnitude).
    pub fn set_floor_db(&mut self, db: f32) {
        self.floor_db = db.clamp(-60.0, 0.0);
    }

    /// Returns the current gain floor in dB.
    pub fn floor_db(&self) -> f32 {
        self.floor_db
    }

    /// Sets the EMA smoothing amount applied to per-bin gains across frames
    /// (0.0 = no smoothing/instant, 1.0 = frozen).
    pub fn set_smoothing(&mut self, amount: f32) {
        self.smoothing = amount.clamp(0.0, 0.99);
    }

    /// Returns the current smoothing amount.
    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    /// Writes one input sample into the circular history, returns whether
    /// a hop boundary was just crossed (a new frame should be analyzed).
    fn push_input(&mut self, sample: f32) -> bool {
        self.input_history[self.hist_write] = sample;
        self.hist_write = (self.hist_write + 1) % FFT_SIZE;

        self.hop_countdown -= 1;
        if self.hop_countdown == 0 {
            self.hop_countdown = HOP_SIZE;
            true
        } else {
            false
        }
    }

    /// Copies the history ring into ordered (oldest-first) sample order.
    fn gather_frame(&mut self) {
        for i in 0..FFT_SIZE {
            self.frame[i] = self.input_history[(self.hist_write + i) % FFT_SIZE];
        }
    }

    /// Runs one full analysis → suppression → synthesis cycle on `self.frame`,
    /// overlap-adding the windowed result into `self.accum`.
    fn process_frame(&mut self) {
        let mut rms_acc = 0.0f32;
        for (i, &sample) in self.frame.iter().enumerate() {
            rms_acc += sample * sample;
            self.spectrum[i] = Complex::new(sample * self.window[i], 0.0);
        }
        let rms = libm::sqrtf(rms_acc / FFT_SIZE as f32);

        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.fft_scratch);

        for bin in 0..NUM_BINS {
            let c = self.spectrum[bin];
            self.magnitude[bin] = (c.re * c.re + c.im * c.im).sqrt();
            self.phase[bin] = libm::atan2f(c.im, c.re);
        }

        const LEARN_RMS_THRESHOLD: f32 = 0.05;
        if self.learn && rms < LEARN_RMS_THRESHOLD {
            let n = self.learn_frames_collected.min(200) as f32;
            for bin in 0..NUM_BINS {
                self.noise_profile[bin] =
                    (self.noise_profile[bin] * n + self.magnitude[bin]) / (n + 1.0);
            }
            self.learn_frames_collected = self.learn_frames_collected.saturating_add(1);
        }

        let floor_gain = libm::powf(10.0, self.floor_db / 20.0);
        let ready = self.profile_ready();

        for bin in 0..NUM_BINS {
            let target_gain = if ready {
                let mag = self.magnitude[bin].max(EPS);
                let threshold = self.oversubtract * self.reduction * self.noise_profile[bin];
                let reduced = (mag - threshold).max(mag * floor_gain);
                (reduced / mag).clamp(floor_gain, 1.0)
            } else {
                1.0
            };
            self.smoothed_gain[bin] +=
                (1.0 - self.smoothing) * (target_gain - self.smoothed_gain[bin]);
        }

        for bin in 0..NUM_BINS {
            let mag = self.magnitude[bin] * self.smoothed_gain[bin];
            let p = self.phase[bin];
            self.spectrum[bin] = Complex::new(mag * libm::cosf(p), mag * libm::sinf(p));
        }
        // Mirror conjugate for the negative-frequency bins (real signal).
        for bin in 1..NUM_BINS - 1 {
            self.spectrum[FFT_SIZE - bin] = self.spectrum[bin].conj();
        }

        self.ifft
            .process_with_scratch(&mut self.spectrum, &mut self.fft_scratch);
        let inv_scale = 1.0 / FFT_SIZE as f32;

        for i in 0..FFT_SIZE {
            let sample = self.spectrum[i].re * inv_scale * self.window[i] * self.ola_scale;
            let idx = (self.accum_write + i) % FFT_SIZE;
            self.accum[idx] += sample;
        }

        // The first HOP_SIZE samples starting at accum_write are now final
        // (no future frame can still contribute to them): drain and clear.
        for _ in 0..HOP_SIZE {
            let idx = self.accum_write % FFT_SIZE;
            self.output_queue.push(self.accum[idx]);
            self.accum[idx] = 0.0;
            self.accum_write = (self.accum_write + 1) % FFT_SIZE;
        }
    }
}

impl Default for NoiseSuppressor {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Effect for NoiseSuppressor {
    fn process(&mut self, input: f32) -> f32 {
        let hop_boundary = self.push_input(input);
        if hop_boundary {
            self.gather_frame();
            self.process_frame();
        }
        let output_gain = self.output_level.advance();
        self.output_queue.pop() * output_gain
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        // FFT size and hop are fixed sample counts, independent of rate;
        // only the output level's smoothing time constant depends on it.
        self.sample_rate = sample_rate;
        self.output_level.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.input_history.iter_mut().for_each(|v| *v = 0.0);
        self.hist_write = 0;
        self.hop_countdown = HOP_SIZE;
        self.accum.iter_mut().for_each(|v| *v = 0.0);
        self.accum_write = 0;
        self.output_queue.clear();
        for _ in 0..FFT_SIZE {
            self.output_queue.push(0.0);
        }
        self.smoothed_gain.iter_mut().for_each(|v| *v = 1.0);
        self.output_level.snap_to_target();
    }

    fn latency_samples(&self) -> usize {
        FFT_SIZE
    }

    fn prepare(&mut self, sample_rate: f32, _max_frames: usize) {
        self.set_sample_rate(sample_rate);
    }
}

fretgraph_core::impl_params! {
    NoiseSuppressor, this {
        [0] ParamDescriptor::custom("Learn", "Learn", 0.0, 1.0, 0.0)
                .with_step(1.0)
                .with_id(ParamId(2000), "nsup_learn")
                .with_flags(ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED))
                .with_step_labels(&["Off", "On"]),
            get: if this.learn() { 1.0 } else { 0.0 },
            set: |v| this.set_learn(v >= 0.5);

        [1] ParamDescriptor::mix()
                .with_id(ParamId(2001), "nsup_reduction"),
            get: this.reduction() * 100.0,
            set: |v| this.set_reduction(v / 100.0);

        [2] ParamDescriptor::custom("Oversubtract", "OvrSub", 1.0, 6.0, 2.0)
                .with_step(0.1)
                .with_id(ParamId(2002), "nsup_oversubtract"),
            get: this.oversubtract(),
            set: |v| this.set_oversubtract(v);

        [3] ParamDescriptor::gain_db("Floor", "Floor", -60.0, 0.0, -24.0)
                .with_id(ParamId(2003), "nsup_floor"),
            get: this.floor_db(),
            set: |v| this.set_floor_db(v);

        [4] ParamDescriptor::custom("Smoothing", "Smooth", 0.0, 100.0, 60.0)
                .with_unit(ParamUnit::Percent)
                .with_id(ParamId(2004), "nsup_smoothing"),
            get: this.smoothing() * 100.0,
            set: |v| this.set_smoothing(v / 100.0);

        [5] fretgraph_core::gain::output_param_descriptor()
                .with_id(ParamId(2005), "nsup_output"),
            get: fretgraph_core::gain::output_level_db(&this.output_level),
            set: |v| fretgraph_core::gain::set_output_level_db(&mut this.output_level, v);
    }
}
