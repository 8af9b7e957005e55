//! Real-time engine metrics: relaxed atomics written by the audio thread once
//! per callback and read by the control thread for UI/telemetry display.
//!
//! No lock, allocation, or fallible path appears anywhere in this module —
//! every update is a single relaxed atomic store, so publishing a metric
//! from inside a callback can never itself become the reason a callback
//! overruns.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Smoothing factor for the CPU-load exponential moving average. Close to
/// 1.0 so a single slow callback nudges the displayed load rather than
/// making it jump, while a sustained trend still shows up within a few
/// dozen callbacks.
pub const CPU_LOAD_EMA_FACTOR: f32 = 0.9;

/// A point-in-time read of [`EngineMetrics`], cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    /// Smoothed fraction of the callback period spent processing, roughly
    /// `block_render_time / block_period`. Not clamped to `[0, 1]`: a
    /// sustained value above 1.0 means the engine is falling behind.
    pub cpu_load: f32,
    /// Peak absolute sample value observed on the left/mono channel since
    /// the last [`EngineMetrics::reset`].
    pub peak_left: f32,
    /// Peak absolute sample value observed on the right channel since the
    /// last [`EngineMetrics::reset`].
    pub peak_right: f32,
    /// Callbacks in which the render loop detected it could not keep up
    /// (see [`EngineMetrics::record_callback`]'s `overran` argument).
    pub dropout_count: u64,
    /// Total audio callbacks completed since the engine started.
    pub callback_count: u64,
    /// Current reported plugin-delay-compensation latency, in samples.
    pub latency_samples: u32,
}

/// Lock-free metrics counters, shared between the audio thread (writer) and
/// the control thread (reader) via a `&'static` or `Arc`-held reference.
///
/// Every field uses relaxed ordering: metrics are observational, not
/// synchronization points, so there is nothing for a stronger ordering to
/// protect. A reader may see a slightly stale mix of fields from one
/// snapshot to the next; that is an acceptable trade for a telemetry value.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    cpu_load_bits: AtomicU32,
    peak_left_bits: AtomicU32,
    peak_right_bits: AtomicU32,
    dropout_count: AtomicU64,
    callback_count: AtomicU64,
    latency_samples: AtomicU32,
}

impl EngineMetrics {
    /// Creates a fresh metrics block, all counters zeroed.
    pub fn new() -> Self {
        Self {
            cpu_load_bits: AtomicU32::new(0.0f32.to_bits()),
            peak_left_bits: AtomicU32::new(0.0f32.to_bits()),
            peak_right_bits: AtomicU32::new(0.0f32.to_bits()),
            dropout_count: AtomicU64::new(0),
            callback_count: AtomicU64::new(0),
            latency_samples: AtomicU32::new(0),
        }
    }

    /// Folds one callback's measured load fraction into the running EMA,
    /// updates peak levels from the rendered block, and bumps the callback
    /// (and, if `overran` is set, dropout) counters. Call this exactly once
    /// per audio callback, after `render` has produced its output block.
    pub fn record_callback(&self, load_fraction: f32, left: &[f32], right: &[f32], overran: bool) {
        let prev = f32::from_bits(self.cpu_load_bits.load(Ordering::Relaxed));
        let next = CPU_LOAD_EMA_FACTOR * prev + (1.0 - CPU_LOAD_EMA_FACTOR) * load_fraction;
        self.cpu_load_bits.store(next.to_bits(), Ordering::Relaxed);

        let peak_l = left.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        let peak_r = right.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        self.update_peak(&self.peak_left_bits, peak_l);
        self.update_peak(&self.peak_right_bits, peak_r);

        self.callback_count.fetch_add(1, Ordering::Relaxed);
        if overran {
            self.dropout_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn update_peak(&self, slot: &AtomicU32, candidate: f32) {
        let current = f32::from_bits(slot.load(Ordering::Relaxed));
        if candidate > current {
            slot.store(candidate.to_bits(), Ordering::Relaxed);
        }
    }

    /// Records the engine's current reported latency in samples. Called by
    /// the control thread whenever a newly compiled plan swaps in.
    pub fn set_latency_samples(&self, samples: u32) {
        self.latency_samples.store(samples, Ordering::Relaxed);
    }

    /// Clears peak levels and the dropout counter back to zero. CPU load,
    /// latency, and the callback counter are left untouched — they describe
    /// the engine's steady state, not a user-resettable meter.
    pub fn reset_peaks(&self) {
        self.peak_left_bits.store(0.0f32.to_bits(), Ordering::Relaxed);
        self.peak_right_bits.store(0.0f32.to_bits(), Ordering::Relaxed);
        self.dropout_count.store(0, Ordering::Relaxed);
    }

    /// Takes a consistent-enough snapshot of every counter for display.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cpu_load: f32::from_bits(self.cpu_load_bits.load(Ordering::Relaxed)),
            peak_left: f32::from_bits(self.peak_left_bits.load(Ordering::Relaxed)),
            peak_right: f32::from_bits(self.peak_right_bits.load(Ordering::Relaxed)),
            dropout_count: self.dropout_count.load(Ordering::Relaxed),
            callback_count: self.callback_count.load(Ordering::Relaxed),
            latency_samples: self.latency_samples.load(Ordering::Relaxed),
        }
    }
}
