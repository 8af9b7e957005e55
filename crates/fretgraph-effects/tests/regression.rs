//! Regression test framework for fretgraph effects
//!
//! This framework ensures effect implementations remain stable across changes
//! by comparing current output against saved golden files.
//!
//! # Usage
//!
//! Run with `REGENERATE_GOLDEN=1` to create/update golden files:
//! ```bash
//! REGENERATE_GOLDEN=1 cargo test --test regression
//! ```
//!
//! Run normally to verify against golden files:
//! ```bash
//! cargo test --test regression
//! ```

use fretgraph_analysis::compare::{mse, snr_db, spectral_correlation};
use fretgraph_core::Effect;
use fretgraph_effects::{
    Chorus, CleanPreamp, Compressor, Delay, Distortion, Flanger, Gate, LowPassFilter, MultiVibrato,
    ParametricEq, Phaser, Reverb, TapeSaturation, Tremolo, Wah,
};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

const SAMPLE_RATE: f32 = 48000.0;
const TEST_DURATION_SAMPLES: usize = 4800; // 100ms at 48kHz
const GOLDEN_DIR: &str = "tests/golden";

/// Mean Squared Error threshold for regression detection.
///
/// Chosen at 1e-6 based on f32 precision characteristics:
/// - f32 mantissa provides ~7 decimal digits of precision (~1.2e-7 relative error)
/// - 24-bit audio has a noise floor around -144 dBFS, corresponding to ~1e-7 amplitude
/// - 1e-6 provides approximately 1 bit of margin above the f32 precision limit,
///   allowing for minor floating-point rounding differences across compiler versions
///   or instruction reordering while still catching any meaningful algorithmic change
const MSE_THRESHOLD: f32 = 1e-6;

/// Signal-to-Noise Ratio threshold in decibels for regression detection.
///
/// Set at 60 dB, which corresponds to ~10-bit effective resolution (2^10 = 1024,
/// 20*log10(1024) ≈ 60 dB). This threshold accounts for accumulated f32 rounding
/// errors across multi-stage DSP chains (biquad coefficient calculations, feedback
/// paths, parameter smoothing), where each stage contributes small rounding errors
/// that compound. 60 dB is well above perceptual thresholds (~40 dB for subtle
/// artifacts) while allowing the headroom needed for legitimate floating-point
/// variation across platforms and optimization levels.
const SNR_THRESHOLD_DB: f32 = 60.0;

/// Spectral correlation threshold for regression detection.
///
/// Set at 0.9999 (four nines) to ensure the frequency-domain content is virtually
/// identical between current and golden outputs. This metric is sensitive to:
/// - New harmonics introduced by algorithm changes (e.g., distortion mode tweaks)
/// - Shifted resonance peaks from filter coefficient modifications
/// - Spectral smearing from changes to windowing or interpolation
///
/// A correlation below 0.9999 indicates measurable spectral deviation that would
/// be audible in A/B comparison. The threshold is stricter than time-domain MSE
/// because small phase shifts (inaudible) inflate MSE but leave spectral
/// correlation intact, making this metric a more targeted detector of timbral
/// changes.
const SPECTRAL_CORRELATION_THRESHOLD: f32 = 0.9999;

/// Generate a deterministic test signal (multi-frequency sine)
fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            let fundamental = (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            let harmonic2 = 0.3 * (2.0 * std::f32::consts::PI * 880.0 * t).sin();
            let harmonic3 = 0.2 * (2.0 * std::f32::consts::PI * 1320.0 * t).sin();
            (fundamental + harmonic2 + harmonic3) * 0.5
        })
        .collect()
}

/// Generate an impulse signal for reverb/delay testing
fn generate_impulse(size: usize) -> Vec<f32> {
    let mut signal = vec![0.0; size];
    signal[0] = 1.0;
    signal
}

/// Get the golden file path for an effect
fn golden_path(effect_name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .join(GOLDEN_DIR)
        .join(format!("{}.golden", effect_name))
}

/// Save output to golden file
fn save_golden(effect_name: &str, output: &[f32]) -> std::io::Result<()> {
    let path = golden_path(effect_name);
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    for sample in output {
        writeln!(writer, "{:.10}", sample)?;
    }
    Ok(())
}

/// Load golden file
fn load_golden(effect_name: &str) -> std::io::Result<Vec<f32>> {
    let path = golden_path(effect_name);
    let file = File::open(&path)?;
    let reader = BufReader::new(file);
    let mut samples = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if let Ok(sample) = line.trim().parse::<f32>() {
            samples.push(sample);
        }
    }
    Ok(samples)
}

/// Check if we should regenerate golden files
fn should_regenerate() -> bool {
    std::env::var("REGENERATE_GOLDEN").is_ok()
}

/// Run regression test for an effect
fn run_regression_test<E: Effect>(
    effect_name: &str,
    mut effect: E,
    input: &[f32],
) -> Result<(), String> {
    // Process input through effect
    let mut output = vec![0.0; input.len()];
    effect.process_block(input, &mut output);

    if should_regenerate() {
        // Save new golden file
        save_golden(effect_name, &output)
            .map_err(|e| format!("Failed to save golden file: {}", e))?;
        println!("Regenerated golden file for {}", effect_name);
        return Ok(());
    }

    // Load expected output
    let expected = load_golden(effect_name).map_err(|e| {
        format!(
            "Failed to load golden file for {} (run with REGENERATE_GOLDEN=1 to create): {}",
            effect_name, e
        )
    })?;

    // Verify lengths match
    if output.len() != expected.len() {
        return Err(format!(
            "{}: Output length mismatch (got {}, expected {})",
            effect_name,
            output.len(),
            expected.len()
        ));
    }

    // Compare using multiple metrics
    let mse_val = mse(&output, &expected);
    let snr = snr_db(&expected, &output);
    let correlation = spectral_correlation(&output, &expected, 2048.min(output.len()));

    // Check thresholds
    let mut errors = Vec::new();

    if mse_val > MSE_THRESHOLD {
        errors.push(format!(
            "MSE {} exceeds threshold {} (sample deviation)",
            mse_val, MSE_THRESHOLD
        ));
    }

    if snr < SNR_THRESHOLD_DB && snr.is_finite() {
        errors.push(format!(
            "SNR {:.1} dB below threshold {:.1} dB",
            snr, SNR_THRESHOLD_DB
        ));
    }

    if correlation < SPECTRAL_CORRELATION_THRESHOLD {
        errors.push(format!(
            "Spectral correlation {:.6} below threshold {:.6}",
            correlation, SPECTRAL_CORRELATION_THRESHOLD
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "{} regression detected:\n  - {}",
            effect_name,
            errors.join("\n  - ")
        ))
    }
}

// Individual effect regression tests

#[test]
fn test_distortion_regression() {
    let mut effect = Distortion::new(SAMPLE_RATE);
    effect.set_drive_db(15.0);
    effect.set_tone_hz(4000.0);
    effect.set_level_db(-6.0);

    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("distortion", effect, &input).expect("Distortion regression test failed");
}

#[test]
fn test_compressor_regression() {
    let mut effect = Compressor::new(SAMPLE_RATE);
    effect.set_threshold_db(-20.0);
    effect.set_ratio(4.0);
    effect.set_attack_ms(5.0);
    effect.set_release_ms(50.0);

    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("compressor", effect, &input).expect("Compressor regression test failed");
}

#[test]
fn test_chorus_regression() {
    let mut effect = Chorus::new(SAMPLE_RATE);
    effect.set_rate(2.0);
    effect.set_depth(0.7);
    effect.set_mix(0.5);

    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("chorus", effect, &input).expect("Chorus regression test failed");
}

#[test]
fn test_delay_regression() {
    let mut effect = Delay::new(SAMPLE_RATE);
    effect.set_delay_time_ms(20.0); // Short delay to fit within test duration
    effect.set_feedback(0.5);
    effect.set_mix(0.5);

    // Use test signal instead of impulse for better spectral comparison
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("delay", effect, &input).expect("Delay regression test failed");
}

#[test]
fn test_reverb_regression() {
    let mut effect = Reverb::new(SAMPLE_RATE);
    effect.set_room_size(0.7);
    effect.set_decay(0.6);
    effect.set_damping(0.3);
    effect.set_predelay_ms(10.0);
    effect.set_mix(0.5);

    let input = generate_impulse(TEST_DURATION_SAMPLES);
    run_regression_test("reverb", effect, &input).expect("Reverb regression test failed");
}

#[test]
fn test_lowpass_regression() {
    let mut effect = LowPassFilter::new(SAMPLE_RATE);
    effect.set_cutoff_hz(1000.0);
    effect.set_q(2.0);

    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("lowpass", effect, &input).expect("LowPass regression test failed");
}

#[test]
fn test_phaser_regression() {
    let mut effect = Phaser::new(SAMPLE_RATE);
    effect.set_rate(1.0);
    effect.set_depth(0.8);
    effect.set_feedback(0.5);

    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("phaser", effect, &input).expect("Phaser regression test failed");
}

#[test]
fn test_flanger_regression() {
    let mut effect = Flanger::new(SAMPLE_RATE);
    effect.set_rate(0.5);
    effect.set_depth(0.7);
    effect.set_feedback(0.5);
    effect.set_mix(0.5);

    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("flanger", effect, &input).expect("Flanger regression test failed");
}

#[test]
fn test_tremolo_regression() {
    let mut effect = Tremolo::new(SAMPLE_RATE);
    effect.set_rate(5.0);
    effect.set_depth(0.8);

    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("tremolo", effect, &input).expect("Tremolo regression test failed");
}

#[test]
fn test_tape_saturation_regression() {
    let mut effect = TapeSaturation::new(SAMPLE_RATE);
    effect.set_drive(2.0);
    effect.set_saturation(0.6);

    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("tape_saturation", effect, &input)
        .expect("TapeSaturation regression test failed");
}

#[test]
fn test_clean_preamp_regression() {
    let mut effect = CleanPreamp::new(SAMPLE_RATE);
    effect.set_gain_db(12.0);
    effect.set_output_db(-6.0);

    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("clean_preamp", effect, &input)
        .expect("CleanPreamp regression test failed");
}

#[test]
fn test_multi_vibrato_regression() {
    let mut effect = MultiVibrato::new(SAMPLE_RATE);
    effect.set_depth(0.8);
    effect.set_mix(1.0);

    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("multi_vibrato", effect, &input)
        .expect("MultiVibrato regression test failed");
}

#[test]
fn test_gate_regression() {
    let mut effect = Gate::new(SAMPLE_RATE);
    effect.set_threshold_db(-30.0);
    effect.set_attack_ms(1.0);
    effect.set_release_ms(50.0);

    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("gate", effect, &input).expect("Gate regression test failed");
}

#[test]
fn test_wah_regression() {
    let mut effect = Wah::new(SAMPLE_RATE);
    effect.set_frequency(1500.0);
    effect.set_resonance(4.0);

    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("wah", effect, &input).expect("Wah regression test failed");
}

#[test]
fn test_parametric_eq_regression() {
    let mut effect = ParametricEq::new(SAMPLE_RATE);
    effect.set_low_gain(3.0);
    effect.set_mid_gain(-2.0);
    effect.set_mid_freq(1000.0);
    effect.set_high_gain(2.0);

    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("parametric_eq", effect, &input)
        .expect("ParametricEq regression test failed");
}

// Default-parameter regression tests
//
// These verify that each effect's output at factory defaults remains stable.
// Unlike the tests above (which set specific param values), these use only
// `::new(SAMPLE_RATE)` with no overrides.

#[test]
fn test_distortion_defaults_regression() {
    let effect = Distortion::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("distortion_defaults", effect, &input)
        .expect("Distortion defaults regression test failed");
}

#[test]
fn test_compressor_defaults_regression() {
    let effect = Compressor::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("compressor_defaults", effect, &input)
        .expect("Compressor defaults regression test failed");
}

#[test]
fn test_chorus_defaults_regression() {
    let effect = Chorus::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("chorus_defaults", effect, &input)
        .expect("Chorus defaults regression test failed");
}

#[test]
fn test_delay_defaults_regression() {
    let effect = Delay::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("delay_defaults", effect, &input)
        .expect("Delay defaults regression test failed");
}

#[test]
fn test_reverb_defaults_regression() {
    let effect = Reverb::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("reverb_defaults", effect, &input)
        .expect("Reverb defaults regression test failed");
}

#[test]
fn test_lowpass_defaults_regression() {
    let effect = LowPassFilter::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("lowpass_defaults", effect, &input)
        .expect("LowPass defaults regression test failed");
}

#[test]
fn test_phaser_defaults_regression() {
    let effect = Phaser::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("phaser_defaults", effect, &input)
        .expect("Phaser defaults regression test failed");
}

#[test]
fn test_flanger_defaults_regression() {
    let effect = Flanger::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("flanger_defaults", effect, &input)
        .expect("Flanger defaults regression test failed");
}

#[test]
fn test_tremolo_defaults_regression() {
    let effect = Tremolo::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("tremolo_defaults", effect, &input)
        .expect("Tremolo defaults regression test failed");
}

#[test]
fn test_tape_saturation_defaults_regression() {
    let effect = TapeSaturation::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("tape_saturation_defaults", effect, &input)
        .expect("TapeSaturation defaults regression test failed");
}

#[test]
fn test_clean_preamp_defaults_regression() {
    let effect = CleanPreamp::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("clean_preamp_defaults", effect, &input)
        .expect("CleanPreamp defaults regression test failed");
}

#[test]
fn test_multi_vibrato_defaults_regression() {
    let effect = MultiVibrato::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("multi_vibrato_defaults", effect, &input)
        .expect("MultiVibrato defaults regression test failed");
}

#[test]
fn test_gate_defaults_regression() {
    let effect = Gate::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("gate_defaults", effect, &input)
        .expect("Gate defaults regression test failed");
}

#[test]
fn test_wah_defaults_regression() {
    let effect = Wah::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("wah_defaults", effect, &input)
        .expect("Wah defaults regression test failed");
}

#[test]
fn test_parametric_eq_defaults_regression() {
    let effect = ParametricEq::new(SAMPLE_RATE);
    let input = generate_test_signal(TEST_DURATION_SAMPLES);
    run_regression_test("parametric_eq_defaults", effect, &input)
        .expect("ParametricEq defaults regression test failed");
}

// Stereo regression tests
//
// These verify that true-stereo effects produce decorrelated L/R output
// and remain stable across changes. Each test uses `process_block_stereo`
// and saves separate golden files per channel.

/// Generate a deterministic stereo test signal.
///
/// Left channel: identical to `generate_test_signal()` (440+880+1320 Hz sines).
/// Right channel: same frequencies with 90° phase offset for deterministic
/// L/R decorrelation while preserving identical spectral content.
fn generate_test_signal_stereo(size: usize) -> (Vec<f32>, Vec<f32>) {
    let left = generate_test_signal(size);
    let right = (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            let phase_offset = std::f32::consts::FRAC_PI_2;
            let fundamental = (2.0 * std::f32::consts::PI * 440.0 * t + phase_offset).sin();
            let harmonic2 = 0.3 * (2.0 * std::f32::consts::PI * 880.0 * t + phase_offset).sin();
            let harmonic3 = 0.2 * (2.0 * std::f32::consts::PI * 1320.0 * t + phase_offset).sin();
            (fundamental + harmonic2 + harmonic3) * 0.5
        })
        .collect();
    (left, right)
}

/// Normalized cross-correlation between two signals.
///
/// Returns a value in \[-1, 1\] where 1.0 means identical signals.
/// Used to verify that true-stereo effects produce decorrelated L/R output.
fn cross_correlation(a: &[f32], b: &[f32]) -> f32 {
    let ab: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let aa: f32 = a.iter().map(|x| x * x).sum();
    let bb: f32 = b.iter().map(|x| x * x).sum();
    ab / (aa.sqrt() * bb.sqrt())
}

/// Decorrelation threshold for true-stereo effects.
///
/// A cross-correlation below 0.99 between L/R outputs confirms that the
/// effect produces meaningfully different content per channel (different
/// delay taps, LFO phases, comb tunings, etc.) rather than processing
/// each channel identically.
const STEREO_DECORRELATION_THRESHOLD: f32 = 0.99;

/// Run regression test for a stereo effect.
///
/// Processes input through `process_block_stereo`, saves/loads separate golden
/// files for each channel, and verifies decorrelation between L/R outputs.
fn run_regression_test_stereo<E: Effect>(
    effect_name: &str,
    mut effect: E,
    left_in: &[f32],
    right_in: &[f32],
) -> Result<(), String> {
    let len = left_in.len();
    let mut left_out = vec![0.0; len];
    let mut right_out = vec![0.0; len];
    effect.process_block_stereo(left_in, right_in, &mut left_out, &mut right_out);

    // Sanity checks (always run, even during regeneration)
    for (ch_name, ch_out) in [("left", &left_out), ("right", &right_out)] {
        for (i, &s) in ch_out.iter().enumerate() {
            if s.is_nan() || s.is_infinite() {
                return Err(format!(
                    "{} stereo {}: NaN/Inf at sample {}",
                    effect_name, ch_name, i
                ));
            }
            if s.abs() > 10.0 {
                return Err(format!(
                    "{} stereo {}: sample {} out of bounds ({:.4})",
                    effect_name, ch_name, i, s
                ));
            }
        }
        let has_signal = ch_out.iter().any(|&s| s.abs() > 1e-6);
        if !has_signal {
            return Err(format!(
                "{} stereo {}: output is silent",
                effect_name, ch_name
            ));
        }
    }

    let left_name = format!("{}_stereo_left", effect_name);
    let right_name = format!("{}_stereo_right", effect_name);

    if should_regenerate() {
        save_golden(&left_name, &left_out)
            .map_err(|e| format!("Failed to save golden file: {}", e))?;
        save_golden(&right_name, &right_out)
            .map_err(|e| format!("Failed to save golden file: {}", e))?;
        println!("Regenerated stereo golden files for {}", effect_name);

        // Verify decorrelation even during regeneration
        let corr = cross_correlation(&left_out, &right_out);
        if corr >= STEREO_DECORRELATION_THRESHOLD {
            return Err(format!(
                "{} stereo: L/R cross-correlation {:.6} >= {} (not decorrelated)",
                effect_name, corr, STEREO_DECORRELATION_THRESHOLD
            ));
        }

        return Ok(());
    }

    // Load expected output for both channels
    let expected_left = load_golden(&left_name).map_err(|e| {
        format!(
            "Failed to load golden file for {} (run with REGENERATE_GOLDEN=1 to create): {}",
            left_name, e
        )
    })?;
    let expected_right = load_golden(&right_name).map_err(|e| {
        format!(
            "Failed to load golden file for {} (run with REGENERATE_GOLDEN=1 to create): {}",
            right_name, e
        )
    })?;

    let mut errors = Vec::new();

    // Verify both channels against golden files
    for (ch_name, output, expected) in [
        ("left", &left_out, &expected_left),
        ("right", &right_out, &expected_right),
    ] {
        if output.len() != expected.len() {
            errors.push(format!(
                "{} channel: length mismatch (got {}, expected {})",
                ch_name,
                output.len(),
                expected.len()
            ));
            continue;
        }

        let mse_val = mse(output, expected);
        let snr = snr_db(expected, output);
        let correlation = spectral_correlation(output, expected, 2048.min(output.len()));

        if mse_val > MSE_THRESHOLD {
            errors.push(format!(
                "{} channel: MSE {} exceeds threshold {}",
                ch_name, mse_val, MSE_THRESHOLD
            ));
        }
        if snr < SNR_THRESHOLD_DB && snr.is_finite() {
            errors.push(format!(
                "{} channel: SNR {:.1} dB below threshold {:.1} dB",
                ch_name, snr, SNR_THRESHOLD_DB
            ));
        }
        if correlation < SPECTRAL_CORRELATION_THRESHOLD {
            errors.push(format!(
                "{} channel: spectral correlation {:.6} below threshold {:.6}",
                ch_name, correlation, SPECTRAL_CORRELATION_THRESHOLD
            ));
        }
    }

    // Decorrelation check
    let corr = cross_correlation(&left_out, &right_out);
    if corr >= STEREO_DECORRELATION_THRESHOLD {
        errors.push(format!(
            "L/R cross-correlation {:.6} >= {} (not decorrelated)",
            corr, STEREO_DECORRELATION_THRESHOLD
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "{} stereo regression detected:\n  - {}",
            effect_name,
            errors.join("\n  - ")
        ))
    }
}

#[test]
fn test_chorus_stereo_regression() {
    let mut effect = Chorus::new(SAMPLE_RATE);
    effect.set_rate(2.0);
    effect.set_depth(0.7);
    effect.set_mix(0.5);
    let (left, right) = generate_test_signal_stereo(TEST_DURATION_SAMPLES);
    run_regression_test_stereo("chorus", effect, &left, &right)
        .expect("Chorus stereo regression test failed");
}

#[test]
fn test_reverb_stereo_regression() {
    let mut effect = Reverb::new(SAMPLE_RATE);
    effect.set_room_size(0.7);
    effect.set_decay(0.6);
    effect.set_damping(0.3);
    effect.set_predelay_ms(10.0);
    effect.set_mix(0.5);
    // Use impulse input — consistent with existing mono reverb test
    let left = generate_impulse(TEST_DURATION_SAMPLES);
    let right = generate_impulse(TEST_DURATION_SAMPLES);
    run_regression_test_stereo("reverb", effect, &left, &right)
        .expect("Reverb stereo regression test failed");
}

#[test]
fn test_delay_stereo_regression() {
    let mut effect = Delay::new(SAMPLE_RATE);
    effect.set_delay_time_ms(20.0);
    effect.set_feedback(0.5);
    effect.set_mix(0.5);
    effect.set_ping_pong(true); // Exercise cross-channel feedback path
    let (left, right) = generate_test_signal_stereo(TEST_DURATION_SAMPLES);
    run_regression_test_stereo("delay", effect, &left, &right)
        .expect("Delay stereo regression test failed");
}

#[test]
fn test_phaser_stereo_regression() {
    let mut effect = Phaser::new(SAMPLE_RATE);
    effect.set_rate(1.0);
    effect.set_depth(0.8);
    effect.set_feedback(0.5);
    let (left, right) = generate_test_signal_stereo(TEST_DURATION_SAMPLES);
    run_regression_test_stereo("phaser", effect, &left, &right)
        .expect("Phaser stereo regression test failed");
}

#[test]
fn test_flanger_stereo_regression() {
    let mut effect = Flanger::new(SAMPLE_RATE);
    effect.set_rate(0.5);
    effect.set_depth(0.7);
    effect.set_feedback(0.5);
    effect.set_mix(0.5);
    let (left, right) = generate_test_signal_stereo(TEST_DURATION_SAMPLES);
    run_regression_test_stereo("flanger", effect, &left, &right)
        .expect("Flanger stereo regression test failed");
}

/// Run all regression tests and provide summary
#[test]
fn test_regression_summary() {
    // This test just verifies the framework works
    // Individual tests above handle the actual regression checking

    let golden_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(GOLDEN_DIR);

    if !golden_dir.exists() {
        fs::create_dir_all(&golden_dir).expect("Failed to create golden directory");
    }

    println!("\nRegression test framework initialized");
    println!("Golden files directory: {:?}", golden_dir);

    if should_regenerate() {
        println!("REGENERATE_GOLDEN is set - golden files will be updated");
    } else {
        let file_count = fs::read_dir(&golden_dir)
            .map(|rd| rd.filter_map(|e| e.ok()).count())
            .unwrap_or(0);
        println!("Found {} golden files", file_count);
    }
}
