//! Drum machine source: a step sequencer driving a bank of synthesized
//! percussion voices.
//!
//! Timing comes from [`fretgraph_core::TempoManager`] at sixteenth-note
//! resolution (four sub-steps per beat). A pattern is an ordered list of
//! hits addressed by `(bar, beat, sub_step)`; every sub-step boundary
//! crossing looks up the hits scheduled there and triggers one voice per
//! hit. A voice is nothing more than a pre-rendered sample buffer and a
//! read cursor — the same shape a sampled/SoundFont voice would have, so
//! swapping the sound source later only means swapping what fills the
//! buffer, not how it's played back. This implementation fills the buffer
//! with a short synthesized noise/tone burst per sound slot; it does not
//! read SoundFont 2 files.
//!
//! Odd-numbered sub-steps are delayed by the swing amount before
//! triggering, giving the classic "swung sixteenths" feel. Hits marked as
//! accents get a velocity boost. An optional count-in clicks on every beat
//! for a configurable number of bars before the pattern itself starts.

use fretgraph_core::{Effect, NoteDivision, ParamDescriptor, ParamFlags, ParamId, ParamUnit, TempoManager};

/// Sub-step resolution: sixteenth notes (4 per quarter-note beat).
const STEPS_PER_BEAT: u32 = 4;
/// Beats per bar (4/4 time, per [`TempoManager::bar_position`]).
const BEATS_PER_BAR: u32 = 4;
/// Steps per bar at sixteenth-note resolution.
const STEPS_PER_BAR: u32 = STEPS_PER_BEAT * BEATS_PER_BAR;

/// Maximum simultaneously-sounding voices. Generous for a drum pattern;
/// exceeding it silently drops the oldest voice rather than allocating.
const MAX_VOICES: usize = 32;
/// Maximum hits awaiting their swung trigger time at once.
const MAX_PENDING: usize = 16;

/// Synthesized percussion sound slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrumSound {
    Kick,
    Snare,
    ClosedHat,
    OpenHat,
    Clap,
    Tom,
}

/// Number of distinct sound slots.
pub const NUM_SOUNDS: usize = 6;

impl DrumSound {
    const ALL: [DrumSound; NUM_SOUNDS] = [
        DrumSound::Kick,
        DrumSound::Snare,
        DrumSound::ClosedHat,
        DrumSound::OpenHat,
        DrumSound::Clap,
        DrumSound::Tom,
    ];

    fn slot(self) -> usize {
        match self {
            DrumSound::Kick => 0,
            DrumSound::Snare => 1,
            DrumSound::ClosedHat => 2,
            DrumSound::OpenHat => 3,
            DrumSound::Clap => 4,
            DrumSound::Tom => 5,
        }
    }
}

/// One scheduled hit in a pattern: "play `sound` at `(bar, beat, sub_step)`
/// with `velocity`/`pan`, optionally accented."
#[derive(Clone, Copy, Debug)]
pub struct Hit {
    pub bar: u8,
    pub beat: u8,
    pub sub_step: u8,
    pub sound: DrumSound,
    pub velocity: u8,
    pub accent: bool,
    pub pan: f32,
}

const fn hit(bar: u8, beat: u8, sub_step: u8, sound: DrumSound, velocity: u8, accent: bool, pan: f32) -> Hit {
    Hit { bar, beat, sub_step, sound, velocity, accent, pan }
}

/// A basic one-bar rock beat: kick on 1 and 3, snare on 2 and 4, closed
/// hats on every eighth note.
const PATTERN_BASIC_ROCK: &[Hit] = &[
    hit(0, 0, 0, DrumSound::Kick, 110, true, 0.0),
    hit(0, 0, 0, DrumSound::ClosedHat, 80, false, 0.0),
    hit(0, 0, 2, DrumSound::ClosedHat, 70, false, 0.0),
    hit(0, 1, 0, DrumSound::Snare, 115, true, 0.0),
    hit(0, 1, 0, DrumSound::ClosedHat, 80, false, 0.0),
    hit(0, 1, 2, DrumSound::ClosedHat, 70, false, 0.0),
    hit(0, 2, 0, DrumSound::Kick, 105, false, 0.0),
    hit(0, 2, 0, DrumSound::ClosedHat, 80, false, 0.0),
    hit(0, 2, 2, DrumSound::ClosedHat, 70, false, 0.0),
    hit(0, 2, 2, DrumSound::Kick, 90, false, 0.0),
    hit(0, 3, 0, DrumSound::Snare, 115, true, 0.0),
    hit(0, 3, 0, DrumSound::ClosedHat, 80, false, 0.0),
    hit(0, 3, 2, DrumSound::OpenHat, 85, false, 0.0),
];

/// A four-on-the-floor dance pattern: kick every beat, clap on 2 and 4,
/// open hat on the off-beats.
const PATTERN_FOUR_ON_FLOOR: &[Hit] = &[
    hit(0, 0, 0, DrumSound::Kick, 120, true, 0.0),
    hit(0, 1, 0, DrumSound::Kick, 110, false, 0.0),
    hit(0, 1, 0, DrumSound::Clap, 110, true, 0.0),
    hit(0, 2, 0, DrumSound::Kick, 115, false, 0.0),
    hit(0, 3, 0, DrumSound::Kick, 110, false, 0.0),
    hit(0, 3, 0, DrumSound::Clap, 110, true, 0.0),
    hit(0, 0, 2, DrumSound::OpenHat, 75, false, 0.2),
    hit(0, 1, 2, DrumSound::OpenHat, 75, false, -0.2),
    hit(0, 2, 2, DrumSound::OpenHat, 75, false, 0.2),
    hit(0, 3, 2, DrumSound::OpenHat, 75, false, -0.2),
];

/// A sparse hip-hop style pattern with a tom fill on the last sub-step.
const PATTERN_SPARSE: &[Hit] = &[
    hit(0, 0, 0, DrumSound::Kick, 120, true, 0.0),
    hit(0, 1, 2, DrumSound::Snare, 100, false, 0.0),
    hit(0, 2, 2, DrumSound::Kick, 115, false, 0.0),
    hit(0, 3, 0, DrumSound::Snare, 118, true, 0.0),
    hit(0, 0, 1, DrumSound::ClosedHat, 60, false, 0.0),
    hit(0, 1, 1, DrumSound::ClosedHat, 60, false, 0.0),
    hit(0, 2, 1, DrumSound::ClosedHat, 60, false, 0.0),
    hit(0, 3, 3, DrumSound::Tom, 95, false, -0.3),
];

const BUILTIN_PATTERNS: &[&[Hit]] = &[PATTERN_BASIC_ROCK, PATTERN_FOUR_ON_FLOOR, PATTERN_SPARSE];
const PATTERN_NAMES: &[&str] = &["Basic Rock", "Four on Floor", "Sparse"];

/// One voice: a shared pre-rendered sample buffer and a read cursor.
///
/// Deliberately dumb — it knows nothing about how the buffer was produced.
/// A future sampled/SoundFont source would fill the same buffer shape and
/// reuse this exact playback code.
struct Voice {
    buffer_slot: usize,
    cursor: usize,
    gain: f32,
    pan: f32,
}

/// Fills per-sound sample buffers with short synthesized bursts.
///
/// The extension point for a sampled/SoundFont 2 source: anything that can
/// produce `[Vec<f32>; NUM_SOUNDS]` mono burst buffers at a given sample
/// rate can replace [`SynthesizedSoundBank::render`] without touching the
/// sequencer or voice playback below.
struct SynthesizedSoundBank {
    buffers: [Vec<f32>; NUM_SOUNDS],
}

impl SynthesizedSoundBank {
    fn render(sample_rate: f32) -> Self {
        let mut noise_state: u32 = 0x1234_5678;
        let mut next_noise = move || -> f32 {
            noise_state ^= noise_state << 13;
            noise_state ^= noise_state >> 17;
            noise_state ^= noise_state << 5;
            (noise_state as i32 as f32) / (i32::MAX as f32)
        };

        let mut buffers: [Vec<f32>; NUM_SOUNDS] = Default::default();
        for sound in DrumSound::ALL {
            buffers[sound.slot()] = match sound {
                DrumSound::Kick => Self::tone_burst(sample_rate, 150.0, 50.0, 0.09, &mut next_noise, 0.08),
                DrumSound::Snare => Self::tone_burst(sample_rate, 200.0, 180.0, 0.12, &mut next_noise, 0.6),
                DrumSound::ClosedHat => Self::noise_burst(sample_rate, 0.04, &mut next_noise, true),
                DrumSound::OpenHat => Self::noise_burst(sample_rate, 0.28, &mut next_noise, true),
                DrumSound::Clap => Self::clap_burst(sample_rate, &mut next_noise),
                DrumSound::Tom => Self::tone_burst(sample_rate, 160.0, 90.0, 0.2, &mut next_noise, 0.1),
            };
        }
        Self { buffers }
    }

    /// A pitch-swept sine with exponential decay, plus a touch of noise at
    /// the attack for a percussive click (kick, tom, and the tonal part of
    /// the snare).
    fn tone_burst(
        sample_rate: f32,
        start_hz: f32,
        end_hz: f32,
        duration_s: f32,
        noise: &mut impl FnMut() -> f32,
        noise_mix: f32,
    ) -> Vec<f32> {
        let len = (duration_s * sample_rate) as usize;
        let mut out = Vec::with_capacity(len);
        let tau = duration_s / 5.0;
        let mut phase = 0.0f32;
        for i in 0..len {
            let t = i as f32 / sample_rate;
            let sweep = start_hz + (end_hz - start_hz) * (t / duration_s).min(1.0);
            phase += sweep / sample_rate;
            let envelope = libm::expf(-t / tau);
            let tone = libm::sinf(2.0 * core::f32::consts::PI * phase);
            let attack_noise = noise() * libm::expf(-t / (tau * 0.3));
            out.push((tone * (1.0 - noise_mix) + attack_noise * noise_mix) * envelope);
        }
        out
    }

    /// Band-shaped noise burst (closed/open hat): white noise through a
    /// one-pole highpass, exponential decay.
    fn noise_burst(sample_rate: f32, duration_s: f32, noise: &mut impl FnMut() -> f32, highpass: bool) -> Vec<f32> {
        let len = (duration_s * sample_rate) as usize;
        let mut out = Vec::with_capacity(len);
        let tau = duration_s / 4.0;
        let mut prev = 0.0f32;
        for i in 0..len {
            let t = i as f32 / sample_rate;
            let raw = noise();
            let shaped = if highpass {
                let hp = raw - prev;
                prev = raw;
                hp
            } else {
                raw
            };
            out.push(shaped * libm::expf(-t / tau));
        }
        out
    }

    /// Three short noise bursts in quick succession, the classic hand-clap
    /// "flam" shape.
    fn clap_burst(sample_rate: f32, noise: &mut impl FnMut() -> f32) -> Vec<f32> {
        const LAYERS: usize = 3;
        const LAYER_GAP_S: f32 = 0.01;
        const LAYER_DUR_S: f32 = 0.05;
        const TAIL_DUR_S: f32 = 0.15;
        let total_s = LAYER_GAP_S * (LAYERS - 1) as f32 + TAIL_DUR_S;
        let len = (total_s * sample_rate) as usize;
        let mut out = vec![0.0f32; len];
        for layer in 0..LAYERS {
            let start = ((layer as f32 * LAYER_GAP_S) * sample_rate) as usize;
            let layer_len = (LAYER_DUR_S * sample_rate) as usize;
            for i in 0..layer_len {
                let idx = start + i;
                if idx >= out.len() {
                    break;
                }
                let t = i as f32 / sample_rate;
                out[idx] += noise() * libm::expf(-t / (LAYER_DUR_S / 3.0));
            }
        }
        // Longer, quieter tail after the flam layers settle.
        let tail_start = ((LAYERS - 1) as f32 * LAYER_GAP_S * sample_rate) as usize;
        for (i, sample) in out.iter_mut().enumerate().skip(tail_start) {
            let t = (i - tail_start) as f32 / sample_rate;
            *sample += noise() * 0.4 * libm::expf(-t / (TAIL_DUR_S / 3.0));
        }
        out
    }

    fn buffer(&self, slot: usize) -> &[f32] {
        &self.buffers[slot]
    }
}

/// A hit waiting for its swung trigger time.
#[derive(Clone, Copy)]
struct Pending {
    countdown: u32,
    sound: DrumSound,
    velocity: u8,
    accent: bool,
    pan: f32,
}

/// Step sequencer drum machine source (spec component "Drum machine
/// source").
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Tempo | 40–300 BPM | 120.0 |
/// | 1 | Pattern | 0–2 (choice) | 0 |
/// | 2 | Swing | 0–75% | 0.0 |
/// | 3 | Accent | 100–200% | 130.0 |
/// | 4 | Count-in | 0–4 bars | 0 |
/// | 5 | Play | 0/1 | 0 |
/// | 6 | Output | -20.0–20.0 dB | 0.0 |
pub struct DrumMachine {
    sample_rate: f32,
    sounds: SynthesizedSoundBank,
    tempo: TempoManager,

    pattern_index: usize,
    swing: f32,
    accent_mult: f32,
    count_in_bars: u32,

    voices: Vec<Voice>,
    pending: Vec<Pending>,

    last_step: i64,
    count_in_steps_remaining: u32,

    output_level: fretgraph_core::SmoothedParam,
}

impl DrumMachine {
    /// Creates a new drum machine at the given sample rate, with the
    /// "Basic Rock" pattern loaded and transport stopped.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            sounds: SynthesizedSoundBank::render(sample_rate),
            tempo: TempoManager::new(sample_rate, 120.0),
            pattern_index: 0,
            swing: 0.0,
            accent_mult: 1.3,
            count_in_bars: 0,
            voices: Vec::with_capacity(MAX_VOICES),
            pending: Vec::with_capacity(MAX_PENDING),
            last_step: -1,
            count_in_steps_remaining: 0,
            output_level: fretgraph_core::gain::output_level_param(sample_rate),
        }
    }

    fn current_pattern(&self) -> &'static [Hit] {
        BUILTIN_PATTERNS[self.pattern_index]
    }

    /// Selects a built-in pattern by index, clamped to the available set.
    pub fn set_pattern_index(&mut self, index: u32) {
        self.pattern_index = (index as usize).min(BUILTIN_PATTERNS.len() - 1);
    }

    pub fn pattern_index(&self) -> u32 {
        self.pattern_index as u32
    }

    /// Display name of the currently selected built-in pattern.
    pub fn pattern_name(&self) -> &'static str {
        PATTERN_NAMES[self.pattern_index]
    }

    pub fn set_bpm(&mut self, bpm: f32) {
        self.tempo.set_bpm(bpm.clamp(40.0, 300.0));
    }

    pub fn bpm(&self) -> f32 {
        self.tempo.bpm()
    }

    pub fn set_swing(&mut self, amount: f32) {
        self.swing = amount.clamp(0.0, 0.75);
    }

    pub fn swing(&self) -> f32 {
        self.swing
    }

    pub fn set_accent_mult(&mut self, mult: f32) {
        self.accent_mult = mult.clamp(1.0, 2.0);
    }

    pub fn accent_mult(&self) -> f32 {
        self.accent_mult
    }

    pub fn set_count_in_bars(&mut self, bars: u32) {
        self.count_in_bars = bars.min(4);
    }

    pub fn count_in_bars(&self) -> u32 {
        self.count_in_bars
    }

    /// Starts playback. If a count-in is configured, it plays before the
    /// first pattern step.
    pub fn play(&mut self) {
        if self.tempo.is_playing() {
            return;
        }
        self.tempo.play();
        self.last_step = -1;
        self.count_in_steps_remaining = self.count_in_bars * STEPS_PER_BAR;
    }

    /// Stops playback, silencing all active voices.
    pub fn stop(&mut self) {
        self.tempo.stop();
        self.voices.clear();
        self.pending.clear();
    }

    pub fn is_playing(&self) -> bool {
        self.tempo.is_playing()
    }

    fn trigger_step(&mut self, absolute_step: i64) {
        let absolute_step = absolute_step.max(0) as u64;

        if self.count_in_steps_remaining > 0 {
            self.count_in_steps_remaining -= 1;
            if absolute_step % STEPS_PER_BEAT as u64 == 0 {
                self.enqueue(DrumSound::ClosedHat, 90, false, 0.0, 0);
            }
            return;
        }

        let pattern_step = absolute_step % STEPS_PER_BAR as u64;
        let bar = (pattern_step / STEPS_PER_BAR as u64) as u8;
        let beat = (pattern_step / STEPS_PER_BEAT as u64) as u8;
        let sub_step = (pattern_step % STEPS_PER_BEAT as u64) as u8;

        let step_samples = self.tempo.division_to_samples(NoteDivision::Sixteenth);
        let swing_delay = if sub_step % 2 == 1 { (self.swing * step_samples) as u32 } else { 0 };

        for h in self.current_pattern() {
            if h.bar == bar && h.beat == beat && h.sub_step == sub_step {
                self.enqueue(h.sound, h.velocity, h.accent, h.pan, swing_delay);
            }
        }
    }

    fn enqueue(&mut self, sound: DrumSound, velocity: u8, accent: bool, pan: f32, countdown: u32) {
        if self.pending.len() >= MAX_PENDING {
            self.pending.remove(0);
        }
        self.pending.push(Pending { countdown, sound, velocity, accent, pan });
    }

    fn spawn_voice(&mut self, sound: DrumSound, velocity: u8, accent: bool, pan: f32) {
        let velocity_gain = (velocity as f32 / 127.0).clamp(0.0, 1.0);
        let accented_gain = if accent { velocity_gain * self.accent_mult } else { velocity_gain };
        if self.voices.len() >= MAX_VOICES {
            self.voices.remove(0);
        }
        self.voices.push(Voice {
            buffer_slot: sound.slot(),
            cursor: 0,
            gain: accented_gain.min(1.5),
            pan: pan.clamp(-1.0, 1.0),
        });
    }

    fn advance_pending(&mut self) {
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].countdown == 0 {
                let p = self.pending.remove(i);
                self.spawn_voice(p.sound, p.velocity, p.accent, p.pan);
            } else {
                self.pending[i].countdown -= 1;
                i += 1;
            }
        }
    }

    /// Advances the sequencer and all active voices by one sample,
    /// returning the mixed stereo output.
    fn tick(&mut self) -> (f32, f32) {
        if self.tempo.is_playing() {
            self.tempo.advance();
            let beat_pos = self.tempo.beat_position();
            let abs_step = libm::floorf(beat_pos * STEPS_PER_BEAT as f32) as i64;
            while abs_step > self.last_step {
                self.last_step += 1;
                self.trigger_step(self.last_step);
            }
        }

        self.advance_pending();

        let mut out_l = 0.0f32;
        let mut out_r = 0.0f32;
        let mut i = 0;
        while i < self.voices.len() {
            let finished = {
                let voice = &mut self.voices[i];
                let buffer = self.sounds.buffer(voice.buffer_slot);
                if voice.cursor >= buffer.len() {
                    true
                } else {
                    let sample = buffer[voice.cursor] * voice.gain;
                    voice.cursor += 1;
                    let (lg, rg) = pan_gains(voice.pan);
                    out_l += sample * lg;
                    out_r += sample * rg;
                    false
                }
            };
            if finished {
                self.voices.swap_remove(i);
            } else {
                i += 1;
            }
        }

        let gain = self.output_level.advance();
        (out_l * gain, out_r * gain)
    }
}

/// Equal-power-ish pan law: linear crossfade, cheap and adequate for short
/// percussive bursts.
fn pan_gains(pan: f32) -> (f32, f32) {
    let pan = pan.clamp(-1.0, 1.0);
    ((1.0 - pan).min(1.0).max(0.0), (1.0 + pan).min(1.0).max(0.0))
}

impl Default for DrumMachine {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Effect for DrumMachine {
    fn process(&mut self, _input: f32) -> f32 {
        let (l, r) = self.tick();
        (l + r) * 0.5
    }

    fn process_stereo(&mut self, _left: f32, _right: f32) -> (f32, f32) {
        self.tick()
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.tempo.set_sample_rate(sample_rate);
        self.sounds = SynthesizedSoundBank::render(sample_rate);
        self.output_level.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.voices.clear();
        self.pending.clear();
        self.last_step = -1;
        self.tempo.reset();
        self.output_level.snap_to_target();
    }

    fn prepare(&mut self, sample_rate: f32, _max_frames: usize) {
        self.set_sample_rate(sample_rate);
    }
}

fretgraph_core::impl_params! {
    DrumMachine, this {
        [0] ParamDescriptor::custom("Tempo", "BPM", 40.0, 300.0, 120.0)
                .with_unit(ParamUnit::None)
                .with_id(ParamId(2100), "drum_bpm"),
            get: this.bpm(),
            set: |v| this.set_bpm(v);

        [1] ParamDescriptor::custom("Pattern", "Pat", 0.0, (BUILTIN_PATTERNS.len() - 1) as f32, 0.0)
                .with_step(1.0)
                .with_id(ParamId(2101), "drum_pattern")
                .with_flags(ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED))
                .with_step_labels(PATTERN_NAMES),
            get: this.pattern_index() as f32,
            set: |v| this.set_pattern_index(v.round().max(0.0) as u32);

        [2] ParamDescriptor::custom("Swing", "Swing", 0.0, 75.0, 0.0)
                .with_unit(ParamUnit::Percent)
                .with_id(ParamId(2102), "drum_swing"),
            get: this.swing() * 100.0,
            set: |v| this.set_swing(v / 100.0);

        [3] ParamDescriptor::custom("Accent", "Accent", 100.0, 200.0, 130.0)
                .with_unit(ParamUnit::Percent)
                .with_id(ParamId(2103), "drum_accent"),
            get: this.accent_mult() * 100.0,
            set: |v| this.set_accent_mult(v / 100.0);

        [4] ParamDescriptor::custom("Count-in", "CntIn", 0.0, 4.0, 0.0)
                .with_step(1.0)
                .with_id(ParamId(2104), "drum_count_in")
                .with_flags(ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED)),
            get: this.count_in_bars() as f32,
            set: |v| this.set_count_in_bars(v.round().max(0.0) as u32);

        [5] ParamDescriptor::custom("Play", "Play", 0.0, 1.0, 0.0)
                .with_step(1.0)
                .with_id(ParamId(2105), "drum_play")
                .with_flags(ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED))
                .with_step_labels(&["Stop", "Play"]),
            get: if this.is_playing() { 1.0 } else { 0.0 },
            set: |v| if v >= 0.5 { this.play() } else { this.stop() };

        [6] fretgraph_core::gain::output_param_descriptor()
                .with_id(ParamId(2106), "drum_output"),
            get: fretgraph_core::gain::output_level_db(&this.output_level),
            set: |v| fretgraph_core::gain::set_output_level_db(&mut this.output_level, v);
    }
}
