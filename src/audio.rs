//! Procedural audio cues
//!
//! Sound effects are generated as raw PCM from oscillator math - no external
//! files needed. Waveform generation is pure; playback belongs to an
//! `AudioSink` collaborator. Cue rate limiting lives in `CueCooldowns`.

use std::f32::consts::TAU;
use std::io::Cursor;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use rodio::{Decoder, Source};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::Settings;

/// Frames in the placeholder used when an asset cannot be loaded
pub const SILENT_FRAMES: usize = 250;
/// Upper bound on the collision buzz so it reads as an event, not a tone
pub const MAX_COLLISION_SECS: f32 = 0.14;

/// Audio cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CueKind {
    /// Beeping tone, louder near the exit
    Proximity,
    /// Harsh buzz when walking into a wall
    Collision,
    /// Chord on level completion
    Completion,
}

impl CueKind {
    pub const ALL: [CueKind; 3] = [CueKind::Proximity, CueKind::Collision, CueKind::Completion];

    fn index(self) -> usize {
        match self {
            CueKind::Proximity => 0,
            CueKind::Collision => 1,
            CueKind::Completion => 2,
        }
    }
}

/// A request to play a cue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CueRequest {
    pub kind: CueKind,
    /// Target volume (0.0 - 1.0)
    pub volume: f32,
    /// Stereo balance (-1.0 left .. 1.0 right)
    pub pan: f32,
}

impl CueRequest {
    pub fn new(kind: CueKind, volume: f32) -> Self {
        Self {
            kind,
            volume: volume.clamp(0.0, 1.0),
            pan: 0.0,
        }
    }

    pub fn with_pan(mut self, pan: f32) -> Self {
        self.pan = pan.clamp(-1.0, 1.0);
        self
    }
}

/// Proximity volume: 1 at the exit, fading linearly to 0 at `threshold`
pub fn proximity_volume(distance: f32, threshold: f32) -> f32 {
    if threshold <= 0.0 {
        return 0.0;
    }
    1.0 - (distance / threshold).clamp(0.0, 1.0)
}

/// Independent per-kind retrigger cooldowns, counted in ticks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueCooldowns {
    periods: [u32; 3],
    remaining: [u32; 3],
}

impl CueCooldowns {
    pub fn new(proximity: u32, collision: u32, completion: u32) -> Self {
        Self {
            periods: [proximity, collision, completion],
            remaining: [0; 3],
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.proximity_cooldown_ticks,
            settings.collision_cooldown_ticks,
            settings.completion_cooldown_ticks,
        )
    }

    /// Count every cooldown down by one tick
    pub fn tick(&mut self) {
        for remaining in &mut self.remaining {
            *remaining = remaining.saturating_sub(1);
        }
    }

    pub fn ready(&self, kind: CueKind) -> bool {
        self.remaining[kind.index()] == 0
    }

    pub fn remaining(&self, kind: CueKind) -> u32 {
        self.remaining[kind.index()]
    }

    /// Fire `kind` if its cooldown has elapsed, restarting the cooldown
    pub fn try_fire(&mut self, kind: CueKind) -> bool {
        let i = kind.index();
        if self.remaining[i] > 0 {
            return false;
        }
        self.remaining[i] = self.periods[i];
        true
    }

    /// Clear all pending cooldowns (level transition)
    pub fn reset(&mut self) {
        self.remaining = [0; 3];
    }
}

/// One stereo frame of 16-bit signed samples
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct StereoFrame {
    pub left: i16,
    pub right: i16,
}

impl StereoFrame {
    pub const SILENT: StereoFrame = StereoFrame { left: 0, right: 0 };
}

/// Interleaved stereo PCM at a fixed sample rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    pub sample_rate: u32,
    pub frames: Vec<StereoFrame>,
}

impl PcmBuffer {
    pub fn silence(sample_rate: u32, frames: usize) -> Self {
        Self {
            sample_rate,
            frames: vec![StereoFrame::SILENT; frames],
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        self.frames.len() as f32 / self.sample_rate.max(1) as f32
    }

    pub fn is_silent(&self) -> bool {
        self.frames.iter().all(|f| *f == StereoFrame::SILENT)
    }

    /// Peak absolute sample value across both channels
    pub fn peak(&self) -> i16 {
        self.frames
            .iter()
            .map(|f| f.left.saturating_abs().max(f.right.saturating_abs()))
            .max()
            .unwrap_or(0)
    }

    /// Little-endian interleaved bytes, ready for an output device
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.frames)
    }

    /// Copy of the buffer with balance gains applied for `pan`
    pub fn panned(&self, pan: f32) -> Self {
        let (left_gain, right_gain) = balance(pan);
        let scale = |s: i16, gain: f32| (s as f32 * gain).round() as i16;
        Self {
            sample_rate: self.sample_rate,
            frames: self
                .frames
                .iter()
                .map(|f| StereoFrame {
                    left: scale(f.left, left_gain),
                    right: scale(f.right, right_gain),
                })
                .collect(),
        }
    }

    /// Decode a mono or stereo WAV
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, AudioError> {
        let decoder = Decoder::new(Cursor::new(bytes.to_vec()))
            .map_err(|e| AudioError::Format(e.to_string()))?;
        let channels = u16::from(decoder.channels());
        let sample_rate = u32::from(decoder.sample_rate());
        if !(channels == 1 || channels == 2) || sample_rate == 0 {
            return Err(AudioError::Unsupported { channels, sample_rate });
        }

        let samples: Vec<i16> = decoder.map(from_f32).collect();
        let frames = if channels == 1 {
            samples
                .iter()
                .map(|&s| StereoFrame { left: s, right: s })
                .collect()
        } else {
            samples
                .chunks_exact(2)
                .map(|s| StereoFrame {
                    left: s[0],
                    right: s[1],
                })
                .collect()
        };
        Ok(Self {
            sample_rate,
            frames,
        })
    }
}

/// Asset decoding problems
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("could not read sound asset: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed WAV: {0}")]
    Format(String),
    #[error("unsupported WAV layout: {channels} channel(s) at {sample_rate} Hz")]
    Unsupported { channels: u16, sample_rate: u32 },
}

/// Load a WAV asset, substituting a short silent buffer on any failure
pub fn load_asset_or_silence(path: &Path, sample_rate: u32) -> PcmBuffer {
    let loaded = std::fs::read(path)
        .map_err(AudioError::from)
        .and_then(|bytes| PcmBuffer::from_wav_bytes(&bytes));
    match loaded {
        Ok(buffer) => {
            log::info!("Loaded sound asset {} ({:.2}s)", path.display(), buffer.duration_secs());
            buffer
        }
        Err(e) => {
            log::warn!("{} unavailable ({e}) - using a silent sound", path.display());
            PcmBuffer::silence(sample_rate, SILENT_FRAMES)
        }
    }
}

/// Oscillator parameters for one cue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthParams {
    /// Carrier (or chord root) frequency in Hz
    pub frequency: f32,
    /// Secondary modulator frequency in Hz (collision buzz)
    pub modulator: f32,
    /// On/off gate rate in Hz; 0 for a continuous tone
    pub pulse_rate: f32,
    /// Share of each pulse period that sounds (0.0 - 1.0)
    pub pulse_duty: f32,
    pub duration_secs: f32,
    pub sample_rate: u32,
    /// Peak amplitude of the float waveform (0.0 - 1.0)
    pub amplitude: f32,
    /// Stereo balance (-1.0 left .. 1.0 right)
    pub pan: f32,
}

impl SynthParams {
    /// Stock parameters for each cue kind
    pub fn for_kind(kind: CueKind, sample_rate: u32) -> Self {
        let base = Self {
            frequency: 440.0,
            modulator: 0.0,
            pulse_rate: 0.0,
            pulse_duty: 0.5,
            duration_secs: 0.5,
            sample_rate,
            amplitude: 0.5,
            pan: 0.0,
        };
        match kind {
            CueKind::Proximity => Self {
                frequency: 440.0,
                pulse_rate: 8.0,
                duration_secs: 0.25,
                amplitude: 0.45,
                ..base
            },
            CueKind::Collision => Self {
                frequency: 90.0,
                modulator: 1800.0,
                duration_secs: 0.12,
                amplitude: 0.6,
                ..base
            },
            // C5 major triad root
            CueKind::Completion => Self {
                frequency: 523.25,
                duration_secs: 1.2,
                amplitude: 0.5,
                ..base
            },
        }
    }
}

/// Just-intonation major triad used for the completion chord
const COMPLETION_CHORD: [f32; 3] = [1.0, 5.0 / 4.0, 3.0 / 2.0];
/// Fade in/out length that keeps tone edges click-free
const EDGE_FADE_SECS: f32 = 0.005;

/// Render a cue to stereo PCM. Pure: same inputs, same samples.
pub fn synthesize(kind: CueKind, params: &SynthParams) -> PcmBuffer {
    let rate = params.sample_rate.max(1) as f32;
    let duration = match kind {
        CueKind::Collision => params.duration_secs.min(MAX_COLLISION_SECS),
        _ => params.duration_secs,
    }
    .max(0.0);
    let frame_count = (duration * rate).round() as usize;
    let (left_gain, right_gain) = balance(params.pan);
    let amplitude = params.amplitude.clamp(0.0, 1.0);

    let frames = (0..frame_count)
        .map(|i| {
            let t = i as f32 / rate;
            let sample = match kind {
                CueKind::Proximity => proximity_wave(params, t, duration),
                CueKind::Collision => collision_wave(params, t, duration),
                CueKind::Completion => completion_wave(params, t, duration),
            } * amplitude;
            StereoFrame {
                left: to_i16(sample * left_gain),
                right: to_i16(sample * right_gain),
            }
        })
        .collect();

    PcmBuffer {
        sample_rate: params.sample_rate,
        frames,
    }
}

/// Sine carrier gated by a square pulse
fn proximity_wave(params: &SynthParams, t: f32, duration: f32) -> f32 {
    let gate = if params.pulse_rate > 0.0 {
        if (t * params.pulse_rate).fract() < params.pulse_duty {
            1.0
        } else {
            0.0
        }
    } else {
        1.0
    };
    (TAU * params.frequency * t).sin() * gate * edge_fade(t, duration)
}

/// Low carrier ring-modulated by a much higher tone, decaying fast
fn collision_wave(params: &SynthParams, t: f32, duration: f32) -> f32 {
    let carrier = (TAU * params.frequency * t).sin();
    let modulator = (TAU * params.modulator * t).sin();
    // Exponential fall to 1% over the cue, like a struck surface
    let decay = if duration > 0.0 {
        (0.01f32.ln() * t / duration).exp()
    } else {
        0.0
    };
    carrier * modulator * decay * edge_fade(t, duration)
}

/// Major triad with a linear release
fn completion_wave(params: &SynthParams, t: f32, duration: f32) -> f32 {
    let chord: f32 = COMPLETION_CHORD
        .iter()
        .map(|ratio| (TAU * params.frequency * ratio * t).sin())
        .sum::<f32>()
        / COMPLETION_CHORD.len() as f32;
    let release = if duration > 0.0 { 1.0 - t / duration } else { 0.0 };
    chord * release * edge_fade(t, duration)
}

/// Short linear ramps at both ends of a tone
fn edge_fade(t: f32, duration: f32) -> f32 {
    let fade = EDGE_FADE_SECS.min(duration / 2.0);
    if fade <= 0.0 {
        return 1.0;
    }
    (t / fade).min((duration - t) / fade).clamp(0.0, 1.0)
}

/// Channel gains for a balance in [-1, 1]; centre keeps both channels at unity
fn balance(pan: f32) -> (f32, f32) {
    let pan = pan.clamp(-1.0, 1.0);
    ((1.0 - pan).min(1.0), (1.0 + pan).min(1.0))
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Decoded samples are full scale at +-1.0
fn from_f32(sample: f32) -> i16 {
    (sample * 32_768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Renders cue requests to PCM using the configured voices
#[derive(Debug, Clone)]
pub struct AudioSynthesizer {
    sample_rate: u32,
    rng: Pcg32,
    /// Carrier range the proximity beep is drawn from
    proximity_hz: (f32, f32),
    /// Loaded asset replacing the synthesized proximity tone
    proximity_override: Option<PcmBuffer>,
}

impl AudioSynthesizer {
    pub fn new(sample_rate: u32, seed: u64) -> Self {
        Self {
            sample_rate,
            rng: Pcg32::seed_from_u64(seed),
            proximity_hz: (392.0, 523.25),
            proximity_override: None,
        }
    }

    pub fn from_settings(settings: &Settings, seed: u64) -> Self {
        let mut synth = Self::new(settings.sample_rate, seed);
        if let Some(path) = &settings.proximity_asset {
            synth.proximity_override = Some(load_asset_or_silence(path, settings.sample_rate));
        }
        synth
    }

    pub fn with_proximity_range(mut self, min_hz: f32, max_hz: f32) -> Self {
        self.proximity_hz = (min_hz.min(max_hz), min_hz.max(max_hz));
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// PCM for `request`. The request's volume is applied by the sink, not baked in.
    pub fn render(&mut self, request: &CueRequest) -> PcmBuffer {
        if request.kind == CueKind::Proximity {
            if let Some(buffer) = &self.proximity_override {
                return buffer.panned(request.pan);
            }
        }
        let mut params = SynthParams::for_kind(request.kind, self.sample_rate);
        params.pan = request.pan;
        if request.kind == CueKind::Proximity {
            let (lo, hi) = self.proximity_hz;
            params.frequency = if hi > lo { self.rng.random_range(lo..hi) } else { lo };
        }
        synthesize(request.kind, &params)
    }
}
