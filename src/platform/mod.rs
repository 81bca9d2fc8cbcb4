//! Platform abstraction layer
//!
//! The game talks to the outside world through two traits:
//! - `InputSource`: one `TickInput` per simulation tick
//! - `AudioSink`: plays rendered cue buffers
//!
//! Windowed front ends implement these over their own event loop and mixer.
//! The implementations here are headless.

use std::collections::VecDeque;

use crate::audio::PcmBuffer;
use crate::sim::TickInput;

/// Supplies player input, polled once per tick
pub trait InputSource {
    fn poll(&mut self) -> TickInput;
}

impl<F: FnMut() -> TickInput> InputSource for F {
    fn poll(&mut self) -> TickInput {
        self()
    }
}

/// Demo input: the autopilot plays every tick
#[derive(Debug, Default, Clone, Copy)]
pub struct AutopilotInput;

impl InputSource for AutopilotInput {
    fn poll(&mut self) -> TickInput {
        TickInput::autopilot()
    }
}

/// Replays a fixed list of inputs, then asks to quit
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    script: VecDeque<TickInput>,
}

impl ScriptedInput {
    pub fn new(script: impl IntoIterator<Item = TickInput>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> TickInput {
        self.script.pop_front().unwrap_or_else(TickInput::quit)
    }
}

/// Plays PCM buffers
pub trait AudioSink {
    /// Queue `buffer` at `volume` (0.0 - 1.0). The buffer is already panned;
    /// `pan` is passed along for sinks that position sounds themselves.
    fn submit(&mut self, buffer: &PcmBuffer, volume: f32, pan: f32);

    /// Silence everything that is playing
    fn stop_all(&mut self);
}

/// Sink that discards audio
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudioSink;

impl AudioSink for NullAudioSink {
    fn submit(&mut self, _buffer: &PcmBuffer, _volume: f32, _pan: f32) {}

    fn stop_all(&mut self) {}
}

/// Sink that logs each submission
#[derive(Debug, Default, Clone)]
pub struct LogAudioSink {
    pub submitted: u64,
    pub stopped: u64,
}

impl AudioSink for LogAudioSink {
    fn submit(&mut self, buffer: &PcmBuffer, volume: f32, pan: f32) {
        self.submitted += 1;
        log::debug!(
            "audio: {:.3}s buffer, peak {}, volume {:.2}, pan {:+.2}",
            buffer.duration_secs(),
            buffer.peak(),
            volume,
            pan
        );
    }

    fn stop_all(&mut self) {
        self.stopped += 1;
        log::debug!("audio: stop all");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_scripted_input_quits_when_exhausted() {
        let mut input = ScriptedInput::new([TickInput::moving(Vec2::X)]);
        assert_eq!(input.poll().direction, Vec2::X);
        assert_eq!(input.remaining(), 0);
        assert!(input.poll().quit);
        assert!(input.poll().quit);
    }

    #[test]
    fn test_closure_input() {
        let mut n = 0;
        let mut input = || {
            n += 1;
            TickInput::moving(Vec2::new(n as f32, 0.0))
        };
        assert_eq!(InputSource::poll(&mut input).direction.x, 1.0);
        assert_eq!(InputSource::poll(&mut input).direction.x, 2.0);
    }

    #[test]
    fn test_log_sink_counts() {
        let mut sink = LogAudioSink::default();
        sink.submit(&PcmBuffer::silence(44_100, 10), 0.5, 0.0);
        sink.stop_all();
        assert_eq!((sink.submitted, sink.stopped), (1, 1));
        assert!(AutopilotInput.poll().autopilot);
    }
}
