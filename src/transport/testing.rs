//! Test doubles for the transport seams.
//!
//! `FakeVisual` is a manually advanced clock and `RecordingAudio` records
//! the command stream, so the state machine can be exercised without a
//! terminal, a device, or wall time.

use super::{AudioControl, VisualElement};

/// Visual element with a hand-cranked clock.
pub struct FakeVisual {
    pub playing: bool,
    pub position: f64,
    pub duration: f64,
    pub muted: bool,
    pub playback_rate: f64,
    pub ended: bool,
}

impl FakeVisual {
    pub fn new(duration: f64) -> Self {
        Self {
            playing: false,
            position: 0.0,
            duration,
            muted: false,
            playback_rate: 1.0,
            ended: false,
        }
    }

    /// Advance the clock by `seconds` of wall time while playing.
    pub fn advance(&mut self, seconds: f64) {
        if self.playing {
            self.position = (self.position + seconds * self.playback_rate).min(self.duration);
            if self.position >= self.duration {
                self.ended = true;
                self.playing = false;
            }
        }
    }
}

impl VisualElement for FakeVisual {
    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.position = seconds.clamp(0.0, self.duration);
        if self.position < self.duration {
            self.ended = false;
        }
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.playback_rate = rate;
    }

    fn has_ended(&self) -> bool {
        self.ended
    }
}

/// Audio control that records every call it receives.
#[derive(Default)]
pub struct RecordingAudio {
    /// Call log, e.g. `"start(12)"`, `"stop"`.
    pub calls: Vec<String>,
    pub pitch_semitones: Option<f32>,
    pub tempo: Option<f32>,
    pub volume_db: Option<f32>,
    pub muted: Option<bool>,
}

impl AudioControl for RecordingAudio {
    fn start(&mut self, offset_seconds: f64) {
        self.calls.push(format!("start({offset_seconds})"));
    }

    fn stop(&mut self) {
        self.calls.push("stop".into());
    }

    fn set_pitch(&mut self, semitones: f32) {
        self.pitch_semitones = Some(semitones);
        self.calls.push(format!("set_pitch({semitones})"));
    }

    fn set_tempo(&mut self, rate: f32) {
        self.tempo = Some(rate);
        self.calls.push(format!("set_tempo({rate})"));
    }

    fn set_volume(&mut self, db: f32) {
        self.volume_db = Some(db);
        self.calls.push(format!("set_volume({db})"));
    }

    fn set_mute(&mut self, muted: bool) {
        self.muted = Some(muted);
        self.calls.push(format!("set_mute({muted})"));
    }
}
