//! Streaming block shifter - the manual playback engine.
//!
//! The degenerate variant for hosts with no buffered player: decoded audio
//! is fed live into a ring buffer by whatever drives the media element, and
//! each fixed-size block is pitch-shifted in place as it passes through.
//!
//! Timing follows the upstream feed. `set_tempo` only records the rate -
//! the rate is applied by the visual element that produces the stream, not
//! by this engine. `start`'s offset is likewise meaningless for a live feed
//! and is ignored; a seek upstream simply changes what arrives next.

use rtrb::Consumer;

use crate::dsp::grain::{semitones_to_ratio, GrainResampler};
use crate::GRAIN_SIZE;

pub struct BlockShifter {
    feed: Consumer<f32>,
    resampler: GrainResampler,
    raw: Vec<f32>,
    shifted: Vec<f32>,
    grain_pos: usize,
    pitch_ratio: f32,
    tempo: f32,
    rolling: bool,
}

impl BlockShifter {
    pub fn new(feed: Consumer<f32>) -> Self {
        Self {
            feed,
            resampler: GrainResampler::new(GRAIN_SIZE),
            raw: vec![0.0; GRAIN_SIZE],
            shifted: vec![0.0; GRAIN_SIZE],
            grain_pos: GRAIN_SIZE,
            pitch_ratio: 1.0,
            tempo: 1.0,
            rolling: false,
        }
    }

    /// Rate last requested by the transport. Informational only for this
    /// variant; see the module docs.
    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    /// Pull one grain from the feed. An underrun zero-fills the remainder -
    /// a stale feed renders as silence, it never blocks the callback.
    fn refill_grain(&mut self) {
        for slot in self.raw.iter_mut() {
            *slot = self.feed.pop().unwrap_or(0.0);
        }
        self.resampler
            .process(&self.raw, self.pitch_ratio, &mut self.shifted);
        self.grain_pos = 0;
    }
}

impl super::node::PlaybackEngine for BlockShifter {
    fn start(&mut self, _offset_seconds: f64) {
        if self.rolling {
            return;
        }
        self.grain_pos = GRAIN_SIZE;
        self.rolling = true;
    }

    fn stop(&mut self) {
        self.rolling = false;
    }

    fn set_pitch(&mut self, semitones: f32) {
        self.pitch_ratio = semitones_to_ratio(semitones.clamp(-12.0, 12.0));
    }

    fn set_tempo(&mut self, rate: f32) {
        self.tempo = rate.clamp(0.5, 2.0);
    }

    fn set_output_rate(&mut self, _rate: f32) {
        // The feed already arrives at device rate.
    }

    fn render_block(&mut self, out: &mut [f32]) {
        let mut written = 0;
        while written < out.len() {
            if !self.rolling {
                out[written..].fill(0.0);
                return;
            }
            if self.grain_pos >= self.shifted.len() {
                self.refill_grain();
            }
            let avail = self.shifted.len() - self.grain_pos;
            let take = avail.min(out.len() - written);
            out[written..written + take]
                .copy_from_slice(&self.shifted[self.grain_pos..self.grain_pos + take]);
            self.grain_pos += take;
            written += take;
        }
    }

    fn is_rolling(&self) -> bool {
        self.rolling
    }
}
