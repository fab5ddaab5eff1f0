//! Media boundary types.
//!
//! The crate consumes already-decoded audio: a media source here is mono
//! samples plus a sample rate. Fetching, caching, and container/codec
//! handling belong to external collaborators.

use std::sync::Arc;
use std::time::Instant;

use crate::transport::VisualElement;

/// Decoded, seekable media: the whole audio track in memory.
#[derive(Clone)]
pub struct MediaSource {
    samples: Arc<Vec<f32>>,
    sample_rate: f32,
}

impl MediaSource {
    pub fn from_samples(samples: Vec<f32>, sample_rate: f32) -> Self {
        Self {
            samples: Arc::new(samples),
            sample_rate,
        }
    }

    pub fn samples(&self) -> Arc<Vec<f32>> {
        self.samples.clone()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Known total duration, a boundary requirement for seeking.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Wall-clock visual element for hosts without a real video widget.
///
/// Follows the contract of a media element: its own clock, pausable,
/// scrubbable, rate-adjustable, and it reports `has_ended` once the clock
/// runs past the duration. The terminal front-end renders its position as
/// the "video".
pub struct SimulatedVideo {
    duration: f64,
    /// Position at the moment playback last started or was scrubbed.
    base: f64,
    /// Set while playing.
    started_at: Option<Instant>,
    rate: f64,
    muted: bool,
}

impl SimulatedVideo {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            base: 0.0,
            started_at: None,
            rate: 1.0,
            muted: false,
        }
    }

    fn clock(&self) -> f64 {
        match self.started_at {
            Some(t0) => (self.base + t0.elapsed().as_secs_f64() * self.rate).min(self.duration),
            None => self.base,
        }
    }
}

impl VisualElement for SimulatedVideo {
    fn play(&mut self) {
        if self.started_at.is_none() && self.base < self.duration {
            self.started_at = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.base = self.clock();
        self.started_at = None;
    }

    fn current_time(&self) -> f64 {
        self.clock()
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.base = seconds.clamp(0.0, self.duration);
        // Scrubbing restarts the clock from the new position.
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
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
        // Re-anchor so already-elapsed time keeps its old rate.
        self.base = self.clock();
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
        self.rate = rate;
    }

    fn has_ended(&self) -> bool {
        self.started_at.is_some() && self.clock() >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn duration_from_sample_count() {
        let media = MediaSource::from_samples(vec![0.0; 96_000], 48_000.0);
        assert_relative_eq!(media.duration_seconds(), 2.0, max_relative = 1e-9);
    }

    #[test]
    fn paused_clock_holds_position() {
        let mut video = SimulatedVideo::new(10.0);
        video.set_current_time(4.0);
        assert_relative_eq!(video.current_time(), 4.0, max_relative = 1e-9);
        assert!(!video.has_ended());
    }

    #[test]
    fn scrub_clamps_to_duration() {
        let mut video = SimulatedVideo::new(10.0);
        video.set_current_time(25.0);
        assert_relative_eq!(video.current_time(), 10.0, max_relative = 1e-9);
        video.set_current_time(-3.0);
        assert_relative_eq!(video.current_time(), 0.0, max_relative = 1e-9);
    }

    #[test]
    fn play_at_end_does_not_start_the_clock() {
        let mut video = SimulatedVideo::new(5.0);
        video.set_current_time(5.0);
        video.play();
        assert!(!video.has_ended(), "not playing, so not ended");
        assert_relative_eq!(video.current_time(), 5.0, max_relative = 1e-9);
    }
}
