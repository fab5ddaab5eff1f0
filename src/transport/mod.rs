//! Transport: the synchronization state machine coupling a visual playback
//! element to the audio graph.
//!
//! The two sides are independently clocked engines. The rule that keeps
//! them honest: the visual element is the authoritative clock for
//! user-visible scrubbing, and the audio graph is always the one re-seeked
//! to match it, never the reverse. The transport therefore never reads a
//! position out of the audio side; it only issues stop/start-at-offset
//! commands.
//!
//! States: Idle → Ready → Playing ⇄ Paused, Playing → Ended on stream
//! completion, Ended → Ready only via explicit restart. While no media is
//! loaded (Idle), every operation is a silent no-op - user input racing
//! against async load completion is normal, not an error.

use crate::SILENCE_FLOOR_DB;

/// The visual playback element, as an opaque capability.
///
/// Anything with a play/pause/scrub surface and its own clock fits:
/// a video widget, a wall-clock simulation, a test fake.
pub trait VisualElement {
    fn play(&mut self);
    fn pause(&mut self);
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    /// Total duration in seconds.
    fn duration(&self) -> f64;
    fn set_muted(&mut self, muted: bool);
    fn muted(&self) -> bool;
    fn set_playback_rate(&mut self, rate: f64);
    /// Whether the element has run past its duration.
    fn has_ended(&self) -> bool;
}

/// The audio side of the transport, as an opaque capability.
///
/// Implemented by the live graph handle; tests substitute a recorder.
pub trait AudioControl {
    fn start(&mut self, offset_seconds: f64);
    fn stop(&mut self);
    fn set_pitch(&mut self, semitones: f32);
    fn set_tempo(&mut self, rate: f32);
    fn set_volume(&mut self, db: f32);
    fn set_mute(&mut self, muted: bool);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    /// No media loaded; all operations no-op.
    Idle,
    /// Media loaded, not yet started.
    Ready,
    Playing,
    Paused,
    /// Stream completed. Only `restart` leaves this state.
    Ended,
}

pub struct Transport<V, A> {
    visual: V,
    audio: A,
    state: TransportState,
    // Parameter mirrors for UI readout; the live values ride the command
    // ring and are owned by the callback.
    pitch_semitones: f32,
    tempo_rate: f32,
    volume_db: f32,
    muted: bool,
}

impl<V: VisualElement, A: AudioControl> Transport<V, A> {
    pub fn new(visual: V, audio: A) -> Self {
        Self {
            visual,
            audio,
            state: TransportState::Idle,
            pitch_semitones: 0.0,
            tempo_rate: 1.0,
            volume_db: 0.0,
            muted: false,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn is_ended(&self) -> bool {
        self.state == TransportState::Ended
    }

    /// Position on the authoritative (visual) clock.
    pub fn position(&self) -> f64 {
        self.visual.current_time()
    }

    pub fn duration(&self) -> f64 {
        self.visual.duration()
    }

    pub fn pitch_semitones(&self) -> f32 {
        self.pitch_semitones
    }

    pub fn tempo_rate(&self) -> f32 {
        self.tempo_rate
    }

    pub fn volume_db(&self) -> f32 {
        self.volume_db
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn visual(&self) -> &V {
        &self.visual
    }

    pub fn visual_mut(&mut self) -> &mut V {
        &mut self.visual
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    /// Media became playable: Idle → Ready.
    pub fn media_loaded(&mut self) {
        if self.state == TransportState::Idle {
            self.state = TransportState::Ready;
            tracing::debug!("transport ready");
        }
    }

    /// Space bar: Ready/Paused → Playing, Playing → Paused.
    pub fn toggle_play(&mut self) {
        match self.state {
            TransportState::Idle | TransportState::Ended => {}
            TransportState::Ready | TransportState::Paused => {
                self.visual.play();
                self.audio.start(self.visual.current_time());
                self.state = TransportState::Playing;
                tracing::debug!(position = self.visual.current_time(), "playing");
            }
            TransportState::Playing => {
                self.visual.pause();
                self.audio.stop();
                self.state = TransportState::Paused;
                tracing::debug!("paused");
            }
        }
    }

    /// Absolute seek, clamped to [0, duration]. The visual element moves
    /// first; the audio graph is re-seeked to match. A seek while paused
    /// must not resume audio.
    pub fn seek_to(&mut self, seconds: f64) {
        if self.state == TransportState::Idle {
            return;
        }
        let target = seconds.clamp(0.0, self.visual.duration());
        self.visual.set_current_time(target);
        // Stop+start enqueued together: the graph drains them in one
        // block, so the pair cannot interleave with another seek.
        self.audio.stop();
        if self.state == TransportState::Playing {
            self.audio.start(target);
        }
        tracing::debug!(position = target, "seek");
    }

    /// Relative seek (arrow keys: ±5 s).
    pub fn seek_by(&mut self, delta_seconds: f64) {
        if self.state == TransportState::Idle {
            return;
        }
        self.seek_to(self.visual.current_time() + delta_seconds);
    }

    /// Flip mute on both sides in lock-step.
    pub fn toggle_mute(&mut self) {
        if self.state == TransportState::Idle {
            return;
        }
        self.muted = !self.muted;
        self.visual.set_muted(self.muted);
        self.audio.set_mute(self.muted);
        tracing::debug!(muted = self.muted, "mute toggled");
    }

    /// Set the pitch shift in semitones, clamped to ±12. Audio-only: the
    /// visual timeline is unaffected by pitch.
    pub fn set_pitch_semitones(&mut self, semitones: f32) {
        if self.state == TransportState::Idle {
            return;
        }
        self.pitch_semitones = semitones.clamp(-12.0, 12.0);
        self.audio.set_pitch(self.pitch_semitones);
    }

    /// Set the rate multiplier on both timelines in lock-step.
    pub fn set_tempo_rate(&mut self, rate: f32) {
        if self.state == TransportState::Idle {
            return;
        }
        self.tempo_rate = rate.clamp(0.5, 2.0);
        self.visual.set_playback_rate(self.tempo_rate as f64);
        self.audio.set_tempo(self.tempo_rate);
    }

    /// Set the output level in dB, clamped to [-40, 0].
    pub fn set_volume_db(&mut self, db: f32) {
        if self.state == TransportState::Idle {
            return;
        }
        self.volume_db = db.clamp(SILENCE_FLOOR_DB, 0.0);
        self.audio.set_volume(self.volume_db);
    }

    /// Poll the visual element for stream completion: Playing → Ended.
    ///
    /// Call from the host event loop; returns true on the transition.
    pub fn poll_ended(&mut self) -> bool {
        if self.state == TransportState::Playing && self.visual.has_ended() {
            self.visual.pause();
            self.audio.stop();
            self.state = TransportState::Ended;
            tracing::debug!("stream ended");
            return true;
        }
        false
    }

    /// Explicit restart from Ended: position → 0, Ready, then play.
    pub fn restart(&mut self) {
        if self.state != TransportState::Ended {
            return;
        }
        self.visual.set_current_time(0.0);
        self.state = TransportState::Ready;
        self.toggle_play();
        tracing::debug!("restarted");
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::{FakeVisual, RecordingAudio};

    fn ready_transport() -> Transport<FakeVisual, RecordingAudio> {
        let mut t = Transport::new(FakeVisual::new(60.0), RecordingAudio::default());
        t.media_loaded();
        t
    }

    #[test]
    fn idle_operations_are_noops() {
        let mut t = Transport::new(FakeVisual::new(60.0), RecordingAudio::default());
        t.toggle_play();
        t.seek_by(5.0);
        t.toggle_mute();
        t.set_tempo_rate(1.5);
        assert_eq!(t.state(), TransportState::Idle);
        assert!(t.audio_mut().calls.is_empty());
    }

    #[test]
    fn play_starts_audio_at_visual_position() {
        let mut t = ready_transport();
        t.visual.set_current_time(12.0);
        t.toggle_play();
        assert_eq!(t.state(), TransportState::Playing);
        assert_eq!(t.audio_mut().calls.last().unwrap(), "start(12)");
    }

    #[test]
    fn pause_stops_audio() {
        let mut t = ready_transport();
        t.toggle_play();
        t.toggle_play();
        assert_eq!(t.state(), TransportState::Paused);
        assert_eq!(t.audio_mut().calls.last().unwrap(), "stop");
        assert!(!t.visual.playing);
    }

    #[test]
    fn seek_while_paused_does_not_resume_audio() {
        let mut t = ready_transport();
        t.toggle_play();
        t.toggle_play(); // paused
        t.audio_mut().calls.clear();

        t.seek_by(5.0);
        assert_eq!(t.state(), TransportState::Paused);
        assert_eq!(t.audio_mut().calls, vec!["stop"]);
        assert!(!t.is_playing());
    }

    #[test]
    fn seek_clamps_to_zero() {
        let mut t = ready_transport();
        t.toggle_play();
        t.visual.set_current_time(3.0);
        t.seek_by(-5.0);
        assert_eq!(t.position(), 0.0);
        assert_eq!(t.audio_mut().calls.last().unwrap(), "start(0)");
    }

    #[test]
    fn seek_clamps_to_duration() {
        let mut t = ready_transport();
        t.toggle_play();
        t.seek_to(1e9);
        assert_eq!(t.position(), 60.0);
    }

    #[test]
    fn mute_flips_both_sides_in_lockstep() {
        let mut t = ready_transport();
        t.toggle_mute();
        assert!(t.muted());
        assert!(t.visual.muted);
        assert_eq!(t.audio_mut().muted, Some(true));
    }

    #[test]
    fn double_mute_restores_original_state() {
        let mut t = ready_transport();
        t.set_volume_db(-12.0);
        t.toggle_mute();
        t.toggle_mute();
        assert!(!t.muted());
        assert!(!t.visual.muted);
        assert_eq!(t.audio_mut().muted, Some(false));
        assert_eq!(t.volume_db(), -12.0);
    }

    #[test]
    fn tempo_applies_to_both_timelines() {
        let mut t = ready_transport();
        t.set_tempo_rate(1.5);
        assert_eq!(t.visual.playback_rate, 1.5);
        assert_eq!(t.audio_mut().tempo, Some(1.5));
    }

    #[test]
    fn tempo_clamps_to_valid_range() {
        let mut t = ready_transport();
        t.set_tempo_rate(9.0);
        assert_eq!(t.tempo_rate(), 2.0);
        t.set_tempo_rate(0.1);
        assert_eq!(t.tempo_rate(), 0.5);
    }

    #[test]
    fn pitch_clamps_to_octave() {
        let mut t = ready_transport();
        t.set_pitch_semitones(24.0);
        assert_eq!(t.pitch_semitones(), 12.0);
    }

    #[test]
    fn ended_requires_explicit_restart() {
        let mut t = ready_transport();
        t.toggle_play();
        t.visual.ended = true;
        assert!(t.poll_ended());
        assert_eq!(t.state(), TransportState::Ended);
        assert!(!t.is_playing());

        // Space does nothing while ended.
        t.toggle_play();
        assert_eq!(t.state(), TransportState::Ended);

        t.restart();
        assert_eq!(t.state(), TransportState::Playing);
        assert_eq!(t.position(), 0.0);
        assert_eq!(t.audio_mut().calls.last().unwrap(), "start(0)");
    }
}

pub mod testing;
