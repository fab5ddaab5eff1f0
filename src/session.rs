//! Session: the lifetime-scoped bundle of one media source, its audio
//! graph, and its transport.
//!
//! Exactly one session is live at a time - the output device is a
//! process-wide singleton, so beginning a new session while another still
//! holds the device fails with `DeviceError::Busy` until the old one is
//! torn down. Teardown is unconditional on every exit path: dropping a
//! session stops the detector thread, halts the engine, and releases the
//! device.

use std::time::Duration;

use thiserror::Error;

use crate::analysis::{DetectedKey, KeyDetector, KeyDetectorTask};
use crate::graph::{AudioGraph, GrainPlayer, PlaybackEngine};
use crate::io::output::{DeviceError, UserGesture};
use crate::media::MediaSource;
use crate::transport::{AudioControl, Transport, VisualElement};
use crate::GRAIN_SIZE;

/// Detection cadence. The prototype polled its analyser once a second.
pub const KEY_DETECT_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum SessionError {
    /// Device acquisition failed; fatal to this session only. The
    /// transport never left Idle.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

pub struct Session<V: VisualElement> {
    transport: Transport<V, AudioGraph>,
    detector: Option<KeyDetectorTask>,
}

impl<V: VisualElement> Session<V> {
    /// Build the audio chain for `media` and couple it to `visual`.
    ///
    /// Called on first user-initiated playback, not at media-load time:
    /// the gesture token gates device acquisition. Returns the session and
    /// the consumer end of the key-detection results.
    pub fn begin(
        media: &MediaSource,
        visual: V,
        gesture: &UserGesture,
    ) -> Result<(Self, rtrb::Consumer<DetectedKey>), SessionError> {
        let engine: Box<dyn PlaybackEngine> =
            Box::new(GrainPlayer::new(media.samples(), media.sample_rate()));
        tracing::info!(duration = media.duration_seconds(), "media loaded");
        Self::begin_with(engine, visual, gesture)
    }

    /// Like [`begin`](Self::begin), but around a caller-supplied engine,
    /// e.g. a [`BlockShifter`](crate::graph::BlockShifter) over a live
    /// feed. The engine variant is fixed for the session's lifetime.
    pub fn begin_with(
        engine: Box<dyn PlaybackEngine>,
        visual: V,
        gesture: &UserGesture,
    ) -> Result<(Self, rtrb::Consumer<DetectedKey>), SessionError> {
        let (graph, tap_rx) = AudioGraph::activate(engine, gesture)?;
        let sample_rate = graph.sample_rate();

        let key_detector = KeyDetector::new(tap_rx, GRAIN_SIZE, sample_rate);
        let (detector, key_rx) = KeyDetectorTask::spawn(key_detector, KEY_DETECT_PERIOD);

        let mut transport = Transport::new(visual, graph);
        transport.media_loaded();

        tracing::info!(sample_rate, "session started");
        Ok((
            Self {
                transport,
                detector: Some(detector),
            },
            key_rx,
        ))
    }

    pub fn transport(&mut self) -> &mut Transport<V, AudioGraph> {
        &mut self.transport
    }

    pub fn transport_ref(&self) -> &Transport<V, AudioGraph> {
        &self.transport
    }

    /// Tear down in order: cancel the detector timer first so no tick can
    /// reference the graph mid-release, then halt and disconnect.
    fn teardown(&mut self) {
        let Some(mut detector) = self.detector.take() else {
            return; // already torn down via close()
        };
        detector.stop();
        self.transport.audio_mut().stop();
        self.transport.audio_mut().disconnect();
        tracing::info!("session torn down");
    }

    /// Explicit teardown; equivalent to drop but readable at call sites.
    pub fn close(mut self) {
        self.teardown();
    }
}

impl<V: VisualElement> Drop for Session<V> {
    fn drop(&mut self) {
        self.teardown();
    }
}
