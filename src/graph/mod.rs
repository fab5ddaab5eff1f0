//! The audio processing graph for one playback session.
//!
//! Chain: engine (grain player or block shifter) → gain/mute → analyzer
//! tap → device sink. The chain lives inside the real-time callback; the
//! rest of the program talks to it only through a single-producer
//! single-consumer command ring. Commands are drained once at the top of
//! each block, so every parameter change lands on a block boundary and a
//! stop+start pair enqueued together is never interleaved with another
//! seek.

/// Non-blocking sample tap feeding the key detector.
pub mod analyzer;
/// Streaming per-block engine (manual variant).
pub mod block_shifter;
/// Buffered whole-source engine (production variant).
pub mod grain_player;
/// The engine capability trait both variants implement.
pub mod node;

pub use analyzer::AnalyzerTap;
pub use block_shifter::BlockShifter;
pub use grain_player::GrainPlayer;
pub use node::PlaybackEngine;

use rtrb::{Consumer, Producer, RingBuffer};

use crate::dsp::gain::{db_to_gain, ramp_gain};
use crate::io::output::{DeviceError, OutputDevice, UserGesture};
use crate::transport::AudioControl;
use crate::SILENCE_FLOOR_DB;

/// Capacity of the command ring. Commands arrive at UI speed; 64 slots is
/// generous headroom for a burst of key repeats between two blocks.
const COMMAND_RING_CAPACITY: usize = 64;

/// Capacity of the analyzer tap ring: room for a couple of detector
/// windows so a slow tick doesn't immediately drop everything.
const TAP_RING_CAPACITY: usize = 4 * crate::GRAIN_SIZE;

/// Control messages sent from the UI/transport thread to the audio callback.
#[derive(Clone, Copy, Debug)]
pub enum GraphCommand {
    Start { offset_seconds: f64 },
    Stop,
    SetPitch { semitones: f32 },
    SetTempo { rate: f32 },
    SetVolume { db: f32 },
    SetMute { muted: bool },
}

/// Producer side of the command ring.
///
/// This is the only way the rest of the program reaches the live graph.
/// Pushing never blocks; if the ring is somehow full the command is
/// dropped with a warning rather than stalling the caller.
pub struct GraphHandle {
    tx: Producer<GraphCommand>,
}

impl GraphHandle {
    fn send(&mut self, command: GraphCommand) {
        if self.tx.push(command).is_err() {
            tracing::warn!(?command, "command ring full, dropping");
        }
    }
}

impl AudioControl for GraphHandle {
    fn start(&mut self, offset_seconds: f64) {
        self.send(GraphCommand::Start { offset_seconds });
    }

    fn stop(&mut self) {
        self.send(GraphCommand::Stop);
    }

    fn set_pitch(&mut self, semitones: f32) {
        self.send(GraphCommand::SetPitch { semitones });
    }

    fn set_tempo(&mut self, rate: f32) {
        self.send(GraphCommand::SetTempo { rate });
    }

    fn set_volume(&mut self, db: f32) {
        self.send(GraphCommand::SetVolume { db });
    }

    fn set_mute(&mut self, muted: bool) {
        self.send(GraphCommand::SetMute { muted });
    }
}

/// The callback side of the graph: engine, gain stage, and tap.
///
/// Owned by the audio stream once activated. Also usable directly for
/// offline rendering and tests - `process_block` is the whole real-time
/// path.
pub struct GraphProcessor {
    engine: Box<dyn PlaybackEngine>,
    rx: Consumer<GraphCommand>,
    tap: AnalyzerTap,
    volume_db: f32,
    muted: bool,
    /// Gain actually reached at the end of the previous block; ramping
    /// from here to the current target keeps parameter changes pop-free.
    reached_gain: f32,
}

impl GraphProcessor {
    pub fn new(engine: Box<dyn PlaybackEngine>, rx: Consumer<GraphCommand>, tap: AnalyzerTap) -> Self {
        Self {
            engine,
            rx,
            tap,
            volume_db: 0.0,
            muted: false,
            reached_gain: 1.0,
        }
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.rx.pop() {
            match command {
                GraphCommand::Start { offset_seconds } => self.engine.start(offset_seconds),
                GraphCommand::Stop => self.engine.stop(),
                GraphCommand::SetPitch { semitones } => self.engine.set_pitch(semitones),
                GraphCommand::SetTempo { rate } => self.engine.set_tempo(rate),
                GraphCommand::SetVolume { db } => {
                    self.volume_db = db.clamp(SILENCE_FLOOR_DB, 0.0);
                }
                GraphCommand::SetMute { muted } => self.muted = muted,
            }
        }
    }

    /// Render one block. Realtime-safe: no allocation, no locks, no I/O.
    pub fn process_block(&mut self, out: &mut [f32]) {
        self.drain_commands();

        self.engine.render_block(out);

        // Mute overrides the level but leaves volume_db untouched, so
        // un-muting restores the prior volume.
        let target = if self.muted {
            0.0
        } else {
            db_to_gain(self.volume_db)
        };
        self.reached_gain = ramp_gain(out, self.reached_gain, target);

        self.tap.push_block(out);
    }

    pub fn is_rolling(&self) -> bool {
        self.engine.is_rolling()
    }
}

/// Build the command ring pair for a processor/handle couple.
pub fn command_ring() -> (GraphHandle, Consumer<GraphCommand>) {
    let (tx, rx) = RingBuffer::new(COMMAND_RING_CAPACITY);
    (GraphHandle { tx }, rx)
}

/// One session's audio chain bound to the output device.
///
/// Holds the device claim and the running stream. `disconnect` (or drop)
/// releases both; a new session cannot acquire the device before that.
pub struct AudioGraph {
    handle: GraphHandle,
    stream: Option<cpal::Stream>,
    device: Option<OutputDevice>,
    sample_rate: f32,
}

impl AudioGraph {
    /// Acquire the output device and bring the chain live.
    ///
    /// Device acquisition is gated on a user gesture (most platforms
    /// refuse audio output without one), so this is an explicit activate
    /// step rather than part of session construction. On failure nothing
    /// is left half-initialized: the device claim is released with the
    /// returned error.
    pub fn activate(
        mut engine: Box<dyn PlaybackEngine>,
        gesture: &UserGesture,
    ) -> Result<(Self, Consumer<f32>), DeviceError> {
        let device = OutputDevice::acquire(gesture)?;
        let sample_rate = device.sample_rate();
        // The engine renders at the device rate from here on.
        engine.set_output_rate(sample_rate);

        let (handle, rx) = command_ring();
        let (tap, tap_rx) = AnalyzerTap::new(TAP_RING_CAPACITY);
        let processor = GraphProcessor::new(engine, rx, tap);

        let stream = device.build_stream(processor)?;

        tracing::info!(sample_rate, "audio graph live");
        Ok((
            Self {
                handle,
                stream: Some(stream),
                device: Some(device),
                sample_rate,
            },
            tap_rx,
        ))
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Tear down the chain and release the device. Idempotent.
    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            tracing::info!("audio graph disconnected");
        }
        self.device.take();
    }
}

impl Drop for AudioGraph {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl AudioControl for AudioGraph {
    fn start(&mut self, offset_seconds: f64) {
        self.handle.start(offset_seconds);
    }

    fn stop(&mut self) {
        self.handle.stop();
    }

    fn set_pitch(&mut self, semitones: f32) {
        self.handle.set_pitch(semitones);
    }

    fn set_tempo(&mut self, rate: f32) {
        self.handle.set_tempo(rate);
    }

    fn set_volume(&mut self, db: f32) {
        self.handle.set_volume(db);
    }

    fn set_mute(&mut self, muted: bool) {
        self.handle.set_mute(muted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::AudioControl;
    use std::sync::Arc;

    fn offline_graph(source_len: usize) -> (GraphHandle, GraphProcessor, Consumer<f32>) {
        let source = Arc::new(vec![0.5; source_len]);
        let engine = Box::new(GrainPlayer::new(source, 48_000.0));
        let (handle, rx) = command_ring();
        let (tap, tap_rx) = AnalyzerTap::new(TAP_RING_CAPACITY);
        (handle, GraphProcessor::new(engine, rx, tap), tap_rx)
    }

    #[test]
    fn start_command_lands_before_the_next_block() {
        let (mut handle, mut proc, _tap) = offline_graph(48_000);
        handle.start(0.0);

        let mut out = vec![0.0; crate::GRAIN_SIZE];
        proc.process_block(&mut out);

        assert!(proc.is_rolling());
        assert!(out.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn stop_then_start_is_applied_in_order() {
        let (mut handle, mut proc, _tap) = offline_graph(48_000);
        handle.start(0.0);
        let mut out = vec![0.0; 512];
        proc.process_block(&mut out);

        // Seek: stop + start enqueued together, drained in one block.
        handle.stop();
        handle.start(0.5);
        proc.process_block(&mut out);
        assert!(proc.is_rolling());
    }

    #[test]
    fn volume_floor_silences_output() {
        let (mut handle, mut proc, _tap) = offline_graph(48_000);
        handle.start(0.0);
        handle.set_volume(-40.0);

        let mut out = vec![0.0; 512];
        proc.process_block(&mut out); // ramp-down block
        proc.process_block(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn unmute_restores_prior_volume() {
        let (mut handle, mut proc, _tap) = offline_graph(48_000);
        handle.start(0.0);
        handle.set_volume(-6.0);
        handle.set_mute(true);

        let mut out = vec![0.0; 512];
        proc.process_block(&mut out);
        proc.process_block(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));

        handle.set_mute(false);
        proc.process_block(&mut out); // ramp-up block
        proc.process_block(&mut out);
        let peak = out.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
        assert!(peak > 0.0, "unmute must restore audible output");
        // -6 dB of a 0.5 source: peak stays at or below ~0.25.
        assert!(peak <= 0.26);
    }

    #[test]
    fn tap_receives_rendered_samples() {
        let (mut handle, mut proc, mut tap_rx) = offline_graph(48_000);
        handle.start(0.0);

        let mut out = vec![0.0; 512];
        proc.process_block(&mut out);

        let mut received = 0;
        while tap_rx.pop().is_ok() {
            received += 1;
        }
        assert_eq!(received, 512);
    }
}
