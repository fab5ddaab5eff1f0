/// Core trait for playback engines.
///
/// Both engine variants - the buffered [`GrainPlayer`](super::GrainPlayer)
/// and the streaming [`BlockShifter`](super::BlockShifter) - sit behind this
/// one capability set, so the transport and processor never care which one
/// a session was built with.
///
/// All methods are realtime-safe: no allocation, no blocking, no I/O.
pub trait PlaybackEngine: Send {
    /// Begin continuous playback from the given offset.
    ///
    /// Silent no-op if already rolling - callers must `stop()` first.
    fn start(&mut self, offset_seconds: f64);

    /// Halt output. Idempotent.
    fn stop(&mut self);

    /// Set the pitch shift in semitones. Clamped to ±12.
    ///
    /// Takes effect at the next grain boundary.
    fn set_pitch(&mut self, semitones: f32);

    /// Set the playback rate multiplier. Clamped to [0.5, 2.0].
    fn set_tempo(&mut self, rate: f32);

    /// Report the device rate the rendered blocks will be consumed at.
    ///
    /// Called once when the graph goes live, before any render. Engines
    /// that own their source resample media time to this rate; engines fed
    /// a live stream at device rate ignore it.
    fn set_output_rate(&mut self, rate: f32);

    /// Fill `out` with the next block of samples.
    ///
    /// Writes silence when stopped. Never fails: any per-block fault is
    /// rendered as silence rather than raised.
    fn render_block(&mut self, out: &mut [f32]);

    /// Whether the engine is currently producing output.
    fn is_rolling(&self) -> bool;
}

/// Allow boxed engines to be used as engines (for dynamic dispatch)
impl PlaybackEngine for Box<dyn PlaybackEngine> {
    fn start(&mut self, offset_seconds: f64) {
        (**self).start(offset_seconds)
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn set_pitch(&mut self, semitones: f32) {
        (**self).set_pitch(semitones)
    }

    fn set_tempo(&mut self, rate: f32) {
        (**self).set_tempo(rate)
    }

    fn set_output_rate(&mut self, rate: f32) {
        (**self).set_output_rate(rate)
    }

    fn render_block(&mut self, out: &mut [f32]) {
        (**self).render_block(out)
    }

    fn is_rolling(&self) -> bool {
        (**self).is_rolling()
    }
}
