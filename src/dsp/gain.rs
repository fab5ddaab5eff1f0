//! Level math: decibel conversion and pop-free gain ramping.

use crate::SILENCE_FLOOR_DB;

/// Convert a level in dB to a linear gain factor.
///
/// Anything at or below the −40 dB floor maps to exactly 0.0, so the
/// bottom of the volume range and a mute flag are audibly identical.
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    if db <= SILENCE_FLOOR_DB {
        0.0
    } else {
        10.0_f32.powf(db / 20.0)
    }
}

/// Apply a linear gain ramp from `from` to `to` across the buffer.
///
/// Parameter changes land on block boundaries; ramping across the block
/// keeps them from producing an audible step. Returns `to` so the caller
/// can carry the reached gain into the next block.
#[inline]
pub fn ramp_gain(buffer: &mut [f32], from: f32, to: f32) -> f32 {
    if buffer.is_empty() {
        return to;
    }
    if from == to {
        for s in buffer.iter_mut() {
            *s *= to;
        }
        return to;
    }
    let step = (to - from) / buffer.len() as f32;
    let mut g = from;
    for s in buffer.iter_mut() {
        g += step;
        *s *= g;
    }
    to
}
