//! Analyzer tap: non-blocking sample hand-off to the key detector.
//!
//! Sits between the engine and the sink. The push side runs inside the
//! audio callback, so it must never block: when the ring is full, samples
//! are dropped. The detector on the consumer side tolerates stale or torn
//! windows on the millisecond scale.

use rtrb::{Consumer, Producer, RingBuffer};

pub struct AnalyzerTap {
    tx: Producer<f32>,
}

impl AnalyzerTap {
    /// Create a tap and the consumer end for the detector.
    pub fn new(capacity: usize) -> (Self, Consumer<f32>) {
        let (tx, rx) = RingBuffer::new(capacity);
        (Self { tx }, rx)
    }

    /// Push a rendered block into the ring, dropping what doesn't fit.
    pub fn push_block(&mut self, block: &[f32]) {
        for &sample in block {
            if self.tx.push(sample).is_err() {
                // Ring full. The tap is best-effort; playback never waits.
                break;
            }
        }
    }
}
