//! Periodic key-detection thread.
//!
//! The detector runs off the real-time path on its own thread, waking on a
//! fixed period. Teardown is explicit: `stop` raises the flag and joins,
//! so no tick can fire against a released graph afterwards. Results go out
//! through a ring; a slow consumer loses old readings, never blocks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rtrb::{Consumer, RingBuffer};

use super::key_detect::{DetectedKey, KeyDetector};

/// Granularity of the stop-flag check while waiting out the period.
const STOP_POLL: Duration = Duration::from_millis(25);

const RESULT_RING_CAPACITY: usize = 16;

pub struct KeyDetectorTask {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeyDetectorTask {
    /// Spawn the detection thread. Returns the task handle and the
    /// consumer end for detection results.
    pub fn spawn(mut detector: KeyDetector, period: Duration) -> (Self, Consumer<DetectedKey>) {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let (mut tx, rx) = RingBuffer::new(RESULT_RING_CAPACITY);

        let handle = std::thread::Builder::new()
            .name("key-detect".into())
            .spawn(move || {
                let started = Instant::now();
                let mut next_tick = started + period;
                loop {
                    while Instant::now() < next_tick {
                        if stop_flag.load(Ordering::Acquire) {
                            return;
                        }
                        std::thread::sleep(STOP_POLL.min(period));
                    }
                    if stop_flag.load(Ordering::Acquire) {
                        return;
                    }
                    next_tick += period;

                    if let Some(detected) = detector.tick(started.elapsed().as_secs_f64()) {
                        if tx.push(detected).is_err() {
                            tracing::trace!("key result ring full, dropping");
                        }
                    }
                }
            })
            .expect("spawn key-detect thread");

        (
            Self {
                stop,
                handle: Some(handle),
            },
            rx,
        )
    }

    /// Raise the stop flag and join. After this returns, no further tick
    /// touches the tap or pushes a result.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for KeyDetectorTask {
    fn drop(&mut self) {
        self.stop();
    }
}
