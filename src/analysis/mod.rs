//! Best-effort musical key estimation.
//!
//! A side channel that samples the analyzer tap - read-only toward the
//! audio path, and its failure never affects playback. No smoothing: the
//! result is the instantaneous dominant spectral bin each tick.

/// FFT-based dominant-note detection.
pub mod key_detect;
/// Periodic detector thread with explicit teardown.
pub mod task;

pub use key_detect::{DetectedKey, KeyDetector, Note};
pub use task::KeyDetectorTask;
