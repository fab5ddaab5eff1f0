//! Low-level DSP primitives used by the playback engines.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! call directly from the audio callback. They intentionally stay focused on
//! the signal-processing math so the graph layer can handle orchestration,
//! parameter routing, and cross-thread hand-off.

/// Decibel/linear level math and pop-free gain ramping.
pub mod gain;
/// Nearest-neighbor grain resampler with Hann windowing.
pub mod grain;

pub use grain::GrainResampler;
