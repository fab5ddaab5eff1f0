pub mod analysis; // Spectral key detection (side channel, read-only)
pub mod dsp;
pub mod graph; // Processing chain: source -> engine -> analyzer -> sink
pub mod io;
pub mod media;
pub mod session;
pub mod transport; // Visual/audio synchronization state machine

/// Grain length in frames. Matches the prototype's 4096-sample processing
/// window; one grain at 48 kHz is ~85 ms.
pub const GRAIN_SIZE: usize = 4096;

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Volume floor in dB. At or below this level output is treated as silence.
pub const SILENCE_FLOOR_DB: f32 = -40.0;
