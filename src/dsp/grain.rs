//! Grain resampling primitive.

/*
Granular Pitch Shifting
=======================

Changing the pitch of recorded audio without changing its duration is the
central trick of this crate. The primitive here operates on one grain - a
short fixed-length block of samples - and is cheap enough to run on every
block of a real-time callback.

Vocabulary
----------

  grain         A fixed-length window of samples processed as a unit.
                Ours is 4096 frames, ~85 ms at 48 kHz.

  pitch ratio   Multiplier on the read rate through the source samples.
                  ratio > 1.0  →  read faster  →  higher pitch
                  ratio = 1.0  →  unchanged
                  ratio < 1.0  →  read slower  →  lower pitch

  semitone      1/12th of an octave. Musical pitch is exponential:
                shifting by s semitones means a ratio of 2^(s/12).
                +12 semitones = ratio 2.0 (one octave up),
                -12 semitones = ratio 0.5 (one octave down).

  Hann window   The raised-cosine taper 0.5·(1 - cos(2πi/N)). Each grain
                starts and ends at zero amplitude, so consecutive grains
                can butt against each other without clicks at the seams.


The Math
--------

For each output index i in a grain of length N:

    src       = floor(i × ratio)
    out[i]    = hann[i] × input[src]      if src < N
    out[i]    = 0                          otherwise

Nearest-neighbor indexing, no interpolation. With ratio > 1 the read
cursor runs off the end of the grain early and the remainder is silence -
that is expected, this is one grain among a continuous stream, not a
resample of the whole file. With ratio < 1 the cursor never reaches the
end and the grain's tail is simply never read.

The bounds check doubles as the anti-garbage guard: reads are clamped to
the input window and anything past it becomes zero. There is deliberately
no anti-aliasing filter on the downshifted path; the artifacts of the
nearest-neighbor read are part of this primitive's (lo-fi) character and
are pinned by its tests.


Real-Time Budget
----------------

One call does N multiplies and N table lookups - no allocation, no
branching beyond the bounds check. A 4096-frame grain must complete well
inside its own duration (~85 ms at 48 kHz); in practice it completes in
microseconds. See benches/grain_bench.rs.
*/

/// Clamp range for the pitch ratio, ±12 semitones.
pub const MIN_PITCH_RATIO: f32 = 0.5;
pub const MAX_PITCH_RATIO: f32 = 2.0;

/// Convert a semitone shift to a pitch ratio.
///
/// `semitones_to_ratio(0.0) == 1.0` exactly; ±12 maps to exactly 2.0 / 0.5.
/// The result is clamped to `[MIN_PITCH_RATIO, MAX_PITCH_RATIO]`.
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    2.0_f32
        .powf(semitones / 12.0)
        .clamp(MIN_PITCH_RATIO, MAX_PITCH_RATIO)
}

/// Build a Hann window table of the given length.
///
/// Allocates; call once at setup, never from the audio callback.
pub fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / len as f32).cos()))
        .collect()
}

/// Per-grain pitch shifter.
///
/// Stateless per call: the only owned data is the precomputed window
/// table, so `process` is allocation-free and safe in the audio callback.
pub struct GrainResampler {
    window: Vec<f32>,
}

impl GrainResampler {
    pub fn new(grain_len: usize) -> Self {
        Self {
            window: hann_window(grain_len),
        }
    }

    /// Grain length this resampler was built for.
    #[inline]
    pub fn grain_len(&self) -> usize {
        self.window.len()
    }

    /// Pitch-shift one grain.
    ///
    /// Reads `input` at `floor(i * pitch_ratio)`, zero past the end, and
    /// applies the Hann taper. `input` and `out` must both be exactly
    /// `grain_len` samples.
    ///
    /// # Panics
    /// Debug-asserts on length mismatch.
    pub fn process(&self, input: &[f32], pitch_ratio: f32, out: &mut [f32]) {
        debug_assert_eq!(input.len(), self.window.len());
        debug_assert_eq!(out.len(), self.window.len());

        let ratio = pitch_ratio.clamp(MIN_PITCH_RATIO, MAX_PITCH_RATIO);
        let len = input.len();

        for (i, (o, &w)) in out.iter_mut().zip(self.window.iter()).enumerate() {
            let src = (i as f32 * ratio) as usize;
            *o = if src < len { w * input[src] } else { 0.0 };
        }
    }
}
