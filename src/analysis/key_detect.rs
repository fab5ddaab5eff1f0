//! Dominant-note detection over the analyzer tap.
//!
//! Every tick: snapshot the latest window of output samples, FFT, take the
//! bin of maximum magnitude, convert bin → frequency → note name. Silence
//! or a DC-only spectrum yields frequency ≤ 0, which is reported as "no
//! detection" rather than fed to a logarithm.

use std::fmt;
use std::sync::Arc;

use rtrb::Consumer;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::dsp::grain::hann_window;

/// The twelve pitch classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Note {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

const NOTES: [Note; 12] = [
    Note::C,
    Note::Cs,
    Note::D,
    Note::Ds,
    Note::E,
    Note::F,
    Note::Fs,
    Note::G,
    Note::Gs,
    Note::A,
    Note::As,
    Note::B,
];

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Note::C => "C",
            Note::Cs => "C#",
            Note::D => "D",
            Note::Ds => "D#",
            Note::E => "E",
            Note::F => "F",
            Note::Fs => "F#",
            Note::G => "G",
            Note::Gs => "G#",
            Note::A => "A",
            Note::As => "A#",
            Note::B => "B",
        };
        f.write_str(name)
    }
}

/// One detection result. Ephemeral - overwritten each tick, never persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectedKey {
    pub note: Note,
    pub at_seconds: f64,
}

/// Map a frequency in Hz to its nearest pitch class.
///
/// `None` for silence, DC, or non-finite input - the domain guard for the
/// log2 below.
pub fn note_for_frequency(frequency: f32) -> Option<Note> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return None;
    }
    // A4 = 440 Hz = note number 69.
    let number = (12.0 * (frequency / 440.0).log2() + 69.0).round() as i64;
    Some(NOTES[number.rem_euclid(12) as usize])
}

pub struct KeyDetector {
    tap: Consumer<f32>,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    /// Circular window of the most recent tap samples; `write_pos` is the
    /// next slot to overwrite, and the oldest sample once full.
    frame: Vec<f32>,
    write_pos: usize,
    filled: usize,
    sample_rate: f32,
}

impl KeyDetector {
    pub fn new(tap: Consumer<f32>, fft_len: usize, sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_len);
        Self {
            tap,
            fft,
            window: hann_window(fft_len),
            scratch: vec![Complex::new(0.0, 0.0); fft_len],
            frame: vec![0.0; fft_len],
            write_pos: 0,
            filled: 0,
            sample_rate,
        }
    }

    /// Pull everything available from the tap, keeping the latest
    /// `fft_len` samples. Torn or stale windows are acceptable here.
    /// O(1) per sample: new samples overwrite the oldest slot in place.
    fn drain_tap(&mut self) {
        let len = self.frame.len();
        while let Ok(sample) = self.tap.pop() {
            self.frame[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % len;
            if self.filled < len {
                self.filled += 1;
            }
        }
    }

    /// Run one detection pass.
    ///
    /// `None` when the window has not filled yet or the spectrum has no
    /// usable peak.
    pub fn tick(&mut self, at_seconds: f64) -> Option<DetectedKey> {
        self.drain_tap();
        if self.filled < self.frame.len() {
            return None;
        }

        // Unroll the circular frame into chronological order under the
        // analysis window; `write_pos` marks the oldest sample.
        let len = self.frame.len();
        for (i, (slot, &w)) in self.scratch.iter_mut().zip(self.window.iter()).enumerate() {
            slot.re = self.frame[(self.write_pos + i) % len] * w;
            slot.im = 0.0;
        }
        self.fft.process(&mut self.scratch);

        // Dominant bin in the first half of the spectrum.
        let half = self.scratch.len() / 2;
        let mut max_bin = 0;
        let mut max_power = f32::NEG_INFINITY;
        for (i, bin) in self.scratch[..half].iter().enumerate() {
            let power = bin.re * bin.re + bin.im * bin.im;
            if power > max_power {
                max_power = power;
                max_bin = i;
            }
        }

        let frequency = max_bin as f32 * self.sample_rate / self.scratch.len() as f32;
        let note = note_for_frequency(frequency)?;
        Some(DetectedKey { note, at_seconds })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtrb::RingBuffer;

    #[test]
    fn concert_pitch_maps_to_a() {
        assert_eq!(note_for_frequency(440.0), Some(Note::A));
        assert_eq!(note_for_frequency(220.0), Some(Note::A));
        assert_eq!(note_for_frequency(880.0), Some(Note::A));
    }

    #[test]
    fn middle_c_maps_to_c() {
        assert_eq!(note_for_frequency(261.63), Some(Note::C));
    }

    #[test]
    fn degenerate_frequencies_yield_no_detection() {
        assert_eq!(note_for_frequency(0.0), None);
        assert_eq!(note_for_frequency(-5.0), None);
        assert_eq!(note_for_frequency(f32::NAN), None);
        assert_eq!(note_for_frequency(f32::INFINITY), None);
    }

    #[test]
    fn note_names_render_with_sharps() {
        assert_eq!(Note::Cs.to_string(), "C#");
        assert_eq!(Note::A.to_string(), "A");
    }

    #[test]
    fn pure_sine_at_440_detects_a() {
        let fft_len = 4096;
        let sample_rate = 44_100.0;
        let (mut tx, rx) = RingBuffer::new(fft_len);
        for i in 0..fft_len {
            let t = i as f32 / sample_rate;
            tx.push((2.0 * std::f32::consts::PI * 440.0 * t).sin())
                .unwrap();
        }

        let mut detector = KeyDetector::new(rx, fft_len, sample_rate);
        let detected = detector.tick(1.0).expect("detection");
        assert_eq!(detected.note, Note::A);
        assert_eq!(detected.at_seconds, 1.0);
    }

    #[test]
    fn newer_samples_displace_the_oldest() {
        let fft_len = 1024;
        let sample_rate = 44_100.0;
        let (mut tx, rx) = RingBuffer::new(2 * fft_len);
        // A full window of silence, then a full window of 440 Hz: only the
        // latest window may survive the drain.
        for _ in 0..fft_len {
            tx.push(0.0).unwrap();
        }
        for i in 0..fft_len {
            let t = i as f32 / sample_rate;
            tx.push((2.0 * std::f32::consts::PI * 440.0 * t).sin())
                .unwrap();
        }

        let mut detector = KeyDetector::new(rx, fft_len, sample_rate);
        let detected = detector.tick(0.0).expect("detection from latest window");
        assert_eq!(detected.note, Note::A);
    }

    #[test]
    fn silence_yields_no_detection() {
        let fft_len = 1024;
        let (mut tx, rx) = RingBuffer::new(fft_len);
        for _ in 0..fft_len {
            tx.push(0.0).unwrap();
        }

        let mut detector = KeyDetector::new(rx, fft_len, 44_100.0);
        // All-zero spectrum: the max bin is DC, frequency 0 → None.
        assert_eq!(detector.tick(0.0), None);
    }

    #[test]
    fn partial_window_yields_no_detection() {
        let (mut tx, rx) = RingBuffer::new(1024);
        for _ in 0..10 {
            tx.push(0.5).unwrap();
        }
        let mut detector = KeyDetector::new(rx, 1024, 44_100.0);
        assert_eq!(detector.tick(0.0), None);
    }
}
