//! Device output sink.
//!
//! The output device is a process-wide singleton resource: only one
//! `OutputDevice` may exist at a time, guarded by an atomic claim flag and
//! released on drop. Acquisition additionally requires a [`UserGesture`]
//! token - platforms commonly refuse to open audio output outside a
//! user-triggered action, so activation is an explicit step rather than a
//! side effect of constructing a session.

use std::sync::atomic::{AtomicBool, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use crate::graph::GraphProcessor;
use crate::MAX_BLOCK_SIZE;

static DEVICE_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Proof of a user-triggered action.
///
/// Constructed by the input layer in response to a real input event and
/// passed down to device acquisition. Zero-sized; exists so "audio can
/// start now" is visible in the type signature instead of assumed.
pub struct UserGesture(());

impl UserGesture {
    /// Acknowledge a user input event.
    pub fn acknowledge() -> Self {
        UserGesture(())
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    /// Another session still holds the output device.
    #[error("output device already claimed by another session")]
    Busy,
    #[error("no default output device available")]
    NoDevice,
    #[error("failed to fetch default output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// Owned handle to the singleton output device.
pub struct OutputDevice {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
}

impl OutputDevice {
    /// Claim the device. Fails with [`DeviceError::Busy`] while another
    /// session holds it; the previous graph must `disconnect()` first.
    pub fn acquire(_gesture: &UserGesture) -> Result<Self, DeviceError> {
        if DEVICE_CLAIMED.swap(true, Ordering::AcqRel) {
            return Err(DeviceError::Busy);
        }

        let claim = ClaimGuard;
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(DeviceError::NoDevice)?;
        let config = device.default_output_config()?;

        tracing::info!(
            sample_rate = config.sample_rate().0,
            channels = config.channels(),
            "output device acquired"
        );
        std::mem::forget(claim);
        Ok(Self { device, config })
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate().0 as f32
    }

    pub fn channels(&self) -> usize {
        self.config.channels() as usize
    }

    /// Build and start the output stream, moving the processor into the
    /// real-time callback. The callback renders mono blocks and fans them
    /// out to every hardware channel.
    pub fn build_stream(&self, mut processor: GraphProcessor) -> Result<cpal::Stream, DeviceError> {
        let channels = self.channels();
        let mut block = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = self.device.build_output_stream(
            &self.config.clone().into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let rendered = &mut block[..frames];
                    processor.process_block(rendered);

                    let out_off = frames_written * channels;
                    for (i, &s) in rendered.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                    }
                    frames_written += frames;
                }
            },
            |err| tracing::error!(%err, "audio stream error"),
            None,
        )?;

        stream.play()?;
        Ok(stream)
    }
}

/// Releases the claim if acquisition fails partway.
struct ClaimGuard;

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        DEVICE_CLAIMED.store(false, Ordering::Release);
    }
}

impl Drop for OutputDevice {
    fn drop(&mut self) {
        DEVICE_CLAIMED.store(false, Ordering::Release);
        tracing::info!("output device released");
    }
}
