use super::format::{AudioFormat, Channels};
use super::sample::Sample;
use crate::error::{SpliceError, SpliceResult};
use std::ops::Range;
use std::time::Duration;

/// Owned PCM buffer of interleaved integer samples
///
/// All positions taken or returned by the engine are frame indices. For mono
/// audio a frame is a single sample.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer<S: Sample> {
    /// Interleaved samples
    samples: Vec<S>,
    /// Sample rate in Hz
    sample_rate: u32,
    /// Channel configuration
    channels: Channels,
}

impl<S: Sample> AudioBuffer<S> {
    /// Create a new buffer
    pub fn new(samples: Vec<S>, sample_rate: u32, channels: Channels) -> SpliceResult<Self> {
        if sample_rate == 0 {
            return Err(SpliceError::InvalidSampleRate { rate: sample_rate });
        }

        if samples.len() % channels.count() as usize != 0 {
            return Err(SpliceError::UnsupportedFormat(
                "sample count not divisible by channel count".to_string(),
            ));
        }

        Ok(AudioBuffer {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Empty buffer with room for `frames` frames
    pub fn with_capacity(frames: usize, sample_rate: u32, channels: Channels) -> SpliceResult<Self> {
        Self::new(
            Vec::with_capacity(frames * channels.count() as usize),
            sample_rate,
            channels,
        )
    }

    /// Get reference to the samples
    pub fn samples(&self) -> &[S] {
        &self.samples
    }

    /// Get owned samples (consumes buffer)
    pub fn into_samples(self) -> Vec<S> {
        self.samples
    }

    /// Get sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get channel configuration
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Number of frames
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.count() as usize
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Samples covering a frame range
    pub fn frame_slice(&self, frames: Range<usize>) -> &[S] {
        let width = self.channels.count() as usize;
        &self.samples[frames.start * width..frames.end * width]
    }

    /// Mutable samples of a single frame
    pub fn frame_mut(&mut self, frame: usize) -> &mut [S] {
        let width = self.channels.count() as usize;
        &mut self.samples[frame * width..(frame + 1) * width]
    }

    /// Append a frame range of another buffer
    pub fn extend_from(&mut self, other: &AudioBuffer<S>, frames: Range<usize>) {
        self.samples.extend_from_slice(other.frame_slice(frames));
    }

    /// Fail with `FormatMismatch` unless the buffer matches `format`
    pub fn check_format(&self, format: &AudioFormat) -> SpliceResult<()> {
        if self.sample_rate != format.sample_rate() {
            return Err(SpliceError::FormatMismatch {
                property: "sample rate",
                expected: format.sample_rate(),
                got: self.sample_rate,
            });
        }
        if self.channels != format.channels() {
            return Err(SpliceError::FormatMismatch {
                property: "channel count",
                expected: format.channels().count(),
                got: self.channels.count(),
            });
        }
        if S::BIT_DEPTH != format.bit_depth() {
            return Err(SpliceError::FormatMismatch {
                property: "bit depth",
                expected: format.bit_depth().bits(),
                got: S::BIT_DEPTH.bits(),
            });
        }
        Ok(())
    }

    /// Copy a frame range into a standalone buffer
    pub fn slice(&self, frames: Range<usize>) -> AudioBuffer<S> {
        AudioBuffer {
            samples: self.frame_slice(frames).to_vec(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

/// Audio metadata reported by a container probe
#[derive(Debug, Clone)]
pub struct AudioMetadata {
    /// Total duration of the audio
    pub duration: Option<Duration>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u32,
    /// Codec name (e.g., "pcm_s16le", "mp3")
    pub codec: String,
    /// Bits per sample if known
    pub bits_per_sample: Option<u32>,
}

impl AudioMetadata {
    /// Create new metadata
    pub fn new(sample_rate: u32, channels: u32, codec: String) -> SpliceResult<Self> {
        if sample_rate == 0 {
            return Err(SpliceError::InvalidSampleRate { rate: sample_rate });
        }

        Ok(AudioMetadata {
            duration: None,
            sample_rate,
            channels,
            codec,
            bits_per_sample: None,
        })
    }

    /// Set duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Set bits per sample
    pub fn with_bits_per_sample(mut self, bits: u32) -> Self {
        self.bits_per_sample = Some(bits);
        self
    }

    /// Get duration in seconds
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration.map(|d| d.as_secs_f64())
    }
}
