use crate::core::{AudioBuffer, BitDepth, Channels, Sample};
use crate::error::{SpliceError, SpliceResult};
use hound::{WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::ops::Range;
use std::path::Path;

/// Integer PCM WAV writer
pub struct WavEncoder {
    writer: Option<WavWriter<BufWriter<File>>>,
    sample_rate: u32,
    channels: Channels,
    bit_depth: BitDepth,
}

impl WavEncoder {
    /// Create a new WAV file
    pub fn new<P: AsRef<Path>>(
        path: P,
        sample_rate: u32,
        channels: Channels,
        bit_depth: BitDepth,
    ) -> SpliceResult<Self> {
        let spec = WavSpec {
            channels: channels.count() as u16,
            sample_rate,
            bits_per_sample: bit_depth.bits() as u16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = WavWriter::create(path, spec)?;

        Ok(WavEncoder {
            writer: Some(writer),
            sample_rate,
            channels,
            bit_depth,
        })
    }

    /// Encoder matching the shape of `buffer`
    pub fn for_buffer<S: Sample, P: AsRef<Path>>(path: P, buffer: &AudioBuffer<S>) -> SpliceResult<Self> {
        Self::new(path, buffer.sample_rate(), buffer.channels(), S::BIT_DEPTH)
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the channel configuration
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Get the number of frames written
    pub fn frames_written(&self) -> u32 {
        self.writer.as_ref().map(|w| w.duration()).unwrap_or(0)
    }

    /// Append a whole buffer
    pub fn encode<S: Sample>(&mut self, buffer: &AudioBuffer<S>) -> SpliceResult<()> {
        self.encode_frames(buffer, 0..buffer.frames())
    }

    /// Append a frame range of a buffer
    pub fn encode_frames<S: Sample>(&mut self, buffer: &AudioBuffer<S>, frames: Range<usize>) -> SpliceResult<()> {
        if buffer.sample_rate() != self.sample_rate {
            return Err(SpliceError::InvalidSampleRate {
                rate: buffer.sample_rate(),
            });
        }

        if buffer.channels() != self.channels {
            return Err(SpliceError::InvalidChannels {
                expected: self.channels.count(),
                got: buffer.channels().count(),
            });
        }

        if S::BIT_DEPTH != self.bit_depth {
            return Err(SpliceError::InvalidBitDepth {
                bits: S::BIT_DEPTH.bits(),
            });
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| SpliceError::Wav("Encoder already finalized".to_string()))?;

        for &sample in buffer.frame_slice(frames) {
            writer.write_sample(sample)?;
        }

        Ok(())
    }

    /// Flush and patch the header
    pub fn finalize(&mut self) -> SpliceResult<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(())
    }
}

/// Write `buffer` to a new WAV file in its own format
pub fn write_wav<S: Sample, P: AsRef<Path>>(path: P, buffer: &AudioBuffer<S>) -> SpliceResult<()> {
    let mut encoder = WavEncoder::for_buffer(path, buffer)?;
    encoder.encode(buffer)?;
    encoder.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;
    use tempfile::NamedTempFile;

    #[test]
    fn test_wav_encoder_creation() {
        let temp_file = NamedTempFile::new().unwrap();
        let encoder = WavEncoder::new(temp_file.path(), 44100, Channels::Stereo, BitDepth::I16);
        assert!(encoder.is_ok());
    }

    #[test]
    fn test_wav_encoder_write() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut encoder = WavEncoder::new(temp_file.path(), 48000, Channels::Mono, BitDepth::I16).unwrap();

        let buffer = AudioBuffer::new(vec![0i16, 100, -100, 5000], 48000, Channels::Mono).unwrap();
        encoder.encode(&buffer).unwrap();
        encoder.encode_frames(&buffer, 1..3).unwrap();
        assert_eq!(encoder.frames_written(), 6);
        encoder.finalize().unwrap();

        let mut reader = WavReader::open(temp_file.path()).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 100, -100, 5000, 100, -100]);
    }

    #[test]
    fn test_write_wav_32_bit_stereo() {
        let temp_file = NamedTempFile::new().unwrap();
        let buffer = AudioBuffer::new(vec![i32::MAX, i32::MIN, 7, -7], 96000, Channels::Stereo).unwrap();
        write_wav(temp_file.path(), &buffer).unwrap();

        let reader = WavReader::open(temp_file.path()).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().bits_per_sample, 32);
        assert_eq!(reader.duration(), 2);
    }

    #[test]
    fn test_wav_encoder_invalid_sample_rate() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut encoder = WavEncoder::new(temp_file.path(), 44100, Channels::Mono, BitDepth::I16).unwrap();

        let buffer = AudioBuffer::new(vec![0i16, 1], 48000, Channels::Mono).unwrap();
        assert!(encoder.encode(&buffer).is_err());
    }

    #[test]
    fn test_wav_encoder_invalid_channels() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut encoder = WavEncoder::new(temp_file.path(), 44100, Channels::Mono, BitDepth::I16).unwrap();

        let buffer = AudioBuffer::new(vec![0i16, 1, 2, 3], 44100, Channels::Stereo).unwrap();
        assert!(matches!(encoder.encode(&buffer), Err(SpliceError::InvalidChannels { expected: 1, got: 2 })));
    }

    #[test]
    fn test_wav_encoder_invalid_bit_depth() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut encoder = WavEncoder::new(temp_file.path(), 44100, Channels::Mono, BitDepth::I16).unwrap();

        let buffer = AudioBuffer::new(vec![0i32, 1], 44100, Channels::Mono).unwrap();
        assert!(matches!(encoder.encode(&buffer), Err(SpliceError::InvalidBitDepth { bits: 32 })));
    }

    #[test]
    fn test_encode_after_finalize_fails() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut encoder = WavEncoder::new(temp_file.path(), 48000, Channels::Mono, BitDepth::I16).unwrap();
        encoder.finalize().unwrap();

        let buffer = AudioBuffer::new(vec![0i16], 48000, Channels::Mono).unwrap();
        assert!(matches!(encoder.encode(&buffer), Err(SpliceError::Wav(_))));
    }
}
