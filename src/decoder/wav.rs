use crate::core::{AudioBuffer, AudioFormat, Sample};
use crate::error::{SpliceError, SpliceResult};
use hound::{SampleFormat, WavReader};
use log::debug;
use std::path::Path;

/// Integer PCM WAV reader pinned to one working format
///
/// Files that disagree with the format are rejected, never converted.
#[derive(Debug, Clone, Copy)]
pub struct WavDecoder {
    format: AudioFormat,
}

impl WavDecoder {
    /// Reader expecting `format`
    pub fn new(format: AudioFormat) -> Self {
        WavDecoder { format }
    }

    /// Read a whole file into memory
    pub fn decode<S: Sample, P: AsRef<Path>>(&self, path: P) -> SpliceResult<AudioBuffer<S>> {
        let path = path.as_ref();
        let reader = WavReader::open(path)?;
        let spec = reader.spec();

        if spec.sample_format != SampleFormat::Int {
            return Err(SpliceError::UnsupportedFormat(format!(
                "{}: floating point WAV is not supported",
                path.display()
            )));
        }
        if spec.sample_rate != self.format.sample_rate() {
            return Err(SpliceError::FormatMismatch {
                property: "sample rate",
                expected: self.format.sample_rate(),
                got: spec.sample_rate,
            });
        }
        if u32::from(spec.channels) != self.format.channels().count() {
            return Err(SpliceError::FormatMismatch {
                property: "channel count",
                expected: self.format.channels().count(),
                got: u32::from(spec.channels),
            });
        }
        if u32::from(spec.bits_per_sample) != self.format.bit_depth().bits() {
            return Err(SpliceError::FormatMismatch {
                property: "bit depth",
                expected: self.format.bit_depth().bits(),
                got: u32::from(spec.bits_per_sample),
            });
        }
        if S::BIT_DEPTH != self.format.bit_depth() {
            return Err(SpliceError::FormatMismatch {
                property: "bit depth",
                expected: self.format.bit_depth().bits(),
                got: S::BIT_DEPTH.bits(),
            });
        }

        let samples = reader.into_samples::<S>().collect::<Result<Vec<_>, _>>()?;
        let buffer = AudioBuffer::new(samples, spec.sample_rate, self.format.channels())?;
        debug!(
            "Read {}: {} frames ({:.1}s)",
            path.display(),
            buffer.frames(),
            buffer.duration().as_secs_f64()
        );
        Ok(buffer)
    }
}
