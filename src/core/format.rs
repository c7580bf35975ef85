use crate::error::{SpliceError, SpliceResult};
use std::fmt;
use std::path::Path;

/// Sample rates accepted for the working and output formats
pub const SAMPLE_RATES: [u32; 7] = [8000, 16000, 24000, 32000, 44100, 48000, 96000];

/// Channel configuration for audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    /// Mono (1 channel)
    Mono = 1,
    /// Stereo (2 channels)
    Stereo = 2,
}

impl Channels {
    /// Create Channels from channel count
    pub fn from_count(count: u32) -> SpliceResult<Self> {
        match count {
            1 => Ok(Channels::Mono),
            2 => Ok(Channels::Stereo),
            n => Err(SpliceError::InvalidChannels {
                expected: 1,
                got: n,
            }),
        }
    }

    /// Get the number of channels
    pub fn count(&self) -> u32 {
        *self as u32
    }

    /// Get channel layout name
    pub fn name(&self) -> &'static str {
        match self {
            Channels::Mono => "mono",
            Channels::Stereo => "stereo",
        }
    }
}

/// Bit depth for integer PCM samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    /// 16-bit signed (-32768 to 32767)
    I16,
    /// 32-bit signed
    I32,
}

impl BitDepth {
    /// Create a BitDepth from bits per sample
    pub fn from_bits(bits: u32) -> SpliceResult<Self> {
        match bits {
            16 => Ok(BitDepth::I16),
            32 => Ok(BitDepth::I32),
            bits => Err(SpliceError::InvalidBitDepth { bits }),
        }
    }

    /// Bits per sample
    pub fn bits(&self) -> u32 {
        match self {
            BitDepth::I16 => 16,
            BitDepth::I32 => 32,
        }
    }

    /// Largest representable positive amplitude
    pub fn max_amplitude(&self) -> u32 {
        match self {
            BitDepth::I16 => i16::MAX as u32,
            BitDepth::I32 => i32::MAX as u32,
        }
    }

    /// Sample format name understood by ffmpeg (`-sample_fmt`)
    pub fn sample_fmt(&self) -> &'static str {
        match self {
            BitDepth::I16 => "s16",
            BitDepth::I32 => "s32",
        }
    }
}

/// Container format of an audio file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// RIFF WAVE, linear PCM
    Wav,
    /// MPEG layer III
    Mp3,
}

impl FileFormat {
    /// Look up the format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> SpliceResult<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Ok(FileFormat::Wav),
            "mp3" => Ok(FileFormat::Mp3),
            other => Err(SpliceError::UnsupportedFormat(format!(
                "file extension '{}'",
                other
            ))),
        }
    }

    /// Look up the format from a path's extension
    pub fn from_path(path: &Path) -> SpliceResult<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            SpliceError::UnsupportedFormat(format!("no file extension on {}", path.display()))
        })?;
        Self::from_extension(ext)
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Wav => "wav",
            FileFormat::Mp3 => "mp3",
        }
    }
}

/// Sample rate, bit depth, channel count and container of an audio file
///
/// Validated once at construction; there are no setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    sample_rate: u32,
    bit_depth: BitDepth,
    channels: Channels,
    file_format: FileFormat,
}

impl AudioFormat {
    /// Create a format, rejecting sample rates outside [`SAMPLE_RATES`]
    pub fn new(
        sample_rate: u32,
        bit_depth: BitDepth,
        channels: Channels,
        file_format: FileFormat,
    ) -> SpliceResult<Self> {
        if !SAMPLE_RATES.contains(&sample_rate) {
            return Err(SpliceError::InvalidSampleRate { rate: sample_rate });
        }

        Ok(AudioFormat {
            sample_rate,
            bit_depth,
            channels,
            file_format,
        })
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Bit depth
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Channel configuration
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Container format
    pub fn file_format(&self) -> FileFormat {
        self.file_format
    }

    /// Same format in a different container
    pub fn with_file_format(self, file_format: FileFormat) -> Self {
        AudioFormat {
            file_format,
            ..self
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        AudioFormat {
            sample_rate: 48000,
            bit_depth: BitDepth::I16,
            channels: Channels::Mono,
            file_format: FileFormat::Wav,
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {}-bit, {}, {}",
            self.sample_rate,
            self.bit_depth.bits(),
            self.channels.name(),
            self.file_format.extension()
        )
    }
}
