//! TOML settings file
//!
//! Every field is optional. Precedence when building a [`SpliceConfig`]:
//!
//! 1. Command-line flags ([`Overrides`])
//! 2. Settings file
//! 3. Built-in defaults
//!
//! ```toml
//! [audio]
//! sample_rate = 48000
//! bit_depth = 16
//! channels = 1
//! file_format = "wav"
//!
//! [segments]
//! min_seconds = 5.0
//! max_seconds = 18.0
//! write = false
//!
//! [silence]
//! noise_threshold_ratio = 0.03052
//! trim_edges = true
//!
//! [tools]
//! ffmpeg = "ffmpeg"
//! ```

use crate::config::{
    DEFAULT_MAX_SEGMENT, DEFAULT_MIN_SEGMENT, DEFAULT_NOISE_THRESHOLD_RATIO, SpliceConfig,
};
use crate::core::{AudioFormat, BitDepth, Channels, FileFormat};
use crate::error::{SpliceError, SpliceResult};
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Whole settings file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Working and output audio format
    #[serde(default)]
    pub audio: AudioSettings,

    /// Segment length limits and export
    #[serde(default)]
    pub segments: SegmentSettings,

    /// Silence detection and edge trimming
    #[serde(default)]
    pub silence: SilenceSettings,

    /// External programs
    #[serde(default)]
    pub tools: ToolSettings,
}

/// `[audio]` table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioSettings {
    /// Sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// 16 or 32
    #[serde(default = "default_bit_depth")]
    pub bit_depth: u32,

    /// 1 or 2
    #[serde(default = "default_channels")]
    pub channels: u32,

    /// Output container, "wav" or "mp3"
    #[serde(default = "default_file_format")]
    pub file_format: String,
}

/// `[segments]` table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentSettings {
    /// Shortest regular segment in seconds
    #[serde(default = "default_min_seconds")]
    pub min_seconds: f64,

    /// Longest regular segment in seconds
    #[serde(default = "default_max_seconds")]
    pub max_seconds: f64,

    /// Write every emitted segment to the segments directory
    #[serde(default)]
    pub write: bool,
}

/// `[silence]` table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SilenceSettings {
    /// Gate level as a fraction of full scale
    #[serde(default = "default_noise_threshold_ratio")]
    pub noise_threshold_ratio: f64,

    /// Trim long leading/trailing silence
    #[serde(default = "default_true")]
    pub trim_edges: bool,

    /// Silence kept before the first word when trimming, in seconds
    #[serde(default = "default_lead_in_seconds")]
    pub lead_in_seconds: f64,

    /// Edge silence longer than this is trimmed, in seconds
    #[serde(default = "default_trim_after_seconds")]
    pub trim_after_seconds: f64,
}

/// `[tools]` table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSettings {
    /// ffmpeg executable used for format conversion
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_bit_depth() -> u32 {
    16
}

fn default_channels() -> u32 {
    1
}

fn default_file_format() -> String {
    "wav".to_string()
}

fn default_min_seconds() -> f64 {
    DEFAULT_MIN_SEGMENT.as_secs_f64()
}

fn default_max_seconds() -> f64 {
    DEFAULT_MAX_SEGMENT.as_secs_f64()
}

fn default_noise_threshold_ratio() -> f64 {
    DEFAULT_NOISE_THRESHOLD_RATIO
}

fn default_true() -> bool {
    true
}

fn default_lead_in_seconds() -> f64 {
    1.0
}

fn default_trim_after_seconds() -> f64 {
    2.0
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

impl Default for AudioSettings {
    fn default() -> Self {
        AudioSettings {
            sample_rate: default_sample_rate(),
            bit_depth: default_bit_depth(),
            channels: default_channels(),
            file_format: default_file_format(),
        }
    }
}

impl Default for SegmentSettings {
    fn default() -> Self {
        SegmentSettings {
            min_seconds: default_min_seconds(),
            max_seconds: default_max_seconds(),
            write: false,
        }
    }
}

impl Default for SilenceSettings {
    fn default() -> Self {
        SilenceSettings {
            noise_threshold_ratio: default_noise_threshold_ratio(),
            trim_edges: true,
            lead_in_seconds: default_lead_in_seconds(),
            trim_after_seconds: default_trim_after_seconds(),
        }
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        ToolSettings {
            ffmpeg: default_ffmpeg(),
        }
    }
}

/// Command-line values that win over the settings file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--min-seg`
    pub min_seconds: Option<f64>,
    /// `--max-seg`
    pub max_seconds: Option<f64>,
    /// `--threshold`
    pub noise_threshold_ratio: Option<f64>,
    /// `--write-segments`
    pub write_segments: bool,
    /// `--format`
    pub file_format: Option<String>,
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml_str(text: &str) -> SpliceResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load settings from a file
    pub fn load<P: AsRef<Path>>(path: P) -> SpliceResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&text)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> SpliceResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(min) = overrides.min_seconds {
            self.segments.min_seconds = min;
        }
        if let Some(max) = overrides.max_seconds {
            self.segments.max_seconds = max;
        }
        if let Some(ratio) = overrides.noise_threshold_ratio {
            self.silence.noise_threshold_ratio = ratio;
        }
        if overrides.write_segments {
            self.segments.write = true;
        }
        if let Some(format) = &overrides.file_format {
            self.audio.file_format = format.clone();
        }
    }

    /// Requested output format
    ///
    /// The engine always works on WAV; `file_format` only picks the
    /// container finished chapters end up in.
    pub fn output_format(&self) -> SpliceResult<AudioFormat> {
        AudioFormat::new(
            self.audio.sample_rate,
            BitDepth::from_bits(self.audio.bit_depth)?,
            Channels::from_count(self.audio.channels)?,
            FileFormat::from_extension(&self.audio.file_format)?,
        )
    }

    /// Validated run configuration
    pub fn to_config(&self) -> SpliceResult<SpliceConfig> {
        SpliceConfig::builder()
            .format(self.output_format()?.with_file_format(FileFormat::Wav))
            .segment_range(
                seconds("segments.min_seconds", self.segments.min_seconds)?,
                seconds("segments.max_seconds", self.segments.max_seconds)?,
            )
            .noise_threshold_ratio(self.silence.noise_threshold_ratio)
            .edge_trim(
                seconds("silence.lead_in_seconds", self.silence.lead_in_seconds)?,
                seconds("silence.trim_after_seconds", self.silence.trim_after_seconds)?,
            )
            .trim_edge_silence(self.silence.trim_edges)
            .write_segments(self.segments.write)
            .build()
    }
}

fn seconds(field: &str, value: f64) -> SpliceResult<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| SpliceError::ConfigError(format!("{} must be a non-negative number of seconds, got {}", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.to_config().unwrap(), SpliceConfig::default());
        assert_eq!(settings.tools.ffmpeg, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_partial_tables() {
        let settings = Settings::from_toml_str(
            r#"
            [audio]
            sample_rate = 44100
            channels = 2

            [segments]
            max_seconds = 12.5
            "#,
        )
        .unwrap();

        assert_eq!(settings.audio.bit_depth, 16);
        let config = settings.to_config().unwrap();
        assert_eq!(config.format().sample_rate(), 44100);
        assert_eq!(config.format().channels(), Channels::Stereo);
        assert_eq!(config.min_segment(), Duration::from_secs(5));
        assert_eq!(config.max_segment(), Duration::from_millis(12_500));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut settings = Settings::from_toml_str(
            r#"
            [segments]
            min_seconds = 3.0
            max_seconds = 9.0

            [silence]
            noise_threshold_ratio = 0.1
            "#,
        )
        .unwrap();

        settings.apply(&Overrides {
            min_seconds: Some(4.0),
            write_segments: true,
            ..Default::default()
        });

        let config = settings.to_config().unwrap();
        assert_eq!(config.min_segment(), Duration::from_secs(4));
        assert_eq!(config.max_segment(), Duration::from_secs(9));
        assert_eq!(config.noise_threshold_ratio(), 0.1);
        assert!(config.write_segments());
    }

    #[test]
    fn test_mp3_output_keeps_wav_working_format() {
        let mut settings = Settings::default();
        settings.apply(&Overrides {
            file_format: Some("mp3".to_string()),
            ..Default::default()
        });

        assert_eq!(settings.output_format().unwrap().file_format(), FileFormat::Mp3);
        assert_eq!(settings.to_config().unwrap().format().file_format(), FileFormat::Wav);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_rate = Settings::from_toml_str("[audio]\nsample_rate = 22050\n").unwrap();
        assert!(matches!(bad_rate.to_config(), Err(SpliceError::InvalidSampleRate { rate: 22050 })));

        let bad_depth = Settings::from_toml_str("[audio]\nbit_depth = 24\n").unwrap();
        assert!(matches!(bad_depth.to_config(), Err(SpliceError::InvalidBitDepth { bits: 24 })));

        let negative = Settings::from_toml_str("[segments]\nmin_seconds = -1.0\n").unwrap();
        assert!(matches!(negative.to_config(), Err(SpliceError::ConfigError(_))));

        let inverted = Settings::from_toml_str("[segments]\nmin_seconds = 20.0\n").unwrap();
        assert!(inverted.to_config().is_err());
    }

    #[test]
    fn test_unknown_keys_and_bad_syntax() {
        assert!(matches!(
            Settings::from_toml_str("[segments]\nmax_secs = 3\n"),
            Err(SpliceError::ConfigError(_))
        ));
        assert!(Settings::from_toml_str("[audio\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[silence]\ntrim_edges = false").unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert!(!settings.to_config().unwrap().trim_edge_silence());
        assert!(Settings::load_or_default(None).is_ok());
        assert!(matches!(Settings::load("/nonexistent/interlivre.toml"), Err(SpliceError::Io(_))));
    }
}
