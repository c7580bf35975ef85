//! Run configuration
//!
//! [`SpliceConfig`] is built once per run and validated as a whole in
//! [`SpliceConfigBuilder::build`]. Nothing can change it afterwards.

use crate::core::{AudioFormat, BitDepth, Sample};
use crate::error::{SpliceError, SpliceResult};
use std::time::Duration;

/// Default shortest segment between two cuts
pub const DEFAULT_MIN_SEGMENT: Duration = Duration::from_secs(5);
/// Default longest segment between two cuts
pub const DEFAULT_MAX_SEGMENT: Duration = Duration::from_secs(18);
/// Default silence gate, as a fraction of full scale
pub const DEFAULT_NOISE_THRESHOLD_RATIO: f64 = 0.03052;

/// Immutable, validated configuration for one splice run
#[derive(Debug, Clone, PartialEq)]
pub struct SpliceConfig {
    format: AudioFormat,
    min_segment: Duration,
    max_segment: Duration,
    noise_threshold_ratio: f64,
    speech_scan_step: usize,
    split_search_stride: usize,
    silence_step: usize,
    lead_in: Duration,
    trim_after: Duration,
    trim_edge_silence: bool,
    write_segments: bool,
}

impl SpliceConfig {
    /// Start from the defaults
    pub fn builder() -> SpliceConfigBuilder {
        SpliceConfigBuilder::default()
    }

    /// Working format every input must already be in
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Shortest regular segment
    pub fn min_segment(&self) -> Duration {
        self.min_segment
    }

    /// Longest regular segment
    pub fn max_segment(&self) -> Duration {
        self.max_segment
    }

    /// Silence gate as a fraction of full scale
    pub fn noise_threshold_ratio(&self) -> f64 {
        self.noise_threshold_ratio
    }

    /// Whether emitted segments are also written to disk
    pub fn write_segments(&self) -> bool {
        self.write_segments
    }

    /// Whether leading/trailing silence is trimmed from each source
    pub fn trim_edge_silence(&self) -> bool {
        self.trim_edge_silence
    }

    /// Absolute silence threshold for a bit depth
    pub fn noise_threshold_for(&self, bit_depth: BitDepth) -> u32 {
        (f64::from(bit_depth.max_amplitude()) * self.noise_threshold_ratio).round() as u32
    }

    /// Absolute silence threshold for a sample type
    pub fn noise_threshold<S: Sample>(&self) -> u32 {
        self.noise_threshold_for(S::BIT_DEPTH)
    }

    /// Shortest regular segment in frames
    pub fn min_segment_frames(&self) -> usize {
        self.frames(self.min_segment)
    }

    /// Longest regular segment in frames
    pub fn max_segment_frames(&self) -> usize {
        self.frames(self.max_segment)
    }

    /// Lead-in kept before speech and tail kept after it, in frames
    pub fn lead_in_frames(&self) -> usize {
        self.frames(self.lead_in)
    }

    /// Edge silence longer than this is trimmed, in frames
    pub fn trim_after_frames(&self) -> usize {
        self.frames(self.trim_after)
    }

    /// Stride of the speech onset/end scans
    pub fn speech_scan_step(&self) -> usize {
        self.speech_scan_step
    }

    /// Outer stride of the split-point search
    pub fn split_search_stride(&self) -> usize {
        self.split_search_stride
    }

    /// Inner stride used while walking a silence run
    pub fn silence_step(&self) -> usize {
        self.silence_step
    }

    fn frames(&self, duration: Duration) -> usize {
        (duration.as_secs_f64() * f64::from(self.format.sample_rate())).round() as usize
    }
}

impl Default for SpliceConfig {
    fn default() -> Self {
        SpliceConfigBuilder::default().unvalidated()
    }
}

/// Builder for [`SpliceConfig`]
#[derive(Debug, Clone)]
pub struct SpliceConfigBuilder {
    format: AudioFormat,
    min_segment: Duration,
    max_segment: Duration,
    noise_threshold_ratio: f64,
    speech_scan_step: usize,
    split_search_stride: usize,
    silence_step: usize,
    lead_in: Duration,
    trim_after: Duration,
    trim_edge_silence: bool,
    write_segments: bool,
}

impl Default for SpliceConfigBuilder {
    fn default() -> Self {
        SpliceConfigBuilder {
            format: AudioFormat::default(),
            min_segment: DEFAULT_MIN_SEGMENT,
            max_segment: DEFAULT_MAX_SEGMENT,
            noise_threshold_ratio: DEFAULT_NOISE_THRESHOLD_RATIO,
            speech_scan_step: 480,
            split_search_stride: 360,
            silence_step: 6,
            lead_in: Duration::from_secs(1),
            trim_after: Duration::from_secs(2),
            trim_edge_silence: true,
            write_segments: false,
        }
    }
}

impl SpliceConfigBuilder {
    /// Working format
    pub fn format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    /// Segment length bounds
    pub fn segment_range(mut self, min: Duration, max: Duration) -> Self {
        self.min_segment = min;
        self.max_segment = max;
        self
    }

    /// Silence gate as a fraction of full scale
    pub fn noise_threshold_ratio(mut self, ratio: f64) -> Self {
        self.noise_threshold_ratio = ratio;
        self
    }

    /// Scan strides in frames: speech scan, split search, silence walk
    pub fn strides(mut self, speech_scan_step: usize, split_search_stride: usize, silence_step: usize) -> Self {
        self.speech_scan_step = speech_scan_step;
        self.split_search_stride = split_search_stride;
        self.silence_step = silence_step;
        self
    }

    /// Edge trimming: keep `lead_in` of silence when more than `trim_after` is present
    pub fn edge_trim(mut self, lead_in: Duration, trim_after: Duration) -> Self {
        self.lead_in = lead_in;
        self.trim_after = trim_after;
        self
    }

    /// Enable or disable edge trimming
    pub fn trim_edge_silence(mut self, enabled: bool) -> Self {
        self.trim_edge_silence = enabled;
        self
    }

    /// Also write every emitted segment to disk
    pub fn write_segments(mut self, enabled: bool) -> Self {
        self.write_segments = enabled;
        self
    }

    /// Validate and freeze
    pub fn build(self) -> SpliceResult<SpliceConfig> {
        if self.min_segment.is_zero() {
            return Err(SpliceError::ConfigError(
                "minimum segment length must be greater than zero".to_string(),
            ));
        }
        if self.min_segment >= self.max_segment {
            return Err(SpliceError::ConfigError(format!(
                "minimum segment length ({:?}) must be shorter than maximum ({:?})",
                self.min_segment, self.max_segment
            )));
        }
        if !(0.0..=1.0).contains(&self.noise_threshold_ratio) {
            return Err(SpliceError::ConfigError(format!(
                "noise threshold ratio must be between 0.0 and 1.0, got {}",
                self.noise_threshold_ratio
            )));
        }
        if self.speech_scan_step == 0 || self.split_search_stride == 0 || self.silence_step == 0 {
            return Err(SpliceError::ConfigError(
                "scan strides must be greater than zero".to_string(),
            ));
        }
        if self.silence_step >= self.split_search_stride {
            return Err(SpliceError::ConfigError(format!(
                "silence step ({}) must be finer than the split search stride ({})",
                self.silence_step, self.split_search_stride
            )));
        }
        if self.lead_in.is_zero() {
            return Err(SpliceError::ConfigError(
                "lead-in must be greater than zero".to_string(),
            ));
        }
        if self.lead_in > self.trim_after {
            return Err(SpliceError::ConfigError(
                "lead-in must not exceed the trim threshold".to_string(),
            ));
        }

        let config = self.unvalidated();
        if config.min_segment_frames() == 0 {
            return Err(SpliceError::ConfigError(
                "minimum segment is shorter than one frame".to_string(),
            ));
        }
        if config.lead_in_frames() == 0 {
            return Err(SpliceError::ConfigError(
                "lead-in is shorter than one frame".to_string(),
            ));
        }
        Ok(config)
    }

    fn unvalidated(self) -> SpliceConfig {
        SpliceConfig {
            format: self.format,
            min_segment: self.min_segment,
            max_segment: self.max_segment,
            noise_threshold_ratio: self.noise_threshold_ratio,
            speech_scan_step: self.speech_scan_step,
            split_search_stride: self.split_search_stride,
            silence_step: self.silence_step,
            lead_in: self.lead_in,
            trim_after: self.trim_after,
            trim_edge_silence: self.trim_edge_silence,
            write_segments: self.write_segments,
        }
    }
}
