use super::boundary::{BoundaryFinder, SilenceGate};
use crate::config::SpliceConfig;
use crate::core::{AudioBuffer, Sample};
use crate::error::{SpliceError, SpliceResult};
use crate::filter::{Envelope, LinearFade};
use crate::progress::{Outcome, Phase, ProgressSink};
use log::{debug, info};
use std::ops::Range;

/// Ordered cut positions into one buffer
///
/// Strictly increasing frame indices with at least two entries, the last
/// not past the end of the buffer. Adjacent entries bound the segments,
/// numbered from 1: segment `k` is `points[k - 1]..points[k]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPoints {
    points: Vec<usize>,
    frames: usize,
}

impl SplitPoints {
    /// Validate split points for a buffer of `frames` frames
    pub fn new(points: Vec<usize>, frames: usize) -> SpliceResult<Self> {
        if points.len() < 2 {
            return Err(SpliceError::ConfigError(
                "split points need at least two entries".to_string(),
            ));
        }
        if points.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SpliceError::ConfigError(
                "split points must be strictly increasing".to_string(),
            ));
        }
        if points[points.len() - 1] > frames {
            return Err(SpliceError::ConfigError(format!(
                "split point {} is past the end of a {}-frame buffer",
                points[points.len() - 1],
                frames
            )));
        }
        Ok(SplitPoints { points, frames })
    }

    /// The raw positions
    pub fn as_slice(&self) -> &[usize] {
        &self.points
    }

    /// Length of the buffer the points index into
    pub fn buffer_frames(&self) -> usize {
        self.frames
    }

    /// Number of segments (`len - 1`)
    pub fn segment_count(&self) -> usize {
        self.points.len() - 1
    }

    /// Frames of segment `index`, counted from 1
    pub fn segment(&self, index: usize) -> Range<usize> {
        self.points[index - 1]..self.points[index]
    }

    /// All segments in order
    pub fn segments(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.points.windows(2).map(|w| w[0]..w[1])
    }

    /// First split point; frames before it are trimmed leading silence
    pub fn first(&self) -> usize {
        self.points[0]
    }

    /// Last split point; frames after it are trimmed trailing silence
    pub fn last(&self) -> usize {
        self.points[self.points.len() - 1]
    }

    /// Frames between the first and last split point
    pub fn active_span(&self) -> usize {
        self.last() - self.first()
    }

    /// How far through the active span split point `index` lies, in [0, 1]
    pub fn proportion(&self, index: usize) -> f64 {
        let span = self.active_span();
        if span == 0 {
            return 1.0;
        }
        (self.points[index] - self.first()) as f64 / span as f64
    }
}

/// Splits a buffer at silences into segments of bounded length
#[derive(Debug, Clone)]
pub struct Segmenter<'c> {
    config: &'c SpliceConfig,
}

impl<'c> Segmenter<'c> {
    /// Create a segmenter for a run configuration
    pub fn new(config: &'c SpliceConfig) -> Self {
        Segmenter { config }
    }

    /// Choose split points for `buffer`, fading in place around every cut
    ///
    /// Returns `Outcome::Cancelled` as soon as the sink asks to stop; the
    /// buffer may then carry some fades already and should be discarded.
    pub fn segment<S: Sample>(
        &self,
        buffer: &mut AudioBuffer<S>,
        sink: &dyn ProgressSink,
        message: &str,
    ) -> SpliceResult<Outcome<SplitPoints>> {
        buffer.check_format(&self.config.format())?;
        if buffer.is_empty() {
            return Err(SpliceError::EmptyBuffer);
        }

        let mut phase = Phase::new(sink, message);
        if phase.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        let frames = buffer.frames();
        let gate = SilenceGate::new(self.config.noise_threshold::<S>());
        let step = self.config.speech_scan_step();

        let finder = BoundaryFinder::new(buffer, gate);
        let speech = finder
            .speech_start(0..frames, step)
            .zip(finder.speech_end(0..frames, step));
        let Some((speech_start, speech_end)) = speech else {
            debug!("No speech above threshold {}, keeping one segment", gate.threshold());
            return Ok(Outcome::Completed(SplitPoints::new(vec![0, frames], frames)?));
        };
        let speech_end = speech_end.max(speech_start);
        debug!("Speech spans frames {}..={} of {}", speech_start, speech_end, frames);

        let trim = self.config.trim_edge_silence();
        let lead_in = self.config.lead_in_frames();
        let trim_after = self.config.trim_after_frames();
        let min_len = self.config.min_segment_frames();
        let max_len = self.config.max_segment_frames();

        let first = if trim && speech_start > trim_after {
            speech_start - lead_in
        } else {
            0
        };
        let mut points = vec![first];

        // Starting from the first split point rather than the speech onset
        // keeps the opening segment a little shorter than the rest.
        let mut position = first;
        while position + max_len < speech_end {
            if phase.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }

            let window_start = (position + min_len).min(frames);
            let window_end = (position + max_len).min(frames);
            let window = BoundaryFinder::new(buffer, gate).longest_silence(
                window_start..window_end,
                self.config.split_search_stride(),
                self.config.silence_step(),
            );

            LinearFade::fade_out().apply(buffer, window.start..window.mid);
            LinearFade::fade_in().apply(buffer, window.mid..window.end);
            points.push(window.mid);
            position = window.end;

            if !phase.update(position as f64 / frames as f64 * 100.0) {
                return Ok(Outcome::Cancelled);
            }
        }

        let last = if trim && frames - speech_end > trim_after {
            speech_end + lead_in
        } else {
            frames
        };
        points.push(last);

        info!("{}: {} segments", message, points.len() - 1);
        Ok(Outcome::Completed(SplitPoints::new(points, frames)?))
    }
}
