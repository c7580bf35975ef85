use super::segment::SplitPoints;
use crate::core::{AudioBuffer, Sample};
use crate::error::{SpliceError, SpliceResult};
use crate::progress::{Outcome, Phase, ProgressSink};
use log::{debug, info};
use std::ops::Range;

/// Which input a segment was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Source 1
    First,
    /// Source 2
    Second,
}

impl Source {
    /// Short label used in segment file names
    pub fn label(&self) -> &'static str {
        match self {
            Source::First => "src1",
            Source::Second => "src2",
        }
    }
}

/// A segment as placed in the interleaved output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedSegment {
    /// Position in the output, counted from 1
    pub ordinal: usize,
    /// Input the segment came from
    pub source: Source,
    /// Segment number within its source, counted from 1
    pub index: usize,
    /// Frames of the source buffer
    pub frames: Range<usize>,
}

impl EmittedSegment {
    /// `{output}_{ordinal:06}_{src1|src2}_{index:06}.wav`
    pub fn file_name(&self, output_name: &str) -> String {
        format!(
            "{}_{:06}_{}_{:06}.wav",
            output_name,
            self.ordinal,
            self.source.label(),
            self.index
        )
    }
}

/// Side channel receiving every emitted segment
///
/// Exporting never changes the assembled output.
pub trait SegmentExport {
    /// Called once per segment, in output order
    fn export<S: Sample>(&mut self, segment: &EmittedSegment, source: &AudioBuffer<S>) -> SpliceResult<()>;
}

/// Export that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExport;

impl SegmentExport for NoExport {
    fn export<S: Sample>(&mut self, _segment: &EmittedSegment, _source: &AudioBuffer<S>) -> SpliceResult<()> {
        Ok(())
    }
}

/// Output under construction
struct Assembly<'e, S: Sample, E: SegmentExport> {
    output: AudioBuffer<S>,
    next_ordinal: usize,
    export: &'e mut E,
}

impl<S: Sample, E: SegmentExport> Assembly<'_, S, E> {
    fn emit(&mut self, source: Source, index: usize, buffer: &AudioBuffer<S>, splits: &SplitPoints) -> SpliceResult<()> {
        let segment = EmittedSegment {
            ordinal: self.next_ordinal,
            source,
            index,
            frames: splits.segment(index),
        };
        self.export.export(&segment, buffer)?;
        self.output.extend_from(buffer, segment.frames.clone());
        self.next_ordinal += 1;
        Ok(())
    }
}

/// Merges two segmented sources into one alternating track
///
/// Source 2 follows source 1 by proportional position: after each source-1
/// segment, source-2 segments are emitted while source 2 is strictly behind.
/// On a tie source 1 goes first. The last segment of each source is held
/// back and emitted at the very end, source 1 then source 2.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interleaver;

impl Interleaver {
    /// Create an interleaver
    pub fn new() -> Self {
        Interleaver
    }

    /// Assemble the interleaved buffer
    #[allow(clippy::too_many_arguments)]
    pub fn interleave<S: Sample, E: SegmentExport>(
        &self,
        src1: &AudioBuffer<S>,
        splits1: &SplitPoints,
        src2: &AudioBuffer<S>,
        splits2: &SplitPoints,
        export: &mut E,
        sink: &dyn ProgressSink,
        message: &str,
    ) -> SpliceResult<Outcome<AudioBuffer<S>>> {
        Self::check_sources(src1, splits1, src2, splits2)?;

        let mut phase = Phase::new(sink, message);
        if phase.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        let n1 = splits1.segment_count();
        let n2 = splits2.segment_count();
        debug!("Interleaving {} + {} segments", n1, n2);

        let mut assembly = Assembly {
            output: AudioBuffer::with_capacity(
                splits1.active_span() + splits2.active_span(),
                src1.sample_rate(),
                src1.channels(),
            )?,
            next_ordinal: 1,
            export,
        };

        let mut i = 1;
        let mut j = 1;
        let mut ratio2 = splits2.proportion(j);

        while i < n1 {
            if phase.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }

            assembly.emit(Source::First, i, src1, splits1)?;
            let ratio1 = splits1.proportion(i);
            i += 1;

            while ratio1 > ratio2 && j < n2 {
                assembly.emit(Source::Second, j, src2, splits2)?;
                j += 1;
                ratio2 = splits2.proportion(j);
            }

            if !phase.update((ratio1 + ratio2) * 50.0) {
                return Ok(Outcome::Cancelled);
            }
        }

        while j < n2 {
            assembly.emit(Source::Second, j, src2, splits2)?;
            j += 1;
        }

        assembly.emit(Source::First, n1, src1, splits1)?;
        assembly.emit(Source::Second, n2, src2, splits2)?;

        info!(
            "{}: {} segments, {} frames",
            message,
            assembly.next_ordinal - 1,
            assembly.output.frames()
        );
        Ok(Outcome::Completed(assembly.output))
    }

    fn check_sources<S: Sample>(
        src1: &AudioBuffer<S>,
        splits1: &SplitPoints,
        src2: &AudioBuffer<S>,
        splits2: &SplitPoints,
    ) -> SpliceResult<()> {
        if src1.sample_rate() != src2.sample_rate() {
            return Err(SpliceError::FormatMismatch {
                property: "sample rate",
                expected: src1.sample_rate(),
                got: src2.sample_rate(),
            });
        }
        if src1.channels() != src2.channels() {
            return Err(SpliceError::FormatMismatch {
                property: "channel count",
                expected: src1.channels().count(),
                got: src2.channels().count(),
            });
        }
        for (buffer, splits) in [(src1, splits1), (src2, splits2)] {
            if splits.buffer_frames() != buffer.frames() {
                return Err(SpliceError::ConfigError(format!(
                    "split points were computed for {} frames, buffer has {}",
                    splits.buffer_frames(),
                    buffer.frames()
                )));
            }
        }
        Ok(())
    }
}
