//! One chapter pair, end to end
//!
//! Read source 1, segment it, read source 2, segment it, interleave, write.
//! The whole run can be moved onto a dedicated worker thread with
//! [`spawn_worker`]; the caller then only sees progress reports and a
//! cancellation token.

use crate::config::SpliceConfig;
use crate::core::{AudioBuffer, BitDepth, Sample};
use crate::decoder::WavDecoder;
use crate::encoder::{SegmentWriter, write_wav};
use crate::error::{SpliceError, SpliceResult};
use crate::processor::{Interleaver, NoExport, SegmentExport, Segmenter, SplitPoints};
use crate::progress::{CancellationToken, ChannelProgress, Outcome, ProgressReport, ProgressSink};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Directory, next to the output, holding exported segments
pub const SEGMENTS_DIR_NAME: &str = "InterLivre_Segments";

/// Inputs and outputs of one chapter pair
#[derive(Debug, Clone)]
pub struct SpliceJob {
    /// Source 1 WAV, already in the working format
    pub source1: PathBuf,
    /// Source 2 WAV, already in the working format
    pub source2: PathBuf,
    /// Interleaved WAV to write
    pub output: PathBuf,
    /// Where exported segments go when segment export is on
    pub segments_dir: Option<PathBuf>,
    /// Prepended to every status message
    pub status_prefix: String,
}

impl SpliceJob {
    /// Job with the default status prefix and segments directory
    pub fn new<P: Into<PathBuf>>(source1: P, source2: P, output: P) -> Self {
        SpliceJob {
            source1: source1.into(),
            source2: source2.into(),
            output: output.into(),
            segments_dir: None,
            status_prefix: "Splicing".to_string(),
        }
    }

    /// Export segments into `dir`
    pub fn with_segments_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.segments_dir = Some(dir.into());
        self
    }

    /// Use `prefix` in status messages
    pub fn with_status_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.status_prefix = prefix.into();
        self
    }

    /// File stem of the output, used to name exported segments
    pub fn output_name(&self) -> String {
        self.output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "interleaved".to_string())
    }

    /// Explicit segments directory, or `{output dir}/InterLivre_Segments/{output name}`
    pub fn resolved_segments_dir(&self) -> PathBuf {
        self.segments_dir.clone().unwrap_or_else(|| {
            self.output
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(SEGMENTS_DIR_NAME)
                .join(self.output_name())
        })
    }
}

/// What a finished chapter pair produced
#[derive(Debug, Clone, PartialEq)]
pub struct SpliceSummary {
    /// File written
    pub output: PathBuf,
    /// Frames in the output
    pub frames: usize,
    /// Playback length of the output
    pub duration: Duration,
    /// Segments cut from source 1
    pub source1_segments: usize,
    /// Segments cut from source 2
    pub source2_segments: usize,
}

/// Interleaved buffer plus the split points that produced it
#[derive(Debug, Clone)]
pub struct Spliced<S: Sample> {
    /// Assembled output
    pub output: AudioBuffer<S>,
    /// Split points of source 1
    pub splits1: SplitPoints,
    /// Split points of source 2
    pub splits2: SplitPoints,
}

/// Runs segmentation and interleaving for chapter pairs
#[derive(Debug, Clone, Default)]
pub struct Splicer {
    config: SpliceConfig,
}

impl Splicer {
    /// Splicer for a validated configuration
    pub fn new(config: SpliceConfig) -> Self {
        Splicer { config }
    }

    /// Run configuration
    pub fn config(&self) -> &SpliceConfig {
        &self.config
    }

    /// Splice two in-memory buffers
    ///
    /// Both buffers are faded in place around their cuts, so they are taken
    /// by value.
    pub fn splice_buffers<S: Sample, E: SegmentExport>(
        &self,
        mut src1: AudioBuffer<S>,
        mut src2: AudioBuffer<S>,
        export: &mut E,
        sink: &dyn ProgressSink,
        status_prefix: &str,
    ) -> SpliceResult<Outcome<Spliced<S>>> {
        let segmenter = Segmenter::new(&self.config);

        let splits1 = match segmenter.segment(&mut src1, sink, &format!("{}, segmenting source 1", status_prefix))? {
            Outcome::Completed(splits) => splits,
            Outcome::Cancelled => return Ok(Outcome::Cancelled),
        };
        let splits2 = match segmenter.segment(&mut src2, sink, &format!("{}, segmenting source 2", status_prefix))? {
            Outcome::Completed(splits) => splits,
            Outcome::Cancelled => return Ok(Outcome::Cancelled),
        };

        let outcome = Interleaver::new().interleave(
            &src1,
            &splits1,
            &src2,
            &splits2,
            export,
            sink,
            &format!("{}, interleaving audio", status_prefix),
        )?;
        Ok(outcome.map(|output| Spliced {
            output,
            splits1,
            splits2,
        }))
    }

    /// Splice two WAV files into a new WAV file
    ///
    /// Nothing is written to `job.output` unless the run completes, and
    /// segments exported before a cancellation are deleted again.
    pub fn splice_files(&self, job: &SpliceJob, sink: &dyn ProgressSink) -> SpliceResult<Outcome<SpliceSummary>> {
        match self.config.format().bit_depth() {
            BitDepth::I16 => self.splice_files_as::<i16>(job, sink),
            BitDepth::I32 => self.splice_files_as::<i32>(job, sink),
        }
    }

    fn splice_files_as<S: Sample>(&self, job: &SpliceJob, sink: &dyn ProgressSink) -> SpliceResult<Outcome<SpliceSummary>> {
        if sink.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        let decoder = WavDecoder::new(self.config.format());
        let segmenter = Segmenter::new(&self.config);
        let prefix = &job.status_prefix;

        let mut src1 = decoder.decode::<S, _>(&job.source1).inspect_err(|e| {
            warn!("{}: {}", job.source1.display(), e);
        })?;
        let splits1 = match segmenter.segment(&mut src1, sink, &format!("{}, segmenting source 1", prefix))? {
            Outcome::Completed(splits) => splits,
            Outcome::Cancelled => return Ok(Outcome::Cancelled),
        };

        let mut src2 = decoder.decode::<S, _>(&job.source2).inspect_err(|e| {
            warn!("{}: {}", job.source2.display(), e);
        })?;
        let splits2 = match segmenter.segment(&mut src2, sink, &format!("{}, segmenting source 2", prefix))? {
            Outcome::Completed(splits) => splits,
            Outcome::Cancelled => return Ok(Outcome::Cancelled),
        };

        let message = format!("{}, interleaving audio", prefix);
        let interleaver = Interleaver::new();
        let outcome = if self.config.write_segments() {
            let mut writer = SegmentWriter::new(job.resolved_segments_dir(), job.output_name())?;
            let outcome = interleaver.interleave(&src1, &splits1, &src2, &splits2, &mut writer, sink, &message)?;
            if outcome.is_cancelled() {
                writer.discard()?;
            }
            outcome
        } else {
            interleaver.interleave(&src1, &splits1, &src2, &splits2, &mut NoExport, sink, &message)?
        };
        let Outcome::Completed(output) = outcome else {
            return Ok(Outcome::Cancelled);
        };

        write_wav(&job.output, &output)?;
        info!(
            "Wrote {} ({:.1}s, {} + {} segments)",
            job.output.display(),
            output.duration().as_secs_f64(),
            splits1.segment_count(),
            splits2.segment_count()
        );

        Ok(Outcome::Completed(SpliceSummary {
            output: job.output.clone(),
            frames: output.frames(),
            duration: output.duration(),
            source1_segments: splits1.segment_count(),
            source2_segments: splits2.segment_count(),
        }))
    }
}

/// Background run with a progress channel and a cancellation token
pub struct WorkerHandle<T> {
    progress: Receiver<ProgressReport>,
    token: CancellationToken,
    thread: JoinHandle<SpliceResult<Outcome<T>>>,
}

impl<T> WorkerHandle<T> {
    /// Reports sent by the worker; disconnects when the worker finishes
    pub fn progress(&self) -> &Receiver<ProgressReport> {
        &self.progress
    }

    /// Token observed by the worker
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Ask the worker to stop at its next iteration boundary
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the worker to finish
    pub fn join(self) -> SpliceResult<Outcome<T>> {
        self.thread.join().map_err(|_| SpliceError::WorkerPanicked)?
    }
}

/// Run `work` on a dedicated thread, reporting through a channel
pub fn spawn_worker<T, F>(work: F) -> SpliceResult<WorkerHandle<T>>
where
    T: Send + 'static,
    F: FnOnce(&dyn ProgressSink) -> SpliceResult<Outcome<T>> + Send + 'static,
{
    let (tx, progress) = mpsc::channel();
    let token = CancellationToken::new();
    let sink = ChannelProgress::new(tx, token.clone());

    let thread = thread::Builder::new()
        .name("splice-worker".to_string())
        .spawn(move || work(&sink))?;

    Ok(WorkerHandle {
        progress,
        token,
        thread,
    })
}

/// Run [`Splicer::splice_files`] on a worker thread
pub fn spawn_splice(splicer: Splicer, job: SpliceJob) -> SpliceResult<WorkerHandle<SpliceSummary>> {
    spawn_worker(move |sink| splicer.splice_files(&job, sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AudioFormat, Channels, FileFormat};
    use crate::progress::NoProgress;
    use crate::progress::testing::RecordingSink;
    use tempfile::TempDir;

    const RATE: usize = 8000;
    const LOUD: i16 = 6000;

    fn config(trim: bool, write_segments: bool) -> SpliceConfig {
        SpliceConfig::builder()
            .format(AudioFormat::new(RATE as u32, BitDepth::I16, Channels::Mono, FileFormat::Wav).unwrap())
            .segment_range(Duration::from_secs(5), Duration::from_secs(8))
            .trim_edge_silence(trim)
            .write_segments(write_segments)
            .build()
            .unwrap()
    }

    /// `seconds` of speech with a 0.25 s pause every `every` seconds and
    /// `edge` seconds of silence at both ends
    fn narration(seconds: usize, every: usize, edge: usize) -> AudioBuffer<i16> {
        let frames = seconds * RATE;
        let mut samples = vec![LOUD; frames];
        samples[..edge * RATE].fill(0);
        samples[frames - edge * RATE..].fill(0);
        let mut at = edge * RATE + every * RATE;
        while at + RATE / 4 < frames - edge * RATE {
            samples[at..at + RATE / 4].fill(0);
            at += every * RATE;
        }
        AudioBuffer::new(samples, RATE as u32, Channels::Mono).unwrap()
    }

    fn write_pair(dir: &TempDir) -> SpliceJob {
        let source1 = dir.path().join("fr_01.wav");
        let source2 = dir.path().join("en_01.wav");
        write_wav(&source1, &narration(60, 6, 4)).unwrap();
        write_wav(&source2, &narration(40, 7, 1)).unwrap();
        SpliceJob::new(source1, source2, dir.path().join("book.wav"))
    }

    #[test]
    fn test_splice_buffers_without_trim_keeps_every_frame() {
        let src1 = narration(60, 6, 4);
        let src2 = narration(40, 7, 1);
        let total = src1.frames() + src2.frames();

        let spliced = Splicer::new(config(false, false))
            .splice_buffers(src1, src2, &mut NoExport, &NoProgress, "Chapter")
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(spliced.output.frames(), total);
        assert!(spliced.splits1.segment_count() > 2);
        assert!(spliced.splits2.segment_count() > 2);
    }

    #[test]
    fn test_splice_buffers_with_trim_drops_long_edge_silence() {
        let src1 = narration(60, 6, 4);
        let src2 = narration(40, 7, 1);
        let src2_frames = src2.frames();

        let spliced = Splicer::new(config(true, false))
            .splice_buffers(src1, src2, &mut NoExport, &NoProgress, "Chapter")
            .unwrap()
            .completed()
            .unwrap();

        // Source 1 keeps 1 s around its speech, source 2's 1 s edges are untouched
        assert_eq!(spliced.splits1.first(), 3 * RATE);
        assert_eq!(spliced.splits1.last(), 57 * RATE - 1);
        assert_eq!(spliced.splits2.first(), 0);
        assert_eq!(spliced.splits2.last(), src2_frames);
        assert_eq!(spliced.output.frames(), 54 * RATE - 1 + src2_frames);
    }

    #[test]
    fn test_splice_files_writes_output_and_reports_phases() {
        let dir = TempDir::new().unwrap();
        let job = write_pair(&dir).with_status_prefix("Processing chapters 1/1");
        let sink = RecordingSink::default();

        let summary = Splicer::new(config(false, false))
            .splice_files(&job, &sink)
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(summary.frames, 100 * RATE);
        assert_eq!(summary.duration, Duration::from_secs(100));
        let written = WavDecoder::new(config(false, false).format())
            .decode::<i16, _>(&job.output)
            .unwrap();
        assert_eq!(written.frames(), summary.frames);
        assert!(!dir.path().join(SEGMENTS_DIR_NAME).exists());

        let messages: Vec<String> = sink.reports.borrow().iter().map(|r| r.message.clone()).collect();
        let first_of = |m: &str| messages.iter().position(|x| x == m).unwrap();
        assert!(
            first_of("Processing chapters 1/1, segmenting source 1")
                < first_of("Processing chapters 1/1, segmenting source 2")
        );
        assert!(
            first_of("Processing chapters 1/1, segmenting source 2")
                < first_of("Processing chapters 1/1, interleaving audio")
        );
        assert!(sink.percents().iter().all(|p| (1..=99).contains(p)));
    }

    #[test]
    fn test_splice_files_exports_segments() {
        let dir = TempDir::new().unwrap();
        let job = write_pair(&dir);

        let summary = Splicer::new(config(false, true))
            .splice_files(&job, &NoProgress)
            .unwrap()
            .completed()
            .unwrap();

        let segments_dir = dir.path().join(SEGMENTS_DIR_NAME).join("book");
        assert_eq!(job.resolved_segments_dir(), segments_dir);
        let count = std::fs::read_dir(&segments_dir).unwrap().count();
        assert_eq!(count, summary.source1_segments + summary.source2_segments);
        assert!(segments_dir.join("book_000001_src1_000001.wav").exists());
    }

    #[test]
    fn test_cancelled_splice_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let job = write_pair(&dir);

        let outcome = Splicer::new(config(false, false))
            .splice_files(&job, &RecordingSink::cancelling_after(0))
            .unwrap();
        assert!(outcome.is_cancelled());
        assert!(!job.output.exists());

        let outcome = Splicer::new(config(false, false))
            .splice_files(&job, &RecordingSink::cancelling_after(3))
            .unwrap();
        assert!(outcome.is_cancelled());
        assert!(!job.output.exists());
    }

    /// Cancels on the first report of the interleaving phase
    #[derive(Default)]
    struct CancelWhileInterleaving {
        cancelled: std::cell::Cell<bool>,
    }

    impl ProgressSink for CancelWhileInterleaving {
        fn report(&self, report: ProgressReport) {
            if report.message.ends_with("interleaving audio") {
                self.cancelled.set(true);
            }
        }

        fn is_cancelled(&self) -> bool {
            self.cancelled.get()
        }
    }

    #[test]
    fn test_cancelled_export_leaves_no_segments() {
        let dir = TempDir::new().unwrap();
        let job = write_pair(&dir);

        let outcome = Splicer::new(config(false, true))
            .splice_files(&job, &CancelWhileInterleaving::default())
            .unwrap();

        assert!(outcome.is_cancelled());
        assert!(!job.output.exists());
        assert!(!job.resolved_segments_dir().exists());
    }

    #[test]
    fn test_format_mismatch_is_reported() {
        let dir = TempDir::new().unwrap();
        let job = write_pair(&dir);
        let cd_quality = SpliceConfig::builder()
            .format(AudioFormat::new(44100, BitDepth::I16, Channels::Mono, FileFormat::Wav).unwrap())
            .build()
            .unwrap();

        let result = Splicer::new(cd_quality).splice_files(&job, &NoProgress);
        assert!(matches!(
            result,
            Err(SpliceError::FormatMismatch { property: "sample rate", expected: 44100, got: 8000 })
        ));
        assert!(!job.output.exists());
    }

    #[test]
    fn test_spawned_splice_streams_progress() {
        let dir = TempDir::new().unwrap();
        let job = write_pair(&dir);
        let output = job.output.clone();

        let handle = spawn_splice(Splicer::new(config(true, false)), job).unwrap();
        let reports: Vec<ProgressReport> = handle.progress().iter().collect();
        let summary = handle.join().unwrap().completed().unwrap();

        assert!(!reports.is_empty());
        assert_eq!(summary.output, output);
        assert!(output.exists());
    }

    #[test]
    fn test_spawned_worker_sees_cancellation() {
        let handle = spawn_worker(|sink| {
            while !sink.is_cancelled() {
                thread::sleep(Duration::from_millis(1));
            }
            Ok(Outcome::<()>::Cancelled)
        })
        .unwrap();

        handle.cancel();
        assert!(handle.token().is_cancelled());
        assert!(handle.join().unwrap().is_cancelled());
    }

    #[test]
    fn test_worker_panic_becomes_error() {
        let handle = spawn_worker::<(), _>(|_| panic!("boom")).unwrap();
        assert!(matches!(handle.join(), Err(SpliceError::WorkerPanicked)));
    }
}
