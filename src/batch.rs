//! Whole-book driver
//!
//! Pairs the chapter files of two books by sorted position, brings every
//! input into the working format, splices each pair and, when asked for a
//! compressed output, transcodes the finished chapters.

use crate::core::{AudioFormat, FileFormat};
use crate::decoder::is_working_format;
use crate::error::{SpliceError, SpliceResult};
use crate::progress::{Outcome, Phase, ProgressReport, ProgressSink};
use crate::splice::{SEGMENTS_DIR_NAME, SpliceJob, SpliceSummary, Splicer};
use crate::transcode::Transcoder;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Scratch directory created under the output directory for the run
pub const WORKSPACE_DIR_NAME: &str = "interlivre-tmp";

/// The two books and where their interleaving goes
#[derive(Debug, Clone)]
pub struct BookJob {
    /// Chapters of source 1
    pub source1_dir: PathBuf,
    /// Chapters of source 2
    pub source2_dir: PathBuf,
    /// Destination of the interleaved chapters
    pub output_dir: PathBuf,
    /// Base name of the output files
    pub name: String,
}

/// Result of a whole-book run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookSummary {
    /// One entry per written chapter, in order
    pub chapters: Vec<SpliceSummary>,
    /// Files left over because one book has more chapters than the other
    pub unpaired: usize,
}

impl BookSummary {
    /// Paths of the written chapters
    pub fn outputs(&self) -> Vec<&Path> {
        self.chapters.iter().map(|c| c.output.as_path()).collect()
    }
}

/// Audio files (wav, mp3) directly inside `dir`, sorted case-insensitively
pub fn list_audio_files<P: AsRef<Path>>(dir: P) -> SpliceResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() && FileFormat::from_path(&path).is_ok() {
            files.push(path);
        }
    }
    files.sort_by_key(|p| {
        p.file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    Ok(files)
}

/// Output file name of chapter `index` (from 1) out of `count`
///
/// A single chapter keeps the bare name; otherwise the index is padded to
/// two digits, or five above 99 chapters.
pub fn chapter_file_name(name: &str, index: usize, count: usize) -> String {
    if count > 99 {
        format!("{}_{:05}.wav", name, index)
    } else if count > 1 {
        format!("{}_{:02}.wav", name, index)
    } else {
        format!("{}.wav", name)
    }
}

/// Scratch directories for converted inputs and pre-transcode outputs
struct Workspace {
    root: PathBuf,
    book1: PathBuf,
    book2: PathBuf,
    interleaved: PathBuf,
}

impl Workspace {
    fn create(output_dir: &Path) -> SpliceResult<Self> {
        let root = output_dir.join(WORKSPACE_DIR_NAME);
        let workspace = Workspace {
            book1: root.join("book1"),
            book2: root.join("book2"),
            interleaved: root.join("interleaved"),
            root,
        };
        for dir in [&workspace.book1, &workspace.book2, &workspace.interleaved] {
            fs::create_dir_all(dir)?;
        }
        Ok(workspace)
    }

    fn remove(&self) {
        if let Err(e) = fs::remove_dir_all(&self.root) {
            warn!("Could not remove {}: {}", self.root.display(), e);
        }
    }
}

/// Splices every chapter pair of two books
pub struct BookSplicer<T: Transcoder> {
    splicer: Splicer,
    output_format: AudioFormat,
    transcoder: T,
}

impl<T: Transcoder> BookSplicer<T> {
    /// `output_format` must equal the splicer's working format except for
    /// the container
    pub fn new(splicer: Splicer, output_format: AudioFormat, transcoder: T) -> SpliceResult<Self> {
        let working = splicer.config().format();
        if output_format.with_file_format(working.file_format()) != working {
            return Err(SpliceError::ConfigError(format!(
                "output format ({}) differs from working format ({}) beyond the container",
                output_format, working
            )));
        }
        Ok(BookSplicer {
            splicer,
            output_format,
            transcoder,
        })
    }

    /// Splice the whole book
    ///
    /// The scratch workspace is removed afterwards whatever the outcome.
    pub fn run(&self, job: &BookJob, sink: &dyn ProgressSink) -> SpliceResult<Outcome<BookSummary>> {
        if sink.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        let files1 = list_audio_files(&job.source1_dir)?;
        let files2 = list_audio_files(&job.source2_dir)?;
        let count = files1.len().min(files2.len());
        if count == 0 {
            return Err(SpliceError::ConfigError(format!(
                "no chapter pairs: {} audio files in {}, {} in {}",
                files1.len(),
                job.source1_dir.display(),
                files2.len(),
                job.source2_dir.display()
            )));
        }
        let unpaired = files1.len().max(files2.len()) - count;
        if unpaired > 0 {
            warn!(
                "Chapter counts differ ({} vs {}), ignoring the last {}",
                files1.len(),
                files2.len(),
                unpaired
            );
        }

        fs::create_dir_all(&job.output_dir)?;
        sink.report(ProgressReport::new(1.0, "Creating temporary workspace"));
        let workspace = Workspace::create(&job.output_dir)?;

        let result = self.run_in(job, &workspace, &files1[..count], &files2[..count], sink);
        workspace.remove();

        Ok(result?.map(|chapters| BookSummary { chapters, unpaired }))
    }

    fn run_in(
        &self,
        job: &BookJob,
        workspace: &Workspace,
        files1: &[PathBuf],
        files2: &[PathBuf],
        sink: &dyn ProgressSink,
    ) -> SpliceResult<Outcome<Vec<SpliceSummary>>> {
        let Outcome::Completed((inputs1, inputs2)) = self.prepare_inputs(workspace, files1, files2, sink)? else {
            return Ok(Outcome::Cancelled);
        };

        let count = inputs1.len();
        let mut chapters = Vec::with_capacity(count);
        for (i, (source1, source2)) in inputs1.into_iter().zip(inputs2).enumerate() {
            if sink.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }

            let status = format!("Processing chapters {}/{}", i + 1, count);
            sink.report(ProgressReport::new(i as f64 / count as f64 * 100.0, status.as_str()));

            let file_name = chapter_file_name(&job.name, i + 1, count);
            let stem = file_name.trim_end_matches(".wav").to_string();
            let transcode_output = self.output_format.file_format() != FileFormat::Wav;
            let wav_output = if transcode_output {
                workspace.interleaved.join(&file_name)
            } else {
                job.output_dir.join(&file_name)
            };

            let splice_job = SpliceJob::new(source1, source2, wav_output.clone())
                .with_status_prefix(status)
                .with_segments_dir(job.output_dir.join(SEGMENTS_DIR_NAME).join(&stem));
            let Outcome::Completed(mut summary) = self.splicer.splice_files(&splice_job, sink)? else {
                return Ok(Outcome::Cancelled);
            };

            if transcode_output {
                let target = job
                    .output_dir
                    .join(format!("{}.{}", stem, self.output_format.file_format().extension()));
                sink.report(ProgressReport::new(
                    99.0,
                    "Converting interleaved audio to selected output format",
                ));
                self.transcoder.convert(&wav_output, &target, &self.output_format)?;
                fs::remove_file(&wav_output)?;
                summary.output = target;
            }

            info!("Chapter {}/{} -> {}", i + 1, count, summary.output.display());
            chapters.push(summary);
        }

        Ok(Outcome::Completed(chapters))
    }

    /// Working-format copies of every paired input
    ///
    /// Files already in the working format are used in place.
    fn prepare_inputs(
        &self,
        workspace: &Workspace,
        files1: &[PathBuf],
        files2: &[PathBuf],
        sink: &dyn ProgressSink,
    ) -> SpliceResult<Outcome<(Vec<PathBuf>, Vec<PathBuf>)>> {
        let working = self.splicer.config().format();
        let total = files1.len() + files2.len();
        let mut phase = Phase::new(sink, "Converting input files");
        let mut done = 0;

        let mut prepared = [Vec::with_capacity(files1.len()), Vec::with_capacity(files2.len())];
        for (k, (files, tmp_dir)) in [(files1, &workspace.book1), (files2, &workspace.book2)]
            .into_iter()
            .enumerate()
        {
            for file in files {
                if phase.is_cancelled() {
                    return Ok(Outcome::Cancelled);
                }

                let input = if is_working_format(file, &working)? {
                    debug!("{} is already in the working format", file.display());
                    file.clone()
                } else {
                    let stem = file.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
                    let converted = tmp_dir.join(stem).with_extension("wav");
                    self.transcoder.convert(file, &converted, &working)?;
                    converted
                };
                prepared[k].push(input);

                done += 1;
                if !phase.update(done as f64 / total as f64 * 100.0) {
                    return Ok(Outcome::Cancelled);
                }
            }
        }

        let [inputs1, inputs2] = prepared;
        Ok(Outcome::Completed((inputs1, inputs2)))
    }
}
