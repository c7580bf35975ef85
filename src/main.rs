//! InterLivre command line interface
//!
//! Splices two narrations of the same book into one alternating track.

use clap::{Parser, Subcommand};
use interlivre::batch::{BookJob, BookSplicer};
use interlivre::config::SpliceConfig;
use interlivre::core::{BitDepth, Sample};
use interlivre::decoder::{WavDecoder, is_working_format, probe};
use interlivre::encoder::SegmentWriter;
use interlivre::error::SpliceResult;
use interlivre::processor::{EmittedSegment, SegmentExport, Segmenter, Source};
use interlivre::progress::{LogProgress, Outcome, cancel_on};
use interlivre::settings::{Overrides, Settings};
use interlivre::splice::{SpliceJob, Splicer, WorkerHandle, spawn_splice, spawn_worker};
use interlivre::transcode::FfmpegTranscoder;
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "interlivre")]
#[command(about = "Audiobook splicer - interleave two narrations at natural pauses", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML settings file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Shortest segment in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    min_seg: Option<f64>,

    /// Longest segment in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    max_seg: Option<f64>,

    /// Silence threshold as a fraction of full scale
    #[arg(long, global = true, value_name = "RATIO")]
    threshold: Option<f64>,

    /// Also write every segment to its own file
    #[arg(long, global = true)]
    write_segments: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Splice one chapter pair (WAV files in the working format)
    Splice {
        /// Source 1 WAV file
        #[arg(value_name = "SRC1")]
        source1: PathBuf,

        /// Source 2 WAV file
        #[arg(value_name = "SRC2")]
        source2: PathBuf,

        /// Output WAV file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Splice every chapter pair of two books
    Book {
        /// Directory with the chapters of source 1
        #[arg(value_name = "SRC1_DIR")]
        source1_dir: PathBuf,

        /// Directory with the chapters of source 2
        #[arg(value_name = "SRC2_DIR")]
        source2_dir: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Base name of the output files
        #[arg(short, long, default_value = "interleaved")]
        name: String,

        /// Output container (wav, mp3)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Print the split points of a single file
    Segment {
        /// Input WAV file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Write each segment into this directory
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,
    },

    /// Probe audio file for metadata
    Probe {
        /// Input audio file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    info!("interlivre {}", interlivre::VERSION);

    let mut settings = Settings::load_or_default(cli.config.as_deref())?;
    settings.apply(&Overrides {
        min_seconds: cli.min_seg,
        max_seconds: cli.max_seg,
        noise_threshold_ratio: cli.threshold,
        write_segments: cli.write_segments,
        file_format: match &cli.command {
            Commands::Book { format, .. } => format.clone(),
            _ => None,
        },
    });
    let config = settings.to_config()?;
    info!("Working format: {}", config.format());

    match cli.command {
        Commands::Splice {
            source1,
            source2,
            output,
        } => {
            let handle = spawn_splice(Splicer::new(config), SpliceJob::new(source1, source2, output))?;
            if let Outcome::Completed(summary) = watch(handle)? {
                println!(
                    "{}: {:.1}s ({} + {} segments)",
                    summary.output.display(),
                    summary.duration.as_secs_f64(),
                    summary.source1_segments,
                    summary.source2_segments
                );
            }
        }
        Commands::Book {
            source1_dir,
            source2_dir,
            output,
            name,
            ..
        } => {
            let book = BookSplicer::new(
                Splicer::new(config),
                settings.output_format()?,
                FfmpegTranscoder::new(settings.tools.ffmpeg.clone()),
            )?;
            let job = BookJob {
                source1_dir,
                source2_dir,
                output_dir: output,
                name,
            };
            let handle = spawn_worker(move |sink| book.run(&job, sink))?;
            if let Outcome::Completed(summary) = watch(handle)? {
                for path in summary.outputs() {
                    println!("{}", path.display());
                }
                println!("Finished! {} chapters", summary.chapters.len());
            }
        }
        Commands::Segment { input, export } => match config.format().bit_depth() {
            BitDepth::I16 => segment_file::<i16>(&config, &input, export.as_deref())?,
            BitDepth::I32 => segment_file::<i32>(&config, &input, export.as_deref())?,
        },
        Commands::Probe { input } => {
            let metadata = probe(&input)?;
            println!("File:        {}", input.display());
            println!("Codec:       {}", metadata.codec);
            println!("Sample rate: {} Hz", metadata.sample_rate);
            println!("Channels:    {}", metadata.channels);
            if let Some(bits) = metadata.bits_per_sample {
                println!("Bit depth:   {}", bits);
            }
            if let Some(secs) = metadata.duration_secs() {
                println!("Duration:    {:.2}s", secs);
            }
            let ready = is_working_format(&input, &config.format())?;
            println!("Needs conversion: {}", if ready { "no" } else { "yes" });
        }
    }

    Ok(())
}

/// Log worker progress on this thread until the worker is done
///
/// Ctrl+C cancels the worker; it stops at its next iteration boundary
/// without writing the output.
fn watch<T>(handle: WorkerHandle<T>) -> SpliceResult<Outcome<T>> {
    cancel_on(handle.token().clone(), tokio::signal::ctrl_c())?;

    let mut last = None;
    for report in handle.progress().iter() {
        let key = (report.percent, report.message.clone());
        if last.as_ref() != Some(&key) {
            info!("[{:>2}%] {}", report.percent, report.message);
            last = Some(key);
        }
    }

    let outcome = handle.join()?;
    if outcome.is_cancelled() {
        println!("Cancelled");
    }
    Ok(outcome)
}

fn segment_file<S: Sample>(config: &SpliceConfig, input: &Path, export: Option<&Path>) -> SpliceResult<()> {
    let mut buffer = WavDecoder::new(config.format()).decode::<S, _>(input)?;
    let sink = LogProgress::default();
    let Outcome::Completed(splits) = Segmenter::new(config).segment(&mut buffer, &sink, "Segmenting")? else {
        return Ok(());
    };

    let rate = f64::from(buffer.sample_rate());
    for (k, range) in splits.segments().enumerate() {
        println!(
            "{:>4}  {:>10.3}s - {:>10.3}s  ({:.2}s)",
            k + 1,
            range.start as f64 / rate,
            range.end as f64 / rate,
            (range.end - range.start) as f64 / rate
        );
    }

    if let Some(dir) = export {
        let name = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "segment".to_string());
        let mut writer = SegmentWriter::new(dir, name)?;
        for (k, frames) in splits.segments().enumerate() {
            let segment = EmittedSegment {
                ordinal: k + 1,
                source: Source::First,
                index: k + 1,
                frames,
            };
            writer.export(&segment, &buffer)?;
        }
        println!("Wrote {} segments to {}", writer.written().len(), writer.dir().display());
    }
    Ok(())
}
