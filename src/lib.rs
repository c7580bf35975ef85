#![warn(missing_docs)]

//! # InterLivre: audiobook splicer
//!
//! Interleaves two independently recorded narrations of the same text (two
//! language tracks of one chapter, say) into a single track that switches
//! source only inside natural pauses.
//!
//! ## Pipeline
//!
//! - **Segment** - find speech boundaries and cut each source at the middle
//!   of the longest silence in every `[min, max]` window, fading around
//!   each cut
//! - **Interleave** - alternate segments so both sources advance at the
//!   same proportional pace
//! - **Book** - pair the chapters of two books, convert inputs through
//!   ffmpeg when needed, and splice every pair
//!
//! ## Quick Start
//!
//! ```ignore
//! use interlivre::config::SpliceConfig;
//! use interlivre::progress::NoProgress;
//! use interlivre::splice::{SpliceJob, Splicer};
//!
//! let splicer = Splicer::new(SpliceConfig::default());
//! let job = SpliceJob::new("fr/ch01.wav", "en/ch01.wav", "out/ch01.wav");
//! let outcome = splicer.splice_files(&job, &NoProgress)?;
//! ```

/// Batch processing of whole books
pub mod batch;
/// Validated run configuration
pub mod config;
/// Core audio types and structures
pub mod core;
/// Reading and probing audio files
pub mod decoder;
/// Writing WAV output and segments
pub mod encoder;
/// Error types for splicing operations
pub mod error;
/// Gain envelopes
pub mod filter;
/// Segmentation and interleaving engine
pub mod processor;
/// Progress reporting and cancellation
pub mod progress;
/// TOML settings file
pub mod settings;
/// Chapter-pair pipeline and worker thread
pub mod splice;
/// External format conversion
pub mod transcode;

// Export public types
pub use config::SpliceConfig;
pub use core::{AudioBuffer, AudioFormat, BitDepth, Channels, FileFormat, Sample};
pub use error::{SpliceError, SpliceResult};
pub use progress::{CancellationToken, Outcome, ProgressReport, ProgressSink};
pub use splice::{SpliceJob, Splicer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
