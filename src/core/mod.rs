//! Core audio types and structures

/// Audio buffer and metadata types
pub mod audio;
/// Channel, bit depth and container descriptions
pub mod format;
/// Integer sample abstraction
pub mod sample;

pub use audio::{AudioBuffer, AudioMetadata};
pub use format::{AudioFormat, BitDepth, Channels, FileFormat, SAMPLE_RATES};
pub use sample::Sample;
