//! Segmentation and interleaving engine

/// Silence gate and boundary scans
pub mod boundary;
/// Cross-source assembly
pub mod interleave;
/// Split point selection
pub mod segment;

pub use boundary::{BoundaryFinder, SilenceGate, SilenceWindow};
pub use interleave::{EmittedSegment, Interleaver, NoExport, SegmentExport, Source};
pub use segment::{Segmenter, SplitPoints};
