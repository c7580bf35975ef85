//! Writing engine output

/// Per-segment export
pub mod segments;
/// WAV writing
pub mod wav;

pub use segments::SegmentWriter;
pub use wav::{WavEncoder, write_wav};
