//! Reading audio into the engine

/// Container probing
pub mod probe;
/// WAV reading
pub mod wav;

pub use probe::{is_working_format, probe};
pub use wav::WavDecoder;
