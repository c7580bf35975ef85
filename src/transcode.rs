//! Format conversion through an external program
//!
//! The engine never resamples, remixes or re-encodes. Anything outside the
//! working format goes through a [`Transcoder`] first.

use crate::core::{AudioFormat, FileFormat};
use crate::error::{SpliceError, SpliceResult};
use log::debug;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Converts an audio file on disk into another format
pub trait Transcoder {
    /// Write `input` to `output` in `format`, overwriting `output`
    fn convert(&self, input: &Path, output: &Path, format: &AudioFormat) -> SpliceResult<()>;
}

/// `ffmpeg` subprocess
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
}

impl FfmpegTranscoder {
    /// Use the executable at `program`
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        FfmpegTranscoder {
            program: program.into(),
        }
    }

    /// Executable path
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command-line arguments for one conversion
    pub fn arguments(&self, input: &Path, output: &Path, format: &AudioFormat) -> Vec<OsString> {
        vec![
            "-i".into(),
            input.into(),
            "-ac".into(),
            format.channels().count().to_string().into(),
            "-ar".into(),
            format.sample_rate().to_string().into(),
            "-sample_fmt".into(),
            format.bit_depth().sample_fmt().into(),
            "-loglevel".into(),
            "quiet".into(),
            "-y".into(),
            output.into(),
        ]
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Transcoder for FfmpegTranscoder {
    fn convert(&self, input: &Path, output: &Path, format: &AudioFormat) -> SpliceResult<()> {
        if !input.is_file() {
            return Err(SpliceError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("couldn't find input file {}", input.display()),
            )));
        }
        FileFormat::from_path(input)?;
        FileFormat::from_path(output)?;

        debug!("Converting {} -> {} ({})", input.display(), output.display(), format);
        let result = Command::new(&self.program)
            .args(self.arguments(input, output, format))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                SpliceError::TranscodeError(format!("failed to run {}: {}", self.program.display(), e))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(SpliceError::TranscodeError(format!(
                "{} exited with {} converting {}: {}",
                self.program.display(),
                result.status,
                input.display(),
                stderr.trim()
            )));
        }
        Ok(())
    }
}
