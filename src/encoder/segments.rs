use super::wav::WavEncoder;
use crate::core::{AudioBuffer, Sample};
use crate::error::SpliceResult;
use crate::processor::{EmittedSegment, SegmentExport};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes every emitted segment to its own WAV file
#[derive(Debug)]
pub struct SegmentWriter {
    dir: PathBuf,
    output_name: String,
    written: Vec<PathBuf>,
}

impl SegmentWriter {
    /// Writer into `dir` (created if missing), naming files after `output_name`
    pub fn new<P: AsRef<Path>>(dir: P, output_name: impl Into<String>) -> SpliceResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(SegmentWriter {
            dir,
            output_name: output_name.into(),
            written: Vec::new(),
        })
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far, in output order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Delete every file written so far, and the directory if that leaves it empty
    pub fn discard(self) -> SpliceResult<()> {
        for path in &self.written {
            fs::remove_file(path)?;
        }
        if fs::remove_dir(&self.dir).is_err() {
            debug!("Keeping non-empty {}", self.dir.display());
        }
        debug!("Discarded {} segments", self.written.len());
        Ok(())
    }
}

impl SegmentExport for SegmentWriter {
    fn export<S: Sample>(&mut self, segment: &EmittedSegment, source: &AudioBuffer<S>) -> SpliceResult<()> {
        let path = self.dir.join(segment.file_name(&self.output_name));
        let mut encoder = WavEncoder::for_buffer(&path, source)?;
        encoder.encode_frames(source, segment.frames.clone())?;
        encoder.finalize()?;
        debug!("Wrote segment {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Channels;
    use crate::processor::{Interleaver, SplitPoints};
    use crate::progress::NoProgress;
    use hound::WavReader;
    use tempfile::TempDir;

    #[test]
    fn test_segments_are_written_in_output_order() {
        let dir = TempDir::new().unwrap();
        let segments_dir = dir.path().join("InterLivre_Segments").join("chapter");
        let mut writer = SegmentWriter::new(&segments_dir, "book_01").unwrap();

        let src1 = AudioBuffer::new(vec![1i16; 100], 48000, Channels::Mono).unwrap();
        let src2 = AudioBuffer::new(vec![2i16; 60], 48000, Channels::Mono).unwrap();
        let splits1 = SplitPoints::new(vec![0, 40, 100], 100).unwrap();
        let splits2 = SplitPoints::new(vec![0, 30, 60], 60).unwrap();

        let output = Interleaver::new()
            .interleave(&src1, &splits1, &src2, &splits2, &mut writer, &NoProgress, "interleaving")
            .unwrap()
            .completed()
            .unwrap();
        assert_eq!(output.frames(), 160);

        let names: Vec<String> = writer
            .written()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "book_01_000001_src1_000001.wav",
                "book_01_000002_src2_000001.wav",
                "book_01_000003_src1_000002.wav",
                "book_01_000004_src2_000002.wav",
            ]
        );

        let mut reader = WavReader::open(segments_dir.join("book_01_000003_src1_000002.wav")).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1; 60]);
    }

    #[test]
    fn test_discard_removes_only_written_segments() {
        let dir = TempDir::new().unwrap();
        let src = AudioBuffer::new(vec![1i16; 100], 48000, Channels::Mono).unwrap();
        let segment = EmittedSegment {
            ordinal: 1,
            source: crate::processor::Source::First,
            index: 1,
            frames: 0..50,
        };

        let fresh = dir.path().join("fresh");
        let mut writer = SegmentWriter::new(&fresh, "book").unwrap();
        writer.export(&segment, &src).unwrap();
        writer.discard().unwrap();
        assert!(!fresh.exists());

        // A directory holding other files survives
        let shared = dir.path().join("shared");
        fs::create_dir_all(&shared).unwrap();
        fs::write(shared.join("notes.txt"), b"keep").unwrap();
        let mut writer = SegmentWriter::new(&shared, "book").unwrap();
        writer.export(&segment, &src).unwrap();
        writer.discard().unwrap();
        assert!(shared.join("notes.txt").exists());
        assert!(!shared.join("book_000001_src1_000001.wav").exists());
    }
}
