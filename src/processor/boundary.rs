use crate::core::{AudioBuffer, BitDepth, Sample};
use std::ops::Range;

/// Amplitude threshold classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SilenceGate {
    threshold: u32,
}

impl SilenceGate {
    /// Gate with an absolute amplitude threshold
    pub fn new(threshold: u32) -> Self {
        SilenceGate { threshold }
    }

    /// Gate at `ratio` of full scale for `bit_depth`
    pub fn from_ratio(ratio: f64, bit_depth: BitDepth) -> Self {
        Self::new((f64::from(bit_depth.max_amplitude()) * ratio).round() as u32)
    }

    /// Absolute threshold
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// A sample is silent iff `|sample| <= threshold`
    pub fn is_silent<S: Sample>(&self, sample: S) -> bool {
        sample.amplitude() <= self.threshold
    }

    /// A frame is silent iff all of its channels are
    pub fn is_silent_frame<S: Sample>(&self, buffer: &AudioBuffer<S>, frame: usize) -> bool {
        buffer
            .frame_slice(frame..frame + 1)
            .iter()
            .all(|&sample| self.is_silent(sample))
    }
}

/// Run of silent frames `[start, end)` with its cut point `mid`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SilenceWindow {
    /// First frame of the run
    pub start: usize,
    /// Integer midpoint, where the cut goes
    pub mid: usize,
    /// One past the last frame of the run
    pub end: usize,
}

impl SilenceWindow {
    /// Window over `[start, end)`
    pub fn new(start: usize, end: usize) -> Self {
        SilenceWindow {
            start,
            mid: start + (end - start) / 2,
            end,
        }
    }

    /// Zero-length window anchored at `at`
    pub fn empty(at: usize) -> Self {
        Self::new(at, at)
    }

    /// Length in frames
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True when no silence was found
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Speech and silence boundary scans over one buffer
pub struct BoundaryFinder<'a, S: Sample> {
    buffer: &'a AudioBuffer<S>,
    gate: SilenceGate,
}

impl<'a, S: Sample> BoundaryFinder<'a, S> {
    /// Scan `buffer` with `gate`
    pub fn new(buffer: &'a AudioBuffer<S>, gate: SilenceGate) -> Self {
        BoundaryFinder { buffer, gate }
    }

    fn is_silent(&self, frame: usize) -> bool {
        self.gate.is_silent_frame(self.buffer, frame)
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let end = range.end.min(self.buffer.frames());
        range.start.min(end)..end
    }

    /// First non-silent frame in `range`, probing every `step` frames
    ///
    /// Returns `None` when every probed frame is silent.
    pub fn speech_start(&self, range: Range<usize>, step: usize) -> Option<usize> {
        let Range { start, end } = self.clamp(range);
        let step = step.max(1);

        let mut i = start;
        while i < end {
            if !self.is_silent(i) {
                // The previous probe was silent, so the onset lies after it.
                let lo = if i >= start + step { i + 1 - step } else { start };
                return (lo..=i).find(|&k| !self.is_silent(k));
            }
            i += step;
        }
        None
    }

    /// Last non-silent frame in `range`, probing backwards every `step` frames
    ///
    /// Returns `None` when every probed frame is silent.
    pub fn speech_end(&self, range: Range<usize>, step: usize) -> Option<usize> {
        let Range { start, end } = self.clamp(range);
        if start >= end {
            return None;
        }
        let step = step.max(1);

        let mut i = end - 1;
        loop {
            if !self.is_silent(i) {
                let hi = (i + step).min(end);
                return (i..hi).rev().find(|&k| !self.is_silent(k));
            }
            if i < start + step {
                return None;
            }
            i -= step;
        }
    }

    /// Longest run of silence in `range`
    ///
    /// Probes every `stride` frames; inside a silent run the walk advances by
    /// the finer `silence_step` to locate the run's end. Runs are clamped to
    /// the range. With no silence at all, an empty window anchored at the
    /// range start is returned.
    pub fn longest_silence(&self, range: Range<usize>, stride: usize, silence_step: usize) -> SilenceWindow {
        let Range { start, end } = self.clamp(range);
        let stride = stride.max(1);
        let silence_step = silence_step.max(1);

        let mut best = SilenceWindow::empty(start);
        let mut i = start;
        while i < end {
            let run_start = i;
            while i < end && self.is_silent(i) {
                i += silence_step;
            }
            let run_end = i.min(end);
            if run_end - run_start > best.len() {
                best = SilenceWindow::new(run_start, run_end);
            }
            i += stride;
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Channels;

    const LOUD: i16 = 5000;

    /// Loud buffer with silent (zero) frames in each of `gaps`
    fn buffer_with_gaps(frames: usize, gaps: &[Range<usize>]) -> AudioBuffer<i16> {
        let mut samples = vec![LOUD; frames];
        for gap in gaps {
            samples[gap.clone()].fill(0);
        }
        AudioBuffer::new(samples, 48000, Channels::Mono).unwrap()
    }

    #[test]
    fn test_gate_is_inclusive() {
        let gate = SilenceGate::new(1000);
        assert!(gate.is_silent(1000i16));
        assert!(gate.is_silent(-1000i16));
        assert!(!gate.is_silent(1001i16));
        assert!(!gate.is_silent(i16::MIN));
        assert!(SilenceGate::new(0).is_silent(0i32));
    }

    #[test]
    fn test_gate_from_ratio() {
        assert_eq!(SilenceGate::from_ratio(0.03052, BitDepth::I16).threshold(), 1000);
        assert_eq!(SilenceGate::from_ratio(0.0, BitDepth::I32).threshold(), 0);
    }

    #[test]
    fn test_speech_start_is_exact() {
        let buffer = buffer_with_gaps(10_000, &[0..1234]);
        let finder = BoundaryFinder::new(&buffer, SilenceGate::new(1000));
        assert_eq!(finder.speech_start(0..10_000, 480), Some(1234));
        assert_eq!(finder.speech_start(0..10_000, 1), Some(1234));
        assert_eq!(finder.speech_start(2000..10_000, 480), Some(2000));
    }

    #[test]
    fn test_speech_end_is_exact() {
        let buffer = buffer_with_gaps(10_000, &[7777..10_000]);
        let finder = BoundaryFinder::new(&buffer, SilenceGate::new(1000));
        assert_eq!(finder.speech_end(0..10_000, 480), Some(7776));
        assert_eq!(finder.speech_end(0..5000, 480), Some(4999));
    }

    #[test]
    fn test_silent_buffer_has_no_speech() {
        let buffer = buffer_with_gaps(5000, &[0..5000]);
        let finder = BoundaryFinder::new(&buffer, SilenceGate::new(1000));
        assert_eq!(finder.speech_start(0..5000, 480), None);
        assert_eq!(finder.speech_end(0..5000, 480), None);
        assert_eq!(finder.speech_end(10..10, 480), None);
    }

    #[test]
    fn test_longest_silence_picks_longest_run() {
        // Probes land on 3600, then 3660 + 360 * k after the first run
        let buffer = buffer_with_gaps(20_000, &[3600..3660, 7260..7560]);
        let finder = BoundaryFinder::new(&buffer, SilenceGate::new(1000));

        let window = finder.longest_silence(0..20_000, 360, 6);
        assert_eq!(window, SilenceWindow { start: 7260, mid: 7410, end: 7560 });
        assert_eq!(window.len(), 300);
    }

    #[test]
    fn test_longest_silence_without_silence_is_empty() {
        let buffer = buffer_with_gaps(20_000, &[]);
        let finder = BoundaryFinder::new(&buffer, SilenceGate::new(1000));

        let window = finder.longest_silence(4000..9000, 360, 6);
        assert!(window.is_empty());
        assert_eq!(window, SilenceWindow::empty(4000));
    }

    #[test]
    fn test_longest_silence_is_clamped_to_range() {
        let buffer = buffer_with_gaps(1000, &[900..1000]);
        let finder = BoundaryFinder::new(&buffer, SilenceGate::new(1000));

        let window = finder.longest_silence(900..997, 7, 6);
        assert_eq!(window.start, 900);
        assert_eq!(window.end, 997);

        // Range past the buffer end is clamped to the buffer
        let window = finder.longest_silence(900..5000, 7, 6);
        assert_eq!(window.end, 1000);
    }

    #[test]
    fn test_stereo_frame_needs_every_channel_silent() {
        // Frame 1 is loud on the right channel only
        let buffer = AudioBuffer::new(vec![0i16, 0, 0, 4000, 0, 0], 48000, Channels::Stereo).unwrap();
        let finder = BoundaryFinder::new(&buffer, SilenceGate::new(1000));
        assert_eq!(finder.speech_start(0..3, 1), Some(1));
        assert_eq!(finder.speech_end(0..3, 1), Some(1));
    }

    #[test]
    fn test_silent_frame_applies_gate_to_each_channel() {
        let gate = SilenceGate::new(1000);
        let buffer =
            AudioBuffer::new(vec![1000i16, -1000, 10, -1001, i16::MIN, 0], 48000, Channels::Stereo).unwrap();
        assert!(gate.is_silent_frame(&buffer, 0));
        assert!(!gate.is_silent_frame(&buffer, 1));
        assert!(!gate.is_silent_frame(&buffer, 2));
    }
}
