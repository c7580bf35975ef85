//! Gain envelopes applied in place around cut points

/// Linear fades
pub mod fade;

pub use fade::LinearFade;

use crate::core::{AudioBuffer, Sample};
use std::ops::Range;

/// Trait for gain envelopes
pub trait Envelope {
    /// Gain for position `index` of a `width`-frame range
    fn gain_at(&self, index: usize, width: usize) -> f64;

    /// Scale every channel of each frame in `frames` by the envelope, in place
    fn apply<S: Sample>(&self, buffer: &mut AudioBuffer<S>, frames: Range<usize>) {
        let width = frames.len();
        for (offset, frame) in frames.enumerate() {
            let gain = self.gain_at(offset, width);
            for sample in buffer.frame_mut(frame) {
                *sample = sample.scale(gain);
            }
        }
    }
}
