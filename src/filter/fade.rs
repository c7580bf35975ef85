use super::Envelope;
use crate::error::{SpliceError, SpliceResult};

/// Linear gain ramp between two gains
///
/// Across a range of `n` frames the gains are evenly spaced from `start_gain`
/// to `end_gain`, both endpoints included.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearFade {
    start_gain: f64,
    end_gain: f64,
}

impl LinearFade {
    /// Create a ramp; both gains must lie in [0.0, 1.0]
    pub fn new(start_gain: f64, end_gain: f64) -> SpliceResult<Self> {
        for gain in [start_gain, end_gain] {
            if !(0.0..=1.0).contains(&gain) {
                return Err(SpliceError::ConfigError(format!(
                    "Fade gain must be between 0.0 and 1.0, got {}",
                    gain
                )));
            }
        }

        Ok(LinearFade {
            start_gain,
            end_gain,
        })
    }

    /// Full-scale to silence
    pub fn fade_out() -> Self {
        LinearFade {
            start_gain: 1.0,
            end_gain: 0.0,
        }
    }

    /// Silence to full-scale
    pub fn fade_in() -> Self {
        LinearFade {
            start_gain: 0.0,
            end_gain: 1.0,
        }
    }
}

impl Envelope for LinearFade {
    fn gain_at(&self, index: usize, width: usize) -> f64 {
        if width <= 1 {
            return self.start_gain;
        }
        let t = index as f64 / (width - 1) as f64;
        self.start_gain + (self.end_gain - self.start_gain) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AudioBuffer, Channels};

    fn constant(value: i16, frames: usize) -> AudioBuffer<i16> {
        AudioBuffer::new(vec![value; frames], 48000, Channels::Mono).unwrap()
    }

    #[test]
    fn test_fade_out_endpoints() {
        let mut buffer = constant(1000, 10);
        LinearFade::fade_out().apply(&mut buffer, 0..5);

        let samples = buffer.samples();
        assert_eq!(samples[0], 1000);
        assert_eq!(samples[2], 500);
        assert_eq!(samples[4], 0);
        // Outside the range is untouched
        assert_eq!(&samples[5..], &[1000; 5]);
    }

    #[test]
    fn test_fade_in_is_sample_accurate() {
        let mut buffer = constant(-800, 12);
        LinearFade::fade_in().apply(&mut buffer, 3..8);

        let samples = buffer.samples();
        assert_eq!(&samples[..3], &[-800; 3]);
        assert_eq!(&samples[3..8], &[0, -200, -400, -600, -800]);
        assert_eq!(&samples[8..], &[-800; 4]);
    }

    #[test]
    fn test_unit_gain_is_idempotent() {
        let original: Vec<i16> = (0..200).map(|i| ((i * 331) % 20000 - 10000) as i16).collect();
        let mut buffer = AudioBuffer::new(original.clone(), 48000, Channels::Mono).unwrap();
        let unity = LinearFade::new(1.0, 1.0).unwrap();

        unity.apply(&mut buffer, 0..200);
        unity.apply(&mut buffer, 50..150);
        assert_eq!(buffer.samples(), original.as_slice());
    }

    #[test]
    fn test_stereo_frames_fade_together() {
        let mut buffer = AudioBuffer::new(vec![100i32, -100, 100, -100, 100, -100], 48000, Channels::Stereo).unwrap();
        LinearFade::fade_out().apply(&mut buffer, 0..3);
        assert_eq!(buffer.samples(), &[100, -100, 50, -50, 0, 0]);
    }

    #[test]
    fn test_empty_and_single_frame_ranges() {
        let mut buffer = constant(700, 4);
        LinearFade::fade_out().apply(&mut buffer, 2..2);
        assert_eq!(buffer.samples(), &[700; 4]);

        LinearFade::fade_in().apply(&mut buffer, 1..2);
        assert_eq!(buffer.samples(), &[700, 0, 700, 700]);
    }

    #[test]
    fn test_invalid_gain() {
        assert!(LinearFade::new(1.2, 0.0).is_err());
        assert!(LinearFade::new(0.0, -0.5).is_err());
    }
}
