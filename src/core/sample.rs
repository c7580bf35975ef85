use super::format::BitDepth;
use std::fmt::Debug;

/// Integer PCM sample type the engine can process in place
///
/// Gains are applied in `f64` and rounded back to the native width, so a
/// buffer keeps its sample type from input to output.
pub trait Sample: hound::Sample + Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Bit depth this sample type represents
    const BIT_DEPTH: BitDepth;

    /// Absolute amplitude, without overflow at the type's minimum
    fn amplitude(self) -> u32;

    /// Multiply by `gain`, rounding and saturating to the native range
    fn scale(self, gain: f64) -> Self;
}

impl Sample for i16 {
    const BIT_DEPTH: BitDepth = BitDepth::I16;

    fn amplitude(self) -> u32 {
        u32::from(self.unsigned_abs())
    }

    fn scale(self, gain: f64) -> Self {
        (f64::from(self) * gain)
            .round()
            .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
    }
}

impl Sample for i32 {
    const BIT_DEPTH: BitDepth = BitDepth::I32;

    fn amplitude(self) -> u32 {
        self.unsigned_abs()
    }

    fn scale(self, gain: f64) -> Self {
        (f64::from(self) * gain)
            .round()
            .clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_at_minimum() {
        assert_eq!(i16::MIN.amplitude(), 32768);
        assert_eq!(i32::MIN.amplitude(), 2_147_483_648);
        assert_eq!((-120i16).amplitude(), 120);
    }

    #[test]
    fn test_scale_rounds_and_saturates() {
        assert_eq!(1000i16.scale(0.5), 500);
        assert_eq!(3i16.scale(0.5), 2);
        assert_eq!(i16::MAX.scale(2.0), i16::MAX);
        assert_eq!(i32::MIN.scale(1.0), i32::MIN);
    }

    #[test]
    fn test_unit_gain_is_identity() {
        for s in [i16::MIN, -1, 0, 1, 12345, i16::MAX] {
            assert_eq!(s.scale(1.0), s);
        }
        for s in [i32::MIN, -7, 0, 987_654_321, i32::MAX] {
            assert_eq!(s.scale(1.0), s);
        }
    }
}
