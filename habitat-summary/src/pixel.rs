/// Element types that can be stored in image and video summaries.
///
/// Integer pixels are used as-is. Floating point pixels are expected
/// to be in `[0, 1]`; they are scaled to `[0, 255]` and clamped.
pub trait Pixel: Copy {
    fn to_u8(self) -> u8;
}

impl Pixel for u8 {
    fn to_u8(self) -> u8 {
        self
    }
}

impl Pixel for f32 {
    fn to_u8(self) -> u8 {
        (self * 255.).round().clamp(0., 255.) as u8
    }
}

impl Pixel for f64 {
    fn to_u8(self) -> u8 {
        (self * 255.).round().clamp(0., 255.) as u8
    }
}
