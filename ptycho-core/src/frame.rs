//! Decoded image frames and their pixel element types.

use std::fmt;

/// Storage type of a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl ElementType {
    /// Short lowercase name, as used in attributes and log output.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pixel value that can be folded into floating-point aggregates.
pub trait Pixel: Copy {
    fn to_f64(self) -> f64;
}

macro_rules! impl_pixel {
    ($($ty:ty),*) => {
        $(
            impl Pixel for $ty {
                #[inline]
                #[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_pixel!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// One decoded image, flattened row-major into a pixel vector.
///
/// The variant records the element type the image was stored with, so rows
/// can be written to the container without conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Runs `$body` with `$px` bound to the frame's typed pixel slice.
#[macro_export]
macro_rules! with_pixels {
    ($frame:expr, $px:ident => $body:expr) => {
        match $frame {
            $crate::frame::Frame::U8($px) => $body,
            $crate::frame::Frame::U16($px) => $body,
            $crate::frame::Frame::U32($px) => $body,
            $crate::frame::Frame::U64($px) => $body,
            $crate::frame::Frame::I8($px) => $body,
            $crate::frame::Frame::I16($px) => $body,
            $crate::frame::Frame::I32($px) => $body,
            $crate::frame::Frame::I64($px) => $body,
            $crate::frame::Frame::F32($px) => $body,
            $crate::frame::Frame::F64($px) => $body,
        }
    };
}

impl Frame {
    /// Element type of the pixels.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::U8(_) => ElementType::U8,
            Self::U16(_) => ElementType::U16,
            Self::U32(_) => ElementType::U32,
            Self::U64(_) => ElementType::U64,
            Self::I8(_) => ElementType::I8,
            Self::I16(_) => ElementType::I16,
            Self::I32(_) => ElementType::I32,
            Self::I64(_) => ElementType::I64,
            Self::F32(_) => ElementType::F32,
            Self::F64(_) => ElementType::F64,
        }
    }

    /// Number of pixels in the flattened frame.
    #[must_use]
    pub fn len(&self) -> usize {
        with_pixels!(self, px => px.len())
    }

    /// Returns true if the frame holds no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Arithmetic mean of all pixels, accumulated in `f64`.
    ///
    /// Returns 0.0 for an empty frame.
    #[must_use]
    pub fn mean(&self) -> f64 {
        with_pixels!(self, px => mean_of(px))
    }

    /// Adds every pixel into the matching slot of `sum`.
    ///
    /// # Panics
    /// Panics if `sum` is shorter than the frame.
    pub fn accumulate_into(&self, sum: &mut [f64]) {
        with_pixels!(self, px => accumulate(px, sum));
    }
}

fn mean_of<T: Pixel>(pixels: &[T]) -> f64 {
    if pixels.is_empty() {
        return 0.0;
    }
    let sum: f64 = pixels.iter().map(|&p| p.to_f64()).sum();
    #[allow(clippy::cast_precision_loss)]
    let n = pixels.len() as f64;
    sum / n
}

fn accumulate<T: Pixel>(pixels: &[T], sum: &mut [f64]) {
    assert!(sum.len() >= pixels.len(), "accumulator shorter than frame");
    for (acc, &p) in sum.iter_mut().zip(pixels) {
        *acc += p.to_f64();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_element_type_reported() {
        assert_eq!(Frame::U16(vec![1, 2]).element_type(), ElementType::U16);
        assert_eq!(Frame::F32(vec![]).element_type(), ElementType::F32);
        assert_eq!(ElementType::F64.to_string(), "float64");
    }

    #[test]
    fn test_mean_of_constant_frame_is_exact() {
        let frame = Frame::U16(vec![7; 16]);
        assert_eq!(frame.mean(), 7.0);
        assert_eq!(frame.len(), 16);
    }

    #[test]
    fn test_mean_mixed_values() {
        let frame = Frame::I16(vec![-2, 0, 3, 7]);
        assert_relative_eq!(frame.mean(), 2.0);
        assert_eq!(Frame::U8(vec![]).mean(), 0.0);
    }

    #[test]
    fn test_accumulate_into_sums_elementwise() {
        let mut sum = vec![0.0; 3];
        Frame::U8(vec![1, 2, 3]).accumulate_into(&mut sum);
        Frame::F32(vec![0.5, 0.5, 0.5]).accumulate_into(&mut sum);
        assert_eq!(sum, vec![1.5, 2.5, 3.5]);
    }

    #[test]
    #[should_panic(expected = "accumulator shorter than frame")]
    fn test_accumulate_into_short_accumulator_panics() {
        let mut sum = vec![0.0; 2];
        Frame::U8(vec![1, 2, 3]).accumulate_into(&mut sum);
    }
}
