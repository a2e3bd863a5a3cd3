//! TIFF frame decoding.
//!
//! Frames are single-channel (grayscale) TIFF images of any integer or
//! floating sample format. Multi-channel images are rejected rather than
//! flattened, since they would not map onto one pixel per detector position.

use crate::{Error, Result};
use ptycho_core::{Frame, FrameGeometry};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;

/// Decodes one image into a flattened row-major frame.
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be opened and [`Error::Decode`]
/// if it is not a readable grayscale TIFF.
pub fn read_frame<P: AsRef<Path>>(path: P) -> Result<Frame> {
    decode(path.as_ref()).map(|(frame, _)| frame)
}

/// Decodes one image and reports its width, height and element type.
///
/// # Errors
/// Same as [`read_frame`]; additionally fails if the image is empty.
pub fn probe<P: AsRef<Path>>(path: P) -> Result<FrameGeometry> {
    let (frame, (width, height)) = decode(path.as_ref())?;
    Ok(FrameGeometry::new(width, height, frame.element_type())?)
}

fn decode(path: &Path) -> Result<(Frame, (usize, usize))> {
    let decode_err = |reason: String| Error::Decode {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path)?;
    let mut decoder =
        Decoder::new(BufReader::new(file)).map_err(|e| decode_err(e.to_string()))?;

    let (width, height) = decoder.dimensions().map_err(|e| decode_err(e.to_string()))?;
    match decoder.colortype().map_err(|e| decode_err(e.to_string()))? {
        ColorType::Gray(_) => {}
        other => return Err(decode_err(format!("unsupported color type {other:?}"))),
    }

    let frame = match decoder.read_image().map_err(|e| decode_err(e.to_string()))? {
        DecodingResult::U8(px) => Frame::U8(px),
        DecodingResult::U16(px) => Frame::U16(px),
        DecodingResult::U32(px) => Frame::U32(px),
        DecodingResult::U64(px) => Frame::U64(px),
        DecodingResult::I8(px) => Frame::I8(px),
        DecodingResult::I16(px) => Frame::I16(px),
        DecodingResult::I32(px) => Frame::I32(px),
        DecodingResult::I64(px) => Frame::I64(px),
        DecodingResult::F32(px) => Frame::F32(px),
        DecodingResult::F64(px) => Frame::F64(px),
        #[allow(unreachable_patterns)]
        _ => return Err(decode_err("unsupported sample format".to_string())),
    };

    let (width, height) = (width as usize, height as usize);
    if frame.len() != width * height {
        return Err(decode_err(format!(
            "{} samples decoded for a {width}x{height} image",
            frame.len()
        )));
    }
    log::debug!("decoded {} ({width}x{height} {})", path.display(), frame.element_type());
    Ok((frame, (width, height)))
}
