//! JPEG encoding of captured frames.

use super::CaptureError;
use crate::capture::Frame;
use crate::orientation::Orientation;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage};

/// Rotates `frame` clockwise by `rotation` and encodes it as JPEG.
///
/// The frame is consumed so its pixel buffer moves into the image
/// without a copy.
pub fn encode_jpeg(
    frame: Frame,
    rotation: Orientation,
    quality: u8,
) -> Result<Vec<u8>, CaptureError> {
    let (width, height, sequence) = (frame.width(), frame.height(), frame.sequence());
    let len = frame.pixels().len();

    let image = RgbImage::from_raw(width, height, frame.into_pixels()).ok_or_else(|| {
        CaptureError::EncodeFailed(format!(
            "{} bytes do not fill a {}x{} RGB frame",
            len, width, height
        ))
    })?;

    let image = match rotation {
        Orientation::Deg0 => image,
        Orientation::Deg90 => imageops::rotate90(&image),
        Orientation::Deg180 => imageops::rotate180(&image),
        Orientation::Deg270 => imageops::rotate270(&image),
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100))
        .encode_image(&image)
        .map_err(|e| CaptureError::EncodeFailed(e.to_string()))?;

    tracing::trace!(
        sequence,
        rotation = rotation.degrees(),
        bytes = jpeg.len(),
        "Encoded frame"
    );

    Ok(jpeg)
}
