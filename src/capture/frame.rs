//! Frame type representing a captured image with metadata.

use super::FacingMode;
use std::time::Instant;

/// Bytes per pixel of the packed RGB8 layout every device produces.
pub const BYTES_PER_PIXEL: usize = 3;

/// A single captured frame from a camera device.
///
/// Pixels are packed RGB8, row-major, with no row padding.
#[derive(Clone)]
pub struct Frame {
    /// Raw RGB8 pixel data.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Sensor the frame came from.
    facing: FacingMode,
    /// Capture timestamp.
    timestamp: Instant,
    /// Monotonic sequence number.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame with the given parameters.
    pub fn new(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        facing: FacingMode,
        sequence: u64,
    ) -> Self {
        Self {
            pixels,
            width,
            height,
            facing,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consumes the frame and returns its pixel buffer.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the sensor facing the frame was captured from.
    #[inline]
    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count() * BYTES_PER_PIXEL
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("facing", &self.facing)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let pixels = vec![0u8; 64 * 48 * BYTES_PER_PIXEL];
        let frame = Frame::new(pixels, 64, 48, FacingMode::Front, 1);

        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
        assert_eq!(frame.facing(), FacingMode::Front);
        assert_eq!(frame.sequence(), 1);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_frame_invalid_size() {
        // Grayscale-sized buffer is too short for RGB.
        let pixels = vec![0u8; 64 * 48];
        let frame = Frame::new(pixels, 64, 48, FacingMode::Back, 1);

        assert!(!frame.is_valid());
    }
}
