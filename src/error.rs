//! Error types for the raster core.

use thiserror::Error;

/// Errors raised by tile, device and iterator operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    /// A tile buffer could not be allocated. Fatal to the operation in
    /// flight; pixels written before the failure stay written.
    #[error("failed to allocate tile buffer of {bytes} bytes")]
    Allocation { bytes: usize },

    /// Malformed iteration or bulk-operation bounds.
    #[error("invalid region at ({x}, {y}) with size {width}x{height}")]
    InvalidRegion {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    /// A region built from several rectangles was rejected as a whole.
    #[error("invalid region: {reason}")]
    InvalidRegionShape { reason: String },

    /// Two devices (or a device and a buffer) disagree on pixel size.
    #[error("pixel format mismatch: expected {expected} bytes per pixel, got {actual}")]
    FormatMismatch { expected: usize, actual: usize },

    /// A pixel value whose byte length does not match the device format.
    #[error("pixel value has {actual} bytes, device expects {expected}")]
    InvalidPixel { expected: usize, actual: usize },

    /// A pixel format whose channel count is zero or exceeds its pixel size.
    #[error("{channels} channels do not fit a {pixel_size}-byte pixel")]
    InvalidChannelCount { channels: usize, pixel_size: usize },

    /// A byte buffer too small for the requested transfer.
    #[error("buffer holds {actual} bytes, transfer needs {expected}")]
    BufferTooSmall { expected: usize, actual: usize },

    /// Tile edge length that is zero, not a power of two, or too large.
    #[error("invalid tile size {size}: must be a power of two between 1 and {max}")]
    InvalidTileSize { size: u32, max: u32 },

    /// Lookup of a color space id that was never registered.
    #[error("unknown color space '{id}'")]
    UnknownColorSpace { id: String },
}

impl RasterError {
    /// Convenience constructor for rectangular region errors.
    pub(crate) fn invalid_rect(x: i32, y: i32, width: i32, height: i32) -> Self {
        RasterError::InvalidRegion {
            x,
            y,
            width,
            height,
        }
    }
}

pub type Result<T> = std::result::Result<T, RasterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = RasterError::Allocation { bytes: 16384 };
        assert_eq!(e.to_string(), "failed to allocate tile buffer of 16384 bytes");

        let e = RasterError::invalid_rect(1, 2, 0, 5);
        assert_eq!(e.to_string(), "invalid region at (1, 2) with size 0x5");

        let e = RasterError::FormatMismatch {
            expected: 4,
            actual: 1,
        };
        assert!(e.to_string().contains("expected 4"));
    }
}
