//! Construction-time configuration for tile tables and paint devices.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{RasterError, Result};

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 64;

/// Largest accepted tile edge length.
pub const MAX_TILE_SIZE: u32 = 4096;

/// Default device resolution, in pixels per inch.
pub const DEFAULT_RESOLUTION: f64 = 72.0;

// ============================================================================
// TileConfig
// ============================================================================

/// Tile geometry: a square of `tile_size` x `tile_size` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileConfig {
    pub tile_size: u32,
}

impl TileConfig {
    /// Create a validated tile configuration.
    pub fn new(tile_size: u32) -> Result<Self> {
        let cfg = Self { tile_size };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check that the tile size is a power of two in `1..=MAX_TILE_SIZE`.
    pub fn validate(&self) -> Result<()> {
        let size = self.tile_size;
        if size == 0 || !size.is_power_of_two() || size > MAX_TILE_SIZE {
            return Err(RasterError::InvalidTileSize {
                size: self.tile_size,
                max: MAX_TILE_SIZE,
            });
        }
        Ok(())
    }

    /// log2 of the tile size.
    pub fn shift(&self) -> u32 {
        self.tile_size.trailing_zeros()
    }
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

// ============================================================================
// DeviceConfig
// ============================================================================

/// Paint device settings.
///
/// `default_pixel` overrides the pixel format's default pattern when set;
/// its length is checked against the format when the device is created.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceConfig {
    pub tile: TileConfig,
    pub default_pixel: Option<Vec<u8>>,
    pub x_res: f64,
    pub y_res: f64,
}

impl DeviceConfig {
    pub fn with_tile_size(mut self, tile_size: u32) -> Result<Self> {
        self.tile = TileConfig::new(tile_size)?;
        Ok(self)
    }

    pub fn with_default_pixel(mut self, pixel: &[u8]) -> Self {
        self.default_pixel = Some(pixel.to_vec());
        self
    }

    pub fn with_resolution(mut self, x_res: f64, y_res: f64) -> Self {
        self.x_res = x_res;
        self.y_res = y_res;
        self
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            tile: TileConfig::default(),
            default_pixel: None,
            x_res: DEFAULT_RESOLUTION,
            y_res: DEFAULT_RESOLUTION,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
