//! Pixel format descriptors and the color-space registry.
//!
//! The raster core treats pixels as opaque blobs of `pixel_size` bytes. A
//! [`PixelFormat`] carries that size plus the metadata the color-space
//! layer hands down (channel count, semantic id, default pixel). The
//! [`ColorSpaceRegistry`] is an ordinary value passed to whoever creates
//! devices; it also hands out the shared read-only default tiles.

use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::DeviceConfig;
use crate::error::{RasterError, Result};
use crate::paint_device::PaintDevice;
use crate::tile::Tile;

// ============================================================================
// PixelFormat
// ============================================================================

/// Describes the byte layout of one pixel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PixelFormat {
    color_space: String,
    pixel_size: usize,
    channel_count: usize,
    default_pixel: Vec<u8>,
}

impl PixelFormat {
    /// Create a format. `default_pixel.len()` must equal `pixel_size` and
    /// `channel_count` must be non-zero.
    pub fn new(
        color_space: &str,
        pixel_size: usize,
        channel_count: usize,
        default_pixel: &[u8],
    ) -> Result<Self> {
        if pixel_size == 0 || default_pixel.len() != pixel_size {
            return Err(RasterError::InvalidPixel {
                expected: pixel_size,
                actual: default_pixel.len(),
            });
        }
        if channel_count == 0 || channel_count > pixel_size {
            return Err(RasterError::InvalidChannelCount {
                channels: channel_count,
                pixel_size,
            });
        }
        Ok(Self {
            color_space: color_space.to_string(),
            pixel_size,
            channel_count,
            default_pixel: default_pixel.to_vec(),
        })
    }

    /// 8-bit grayscale, default black.
    pub fn gray8() -> Self {
        Self::builtin("GRAY8", 1, 1, &[0])
    }

    /// 8-bit alpha/mask, default fully transparent (unselected).
    pub fn alpha8() -> Self {
        Self::builtin("ALPHA8", 1, 1, &[0])
    }

    /// 8-bit RGBA, default transparent black.
    pub fn rgba8() -> Self {
        Self::builtin("RGBA8", 4, 4, &[0, 0, 0, 0])
    }

    /// 16-bit RGBA, default transparent black.
    pub fn rgba16() -> Self {
        Self::builtin("RGBA16", 8, 4, &[0; 8])
    }

    fn builtin(id: &str, pixel_size: usize, channel_count: usize, default_pixel: &[u8]) -> Self {
        Self {
            color_space: id.to_string(),
            pixel_size,
            channel_count,
            default_pixel: default_pixel.to_vec(),
        }
    }

    pub fn color_space(&self) -> &str {
        &self.color_space
    }

    pub fn pixel_size(&self) -> usize {
        self.pixel_size
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn default_pixel(&self) -> &[u8] {
        &self.default_pixel
    }

    /// Bytes per channel, assuming equally sized channels.
    pub fn channel_size(&self) -> usize {
        self.pixel_size / self.channel_count
    }

    /// Copy of this format with a different default pixel.
    pub fn with_default_pixel(&self, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != self.pixel_size {
            return Err(RasterError::InvalidPixel {
                expected: self.pixel_size,
                actual: pixel.len(),
            });
        }
        let mut f = self.clone();
        f.default_pixel = pixel.to_vec();
        Ok(f)
    }

    /// Two formats are compatible when raw pixels can be copied between
    /// them byte for byte.
    pub fn is_compatible(&self, other: &PixelFormat) -> bool {
        self.pixel_size == other.pixel_size
    }
}

// ============================================================================
// ColorSpaceRegistry
// ============================================================================

/// Explicit registry of pixel formats keyed by color-space id.
///
/// Also caches one immutable default tile per (default pixel, tile size),
/// shared by every device created through the registry.
#[derive(Debug, Default)]
pub struct ColorSpaceRegistry {
    formats: HashMap<String, PixelFormat>,
    default_tiles: HashMap<(Vec<u8>, u32), Arc<Tile>>,
}

impl ColorSpaceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the builtin formats.
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        for f in [
            PixelFormat::gray8(),
            PixelFormat::alpha8(),
            PixelFormat::rgba8(),
            PixelFormat::rgba16(),
        ] {
            reg.register(f);
        }
        reg
    }

    /// Register (or replace) a format under its color-space id.
    pub fn register(&mut self, format: PixelFormat) {
        log::debug!(
            "registering color space '{}' ({} bytes/pixel)",
            format.color_space(),
            format.pixel_size()
        );
        self.formats.insert(format.color_space().to_string(), format);
    }

    pub fn get(&self, id: &str) -> Result<&PixelFormat> {
        self.formats
            .get(id)
            .ok_or_else(|| RasterError::UnknownColorSpace { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.formats.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    /// The shared default tile for `pixel` at `tile_size`, created on first
    /// request.
    pub fn default_tile(&mut self, pixel: &[u8], tile_size: u32) -> Result<Arc<Tile>> {
        let key = (pixel.to_vec(), tile_size);
        if let Some(tile) = self.default_tiles.get(&key) {
            return Ok(Arc::clone(tile));
        }
        let tile = Arc::new(Tile::new(0, 0, tile_size, pixel)?);
        self.default_tiles.insert(key, Arc::clone(&tile));
        Ok(tile)
    }

    /// Number of distinct default tiles currently cached.
    pub fn default_tile_count(&self) -> usize {
        self.default_tiles.len()
    }

    /// Create a device in the color space `id`, sharing this registry's
    /// default tile.
    pub fn create_device(&mut self, id: &str, config: &DeviceConfig) -> Result<PaintDevice> {
        config.tile.validate()?;
        let mut format = self.get(id)?.clone();
        if let Some(px) = &config.default_pixel {
            format = format.with_default_pixel(px)?;
        }
        let default_tile = self.default_tile(format.default_pixel(), config.tile.tile_size)?;
        PaintDevice::with_default_tile(format, config, default_tile)
    }
}

// ============================================================================
// Tests
// ============================================================================
