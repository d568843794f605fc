//! Selection mask: a one-byte-per-pixel device where 0 means unselected
//! and any other value is a degree of selection (255 fully selected).
//!
//! Region iterators consult a selection to skip unselected pixels, so a
//! write iterator restricted by a selection never materializes tiles for
//! pixels it does not visit.

use crate::basics::RectI;
use crate::config::DeviceConfig;
use crate::error::Result;
use crate::paint_device::PaintDevice;
use crate::pixel_format::PixelFormat;

/// Fully selected.
pub const SELECTED: u8 = 255;
/// Not selected.
pub const UNSELECTED: u8 = 0;

#[derive(Debug, Clone)]
pub struct Selection {
    mask: PaintDevice,
}

impl Selection {
    /// An empty selection with the default tile size.
    pub fn new() -> Result<Self> {
        Self::with_config(&DeviceConfig::default())
    }

    /// An empty selection. Any default pixel in `config` is ignored; the
    /// mask always defaults to unselected.
    pub fn with_config(config: &DeviceConfig) -> Result<Self> {
        let config = config.clone().with_default_pixel(&[UNSELECTED]);
        Ok(Self {
            mask: PaintDevice::new(PixelFormat::alpha8(), &config)?,
        })
    }

    /// The mask device.
    pub fn device(&self) -> &PaintDevice {
        &self.mask
    }

    pub fn select_rect(&mut self, x: i32, y: i32, w: i32, h: i32) -> Result<()> {
        self.mask.fill(x, y, w, h, &[SELECTED])
    }

    pub fn deselect_rect(&mut self, x: i32, y: i32, w: i32, h: i32) -> Result<()> {
        self.mask.clear_rect(x, y, w, h)
    }

    /// Set the selection degree of a single pixel.
    pub fn set_value(&mut self, x: i32, y: i32, value: u8) -> Result<()> {
        self.mask.set_pixel(x, y, &[value])
    }

    pub fn is_selected(&self, x: i32, y: i32) -> bool {
        self.selected_value(x, y) != UNSELECTED
    }

    pub fn selected_value(&self, x: i32, y: i32) -> u8 {
        self.mask.pixel(x, y)[0]
    }

    /// Tight bounds of every selected pixel.
    pub fn selected_exact_rect(&self) -> Option<RectI> {
        self.mask.exact_bounds()
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.mask.clear();
    }
}
