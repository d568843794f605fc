//! # tiled-raster
//!
//! Sparse, tiled raster storage for 2D paint layers.
//!
//! A [`PaintDevice`] is a conceptually unbounded pixel surface in integer
//! coordinates (negative ones included). Its pixels live in fixed-size
//! square tiles that are only allocated when first written; everything
//! else reads as the device's default pixel. Pixel data is reached through
//! iterators that hide tile boundaries:
//!
//! - Rect, horizontal-line and vertical-line iterators
//! - Random accessor for arbitrary jumps
//! - Region iterator over a union of rectangles, optionally masked by a
//!   [`Selection`]
//! - Snapshot iterator that also reads the pre-write content
//!
//! Each iterator comes in a write flavour (materializes tiles as needed)
//! and a const flavour (never allocates).
//!
//! ## Architecture
//!
//! 1. **Tile**: one square, fully allocated pixel buffer
//! 2. **Tile table**: sparse grid cell to tile map with a shared default tile
//! 3. **Tile access / cursor**: resolves cells for iterators, read or write
//! 4. **Iterators**: scan orders on top of the cursor
//! 5. **Paint device**: offset, bounds, bulk operations and iterator factories

// Foundation
pub mod basics;
pub mod config;
pub mod error;

// Storage
pub mod pixel_format;
pub mod tile;
pub mod tile_access;
pub mod tile_table;

// Iteration
pub mod iter_line;
pub mod iter_rect;
pub mod iter_region;
pub mod random_accessor;
pub mod snapshot_iter;

// Device
pub mod paint_device;
pub mod parallel;
pub mod selection;

pub use basics::RectI;
pub use config::{DeviceConfig, TileConfig};
pub use error::{RasterError, Result};
pub use iter_region::Region;
pub use paint_device::PaintDevice;
pub use pixel_format::{ColorSpaceRegistry, PixelFormat};
pub use selection::Selection;
