//! Paint device: the boundless, sparsely backed 2D pixel surface.
//!
//! A device owns a [`TileTable`] plus the [`PixelFormat`] describing its
//! pixels. All coordinates in this API are device coordinates; the device
//! keeps an integer offset (see [`PaintDevice::move_to`]) that is subtracted
//! before reaching the table, so moving a layer never touches pixel data.
//!
//! There is no internal locking. Any number of read-only iterators may run
//! over a device that is not being mutated; a write iterator borrows the
//! device mutably, so the borrow checker enforces a single writer. For
//! parallel bulk work see [`crate::parallel`], which hands disjoint tiles
//! to worker threads.

use std::sync::Arc;

use rayon::prelude::*;

use crate::basics::{unite_rectangles, RectI};
use crate::config::{DeviceConfig, TileConfig, MAX_TILE_SIZE};
use crate::error::{RasterError, Result};
use crate::iter_line::{
    HLineConstIterator, HLineIter, HLineIterator, VLineConstIterator, VLineIter, VLineIterator,
};
use crate::iter_rect::{RectConstIterator, RectIter, RectIterator};
use crate::iter_region::{Region, RegionIter};
use crate::pixel_format::PixelFormat;
use crate::random_accessor::{RandomAccessor, RandomAccessorMut, RandomConstAccessor};
use crate::selection::Selection;
use crate::snapshot_iter::SnapshotRectIter;
use crate::tile::Tile;
use crate::tile_access::{checked_rect, to_table_point, to_table_rect, ReadAccess, WriteAccess};
use crate::tile_table::TileTable;

// ============================================================================
// PaintDevice
// ============================================================================

#[derive(Debug, Clone)]
pub struct PaintDevice {
    table: TileTable,
    format: PixelFormat,
    x: i32,
    y: i32,
    x_res: f64,
    y_res: f64,
}

impl PaintDevice {
    /// Create an empty device with its own default tile.
    pub fn new(format: PixelFormat, config: &DeviceConfig) -> Result<Self> {
        let format = match &config.default_pixel {
            Some(px) => format.with_default_pixel(px)?,
            None => format,
        };
        let table = TileTable::new(config.tile, format.default_pixel())?;
        Ok(Self::from_parts(table, format, config))
    }

    /// Create an empty device around a shared default tile. The tile must
    /// match the format's pixel size and default pixel, and the configured
    /// tile size.
    pub fn with_default_tile(
        format: PixelFormat,
        config: &DeviceConfig,
        default_tile: Arc<Tile>,
    ) -> Result<Self> {
        if default_tile.pixel_size() != format.pixel_size() {
            return Err(RasterError::FormatMismatch {
                expected: format.pixel_size(),
                actual: default_tile.pixel_size(),
            });
        }
        if default_tile.size() != config.tile.tile_size {
            return Err(RasterError::InvalidTileSize {
                size: default_tile.size(),
                max: MAX_TILE_SIZE,
            });
        }
        if default_tile.pixel(0, 0) != format.default_pixel() {
            return Err(RasterError::InvalidPixel {
                expected: format.pixel_size(),
                actual: default_tile.pixel_size(),
            });
        }
        let table = TileTable::with_default_tile(default_tile)?;
        Ok(Self::from_parts(table, format, config))
    }

    fn from_parts(table: TileTable, format: PixelFormat, config: &DeviceConfig) -> Self {
        Self {
            table,
            format,
            x: 0,
            y: 0,
            x_res: config.x_res,
            y_res: config.y_res,
        }
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    pub fn pixel_size(&self) -> usize {
        self.format.pixel_size()
    }

    pub fn channel_count(&self) -> usize {
        self.format.channel_count()
    }

    pub fn color_space(&self) -> &str {
        self.format.color_space()
    }

    pub fn tile_size(&self) -> u32 {
        self.table.tile_size()
    }

    pub fn table(&self) -> &TileTable {
        &self.table
    }

    pub(crate) fn table_mut(&mut self) -> &mut TileTable {
        &mut self.table
    }

    pub fn default_pixel(&self) -> &[u8] {
        self.table.default_pixel()
    }

    /// Change the default pixel. Materialized tiles keep their content.
    /// On failure the device is left unchanged.
    pub fn set_default_pixel(&mut self, pixel: &[u8]) -> Result<()> {
        let format = self.format.with_default_pixel(pixel)?;
        self.table.set_default_pixel(pixel)?;
        self.format = format;
        Ok(())
    }

    /// (x, y) resolution in pixels per inch.
    pub fn resolution(&self) -> (f64, f64) {
        (self.x_res, self.y_res)
    }

    pub fn set_resolution(&mut self, x_res: f64, y_res: f64) {
        self.x_res = x_res;
        self.y_res = y_res;
    }

    /// Device offset.
    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    /// Place the device's content so that table origin lands on (x, y).
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn tile_count(&self) -> usize {
        self.table.tile_count()
    }

    /// Bytes held by materialized tiles.
    pub fn memory_usage(&self) -> usize {
        self.table.memory_usage()
    }

    // ========================================================================
    // Single-pixel access
    // ========================================================================

    /// Bytes of pixel (x, y). Never allocates; unwritten pixels read as the
    /// default pixel.
    pub fn pixel(&self, x: i32, y: i32) -> &[u8] {
        match (x.checked_sub(self.x), y.checked_sub(self.y)) {
            (Some(tx), Some(ty)) => self.table.pixel(tx, ty),
            // No table cell backs (x, y) under this offset, so it was never written.
            _ => self.table.default_pixel(),
        }
    }

    /// Write pixel (x, y). `value` must be exactly `pixel_size()` bytes.
    ///
    /// Fails with `InvalidRegion` when the device offset leaves (x, y)
    /// without a table coordinate.
    pub fn set_pixel(&mut self, x: i32, y: i32, value: &[u8]) -> Result<()> {
        let (tx, ty) = to_table_point(x, y, self.x, self.y)?;
        self.table.set_pixel(tx, ty, value)
    }

    /// Device-space rectangle to table space.
    fn to_table(&self, r: &RectI) -> Result<RectI> {
        to_table_rect(r, self.x, self.y)
    }

    // ========================================================================
    // Bounds
    // ========================================================================

    /// Bounding box of every materialized tile. Always contains every pixel
    /// ever written; may be larger than the non-default content. Corners
    /// are clamped to the `i32` range.
    pub fn extent(&self) -> Option<RectI> {
        self.table
            .extent()
            .map(|r| r.saturating_translated(self.x, self.y))
    }

    /// Tight bounding box of pixels that differ from the default pixel.
    ///
    /// Scans every pixel of every materialized tile, so the cost is
    /// O(tiles x tile area). Tiles are scanned in parallel. Use
    /// [`extent`](Self::extent) when a loose bound will do.
    pub fn exact_bounds(&self) -> Option<RectI> {
        let default = self.table.default_pixel();
        let tiles: Vec<&Tile> = self.table.tiles().collect();
        log::debug!("exact_bounds: scanning {} tiles", tiles.len());
        tiles
            .par_iter()
            .filter_map(|t| {
                let origin = t.rect();
                t.content_bounds(default)
                    .map(|b| b.translated(origin.x1, origin.y1))
            })
            .reduce_with(|a, b| unite_rectangles(&a, &b))
            .map(|r| r.saturating_translated(self.x, self.y))
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Release every tile.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Reset a rectangle to the default pixel, releasing covered tiles.
    pub fn clear_rect(&mut self, x: i32, y: i32, w: i32, h: i32) -> Result<()> {
        let t = self.to_table(&checked_rect(x, y, w, h)?)?;
        let default = self.table.default_pixel().to_vec();
        self.table.fill_rect(&t, &default)
    }

    /// Fill a rectangle with `pixel`.
    pub fn fill(&mut self, x: i32, y: i32, w: i32, h: i32, pixel: &[u8]) -> Result<()> {
        let t = self.to_table(&checked_rect(x, y, w, h)?)?;
        self.table.fill_rect(&t, pixel)
    }

    /// Keep only the content inside the rectangle.
    pub fn crop(&mut self, x: i32, y: i32, w: i32, h: i32) -> Result<()> {
        let t = self.to_table(&checked_rect(x, y, w, h)?)?;
        self.table.crop(&t)
    }

    fn transfer_len(&self, r: &RectI) -> Result<usize> {
        usize::try_from(r.area())
            .ok()
            .and_then(|n| n.checked_mul(self.pixel_size()))
            .ok_or(RasterError::invalid_rect(r.x1, r.y1, r.width(), r.height()))
    }

    /// Copy a rectangle into `data`, row-major and pixel-interleaved.
    pub fn read_bytes(&self, data: &mut [u8], x: i32, y: i32, w: i32, h: i32) -> Result<()> {
        let r = checked_rect(x, y, w, h)?;
        let needed = self.transfer_len(&r)?;
        if data.len() < needed {
            return Err(RasterError::BufferTooSmall {
                expected: needed,
                actual: data.len(),
            });
        }
        let ps = self.pixel_size();
        let t = self.to_table(&r)?;
        let mut out = 0;
        for ty in t.y1..=t.y2 {
            let mut tx = t.x1;
            loop {
                let n = self.table.num_contiguous_columns(tx, ty, ty).min(t.x2 - tx + 1);
                let (col, row) = self.table.tile_coord_for(tx, ty);
                let (lx, ly) = self.table.local_coord_for(tx, ty);
                let src = self.table.tile_for(col, row).row_slice(ly as u32);
                let bytes = n as usize * ps;
                let start = lx as usize * ps;
                data[out..out + bytes].copy_from_slice(&src[start..start + bytes]);
                out += bytes;
                if n > t.x2 - tx {
                    break;
                }
                tx += n;
            }
        }
        Ok(())
    }

    /// Copy `data` (row-major, pixel-interleaved) into a rectangle.
    pub fn write_bytes(&mut self, data: &[u8], x: i32, y: i32, w: i32, h: i32) -> Result<()> {
        let r = checked_rect(x, y, w, h)?;
        let needed = self.transfer_len(&r)?;
        if data.len() < needed {
            return Err(RasterError::BufferTooSmall {
                expected: needed,
                actual: data.len(),
            });
        }
        let ps = self.pixel_size();
        let t = self.to_table(&r)?;
        let mut inp = 0;
        for ty in t.y1..=t.y2 {
            let mut tx = t.x1;
            loop {
                let n = self.table.num_contiguous_columns(tx, ty, ty).min(t.x2 - tx + 1);
                let (col, row) = self.table.tile_coord_for(tx, ty);
                let (lx, ly) = self.table.local_coord_for(tx, ty);
                let dst = self.table.tile_for_write(col, row)?.row_slice_mut(ly as u32);
                let bytes = n as usize * ps;
                let start = lx as usize * ps;
                dst[start..start + bytes].copy_from_slice(&data[inp..inp + bytes]);
                inp += bytes;
                if n > t.x2 - tx {
                    break;
                }
                tx += n;
            }
        }
        Ok(())
    }

    /// Read a rectangle as one plane per channel. Channels are assumed to
    /// be `pixel_size / channel_count` bytes each.
    pub fn read_planar_bytes(&self, x: i32, y: i32, w: i32, h: i32) -> Result<Vec<Vec<u8>>> {
        let r = checked_rect(x, y, w, h)?;
        let mut interleaved = vec![0u8; self.transfer_len(&r)?];
        self.read_bytes(&mut interleaved, x, y, w, h)?;
        let cs = self.format.channel_size();
        let channels = self.channel_count();
        let mut planes: Vec<Vec<u8>> = (0..channels)
            .map(|_| Vec::with_capacity(r.area() as usize * cs))
            .collect();
        for px in interleaved.chunks_exact(self.pixel_size()) {
            for (c, plane) in planes.iter_mut().enumerate() {
                plane.extend_from_slice(&px[c * cs..(c + 1) * cs]);
            }
        }
        Ok(planes)
    }

    /// Write one plane per channel into a rectangle.
    pub fn write_planar_bytes<P: AsRef<[u8]>>(
        &mut self,
        planes: &[P],
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    ) -> Result<()> {
        let r = checked_rect(x, y, w, h)?;
        let channels = self.channel_count();
        if planes.len() != channels {
            return Err(RasterError::FormatMismatch {
                expected: channels,
                actual: planes.len(),
            });
        }
        let cs = self.format.channel_size();
        let plane_len = r.area() as usize * cs;
        for p in planes {
            if p.as_ref().len() < plane_len {
                return Err(RasterError::BufferTooSmall {
                    expected: plane_len,
                    actual: p.as_ref().len(),
                });
            }
        }
        let ps = self.pixel_size();
        let mut interleaved = vec![0u8; self.transfer_len(&r)?];
        for (i, px) in interleaved.chunks_exact_mut(ps).enumerate() {
            for (c, plane) in planes.iter().enumerate() {
                px[c * cs..(c + 1) * cs].copy_from_slice(&plane.as_ref()[i * cs..(i + 1) * cs]);
            }
        }
        self.write_bytes(&interleaved, x, y, w, h)
    }

    /// Bounds a mirror works within: the selection's exact rect when a
    /// selection is given, the content's exact bounds otherwise.
    fn mirror_bounds(&self, selection: Option<&Selection>) -> Option<RectI> {
        match selection {
            Some(sel) => sel.selected_exact_rect(),
            None => self.exact_bounds(),
        }
    }

    /// Flip left to right within the mirror bounds. With a selection, only
    /// pixels whose source is selected are overwritten.
    pub fn mirror_x(&mut self, selection: Option<&Selection>) -> Result<()> {
        let Some(r) = self.mirror_bounds(selection) else {
            return Ok(());
        };
        let ps = self.pixel_size();
        let w = r.width() as usize;
        let mut row = vec![0u8; w * ps];
        let mut out = vec![0u8; w * ps];
        for y in r.y1..=r.y2 {
            self.read_bytes(&mut row, r.x1, y, r.width(), 1)?;
            out.copy_from_slice(&row);
            for i in 0..w {
                if selection.map_or(true, |sel| sel.is_selected(r.x1 + i as i32, y)) {
                    let d = (w - 1 - i) * ps;
                    out[d..d + ps].copy_from_slice(&row[i * ps..(i + 1) * ps]);
                }
            }
            self.write_bytes(&out, r.x1, y, r.width(), 1)?;
        }
        Ok(())
    }

    /// Flip top to bottom within the mirror bounds. With a selection, only
    /// pixels whose source is selected are overwritten.
    pub fn mirror_y(&mut self, selection: Option<&Selection>) -> Result<()> {
        let Some(r) = self.mirror_bounds(selection) else {
            return Ok(());
        };
        let mut snapshot = vec![0u8; self.transfer_len(&r)?];
        self.read_bytes(&mut snapshot, r.x1, r.y1, r.width(), r.height())?;
        let mut out = snapshot.clone();
        let ps = self.pixel_size();
        let row_bytes = r.width() as usize * ps;
        let rows = r.height() as usize;
        for (i, src) in snapshot.chunks_exact(row_bytes).enumerate() {
            let dst = &mut out[(rows - 1 - i) * row_bytes..(rows - i) * row_bytes];
            let y = r.y1 + i as i32;
            for (j, px) in src.chunks_exact(ps).enumerate() {
                if selection.map_or(true, |sel| sel.is_selected(r.x1 + j as i32, y)) {
                    dst[j * ps..(j + 1) * ps].copy_from_slice(px);
                }
            }
        }
        self.write_bytes(&out, r.x1, r.y1, r.width(), r.height())
    }

    /// Nearest-sample downscale of the content into a new device of at most
    /// `w` x `h` pixels with its top-left at (0, 0).
    ///
    /// The result keeps the aspect ratio of the exact bounds and is never
    /// larger than the content. The thumbnail shares this device's format,
    /// tile size and resolution; an empty device yields an empty thumbnail.
    pub fn create_thumbnail_device(&self, w: i32, h: i32) -> Result<PaintDevice> {
        checked_rect(0, 0, w, h)?;
        let config = DeviceConfig::default()
            .with_tile_size(self.tile_size())?
            .with_resolution(self.x_res, self.y_res);
        let mut thumb = PaintDevice::new(self.format.clone(), &config)?;
        let Some(e) = self.exact_bounds() else {
            return Ok(thumb);
        };
        let src_w = e.x2 as i64 - e.x1 as i64 + 1;
        let src_h = e.y2 as i64 - e.y1 as i64 + 1;
        let (mut w, mut h) = ((w as i64).min(src_w), (h as i64).min(src_h));
        if src_w > src_h {
            h = src_h * w / src_w;
        } else if src_h > src_w {
            w = src_w * h / src_h;
        }
        let (w, h) = (w.max(1), h.max(1));
        log::debug!(
            "thumbnail of {}x{} content at {}x{}",
            src_w,
            src_h,
            w,
            h
        );
        let ps = self.pixel_size();
        let mut data = Vec::with_capacity((w * h) as usize * ps);
        for y in 0..h {
            let sy = (e.y1 as i64 + y * src_h / h) as i32;
            for x in 0..w {
                let sx = (e.x1 as i64 + x * src_w / w) as i32;
                data.extend_from_slice(self.pixel(sx, sy));
            }
        }
        thumb.write_bytes(&data, 0, 0, w as i32, h as i32)?;
        Ok(thumb)
    }

    // Tile runs only depend on a coordinate modulo the tile size, which
    // divides 2^32, so a wrapped offset subtraction still gives the answer.

    /// Columns from `x` that stay in one tile for every row in
    /// `min_y..=max_y`.
    pub fn num_contiguous_columns(&self, x: i32, min_y: i32, max_y: i32) -> i32 {
        self.table.num_contiguous_columns(
            x.wrapping_sub(self.x),
            min_y.wrapping_sub(self.y),
            max_y.wrapping_sub(self.y),
        )
    }

    /// Rows from `y` that stay in one tile for every column in
    /// `min_x..=max_x`.
    pub fn num_contiguous_rows(&self, y: i32, min_x: i32, max_x: i32) -> i32 {
        self.table.num_contiguous_rows(
            y.wrapping_sub(self.y),
            min_x.wrapping_sub(self.x),
            max_x.wrapping_sub(self.x),
        )
    }

    /// Byte distance between (x, y) and (x, y + 1) while both are in the
    /// same tile.
    pub fn row_stride(&self, x: i32, y: i32) -> usize {
        self.table
            .row_stride(x.wrapping_sub(self.x), y.wrapping_sub(self.y))
    }

    // ========================================================================
    // Copying
    // ========================================================================

    /// Fallible deep copy. The shared default tile stays shared.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            table: self.table.try_clone()?,
            format: self.format.clone(),
            x: self.x,
            y: self.y,
            x_res: self.x_res,
            y_res: self.y_res,
        })
    }

    /// Replace this device's content with a deep copy of `other`'s.
    ///
    /// Fails with `FormatMismatch` before touching any pixel if the pixel
    /// sizes differ. The default pixel and offset are taken from `other`;
    /// this device keeps its own tile size and color-space id.
    pub fn convert_from(&mut self, other: &PaintDevice) -> Result<()> {
        if !self.format.is_compatible(&other.format) {
            log::warn!(
                "convert_from: {} bytes/pixel into {} bytes/pixel rejected",
                other.pixel_size(),
                self.pixel_size()
            );
            return Err(RasterError::FormatMismatch {
                expected: self.pixel_size(),
                actual: other.pixel_size(),
            });
        }
        log::debug!(
            "convert_from: copying {} tiles from '{}' into '{}'",
            other.tile_count(),
            other.color_space(),
            self.color_space()
        );
        let table = if other.tile_size() == self.tile_size() {
            other.table.try_clone()?
        } else {
            let config = TileConfig::new(self.tile_size())?;
            let mut table = TileTable::new(config, other.default_pixel())?;
            let ps = self.pixel_size();
            for tile in other.table.tiles() {
                let tr = tile.rect();
                for ly in 0..tile.size() {
                    let row = tile.row_slice(ly);
                    for (lx, px) in row.chunks_exact(ps).enumerate() {
                        table.set_pixel(tr.x1 + lx as i32, tr.y1 + ly as i32, px)?;
                    }
                }
            }
            table
        };
        self.table = table;
        self.format = self.format.with_default_pixel(other.default_pixel())?;
        self.x = other.x;
        self.y = other.y;
        Ok(())
    }

    // ========================================================================
    // Iterators
    // ========================================================================

    /// Write iterator over the rectangle (x, y, w, h).
    pub fn create_rect_iterator(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    ) -> Result<RectIterator<'_>> {
        let t = self.to_table(&checked_rect(x, y, w, h)?)?;
        let (dx, dy) = (self.x, self.y);
        RectIter::new(WriteAccess::new(&mut self.table), t, dx, dy)
    }

    /// Read-only iterator over the rectangle (x, y, w, h).
    pub fn create_rect_const_iterator(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    ) -> Result<RectConstIterator<'_>> {
        let t = self.to_table(&checked_rect(x, y, w, h)?)?;
        RectIter::new(ReadAccess::new(&self.table), t, self.x, self.y)
    }

    /// Write iterator over a rectangle whose `old_raw_data()` reads the
    /// content as it was when the iterator was created.
    pub fn create_snapshot_rect_iterator(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    ) -> Result<SnapshotRectIter<'_>> {
        let t = self.to_table(&checked_rect(x, y, w, h)?)?;
        let (dx, dy) = (self.x, self.y);
        SnapshotRectIter::new(&mut self.table, t, dx, dy)
    }

    pub fn create_hline_iterator(&mut self, x: i32, y: i32, w: i32) -> Result<HLineIterator<'_>> {
        let t = self.to_table(&checked_rect(x, y, w, 1)?)?;
        let (dx, dy) = (self.x, self.y);
        HLineIter::new(WriteAccess::new(&mut self.table), t.x1, t.y1, w, dx, dy)
    }

    pub fn create_hline_const_iterator(
        &self,
        x: i32,
        y: i32,
        w: i32,
    ) -> Result<HLineConstIterator<'_>> {
        let t = self.to_table(&checked_rect(x, y, w, 1)?)?;
        HLineIter::new(ReadAccess::new(&self.table), t.x1, t.y1, w, self.x, self.y)
    }

    pub fn create_vline_iterator(&mut self, x: i32, y: i32, h: i32) -> Result<VLineIterator<'_>> {
        let t = self.to_table(&checked_rect(x, y, 1, h)?)?;
        let (dx, dy) = (self.x, self.y);
        VLineIter::new(WriteAccess::new(&mut self.table), t.x1, t.y1, h, dx, dy)
    }

    pub fn create_vline_const_iterator(
        &self,
        x: i32,
        y: i32,
        h: i32,
    ) -> Result<VLineConstIterator<'_>> {
        let t = self.to_table(&checked_rect(x, y, 1, h)?)?;
        VLineIter::new(ReadAccess::new(&self.table), t.x1, t.y1, h, self.x, self.y)
    }

    pub fn create_random_accessor(&mut self, x: i32, y: i32) -> Result<RandomAccessorMut<'_>> {
        let (dx, dy) = (self.x, self.y);
        let (tx, ty) = to_table_point(x, y, dx, dy)?;
        RandomAccessor::new(WriteAccess::new(&mut self.table), tx, ty, dx, dy)
    }

    pub fn create_random_const_accessor(&self, x: i32, y: i32) -> Result<RandomConstAccessor<'_>> {
        let (tx, ty) = to_table_point(x, y, self.x, self.y)?;
        RandomAccessor::new(ReadAccess::new(&self.table), tx, ty, self.x, self.y)
    }

    /// Write iterator over `region`, skipping pixels that `selection` (if
    /// any) leaves unselected.
    pub fn create_region_iterator<'s>(
        &mut self,
        region: &Region,
        selection: Option<&'s Selection>,
    ) -> Result<RegionIter<'s, WriteAccess<'_>>> {
        let (dx, dy) = (self.x, self.y);
        let table_region = region.to_table(dx, dy)?;
        RegionIter::new(
            WriteAccess::new(&mut self.table),
            table_region,
            selection,
            dx,
            dy,
        )
    }

    /// Read-only counterpart of [`create_region_iterator`](Self::create_region_iterator).
    pub fn create_region_const_iterator<'s>(
        &self,
        region: &Region,
        selection: Option<&'s Selection>,
    ) -> Result<RegionIter<'s, ReadAccess<'_>>> {
        RegionIter::new(
            ReadAccess::new(&self.table),
            region.to_table(self.x, self.y)?,
            selection,
            self.x,
            self.y,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
