//! Tile-parallel bulk operations.
//!
//! Work over a rectangle is split by tile: every worker receives one tile
//! and the part of the rectangle inside it. Tiles are disjoint buffers, so
//! workers never share bytes. The write variants materialize every cell of
//! the rectangle first, then hand out `&mut` tiles; the device stays
//! mutably borrowed for the whole call.

use rayon::prelude::*;

use crate::basics::{intersect_rectangles, RectI};
use crate::error::{RasterError, Result};
use crate::paint_device::PaintDevice;
use crate::tile::Tile;
use crate::tile_access::{checked_rect, to_table_rect};

// ============================================================================
// Tile spans
// ============================================================================

/// Read-only view of one tile's share of a rectangle.
pub struct TileSpan<'a> {
    tile: &'a Tile,
    /// Pixel rectangle of the grid cell, table coordinates.
    cell: RectI,
    /// Part of the work rectangle inside `cell`, table coordinates.
    rect: RectI,
    dx: i32,
    dy: i32,
}

impl<'a> TileSpan<'a> {
    /// The covered rectangle in device coordinates.
    pub fn rect(&self) -> RectI {
        self.rect.translated(self.dx, self.dy)
    }

    pub fn pixel_size(&self) -> usize {
        self.tile.pixel_size()
    }

    /// Rows of the covered rectangle as `(device y, bytes)`.
    pub fn rows(&self) -> impl Iterator<Item = (i32, &'a [u8])> + 'a {
        let ps = self.tile.pixel_size();
        let x0 = (self.rect.x1 - self.cell.x1) as usize * ps;
        let x1 = (self.rect.x2 - self.cell.x1 + 1) as usize * ps;
        let first = (self.rect.y1 - self.cell.y1) as usize;
        let y0 = self.rect.y1 + self.dy;
        self.tile
            .data()
            .chunks_exact(self.tile.stride())
            .skip(first)
            .take(self.rect.height() as usize)
            .enumerate()
            .map(move |(i, row)| (y0 + i as i32, &row[x0..x1]))
    }
}

/// Mutable view of one tile's share of a rectangle.
pub struct TileSpanMut<'a> {
    tile: &'a mut Tile,
    rect: RectI,
    dx: i32,
    dy: i32,
}

impl TileSpanMut<'_> {
    /// The covered rectangle in device coordinates.
    pub fn rect(&self) -> RectI {
        self.rect.translated(self.dx, self.dy)
    }

    pub fn pixel_size(&self) -> usize {
        self.tile.pixel_size()
    }

    /// Bytes of pixel (x, y), device coordinates.
    ///
    /// # Panics
    /// If (x, y) is outside [`rect`](Self::rect).
    pub fn pixel_mut(&mut self, x: i32, y: i32) -> &mut [u8] {
        let (tx, ty) = x
            .checked_sub(self.dx)
            .zip(y.checked_sub(self.dy))
            .filter(|&(tx, ty)| self.rect.hit_test(tx, ty))
            .unwrap_or_else(|| panic!("pixel ({x}, {y}) outside tile span"));
        let tr = self.tile.rect();
        self.tile.pixel_mut(tx - tr.x1, ty - tr.y1)
    }

    /// Rows of the covered rectangle as `(device y, bytes)`.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = (i32, &mut [u8])> + '_ {
        let tr = self.tile.rect();
        let ps = self.tile.pixel_size();
        let stride = self.tile.stride();
        let x0 = (self.rect.x1 - tr.x1) as usize * ps;
        let x1 = (self.rect.x2 - tr.x1 + 1) as usize * ps;
        let first = (self.rect.y1 - tr.y1) as usize;
        let height = self.rect.height() as usize;
        let y0 = self.rect.y1 + self.dy;
        self.tile
            .data_mut()
            .chunks_exact_mut(stride)
            .skip(first)
            .take(height)
            .enumerate()
            .map(move |(i, row)| (y0 + i as i32, &mut row[x0..x1]))
    }
}

// ============================================================================
// Drivers
// ============================================================================

/// Run `f` on every tile overlapping (x, y, w, h), in parallel. Missing
/// tiles are materialized before any worker starts.
pub fn for_each_tile_mut<F>(
    device: &mut PaintDevice,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    f: F,
) -> Result<()>
where
    F: Fn(TileSpanMut<'_>) + Send + Sync,
{
    let r = checked_rect(x, y, w, h)?;
    let (dx, dy) = (device.x(), device.y());
    let t = to_table_rect(&r, dx, dy)?;
    let table = device.table_mut();
    table.materialize(&t)?;
    let tiles = table.tiles_overlapping_mut(&t);
    log::debug!("for_each_tile_mut: {} tiles over {:?}", tiles.len(), r);
    tiles.into_par_iter().for_each(|tile| {
        let rect = intersect_rectangles(&tile.rect(), &t);
        f(TileSpanMut { tile, rect, dx, dy });
    });
    Ok(())
}

/// Run `f` on every cell overlapping (x, y, w, h), in parallel. Absent
/// cells are presented as the default tile; nothing is allocated.
pub fn for_each_tile<F>(device: &PaintDevice, x: i32, y: i32, w: i32, h: i32, f: F) -> Result<()>
where
    F: Fn(TileSpan<'_>) + Send + Sync,
{
    let r = checked_rect(x, y, w, h)?;
    let (dx, dy) = (device.x(), device.y());
    let t = to_table_rect(&r, dx, dy)?;
    let table = device.table();
    let cells: Vec<(i32, i32)> = table.cells_in(&t).collect();
    log::debug!("for_each_tile: {} cells over {:?}", cells.len(), r);
    cells.into_par_iter().for_each(|(col, row)| {
        let cell = table.cell_rect(col, row);
        f(TileSpan {
            tile: table.tile_for(col, row),
            cell,
            rect: intersect_rectangles(&cell, &t),
            dx,
            dy,
        });
    });
    Ok(())
}

/// Parallel fill of (x, y, w, h) with `pixel`.
pub fn fill_rect(
    device: &mut PaintDevice,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    pixel: &[u8],
) -> Result<()> {
    if pixel.len() != device.pixel_size() {
        return Err(RasterError::InvalidPixel {
            expected: device.pixel_size(),
            actual: pixel.len(),
        });
    }
    let ps = pixel.len();
    for_each_tile_mut(device, x, y, w, h, |mut span| {
        for (_, row) in span.rows_mut() {
            for px in row.chunks_exact_mut(ps) {
                px.copy_from_slice(pixel);
            }
        }
    })
}

/// Apply `f` to every pixel of (x, y, w, h) in parallel.
pub fn map_pixels<F>(device: &mut PaintDevice, x: i32, y: i32, w: i32, h: i32, f: F) -> Result<()>
where
    F: Fn(&mut [u8]) + Send + Sync,
{
    let ps = device.pixel_size();
    for_each_tile_mut(device, x, y, w, h, |mut span| {
        for (_, row) in span.rows_mut() {
            row.chunks_exact_mut(ps).for_each(&f);
        }
    })
}

// ============================================================================
// Tests
// ============================================================================
