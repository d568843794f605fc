//! Tile access seam and the tile-resolving cursor shared by all iterators.
//!
//! Iterators are generic over a [`TileAccess`]: [`ReadAccess`] resolves
//! absent cells to the shared default tile and never allocates, while
//! [`WriteAccess`] materializes tiles on first touch. Only accesses that
//! implement [`WritableAccess`] let an iterator hand out `&mut` pixel data.
//!
//! [`TileCursor`] caches the base pointer of the tile that owns the current
//! coordinate. Moving within the same tile only updates the in-tile offset;
//! crossing into another cell goes back to the table.

use std::ptr::NonNull;

use crate::basics::RectI;
use crate::error::{RasterError, Result};
use crate::tile::Tile;
use crate::tile_table::TileTable;

// ============================================================================
// TileAccess
// ============================================================================

/// Resolves grid cells to tile buffers for a cursor.
pub trait TileAccess {
    fn table(&self) -> &TileTable;

    /// Base pointer of the buffer backing cell (col, row).
    ///
    /// The pointer stays valid until the table drops or replaces that tile,
    /// which cannot happen while the access borrows the table.
    fn resolve(&mut self, col: i32, row: i32) -> Result<NonNull<u8>>;
}

/// Marker for accesses whose resolved buffers may be written through.
pub trait WritableAccess: TileAccess {}

/// Read-mode access: absent cells resolve to the default tile.
#[derive(Debug, Clone, Copy)]
pub struct ReadAccess<'a> {
    table: &'a TileTable,
}

impl<'a> ReadAccess<'a> {
    pub fn new(table: &'a TileTable) -> Self {
        Self { table }
    }
}

impl TileAccess for ReadAccess<'_> {
    fn table(&self) -> &TileTable {
        self.table
    }

    #[inline]
    fn resolve(&mut self, col: i32, row: i32) -> Result<NonNull<u8>> {
        Ok(self.table.read_ptr(col, row))
    }
}

/// Write-mode access: absent cells are materialized from the default tile.
#[derive(Debug)]
pub struct WriteAccess<'a> {
    table: &'a mut TileTable,
}

impl<'a> WriteAccess<'a> {
    pub fn new(table: &'a mut TileTable) -> Self {
        Self { table }
    }
}

impl TileAccess for WriteAccess<'_> {
    fn table(&self) -> &TileTable {
        self.table
    }

    #[inline]
    fn resolve(&mut self, col: i32, row: i32) -> Result<NonNull<u8>> {
        self.table.write_ptr(col, row)
    }
}

impl WritableAccess for WriteAccess<'_> {}

// ============================================================================
// Region validation
// ============================================================================

/// Turn an origin/size request into an inclusive rectangle, rejecting empty
/// or negative sizes and coordinates that would overflow.
pub(crate) fn checked_rect(x: i32, y: i32, w: i32, h: i32) -> Result<RectI> {
    if w <= 0 || h <= 0 {
        log::warn!("rejecting region ({}, {}) {}x{}", x, y, w, h);
        return Err(RasterError::invalid_rect(x, y, w, h));
    }
    let x2 = x.checked_add(w - 1);
    let y2 = y.checked_add(h - 1);
    match (x2, y2) {
        (Some(x2), Some(y2)) => Ok(RectI::new(x, y, x2, y2)),
        _ => {
            log::warn!("rejecting overflowing region ({}, {}) {}x{}", x, y, w, h);
            Err(RasterError::invalid_rect(x, y, w, h))
        }
    }
}

/// Reject rectangles with inverted corners.
pub(crate) fn check_rect(rect: &RectI) -> Result<()> {
    if rect.is_valid() {
        Ok(())
    } else {
        log::warn!("rejecting inverted region {:?}", rect);
        Err(RasterError::invalid_rect(
            rect.x1,
            rect.y1,
            rect.x2.wrapping_sub(rect.x1).wrapping_add(1),
            rect.y2.wrapping_sub(rect.y1).wrapping_add(1),
        ))
    }
}

/// Remove the device offset (dx, dy) from a device-space rectangle.
/// Fails with `InvalidRegion` when a corner has no table coordinate.
pub(crate) fn to_table_rect(rect: &RectI, dx: i32, dy: i32) -> Result<RectI> {
    rect.checked_untranslated(dx, dy).ok_or_else(|| {
        log::warn!(
            "region {:?} has no table coordinates under offset ({}, {})",
            rect,
            dx,
            dy
        );
        RasterError::invalid_rect(
            rect.x1,
            rect.y1,
            rect.x2.wrapping_sub(rect.x1).wrapping_add(1),
            rect.y2.wrapping_sub(rect.y1).wrapping_add(1),
        )
    })
}

/// Single-pixel form of [`to_table_rect`].
pub(crate) fn to_table_point(x: i32, y: i32, dx: i32, dy: i32) -> Result<(i32, i32)> {
    match (x.checked_sub(dx), y.checked_sub(dy)) {
        (Some(tx), Some(ty)) => Ok((tx, ty)),
        _ => {
            log::warn!(
                "pixel ({}, {}) has no table coordinate under offset ({}, {})",
                x,
                y,
                dx,
                dy
            );
            Err(RasterError::invalid_rect(x, y, 1, 1))
        }
    }
}

// ============================================================================
// TileCursor
// ============================================================================

/// Position inside the tile grid plus a cached pointer to the owning tile.
///
/// Invariant: `base` is the buffer of cell (`col`, `row`) and
/// `0 <= lx, ly < tile_size`.
#[derive(Debug, Clone, Copy)]
pub struct TileCursor {
    tile_size: u32,
    shift: u32,
    pixel_size: usize,
    col: i32,
    row: i32,
    lx: i32,
    ly: i32,
    base: NonNull<u8>,
}

impl TileCursor {
    /// Position a new cursor at table coordinate (x, y).
    pub fn new<A: TileAccess>(access: &mut A, x: i32, y: i32) -> Result<Self> {
        let table = access.table();
        let tile_size = table.tile_size();
        let shift = tile_size.trailing_zeros();
        let pixel_size = table.pixel_size();
        let (col, row) = table.tile_coord_for(x, y);
        let (lx, ly) = table.local_coord_for(x, y);
        let base = access.resolve(col, row)?;
        Ok(Self {
            tile_size,
            shift,
            pixel_size,
            col,
            row,
            lx,
            ly,
            base,
        })
    }

    /// Move to table coordinate (x, y), re-resolving only when the
    /// coordinate falls in a different cell. On error the cursor is left
    /// where it was.
    #[inline]
    pub fn move_to<A: TileAccess>(&mut self, access: &mut A, x: i32, y: i32) -> Result<()> {
        let col = x >> self.shift;
        let row = y >> self.shift;
        if col != self.col || row != self.row {
            self.base = access.resolve(col, row)?;
            self.col = col;
            self.row = row;
        }
        let mask = self.tile_size as i32 - 1;
        self.lx = x & mask;
        self.ly = y & mask;
        Ok(())
    }

    /// Grid cell of the current coordinate.
    pub fn cell(&self) -> (i32, i32) {
        (self.col, self.row)
    }

    /// In-tile coordinate.
    pub fn local(&self) -> (i32, i32) {
        (self.lx, self.ly)
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn pixel_size(&self) -> usize {
        self.pixel_size
    }

    /// Pixels from the current column to the right edge of the tile.
    pub fn pixels_to_tile_right(&self) -> i32 {
        self.tile_size as i32 - self.lx
    }

    /// Pixels from the current row to the bottom edge of the tile.
    pub fn pixels_to_tile_bottom(&self) -> i32 {
        self.tile_size as i32 - self.ly
    }

    #[inline]
    fn ptr(&self) -> *mut u8 {
        let off = Tile::byte_offset(self.tile_size, self.pixel_size, self.lx, self.ly);
        // SAFETY: the invariant keeps `off + pixel_size` inside the buffer.
        unsafe { self.base.as_ptr().add(off) }
    }

    /// Bytes of the current pixel.
    ///
    /// # Safety
    /// The access this cursor was resolved through must still borrow its
    /// table, and no `&mut` to the same bytes may be live.
    #[inline]
    pub unsafe fn pixel<'b>(&self) -> &'b [u8] {
        std::slice::from_raw_parts(self.ptr(), self.pixel_size)
    }

    /// Mutable bytes of the current pixel.
    ///
    /// # Safety
    /// As for [`pixel`](Self::pixel), and the cursor must have been resolved
    /// through a [`WritableAccess`] so the buffer is a real tile.
    #[inline]
    pub unsafe fn pixel_mut<'b>(&self) -> &'b mut [u8] {
        std::slice::from_raw_parts_mut(self.ptr(), self.pixel_size)
    }

    /// Bytes of `n` consecutive pixels starting at the current one.
    ///
    /// # Safety
    /// As for [`pixel`](Self::pixel), plus `n <= pixels_to_tile_right()`.
    #[inline]
    pub unsafe fn span<'b>(&self, n: usize) -> &'b [u8] {
        debug_assert!(n as i32 <= self.pixels_to_tile_right());
        std::slice::from_raw_parts(self.ptr(), self.pixel_size * n)
    }

    /// Mutable bytes of `n` consecutive pixels starting at the current one.
    ///
    /// # Safety
    /// As for [`pixel_mut`](Self::pixel_mut), plus
    /// `n <= pixels_to_tile_right()`.
    #[inline]
    pub unsafe fn span_mut<'b>(&self, n: usize) -> &'b mut [u8] {
        debug_assert!(n as i32 <= self.pixels_to_tile_right());
        std::slice::from_raw_parts_mut(self.ptr(), self.pixel_size * n)
    }
}

// ============================================================================
// Tests
// ============================================================================
