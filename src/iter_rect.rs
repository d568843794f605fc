//! Rectangle iterator: row-major walk over a rectangular region.
//!
//! The iterator starts positioned on the region's top-left pixel and visits
//! every pixel exactly once, left to right, top to bottom. Tile boundaries
//! are crossed transparently: the cursor only goes back to the tile table
//! when the next pixel lives in a different cell.
//!
//! ```text
//! let mut it = device.create_rect_iterator(0, 0, 100, 100)?;
//! while !it.is_done() {
//!     it.raw_data_mut()[0] = 255;
//!     it.advance()?;
//! }
//! ```

use crate::basics::RectI;
use crate::error::Result;
use crate::tile_access::{
    check_rect, ReadAccess, TileAccess, TileCursor, WritableAccess, WriteAccess,
};

/// Row-major iterator over a rectangle, generic over read or write access.
pub struct RectIter<A: TileAccess> {
    access: A,
    cursor: TileCursor,
    /// Region in table coordinates.
    rect: RectI,
    /// Device offset added to report device coordinates.
    dx: i32,
    dy: i32,
    x: i32,
    y: i32,
    done: bool,
}

/// Write iterator: materializes tiles as it goes.
pub type RectIterator<'a> = RectIter<WriteAccess<'a>>;
/// Read-only iterator: never allocates.
pub type RectConstIterator<'a> = RectIter<ReadAccess<'a>>;

impl<A: TileAccess> RectIter<A> {
    /// Begin at the top-left of `rect` (table coordinates). `dx`/`dy` is the
    /// device offset. Fails with `InvalidRegion` before touching any tile if
    /// `rect` is empty or inverted.
    pub(crate) fn new(mut access: A, rect: RectI, dx: i32, dy: i32) -> Result<Self> {
        check_rect(&rect)?;
        let cursor = TileCursor::new(&mut access, rect.x1, rect.y1)?;
        Ok(Self {
            access,
            cursor,
            rect,
            dx,
            dy,
            x: rect.x1,
            y: rect.y1,
            done: false,
        })
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Current x in device coordinates.
    pub fn x(&self) -> i32 {
        self.x + self.dx
    }

    /// Current y in device coordinates.
    pub fn y(&self) -> i32 {
        self.y + self.dy
    }

    pub(crate) fn table_pos(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// The scanned region in device coordinates.
    pub fn region(&self) -> RectI {
        self.rect.translated(self.dx, self.dy)
    }

    /// Step to the next pixel in scan order.
    ///
    /// A write iterator may have to allocate a tile here; on failure the
    /// scan is aborted (`is_done()` turns true) and the error returned.
    /// Pixels written before the failure stay written.
    pub fn advance(&mut self) -> Result<()> {
        self.advance_by(1)
    }

    /// Step `n` pixels forward in scan order, wrapping onto following rows.
    pub fn advance_by(&mut self, n: i32) -> Result<()> {
        if self.done || n <= 0 {
            return Ok(());
        }
        let width = self.rect.width() as i64;
        let col = (self.x - self.rect.x1) as i64 + n as i64;
        let rows = col / width;
        let new_y = self.y as i64 + rows;
        if new_y > self.rect.y2 as i64 {
            self.done = true;
            return Ok(());
        }
        self.x = self.rect.x1 + (col % width) as i32;
        self.y = new_y as i32;
        if let Err(e) = self.cursor.move_to(&mut self.access, self.x, self.y) {
            self.done = true;
            return Err(e);
        }
        Ok(())
    }

    /// Number of pixels from the current one to the end of the row or the
    /// end of the tile, whichever comes first. These pixels are contiguous
    /// in memory.
    pub fn n_conseq_pixels(&self) -> i32 {
        if self.done {
            return 0;
        }
        (self.rect.x2 - self.x + 1).min(self.cursor.pixels_to_tile_right())
    }

    /// Bytes of the current pixel. After the scan finishes this still
    /// points at the last visited pixel.
    pub fn raw_data(&self) -> &[u8] {
        // SAFETY: `self.access` borrows the table for the iterator's life
        // and the result borrows `self`, so no mutable alias can exist.
        unsafe { self.cursor.pixel() }
    }

    /// Bytes of the next `n_conseq_pixels()` pixels.
    pub fn raw_span(&self) -> &[u8] {
        let n = self.n_conseq_pixels().max(0) as usize;
        // SAFETY: `n` never exceeds the pixels left in the tile row.
        unsafe { self.cursor.span(n) }
    }
}

impl<A: WritableAccess> RectIter<A> {
    /// Mutable bytes of the current pixel.
    pub fn raw_data_mut(&mut self) -> &mut [u8] {
        // SAFETY: write access resolved a real tile; `&mut self` is unique.
        unsafe { self.cursor.pixel_mut() }
    }

    /// Mutable bytes of the next `n_conseq_pixels()` pixels.
    pub fn raw_span_mut(&mut self) -> &mut [u8] {
        let n = self.n_conseq_pixels().max(0) as usize;
        // SAFETY: as for `raw_data_mut`, and `n` stays inside the tile row.
        unsafe { self.cursor.span_mut(n) }
    }
}

// ============================================================================
// Tests
// ============================================================================
