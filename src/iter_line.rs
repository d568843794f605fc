//! Line iterators: single-row and single-column walks.
//!
//! [`HLineIter`] walks `w` pixels to the right from its start and can then
//! be moved down with [`HLineIter::next_row`]; [`VLineIter`] walks `h`
//! pixels down and moves right with [`VLineIter::next_col`]. Within a line
//! the tile resolved for the previous pixel is reused until the line
//! crosses into the next cell.

use crate::error::{RasterError, Result};
use crate::tile_access::{
    checked_rect, ReadAccess, TileAccess, TileCursor, WritableAccess, WriteAccess,
};

// ============================================================================
// HLineIter
// ============================================================================

/// Horizontal line iterator.
pub struct HLineIter<A: TileAccess> {
    access: A,
    cursor: TileCursor,
    x1: i32,
    x2: i32,
    x: i32,
    y: i32,
    dx: i32,
    dy: i32,
    done: bool,
}

pub type HLineIterator<'a> = HLineIter<WriteAccess<'a>>;
pub type HLineConstIterator<'a> = HLineIter<ReadAccess<'a>>;

impl<A: TileAccess> HLineIter<A> {
    /// Begin at table coordinate (x, y) covering `w` pixels.
    pub(crate) fn new(mut access: A, x: i32, y: i32, w: i32, dx: i32, dy: i32) -> Result<Self> {
        let r = checked_rect(x, y, w, 1)?;
        let cursor = TileCursor::new(&mut access, x, y)?;
        Ok(Self {
            access,
            cursor,
            x1: r.x1,
            x2: r.x2,
            x,
            y,
            dx,
            dy,
            done: false,
        })
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn x(&self) -> i32 {
        self.x + self.dx
    }

    pub fn y(&self) -> i32 {
        self.y + self.dy
    }

    /// Step one pixel right; the line is done after its last pixel.
    pub fn advance(&mut self) -> Result<()> {
        self.advance_by(1)
    }

    pub fn advance_by(&mut self, n: i32) -> Result<()> {
        if self.done || n <= 0 {
            return Ok(());
        }
        if (self.x as i64 + n as i64) > self.x2 as i64 {
            self.done = true;
            return Ok(());
        }
        self.x += n;
        if let Err(e) = self.cursor.move_to(&mut self.access, self.x, self.y) {
            self.done = true;
            return Err(e);
        }
        Ok(())
    }

    /// Restart at the beginning of the line one row further down. Fails
    /// with `InvalidRegion` past the last row of table or device space.
    pub fn next_row(&mut self) -> Result<()> {
        let dy = self.dy;
        self.y = self
            .y
            .checked_add(1)
            .filter(|y| y.checked_add(dy).is_some())
            .ok_or_else(|| RasterError::invalid_rect(self.x1, self.y, self.x2 - self.x1 + 1, 1))?;
        self.x = self.x1;
        self.done = false;
        if let Err(e) = self.cursor.move_to(&mut self.access, self.x, self.y) {
            self.done = true;
            return Err(e);
        }
        Ok(())
    }

    /// Pixels left in the current tile row and line.
    pub fn n_conseq_pixels(&self) -> i32 {
        if self.done {
            return 0;
        }
        (self.x2 - self.x + 1).min(self.cursor.pixels_to_tile_right())
    }

    pub fn raw_data(&self) -> &[u8] {
        // SAFETY: see `RectIter::raw_data`.
        unsafe { self.cursor.pixel() }
    }

    pub fn raw_span(&self) -> &[u8] {
        let n = self.n_conseq_pixels().max(0) as usize;
        // SAFETY: `n` stays inside the current tile row.
        unsafe { self.cursor.span(n) }
    }
}

impl<A: WritableAccess> HLineIter<A> {
    pub fn raw_data_mut(&mut self) -> &mut [u8] {
        // SAFETY: write access resolved a real tile; `&mut self` is unique.
        unsafe { self.cursor.pixel_mut() }
    }

    pub fn raw_span_mut(&mut self) -> &mut [u8] {
        let n = self.n_conseq_pixels().max(0) as usize;
        // SAFETY: as above, `n` stays inside the current tile row.
        unsafe { self.cursor.span_mut(n) }
    }
}

// ============================================================================
// VLineIter
// ============================================================================

/// Vertical line iterator.
pub struct VLineIter<A: TileAccess> {
    access: A,
    cursor: TileCursor,
    y1: i32,
    y2: i32,
    x: i32,
    y: i32,
    dx: i32,
    dy: i32,
    done: bool,
}

pub type VLineIterator<'a> = VLineIter<WriteAccess<'a>>;
pub type VLineConstIterator<'a> = VLineIter<ReadAccess<'a>>;

impl<A: TileAccess> VLineIter<A> {
    /// Begin at table coordinate (x, y) covering `h` pixels downward.
    pub(crate) fn new(mut access: A, x: i32, y: i32, h: i32, dx: i32, dy: i32) -> Result<Self> {
        let r = checked_rect(x, y, 1, h)?;
        let cursor = TileCursor::new(&mut access, x, y)?;
        Ok(Self {
            access,
            cursor,
            y1: r.y1,
            y2: r.y2,
            x,
            y,
            dx,
            dy,
            done: false,
        })
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn x(&self) -> i32 {
        self.x + self.dx
    }

    pub fn y(&self) -> i32 {
        self.y + self.dy
    }

    /// Step one pixel down; the line is done after its last pixel.
    pub fn advance(&mut self) -> Result<()> {
        if self.done {
            return Ok(());
        }
        if self.y >= self.y2 {
            self.done = true;
            return Ok(());
        }
        self.y += 1;
        if let Err(e) = self.cursor.move_to(&mut self.access, self.x, self.y) {
            self.done = true;
            return Err(e);
        }
        Ok(())
    }

    /// Restart at the top of the line one column further right. Fails
    /// with `InvalidRegion` past the last column of table or device space.
    pub fn next_col(&mut self) -> Result<()> {
        let dx = self.dx;
        self.x = self
            .x
            .checked_add(1)
            .filter(|x| x.checked_add(dx).is_some())
            .ok_or_else(|| RasterError::invalid_rect(self.x, self.y1, 1, self.y2 - self.y1 + 1))?;
        self.y = self.y1;
        self.done = false;
        if let Err(e) = self.cursor.move_to(&mut self.access, self.x, self.y) {
            self.done = true;
            return Err(e);
        }
        Ok(())
    }

    /// Pixels left in the current tile column and line.
    pub fn n_conseq_pixels(&self) -> i32 {
        if self.done {
            return 0;
        }
        (self.y2 - self.y + 1).min(self.cursor.pixels_to_tile_bottom())
    }

    pub fn raw_data(&self) -> &[u8] {
        // SAFETY: see `RectIter::raw_data`.
        unsafe { self.cursor.pixel() }
    }
}

impl<A: WritableAccess> VLineIter<A> {
    pub fn raw_data_mut(&mut self) -> &mut [u8] {
        // SAFETY: write access resolved a real tile; `&mut self` is unique.
        unsafe { self.cursor.pixel_mut() }
    }
}

// ============================================================================
// Tests
// ============================================================================
