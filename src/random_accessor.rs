//! Random accessor: jump to arbitrary coordinates, reusing the cached tile
//! while successive positions stay inside the same cell.

use crate::error::Result;
use crate::tile_access::{
    to_table_point, ReadAccess, TileAccess, TileCursor, WritableAccess, WriteAccess,
};

pub struct RandomAccessor<A: TileAccess> {
    access: A,
    cursor: TileCursor,
    x: i32,
    y: i32,
    dx: i32,
    dy: i32,
}

pub type RandomAccessorMut<'a> = RandomAccessor<WriteAccess<'a>>;
pub type RandomConstAccessor<'a> = RandomAccessor<ReadAccess<'a>>;

impl<A: TileAccess> RandomAccessor<A> {
    pub(crate) fn new(mut access: A, x: i32, y: i32, dx: i32, dy: i32) -> Result<Self> {
        let cursor = TileCursor::new(&mut access, x, y)?;
        Ok(Self {
            access,
            cursor,
            x,
            y,
            dx,
            dy,
        })
    }

    /// Move to device coordinate (x, y). Fails with `InvalidRegion` when
    /// the offset pushes (x, y) out of table space; the accessor stays put.
    pub fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        let (tx, ty) = to_table_point(x, y, self.dx, self.dy)?;
        self.cursor.move_to(&mut self.access, tx, ty)?;
        self.x = tx;
        self.y = ty;
        Ok(())
    }

    pub fn x(&self) -> i32 {
        self.x + self.dx
    }

    pub fn y(&self) -> i32 {
        self.y + self.dy
    }

    pub fn raw_data(&self) -> &[u8] {
        // SAFETY: see `RectIter::raw_data`.
        unsafe { self.cursor.pixel() }
    }
}

impl<A: WritableAccess> RandomAccessor<A> {
    pub fn raw_data_mut(&mut self) -> &mut [u8] {
        // SAFETY: write access resolved a real tile; `&mut self` is unique.
        unsafe { self.cursor.pixel_mut() }
    }
}
