//! Snapshot rect iterator: a write iterator that can also read what each
//! pixel held when the iterator was created.
//!
//! The snapshot is explicit: tiles overlapping the region are deep-copied
//! up front into a private table, so "old data" never changes while the
//! live device is being written. Filters that read neighbours from the
//! source while writing the result use this instead of a second device.

use crate::basics::RectI;
use crate::error::Result;
use crate::iter_rect::{RectIter, RectIterator};
use crate::tile_access::{check_rect, ReadAccess, TileCursor, WriteAccess};
use crate::tile_table::TileTable;

pub struct SnapshotRectIter<'a> {
    live: RectIterator<'a>,
    /// Tile buffers are heap allocations owned by `snapshot`; moving the
    /// table does not move them, so `old` stays valid.
    snapshot: TileTable,
    old: TileCursor,
}

impl<'a> SnapshotRectIter<'a> {
    pub(crate) fn new(table: &'a mut TileTable, rect: RectI, dx: i32, dy: i32) -> Result<Self> {
        check_rect(&rect)?;
        let snapshot = table.try_clone_region(&rect)?;
        log::debug!(
            "snapshot iterator over {:?}: copied {} tiles",
            rect,
            snapshot.tile_count()
        );
        let old = TileCursor::new(&mut ReadAccess::new(&snapshot), rect.x1, rect.y1)?;
        let live = RectIter::new(WriteAccess::new(table), rect, dx, dy)?;
        Ok(Self {
            live,
            snapshot,
            old,
        })
    }

    pub fn is_done(&self) -> bool {
        self.live.is_done()
    }

    pub fn x(&self) -> i32 {
        self.live.x()
    }

    pub fn y(&self) -> i32 {
        self.live.y()
    }

    pub fn advance(&mut self) -> Result<()> {
        self.live.advance()?;
        if self.live.is_done() {
            return Ok(());
        }
        let (tx, ty) = self.live.table_pos();
        self.old.move_to(&mut ReadAccess::new(&self.snapshot), tx, ty)
    }

    pub fn raw_data(&self) -> &[u8] {
        self.live.raw_data()
    }

    pub fn raw_data_mut(&mut self) -> &mut [u8] {
        self.live.raw_data_mut()
    }

    /// The current pixel as it was when the iterator was created.
    pub fn old_raw_data(&self) -> &[u8] {
        // SAFETY: `old` points into `self.snapshot`, which nothing mutates
        // and which lives as long as `self`.
        unsafe { self.old.pixel() }
    }
}
