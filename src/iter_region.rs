//! Region iterator: row-major walk over a union of rectangles, optionally
//! restricted by a [`Selection`].
//!
//! Each row is reduced to sorted, merged spans before it is walked, so
//! overlapping rectangles still yield every pixel once and the scan order
//! is the same as for a rect iterator over the bounding box with the
//! excluded pixels left out. The tile cursor is only moved onto pixels
//! that are visited; a write iterator never materializes a tile for an
//! excluded pixel.

use crate::basics::{unite_rectangles, RectI};
use crate::error::{RasterError, Result};
use crate::random_accessor::RandomConstAccessor;
use crate::selection::{Selection, SELECTED, UNSELECTED};
use crate::tile_access::{
    check_rect, checked_rect, to_table_rect, ReadAccess, TileAccess, TileCursor, WritableAccess,
    WriteAccess,
};

// ============================================================================
// Region
// ============================================================================

/// A non-empty union of valid rectangles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    rects: Vec<RectI>,
    bounds: RectI,
}

impl Region {
    /// A single rectangle from origin and size.
    pub fn from_rect(x: i32, y: i32, w: i32, h: i32) -> Result<Self> {
        let r = checked_rect(x, y, w, h)?;
        Ok(Self {
            rects: vec![r],
            bounds: r,
        })
    }

    /// Union of `rects`. Every rectangle must be valid and the list must
    /// not be empty.
    pub fn from_rects(rects: &[RectI]) -> Result<Self> {
        let Some(first) = rects.first() else {
            return Err(RasterError::InvalidRegionShape {
                reason: "region has no rectangles".into(),
            });
        };
        let mut bounds = *first;
        for r in rects {
            check_rect(r)?;
            bounds = unite_rectangles(&bounds, r);
        }
        Ok(Self {
            rects: rects.to_vec(),
            bounds,
        })
    }

    pub fn rects(&self) -> &[RectI] {
        &self.rects
    }

    pub fn bounds(&self) -> RectI {
        self.bounds
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.rects.iter().any(|r| r.hit_test(x, y))
    }

    /// The region with the device offset (dx, dy) removed.
    pub(crate) fn to_table(&self, dx: i32, dy: i32) -> Result<Self> {
        let rects = self
            .rects
            .iter()
            .map(|r| to_table_rect(r, dx, dy))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            rects,
            bounds: to_table_rect(&self.bounds, dx, dy)?,
        })
    }

    /// Sorted, merged inclusive x spans covered on row `y`.
    fn row_spans(&self, y: i32, out: &mut Vec<(i32, i32)>) {
        out.clear();
        out.extend(
            self.rects
                .iter()
                .filter(|r| r.y1 <= y && y <= r.y2)
                .map(|r| (r.x1, r.x2)),
        );
        out.sort_unstable();
        let mut merged = 0;
        for i in 0..out.len() {
            let (s1, s2) = out[i];
            if merged > 0 && s1 <= out[merged - 1].1.saturating_add(1) {
                let last = &mut out[merged - 1];
                last.1 = last.1.max(s2);
            } else {
                out[merged] = (s1, s2);
                merged += 1;
            }
        }
        out.truncate(merged);
    }
}

// ============================================================================
// RegionIter
// ============================================================================

pub struct RegionIter<'s, A: TileAccess> {
    access: A,
    /// `None` until the first included pixel is found.
    cursor: Option<TileCursor>,
    /// Region in table coordinates.
    region: Region,
    mask: Option<RandomConstAccessor<'s>>,
    spans: Vec<(i32, i32)>,
    span: usize,
    x: i32,
    y: i32,
    dx: i32,
    dy: i32,
    done: bool,
}

pub type RegionIterator<'s, 'a> = RegionIter<'s, WriteAccess<'a>>;
pub type RegionConstIterator<'s, 'a> = RegionIter<'s, ReadAccess<'a>>;

impl<'s, A: TileAccess> RegionIter<'s, A> {
    /// `region` is in table coordinates; the selection is consulted in
    /// device coordinates (table + `dx`/`dy`).
    pub(crate) fn new(
        access: A,
        region: Region,
        selection: Option<&'s Selection>,
        dx: i32,
        dy: i32,
    ) -> Result<Self> {
        let b = region.bounds();
        let mask = match selection {
            Some(sel) => Some(sel.device().create_random_const_accessor(b.x1 + dx, b.y1 + dy)?),
            None => None,
        };
        let mut it = Self {
            access,
            cursor: None,
            region,
            mask,
            spans: Vec::new(),
            span: 0,
            x: b.x1,
            y: b.y1,
            dx,
            dy,
            done: false,
        };
        it.region.row_spans(b.y1, &mut it.spans);
        it.seek()?;
        Ok(it)
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

    /// Selection degree of the current pixel; `SELECTED` without a mask.
    pub fn selectedness(&self) -> u8 {
        self.mask.as_ref().map_or(SELECTED, |m| m.raw_data()[0])
    }

    fn included(&mut self) -> Result<bool> {
        let (x, y) = (self.x + self.dx, self.y + self.dy);
        match self.mask.as_mut() {
            None => Ok(true),
            Some(m) => {
                m.move_to(x, y)?;
                Ok(m.raw_data()[0] != UNSELECTED)
            }
        }
    }

    /// Move forward from the candidate (x, y) to the first included pixel
    /// and put the tile cursor there.
    fn seek(&mut self) -> Result<()> {
        let last_row = self.region.bounds().y2;
        loop {
            if self.span >= self.spans.len() {
                if self.y >= last_row {
                    self.done = true;
                    return Ok(());
                }
                self.y += 1;
                self.region.row_spans(self.y, &mut self.spans);
                self.span = 0;
                self.x = i32::MIN;
                continue;
            }
            let (s1, s2) = self.spans[self.span];
            if self.x < s1 {
                self.x = s1;
            }
            if self.x > s2 {
                self.span += 1;
                continue;
            }
            if self.included()? {
                break;
            }
            if self.x == s2 {
                self.span += 1;
            } else {
                self.x += 1;
            }
        }
        if let Some(c) = self.cursor.as_mut() {
            c.move_to(&mut self.access, self.x, self.y)
        } else {
            self.cursor = Some(TileCursor::new(&mut self.access, self.x, self.y)?);
            Ok(())
        }
    }

    /// Step to the next visited pixel. On error the scan is aborted.
    pub fn advance(&mut self) -> Result<()> {
        if self.done {
            return Ok(());
        }
        if self.x >= self.spans[self.span].1 {
            self.span += 1;
        } else {
            self.x += 1;
        }
        if let Err(e) = self.seek() {
            self.done = true;
            return Err(e);
        }
        Ok(())
    }

    /// Bytes of the current pixel; empty if nothing was ever visited.
    pub fn raw_data(&self) -> &[u8] {
        match &self.cursor {
            // SAFETY: see `RectIter::raw_data`.
            Some(c) => unsafe { c.pixel() },
            None => &[],
        }
    }
}

impl<A: WritableAccess> RegionIter<'_, A> {
    pub fn raw_data_mut(&mut self) -> &mut [u8] {
        match &self.cursor {
            // SAFETY: write access resolved a real tile; `&mut self` is unique.
            Some(c) => unsafe { c.pixel_mut() },
            None => &mut [],
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TileConfig;
    use crate::tile_table::TileTable;

    fn table() -> TileTable {
        TileTable::new(TileConfig::new(4).unwrap(), &[0]).unwrap()
    }

    fn visits<A: TileAccess>(mut it: RegionIter<'_, A>) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        while !it.is_done() {
            out.push((it.x(), it.y()));
            it.advance().unwrap();
        }
        out
    }

    #[test]
    fn test_region_validation() {
        assert!(matches!(
            Region::from_rects(&[]),
            Err(RasterError::InvalidRegionShape { .. })
        ));
        assert!(matches!(
            Region::from_rects(&[RectI::new(0, 0, 1, 1), RectI::new(3, 0, 2, 0)]),
            Err(RasterError::InvalidRegion { .. })
        ));
        assert!(Region::from_rect(0, 0, 0, 3).is_err());
        let r = Region::from_rects(&[RectI::new(0, 0, 1, 1), RectI::new(5, -2, 6, 0)]).unwrap();
        assert_eq!(r.bounds(), RectI::new(0, -2, 6, 1));
        assert!(r.contains(6, -2));
        assert!(!r.contains(3, 0));
    }

    #[test]
    fn test_row_spans_merge() {
        let r = Region::from_rects(&[
            RectI::new(5, 0, 8, 0),
            RectI::new(0, 0, 2, 0),
            RectI::new(3, 0, 4, 0),
            RectI::new(10, 0, 11, 0),
            RectI::new(7, 0, 9, 0),
        ])
        .unwrap();
        let mut spans = Vec::new();
        r.row_spans(0, &mut spans);
        assert_eq!(spans, vec![(0, 11)]);
        r.row_spans(1, &mut spans);
        assert!(spans.is_empty());
    }

    #[test]
    fn test_overlapping_rects_visit_once_in_order() {
        let t = table();
        let region = Region::from_rects(&[RectI::new(0, 0, 2, 1), RectI::new(1, 1, 3, 2)]).unwrap();
        let it = RegionIter::new(ReadAccess::new(&t), region, None, 0, 0).unwrap();
        assert_eq!(
            visits(it),
            vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1), (3, 1), (1, 2), (2, 2), (3, 2)]
        );
    }

    #[test]
    fn test_gap_rows_are_skipped() {
        let t = table();
        let region = Region::from_rects(&[RectI::new(0, 0, 0, 0), RectI::new(0, 5, 1, 5)]).unwrap();
        let it = RegionIter::new(ReadAccess::new(&t), region, None, 0, 0).unwrap();
        assert_eq!(visits(it), vec![(0, 0), (0, 5), (1, 5)]);
    }

    #[test]
    fn test_selection_restricts_and_avoids_allocation() {
        let mut t = table();
        let mut sel = Selection::with_config(
            &crate::config::DeviceConfig::default().with_tile_size(4).unwrap(),
        )
        .unwrap();
        sel.select_rect(1, 1, 2, 1).unwrap();
        {
            let region = Region::from_rect(0, 0, 40, 40).unwrap();
            let mut it =
                RegionIter::new(WriteAccess::new(&mut t), region, Some(&sel), 0, 0).unwrap();
            let mut n = 0;
            while !it.is_done() {
                assert_eq!(it.selectedness(), SELECTED);
                it.raw_data_mut()[0] = 1;
                n += 1;
                it.advance().unwrap();
            }
            assert_eq!(n, 2);
        }
        assert_eq!(t.tile_count(), 1);
        assert_eq!(t.pixel(1, 1), &[1]);
        assert_eq!(t.pixel(2, 1), &[1]);
        assert_eq!(t.pixel(0, 1), &[0]);
    }

    #[test]
    fn test_empty_selection_yields_nothing() {
        let mut t = table();
        let sel = Selection::new().unwrap();
        let region = Region::from_rect(0, 0, 8, 8).unwrap();
        let mut it = RegionIter::new(WriteAccess::new(&mut t), region, Some(&sel), 0, 0).unwrap();
        assert!(it.is_done());
        assert!(it.raw_data_mut().is_empty());
        drop(it);
        assert_eq!(t.tile_count(), 0);
    }

    /// Write access that fails to allocate once `left` resolves are used up.
    struct FailingAccess<'a> {
        inner: WriteAccess<'a>,
        left: usize,
    }

    impl TileAccess for FailingAccess<'_> {
        fn table(&self) -> &TileTable {
            self.inner.table()
        }

        fn resolve(&mut self, col: i32, row: i32) -> Result<std::ptr::NonNull<u8>> {
            if self.left == 0 {
                return Err(RasterError::Allocation { bytes: 16 });
            }
            self.left -= 1;
            self.inner.resolve(col, row)
        }
    }

    impl WritableAccess for FailingAccess<'_> {}

    #[test]
    fn test_allocation_failure_aborts_scan() {
        let mut t = table();
        {
            let access = FailingAccess {
                inner: WriteAccess::new(&mut t),
                left: 2,
            };
            let region = Region::from_rects(&[RectI::new(0, 0, 9, 0)]).unwrap();
            let mut it = RegionIter::new(access, region, None, 0, 0).unwrap();
            let err = loop {
                it.raw_data_mut()[0] = 1;
                if let Err(e) = it.advance() {
                    break e;
                }
                assert!(!it.is_done());
            };
            assert_eq!(err, RasterError::Allocation { bytes: 16 });
            assert!(it.is_done());
            assert_eq!(it.x(), 8);
            assert!(it.advance().is_ok());
        }
        assert_eq!(t.tile_count(), 2);
        for x in 0..8 {
            assert_eq!(t.pixel(x, 0), &[1]);
        }
        assert_eq!(t.pixel(8, 0), &[0]);
    }

    #[test]
    fn test_region_to_table_rejects_unreachable_offset() {
        let region = Region::from_rect(i32::MIN, 0, 2, 2).unwrap();
        assert!(matches!(
            region.to_table(1, 0),
            Err(RasterError::InvalidRegion { .. })
        ));
        let moved = region.to_table(-1, -1).unwrap();
        assert_eq!(moved.bounds(), RectI::new(i32::MIN + 1, 1, i32::MIN + 2, 2));
    }

    #[test]
    fn test_selection_in_device_coordinates() {
        let t = table();
        let mut sel = Selection::new().unwrap();
        sel.select_rect(10, 10, 1, 1).unwrap();
        // Table (0, 0) is device (10, 10).
        let region = Region::from_rect(0, 0, 2, 2).unwrap();
        let it = RegionIter::new(ReadAccess::new(&t), region, Some(&sel), 10, 10).unwrap();
        assert_eq!(visits(it), vec![(10, 10)]);
    }
}
