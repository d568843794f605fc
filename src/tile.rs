//! Tile: one fixed-size square block of contiguous pixel memory.
//!
//! A tile answers for a single cell of the tile grid. Its buffer is laid out
//! row-major, `size * pixel_size` bytes per row, and is fully allocated for
//! as long as the tile exists. The buffer lives on the heap and is never
//! resized, so its address stays put when the owning table moves the `Tile`
//! value around; iterators rely on that to cache a base pointer while they
//! walk across a tile.

use std::ptr::NonNull;

use crate::basics::RectI;
use crate::error::{RasterError, Result};

/// Allocate `len` bytes filled with a repeating pixel pattern.
///
/// Uses `try_reserve_exact` so an out-of-memory condition surfaces as
/// [`RasterError::Allocation`] instead of aborting the process.
pub(crate) fn alloc_filled(len: usize, pattern: &[u8]) -> Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| RasterError::Allocation { bytes: len })?;
    match pattern {
        [] => buf.resize(len, 0),
        [b] => buf.resize(len, *b),
        _ if pattern.iter().all(|&b| b == pattern[0]) => buf.resize(len, pattern[0]),
        _ => {
            while buf.len() < len {
                buf.extend_from_slice(pattern);
            }
            buf.truncate(len);
        }
    }
    Ok(buf)
}

// ============================================================================
// Tile
// ============================================================================

/// A square block of `size` x `size` pixels at grid cell (`col`, `row`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    col: i32,
    row: i32,
    size: u32,
    pixel_size: usize,
    data: Vec<u8>,
}

impl Tile {
    /// Create a tile whose every pixel equals `fill`.
    ///
    /// `fill.len()` is the pixel size. Fails with
    /// [`RasterError::Allocation`] if the buffer cannot be obtained.
    pub fn new(col: i32, row: i32, size: u32, fill: &[u8]) -> Result<Self> {
        let pixel_size = fill.len();
        if pixel_size == 0 {
            return Err(RasterError::InvalidPixel {
                expected: 1,
                actual: 0,
            });
        }
        let len = (size as usize)
            .checked_mul(size as usize)
            .and_then(|n| n.checked_mul(pixel_size))
            .ok_or(RasterError::Allocation { bytes: usize::MAX })?;
        let data = alloc_filled(len, fill)?;
        Ok(Self {
            col,
            row,
            size,
            pixel_size,
            data,
        })
    }

    /// Deep copy of this tile, relocated to another grid cell.
    pub fn clone_at(&self, col: i32, row: i32) -> Result<Self> {
        let mut buf: Vec<u8> = Vec::new();
        buf.try_reserve_exact(self.data.len())
            .map_err(|_| RasterError::Allocation {
                bytes: self.data.len(),
            })?;
        buf.extend_from_slice(&self.data);
        Ok(Self {
            col,
            row,
            size: self.size,
            pixel_size: self.pixel_size,
            data: buf,
        })
    }

    /// Fallible deep copy.
    pub fn try_clone(&self) -> Result<Self> {
        self.clone_at(self.col, self.row)
    }

    pub fn col(&self) -> i32 {
        self.col
    }

    pub fn row(&self) -> i32 {
        self.row
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn pixel_size(&self) -> usize {
        self.pixel_size
    }

    /// Bytes per tile row.
    pub fn stride(&self) -> usize {
        self.size as usize * self.pixel_size
    }

    /// Total buffer size in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Pixel-space rectangle covered by this tile (offset-free coordinates).
    pub fn rect(&self) -> RectI {
        let s = self.size as i32;
        RectI::new(
            self.col * s,
            self.row * s,
            self.col * s + (s - 1),
            self.row * s + (s - 1),
        )
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Byte offset of the in-tile pixel (`lx`, `ly`).
    ///
    /// No bounds check: callers guarantee `0 <= lx, ly < size`. Only the
    /// cursor layer calls this on its hot path; it has already resolved the
    /// coordinate to this tile.
    #[inline]
    pub fn byte_offset(size: u32, pixel_size: usize, lx: i32, ly: i32) -> usize {
        debug_assert!(lx >= 0 && (lx as u32) < size, "lx {} outside tile", lx);
        debug_assert!(ly >= 0 && (ly as u32) < size, "ly {} outside tile", ly);
        (ly as usize * size as usize + lx as usize) * pixel_size
    }

    /// Base pointer of the buffer, stable for the life of the tile.
    #[inline]
    pub(crate) fn base_ptr(&self) -> NonNull<u8> {
        NonNull::new(self.data.as_ptr() as *mut u8).unwrap_or(NonNull::dangling())
    }

    /// Mutable base pointer of the buffer.
    #[inline]
    pub(crate) fn base_ptr_mut(&mut self) -> NonNull<u8> {
        NonNull::new(self.data.as_mut_ptr()).unwrap_or(NonNull::dangling())
    }

    /// Checked read of one pixel.
    pub fn pixel(&self, lx: i32, ly: i32) -> &[u8] {
        assert!(
            lx >= 0 && ly >= 0 && (lx as u32) < self.size && (ly as u32) < self.size,
            "pixel ({}, {}) out of tile bounds (size={})",
            lx,
            ly,
            self.size
        );
        let off = Self::byte_offset(self.size, self.pixel_size, lx, ly);
        &self.data[off..off + self.pixel_size]
    }

    /// Checked mutable access to one pixel.
    pub fn pixel_mut(&mut self, lx: i32, ly: i32) -> &mut [u8] {
        assert!(
            lx >= 0 && ly >= 0 && (lx as u32) < self.size && (ly as u32) < self.size,
            "pixel ({}, {}) out of tile bounds (size={})",
            lx,
            ly,
            self.size
        );
        let off = Self::byte_offset(self.size, self.pixel_size, lx, ly);
        let ps = self.pixel_size;
        &mut self.data[off..off + ps]
    }

    /// Immutable slice for in-tile row `ly`.
    pub fn row_slice(&self, ly: u32) -> &[u8] {
        assert!(
            ly < self.size,
            "row {} out of bounds (size={})",
            ly,
            self.size
        );
        let stride = self.stride();
        let start = ly as usize * stride;
        &self.data[start..start + stride]
    }

    /// Mutable slice for in-tile row `ly`.
    pub fn row_slice_mut(&mut self, ly: u32) -> &mut [u8] {
        assert!(
            ly < self.size,
            "row {} out of bounds (size={})",
            ly,
            self.size
        );
        let stride = self.stride();
        let start = ly as usize * stride;
        &mut self.data[start..start + stride]
    }

    /// Fill every pixel with `pattern`.
    pub fn fill(&mut self, pattern: &[u8]) {
        debug_assert_eq!(pattern.len(), self.pixel_size);
        for px in self.data.chunks_exact_mut(self.pixel_size) {
            px.copy_from_slice(pattern);
        }
    }

    /// Fill the in-tile rectangle `local` with `pattern`. `local` must lie
    /// within `0..size` on both axes.
    pub fn fill_rect(&mut self, local: &RectI, pattern: &[u8]) {
        debug_assert_eq!(pattern.len(), self.pixel_size);
        let ps = self.pixel_size;
        let x1 = local.x1 as usize * ps;
        let x2 = (local.x2 as usize + 1) * ps;
        for ly in local.y1..=local.y2 {
            let row = self.row_slice_mut(ly as u32);
            for px in row[x1..x2].chunks_exact_mut(ps) {
                px.copy_from_slice(pattern);
            }
        }
    }

    /// Tight in-tile bounds of pixels that differ from `pattern`, or `None`
    /// if the tile is uniform.
    pub fn content_bounds(&self, pattern: &[u8]) -> Option<RectI> {
        let ps = self.pixel_size;
        let mut bounds: Option<RectI> = None;
        for ly in 0..self.size {
            let row = self.row_slice(ly);
            let first = row.chunks_exact(ps).position(|px| px != pattern);
            let Some(first) = first else {
                continue;
            };
            let last = row.chunks_exact(ps).rposition(|px| px != pattern).unwrap_or(first);
            let y = ly as i32;
            match bounds.as_mut() {
                Some(b) => {
                    b.include_point(first as i32, y);
                    b.include_point(last as i32, y);
                }
                None => {
                    bounds = Some(RectI::new(first as i32, y, last as i32, y));
                }
            }
        }
        bounds
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tile_is_fully_allocated_and_filled() {
        let t = Tile::new(2, -1, 8, &[7, 9]).unwrap();
        assert_eq!(t.byte_len(), 8 * 8 * 2);
        assert_eq!(t.stride(), 16);
        assert_eq!(t.content_bounds(&[7, 9]), None);
        assert_eq!(t.pixel(7, 7), &[7, 9]);
    }

    #[test]
    fn test_zero_pixel_size_rejected() {
        assert!(Tile::new(0, 0, 8, &[]).is_err());
    }

    #[test]
    fn test_tile_rect_negative_cell() {
        let t = Tile::new(-1, -2, 64, &[0]).unwrap();
        assert_eq!(t.rect(), RectI::new(-64, -128, -1, -65));
    }

    #[test]
    fn test_tile_rect_last_cell() {
        let t = Tile::new(i32::MAX >> 6, i32::MIN >> 6, 64, &[0]).unwrap();
        assert_eq!(
            t.rect(),
            RectI::new(i32::MAX - 63, i32::MIN, i32::MAX, i32::MIN + 63)
        );
    }

    #[test]
    fn test_byte_offset() {
        assert_eq!(Tile::byte_offset(64, 4, 0, 0), 0);
        assert_eq!(Tile::byte_offset(64, 4, 1, 0), 4);
        assert_eq!(Tile::byte_offset(64, 4, 0, 1), 256);
        assert_eq!(Tile::byte_offset(64, 1, 63, 63), 4095);
    }

    #[test]
    fn test_pixel_write_read() {
        let mut t = Tile::new(0, 0, 4, &[0, 0, 0]).unwrap();
        t.pixel_mut(3, 2).copy_from_slice(&[1, 2, 3]);
        assert_eq!(t.pixel(3, 2), &[1, 2, 3]);
        assert_eq!(t.pixel(2, 2), &[0, 0, 0]);
        assert_eq!(&t.row_slice(2)[9..12], &[1, 2, 3]);
    }

    #[test]
    #[should_panic]
    fn test_checked_pixel_out_of_bounds_panics() {
        let t = Tile::new(0, 0, 4, &[0]).unwrap();
        let _ = t.pixel(4, 0);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut t = Tile::new(0, 0, 4, &[0]).unwrap();
        let c = t.clone();
        t.pixel_mut(1, 1)[0] = 255;
        assert_eq!(c.pixel(1, 1), &[0]);
        let moved = c.clone_at(5, 6).unwrap();
        assert_eq!(moved.col(), 5);
        assert_eq!(moved.row(), 6);
    }

    #[test]
    fn test_fill_rect_and_content_bounds() {
        let mut t = Tile::new(0, 0, 16, &[0]).unwrap();
        assert_eq!(t.content_bounds(&[0]), None);
        t.fill_rect(&RectI::new(6, 7, 8, 9), &[5]);
        assert_eq!(t.content_bounds(&[0]), Some(RectI::new(6, 7, 8, 9)));
        assert_eq!(t.pixel(5, 7), &[0]);
        assert_eq!(t.pixel(6, 7), &[5]);
    }

    #[test]
    fn test_multi_byte_pattern_alloc() {
        let buf = alloc_filled(10, &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(&*buf, &[1, 2, 3, 4, 5, 1, 2, 3, 4, 5]);
    }
}
