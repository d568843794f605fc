//! Tile table: sparse mapping from tile-grid cells to tiles.
//!
//! Cells that hold no tile read as the shared default tile, whose every
//! pixel is the default pixel. Writes always materialize a real tile,
//! filled with the default pixel first. The table only shrinks through
//! explicit `clear`, `clear_rect`, `crop` or `remove`.
//!
//! Coordinates here are offset-free table coordinates; the paint device
//! applies its own offset before calling in.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::basics::{floor_mod, intersect_rectangles, RectI};
use crate::config::TileConfig;
use crate::error::{RasterError, Result};
use crate::tile::Tile;

fn grow_grid_extent(extent: &mut Option<RectI>, col: i32, row: i32) {
    match extent.as_mut() {
        Some(g) => g.include_point(col, row),
        None => *extent = Some(RectI::new(col, row, col, row)),
    }
}

/// Pack a grid cell into a single hash key.
#[inline]
fn pack_key(col: i32, row: i32) -> u64 {
    ((col as u32 as u64) << 32) | (row as u32 as u64)
}

// ============================================================================
// TileTable
// ============================================================================

/// Sparse tile storage with default-pixel semantics for absent cells.
#[derive(Debug, Clone)]
pub struct TileTable {
    tiles: HashMap<u64, Tile>,
    tile_size: u32,
    shift: u32,
    pixel_size: usize,
    default_tile: Arc<Tile>,
    /// Grid bounds of materialized tiles: (min_col, min_row, max_col, max_row).
    grid_extent: Option<RectI>,
}

impl TileTable {
    /// Create a table with its own default tile.
    pub fn new(config: TileConfig, default_pixel: &[u8]) -> Result<Self> {
        config.validate()?;
        let default_tile = Arc::new(Tile::new(0, 0, config.tile_size, default_pixel)?);
        Self::with_default_tile(default_tile)
    }

    /// Create a table around an existing (possibly shared) default tile.
    /// The tile geometry and pixel size are taken from it.
    pub fn with_default_tile(default_tile: Arc<Tile>) -> Result<Self> {
        let config = TileConfig::new(default_tile.size())?;
        Ok(Self {
            tiles: HashMap::new(),
            tile_size: config.tile_size,
            shift: config.shift(),
            pixel_size: default_tile.pixel_size(),
            default_tile,
            grid_extent: None,
        })
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn pixel_size(&self) -> usize {
        self.pixel_size
    }

    /// The default pixel pattern.
    pub fn default_pixel(&self) -> &[u8] {
        &self.default_tile.data()[..self.pixel_size]
    }

    /// The shared read-only default tile.
    pub fn default_tile(&self) -> &Arc<Tile> {
        &self.default_tile
    }

    /// Replace the default pixel. Already materialized tiles keep their
    /// content; absent cells read as the new value from now on.
    pub fn set_default_pixel(&mut self, pixel: &[u8]) -> Result<()> {
        if pixel.len() != self.pixel_size {
            return Err(RasterError::InvalidPixel {
                expected: self.pixel_size,
                actual: pixel.len(),
            });
        }
        self.default_tile = Arc::new(Tile::new(0, 0, self.tile_size, pixel)?);
        Ok(())
    }

    // ========================================================================
    // Coordinate mapping
    // ========================================================================

    /// Grid cell owning pixel (x, y). Arithmetic shift on `i32` rounds
    /// toward negative infinity, so `-1` maps to cell `-1`.
    #[inline]
    pub fn tile_coord_for(&self, x: i32, y: i32) -> (i32, i32) {
        (x >> self.shift, y >> self.shift)
    }

    /// In-tile coordinate of pixel (x, y).
    #[inline]
    pub fn local_coord_for(&self, x: i32, y: i32) -> (i32, i32) {
        let mask = self.tile_size as i32 - 1;
        (x & mask, y & mask)
    }

    /// Pixel-space rectangle of grid cell (col, row).
    pub fn cell_rect(&self, col: i32, row: i32) -> RectI {
        let s = self.tile_size as i32;
        RectI::new(col * s, row * s, col * s + (s - 1), row * s + (s - 1))
    }

    // ========================================================================
    // Tile lookup
    // ========================================================================

    pub fn contains(&self, col: i32, row: i32) -> bool {
        self.tiles.contains_key(&pack_key(col, row))
    }

    /// The materialized tile at (col, row), if any.
    pub fn get(&self, col: i32, row: i32) -> Option<&Tile> {
        self.tiles.get(&pack_key(col, row))
    }

    /// Read-mode lookup: the tile at (col, row) or the shared default tile.
    /// Never allocates.
    #[inline]
    pub fn tile_for(&self, col: i32, row: i32) -> &Tile {
        self.tiles
            .get(&pack_key(col, row))
            .unwrap_or(self.default_tile.as_ref())
    }

    /// Write-mode lookup: materializes a default-filled tile on first touch.
    pub fn tile_for_write(&mut self, col: i32, row: i32) -> Result<&mut Tile> {
        match self.tiles.entry(pack_key(col, row)) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(v) => {
                let tile = self.default_tile.clone_at(col, row)?;
                log::trace!("materialized tile ({}, {})", col, row);
                grow_grid_extent(&mut self.grid_extent, col, row);
                Ok(v.insert(tile))
            }
        }
    }

    /// Read-mode base pointer for the cursor layer.
    #[inline]
    pub(crate) fn read_ptr(&self, col: i32, row: i32) -> NonNull<u8> {
        self.tile_for(col, row).base_ptr()
    }

    /// Write-mode base pointer for the cursor layer.
    #[inline]
    pub(crate) fn write_ptr(&mut self, col: i32, row: i32) -> Result<NonNull<u8>> {
        Ok(self.tile_for_write(col, row)?.base_ptr_mut())
    }

    /// Read one pixel.
    pub fn pixel(&self, x: i32, y: i32) -> &[u8] {
        let (col, row) = self.tile_coord_for(x, y);
        let (lx, ly) = self.local_coord_for(x, y);
        self.tile_for(col, row).pixel(lx, ly)
    }

    /// Write one pixel, materializing its tile if needed.
    pub fn set_pixel(&mut self, x: i32, y: i32, value: &[u8]) -> Result<()> {
        if value.len() != self.pixel_size {
            return Err(RasterError::InvalidPixel {
                expected: self.pixel_size,
                actual: value.len(),
            });
        }
        let (col, row) = self.tile_coord_for(x, y);
        let (lx, ly) = self.local_coord_for(x, y);
        self.tile_for_write(col, row)?
            .pixel_mut(lx, ly)
            .copy_from_slice(value);
        Ok(())
    }

    // ========================================================================
    // Iteration over materialized tiles
    // ========================================================================

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Grid cells overlapped by the pixel rectangle `rect`.
    pub fn cells_in(&self, rect: &RectI) -> impl Iterator<Item = (i32, i32)> {
        let (c1, r1) = self.tile_coord_for(rect.x1, rect.y1);
        let (c2, r2) = self.tile_coord_for(rect.x2, rect.y2);
        (r1..=r2).flat_map(move |row| (c1..=c2).map(move |col| (col, row)))
    }

    /// Make sure every cell overlapped by `rect` holds a real tile.
    pub fn materialize(&mut self, rect: &RectI) -> Result<()> {
        let cells: Vec<(i32, i32)> = self.cells_in(rect).collect();
        for (col, row) in cells {
            self.tile_for_write(col, row)?;
        }
        Ok(())
    }

    /// Mutable references to the materialized tiles overlapping `rect`.
    /// Each tile appears once, so the references are disjoint.
    pub fn tiles_overlapping_mut(&mut self, rect: &RectI) -> Vec<&mut Tile> {
        let rect = *rect;
        self.tiles
            .values_mut()
            .filter(|t| t.rect().overlaps(&rect))
            .collect()
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Bytes held by materialized tiles (the shared default tile excluded).
    pub fn memory_usage(&self) -> usize {
        self.tiles.values().map(Tile::byte_len).sum()
    }

    /// Union of materialized tiles' pixel rectangles.
    pub fn extent(&self) -> Option<RectI> {
        self.grid_extent.map(|g| {
            let s = self.tile_size as i32;
            RectI::new(g.x1 * s, g.y1 * s, g.x2 * s + (s - 1), g.y2 * s + (s - 1))
        })
    }

    fn recompute_grid_extent(&mut self) {
        self.grid_extent = None;
        for t in self.tiles.values() {
            grow_grid_extent(&mut self.grid_extent, t.col(), t.row());
        }
    }

    // ========================================================================
    // Explicit shrink operations
    // ========================================================================

    /// Drop every tile. The default tile is untouched.
    pub fn clear(&mut self) {
        log::debug!(
            "clearing tile table: releasing {} tiles ({} bytes)",
            self.tiles.len(),
            self.memory_usage()
        );
        self.tiles.clear();
        self.grid_extent = None;
    }

    /// Drop the tile at (col, row). Returns `true` if one was present.
    pub fn remove(&mut self, col: i32, row: i32) -> bool {
        let removed = self.tiles.remove(&pack_key(col, row)).is_some();
        if removed {
            self.recompute_grid_extent();
        }
        removed
    }

    /// Fill `rect` with `pixel`. When `pixel` is the default pixel, fully
    /// covered tiles are released and absent cells are left absent.
    pub fn fill_rect(&mut self, rect: &RectI, pixel: &[u8]) -> Result<()> {
        if pixel.len() != self.pixel_size {
            return Err(RasterError::InvalidPixel {
                expected: self.pixel_size,
                actual: pixel.len(),
            });
        }
        let is_default = pixel == self.default_pixel();
        let cells: Vec<(i32, i32)> = self.cells_in(rect).collect();
        let mut released = false;
        for (col, row) in cells {
            let cell = self.cell_rect(col, row);
            if is_default {
                if !self.contains(col, row) {
                    continue;
                }
                if rect.contains(&cell) {
                    self.tiles.remove(&pack_key(col, row));
                    released = true;
                    continue;
                }
            }
            let inside = intersect_rectangles(rect, &cell);
            let local = RectI::new(
                inside.x1 - cell.x1,
                inside.y1 - cell.y1,
                inside.x2 - cell.x1,
                inside.y2 - cell.y1,
            );
            if rect.contains(&cell) {
                self.tile_for_write(col, row)?.fill(pixel);
            } else {
                self.tile_for_write(col, row)?.fill_rect(&local, pixel);
            }
        }
        if released {
            self.recompute_grid_extent();
        }
        Ok(())
    }

    /// Release tiles outside `rect` and reset the outside part of boundary
    /// tiles to the default pixel.
    pub fn crop(&mut self, rect: &RectI) -> Result<()> {
        let before = self.tiles.len();
        self.tiles.retain(|_, t| t.rect().overlaps(rect));
        let default = self.default_pixel().to_vec();
        for tile in self.tiles.values_mut() {
            let tr = tile.rect();
            if rect.contains(&tr) {
                continue;
            }
            let inside = intersect_rectangles(rect, &tr);
            // Reset the bands above, below, left and right of `inside`. A
            // band exists only when `inside` stops short of the tile edge,
            // so the +1/-1 below never leaves the i32 range.
            let mut bands = Vec::with_capacity(4);
            if inside.y1 > tr.y1 {
                bands.push(RectI::new(tr.x1, tr.y1, tr.x2, inside.y1 - 1));
            }
            if inside.y2 < tr.y2 {
                bands.push(RectI::new(tr.x1, inside.y2 + 1, tr.x2, tr.y2));
            }
            if inside.x1 > tr.x1 {
                bands.push(RectI::new(tr.x1, inside.y1, inside.x1 - 1, inside.y2));
            }
            if inside.x2 < tr.x2 {
                bands.push(RectI::new(inside.x2 + 1, inside.y1, tr.x2, inside.y2));
            }
            for band in &bands {
                let local = RectI::new(
                    band.x1 - tr.x1,
                    band.y1 - tr.y1,
                    band.x2 - tr.x1,
                    band.y2 - tr.y1,
                );
                tile.fill_rect(&local, &default);
            }
        }
        self.recompute_grid_extent();
        log::debug!(
            "cropped tile table to {:?}: {} -> {} tiles",
            rect,
            before,
            self.tiles.len()
        );
        Ok(())
    }

    /// Columns from `x` to the right edge of its tile. Every row in
    /// `min_y..=max_y` has at least this many contiguous bytes-in-tile
    /// starting at `x`.
    pub fn num_contiguous_columns(&self, x: i32, _min_y: i32, _max_y: i32) -> i32 {
        self.tile_size as i32 - floor_mod(x, self.tile_size as i32)
    }

    /// Rows from `y` to the bottom edge of its tile.
    pub fn num_contiguous_rows(&self, y: i32, _min_x: i32, _max_x: i32) -> i32 {
        self.tile_size as i32 - floor_mod(y, self.tile_size as i32)
    }

    /// Byte distance between vertically adjacent pixels at (x, y).
    pub fn row_stride(&self, _x: i32, _y: i32) -> usize {
        self.tile_size as usize * self.pixel_size
    }

    /// Deep copy of every materialized tile. The default tile stays shared.
    pub fn try_clone(&self) -> Result<Self> {
        let mut tiles = HashMap::with_capacity(self.tiles.len());
        for (key, tile) in &self.tiles {
            tiles.insert(*key, tile.try_clone()?);
        }
        Ok(Self {
            tiles,
            tile_size: self.tile_size,
            shift: self.shift,
            pixel_size: self.pixel_size,
            default_tile: Arc::clone(&self.default_tile),
            grid_extent: self.grid_extent,
        })
    }

    /// Deep copy of the tiles overlapping `rect` only. Cells outside read
    /// as the (shared) default tile in the copy.
    pub fn try_clone_region(&self, rect: &RectI) -> Result<Self> {
        let mut copy = Self::with_default_tile(Arc::clone(&self.default_tile))?;
        for (key, tile) in &self.tiles {
            if tile.rect().overlaps(rect) {
                copy.tiles.insert(*key, tile.try_clone()?);
                grow_grid_extent(&mut copy.grid_extent, tile.col(), tile.row());
            }
        }
        Ok(copy)
    }
}

// ============================================================================
// Tests
// ============================================================================
