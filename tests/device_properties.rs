//! Behavioural tests for PaintDevice through its public API.

use pretty_assertions::assert_eq;
use tiled_raster::{DeviceConfig, PaintDevice, PixelFormat, RasterError, RectI, Region, Selection};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn gray_device() -> PaintDevice {
    init_logger();
    PaintDevice::new(PixelFormat::gray8(), &DeviceConfig::default()).unwrap()
}

fn write_rect(dev: &mut PaintDevice, x: i32, y: i32, w: i32, h: i32) {
    let mut it = dev.create_rect_iterator(x, y, w, h).unwrap();
    while !it.is_done() {
        let v = (it.x().wrapping_mul(31) ^ it.y().wrapping_mul(17)) as u8 | 1;
        it.raw_data_mut()[0] = v;
        it.advance().unwrap();
    }
}

fn read_all(dev: &PaintDevice, r: RectI) -> Vec<u8> {
    let mut buf = vec![0u8; r.area() as usize * dev.pixel_size()];
    dev.read_bytes(&mut buf, r.x1, r.y1, r.width(), r.height()).unwrap();
    buf
}

// ============================================================================
// Default pixel and round trips
// ============================================================================

#[test]
fn test_never_written_pixels_read_default() {
    init_logger();
    let cfg = DeviceConfig::default().with_default_pixel(&[1, 2, 3, 4]);
    let mut dev = PaintDevice::new(PixelFormat::rgba8(), &cfg).unwrap();
    dev.set_pixel(0, 0, &[9, 9, 9, 9]).unwrap();
    for (x, y) in [(1, 0), (-1, -1), (63, 63), (64, 0), (-100_000, 250_000), (i32::MIN, i32::MAX)] {
        assert_eq!(dev.pixel(x, y), &[1, 2, 3, 4], "pixel ({x}, {y})");
    }
}

#[test]
fn test_write_then_read_round_trip() {
    let mut dev = gray_device();
    let coords = [(0, 0), (-1, 0), (0, -1), (-64, -64), (-65, 63), (127, -129), (5000, -5000)];
    for (i, &(x, y)) in coords.iter().enumerate() {
        dev.set_pixel(x, y, &[i as u8 + 10]).unwrap();
    }
    for (i, &(x, y)) in coords.iter().enumerate() {
        assert_eq!(dev.pixel(x, y), &[i as u8 + 10]);
    }
}

#[test]
fn test_extent_contains_every_write() {
    let mut dev = gray_device();
    let coords = [(3, 3), (-200, 17), (90, -300), (64, 64), (-1, -1)];
    for &(x, y) in &coords {
        dev.set_pixel(x, y, &[1]).unwrap();
        let e = dev.extent().unwrap();
        assert!(e.hit_test(x, y));
    }
    let e = dev.extent().unwrap();
    for &(x, y) in &coords {
        assert!(e.hit_test(x, y), "extent {e:?} misses ({x}, {y})");
    }
}

#[test]
fn test_materialization_is_idempotent() {
    let mut dev = gray_device();
    dev.set_pixel(7, 7, &[1]).unwrap();
    dev.set_pixel(7, 7, &[2]).unwrap();
    dev.set_pixel(8, 7, &[3]).unwrap();
    assert_eq!(dev.tile_count(), 1);
    assert_eq!(dev.memory_usage(), 64 * 64);
}

#[test]
fn test_reads_never_allocate() {
    let dev = gray_device();
    let mut it = dev.create_rect_const_iterator(-100, -100, 300, 300).unwrap();
    while !it.is_done() {
        assert_eq!(it.raw_data(), &[0]);
        it.advance().unwrap();
    }
    let _ = dev.pixel(12345, -54321);
    assert_eq!(dev.tile_count(), 0);
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_scenario_single_pixel() {
    let mut dev = gray_device();
    dev.set_pixel(100, 5, &[0xFF]).unwrap();
    assert_eq!(dev.pixel(100, 5), &[0xFF]);
    assert_eq!(dev.pixel(99, 5), &[0x00]);
    assert!(dev.extent().unwrap().hit_test(100, 5));
}

#[test]
fn test_scenario_far_apart_writes() {
    let mut dev = gray_device();
    dev.set_pixel(-10, -10, &[1]).unwrap();
    dev.set_pixel(1000, 1000, &[1]).unwrap();
    assert_eq!(dev.tile_count(), 2);
    let e = dev.extent().unwrap();
    assert!(e.contains(&RectI::new(-10, -10, 1000, 1000)));
    assert_eq!(dev.exact_bounds(), Some(RectI::new(-10, -10, 1000, 1000)));
}

#[test]
fn test_scenario_disjoint_writes_are_order_independent() {
    let (a, b) = ((-30, -10, 50, 20), (20, -10, 80, 20));
    let union = RectI::new(-30, -10, 99, 9);

    let mut first = gray_device();
    write_rect(&mut first, a.0, a.1, a.2, a.3);
    write_rect(&mut first, b.0, b.1, b.2, b.3);

    let mut second = gray_device();
    write_rect(&mut second, b.0, b.1, b.2, b.3);
    write_rect(&mut second, a.0, a.1, a.2, a.3);

    let mut whole = gray_device();
    write_rect(&mut whole, union.x1, union.y1, union.width(), union.height());

    let window = RectI::new(-100, -100, 200, 100);
    assert_eq!(read_all(&first, window), read_all(&whole, window));
    assert_eq!(read_all(&second, window), read_all(&whole, window));
}

#[test]
fn test_scenario_exact_bounds_3x3() {
    let mut dev = gray_device();
    for y in 30..33 {
        for x in 30..33 {
            dev.set_pixel(x, y, &[200]).unwrap();
        }
    }
    assert_eq!(dev.extent(), Some(RectI::new(0, 0, 63, 63)));
    assert_eq!(dev.exact_bounds(), Some(RectI::new(30, 30, 32, 32)));
}

// ============================================================================
// Iteration
// ============================================================================

#[test]
fn test_rect_iterator_row_major_exactly_once() {
    let mut dev = gray_device();
    let mut seen = Vec::new();
    {
        let mut it = dev.create_rect_iterator(-70, 60, 140, 9).unwrap();
        while !it.is_done() {
            seen.push((it.x(), it.y()));
            it.raw_data_mut()[0] += 1;
            it.advance().unwrap();
        }
    }
    let expected: Vec<(i32, i32)> = (60..69)
        .flat_map(|y| (-70..70).map(move |x| (x, y)))
        .collect();
    assert_eq!(seen, expected);
    // Every pixel incremented exactly once.
    assert!(read_all(&dev, RectI::new(-70, 60, 69, 68)).iter().all(|&b| b == 1));
}

#[test]
fn test_invalid_regions_fail_before_touching_tiles() {
    let mut dev = gray_device();
    for (w, h) in [(0, 5), (5, 0), (-3, 2)] {
        assert!(matches!(
            dev.create_rect_iterator(0, 0, w, h),
            Err(RasterError::InvalidRegion { .. })
        ));
    }
    assert!(dev.create_hline_iterator(0, 0, 0).is_err());
    assert!(dev.create_vline_iterator(0, 0, -1).is_err());
    assert!(dev.create_snapshot_rect_iterator(0, 0, 0, 1).is_err());
    assert_eq!(dev.tile_count(), 0);
}

#[test]
fn test_iterators_follow_device_offset() {
    let mut dev = gray_device();
    dev.move_to(-500, 250);
    {
        let mut acc = dev.create_random_accessor(0, 0).unwrap();
        acc.raw_data_mut()[0] = 4;
        acc.move_to(-500, 250).unwrap();
        acc.raw_data_mut()[0] = 5;
    }
    assert_eq!(dev.pixel(0, 0), &[4]);
    assert_eq!(dev.pixel(-500, 250), &[5]);
    let it = dev.create_hline_const_iterator(-500, 250, 3).unwrap();
    assert_eq!((it.x(), it.y()), (-500, 250));
    assert_eq!(it.raw_data(), &[5]);
}

#[test]
fn test_region_iterator_with_selection() {
    let mut dev = gray_device();
    let mut sel = Selection::new().unwrap();
    sel.select_rect(10, 10, 5, 5).unwrap();
    sel.select_rect(200, 200, 1, 1).unwrap();
    let region =
        Region::from_rects(&[RectI::new(0, 0, 12, 12), RectI::new(190, 190, 210, 210)]).unwrap();
    let mut visited = Vec::new();
    {
        let mut it = dev.create_region_iterator(&region, Some(&sel)).unwrap();
        while !it.is_done() {
            visited.push((it.x(), it.y()));
            it.raw_data_mut()[0] = 9;
            it.advance().unwrap();
        }
    }
    assert_eq!(
        visited,
        vec![
            (10, 10),
            (11, 10),
            (12, 10),
            (10, 11),
            (11, 11),
            (12, 11),
            (10, 12),
            (11, 12),
            (12, 12),
            (200, 200)
        ]
    );
    // Only the cells that hold visited pixels were materialized.
    assert_eq!(dev.tile_count(), 2);
    assert_eq!(dev.exact_bounds(), Some(RectI::new(10, 10, 200, 200)));
}

#[test]
fn test_snapshot_iterator_reads_pre_write_values() {
    let mut dev = gray_device();
    dev.fill(0, 0, 10, 1, &[10]).unwrap();
    {
        let mut it = dev.create_snapshot_rect_iterator(0, 0, 10, 1).unwrap();
        while !it.is_done() {
            assert_eq!(it.old_raw_data(), &[10]);
            let old = it.old_raw_data()[0];
            it.raw_data_mut()[0] = old + 1;
            it.advance().unwrap();
        }
    }
    assert!(read_all(&dev, RectI::new(0, 0, 9, 0)).iter().all(|&b| b == 11));
}

// ============================================================================
// Copies
// ============================================================================

#[test]
fn test_clone_is_isolated_from_original() {
    let mut dev = gray_device();
    write_rect(&mut dev, -5, -5, 100, 100);
    let snapshot = dev.clone();
    let before = read_all(&snapshot, RectI::new(-5, -5, 94, 94));

    dev.fill(-5, -5, 100, 100, &[0]).unwrap();
    dev.set_pixel(300, 300, &[1]).unwrap();

    assert_eq!(read_all(&snapshot, RectI::new(-5, -5, 94, 94)), before);
    assert_eq!(snapshot.pixel(300, 300), &[0]);
}

#[test]
fn test_convert_from_rejects_mismatch_without_mutation() {
    let mut dst = gray_device();
    dst.set_pixel(1, 1, &[3]).unwrap();
    let src = PaintDevice::new(PixelFormat::rgba16(), &DeviceConfig::default()).unwrap();
    let err = dst.convert_from(&src).unwrap_err();
    assert_eq!(err, RasterError::FormatMismatch { expected: 1, actual: 8 });
    assert_eq!(dst.pixel(1, 1), &[3]);
    assert_eq!(dst.tile_count(), 1);
}
