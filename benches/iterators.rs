//! Benchmarks for tile-aware iteration and materialization
//!
//! - Rect iterator, pixel by pixel vs span by span
//! - Const iteration over unallocated space
//! - Parallel fill vs sequential fill

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tiled_raster::{parallel, DeviceConfig, PaintDevice, PixelFormat};

const SIDE: i32 = 1024;

fn rgba_device() -> PaintDevice {
    PaintDevice::new(PixelFormat::rgba8(), &DeviceConfig::default()).unwrap()
}

fn bench_rect_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("rect_write");
    group.throughput(Throughput::Elements((SIDE * SIDE) as u64));

    group.bench_function("per_pixel", |b| {
        b.iter(|| {
            let mut dev = rgba_device();
            let mut it = dev.create_rect_iterator(-17, -17, SIDE, SIDE).unwrap();
            while !it.is_done() {
                it.raw_data_mut().copy_from_slice(&[1, 2, 3, 4]);
                it.advance().unwrap();
            }
            drop(it);
            black_box(dev.tile_count())
        })
    });

    group.bench_function("per_span", |b| {
        b.iter(|| {
            let mut dev = rgba_device();
            let mut it = dev.create_rect_iterator(-17, -17, SIDE, SIDE).unwrap();
            while !it.is_done() {
                let n = it.n_conseq_pixels();
                for px in it.raw_span_mut().chunks_exact_mut(4) {
                    px.copy_from_slice(&[1, 2, 3, 4]);
                }
                it.advance_by(n).unwrap();
            }
            drop(it);
            black_box(dev.tile_count())
        })
    });

    group.finish();
}

fn bench_const_read(c: &mut Criterion) {
    let dev = rgba_device();
    let mut group = c.benchmark_group("const_read_unallocated");
    group.throughput(Throughput::Elements((SIDE * SIDE) as u64));
    group.bench_function("rect", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            let mut it = dev.create_rect_const_iterator(0, 0, SIDE, SIDE).unwrap();
            while !it.is_done() {
                sum += it.raw_data()[0] as u64;
                it.advance().unwrap();
            }
            black_box(sum)
        })
    });
    group.finish();
}

fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill");
    for side in [256, 1024, 4096] {
        group.throughput(Throughput::Elements((side as u64) * (side as u64)));
        group.bench_with_input(BenchmarkId::new("sequential", side), &side, |b, &side| {
            b.iter(|| {
                let mut dev = rgba_device();
                dev.fill(0, 0, side, side, &[9, 9, 9, 9]).unwrap();
                black_box(dev.tile_count())
            })
        });
        group.bench_with_input(BenchmarkId::new("parallel", side), &side, |b, &side| {
            b.iter(|| {
                let mut dev = rgba_device();
                parallel::fill_rect(&mut dev, 0, 0, side, side, &[9, 9, 9, 9]).unwrap();
                black_box(dev.tile_count())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rect_write, bench_const_read, bench_fill);
criterion_main!(benches);
