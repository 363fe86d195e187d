use super::*;
use crate::foundation::core::{Affine, Quad};
use crate::foundation::error::MockupError;
use crate::transform::homography::{solve, solve_from_size};

fn white(w: u32, h: u32) -> PixelBuffer {
    PixelBuffer::solid(w, h, [255, 255, 255, 255]).unwrap()
}

#[test]
fn zero_canvas_is_invalid_argument() {
    let src = white(4, 4);
    let err = warp(&src, &Transform3x3::IDENTITY, 0, 10, SampleFilter::Bilinear).unwrap_err();
    assert!(matches!(err, MockupError::InvalidArgument(_)));
}

#[test]
fn identity_warp_reproduces_source() {
    let mut data = Vec::new();
    for i in 0..16u8 {
        data.extend_from_slice(&[i * 10, 255 - i * 10, i, 255]);
    }
    let src = PixelBuffer::from_premul_rgba8(4, 4, data).unwrap();
    for filter in [
        SampleFilter::Nearest,
        SampleFilter::Bilinear,
        SampleFilter::BilinearMipmap,
    ] {
        let out = warp(&src, &Transform3x3::IDENTITY, 4, 4, filter).unwrap();
        assert_eq!(out, src, "{filter:?}");
    }
}

#[test]
fn pixels_outside_the_mapped_quad_stay_transparent() {
    let src = white(10, 10);
    let t = Transform3x3::from_affine(Affine::translate((5.0, 5.0)));
    let out = warp(&src, &t, 20, 20, SampleFilter::Bilinear).unwrap();
    assert_eq!(out.pixel(4, 4), [0, 0, 0, 0]);
    assert_eq!(out.pixel(5, 5), [255, 255, 255, 255]);
    assert_eq!(out.pixel(14, 14), [255, 255, 255, 255]);
    assert_eq!(out.pixel(15, 15), [0, 0, 0, 0]);
}

#[test]
fn vertices_off_canvas_are_clipped() {
    let src = white(10, 10);
    let t = Transform3x3::from_affine(Affine::translate((-5.0, -5.0)) * Affine::scale(3.0));
    let out = warp(&src, &t, 8, 8, SampleFilter::Nearest).unwrap();
    assert!(out.data().chunks_exact(4).all(|px| px == [255, 255, 255, 255]));
}

#[test]
fn antialias_gives_partial_coverage_on_half_pixel_edges() {
    let src = white(10, 10);
    let t = Transform3x3::from_affine(Affine::translate((0.5, 0.0)));
    let aa = warp_with(
        &src,
        &t,
        12,
        10,
        WarpOptions {
            filter: SampleFilter::Bilinear,
            antialias: true,
            parallel: false,
        },
    )
    .unwrap();
    assert_eq!(aa.pixel(0, 3)[3], 128);
    assert_eq!(aa.pixel(5, 3), [255, 255, 255, 255]);

    let hard = warp_with(
        &src,
        &t,
        12,
        10,
        WarpOptions {
            filter: SampleFilter::Bilinear,
            antialias: false,
            parallel: false,
        },
    )
    .unwrap();
    assert!(matches!(hard.pixel(0, 3)[3], 0 | 255));
}

#[test]
fn singular_transform_short_circuits_to_transparent() {
    let src = white(4, 4);
    let flat = Transform3x3 {
        m: [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
    };
    let out = warp_reporting(
        &src,
        &flat,
        Canvas::new(6, 6).unwrap(),
        WarpOptions::default(),
    )
    .unwrap();
    assert!(out.singular);
    assert!(out.buffer.data().iter().all(|b| *b == 0));
}

#[test]
fn parallel_and_sequential_rows_match() {
    let mut data = Vec::new();
    for i in 0..(32u32 * 24) {
        let v = (i * 7 % 256) as u8;
        data.extend_from_slice(&[v, v / 2, 255 - v, 255]);
    }
    let src = PixelBuffer::from_premul_rgba8(32, 24, data).unwrap();
    let dst = Quad::new(
        Point::new(3.0, 10.0),
        Point::new(60.0, 0.0),
        Point::new(0.0, 40.0),
        Point::new(64.0, 48.0),
    );
    let t = solve_from_size(32.0, 24.0, &dst).unwrap();
    let opts = WarpOptions::default();
    let par = warp_with(&src, &t, 70, 50, opts).unwrap();
    let seq = warp_with(
        &src,
        &t,
        70,
        50,
        WarpOptions {
            parallel: false,
            ..opts
        },
    )
    .unwrap();
    assert_eq!(par.fingerprint(), seq.fingerprint());
    let again = warp_with(&src, &t, 70, 50, opts).unwrap();
    assert_eq!(par, again);
}

#[test]
fn mipmap_minification_averages_checkerboard() {
    let mut data = Vec::new();
    for y in 0..64u32 {
        for x in 0..64u32 {
            let v = if (x + y) % 2 == 0 { 255 } else { 0 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    let src = PixelBuffer::from_premul_rgba8(64, 64, data).unwrap();
    let t = solve(&Quad::from_size(64.0, 64.0), &Quad::from_size(8.0, 8.0)).unwrap();
    let out = warp(&src, &t, 8, 8, SampleFilter::BilinearMipmap).unwrap();
    let px = out.pixel(4, 4);
    assert_eq!(px[3], 255);
    assert!((100..=155).contains(&px[0]), "{px:?}");
}

#[test]
fn mip_chain_halves_down_to_one_pixel() {
    let levels = mip_chain(&white(5, 3));
    let dims: Vec<_> = levels.iter().map(|l| (l.width(), l.height())).collect();
    assert_eq!(dims, vec![(3, 2), (2, 1), (1, 1)]);
}
