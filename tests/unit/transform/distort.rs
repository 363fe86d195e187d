use super::*;

fn red(w: u32, h: u32) -> PixelBuffer {
    PixelBuffer::solid(w, h, [255, 0, 0, 255]).unwrap()
}

#[test]
fn column_heights_taper_from_squeezed_to_full() {
    let heights = column_heights(200, 100, 100, 200).unwrap();
    assert_eq!(heights.len(), 100);
    assert_eq!(heights[0], 100.0);
    assert_eq!(heights[99], 200.0);
    assert!(heights.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn single_column_is_full_height() {
    assert_eq!(column_heights(3, 1, 1, 40).unwrap(), vec![40.0]);
}

#[test]
fn minor_larger_than_major_clamps_to_full_height() {
    let heights = column_heights(100, 200, 10, 50).unwrap();
    assert!(heights.iter().all(|h| *h == 50.0));
}

#[test]
fn zero_sides_or_dimensions_are_rejected() {
    let src = red(4, 4);
    for (major, minor, w, h) in [(0, 1, 4, 4), (1, 0, 4, 4), (2, 1, 0, 4), (2, 1, 4, 0)] {
        let err = distort(&src, major, minor, w, h).unwrap_err();
        assert!(matches!(err, MockupError::InvalidArgument(_)), "{err}");
    }
}

#[test]
fn solid_red_distorts_to_red_columns_of_growing_height() {
    let out = distort(&red(64, 64), 200, 100, 100, 200).unwrap();
    assert_eq!((out.width(), out.height()), (100, 200));

    let heights = column_heights(200, 100, 100, 200).unwrap();
    for (x, col_height) in heights.iter().enumerate() {
        let filled = col_height.floor() as i64;
        for y in 0..200i64 {
            let px = out.pixel(x as i64, y);
            if y < filled {
                assert_eq!(px, [255, 0, 0, 255], "({x},{y})");
            } else {
                assert_eq!(px, [0, 0, 0, 0], "({x},{y})");
            }
        }
    }
}

#[test]
fn distort_samples_rows_with_nearest_stride() {
    // Rows 0..4 carry their index in the red channel.
    let mut data = Vec::new();
    for y in 0..4u8 {
        data.extend_from_slice(&[y * 60, 0, 0, 255]);
        data.extend_from_slice(&[y * 60, 0, 0, 255]);
    }
    let src = PixelBuffer::from_premul_rgba8(2, 4, data).unwrap();
    let out = distort(&src, 2, 1, 2, 4).unwrap();

    // Column 0 has height 2: step 2, so rows 0 and 2.
    assert_eq!(out.pixel(0, 0)[0], 0);
    assert_eq!(out.pixel(0, 1)[0], 120);
    assert_eq!(out.pixel(0, 2), [0, 0, 0, 0]);
    // Column 1 is untouched.
    for y in 0..4 {
        assert_eq!(out.pixel(1, y)[0], y as u8 * 60);
    }
}

#[test]
fn inclined_distortion_sizes_canvas_with_headroom() {
    let src = red(30, 20);
    let out = distort_inclined(&src, 2, 1, 40, 60, 10).unwrap();
    // max(60, 60 / 2 + 10 + 100)
    assert_eq!((out.width(), out.height()), (40, 140));
    assert_eq!(out.pixel(1, 25), [255, 0, 0, 255]);
    assert_eq!(out.pixel(1, 2), [0, 0, 0, 0]);
    assert_eq!(out.pixel(38, 58), [255, 0, 0, 255]);
    assert_eq!(out.pixel(20, 130), [0, 0, 0, 0]);
}
