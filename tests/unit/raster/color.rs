use super::*;

#[test]
fn zero_shift_is_identity() {
    let src = PixelBuffer::solid(3, 2, [12, 200, 99, 180]).unwrap();
    assert_eq!(adjust_hsl(&src, 0, 0).unwrap(), src);
}

#[test]
fn out_of_range_percentages_are_rejected() {
    let src = PixelBuffer::solid(1, 1, [0, 0, 0, 255]).unwrap();
    assert!(adjust_hsl(&src, 101, 0).is_err());
    assert!(adjust_hsl(&src, 0, -101).is_err());
}

#[test]
fn brightness_raises_gray_uniformly() {
    let src = PixelBuffer::solid(1, 1, [100, 100, 100, 255]).unwrap();
    let out = adjust_hsl(&src, 10, 0).unwrap();
    // 127 * 10 / 100 truncates to 12
    assert_eq!(out.pixel(0, 0), [112, 112, 112, 255]);
}

#[test]
fn desaturate_fully_yields_gray_and_keeps_alpha() {
    let src = PixelBuffer::solid(1, 1, [255, 0, 0, 255]).unwrap();
    let out = adjust_hsl(&src, 0, -100).unwrap();
    let px = out.pixel(0, 0);
    assert_eq!(px[0], px[1]);
    assert_eq!(px[1], px[2]);
    assert_eq!(px[3], 255);

    let clear = PixelBuffer::new_transparent(2, 2).unwrap();
    assert_eq!(adjust_hsl(&clear, 50, 50).unwrap(), clear);
}

#[test]
fn hsl_roundtrip_primary_colors() {
    for (r, g, b) in [(255.0, 0.0, 0.0), (0.0, 255.0, 0.0), (30.0, 60.0, 200.0)] {
        let (h, s, l) = rgb_to_hsl(r, g, b);
        let (r2, g2, b2) = hsl_to_rgb(h, s, l);
        assert!((r - r2).abs() < 1e-6);
        assert!((g - g2).abs() < 1e-6);
        assert!((b - b2).abs() < 1e-6);
    }
}
