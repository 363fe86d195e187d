use super::*;

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [255, 255, 255, 0];
    assert_eq!(over(dst, src), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src), src);
}

#[test]
fn over_dst_transparent_returns_src() {
    let dst = [0, 0, 0, 0];
    let src = [100, 110, 120, 200];
    assert_eq!(over(dst, src), src);
}

#[test]
fn over_half_alpha_blends() {
    let dst = [0, 0, 255, 255];
    let src = [128, 0, 0, 128];
    let out = over(dst, src);
    assert_eq!(out[3], 255);
    assert_eq!(out[0], 128);
    assert_eq!(out[2], mul_div255_u8(255, 127));
}

#[test]
fn draw_at_clips_negative_and_overflowing_offsets() {
    let mut dst = PixelBuffer::new_transparent(4, 4).unwrap();
    let src = PixelBuffer::solid(3, 3, [0, 255, 0, 255]).unwrap();

    assert_eq!(draw_at(&mut dst, &src, -2, -2), 1);
    assert_eq!(dst.pixel(0, 0), [0, 255, 0, 255]);
    assert_eq!(dst.pixel(1, 0), [0, 0, 0, 0]);

    assert_eq!(draw_at(&mut dst, &src, 3, 3), 1);
    assert_eq!(dst.pixel(3, 3), [0, 255, 0, 255]);

    assert_eq!(draw_at(&mut dst, &src, 10, 0), 0);
    assert_eq!(draw_at(&mut dst, &src, 0, -3), 0);
}

#[test]
fn later_draw_wins_on_overlap() {
    let mut dst = PixelBuffer::new_transparent(2, 2).unwrap();
    let a = PixelBuffer::solid(2, 2, [255, 0, 0, 255]).unwrap();
    let b = PixelBuffer::solid(1, 1, [0, 0, 255, 255]).unwrap();
    draw_at(&mut dst, &a, 0, 0);
    draw_at(&mut dst, &b, 1, 1);
    assert_eq!(dst.pixel(1, 1), [0, 0, 255, 255]);
    assert_eq!(dst.pixel(0, 0), [255, 0, 0, 255]);
}
