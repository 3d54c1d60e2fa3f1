use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [255, 255, 255, 0];
    assert_eq!(over(dst, src, 1.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_dst_transparent_returns_scaled_src() {
    let dst = [0, 0, 0, 0];
    let src = [100, 110, 120, 200];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn half_opacity_blue_over_red_averages_channels() {
    let red = [255, 0, 0, 255];
    let blue = [0, 0, 255, 255];
    let out = over(red, blue, 0.5);
    assert!((i32::from(out[0]) - 127).abs() <= 1);
    assert!((i32::from(out[2]) - 128).abs() <= 1);
    assert_eq!(out[3], 255);
}

#[test]
fn decreasing_opacity_moves_monotonically_towards_dst() {
    let red = [255, 0, 0, 255];
    let blue = [0, 0, 255, 255];
    let mut last_blue = 256;
    for opacity in [1.0, 0.75, 0.5, 0.25, 0.0] {
        let out = over(red, blue, opacity);
        assert!(i32::from(out[2]) < last_blue);
        last_blue = i32::from(out[2]);
    }
    assert_eq!(over(red, blue, 0.0), red);
    assert_eq!(over(red, blue, 1.0), blue);
}

#[test]
fn canvas_buffer_unpremultiplies_on_export() {
    let mut canvas = CanvasBuffer::new(2, 1, [0, 0, 0, 0]).unwrap();
    canvas.blend(0, 0, [64, 0, 0, 128], 1.0);
    let img = canvas.into_straight_image();
    assert_eq!(img.get_pixel(0, 0).0, [128, 0, 0, 128]);
    assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0, 0]);
}

#[test]
fn flatten_uses_background_under_transparency() {
    let mut img = image::RgbaImage::new(2, 1);
    img.put_pixel(0, 0, image::Rgba([10, 20, 30, 255]));
    let flat = flatten_onto(&img, [1, 2, 3]);
    assert_eq!(flat.get_pixel(0, 0).0, [10, 20, 30]);
    assert_eq!(flat.get_pixel(1, 0).0, [1, 2, 3]);
}
