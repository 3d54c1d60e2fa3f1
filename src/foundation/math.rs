pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Map any finite angle in degrees onto `[0, 360)`.
pub(crate) fn normalize_degrees(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if d >= 360.0 { 0.0 } else { d }
}

pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + ((b - a) * t)
}

/// Quantize an opacity in `[0, 1]` to the 0..=255 fixed-point scale used by compositing.
pub(crate) fn opacity_to_u8(opacity: f32) -> u16 {
    ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
