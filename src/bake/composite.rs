use crate::foundation::{
    core::Rgba8Premul,
    error::{LayerbakeError, LayerbakeResult},
    math::{mul_div255_u8, opacity_to_u8},
};

pub type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over on premultiplied pixels, with `src` scaled by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = opacity_to_u8(opacity);
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Premultiplied canvas accumulator.
#[derive(Clone, Debug)]
pub(crate) struct CanvasBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl CanvasBuffer {
    pub(crate) fn new(width: u32, height: u32, clear: PremulRgba8) -> LayerbakeResult<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| LayerbakeError::invalid_canvas("canvas size overflow"))?;
        let data = clear.iter().copied().cycle().take(len).collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn blend(&mut self, x: u32, y: u32, src: PremulRgba8, opacity: f32) {
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let d = &mut self.data[idx..idx + 4];
        let out = over([d[0], d[1], d[2], d[3]], src, opacity);
        d.copy_from_slice(&out);
    }

    /// Convert to a straight-alpha RGBA image.
    pub(crate) fn into_straight_image(self) -> image::RgbaImage {
        let mut data = self.data;
        for px in data.chunks_exact_mut(4) {
            let straight = Rgba8Premul::from_array([px[0], px[1], px[2], px[3]]).to_straight_rgba();
            px.copy_from_slice(&straight);
        }
        // Length is width * height * 4 by construction.
        image::RgbaImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }
}

/// Composite a straight-alpha image over an opaque background, dropping alpha.
pub fn flatten_onto(image: &image::RgbaImage, background: [u8; 3]) -> image::RgbImage {
    let [br, bg, bb] = background;
    image::RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let src = Rgba8Premul::from_straight_rgba(r, g, b, a).to_array();
        let out = over([br, bg, bb, 255], src, 1.0);
        image::Rgb([out[0], out[1], out[2]])
    })
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/bake/composite.rs"]
mod tests;
