use crate::foundation::{
    core::Rgba8Premul,
    error::{LayerbakeError, LayerbakeResult},
};

/// Owned straight-alpha RGBA8 pixel buffer, row-major.
///
/// Inputs with fewer channels are upcast on construction so every layer
/// composites from the same depth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> LayerbakeResult<Self> {
        let expected = checked_len(width, height, 4)?;
        if data.len() != expected {
            return Err(LayerbakeError::invalid_raster(format!(
                "rgba8 buffer has {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Upcast opaque RGB8 to RGBA8.
    pub fn from_rgb8(width: u32, height: u32, data: &[u8]) -> LayerbakeResult<Self> {
        let expected = checked_len(width, height, 3)?;
        if data.len() != expected {
            return Err(LayerbakeError::invalid_raster(format!(
                "rgb8 buffer has {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        let mut rgba = Vec::with_capacity(checked_len(width, height, 4)?);
        for px in data.chunks_exact(3) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        Self::from_rgba8(width, height, rgba)
    }

    /// A solid-color raster.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> LayerbakeResult<Self> {
        let len = checked_len(width, height, 4)?;
        let data = rgba.iter().copied().cycle().take(len).collect();
        Self::from_rgba8(width, height, data)
    }

    pub fn from_rgba_image(img: image::RgbaImage) -> LayerbakeResult<Self> {
        let (width, height) = img.dimensions();
        Self::from_rgba8(width, height, img.into_raw())
    }

    /// Normalize any decoded image (gray, gray+alpha, RGB, 16-bit, ...) to RGBA8.
    pub fn from_dynamic(img: &image::DynamicImage) -> LayerbakeResult<Self> {
        Self::from_rgba_image(img.to_rgba8())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Straight RGBA at `(x, y)`; out-of-bounds reads are transparent.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub(crate) fn pixel_premul(&self, x: u32, y: u32) -> Rgba8Premul {
        let [r, g, b, a] = self.pixel(x, y);
        Rgba8Premul::from_straight_rgba(r, g, b, a)
    }

    pub fn to_rgba_image(&self) -> image::RgbaImage {
        // Length is validated on construction.
        let (w, h) = (self.width, self.height);
        image::RgbaImage::from_fn(w, h, |x, y| image::Rgba(self.pixel(x, y)))
    }
}

fn checked_len(width: u32, height: u32, channels: usize) -> LayerbakeResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| LayerbakeError::invalid_raster("raster size overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/model/raster.rs"]
mod tests;
