use crate::{
    foundation::core::{Affine, Point, Rect},
    foundation::error::{LayerbakeError, LayerbakeResult},
    geometry::transform::checked_inverse,
};

/// Binary raster, row-major. Serialized as run-length counts.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(into = "MaskRle", try_from = "MaskRle")]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    /// An all-clear mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; (width as usize) * (height as usize)],
        }
    }

    pub fn from_bits(width: u32, height: u32, bits: Vec<bool>) -> LayerbakeResult<Self> {
        if bits.len() != (width as usize) * (height as usize) {
            return Err(LayerbakeError::malformed_annotation(format!(
                "mask has {} cells, expected {width}x{height}",
                bits.len()
            )));
        }
        Ok(Self {
            width,
            height,
            bits,
        })
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut bits = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                bits.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            bits,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Out-of-bounds reads are clear.
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.bits[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.bits[idx] = value;
        }
    }

    /// Number of set cells.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Pixel-edge bounds of the set cells, or `None` if the mask is empty.
    pub fn bounds(&self) -> Option<Rect> {
        let mut out: Option<(u32, u32, u32, u32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.bits[self.index(x, y)] {
                    continue;
                }
                out = Some(match out {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        out.map(|(x0, y0, x1, y1)| {
            Rect::new(
                f64::from(x0),
                f64::from(y0),
                f64::from(x1) + 1.0,
                f64::from(y1) + 1.0,
            )
        })
    }

    /// 8-bit grayscale rendering (set = 255).
    pub fn to_luma_image(&self) -> image::GrayImage {
        image::GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([if self.get(x, y) { 255 } else { 0 }])
        })
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }
}

/// Resample `mask` through `t` onto a `width x height` grid.
///
/// Nearest-neighbour inverse mapping, so the output stays strictly binary.
/// Samples that fall outside the source are clear.
pub fn transform_mask(mask: &Mask, t: Affine, width: u32, height: u32) -> LayerbakeResult<Mask> {
    let inv = checked_inverse(t)?;
    let mut out = Mask::new(width, height);

    let src = Rect::new(0.0, 0.0, f64::from(mask.width), f64::from(mask.height));
    let bbox = t.transform_rect_bbox(src);
    let x0 = bbox.x0.floor().max(0.0) as u32;
    let y0 = bbox.y0.floor().max(0.0) as u32;
    let x1 = (bbox.x1.ceil().max(0.0) as u32).min(width);
    let y1 = (bbox.y1.ceil().max(0.0) as u32).min(height);

    for y in y0..y1 {
        for x in x0..x1 {
            let local = inv * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let (lx, ly) = (local.x.floor(), local.y.floor());
            if lx < 0.0 || ly < 0.0 {
                continue;
            }
            if mask.get(lx as u32, ly as u32) {
                out.set(x, y, true);
            }
        }
    }
    Ok(out)
}

/// Uncompressed run-length form: alternating clear/set run lengths over the
/// row-major cells, starting with a (possibly empty) clear run.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MaskRle {
    pub width: u32,
    pub height: u32,
    pub counts: Vec<u64>,
}

impl From<Mask> for MaskRle {
    fn from(mask: Mask) -> Self {
        let mut counts = Vec::new();
        let mut current = false;
        let mut run = 0u64;
        for &bit in &mask.bits {
            if bit == current {
                run += 1;
            } else {
                counts.push(run);
                current = bit;
                run = 1;
            }
        }
        counts.push(run);
        Self {
            width: mask.width,
            height: mask.height,
            counts,
        }
    }
}

impl TryFrom<MaskRle> for Mask {
    type Error = LayerbakeError;

    fn try_from(rle: MaskRle) -> Result<Self, Self::Error> {
        let total = u64::from(rle.width) * u64::from(rle.height);
        let sum = rle
            .counts
            .iter()
            .try_fold(0u64, |acc, &run| acc.checked_add(run))
            .ok_or_else(|| LayerbakeError::malformed_annotation("mask run lengths overflow"))?;
        if sum != total {
            return Err(LayerbakeError::malformed_annotation(format!(
                "mask run lengths sum to {sum}, expected {total}"
            )));
        }
        let total = usize::try_from(total).map_err(|_| {
            LayerbakeError::malformed_annotation(format!(
                "{}x{} mask is too large",
                rle.width, rle.height
            ))
        })?;
        let mut bits = Vec::with_capacity(total);
        let mut value = false;
        for &run in &rle.counts {
            let run = usize::try_from(run)
                .ok()
                .filter(|&run| run <= total - bits.len())
                .ok_or_else(|| {
                    LayerbakeError::malformed_annotation("mask run exceeds the mask area")
                })?;
            bits.extend(std::iter::repeat_n(value, run));
            value = !value;
        }
        Mask::from_bits(rle.width, rle.height, bits)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/mask.rs"]
mod tests;
