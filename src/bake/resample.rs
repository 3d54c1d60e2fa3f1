use crate::{
    bake::composite::{CanvasBuffer, PremulRgba8},
    foundation::core::{Affine, Point, Rect},
    foundation::error::LayerbakeResult,
    geometry::mask::Mask,
    geometry::transform::checked_inverse,
    model::raster::Raster,
};

/// Filter used when resampling color pixels onto the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

/// Half-open pixel range `[x0, x1) x [y0, y1)` of the canvas that `t` can
/// reach from a `width x height` source. `None` when nothing lands on the canvas.
pub(crate) fn canvas_footprint(
    t: Affine,
    width: u32,
    height: u32,
    canvas_width: u32,
    canvas_height: u32,
) -> Option<(u32, u32, u32, u32)> {
    let src = Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
    let bbox = t.transform_rect_bbox(src);
    let clamp = |v: f64, hi: u32| v.clamp(0.0, f64::from(hi)) as u32;
    let x0 = clamp(bbox.x0.floor(), canvas_width);
    let y0 = clamp(bbox.y0.floor(), canvas_height);
    let x1 = clamp(bbox.x1.ceil(), canvas_width);
    let y1 = clamp(bbox.y1.ceil(), canvas_height);
    (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
}

/// Sample `raster` at a point in its local pixel space.
///
/// Points outside `[0, w] x [0, h]` are transparent. Bilinear taps are
/// taken on premultiplied values, with out-of-range taps transparent so
/// layer edges fade out instead of smearing.
pub(crate) fn sample(raster: &Raster, local: Point, interpolation: Interpolation) -> PremulRgba8 {
    let (w, h) = (f64::from(raster.width()), f64::from(raster.height()));
    if !(0.0..=w).contains(&local.x) || !(0.0..=h).contains(&local.y) {
        return [0, 0, 0, 0];
    }

    match interpolation {
        Interpolation::Nearest => {
            let x = (local.x.floor() as u32).min(raster.width() - 1);
            let y = (local.y.floor() as u32).min(raster.height() - 1);
            raster.pixel_premul(x, y).to_array()
        }
        Interpolation::Bilinear => {
            let fx = local.x - 0.5;
            let fy = local.y - 0.5;
            let x0 = fx.floor();
            let y0 = fy.floor();
            let tx = fx - x0;
            let ty = fy - y0;

            let tap = |x: f64, y: f64| -> [f64; 4] {
                if x < 0.0 || y < 0.0 {
                    return [0.0; 4];
                }
                raster
                    .pixel_premul(x as u32, y as u32)
                    .to_array()
                    .map(f64::from)
            };

            let p00 = tap(x0, y0);
            let p10 = tap(x0 + 1.0, y0);
            let p01 = tap(x0, y0 + 1.0);
            let p11 = tap(x0 + 1.0, y0 + 1.0);

            let mut out = [0u8; 4];
            for i in 0..4 {
                let top = p00[i] + (p10[i] - p00[i]) * tx;
                let bottom = p01[i] + (p11[i] - p01[i]) * tx;
                let v = top + (bottom - top) * ty;
                out[i] = v.round().clamp(0.0, 255.0) as u8;
            }
            // Keep the premultiplied invariant after rounding.
            let a = out[3];
            for c in &mut out[..3] {
                *c = (*c).min(a);
            }
            out
        }
    }
}

/// Inverse-map `raster` through `t` (local to canvas) and blend it onto
/// `canvas`. When `coverage` is given, every canvas pixel that receives
/// non-zero source alpha is set in it. Returns the number of such pixels.
pub(crate) fn draw_layer(
    canvas: &mut CanvasBuffer,
    raster: &Raster,
    t: Affine,
    opacity: f32,
    interpolation: Interpolation,
    mut coverage: Option<&mut Mask>,
) -> LayerbakeResult<u64> {
    let inv = checked_inverse(t)?;
    let Some((x0, y0, x1, y1)) = canvas_footprint(
        t,
        raster.width(),
        raster.height(),
        canvas.width(),
        canvas.height(),
    ) else {
        return Ok(0);
    };

    let mut covered = 0u64;
    for y in y0..y1 {
        for x in x0..x1 {
            let local = inv * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let src = sample(raster, local, interpolation);
            if src[3] == 0 {
                continue;
            }
            covered += 1;
            canvas.blend(x, y, src, opacity);
            if let Some(mask) = coverage.as_deref_mut() {
                mask.set(x, y, true);
            }
        }
    }
    Ok(covered)
}

#[cfg(test)]
#[path = "../../tests/unit/bake/resample.rs"]
mod tests;
