//! Affine placement of layers and pointwise geometry mapping.
//!
//! Every layer maps its local pixel space onto the canvas with the same
//! canonical order: scale about the local origin, rotate about the center of
//! the scaled raster, then translate so the unrotated top-left lands on
//! `position`. Pixel resampling and annotation remapping both go through
//! [`placement_affine`], so the two can never disagree.

use crate::{
    foundation::core::{Affine, Point, Rect, Vec2},
    foundation::error::{LayerbakeError, LayerbakeResult},
    foundation::math::normalize_degrees,
};

/// Tolerance below which shear/rotation coefficients count as zero.
const AXIS_ALIGNED_EPS: f64 = 1e-9;

/// Placement parameters of one layer: position, rotation and scale.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    /// Top-left anchor in canvas space.
    pub position: Vec2,
    /// Rotation in degrees about the layer's own center, clockwise on screen.
    pub rotation_deg: f64,
    /// Horizontal and vertical multipliers, both strictly positive.
    pub scale: Vec2,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation_deg: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Placement {
    /// Reject non-finite values and non-positive scale.
    pub fn validate(&self) -> LayerbakeResult<()> {
        if !self.position.x.is_finite() || !self.position.y.is_finite() {
            return Err(LayerbakeError::invalid_transform("position must be finite"));
        }
        if !self.rotation_deg.is_finite() {
            return Err(LayerbakeError::invalid_transform("rotation must be finite"));
        }
        validate_scale(self.scale.x, self.scale.y)
    }
}

/// Reject a scale pair that would collapse or mirror the layer.
pub fn validate_scale(sx: f64, sy: f64) -> LayerbakeResult<()> {
    if !sx.is_finite() || !sy.is_finite() {
        return Err(LayerbakeError::invalid_transform("scale must be finite"));
    }
    if sx <= 0.0 || sy <= 0.0 {
        return Err(LayerbakeError::invalid_transform(format!(
            "scale must be > 0 on both axes (got {sx}, {sy})"
        )));
    }
    Ok(())
}

/// Compute the local-to-canvas transform of a `width x height` raster.
pub fn placement_affine(
    placement: &Placement,
    width: u32,
    height: u32,
) -> LayerbakeResult<Affine> {
    placement.validate()?;
    if width == 0 || height == 0 {
        return Err(LayerbakeError::invalid_transform(
            "raster must have non-zero width and height",
        ));
    }

    let pivot = Vec2::new(
        f64::from(width) * placement.scale.x / 2.0,
        f64::from(height) * placement.scale.y / 2.0,
    );
    let t_translate = Affine::translate(placement.position);
    let t_pivot = Affine::translate(pivot);
    let t_unpivot = Affine::translate(-pivot);
    let t_rotate = Affine::rotate(normalize_degrees(placement.rotation_deg).to_radians());
    let t_scale = Affine::scale_non_uniform(placement.scale.x, placement.scale.y);

    // Canonical order:
    // T(position) * T(pivot) * R(rot) * T(-pivot) * S(scale)
    Ok(t_translate * t_pivot * t_rotate * t_unpivot * t_scale)
}

/// Apply `b` first, then `a`.
#[inline]
pub fn compose(a: Affine, b: Affine) -> Affine {
    a * b
}

#[inline]
pub fn transform_point(p: Point, t: Affine) -> Point {
    t * p
}

/// Pointwise transform; vertex order is preserved.
pub fn transform_polygon(points: &[Point], t: Affine) -> Vec<Point> {
    points.iter().map(|&p| t * p).collect()
}

/// How rectangles are exported once a rotation turns them into general quads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RectExport {
    /// Keep the exact transformed corners as a 4-vertex polygon (lossless).
    #[default]
    Quad,
    /// Re-fit the smallest enclosing axis-aligned box (lossy).
    AxisAligned,
}

/// A rectangle after transformation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformedRect {
    /// Still axis-aligned, either exactly or by [`RectExport::AxisAligned`].
    Rect(Rect),
    /// Corners in `(x0,y0) (x1,y0) (x1,y1) (x0,y1)` order of the source rectangle.
    Quad([Point; 4]),
}

pub fn transform_rectangle(rect: Rect, t: Affine, export: RectExport) -> TransformedRect {
    let corners = rect_corners(rect.abs()).map(|c| t * c);
    if export == RectExport::AxisAligned || is_axis_aligned(t) {
        TransformedRect::Rect(bounding_rect(&corners))
    } else {
        TransformedRect::Quad(corners)
    }
}

pub fn rect_corners(rect: Rect) -> [Point; 4] {
    [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ]
}

/// True when `t` maps axis-aligned boxes to axis-aligned boxes
/// (no rotation or shear beyond multiples of 180 degrees).
pub fn is_axis_aligned(t: Affine) -> bool {
    let [_, b, c, _, _, _] = t.as_coeffs();
    b.abs() < AXIS_ALIGNED_EPS && c.abs() < AXIS_ALIGNED_EPS
}

pub(crate) fn bounding_rect(points: &[Point]) -> Rect {
    let Some((&first, rest)) = points.split_first() else {
        return Rect::ZERO;
    };
    rest.iter()
        .fold(Rect::from_points(first, first), |r, &p| r.union_pt(p))
}

/// Invert `t`, rejecting transforms that collapse area.
pub(crate) fn checked_inverse(t: Affine) -> LayerbakeResult<Affine> {
    let det = t.determinant();
    if !det.is_finite() || det.abs() <= f64::EPSILON {
        return Err(LayerbakeError::invalid_transform(
            "transform is degenerate (zero determinant)",
        ));
    }
    Ok(t.inverse())
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/transform.rs"]
mod tests;
