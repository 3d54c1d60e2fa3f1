//! Labeled regions attached to a layer, stored in the layer's local,
//! untransformed pixel space.

use crate::{
    foundation::core::{Affine, AnnotationId, Point, Rect, Rgb8},
    foundation::error::{LayerbakeError, LayerbakeResult},
    geometry::mask::{Mask, transform_mask},
    geometry::transform::{RectExport, TransformedRect, transform_polygon, transform_rectangle},
};

/// Discriminant of [`Geometry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    PointSet,
    Rectangle,
    Polygon,
    Mask,
}

/// Region shape. Serialized with a `"type"` tag.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    /// One or more loose points.
    Points { points: Vec<Point> },
    /// Axis-aligned box, normalized to (min corner, max corner).
    Rectangle { rect: Rect },
    /// Three or more vertices, in order.
    Polygon { vertices: Vec<Point> },
    /// Binary raster covering the layer.
    Mask { mask: Mask },
}

impl Geometry {
    /// Build geometry from a flat coordinate list, checking the count against `kind`.
    pub fn from_coordinates(kind: AnnotationKind, coords: &[Point]) -> LayerbakeResult<Self> {
        match kind {
            AnnotationKind::PointSet => {
                if coords.is_empty() {
                    return Err(LayerbakeError::malformed_annotation(
                        "point set needs at least 1 point",
                    ));
                }
                Ok(Self::Points {
                    points: coords.to_vec(),
                })
            }
            AnnotationKind::Rectangle => match coords {
                [a, b] => Ok(Self::rectangle(*a, *b)),
                _ => Err(LayerbakeError::malformed_annotation(format!(
                    "rectangle needs exactly 2 corners, got {}",
                    coords.len()
                ))),
            },
            AnnotationKind::Polygon => {
                if coords.len() < 3 {
                    return Err(LayerbakeError::malformed_annotation(format!(
                        "polygon needs at least 3 vertices, got {}",
                        coords.len()
                    )));
                }
                Ok(Self::Polygon {
                    vertices: coords.to_vec(),
                })
            }
            AnnotationKind::Mask => Err(LayerbakeError::malformed_annotation(
                "mask geometry is a raster, not a coordinate list",
            )),
        }
    }

    /// Rectangle from two opposite corners in any click order.
    pub fn rectangle(a: Point, b: Point) -> Self {
        Self::Rectangle {
            rect: Rect::from_points(a, b),
        }
    }

    pub fn kind(&self) -> AnnotationKind {
        match self {
            Self::Points { .. } => AnnotationKind::PointSet,
            Self::Rectangle { .. } => AnnotationKind::Rectangle,
            Self::Polygon { .. } => AnnotationKind::Polygon,
            Self::Mask { .. } => AnnotationKind::Mask,
        }
    }

    /// Check this geometry against a `width x height` layer and return its
    /// normalized form. Rectangles are clipped to the layer; every other
    /// shape must already lie inside it.
    pub fn validated_for(&self, width: u32, height: u32) -> LayerbakeResult<Self> {
        let bounds = Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
        match self {
            Self::Points { points } => {
                if points.is_empty() {
                    return Err(LayerbakeError::malformed_annotation(
                        "point set needs at least 1 point",
                    ));
                }
                check_inside(points, bounds)?;
                Ok(self.clone())
            }
            Self::Rectangle { rect } => {
                let corners = [Point::new(rect.x0, rect.y0), Point::new(rect.x1, rect.y1)];
                check_finite(&corners)?;
                let clipped = rect.abs().intersect(bounds);
                if clipped.width() <= 0.0 || clipped.height() <= 0.0 {
                    return Err(LayerbakeError::malformed_annotation(format!(
                        "rectangle {rect:?} has no area inside the {width}x{height} layer"
                    )));
                }
                Ok(Self::Rectangle { rect: clipped })
            }
            Self::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return Err(LayerbakeError::malformed_annotation(format!(
                        "polygon needs at least 3 vertices, got {}",
                        vertices.len()
                    )));
                }
                check_inside(vertices, bounds)?;
                Ok(self.clone())
            }
            Self::Mask { mask } => {
                if mask.width() != width || mask.height() != height {
                    return Err(LayerbakeError::malformed_annotation(format!(
                        "mask is {}x{}, layer is {width}x{height}",
                        mask.width(),
                        mask.height()
                    )));
                }
                Ok(self.clone())
            }
        }
    }

    /// Map into canvas space through `t`. Masks are resampled onto a
    /// `canvas_width x canvas_height` grid.
    pub fn transform(
        &self,
        t: Affine,
        canvas_width: u32,
        canvas_height: u32,
        rect_export: RectExport,
    ) -> LayerbakeResult<Self> {
        Ok(match self {
            Self::Points { points } => Self::Points {
                points: transform_polygon(points, t),
            },
            Self::Rectangle { rect } => match transform_rectangle(*rect, t, rect_export) {
                TransformedRect::Rect(rect) => Self::Rectangle { rect },
                TransformedRect::Quad(corners) => Self::Polygon {
                    vertices: corners.to_vec(),
                },
            },
            Self::Polygon { vertices } => Self::Polygon {
                vertices: transform_polygon(vertices, t),
            },
            Self::Mask { mask } => Self::Mask {
                mask: transform_mask(mask, t, canvas_width, canvas_height)?,
            },
        })
    }
}

fn check_finite(points: &[Point]) -> LayerbakeResult<()> {
    if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(LayerbakeError::malformed_annotation(
            "coordinates must be finite",
        ));
    }
    Ok(())
}

fn check_inside(points: &[Point], bounds: Rect) -> LayerbakeResult<()> {
    check_finite(points)?;
    if let Some(p) = points.iter().find(|p| {
        p.x < bounds.x0 || p.y < bounds.y0 || p.x > bounds.x1 || p.y > bounds.y1
    }) {
        return Err(LayerbakeError::malformed_annotation(format!(
            "point ({}, {}) lies outside the {}x{} layer",
            p.x,
            p.y,
            bounds.width(),
            bounds.height()
        )));
    }
    Ok(())
}

/// A labeled region owned by exactly one layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Annotation {
    /// Assigned by the session on attach when not supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AnnotationId>,
    pub label: String,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb8>,
    /// Confidence, for model-produced annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl Annotation {
    pub fn new(label: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: None,
            label: label.into(),
            geometry,
            color: None,
            score: None,
            caption: None,
        }
    }

    /// Build from a flat coordinate list; see [`Geometry::from_coordinates`].
    pub fn from_coordinates(
        label: impl Into<String>,
        kind: AnnotationKind,
        coords: &[(f64, f64)],
    ) -> LayerbakeResult<Self> {
        let pts: Vec<Point> = coords.iter().map(|&(x, y)| Point::new(x, y)).collect();
        Ok(Self::new(label, Geometry::from_coordinates(kind, &pts)?))
    }

    pub fn rectangle(label: impl Into<String>, a: Point, b: Point) -> Self {
        Self::new(label, Geometry::rectangle(a, b))
    }

    pub fn polygon(label: impl Into<String>, vertices: Vec<Point>) -> Self {
        Self::new(label, Geometry::Polygon { vertices })
    }

    pub fn points(label: impl Into<String>, points: Vec<Point>) -> Self {
        Self::new(label, Geometry::Points { points })
    }

    pub fn mask(label: impl Into<String>, mask: Mask) -> Self {
        Self::new(label, Geometry::Mask { mask })
    }

    pub fn with_id(mut self, id: AnnotationId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_color(mut self, color: Rgb8) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn kind(&self) -> AnnotationKind {
        self.geometry.kind()
    }

    /// Validate against the owning layer's size, returning the normalized annotation.
    pub(crate) fn validated_for(mut self, width: u32, height: u32) -> LayerbakeResult<Self> {
        if let Some(score) = self.score
            && !score.is_finite()
        {
            return Err(LayerbakeError::malformed_annotation("score must be finite"));
        }
        self.geometry = self.geometry.validated_for(width, height)?;
        Ok(self)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/annotation.rs"]
mod tests;
