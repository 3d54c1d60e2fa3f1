use std::path::PathBuf;

use crate::{
    foundation::core::{Affine, AnnotationId, LayerId, Vec2},
    foundation::error::{LayerbakeError, LayerbakeResult},
    geometry::transform::{Placement, placement_affine, validate_scale},
    model::annotation::Annotation,
    model::raster::Raster,
};

/// Placement parameters of a layer at one instant. This is what a
/// [`State`](crate::State) freezes; pixels and annotations are not included.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerParams {
    /// Position, rotation and scale.
    pub placement: Placement,
    /// Layer opacity in `[0, 1]`.
    pub opacity: f64,
    /// Invisible layers are skipped by the compositor but kept in the model.
    pub visible: bool,
    /// Sort key in the composite stack, bottom first. Need not be contiguous.
    pub z_order: i32,
}

impl LayerParams {
    pub(crate) fn with_z_order(z_order: i32) -> Self {
        Self {
            placement: Placement::default(),
            opacity: 1.0,
            visible: true,
            z_order,
        }
    }
}

/// One image plus its placement parameters and attached annotations.
///
/// Layers are created by a [`Session`](crate::Session), which owns id
/// assignment for both layers and annotations.
#[derive(Clone, Debug)]
pub struct Layer {
    id: LayerId,
    name: String,
    source: Option<PathBuf>,
    pixels: Raster,
    params: LayerParams,
    export_annotations: bool,
    annotations: Vec<Annotation>,
}

impl Layer {
    pub(crate) fn new(id: LayerId, name: String, pixels: Raster, z_order: i32) -> Self {
        Self {
            id,
            name,
            source: None,
            pixels,
            params: LayerParams::with_z_order(z_order),
            export_annotations: true,
            annotations: Vec::new(),
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the pixels were loaded from, if any.
    pub fn source(&self) -> Option<&std::path::Path> {
        self.source.as_deref()
    }

    pub fn pixels(&self) -> &Raster {
        &self.pixels
    }

    pub fn params(&self) -> &LayerParams {
        &self.params
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Whether this layer's annotations go into baked output.
    pub fn export_annotations(&self) -> bool {
        self.export_annotations
    }

    /// Local-to-canvas transform for the live parameters.
    pub fn affine(&self) -> LayerbakeResult<Affine> {
        let (w, h) = self.pixels.size();
        placement_affine(&self.params.placement, w, h)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn set_source(&mut self, source: PathBuf) {
        self.source = Some(source);
    }

    pub fn set_position(&mut self, x: f64, y: f64) -> LayerbakeResult<()> {
        if !x.is_finite() || !y.is_finite() {
            return Err(LayerbakeError::invalid_transform("position must be finite"));
        }
        self.params.placement.position = Vec2::new(x, y);
        tracing::debug!(layer = %self.id, x, y, "set position");
        Ok(())
    }

    /// Degrees; stored as given and reduced modulo 360 when the transform is built.
    pub fn set_rotation(&mut self, degrees: f64) -> LayerbakeResult<()> {
        if !degrees.is_finite() {
            return Err(LayerbakeError::invalid_transform("rotation must be finite"));
        }
        self.params.placement.rotation_deg = degrees;
        tracing::debug!(layer = %self.id, degrees, "set rotation");
        Ok(())
    }

    /// `sy` defaults to `sx` (uniform scale).
    pub fn set_scale(&mut self, sx: f64, sy: Option<f64>) -> LayerbakeResult<()> {
        let sy = sy.unwrap_or(sx);
        validate_scale(sx, sy)?;
        self.params.placement.scale = Vec2::new(sx, sy);
        tracing::debug!(layer = %self.id, sx, sy, "set scale");
        Ok(())
    }

    /// Clamped to `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f64) -> LayerbakeResult<()> {
        if opacity.is_nan() {
            return Err(LayerbakeError::invalid_transform("opacity must not be NaN"));
        }
        self.params.opacity = opacity.clamp(0.0, 1.0);
        tracing::debug!(layer = %self.id, opacity = self.params.opacity, "set opacity");
        Ok(())
    }

    pub fn set_visibility(&mut self, visible: bool) {
        self.params.visible = visible;
        tracing::debug!(layer = %self.id, visible, "set visibility");
    }

    pub fn set_z_order(&mut self, z_order: i32) {
        self.params.z_order = z_order;
    }

    pub fn set_export_annotations(&mut self, export: bool) {
        self.export_annotations = export;
    }

    /// Validate against this layer's raster and append. The id must already be resolved.
    pub(crate) fn push_annotation(
        &mut self,
        annotation: Annotation,
        id: AnnotationId,
    ) -> LayerbakeResult<AnnotationId> {
        let mut annotation =
            annotation.validated_for(self.pixels.width(), self.pixels.height())?;
        annotation.id = Some(id);
        self.annotations.push(annotation);
        Ok(id)
    }

    pub fn remove_annotation(&mut self, id: AnnotationId) -> Option<Annotation> {
        let idx = self.annotations.iter().position(|a| a.id == Some(id))?;
        Some(self.annotations.remove(idx))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/layer.rs"]
mod tests;
