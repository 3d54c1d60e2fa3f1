//! Layerbake composites raster layers into one image while carrying their
//! annotations along, so a handful of labeled crops can be turned into many
//! labeled training images.
//!
//! - Build a [`Session`] and add layers ([`Raster`]s) to it
//! - Place them (position, rotation, scale, opacity, visibility, z-order)
//!   and attach [`Annotation`]s in each layer's local pixel space
//! - Optionally freeze the placement into a [`State`] with
//!   [`Session::save_state`]
//! - [`Session::bake`] a [`BakingResult`]: the composite plus every exported
//!   annotation remapped onto the canvas with the same transform as the pixels
#![forbid(unsafe_code)]

mod bake;
mod foundation;
mod geometry;
mod model;
mod session;

/// Declarative JSON bake configuration and CLI list parsers.
pub mod config;
/// Image decoding into [`Raster`]s.
pub mod io;

pub use crate::foundation::core::{
    Affine, AnnotationId, LayerId, Point, Rect, Rgb8, Rgba8Premul, StepKey, Vec2,
};
pub use crate::foundation::error::{LayerbakeError, LayerbakeResult};

pub use crate::bake::baker::{BakeOptions, CanvasPolicy, UnlistedLayerPolicy, bake_layers};
pub use crate::bake::composite::{PremulRgba8, flatten_onto, over};
pub use crate::bake::resample::Interpolation;
pub use crate::bake::result::{
    AnnotationDocument, BakedAnnotation, BakingResult, LayerMask, SavedPaths,
    load_annotations_json,
};
pub use crate::geometry::mask::{Mask, MaskRle, transform_mask};
pub use crate::geometry::transform::{
    Placement, RectExport, TransformedRect, compose, is_axis_aligned, placement_affine,
    rect_corners, transform_point, transform_polygon, transform_rectangle, validate_scale,
};
pub use crate::model::annotation::{Annotation, AnnotationKind, Geometry};
pub use crate::model::layer::{Layer, LayerParams};
pub use crate::model::raster::Raster;
pub use crate::session::state::State;
pub use crate::session::store::{LayerInfo, Session};
