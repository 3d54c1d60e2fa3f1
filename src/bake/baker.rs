//! The compositor: resolves per-layer parameters, sizes the canvas, draws
//! visible layers bottom to top and remaps their annotations with the exact
//! transform used for the pixels.

use std::collections::BTreeSet;

use crate::{
    bake::composite::CanvasBuffer,
    bake::resample::{Interpolation, draw_layer},
    bake::result::{BakedAnnotation, BakingResult, LayerMask},
    foundation::core::{Affine, LayerId, Point, Rect, Rgb8, Rgba8Premul},
    foundation::error::{LayerbakeError, LayerbakeResult},
    geometry::mask::Mask,
    geometry::transform::{RectExport, placement_affine},
    model::annotation::Annotation,
    model::layer::{Layer, LayerParams},
    session::state::State,
};

/// How the output canvas is sized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CanvasPolicy {
    /// Smallest integer box covering every visible transformed layer. The
    /// canvas origin moves with it, see [`BakingResult::canvas_origin`].
    #[default]
    FitVisible,
    /// Explicit size with the origin at world `(0, 0)`.
    Fixed { width: u32, height: u32 },
}

/// What a state replay does with layers it has no entry for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlistedLayerPolicy {
    /// Render them with their live parameters.
    #[default]
    Live,
    /// Leave them out of the bake.
    Hide,
}

/// Knobs for a single bake.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BakeOptions {
    pub canvas: CanvasPolicy,
    pub include_annotations: bool,
    pub rect_export: RectExport,
    pub interpolation: Interpolation,
    pub unlisted_layers: UnlistedLayerPolicy,
    /// Export annotations of opacity-0 layers.
    pub ghost_annotations: bool,
    /// Collect a canvas-space coverage mask per drawn layer.
    pub write_masks: bool,
    /// Straight RGBA clear color of the canvas; transparent when unset.
    pub background: Option<[u8; 4]>,
}

impl Default for BakeOptions {
    fn default() -> Self {
        Self {
            canvas: CanvasPolicy::default(),
            include_annotations: true,
            rect_export: RectExport::default(),
            interpolation: Interpolation::default(),
            unlisted_layers: UnlistedLayerPolicy::default(),
            ghost_annotations: false,
            write_masks: false,
            background: None,
        }
    }
}

impl BakeOptions {
    /// Shorthand for a fixed-size canvas with default everything else.
    pub fn fixed(width: u32, height: u32) -> Self {
        Self {
            canvas: CanvasPolicy::Fixed { width, height },
            ..Self::default()
        }
    }
}

struct DrawItem<'a> {
    layer: &'a Layer,
    order: usize,
    params: LayerParams,
    affine: Affine,
}

/// Composite `layers` (in insertion order) into a new [`BakingResult`].
///
/// With a `state`, its parameters replace the live ones for every layer it
/// lists. Entries for layers that are gone are skipped and counted; layers
/// the state does not list follow [`BakeOptions::unlisted_layers`].
#[tracing::instrument(skip_all, fields(layers = layers.len(), step = state.map(State::step)))]
pub fn bake_layers(
    layers: &[Layer],
    state: Option<&State>,
    opts: &BakeOptions,
) -> LayerbakeResult<BakingResult> {
    let mut hidden_layers = 0usize;
    let mut skipped_entries = 0usize;

    if let Some(state) = state {
        let present: BTreeSet<LayerId> = layers.iter().map(Layer::id).collect();
        for id in state.layer_states().keys() {
            if !present.contains(id) {
                skipped_entries += 1;
                tracing::warn!(
                    step = state.step(),
                    layer = %id,
                    "state references a missing layer, skipping entry"
                );
            }
        }
    }

    let mut items = Vec::with_capacity(layers.len());
    for (order, layer) in layers.iter().enumerate() {
        let params = match state {
            None => *layer.params(),
            Some(state) => match (state.params_for(layer.id()), opts.unlisted_layers) {
                (Some(p), _) => *p,
                (None, UnlistedLayerPolicy::Live) => *layer.params(),
                (None, UnlistedLayerPolicy::Hide) => {
                    hidden_layers += 1;
                    continue;
                }
            },
        };
        if !params.visible {
            continue;
        }
        let (w, h) = layer.pixels().size();
        let affine = placement_affine(&params.placement, w, h)?;
        items.push(DrawItem {
            layer,
            order,
            params,
            affine,
        });
    }

    let (canvas_width, canvas_height, origin) = resolve_canvas(&items, opts.canvas)?;
    let to_canvas = Affine::translate(-origin.to_vec2());

    // Bottom first; insertion order breaks ties.
    items.sort_by_key(|item| (item.params.z_order, item.order));

    let clear = opts
        .background
        .map(|[r, g, b, a]| Rgba8Premul::from_straight_rgba(r, g, b, a).to_array())
        .unwrap_or([0, 0, 0, 0]);
    let mut canvas = CanvasBuffer::new(canvas_width, canvas_height, clear)?;

    let mut annotations = Vec::new();
    let mut masks = Vec::new();
    for item in &items {
        let t = to_canvas * item.affine;
        let opacity = item.params.opacity.clamp(0.0, 1.0);

        if opacity > 0.0 {
            let mut coverage = opts
                .write_masks
                .then(|| Mask::new(canvas_width, canvas_height));
            draw_layer(
                &mut canvas,
                item.layer.pixels(),
                t,
                opacity as f32,
                opts.interpolation,
                coverage.as_mut(),
            )?;
            if let Some(mask) = coverage {
                masks.push(LayerMask {
                    layer_id: item.layer.id(),
                    name: item.layer.name().to_owned(),
                    mask,
                });
            }
        }

        let export = opts.include_annotations
            && item.layer.export_annotations()
            && (opacity > 0.0 || opts.ghost_annotations);
        if !export {
            continue;
        }
        for ann in item.layer.annotations() {
            let geometry = ann
                .geometry
                .transform(t, canvas_width, canvas_height, opts.rect_export)?;
            annotations.push(BakedAnnotation {
                layer_id: item.layer.id(),
                layer_name: item.layer.name().to_owned(),
                annotation: Annotation {
                    geometry,
                    ..ann.clone()
                },
            });
        }
    }

    tracing::info!(
        width = canvas_width,
        height = canvas_height,
        drawn = items.len(),
        annotations = annotations.len(),
        skipped_entries,
        hidden_layers,
        "bake complete"
    );

    let background = opts
        .background
        .map(|[r, g, b, _]| Rgb8::new(r, g, b))
        .unwrap_or(Rgb8::new(0, 0, 0));

    Ok(BakingResult {
        image: canvas.into_straight_image(),
        annotations,
        masks,
        step: state.map(State::step),
        canvas_origin: origin,
        skipped_entries,
        hidden_layers,
        background,
    })
}

fn resolve_canvas(
    items: &[DrawItem<'_>],
    policy: CanvasPolicy,
) -> LayerbakeResult<(u32, u32, Point)> {
    match policy {
        CanvasPolicy::Fixed { width, height } => {
            if width == 0 || height == 0 {
                return Err(LayerbakeError::invalid_canvas(format!(
                    "canvas {width}x{height} has no area"
                )));
            }
            Ok((width, height, Point::ORIGIN))
        }
        CanvasPolicy::FitVisible => {
            let bbox = items
                .iter()
                .map(|item| {
                    let (w, h) = item.layer.pixels().size();
                    item.affine
                        .transform_rect_bbox(Rect::new(0.0, 0.0, f64::from(w), f64::from(h)))
                })
                .reduce(|a, b| a.union(b))
                .ok_or_else(|| {
                    LayerbakeError::invalid_canvas("no visible layers to fit the canvas to")
                })?;

            let x0 = bbox.x0.floor();
            let y0 = bbox.y0.floor();
            let width = bbox.x1.ceil() - x0;
            let height = bbox.y1.ceil() - y0;
            if !(width >= 1.0 && height >= 1.0)
                || width > f64::from(u32::MAX)
                || height > f64::from(u32::MAX)
            {
                return Err(LayerbakeError::invalid_canvas(format!(
                    "fitted canvas {width}x{height} is not representable"
                )));
            }
            Ok((width as u32, height as u32, Point::new(x0, y0)))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bake/baker.rs"]
mod tests;
