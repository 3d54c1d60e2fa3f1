use std::collections::BTreeMap;

use crate::{
    foundation::core::{LayerId, StepKey, Vec2},
    foundation::math::lerp,
    geometry::transform::Placement,
    model::layer::{Layer, LayerParams},
};

/// Immutable snapshot of every layer's placement parameters at one step.
///
/// Pixels and annotations are not copied; they stay owned by the live layers.
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    step: StepKey,
    layer_states: BTreeMap<LayerId, LayerParams>,
}

impl State {
    /// Freeze the current parameters of `layers`.
    pub fn capture<'a>(step: StepKey, layers: impl IntoIterator<Item = &'a Layer>) -> Self {
        Self {
            step,
            layer_states: layers
                .into_iter()
                .map(|l| (l.id(), *l.params()))
                .collect(),
        }
    }

    /// Build a state from explicit parameters, e.g. for scripted frames.
    pub fn from_params(step: StepKey, layer_states: BTreeMap<LayerId, LayerParams>) -> Self {
        Self { step, layer_states }
    }

    pub fn step(&self) -> StepKey {
        self.step
    }

    pub fn layer_states(&self) -> &BTreeMap<LayerId, LayerParams> {
        &self.layer_states
    }

    pub fn params_for(&self, id: LayerId) -> Option<&LayerParams> {
        self.layer_states.get(&id)
    }

    pub fn len(&self) -> usize {
        self.layer_states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layer_states.is_empty()
    }

    /// Blend from `from` towards `to` by `t` in `[0, 1]`.
    ///
    /// Layers listed in `to` are interpolated when `from` also lists them and
    /// copied otherwise; layers only in `from` are dropped. Position, rotation,
    /// scale and opacity are linear; visibility and z-order come from `to`.
    pub fn lerp(from: &Self, to: &Self, t: f64, step: StepKey) -> Self {
        let t = t.clamp(0.0, 1.0);
        let layer_states = to
            .layer_states
            .iter()
            .map(|(&id, target)| {
                let params = match from.layer_states.get(&id) {
                    Some(start) => lerp_params(start, target, t),
                    None => *target,
                };
                (id, params)
            })
            .collect();
        Self { step, layer_states }
    }
}

fn lerp_params(a: &LayerParams, b: &LayerParams, t: f64) -> LayerParams {
    let lerp_vec = |u: Vec2, v: Vec2| Vec2::new(lerp(u.x, v.x, t), lerp(u.y, v.y, t));
    LayerParams {
        placement: Placement {
            position: lerp_vec(a.placement.position, b.placement.position),
            rotation_deg: lerp(a.placement.rotation_deg, b.placement.rotation_deg, t),
            scale: lerp_vec(a.placement.scale, b.placement.scale),
        },
        opacity: lerp(a.opacity, b.opacity, t).clamp(0.0, 1.0),
        visible: b.visible,
        z_order: b.z_order,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/state.rs"]
mod tests;
