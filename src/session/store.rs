use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use rayon::prelude::*;

use crate::{
    bake::baker::{BakeOptions, bake_layers},
    bake::result::BakingResult,
    foundation::core::{AnnotationId, LayerId, StepKey},
    foundation::error::{LayerbakeError, LayerbakeResult},
    io::load_raster,
    model::annotation::Annotation,
    model::layer::{Layer, LayerParams},
    model::raster::Raster,
    session::state::State,
};

/// Read-only summary of one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerInfo {
    pub id: LayerId,
    pub name: String,
    pub source: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub params: LayerParams,
    pub annotation_count: usize,
    pub export_annotations: bool,
}

/// Caller-owned registry of layers and saved states.
///
/// Owns every id counter, so independent sessions never interfere. Layers are
/// kept in creation order, which is also the tie-break order for equal z-order.
#[derive(Clone, Debug, Default)]
pub struct Session {
    layers: Vec<Layer>,
    states: BTreeMap<StepKey, State>,
    next_layer_id: u64,
    next_z: i32,
    next_annotation_id: u64,
    next_step: StepKey,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer on top of the stack. Its name defaults to `Layer_<id>`.
    pub fn add_layer(&mut self, pixels: Raster) -> LayerbakeResult<LayerId> {
        let name = format!("Layer_{}", self.next_layer_id);
        self.add_named_layer(name, pixels)
    }

    pub fn add_named_layer(
        &mut self,
        name: impl Into<String>,
        pixels: Raster,
    ) -> LayerbakeResult<LayerId> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(LayerbakeError::invalid_raster(
                "layer raster must have non-zero width and height",
            ));
        }
        let id = LayerId(self.next_layer_id);
        self.next_layer_id += 1;
        let z = self.next_z;
        self.next_z = self.next_z.saturating_add(1);

        let name = name.into();
        tracing::debug!(
            layer = %id,
            %name,
            width = pixels.width(),
            height = pixels.height(),
            "add layer"
        );
        self.layers.push(Layer::new(id, name, pixels, z));
        Ok(id)
    }

    /// Decode an image file into a new layer named after the file stem.
    pub fn add_layer_from_file(&mut self, path: &Path) -> LayerbakeResult<LayerId> {
        let pixels = load_raster(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("Layer_{}", self.next_layer_id));
        let id = self.add_named_layer(name, pixels)?;
        self.layer_mut(id)?.set_source(path.to_path_buf());
        Ok(id)
    }

    /// Remove a layer and its annotations. Saved states keep their entry for
    /// it; replaying them skips that entry.
    pub fn remove_layer(&mut self, id: LayerId) -> LayerbakeResult<Layer> {
        let idx = self.index_of(id)?;
        tracing::debug!(layer = %id, "remove layer");
        Ok(self.layers.remove(idx))
    }

    pub fn layer(&self, id: LayerId) -> LayerbakeResult<&Layer> {
        let idx = self.index_of(id)?;
        Ok(&self.layers[idx])
    }

    pub fn layer_mut(&mut self, id: LayerId) -> LayerbakeResult<&mut Layer> {
        let idx = self.index_of(id)?;
        Ok(&mut self.layers[idx])
    }

    /// All layers in creation order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer_info(&self, id: LayerId) -> LayerbakeResult<LayerInfo> {
        let layer = self.layer(id)?;
        Ok(LayerInfo {
            id,
            name: layer.name().to_owned(),
            source: layer.source().map(Path::to_path_buf),
            width: layer.pixels().width(),
            height: layer.pixels().height(),
            params: *layer.params(),
            annotation_count: layer.annotations().len(),
            export_annotations: layer.export_annotations(),
        })
    }

    pub fn set_layer_position(&mut self, id: LayerId, x: f64, y: f64) -> LayerbakeResult<()> {
        self.layer_mut(id)?.set_position(x, y)
    }

    pub fn set_layer_rotation(&mut self, id: LayerId, degrees: f64) -> LayerbakeResult<()> {
        self.layer_mut(id)?.set_rotation(degrees)
    }

    pub fn set_layer_scale(
        &mut self,
        id: LayerId,
        sx: f64,
        sy: Option<f64>,
    ) -> LayerbakeResult<()> {
        self.layer_mut(id)?.set_scale(sx, sy)
    }

    pub fn set_layer_opacity(&mut self, id: LayerId, opacity: f64) -> LayerbakeResult<()> {
        self.layer_mut(id)?.set_opacity(opacity)
    }

    pub fn set_layer_visibility(&mut self, id: LayerId, visible: bool) -> LayerbakeResult<()> {
        self.layer_mut(id)?.set_visibility(visible);
        Ok(())
    }

    pub fn set_layer_z_order(&mut self, id: LayerId, z_order: i32) -> LayerbakeResult<()> {
        self.layer_mut(id)?.set_z_order(z_order);
        Ok(())
    }

    /// Validate and attach an annotation, assigning an id when it has none.
    /// A caller-supplied id must be unused across the session and moves the
    /// session counter past it.
    pub fn add_annotation(
        &mut self,
        layer: LayerId,
        annotation: Annotation,
    ) -> LayerbakeResult<AnnotationId> {
        let id = annotation
            .id
            .unwrap_or(AnnotationId(self.next_annotation_id));
        if self.annotation_id_in_use(id) {
            return Err(LayerbakeError::malformed_annotation(format!(
                "annotation id {} is already in use",
                id.0
            )));
        }
        let next = id.0.checked_add(1).ok_or_else(|| {
            LayerbakeError::malformed_annotation("annotation id space is exhausted")
        })?;
        let id = self.layer_mut(layer)?.push_annotation(annotation, id)?;
        self.next_annotation_id = self.next_annotation_id.max(next);
        tracing::debug!(layer = %layer, annotation = id.0, "add annotation");
        Ok(id)
    }

    pub fn remove_annotation(
        &mut self,
        layer: LayerId,
        id: AnnotationId,
    ) -> LayerbakeResult<Option<Annotation>> {
        Ok(self.layer_mut(layer)?.remove_annotation(id))
    }

    /// Snapshot every layer's parameters under `step`, replacing any previous
    /// snapshot for that key.
    pub fn save_state(&mut self, step: StepKey) -> &State {
        let state = State::capture(step, &self.layers);
        self.next_step = self.next_step.max(step.saturating_add(1));
        tracing::debug!(step, layers = state.len(), "save state");
        self.states.insert(step, state);
        &self.states[&step]
    }

    /// Save under the next unused step key and return that key.
    pub fn save_next_state(&mut self) -> StepKey {
        let step = self.next_step;
        self.save_state(step);
        step
    }

    pub fn remove_state(&mut self, step: StepKey) -> Option<State> {
        self.states.remove(&step)
    }

    pub fn state(&self, step: StepKey) -> LayerbakeResult<&State> {
        self.states
            .get(&step)
            .ok_or(LayerbakeError::UnknownStep(step))
    }

    /// Saved step keys, ascending.
    pub fn steps(&self) -> Vec<StepKey> {
        self.states.keys().copied().collect()
    }

    /// Bake the saved state `step`, or the live parameters when `None`.
    pub fn bake(
        &self,
        step: Option<StepKey>,
        opts: &BakeOptions,
    ) -> LayerbakeResult<BakingResult> {
        match step {
            Some(step) => bake_layers(&self.layers, Some(self.state(step)?), opts),
            None => bake_layers(&self.layers, None, opts),
        }
    }

    /// Bake an arbitrary state against this session's layers.
    pub fn bake_state(
        &self,
        state: &State,
        opts: &BakeOptions,
    ) -> LayerbakeResult<BakingResult> {
        bake_layers(&self.layers, Some(state), opts)
    }

    /// Bake several saved steps in parallel. Results come back in input order.
    pub fn bake_steps(
        &self,
        steps: &[StepKey],
        opts: &BakeOptions,
        threads: Option<usize>,
    ) -> LayerbakeResult<Vec<BakingResult>> {
        let states = steps
            .iter()
            .map(|&step| self.state(step).cloned())
            .collect::<LayerbakeResult<Vec<_>>>()?;
        self.bake_states(&states, opts, threads)
    }

    /// Bake independent states on a dedicated thread pool.
    #[tracing::instrument(skip(self, states, opts), fields(frames = states.len()))]
    pub fn bake_states(
        &self,
        states: &[State],
        opts: &BakeOptions,
        threads: Option<usize>,
    ) -> LayerbakeResult<Vec<BakingResult>> {
        let pool = build_thread_pool(threads)?;
        let baked = pool.install(|| {
            states
                .par_iter()
                .map(|state| bake_layers(&self.layers, Some(state), opts))
                .collect::<Vec<_>>()
        });
        baked.into_iter().collect()
    }

    /// Frames stepping from saved state `from` to saved state `to`.
    ///
    /// Returns `frames + 1` states at `t = 0, 1/frames, ..., 1`: the first
    /// reproduces `from`'s layers as `to` lists them, the last equals `to`.
    /// Each frame's step key is its index; none are saved in the session.
    pub fn interpolate_states(
        &self,
        from: StepKey,
        to: StepKey,
        frames: usize,
    ) -> LayerbakeResult<Vec<State>> {
        let a = self.state(from)?;
        let b = self.state(to)?;
        if frames == 0 {
            return Ok(vec![State::from_params(0, b.layer_states().clone())]);
        }
        Ok((0..=frames)
            .map(|i| {
                let t = i as f64 / frames as f64;
                State::lerp(a, b, t, i as StepKey)
            })
            .collect())
    }

    fn annotation_id_in_use(&self, id: AnnotationId) -> bool {
        self.layers
            .iter()
            .flat_map(|l| l.annotations())
            .any(|a| a.id == Some(id))
    }

    fn index_of(&self, id: LayerId) -> LayerbakeResult<usize> {
        self.layers
            .binary_search_by_key(&id, Layer::id)
            .map_err(|_| LayerbakeError::MissingLayer(id))
    }
}

fn build_thread_pool(threads: Option<usize>) -> LayerbakeResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(LayerbakeError::config(
            "bake threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| LayerbakeError::config(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/session/store.rs"]
mod tests;
