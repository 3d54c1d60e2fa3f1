//! Declarative bake description read by the command-line tool, plus the
//! small parsers behind `bake simple`'s list arguments.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    bake::baker::BakeOptions,
    foundation::core::LayerId,
    foundation::error::{LayerbakeError, LayerbakeResult},
    io::load_raster,
    model::annotation::Annotation,
    model::raster::Raster,
    session::store::Session,
};

/// Scale given as one number (uniform) or `[sx, sy]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ScaleConfig {
    Uniform(f64),
    Axes([f64; 2]),
}

impl ScaleConfig {
    pub fn axes(self) -> (f64, f64) {
        match self {
            Self::Uniform(s) => (s, s),
            Self::Axes([sx, sy]) => (sx, sy),
        }
    }
}

/// One layer of a [`BakeConfig`]. Unset fields keep the layer defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    /// Image path; relative paths resolve against the config file's directory.
    pub file: PathBuf,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<[f64; 2]>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub scale: Option<ScaleConfig>,
    #[serde(default)]
    pub rotation: Option<f64>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub z_order: Option<i32>,
    #[serde(default)]
    pub export_annotations: Option<bool>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// A complete batch bake: ordered layers (first is bottom), output path and options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BakeConfig {
    pub layers: Vec<LayerConfig>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Write the annotation JSON sidecar next to the output image.
    #[serde(default)]
    pub save_annotations: bool,
    #[serde(default)]
    pub options: BakeOptions,
}

impl BakeConfig {
    pub fn from_json_str(s: &str) -> LayerbakeResult<Self> {
        serde_json::from_str(s).map_err(|e| LayerbakeError::serde(format!("bake config: {e}")))
    }

    pub fn load(path: &Path) -> LayerbakeResult<Self> {
        let f = File::open(path).with_context(|| format!("open bake config '{}'", path.display()))?;
        serde_json::from_reader(BufReader::new(f))
            .map_err(|e| LayerbakeError::serde(format!("parse '{}': {e}", path.display())))
    }

    pub fn validate(&self) -> LayerbakeResult<()> {
        if self.layers.is_empty() {
            return Err(LayerbakeError::config(
                "config must list at least one layer",
            ));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            let ctx = |msg: String| {
                LayerbakeError::config(format!("layer {i} ('{}'): {msg}", layer.file.display()))
            };
            if let Some([x, y]) = layer.position
                && (!x.is_finite() || !y.is_finite())
            {
                return Err(ctx("position must be finite".to_owned()));
            }
            if let Some(o) = layer.opacity
                && !(0.0..=1.0).contains(&o)
            {
                return Err(ctx(format!("opacity must be in [0, 1], got {o}")));
            }
            if let Some(scale) = layer.scale {
                let (sx, sy) = scale.axes();
                if !(sx.is_finite() && sy.is_finite() && sx > 0.0 && sy > 0.0) {
                    return Err(ctx(format!("scale must be > 0, got ({sx}, {sy})")));
                }
            }
            if let Some(r) = layer.rotation
                && !r.is_finite()
            {
                return Err(ctx("rotation must be finite".to_owned()));
            }
        }
        Ok(())
    }

    /// Load every layer image from disk and build a ready-to-bake session.
    pub fn build_session(&self, base_dir: &Path) -> LayerbakeResult<Session> {
        self.build_session_with(base_dir, load_raster)
    }

    /// Like [`BakeConfig::build_session`] with a custom image loader.
    pub fn build_session_with(
        &self,
        base_dir: &Path,
        mut loader: impl FnMut(&Path) -> LayerbakeResult<Raster>,
    ) -> LayerbakeResult<Session> {
        self.validate()?;
        let mut session = Session::new();
        for layer in &self.layers {
            let path = if layer.file.is_absolute() {
                layer.file.clone()
            } else {
                base_dir.join(&layer.file)
            };
            let pixels = loader(&path)?;
            let name = layer.name.clone().unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| format!("Layer_{}", session.layer_count()))
            });
            let id = session.add_named_layer(name, pixels)?;
            session.layer_mut(id)?.set_source(path);
            apply_layer_config(&mut session, id, layer)?;
        }
        tracing::debug!(layers = session.layer_count(), "built session from config");
        Ok(session)
    }
}

fn apply_layer_config(
    session: &mut Session,
    id: LayerId,
    cfg: &LayerConfig,
) -> LayerbakeResult<()> {
    if let Some([x, y]) = cfg.position {
        session.set_layer_position(id, x, y)?;
    }
    if let Some(scale) = cfg.scale {
        let (sx, sy) = scale.axes();
        session.set_layer_scale(id, sx, Some(sy))?;
    }
    if let Some(r) = cfg.rotation {
        session.set_layer_rotation(id, r)?;
    }
    if let Some(o) = cfg.opacity {
        session.set_layer_opacity(id, o)?;
    }
    if let Some(v) = cfg.visible {
        session.set_layer_visibility(id, v)?;
    }
    if let Some(z) = cfg.z_order {
        session.set_layer_z_order(id, z)?;
    }
    if let Some(export) = cfg.export_annotations {
        session.layer_mut(id)?.set_export_annotations(export);
    }
    for ann in &cfg.annotations {
        session.add_annotation(id, ann.clone())?;
    }
    Ok(())
}

/// Parse `"x1,y1;x2,y2;..."`. `None` yields `count` origins; otherwise the
/// number of pairs must equal `count`.
pub fn parse_positions(s: Option<&str>, count: usize) -> LayerbakeResult<Vec<(f64, f64)>> {
    let Some(s) = s else {
        return Ok(vec![(0.0, 0.0); count]);
    };
    let out = s
        .split(';')
        .map(|pair| {
            let (x, y) = pair.split_once(',').ok_or_else(|| {
                LayerbakeError::config(format!("position '{pair}' is not 'x,y'"))
            })?;
            Ok((parse_f64(x, "position")?, parse_f64(y, "position")?))
        })
        .collect::<LayerbakeResult<Vec<_>>>()?;
    check_count("positions", out.len(), count)?;
    Ok(out)
}

/// Parse `"a,b,c"`. `None` yields `count` copies of `default`; otherwise the
/// number of values must equal `count`.
pub fn parse_list(
    s: Option<&str>,
    count: usize,
    default: f64,
    what: &str,
) -> LayerbakeResult<Vec<f64>> {
    let Some(s) = s else {
        return Ok(vec![default; count]);
    };
    let out = s
        .split(',')
        .map(|v| parse_f64(v, what))
        .collect::<LayerbakeResult<Vec<_>>>()?;
    check_count(what, out.len(), count)?;
    Ok(out)
}

/// Parse `"o1,o2,..."` like [`parse_list`] (default 1.0), rejecting values
/// outside `[0, 1]` the way [`BakeConfig::validate`] does.
pub fn parse_opacities(s: Option<&str>, count: usize) -> LayerbakeResult<Vec<f64>> {
    let out = parse_list(s, count, 1.0, "opacities")?;
    if let Some((i, o)) = out
        .iter()
        .enumerate()
        .find(|(_, o)| !(0.0..=1.0).contains(*o))
    {
        return Err(LayerbakeError::config(format!(
            "opacity {i} must be in [0, 1], got {o}"
        )));
    }
    Ok(out)
}

/// Parse `"WIDTHxHEIGHT"`, e.g. `"640x480"`.
pub fn parse_canvas(s: &str) -> LayerbakeResult<(u32, u32)> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| LayerbakeError::config(format!("canvas '{s}' is not WIDTHxHEIGHT")))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| LayerbakeError::config(format!("canvas '{s}': {e}")))
    };
    let (w, h) = (parse(w)?, parse(h)?);
    if w == 0 || h == 0 {
        return Err(LayerbakeError::invalid_canvas(format!(
            "canvas {w}x{h} has no area"
        )));
    }
    Ok((w, h))
}

fn parse_f64(v: &str, what: &str) -> LayerbakeResult<f64> {
    v.trim()
        .parse::<f64>()
        .map_err(|e| LayerbakeError::config(format!("{what} value '{}': {e}", v.trim())))
}

fn check_count(what: &str, got: usize, expected: usize) -> LayerbakeResult<()> {
    if got != expected {
        return Err(LayerbakeError::config(format!(
            "number of {what} ({got}) must match number of images ({expected})"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
