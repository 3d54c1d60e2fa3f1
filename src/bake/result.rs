use std::{
    fs::File,
    io::{BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    bake::composite::flatten_onto,
    foundation::core::{LayerId, Point, Rgb8, StepKey},
    foundation::error::{LayerbakeError, LayerbakeResult},
    geometry::mask::Mask,
    model::annotation::Annotation,
};

/// An annotation remapped into output-canvas space, tagged with the layer it came from.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BakedAnnotation {
    pub layer_id: LayerId,
    pub layer_name: String,
    #[serde(flatten)]
    pub annotation: Annotation,
}

/// Canvas-space coverage of one drawn layer (source alpha `> 0`).
#[derive(Clone, Debug, PartialEq)]
pub struct LayerMask {
    pub layer_id: LayerId,
    pub name: String,
    pub mask: Mask,
}

/// Output of one bake. Nothing is written to disk until [`BakingResult::save`].
#[derive(Clone, Debug)]
pub struct BakingResult {
    /// Straight-alpha RGBA composite.
    pub image: image::RgbaImage,
    /// Annotations of exported layers, in draw order.
    pub annotations: Vec<BakedAnnotation>,
    /// Per-layer coverage, only populated with `write_masks`.
    pub masks: Vec<LayerMask>,
    /// The state this bake replayed, if any.
    pub step: Option<StepKey>,
    /// World coordinate of the canvas' top-left pixel corner.
    pub canvas_origin: Point,
    /// State entries that referenced layers no longer in the session.
    pub skipped_entries: usize,
    /// Layers left out because the state did not list them.
    pub hidden_layers: usize,
    /// Color used under transparent pixels when saving to formats without alpha.
    pub background: Rgb8,
}

/// Paths written by [`BakingResult::save`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SavedPaths {
    pub image: PathBuf,
    pub annotations: Option<PathBuf>,
    pub masks: Vec<PathBuf>,
}

/// On-disk JSON form of a bake's annotations.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnnotationDocument {
    pub canvas_width: u32,
    pub canvas_height: u32,
    #[serde(default)]
    pub canvas_origin: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<StepKey>,
    pub annotations: Vec<BakedAnnotation>,
}

impl BakingResult {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn annotation_document(&self) -> AnnotationDocument {
        AnnotationDocument {
            canvas_width: self.width(),
            canvas_height: self.height(),
            canvas_origin: self.canvas_origin,
            step: self.step,
            annotations: self.annotations.clone(),
        }
    }

    /// Write the image (format chosen by extension) and, if requested, a
    /// `.json` annotation sidecar next to it. Coverage masks, when present,
    /// go to `<stem>_mask_<layer>.png`.
    pub fn save(&self, path: &Path, save_annotations: bool) -> LayerbakeResult<SavedPaths> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }

        let format = image::ImageFormat::from_path(path)
            .with_context(|| format!("unsupported output format '{}'", path.display()))?;
        if keeps_alpha(format) {
            self.image
                .save_with_format(path, format)
                .with_context(|| format!("write image '{}'", path.display()))?;
        } else {
            flatten_onto(&self.image, self.background.into())
                .save_with_format(path, format)
                .with_context(|| format!("write image '{}'", path.display()))?;
        }

        let mut saved = SavedPaths {
            image: path.to_path_buf(),
            ..SavedPaths::default()
        };

        if save_annotations {
            let json_path = path.with_extension("json");
            self.save_annotations_json(&json_path)?;
            saved.annotations = Some(json_path);
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bake".to_owned());
        for m in &self.masks {
            let mask_path = path.with_file_name(format!("{stem}_mask_{}.png", m.layer_id));
            m.mask
                .to_luma_image()
                .save_with_format(&mask_path, image::ImageFormat::Png)
                .with_context(|| format!("write mask '{}'", mask_path.display()))?;
            saved.masks.push(mask_path);
        }

        tracing::info!(
            image = %saved.image.display(),
            annotations = self.annotations.len(),
            masks = saved.masks.len(),
            "saved bake result"
        );
        Ok(saved)
    }

    pub fn save_annotations_json(&self, path: &Path) -> LayerbakeResult<()> {
        let f = File::create(path)
            .with_context(|| format!("create annotation file '{}'", path.display()))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, &self.annotation_document())
            .map_err(|e| LayerbakeError::serde(format!("write '{}': {e}", path.display())))?;
        w.flush()
            .with_context(|| format!("flush annotation file '{}'", path.display()))?;
        Ok(())
    }
}

/// Reload annotations saved by [`BakingResult::save_annotations_json`].
pub fn load_annotations_json(path: &Path) -> LayerbakeResult<AnnotationDocument> {
    let f = File::open(path).with_context(|| format!("open annotation file '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .map_err(|e| LayerbakeError::serde(format!("parse '{}': {e}", path.display())))
}

fn keeps_alpha(format: image::ImageFormat) -> bool {
    use image::ImageFormat as F;
    matches!(format, F::Png | F::Tiff | F::WebP | F::Tga | F::Qoi)
}

#[cfg(test)]
#[path = "../../tests/unit/bake/result.rs"]
mod tests;
