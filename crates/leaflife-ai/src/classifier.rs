//! ONNX Runtime session wrapper for the leaf classifier.
//!
//! Loads the exported graph, checks its classification head against the
//! resolved class count, and turns uploaded images into a top-1
//! prediction. `Session::run` needs exclusive access, so callers share
//! the classifier behind a lock.

use std::path::Path;

use ort::session::Session;
use ort::value::Tensor;
use thiserror::Error;
use tracing::{info, warn};

use crate::vision;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("inference failed: {0}")]
    Runtime(#[from] ort::Error),
    #[error("model returned {got} scores for {expected} classes")]
    ClassCount { got: usize, expected: usize },
    #[error("model returned an empty output")]
    EmptyOutput,
}

/// Top-1 prediction over the resolved class list.
#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    pub index: usize,
    pub confidence: f32,
}

/// Leaf-disease classifier backed by an ONNX Runtime session.
pub struct LeafClassifier {
    session: Session,
    num_classes: usize,
}

impl LeafClassifier {
    /// Load the exported graph and verify its head against the resolved
    /// class count. A dynamic output dimension is accepted with a
    /// warning; a fixed mismatch refuses to load.
    pub fn load(model_path: &Path, num_classes: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(
            model_path.exists(),
            "model.onnx not found at {}",
            model_path.display()
        );

        let session = Session::builder()?.commit_from_file(model_path)?;

        match output_dim(session.outputs()[0].dtype()) {
            Some(dim) if dim != num_classes => anyhow::bail!(
                "classification head emits {dim} scores but {num_classes} classes were resolved"
            ),
            Some(dim) => info!(dim, model = %model_path.display(), "loaded classifier"),
            None => warn!(
                model = %model_path.display(),
                "output dimension is dynamic, skipping head check"
            ),
        }

        Ok(Self {
            session,
            num_classes,
        })
    }

    /// Number of classes the head was sized for.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Inference device name, surfaced in the liveness payload.
    pub fn device(&self) -> &'static str {
        "cpu"
    }

    /// Decode, preprocess, and classify one uploaded image.
    pub fn predict(&mut self, image_bytes: &[u8]) -> Result<Prediction, InferenceError> {
        let img = vision::decode_rgb(image_bytes)?;
        let planes = vision::to_input_planes(&img);

        let shape = [1i64, 3, vision::INPUT_SIZE as i64, vision::INPUT_SIZE as i64];
        let input = Tensor::from_array((shape, planes.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs![input])?;
        let (_, logits) = outputs[0].try_extract_tensor::<f32>()?;

        if logits.len() != self.num_classes {
            return Err(InferenceError::ClassCount {
                got: logits.len(),
                expected: self.num_classes,
            });
        }

        let probs = vision::softmax(logits);
        let (index, confidence) = vision::argmax(&probs).ok_or(InferenceError::EmptyOutput)?;
        Ok(Prediction { index, confidence })
    }
}

/// Class count from the model's declared output shape, when fixed.
fn output_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => fixed_dim(shape),
        _ => None,
    }
}

/// Trailing extent of a declared shape. Dynamic and symbolic dimensions
/// are declared as values <= 0 and yield `None`.
fn fixed_dim(dims: &[i64]) -> Option<usize> {
    dims.last()
        .and_then(|&d| if d > 0 { Some(d as usize) } else { None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    use image::{Rgb, RgbImage};

    use crate::checkpoint::Checkpoint;
    use crate::classes::resolve_classes;

    #[test]
    fn fixed_dim_takes_trailing_extent() {
        assert_eq!(fixed_dim(&[1, 38]), Some(38));
        assert_eq!(fixed_dim(&[-1, 12]), Some(12));
        assert_eq!(fixed_dim(&[4]), Some(4));
    }

    #[test]
    fn fixed_dim_rejects_dynamic_and_empty_shapes() {
        assert_eq!(fixed_dim(&[1, -1]), None);
        assert_eq!(fixed_dim(&[1, 0]), None);
        assert_eq!(fixed_dim(&[]), None);
    }

    fn model_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("model")
    }

    /// Session tests drive a real exported graph paired with its
    /// checkpoint. Without the artifacts in place they skip.
    fn exported_artifacts() -> Option<(PathBuf, usize)> {
        let dir = model_dir();
        let graph = dir.join("model.onnx");
        let checkpoint_path = dir.join("model.safetensors");
        if !graph.exists() || !checkpoint_path.exists() {
            eprintln!("no exported model under {} - skipping", dir.display());
            return None;
        }
        let checkpoint = Checkpoint::open(&checkpoint_path).unwrap();
        let resolved = resolve_classes(None, &checkpoint).unwrap();
        Some((graph, resolved.names.len()))
    }

    #[test]
    fn load_rejects_head_mismatch() {
        let Some((graph, num_classes)) = exported_artifacts() else {
            return;
        };
        assert!(LeafClassifier::load(&graph, num_classes + 1).is_err());
    }

    #[test]
    fn predict_stays_inside_class_list() {
        let Some((graph, num_classes)) = exported_artifacts() else {
            return;
        };
        let mut classifier = LeafClassifier::load(&graph, num_classes).unwrap();
        assert_eq!(classifier.num_classes(), num_classes);

        let leaf = RgbImage::from_pixel(64, 64, Rgb([52, 168, 83]));
        let mut png = Vec::new();
        leaf.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let prediction = classifier.predict(&png).unwrap();
        assert!(prediction.index < num_classes);
        assert!(prediction.confidence > 0.0 && prediction.confidence <= 1.0);
    }

    #[test]
    fn predict_rejects_undecodable_bytes() {
        let Some((graph, num_classes)) = exported_artifacts() else {
            return;
        };
        let mut classifier = LeafClassifier::load(&graph, num_classes).unwrap();
        let err = classifier.predict(b"not an image").unwrap_err();
        assert!(matches!(err, InferenceError::Decode(_)));
    }
}
