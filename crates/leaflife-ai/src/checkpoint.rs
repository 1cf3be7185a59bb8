//! Checkpoint header introspection.
//!
//! The checkpoint is a safetensors file read for its header only: tensor
//! names with shapes, plus the free-form `__metadata__` map where
//! training scripts stash the class list. Training-side wrappers leave
//! their mark on tensor names (`state_dict.` around the whole map,
//! `module.` from distributed training); both prefixes are stripped so
//! lookups see canonical names.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use safetensors::SafeTensors;
use thiserror::Error;
use tracing::warn;

/// Final-layer weight tensors recognised for class-count inference,
/// highest priority first.
pub const FINAL_LAYER_KEYS: &[&str] = &["classifier.1.weight", "classifier.0.weight", "fc.weight"];

/// Metadata keys that may carry an embedded class list.
const CLASS_LIST_KEYS: &[&str] = &["classes", "class_names"];

/// Wrapper prefixes stripped from tensor names.
const WRAPPER_PREFIXES: &[&str] = &["state_dict.", "module."];

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("checkpoint not found at {path}")]
    Missing { path: String },
    #[error("failed to read checkpoint: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed safetensors header: {0}")]
    Format(#[from] safetensors::SafeTensorError),
}

/// Parsed checkpoint header: canonical tensor names with shapes, plus
/// the metadata map.
#[derive(Debug)]
pub struct Checkpoint {
    tensors: HashMap<String, Vec<usize>>,
    metadata: HashMap<String, String>,
}

impl Checkpoint {
    /// Read and parse the header of a safetensors checkpoint file.
    pub fn open(path: &Path) -> Result<Self, CheckpointError> {
        if !path.exists() {
            return Err(CheckpointError::Missing {
                path: path.display().to_string(),
            });
        }
        let buf = fs::read(path)?;
        Self::from_bytes(&buf)
    }

    /// Parse a checkpoint header from raw file contents.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, CheckpointError> {
        let (_, header) = SafeTensors::read_metadata(buf)?;

        let tensors = header
            .tensors()
            .into_iter()
            .map(|(name, info)| (canonical_name(&name), info.shape.clone()))
            .collect();
        let metadata = header.metadata().clone().unwrap_or_default();

        Ok(Self { tensors, metadata })
    }

    /// Shape of a tensor by canonical name.
    pub fn shape(&self, name: &str) -> Option<&[usize]> {
        self.tensors.get(name).map(|s| s.as_slice())
    }

    /// Number of tensors in the checkpoint.
    pub fn tensor_count(&self) -> usize {
        self.tensors.len()
    }

    /// Class names embedded in the metadata under `classes` or
    /// `class_names`, stored as a JSON-encoded array of strings.
    ///
    /// A malformed or empty entry is logged and treated as absent so
    /// resolution can fall through to shape inference.
    pub fn embedded_classes(&self) -> Option<Vec<String>> {
        for key in CLASS_LIST_KEYS {
            let Some(raw) = self.metadata.get(*key) else {
                continue;
            };
            match serde_json::from_str::<Vec<String>>(raw) {
                Ok(classes) if !classes.is_empty() => return Some(classes),
                Ok(_) => warn!(key, "checkpoint metadata holds an empty class list"),
                Err(err) => warn!(key, %err, "unparseable class list in checkpoint metadata"),
            }
        }
        None
    }

    /// Class count inferred from the first recognised final-layer weight
    /// tensor's leading dimension. Zero-sized heads are skipped.
    pub fn head_dim(&self) -> Option<usize> {
        FINAL_LAYER_KEYS.iter().find_map(|key| {
            self.tensors
                .get(*key)
                .and_then(|shape| shape.first())
                .copied()
                .filter(|&n| n > 0)
        })
    }
}

/// Strip wrapper prefixes, repeatedly, so `state_dict.module.fc.weight`
/// and `fc.weight` name the same tensor.
fn canonical_name(name: &str) -> String {
    let mut rest = name;
    loop {
        match WRAPPER_PREFIXES.iter().find_map(|p| rest.strip_prefix(p)) {
            Some(stripped) => rest = stripped,
            None => return rest.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safetensors::tensor::{Dtype, TensorView};
    use std::io::Write;

    /// Serialize a checkpoint with the given tensor shapes and metadata.
    fn checkpoint_bytes(tensors: &[(&str, &[usize])], metadata: &[(&str, &str)]) -> Vec<u8> {
        let buffers: Vec<Vec<u8>> = tensors
            .iter()
            .map(|(_, shape)| vec![0u8; shape.iter().product::<usize>() * 4])
            .collect();
        let views: Vec<(String, TensorView)> = tensors
            .iter()
            .zip(&buffers)
            .map(|((name, shape), buf)| {
                let view = TensorView::new(Dtype::F32, shape.to_vec(), buf).unwrap();
                (name.to_string(), view)
            })
            .collect();
        let meta = (!metadata.is_empty()).then(|| {
            metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>()
        });
        safetensors::serialize(views, &meta).unwrap()
    }

    fn parse(tensors: &[(&str, &[usize])], metadata: &[(&str, &str)]) -> Checkpoint {
        Checkpoint::from_bytes(&checkpoint_bytes(tensors, metadata)).unwrap()
    }

    #[test]
    fn strips_wrapper_prefixes() {
        let ckpt = parse(
            &[
                ("state_dict.module.classifier.1.weight", &[38, 1280]),
                ("module.features.0.weight", &[32, 3, 3, 3]),
            ],
            &[],
        );
        assert_eq!(ckpt.shape("classifier.1.weight"), Some(&[38, 1280][..]));
        assert_eq!(ckpt.shape("features.0.weight"), Some(&[32, 3, 3, 3][..]));
        assert_eq!(ckpt.tensor_count(), 2);
    }

    #[test]
    fn embedded_classes_order_preserved() {
        let ckpt = parse(
            &[("fc.weight", &[3, 512])],
            &[("classes", r#"["Tomato___Late_blight", "Apple___healthy", "Corn___rust"]"#)],
        );
        assert_eq!(
            ckpt.embedded_classes().unwrap(),
            vec!["Tomato___Late_blight", "Apple___healthy", "Corn___rust"]
        );
    }

    #[test]
    fn class_names_key_also_recognised() {
        let ckpt = parse(
            &[("fc.weight", &[2, 512])],
            &[("class_names", r#"["a", "b"]"#)],
        );
        assert_eq!(ckpt.embedded_classes().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn malformed_class_list_treated_as_absent() {
        let ckpt = parse(
            &[("fc.weight", &[2, 512])],
            &[("classes", "Tomato, Apple")],
        );
        assert!(ckpt.embedded_classes().is_none());
    }

    #[test]
    fn empty_class_list_treated_as_absent() {
        let ckpt = parse(&[("fc.weight", &[2, 512])], &[("classes", "[]")]);
        assert!(ckpt.embedded_classes().is_none());
    }

    #[test]
    fn head_dim_respects_key_priority() {
        let ckpt = parse(
            &[
                ("fc.weight", &[10, 512]),
                ("classifier.1.weight", &[38, 1280]),
            ],
            &[],
        );
        assert_eq!(ckpt.head_dim(), Some(38));
    }

    #[test]
    fn head_dim_from_fc_weight() {
        let ckpt = parse(
            &[("features.0.weight", &[32, 3, 3, 3]), ("fc.weight", &[12, 512])],
            &[],
        );
        assert_eq!(ckpt.head_dim(), Some(12));
    }

    #[test]
    fn head_dim_skips_zero_sized_head() {
        let ckpt = parse(
            &[("classifier.1.weight", &[0, 1280]), ("fc.weight", &[7, 512])],
            &[],
        );
        assert_eq!(ckpt.head_dim(), Some(7));
    }

    #[test]
    fn head_dim_none_without_recognised_names() {
        let ckpt = parse(&[("features.0.weight", &[32, 3, 3, 3])], &[]);
        assert!(ckpt.head_dim().is_none());
    }

    #[test]
    fn open_missing_file() {
        let err = Checkpoint::open(Path::new("/nonexistent/model.safetensors")).unwrap_err();
        assert!(matches!(err, CheckpointError::Missing { .. }));
    }

    #[test]
    fn open_reads_file_on_disk() {
        let bytes = checkpoint_bytes(&[("fc.weight", &[5, 128])], &[]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let ckpt = Checkpoint::open(file.path()).unwrap();
        assert_eq!(ckpt.head_dim(), Some(5));
    }

    #[test]
    fn garbage_bytes_rejected() {
        let err = Checkpoint::from_bytes(b"not a safetensors file").unwrap_err();
        assert!(matches!(err, CheckpointError::Format(_)));
    }
}
