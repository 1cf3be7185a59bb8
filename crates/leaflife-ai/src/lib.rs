//! Model layer: checkpoint header introspection, class-list resolution,
//! and ONNX Runtime inference for the leaf classifier.

pub mod checkpoint;
pub mod classes;
pub mod vision;

#[cfg(feature = "onnx")]
mod classifier;

pub use checkpoint::{Checkpoint, CheckpointError, FINAL_LAYER_KEYS};
pub use classes::{ClassResolveError, ClassSource, ResolvedClasses, resolve_classes};
#[cfg(feature = "onnx")]
pub use classifier::{InferenceError, LeafClassifier, Prediction};
