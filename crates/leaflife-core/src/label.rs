//! Class-label semantics.
//!
//! Dataset class names follow the PlantVillage convention
//! `Species___Condition` (e.g., "Tomato___Late_blight",
//! "Apple___healthy"). Species derivation and the healthy check read
//! that convention; checkpoints that carry no label source at all get
//! synthetic `class_N` placeholders instead.

/// Separator between species and condition in dataset class names.
pub const SPECIES_DELIMITER: &str = "___";

/// Derive the plant species from a class label.
///
/// "Tomato___Late_blight" → "Tomato". Labels without the triple
/// underscore fall back to the first single-underscore segment; labels
/// with no separator at all yield "Unknown".
pub fn species_of(label: &str) -> String {
    if let Some((species, _)) = label.split_once(SPECIES_DELIMITER)
        && !species.is_empty()
    {
        return species.to_string();
    }
    if let Some((species, _)) = label.split_once('_')
        && !species.is_empty()
    {
        return species.to_string();
    }
    "Unknown".to_string()
}

/// Case-insensitive check for the `healthy` marker in a class label.
pub fn is_healthy_label(label: &str) -> bool {
    label.to_ascii_lowercase().contains("healthy")
}

/// Synthetic labels `class_0` … `class_{n-1}` for checkpoints without
/// class names.
pub fn placeholder_classes(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("class_{i}")).collect()
}

/// Round a probability to 4 decimal digits for response payloads.
pub fn round_confidence(p: f32) -> f64 {
    (f64::from(p) * 10_000.0).round() / 10_000.0
}
