//! Wire types for the HTTP surface.
//!
//! `DiseaseInfo` is what the enrichment provider is asked to produce and
//! what `/disease-info/{class}` returns bare; `/predict` flattens it next
//! to the prediction. Degraded answers are stubs built here so every
//! failure path speaks the same shape.

use serde::{Deserialize, Serialize};

use crate::label::{is_healthy_label, species_of};

/// Enrichment payload describing a disease class.
///
/// `error` is present only on degraded answers. Defaults mirror what the
/// consumer should assume when the provider omits a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default = "unknown_species")]
    pub species: String,
    #[serde(rename = "isHealthy", default)]
    pub is_healthy: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prevention: Vec<String>,
    #[serde(default)]
    pub causes: String,
}

fn unknown_species() -> String {
    "Unknown".to_string()
}

impl DiseaseInfo {
    /// Stub returned when no enrichment credential is configured.
    /// The provider is never contacted.
    pub fn not_configured(label: &str) -> Self {
        Self {
            error: Some("Gemini API key not configured".to_string()),
            species: "Unknown".to_string(),
            is_healthy: is_healthy_label(label),
            description: "Please configure GEMINI_API_KEY environment variable".to_string(),
            prevention: Vec::new(),
            causes: "API key not configured".to_string(),
        }
    }

    /// Heuristic stub used when the provider replied but not with valid
    /// JSON. Species comes from the label itself.
    pub fn parse_fallback(label: &str) -> Self {
        Self {
            error: None,
            species: species_of(label),
            is_healthy: is_healthy_label(label),
            description: format!("Information about {label}"),
            prevention: vec![
                "Consult with a plant pathologist".to_string(),
                "Follow general plant care practices".to_string(),
                "Monitor plant health regularly".to_string(),
            ],
            causes: "Unable to retrieve detailed information at this time".to_string(),
        }
    }

    /// Error stub for transport or provider failures, keeping the
    /// derived species and a readable diagnostic. A missing-model
    /// failure gets its own wording.
    pub fn api_failure(label: &str, diagnostic: &str) -> Self {
        let (description, causes) = if diagnostic.contains("404")
            || diagnostic.to_ascii_lowercase().contains("not found")
        {
            (
                "Unable to retrieve information: The AI model is currently unavailable. Please check your API configuration.".to_string(),
                format!(
                    "Model configuration error: {diagnostic}. This may be due to an incorrect model name or API version mismatch."
                ),
            )
        } else {
            (
                format!("Unable to retrieve detailed information about {label} at this time."),
                format!("Error occurred while fetching information: {diagnostic}"),
            )
        };

        Self {
            error: Some(diagnostic.to_string()),
            species: species_of(label),
            is_healthy: is_healthy_label(label),
            description,
            prevention: vec![
                "Please try again later".to_string(),
                "Check your API configuration".to_string(),
                "Consult with a plant pathologist for detailed information".to_string(),
            ],
            causes,
        }
    }
}

/// Flattened `/predict` payload: top-1 prediction plus enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub class: String,
    pub confidence: f64,
    pub species: String,
    #[serde(rename = "isHealthy")]
    pub is_healthy: bool,
    pub description: String,
    pub prevention: Vec<String>,
    pub causes: String,
}

impl PredictResponse {
    /// Compose the success payload from a prediction and its enrichment.
    pub fn success(label: &str, confidence: f64, info: DiseaseInfo) -> Self {
        Self {
            error: None,
            class: label.to_string(),
            confidence,
            species: info.species,
            is_healthy: info.is_healthy,
            description: info.description,
            prevention: info.prevention,
            causes: info.causes,
        }
    }

    /// Structured error payload. Always paired with an HTTP success
    /// status so clients never branch on transport errors for domain
    /// failures.
    pub fn failure(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            class: "Error".to_string(),
            confidence: 0.0,
            species: "Unknown".to_string(),
            is_healthy: false,
            description: format!("Error: {message}"),
            prevention: Vec::new(),
            causes: String::new(),
        }
    }
}

/// Liveness payload for `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    pub device: String,
    pub classes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_configured_stub_fields() {
        let info = DiseaseInfo::not_configured("Apple___healthy");
        assert_eq!(info.error.as_deref(), Some("Gemini API key not configured"));
        assert_eq!(info.species, "Unknown");
        assert!(info.is_healthy);
        assert!(info.prevention.is_empty());
        assert_eq!(info.causes, "API key not configured");

        let sick = DiseaseInfo::not_configured("Tomato___Late_blight");
        assert!(!sick.is_healthy);
    }

    #[test]
    fn parse_fallback_derives_species() {
        let info = DiseaseInfo::parse_fallback("Tomato___Early_blight");
        assert!(info.error.is_none());
        assert_eq!(info.species, "Tomato");
        assert_eq!(info.description, "Information about Tomato___Early_blight");
        assert_eq!(info.prevention.len(), 3);
    }

    #[test]
    fn api_failure_distinguishes_missing_model() {
        let missing = DiseaseInfo::api_failure("Corn___rust", "provider returned 404: no model");
        assert!(missing.description.contains("currently unavailable"));
        assert!(missing.causes.starts_with("Model configuration error:"));
        assert_eq!(missing.species, "Corn");

        let other = DiseaseInfo::api_failure("Corn___rust", "connection reset");
        assert!(other.description.contains("Corn___rust"));
        assert!(other.causes.starts_with("Error occurred while fetching"));
        assert_eq!(other.error.as_deref(), Some("connection reset"));
    }

    #[test]
    fn disease_info_serializes_renamed_health_flag() {
        let json = serde_json::to_value(DiseaseInfo::not_configured("x")).unwrap();
        assert!(json.get("isHealthy").is_some());
        assert!(json.get("is_healthy").is_none());
        assert!(json.get("error").is_some());
    }

    #[test]
    fn disease_info_parses_partial_payload() {
        let info: DiseaseInfo =
            serde_json::from_str(r#"{"description": "leaf spots", "isHealthy": true}"#).unwrap();
        assert_eq!(info.species, "Unknown");
        assert!(info.is_healthy);
        assert_eq!(info.description, "leaf spots");
        assert!(info.prevention.is_empty());
        assert!(info.error.is_none());
    }

    #[test]
    fn success_response_omits_error() {
        let info = DiseaseInfo::parse_fallback("Grape___Black_rot");
        let resp = PredictResponse::success("Grape___Black_rot", 0.9876, info);
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["class"], "Grape___Black_rot");
        assert_eq!(json["confidence"], 0.9876);
        assert_eq!(json["species"], "Grape");
    }

    #[test]
    fn failure_response_shape() {
        let resp = PredictResponse::failure("could not decode image");
        assert_eq!(resp.class, "Error");
        assert_eq!(resp.confidence, 0.0);
        assert_eq!(resp.error.as_deref(), Some("could not decode image"));
        assert_eq!(resp.description, "Error: could not decode image");
        assert!(resp.prevention.is_empty());
        assert_eq!(resp.causes, "");
    }

    #[test]
    fn service_info_roundtrip() {
        let info = ServiceInfo {
            message: "LeafLife.ai API is running 🌿".to_string(),
            device: "cpu".to_string(),
            classes: 38,
        };
        let json = serde_json::to_string(&info).unwrap();
        let parsed: ServiceInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.classes, 38);
        assert_eq!(parsed.device, "cpu");
    }
}
