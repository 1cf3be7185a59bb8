pub mod label;
pub mod report;

pub use label::{is_healthy_label, placeholder_classes, round_confidence, species_of};
pub use report::{DiseaseInfo, PredictResponse, ServiceInfo};
