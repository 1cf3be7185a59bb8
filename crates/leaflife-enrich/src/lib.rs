//! Enrichment layer: negotiates a model against the provider catalog,
//! turns replies into [`leaflife_core::DiseaseInfo`] payloads, and
//! degrades to stubs instead of failing.

pub mod negotiate;
pub mod parse;

#[cfg(feature = "http")]
pub mod gemini;

#[cfg(feature = "http")]
pub use gemini::{EnrichError, GeminiClient};
