//! Reply normalisation and parsing.
//!
//! Models are told to answer with bare JSON but habitually wrap it in a
//! markdown code fence anyway. The fence is stripped first; whatever
//! remains either parses into a [`DiseaseInfo`] or degrades to the
//! heuristic stub.

use leaflife_core::DiseaseInfo;
use tracing::warn;

/// Strip a wrapping markdown code fence from a model reply.
///
/// Handles ```` ```json ```` and bare ```` ``` ```` fences. Stripping is
/// idempotent: a reply without fences comes back unchanged.
pub fn strip_code_fences(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Parse a model reply into a [`DiseaseInfo`], falling back to the
/// heuristic stub when the reply is not valid JSON.
pub fn parse_disease_info(raw: &str, label: &str) -> DiseaseInfo {
    let text = strip_code_fences(raw);
    match serde_json::from_str::<DiseaseInfo>(text) {
        Ok(info) => info,
        Err(err) => {
            warn!(%err, label, "enrichment reply was not valid JSON");
            DiseaseInfo::parse_fallback(label)
        }
    }
}
