//! Provider model negotiation.
//!
//! The provider's model catalog shifts over time, so the service asks
//! for the catalog and walks a fixed preference list. Selection is a
//! pure ordered-preference search over names, independent of any
//! transport, so it can be tested without network access.

/// Model names tried in order against the catalog.
pub const PREFERRED_MODELS: &[&str] = &[
    "models/gemini-1.5-pro",
    "models/gemini-1.5-flash",
    "models/gemini-pro",
    "models/gemini-1.0-pro",
    "models/gemini-1.0-pro-latest",
];

/// Last-resort names used when the catalog itself cannot be listed.
pub const FALLBACK_MODELS: &[&str] = &[
    "gemini-pro",
    "gemini-1.0-pro",
    "gemini-1.0-pro-latest",
    "gemini-1.5-flash",
];

/// Strip the provider's `models/` namespace prefix.
pub fn bare_model_name(name: &str) -> &str {
    name.strip_prefix("models/").unwrap_or(name)
}

/// Pick the first preferred model present in `available`, comparing
/// names with and without the `models/` prefix. When nothing preferred
/// is offered, settle for the first available entry. The returned name
/// is always prefix-free, ready for request paths.
pub fn select_model(available: &[String], preferred: &[&str]) -> Option<String> {
    for want in preferred {
        let bare = bare_model_name(want);
        if available.iter().any(|have| bare_model_name(have) == bare) {
            return Some(bare.to_string());
        }
    }
    available.first().map(|name| bare_model_name(name).to_string())
}
