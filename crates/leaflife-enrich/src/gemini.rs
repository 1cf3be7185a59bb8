//! REST client for the Gemini generative-language API.
//!
//! One client is built at startup, bound to a model negotiated against
//! the live catalog. Per-request failures never propagate: every path
//! out of [`GeminiClient::disease_info`] produces a usable payload.

use std::time::Duration;

use leaflife_core::{DiseaseInfo, is_healthy_label};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::negotiate::{self, FALLBACK_MODELS, PREFERRED_MODELS};
use crate::parse::parse_disease_info;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("provider offered no usable models")]
    NoModels,
}

/// Client for the provider's REST surface, bound to one negotiated
/// model.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct ModelCatalog {
    #[serde(default)]
    models: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct CatalogEntry {
    name: String,
    #[serde(default, rename = "supportedGenerationMethods")]
    supported_generation_methods: Vec<String>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    /// Negotiate a model against the live catalog and build a client.
    ///
    /// A catalog listing failure falls back to a fixed model name; the
    /// first request using it surfaces any real availability problem,
    /// which degrades per request instead of blocking startup.
    pub async fn connect(api_key: String) -> Result<Self, EnrichError> {
        Self::connect_to(API_BASE, api_key).await
    }

    /// As [`connect`](Self::connect), against an explicit base URL.
    pub async fn connect_to(base_url: &str, api_key: String) -> Result<Self, EnrichError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let model = match list_models(&client, &base_url, &api_key).await {
            Ok(catalog) => {
                let available = generate_capable(catalog);
                negotiate::select_model(&available, PREFERRED_MODELS)
                    .ok_or(EnrichError::NoModels)?
            }
            Err(err) => {
                warn!(%err, "could not list provider models, falling back to a fixed name");
                FALLBACK_MODELS[0].to_string()
            }
        };

        info!(%model, "enrichment model selected");
        Ok(Self {
            client,
            base_url,
            api_key,
            model,
        })
    }

    /// Negotiated model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Fetch enrichment for a class label.
    ///
    /// Empty or unparseable replies degrade to the heuristic stub,
    /// transport and provider errors to the error stub; a prediction is
    /// always answerable.
    pub async fn disease_info(&self, label: &str) -> DiseaseInfo {
        match self.generate(&prompt_for(label)).await {
            Ok(text) => parse_disease_info(&text, label),
            Err(err) => {
                warn!(%err, label, "enrichment request failed");
                DiseaseInfo::api_failure(label, &err.to_string())
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, EnrichError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let resp = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EnrichError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateResponse = resp.json().await?;
        Ok(extract_text(reply).unwrap_or_default())
    }
}

/// Fetch the provider's model catalog.
async fn list_models(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
) -> Result<ModelCatalog, EnrichError> {
    let url = format!("{base_url}/models");
    let resp = client.get(&url).header(API_KEY_HEADER, api_key).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(EnrichError::Provider {
            status: status.as_u16(),
            body,
        });
    }

    Ok(resp.json().await?)
}

/// Names of catalog models that support `generateContent`.
fn generate_capable(catalog: ModelCatalog) -> Vec<String> {
    catalog
        .models
        .into_iter()
        .filter(|m| {
            m.supported_generation_methods
                .iter()
                .any(|method| method == "generateContent")
        })
        .map(|m| m.name)
        .collect()
}

/// First non-empty text part across the reply's candidates.
fn extract_text(reply: GenerateResponse) -> Option<String> {
    reply
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .map(|p| p.text)
        .find(|t| !t.trim().is_empty())
        .map(|t| t.trim().to_string())
}

/// Prompt asking for strict-JSON disease information in plain language.
fn prompt_for(label: &str) -> String {
    let is_healthy = is_healthy_label(label);
    format!(
        r#"You are a plant pathology expert. Provide detailed information about the following plant disease/condition: "{label}"

Please provide a JSON response with the following structure:
{{
    "species": "Plant species name (e.g., Tomato, Apple, Corn, etc.)",
    "isHealthy": {is_healthy},
    "description": "A brief 1-2 sentence description of the disease/condition",
    "prevention": ["Prevention method 1", "Prevention method 2", "Prevention method 3", "Prevention method 4", "Prevention method 5", "Prevention method 6"],
    "causes": "Detailed explanation of what causes this disease/problem, including pathogen names if applicable, environmental conditions, and contributing factors"
}}

Important:
- Use simple, everyday words that anyone can understand
- Write prevention methods as clear, actionable steps
- If the condition is healthy, provide general care information in simple terms
- If it is a disease, explain what causes it in plain language
- Provide 4-6 practical prevention methods
- Explain causes in beginner-friendly language, with clear paragraphs
- Return ONLY valid JSON, no markdown formatting or code blocks"#
    )
}
