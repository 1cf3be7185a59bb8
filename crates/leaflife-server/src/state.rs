use anyhow::Context;
use leaflife_ai::{Checkpoint, LeafClassifier, resolve_classes};
use leaflife_core::DiseaseInfo;
use leaflife_enrich::GeminiClient;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::Args;

const CHECKPOINT_FILE: &str = "model.safetensors";
const GRAPH_FILE: &str = "model.onnx";

/// Everything the handlers share. The session takes `&mut self` to
/// run, so it sits behind a [`Mutex`].
pub struct AppState {
    pub classes: Vec<String>,
    pub classifier: Mutex<LeafClassifier>,
    pub device: String,
    gemini: Option<GeminiClient>,
}

impl AppState {
    /// Resolve the class list, load the model, and connect enrichment.
    ///
    /// A missing checkpoint, an unresolvable class list, or a head that
    /// contradicts it aborts startup. Enrichment never does; it
    /// degrades to stub responses instead.
    pub async fn start(args: &Args) -> anyhow::Result<Self> {
        let checkpoint_path = args.model_dir.join(CHECKPOINT_FILE);
        let graph_path = args.model_dir.join(GRAPH_FILE);

        let checkpoint = Checkpoint::open(&checkpoint_path)
            .with_context(|| format!("loading checkpoint {}", checkpoint_path.display()))?;
        let resolved = resolve_classes(Some(&args.train_dir), &checkpoint)?;
        info!(
            count = resolved.names.len(),
            source = ?resolved.source,
            "class list resolved"
        );

        let classifier = LeafClassifier::load(&graph_path, resolved.names.len())
            .with_context(|| format!("loading model graph {}", graph_path.display()))?;
        let device = classifier.device().to_string();
        info!(%device, "model session ready");

        let gemini = match args.gemini_api_key.clone() {
            Some(key) => match GeminiClient::connect(key).await {
                Ok(client) => Some(client),
                Err(err) => {
                    warn!(%err, "could not set up Gemini, disease info will be stubbed");
                    None
                }
            },
            None => {
                warn!("GEMINI_API_KEY not set, disease info will be stubbed");
                None
            }
        };

        Ok(Self {
            classes: resolved.names,
            classifier: Mutex::new(classifier),
            device,
            gemini,
        })
    }

    /// Enrichment for a class label, stubbed when no client is
    /// configured.
    pub async fn disease_info(&self, label: &str) -> DiseaseInfo {
        match &self.gemini {
            Some(client) => client.disease_info(label).await,
            None => DiseaseInfo::not_configured(label),
        }
    }
}
