//! HTTP surface.
//!
//! `/predict` answers HTTP 200 even when the pipeline fails; domain
//! errors travel inside the payload so clients parse one shape.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use leaflife_core::{DiseaseInfo, PredictResponse, ServiceInfo, round_confidence};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;

const GREETING: &str = "LeafLife.ai API is running 🌿";
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .route("/disease-info/{disease_class}", get(disease_info))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: GREETING.to_string(),
        device: state.device.clone(),
        classes: state.classes.len(),
    })
}

async fn predict(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Json<PredictResponse> {
    let image = match read_image_field(multipart).await {
        Ok(bytes) => bytes,
        Err(message) => {
            warn!(%message, "rejecting upload");
            return Json(PredictResponse::failure(&message));
        }
    };

    // The session guard must not be held across the enrichment await.
    let prediction = {
        let mut classifier = state.classifier.lock().await;
        classifier.predict(&image)
    };
    let prediction = match prediction {
        Ok(p) => p,
        Err(err) => {
            warn!(%err, "inference failed");
            return Json(PredictResponse::failure(&err.to_string()));
        }
    };

    let label = &state.classes[prediction.index];
    let info = state.disease_info(label).await;
    Json(PredictResponse::success(
        label,
        round_confidence(prediction.confidence),
        info,
    ))
}

async fn disease_info(
    State(state): State<Arc<AppState>>,
    Path(disease_class): Path<String>,
) -> Json<DiseaseInfo> {
    Json(state.disease_info(&disease_class).await)
}

/// Pull the uploaded image out of a multipart body.
///
/// Accepts the field named `file`, or any field carrying a filename.
/// The error string is user-facing; it ends up in the response payload.
async fn read_image_field(mut multipart: Multipart) -> Result<Vec<u8>, String> {
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let is_file = field.name() == Some("file") || field.file_name().is_some();
                if !is_file {
                    continue;
                }
                return match field.bytes().await {
                    Ok(bytes) if bytes.is_empty() => Err("uploaded file is empty".to_string()),
                    Ok(bytes) => Ok(bytes.to_vec()),
                    Err(err) => Err(format!("could not read upload: {err}")),
                };
            }
            Ok(None) => return Err("no file uploaded".to_string()),
            Err(err) => return Err(format!("invalid multipart body: {err}")),
        }
    }
}
