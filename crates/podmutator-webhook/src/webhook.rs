//! Pod mutation webhook
//!
//! Handles AdmissionReview requests for Pods and answers with a JSON patch
//! computed from the shared [`MutationConfig`]. Every answer allows the
//! request: when anything goes wrong after the review itself was understood,
//! the Pod is admitted unchanged.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use k8s_openapi::api::core::v1::Pod;
use kube::core::{
    admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation},
    DynamicObject,
};
use podmutator_patch::{plan_mutation, MutationConfig, PodSnapshot};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

/// Kind of the only resource this webhook mutates
pub const POD_KIND: &str = "Pod";

/// Shared state for webhook handlers
#[derive(Clone, Debug)]
pub struct WebhookState {
    /// What to inject, loaded once at startup
    pub config: Arc<MutationConfig>,
}

impl WebhookState {
    /// Create webhook state around a loaded config
    pub fn new(config: MutationConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Error type for requests the webhook cannot interpret
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The body is not JSON
    #[error("failed to parse request body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    /// The body is JSON but not an AdmissionReview with a request
    #[error("invalid admission review: {0}")]
    InvalidReview(String),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

/// Create the webhook router
///
/// - POST /mutate - Mutate Pods
/// - GET /health - Liveness check
pub fn webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/mutate", post(mutate_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Handle `GET /health`
pub async fn health_handler() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

/// Handle `POST /mutate`
///
/// Malformed envelopes are rejected with 400. Anything else, including a Pod
/// that fails to decode, gets an allowing AdmissionReview.
pub async fn mutate_handler(
    State(state): State<Arc<WebhookState>>,
    body: Bytes,
) -> Result<Json<AdmissionReview<DynamicObject>>, WebhookError> {
    let (request, object) = parse_review(&body).map_err(|e| {
        warn!(error = %e, "rejecting admission review");
        e
    })?;

    let response = mutate_pod(&state.config, &request, object);
    Ok(Json(response.into_review()))
}

/// Split a review body into the request envelope and the raw object.
///
/// The object is detached before the envelope is decoded so that a broken
/// Pod cannot make the whole review unreadable.
fn parse_review(
    body: &[u8],
) -> Result<(AdmissionRequest<DynamicObject>, Option<Value>), WebhookError> {
    let mut review: Value = serde_json::from_slice(body).map_err(WebhookError::InvalidBody)?;

    let object = review
        .pointer_mut("/request/object")
        .map(Value::take)
        .filter(|o| !o.is_null());

    let review: AdmissionReview<DynamicObject> =
        serde_json::from_value(review).map_err(|e| WebhookError::InvalidReview(e.to_string()))?;
    let request: AdmissionRequest<DynamicObject> = review
        .try_into()
        .map_err(|e: kube::core::admission::ConvertAdmissionReviewError| {
            WebhookError::InvalidReview(e.to_string())
        })?;

    Ok((request, object))
}

/// Build the admission response for one request
fn mutate_pod(
    config: &MutationConfig,
    request: &AdmissionRequest<DynamicObject>,
    object: Option<Value>,
) -> AdmissionResponse {
    let uid = request.uid.as_str();
    let response = AdmissionResponse::from(request);

    if request.kind.kind != POD_KIND || request.operation != Operation::Create {
        debug!(
            uid = %uid,
            kind = %request.kind.kind,
            operation = ?request.operation,
            "not a pod create, allowing unchanged"
        );
        return response;
    }

    let pod = match decode_pod(object) {
        Ok(pod) => pod,
        Err(e) => {
            warn!(uid = %uid, error = %e, "failed to decode pod, allowing unchanged");
            let mut response = response;
            response.result.message = format!("failed to decode pod: {e}");
            return response;
        }
    };

    let name = pod.metadata.name.as_deref().unwrap_or(request.name.as_str());
    let namespace = pod
        .metadata
        .namespace
        .as_deref()
        .or(request.namespace.as_deref())
        .unwrap_or_default();

    let plan = match plan_mutation(config, PodSnapshot::from(&pod)) {
        Ok(plan) => plan,
        Err(e) => {
            error!(
                uid = %uid,
                pod = %name,
                namespace = %namespace,
                error = %e,
                "failed to build patch, allowing unchanged"
            );
            return response;
        }
    };

    if !plan.selected {
        debug!(
            uid = %uid,
            pod = %name,
            namespace = %namespace,
            "pod does not match selector, not mutating"
        );
        return response;
    }

    if plan.is_empty() {
        debug!(uid = %uid, pod = %name, namespace = %namespace, "pod already up to date");
        return response;
    }

    let fields = plan.fields.join(",");
    let patch_ops = plan.operations.len();
    match response.clone().with_patch(plan.into_patch()) {
        Ok(patched) => {
            info!(
                uid = %uid,
                pod = %name,
                namespace = %namespace,
                fields = %fields,
                patch_ops,
                "patching pod"
            );
            patched
        }
        Err(e) => {
            error!(uid = %uid, error = %e, "failed to serialize patch, allowing unchanged");
            response
        }
    }
}

fn decode_pod(object: Option<Value>) -> Result<Pod, serde_json::Error> {
    match object {
        Some(object) => serde_json::from_value(object),
        None => Err(serde::de::Error::custom("request has no object")),
    }
}
