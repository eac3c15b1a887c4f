use super::AppState;
use super::error::ApiError;
use crate::domain::payment::{Id, Status, TemplateSource, User};
use crate::error::PaymentError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct NewPaymentRequest {
    pub template: TemplateSource,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentStatusEntry {
    pub id: Id,
    pub status: Status,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AllPaymentsResponse {
    pub statuses: Vec<PaymentStatusEntry>,
}

/// Provider notification, reduced to the fields this service acts on.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub object: CheckoutObject,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutObject {
    pub status: String,
    pub metadata: CheckoutMetadata,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutMetadata {
    pub id: String,
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn parse_id(raw: &str) -> Result<Id, ApiError> {
    raw.parse::<Id>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

pub async fn redirect(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, ApiError> {
    let id = parse_id(&id)?;
    let link = state.orchestrator.get_redirect_link(&id).await?;
    tracing::debug!(payment_id = %id, "redirecting");
    Ok(Redirect::temporary(link.as_str()))
}

pub async fn file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let files = state
        .files
        .as_ref()
        .ok_or_else(|| PaymentError::NotFound(format!("file for payment {id}")))?;
    let data = files.get_data(&id).await?;
    tracing::debug!(payment_id = %id, bytes = data.len(), "serving file");
    Ok(([(header::CONTENT_TYPE, "application/pdf")], data))
}

pub async fn mock_checkout(Path(id): Path<String>) -> String {
    format!("mock checkout page for payment {id}")
}

pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<NewPaymentRequest>, JsonRejection>,
) -> Result<String, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let link = state
        .orchestrator
        .create_payment(req.template, req.user)
        .await
        .map_err(|e| match e {
            // A missing template is the caller's mistake here.
            PaymentError::NotFound(msg) => ApiError::BadRequest(msg),
            other => other.into(),
        })?;

    Ok(link.to_string())
}

pub async fn all_payments(
    State(state): State<AppState>,
) -> Result<Json<AllPaymentsResponse>, ApiError> {
    let statuses = state.orchestrator.get_all_payment_statuses().await?;

    let mut statuses: Vec<PaymentStatusEntry> = statuses
        .into_iter()
        .map(|(id, status)| PaymentStatusEntry { id, status })
        .collect();
    statuses.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(Json(AllPaymentsResponse { statuses }))
}

pub async fn payment_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<String, ApiError> {
    let id = parse_id(&id)?;
    let status = state.orchestrator.get_payment_status(&id).await?;
    Ok(status.to_string())
}

pub async fn checkout(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let id = parse_id(&req.object.metadata.id)?;
    let status = req
        .object
        .status
        .parse::<Status>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    // The notification only names the payment; the status comes from the provider.
    let confirmed = state.orchestrator.sync_payment_status(&id).await?;
    if confirmed != status {
        tracing::warn!(
            payment_id = %id,
            notified = %status,
            confirmed = %confirmed,
            "notification disagrees with provider"
        );
    }
    Ok(StatusCode::OK)
}
