use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::HeaderMap,
    response::Html,
};
use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    server::{
        AppState,
        app_error::AppError,
        dashboard::{DashboardView, render_dashboard},
    },
    webhook::{Headers, Timestamp, WebhookRecord, format_timestamp, timestamp_format},
};

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    status: &'static str,
    message: &'static str,
}

#[derive(Serialize, Debug)]
pub struct StatusResponse {
    status: &'static str,
    webhook_count: usize,
    #[serde(serialize_with = "timestamp_format::option::serialize")]
    last_webhook: Option<Timestamp>,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

/// A stored webhook as returned by the listing endpoint.
#[derive(Serialize, Debug)]
pub struct WebhookItem {
    #[serde(with = "timestamp_format")]
    received_at: Timestamp,
    alert_name: String,
    alert_type: String,
    payload: Value,
    headers: Headers,
}

impl From<WebhookRecord> for WebhookItem {
    fn from(record: WebhookRecord) -> Self {
        let alert = record.alert();
        Self {
            received_at: record.received_at,
            alert_name: alert.name,
            alert_type: alert.alert_type,
            payload: record.payload,
            headers: record.headers,
        }
    }
}

/// Renders the dashboard page.
#[axum::debug_handler]
#[instrument(skip(state))]
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let view = DashboardView::new(
        &state.webhook_url,
        state.store.capacity(),
        state.store.snapshot().await,
    );
    Html(render_dashboard(&view))
}

/// Accepts a webhook with any JSON body and stores it.
#[axum::debug_handler]
#[instrument(skip_all)]
pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let body = body?;
    let payload = parse_payload(&body).ok_or(AppError::NoJsonData)?;
    let record = WebhookRecord::from_request(&headers, payload)?;

    let alert = record.alert();
    let received_at = format_timestamp(&record.received_at);
    let content_type = record
        .header("Content-Type")
        .and_then(|values| values.first())
        .cloned()
        .unwrap_or_default();
    state.store.append(record).await;

    info!(
        alert_name = %alert.name,
        alert_type = %alert.alert_type,
        content_type = %content_type,
        "Webhook received at {received_at}"
    );
    Ok(Json(MessageResponse {
        status: "success",
        message: "Webhook received",
    }))
}

/// Returns every retained webhook, newest first.
#[axum::debug_handler]
#[instrument(skip(state))]
pub async fn list_webhooks(State(state): State<Arc<AppState>>) -> Json<Vec<WebhookItem>> {
    let records = state.store.snapshot().await;
    Json(records.into_iter().map(WebhookItem::from).collect())
}

#[axum::debug_handler]
#[instrument(skip(state))]
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let stats = state.store.stats().await;
    Json(StatusResponse {
        status: "running",
        webhook_count: stats.count,
        last_webhook: stats.latest,
    })
}

#[axum::debug_handler]
#[instrument(skip(state))]
pub async fn clear(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    state.store.clear().await;
    info!("Webhooks cleared");
    Json(MessageResponse {
        status: "success",
        message: "Webhooks cleared",
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Local::now().to_rfc3339(),
    })
}

/// Parses the request body, treating blank bodies and `null` as missing.
fn parse_payload(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(body) {
        Ok(Value::Null) | Err(_) => None,
        Ok(payload) => Some(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_payload;

    #[test]
    fn test_parse_payload() {
        assert_eq!(parse_payload(b""), None);
        assert_eq!(parse_payload(b"  \n"), None);
        assert_eq!(parse_payload(b"null"), None);
        assert_eq!(parse_payload(b"{not json"), None);
        assert_eq!(
            parse_payload(br#"{"a": [1, 2]}"#),
            Some(serde_json::json!({"a": [1, 2]}))
        );
        assert_eq!(parse_payload(b"[]"), Some(serde_json::json!([])));
    }
}
