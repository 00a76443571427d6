use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::errors::AppError;
use crate::models::CustomerRecord;
use crate::services::customers::{apply_filter, CustomerFilter};
use crate::state::AppState;

static DASHBOARD_HTML: &str = include_str!("../web/customers.html");

pub async fn dashboard_page() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/customers
#[derive(Serialize)]
pub struct CustomersResponse {
    active: Vec<CustomerRecord>,
    history: Vec<CustomerRecord>,
    loaded_at: DateTime<Utc>,
}

pub async fn get_customers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(filter): Query<CustomerFilter>,
) -> Result<Json<CustomersResponse>, AppError> {
    check_auth(&headers, &state.config.dashboard_token)?;

    let snapshot = state.directory.reload().await.map_err(|e| {
        tracing::error!(error = %e, "customer dashboard load failed");
        AppError::from(e)
    })?;

    // Filters narrow copies of the projections; the snapshot stays whole.
    Ok(Json(CustomersResponse {
        active: apply_filter(&snapshot.active, &filter),
        history: apply_filter(&snapshot.history, &filter),
        loaded_at: snapshot.loaded_at,
    }))
}

// GET /api/customers/summary
#[derive(Serialize)]
pub struct SummaryResponse {
    active_count: usize,
    history_count: usize,
    loaded_at: DateTime<Utc>,
}

pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    check_auth(&headers, &state.config.dashboard_token)?;

    match state.directory.last_snapshot() {
        Some(snapshot) => Ok(Json(SummaryResponse {
            active_count: snapshot.active.len(),
            history_count: snapshot.history.len(),
            loaded_at: snapshot.loaded_at,
        })
        .into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

// POST /api/customers/:id/checkout
pub async fn check_out_customer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.dashboard_token)?;

    if let Err(e) = state.directory.check_out(id).await {
        tracing::error!(booking_id = id, error = %e, "check-out failed");
        return Err(e.into());
    }

    Ok(Json(serde_json::json!({"ok": true})))
}

// POST /api/customers/:id/hide
#[derive(Deserialize)]
pub struct HideRequest {
    #[serde(default)]
    pub confirm: bool,
}

pub async fn hide_customer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<HideRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.dashboard_token)?;

    if !body.confirm {
        return Err(AppError::ConfirmationRequired);
    }

    if let Err(e) = state.directory.hide_from_owner(id).await {
        tracing::error!(booking_id = id, error = %e, "hide from history failed");
        return Err(e.into());
    }

    Ok(Json(serde_json::json!({"ok": true})))
}

// GET /api/customers/events — SSE stream
#[derive(Deserialize)]
pub struct SseQuery {
    pub token: Option<String>,
}

pub async fn events_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SseQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    // Auth via query param (EventSource can't set headers)
    let token = query.token.as_deref().unwrap_or("");
    if token != state.config.dashboard_token {
        return Err(AppError::Unauthorized);
    }

    let rx = state.events_tx.subscribe();

    let live_stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().data(data).event("directory_event")))
        }
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(_)) => None,
    });

    let keepalive_stream = tokio_stream::StreamExt::map(
        tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(Duration::from_secs(30))),
        |_| Ok(Event::default().comment("keepalive")),
    );

    Ok(Sse::new(StreamExt::merge(live_stream, keepalive_stream)))
}
