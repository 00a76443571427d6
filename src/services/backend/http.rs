use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::StatusCode;
use uuid::Uuid;

use super::BookingBackend;
use crate::models::Booking;

const ACTIVE_FILTERS: &[(&str, &str)] = &[
    ("booking_type", "rental"),
    ("status__in", "confirmed,completed"),
    ("checked_out_at__isnull", "true"),
];

const HISTORY_FILTERS: &[(&str, &str)] = &[
    ("booking_type", "rental"),
    ("checked_out_at__isnull", "false"),
];

pub struct HttpBookingBackend {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpBookingBackend {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Every request carries no-cache headers (the lists are mutated by
    /// sibling transitions, so stale intermediary responses are never
    /// acceptable) and a correlation id for the backend's logs.
    fn decorate(&self, req: reqwest::RequestBuilder, request_id: &Uuid) -> reqwest::RequestBuilder {
        let req = req
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .header("x-request-id", request_id.to_string());
        if self.token.is_empty() {
            req
        } else {
            req.bearer_auth(&self.token)
        }
    }

    async fn get_bookings(&self, filters: &[(&str, &str)]) -> anyhow::Result<Vec<Booking>> {
        let url = format!("{}/bookings/", self.base_url);
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, url, "querying bookings backend");

        let resp = self
            .decorate(self.client.get(&url).query(filters), &request_id)
            .send()
            .await
            .context("failed to reach bookings backend")?;

        let status = resp.status();
        let data: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);

        if !status.is_success() {
            anyhow::bail!("{}", envelope_message(status, &data));
        }

        parse_booking_list(data)
    }

    async fn post_transition(&self, booking_id: i64, action: &str) -> anyhow::Result<()> {
        let url = format!("{}/bookings/{}/{}/", self.base_url, booking_id, action);
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, url, "requesting booking transition");

        let resp = self
            .decorate(self.client.post(&url), &request_id)
            .send()
            .await
            .with_context(|| format!("failed to reach bookings backend for {action}"))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let data: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
        anyhow::bail!("{}", envelope_message(status, &data));
    }
}

/// Prefer the backend's `detail` field, then `message`, then the bare
/// status line.
fn envelope_message(status: StatusCode, data: &serde_json::Value) -> String {
    data["detail"]
        .as_str()
        .or_else(|| data["message"].as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("bookings backend returned {status}"))
}

/// List endpoints serve either a bare array or a paginated
/// `{"results": [...]}` envelope.
fn parse_booking_list(data: serde_json::Value) -> anyhow::Result<Vec<Booking>> {
    let items = if data.is_array() {
        data
    } else if data["results"].is_array() {
        data["results"].clone()
    } else {
        anyhow::bail!("unexpected bookings payload shape");
    };

    serde_json::from_value(items).context("failed to decode booking list")
}

#[async_trait]
impl BookingBackend for HttpBookingBackend {
    async fn fetch_active(&self) -> anyhow::Result<Vec<Booking>> {
        self.get_bookings(ACTIVE_FILTERS).await
    }

    async fn fetch_history(&self) -> anyhow::Result<Vec<Booking>> {
        self.get_bookings(HISTORY_FILTERS).await
    }

    async fn check_out(&self, booking_id: i64) -> anyhow::Result<()> {
        self.post_transition(booking_id, "checkout").await
    }

    async fn hide_from_owner(&self, booking_id: i64) -> anyhow::Result<()> {
        self.post_transition(booking_id, "hide_from_owner").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_prefers_detail_over_message() {
        let data = json!({"detail": "not eligible", "message": "generic"});
        assert_eq!(
            envelope_message(StatusCode::BAD_REQUEST, &data),
            "not eligible"
        );

        let data = json!({"message": "generic"});
        assert_eq!(envelope_message(StatusCode::BAD_REQUEST, &data), "generic");

        let data = json!({});
        assert!(envelope_message(StatusCode::BAD_GATEWAY, &data).contains("502"));
    }

    #[test]
    fn test_parse_booking_list_accepts_both_shapes() {
        let bare = json!([{"id": 1}, {"id": 2}]);
        let parsed = parse_booking_list(bare).unwrap();
        assert_eq!(parsed.len(), 2);

        let paginated = json!({"count": 1, "results": [{"id": 3}]});
        let parsed = parse_booking_list(paginated).unwrap();
        assert_eq!(parsed[0].id, 3);

        assert!(parse_booking_list(json!("nope")).is_err());
    }
}
