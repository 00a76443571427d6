use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub backend_base_url: String,
    pub backend_token: String,
    pub dashboard_token: String,
    pub settle_delay_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            backend_base_url: env::var("BACKEND_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/api".to_string()),
            backend_token: env::var("BACKEND_TOKEN").unwrap_or_default(),
            dashboard_token: env::var("DASHBOARD_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            settle_delay_ms: env::var("SETTLE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),
        }
    }
}
