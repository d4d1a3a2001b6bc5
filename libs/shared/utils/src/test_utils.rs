use chrono::{Duration, Utc};
use serde_json::json;

use shared_config::{AppConfig, StoreBackend};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub appointments_table: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            appointments_table: "appointments".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointing the Supabase store at a mock server.
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            appointments_table: self.appointments_table.clone(),
            store_backend: StoreBackend::Supabase,
            ..AppConfig::local()
        }
    }
}

/// Calendar date `days` from today (UTC), formatted `YYYY-MM-DD`.
pub fn date_in_days(days: i64) -> String {
    (Utc::now() + Duration::days(days)).format("%Y-%m-%d").to_string()
}

pub fn today() -> String {
    date_in_days(0)
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code,
            "details": null,
            "hint": null
        })
    }
}
