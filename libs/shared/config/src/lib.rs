use std::env;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

/// Which record store backs the appointment service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Supabase,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            "supabase" | "remote" => Ok(StoreBackend::Supabase),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Supabase => write!(f, "supabase"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub app_version: String,
    pub stage: String,
    pub host: String,
    pub port: u16,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: Option<String>,
    pub appointments_table: String,
    pub store_backend: StoreBackend,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let supabase_url = env::var("SUPABASE_URL")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_URL not set, using empty value");
                String::new()
            });
        let supabase_anon_key = env::var("SUPABASE_ANON_PUBLIC_KEY")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                String::new()
            });

        let supabase_configured = !supabase_url.is_empty() && !supabase_anon_key.is_empty();

        let store_backend = match env::var("APPOINTMENT_STORE") {
            Ok(value) => value.parse().unwrap_or_else(|e: String| {
                warn!("{}, falling back to in-memory store", e);
                StoreBackend::Memory
            }),
            Err(_) if supabase_configured => StoreBackend::Supabase,
            Err(_) => {
                warn!("APPOINTMENT_STORE not set and Supabase not configured, using in-memory store");
                StoreBackend::Memory
            }
        };

        let port = match env::var("PORT") {
            Ok(value) => value.parse().unwrap_or_else(|_| {
                warn!("PORT '{}' is not a valid port, using 3000", value);
                3000
            }),
            Err(_) => 3000,
        };

        let config = Self {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "appointment-backend".to_string()),
            app_version: env::var("APP_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            stage: env::var("STAGE").unwrap_or_else(|_| "dev".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            supabase_url,
            supabase_anon_key,
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY").ok().filter(|k| !k.is_empty()),
            appointments_table: env::var("APPOINTMENTS_TABLE")
                .unwrap_or_else(|_| {
                    warn!("APPOINTMENTS_TABLE not set, using default");
                    "appointments".to_string()
                }),
            store_backend,
        };

        if config.store_backend == StoreBackend::Supabase && !config.is_configured() {
            warn!("Supabase store selected but SUPABASE_URL / SUPABASE_ANON_PUBLIC_KEY are missing");
        }

        config
    }

    /// Defaults suitable for running without any environment, backed by the in-memory store.
    pub fn local() -> Self {
        Self {
            app_name: "appointment-backend".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            stage: "dev".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_key: None,
            appointments_table: "appointments".to_string(),
            store_backend: StoreBackend::Memory,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
