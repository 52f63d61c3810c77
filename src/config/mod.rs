use std::env;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_env() -> Self {
        match env::var("APP_ENV").unwrap_or_default().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Development,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string. Without one the service runs on in-memory stores.
    pub url: Option<String>,
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection.
    pub connection_timeout: u64,
    /// Force in-memory stores even when a URL is configured.
    pub in_memory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    /// Requests still running after this long have their cancellation token fired.
    pub request_timeout_secs: u64,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub enabled: bool,
}

/// Overwrite `target` with a parsed env var. Unparseable values keep the preset.
fn override_from<T: FromStr>(target: &mut T, var: &str) {
    if let Some(value) = env::var(var).ok().and_then(|v| v.trim().parse().ok()) {
        *target = value;
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = match Environment::from_env() {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Some(url) = env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()) {
            self.database.url = Some(url);
        }
        override_from(&mut self.database.max_connections, "DATABASE_MAX_CONNECTIONS");
        override_from(&mut self.database.connection_timeout, "DATABASE_CONNECTION_TIMEOUT");
        override_from(&mut self.database.in_memory, "DATABASE_IN_MEMORY");

        override_from(&mut self.api.port, "PORT");
        override_from(&mut self.api.port, "API_PORT");
        override_from(&mut self.api.request_timeout_secs, "API_REQUEST_TIMEOUT_SECS");
        override_from(&mut self.api.enable_request_logging, "API_ENABLE_REQUEST_LOGGING");

        override_from(&mut self.security.enable_cors, "SECURITY_ENABLE_CORS");
        if let Ok(origins) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(secret) = env::var("JWT_SECRET") {
            self.security.jwt_secret = secret;
        }
        override_from(&mut self.security.jwt_expiry_hours, "SECURITY_JWT_EXPIRY_HOURS");

        override_from(&mut self.telemetry.enabled, "TELEMETRY_ENABLED");
    }

    /// Whether stores should be in-memory for this run.
    pub fn use_in_memory_stores(&self) -> bool {
        self.database.in_memory || self.database.url.is_none()
    }

    /// Local defaults: in-memory stores, a throwaway JWT secret, permissive local CORS.
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
                in_memory: false,
            },
            api: ApiConfig {
                port: 5000,
                request_timeout_secs: 60,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".into(), "http://localhost:5173".into()],
                jwt_secret: "development-only-secret".into(),
                jwt_expiry_hours: 24 * 7,
            },
            telemetry: TelemetryConfig { enabled: true },
        }
    }

    fn staging() -> Self {
        let dev = Self::development();
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                ..dev.database
            },
            api: ApiConfig {
                port: 8080,
                request_timeout_secs: 30,
                ..dev.api
            },
            security: SecurityConfig {
                cors_origins: Vec::new(),
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                ..dev.security
            },
            telemetry: dev.telemetry,
        }
    }

    fn production() -> Self {
        let staging = Self::staging();
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                ..staging.database
            },
            api: ApiConfig {
                enable_request_logging: false,
                ..staging.api
            },
            security: SecurityConfig {
                jwt_expiry_hours: 4,
                ..staging.security
            },
            telemetry: staging.telemetry,
        }
    }
}

/// Loaded once from the environment on first access.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
