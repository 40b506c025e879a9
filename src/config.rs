//! Configuration module for HelioWatch.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;

/// Placeholder backend URL shipped in example configs. Treated as "not configured".
pub const PLACEHOLDER_URL: &str = "https://placeholder.example.com";
/// Placeholder API key shipped in example configs. Treated as "not configured".
pub const PLACEHOLDER_KEY: &str = "placeholder-key";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Base URL of the hosted backend (default: placeholder)
    pub backend_url: String,
    /// Public API key for read-side queries (default: placeholder)
    pub backend_key: String,
    /// Optional privileged key for the ingestion writer.
    pub service_key: Option<String>,
    /// Read-side refresh interval in milliseconds (default: 5000)
    pub refresh_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            backend_url: PLACEHOLDER_URL.to_string(),
            backend_key: PLACEHOLDER_KEY.to_string(),
            service_key: None,
            refresh_ms: 5000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `HELIOWATCH_HTTP_PORT`: HTTP port (default: 8080)
    /// - `HELIOWATCH_BACKEND_URL`: backend endpoint URL
    /// - `HELIOWATCH_BACKEND_KEY`: public API key
    /// - `HELIOWATCH_SERVICE_KEY`: privileged key for administrative writes
    /// - `HELIOWATCH_REFRESH_MS`: dashboard refresh interval in milliseconds
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(port_str) = env::var("HELIOWATCH_HTTP_PORT") {
            if let Ok(port) = port_str.parse() {
                cfg.http_port = port;
            }
        }

        if let Ok(url) = env::var("HELIOWATCH_BACKEND_URL") {
            if !url.is_empty() {
                cfg.backend_url = url;
            }
        }

        if let Ok(key) = env::var("HELIOWATCH_BACKEND_KEY") {
            if !key.is_empty() {
                cfg.backend_key = key;
            }
        }

        if let Ok(key) = env::var("HELIOWATCH_SERVICE_KEY") {
            if !key.is_empty() {
                cfg.service_key = Some(key);
            }
        }

        if let Ok(ms_str) = env::var("HELIOWATCH_REFRESH_MS") {
            if let Ok(ms) = ms_str.parse() {
                cfg.refresh_ms = ms;
            }
        }

        cfg
    }

    /// Whether real backend credentials are present.
    ///
    /// A checked-in placeholder value does not count as configuration, so the
    /// service falls back to demo mode rather than hammering a dead endpoint.
    pub fn is_configured(&self) -> bool {
        !self.backend_url.is_empty()
            && !self.backend_key.is_empty()
            && self.backend_url != PLACEHOLDER_URL
            && self.backend_key != PLACEHOLDER_KEY
    }

    /// Key used for administrative writes, falling back to the public key.
    pub fn write_key(&self) -> &str {
        self.service_key.as_deref().unwrap_or(&self.backend_key)
    }
}
