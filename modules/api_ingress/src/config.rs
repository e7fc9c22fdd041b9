use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_REQUEST_TIMEOUT_SEC: u64 = 30;
const DEFAULT_BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

/// API ingress configuration, read from the `modules.api_ingress` section
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    /// `host:port` to listen on. When unset the server section's host/port is used.
    #[serde(default)]
    pub bind_addr: Option<String>,
    #[serde(default)]
    pub enable_docs: bool,
    #[serde(default)]
    pub cors_enabled: bool,
    #[serde(default)]
    pub request_timeout_sec: Option<u64>,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: None,
            enable_docs: false,
            cors_enabled: false,
            request_timeout_sec: None,
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

impl ApiIngressConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_sec
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SEC),
        )
    }

    /// Fill `bind_addr` from the process-wide host/port unless set explicitly.
    pub fn with_default_bind(mut self, host: &str, port: u16) -> Self {
        if self.bind_addr.as_deref().is_none_or(str::is_empty) {
            self.bind_addr = Some(format!("{host}:{port}"));
        }
        self
    }
}

fn default_body_limit_bytes() -> usize {
    DEFAULT_BODY_LIMIT_BYTES
}
