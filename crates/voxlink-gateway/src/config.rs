//! Gateway configuration, read from the environment once at startup.

/// Settings shared by every handler.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Port to listen on (default `3002`).
    pub listen_port: u16,
    /// Relay worker that enriched payloads are POSTed to.
    pub upstream_url: String,
}

impl GatewayConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable             | Default                  | Description           |
    /// |----------------------|--------------------------|-----------------------|
    /// | `GATEWAY_PORT`       | `3002`                   | HTTP listen port      |
    /// | `RELAY_UPSTREAM_URL` | `http://localhost:8787/` | Relay worker endpoint |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let listen_port = lookup("GATEWAY_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(3002);
        let upstream_url = lookup("RELAY_UPSTREAM_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "http://localhost:8787/".to_string());

        Self {
            listen_port,
            upstream_url,
        }
    }
}
