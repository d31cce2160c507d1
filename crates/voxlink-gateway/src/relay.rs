//! Payload enrichment and the upstream call.

use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;
use voxlink_models::{Speaker, DEFAULT_CONFIDENCE, KIND_TRANSCRIPT};

use crate::error::GatewayError;

/// Written into every forwarded payload.
pub const SOURCE: &str = "voxlink-gateway";

/// Body of `POST /api/relay`. Unknown fields are kept and forwarded.
#[derive(Debug, Default, Deserialize)]
pub struct RelayRequest {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// RFC 3339 UTC with millisecond precision.
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn present(value: Option<&String>) -> Option<&String> {
    value.filter(|v| !v.is_empty())
}

impl RelayRequest {
    /// Fill in defaults and stamp the payload. Extra fields win over the
    /// generated ones.
    pub fn enrich(self) -> Result<Map<String, Value>, GatewayError> {
        if present(self.transcript.as_ref()).is_none() && present(self.kind.as_ref()).is_none() {
            return Err(GatewayError::MissingFields);
        }

        let mut out = Map::new();
        out.insert(
            "type".into(),
            Value::from(
                present(self.kind.as_ref())
                    .cloned()
                    .unwrap_or_else(|| KIND_TRANSCRIPT.to_string()),
            ),
        );
        if let Some(transcript) = self.transcript {
            out.insert("transcript".into(), Value::from(transcript));
        }
        out.insert(
            "speaker".into(),
            Value::from(
                present(self.speaker.as_ref())
                    .cloned()
                    .unwrap_or_else(|| Speaker::User.to_string()),
            ),
        );
        out.insert(
            "confidence".into(),
            Value::from(
                self.confidence
                    .filter(|c| *c > 0.0)
                    .map_or(DEFAULT_CONFIDENCE, |c| c.min(1.0)),
            ),
        );
        out.insert("timestamp".into(), Value::from(now()));
        out.insert("source".into(), Value::from(SOURCE));
        out.extend(self.extra);
        Ok(out)
    }
}

/// POST the enriched payload upstream and return the response text.
pub async fn forward_upstream(
    http: &reqwest::Client,
    url: &str,
    payload: &Map<String, Value>,
) -> Result<String, GatewayError> {
    let res = http.post(url).json(payload).send().await?;

    let status = res.status();
    let body = res.text().await?;
    if !status.is_success() {
        return Err(GatewayError::UpstreamStatus {
            status: status.as_u16(),
            body,
        });
    }

    info!(%url, %status, "payload forwarded upstream");
    Ok(body)
}
