//! HTTPS implementation of the probe ports.

use crate::{RegistrationProbe, ServerDiscovery, UserInteractiveFlows};
use async_trait::async_trait;
use bulwark_core::ServerName;
use bulwark_error::{ProbeError, ProbeErrorKind};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

const AUTH_METADATA_PATH: &str = "/_matrix/client/unstable/org.matrix.msc2965/auth_metadata";
const REGISTER_PATH: &str = "/_matrix/client/v3/register";
const WELL_KNOWN_PATH: &str = "/.well-known/matrix/client";

const M_UNRECOGNIZED: &str = "M_UNRECOGNIZED";
const M_FORBIDDEN: &str = "M_FORBIDDEN";

/// Base URL used when discovery yields nothing usable.
pub fn fallback_base_url(server: &ServerName) -> String {
    format!("https://{}", server)
}

#[derive(Debug, Deserialize)]
struct WellKnown {
    #[serde(rename = "m.homeserver")]
    homeserver: Option<WellKnownHomeserver>,
}

#[derive(Debug, Deserialize)]
struct WellKnownHomeserver {
    #[serde(default)]
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct MatrixErrorBody {
    errcode: Option<String>,
    #[serde(default)]
    error: String,
}

/// Probe client speaking the client-server API over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpProbeClient {
    client: Client,
    well_known_scheme: &'static str,
}

impl HttpProbeClient {
    /// Creates a client sending `user_agent` with every request.
    #[instrument]
    pub fn new(user_agent: &str) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProbeError::new(ProbeErrorKind::Transport(e.to_string())))?;
        debug!("Created HTTP probe client");
        Ok(Self {
            client,
            well_known_scheme: "https",
        })
    }

    /// Wraps an existing `reqwest` client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            well_known_scheme: "https",
        }
    }

    /// Fetches `.well-known` documents over plain HTTP. Only useful against local test servers.
    pub fn with_insecure_discovery(mut self) -> Self {
        self.well_known_scheme = "http";
        self
    }

    fn endpoint(base_url: &str, path: &str) -> Result<Url, ProbeError> {
        let joined = format!("{}{}", base_url.trim_end_matches('/'), path);
        Url::parse(&joined)
            .map_err(|e| ProbeError::new(ProbeErrorKind::InvalidBaseUrl(format!("{joined}: {e}"))))
    }

    /// Turns a non-success response into a classified error.
    fn classify(status: StatusCode, body: &str) -> ProbeError {
        let parsed: MatrixErrorBody = serde_json::from_str(body).unwrap_or_default();
        match parsed.errcode.as_deref() {
            Some(M_UNRECOGNIZED) => ProbeError::new(ProbeErrorKind::Unrecognized),
            Some(M_FORBIDDEN) => ProbeError::new(ProbeErrorKind::Forbidden),
            None if status == StatusCode::NOT_FOUND => ProbeError::new(ProbeErrorKind::Unrecognized),
            _ => ProbeError::new(ProbeErrorKind::Http {
                status: status.as_u16(),
                errcode: parsed.errcode,
                message: if parsed.error.is_empty() {
                    body.chars().take(200).collect()
                } else {
                    parsed.error
                },
            }),
        }
    }
}

#[async_trait]
impl ServerDiscovery for HttpProbeClient {
    #[instrument(skip(self), fields(server = %server))]
    async fn discover(&self, server: &ServerName) -> Result<Option<String>, ProbeError> {
        let url = format!("{}://{}{}", self.well_known_scheme, server, WELL_KNOWN_PATH);
        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(error = %e, "Well-known request failed");
            ProbeError::new(ProbeErrorKind::Discovery(e.to_string()))
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "No usable well-known document");
            return Ok(None);
        }

        let text = response
            .text()
            .await
            .map_err(|e| ProbeError::new(ProbeErrorKind::Discovery(e.to_string())))?;
        let base_url = serde_json::from_str::<WellKnown>(&text)
            .ok()
            .and_then(|doc| doc.homeserver)
            .map(|hs| hs.base_url)
            .filter(|base_url| !base_url.is_empty());
        debug!(?base_url, "Discovered client API base URL");
        Ok(base_url)
    }
}

#[async_trait]
impl RegistrationProbe for HttpProbeClient {
    #[instrument(skip(self))]
    async fn auth_metadata(&self, base_url: &str) -> Result<(), ProbeError> {
        let url = Self::endpoint(base_url, AUTH_METADATA_PATH)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::new(ProbeErrorKind::Transport(e.to_string())))?;

        let status = response.status();
        if status.is_success() {
            debug!("Server publishes auth metadata");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(Self::classify(status, &body))
    }

    #[instrument(skip(self))]
    async fn register(&self, base_url: &str) -> Result<Option<UserInteractiveFlows>, ProbeError> {
        let url = Self::endpoint(base_url, REGISTER_PATH)?;
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| ProbeError::new(ProbeErrorKind::Transport(e.to_string())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProbeError::new(ProbeErrorKind::Transport(e.to_string())))?;

        if status.is_success() {
            debug!(%status, "Registration completed without interactive auth");
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED {
            let flows: UserInteractiveFlows = serde_json::from_str(&body).map_err(|e| {
                ProbeError::new(ProbeErrorKind::InvalidResponse(format!(
                    "Failed to parse interactive auth response: {e}"
                )))
            })?;
            debug!(flows = flows.flows().len(), "Server offered interactive auth flows");
            return Ok(Some(flows));
        }
        Err(Self::classify(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_unrecognized_errcode() {
        let err = HttpProbeClient::classify(
            StatusCode::BAD_REQUEST,
            r#"{"errcode":"M_UNRECOGNIZED","error":"Unrecognized request"}"#,
        );
        assert!(err.is_unrecognized());
    }

    #[test]
    fn test_classify_plain_not_found() {
        let err = HttpProbeClient::classify(StatusCode::NOT_FOUND, "<html>nope</html>");
        assert!(err.is_unrecognized());
    }

    #[test]
    fn test_classify_forbidden() {
        let err = HttpProbeClient::classify(
            StatusCode::FORBIDDEN,
            r#"{"errcode":"M_FORBIDDEN","error":"Registration has been disabled"}"#,
        );
        assert!(err.is_forbidden());
    }

    #[test]
    fn test_classify_other_status() {
        let err = HttpProbeClient::classify(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"errcode":"M_LIMIT_EXCEEDED","error":"Too many requests"}"#,
        );
        assert_eq!(
            err.kind(),
            &ProbeErrorKind::Http {
                status: 429,
                errcode: Some("M_LIMIT_EXCEEDED".to_string()),
                message: "Too many requests".to_string(),
            }
        );
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let url = HttpProbeClient::endpoint("https://matrix.example.org/", REGISTER_PATH).unwrap();
        assert_eq!(
            url.as_str(),
            "https://matrix.example.org/_matrix/client/v3/register"
        );
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        let err = HttpProbeClient::endpoint("not a url", REGISTER_PATH).unwrap_err();
        assert!(matches!(err.kind(), ProbeErrorKind::InvalidBaseUrl(_)));
    }
}
