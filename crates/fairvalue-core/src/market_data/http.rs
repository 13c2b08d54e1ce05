use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::FairValueError;
use crate::FairValueResult;

/// HTTP GET request envelope used by the provider adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }
}

/// HTTP response envelope returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Blocking transport contract shared by the adapters.
pub trait HttpClient: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Fetch a URL and return the body of a 2xx response.
///
/// Transport errors and non-success statuses both map to `DataUnavailable`.
pub fn get_text(client: &dyn HttpClient, request: HttpRequest) -> FairValueResult<String> {
    let url = request.url.clone();
    debug!(url = %url, "http get");
    let response = client
        .execute(request)
        .map_err(|e| FairValueError::DataUnavailable(format!("{url}: {}", e.message())))?;
    if !response.is_success() {
        return Err(FairValueError::DataUnavailable(format!(
            "{url}: provider returned status {}",
            response.status
        )));
    }
    Ok(response.body)
}

/// Production HTTP client backed by `reqwest`'s blocking client.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::blocking::Client,
}

impl ReqwestHttpClient {
    /// Build a client with a cookie store, honouring the configured timeout
    /// and user agent.
    pub fn from_config(config: &ProviderConfig) -> FairValueResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .cookie_store(true)
            .build()
            .map_err(|e| FairValueError::ConfigError(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    /// Create a ReqwestHttpClient with a custom reqwest client.
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder
            .send()
            .map_err(|e| HttpError::new(format!("request failed: {e}")))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| HttpError::new(format!("failed to read body: {e}")))?;
        Ok(HttpResponse { status, body })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubHttpClient;
    use super::*;

    #[test]
    fn test_headers_are_lowercased() {
        let req = HttpRequest::get("http://x").with_header("Referer", "https://a");
        assert_eq!(req.headers.get("referer").map(String::as_str), Some("https://a"));
    }

    #[test]
    fn test_get_text_success() {
        let client = StubHttpClient::default().route("http://x", Ok(HttpResponse::ok("body")));
        assert_eq!(get_text(&client, HttpRequest::get("http://x/a")).unwrap(), "body");
    }

    #[test]
    fn test_get_text_maps_status_to_unavailable() {
        let client = StubHttpClient::default().route(
            "http://x",
            Ok(HttpResponse {
                status: 503,
                body: String::new(),
            }),
        );
        let err = get_text(&client, HttpRequest::get("http://x/a")).unwrap_err();
        assert!(matches!(err, FairValueError::DataUnavailable(ref m) if m.contains("503")));
    }

    #[test]
    fn test_get_text_maps_transport_error() {
        let client =
            StubHttpClient::default().route("http://x", Err(HttpError::new("connection refused")));
        let err = get_text(&client, HttpRequest::get("http://x/a")).unwrap_err();
        assert!(matches!(err, FairValueError::DataUnavailable(ref m) if m.contains("refused")));
    }
}
