//! HTTP transport over reqwest.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

use crate::error::ClientError;
use crate::request::{Method, Payload, Request, Response};
use crate::transport::Transport;

/// Timeout for one management request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport that talks to a real management endpoint.
///
/// Deliberately thin: base URL, an optional pre-resolved bearer token, and
/// the default timeout. Anything beyond that (retries, proxies, TLS tuning)
/// is out of scope here.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpTransport {
    /// Creates a transport for `endpoint`, e.g. `http://localhost:8440`.
    pub fn new(endpoint: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(endpoint)
            .map_err(|e| ClientError::Transport(format!("invalid endpoint {endpoint}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Attaches a bearer token sent with every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url_for(&self, request: &Request) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ClientError::Transport("endpoint cannot be a base url".to_string()))?;
            for segment in request.path_segments() {
                segments.push(segment);
            }
        }
        for (key, value) in request.query_pairs() {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }
}

impl Transport for HttpTransport {
    async fn invoke(&self, request: Request) -> Result<Response, ClientError> {
        let url = self.url_for(&request)?;
        debug!(method = request.method().as_str(), url = %url, "management request");

        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
            Method::Patch => reqwest::Method::PATCH,
        };
        let mut builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.payload() {
            Payload::Empty => builder,
            Payload::Json(body) => builder.json(body),
            Payload::Text(body) => builder
                .header(CONTENT_TYPE, "text/plain")
                .body(body.clone()),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !(200..300).contains(&status) {
            let message = if body.is_empty() {
                format!("status {status}")
            } else {
                body
            };
            return Err(ClientError::Api { status, message });
        }

        let payload = if body.is_empty() {
            Payload::Empty
        } else if content_type.starts_with("application/json") {
            serde_json::from_str::<Value>(&body)
                .map(Payload::Json)
                .map_err(|e| ClientError::Decode(format!("invalid json body: {e}")))?
        } else {
            Payload::Text(body)
        };

        Ok(Response { status, payload })
    }
}
