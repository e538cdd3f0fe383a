//! Recorded request/response pairs and their persisted shape

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::Placeholder;
use crate::matchers::BoundMatcher;
use crate::{ReelError, Result};

/// Header map as persisted: name to every value sent under it
pub type Headers = BTreeMap<String, Vec<String>>;

/// Outgoing HTTP request as handed over by the client integration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method (e.g., "GET", "POST")
    pub method: String,
    /// Absolute request URI
    pub uri: String,
    /// Headers in send order
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Vec<u8>,
}

impl Request {
    /// Create a request with no headers and an empty body
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// HTTP response, either captured live or rebuilt from a cassette
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase
    pub reason: String,
    /// Final URL the response was served from
    pub url: String,
    /// Response headers
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Vec<u8>,
}

impl Response {
    /// Create a response with the canonical reason phrase for `status`
    pub fn new(status: u16) -> Self {
        Self {
            status,
            reason: canonical_reason(status).to_string(),
            url: String::new(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Set the URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

fn canonical_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or_default()
}

/// Persisted body. Text bodies live in `string`, anything else in `base64_string`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedBody {
    /// Character encoding of `string`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// UTF-8 body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
    /// Base64 body for payloads that are not valid UTF-8
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64_string: Option<String>,
}

impl SerializedBody {
    /// Encode raw body bytes
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self {
                encoding: Some("utf-8".to_string()),
                string: Some(text.to_string()),
                base64_string: None,
            },
            Err(_) => Self {
                encoding: None,
                string: None,
                base64_string: Some(STANDARD.encode(bytes)),
            },
        }
    }

    /// Decode back to raw body bytes
    ///
    /// # Errors
    ///
    /// Returns error if `base64_string` is not valid base64
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if let Some(text) = &self.string {
            return Ok(text.as_bytes().to_vec());
        }

        match &self.base64_string {
            Some(encoded) => STANDARD
                .decode(encoded)
                .map_err(|e| ReelError::InvalidFormat(format!("Invalid base64 body: {e}"))),
            None => Ok(Vec::new()),
        }
    }
}

/// Persisted request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedRequest {
    /// HTTP method
    pub method: String,
    /// Absolute request URI
    pub uri: String,
    /// Request headers
    #[serde(default)]
    pub headers: Headers,
    /// Request body
    #[serde(default)]
    pub body: SerializedBody,
}

impl SerializedRequest {
    /// Build the persisted form of a live request
    #[must_use]
    pub fn from_request(request: &Request) -> Self {
        Self {
            method: request.method.clone(),
            uri: request.uri.clone(),
            headers: group_headers(&request.headers),
            body: SerializedBody::from_bytes(&request.body),
        }
    }
}

/// Persisted status line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Status code
    pub code: u16,
    /// Reason phrase
    #[serde(default)]
    pub message: String,
}

/// Persisted response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedResponse {
    /// Status line
    pub status: Status,
    /// Final URL
    #[serde(default)]
    pub url: String,
    /// Response headers
    #[serde(default)]
    pub headers: Headers,
    /// Response body
    #[serde(default)]
    pub body: SerializedBody,
}

impl SerializedResponse {
    /// Build the persisted form of a live response
    #[must_use]
    pub fn from_response(response: &Response) -> Self {
        Self {
            status: Status {
                code: response.status,
                message: response.reason.clone(),
            },
            url: response.url.clone(),
            headers: group_headers(&response.headers),
            body: SerializedBody::from_bytes(&response.body),
        }
    }
}

fn group_headers(headers: &[(String, String)]) -> Headers {
    let mut grouped = Headers::new();
    for (name, value) in headers {
        grouped.entry(name.clone()).or_default().push(value.clone());
    }
    grouped
}

/// Which side of each placeholder rule is searched for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Tag to literal, applied after loading
    Hydrate,
    /// Literal to tag, applied before persisting
    Redact,
}

impl Direction {
    /// Returns `(search, replacement)` for one rule
    #[must_use]
    pub fn terms(self, placeholder: &Placeholder) -> (&str, &str) {
        match self {
            Self::Hydrate => (placeholder.placeholder.as_str(), placeholder.replace.as_str()),
            Self::Redact => (placeholder.replace.as_str(), placeholder.placeholder.as_str()),
        }
    }
}

/// One recorded request/response pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// Recorded request
    pub request: SerializedRequest,
    /// Recorded response
    pub response: SerializedResponse,
    /// Capture time
    #[serde(deserialize_with = "deserialize_recorded_at")]
    pub recorded_at: DateTime<Utc>,
}

/// Parse a capture time. RFC 3339 is preferred; timestamps without an
/// offset are read as UTC.
///
/// # Errors
///
/// Returns error if `text` is neither form
pub fn parse_recorded_at(text: &str) -> Result<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| ReelError::InvalidFormat(format!("Invalid recorded_at {text:?}: {e}")))
}

fn deserialize_recorded_at<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_recorded_at(&text).map_err(serde::de::Error::custom)
}

impl Interaction {
    /// Capture a live exchange, stamped with the current time
    #[must_use]
    pub fn capture(request: &Request, response: &Response) -> Self {
        Self {
            request: SerializedRequest::from_request(request),
            response: SerializedResponse::from_response(response),
            recorded_at: Utc::now(),
        }
    }

    /// True iff every bound matcher accepts the recorded request.
    ///
    /// An empty slice matches everything.
    #[must_use]
    pub fn matches(&self, matchers: &[BoundMatcher<'_>]) -> bool {
        matchers.iter().all(|m| m.matches(&self.request))
    }

    /// Apply every placeholder rule in the given direction
    pub fn replace_all(&mut self, placeholders: &[Placeholder], direction: Direction) {
        for placeholder in placeholders {
            let (search, replacement) = direction.terms(placeholder);
            self.replace(search, replacement);
        }
    }

    /// Textual substitution over the URI, header values, text bodies and URL.
    ///
    /// Base64 bodies are left untouched.
    pub fn replace(&mut self, search: &str, replacement: &str) {
        if search.is_empty() {
            return;
        }

        replace_in(&mut self.request.uri, search, replacement);
        replace_in_headers(&mut self.request.headers, search, replacement);
        replace_in_body(&mut self.request.body, search, replacement);

        replace_in(&mut self.response.url, search, replacement);
        replace_in_headers(&mut self.response.headers, search, replacement);
        replace_in_body(&mut self.response.body, search, replacement);
    }

    /// Rebuild the live response for replay
    ///
    /// # Errors
    ///
    /// Returns error if the stored body cannot be decoded
    pub fn to_response(&self) -> Result<Response> {
        let headers = self
            .response
            .headers
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.clone(), v.clone())))
            .collect();

        Ok(Response {
            status: self.response.status.code,
            reason: self.response.status.message.clone(),
            url: self.response.url.clone(),
            headers,
            body: self.response.body.to_bytes()?,
        })
    }
}

fn replace_in(field: &mut String, search: &str, replacement: &str) {
    if field.contains(search) {
        *field = field.replace(search, replacement);
    }
}

fn replace_in_headers(headers: &mut Headers, search: &str, replacement: &str) {
    for value in headers.values_mut().flatten() {
        replace_in(value, search, replacement);
    }
}

fn replace_in_body(body: &mut SerializedBody, search: &str, replacement: &str) {
    if let Some(text) = body.string.as_mut() {
        replace_in(text, search, replacement);
    }
}
