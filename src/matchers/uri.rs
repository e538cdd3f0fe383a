//! URI normalisation shared by the URI-based matchers

use std::borrow::Cow;

use http::uri::{Authority, Uri};

/// A URI broken into the components matchers compare
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriParts {
    /// Lowercased scheme, empty for relative URIs
    pub scheme: String,
    /// Lowercased host, with the scheme's default port removed
    pub host: String,
    /// Path with a leading slash
    pub path: String,
    /// Decoded query parameters, sorted
    pub query: Vec<(String, String)>,
}

impl UriParts {
    /// Parse a URI. Never fails; input without a scheme, or that `http`
    /// rejects, degrades to a path.
    #[must_use]
    pub fn parse(uri: &str) -> Self {
        let uri = uri.trim();

        match uri.parse::<Uri>() {
            Ok(parsed) if parsed.scheme_str().is_some() => Self::from_absolute(&parsed),
            _ => Self::from_relative(uri),
        }
    }

    fn from_absolute(uri: &Uri) -> Self {
        let scheme = uri.scheme_str().unwrap_or_default().to_ascii_lowercase();
        let host = uri
            .authority()
            .map(|authority| normalize_host(&scheme, authority))
            .unwrap_or_default();

        Self {
            host,
            path: normalize_path(uri.path()),
            query: parse_query(uri.query().unwrap_or_default()),
            scheme,
        }
    }

    fn from_relative(uri: &str) -> Self {
        let uri = uri.split('#').next().unwrap_or_default();
        let (path, query) = uri.split_once('?').unwrap_or((uri, ""));

        Self {
            scheme: String::new(),
            host: String::new(),
            path: normalize_path(path),
            query: parse_query(query),
        }
    }
}

fn normalize_host(scheme: &str, authority: &Authority) -> String {
    let host = authority.host().to_ascii_lowercase();

    let default_port = match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        _ => None,
    };

    match authority.port_u16() {
        Some(port) if Some(port) != default_port => format!("{host}:{port}"),
        _ => host,
    }
}

/// Normalize a URL path
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();

    if trimmed.is_empty() || !trimmed.starts_with('/') {
        format!("/{trimmed}")
    } else {
        trimmed.to_string()
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(key), decode(value))
        })
        .collect();
    params.sort();
    params
}

fn decode(component: &str) -> String {
    let spaced = component.replace('+', " ");
    let decoded = urlencoding::decode(&spaced).map(Cow::into_owned);
    decoded.unwrap_or(spaced)
}
