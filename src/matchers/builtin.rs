//! Built-in matchers

use std::collections::BTreeMap;

use super::{Matcher, UriParts};
use crate::interaction::{Request, SerializedRequest};

/// Compares HTTP methods, ignoring case
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodMatcher;

impl Matcher for MethodMatcher {
    fn name(&self) -> &str {
        "method"
    }

    fn matches(&self, request: &Request, recorded: &SerializedRequest) -> bool {
        request.method.eq_ignore_ascii_case(&recorded.method)
    }
}

/// Compares scheme, host, path and query (parameter order is ignored)
#[derive(Debug, Clone, Copy, Default)]
pub struct UriMatcher;

impl Matcher for UriMatcher {
    fn name(&self) -> &str {
        "uri"
    }

    fn matches(&self, request: &Request, recorded: &SerializedRequest) -> bool {
        UriParts::parse(&request.uri) == UriParts::parse(&recorded.uri)
    }
}

/// Compares hosts
#[derive(Debug, Clone, Copy, Default)]
pub struct HostMatcher;

impl Matcher for HostMatcher {
    fn name(&self) -> &str {
        "host"
    }

    fn matches(&self, request: &Request, recorded: &SerializedRequest) -> bool {
        UriParts::parse(&request.uri).host == UriParts::parse(&recorded.uri).host
    }
}

/// Compares paths
#[derive(Debug, Clone, Copy, Default)]
pub struct PathMatcher;

impl Matcher for PathMatcher {
    fn name(&self) -> &str {
        "path"
    }

    fn matches(&self, request: &Request, recorded: &SerializedRequest) -> bool {
        UriParts::parse(&request.uri).path == UriParts::parse(&recorded.uri).path
    }
}

/// Compares decoded query parameters, ignoring their order
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryMatcher;

impl Matcher for QueryMatcher {
    fn name(&self) -> &str {
        "query"
    }

    fn matches(&self, request: &Request, recorded: &SerializedRequest) -> bool {
        UriParts::parse(&request.uri).query == UriParts::parse(&recorded.uri).query
    }
}

/// Compares headers. Names are case-insensitive, values are trimmed, order is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadersMatcher;

impl Matcher for HeadersMatcher {
    fn name(&self) -> &str {
        "headers"
    }

    fn matches(&self, request: &Request, recorded: &SerializedRequest) -> bool {
        let live = normalize_headers(
            request
                .headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );
        let stored = normalize_headers(recorded.headers.iter().flat_map(|(name, values)| {
            values.iter().map(move |value| (name.as_str(), value.as_str()))
        }));
        live == stored
    }
}

fn normalize_headers<'a>(
    headers: impl Iterator<Item = (&'a str, &'a str)>,
) -> BTreeMap<String, Vec<String>> {
    let mut normalized: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        normalized
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.trim().to_string());
    }
    for values in normalized.values_mut() {
        values.sort();
    }
    normalized
}

/// Compares raw body bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyMatcher;

impl Matcher for BodyMatcher {
    fn name(&self) -> &str {
        "body"
    }

    fn matches(&self, request: &Request, recorded: &SerializedRequest) -> bool {
        recorded
            .body
            .to_bytes()
            .is_ok_and(|body| body == request.body)
    }
}
