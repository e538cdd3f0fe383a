//! Named request matchers
//!
//! A matcher compares an outgoing request against a recorded one along a
//! single dimension. Cassettes select matchers by name, so the registry is
//! built once and shared by every cassette in a test run.

mod builtin;
mod uri;

use std::collections::HashMap;
use std::fmt;

pub use builtin::{
    BodyMatcher, HeadersMatcher, HostMatcher, MethodMatcher, PathMatcher, QueryMatcher, UriMatcher,
};
pub use uri::UriParts;

use crate::interaction::{Request, SerializedRequest};
use crate::{ReelError, Result};

/// Predicate comparing an outgoing request with a recorded one
pub trait Matcher: Send + Sync {
    /// Name cassettes use to select this matcher
    fn name(&self) -> &str;

    /// Whether `recorded` is equivalent to `request` along this dimension
    fn matches(&self, request: &Request, recorded: &SerializedRequest) -> bool;
}

/// A matcher paired with the request currently being resolved
#[derive(Clone, Copy)]
pub struct BoundMatcher<'a> {
    matcher: &'a dyn Matcher,
    request: &'a Request,
}

impl<'a> BoundMatcher<'a> {
    /// Bind `matcher` to `request`
    pub fn new(matcher: &'a dyn Matcher, request: &'a Request) -> Self {
        Self { matcher, request }
    }

    /// Evaluate against one recorded request
    #[must_use]
    pub fn matches(&self, candidate: &SerializedRequest) -> bool {
        self.matcher.matches(self.request, candidate)
    }

    /// Name of the underlying matcher
    #[must_use]
    pub fn name(&self) -> &str {
        self.matcher.name()
    }
}

impl fmt::Debug for BoundMatcher<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMatcher")
            .field("matcher", &self.matcher.name())
            .field("method", &self.request.method)
            .field("uri", &self.request.uri)
            .finish()
    }
}

/// Mapping from matcher name to matcher
#[derive(Default)]
pub struct MatcherRegistry {
    matchers: HashMap<String, Box<dyn Matcher>>,
}

impl MatcherRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in matcher
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(MethodMatcher);
        registry.register(UriMatcher);
        registry.register(HostMatcher);
        registry.register(PathMatcher);
        registry.register(QueryMatcher);
        registry.register(HeadersMatcher);
        registry.register(BodyMatcher);
        registry
    }

    /// Register a matcher under its own name, replacing any previous one
    pub fn register<M: Matcher + 'static>(&mut self, matcher: M) {
        self.matchers
            .insert(matcher.name().to_string(), Box::new(matcher));
    }

    /// Look up a matcher by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Matcher> {
        self.matchers.get(name).map(AsRef::as_ref)
    }

    /// Whether a matcher is registered under `name`
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.matchers.contains_key(name)
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.matchers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Fail unless every name is registered
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first unknown matcher
    pub fn validate(&self, names: &[String]) -> Result<()> {
        match names.iter().find(|name| !self.contains(name)) {
            Some(unknown) => Err(ReelError::configuration(format!(
                "No matcher registered for {unknown}"
            ))),
            None => Ok(()),
        }
    }

    /// Bind the named matchers, in order, to `request`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a name is not registered
    pub fn bind<'a>(
        &'a self,
        names: &[String],
        request: &'a Request,
    ) -> Result<Vec<BoundMatcher<'a>>> {
        names
            .iter()
            .map(|name| {
                self.get(name)
                    .map(|matcher| BoundMatcher::new(matcher, request))
                    .ok_or_else(|| {
                        ReelError::configuration(format!("No matcher registered for {name}"))
                    })
            })
            .collect()
    }
}

impl fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherRegistry")
            .field("matchers", &self.names())
            .finish()
    }
}
