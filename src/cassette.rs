//! The cassette: record/replay state for one named set of interactions

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::config::{CassetteOptions, Placeholder, RecordMode};
use crate::fingerprint::{fingerprint_recorded, fingerprint_request, short_hex};
use crate::interaction::{Direction, Interaction, Request, Response};
use crate::matchers::{BoundMatcher, MatcherRegistry};
use crate::serializers::{CassetteData, SerializerProxy, SerializerRegistry};
use crate::Result;

/// A named, persistable collection of recorded interactions.
///
/// Construction loads whatever is on disk. Requests are resolved with
/// [`Cassette::find_match`]; captured exchanges are added with
/// [`Cassette::append`] or [`Cassette::record`]; [`Cassette::eject`] redacts
/// placeholders and persists.
#[derive(Debug)]
pub struct Cassette {
    name: String,
    record_mode: RecordMode,
    interactions: Vec<Interaction>,
    match_options: Vec<String>,
    placeholders: Vec<Placeholder>,
    re_record_interval: Option<u64>,
    /// Store contents as first read; `None` until loaded
    serialized: Option<CassetteData>,
    serializer: SerializerProxy,
    matchers: Arc<MatcherRegistry>,
}

impl Cassette {
    /// Open the cassette `name` inside `library_dir` and load its interactions
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the serializer or a matcher is not
    /// registered or the options are invalid, and propagates store I/O and
    /// decoding errors
    pub fn new(
        name: &str,
        library_dir: &Path,
        options: CassetteOptions,
        matchers: Arc<MatcherRegistry>,
        serializers: &SerializerRegistry,
    ) -> Result<Self> {
        options.validate()?;
        let serializer = serializers.require(&options.serialize_with)?;
        matchers.validate(&options.match_requests_on)?;

        let serializer = SerializerProxy::new(
            serializer,
            library_dir,
            name,
            options.record_mode != RecordMode::None,
        )?;

        let mut cassette = Self {
            name: name.to_string(),
            record_mode: options.record_mode,
            interactions: Vec::new(),
            match_options: dedup(options.match_requests_on),
            placeholders: options.placeholders,
            re_record_interval: options.re_record_interval,
            serialized: None,
            serializer,
            matchers,
        };
        cassette.load_interactions()?;

        info!(
            "Loaded cassette {} ({} interactions, mode: {}, recording: {})",
            cassette.name,
            cassette.interactions.len(),
            cassette.record_mode,
            cassette.is_recording()
        );

        Ok(cassette)
    }

    /// Cassette name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing file path
    #[must_use]
    pub fn path(&self) -> &Path {
        self.serializer.path()
    }

    /// Active record mode
    #[must_use]
    pub fn record_mode(&self) -> RecordMode {
        self.record_mode
    }

    /// Change the record mode; writes are disabled only in `none`
    pub fn set_record_mode(&mut self, record_mode: RecordMode) {
        self.record_mode = record_mode;
        self.serializer
            .set_allow_serialization(record_mode != RecordMode::None);
    }

    /// Interactions in match-priority order
    #[must_use]
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Active matcher names, in evaluation order
    #[must_use]
    pub fn match_options(&self) -> &[String] {
        &self.match_options
    }

    /// Replace the active matchers. Order is kept, duplicates are dropped.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any name is not registered; the
    /// previous options stay in place
    pub fn set_match_options<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = dedup(names.into_iter().map(Into::into).collect());
        self.matchers.validate(&names)?;
        self.match_options = names;
        Ok(())
    }

    /// Placeholder rules
    #[must_use]
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    /// Whether the store held no interactions when first loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.serialized.as_ref().map_or(true, CassetteData::is_empty)
    }

    /// Whether new interactions may be captured
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.record_mode.allows_recording(self.is_empty())
    }

    /// Find the first interaction accepted by every active matcher.
    ///
    /// In `all` mode a match is removed from the cassette before it is
    /// returned, so the capture that follows replaces it. With no active
    /// matchers every interaction matches.
    pub fn find_match(&mut self, request: &Request) -> Option<Cow<'_, Interaction>> {
        let fingerprint = short_hex(&fingerprint_request(request));

        let position = {
            let matchers: Vec<BoundMatcher<'_>> = self
                .match_options
                .iter()
                .filter_map(|name| self.matchers.get(name))
                .map(|matcher| BoundMatcher::new(matcher, request))
                .collect();
            self.interactions
                .iter()
                .position(|interaction| interaction.matches(&matchers))
        };

        let Some(index) = position else {
            debug!(
                "No match in {}: {} {} ({})",
                self.name, request.method, request.uri, fingerprint
            );
            return None;
        };

        if self.record_mode == RecordMode::All {
            debug!(
                "Evicting interaction {} from {} for re-recording ({})",
                index, self.name, fingerprint
            );
            return Some(Cow::Owned(self.interactions.remove(index)));
        }

        debug!(
            "Matched {} {} to interaction {} in {} ({})",
            request.method, request.uri, index, self.name, fingerprint
        );
        Some(Cow::Borrowed(&self.interactions[index]))
    }

    /// Rebuild the interaction list from the store, hydrating placeholders.
    ///
    /// The store is read once; later calls reuse that read and discard any
    /// in-memory changes.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read or decoded
    pub fn load_interactions(&mut self) -> Result<()> {
        if self.serialized.is_none() {
            self.serialized = Some(self.serializer.deserialize()?.unwrap_or_default());
        }

        let mut interactions = self
            .serialized
            .as_ref()
            .map(|data| data.http_interactions.clone())
            .unwrap_or_default();

        for interaction in &mut interactions {
            interaction.replace_all(&self.placeholders, Direction::Hydrate);
        }

        self.interactions = interactions;
        Ok(())
    }

    /// Replace every placeholder literal with its tag
    pub fn sanitize_interactions(&mut self) {
        for interaction in &mut self.interactions {
            interaction.replace_all(&self.placeholders, Direction::Redact);
        }
    }

    /// Build the persisted form of a live exchange without storing it
    #[must_use]
    pub fn serialize_interaction(response: &Response, request: &Request) -> Interaction {
        Interaction::capture(request, response)
    }

    /// Add a captured interaction at the lowest match priority
    pub fn append(&mut self, interaction: Interaction) {
        if !self.is_recording() {
            warn!(
                "Appending to {} while not recording (mode: {})",
                self.name, self.record_mode
            );
        }

        debug!(
            "Recorded {} {} in {} ({})",
            interaction.request.method,
            interaction.request.uri,
            self.name,
            short_hex(&fingerprint_recorded(&interaction.request))
        );
        self.interactions.push(interaction);
    }

    /// Capture a live exchange and append it
    pub fn record(&mut self, request: &Request, response: &Response) {
        let interaction = Self::serialize_interaction(response, request);
        self.append(interaction);
    }

    /// Drop every interaction and persist the empty cassette
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written
    pub fn clear(&mut self) -> Result<()> {
        info!("Clearing cassette {}", self.name);
        self.interactions.clear();
        self.save_cassette()
    }

    /// Redact placeholders and persist
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written
    pub fn eject(mut self) -> Result<()> {
        self.save_cassette()?;
        info!(
            "Ejected cassette {} ({} interactions)",
            self.name,
            self.interactions.len()
        );
        Ok(())
    }

    /// Earliest capture time, or now for an empty cassette
    #[must_use]
    pub fn earliest_recorded_date(&self) -> DateTime<Utc> {
        self.interactions
            .iter()
            .map(|interaction| interaction.recorded_at)
            .min()
            .unwrap_or_else(Utc::now)
    }

    /// Whether `re_record_interval` has elapsed since the earliest capture.
    ///
    /// Advisory: nothing in the cassette acts on it.
    #[must_use]
    pub fn needs_re_record(&self, now: DateTime<Utc>) -> bool {
        let Some(interval) = self.re_record_interval else {
            return false;
        };
        if self.interactions.is_empty() {
            return false;
        }

        i64::try_from(interval)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .is_some_and(|interval| now - self.earliest_recorded_date() > interval)
    }

    fn save_cassette(&mut self) -> Result<()> {
        self.sanitize_interactions();
        let data = CassetteData::new(self.interactions.clone());
        self.serializer.serialize(&data)
    }
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}
