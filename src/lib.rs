//! Reel - record/replay cassettes for HTTP interactions in test suites
//!
//! The first run of a test records real request/response pairs into a
//! named cassette; later runs answer the same requests from the cassette.

#![deny(unsafe_code)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::multiple_crate_versions
)]

pub mod cassette;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod interaction;
pub mod matchers;
pub mod serializers;

pub use cassette::Cassette;
pub use config::{CassetteOptions, LibraryConfig, Placeholder, RecordMode};
pub use error::{ReelError, Result};
pub use interaction::{Interaction, Request, Response};
pub use matchers::{Matcher, MatcherRegistry};
pub use serializers::{Serializer, SerializerRegistry};
