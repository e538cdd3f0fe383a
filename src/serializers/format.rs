//! Logical cassette schema shared by every serializer

use serde::{Deserialize, Serialize};

use crate::interaction::Interaction;

/// Tool stamp written into every cassette
pub const RECORDED_WITH: &str = concat!("reel/", env!("CARGO_PKG_VERSION"));

/// Everything persisted for one cassette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CassetteData {
    /// Interactions in match-priority order
    #[serde(default)]
    pub http_interactions: Vec<Interaction>,
    /// `<tool>/<version>` that wrote the cassette
    #[serde(default)]
    pub recorded_with: String,
}

impl CassetteData {
    /// Wrap interactions, stamped with this crate's version
    #[must_use]
    pub fn new(http_interactions: Vec<Interaction>) -> Self {
        Self {
            http_interactions,
            recorded_with: RECORDED_WITH.to_string(),
        }
    }

    /// Whether no interactions are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.http_interactions.is_empty()
    }
}

impl Default for CassetteData {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
