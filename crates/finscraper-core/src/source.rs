use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical identifiers for the data sources the scraper knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Yahoo,
    Alphavantage,
    Synthetic,
}

impl SourceId {
    pub const ALL: [Self; 3] = [Self::Yahoo, Self::Alphavantage, Self::Synthetic];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::Alphavantage => "alphavantage",
            Self::Synthetic => "synthetic",
        }
    }

    /// Rank used when no explicit priority is configured. Lower runs first.
    pub const fn default_priority(self) -> u16 {
        match self {
            Self::Yahoo => 0,
            Self::Alphavantage => 10,
            Self::Synthetic => 100,
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "alphavantage" | "alpha_vantage" => Ok(Self::Alphavantage),
            "synthetic" | "mock" => Ok(Self::Synthetic),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

/// Registry entry describing one source adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: SourceId,
    pub priority: u16,
    pub enabled: bool,
    /// Why the source is disabled, or a short capability note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SourceDescriptor {
    pub fn enabled(id: SourceId, priority: u16) -> Self {
        Self {
            id,
            priority,
            enabled: true,
            note: None,
        }
    }

    pub fn disabled(id: SourceId, priority: u16, reason: impl Into<String>) -> Self {
        Self {
            id,
            priority,
            enabled: false,
            note: Some(reason.into()),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
