//! Domain models and value objects

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

/// Kind of library item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[default]
    Movie,
    Series,
    Season,
    Episode,
    Folder,
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "series" => Ok(Self::Series),
            "season" => Ok(Self::Season),
            "episode" => Ok(Self::Episode),
            "folder" => Ok(Self::Folder),
            other => Err(format!("Unknown item kind: {}", other)),
        }
    }
}

/// A media item owned by the host library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    #[serde(default)]
    pub kind: ItemKind,
    /// Virtual items (missing episodes, placeholders) are never classified
    #[serde(default)]
    pub is_virtual: bool,
    /// Containing item, if any
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub overview: Option<String>,
    /// Official content rating (e.g. "PG-13")
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Free-form tags, order preserving
    #[serde(default)]
    pub tags: Vec<String>,
}

impl MediaItem {
    /// Create a movie with only a title set
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ItemKind::Movie,
            is_virtual: false,
            parent_id: None,
            title: title.into(),
            year: None,
            overview: None,
            rating: None,
            genres: vec![],
            tags: vec![],
        }
    }

    /// Snapshot the metadata the classifier needs
    pub fn to_request(&self) -> ClassificationRequest {
        ClassificationRequest {
            title: self.title.clone(),
            year: self.year,
            overview: self.overview.clone(),
            rating: self.rating.clone(),
            genres: if self.genres.is_empty() {
                None
            } else {
                Some(self.genres.clone())
            },
        }
    }
}

/// Metadata passed to a classifier for a single item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub title: String,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub rating: Option<String>,
    pub genres: Option<Vec<String>>,
}

/// Target audience classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudienceLabel {
    Kids,
    Teens,
    Adults,
}

impl AudienceLabel {
    pub const ALL: [AudienceLabel; 3] = [Self::Kids, Self::Teens, Self::Adults];

    /// Canonical tag form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kids => "kids",
            Self::Teens => "teens",
            Self::Adults => "adults",
        }
    }

    /// Exact (case-insensitive) match against a tag value
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|label| tag.trim().eq_ignore_ascii_case(label.as_str()))
    }

    /// Whether a tag is one of the three audience labels
    pub fn is_audience_tag(tag: &str) -> bool {
        Self::from_tag(tag).is_some()
    }
}

impl fmt::Display for AudienceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudienceLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| format!("Not an audience label: {}", s))
    }
}

/// Provider selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Google Gemini, fixed endpoint
    Gemini,
    /// OpenAI hosted chat completions
    OpenAi,
    /// Any OpenAI-compatible chat completions server
    OpenAiCompat,
    /// Offline stub
    Stub,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::OpenAiCompat => "openai_compat",
            Self::Stub => "stub",
        }
    }

    /// Whether the caller may supply the endpoint
    pub fn has_configurable_endpoint(&self) -> bool {
        matches!(self, Self::OpenAi | Self::OpenAiCompat)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised provider selector
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "openai_compat" | "openai-compat" | "openaicompatible" => Ok(Self::OpenAiCompat),
            "stub" => Ok(Self::Stub),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// Immutable provider settings used to build one classifier
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Raw provider selector, validated by the factory
    pub provider: String,
    pub credential: Option<SecretString>,
    pub endpoint: Option<String>,
    pub model: String,
}

impl ProviderConfig {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            credential: None,
            endpoint: None,
            model: String::new(),
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(SecretString::from(credential.into()));
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Whether a non-blank credential is present
    pub fn has_credential(&self) -> bool {
        self.credential
            .as_ref()
            .is_some_and(|c| !c.expose_secret().trim().is_empty())
    }
}

/// Configuration snapshot captured at the start of a run
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Master switch for classification
    pub enabled: bool,
    /// Whether a library scan trigger should start a run
    pub run_on_trigger: bool,
    /// Replace existing audience labels instead of skipping the item
    pub overwrite_existing: bool,
    /// Pause between items
    pub delay: Duration,
    /// Which item kind is classified
    pub item_kind: ItemKind,
    pub provider: ProviderConfig,
}

impl RunSettings {
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            enabled: true,
            run_on_trigger: true,
            overwrite_existing: false,
            delay: Self::DEFAULT_DELAY,
            item_kind: ItemKind::Movie,
            provider,
        }
    }
}

/// Outcome of processing one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// A label was obtained and written
    Tagged { label: AudienceLabel },
    /// A label was obtained but the tag set already carried it
    Unchanged { label: AudienceLabel },
    /// Item was not sent to the classifier
    Skipped { reason: String },
    /// No label could be obtained or the item could not be saved
    Failed { error: String },
}

/// Why a run did no work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    TriggerDisabled,
    MissingCredential,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Disabled => "classification is disabled",
            Self::TriggerDisabled => "run on library scan is disabled",
            Self::MissingCredential => "no API key configured",
        };
        f.write_str(text)
    }
}

/// Counters for a finished or cancelled run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Items visited (attempted), whether or not their tags changed
    pub processed: usize,
    pub total: usize,
    pub tagged: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub started_at: OffsetDateTime,
    pub finished_at: OffsetDateTime,
}

/// Result of a classification run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Preconditions were not met; nothing was touched
    NotStarted(SkipReason),
    /// The loop ran to completion or stopped on cancellation
    Finished(RunSummary),
}
