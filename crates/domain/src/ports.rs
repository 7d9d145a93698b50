//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{
    AudienceLabel, ClassificationRequest, ItemKind, MediaItem, ProviderConfig, UnknownProvider,
};

/// Error type for classifier operations
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("LLM API error: {0}")]
    Api(String),
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Timeout")]
    Timeout,
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Port for LLM-based audience classification
#[async_trait]
pub trait AudienceClassifier: Send + Sync {
    /// Classify a single item
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<AudienceLabel, ClassifyError>;

    /// List model identifiers the backend offers
    async fn list_models(&self) -> Result<Vec<String>, ClassifyError>;

    /// Provider name for logging
    fn provider(&self) -> &'static str;
}

/// Error raised when a classifier cannot be constructed
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error(transparent)]
    UnknownProvider(#[from] UnknownProvider),
    #[error("Failed to build client: {0}")]
    Client(String),
}

/// Port for building a classifier from a configuration snapshot
pub trait ClassifierFactory: Send + Sync {
    fn create(&self, config: &ProviderConfig)
    -> Result<Box<dyn AudienceClassifier>, FactoryError>;
}

/// Error type for item repository operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Item not found: {0}")]
    NotFound(String),
}

/// Filter for fetching candidate items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemQuery {
    pub kind: ItemKind,
    pub recursive: bool,
    pub exclude_virtual: bool,
}

/// Why an item is being written back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateReason {
    MetadataEdit,
}

/// Port for the host's media library
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Fetch items matching the query, in library order
    async fn query(&self, query: ItemQuery) -> Result<Vec<MediaItem>, RepositoryError>;

    /// Persist an item's metadata
    async fn persist(&self, item: &MediaItem, reason: UpdateReason) -> Result<(), RepositoryError>;
}

/// Port receiving run progress as a percentage in [0, 100]
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: f64);
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
