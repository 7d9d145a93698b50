//! Stub classifier for testing and offline mode

use async_trait::async_trait;
use audience_tagger_domain::{
    AudienceClassifier, AudienceLabel, ClassificationRequest, ClassifyError,
};

/// Stub classifier that never touches the network
pub struct StubClassifier {
    mode: StubMode,
}

enum StubMode {
    Fixed(AudienceLabel),
    Failing(String),
    FromRating,
}

/// Model names the stub understands, in listing order
const STUB_MODELS: [&str; 5] = ["rating", "kids", "teens", "adults", "fail"];

impl StubClassifier {
    /// Always answer with the same label
    pub fn fixed(label: AudienceLabel) -> Self {
        Self {
            mode: StubMode::Fixed(label),
        }
    }

    /// Always fail with an API error
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            mode: StubMode::Failing(message.into()),
        }
    }

    /// Guess from the content rating, falling back to adults
    pub fn from_rating() -> Self {
        Self {
            mode: StubMode::FromRating,
        }
    }

    /// Select a mode by model name: blank or `rating` guesses from the
    /// rating, a label name always answers that label, `fail` always fails
    pub fn from_model(model: &str) -> Option<Self> {
        let model = model.trim().to_ascii_lowercase();
        match model.as_str() {
            "" | "rating" => Some(Self::from_rating()),
            "fail" => Some(Self::failing("stub model configured to fail")),
            other => other.parse::<AudienceLabel>().ok().map(Self::fixed),
        }
    }
}

impl Default for StubClassifier {
    fn default() -> Self {
        Self::from_rating()
    }
}

fn label_for_rating(rating: Option<&str>) -> AudienceLabel {
    let Some(rating) = rating else {
        return AudienceLabel::Adults;
    };

    match rating.trim().to_ascii_uppercase().as_str() {
        "G" | "TV-Y" | "TV-Y7" | "TV-G" | "U" => AudienceLabel::Kids,
        "PG" | "PG-13" | "TV-PG" | "TV-14" | "12" | "12A" => AudienceLabel::Teens,
        _ => AudienceLabel::Adults,
    }
}

#[async_trait]
impl AudienceClassifier for StubClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<AudienceLabel, ClassifyError> {
        match &self.mode {
            StubMode::Fixed(label) => Ok(*label),
            StubMode::Failing(message) => Err(ClassifyError::Api(message.clone())),
            StubMode::FromRating => Ok(label_for_rating(request.rating.as_deref())),
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, ClassifyError> {
        Ok(STUB_MODELS.iter().map(|m| m.to_string()).collect())
    }

    fn provider(&self) -> &'static str {
        "stub"
    }
}
