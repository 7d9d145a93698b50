//! LLM provider adapters

pub mod gemini;
pub mod openai_compat;
pub mod prompt;
pub mod stub;

pub use gemini::GeminiClassifier;
pub use openai_compat::OpenAiCompatClassifier;
pub use prompt::{SYSTEM_PROMPT, build_classification_prompt, parse_audience_label};
pub use stub::StubClassifier;

use audience_tagger_domain::{
    AudienceClassifier, ClassifierFactory, ClassifyError, FactoryError, ProviderConfig,
    ProviderKind, UnknownProvider,
};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request tuning shared by HTTP providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name/ID; blank selects the provider default
    pub model: String,
    /// Sampling temperature, kept low for a one-word answer
    pub temperature: f64,
    /// Output token cap
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.1,
            max_output_tokens: 10,
            timeout_secs: 30,
        }
    }
}

/// Builds classifiers from a [`ProviderConfig`]
#[derive(Debug, Clone, Default)]
pub struct ProviderFactory {
    settings: LlmConfig,
}

impl ProviderFactory {
    pub fn new(settings: LlmConfig) -> Self {
        Self { settings }
    }

    fn build(&self, config: &ProviderConfig) -> Result<Box<dyn AudienceClassifier>, FactoryError> {
        let kind: ProviderKind = config.provider.parse()?;
        let credential = config
            .credential
            .as_ref()
            .map(|c| SecretString::from(c.expose_secret()));
        let client_error = |e: ClassifyError| FactoryError::Client(e.to_string());

        let classifier: Box<dyn AudienceClassifier> = match kind {
            ProviderKind::Gemini => {
                let mut client = GeminiClassifier::new(self.settings.clone()).map_err(client_error)?;
                if let Some(key) = credential {
                    client = client.with_credential(key);
                }
                Box::new(client.with_model(config.model.clone()))
            }
            ProviderKind::OpenAi | ProviderKind::OpenAiCompat => {
                let mut client = OpenAiCompatClassifier::new(self.settings.clone())
                    .map_err(client_error)?
                    .with_provider_name(kind.as_str());
                if let Some(key) = credential {
                    client = client.with_credential(key);
                }
                match config.endpoint.as_deref().map(str::trim) {
                    Some(endpoint) if !endpoint.is_empty() => {
                        client = client.with_endpoint(endpoint);
                    }
                    _ if kind == ProviderKind::OpenAiCompat => {
                        return Err(FactoryError::Client(
                            "OpenAI-compatible endpoint is required".to_string(),
                        ));
                    }
                    _ => {}
                }
                tracing::debug!(provider = %kind, endpoint = client.endpoint(), "Resolved chat completions endpoint");
                Box::new(client.with_model(config.model.clone()))
            }
            ProviderKind::Stub => {
                let stub = StubClassifier::from_model(&config.model).ok_or_else(|| {
                    FactoryError::Client(format!("Unknown stub model: {}", config.model.trim()))
                })?;
                Box::new(stub)
            }
        };

        tracing::debug!(provider = %kind, "Created classifier");
        Ok(classifier)
    }
}

impl ClassifierFactory for ProviderFactory {
    fn create(
        &self,
        config: &ProviderConfig,
    ) -> Result<Box<dyn AudienceClassifier>, FactoryError> {
        self.build(config)
    }
}

/// Error from the model lookup surface
#[derive(Debug, thiserror::Error)]
pub enum ModelLookupError {
    /// The caller named a provider that does not exist
    #[error(transparent)]
    UnknownProvider(#[from] UnknownProvider),
    /// The provider could not be built or the listing call failed
    #[error("Failed to list models: {0}")]
    Listing(String),
}

impl ModelLookupError {
    /// Whether the caller is at fault (as opposed to the backend)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownProvider(_))
    }
}

/// List the model identifiers offered by a provider
pub async fn lookup_models(
    factory: &ProviderFactory,
    provider: &str,
    credential: Option<&str>,
    endpoint: Option<&str>,
) -> Result<Vec<String>, ModelLookupError> {
    let mut config = ProviderConfig::new(provider);
    if let Some(credential) = credential {
        config = config.with_credential(credential);
    }
    if let Some(endpoint) = endpoint {
        config = config.with_endpoint(endpoint);
    }

    let classifier = factory.create(&config).map_err(|e| match e {
        FactoryError::UnknownProvider(e) => ModelLookupError::UnknownProvider(e),
        other => ModelLookupError::Listing(other.to_string()),
    })?;

    classifier.list_models().await.map_err(|e| {
        tracing::warn!(provider = %provider, error = %e, "Model listing failed");
        ModelLookupError::Listing(e.to_string())
    })
}

pub(crate) fn build_http_client(timeout_secs: u64) -> Result<Client, ClassifyError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ClassifyError::Config(format!("Failed to build HTTP client: {}", e)))
}

pub(crate) fn map_transport_error(e: reqwest::Error) -> ClassifyError {
    if e.is_timeout() {
        ClassifyError::Timeout
    } else if e.is_decode() {
        ClassifyError::InvalidFormat(e.to_string())
    } else {
        ClassifyError::Api(e.to_string())
    }
}

/// Pass through success responses; turn anything else into a logged error
pub(crate) async fn check_status(
    response: Response,
    provider: &str,
) -> Result<Response, ClassifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        provider = %provider,
        status = status.as_u16(),
        body = %body,
        "Provider returned error status"
    );

    Err(ClassifyError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use audience_tagger_domain::{AudienceLabel, ClassificationRequest};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_factory_builds_each_known_provider() {
        let factory = ProviderFactory::default();

        let gemini = factory
            .create(&ProviderConfig::new("gemini").with_credential("k"))
            .unwrap();
        assert_eq!(gemini.provider(), "gemini");

        let openai = factory
            .create(&ProviderConfig::new("OpenAI").with_credential("k"))
            .unwrap();
        assert_eq!(openai.provider(), "openai");

        let compat = factory
            .create(&ProviderConfig::new("openai_compat").with_endpoint("http://localhost:8080"))
            .unwrap();
        assert_eq!(compat.provider(), "openai_compat");

        let stub = factory.create(&ProviderConfig::new("stub")).unwrap();
        assert_eq!(stub.provider(), "stub");
    }

    #[tokio::test]
    async fn test_factory_stub_model_selects_mode() {
        let factory = ProviderFactory::default();
        let request = ClassificationRequest {
            title: "Anything".to_string(),
            year: None,
            overview: None,
            rating: Some("G".to_string()),
            genres: None,
        };

        let fixed = factory
            .create(&ProviderConfig::new("stub").with_model("adults"))
            .unwrap();
        assert_eq!(fixed.classify(&request).await.unwrap(), AudienceLabel::Adults);

        let failing = factory
            .create(&ProviderConfig::new("stub").with_model("fail"))
            .unwrap();
        assert!(failing.classify(&request).await.is_err());

        let unknown = factory.create(&ProviderConfig::new("stub").with_model("gpt-4o"));
        assert!(matches!(unknown, Err(FactoryError::Client(_))));
    }

    #[test]
    fn test_factory_rejects_unknown_provider() {
        let result = ProviderFactory::default().create(&ProviderConfig::new("anthropic"));
        assert!(matches!(result, Err(FactoryError::UnknownProvider(_))));
    }

    #[test]
    fn test_factory_requires_endpoint_for_compat() {
        let result = ProviderFactory::default().create(&ProviderConfig::new("openai_compat"));
        assert!(matches!(result, Err(FactoryError::Client(_))));
    }

    #[tokio::test]
    async fn test_factory_pushes_endpoint_model_and_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "content": "kids" } } ]
            })))
            .mount(&mock_server)
            .await;

        let config = ProviderConfig::new("openai_compat")
            .with_credential("secret")
            .with_endpoint(format!("{}/", mock_server.uri()))
            .with_model("tiny");
        let classifier = ProviderFactory::default().create(&config).unwrap();

        let label = classifier
            .classify(&ClassificationRequest {
                title: "Cartoon".to_string(),
                year: None,
                overview: None,
                rating: None,
                genres: None,
            })
            .await
            .unwrap();
        assert_eq!(label, AudienceLabel::Kids);

        let requests = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["model"], "tiny");
        assert_eq!(
            requests[0].headers.get("authorization").unwrap(),
            "Bearer secret"
        );
    }

    #[tokio::test]
    async fn test_lookup_models_unknown_provider_is_client_error() {
        let err = lookup_models(&ProviderFactory::default(), "nope", None, None)
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_lookup_models_listing_failure_is_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let err = lookup_models(
            &ProviderFactory::default(),
            "openai_compat",
            None,
            Some(&mock_server.uri()),
        )
        .await
        .unwrap_err();
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_lookup_models_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [ { "id": "qwen2" } ]
            })))
            .mount(&mock_server)
            .await;

        let models = lookup_models(
            &ProviderFactory::default(),
            "openai_compat",
            Some("key"),
            Some(&mock_server.uri()),
        )
        .await
        .unwrap();
        assert_eq!(models, vec!["qwen2"]);
    }
}
