//! OpenAI-compatible chat completions adapter (OpenAI, LocalAI, Ollama, LM Studio, ...)

use async_trait::async_trait;
use audience_tagger_domain::{
    AudienceClassifier, AudienceLabel, ClassificationRequest, ClassifyError,
};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{
    LlmConfig, SYSTEM_PROMPT, build_classification_prompt, build_http_client, check_status,
    map_transport_error, parse_audience_label,
};

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const VERSIONED_CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const MODELS_PATH: &str = "/models";

pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Classifier speaking the OpenAI chat completions schema
pub struct OpenAiCompatClassifier {
    client: Client,
    api_key: Option<SecretString>,
    endpoint: String,
    config: LlmConfig,
    provider: &'static str,
}

impl OpenAiCompatClassifier {
    pub fn new(config: LlmConfig) -> Result<Self, ClassifyError> {
        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            api_key: None,
            endpoint: normalize_endpoint(OPENAI_ENDPOINT),
            config,
            provider: "openai_compat",
        })
    }

    /// Name reported in logs
    pub fn with_provider_name(mut self, provider: &'static str) -> Self {
        self.provider = provider;
        self
    }

    /// An empty key is treated as no key (self-hosted servers without auth)
    pub fn with_credential(mut self, api_key: SecretString) -> Self {
        self.api_key = if api_key.expose_secret().trim().is_empty() {
            None
        } else {
            Some(api_key)
        };
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = normalize_endpoint(endpoint);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Fully normalised chat completions URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn model(&self) -> &str {
        let model = self.config.model.trim();
        if model.is_empty() {
            DEFAULT_OPENAI_MODEL
        } else {
            model
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {}", key.expose_secret())),
            None => builder,
        }
    }

    async fn call_api(&self, prompt: &str) -> Result<String, ClassifyError> {
        let request = ChatCompletionRequest {
            model: self.model().to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_output_tokens),
        };

        let response = self
            .authorize(self.client.post(&self.endpoint))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = check_status(response, self.provider).await?;

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::InvalidFormat(e.to_string()))?;

        let text = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ClassifyError::InvalidFormat("Empty response".to_string()));
        }

        Ok(text)
    }
}

/// Strip trailing slashes and make sure the URL targets chat completions
///
/// `http://host:8080` becomes `http://host:8080/v1/chat/completions`; a base
/// that already ends in `/v1` only gets `/chat/completions`.
pub fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');

    if trimmed.ends_with(CHAT_COMPLETIONS_PATH) {
        trimmed.to_string()
    } else if trimmed.ends_with("/v1") {
        format!("{}{}", trimmed, CHAT_COMPLETIONS_PATH)
    } else {
        format!("{}{}", trimmed, VERSIONED_CHAT_COMPLETIONS_PATH)
    }
}

/// Models URL on the same base as a normalised chat completions URL
pub fn models_endpoint(chat_endpoint: &str) -> String {
    match chat_endpoint.strip_suffix(CHAT_COMPLETIONS_PATH) {
        Some(base) => format!("{}{}", base, MODELS_PATH),
        None => format!("{}{}", chat_endpoint.trim_end_matches('/'), MODELS_PATH),
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[async_trait]
impl AudienceClassifier for OpenAiCompatClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<AudienceLabel, ClassifyError> {
        let prompt = build_classification_prompt(request);

        match self.call_api(&prompt).await {
            Ok(text) => {
                let label = parse_audience_label(&text);
                tracing::debug!(
                    provider = self.provider,
                    title = %request.title,
                    reply = %text.trim(),
                    label = %label,
                    "Chat completion reply"
                );
                Ok(label)
            }
            Err(e) => {
                tracing::warn!(
                    provider = self.provider,
                    endpoint = %self.endpoint,
                    title = %request.title,
                    error = %e,
                    "Chat completion classification failed"
                );
                Err(e)
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, ClassifyError> {
        let url = models_endpoint(&self.endpoint);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = check_status(response, self.provider).await?;

        let models: ModelsResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::InvalidFormat(e.to_string()))?;

        Ok(models.data.into_iter().map(|m| m.id).collect())
    }

    fn provider(&self) -> &'static str {
        self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_request() -> ClassificationRequest {
        ClassificationRequest {
            title: "Test Movie".to_string(),
            year: Some(2020),
            overview: Some("A test movie".to_string()),
            rating: Some("PG-13".to_string()),
            genres: Some(vec!["Drama".to_string()]),
        }
    }

    fn reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": text } }
            ]
        })
    }

    fn classifier(server: &MockServer) -> OpenAiCompatClassifier {
        OpenAiCompatClassifier::new(LlmConfig::default())
            .unwrap()
            .with_credential(SecretString::from("test-key"))
            .with_endpoint(&server.uri())
            .with_model("local-model")
    }

    #[test]
    fn test_normalize_appends_versioned_path() {
        assert_eq!(
            normalize_endpoint("http://localhost:8080"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_normalize_keeps_complete_endpoint() {
        assert_eq!(
            normalize_endpoint("http://localhost:8080/v1/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_normalize_strips_trailing_slash_first() {
        assert_eq!(
            normalize_endpoint("http://localhost:8080/v1/chat/completions/"),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(
            normalize_endpoint("http://localhost:8080///"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_normalize_versioned_base() {
        assert_eq!(
            normalize_endpoint("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_builder_normalizes_endpoint() {
        let default = OpenAiCompatClassifier::new(LlmConfig::default()).unwrap();
        assert_eq!(
            default.endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );

        let local = default.with_endpoint(" http://localhost:1234/v1/ ");
        assert_eq!(local.endpoint(), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_models_endpoint_substitutes_path() {
        assert_eq!(
            models_endpoint("http://localhost:8080/v1/chat/completions"),
            "http://localhost:8080/v1/models"
        );
    }

    #[tokio::test]
    async fn test_classify_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("Adults.")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let label = classifier(&mock_server)
            .classify(&sample_request())
            .await
            .unwrap();

        assert_eq!(label, AudienceLabel::Adults);
    }

    #[tokio::test]
    async fn test_request_payload_shape() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("kids")))
            .mount(&mock_server)
            .await;

        classifier(&mock_server)
            .classify(&sample_request())
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();

        assert_eq!(body["model"], "local-model");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert!(
            messages[1]["content"]
                .as_str()
                .unwrap()
                .contains("Title: Test Movie")
        );
        assert!(body["temperature"].as_f64().unwrap() <= 0.3);
        assert!(body["max_tokens"].as_u64().unwrap() <= 20);
    }

    #[tokio::test]
    async fn test_no_authorization_header_without_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("teens")))
            .mount(&mock_server)
            .await;

        let classifier = OpenAiCompatClassifier::new(LlmConfig::default())
            .unwrap()
            .with_credential(SecretString::from(""))
            .with_endpoint(&mock_server.uri());

        let label = classifier.classify(&sample_request()).await.unwrap();
        assert_eq!(label, AudienceLabel::Teens);

        let requests = mock_server.received_requests().await.unwrap();
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_classify_api_error_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = classifier(&mock_server).classify(&sample_request()).await;

        assert!(matches!(
            result,
            Err(ClassifyError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_classify_empty_content() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("   ")))
            .mount(&mock_server)
            .await;

        let result = classifier(&mock_server).classify(&sample_request()).await;
        assert!(matches!(result, Err(ClassifyError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_an_error() {
        let classifier = OpenAiCompatClassifier::new(LlmConfig::default())
            .unwrap()
            .with_endpoint("http://127.0.0.1:1");

        let result = classifier.classify(&sample_request()).await;
        assert!(matches!(result, Err(ClassifyError::Api(_))));
    }

    #[tokio::test]
    async fn test_list_models() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [
                    { "id": "llama3", "object": "model" },
                    { "id": "mistral", "object": "model" }
                ]
            })))
            .mount(&mock_server)
            .await;

        let models = classifier(&mock_server).list_models().await.unwrap();
        assert_eq!(models, vec!["llama3", "mistral"]);
    }
}
