//! Google Gemini API adapter

use async_trait::async_trait;
use audience_tagger_domain::{
    AudienceClassifier, AudienceLabel, ClassificationRequest, ClassifyError,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{
    LlmConfig, build_classification_prompt, build_http_client, check_status, map_transport_error,
    parse_audience_label,
};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Gemini classifier; the endpoint is fixed and the model is part of the path
pub struct GeminiClassifier {
    client: Client,
    api_base: String,
    api_key: Option<SecretString>,
    config: LlmConfig,
}

impl GeminiClassifier {
    pub fn new(config: LlmConfig) -> Result<Self, ClassifyError> {
        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            api_base: GEMINI_API_BASE.to_string(),
            api_key: None,
            config,
        })
    }

    pub fn with_credential(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    #[cfg(test)]
    fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base;
        self
    }

    fn model(&self) -> &str {
        let model = self.config.model.trim();
        if model.is_empty() {
            DEFAULT_GEMINI_MODEL
        } else {
            model
        }
    }

    fn api_key(&self) -> Result<&str, ClassifyError> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ClassifyError::Config("Gemini API key is not set".to_string()))
    }

    async fn call_api(&self, prompt: &str) -> Result<String, ClassifyError> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(self.config.temperature),
                max_output_tokens: Some(self.config.max_output_tokens),
            }),
        };

        // Key travels in a header, not the query string
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key()?)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = check_status(response, "gemini").await?;

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::InvalidFormat(e.to_string()))?;

        let text = api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ClassifyError::InvalidFormat("Empty response".to_string()));
        }

        Ok(text)
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "generationConfig")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "maxOutputTokens")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    name: String,
    #[serde(default, rename = "supportedGenerationMethods")]
    supported_generation_methods: Vec<String>,
}

#[async_trait]
impl AudienceClassifier for GeminiClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<AudienceLabel, ClassifyError> {
        let prompt = build_classification_prompt(request);

        match self.call_api(&prompt).await {
            Ok(text) => {
                let label = parse_audience_label(&text);
                tracing::debug!(title = %request.title, reply = %text.trim(), label = %label, "Gemini reply");
                Ok(label)
            }
            Err(e) => {
                tracing::warn!(title = %request.title, error = %e, "Gemini classification failed");
                Err(e)
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, ClassifyError> {
        let url = format!("{}/models", self.api_base);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", self.api_key()?)
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = check_status(response, "gemini").await?;

        let models: ModelsResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::InvalidFormat(e.to_string()))?;

        Ok(models
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods.is_empty()
                    || m
                        .supported_generation_methods
                        .iter()
                        .any(|method| method == "generateContent")
            })
            .map(|m| {
                m.name
                    .strip_prefix("models/")
                    .map(str::to_string)
                    .unwrap_or(m.name)
            })
            .collect())
    }

    fn provider(&self) -> &'static str {
        "gemini"
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
            genres: None,
        }
    }

    fn classifier(server: &MockServer) -> GeminiClassifier {
        GeminiClassifier::new(LlmConfig::default())
            .unwrap()
            .with_credential(SecretString::from("test-key"))
            .with_model("gemini-test")
            .with_api_base(server.uri())
    }

    fn reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": text } ], "role": "model" } }
            ]
        })
    }

    #[tokio::test]
    async fn test_classify_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("Teens\n")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let label = classifier(&mock_server)
            .classify(&sample_request())
            .await
            .unwrap();

        assert_eq!(label, AudienceLabel::Teens);
    }

    #[tokio::test]
    async fn test_key_is_not_sent_in_query_and_prompt_is_single_block() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("kids")))
            .mount(&mock_server)
            .await;

        classifier(&mock_server)
            .classify(&sample_request())
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.query().is_none());

        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        let text = contents[0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("Title: Test Movie"));
        assert!(text.contains("Content rating: PG-13"));
    }

    #[tokio::test]
    async fn test_classify_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = classifier(&mock_server).classify(&sample_request()).await;

        assert!(matches!(
            result,
            Err(ClassifyError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_classify_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let result = classifier(&mock_server).classify(&sample_request()).await;
        assert!(matches!(result, Err(ClassifyError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_classify_without_candidates_is_empty_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&mock_server)
            .await;

        let result = classifier(&mock_server).classify(&sample_request()).await;
        assert!(matches!(result, Err(ClassifyError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_classify_without_key_fails_before_request() {
        let mock_server = MockServer::start().await;

        let classifier = GeminiClassifier::new(LlmConfig::default())
            .unwrap()
            .with_api_base(mock_server.uri());

        let result = classifier.classify(&sample_request()).await;
        assert!(matches!(result, Err(ClassifyError::Config(_))));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_models() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [
                    { "name": "models/gemini-2.0-flash", "supportedGenerationMethods": ["generateContent", "countTokens"] },
                    { "name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"] },
                    { "name": "models/gemini-1.5-pro" }
                ]
            })))
            .mount(&mock_server)
            .await;

        let models = classifier(&mock_server).list_models().await.unwrap();
        assert_eq!(models, vec!["gemini-2.0-flash", "gemini-1.5-pro"]);
    }

    #[tokio::test]
    async fn test_list_models_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let result = classifier(&mock_server).list_models().await;
        assert!(matches!(
            result,
            Err(ClassifyError::Status { status: 403, .. })
        ));
    }
}
