//! Minimal Cohere REST client: the `generate` and `classify` endpoints.

use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

pub const DEFAULT_BASE_URL: &str = "https://api.cohere.ai/v1";

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop_sequences: &'a [String],
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub generations: Vec<Generation>,
}

#[derive(Debug, Deserialize)]
pub struct Generation {
    #[serde(default)]
    pub text: String,
}

/// Labelled example sent along with a classify request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub text: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyRequest<'a> {
    pub model: &'a str,
    pub inputs: &'a [String],
    #[serde(skip_serializing_if = "no_examples")]
    pub examples: &'a [LabeledExample],
}

fn no_examples(examples: &&[LabeledExample]) -> bool {
    examples.is_empty()
}

#[derive(Debug, Deserialize)]
pub struct ClassifyResponse {
    #[serde(default)]
    pub classifications: Vec<Classification>,
}

#[derive(Debug, Deserialize)]
pub struct Classification {
    #[serde(default)]
    pub prediction: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Shared HTTP handle. `reqwest::Client` pools connections and is safe to
/// use from concurrent tasks.
#[derive(Clone)]
pub struct CohereClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl CohereClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn generate(&self, request: &GenerateRequest<'_>) -> Result<GenerateResponse, BackendError> {
        self.post("generate", request).await
    }

    pub async fn classify(&self, request: &ClassifyRequest<'_>) -> Result<ClassifyResponse, BackendError> {
        self.post("classify", request).await
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/{}", self.base_url, endpoint))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("Cohere {} request failed: {}", endpoint, e);
                if e.is_connect() {
                    BackendError::Unavailable(e.to_string())
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Cohere {} returned {}: {}", endpoint, status, message);
            return Err(status_error(status, message));
        }

        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        debug!(
            "Cohere {} answered in {} ms",
            endpoint,
            start.elapsed().as_millis()
        );

        serde_json::from_str(&text).map_err(|e| BackendError::Malformed(e.to_string()))
    }
}

fn status_error(status: StatusCode, message: String) -> BackendError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BackendError::Unavailable(format!("HTTP {}: {}", status.as_u16(), message))
        }
        _ => BackendError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_wire_format() {
        let stops = vec!["\n".to_string()];
        let request = GenerateRequest {
            model: "ft-model",
            prompt: "Subject: hi",
            max_tokens: 16,
            temperature: 0.0,
            stop_sequences: &stops,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "ft-model");
        assert_eq!(value["max_tokens"], 16);
        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["stop_sequences"][0], "\n");
    }

    #[test]
    fn test_classify_request_omits_empty_examples() {
        let inputs = vec!["Email ID: 1 Subject: a Sender: b Body: c".to_string()];
        let request = ClassifyRequest {
            model: "ft-model",
            inputs: &inputs,
            examples: &[],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("examples").is_none());
        assert_eq!(value["inputs"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_classify_response_tolerates_missing_confidence() {
        let body = r#"{"id": "x", "classifications": [
            {"id": "1", "input": "a", "prediction": "Interview", "confidence": 0.91},
            {"id": "2", "input": "b", "prediction": "Rejected"}
        ]}"#;

        let response: ClassifyResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.classifications.len(), 2);
        assert_eq!(response.classifications[0].confidence, Some(0.91));
        assert_eq!(response.classifications[1].confidence, None);
    }

    #[test]
    fn test_auth_failures_are_outages() {
        assert!(status_error(StatusCode::UNAUTHORIZED, String::new()).is_outage());
        assert!(!status_error(StatusCode::INTERNAL_SERVER_ERROR, String::new()).is_outage());
    }

    fn inputs() -> Vec<String> {
        vec!["Email ID: 1 Subject: a Sender: b Body: c".to_string()]
    }

    #[tokio::test]
    async fn test_post_sends_bearer_token_and_parses_answer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/classify")
            .match_header("authorization", "Bearer secret")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "ft-model",
                "inputs": ["Email ID: 1 Subject: a Sender: b Body: c"]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"classifications": [{"prediction": "Rejected", "confidence": 0.7}]}"#)
            .create_async()
            .await;

        let client = CohereClient::new("secret", format!("{}/", server.url()));
        let inputs = inputs();
        let response = client
            .classify(&ClassifyRequest {
                model: "ft-model",
                inputs: &inputs,
                examples: &[],
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.classifications[0].prediction.as_deref(), Some("Rejected"));
    }

    #[tokio::test]
    async fn test_unauthorized_is_outage() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generate")
            .with_status(401)
            .with_body(r#"{"message": "invalid api token"}"#)
            .create_async()
            .await;

        let client = CohereClient::new("wrong", server.url());
        let stops = vec!["\n".to_string()];
        let err = client
            .generate(&GenerateRequest {
                model: "ft-model",
                prompt: "Subject: hi",
                max_tokens: 16,
                temperature: 0.0,
                stop_sequences: &stops,
            })
            .await
            .unwrap_err();

        assert!(err.is_outage(), "unexpected error: {:?}", err);
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/classify")
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let client = CohereClient::new("secret", server.url());
        let inputs = inputs();
        let err = client
            .classify(&ClassifyRequest {
                model: "ft-model",
                inputs: &inputs,
                examples: &[],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Api { status: 500, ref message } if message == "internal error"));
        assert!(!err.is_outage());
    }

    #[tokio::test]
    async fn test_non_json_answer_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/classify")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let client = CohereClient::new("secret", server.url());
        let inputs = inputs();
        let err = client
            .classify(&ClassifyRequest {
                model: "ft-model",
                inputs: &inputs,
                examples: &[],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_outage() {
        // Nothing listens on port 1
        let client = CohereClient::new("secret", "http://127.0.0.1:1");
        let inputs = inputs();
        let err = client
            .classify(&ClassifyRequest {
                model: "ft-model",
                inputs: &inputs,
                examples: &[],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Unavailable(_)), "unexpected error: {:?}", err);
    }
}
