use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatProvider, EmbeddingProvider};

// ============================================================================
// Embeddings
// ============================================================================

/// Calls an OpenAI-compatible `/v1/embeddings` endpoint.
pub struct OpenAiEmbeddingProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl OpenAiEmbeddingProvider {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            api_key,
            base_url,
            model,
            client: Client::new(),
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbeddingRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
        };

        let resp = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<EmbeddingResponse>()
            .await?;

        if resp.data.len() != texts.len() {
            return Err(anyhow!(
                "embedding service returned {} vectors for {} inputs",
                resp.data.len(),
                texts.len()
            ));
        }

        Ok(resp.data.into_iter().map(|d| d.embedding).collect())
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}

// ============================================================================
// Chat Completions
// ============================================================================

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint,
/// non-streaming.
pub struct OpenAiChatProvider {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
    client: Client,
}

impl OpenAiChatProvider {
    pub fn new(api_key: String, base_url: String, model: String, temperature: f64) -> Self {
        Self {
            api_key,
            base_url,
            model,
            temperature,
            client: Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[async_trait]
impl ChatProvider for OpenAiChatProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
        };

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("chat completion returned no choices"))?;

        Ok(choice.message.content)
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn embeddings_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "embedding": [0.1, 0.2] },
                    { "embedding": [0.3, 0.4] }
                ]
            })))
            .mount(&server)
            .await;

        let provider = OpenAiEmbeddingProvider::new(
            "test-key".into(),
            server.uri(),
            "text-embedding-3-small".into(),
        );
        let vectors = provider
            .embed(&["one".to_string(), "two".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[tokio::test]
    async fn embeddings_count_mismatch_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [ { "embedding": [0.1] } ]
            })))
            .mount(&server)
            .await;

        let provider = OpenAiEmbeddingProvider::new(
            "test-key".into(),
            server.uri(),
            "text-embedding-3-small".into(),
        );
        let result = provider
            .embed(&["one".to_string(), "two".to_string()])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn chat_completion_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "Rosewick." } }
                ]
            })))
            .mount(&server)
            .await;

        let provider =
            OpenAiChatProvider::new("test-key".into(), server.uri(), "gpt-4o-mini".into(), 0.2);
        let answer = provider.complete("What is the capital?").await.unwrap();
        assert_eq!(answer, "Rosewick.");
    }

    #[tokio::test]
    async fn chat_http_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let provider =
            OpenAiChatProvider::new("test-key".into(), server.uri(), "gpt-4o-mini".into(), 0.2);
        assert!(provider.complete("q").await.is_err());
    }
}
