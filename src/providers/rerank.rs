use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Reranker;

/// Calls an HTTP cross-encoder rerank service (`/v1/rerank`, the wire
/// shape shared by TEI, Jina, and Voyage-style deployments).
pub struct HttpReranker {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl HttpReranker {
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
struct RerankRequest {
    model: String,
    query: String,
    documents: Vec<String>,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f64,
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn rerank(&self, query: &str, passages: &[String]) -> Result<Vec<f64>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let body = RerankRequest {
            model: self.model.clone(),
            query: query.to_string(),
            documents: passages.to_vec(),
        };

        let resp = self
            .client
            .post(format!("{}/v1/rerank", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<RerankResponse>()
            .await?;

        // Responses come back sorted by score; restore input order.
        let mut scores = vec![0.0; passages.len()];
        for result in resp.results {
            let slot = scores
                .get_mut(result.index)
                .ok_or_else(|| anyhow!("rerank index {} out of range", result.index))?;
            *slot = result.relevance_score;
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn scores_restored_to_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/rerank"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    { "index": 1, "relevance_score": 0.9 },
                    { "index": 0, "relevance_score": 0.2 }
                ]
            })))
            .mount(&server)
            .await;

        let reranker = HttpReranker::new("k".into(), server.uri(), "bge-reranker-base".into());
        let scores = reranker
            .rerank("q", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(scores, vec![0.2, 0.9]);
    }

    #[tokio::test]
    async fn out_of_range_index_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/rerank"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [ { "index": 5, "relevance_score": 0.9 } ]
            })))
            .mount(&server)
            .await;

        let reranker = HttpReranker::new("k".into(), server.uri(), "bge-reranker-base".into());
        assert!(reranker.rerank("q", &["a".to_string()]).await.is_err());
    }

    #[tokio::test]
    async fn empty_passages_skip_the_call() {
        let reranker = HttpReranker::new(
            "k".into(),
            "http://127.0.0.1:1".into(),
            "bge-reranker-base".into(),
        );
        assert!(reranker.rerank("q", &[]).await.unwrap().is_empty());
    }
}
