use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::provider::{EmbeddingConfig, EmbeddingProvider};
use crate::error::{AiError, Result};
use crate::http_client::build_http_client;
use crate::llm::DEFAULT_BASE_URL;
use crate::llm::retry::response_to_error;

pub struct OpenAIEmbedding {
    client: Client,
    api_key: String,
    base_url: String,
    config: EmbeddingConfig,
}

impl OpenAIEmbedding {
    pub fn new(api_key: impl Into<String>, model: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| "text-embedding-3-small".to_string());
        let dimension = match model.as_str() {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536,
        };

        Self::with_config(
            api_key,
            EmbeddingConfig {
                model,
                dimension,
                ..EmbeddingConfig::default()
            },
        )
    }

    pub fn with_config(api_key: impl Into<String>, config: EmbeddingConfig) -> Self {
        Self {
            client: build_http_client(Some(Duration::from_secs(config.timeout_secs))),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            config,
        }
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(response_to_error(response, "OpenAI").await);
        }

        let data: EmbeddingResponse = response.json().await?;
        if data.data.len() != texts.len() {
            return Err(AiError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                data.data.len()
            )));
        }

        let mut sorted = data.data;
        sorted.sort_by_key(|d| d.index);
        Ok(sorted.into_iter().map(|d| d.embedding).collect())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbedding {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.config.batch_size.max(1)) {
            embeddings.extend(self.embed_chunk(chunk).await?);
        }
        tracing::debug!(
            model = %self.config.model,
            count = embeddings.len(),
            "Embedded document batch"
        );
        Ok(embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_chunk(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AiError::Embedding("No embedding returned".to_string()))
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_embed_documents_restores_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"embedding": [0.0, 1.0], "index": 1},
                    {"embedding": [1.0, 0.0], "index": 0}
                ]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAIEmbedding::new("k", None).with_base_url(server.uri());
        let vectors = embedder
            .embed_documents(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_embed_documents_splits_batches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"embedding": [0.5, 0.5], "index": 0}]
            })))
            .expect(3)
            .mount(&server)
            .await;

        let embedder = OpenAIEmbedding::with_config(
            "k",
            EmbeddingConfig {
                dimension: 2,
                batch_size: 1,
                ..EmbeddingConfig::default()
            },
        )
        .with_base_url(server.uri());
        let texts: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let vectors = embedder.embed_documents(&texts).await.unwrap();
        assert_eq!(vectors.len(), 3);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let embedder = OpenAIEmbedding::new("k", None).with_base_url(server.uri());
        let err = embedder.embed_query("q").await.unwrap_err();
        assert!(matches!(err, AiError::Embedding(_)));
    }
}
