//! HTTP client for the Ollama REST API.

use crate::domain::model::{
    GenerateRequest, GenerateResponse, Generation, ModelInfo, ModelList, ServerVersion,
};
use crate::domain::ports::InferenceServer;
use crate::utils::error::{VerifyError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

const VERSION_PATH: &str = "/api/version";
const TAGS_PATH: &str = "/api/tags";
const GENERATE_PATH: &str = "/api/generate";

/// Bodies longer than this are cut when quoted in an error.
const MAX_QUOTED_BODY: usize = 200;

pub struct OllamaClient {
    base_url: String,
    client: Client,
}

impl OllamaClient {
    /// `timeout` bounds each whole request, connect included.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?.error_for_status()?;
        tracing::debug!("{} -> {}", url, response.status());

        let body = response.text().await?;
        parse_body(path, &body)
    }
}

fn parse_body<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        tracing::debug!("Could not decode {} body: {}", endpoint, e);
        let mut quoted: String = body.chars().take(MAX_QUOTED_BODY).collect();
        if quoted.len() < body.len() {
            quoted.push_str("...");
        }
        VerifyError::InvalidResponse {
            endpoint: endpoint.to_string(),
            body: quoted,
        }
    })
}

#[async_trait]
impl InferenceServer for OllamaClient {
    async fn version(&self) -> Result<ServerVersion> {
        self.get_json(VERSION_PATH).await
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let list: ModelList = self.get_json(TAGS_PATH).await?;
        Ok(list.models)
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation> {
        let url = self.url(GENERATE_PATH);
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };
        tracing::debug!("POST {} (model {})", url, model);

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        let elapsed = started.elapsed();

        let parsed: GenerateResponse = parse_body(GENERATE_PATH, &body)?;
        tracing::debug!("Generation took {:?}", elapsed);

        Ok(Generation {
            text: parsed.response,
            elapsed,
        })
    }
}
