//! GitHub repository tree retrieval.
//!
//! One bulk Trees API call with `recursive=1` returns the full repository
//! listing. The result is handed to the pipeline as a plain entry sequence;
//! caching lives in the storage layer.

use std::time::Duration;

use reqwest::{Client, StatusCode, header};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Config, RepositoryEntry};

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<RepositoryEntry>,
    #[serde(default)]
    truncated: bool,
}

/// Fetches the repository listing from the GitHub Trees API.
pub struct TreeClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl TreeClient {
    /// Create a configured tree client.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.scanner.user_agent)
            .timeout(Duration::from_secs(config.scanner.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: config.repo.trees_api_url(),
            token: config.scanner.github_token.clone(),
        })
    }

    /// Fetch the full repository tree in a single recursive call.
    pub async fn fetch(&self) -> Result<Vec<RepositoryEntry>> {
        log::info!("Fetching repository tree from {}", self.api_url);

        let mut request = self.client.get(format!("{}?recursive=1", self.api_url));
        if let Some(token) = &self.token {
            request = request.header(header::AUTHORIZATION, format!("token {token}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(AppError::fetch(
                "repository tree",
                "rate limited or access denied",
            ));
        }
        if !status.is_success() {
            return Err(AppError::fetch(
                "repository tree",
                format!("unexpected status {status}"),
            ));
        }

        let body: TreeResponse = response.json().await?;
        if body.truncated {
            log::warn!("Repository tree response was truncated; listing may be incomplete");
        }
        log::info!("Fetched {} tree entries", body.tree.len());
        Ok(body.tree)
    }
}
