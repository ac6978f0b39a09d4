//! Thin adapter around the Chroma REST API (`/api/v1`).
//!
//! Concentrates every Chroma interaction behind a minimal API so the
//! pipeline never builds URLs or parses bodies itself.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use services::http::{join_url, status_and_snippet};
use tracing::{debug, info};

use crate::config::RagConfig;
use crate::errors::RagError;

const COLLECTION_DESCRIPTION: &str = "Chunks ingested from local-chat for future RAG";

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateCollection<'a> {
    name: &'a str,
    metadata: CollectionMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct CollectionMetadata<'a> {
    description: &'a str,
}

/// Column-oriented batch for `POST /collections/{id}/add`.
#[derive(Debug, Default, Serialize)]
pub struct AddRecords {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    pub metadatas: Vec<Value>,
}

impl AddRecords {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A facade over Chroma keeping the rest of the code independent of its wire format.
#[derive(Debug, Clone)]
pub struct ChromaFacade {
    client: reqwest::Client,
    base: String,
    timeout: Option<Duration>,
}

impl ChromaFacade {
    pub fn new(client: reqwest::Client, cfg: &RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;
        Ok(Self {
            client,
            base: cfg.chroma_url.trim_end_matches('/').to_string(),
            timeout: cfg.timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// `GET /api/v1/heartbeat`; only reachability matters.
    pub async fn heartbeat(&self) -> Result<(), RagError> {
        let url = join_url(&self.base, "/api/v1/heartbeat");
        let resp = self.send(self.client.get(&url)).await?;
        if !resp.status().is_success() {
            return Err(self.status_error(resp, url).await);
        }
        debug!("chroma heartbeat ok");
        Ok(())
    }

    /// Returns the id of `name`, creating the collection if it does not exist.
    ///
    /// Only a 404 triggers creation; any other failure status is an error.
    pub async fn resolve_collection(&self, name: &str) -> Result<String, RagError> {
        let url = join_url(&self.base, &format!("/api/v1/collections/{name}"));
        let resp = self.send(self.client.get(&url)).await?;

        match resp.status() {
            s if s.is_success() => {
                let id = Self::collection_id(resp).await?;
                debug!(collection = name, id = %id, "collection exists");
                Ok(id)
            }
            StatusCode::NOT_FOUND => self.create_collection(name).await,
            _ => Err(self.status_error(resp, url).await),
        }
    }

    async fn create_collection(&self, name: &str) -> Result<String, RagError> {
        let url = join_url(&self.base, "/api/v1/collections");
        let body = CreateCollection {
            name,
            metadata: CollectionMetadata {
                description: COLLECTION_DESCRIPTION,
            },
        };
        let resp = self.send(self.client.post(&url).json(&body)).await?;
        if !resp.status().is_success() {
            return Err(self.status_error(resp, url).await);
        }
        let id = Self::collection_id(resp).await?;
        info!(collection = name, id = %id, "collection created");
        Ok(id)
    }

    /// Stores one batch in a single request. Returns the number of records sent.
    pub async fn add(&self, collection_id: &str, records: &AddRecords) -> Result<usize, RagError> {
        let url = join_url(&self.base, &format!("/api/v1/collections/{collection_id}/add"));
        let resp = self.send(self.client.post(&url).json(records)).await?;
        if !resp.status().is_success() {
            return Err(self.status_error(resp, url).await);
        }
        Ok(records.len())
    }

    async fn send(&self, mut req: reqwest::RequestBuilder) -> Result<reqwest::Response, RagError> {
        if let Some(t) = self.timeout {
            req = req.timeout(t);
        }
        req.send().await.map_err(|source| RagError::Connection {
            base: self.base.clone(),
            source,
        })
    }

    async fn status_error(&self, resp: reqwest::Response, url: String) -> RagError {
        let (status, snippet) = status_and_snippet(resp).await;
        RagError::HttpStatus {
            status,
            url,
            snippet,
        }
    }

    async fn collection_id(resp: reqwest::Response) -> Result<String, RagError> {
        let body: CollectionResponse = resp
            .json()
            .await
            .map_err(|e| RagError::Decode(e.to_string()))?;
        body.id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| RagError::Decode("collection response without id".into()))
    }
}
