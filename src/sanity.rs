use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use tracing::debug;
use url::Url;

use crate::config::SanitySettings;
use crate::types::SanityDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    File,
}

impl AssetKind {
    /// Path segment of the assets endpoint.
    fn endpoint(self) -> &'static str {
        match self {
            AssetKind::Image => "images",
            AssetKind::File => "files",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Image => f.write_str("image"),
            AssetKind::File => f.write_str("file"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub kind: AssetKind,
    pub data: Bytes,
    pub filename: String,
    pub content_type: Option<String>,
}

/// What `createOrReplace` did to the target document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOperation {
    Created,
    Replaced,
    Unknown(String),
}

impl UpsertOperation {
    fn from_api(s: &str) -> Self {
        match s {
            "create" => UpsertOperation::Created,
            "update" => UpsertOperation::Replaced,
            other => UpsertOperation::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for UpsertOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertOperation::Created => f.write_str("created"),
            UpsertOperation::Replaced => f.write_str("replaced"),
            UpsertOperation::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// Write side of the migration.
#[async_trait]
pub trait DestinationApi: Send + Sync {
    /// Upload raw bytes and return the new asset document id.
    async fn upload_asset(&self, upload: AssetUpload) -> Result<String>;
    /// Create the document, or fully replace an existing one with the same `_id`.
    async fn create_or_replace(&self, doc: &SanityDocument) -> Result<UpsertOperation>;
}

#[derive(Deserialize)]
struct AssetResponse {
    document: AssetDocument,
}

#[derive(Deserialize)]
struct AssetDocument {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Deserialize)]
struct MutateResponse {
    #[serde(default)]
    results: Vec<MutateResult>,
}

#[derive(Deserialize)]
struct MutateResult {
    #[serde(default)]
    operation: Option<String>,
}

pub struct SanityClient {
    http: reqwest::Client,
    base: Url,
    api_version: String,
    dataset: String,
}

impl SanityClient {
    pub fn new(project_id: &str, dataset: &str, token: &str, settings: &SanitySettings) -> Result<Self> {
        let host = match &settings.api_host {
            Some(h) => h.clone(),
            None => format!("https://{}.api.sanity.io", project_id),
        };
        let base = Url::parse(&host).with_context(|| format!("invalid sanity API host: {host}"))?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("sanity token is not a valid header value")?;
        auth.set_sensitive(true);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .user_agent(concat!("wf2sanity/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(Self { http, base, api_version: settings.api_version.clone(), dataset: dataset.to_string() })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("sanity API host cannot have path segments: {}", self.base))?
            .pop_if_empty()
            .push(&self.api_version)
            .extend(segments)
            .push(&self.dataset);
        Ok(url)
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(anyhow!("sanity responded {}: {}", status, body.trim()))
}

#[async_trait]
impl DestinationApi for SanityClient {
    async fn upload_asset(&self, upload: AssetUpload) -> Result<String> {
        let mut url = self.endpoint(&["assets", upload.kind.endpoint()])?;
        url.query_pairs_mut().append_pair("filename", &upload.filename);
        let content_type = upload.content_type.as_deref().unwrap_or("application/octet-stream");
        debug!(%url, kind = %upload.kind, bytes = upload.data.len(), "uploading asset");

        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(upload.data)
            .send()
            .await?;
        let parsed: AssetResponse = check(resp).await?.json().await.context("decoding asset response")?;
        Ok(parsed.document.id)
    }

    async fn create_or_replace(&self, doc: &SanityDocument) -> Result<UpsertOperation> {
        let mut url = self.endpoint(&["data", "mutate"])?;
        url.query_pairs_mut().append_pair("returnIds", "true");
        let body = json!({ "mutations": [ { "createOrReplace": doc } ] });

        let resp = self.http.post(url).json(&body).send().await?;
        let parsed: MutateResponse = check(resp).await?.json().await.context("decoding mutation response")?;
        let op = parsed
            .results
            .first()
            .and_then(|r| r.operation.as_deref())
            .map(UpsertOperation::from_api)
            .unwrap_or_else(|| UpsertOperation::Unknown("none".to_string()));
        Ok(op)
    }
}
