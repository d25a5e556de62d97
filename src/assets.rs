use anyhow::Result;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::error::ItemError;
use crate::sanity::{AssetKind, AssetUpload, DestinationApi};
use crate::types::{AssetField, AssetRef, SanityDocument};

/// Downloads URL-form assets of a document and swaps them for Sanity references.
pub struct AssetResolver<'a> {
    http: reqwest::Client,
    destination: &'a dyn DestinationApi,
    file_content_type: String,
}

impl<'a> AssetResolver<'a> {
    pub fn new(destination: &'a dyn DestinationApi, file_content_type: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("wf2sanity/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, destination, file_content_type: file_content_type.into() })
    }

    /// Resolve the image slot, then the file slot. Returns how many assets were uploaded.
    /// On error the document may be half-resolved and must not be written.
    pub async fn resolve(&self, doc: &mut SanityDocument) -> Result<usize, ItemError> {
        let mut uploaded = 0;
        let filename = doc.id.clone();
        if let Some(field) = doc.image.as_mut() {
            if self.resolve_field(field, AssetKind::Image, &filename).await? {
                uploaded += 1;
            }
        }
        if let Some(field) = doc.file.as_mut() {
            if self.resolve_field(field, AssetKind::File, &filename).await? {
                uploaded += 1;
            }
        }
        Ok(uploaded)
    }

    async fn resolve_field(&self, field: &mut AssetField, kind: AssetKind, filename: &str) -> Result<bool, ItemError> {
        let Some(url) = field.asset.as_url().map(str::to_string) else {
            return Ok(false);
        };
        let (data, sniffed) = self
            .download(&url)
            .await
            .map_err(|reason| ItemError::Download { kind, url: url.clone(), reason })?;

        let content_type = match kind {
            AssetKind::Image => sniffed,
            AssetKind::File => Some(self.file_content_type.clone()),
        };
        let upload = AssetUpload { kind, data, filename: filename.to_string(), content_type };
        let asset_id = self
            .destination
            .upload_asset(upload)
            .await
            .map_err(|reason| ItemError::Upload { kind, reason })?;

        info!(document_id = filename, %kind, asset_id = %asset_id, "asset uploaded");
        field.asset = AssetRef::reference(asset_id);
        Ok(true)
    }

    async fn download(&self, url: &str) -> Result<(Bytes, Option<String>)> {
        debug!(url, "downloading asset");
        let resp = self.http.get(url).send().await?.error_for_status()?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok((resp.bytes().await?, content_type))
    }
}
