pub mod assets;
pub mod blocks;
pub mod config;
pub mod error;
pub mod mapping;
pub mod report;
pub mod sanity;
pub mod select;
pub mod types;
pub mod webflow;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::config::{Credentials, Settings};
    pub use crate::report::{ItemOutcome, ItemStatus, MigrationReport};
    pub use crate::sanity::{DestinationApi, SanityClient};
    pub use crate::types::{Collection, SanityDocument, Site, SourceItem};
    pub use crate::webflow::{SourceApi, WebflowClient};
    pub use crate::{MigrateOptions, Migrator};
}

use anyhow::{bail, Result};
use std::io::{BufRead, Write};
use tracing::{error, info, warn};

use crate::assets::AssetResolver;
use crate::config::MappingSettings;
use crate::error::ItemError;
use crate::mapping::document_from_item;
use crate::report::{ItemStatus, MigrationReport};
use crate::sanity::DestinationApi;
use crate::select::select_in_task;
use crate::types::SanityDocument;
use crate::webflow::SourceApi;

#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Map and print documents without touching the destination.
    pub dry_run: bool,
}

/// Drives one run: pick a site and collection, fetch its items, map them,
/// then resolve assets and upsert document by document.
pub struct Migrator<'a> {
    source: &'a dyn SourceApi,
    destination: &'a dyn DestinationApi,
    mapping: MappingSettings,
    options: MigrateOptions,
}

impl<'a> Migrator<'a> {
    pub fn new(
        source: &'a dyn SourceApi,
        destination: &'a dyn DestinationApi,
        mapping: MappingSettings,
        options: MigrateOptions,
    ) -> Self {
        Self { source, destination, mapping, options }
    }

    /// Run the interactive migration. `input`/`output` carry the two menus
    /// (and, on a dry run, the mapped documents).
    pub async fn run<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();

        let sites = self.source.list_sites().await;
        if sites.is_empty() {
            bail!("no Webflow sites found (none exist or the listing failed)");
        }
        let site = select_in_task("Choose a site: ", &sites, input, output)?;
        info!(site_id = %site.id, name = %site.name, "site selected");
        report.site = Some(site.name.clone());

        let collections = self.source.list_collections(&site.id).await;
        if collections.is_empty() {
            bail!("no collections found for site {} (none exist or the listing failed)", site.id);
        }
        let collection = select_in_task("Choose a collection: ", &collections, input, output)?;
        info!(collection_id = %collection.id, name = %collection.name, "collection selected");
        report.collection = Some(collection.name.clone());

        let items = self.source.list_items(&collection.id).await;
        if items.is_empty() {
            warn!(collection_id = %collection.id, "collection has no items to migrate");
        }
        let documents: Vec<SanityDocument> = items.iter().map(|item| document_from_item(item, &self.mapping)).collect();

        if self.options.dry_run {
            for doc in &documents {
                writeln!(output, "{}", serde_json::to_string_pretty(doc)?)?;
                report.push(doc.id.clone(), ItemStatus::Mapped);
            }
            return Ok(report);
        }

        self.upload_all(documents, &mut report).await?;
        Ok(report)
    }

    /// Resolve assets and upsert each document in order. Per-document failures
    /// are logged and recorded; they never stop the batch.
    pub async fn upload_all(&self, documents: Vec<SanityDocument>, report: &mut MigrationReport) -> Result<()> {
        let resolver = AssetResolver::new(self.destination, self.mapping.file_content_type.clone())?;
        for mut doc in documents {
            let id = doc.id.clone();
            let status = match self.upload_one(&resolver, &mut doc).await {
                Ok(status) => status,
                Err(e) => {
                    error!(document_id = %id, stage = e.stage(), "Error uploading document: {e}");
                    ItemStatus::Failed(e)
                }
            };
            report.push(id, status);
        }
        Ok(())
    }

    async fn upload_one(&self, resolver: &AssetResolver<'_>, doc: &mut SanityDocument) -> Result<ItemStatus, ItemError> {
        let assets = resolver.resolve(doc).await?;
        let operation = self
            .destination
            .create_or_replace(doc)
            .await
            .map_err(|reason| ItemError::Upsert { reason })?;
        info!(document_id = %doc.id, %operation, assets, "Document uploaded");
        Ok(ItemStatus::Uploaded { assets, operation })
    }
}
