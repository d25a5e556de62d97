use std::fmt;

use crate::error::ItemError;
use crate::sanity::UpsertOperation;

#[derive(Debug)]
pub enum ItemStatus {
    Uploaded { assets: usize, operation: UpsertOperation },
    /// Dry run: mapped but nothing written.
    Mapped,
    Failed(ItemError),
}

#[derive(Debug)]
pub struct ItemOutcome {
    pub document_id: String,
    pub status: ItemStatus,
}

/// One outcome per document, in processing order.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub site: Option<String>,
    pub collection: Option<String>,
    pub outcomes: Vec<ItemOutcome>,
}

impl MigrationReport {
    pub fn push(&mut self, document_id: impl Into<String>, status: ItemStatus) {
        self.outcomes.push(ItemOutcome { document_id: document_id.into(), status });
    }

    pub fn uploaded(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o.status, ItemStatus::Uploaded { .. })).count()
    }

    pub fn mapped(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o.status, ItemStatus::Mapped)).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ItemError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            ItemStatus::Failed(e) => Some((o.document_id.as_str(), e)),
            _ => None,
        })
    }

    pub fn assets_uploaded(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                ItemStatus::Uploaded { assets, .. } => assets,
                _ => 0,
            })
            .sum()
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failures().count();
        write!(f, "{} item(s): {} uploaded ({} asset(s)), ", self.outcomes.len(), self.uploaded(), self.assets_uploaded())?;
        if self.mapped() > 0 {
            write!(f, "{} mapped only, ", self.mapped())?;
        }
        writeln!(f, "{} failed", failed)?;
        for (id, err) in self.failures() {
            writeln!(f, "  {} [{}]: {}", id, err.stage(), err)?;
        }
        Ok(())
    }
}
