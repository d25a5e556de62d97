use thiserror::Error;

use crate::sanity::AssetKind;

/// Why a single document was abandoned. The run itself carries on.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("downloading {kind} from {url} failed: {reason:#}")]
    Download {
        kind: AssetKind,
        url: String,
        reason: anyhow::Error,
    },
    #[error("uploading {kind} asset failed: {reason:#}")]
    Upload {
        kind: AssetKind,
        reason: anyhow::Error,
    },
    #[error("createOrReplace failed: {reason:#}")]
    Upsert { reason: anyhow::Error },
}

impl ItemError {
    pub fn stage(&self) -> &'static str {
        match self {
            ItemError::Download { .. } => "download",
            ItemError::Upload { .. } => "upload",
            ItemError::Upsert { .. } => "upsert",
        }
    }
}
