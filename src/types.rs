use serde::{Deserialize, Serialize};

use crate::blocks::Block;

/// Webflow site as returned by `GET /sites`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

/// Webflow collection as returned by `GET /sites/{id}/collections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// One collection item. Only `_id` is guaranteed; every other consumed field may be missing or null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceItem {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "rich-text")]
    pub rich_text: Option<String>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default, rename = "file-url")]
    pub file_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemsPage {
    #[serde(default)]
    pub items: Vec<SourceItem>,
}

/// Anything the operator can pick from a numbered menu.
pub trait Selectable {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

impl Selectable for Site {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Selectable for Collection {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slug {
    pub current: String,
}

/// Asset slot value: a fetchable URL before upload, a Sanity reference after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetRef {
    Reference {
        #[serde(rename = "_type")]
        kind: String,
        #[serde(rename = "_ref")]
        id: String,
    },
    Url { url: String },
}

impl AssetRef {
    pub fn url(url: impl Into<String>) -> Self {
        AssetRef::Url { url: url.into() }
    }

    pub fn reference(id: impl Into<String>) -> Self {
        AssetRef::Reference { kind: "reference".to_string(), id: id.into() }
    }

    pub fn as_url(&self) -> Option<&str> {
        match self {
            AssetRef::Url { url } => Some(url),
            AssetRef::Reference { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetField {
    pub asset: AssetRef,
    pub alt: String,
}

/// Destination document. `None` fields are left out of the JSON entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanityDocument {
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<Slug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<Block>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<AssetField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<AssetField>,
}
