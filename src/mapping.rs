use crate::blocks::{html_to_blocks, KeyGen};
use crate::config::MappingSettings;
use crate::types::{AssetField, AssetRef, SanityDocument, Slug, SourceItem};

pub fn document_id_from(prefix: &str, source_id: &str) -> String {
    format!("{}{}", prefix, source_id)
}

/// Remove the paragraph and line-break tags Webflow wraps plain-text fields in.
/// Any other markup is left untouched.
pub fn strip_paragraph_tags(s: &str) -> String {
    s.replace("<br>", "").replace("<p>", "").replace("</p>", "")
}

pub fn document_from_item(item: &SourceItem, settings: &MappingSettings) -> SanityDocument {
    let mut keys = KeyGen::new();
    SanityDocument {
        doc_type: settings.document_type.clone(),
        id: document_id_from(&settings.id_prefix, &item.id),
        title: item.heading.clone(),
        description: item.description.as_deref().map(strip_paragraph_tags),
        slug: item.slug.clone().map(|current| Slug { current }),
        body: item.rich_text.as_deref().map(|html| html_to_blocks(html, &mut keys)),
        image: image_field_from(item),
        file: file_field_from(item),
    }
}

fn image_field_from(item: &SourceItem) -> Option<AssetField> {
    let image = item.image.as_ref()?;
    let url = image.url.as_deref().filter(|u| !u.is_empty())?;
    Some(AssetField {
        asset: AssetRef::url(url),
        alt: image.alt.clone().unwrap_or_default(),
    })
}

fn file_field_from(item: &SourceItem) -> Option<AssetField> {
    let url = item.file_url.as_deref().filter(|u| !u.is_empty())?;
    Some(AssetField { asset: AssetRef::url(url), alt: String::new() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(v: serde_json::Value) -> SourceItem {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn description_strips_only_paragraph_tags() {
        assert_eq!(strip_paragraph_tags("<p>Hi</p><br>there"), "Hithere");
        assert_eq!(strip_paragraph_tags("<P>x</P><em>y</em>"), "<P>x</P><em>y</em>");
    }

    #[test]
    fn maps_all_present_fields() {
        let src = item(json!({
            "_id": "6123",
            "heading": "A post",
            "slug": "a-post",
            "description": "<p>Short</p>",
            "rich-text": "<p>Body</p>",
            "image": {"url": "https://cdn/x.png", "alt": "An x"},
            "file-url": "https://cdn/x.json",
        }));
        let doc = document_from_item(&src, &MappingSettings::default());
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["_type"], "exampleSchema");
        assert_eq!(v["_id"], "imported-6123");
        assert_eq!(v["title"], "A post");
        assert_eq!(v["description"], "Short");
        assert_eq!(v["slug"], json!({"current": "a-post"}));
        assert_eq!(v["body"][0]["children"][0]["text"], "Body");
        assert_eq!(v["image"], json!({"asset": {"url": "https://cdn/x.png"}, "alt": "An x"}));
        assert_eq!(v["file"], json!({"asset": {"url": "https://cdn/x.json"}, "alt": ""}));
    }

    #[test]
    fn missing_optional_fields_are_omitted() {
        let src = item(json!({"_id": "1", "heading": "t", "image": null, "file-url": ""}));
        let v = serde_json::to_value(document_from_item(&src, &MappingSettings::default())).unwrap();
        let obj = v.as_object().unwrap();
        for key in ["image", "file", "description", "body", "slug"] {
            assert!(!obj.contains_key(key), "{key} should be absent");
        }
    }

    #[test]
    fn image_without_url_is_omitted_and_alt_defaults_to_empty() {
        let no_url = item(json!({"_id": "1", "image": {"alt": "x"}}));
        assert!(document_from_item(&no_url, &MappingSettings::default()).image.is_none());

        let no_alt = item(json!({"_id": "1", "image": {"url": "https://cdn/a.jpg"}}));
        let doc = document_from_item(&no_alt, &MappingSettings::default());
        assert_eq!(doc.image.unwrap().alt, "");
    }

    #[test]
    fn file_alt_is_always_empty() {
        let src = item(json!({"_id": "1", "file-url": "https://cdn/f.pdf"}));
        let doc = document_from_item(&src, &MappingSettings::default());
        assert_eq!(doc.file.unwrap().alt, "");
    }

    #[test]
    fn id_is_deterministic_and_prefix_configurable() {
        let src = item(json!({"_id": "abc", "rich-text": "<p>x <b>y</b></p>"}));
        let settings = MappingSettings { id_prefix: "wf-".into(), ..MappingSettings::default() };
        let a = document_from_item(&src, &settings);
        let b = document_from_item(&src, &settings);
        assert_eq!(a.id, "wf-abc");
        assert_eq!(a, b);
    }
}
