use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};
use url::Url;

use crate::config::{WebflowSettings, MAX_PAGE_SIZE};
use crate::types::{Collection, ItemsPage, Site, SourceItem};

/// Read side of the migration. Listing failures are logged and degrade to
/// empty (or partial, for items) results rather than being returned.
#[async_trait]
pub trait SourceApi: Send + Sync {
    async fn list_sites(&self) -> Vec<Site>;
    async fn list_collections(&self, site_id: &str) -> Vec<Collection>;
    async fn list_items(&self, collection_id: &str) -> Vec<SourceItem>;
}

pub struct WebflowClient {
    http: reqwest::Client,
    base: Url,
    page_size: usize,
}

impl WebflowClient {
    pub fn new(api_key: &str, settings: &WebflowSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("accept-version", HeaderValue::from_static("1.0.0"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .context("webflow API key is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .user_agent(concat!("wf2sanity/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        let base = Url::parse(&settings.base_url)
            .with_context(|| format!("invalid webflow base URL: {}", settings.base_url))?;
        Ok(Self { http, base, page_size: settings.page_size.clamp(1, MAX_PAGE_SIZE) })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("webflow base URL cannot have path segments: {}", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET");
        let resp = self.http.get(url.clone()).send().await?.error_for_status()?;
        resp.json::<T>().await.with_context(|| format!("decoding response from {url}"))
    }

    pub async fn fetch_sites(&self) -> Result<Vec<Site>> {
        self.get_json(self.endpoint(&["sites"])?).await
    }

    pub async fn fetch_collections(&self, site_id: &str) -> Result<Vec<Collection>> {
        self.get_json(self.endpoint(&["sites", site_id, "collections"])?).await
    }

    pub async fn fetch_items_page(&self, collection_id: &str, offset: usize) -> Result<Vec<SourceItem>> {
        let mut url = self.endpoint(&["collections", collection_id, "items"])?;
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &self.page_size.to_string());
        let page: ItemsPage = self.get_json(url).await?;
        Ok(page.items)
    }
}

#[async_trait]
impl SourceApi for WebflowClient {
    async fn list_sites(&self) -> Vec<Site> {
        match self.fetch_sites().await {
            Ok(sites) => sites,
            Err(e) => {
                error!("Error fetching Webflow sites: {e:#}");
                Vec::new()
            }
        }
    }

    async fn list_collections(&self, site_id: &str) -> Vec<Collection> {
        match self.fetch_collections(site_id).await {
            Ok(collections) => collections,
            Err(e) => {
                error!(site_id, "Error fetching collections: {e:#}");
                Vec::new()
            }
        }
    }

    async fn list_items(&self, collection_id: &str) -> Vec<SourceItem> {
        let mut items = Vec::new();
        let mut offset = 0;
        loop {
            match self.fetch_items_page(collection_id, offset).await {
                Ok(page) => {
                    // Webflow signals the end with a page that is not exactly full.
                    let last_page = page.len() != self.page_size;
                    items.extend(page);
                    if last_page {
                        break;
                    }
                    offset += self.page_size;
                }
                Err(e) => {
                    error!(collection_id, offset, "Error fetching collection items: {e:#}");
                    break;
                }
            }
        }
        info!(collection_id, count = items.len(), "fetched collection items");
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, page_size: usize) -> WebflowClient {
        let settings = WebflowSettings { base_url: server.uri(), page_size };
        WebflowClient::new("test-key", &settings).unwrap()
    }

    fn items(start: usize, n: usize) -> serde_json::Value {
        let items: Vec<_> = (start..start + n).map(|i| json!({"_id": format!("item-{i}"), "name": format!("Item {i}")})).collect();
        json!({ "items": items, "count": n })
    }

    #[tokio::test]
    async fn lists_sites_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites"))
            .and(header("authorization", "Bearer test-key"))
            .and(header("accept-version", "1.0.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"_id": "s1", "name": "Marketing", "shortName": "mk"},
                {"_id": "s2", "name": "Docs"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let sites = client(&server, 100).list_sites().await;
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[1].id, "s2");
        assert_eq!(sites[0].name, "Marketing");
    }

    #[tokio::test]
    async fn failed_listing_degrades_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/s1/collections"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let c = client(&server, 100);
        assert!(c.list_collections("s1").await.is_empty());
        assert!(c.list_sites().await.is_empty());
    }

    #[tokio::test]
    async fn paginates_until_short_page() {
        let server = MockServer::start().await;
        for (offset, n) in [(0usize, 100usize), (100, 100), (200, 50)] {
            Mock::given(method("GET"))
                .and(path("/collections/c1/items"))
                .and(query_param("offset", offset.to_string()))
                .and(query_param("limit", "100"))
                .respond_with(ResponseTemplate::new(200).set_body_json(items(offset, n)))
                .expect(1)
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/collections/c1/items"))
            .and(query_param("offset", "300"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items(300, 0)))
            .expect(0)
            .mount(&server)
            .await;

        let all = client(&server, 100).list_items("c1").await;
        assert_eq!(all.len(), 250);
        assert_eq!(all[0].id, "item-0");
        assert_eq!(all[249].id, "item-249");
    }

    #[tokio::test]
    async fn error_mid_pagination_keeps_partial_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/c1/items"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items(0, 2)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/collections/c1/items"))
            .and(query_param("offset", "2"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let got = client(&server, 2).list_items("c1").await;
        assert_eq!(got.len(), 2);
    }

    #[tokio::test]
    async fn oversized_page_ends_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/c1/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items(0, 3)))
            .expect(1)
            .mount(&server)
            .await;

        let got = client(&server, 2).list_items("c1").await;
        assert_eq!(got.len(), 3);
    }

    #[tokio::test]
    async fn exact_multiple_stops_after_empty_page() {
        let server = MockServer::start().await;
        for (offset, n) in [(0usize, 100usize), (100, 100), (200, 0)] {
            Mock::given(method("GET"))
                .and(path("/collections/c1/items"))
                .and(query_param("offset", offset.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_json(items(offset, n)))
                .expect(1)
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/collections/c1/items"))
            .and(query_param("offset", "300"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items(300, 0)))
            .expect(0)
            .mount(&server)
            .await;

        let all = client(&server, 100).list_items("c1").await;
        assert_eq!(all.len(), 200);
    }

    #[test]
    fn page_size_is_capped_at_webflow_limit() {
        let settings = WebflowSettings { base_url: "https://api.example.com".into(), page_size: 500 };
        let c = WebflowClient::new("k", &settings).unwrap();
        assert_eq!(c.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn endpoint_handles_trailing_slash_in_base() {
        let settings = WebflowSettings { base_url: "https://api.example.com/v1/".into(), page_size: 10 };
        let c = WebflowClient::new("k", &settings).unwrap();
        let url = c.endpoint(&["sites", "abc", "collections"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/sites/abc/collections");
    }
}
