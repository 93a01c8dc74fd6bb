//! Catalog facade
//!
//! Binds the paginator to the catalog's `Products` endpoint and the upload
//! endpoint, and carries the per-caller request template.

use crate::decode::{ODataDecoder, PageDecoder};
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::output::{CsvLayout, Uploader, DEFAULT_UPLOAD_PATH};
use crate::pagination::{
    AggregateResult, PageFetcher, PageRequest, PageResult, Paginator, PaginatorConfig,
};
use crate::types::Product;
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

/// Default products endpoint, relative to the API base URL
pub const DEFAULT_PRODUCTS_PATH: &str = "/v1/Products";

/// Fetches one page of products over HTTP
#[derive(Debug, Clone)]
pub struct CatalogFetcher {
    client: HttpClient,
    products_path: String,
    decoder: ODataDecoder<Product>,
}

impl CatalogFetcher {
    /// Create a fetcher for `products_path`
    pub fn new(client: HttpClient, products_path: impl Into<String>) -> Self {
        Self {
            client,
            products_path: products_path.into(),
            decoder: ODataDecoder::new(),
        }
    }
}

#[async_trait]
impl PageFetcher for CatalogFetcher {
    type Record = Product;

    async fn fetch(&self, request: &PageRequest) -> Result<PageResult<Product>> {
        let config = request
            .query_params()?
            .into_iter()
            .fold(RequestConfig::new(), |config, (key, value)| {
                config.query(key, value)
            });

        let body = self.client.get_text(&self.products_path, config).await?;
        self.decoder.decode(&body)
    }
}

/// Paths of the catalog endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPaths {
    /// Products collection
    pub products: String,
    /// CSV upload endpoint
    pub upload: String,
}

impl Default for CatalogPaths {
    fn default() -> Self {
        Self {
            products: DEFAULT_PRODUCTS_PATH.to_string(),
            upload: DEFAULT_UPLOAD_PATH.to_string(),
        }
    }
}

/// Product catalog client
#[derive(Debug)]
pub struct Catalog {
    paginator: Paginator<CatalogFetcher>,
    uploader: Uploader,
    template: PageRequest,
}

impl Catalog {
    /// Create a catalog client
    pub fn new(
        client: HttpClient,
        paths: CatalogPaths,
        template: PageRequest,
        config: PaginatorConfig,
    ) -> Result<Self> {
        template.validate()?;
        let fetcher = CatalogFetcher::new(client.clone(), paths.products);
        Ok(Self {
            paginator: Paginator::with_config(fetcher, config)?,
            uploader: Uploader::new(client, paths.upload),
            template,
        })
    }

    /// Restrict fetches to parent products
    pub fn set_parent_only(&mut self, parent_only: bool) {
        self.template.filter.is_parent = parent_only.then_some(true);
    }

    /// Whether fetches are restricted to parent products
    pub fn parent_only(&self) -> bool {
        self.template.filter.is_parent == Some(true)
    }

    /// Request template used for every page
    pub fn template(&self) -> &PageRequest {
        &self.template
    }

    /// Fetch every matching product created on or after `since`
    pub async fn products(&self, since: Option<NaiveDate>) -> Result<AggregateResult<Product>> {
        self.paginator.run(&self.template, since).await
    }

    /// Like [`Catalog::products`], stopping early once `cancel` fires
    pub async fn products_until_cancelled(
        &self,
        since: Option<NaiveDate>,
        cancel: CancellationToken,
    ) -> Result<AggregateResult<Product>> {
        self.paginator
            .run_until_cancelled(&self.template, since, cancel)
            .await
    }

    /// Upload products as a CSV feed for `region`
    pub async fn upload(&self, products: &[Product], region: u64) -> Result<()> {
        let layout = CsvLayout::from_products(products);
        self.uploader.upload(&layout, region).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ProductFilter;
    use crate::http::HttpClientConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn labels_request() -> PageRequest {
        let filter = ProductFilter::new("Foreign Accounts", 99);
        PageRequest::new(filter, vec!["Labels".to_string()])
    }

    fn catalog_for(server: &MockServer, slots: usize) -> Catalog {
        let client =
            HttpClient::with_config(HttpClientConfig::builder().base_url(server.uri()).build())
                .unwrap();
        Catalog::new(
            client,
            CatalogPaths::default(),
            labels_request(),
            PaginatorConfig::new().with_slots(slots).no_rate_limit(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetcher_sends_query() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/Products"))
            .and(query_param(
                "$filter",
                "Labels/Any (c: c/Name eq 'Foreign Accounts') and TotalAvailableQuantity gt 0 and ProfileID eq 99",
            ))
            .and(query_param("$expand", "Labels"))
            .and(query_param("$skip", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"ID": 5, "Sku": "X"}],
                "@odata.nextLink": "next"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::with_config(
            HttpClientConfig::builder().base_url(mock_server.uri()).build(),
        )
        .unwrap();
        let fetcher = CatalogFetcher::new(client, DEFAULT_PRODUCTS_PATH);
        let request = labels_request().with_offset(200);

        let page = fetcher.fetch(&request).await.unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].id, 5);
        assert!(page.has_more());
    }

    #[tokio::test]
    async fn test_parent_only_adds_predicate() {
        let mock_server = MockServer::start().await;
        let mut catalog = catalog_for(&mock_server, 1);
        assert!(!catalog.parent_only());

        catalog.set_parent_only(true);
        assert!(catalog.parent_only());
        assert!(catalog
            .template()
            .filter
            .to_odata()
            .ends_with("and IsParent eq true"));

        catalog.set_parent_only(false);
        assert!(!catalog.template().filter.to_odata().contains("IsParent"));
    }

    #[tokio::test]
    async fn test_products_single_page() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/Products"))
            .and(query_param("$skip", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"ID": 1}, {"ID": 2}]
            })))
            .mount(&mock_server)
            .await;

        let catalog = catalog_for(&mock_server, 1);
        let result = catalog.products(None).await.unwrap();

        let mut ids: Vec<i64> = result.records.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_new_rejects_invalid_template() {
        let client = HttpClient::new().unwrap();
        let result = Catalog::new(
            client,
            CatalogPaths::default(),
            PageRequest::new(ProductFilter::new("Foreign Accounts", 1), Vec::new()),
            PaginatorConfig::default(),
        );
        assert!(result.is_err());
    }
}
