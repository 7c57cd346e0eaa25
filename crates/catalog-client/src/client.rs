//! Catalog search and product retrieval with retry logic.
//!
//! Retrieval is a long-running network transfer: transient failures are
//! retried with exponential backoff, and throttling / offline-archive
//! responses wait out the service's long retry delay. A query with zero
//! matches is fatal immediately, before any download state is touched.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::credentials::Credentials;
use crate::error::{CatalogError, CatalogResult};
use crate::query::ProductQuery;

/// Configuration for the catalog client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// OData catalogue endpoint.
    pub catalog_url: String,
    /// Download endpoint (the catalogue host does not serve archives).
    pub download_url: String,
    /// OAuth token endpoint.
    pub token_url: String,
    /// Maximum download attempts before giving up.
    pub max_attempts: u32,
    /// Delay after a throttling or offline-archive response.
    pub throttle_delay: Duration,
    /// Initial retry delay for transient failures (doubles each retry,
    /// capped at `throttle_delay`).
    pub initial_retry_delay: Duration,
    /// HTTP request timeout.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            catalog_url: "https://catalogue.dataspace.copernicus.eu/odata/v1".to_string(),
            download_url: "https://zipper.dataspace.copernicus.eu/odata/v1".to_string(),
            token_url:
                "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token"
                    .to_string(),
            max_attempts: 10,
            throttle_delay: Duration::from_secs(1800),
            initial_retry_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(600),
        }
    }
}

/// A catalog product entry.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Product {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ContentLength")]
    pub content_length: Option<u64>,
}

impl Product {
    /// Product title without the trailing `.SAFE` suffix, used for the
    /// archive filename.
    pub fn title(&self) -> &str {
        self.name.trim_end_matches(".SAFE")
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    value: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Outcome classification for a single download attempt.
enum AttemptError {
    /// Service asked us to back off (throttling or offline archive).
    Throttled(StatusCode),
    /// Anything else transient.
    Other(String),
}

/// Searches the catalog and downloads product archives.
pub struct CatalogClient {
    http: Client,
    config: ClientConfig,
    credentials: Credentials,
}

impl CatalogClient {
    /// Create a new client with the given configuration and credentials.
    pub fn new(config: ClientConfig, credentials: Credentials) -> CatalogResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .build()?;

        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    /// Query the catalog. Zero matches is fatal ([`CatalogError::NoProductFound`])
    /// and is raised before any download directory is created.
    pub async fn search(&self, query: &ProductQuery) -> CatalogResult<Vec<Product>> {
        let url = format!("{}/Products", self.config.catalog_url);
        debug!(filter = %query.odata_filter(), "Searching catalog");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("$filter", query.odata_filter()),
                ("$orderby", "ContentDate/Start asc".to_string()),
                ("$top", "20".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let products = require_products(parse_search_response(&body)?, query)?;

        info!(
            count = products.len(),
            first = %products[0].name,
            "Catalog search matched products"
        );
        Ok(products)
    }

    /// Download a product archive into `dest_dir`, retrying transient
    /// failures up to the configured attempt budget.
    ///
    /// Returns the path to the completed `.zip` archive.
    pub async fn download(&self, product: &Product, dest_dir: &Path) -> CatalogResult<PathBuf> {
        fs::create_dir_all(dest_dir).await?;

        let final_path = dest_dir.join(format!("{}.zip", product.title()));
        let temp_path = dest_dir.join(format!("{}.zip.partial", product.title()));

        if final_path.exists() {
            info!(path = %final_path.display(), "Archive already present, skipping download");
            return Ok(final_path);
        }

        let mut delay = self.config.initial_retry_delay;
        let mut last_error = String::new();

        for attempt in 1..=self.config.max_attempts {
            match self.try_download(product, &temp_path).await {
                Ok(bytes) => {
                    if let Some(expected) = product.content_length {
                        if bytes != expected {
                            warn!(
                                expected,
                                actual = bytes,
                                "Archive size mismatch, retrying"
                            );
                            fs::remove_file(&temp_path).await.ok();
                            last_error = format!("size mismatch: expected {expected}, got {bytes}");
                            tokio::time::sleep(delay).await;
                            delay = (delay * 2).min(self.config.throttle_delay);
                            continue;
                        }
                    }

                    fs::rename(&temp_path, &final_path).await?;
                    info!(path = %final_path.display(), bytes, "Download completed");
                    return Ok(final_path);
                }
                Err(AttemptError::Throttled(status)) => {
                    last_error = format!("service busy ({status})");
                    warn!(
                        %status,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        delay_secs = self.config.throttle_delay.as_secs(),
                        "Throttled, waiting out retry delay"
                    );
                    tokio::time::sleep(self.config.throttle_delay).await;
                }
                Err(AttemptError::Other(reason)) => {
                    last_error = reason;
                    warn!(
                        error = %last_error,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        delay_secs = delay.as_secs(),
                        "Download failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.config.throttle_delay);
                }
            }
        }

        fs::remove_file(&temp_path).await.ok();
        Err(CatalogError::DownloadFailed {
            attempts: self.config.max_attempts,
            reason: last_error,
        })
    }

    /// One download attempt: fetch a token, stream the archive to the
    /// partial file, return the byte count.
    async fn try_download(
        &self,
        product: &Product,
        temp_path: &Path,
    ) -> Result<u64, AttemptError> {
        let token = self
            .fetch_token()
            .await
            .map_err(|e| AttemptError::Other(e.to_string()))?;

        let url = format!("{}/Products({})/$value", self.config.download_url, product.id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AttemptError::Other(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            status @ (StatusCode::TOO_MANY_REQUESTS | StatusCode::ACCEPTED) => {
                return Err(AttemptError::Throttled(status));
            }
            status => {
                return Err(AttemptError::Other(format!("HTTP {status}")));
            }
        }

        let mut file = fs::File::create(temp_path)
            .await
            .map_err(|e| AttemptError::Other(e.to_string()))?;

        let mut bytes = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AttemptError::Other(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| AttemptError::Other(e.to_string()))?;
            bytes += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| AttemptError::Other(e.to_string()))?;
        Ok(bytes)
    }

    /// Fetch an access token with the password grant.
    async fn fetch_token(&self) -> CatalogResult<String> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "password"),
                ("client_id", "cdse-public"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogError::Auth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Auth(format!("malformed token response: {e}")))?;
        Ok(token.access_token)
    }
}

/// Parse an OData search response body into products.
fn parse_search_response(body: &str) -> CatalogResult<Vec<Product>> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| CatalogError::BadResponse(e.to_string()))?;
    Ok(response.value)
}

/// Zero matches is [`CatalogError::NoProductFound`], raised here so nothing
/// downstream (directories, downloads) is touched for an empty result.
fn require_products(
    products: Vec<Product>,
    query: &ProductQuery,
) -> CatalogResult<Vec<Product>> {
    if products.is_empty() {
        return Err(CatalogError::NoProductFound(query.describe()));
    }
    Ok(products)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let body = r#"{
            "value": [
                {
                    "Id": "0b6b8e3f-0000-4c4e-8a8a-2a4a6e3f0b6b",
                    "Name": "S2A_MSIL1C_20190704T154911_N0207_R054_T19UDP_20190704T193110.SAFE",
                    "ContentLength": 785432123
                }
            ]
        }"#;

        let products = parse_search_response(body).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].content_length, Some(785432123));
        assert_eq!(
            products[0].title(),
            "S2A_MSIL1C_20190704T154911_N0207_R054_T19UDP_20190704T193110"
        );
    }

    #[test]
    fn test_parse_empty_response() {
        let products = parse_search_response(r#"{"value": []}"#).unwrap();
        assert!(products.is_empty());
    }

    #[test]
    fn test_empty_result_is_no_product_found() {
        use chrono::NaiveDate;
        use msi_common::{EpsgCode, Region};

        let query = ProductQuery {
            region: Region::from_corners(-67.71, 49.28, -67.67, 49.31, EpsgCode::WGS84)
                .unwrap(),
            start: NaiveDate::from_ymd_opt(2019, 7, 4).unwrap(),
            end: NaiveDate::from_ymd_opt(2019, 7, 5).unwrap(),
            cloud_cover: (0.0, 10.0),
        };

        let products = parse_search_response(r#"{"value": []}"#).unwrap();
        let err = require_products(products, &query).unwrap_err();
        assert!(matches!(err, CatalogError::NoProductFound(_)));
        assert!(err.to_string().contains("2019-07-04"));

        // A non-empty result passes through unchanged
        let products = parse_search_response(
            r#"{"value": [{"Id": "a", "Name": "S2A_TEST.SAFE", "ContentLength": 1}]}"#,
        )
        .unwrap();
        assert_eq!(require_products(products, &query).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_garbage_is_bad_response() {
        assert!(matches!(
            parse_search_response("not json"),
            Err(CatalogError::BadResponse(_))
        ));
    }

    #[test]
    fn test_default_config_retry_budget() {
        let config = ClientConfig::default();
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.throttle_delay, Duration::from_secs(1800));
    }
}
