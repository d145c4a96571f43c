use crate::app::ports::{PassphrasePort, RouteDeliveryPort, SourceDataPort};
use crate::constants::{ROUTES_PATH, ZIP_CONTENT_TYPE};
use crate::error::{Result, RouteError};
use crate::infra::archive;
use crate::types::{RouteDelivery, Source};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// reqwest-backed client for the route collector
pub struct ReqwestCollector {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestCollector {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn routes_url(&self) -> String {
        format!("{}/{}", self.base_url, ROUTES_PATH)
    }
}

/// Media type of a `Content-Type` value, without parameters
fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or("").trim()
}

#[async_trait]
impl PassphrasePort for ReqwestCollector {
    #[instrument(skip(self))]
    async fn fetch_passphrase(&self) -> Result<String> {
        let body: Value = self
            .client
            .get(&self.base_url)
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let passphrase = body["pills"]["red"]["passphrase"]
            .as_str()
            .ok_or_else(|| RouteError::MissingField("pills.red.passphrase not found".into()))?;
        info!("got a pill");
        Ok(passphrase.to_string())
    }
}

#[async_trait]
impl SourceDataPort for ReqwestCollector {
    #[instrument(skip(self, source, passphrase), fields(source = %source))]
    async fn download(&self, source: Source, passphrase: &str, data_root: &Path) -> Result<PathBuf> {
        let resp = self
            .client
            .get(self.routes_url())
            .query(&[("source", source.as_str()), ("passphrase", passphrase)])
            .send()
            .await?
            .error_for_status()?;
        info!("got source {}: {:?}", source, resp.headers());

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if media_type(&content_type) != ZIP_CONTENT_TYPE {
            return Err(RouteError::Api {
                message: format!("unsupported source type '{content_type}' for {source}"),
            });
        }

        let bytes = resp.bytes().await?;
        tokio::fs::create_dir_all(data_root).await?;
        let archive_path = data_root.join(format!("{source}.zip"));
        tokio::fs::write(&archive_path, &bytes).await?;

        let root = data_root.to_path_buf();
        tokio::task::spawn_blocking(move || archive::unpack(&archive_path, &root))
            .await
            .map_err(|e| RouteError::Api {
                message: format!("archive extraction task failed: {e}"),
            })??;

        let data_dir = data_root.join(source.as_str());
        if !data_dir.is_dir() {
            return Err(RouteError::Api {
                message: format!("unzipped data missing: {}", data_dir.display()),
            });
        }
        info!("unzipped to {}", data_dir.display());
        Ok(data_dir)
    }
}

#[async_trait]
impl RouteDeliveryPort for ReqwestCollector {
    async fn deliver(&self, delivery: &RouteDelivery) -> Result<u16> {
        let url = self.routes_url();
        debug!("POST {} {:?}", url, delivery);

        let resp = self.client.post(&url).form(delivery).send().await?;
        let status = resp.status();
        info!("POST response {}", status.as_u16());

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RouteError::Api {
                message: format!("collector responded {status}: {body}"),
            });
        }
        Ok(status.as_u16())
    }
}
