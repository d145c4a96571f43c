use crate::error::Result;
use crate::types::{RouteDelivery, Source};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Credential used both to download source archives and to post routes
#[async_trait]
pub trait PassphrasePort: Send + Sync {
    async fn fetch_passphrase(&self) -> Result<String>;
}

/// Materialises a source's raw files under `data_root/<source>`
#[async_trait]
pub trait SourceDataPort: Send + Sync {
    async fn download(&self, source: Source, passphrase: &str, data_root: &Path) -> Result<PathBuf>;
}

/// Accepts one reconciled route at a time; returns the collector's status code
#[async_trait]
pub trait RouteDeliveryPort: Send + Sync {
    async fn deliver(&self, delivery: &RouteDelivery) -> Result<u16>;
}
