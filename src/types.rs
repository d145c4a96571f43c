use crate::constants;
use crate::error::{Result, RouteError};
use crate::time::format_utc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// One raw row of a source file: field name to unconverted value.
/// Fields missing from a short row are absent from the map.
pub type RawRecord = HashMap<String, String>;

/// Canonical route shared by every source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub start_node: String,
    pub end_node: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl fmt::Display for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({} .. {})",
            self.start_node,
            self.end_node,
            self.start_time.to_rfc3339(),
            self.end_time.to_rfc3339()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Sentinels,
    Sniffers,
    Loopholes,
}

impl Source {
    pub fn all() -> [Source; 3] {
        [Source::Sentinels, Source::Sniffers, Source::Loopholes]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Sentinels => constants::SENTINELS_SOURCE,
            Source::Sniffers => constants::SNIFFERS_SOURCE,
            Source::Loopholes => constants::LOOPHOLES_SOURCE,
        }
    }

    /// Parse a comma-separated list such as `"sentinels, loopholes"`
    pub fn parse_list(list: &str) -> Result<Vec<Source>> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            constants::SENTINELS_SOURCE => Ok(Source::Sentinels),
            constants::SNIFFERS_SOURCE => Ok(Source::Sniffers),
            constants::LOOPHOLES_SOURCE => Ok(Source::Loopholes),
            _ => Err(RouteError::UnknownSource(s.to_string())),
        }
    }
}

/// A reference that could not be resolved against its companion table.
/// The affected record is dropped; the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinMiss {
    pub source: Source,
    pub description: String,
}

/// Payload posted to the collector for one route
#[derive(Debug, Clone, Serialize)]
pub struct RouteDelivery {
    pub source: String,
    pub passphrase: String,
    pub start_node: String,
    pub end_node: String,
    pub start_time: String,
    pub end_time: String,
}

impl RouteDelivery {
    pub fn new(source: Source, passphrase: &str, route: &RouteRecord) -> Self {
        Self {
            source: source.to_string(),
            passphrase: passphrase.to_string(),
            start_node: route.start_node.clone(),
            end_node: route.end_node.clone(),
            start_time: format_utc(&route.start_time),
            end_time: format_utc(&route.end_time),
        }
    }
}

/// Core trait that every source analyzer implements
pub trait RouteAnalyzer: Send + Sync {
    fn source(&self) -> Source;

    /// Read the source's files from `data_dir` and reconcile them into routes.
    /// Replaces the result of any previous load; on error the previous
    /// result is left untouched.
    fn load(&mut self, data_dir: &Path) -> Result<()>;

    /// Routes produced by the last successful `load`, in emission order
    fn get_routes(&self) -> &[RouteRecord];

    /// Joins dropped during the last successful `load`
    fn join_misses(&self) -> &[JoinMiss] {
        &[]
    }
}
