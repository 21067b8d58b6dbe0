//! Ingestion pipeline: fetch → validate → normalize, plus label filtering.

pub mod fetch;
pub mod filter;
pub mod normalize;
pub mod validate;

pub use fetch::{fetch, HttpGetResult, HttpSource, ReqwestSource};
pub use filter::{filter_by_label, partition_by_label, LabelPartition};
pub use normalize::{normalize, normalize_with_report, CoercionReport};
pub use validate::validate;

use crate::config::SourceConfig;
use crate::error::Result;
use crate::metrics::IngestMetrics;
use crate::types::ReadingTable;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};

/// Where a fetch cycle is, or where it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Validating,
    Normalizing,
    Ready,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Fetching => "fetching",
            Stage::Validating => "validating",
            Stage::Normalizing => "normalizing",
            Stage::Ready => "ready",
        };
        f.write_str(s)
    }
}

pub struct IngestionPipeline {
    http: Box<dyn HttpSource>,
}

impl IngestionPipeline {
    pub fn new(http: Box<dyn HttpSource>) -> Self {
        Self { http }
    }

    /// Pipeline over a reqwest client configured from `[source]`
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let http = ReqwestSource::new(
            Duration::from_secs(config.timeout_secs),
            &config.user_agent,
        )?;
        Ok(Self::new(Box::new(http)))
    }

    /// Run one fetch cycle against `source`. Stops at the first error.
    #[instrument(skip(self))]
    pub fn run(&self, source: &str) -> Result<ReadingTable> {
        let started = Instant::now();
        match self.run_stages(source) {
            Ok(table) => {
                IngestMetrics::record_fetch_success(started.elapsed().as_secs_f64(), table.len());
                info!(rows = table.len(), stage = %Stage::Ready, "Readings ready");
                Ok(table)
            }
            Err(e) => {
                IngestMetrics::record_fetch_error(e.kind());
                error!(kind = e.kind(), "Fetch cycle failed: {}", e);
                Err(e)
            }
        }
    }

    fn run_stages(&self, source: &str) -> Result<ReadingTable> {
        info!(stage = %Stage::Fetching, "Fetching data from API: {}", source);
        let response = fetch(self.http.as_ref(), source)?;

        info!(stage = %Stage::Validating, "Validating envelope");
        let table = validate(response)?;

        info!(stage = %Stage::Normalizing, rows = table.len(), "Normalizing readings");
        let (table, report) = normalize_with_report(table);
        IngestMetrics::record_coerced_missing(report.timestamps_missing, report.numbers_missing);
        Ok(table)
    }
}
