use thiserror::Error;

use crate::classifier::{Status, ValidationResult};
use crate::options::ProbeConfig;

/// Addresses of one run. Duplicates are probed independently.
#[derive(Debug, Clone)]
pub struct BulkJob {
    pub addresses: Vec<String>,
    /// Maximum number of pipelines running at once. Must be positive.
    pub concurrency: usize,
    /// Emit results as they complete instead of collecting a report.
    pub streaming: bool,
    pub config: ProbeConfig,
}

impl BulkJob {
    pub fn new(addresses: Vec<String>, concurrency: usize) -> Self {
        Self {
            addresses,
            concurrency,
            streaming: false,
            config: ProbeConfig::default(),
        }
    }

    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_config(mut self, config: ProbeConfig) -> Self {
        self.config = config;
        self
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub deliverable: usize,
    pub undeliverable: usize,
    pub unknown: usize,
    /// `invalid_syntax` and `invalid_domain` together.
    pub invalid: usize,
}

impl Summary {
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Deliverable => self.deliverable += 1,
            Status::Undeliverable => self.undeliverable += 1,
            Status::Unknown => self.unknown += 1,
            Status::InvalidSyntax | Status::InvalidDomain => self.invalid += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.deliverable + self.undeliverable + self.unknown + self.invalid
    }
}

impl<'a> FromIterator<&'a ValidationResult> for Summary {
    fn from_iter<I: IntoIterator<Item = &'a ValidationResult>>(iter: I) -> Self {
        let mut summary = Self::default();
        for result in iter {
            summary.record(result.status);
        }
        summary
    }
}

/// Results in input order with their status counts.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReport {
    pub results: Vec<ValidationResult>,
    pub summary: Summary,
    pub total: usize,
}

/// One finished pipeline. `index` is the position in the submitted list.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub index: usize,
    pub result: ValidationResult,
}

#[derive(Debug, Error)]
pub enum BulkError {
    #[error("concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),
    #[error("failed to spawn worker thread: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },
}

impl BulkError {
    pub(crate) fn spawn(source: std::io::Error) -> Self {
        Self::Spawn { source }
    }
}
