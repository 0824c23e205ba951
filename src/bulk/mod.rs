//! Bounded-concurrency runs over address lists, collected into an ordered
//! report or streamed as pipelines complete.

mod pool;
mod types;

pub use pool::ResultStream;
pub use types::{BulkError, BulkJob, BulkReport, Completed, Summary};

use std::sync::Arc;

use crate::disposable::DisposableDomains;
use crate::resolver::{DnsError, DnsLookup, SystemDns};
use crate::smtp::{Connector, TcpConnector};
use crate::verifier::Verifier;

use pool::{collect_report, spawn_pool};

/// Either consumption mode of a [`BulkJob`].
#[derive(Debug)]
pub enum BulkOutput {
    Report(BulkReport),
    Stream(ResultStream),
}

/// Runs jobs against one resolver and connector. Each job gets its own
/// catch-all cache, so nothing learned in one job leaks into the next.
#[derive(Debug)]
pub struct BulkRunner<D = SystemDns, C = TcpConnector> {
    dns: Arc<D>,
    connector: Arc<C>,
    disposable: DisposableDomains,
}

impl BulkRunner {
    pub fn system(timeout: std::time::Duration) -> Result<Self, DnsError> {
        let dns = SystemDns::from_system_conf(timeout)?;
        let connector = TcpConnector::default().with_resolver(dns.clone());
        Ok(Self::new(dns, connector))
    }
}

impl<D, C> BulkRunner<D, C>
where
    D: DnsLookup + 'static,
    C: Connector + 'static,
{
    pub fn new(dns: D, connector: C) -> Self {
        Self {
            dns: Arc::new(dns),
            connector: Arc::new(connector),
            disposable: DisposableDomains::builtin(),
        }
    }

    pub fn with_disposable(mut self, disposable: DisposableDomains) -> Self {
        self.disposable = disposable;
        self
    }

    pub fn dns(&self) -> &D {
        &self.dns
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Dispatches on [`BulkJob::streaming`].
    pub fn run(&self, job: BulkJob) -> Result<BulkOutput, BulkError> {
        if job.streaming {
            self.run_streaming(job).map(BulkOutput::Stream)
        } else {
            self.run_aggregate(job).map(BulkOutput::Report)
        }
    }

    /// Blocks until every address is done; results follow input order.
    pub fn run_aggregate(&self, job: BulkJob) -> Result<BulkReport, BulkError> {
        let (stream, addresses) = self.start(job)?;
        let report = collect_report(stream, &addresses);
        tracing::info!(total = report.total, summary = ?report.summary, "bulk job finished");
        Ok(report)
    }

    /// Returns immediately; results arrive in completion order.
    pub fn run_streaming(&self, job: BulkJob) -> Result<ResultStream, BulkError> {
        self.start(job).map(|(stream, _)| stream)
    }

    fn start(&self, job: BulkJob) -> Result<(ResultStream, Arc<[String]>), BulkError> {
        let BulkJob {
            addresses,
            concurrency,
            config,
            ..
        } = job;
        let verifier = Verifier::new(config, Arc::clone(&self.dns), Arc::clone(&self.connector))
            .with_disposable(self.disposable.clone());
        let addresses: Arc<[String]> = addresses.into();
        let stream = spawn_pool(Arc::new(verifier), Arc::clone(&addresses), concurrency)?;
        Ok((stream, addresses))
    }
}
