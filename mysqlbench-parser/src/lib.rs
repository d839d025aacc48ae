//! Turns the text sysbench prints for an OLTP run into published metrics.
//!
//! Progress lines (`[ 10s] threads: 16, tps: 120.50, ...`) feed a throughput
//! series summarised by nearest-rank percentiles; the `General statistics:`
//! block supplies the latency summary.

pub mod assembler;
pub mod percentile;
pub mod scanner;

use mysqlbench_common::Metric;
use std::time::Duration;

pub use assembler::{ParseReport, ParserConfig};
pub use percentile::TpsStatistics;
pub use scanner::{ResponseTimeSummary, ScanOutput, ScanState};

/// Parser for a single benchmark run.
pub struct SysbenchParser {
    config: ParserConfig,
}

impl SysbenchParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Metric for the data-load phase, timed by the caller.
    pub fn prepare_metric(&self, elapsed: Duration) -> Metric {
        assembler::prepare_time_metric(elapsed, &self.config)
    }

    /// Scan the measured run's stdout and build its metrics.
    pub fn parse(&self, output: &str) -> ParseReport {
        assembler::assemble(scanner::scan(output), &self.config)
    }
}
