use mysqlbench_common::{Metadata, Metric, ParseError, ResponseTimeToken, Unit};
use std::time::Duration;

use crate::percentile::{percentile_label, TpsStatistics};
use crate::scanner::ScanOutput;

pub const RESULT_NAME_PREPARE: &str = "sysbench prepare time";
pub const RESULT_NAME_TPS: &str = "sysbench tps";
pub const RESULT_NAME_LATENCY: &str = "sysbench latency";

/// Parameters of the run that shape metric names and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
    /// The `--percentile` sysbench was asked to report.
    pub latency_percentile: u32,
    pub metadata: Metadata,
}

/// Metrics built from one run plus every problem met along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub metrics: Vec<Metric>,
    pub issues: Vec<ParseError>,
}

impl ParseReport {
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

pub fn prepare_time_metric(elapsed: Duration, config: &ParserConfig) -> Metric {
    Metric::new(RESULT_NAME_PREPARE, elapsed.as_secs_f64(), Unit::Seconds, &config.metadata)
}

pub fn assemble(scan: ScanOutput, config: &ParserConfig) -> ParseReport {
    let mut report = ParseReport { metrics: Vec::new(), issues: scan.warnings };

    let tps_line = scan.samples.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ");
    tracing::info!("All TPS numbers: \n {}", tps_line);

    match TpsStatistics::from_samples(&scan.samples) {
        Ok(stats) => push_tps_metrics(&stats, config, &mut report.metrics),
        Err(e) => {
            tracing::warn!("{}", e);
            report.issues.push(e);
        }
    }

    for (token, value) in scan.response_times.iter() {
        tracing::info!("{}_response_time is {}", token, value);
        report.metrics.push(Metric::new(
            latency_metric_name(token, config.latency_percentile),
            value,
            Unit::Milliseconds,
            &config.metadata,
        ));
    }

    let missing = scan.response_times.missing();
    if !missing.is_empty() {
        let issue = ParseError::IncompleteSummary { missing };
        tracing::warn!("{}", issue);
        report.issues.push(issue);
    }

    report
}

fn push_tps_metrics(stats: &TpsStatistics, config: &ParserConfig, metrics: &mut Vec<Metric>) {
    let tps = |suffix: &str, value: f64| {
        Metric::new(format!("{RESULT_NAME_TPS} {suffix}"), value, Unit::None, &config.metadata)
    };

    for &(p, value) in &stats.percentiles {
        let label = percentile_label(p);
        tracing::info!("{} tps {}", label, value);
        metrics.push(tps(&label, value));
    }

    tracing::info!("tps average {} stddev {}", stats.average, stats.stddev);
    metrics.push(tps("average", stats.average));
    metrics.push(tps("stddev", stats.stddev));

    if let Some(cv) = stats.coefficient_of_variation() {
        tracing::info!("tps coefficient of variation {}", cv);
        metrics.push(tps("cv", cv));
    }
}

fn latency_metric_name(token: ResponseTimeToken, latency_percentile: u32) -> String {
    match token {
        ResponseTimeToken::Percentile => {
            format!("{RESULT_NAME_LATENCY} {token} {latency_percentile}")
        }
        _ => format!("{RESULT_NAME_LATENCY} {token}"),
    }
}
