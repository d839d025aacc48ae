use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Throughput percentiles reported for every measured run.
pub const PERCENTILES: [f64; 6] = [1.0, 5.0, 50.0, 90.0, 99.0, 99.9];

/// Unit tag attached to every published metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "NA")]
    None,
    #[serde(rename = "seconds")]
    Seconds,
    #[serde(rename = "milliseconds")]
    Milliseconds,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::None => "NA",
            Unit::Seconds => "seconds",
            Unit::Milliseconds => "milliseconds",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar run-configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Int(i64),
    Text(String),
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Int(v)
    }
}

impl From<u32> for MetadataValue {
    fn from(v: u32) -> Self {
        MetadataValue::Int(i64::from(v))
    }
}

impl From<u64> for MetadataValue {
    fn from(v: u64) -> Self {
        i64::try_from(v)
            .map(MetadataValue::Int)
            .unwrap_or_else(|_| MetadataValue::Text(v.to_string()))
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::Text(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::Text(v)
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Int(v) => write!(f, "{v}"),
            MetadataValue::Text(v) => f.write_str(v),
        }
    }
}

/// Run-configuration snapshot attached unchanged to every metric.
/// Ordered so serialized output is stable across runs.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// One published result record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    #[serde(rename = "metric")]
    pub name: String,
    pub value: f64,
    pub unit: Unit,
    pub metadata: Metadata,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64, unit: Unit, metadata: &Metadata) -> Self {
        Self { name: name.into(), value, unit, metadata: metadata.clone() }
    }
}

/// Keys of the latency block printed under `response time:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseTimeToken {
    Min,
    Avg,
    Max,
    Percentile,
}

impl ResponseTimeToken {
    pub const ALL: [ResponseTimeToken; 4] = [
        ResponseTimeToken::Min,
        ResponseTimeToken::Avg,
        ResponseTimeToken::Max,
        ResponseTimeToken::Percentile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseTimeToken::Min => "min",
            ResponseTimeToken::Avg => "avg",
            ResponseTimeToken::Max => "max",
            ResponseTimeToken::Percentile => "percentile",
        }
    }
}

impl fmt::Display for ResponseTimeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn join_tokens(tokens: &[ResponseTimeToken]) -> String {
    tokens.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
}

/// Problems found while turning sysbench output into metrics. None of them
/// abort a run; they are collected next to whatever metrics could be built.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseError {
    #[error("No throughput samples to compute statistics from")]
    EmptySeries,

    #[error("Response time summary incomplete, missing: {}", join_tokens(.missing))]
    IncompleteSummary { missing: Vec<ResponseTimeToken> },

    #[error("Malformed tps sample on line {line}: {text:?}")]
    MalformedSample { line: usize, text: String },
}

/// Error types for provisioning, command execution and publishing
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BenchError {
    #[error("Command `{command}` exited with status {status:?}: {stderr}")]
    CommandFailed { command: String, status: Option<i32>, stderr: String },

    #[error("Failed to spawn command: {0}")]
    Spawn(String),

    #[error("DB instance creation failed: {0}")]
    InstanceCreation(String),

    #[error("DB creation timed out, waited at least {interval_secs} * {limit} seconds")]
    CreationTimedOut { interval_secs: u64, limit: u32 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP {0}: {1}")]
    HttpError(u16, String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// JSON error envelope returned by a results endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, BenchError>;
