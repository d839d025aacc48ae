use mysqlbench_common::{ParseError, ResponseTimeToken};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// The tps value runs to the next comma, or to the end of a truncated line.
static TPS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"tps:([^,]*)").unwrap());

static RESPONSE_TIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*response time:").unwrap());

static TOKEN_REGEXES: LazyLock<Vec<(ResponseTimeToken, Regex)>> = LazyLock::new(|| {
    ResponseTimeToken::ALL
        .iter()
        .map(|&token| {
            let pattern = format!(r"\b{}:\s*([0-9]+(?:\.[0-9]+)?)ms", token.as_str());
            (token, Regex::new(&pattern).unwrap())
        })
        .collect()
});

const GENERAL_STATISTICS_HEADER: &str = "General statistics:";

/// Where the scanner is within a sysbench report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Scanning,
    InGeneralStats,
    InResponseTime,
}

/// Latency values (milliseconds) found under `response time:`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseTimeSummary(BTreeMap<ResponseTimeToken, f64>);

impl ResponseTimeSummary {
    pub fn get(&self, token: ResponseTimeToken) -> Option<f64> {
        self.0.get(&token).copied()
    }

    pub fn insert(&mut self, token: ResponseTimeToken, value_ms: f64) {
        self.0.insert(token, value_ms);
    }

    /// Tokens that were never matched, in report order.
    pub fn missing(&self) -> Vec<ResponseTimeToken> {
        ResponseTimeToken::ALL
            .into_iter()
            .filter(|t| !self.0.contains_key(t))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Present tokens in report order.
    pub fn iter(&self) -> impl Iterator<Item = (ResponseTimeToken, f64)> + '_ {
        self.0.iter().map(|(t, v)| (*t, *v))
    }
}

/// Everything pulled out of one measurement run's output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOutput {
    pub samples: Vec<f64>,
    pub response_times: ResponseTimeSummary,
    /// One `MalformedSample` per progress line whose tps value was unusable.
    pub warnings: Vec<ParseError>,
}

/// Single forward pass over sysbench output.
pub fn scan(output: &str) -> ScanOutput {
    let mut state = ScanState::Scanning;
    let mut result = ScanOutput::default();

    for (idx, line) in output.lines().enumerate() {
        if line.starts_with('[') {
            scan_progress_line(idx + 1, line, &mut result);
            continue;
        }

        state = match state {
            ScanState::Scanning if line.starts_with(GENERAL_STATISTICS_HEADER) => {
                ScanState::InGeneralStats
            }
            ScanState::InGeneralStats if RESPONSE_TIME_REGEX.is_match(line) => {
                ScanState::InResponseTime
            }
            ScanState::InResponseTime => {
                scan_response_time_line(line, &mut result.response_times);
                ScanState::InResponseTime
            }
            other => other,
        };
    }

    result
}

fn scan_progress_line(line_no: usize, line: &str, result: &mut ScanOutput) {
    let Some(caps) = TPS_REGEX.captures(line) else {
        tracing::debug!("Progress line {} has no tps value: {}", line_no, line);
        return;
    };
    let text = caps[1].trim();
    match text.parse::<f64>() {
        Ok(tps) if tps.is_finite() => result.samples.push(tps),
        _ => {
            tracing::warn!("Skipping malformed tps value {:?} on line {}", text, line_no);
            result.warnings.push(ParseError::MalformedSample {
                line: line_no,
                text: text.to_string(),
            });
        }
    }
}

fn scan_response_time_line(line: &str, summary: &mut ResponseTimeSummary) {
    for (token, regex) in TOKEN_REGEXES.iter() {
        let value = regex.captures(line).and_then(|caps| caps[1].parse::<f64>().ok());
        if let Some(value) = value {
            summary.insert(*token, value);
        }
    }
}
