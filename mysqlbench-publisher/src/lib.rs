use mysqlbench_common::{BenchError, ErrorResponse, Metric, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Body POSTed to a results endpoint.
#[derive(Debug, Serialize)]
pub struct RunResults<'a> {
    pub run_uri: &'a str,
    pub metrics: &'a [Metric],
}

/// One line of a JSON-lines results file.
#[derive(Debug, Serialize)]
struct MetricLine<'a> {
    run_uri: &'a str,
    #[serde(flatten)]
    metric: &'a Metric,
}

/// HTTP publisher configuration
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Base URL of the results service, e.g. `http://results:8080`.
    pub endpoint: String,
}

/// Publishes a run's metrics to a results service over HTTP
pub struct HttpPublisher {
    pub config: PublisherConfig,
    http_client: reqwest::Client,
}

impl HttpPublisher {
    pub fn new(config: PublisherConfig) -> Self {
        Self { config, http_client: reqwest::Client::new() }
    }

    /// Build the URL that receives the metrics of `run_uri`.
    pub fn build_run_url(&self, run_uri: &str) -> String {
        format!("{}/runs/{}/samples", self.config.endpoint.trim_end_matches('/'), run_uri)
    }

    pub async fn publish(&self, run_uri: &str, metrics: &[Metric]) -> Result<()> {
        let url = self.build_run_url(run_uri);
        tracing::debug!("Publishing {} metrics to {}", metrics.len(), url);

        let response = self
            .http_client
            .post(&url)
            .json(&RunResults { run_uri, metrics })
            .send()
            .await
            .map_err(|e| BenchError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(parse_error_response(status, response).await);
        }

        tracing::info!("Published {} metrics for run {}", metrics.len(), run_uri);
        Ok(())
    }
}

async fn parse_error_response(status: reqwest::StatusCode, response: reqwest::Response) -> BenchError {
    let error_msg = response
        .json::<ErrorResponse>()
        .await
        .map(|r| r.error)
        .unwrap_or_else(|_| format!("Server returned status: {}", status));

    BenchError::HttpError(status.as_u16(), error_msg)
}

/// Appends one JSON object per metric to a local file
#[derive(Debug, Clone)]
pub struct JsonLinesPublisher {
    pub path: PathBuf,
}

impl JsonLinesPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn publish(&self, run_uri: &str, metrics: &[Metric]) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| BenchError::Io(format!("{}: {e}", self.path.display())))?;
        let mut writer = BufWriter::new(file);

        for metric in metrics {
            serde_json::to_writer(&mut writer, &MetricLine { run_uri, metric })
                .map_err(|e| BenchError::Io(e.to_string()))?;
            writer.write_all(b"\n").map_err(|e| BenchError::Io(e.to_string()))?;
        }
        writer.flush().map_err(|e| BenchError::Io(e.to_string()))?;

        tracing::info!("Wrote {} metrics to {}", metrics.len(), self.path.display());
        Ok(())
    }
}

/// Where a finished run's metrics go.
pub enum ResultSink {
    Http(HttpPublisher),
    JsonLines(JsonLinesPublisher),
}

impl ResultSink {
    pub async fn publish(&self, run_uri: &str, metrics: &[Metric]) -> Result<()> {
        match self {
            ResultSink::Http(p) => p.publish(run_uri, metrics).await,
            ResultSink::JsonLines(p) => p.publish(run_uri, metrics),
        }
    }
}
