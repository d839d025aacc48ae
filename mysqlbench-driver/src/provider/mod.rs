//! Managed MySQL services the benchmark can provision.

pub mod cloud_sql;
pub mod rds;

use mysqlbench_common::{BenchError, Result};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::command::CommandRunner;
use crate::config::{Cloud, RunConfig};

pub use cloud_sql::CloudSql;
pub use rds::Rds;

/// A provisioned, reachable DB instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbInstance {
    pub name: String,
    pub address: String,
}

/// Lifecycle of one managed DB instance.
pub trait MysqlService: Send {
    /// Create the instance and wait until it accepts connections.
    fn prepare(&mut self) -> impl Future<Output = Result<DbInstance>> + Send;

    /// Delete whatever `prepare` created. A no-op when nothing was created.
    fn cleanup(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// How often, and how many times, instance status is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub limit: u32,
}

impl PollPolicy {
    pub fn from_config(config: &RunConfig) -> Self {
        Self { interval: config.poll_interval(), limit: config.poll_limit }
    }
}

/// Parse a CLI's `--format=json` / `--output=json` stdout.
pub fn parse_json(stdout: &str) -> Result<Value> {
    serde_json::from_str(stdout)
        .map_err(|e| BenchError::InvalidResponse(format!("{e}; stdout is {stdout}")))
}

/// Run `status_argv` until `is_ready` accepts the response, at most
/// `policy.limit` times, sleeping `policy.interval` between queries.
pub async fn poll_until_ready<R, F>(
    runner: &R,
    status_argv: &[String],
    policy: PollPolicy,
    mut is_ready: F,
) -> Result<Value>
where
    R: CommandRunner,
    F: FnMut(&Value) -> Result<bool> + Send,
{
    let mut query_count: u32 = 1;
    loop {
        let output = runner.run(status_argv).await?;
        let response = parse_json(&output.stdout)?;
        if is_ready(&response)? {
            return Ok(response);
        }
        if query_count >= policy.limit {
            return Err(BenchError::CreationTimedOut {
                interval_secs: policy.interval.as_secs(),
                limit: policy.limit,
            });
        }
        tracing::info!("DB instance not ready yet, query count is {}", query_count);
        tokio::time::sleep(policy.interval).await;
        query_count += 1;
    }
}

/// The service selected by `--cloud`.
pub enum Provider<R> {
    CloudSql(CloudSql<R>),
    Rds(Rds<R>),
}

impl<R: CommandRunner> Provider<R> {
    pub fn for_cloud(runner: R, config: &RunConfig) -> Self {
        match config.cloud {
            Cloud::Gcp => Provider::CloudSql(CloudSql::new(runner, config)),
            Cloud::Aws => Provider::Rds(Rds::new(runner, config)),
        }
    }
}

impl<R: CommandRunner> MysqlService for Provider<R> {
    async fn prepare(&mut self) -> Result<DbInstance> {
        match self {
            Provider::CloudSql(p) => p.prepare().await,
            Provider::Rds(p) => p.prepare().await,
        }
    }

    async fn cleanup(&mut self) -> Result<()> {
        match self {
            Provider::CloudSql(p) => p.cleanup().await,
            Provider::Rds(p) => p.cleanup().await,
        }
    }
}
