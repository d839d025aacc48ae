use mysqlbench_common::{BenchError, Result};
use serde_json::Value;

use super::{parse_json, poll_until_ready, DbInstance, MysqlService, PollPolicy};
use crate::command::CommandRunner;
use crate::config::RunConfig;

const DEFAULT_BACKUP_START_TIME: &str = "07:00";
const GCP_MY_SQL_VERSION: &str = "MYSQL_5_6";
const GCP_PRICING_PLAN: &str = "PACKAGE";
const STATE_RUNNABLE: &str = "RUNNABLE";

/// MySQL on Google Cloud SQL, driven through `gcloud sql instances`.
pub struct CloudSql<R> {
    runner: R,
    gcloud_path: String,
    instance_name: String,
    tier: String,
    zone: String,
    authorized_network: String,
    poll: PollPolicy,
    /// Set once a create command has been issued; cleanup deletes from then on.
    requested: bool,
}

impl<R: CommandRunner> CloudSql<R> {
    pub fn new(runner: R, config: &RunConfig) -> Self {
        Self {
            runner,
            gcloud_path: config.gcloud_path.clone(),
            instance_name: config.instance_name(),
            tier: format!("db-n1-standard-{}", config.db_instance_cores),
            // Same zone as the client machine.
            zone: config.zone.clone(),
            // Cloud SQL is reached over external IPs only.
            authorized_network: format!("{}/32", config.client_ip),
            poll: PollPolicy::from_config(config),
            requested: false,
        }
    }

    pub fn create_command(&self) -> Vec<String> {
        let mut argv = self.instances_command(&["create", self.instance_name.as_str()]);
        argv.extend(
            [
                "--quiet".to_string(),
                "--format=json".to_string(),
                "--async".to_string(),
                "--activation-policy=ALWAYS".to_string(),
                "--assign-ip".to_string(),
                format!("--authorized-networks={}", self.authorized_network),
                format!("--backup-start-time={DEFAULT_BACKUP_START_TIME}"),
                "--enable-bin-log".to_string(),
                format!("--tier={}", self.tier),
                format!("--gce-zone={}", self.zone),
                format!("--database-version={GCP_MY_SQL_VERSION}"),
                format!("--pricing-plan={GCP_PRICING_PLAN}"),
            ],
        );
        argv
    }

    pub fn describe_command(&self) -> Vec<String> {
        self.instances_command(&["describe", self.instance_name.as_str(), "--format", "json"])
    }

    pub fn delete_command(&self) -> Vec<String> {
        self.instances_command(&["delete", self.instance_name.as_str(), "--quiet"])
    }

    fn instances_command(&self, args: &[&str]) -> Vec<String> {
        [self.gcloud_path.as_str(), "sql", "instances"]
            .iter()
            .chain(args)
            .map(|s| s.to_string())
            .collect()
    }
}

fn check_create_response(response: &Value) -> Result<()> {
    let operation_ok = response.get("operation").is_some_and(|op| !op.is_null());
    let operation_type = response.get("operationType").and_then(Value::as_str);
    if !operation_ok || operation_type != Some("CREATE") {
        return Err(BenchError::InstanceCreation(format!(
            "Invalid operation or unrecognized operationType in DB creation response: {response}"
        )));
    }
    Ok(())
}

fn is_runnable(response: &Value) -> Result<bool> {
    let state = response.get("state").and_then(Value::as_str).ok_or_else(|| {
        BenchError::InvalidResponse(format!("Status response has no state: {response}"))
    })?;
    tracing::info!("Cloud SQL instance state is {}", state);
    Ok(state == STATE_RUNNABLE)
}

fn instance_ip(response: &Value) -> Result<String> {
    response
        .pointer("/ipAddresses/0/ipAddress")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BenchError::InvalidResponse(format!("No ipAddresses in {response}")))
}

impl<R: CommandRunner> MysqlService for CloudSql<R> {
    async fn prepare(&mut self) -> Result<DbInstance> {
        tracing::info!("Preparing MySQL Service benchmarks for Google Cloud SQL.");

        self.requested = true;
        let output = self.runner.run(&self.create_command()).await?;
        check_create_response(&parse_json(&output.stdout)?)?;

        let response =
            poll_until_ready(&self.runner, &self.describe_command(), self.poll, is_runnable).await?;
        let address = instance_ip(&response)?;
        tracing::info!("Successfully created the DB instance {}, IP address is {}", self.instance_name, address);

        Ok(DbInstance { name: self.instance_name.clone(), address })
    }

    async fn cleanup(&mut self) -> Result<()> {
        if !self.requested {
            tracing::info!("No Cloud SQL instance was requested, no need to cleanup.");
            return Ok(());
        }
        let output = self.runner.run(&self.delete_command()).await?;
        tracing::info!("DB cleanup command issued, stdout is {}", output.stdout.trim());
        self.requested = false;
        Ok(())
    }
}
