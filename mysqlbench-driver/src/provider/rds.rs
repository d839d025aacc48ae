use mysqlbench_common::{BenchError, Result};
use serde_json::Value;

use super::{parse_json, poll_until_ready, DbInstance, MysqlService, PollPolicy};
use crate::command::CommandRunner;
use crate::config::{RunConfig, MYSQL_ROOT_USER};

/// gp2 size giving roughly 12.5K mixed IOPS, matching Cloud SQL's default PD-SSD.
pub const DB_STORAGE_SIZE_EBS_GP: u32 = 4170;

const STATUS_AVAILABLE: &str = "available";

/// Instance class with `cores` vCPUs.
pub fn instance_class(cores: &str) -> &'static str {
    match cores {
        "1" => "db.m3.medium",
        "4" => "db.m4.xlarge",
        "8" => "db.m4.2xlarge",
        "16" => "db.m4.4xlarge",
        // Other core counts are rejected by the CLI; use the 8-core default.
        _ => "db.m4.2xlarge",
    }
}

/// MySQL on Amazon RDS, driven through `aws rds`.
///
/// The DB subnet group must already exist; it is passed in with
/// `--rds-subnet-group`.
pub struct Rds<R> {
    runner: R,
    aws_path: String,
    identifier: String,
    instance_class: &'static str,
    zone: String,
    subnet_group: Option<String>,
    master_password: String,
    poll: PollPolicy,
    /// Set once a create command has been issued; cleanup deletes from then on.
    requested: bool,
}

impl<R: CommandRunner> Rds<R> {
    pub fn new(runner: R, config: &RunConfig) -> Self {
        Self {
            runner,
            aws_path: config.aws_path.clone(),
            identifier: config.instance_name(),
            instance_class: instance_class(&config.db_instance_cores),
            zone: config.zone.clone(),
            subnet_group: config.rds_subnet_group.clone(),
            master_password: config.mysql_password.clone(),
            poll: PollPolicy::from_config(config),
            requested: false,
        }
    }

    fn rds_command(&self, args: &[String]) -> Vec<String> {
        let mut argv = vec![self.aws_path.clone(), "--output=json".to_string(), "rds".to_string()];
        argv.extend_from_slice(args);
        argv
    }

    pub fn create_command(&self, subnet_group: &str) -> Vec<String> {
        self.rds_command(&[
            "create-db-instance".to_string(),
            "--db-instance-identifier".to_string(),
            self.identifier.clone(),
            "--db-instance-class".to_string(),
            self.instance_class.to_string(),
            "--engine".to_string(),
            "mysql".to_string(),
            "--master-username".to_string(),
            MYSQL_ROOT_USER.to_string(),
            "--master-user-password".to_string(),
            self.master_password.clone(),
            "--allocated-storage".to_string(),
            DB_STORAGE_SIZE_EBS_GP.to_string(),
            "--storage-type".to_string(),
            "gp2".to_string(),
            "--no-multi-az".to_string(),
            "--db-subnet-group-name".to_string(),
            subnet_group.to_string(),
            "--availability-zone".to_string(),
            self.zone.clone(),
        ])
    }

    pub fn describe_command(&self) -> Vec<String> {
        self.rds_command(&[
            "describe-db-instances".to_string(),
            "--db-instance-identifier".to_string(),
            self.identifier.clone(),
        ])
    }

    pub fn delete_command(&self) -> Vec<String> {
        self.rds_command(&[
            "delete-db-instance".to_string(),
            "--db-instance-identifier".to_string(),
            self.identifier.clone(),
            "--skip-final-snapshot".to_string(),
        ])
    }
}

fn is_available(response: &Value) -> Result<bool> {
    let status = response
        .pointer("/DBInstances/0/DBInstanceStatus")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            BenchError::InvalidResponse(format!("Status response has no DBInstanceStatus: {response}"))
        })?;
    tracing::info!("RDS instance status is {}", status);
    Ok(status == STATUS_AVAILABLE)
}

fn endpoint_address(response: &Value) -> Result<String> {
    response
        .pointer("/DBInstances/0/Endpoint/Address")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BenchError::InvalidResponse(format!("No endpoint address in {response}")))
}

impl<R: CommandRunner> MysqlService for Rds<R> {
    async fn prepare(&mut self) -> Result<DbInstance> {
        tracing::info!("Preparing MySQL Service benchmarks for RDS.");

        let subnet_group = self.subnet_group.clone().ok_or_else(|| {
            BenchError::InstanceCreation("RDS needs an existing DB subnet group".to_string())
        })?;
        // RDS rejects master passwords shorter than 8 characters.
        if self.master_password.len() < 8 {
            return Err(BenchError::InstanceCreation(
                "RDS needs a MySQL password of at least 8 characters".to_string(),
            ));
        }

        self.requested = true;
        let output = self.runner.run(&self.create_command(&subnet_group)).await?;
        let response = parse_json(&output.stdout)?;
        if response.get("DBInstance").map_or(true, Value::is_null) {
            return Err(BenchError::InstanceCreation(format!(
                "No DBInstance in creation response: {response}"
            )));
        }

        let response =
            poll_until_ready(&self.runner, &self.describe_command(), self.poll, is_available).await?;
        let address = endpoint_address(&response)?;
        tracing::info!("Successfully created the DB instance {}, endpoint is {}", self.identifier, address);

        Ok(DbInstance { name: self.identifier.clone(), address })
    }

    async fn cleanup(&mut self) -> Result<()> {
        if !self.requested {
            tracing::info!("No RDS instance was requested, no need to cleanup.");
            return Ok(());
        }
        let output = self.runner.run(&self.delete_command()).await?;
        tracing::info!("DB cleanup command issued, stdout is {}", output.stdout.trim());
        self.requested = false;
        Ok(())
    }
}
