//! sysbench 0.5 command lines for the data-load and OLTP phases.

use crate::config::{RunConfig, MYSQL_ROOT_USER};

pub const PREPARE_SCRIPT_PATH: &str = "/usr/share/doc/sysbench/tests/db/parallel_prepare.lua";
pub const OLTP_SCRIPT_PATH: &str = "/usr/share/doc/sysbench/tests/db/oltp.lua";

const RAND_INIT_ON: &str = "on";
const DISABLE: &str = "disable";
const UNIFORM: &str = "uniform";
const OFF: &str = "off";

/// Loads `oltp_tables_count` tables in parallel, one thread per table.
pub fn prepare_command(config: &RunConfig, db_host: &str) -> String {
    [
        "sysbench".to_string(),
        format!("--test={PREPARE_SCRIPT_PATH}"),
        format!("--oltp_tables_count={}", config.oltp_tables_count),
        format!("--oltp-table-size={}", config.oltp_table_size),
        format!("--rand-init={RAND_INIT_ON}"),
        format!("--num-threads={}", config.oltp_tables_count),
        format!("--mysql-user={MYSQL_ROOT_USER}"),
        format!("--mysql-password=\"{}\"", config.mysql_password),
        format!("--mysql-host={db_host}"),
        "run".to_string(),
    ]
    .join(" ")
}

/// OLTP read/write run lasting `duration_secs`.
pub fn oltp_run_command(config: &RunConfig, db_host: &str, duration_secs: u64) -> String {
    [
        "sysbench".to_string(),
        format!("--test={OLTP_SCRIPT_PATH}"),
        format!("--oltp_tables_count={}", config.oltp_tables_count),
        format!("--oltp-table-size={}", config.oltp_table_size),
        format!("--rand-init={RAND_INIT_ON}"),
        format!("--db-ps-mode={DISABLE}"),
        format!("--oltp-dist-type={UNIFORM}"),
        format!("--oltp-read-only={OFF}"),
        format!("--num-threads={}", config.sysbench_thread_count),
        format!("--percentile={}", config.sysbench_latency_percentile),
        format!("--report-interval={}", config.sysbench_report_interval),
        format!("--max-time={duration_secs}"),
        format!("--mysql-user={MYSQL_ROOT_USER}"),
        format!("--mysql-password=\"{}\"", config.mysql_password),
        format!("--mysql-host={db_host}"),
        "run".to_string(),
    ]
    .join(" ")
}

/// Creates the `sbtest` database sysbench writes into.
pub fn create_database_command(config: &RunConfig, db_host: &str) -> String {
    let password = if config.mysql_password.is_empty() {
        String::new()
    } else {
        format!(" --password=\"{}\"", config.mysql_password)
    };
    format!("mysql -u {MYSQL_ROOT_USER}{password} -h {db_host} -e 'create database sbtest;'")
}
