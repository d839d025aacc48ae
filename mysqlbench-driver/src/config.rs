use clap::{Args, ValueEnum};
use mysqlbench_common::Metadata;
use mysqlbench_parser::ParserConfig;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Query DB creation status once every 15 seconds.
pub const DB_CREATION_STATUS_QUERY_INTERVAL_SECS: u64 = 15;

/// Total wait is `interval * limit`.
pub const DB_CREATION_STATUS_QUERY_LIMIT: u32 = 100;

pub const MYSQL_ROOT_USER: &str = "root";

/// Cloud provider hosting the managed MySQL instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Cloud {
    /// Google Cloud SQL
    Gcp,
    /// Amazon RDS
    Aws,
}

/// Run parameters shared by provisioning, sysbench and the parser.
#[derive(Args, Debug, Clone)]
pub struct RunConfig {
    /// Cloud provider of the DB instance
    #[arg(long, value_enum, default_value_t = Cloud::Gcp)]
    pub cloud: Cloud,

    /// The number of cores to be provisioned for the DB instance
    #[arg(long, default_value = "8", value_parser = ["1", "4", "8", "16"])]
    pub db_instance_cores: String,

    /// The number of tables used in sysbench oltp.lua tests
    #[arg(long, default_value_t = 4)]
    pub oltp_tables_count: u32,

    /// The number of rows of each table used in the oltp tests
    #[arg(long, default_value_t = 100_000)]
    pub oltp_table_size: u64,

    /// Duration of the warmup run whose results are discarded (0 disables it)
    #[arg(long, default_value_t = 120)]
    pub sysbench_warmup_seconds: u64,

    /// Duration of the measured run
    #[arg(long, default_value_t = 480, value_parser = clap::value_parser!(u64).range(1..))]
    pub sysbench_run_seconds: u64,

    /// The number of test threads on the client side
    #[arg(long, default_value_t = 16)]
    pub sysbench_thread_count: u32,

    /// The latency percentile sysbench is asked to compute
    #[arg(long, default_value_t = 99, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub sysbench_latency_percentile: u32,

    /// Seconds between sysbench progress reports
    #[arg(long, default_value_t = 2)]
    pub sysbench_report_interval: u32,

    /// ssh destination of the client machine that runs sysbench
    #[arg(long)]
    pub client_host: String,

    /// Public address of the client machine, authorized on the DB instance
    #[arg(long)]
    pub client_ip: String,

    /// Zone of the client machine; the DB instance is created in it
    #[arg(long)]
    pub zone: String,

    /// ssh login user on the client machine
    #[arg(long)]
    pub ssh_user: Option<String>,

    /// ssh private key for the client machine
    #[arg(long)]
    pub ssh_key: Option<PathBuf>,

    /// Password of the MySQL root user
    #[arg(long, default_value = "")]
    pub mysql_password: String,

    #[arg(long, default_value = "gcloud")]
    pub gcloud_path: String,

    #[arg(long, default_value = "aws")]
    pub aws_path: String,

    /// Existing DB subnet group for RDS instances
    #[arg(long)]
    pub rds_subnet_group: Option<String>,

    /// Identifier of this run; names the DB instance
    #[arg(long, default_value_t = new_run_uri())]
    pub run_uri: String,

    #[arg(long, default_value_t = DB_CREATION_STATUS_QUERY_INTERVAL_SECS)]
    pub poll_interval_secs: u64,

    #[arg(long, default_value_t = DB_CREATION_STATUS_QUERY_LIMIT)]
    pub poll_limit: u32,
}

impl RunConfig {
    pub fn instance_name(&self) -> String {
        format!("pkb{}", self.run_uri)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Configuration snapshot attached to every published metric.
    pub fn metadata(&self) -> Metadata {
        let mut m = Metadata::new();
        m.insert("oltp_tables_count".to_string(), self.oltp_tables_count.into());
        m.insert("oltp_table_size".to_string(), self.oltp_table_size.into());
        m.insert("db_instance_cores".to_string(), self.db_instance_cores.as_str().into());
        m.insert("sysbench_warm_up_seconds".to_string(), self.sysbench_warmup_seconds.into());
        m.insert("sysbench_run_seconds".to_string(), self.sysbench_run_seconds.into());
        m.insert("sysbench_thread_count".to_string(), self.sysbench_thread_count.into());
        m.insert(
            "sysbench_latency_percentile".to_string(),
            self.sysbench_latency_percentile.into(),
        );
        m.insert("sysbench_report_interval".to_string(), self.sysbench_report_interval.into());
        m
    }

    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            latency_percentile: self.sysbench_latency_percentile,
            metadata: self.metadata(),
        }
    }
}

/// Eight hex characters, like the run identifiers used for instance names.
pub fn new_run_uri() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
