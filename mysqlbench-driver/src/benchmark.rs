use mysqlbench_common::{BenchError, Result};
use mysqlbench_parser::{ParseReport, SysbenchParser};
use std::time::Instant;

use crate::command::RemoteShell;
use crate::config::RunConfig;
use crate::provider::{DbInstance, MysqlService};
use crate::sysbench;

/// One provision → load → measure → tear-down cycle.
pub struct MysqlServiceBenchmark<S, H> {
    config: RunConfig,
    service: S,
    shell: H,
    instance: Option<DbInstance>,
}

impl<S: MysqlService, H: RemoteShell> MysqlServiceBenchmark<S, H> {
    pub fn new(config: RunConfig, service: S, shell: H) -> Self {
        Self { config, service, shell, instance: None }
    }

    pub fn instance(&self) -> Option<&DbInstance> {
        self.instance.as_ref()
    }

    /// Create the DB instance and the `sbtest` database in it.
    pub async fn prepare(&mut self) -> Result<()> {
        let instance = self.service.prepare().await?;
        tracing::info!("DB instance {} is reachable at {}", instance.name, instance.address);

        let output = self
            .shell
            .run_unchecked(&sysbench::create_database_command(&self.config, &instance.address))
            .await?;
        tracing::info!(
            "sbtest db created, stdout is {}, stderr is {}",
            output.stdout.trim(),
            output.stderr.trim()
        );

        self.instance = Some(instance);
        Ok(())
    }

    /// Load data, warm up, then measure. Only the measured run is parsed.
    pub async fn run(&mut self) -> Result<ParseReport> {
        let host = self
            .instance
            .as_ref()
            .map(|i| i.address.clone())
            .ok_or_else(|| BenchError::InstanceCreation("prepare has not succeeded".to_string()))?;
        let parser = SysbenchParser::new(self.config.parser_config());

        // Could take a long time if the data to be loaded is large.
        let prepare_start = Instant::now();
        let output = self.shell.run(&sysbench::prepare_command(&self.config, &host)).await?;
        let prepare_elapsed = prepare_start.elapsed();
        tracing::info!("It took {:.1} seconds to finish the prepare step", prepare_elapsed.as_secs_f64());
        tracing::debug!("Prepare stdout is:\n{}\nstderr is:\n{}", output.stdout, output.stderr);

        if self.config.sysbench_warmup_seconds > 0 {
            tracing::info!("Sysbench warm-up run, duration is {}", self.config.sysbench_warmup_seconds);
            let command =
                sysbench::oltp_run_command(&self.config, &host, self.config.sysbench_warmup_seconds);
            self.shell.run(&command).await?;
        }

        tracing::info!("Sysbench real run, duration is {}", self.config.sysbench_run_seconds);
        let command = sysbench::oltp_run_command(&self.config, &host, self.config.sysbench_run_seconds);
        let output = self.shell.run(&command).await?;
        tracing::debug!("Sysbench stdout is:\n{}\nstderr is:\n{}", output.stdout, output.stderr);

        tracing::info!("Parsing sysbench results");
        let mut report = parser.parse(&output.stdout);
        report.metrics.insert(0, parser.prepare_metric(prepare_elapsed));
        Ok(report)
    }

    pub async fn cleanup(&mut self) -> Result<()> {
        self.service.cleanup().await?;
        self.instance = None;
        Ok(())
    }

    /// Full cycle. Cleanup is attempted whatever happened before it; its own
    /// failure is logged, never reported over an earlier error.
    pub async fn execute(mut self) -> Result<ParseReport> {
        tracing::info!("Start benchmarking MySQL Service, cloud provider is {:?}", self.config.cloud);

        let result = match self.prepare().await {
            Ok(()) => self.run().await,
            Err(e) => Err(e),
        };

        if let Err(e) = self.cleanup().await {
            tracing::warn!("Cleanup failed: {}", e);
        }

        result
    }
}
