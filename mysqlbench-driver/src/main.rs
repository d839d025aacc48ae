use clap::Parser;
use mysqlbench_driver::benchmark::MysqlServiceBenchmark;
use mysqlbench_driver::command::{LocalRunner, SshShell};
use mysqlbench_driver::config::RunConfig;
use mysqlbench_driver::provider::Provider;
use mysqlbench_parser::ParseReport;
use mysqlbench_publisher::{HttpPublisher, JsonLinesPublisher, PublisherConfig, ResultSink};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mysql-service-bench", about = "sysbench OLTP benchmark of a managed MySQL service")]
struct Args {
    #[command(flatten)]
    run: RunConfig,

    /// Results service receiving the metrics over HTTP
    #[arg(long)]
    publish_url: Option<String>,

    /// JSON-lines file the metrics are appended to
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = args.run.clone();
    let run_uri = config.run_uri.clone();

    let shell = SshShell::new(LocalRunner, config.client_host.clone())
        .with_user(config.ssh_user.clone())
        .with_key(config.ssh_key.clone());
    let service = Provider::for_cloud(LocalRunner, &config);

    let report = MysqlServiceBenchmark::new(config, service, shell)
        .execute()
        .await
        .unwrap_or_else(|e| {
            eprintln!("Benchmark failed: {e}");
            process::exit(3);
        });

    print_report(&run_uri, &report);

    let mut sinks = Vec::new();
    if let Some(url) = &args.publish_url {
        sinks.push(ResultSink::Http(HttpPublisher::new(PublisherConfig { endpoint: url.clone() })));
    }
    if let Some(path) = &args.output {
        sinks.push(ResultSink::JsonLines(JsonLinesPublisher::new(path)));
    }
    for sink in &sinks {
        if let Err(e) = sink.publish(&run_uri, &report.metrics).await {
            eprintln!("Publishing failed: {e}");
            process::exit(3);
        }
    }

    process::exit(if report.is_complete() { 0 } else { 2 });
}

fn print_report(run_uri: &str, report: &ParseReport) {
    println!("MySQL Service Benchmark Results");
    println!("===============================");
    println!("Run:                   {run_uri}");
    println!();
    for metric in &report.metrics {
        println!("{:<36} {:>12.3} {}", metric.name, metric.value, metric.unit);
    }
    println!();
    if report.is_complete() {
        println!("Result: COMPLETE");
    } else {
        for issue in &report.issues {
            println!("ISSUE {issue}");
        }
        println!("Result: PARTIAL ({} issues)", report.issues.len());
    }
}
