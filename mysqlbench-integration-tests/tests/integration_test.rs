use clap::Parser;
use mysqlbench_common::{BenchError, ParseError, ResponseTimeToken, Unit};
use mysqlbench_driver::benchmark::MysqlServiceBenchmark;
use mysqlbench_driver::command::SshShell;
use mysqlbench_driver::config::RunConfig;
use mysqlbench_driver::provider::Provider;
use mysqlbench_integration_tests::{
    cloud_sql_handler, cloud_sql_world, failed, ScriptedRunner, SYSBENCH_OLTP_OUTPUT,
};
use mysqlbench_parser::ParseReport;
use mysqlbench_publisher::{HttpPublisher, JsonLinesPublisher, PublisherConfig, ResultSink};

#[derive(Parser)]
struct Cli {
    #[command(flatten)]
    run: RunConfig,
}

fn config(extra: &[&str]) -> RunConfig {
    let base = [
        "mysql-service-bench",
        "--client-host",
        "client.example",
        "--client-ip",
        "198.51.100.4",
        "--zone",
        "us-central1-f",
        "--ssh-user",
        "perfkit",
        "--run-uri",
        "0badcafe",
        "--poll-interval-secs",
        "0",
        "--poll-limit",
        "5",
    ];
    let argv: Vec<&str> = base.iter().chain(extra).copied().collect();
    Cli::try_parse_from(argv).unwrap().run
}

async fn execute(runner: &ScriptedRunner, config: RunConfig) -> Result<ParseReport, BenchError> {
    let shell = SshShell::new(runner.clone(), config.client_host.clone()).with_user(config.ssh_user.clone());
    let service = Provider::for_cloud(runner.clone(), &config);
    MysqlServiceBenchmark::new(config, service, shell).execute().await
}

#[tokio::test]
async fn test_full_cloud_sql_cycle() {
    let runner = cloud_sql_world(2, SYSBENCH_OLTP_OUTPUT);
    let report = execute(&runner, config(&[])).await.unwrap();

    let lines = runner.command_lines();
    let gcloud: Vec<&String> = lines.iter().filter(|l| l.starts_with("gcloud")).collect();
    assert_eq!(gcloud.len(), 5, "create + 3 describes + delete: {gcloud:?}");
    assert!(gcloud[0].starts_with("gcloud sql instances create pkb0badcafe"));
    assert!(gcloud[0].contains("--authorized-networks=198.51.100.4/32"));
    assert_eq!(gcloud[4], "gcloud sql instances delete pkb0badcafe --quiet");

    let ssh: Vec<&String> = lines.iter().filter(|l| l.starts_with("ssh")).collect();
    assert_eq!(ssh.len(), 4);
    assert!(ssh.iter().all(|l| l.contains("perfkit@client.example")));
    assert!(ssh[0].ends_with("mysql -u root -h 203.0.113.7 -e 'create database sbtest;'"));
    assert!(ssh[3].contains("--mysql-host=203.0.113.7"));

    assert!(report.is_complete(), "issues: {:?}", report.issues);
    assert_eq!(report.metrics.len(), 14);
    let value = |name: &str| report.metric(name).unwrap().value;
    // sorted samples: [850, 875, 900, 925]
    assert_eq!(value("sysbench tps p1"), 850.0);
    assert_eq!(value("sysbench tps p50"), 900.0);
    assert_eq!(value("sysbench tps p99.9"), 925.0);
    assert_eq!(value("sysbench tps average"), 887.5);
    assert_eq!(value("sysbench latency min"), 6.50);
    assert_eq!(value("sysbench latency avg"), 18.27);
    assert_eq!(value("sysbench latency max"), 190.40);
    assert_eq!(value("sysbench latency percentile 99"), 30.25);
    assert_eq!(report.metric("sysbench prepare time").unwrap().unit, Unit::Seconds);
}

#[tokio::test]
async fn test_instance_deleted_when_sysbench_fails() {
    let world = cloud_sql_handler(0, SYSBENCH_OLTP_OUTPUT);
    let runner = ScriptedRunner::new(move |argv| {
        if argv.join(" ").contains("parallel_prepare.lua") {
            failed(1, "Can't connect to MySQL server")
        } else {
            world(argv)
        }
    });

    let err = execute(&runner, config(&[])).await.unwrap_err();
    assert!(matches!(err, BenchError::CommandFailed { status: Some(1), .. }));

    let lines = runner.command_lines();
    assert!(lines.iter().all(|l| !l.contains("oltp.lua")));
    assert_eq!(lines.last().unwrap(), "gcloud sql instances delete pkb0badcafe --quiet");
}

#[tokio::test]
async fn test_creation_timeout_skips_benchmark_but_cleans_up() {
    let runner = cloud_sql_world(10, SYSBENCH_OLTP_OUTPUT);
    let err = execute(&runner, config(&[])).await.unwrap_err();
    assert_eq!(err, BenchError::CreationTimedOut { interval_secs: 0, limit: 5 });

    let lines = runner.command_lines();
    assert!(lines.iter().all(|l| !l.starts_with("ssh")));
    assert!(lines.last().unwrap().contains("instances delete"));
}

#[tokio::test]
async fn test_output_from_newer_sysbench_is_partial() {
    let newer = "\
[ 1s ] thds: 16 tps: 880.11 qps: 17640.29 (r/w/o: 12348.21/3528.06/1764.03) lat (ms,99%): 30.26
SQL statistics:
General statistics:
    total time:                          1.0010s
Latency (ms):
         min:                                    6.50
         avg:                                   18.27
         max:                                  190.40
         99th percentile:                       30.26
";
    let runner = cloud_sql_world(0, newer);
    let report = execute(&runner, config(&[])).await.unwrap();

    assert!(!report.is_complete());
    assert!(report.issues.contains(&ParseError::EmptySeries));
    assert!(report.issues.contains(&ParseError::IncompleteSummary {
        missing: ResponseTimeToken::ALL.to_vec()
    }));
    assert_eq!(report.metrics.len(), 1, "only the prepare time survives: {:?}", report.metrics);
}

#[tokio::test]
async fn test_publish_to_http_and_file() {
    let runner = cloud_sql_world(0, SYSBENCH_OLTP_OUTPUT);
    let report = execute(&runner, config(&[])).await.unwrap();

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/runs/0badcafe/samples")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({"run_uri": "0badcafe"})))
        .with_status(200)
        .create_async()
        .await;
    let file = tempfile::NamedTempFile::new().unwrap();

    let sinks = [
        ResultSink::Http(HttpPublisher::new(PublisherConfig { endpoint: server.url() })),
        ResultSink::JsonLines(JsonLinesPublisher::new(file.path())),
    ];
    for sink in &sinks {
        sink.publish("0badcafe", &report.metrics).await.unwrap();
    }

    mock.assert_async().await;
    let written = std::fs::read_to_string(file.path()).unwrap();
    assert_eq!(written.lines().count(), report.metrics.len());
    let first: serde_json::Value = serde_json::from_str(written.lines().next().unwrap()).unwrap();
    assert_eq!(first["metric"], "sysbench prepare time");
    assert_eq!(first["metadata"]["sysbench_latency_percentile"], 99);
}
