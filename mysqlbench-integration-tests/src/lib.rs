//! Fixtures shared by the end-to-end tests: a scripted stand-in for local
//! process execution and captured sysbench output.

use mysqlbench_common::Result;
use mysqlbench_driver::command::{CommandOutput, CommandRunner};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Captured from a sysbench 0.5 oltp.lua run with `--report-interval=2`.
pub const SYSBENCH_OLTP_OUTPUT: &str = "\
sysbench 0.5:  multi-threaded system evaluation benchmark

Running the test with following options:
Number of threads: 16
Report intermediate results every 2 second(s)
Random number generator seed is 0 and will be ignored


Threads started!

[   2s] threads: 16, tps: 850.00, reads: 11900.00, writes: 3400.00, response time: 31.00ms (99%), errors: 0.00, reconnects:  0.00
[   4s] threads: 16, tps: 900.00, reads: 12600.00, writes: 3600.00, response time: 29.00ms (99%), errors: 0.00, reconnects:  0.00
[   6s] threads: 16, tps: 875.00, reads: 12250.00, writes: 3500.00, response time: 30.00ms (99%), errors: 0.00, reconnects:  0.00
[   8s] threads: 16, tps: 925.00, reads: 12950.00, writes: 3700.00, response time: 28.00ms (99%), errors: 0.00, reconnects:  0.00
OLTP test statistics:
    queries performed:
        read:                            98000
        write:                           28000
        other:                           14000
        total:                           140000
    transactions:                        7000   (875.00 per sec.)
    read/write requests:                 126000 (15750.00 per sec.)
    other operations:                    14000  (1750.00 per sec.)
    ignored errors:                      0      (0.00 per sec.)
    reconnects:                          0      (0.00 per sec.)

General statistics:
    total time:                          8.0012s
    total number of events:              7000
    total time taken by event execution: 127.9204s
    response time:
         min:                                  6.50ms
         avg:                                 18.27ms
         max:                                190.40ms
         approx.  99 percentile:              30.25ms

Threads fairness:
    events (avg/stddev):           437.5000/3.10
    execution time (avg/stddev):   7.9950/0.00
";

type Handler = dyn Fn(&[String]) -> CommandOutput + Send + Sync;

/// [`CommandRunner`] whose output comes from a closure; every command line is recorded.
#[derive(Clone)]
pub struct ScriptedRunner {
    handler: Arc<Handler>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedRunner {
    pub fn new(handler: impl Fn(&[String]) -> CommandOutput + Send + Sync + 'static) -> Self {
        Self { handler: Arc::new(handler), calls: Arc::default() }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded command lines, each joined with spaces.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(|argv| argv.join(" ")).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run_unchecked(&self, argv: &[String]) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(argv.to_vec());
        Ok((self.handler)(argv))
    }
}

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput { stdout: stdout.to_string(), stderr: String::new(), status: Some(0) }
}

pub fn failed(status: i32, stderr: &str) -> CommandOutput {
    CommandOutput { stdout: String::new(), stderr: stderr.to_string(), status: Some(status) }
}

/// Simulates `gcloud sql instances` plus an ssh-reachable client machine.
///
/// The instance reports `PENDING_CREATE` for `pending_polls` describe calls,
/// then `RUNNABLE` at 203.0.113.7. sysbench OLTP runs print `oltp_stdout`.
pub fn cloud_sql_world(pending_polls: usize, oltp_stdout: &str) -> ScriptedRunner {
    ScriptedRunner::new(cloud_sql_handler(pending_polls, oltp_stdout))
}

/// The command handler behind [`cloud_sql_world`], for tests that override some commands.
pub fn cloud_sql_handler(
    pending_polls: usize,
    oltp_stdout: &str,
) -> impl Fn(&[String]) -> CommandOutput + Send + Sync + 'static {
    let describes = AtomicUsize::new(0);
    let oltp_stdout = oltp_stdout.to_string();

    move |argv: &[String]| {
        let line = argv.join(" ");
        match argv.first().map(String::as_str) {
            Some("gcloud") if line.contains(" create ") => {
                ok(r#"{"operation": "operation-1", "operationType": "CREATE"}"#)
            }
            Some("gcloud") if line.contains(" describe ") => {
                if describes.fetch_add(1, Ordering::SeqCst) < pending_polls {
                    ok(r#"{"state": "PENDING_CREATE"}"#)
                } else {
                    ok(r#"{"state": "RUNNABLE", "ipAddresses": [{"ipAddress": "203.0.113.7", "type": "PRIMARY"}]}"#)
                }
            }
            Some("gcloud") if line.contains(" delete ") => ok("Deleted."),
            Some("ssh") if line.contains("oltp.lua") => ok(&oltp_stdout),
            Some("ssh") => ok(""),
            _ => failed(127, "command not found"),
        }
    }
}
