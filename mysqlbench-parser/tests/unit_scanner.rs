use mysqlbench_common::{ParseError, ResponseTimeToken};
use mysqlbench_parser::scanner::scan;

const SHORT_REPORT: &str = "\
[ 10s] threads: 16, tps: 120.50, reads: 0.00, writes: 0.00, response time: 30.12ms (99%), errors: 0.00, reconnects:  0.00
[ 20s] threads: 16, tps: 118.00, reads: 0.00, writes: 0.00, response time: 31.40ms (99%), errors: 0.00, reconnects:  0.00
General statistics:
    response time:
         min: 1.20ms
         avg: 5.40ms
         max: 42.10ms
         percentile: 9.80ms
";

/// Trimmed from a sysbench 0.5 oltp.lua run.
const FULL_REPORT: &str = "\
sysbench 0.5:  multi-threaded system evaluation benchmark

Running the test with following options:
Number of threads: 16
Report intermediate results every 2 second(s)
Random number generator seed is 0 and will be ignored


Threads started!

[   2s] threads: 16, tps: 871.47, reads: 12258.10, writes: 3492.88, response time: 30.58ms (99%), errors: 0.00, reconnects:  0.00
[   4s] threads: 16, tps: 902.00, reads: 12628.52, writes: 3608.01, response time: 28.93ms (99%), errors: 0.00, reconnects:  0.00
[   6s] threads: 16, tps: 889.51, reads: 12454.66, writes: 3557.03, response time: 29.64ms (99%), errors: 0.00, reconnects:  0.00
OLTP test statistics:
    queries performed:
        read:                            225862
        write:                           64532
        other:                           32266
        total:                           322660
    transactions:                        16133  (887.68 per sec.)
    read/write requests:                 290394 (15978.24 per sec.)
    other operations:                    32266  (1775.36 per sec.)
    ignored errors:                      0      (0.00 per sec.)
    reconnects:                          0      (0.00 per sec.)

General statistics:
    total time:                          18.1744s
    total number of events:              16133
    total time taken by event execution: 290.5263s
    response time:
         min:                                  7.34ms
         avg:                                 18.01ms
         max:                                211.27ms
         approx.  99 percentile:              29.71ms

Threads fairness:
    events (avg/stddev):           1008.3125/4.22
    execution time (avg/stddev):   18.1579/0.00
";

#[test]
fn test_short_report() {
    let out = scan(SHORT_REPORT);
    assert_eq!(out.samples, vec![120.50, 118.00]);
    assert!(out.warnings.is_empty());
    assert!(out.response_times.is_complete());
    assert_eq!(out.response_times.get(ResponseTimeToken::Min), Some(1.20));
    assert_eq!(out.response_times.get(ResponseTimeToken::Avg), Some(5.40));
    assert_eq!(out.response_times.get(ResponseTimeToken::Max), Some(42.10));
    assert_eq!(out.response_times.get(ResponseTimeToken::Percentile), Some(9.80));
}

#[test]
fn test_full_sysbench_report() {
    let out = scan(FULL_REPORT);
    assert_eq!(out.samples, vec![871.47, 902.00, 889.51]);
    assert_eq!(out.response_times.get(ResponseTimeToken::Min), Some(7.34));
    assert_eq!(out.response_times.get(ResponseTimeToken::Avg), Some(18.01));
    assert_eq!(out.response_times.get(ResponseTimeToken::Max), Some(211.27));
    assert_eq!(out.response_times.get(ResponseTimeToken::Percentile), Some(29.71));
}

#[test]
fn test_malformed_tps_is_skipped_and_reported() {
    let text = "\
[ 10s] threads: 16, tps: 120.50, reads: 0.00
[ 20s] threads: 16, tps: N/A, reads: 0.00
[ 30s] threads: 16, tps: 118.00, reads: 0.00
";
    let out = scan(text);
    assert_eq!(out.samples, vec![120.50, 118.00]);
    assert_eq!(
        out.warnings,
        vec![ParseError::MalformedSample { line: 2, text: "N/A".to_string() }]
    );
}

#[test]
fn test_tps_at_end_of_truncated_line() {
    let text = "\
[ 10s] threads: 16, tps: 120.50
[ 20s] threads: 16, tps: 118.00, reads: 0.00
[ 30s] threads: 16, tps:
";
    let out = scan(text);
    assert_eq!(out.samples, vec![120.50, 118.00]);
    assert_eq!(out.warnings, vec![ParseError::MalformedSample { line: 3, text: String::new() }]);
}

#[test]
fn test_non_finite_tps_is_malformed() {
    let out = scan("[ 2s] threads: 1, tps: NaN, reads: 0\n[ 4s] threads: 1, tps: inf, reads: 0\n");
    assert!(out.samples.is_empty());
    assert_eq!(out.warnings.len(), 2);
}

#[test]
fn test_progress_line_without_tps_is_ignored() {
    let out = scan("[ 2s] queue length: 0, concurrency: 0\n[ 4s] threads: 1, tps: 5.00, reads: 0\n");
    assert_eq!(out.samples, vec![5.0]);
    assert!(out.warnings.is_empty());
}

#[test]
fn test_latency_lines_before_headers_are_ignored() {
    let text = "\
    response time:
         min: 1.00ms
General statistics:
         max: 2.00ms
    response time:
         avg: 3.00ms
";
    let out = scan(text);
    assert_eq!(out.response_times.get(ResponseTimeToken::Min), None);
    assert_eq!(out.response_times.get(ResponseTimeToken::Max), None);
    assert_eq!(out.response_times.get(ResponseTimeToken::Avg), Some(3.0));
}

#[test]
fn test_progress_lines_count_in_any_state() {
    let text = "\
General statistics:
[ 2s] threads: 1, tps: 1.00, reads: 0
    response time:
[ 4s] threads: 1, tps: 2.00, reads: 0
         min: 1.00ms
";
    let out = scan(text);
    assert_eq!(out.samples, vec![1.0, 2.0]);
    assert_eq!(out.response_times.get(ResponseTimeToken::Min), Some(1.0));
}

#[test]
fn test_missing_percentile_line() {
    let text = "\
General statistics:
    response time:
         min: 1.20ms
         avg: 5.40ms
         max: 42.10ms
";
    let out = scan(text);
    assert!(!out.response_times.is_complete());
    assert_eq!(out.response_times.missing(), vec![ResponseTimeToken::Percentile]);
}

#[test]
fn test_newer_sysbench_latency_block_is_not_matched() {
    // sysbench 1.0 prints latency without the ms suffix under a different header.
    let text = "\
General statistics:
    total time:                          10.0020s
Latency (ms):
         min:                                    2.27
         avg:                                   25.63
         max:                                  301.04
         95th percentile:                       58.92
";
    let out = scan(text);
    assert_eq!(out.response_times.missing(), ResponseTimeToken::ALL.to_vec());
}

#[test]
fn test_crlf_line_endings() {
    let text = "[ 2s] threads: 1, tps: 7.50, reads: 0\r\nGeneral statistics:\r\n    response time:\r\n         min: 1.00ms\r\n";
    let out = scan(text);
    assert_eq!(out.samples, vec![7.5]);
    assert_eq!(out.response_times.get(ResponseTimeToken::Min), Some(1.0));
}

#[test]
fn test_empty_input() {
    let out = scan("");
    assert!(out.samples.is_empty());
    assert!(out.warnings.is_empty());
    assert_eq!(out.response_times.missing().len(), 4);
}
