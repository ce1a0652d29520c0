//! Logger tests
//!
//! Key layout of every helper, caller capture and error reporting.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kvtab_protocol::{Field, KvTabEncoder, Severity};
use serde::Serialize;

use crate::router_test::{RecordingSink, dual_router};
use crate::{Gate, Logger, PipelineError, Router, SinkHandle};

fn logger(threshold: Severity) -> (Logger, Arc<RecordingSink>, Arc<RecordingSink>) {
    let (router, primary, secondary) = dual_router(threshold);
    (Logger::new(router), primary, secondary)
}

/// Everything after the severity literal
fn body(line: &str) -> &str {
    let start = line.find("\tobj=").expect("line has an origin");
    &line[start + 1..]
}

// ============================================================================
// emit
// ============================================================================

#[test]
fn test_emit_full_line() {
    let (logger, primary, _) = logger(Severity::Info);

    let delivered = logger
        .emit(Severity::Info, "START", "start done", [Field::int("cost", 3)])
        .unwrap();

    assert_eq!(delivered, 1);
    let lines = primary.lines();
    let line = &lines[0];
    assert!(line.starts_with("ts="));
    assert!(line.contains("\tfile=src/logger_test.rs:"), "caller missing: {line}");
    assert!(line.contains("\tlogLev=[INFO]\t"));
    assert_eq!(body(line), "obj=START\tinfo=start done\tcost=3\n");
}

#[test]
fn test_emit_below_threshold() {
    let (logger, primary, secondary) = logger(Severity::Warn);

    assert!(!logger.enabled(Severity::Info));
    assert_eq!(logger.emit(Severity::Info, "X", "y", Vec::<Field>::new()).unwrap(), 0);
    assert!(primary.lines().is_empty());
    assert!(secondary.lines().is_empty());
}

#[test]
fn test_emit_returns_sink_errors() {
    let mut router = Router::new(KvTabEncoder::default());
    router.register_sink(SinkHandle::new(
        "broken",
        Gate::default(),
        Arc::new(RecordingSink::failing()),
    ));
    let logger = Logger::new(router);

    let err = logger.emit(Severity::Error, "X", "y", Vec::<Field>::new()).unwrap_err();
    assert!(matches!(err, PipelineError::Sinks { succeeded: 0, .. }));
}

// ============================================================================
// Helper layouts
// ============================================================================

#[test]
fn test_log_start() {
    let (logger, primary, _) = logger(Severity::Info);

    logger.log_start(Severity::Info, "boot ok", Instant::now());

    let lines = primary.lines();
    assert!(body(&lines[0]).starts_with("obj=START\tinfo=boot ok\tcost="));
}

#[test]
fn test_log_cost_is_elapsed_millis() {
    let (logger, primary, _) = logger(Severity::Info);

    let start = Instant::now() - Duration::from_millis(1500);
    logger.log_start(Severity::Info, "slow", start);

    let lines = primary.lines();
    let cost: u64 = body(&lines[0])
        .trim_end()
        .rsplit_once("cost=")
        .unwrap()
        .1
        .parse()
        .unwrap();
    assert!((1500..60_000).contains(&cost), "cost {cost}");
}

#[test]
fn test_log() {
    let (logger, primary, _) = logger(Severity::Info);

    logger.log(Severity::Warn, "CACHE", "evicted");

    let lines = primary.lines();
    assert!(lines[0].contains("\tlogLev=[WARN]\t"));
    assert_eq!(body(&lines[0]), "obj=CACHE\tinfo=evicted\n");
}

#[derive(Serialize)]
struct Order {
    id: u32,
    items: Vec<&'static str>,
}

#[test]
fn test_log_data_json() {
    let (logger, primary, _) = logger(Severity::Info);

    logger.log_data(
        Severity::Info,
        "ORDER",
        Order {
            id: 7,
            items: vec!["a", "b"],
        },
    );

    let lines = primary.lines();
    assert_eq!(
        body(&lines[0]),
        "obj=ORDER\tdata={\"id\":7,\"items\":[\"a\",\"b\"]}\n"
    );
}

#[test]
fn test_log_err() {
    let (logger, primary, secondary) = logger(Severity::Info);
    let err = std::io::Error::other("timeout");

    logger.log_err(Severity::Error, "DB", "query failed", &err);

    let lines = primary.lines();
    assert_eq!(body(&lines[0]), "obj=DB\tinfo=query failed\terr=timeout\n");
    assert_eq!(secondary.lines(), primary.lines());
}

#[test]
fn test_log_third_party() {
    let (logger, primary, _) = logger(Severity::Info);

    logger.log_third_party(Severity::Info, "REDIS", "10.0.0.1:6379", "GET", Instant::now());

    let lines = primary.lines();
    assert!(body(&lines[0]).starts_with("obj=REDIS\thost=10.0.0.1:6379\tinfo=GET\tcost="));
}

#[test]
fn test_log_req() {
    let (logger, primary, _) = logger(Severity::Info);

    logger.log_req(Severity::Info, "REQ", "r-1", "validated");

    let lines = primary.lines();
    assert_eq!(body(&lines[0]), "obj=REQ\treqId=r-1\tinfo=validated\n");
}

#[test]
fn test_log_req_data() {
    let (logger, primary, _) = logger(Severity::Info);

    logger.log_req_data(Severity::Info, "REQ", "r-1", vec![1, 2, 3]);

    let lines = primary.lines();
    assert_eq!(body(&lines[0]), "obj=REQ\treqId=r-1\tdata=[1,2,3]\n");
}

#[test]
fn test_log_req_err() {
    let (logger, primary, _) = logger(Severity::Info);

    logger.log_req_err(Severity::Warn, "REQ", "r-1", "retrying", &"conn reset");

    let lines = primary.lines();
    assert_eq!(
        body(&lines[0]),
        "obj=REQ\treqId=r-1\tinfo=retrying\terr=conn reset\n"
    );
}

#[test]
fn test_log_req_third_party() {
    let (logger, primary, _) = logger(Severity::Info);

    logger.log_req_third_party(Severity::Info, "MYSQL", "r-1", "db:3306", "select", Instant::now());

    let lines = primary.lines();
    assert!(
        body(&lines[0]).starts_with("obj=MYSQL\treqId=r-1\thost=db:3306\tinfo=select\tcost=")
    );
}

#[test]
fn test_log_req_begin_and_end() {
    let (logger, primary, _) = logger(Severity::Info);
    let start = Instant::now();

    logger.log_req_begin(Severity::Info, "r-9", "1.2.3.4", "/orders", "id=7", start);
    logger.log_req_end(Severity::Info, "r-9", "{\"ok\":true}", start);

    let lines = primary.lines();
    assert!(body(&lines[0]).starts_with(
        "obj=RB\treqId=r-9\treqClientIP=1.2.3.4\treqUri=/orders\treqParams=id=7\tcost="
    ));
    assert!(body(&lines[1]).starts_with("obj=RE\treqId=r-9\tretData={\"ok\":true}\tcost="));
}

#[test]
fn test_helper_caller_is_call_site() {
    let (logger, primary, _) = logger(Severity::Info);

    let line_no = line!() + 1;
    logger.log(Severity::Info, "X", "here");

    let lines = primary.lines();
    assert!(
        lines[0].contains(&format!("\tfile=src/logger_test.rs:{line_no}\t")),
        "wrong caller: {}",
        lines[0]
    );
}

// ============================================================================
// Failures and fatal
// ============================================================================

#[test]
fn test_helpers_swallow_failures() {
    let mut router = Router::new(KvTabEncoder::default());
    router.register_sink(SinkHandle::new(
        "broken",
        Gate::default(),
        Arc::new(RecordingSink::failing()),
    ));
    let logger = Logger::new(router);

    logger.log(Severity::Info, "X", "one");
    logger.log(Severity::Info, "X", "two");

    assert_eq!(logger.failed_records(), 2);
}

#[test]
fn test_log_panic_writes_fatal_then_panics() {
    let (logger, primary, secondary) = logger(Severity::Info);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        logger.log_panic("INIT", "config missing", &"no such file");
    }));

    let payload = result.unwrap_err();
    let message = payload
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_default();
    assert_eq!(message, "info=config missing\terr=no such file");

    let lines = secondary.lines();
    assert!(lines[0].contains("\tlogLev=[FATAL]\t"));
    assert_eq!(body(&lines[0]), "obj=INIT\tinfo=config missing\terr=no such file\n");
    assert_eq!(primary.syncs(), 1);
    assert_eq!(secondary.syncs(), 1);
}

#[test]
fn test_sync_delegates_to_router() {
    let (logger, primary, secondary) = logger(Severity::Info);

    logger.sync().unwrap();

    assert_eq!(primary.syncs(), 1);
    assert_eq!(secondary.syncs(), 1);
}

#[tokio::test]
async fn test_shutdown_reports_per_sink() {
    let (logger, _primary, _secondary) = logger(Severity::Info);

    let reports = logger.shutdown().await.unwrap();

    let names: Vec<_> = reports.iter().map(|r| r.sink.as_str()).collect();
    assert_eq!(names, ["primary", "secondary"]);
}
