//! Controller Tests
//!
//! Tests verify:
//! - Runs end on the duration timer or an external stop
//! - Every exchange is counted exactly once in the run totals
//! - A failing worker does not affect its siblings
//! - Lifecycle states

use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use binhammer::config::{Config, Dispatch, KeyMode};
use binhammer::network::{Connection, Connector, TcpConnector};
use binhammer::{Controller, ControllerState, HammerError, Operation, Result};

use crate::mock_server::{Behavior, MockServer};

// =============================================================================
// Helper Functions
// =============================================================================

fn base_config(server: &MockServer) -> Config {
    Config::builder()
        .address(server.address())
        .concurrency(4)
        .key_count(200)
        .flush_every(10)
        .report_interval(Duration::from_millis(100))
        .seed(7)
        .build()
}

fn connector(server: &MockServer) -> Arc<TcpConnector> {
    Arc::new(TcpConnector::new("tcp", server.address()))
}

/// Alternates connections between two servers
struct AlternatingConnector {
    good: TcpConnector,
    bad: TcpConnector,
    next: AtomicUsize,
}

impl Connector for AlternatingConnector {
    fn connect(&self) -> Result<Connection> {
        if self.next.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            self.good.connect()
        } else {
            self.bad.connect()
        }
    }
}

// =============================================================================
// Run Tests
// =============================================================================

#[test]
fn test_zero_workers_complete_immediately() {
    let server = MockServer::start();
    let config = Config::builder()
        .address(server.address())
        .concurrency(0)
        .duration(Duration::from_secs(30))
        .build();
    let controller = Controller::new(config).unwrap();

    let summary = controller.run(connector(&server)).unwrap();
    assert!(summary.elapsed < Duration::from_secs(10));
    assert!(summary.totals.is_empty());
    assert_eq!(summary.workers_stopped, 0);
    assert_eq!(summary.workers_failed, 0);
    assert_eq!(controller.state(), ControllerState::Stopped);
}

#[test]
fn test_duration_run_counts_every_exchange_once() {
    let server = MockServer::start();
    let config = Config {
        duration: Some(Duration::from_millis(300)),
        ..base_config(&server)
    };
    let controller = Controller::new(config).unwrap();

    let summary = controller.run(connector(&server)).unwrap();
    assert_eq!(summary.workers_stopped, 4);
    assert_eq!(summary.workers_failed, 0);
    assert!(summary.totals.total() > 0);
    assert_eq!(summary.totals.total(), server.requests());
    // Each key is owned by one worker, so the cycle never misses
    assert_eq!(summary.totals.total_failed(), 0);
    assert!(summary.throughput() > 0.0);
    assert!(controller.stats().snapshot().is_empty());
}

#[test]
fn test_duration_timer_stops_idle_workers() {
    let server = MockServer::start();
    let config = Config {
        key_count: 0,
        concurrency: 2,
        duration: Some(Duration::from_millis(200)),
        ..base_config(&server)
    };
    let controller = Controller::new(config).unwrap();

    let summary = controller.run(connector(&server)).unwrap();
    assert!(summary.elapsed >= Duration::from_millis(200));
    assert!(summary.elapsed < Duration::from_secs(10));
    assert_eq!(summary.workers_stopped, 2);
    assert_eq!(server.requests(), 0);
}

#[test]
fn test_stateful_mode_run() {
    let server = MockServer::start();
    let config = Config {
        key_mode: KeyMode::Stateful,
        duration: Some(Duration::from_millis(200)),
        ..base_config(&server)
    };
    let controller = Controller::new(config).unwrap();

    let summary = controller.run(connector(&server)).unwrap();
    assert_eq!(summary.workers_stopped, 4);
    assert_eq!(summary.totals.total_failed(), 0);
    assert_eq!(summary.totals.total(), server.requests());
}

#[test]
fn test_stateful_small_key_space_never_fails() {
    let server = MockServer::start();
    let config = Config {
        key_count: 4,
        concurrency: 8,
        sequence: vec![Operation::Insert, Operation::Delete],
        key_mode: KeyMode::Stateful,
        duration: Some(Duration::from_millis(300)),
        ..base_config(&server)
    };
    let controller = Controller::new(config).unwrap();

    let summary = controller.run(connector(&server)).unwrap();
    assert_eq!(summary.workers_stopped, 8);
    assert!(summary.totals.completed(Operation::Insert) > 0);
    assert!(summary.totals.completed(Operation::Delete) > 0);
    assert_eq!(summary.totals.total_failed(), 0);
}

#[test]
fn test_stateful_shared_queue_is_rejected() {
    let server = MockServer::start();
    let config = Config {
        key_mode: KeyMode::Stateful,
        dispatch: Dispatch::Shared { queue_depth: 100 },
        ..base_config(&server)
    };
    assert!(matches!(Controller::new(config), Err(HammerError::Config(_))));
    assert_eq!(server.requests(), 0);
}

#[test]
fn test_shared_queue_run() {
    let server = MockServer::start();
    let config = Config {
        dispatch: Dispatch::Shared { queue_depth: 16 },
        duration: Some(Duration::from_millis(300)),
        ..base_config(&server)
    };
    let controller = Controller::new(config).unwrap();

    let summary = controller.run(connector(&server)).unwrap();
    assert_eq!(summary.workers_stopped, 4);
    assert!(summary.totals.total() > 0);
    assert_eq!(summary.totals.total(), server.requests());
}

#[test]
fn test_pipelined_quiet_run() {
    let server = MockServer::start();
    let config = Config {
        pipeline_depth: 8,
        quiet: true,
        duration: Some(Duration::from_millis(200)),
        ..base_config(&server)
    };
    let controller = Controller::new(config).unwrap();

    let summary = controller.run(connector(&server)).unwrap();
    assert_eq!(summary.workers_stopped, 4);
    assert!(summary.totals.total() > 0);
    assert_eq!(summary.totals.total_failed(), 0);
}

#[test]
fn test_external_stop_ends_run() {
    let server = MockServer::start();
    let controller = Arc::new(Controller::new(base_config(&server)).unwrap());
    assert_eq!(controller.state(), ControllerState::Idle);

    let runner = {
        let controller = Arc::clone(&controller);
        let connector = connector(&server);
        thread::spawn(move || controller.run(connector))
    };

    thread::sleep(Duration::from_millis(150));
    assert_eq!(controller.state(), ControllerState::Running);

    controller.stop_signal().raise();
    assert!(matches!(
        controller.state(),
        ControllerState::Draining | ControllerState::Stopped
    ));

    let summary = runner.join().unwrap().unwrap();
    assert_eq!(summary.workers_stopped, 4);
    assert!(summary.totals.total() > 0);
    assert_eq!(controller.state(), ControllerState::Stopped);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_connect_failures_end_run_without_error() {
    // Grab a free port, then close it so connects are refused
    let address = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };
    let config = Config::builder()
        .address(&address)
        .concurrency(3)
        .duration(Duration::from_secs(30))
        .build();
    let controller = Controller::new(config).unwrap();

    let summary = controller
        .run(Arc::new(TcpConnector::new("tcp", address)))
        .unwrap();
    assert_eq!(summary.workers_failed, 3);
    assert_eq!(summary.workers_stopped, 0);
    assert!(summary.elapsed < Duration::from_secs(10));
}

#[test]
fn test_failing_worker_does_not_affect_siblings() {
    let good = MockServer::start();
    let bad = MockServer::start_with(Behavior::BadMagic);
    let config = Config {
        duration: Some(Duration::from_millis(300)),
        ..base_config(&good)
    };
    let controller = Controller::new(config).unwrap();

    let summary = controller
        .run(Arc::new(AlternatingConnector {
            good: TcpConnector::new("tcp", good.address()),
            bad: TcpConnector::new("tcp", bad.address()),
            next: AtomicUsize::new(0),
        }))
        .unwrap();

    assert_eq!(summary.workers_failed, 2);
    assert_eq!(summary.workers_stopped, 2);
    assert_eq!(summary.totals.total(), good.requests());
    assert!(summary.totals.total() > 0);
}

#[test]
fn test_tcp6_filter_without_ipv6_address_fails_to_connect() {
    let server = MockServer::start();
    let result = TcpConnector::new("tcp6", server.address()).connect();
    assert!(matches!(result, Err(HammerError::Connect { .. })));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_controller_runs_only_once() {
    let server = MockServer::start();
    let config = Config::builder()
        .address(server.address())
        .concurrency(0)
        .build();
    let controller = Controller::new(config).unwrap();

    controller.run(connector(&server)).unwrap();
    assert!(matches!(
        controller.run(connector(&server)),
        Err(HammerError::Config(_))
    ));
}

#[test]
fn test_invalid_config_rejected_before_start() {
    let config = Config::builder().pipeline_depth(0).build();
    assert!(matches!(Controller::new(config), Err(HammerError::Config(_))));
}
