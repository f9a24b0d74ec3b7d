//! Unit tests for the management service lifecycle and stores.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use mockall::{mock, predicate::eq};
use rstest::{fixture, rstest};

use super::*;
use crate::bootstrap::BootstrapError;
use crate::server::DrainReport;
use fb303_config::Config;

mock! {
    Reporter {}
    impl HealthReporter for Reporter {
        fn bootstrap_starting(&self);
        fn bootstrap_succeeded(&self, config: &Config);
        fn bootstrap_failed(&self, error: &BootstrapError);
        fn status_changed(&self, from: ServiceStatus, to: ServiceStatus);
        fn shutdown_requested(&self, request: ShutdownRequest);
        fn drain_completed(&self, report: &DrainReport);
    }
}

struct FixedClock(SystemTime);

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}

fn quiet_reporter() -> Arc<dyn HealthReporter> {
    let mut reporter = MockReporter::new();
    reporter.expect_status_changed().return_const(());
    reporter.expect_shutdown_requested().return_const(());
    Arc::new(reporter)
}

fn service_at(seconds: u64) -> ManagementService {
    ManagementService::with_clock(
        ServiceIdentity::new("search", "1.2.3"),
        quiet_reporter(),
        Arc::new(FixedClock(UNIX_EPOCH + Duration::from_secs(seconds))),
    )
}

#[fixture]
fn service() -> ManagementService {
    service_at(1_700_000_000)
}

#[fixture]
fn alive_service() -> ManagementService {
    let service = service_at(1_700_000_000);
    service.start().expect("start");
    service.mark_alive().expect("alive");
    service
}

#[rstest]
fn fresh_service_reports_identity_and_no_counters(service: ManagementService) {
    assert_eq!(service.name(), "search");
    assert_eq!(service.version(), "1.2.3");
    assert_eq!(service.status(), ServiceStatus::Dead);
    assert!(service.counters().is_empty());
    assert!(service.options().is_empty());
}

#[rstest]
fn alive_since_is_not_ready_before_alive(service: ManagementService) {
    assert_eq!(service.alive_since(), Err(ServiceError::NotReady));
    service.start().expect("start");
    assert_eq!(service.alive_since(), Err(ServiceError::NotReady));
    service.mark_alive().expect("alive");
    assert_eq!(service.alive_since(), Ok(1_700_000_000));
}

#[rstest]
fn reinitialize_keeps_state_and_alive_since(alive_service: ManagementService) {
    alive_service.increment_counter("hits", 4).expect("increment");
    alive_service.set_option("mode", "fast").expect("set option");
    alive_service.set_status_details("warming caches");
    let before = alive_service.alive_since().expect("alive since");

    alive_service.reinitialize().expect("reinitialize");

    assert_eq!(alive_service.status(), ServiceStatus::Alive);
    assert_eq!(alive_service.status_details(), "");
    assert_eq!(alive_service.counter("hits"), Ok(4));
    assert_eq!(alive_service.option("mode"), Ok(String::from("fast")));
    assert_eq!(alive_service.alive_since(), Ok(before));
}

#[rstest]
fn reinitialize_is_refused_before_alive(service: ManagementService) {
    let error = service.reinitialize().expect_err("dead service");
    assert_eq!(
        error,
        ServiceError::InvalidState {
            operation: "reinitialize",
            status: ServiceStatus::Dead,
        }
    );
}

#[rstest]
fn reinitialize_recovers_from_warning(alive_service: ManagementService) {
    alive_service
        .set_status(ServiceStatus::Warning)
        .expect("degrade");
    alive_service.reinitialize().expect("reinitialize");
    assert_eq!(alive_service.status(), ServiceStatus::Alive);
}

#[rstest]
fn second_shutdown_is_rejected(alive_service: ManagementService) {
    alive_service.shutdown().expect("first shutdown");
    assert_eq!(alive_service.status(), ServiceStatus::Stopping);
    let error = alive_service.shutdown().expect_err("second shutdown");
    assert_eq!(error.kind(), fb303_types::ErrorKind::InvalidState);
}

#[rstest]
fn shutdown_posts_request_once(alive_service: ManagementService) {
    let requests = alive_service
        .shutdown_requests()
        .expect("receiver available");
    assert!(alive_service.shutdown_requests().is_none());
    alive_service.shutdown().expect("shutdown");
    assert_eq!(requests.try_recv(), Ok(ShutdownRequest::Remote));
}

#[rstest]
fn mutations_fail_after_drain(alive_service: ManagementService) {
    alive_service.shutdown().expect("shutdown");
    alive_service.mark_stopped().expect("stopped");

    let option = alive_service.set_option("mode", "x").expect_err("set option");
    assert!(matches!(option, ServiceError::InvalidState { .. }));
    let counter = alive_service
        .increment_counter("hits", 1)
        .expect_err("increment");
    assert!(matches!(counter, ServiceError::InvalidState { .. }));
    assert!(alive_service.reinitialize().is_err());
}

#[rstest]
fn option_round_trip(alive_service: ManagementService) {
    alive_service.set_option("mode", "fast").expect("set");
    assert_eq!(alive_service.option("mode"), Ok(String::from("fast")));
    assert_eq!(
        alive_service.option("unset"),
        Err(ServiceError::OptionNotFound {
            key: String::from("unset"),
        })
    );
}

#[rstest]
fn empty_option_name_is_invalid(alive_service: ManagementService) {
    let error = alive_service.set_option("", "x").expect_err("empty name");
    assert_eq!(error.kind(), fb303_types::ErrorKind::InvalidArgument);
}

#[rstest]
#[case::skip_starting(ServiceStatus::Alive)]
#[case::stop_dead(ServiceStatus::Stopped)]
#[case::warn_dead(ServiceStatus::Warning)]
fn illegal_transitions_from_dead_are_rejected(
    service: ManagementService,
    #[case] next: ServiceStatus,
) {
    assert!(matches!(
        service.set_status(next),
        Err(ServiceError::InvalidTransition { .. })
    ));
    assert_eq!(service.status(), ServiceStatus::Dead);
}

#[test]
fn concurrent_reinitialize_calls_end_alive() {
    let service = Arc::new(service_at(42));
    service.start().expect("start");
    service.mark_alive().expect("alive");

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || service.reinitialize())
        })
        .collect();
    for worker in workers {
        assert_eq!(worker.join().expect("worker thread"), Ok(()));
    }
    assert_eq!(service.status(), ServiceStatus::Alive);
    assert_eq!(service.alive_since(), Ok(42));
}

#[test]
fn concurrent_increments_are_not_lost() {
    let service = Arc::new(service_at(42));
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for _ in 0..500 {
                    service.increment_counter("requests", 1).expect("increment");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker thread");
    }
    assert_eq!(service.counter("requests"), Ok(2_000));
}

#[test]
fn transitions_are_reported() {
    let mut reporter = MockReporter::new();
    reporter
        .expect_status_changed()
        .with(eq(ServiceStatus::Dead), eq(ServiceStatus::Starting))
        .times(1)
        .return_const(());
    reporter
        .expect_status_changed()
        .with(eq(ServiceStatus::Starting), eq(ServiceStatus::Alive))
        .times(1)
        .return_const(());
    reporter
        .expect_status_changed()
        .with(eq(ServiceStatus::Alive), eq(ServiceStatus::Stopping))
        .times(1)
        .return_const(());
    reporter
        .expect_shutdown_requested()
        .with(eq(ShutdownRequest::Remote))
        .times(1)
        .return_const(());

    let service = ManagementService::new(ServiceIdentity::new("svc", "0.1.0"), Arc::new(reporter));
    service.start().expect("start");
    service.mark_alive().expect("alive");
    service.shutdown().expect("shutdown");
}

#[test]
fn mark_stopping_reports_without_posting() {
    let mut reporter = MockReporter::new();
    reporter.expect_status_changed().return_const(());
    reporter
        .expect_shutdown_requested()
        .with(eq(ShutdownRequest::Signal(15)))
        .times(1)
        .return_const(());
    let service = ManagementService::new(ServiceIdentity::new("svc", "0.1.0"), Arc::new(reporter));
    service.start().expect("start");
    service.mark_alive().expect("alive");
    let requests = service.shutdown_requests().expect("receiver available");

    service
        .mark_stopping(ShutdownRequest::Signal(15))
        .expect("mark stopping");

    assert_eq!(service.status(), ServiceStatus::Stopping);
    assert!(requests.try_recv().is_err(), "nothing should be posted");
    let again = service
        .mark_stopping(ShutdownRequest::Host)
        .expect_err("already stopping");
    assert!(matches!(again, ServiceError::InvalidState { .. }));
}
