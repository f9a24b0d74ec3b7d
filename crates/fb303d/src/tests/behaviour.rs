//! Behavioural tests for the management server bootstrap sequence.

use std::cell::RefCell;

use fb303_types::ServiceStatus;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use super::support::{self, HealthEvent, TestWorld};

type StepResult = Result<(), String>;

#[fixture]
fn world() -> RefCell<TestWorld> {
    support::world()
}

#[given("a healthy configuration loader")]
fn given_healthy_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_successful_loader();
}

#[given("a failing configuration loader")]
fn given_failing_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_failing_loader();
}

#[when("the server bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<TestWorld>) {
    world.borrow_mut().bootstrap();
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(
        world.bootstrap_error().is_none(),
        "bootstrap error: {:?}",
        world.bootstrap_error()
    );
    assert!(world.daemon().is_some(), "daemon should have been initialised");
}

#[then("bootstrap fails")]
fn then_bootstrap_fails(world: &RefCell<TestWorld>) {
    assert!(
        world.borrow().bootstrap_error().is_some(),
        "bootstrap succeeded unexpectedly"
    );
}

#[then("the service reports {status}")]
fn then_service_reports(world: &RefCell<TestWorld>, status: String) -> StepResult {
    let expected = status
        .parse::<ServiceStatus>()
        .map_err(|error| format!("invalid status '{status}': {error}"))?;
    match world.borrow().service_status() {
        Some(actual) if actual == expected => Ok(()),
        other => Err(format!("expected {expected}, found {other:?}")),
    }
}

#[then("the service identity comes from the configuration")]
fn then_identity_from_config(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let daemon = world.daemon().expect("daemon missing");
    assert_eq!(daemon.service().name(), "scenario-service");
    assert_eq!(daemon.service().version(), "9.9.9");
}

#[then("the socket directory exists")]
fn then_socket_directory_exists(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let daemon = world.daemon().expect("daemon missing");
    let path = daemon
        .config()
        .daemon_socket()
        .unix_path()
        .expect("scenario uses a Unix socket");
    let parent = path.parent().expect("socket path has a parent");
    assert!(parent.is_dir(), "{parent} was not created");
}

#[then("the reporter recorded bootstrap start")]
fn then_reporter_start(world: &RefCell<TestWorld>) {
    assert!(
        world
            .borrow()
            .reporter
            .events()
            .contains(&HealthEvent::BootstrapStarting),
        "bootstrap start event missing"
    );
}

#[then("the reporter recorded bootstrap success")]
fn then_reporter_success(world: &RefCell<TestWorld>) {
    assert!(
        world
            .borrow()
            .reporter
            .events()
            .contains(&HealthEvent::BootstrapSucceeded),
        "bootstrap success event missing"
    );
}

#[then("the reporter recorded bootstrap failure")]
fn then_reporter_failure(world: &RefCell<TestWorld>) {
    let events = world.borrow().reporter.events();
    let failed = events
        .iter()
        .any(|event| matches!(event, HealthEvent::BootstrapFailed(_)));
    assert!(failed, "bootstrap failure event missing: {events:?}");
}

#[then("no status transition was reported")]
fn then_no_transition(world: &RefCell<TestWorld>) {
    let statuses = world.borrow().reporter.statuses();
    assert!(statuses.is_empty(), "unexpected transitions: {statuses:?}");
}

#[scenario(
    path = "tests/features/server_bootstrap.feature",
    name = "Bootstrap succeeds with a valid configuration"
)]
fn bootstrap_succeeds(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/server_bootstrap.feature",
    name = "Bootstrap reports an invalid configuration"
)]
fn bootstrap_reports_invalid_configuration(world: RefCell<TestWorld>) {
    drop(world);
}
