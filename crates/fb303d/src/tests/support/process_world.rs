//! Process supervision test world shared across lifecycle scenarios.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use fb303_ctl::ControlClient;
use fb303_types::ServiceStatus;

use crate::health::HealthReporter;
use crate::process::{LaunchError, LaunchPlan, ShutdownError, ShutdownSignal, run_daemon_with};
use crate::server::DrainReport;
use crate::service::{ManagementService, ShutdownRequest};
use crate::tests::support::{FailingConfigLoader, RecordingHealthReporter, TestConfigLoader};

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(2);
pub const POLL_INTERVAL: Duration = Duration::from_millis(25);
pub const SIGTERM: i32 = 15;

pub type StepResult = Result<(), String>;
type LaunchResult = Result<DrainReport, LaunchError>;

pub struct ProcessTestWorld {
    loader: TestConfigLoader,
    pub reporter: Arc<RecordingHealthReporter>,
    shutdown: TestShutdownSignal,
    handle: Option<thread::JoinHandle<LaunchResult>>,
    result: Option<LaunchResult>,
    last_reply: Option<Result<String, String>>,
}

impl Default for ProcessTestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTestWorld {
    pub fn new() -> Self {
        Self {
            loader: TestConfigLoader::new(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            shutdown: TestShutdownSignal::default(),
            handle: None,
            result: None,
            last_reply: None,
        }
    }

    pub fn start_background(&mut self) -> StepResult {
        if self.handle.is_some() {
            return Err(String::from("server already running"));
        }
        let plan = LaunchPlan {
            loader: self.loader.clone(),
            reporter: self.reporter.clone() as Arc<dyn HealthReporter>,
            shutdown: self.shutdown.clone(),
        };
        self.handle = Some(thread::spawn(move || run_daemon_with(plan)));
        Ok(())
    }

    pub fn start_with_invalid_config(&mut self) {
        let plan = LaunchPlan {
            loader: FailingConfigLoader,
            reporter: self.reporter.clone() as Arc<dyn HealthReporter>,
            shutdown: self.shutdown.clone(),
        };
        self.result = Some(run_daemon_with(plan));
    }

    pub fn client(&self) -> ControlClient {
        ControlClient::new(self.loader.endpoint(), Duration::from_secs(1))
    }

    /// Polls `getStatus` until the server answers with `expected`.
    pub fn wait_for_status(&self, expected: ServiceStatus) -> StepResult {
        let client = self.client();
        let deadline = Instant::now() + WAIT_TIMEOUT;
        let mut last = None;
        while Instant::now() < deadline {
            match client.status() {
                Ok(status) if status == expected => return Ok(()),
                Ok(status) => last = Some(status.to_string()),
                Err(error) => last = Some(error.to_string()),
            }
            thread::sleep(POLL_INTERVAL);
        }
        Err(format!(
            "server never reported {expected}; last observation: {last:?}"
        ))
    }

    pub fn record_reply(&mut self, reply: Result<String, String>) {
        self.last_reply = Some(reply);
    }

    pub fn last_reply(&self) -> Option<&Result<String, String>> {
        self.last_reply.as_ref()
    }

    pub fn trigger_signal(&self) {
        self.shutdown.trigger(ShutdownRequest::Signal(SIGTERM));
    }

    pub fn join_background(&mut self) -> StepResult {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| String::from("server not running"))?;
        let deadline = Instant::now() + WAIT_TIMEOUT;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                return Err(String::from("server did not stop in time"));
            }
            thread::sleep(POLL_INTERVAL);
        }
        let result = handle
            .join()
            .map_err(|_| String::from("server thread panicked"))?;
        self.result = Some(result);
        Ok(())
    }

    pub fn last_result(&self) -> Option<&LaunchResult> {
        self.result.as_ref()
    }
}

impl Drop for ProcessTestWorld {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.shutdown.trigger(ShutdownRequest::Host);
            let _ = handle.join();
        }
    }
}

#[derive(Default)]
struct SignalState {
    sender: Option<std::sync::mpsc::Sender<ShutdownRequest>>,
    pending: Option<ShutdownRequest>,
}

/// Shutdown listener that forwards test-triggered requests into the
/// service's own shutdown channel, next to remote `shutdown` commands.
#[derive(Clone, Default)]
pub struct TestShutdownSignal {
    state: Arc<Mutex<SignalState>>,
}

impl TestShutdownSignal {
    pub fn trigger(&self, request: ShutdownRequest) {
        let mut state = self.state.lock().expect("shutdown state poisoned");
        match state.sender.as_ref() {
            Some(sender) => {
                let _ = sender.send(request);
            }
            None => state.pending = Some(request),
        }
    }
}

impl ShutdownSignal for TestShutdownSignal {
    fn wait(&self, service: &ManagementService) -> Result<ShutdownRequest, ShutdownError> {
        let requests = service
            .shutdown_requests()
            .ok_or(ShutdownError::ReceiverTaken)?;
        {
            let mut state = self.state.lock().expect("shutdown state poisoned");
            let sender = service.shutdown_sender();
            if let Some(request) = state.pending.take() {
                let _ = sender.send(request);
            }
            state.sender = Some(sender);
        }
        requests
            .recv()
            .map_err(|source| ShutdownError::Disconnected { source })
    }
}
