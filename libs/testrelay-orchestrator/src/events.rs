// Run lifecycle events and the observer seam they are reported through

use std::time::Duration;
use testrelay_common::types::{RunMode, WorkflowStatus};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Validated {
        mode: RunMode,
        description: String,
        timeout_secs: u64,
    },
    ValidationFailed {
        reason: String,
    },
    Dispatched {
        mode: RunMode,
    },
    DispatchRejected {
        message: String,
    },
    DispatchFailed {
        error: String,
    },
    StatusChanged {
        from: WorkflowStatus,
        to: WorkflowStatus,
    },
    TestStarted,
    PollFault {
        error: String,
    },
    Completed {
        immediate: bool,
        elapsed: Duration,
    },
    Errored {
        message: String,
        elapsed: Duration,
    },
    TimedOut {
        test_has_started: bool,
        elapsed: Duration,
    },
}

/// Receives every event of every orchestration
pub trait RunObserver: Send + Sync {
    fn on_event(&self, run_id: Uuid, event: &RunEvent);
}

/// Default observer: structured `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_event(&self, run_id: Uuid, event: &RunEvent) {
        match event {
            RunEvent::Validated {
                mode,
                description,
                timeout_secs,
            } => info!(run_id = %run_id, mode = %mode, timeout_secs, "Running tests: {}", description),
            RunEvent::ValidationFailed { reason } => {
                warn!(run_id = %run_id, reason = %reason, "Rejected test run request")
            }
            RunEvent::Dispatched { mode } => {
                debug!(run_id = %run_id, mode = %mode, "Start command accepted by test host")
            }
            RunEvent::DispatchRejected { message } => {
                warn!(run_id = %run_id, message = %message, "Test host rejected start command")
            }
            RunEvent::DispatchFailed { error } => {
                warn!(run_id = %run_id, error = %error, "Could not deliver start command")
            }
            RunEvent::StatusChanged { from, to } => {
                debug!(run_id = %run_id, from = %from, to = %to, "Workflow status changed")
            }
            RunEvent::TestStarted => debug!(run_id = %run_id, "Test execution started"),
            RunEvent::PollFault { error } => {
                // Expected while the host runtime reloads
                debug!(run_id = %run_id, error = %error, "Status check failed")
            }
            RunEvent::Completed { immediate, elapsed } => info!(
                run_id = %run_id,
                immediate,
                elapsed_ms = elapsed.as_millis() as u64,
                "Test run completed"
            ),
            RunEvent::Errored { message, elapsed } => warn!(
                run_id = %run_id,
                message = %message,
                elapsed_ms = elapsed.as_millis() as u64,
                "Test run failed on host"
            ),
            RunEvent::TimedOut {
                test_has_started,
                elapsed,
            } => warn!(
                run_id = %run_id,
                test_has_started,
                elapsed_ms = elapsed.as_millis() as u64,
                "Test run timed out"
            ),
        }
    }
}
