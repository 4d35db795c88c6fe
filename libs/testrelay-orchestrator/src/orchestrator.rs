/// Test Orchestrator - High-Level Flow
///
/// **Responsibility:**
/// validate → dispatch → poll → format, producing one `RunOutcome`.
///
/// This module is the glue layer; it knows nothing about:
/// - How the host is reached (channel's job)
/// - How states are interpreted (poller's job)
/// - How messages read (formatter's job)
///
/// Orchestrations share nothing but the channel, so any number may run concurrently.
use crate::channel::CommandChannel;
use crate::dispatch::dispatch;
use crate::error::StatusError;
use crate::events::{RunEvent, RunObserver, TracingObserver};
use crate::formatter;
use crate::poller::{self, PollResult, StatusPoller};
use crate::validator::{validate, ValidationError};
use std::sync::Arc;
use std::time::Duration;
use testrelay_common::config::{Config, DEFAULT_POLL_INTERVAL_MS};
use testrelay_common::types::{RunOutcome, RunRequest, StartOutcome, StatusSnapshot};
use tracing::{instrument, Span};
use uuid::Uuid;

#[derive(Clone)]
pub struct TestOrchestrator {
    channel: Arc<dyn CommandChannel>,
    observer: Arc<dyn RunObserver>,
    poll_interval: Duration,
}

impl TestOrchestrator {
    pub fn new(channel: Arc<dyn CommandChannel>) -> Self {
        Self {
            channel,
            observer: Arc::new(TracingObserver),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    pub fn from_config(channel: Arc<dyn CommandChannel>, config: &Config) -> Self {
        Self::new(channel).with_poll_interval(config.poll_interval)
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn emit(&self, run_id: Uuid, event: RunEvent) {
        self.observer.on_event(run_id, &event);
    }

    /// Run tests at the requested scope and wait for a terminal outcome.
    /// Never fails: every problem is reported as `success = false`.
    pub async fn run_tests(&self, request: &RunRequest) -> RunOutcome {
        match self.try_run_tests(request).await {
            Ok(outcome) => outcome,
            Err(e) => RunOutcome::failure(e.to_string()),
        }
    }

    /// Same as [`run_tests`](Self::run_tests), but a request rejected before
    /// reaching the host comes back as `Err` so callers can tell it apart.
    #[instrument(skip(self, request), fields(action = %request.action, run_id = tracing::field::Empty))]
    pub async fn try_run_tests(&self, request: &RunRequest) -> Result<RunOutcome, ValidationError> {
        let run_id = Uuid::new_v4();
        Span::current().record("run_id", tracing::field::display(run_id));

        let run = match validate(request) {
            Ok(run) => run,
            Err(e) => {
                self.emit(run_id, RunEvent::ValidationFailed { reason: e.to_string() });
                return Err(e);
            }
        };

        let description = formatter::describe_scope(&run.scope);
        let mode = run.scope.mode();
        self.emit(
            run_id,
            RunEvent::Validated {
                mode,
                description: description.clone(),
                timeout_secs: run.timeout_secs,
            },
        );

        let response = match dispatch(self.channel.as_ref(), &run.scope).await {
            Ok(response) => response,
            Err(e) => {
                self.emit(run_id, RunEvent::DispatchFailed { error: e.to_string() });
                return Ok(RunOutcome::failure(formatter::dispatch_failure_message(&description, &e)));
            }
        };

        let start = StartOutcome::from(&response);
        if !start.accepted {
            self.emit(run_id, RunEvent::DispatchRejected { message: start.message });
            return Ok(RunOutcome::from(response));
        }
        self.emit(run_id, RunEvent::Dispatched { mode });

        let poller = StatusPoller::new(
            self.channel.as_ref(),
            self.observer.as_ref(),
            run_id,
            self.poll_interval,
        );

        let outcome = match poller.run(run.timeout()).await {
            PollResult::Completed { snapshot, state } => {
                self.emit(
                    run_id,
                    RunEvent::Completed {
                        immediate: !state.test_has_started,
                        elapsed: state.started_at.elapsed(),
                    },
                );
                formatter::completed_outcome(&description, &snapshot, state.test_has_started)
            }
            PollResult::Errored { snapshot, state } => {
                let outcome = formatter::errored_outcome(&description, &snapshot, state.test_has_started);
                self.emit(
                    run_id,
                    RunEvent::Errored {
                        message: outcome.message.clone(),
                        elapsed: state.started_at.elapsed(),
                    },
                );
                outcome
            }
            PollResult::TimedOut { state } => {
                self.emit(
                    run_id,
                    RunEvent::TimedOut {
                        test_has_started: state.test_has_started,
                        elapsed: state.started_at.elapsed(),
                    },
                );
                formatter::timed_out_outcome(
                    &description,
                    run.timeout_secs,
                    &state.last_observed_status,
                    state.test_has_started,
                )
            }
        };
        Ok(outcome)
    }

    /// Current workflow status of the host, independent of any run
    pub async fn query_status(&self) -> Result<StatusSnapshot, StatusError> {
        poller::query_status(self.channel.as_ref()).await
    }
}
