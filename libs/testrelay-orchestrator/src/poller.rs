/// Status Poller - Run State Machine
///
/// **Core Responsibility:**
/// Query the host's workflow status at a fixed cadence until the run reaches
/// a terminal state or the deadline passes.
///
/// **States:**
/// - `ERROR` is terminal and checked before anything else on every poll
/// - `RUNNING_TEST` marks the run as started (never reset)
/// - `COMPLETED` is terminal; success describes the run finishing, not test results
/// - `IDLE` and unrecognized labels only update the last observed status
///
/// A failed status query is reported to the observer and skipped. Hosts with a
/// reloadable runtime drop the connection mid-run, so one blip must not end the wait.
use crate::channel::CommandChannel;
use crate::error::StatusError;
use crate::events::{RunEvent, RunObserver};
use crate::timeout::Deadline;
use std::time::Duration;
use testrelay_common::protocol::{status_params, RUN_TESTS_COMMAND};
use testrelay_common::types::{StatusSnapshot, WorkflowStatus};
use tokio::time::Instant;
use uuid::Uuid;

/// Issue one status query
pub async fn query_status(channel: &dyn CommandChannel) -> Result<StatusSnapshot, StatusError> {
    let response = channel.send(RUN_TESTS_COMMAND, &status_params()).await?;
    if !response.success {
        return Err(StatusError::Rejected(response.message));
    }

    match response.data {
        Some(data) => StatusSnapshot::from_host(&data)
            .ok_or_else(|| StatusError::Malformed(format!("expected an object, got {}", data))),
        None => Ok(StatusSnapshot::default()),
    }
}

/// Per-run mutable state; lives for one orchestration only
#[derive(Debug, Clone)]
pub struct PollState {
    pub started_at: Instant,
    pub last_observed_status: WorkflowStatus,
    pub test_has_started: bool,
}

impl PollState {
    pub fn new(started_at: Instant) -> Self {
        Self {
            started_at,
            last_observed_status: WorkflowStatus::Unknown,
            test_has_started: false,
        }
    }
}

/// What one snapshot means for the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue,
    Completed,
    Errored,
}

/// Apply one snapshot to the state machine, returning the events it produced
pub fn advance(state: &mut PollState, snapshot: &StatusSnapshot) -> (Step, Vec<RunEvent>) {
    let mut events = Vec::new();
    let status = &snapshot.workflow_status;

    if *status == WorkflowStatus::Error {
        return (Step::Errored, events);
    }

    if *status != state.last_observed_status {
        events.push(RunEvent::StatusChanged {
            from: state.last_observed_status.clone(),
            to: status.clone(),
        });
        state.last_observed_status = status.clone();
    }

    if status.is_running() && !state.test_has_started {
        state.test_has_started = true;
        events.push(RunEvent::TestStarted);
    }

    if status.is_terminal() {
        (Step::Completed, events)
    } else {
        (Step::Continue, events)
    }
}

/// How the polling phase ended
#[derive(Debug, Clone)]
pub enum PollResult {
    Completed {
        snapshot: StatusSnapshot,
        state: PollState,
    },
    Errored {
        snapshot: StatusSnapshot,
        state: PollState,
    },
    TimedOut {
        state: PollState,
    },
}

pub struct StatusPoller<'a> {
    channel: &'a dyn CommandChannel,
    observer: &'a dyn RunObserver,
    run_id: Uuid,
    interval: Duration,
}

impl<'a> StatusPoller<'a> {
    pub fn new(
        channel: &'a dyn CommandChannel,
        observer: &'a dyn RunObserver,
        run_id: Uuid,
        interval: Duration,
    ) -> Self {
        Self {
            channel,
            observer,
            run_id,
            interval,
        }
    }

    /// Poll until a terminal status or until `budget` elapses.
    /// The budget is measured from just before the first query.
    pub async fn run(&self, budget: Duration) -> PollResult {
        let deadline = Deadline::start(budget);
        let mut state = PollState::new(deadline.started_at());

        while !deadline.expired() {
            match query_status(self.channel).await {
                Ok(snapshot) => {
                    let (step, events) = advance(&mut state, &snapshot);
                    for event in &events {
                        self.observer.on_event(self.run_id, event);
                    }
                    match step {
                        Step::Errored => return PollResult::Errored { snapshot, state },
                        Step::Completed => return PollResult::Completed { snapshot, state },
                        Step::Continue => {}
                    }
                }
                Err(e) => {
                    self.observer.on_event(
                        self.run_id,
                        &RunEvent::PollFault {
                            error: e.to_string(),
                        },
                    );
                }
            }

            tokio::time::sleep(self.interval).await;
        }

        PollResult::TimedOut { state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingObserver, Reply, ScriptedChannel};
    use testrelay_common::types::TestSummary;

    fn snapshot(status: &str) -> StatusSnapshot {
        StatusSnapshot::with_status(WorkflowStatus::from(status))
    }

    #[test]
    fn test_running_marks_started_once() {
        let mut state = PollState::new(Instant::now());

        let (step, events) = advance(&mut state, &snapshot("RUNNING_TEST"));
        assert_eq!(step, Step::Continue);
        assert!(state.test_has_started);
        assert!(events.contains(&RunEvent::TestStarted));

        let (_, events) = advance(&mut state, &snapshot("RUNNING_TEST"));
        assert!(events.is_empty());

        // Back to a transient label does not reset the flag
        advance(&mut state, &snapshot("IDLE"));
        assert!(state.test_has_started);
        assert_eq!(state.last_observed_status, WorkflowStatus::Idle);
    }

    #[test]
    fn test_error_wins_over_everything() {
        let mut state = PollState::new(Instant::now());
        advance(&mut state, &snapshot("RUNNING_TEST"));

        let error = StatusSnapshot {
            workflow_status: WorkflowStatus::Error,
            error_message: Some("boom".to_string()),
            test_summary: Some(TestSummary::new(1, 1, 0)),
            ..StatusSnapshot::default()
        };
        let (step, _) = advance(&mut state, &error);
        assert_eq!(step, Step::Errored);
    }

    #[test]
    fn test_unrecognized_status_only_recorded() {
        let mut state = PollState::new(Instant::now());
        let (step, events) = advance(&mut state, &snapshot("COMPILING"));

        assert_eq!(step, Step::Continue);
        assert!(!state.test_has_started);
        assert_eq!(
            events,
            vec![RunEvent::StatusChanged {
                from: WorkflowStatus::Unknown,
                to: WorkflowStatus::Other("COMPILING".to_string()),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_faults_are_skipped() {
        let channel = ScriptedChannel::new(vec![
            Reply::Fault,
            Reply::Rejected("busy".to_string()),
            Reply::status("RUNNING_TEST"),
            Reply::Fault,
            Reply::completed("Passed", TestSummary::new(2, 2, 0)),
        ]);
        let observer = RecordingObserver::new();
        let poller = StatusPoller::new(&channel, &observer, Uuid::new_v4(), Duration::from_millis(500));

        let result = poller.run(Duration::from_secs(30)).await;

        match result {
            PollResult::Completed { state, .. } => assert!(state.test_has_started),
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(channel.status_polls(), 5);
        assert_eq!(observer.count(|e| matches!(e, RunEvent::PollFault { .. })), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_at_fixed_cadence_until_deadline() {
        let channel = ScriptedChannel::new(vec![Reply::status("IDLE")]);
        let observer = RecordingObserver::new();
        let poller = StatusPoller::new(&channel, &observer, Uuid::new_v4(), Duration::from_millis(500));

        let started = Instant::now();
        let result = poller.run(Duration::from_secs(2)).await;

        assert!(matches!(result, PollResult::TimedOut { ref state } if !state.test_has_started));
        assert!(started.elapsed() >= Duration::from_secs(2));
        // t = 0, 0.5, 1.0, 1.5
        assert_eq!(channel.status_polls(), 4);
    }

    #[tokio::test]
    async fn test_query_status_without_data_is_blank_snapshot() {
        let channel = ScriptedChannel::new(vec![Reply::Raw(None)]);
        let snapshot = query_status(&channel).await.unwrap();
        assert_eq!(snapshot, StatusSnapshot::default());
    }

    #[tokio::test]
    async fn test_query_status_accepts_no_tests_sentinel() {
        let channel = ScriptedChannel::new(vec![Reply::Raw(Some(serde_json::json!({
            "workflow_status": "COMPLETED",
            "test_summary": { "total": -1 }
        })))]);
        let snapshot = query_status(&channel).await.unwrap();

        assert_eq!(snapshot.workflow_status, WorkflowStatus::Completed);
        assert_eq!(snapshot.test_summary.unwrap().recorded_total(), None);
    }

    #[tokio::test]
    async fn test_query_status_rejects_non_object_payload() {
        let channel = ScriptedChannel::new(vec![Reply::Raw(Some(serde_json::json!("COMPLETED")))]);
        let result = query_status(&channel).await;
        assert!(matches!(result, Err(StatusError::Malformed(_))));
    }
}
