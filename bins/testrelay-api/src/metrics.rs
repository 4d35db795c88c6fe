// Prometheus metrics for orchestrated test runs

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};
use testrelay_orchestrator::{RunEvent, RunObserver, TracingObserver};
use uuid::Uuid;

lazy_static! {
    pub static ref RUNS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "testrelay_runs_total",
        "Test runs by final outcome",
        &["outcome"]
    )
    .expect("testrelay_runs_total registers once");
    pub static ref POLL_FAULTS_TOTAL: IntCounter = register_int_counter!(
        "testrelay_poll_faults_total",
        "Status queries that failed and were skipped"
    )
    .expect("testrelay_poll_faults_total registers once");
    pub static ref RUN_DURATION_SECONDS: Histogram = register_histogram!(
        "testrelay_run_duration_seconds",
        "Time from first status poll to a terminal outcome",
        vec![0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]
    )
    .expect("testrelay_run_duration_seconds registers once");
}

/// Logs through tracing and records run metrics
#[derive(Debug, Default)]
pub struct MetricsObserver {
    tracing: TracingObserver,
}

impl RunObserver for MetricsObserver {
    fn on_event(&self, run_id: Uuid, event: &RunEvent) {
        self.tracing.on_event(run_id, event);

        match event {
            RunEvent::ValidationFailed { .. } => {
                RUNS_TOTAL.with_label_values(&["invalid"]).inc();
            }
            RunEvent::DispatchRejected { .. } => {
                RUNS_TOTAL.with_label_values(&["rejected"]).inc();
            }
            RunEvent::DispatchFailed { .. } => {
                RUNS_TOTAL.with_label_values(&["dispatch_failed"]).inc();
            }
            RunEvent::PollFault { .. } => POLL_FAULTS_TOTAL.inc(),
            RunEvent::Completed { elapsed, .. } => {
                RUNS_TOTAL.with_label_values(&["completed"]).inc();
                RUN_DURATION_SECONDS.observe(elapsed.as_secs_f64());
            }
            RunEvent::Errored { elapsed, .. } => {
                RUNS_TOTAL.with_label_values(&["errored"]).inc();
                RUN_DURATION_SECONDS.observe(elapsed.as_secs_f64());
            }
            RunEvent::TimedOut { elapsed, .. } => {
                RUNS_TOTAL.with_label_values(&["timed_out"]).inc();
                RUN_DURATION_SECONDS.observe(elapsed.as_secs_f64());
            }
            RunEvent::Validated { .. }
            | RunEvent::Dispatched { .. }
            | RunEvent::StatusChanged { .. }
            | RunEvent::TestStarted => {}
        }
    }
}

/// Render the default registry in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_terminal_events_are_counted() {
        let observer = MetricsObserver::default();
        let completed = RUNS_TOTAL.with_label_values(&["completed"]).get();
        let faults = POLL_FAULTS_TOTAL.get();

        observer.on_event(
            Uuid::new_v4(),
            &RunEvent::PollFault {
                error: "connection reset".to_string(),
            },
        );
        observer.on_event(
            Uuid::new_v4(),
            &RunEvent::Completed {
                immediate: false,
                elapsed: Duration::from_secs(3),
            },
        );

        assert!(RUNS_TOTAL.with_label_values(&["completed"]).get() >= completed + 1);
        assert!(POLL_FAULTS_TOTAL.get() >= faults + 1);
    }

    #[test]
    fn test_render_contains_registered_metrics() {
        RUNS_TOTAL.with_label_values(&["timed_out"]).inc();
        let text = render().unwrap();
        assert!(text.contains("testrelay_runs_total"));
    }
}
