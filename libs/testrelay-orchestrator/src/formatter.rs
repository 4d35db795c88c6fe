/// Result Formatter
///
/// Turns a validated scope and raw host snapshots into messages and
/// structured outcomes. Every message for one request embeds the same scope
/// description so callers can correlate success, failure and timeout reports.
use crate::validator::TestScope;
use testrelay_common::types::{OutcomeData, RunOutcome, StatusSnapshot, TestSummary, WorkflowStatus};

pub const IMMEDIATE_COMPLETION_NOTE: &str = "(immediate completion)";

/// Human-readable scope, e.g. `Assembly: Core, Class: MathTests, Method: Add`
pub fn describe_scope(scope: &TestScope) -> String {
    match scope {
        TestScope::Method {
            assembly,
            class_name,
            method_name,
        } => format!(
            "Assembly: {}, Class: {}, Method: {}",
            assembly, class_name, method_name
        ),
        TestScope::Class {
            assembly,
            class_name,
        } => format!("Assembly: {}, Class: {}", assembly, class_name),
        TestScope::Assembly { assembly } => format!("Assembly: {}", assembly),
    }
}

/// Count fragment of a summary, or `None` when the host recorded no tests
pub fn summary_counts(summary: &TestSummary) -> Option<String> {
    let total = summary.recorded_total()?;
    let mut counts = format!(
        "Total: {}, Passed: {}, Failed: {}",
        total, summary.passed, summary.failed
    );
    if summary.not_run > 0 {
        counts.push_str(&format!(", Not Run: {}", summary.not_run));
    }
    Some(counts)
}

pub fn completion_message(description: &str, snapshot: &StatusSnapshot, immediate: bool) -> String {
    let result = snapshot.test_result.as_deref().unwrap_or("Unknown");
    let mut message = format!(
        "Test execution completed: {} (Result: {}",
        description, result
    );

    if let Some(counts) = snapshot.test_summary.as_ref().and_then(summary_counts) {
        message.push_str(", ");
        message.push_str(&counts);
    }
    message.push(')');

    if immediate {
        message.push(' ');
        message.push_str(IMMEDIATE_COMPLETION_NOTE);
    }
    message
}

pub fn completed_outcome(description: &str, snapshot: &StatusSnapshot, test_has_started: bool) -> RunOutcome {
    RunOutcome::completed(
        completion_message(description, snapshot, !test_has_started),
        OutcomeData {
            workflow_status: snapshot.workflow_status.clone(),
            test_executed: true,
            test_result: Some(
                snapshot
                    .test_result
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
            ),
            test_summary: snapshot.test_summary.clone(),
            error: None,
        },
    )
}

pub fn errored_outcome(description: &str, snapshot: &StatusSnapshot, test_has_started: bool) -> RunOutcome {
    let error = snapshot
        .error_message
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "unknown error".to_string());

    RunOutcome::failure(format!("Test execution failed: {}: {}", description, error)).with_data(
        OutcomeData {
            workflow_status: snapshot.workflow_status.clone(),
            test_executed: test_has_started,
            test_result: snapshot.test_result.clone(),
            test_summary: snapshot.test_summary.clone(),
            error: Some(error),
        },
    )
}

pub fn timeout_message(description: &str, timeout_secs: u64, test_has_started: bool) -> String {
    if test_has_started {
        format!(
            "Test run timed out waiting for completion after {}s: {} (test was running)",
            timeout_secs, description
        )
    } else {
        format!(
            "Test run timed out waiting to start after {}s: {} (run never started)",
            timeout_secs, description
        )
    }
}

pub fn timed_out_outcome(
    description: &str,
    timeout_secs: u64,
    last_status: &WorkflowStatus,
    test_has_started: bool,
) -> RunOutcome {
    RunOutcome::failure(timeout_message(description, timeout_secs, test_has_started)).with_data(
        OutcomeData {
            workflow_status: last_status.clone(),
            test_executed: test_has_started,
            test_result: None,
            test_summary: None,
            error: None,
        },
    )
}

pub fn dispatch_failure_message(description: &str, error: &dyn std::fmt::Display) -> String {
    format!("Failed to dispatch test run for {}: {}", description, error)
}
