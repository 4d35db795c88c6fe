use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Wait budget used when the caller does not supply one
pub const DEFAULT_TIMEOUT_SECONDS: i64 = 120;

fn default_timeout() -> i64 {
    DEFAULT_TIMEOUT_SECONDS
}

/// Scope a test run is requested at, from most to least specific
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Method,
    Class,
    Assembly,
}

impl RunMode {
    /// Resolve a caller-supplied action name.
    /// Accepts the host's action names and the short scope names, case-insensitive.
    pub fn from_action(action: &str) -> Option<Self> {
        match action.trim().to_ascii_lowercase().as_str() {
            "run_test_method" | "method" => Some(RunMode::Method),
            "run_test_class" | "class" => Some(RunMode::Class),
            "run_test_asmdef" | "assembly" => Some(RunMode::Assembly),
            _ => None,
        }
    }

    /// Action name understood by the remote test host
    pub fn action(&self) -> &'static str {
        match self {
            RunMode::Method => "run_test_method",
            RunMode::Class => "run_test_class",
            RunMode::Assembly => "run_test_asmdef",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.action())
    }
}

/// Inbound request to run tests on the remote host.
///
/// `action` stays a plain string so that unknown modes can be reported
/// as a structured outcome instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub action: String,
    #[serde(default)]
    pub assembly: Option<String>,
    #[serde(default, alias = "class")]
    pub class_name: Option<String>,
    #[serde(default, alias = "method")]
    pub method_name: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: i64,
}

impl RunRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            assembly: None,
            class_name: None,
            method_name: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    pub fn method(assembly: &str, class_name: &str, method_name: &str) -> Self {
        Self::new(RunMode::Method.action())
            .with_assembly(assembly)
            .with_class(class_name)
            .with_method(method_name)
    }

    pub fn class(assembly: &str, class_name: &str) -> Self {
        Self::new(RunMode::Class.action())
            .with_assembly(assembly)
            .with_class(class_name)
    }

    pub fn assembly(assembly: &str) -> Self {
        Self::new(RunMode::Assembly.action()).with_assembly(assembly)
    }

    pub fn with_assembly(mut self, assembly: &str) -> Self {
        self.assembly = Some(assembly.to_string());
        self
    }

    pub fn with_class(mut self, class_name: &str) -> Self {
        self.class_name = Some(class_name.to_string());
        self
    }

    pub fn with_method(mut self, method_name: &str) -> Self {
        self.method_name = Some(method_name.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout_seconds: i64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }
}

/// Workflow state label reported by the remote host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkflowStatus {
    Idle,
    RunningTest,
    Completed,
    Error,
    /// Transient label this crate does not interpret
    Other(String),
    /// No label reported
    #[default]
    Unknown,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &str {
        match self {
            WorkflowStatus::Idle => "IDLE",
            WorkflowStatus::RunningTest => "RUNNING_TEST",
            WorkflowStatus::Completed => "COMPLETED",
            WorkflowStatus::Error => "ERROR",
            WorkflowStatus::Other(label) => label,
            WorkflowStatus::Unknown => "",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Error)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, WorkflowStatus::RunningTest)
    }
}

impl From<String> for WorkflowStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "IDLE" => WorkflowStatus::Idle,
            "RUNNING_TEST" => WorkflowStatus::RunningTest,
            "COMPLETED" => WorkflowStatus::Completed,
            "ERROR" => WorkflowStatus::Error,
            "" => WorkflowStatus::Unknown,
            _ => WorkflowStatus::Other(label),
        }
    }
}

impl From<&str> for WorkflowStatus {
    fn from(label: &str) -> Self {
        WorkflowStatus::from(label.to_string())
    }
}

impl From<WorkflowStatus> for String {
    fn from(status: WorkflowStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate counts reported with a completed run.
/// A negative or missing `total` means the host recorded no tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    #[serde(
        default,
        deserialize_with = "lenient_total",
        skip_serializing_if = "Option::is_none"
    )]
    pub total: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub passed: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub failed: i64,
    #[serde(default, alias = "notRun", deserialize_with = "lenient_count")]
    pub not_run: i64,
}

impl TestSummary {
    pub fn new(total: i64, passed: i64, failed: i64) -> Self {
        Self {
            total: Some(total),
            passed,
            failed,
            not_run: 0,
        }
    }

    /// Total, when the host actually recorded tests
    pub fn recorded_total(&self) -> Option<i64> {
        self.total.filter(|total| *total >= 0)
    }
}

fn number(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|n| n as i64))
}

fn lenient_total<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number))
}

// Hosts send null or a placeholder string for counts they did not track
fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_total(deserializer)?.unwrap_or(0))
}

/// One observation of the remote run, as returned by a status query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub workflow_status: WorkflowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_summary: Option<TestSummary>,
}

impl StatusSnapshot {
    pub fn with_status(status: WorkflowStatus) -> Self {
        Self {
            workflow_status: status,
            ..Self::default()
        }
    }

    /// Read a host status payload field by field.
    ///
    /// `workflow_status` and `error_message` are read first; an ERROR snapshot
    /// is returned without looking at anything else. Result and summary are
    /// optional: a summary that does not parse is dropped, not reported.
    /// Returns `None` only when the payload is not a JSON object.
    pub fn from_host(data: &Value) -> Option<Self> {
        let fields = data.as_object()?;
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);

        let workflow_status = text("workflow_status")
            .map(WorkflowStatus::from)
            .unwrap_or_default();
        let error_message = text("error_message");

        if workflow_status == WorkflowStatus::Error {
            return Some(Self {
                workflow_status,
                error_message,
                ..Self::default()
            });
        }

        let test_summary = fields
            .get("test_summary")
            .and_then(|summary| TestSummary::deserialize(summary).ok());

        Some(Self {
            workflow_status,
            error_message,
            test_result: text("test_result"),
            test_summary,
        })
    }
}

/// Structured response from the command channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Result of issuing the start command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOutcome {
    pub accepted: bool,
    pub message: String,
}

impl From<&CommandResponse> for StartOutcome {
    fn from(response: &CommandResponse) -> Self {
        Self {
            accepted: response.success,
            message: response.message.clone(),
        }
    }
}

/// Structured details attached to a run outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeData {
    pub workflow_status: WorkflowStatus,
    pub test_executed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_summary: Option<TestSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final result of one orchestration call. Same shape for every run mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<OutcomeData>,
    /// Host-supplied payload of a rejected start, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_data: Option<serde_json::Value>,
}

impl RunOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            host_data: None,
        }
    }

    pub fn with_data(mut self, data: OutcomeData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn completed(message: impl Into<String>, data: OutcomeData) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            host_data: None,
        }
    }
}

impl From<CommandResponse> for RunOutcome {
    fn from(response: CommandResponse) -> Self {
        Self {
            success: response.success,
            message: response.message,
            data: None,
            host_data: response.data,
        }
    }
}
