// In-memory command channel replaying a scripted host

use crate::channel::CommandChannel;
use crate::error::ChannelError;
use crate::events::{RunEvent, RunObserver};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use testrelay_common::protocol::{PARAM_ACTION, STATUS_ACTION};
use testrelay_common::types::{CommandResponse, TestSummary};
use uuid::Uuid;

/// Answer to one status query
#[derive(Debug, Clone)]
pub enum Reply {
    /// Successful response carrying this `data` payload
    Raw(Option<serde_json::Value>),
    /// Host answered with `success = false`
    Rejected(String),
    /// Connection dropped
    Fault,
}

impl Reply {
    pub fn status(label: &str) -> Self {
        Reply::Raw(Some(json!({ "workflow_status": label })))
    }

    pub fn completed(result: &str, summary: TestSummary) -> Self {
        Reply::Raw(Some(json!({
            "workflow_status": "COMPLETED",
            "test_result": result,
            "test_summary": summary,
        })))
    }

    pub fn error(message: &str) -> Self {
        Reply::Raw(Some(json!({
            "workflow_status": "ERROR",
            "error_message": message,
        })))
    }

    fn into_response(self) -> Result<CommandResponse, ChannelError> {
        match self {
            Reply::Raw(data) => Ok(CommandResponse::ok("Status", data)),
            Reply::Rejected(message) => Ok(CommandResponse::rejected(message)),
            Reply::Fault => Err(ChannelError::Connect {
                addr: "scripted".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionReset),
            }),
        }
    }
}

#[derive(Debug, Clone)]
enum StartReply {
    Accept,
    Reject(String),
    Fault,
}

/// Scripted host. Status replies are consumed in order; the last one repeats forever.
pub struct ScriptedChannel {
    start: StartReply,
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    sent: Mutex<Vec<HashMap<String, String>>>,
}

impl ScriptedChannel {
    pub fn new(replies: Vec<Reply>) -> Self {
        let fallback = replies.last().cloned().unwrap_or_else(|| Reply::status("IDLE"));
        Self {
            start: StartReply::Accept,
            replies: Mutex::new(replies.into()),
            fallback,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting_start(mut self, message: &str) -> Self {
        self.start = StartReply::Reject(message.to_string());
        self
    }

    pub fn faulting_start(mut self) -> Self {
        self.start = StartReply::Fault;
        self
    }

    /// Every parameter map received, in order
    pub fn sent(&self) -> Vec<HashMap<String, String>> {
        self.sent.lock().unwrap().clone()
    }

    pub fn start_requests(&self) -> Vec<HashMap<String, String>> {
        self.sent()
            .into_iter()
            .filter(|p| p.get(PARAM_ACTION).map(String::as_str) != Some(STATUS_ACTION))
            .collect()
    }

    pub fn status_polls(&self) -> usize {
        self.sent().len() - self.start_requests().len()
    }
}

#[async_trait]
impl CommandChannel for ScriptedChannel {
    async fn send(
        &self,
        _command: &str,
        params: &HashMap<String, String>,
    ) -> Result<CommandResponse, ChannelError> {
        self.sent.lock().unwrap().push(params.clone());

        if params.get(PARAM_ACTION).map(String::as_str) != Some(STATUS_ACTION) {
            return match &self.start {
                StartReply::Accept => Ok(CommandResponse::ok("Test run started", None)),
                StartReply::Reject(message) => Ok(CommandResponse {
                    success: false,
                    message: message.clone(),
                    data: Some(json!({ "reason": "busy" })),
                }),
                StartReply::Fault => Reply::Fault.into_response(),
            };
        }

        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone()).into_response()
    }
}

/// Keeps every event so a test can inspect the run afterwards
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(Uuid, RunEvent)>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn count(&self, predicate: impl Fn(&RunEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl RunObserver for RecordingObserver {
    fn on_event(&self, run_id: Uuid, event: &RunEvent) {
        self.events.lock().unwrap().push((run_id, event.clone()));
    }
}
