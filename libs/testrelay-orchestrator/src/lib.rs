//! Remote test-run orchestration.
//!
//! Validates a requested test scope, starts the run on a remote test host
//! through a [`CommandChannel`], then polls the host until the run completes,
//! fails, or the wait budget runs out. Every path ends in a
//! [`RunOutcome`](testrelay_common::types::RunOutcome); nothing here panics or
//! aborts the caller.

pub mod channel;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod formatter;
pub mod orchestrator;
pub mod poller;
pub mod timeout;
pub mod validator;

#[cfg(test)]
mod test_support;

pub use channel::{CommandChannel, TcpCommandChannel};
pub use error::{ChannelError, StatusError};
pub use events::{RunEvent, RunObserver, TracingObserver};
pub use orchestrator::TestOrchestrator;
pub use validator::{validate, TestScope, ValidatedRun, ValidationError};
