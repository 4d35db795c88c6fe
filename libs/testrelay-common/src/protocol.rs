//! Wire protocol shared by the orchestrator and anything speaking to the test host.
//! Defines command names, parameter keys and framing only, no transport logic.
//!
//! Frames are `[8-byte big-endian length][JSON payload]`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const RUN_TESTS_COMMAND: &str = "run_play_mode_tests";
pub const STATUS_ACTION: &str = "status";

pub const PARAM_ACTION: &str = "action";
pub const PARAM_ASSEMBLY: &str = "test_assembly";
pub const PARAM_CLASS: &str = "test_class";
pub const PARAM_METHOD: &str = "test_method";

pub const FRAME_HEADER_LEN: usize = 8;
pub const MAX_FRAME_BYTES: u64 = 64 * 1024 * 1024;

/// Host state label meaning its runtime is being reloaded
pub const RELOADING_STATE: &str = "reloading";

/// Parameters of a status query
pub fn status_params() -> HashMap<String, String> {
    HashMap::from([(PARAM_ACTION.to_string(), STATUS_ACTION.to_string())])
}

/// Command sent to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(rename = "type")]
    pub command: String,
    pub params: HashMap<String, String>,
}

/// Reply from the host. `status` is `"success"` or `"error"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn success(result: serde_json::Value) -> Self {
        Self {
            status: "success".to_string(),
            result: Some(result),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            result: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// `Some(retry_after_ms)` when the host reports it is reloading
    pub fn reload_hint(&self) -> Option<Option<u64>> {
        let result = self.result.as_ref()?;
        if result.get("state").and_then(|s| s.as_str()) != Some(RELOADING_STATE) {
            return None;
        }
        Some(result.get("retry_after_ms").and_then(|v| v.as_u64()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame io: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame of {0} bytes exceeds the size limit")]
    TooLarge(u64),
    #[error("frame payload: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Serialize `value` and write it as one frame
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = serde_json::to_vec(value)?;
    let len = payload.len() as u64;
    if len > MAX_FRAME_BYTES {
        return Err(FrameError::TooLarge(len));
    }

    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame and deserialize its payload
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, FrameError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut header = [0u8; FRAME_HEADER_LEN];
    reader.read_exact(&mut header).await?;
    let len = u64::from_be_bytes(header);
    if len > MAX_FRAME_BYTES {
        return Err(FrameError::TooLarge(len));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(serde_json::from_slice(&payload)?)
}
