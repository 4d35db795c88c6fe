/// Command Channel - Transport to the Remote Test Host
///
/// **Responsibility:**
/// Deliver a named command with string parameters and hand back the host's
/// structured response.
///
/// **Boundary:**
/// - The channel knows HOW to reach the host (TCP, framing, retries)
/// - The channel does NOT interpret workflow states
/// - Retries are bounded; the last fault is returned to the caller
use crate::error::ChannelError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use testrelay_common::config::Config;
use testrelay_common::protocol::{self, CommandEnvelope, FrameError, ResponseEnvelope};
use testrelay_common::types::CommandResponse;
use tokio::net::TcpStream;
use tracing::{debug, warn};

#[async_trait]
pub trait CommandChannel: Send + Sync {
    async fn send(
        &self,
        command: &str,
        params: &HashMap<String, String>,
    ) -> Result<CommandResponse, ChannelError>;
}

/// Channel speaking length-prefixed JSON over a fresh TCP connection per command
#[derive(Debug, Clone)]
pub struct TcpCommandChannel {
    addr: String,
    connect_timeout: Duration,
    io_timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl TcpCommandChannel {
    pub fn new(addr: impl Into<String>) -> Self {
        Self::from_config(&Config::defaults()).with_addr(addr)
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            addr: config.host_addr(),
            connect_timeout: config.connect_timeout,
            io_timeout: config.io_timeout,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        }
    }

    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, io_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.io_timeout = io_timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn send_once(&self, envelope: &CommandEnvelope) -> Result<CommandResponse, ChannelError> {
        let mut stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| ChannelError::Timeout(self.connect_timeout))?
            .map_err(|source| ChannelError::Connect {
                addr: self.addr.clone(),
                source,
            })?;

        let exchange = async {
            protocol::write_frame(&mut stream, envelope).await?;
            let response: ResponseEnvelope = protocol::read_frame(&mut stream).await?;
            Ok::<_, FrameError>(response)
        };
        let response = tokio::time::timeout(self.io_timeout, exchange)
            .await
            .map_err(|_| ChannelError::Timeout(self.io_timeout))??;

        if let Some(retry_after_ms) = response.reload_hint() {
            return Err(ChannelError::Reloading {
                retry_after: retry_after_ms.map(Duration::from_millis),
            });
        }

        if !response.is_success() {
            return Err(ChannelError::Remote(
                response
                    .error
                    .unwrap_or_else(|| "no error message".to_string()),
            ));
        }

        let result = response
            .result
            .ok_or_else(|| ChannelError::Malformed("success response without result".to_string()))?;
        serde_json::from_value(result).map_err(|e| ChannelError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl CommandChannel for TcpCommandChannel {
    async fn send(
        &self,
        command: &str,
        params: &HashMap<String, String>,
    ) -> Result<CommandResponse, ChannelError> {
        let envelope = CommandEnvelope {
            command: command.to_string(),
            params: params.clone(),
        };

        let mut attempt = 0;
        loop {
            match self.send_once(&envelope).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = e.retry_after().unwrap_or(self.retry_delay);
                    debug!(
                        command,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying command"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if attempt > 0 {
                        warn!(command, attempts = attempt + 1, error = %e, "Command failed after retries");
                    }
                    return Err(e);
                }
            }
        }
    }
}
