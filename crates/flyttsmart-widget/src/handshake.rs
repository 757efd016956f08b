use std::{future::Future, time::Duration};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{
    frame::{FrameMessage, FrameTransport},
    time::sleep,
};

/// How often and how long the host pings the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingPolicy {
    /// Delay before each `PING`, including the first one.
    pub interval: Duration,
    /// Number of `PING` messages sent before giving up.
    pub max_attempts: u32,
}

#[allow(missing_docs)]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("The widget frame did not answer after {attempts} PING messages")]
    Timeout { attempts: u32 },
    #[error("Frame channel error: {0}")]
    Transport(String),
    #[error("No access token is available for the widget frame")]
    MissingAccessToken,
}

/// Readiness handshake with the widget frame.
///
/// ```text
/// LOADING ──load──▶ PINGING ──PONG──▶ TOKEN_DELIVERED
///                      │
///                      └──max attempts──▶ TIMED_OUT
/// ```
pub(crate) struct FrameHandshake<'a, T> {
    transport: &'a T,
    policy: PingPolicy,
    trusted_origin: Option<&'a str>,
    target_origin: &'a str,
}

impl<'a, T: FrameTransport> FrameHandshake<'a, T> {
    pub(crate) fn new(
        transport: &'a T,
        policy: PingPolicy,
        trusted_origin: Option<&'a str>,
        target_origin: &'a str,
    ) -> Self {
        Self {
            transport,
            policy,
            trusted_origin,
            target_origin,
        }
    }

    /// Waits for the frame to load, pings it until it answers and then posts the access token.
    ///
    /// `access_token` is only awaited once the frame has answered, so the token and the `PONG`
    /// may become available in either order.
    pub(crate) async fn deliver(
        &self,
        access_token: impl Future<Output = Option<String>>,
    ) -> Result<(), HandshakeError> {
        self.transport.loaded().await;
        log::debug!("Widget frame loaded");

        if self.trusted_origin.is_none() {
            log::warn!("No iframe origin configured, accepting frame messages from any origin");
        }

        self.await_pong().await?;

        let access_token = access_token
            .await
            .ok_or(HandshakeError::MissingAccessToken)?;
        self.post(&FrameMessage::Access { access_token })?;
        log::debug!("Access token delivered to widget frame");
        Ok(())
    }

    /// Runs the PING broadcast and the PONG listener side by side. Whichever finishes first
    /// cancels the other.
    async fn await_pong(&self) -> Result<(), HandshakeError> {
        let stop = CancellationToken::new();

        let pinger = async {
            let result = self.ping_until_stopped(&stop).await;
            stop.cancel();
            result
        };
        let listener = async {
            let result = self.listen_for_pong(&stop).await;
            stop.cancel();
            result
        };

        match tokio::join!(pinger, listener) {
            (_, Ok(true)) => Ok(()),
            (_, Err(e)) => Err(e),
            (Err(e), Ok(false)) => Err(e),
            (Ok(()), Ok(false)) => Err(HandshakeError::Timeout {
                attempts: self.policy.max_attempts,
            }),
        }
    }

    async fn ping_until_stopped(&self, stop: &CancellationToken) -> Result<(), HandshakeError> {
        for attempt in 1..=self.policy.max_attempts {
            tokio::select! {
                biased;
                _ = stop.cancelled() => return Ok(()),
                _ = sleep(self.policy.interval) => {}
            }

            log::trace!("PING {attempt}/{}", self.policy.max_attempts);
            self.post(&FrameMessage::Ping)?;
        }

        // Leave the last PING one interval to be answered.
        tokio::select! {
            biased;
            _ = stop.cancelled() => Ok(()),
            _ = sleep(self.policy.interval) => {
                log::error!(
                    "Widget frame did not answer after {} PING messages",
                    self.policy.max_attempts
                );
                Err(HandshakeError::Timeout {
                    attempts: self.policy.max_attempts,
                })
            }
        }
    }

    /// Returns `Ok(true)` on the first accepted `PONG`, `Ok(false)` if stopped before.
    async fn listen_for_pong(&self, stop: &CancellationToken) -> Result<bool, HandshakeError> {
        loop {
            let inbound = tokio::select! {
                biased;
                _ = stop.cancelled() => return Ok(false),
                received = self.transport.receive() => {
                    received.map_err(|e| HandshakeError::Transport(e.to_string()))?
                }
            };

            if let Some(trusted) = self.trusted_origin {
                if inbound.origin != trusted {
                    log::debug!("Ignoring frame message from {}", inbound.origin);
                    continue;
                }
            }

            if inbound.frame_message() == Some(FrameMessage::Pong) {
                log::debug!("PONG received from {}", inbound.origin);
                return Ok(true);
            }
        }
    }

    fn post(&self, message: &FrameMessage) -> Result<(), HandshakeError> {
        self.transport
            .post_message(message, self.target_origin)
            .map_err(|e| HandshakeError::Transport(e.to_string()))
    }
}
