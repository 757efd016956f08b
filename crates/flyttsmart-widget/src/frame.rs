use serde::{Deserialize, Serialize};

/// Messages exchanged with the widget iframe.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrameMessage {
    /// Host → frame, repeated until the frame answers.
    Ping,
    /// Frame → host, the frame is ready for the token.
    Pong,
    /// Host → frame, sent once.
    #[serde(rename_all = "camelCase")]
    Access {
        #[allow(missing_docs)]
        access_token: String,
    },
}

/// A message received from some window, before origin filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Origin of the sending window.
    pub origin: String,
    /// Structured-clone payload as JSON.
    pub data: serde_json::Value,
}

impl InboundMessage {
    /// Decodes the payload. Messages that are not widget messages yield `None`.
    pub fn frame_message(&self) -> Option<FrameMessage> {
        serde_json::from_value(self.data.clone()).ok()
    }
}

/// This trait defines the interface used to talk to the document inside the widget frame.
/// It is up to the platform to implement it on top of `postMessage`.
pub trait FrameTransport {
    #[allow(missing_docs)]
    type Error: std::fmt::Display;

    /// Resolves once the frame has fired its `load` event. Resolves immediately if it already
    /// has.
    fn loaded(&self) -> impl std::future::Future<Output = ()>;

    /// Posts a message into the frame's window.
    fn post_message(&self, message: &FrameMessage, target_origin: &str)
        -> Result<(), Self::Error>;

    /// Receives the next message posted to the host window. Messages are buffered from the
    /// creation of the transport.
    fn receive(&self) -> impl std::future::Future<Output = Result<InboundMessage, Self::Error>>;
}
