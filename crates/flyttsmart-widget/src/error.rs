use thiserror::Error;

use crate::{handshake::HandshakeError, settings::SettingsError};

/// Errors returned by the [`WidgetController`](crate::WidgetController).
///
/// Everything except [`WidgetError::LoginFailed`] and [`WidgetError::Handshake`] signals a
/// mistake in the host integration and is not worth retrying.
#[allow(missing_docs)]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WidgetError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("The widget can not be initialized before the document is ready")]
    DocumentNotReady,
    #[error("Settings can not be changed once the widget is initialized")]
    AlreadyInitialized,
    #[error("The widget must be initialized before building the UI")]
    NotInitialized,
    #[error("The widget UI has not been mounted")]
    NotMounted,
    #[error("The iframe handshake is already running")]
    AlreadyStarted,
    #[error("Could not create <{0}> element")]
    ElementCreation(&'static str),
    #[error("The widget frame has no window to post messages to")]
    FrameUnavailable,

    #[error("Login failed: {0}")]
    LoginFailed(String),
    #[error(transparent)]
    Handshake(#[from] HandshakeError),
}

impl WidgetError {
    /// Name of the variant, exposed to JavaScript next to the message.
    pub fn variant(&self) -> &'static str {
        match self {
            WidgetError::Settings(_) => "Settings",
            WidgetError::DocumentNotReady => "DocumentNotReady",
            WidgetError::AlreadyInitialized => "AlreadyInitialized",
            WidgetError::NotInitialized => "NotInitialized",
            WidgetError::NotMounted => "NotMounted",
            WidgetError::AlreadyStarted => "AlreadyStarted",
            WidgetError::ElementCreation(_) => "ElementCreation",
            WidgetError::FrameUnavailable => "FrameUnavailable",
            WidgetError::LoginFailed(_) => "LoginFailed",
            WidgetError::Handshake(_) => "Handshake",
        }
    }
}
