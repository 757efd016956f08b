#![doc = include_str!("../README.md")]

mod commands;
mod controller;
mod document;
mod error;
mod frame;
mod handshake;
mod settings;
mod time;

#[cfg(test)]
mod test_support;

pub use commands::{CommandRequest, WidgetEvent, CMD_INIT, CMD_INIT_UI};
pub use controller::{UiElements, WidgetController};
pub use document::{HostDocument, HostElement};
pub use error::WidgetError;
pub use frame::{FrameMessage, FrameTransport, InboundMessage};
pub use handshake::{HandshakeError, PingPolicy};
pub use settings::{SettingsError, WidgetConfig, WidgetSettings};
