#![doc = include_str!("../README.md")]

#[cfg(target_arch = "wasm32")]
mod document;
#[cfg(target_arch = "wasm32")]
mod error;
#[cfg(target_arch = "wasm32")]
mod frame;
#[cfg(target_arch = "wasm32")]
mod init;
#[cfg(target_arch = "wasm32")]
mod widget;

#[cfg(target_arch = "wasm32")]
pub use document::{WebDocument, WebElement};
#[cfg(target_arch = "wasm32")]
pub use frame::{FrameError, WebFrameTransport};
#[cfg(target_arch = "wasm32")]
pub use init::{init_sdk, LogLevel};
#[cfg(target_arch = "wasm32")]
pub use widget::{init_widget, JsFlyttsmartWidget};
