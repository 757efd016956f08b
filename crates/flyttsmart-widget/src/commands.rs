use std::{cell::RefCell, rc::Rc};

use flyttsmart_auth::StatusEvent;
use serde::Serialize;

/// Sent when the widget has been initialized. The value is the settings, without the personal
/// number.
pub const CMD_INIT: &str = "API:INIT";
/// Sent when the status line and frame have been mounted.
pub const CMD_INIT_UI: &str = "API:INIT_UI";

/// Lifecycle notification delivered to `on_cmd_request` listeners.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CommandRequest {
    #[allow(missing_docs)]
    pub cmd: String,
    #[allow(missing_docs)]
    pub value: serde_json::Value,
}

/// Progress of the widget delivered to `on_event` listeners.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WidgetEvent {
    /// A status event of the authentication handshake, as mirrored into the status line.
    Status(StatusEvent),
    /// The status line was hidden and the frame shown.
    FrameRevealed,
    /// The frame answered and received the access token.
    TokenDelivered,
    /// The frame never answered, or the channel to it failed.
    HandshakeFailed {
        #[allow(missing_docs)]
        reason: String,
    },
}

/// Listeners registered by the host page. Called synchronously, in registration order.
pub(crate) struct Listeners<T> {
    listeners: RefCell<Vec<Rc<dyn Fn(&T)>>>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }
}

impl<T> Listeners<T> {
    pub(crate) fn add(&self, listener: impl Fn(&T) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub(crate) fn trigger(&self, value: &T) {
        // Listeners may register further listeners.
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(value);
        }
    }
}
