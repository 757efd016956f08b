use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use serde::{Deserialize, Serialize};

/// Status text of the event emitted when the login step completes.
pub const LOGGED_IN_STATUS: &str = "User logged in...";

/// Outcome of a handshake step.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusType {
    #[allow(missing_docs)]
    Success,
    #[allow(missing_docs)]
    Error,
}

/// Notification emitted once per handshake step.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    /// Human readable description of the step outcome.
    pub status_text: String,
    /// Whether the step succeeded.
    pub status_type: StatusType,
    /// The session token, only present on the login success event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl StatusEvent {
    pub(crate) fn success(status_text: impl Into<String>) -> Self {
        Self {
            status_text: status_text.into(),
            status_type: StatusType::Success,
            token: None,
        }
    }

    pub(crate) fn error(status_text: impl Into<String>) -> Self {
        Self {
            status_text: status_text.into(),
            status_type: StatusType::Error,
            token: None,
        }
    }

    pub(crate) fn logged_in(token: String) -> Self {
        Self {
            token: Some(token),
            ..Self::success(LOGGED_IN_STATUS)
        }
    }

    /// Returns `true` for the error variant.
    pub fn is_error(&self) -> bool {
        self.status_type == StatusType::Error
    }

    /// Returns `true` for the terminal success event of the handshake.
    pub fn is_logged_in(&self) -> bool {
        self.status_type == StatusType::Success && self.status_text == LOGGED_IN_STATUS
    }
}

/// Handle returned by [`AuthClient::subscribe`](crate::AuthClient::subscribe).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type StatusCallback = Rc<dyn Fn(&StatusEvent)>;

/// Publish/subscribe list for [`StatusEvent`]s. Subscribers run on the caller's thread.
#[derive(Default)]
pub(crate) struct StatusSubscribers {
    next_id: Cell<u64>,
    callbacks: RefCell<Vec<(SubscriptionId, StatusCallback)>>,
}

impl StatusSubscribers {
    pub(crate) fn subscribe(&self, callback: impl Fn(&StatusEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.callbacks.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.callbacks.borrow_mut();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    /// Calls every subscriber in registration order.
    ///
    /// The list is copied before the callbacks run so a callback may subscribe or unsubscribe.
    pub(crate) fn emit(&self, event: &StatusEvent) {
        let callbacks: Vec<StatusCallback> = self
            .callbacks
            .borrow()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }
}
