#![doc = include_str!("../README.md")]

mod auth_client;
mod error;
mod session;
mod settings;
mod status;

pub(crate) mod api; // keep internal to crate

pub use auth_client::AuthClient;
pub use error::AuthError;
pub use session::AuthSession;
pub use settings::AuthSettings;
pub use status::{StatusEvent, StatusType, SubscriptionId, LOGGED_IN_STATUS};
