use std::time::Duration;

use flyttsmart_auth::AuthSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_API_URL: &str = "https://api.flyttsmart.se";
const DEFAULT_DOM_ELEMENT_ID: &str = "#flyttsmartWidget";
const EMBED_URL: &str = "https://www.flyttsmart.se";
const DEBUG_URL: &str = "http://localhost:3020/iframe.html";
const DEFAULT_PING_INTERVAL_MS: u64 = 1000;
const DEFAULT_MAX_PING_ATTEMPTS: u32 = 60;

/// Configuration object supplied by the host page.
///
/// Every field is optional at this level; [`WidgetSettings::from_config`] applies the defaults
/// and rejects a configuration without `clientId` or `pno`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Flyttsmart backend API URL. Defaults to `https://api.flyttsmart.se`
    pub api_url: Option<String>,
    /// Base URL to use for deep linking. Defaults to an empty string
    pub base_url: Option<String>,
    /// Client id issued to the host integration. Required
    pub client_id: Option<String>,
    /// Personal number of the user to log in. Required
    pub pno: Option<String>,
    /// Id of the element the widget mounts into, with or without a leading `#`.
    /// Defaults to `#flyttsmartWidget`
    #[serde(alias = "domElement")]
    pub dom_element_id: Option<String>,
    /// Page loaded in the iframe. Defaults to the Flyttsmart site, or the local debug page when
    /// `debug` is set
    pub iframe_url: Option<String>,
    /// Origin the iframe's messages must come from. When unset, messages from any origin are
    /// accepted
    pub iframe_origin: Option<String>,
    /// Use the local debug page in the iframe
    pub debug: bool,
    /// Milliseconds between two `PING` messages. Defaults to 1000
    pub ping_interval_ms: Option<u64>,
    /// Number of `PING` messages sent before the handshake gives up. Defaults to 60
    pub max_ping_attempts: Option<u32>,
}

/// Validated widget settings. Immutable once the widget is initialized.
#[derive(Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    #[allow(missing_docs)]
    pub api_url: String,
    #[allow(missing_docs)]
    pub base_url: String,
    #[allow(missing_docs)]
    pub client_id: String,
    /// Never serialized, settings are published to command listeners.
    #[serde(skip_serializing)]
    pub pno: String,
    /// CSS id selector of the mount element, always starting with `#`.
    pub dom_element_id: String,
    #[allow(missing_docs)]
    pub iframe_url: String,
    #[allow(missing_docs)]
    pub iframe_origin: Option<String>,
    #[allow(missing_docs)]
    #[serde(skip)]
    pub ping_interval: Duration,
    #[allow(missing_docs)]
    pub max_ping_attempts: u32,
}

#[allow(missing_docs)]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Missing required setting: clientId")]
    MissingClientId,
    #[error("Missing required setting: pno")]
    MissingPno,
    #[error("maxPingAttempts must be at least 1")]
    NoPingAttempts,
}

impl WidgetSettings {
    /// Applies defaults and validates a host configuration.
    pub fn from_config(config: WidgetConfig) -> Result<Self, SettingsError> {
        let client_id = non_empty(config.client_id).ok_or(SettingsError::MissingClientId)?;
        let pno = non_empty(config.pno).ok_or(SettingsError::MissingPno)?;

        let max_ping_attempts = config
            .max_ping_attempts
            .unwrap_or(DEFAULT_MAX_PING_ATTEMPTS);
        if max_ping_attempts == 0 {
            return Err(SettingsError::NoPingAttempts);
        }

        let iframe_url = non_empty(config.iframe_url).unwrap_or_else(|| {
            if config.debug {
                DEBUG_URL.to_owned()
            } else {
                EMBED_URL.to_owned()
            }
        });

        Ok(Self {
            api_url: non_empty(config.api_url).unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
            base_url: config.base_url.unwrap_or_default(),
            client_id,
            pno,
            dom_element_id: non_empty(config.dom_element_id)
                .map(|id| id_selector(&id))
                .unwrap_or_else(|| DEFAULT_DOM_ELEMENT_ID.to_owned()),
            iframe_url,
            iframe_origin: non_empty(config.iframe_origin),
            ping_interval: Duration::from_millis(
                config.ping_interval_ms.unwrap_or(DEFAULT_PING_INTERVAL_MS),
            ),
            max_ping_attempts,
        })
    }

    /// The subset of the settings used by the [`AuthClient`](flyttsmart_auth::AuthClient).
    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            api_url: self.api_url.clone(),
            base_url: self.base_url.clone(),
            client_id: self.client_id.clone(),
            pno: self.pno.clone(),
        }
    }

    /// Target origin for outgoing frame messages.
    pub fn target_origin(&self) -> &str {
        self.iframe_origin.as_deref().unwrap_or("*")
    }
}

impl std::fmt::Debug for WidgetSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetSettings")
            .field("api_url", &self.api_url)
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("dom_element_id", &self.dom_element_id)
            .field("iframe_url", &self.iframe_url)
            .field("iframe_origin", &self.iframe_origin)
            .field("ping_interval", &self.ping_interval)
            .field("max_ping_attempts", &self.max_ping_attempts)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn id_selector(id: &str) -> String {
    if id.starts_with('#') {
        id.to_owned()
    } else {
        format!("#{id}")
    }
}
