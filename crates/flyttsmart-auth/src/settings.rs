/// Identity and endpoint settings for an [`AuthClient`](crate::AuthClient).
///
/// These are fixed for the lifetime of the client.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// Base URL of the Flyttsmart backend API, without a trailing slash.
    pub api_url: String,
    /// Base URL used for deep linking back into the host page.
    pub base_url: String,
    /// The client id issued to the host integration.
    pub client_id: String,
    /// Personal number of the user to log in.
    pub pno: String,
}

impl AuthSettings {
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }
}

// The personal number identifies a person and must not end up in logs.
impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("api_url", &self.api_url)
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("pno", &"********")
            .finish()
    }
}
