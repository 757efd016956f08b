/// Credentials collected by the handshake, in the order they are obtained.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    /// Auth code returned by the first step.
    pub auth_code: Option<String>,
    /// Access token from the second step, replaced by the session token once logged in.
    pub access_token: Option<String>,
    /// Whether the login step completed.
    pub logged_in: bool,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("auth_code", &self.auth_code.as_ref().map(|_| "********"))
            .field("access_token", &self.access_token.as_ref().map(|_| "********"))
            .field("logged_in", &self.logged_in)
            .finish()
    }
}
