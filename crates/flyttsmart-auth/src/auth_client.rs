use std::cell::RefCell;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header;

use crate::{
    api::{
        AccessTokenApiRequest, AccessTokenApiResponse, LoginApiRequest, LoginApiResponse,
        ACCESS_TOKEN_PATH, AUTH_CODE_PATH, CLIENT_ID_HEADER, LOGIN_PATH,
    },
    status::StatusSubscribers,
    AuthError, AuthSession, AuthSettings, StatusEvent, SubscriptionId,
};

/// Client for the Flyttsmart external authentication API.
///
/// Each step method runs the steps it depends on first, so [`AuthClient::login_user`] performs
/// the complete handshake. Handshakes on the same client never overlap; a second call waits
/// for the running one to finish.
///
/// The client is meant for the page's single-threaded event loop: it is neither `Send` nor
/// `Sync`, and status callbacks run synchronously on the emitting task.
pub struct AuthClient {
    settings: AuthSettings,
    http_client: reqwest::Client,
    session: RefCell<AuthSession>,
    subscribers: StatusSubscribers,
    handshake: tokio::sync::Mutex<()>,
}

impl AuthClient {
    /// Constructs a new `AuthClient` with a default HTTP client.
    pub fn new(settings: AuthSettings) -> Self {
        Self::new_with_http_client(settings, reqwest::Client::new())
    }

    /// Constructs a new `AuthClient` sending its requests through `http_client`.
    pub fn new_with_http_client(settings: AuthSettings, http_client: reqwest::Client) -> Self {
        Self {
            settings,
            http_client,
            session: RefCell::new(AuthSession::default()),
            subscribers: StatusSubscribers::default(),
            handshake: tokio::sync::Mutex::new(()),
        }
    }

    /// The settings this client was built with.
    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Registers a callback for every [`StatusEvent`] emitted from now on.
    pub fn subscribe(
        &self,
        callback: impl Fn(&StatusEvent) + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    /// Removes a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// A snapshot of the credentials collected so far.
    pub fn session(&self) -> AuthSession {
        self.session.borrow().clone()
    }

    #[allow(missing_docs)]
    pub fn auth_code(&self) -> Option<String> {
        self.session().auth_code
    }

    /// The current access token. After a successful login this is the session token.
    pub fn access_token(&self) -> Option<String> {
        self.session().access_token
    }

    /// Requests an auth code.
    pub async fn get_auth_code(&self) {
        let _handshake = self.handshake.lock().await;
        let result = self.request_auth_code().await;
        self.report(result);
    }

    /// Requests an auth code and exchanges it for an access token.
    pub async fn get_access_token(&self) {
        let _handshake = self.handshake.lock().await;
        let result = async {
            self.request_auth_code().await?;
            self.request_access_token().await
        }
        .await;
        self.report(result);
    }

    /// Runs the complete handshake and logs the user in.
    pub async fn login_user(&self) {
        let _handshake = self.handshake.lock().await;
        let result = async {
            self.request_auth_code().await?;
            self.request_access_token().await?;
            self.request_login().await
        }
        .await;
        self.report(result);
    }

    /// Emits the error event for a failed handshake. Success events are emitted by the steps.
    fn report(&self, result: Result<(), AuthError>) {
        if let Err(e) = result {
            log::error!("Authentication handshake failed: {e}");
            self.subscribers.emit(&StatusEvent::error(e.to_string()));
        }
    }

    async fn request_auth_code(&self) -> Result<(), AuthError> {
        log::debug!("Requesting auth code for client {}", self.settings.client_id);

        let response = self
            .http_client
            .post(self.settings.endpoint(AUTH_CODE_PATH))
            .header(CLIENT_ID_HEADER, &self.settings.client_id)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::Http(response.status()));
        }

        let auth_code = response.text().await?;
        self.session.borrow_mut().auth_code = Some(auth_code);

        self.subscribers
            .emit(&StatusEvent::success("Auth code received..."));
        Ok(())
    }

    async fn request_access_token(&self) -> Result<(), AuthError> {
        let auth_code = self.auth_code().ok_or(AuthError::MissingAuthCode)?;
        log::debug!("Exchanging auth code for an access token");

        let credentials = STANDARD.encode(format!("{}:{}", self.settings.client_id, auth_code));

        let response = self
            .http_client
            .post(self.settings.endpoint(ACCESS_TOKEN_PATH))
            .header(CLIENT_ID_HEADER, &self.settings.client_id)
            .header(header::AUTHORIZATION, format!("Basic {credentials}"))
            .json(&AccessTokenApiRequest {
                auth_code: &auth_code,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::Http(response.status()));
        }

        let body = response.text().await?;
        let token: AccessTokenApiResponse = serde_json::from_str(&body)?;
        self.session.borrow_mut().access_token =
            Some(token.access_token);

        self.subscribers
            .emit(&StatusEvent::success("Access token received..."));
        Ok(())
    }

    async fn request_login(&self) -> Result<(), AuthError> {
        let access_token = self.access_token().ok_or(AuthError::MissingAccessToken)?;
        log::debug!("Logging in user");

        let response = self
            .http_client
            .post(self.settings.endpoint(LOGIN_PATH))
            .header(CLIENT_ID_HEADER, &self.settings.client_id)
            .bearer_auth(access_token)
            .json(&LoginApiRequest {
                pno: &self.settings.pno,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::Http(response.status()));
        }

        let body = response.text().await?;
        let login: LoginApiResponse = serde_json::from_str(&body)?;
        let session_token = login.session_token()?;

        {
            let mut session = self.session.borrow_mut();
            session.access_token = Some(session_token.clone());
            session.logged_in = true;
        }

        log::debug!("User logged in");
        self.subscribers.emit(&StatusEvent::logged_in(session_token));
        Ok(())
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("settings", &self.settings)
            .field("session", &self.session())
            .finish_non_exhaustive()
    }
}
