//! Integration tests for the authentication handshake

use std::sync::{Arc, Mutex};

use base64::{engine::general_purpose::STANDARD, Engine};
use flyttsmart_auth::{AuthClient, AuthSettings, StatusEvent, StatusType};
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

const CLIENT_ID: &str = "5f1b0b3b4b0b0b0b0b0b0b0b";
const PNO: &str = "199001010000";

/// Helper for testing the Flyttsmart API using wiremock.
///
/// Warning: when using `Mock::expect` ensure `server` is not dropped before the test completes.
async fn start_api_mock(mocks: Vec<Mock>) -> (MockServer, AuthSettings) {
    let server = MockServer::start().await;

    for mock in mocks {
        server.register(mock).await;
    }

    let settings = AuthSettings {
        api_url: server.uri(),
        base_url: "http://localhost:3000".to_owned(),
        client_id: CLIENT_ID.to_owned(),
        pno: PNO.to_owned(),
    };

    (server, settings)
}

fn record_events(client: &AuthClient) -> Arc<Mutex<Vec<StatusEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    client.subscribe(move |event| sink.lock().expect("lock").push(event.clone()));
    events
}

fn auth_code_mock(code: &str) -> Mock {
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/external/code"))
        .and(matchers::header("clientId", CLIENT_ID))
        .respond_with(ResponseTemplate::new(200).set_body_string(code))
}

fn access_token_mock(auth_code: &str, token: &str) -> Mock {
    let credentials = STANDARD.encode(format!("{CLIENT_ID}:{auth_code}"));

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/external/token"))
        .and(matchers::header("clientId", CLIENT_ID))
        .and(matchers::header("content-type", "application/json"))
        .and(matchers::header(
            "authorization",
            format!("Basic {credentials}").as_str(),
        ))
        .and(matchers::body_json(serde_json::json!({ "authCode": auth_code })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "accessToken": token })),
        )
}

fn login_mock(access_token: &str, body: &str) -> Mock {
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/external/users/login"))
        .and(matchers::header("clientId", CLIENT_ID))
        .and(matchers::header(
            "authorization",
            format!("Bearer {access_token}").as_str(),
        ))
        .and(matchers::body_json(serde_json::json!({ "pno": PNO })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
}

mod get_auth_code {
    use super::*;

    #[tokio::test]
    async fn stores_the_auth_code_and_emits_one_success() {
        let (_server, settings) = start_api_mock(vec![auth_code_mock("CODE1")]).await;
        let client = AuthClient::new(settings);
        let events = record_events(&client);

        client.get_auth_code().await;

        assert_eq!(client.auth_code().as_deref(), Some("CODE1"));
        assert_eq!(client.access_token(), None);

        let events = events.lock().expect("lock");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status_type, StatusType::Success);
        assert_eq!(events[0].status_text, "Auth code received...");
    }

    #[tokio::test]
    async fn http_error_emits_one_error_and_keeps_no_code() {
        let mock = Mock::given(matchers::method("POST"))
            .and(matchers::path("/external/code"))
            .respond_with(ResponseTemplate::new(500));
        let (_server, settings) = start_api_mock(vec![mock]).await;
        let client = AuthClient::new(settings);
        let events = record_events(&client);

        client.get_auth_code().await;

        assert_eq!(client.auth_code(), None);

        let events = events.lock().expect("lock");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status_type, StatusType::Error);
        assert_eq!(events[0].status_text, "HTTP error! status: 500");
    }

    #[tokio::test]
    async fn network_failure_is_reported_as_an_event() {
        let settings = AuthSettings {
            // Nothing listens on port 1.
            api_url: "http://127.0.0.1:1".to_owned(),
            base_url: String::new(),
            client_id: CLIENT_ID.to_owned(),
            pno: PNO.to_owned(),
        };
        let client = AuthClient::new(settings);
        let events = record_events(&client);

        client.get_auth_code().await;

        assert_eq!(client.auth_code(), None);
        let events = events.lock().expect("lock");
        assert_eq!(events.len(), 1);
        assert!(events[0].is_error());
        assert!(!events[0].status_text.starts_with("HTTP error!"));
    }
}

mod get_access_token {
    use super::*;

    #[tokio::test]
    async fn exchanges_the_auth_code_with_basic_credentials() {
        let (_server, settings) =
            start_api_mock(vec![auth_code_mock("C1"), access_token_mock("C1", "T1")]).await;
        let client = AuthClient::new(settings);
        let events = record_events(&client);

        client.get_access_token().await;

        assert_eq!(client.auth_code().as_deref(), Some("C1"));
        assert_eq!(client.access_token().as_deref(), Some("T1"));

        let texts: Vec<_> = events
            .lock()
            .expect("lock")
            .iter()
            .map(|e| e.status_text.clone())
            .collect();
        assert_eq!(texts, vec!["Auth code received...", "Access token received..."]);
    }

    #[tokio::test]
    async fn http_error_on_token_is_reported_once() {
        let token = Mock::given(matchers::method("POST"))
            .and(matchers::path("/external/token"))
            .respond_with(ResponseTemplate::new(404));
        let (_server, settings) = start_api_mock(vec![auth_code_mock("C1"), token]).await;
        let client = AuthClient::new(settings);
        let events = record_events(&client);

        client.get_access_token().await;

        assert_eq!(client.access_token(), None);

        let events = events.lock().expect("lock");
        assert_eq!(events.len(), 2);
        assert!(!events[0].is_error());
        assert!(events[1].is_error());
        assert_eq!(events[1].status_text, "HTTP error! status: 404");
    }

    #[tokio::test]
    async fn malformed_token_body_is_reported() {
        let token = Mock::given(matchers::method("POST"))
            .and(matchers::path("/external/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"));
        let (_server, settings) = start_api_mock(vec![auth_code_mock("C1"), token]).await;
        let client = AuthClient::new(settings);
        let events = record_events(&client);

        client.get_access_token().await;

        assert_eq!(client.access_token(), None);
        let events = events.lock().expect("lock");
        assert!(events.last().expect("an event").is_error());
    }
}

mod login_user {
    use super::*;

    #[tokio::test]
    async fn happy_path_replaces_the_access_token() {
        let (_server, settings) = start_api_mock(vec![
            auth_code_mock("C1"),
            access_token_mock("C1", "T1"),
            login_mock("T1", r#"{"url":"example.com?token=T2"}"#),
        ])
        .await;
        let client = AuthClient::new(settings);
        let events = record_events(&client);

        client.login_user().await;

        let session = client.session();
        assert_eq!(session.auth_code.as_deref(), Some("C1"));
        assert_eq!(session.access_token.as_deref(), Some("T2"));
        assert!(session.logged_in);

        let events = events.lock().expect("lock");
        assert_eq!(events.len(), 3);
        let last = events.last().expect("an event");
        assert!(last.is_logged_in());
        assert_eq!(last.token.as_deref(), Some("T2"));
    }

    #[tokio::test]
    async fn failed_auth_code_stops_the_handshake() {
        let code = Mock::given(matchers::method("POST"))
            .and(matchers::path("/external/code"))
            .respond_with(ResponseTemplate::new(500));
        let token = Mock::given(matchers::method("POST"))
            .and(matchers::path("/external/token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0);
        let login = Mock::given(matchers::method("POST"))
            .and(matchers::path("/external/users/login"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0);
        let (_server, settings) = start_api_mock(vec![code, token, login]).await;
        let client = AuthClient::new(settings);
        let events = record_events(&client);

        client.login_user().await;

        assert!(!client.session().logged_in);
        let events = events.lock().expect("lock");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status_text, "HTTP error! status: 500");
    }

    #[tokio::test]
    async fn login_response_without_token_is_an_error() {
        let (_server, settings) = start_api_mock(vec![
            auth_code_mock("C1"),
            access_token_mock("C1", "T1"),
            login_mock("T1", r#"{"url":"example.com?lang=sv"}"#),
        ])
        .await;
        let client = AuthClient::new(settings);
        let events = record_events(&client);

        client.login_user().await;

        // The access token from the exchange is kept.
        assert_eq!(client.access_token().as_deref(), Some("T1"));
        assert!(!client.session().logged_in);

        let events = events.lock().expect("lock");
        let last = events.last().expect("an event");
        assert!(last.is_error());
        assert_eq!(
            last.status_text,
            "The login response did not contain a session token"
        );
    }

    #[tokio::test]
    async fn unsubscribed_callbacks_miss_later_events() {
        let (_server, settings) = start_api_mock(vec![auth_code_mock("C1")]).await;
        let client = AuthClient::new(settings);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let id = client.subscribe(move |event| sink.lock().expect("lock").push(event.clone()));

        client.get_auth_code().await;
        assert!(client.unsubscribe(id));
        client.get_auth_code().await;

        assert_eq!(events.lock().expect("lock").len(), 1);
    }
}
