#![allow(clippy::unwrap_used)]
// Integration tests for `ControllerClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use guestpass_api::{ControllerClient, Error, GuestAccount, Session, TenantId, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ControllerClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client =
        ControllerClient::with_client(reqwest::Client::new(), base_url, TransportConfig::default());
    (server, client)
}

fn session() -> Session {
    Session::from_cookie("abc123").unwrap()
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_owned())
}

fn guest(n: usize) -> Value {
    json!({
        "userID": format!("u-{n}"),
        "loginName": format!("guest{n}"),
        "email": format!("guest{n}@example.com"),
        "portalID": 3,
        "validFrom": 1_700_000_000,
        "validTo": 1_900_000_000
    })
}

async fn mount_login(server: &MockServer, cookie: &str) {
    Mock::given(method("GET"))
        .and(path("/cvcue/keyLogin"))
        .and(query_param("keyID", "KEY-1"))
        .and(query_param("keyValue", "s3cret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "cookie": cookie } })),
        )
        .mount(server)
        .await;
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_session_token_is_cookie_prefix() {
    let (server, client) = setup().await;
    mount_login(&server, "abc123; Path=/").await;

    Mock::given(method("POST"))
        .and(path("/api/org.info"))
        .and(header("Cookie", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "orgID": "ORG1" } })))
        .expect(1)
        .mount(&server)
        .await;

    let session = client.authenticate("KEY-1", &secret("s3cret")).await.unwrap();
    assert_eq!(session.cookie_header(), "abc123");

    let tenant = client.resolve_tenant(&session).await.unwrap();
    assert_eq!(tenant, TenantId::new("ORG1"));
}

#[tokio::test]
async fn test_login_without_cookie_fails() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cvcue/keyLogin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .mount(&server)
        .await;

    let result = client.authenticate("KEY-1", &secret("s3cret")).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_with_empty_cookie_fails() {
    let (server, client) = setup().await;
    mount_login(&server, "").await;

    let result = client.authenticate("KEY-1", &secret("s3cret")).await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn test_login_non_json_body_fails() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cvcue/keyLogin"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = client.authenticate("KEY-1", &secret("s3cret")).await;
    match result {
        Err(Error::Deserialization { body, message, .. }) => {
            assert_eq!(body, "<html>maintenance</html>");
            assert!(message.contains("maintenance"));
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_http_error_carries_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cvcue/keyLogin"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let err = client
        .authenticate("KEY-1", &secret("s3cret"))
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), Some(401));
    assert!(err.to_string().contains("bad key"));
}

#[tokio::test]
async fn test_login_business_error_is_authentication_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cvcue/keyLogin"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "invalid key" })),
        )
        .mount(&server)
        .await;

    let result = client.authenticate("KEY-1", &secret("s3cret")).await;
    match result {
        Err(Error::Authentication { message }) => assert_eq!(message, "invalid key"),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

// ── Tenant ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_org_info_without_org_id_fails() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/org.info"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "name": "Acme" } })))
        .mount(&server)
        .await;

    let result = client.resolve_tenant(&session()).await;
    assert!(
        matches!(
            result,
            Err(Error::MissingField {
                field: "data.orgID",
                ..
            })
        ),
        "expected MissingField error, got: {result:?}"
    );
}

// ── Guest lookup ────────────────────────────────────────────────────

#[tokio::test]
async fn test_find_guest_by_email() {
    let (server, client) = setup().await;

    let users: Vec<Value> = (0..5).map(guest).collect();
    Mock::given(method("POST"))
        .and(path("/api/identity.guest.user.list"))
        .and(header("Cookie", "abc123"))
        .and(body_json(json!({ "orgID": "ORG1", "limit": 50 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "users": users } })),
        )
        .mount(&server)
        .await;

    let account = client
        .find_guest_account(&session(), &TenantId::new("ORG1"), "guest3@example.com")
        .await
        .unwrap();

    assert_eq!(account.user_id(), Some(&json!("u-3")));
    assert_eq!(account.login_name(), Some("guest3"));
}

#[tokio::test]
async fn test_find_guest_not_found_reports_scanned_count() {
    let (server, client) = setup().await;

    let users: Vec<Value> = (0..50).map(guest).collect();
    Mock::given(method("POST"))
        .and(path("/api/identity.guest.user.list"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "users": users } })),
        )
        .mount(&server)
        .await;

    let err = client
        .find_guest_account(&session(), &TenantId::new("ORG1"), "nobody@example.com")
        .await
        .unwrap_err();

    match &err {
        Error::GuestNotFound { login, scanned } => {
            assert_eq!(login, "nobody@example.com");
            assert_eq!(*scanned, 50);
        }
        other => panic!("expected GuestNotFound, got: {other:?}"),
    }
    assert!(err.to_string().contains("50"));
}

#[tokio::test]
async fn test_find_guest_with_null_user_list() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/identity.guest.user.list"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "users": null } })),
        )
        .mount(&server)
        .await;

    let result = client
        .find_guest_account(&session(), &TenantId::new("ORG1"), "guest1")
        .await;
    assert!(matches!(result, Err(Error::GuestNotFound { scanned: 0, .. })));
}

// ── Update ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_echoes_account_with_new_password() {
    let (server, client) = setup().await;

    let mut account_json = guest(7);
    account_json["notes"] = json!("front desk");
    account_json["sendEmail"] = json!(true);
    let account: GuestAccount = serde_json::from_value(account_json.clone()).unwrap();

    let mut expected = account_json;
    expected["orgID"] = json!("ORG1");
    expected["password"] = json!("Forest-Harbor7");
    expected["sendEmail"] = json!(false);

    Mock::given(method("POST"))
        .and(path("/api/identity.guest.user.update"))
        .and(header("Cookie", "abc123"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "ok": true } })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client
        .update_guest_password(
            &session(),
            &TenantId::new("ORG1"),
            &account,
            &secret("Forest-Harbor7"),
        )
        .await
        .unwrap();
    assert_eq!(ack.data, Some(json!({ "ok": true })));
}

#[tokio::test]
async fn test_update_business_error_in_200_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/identity.guest.user.update"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "not authorized" })),
        )
        .mount(&server)
        .await;

    let account: GuestAccount = serde_json::from_value(guest(1)).unwrap();
    let result = client
        .update_guest_password(&session(), &TenantId::new("ORG1"), &account, &secret("x"))
        .await;

    match result {
        Err(Error::Api { operation, message }) => {
            assert_eq!(operation, "identity.guest.user.update");
            assert_eq!(message, "not authorized");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_update_without_user_id_is_not_sent() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/identity.guest.user.update"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let account: GuestAccount = serde_json::from_value(json!({ "loginName": "x" })).unwrap();
    let result = client
        .update_guest_password(&session(), &TenantId::new("ORG1"), &account, &secret("x"))
        .await;
    assert!(matches!(result, Err(Error::MissingField { field: "userID", .. })));
}
