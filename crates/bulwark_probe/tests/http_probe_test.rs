//! Tests for HttpProbeClient against a local mock server.

use bulwark_core::ServerName;
use bulwark_error::ProbeErrorKind;
use bulwark_probe::{HttpProbeClient, RegistrationProbe, ServerDiscovery, stages};

fn client() -> HttpProbeClient {
    HttpProbeClient::new("bulwark-test").expect("client").with_insecure_discovery()
}

fn server_name(server: &mockito::ServerGuard) -> ServerName {
    ServerName::new(server.host_with_port())
}

#[tokio::test]
async fn test_discover_returns_advertised_base_url() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/.well-known/matrix/client")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"m.homeserver":{"base_url":"https://matrix.example.org"}}"#)
        .create_async()
        .await;

    let base = client().discover(&server_name(&server)).await.unwrap();
    assert_eq!(base.as_deref(), Some("https://matrix.example.org"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_discover_not_found_yields_none() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/.well-known/matrix/client")
        .with_status(404)
        .create_async()
        .await;

    let base = client().discover(&server_name(&server)).await.unwrap();
    assert!(base.is_none());
}

#[tokio::test]
async fn test_discover_empty_base_url_yields_none() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/.well-known/matrix/client")
        .with_status(200)
        .with_body(r#"{"m.homeserver":{"base_url":""}}"#)
        .create_async()
        .await;

    let base = client().discover(&server_name(&server)).await.unwrap();
    assert!(base.is_none());
}

#[tokio::test]
async fn test_register_returns_flows_on_401() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/_matrix/client/v3/register")
        .with_status(401)
        .with_body(
            r#"{"session":"abc","flows":[{"stages":["m.login.recaptcha","m.login.email.identity"]},{"stages":["m.login.dummy"]}],"params":{}}"#,
        )
        .create_async()
        .await;

    let flows = client().register(&server.url()).await.unwrap().unwrap();
    assert_eq!(flows.flows().len(), 2);
    let first = flows.first_flow().unwrap();
    assert!(first.has_stage(stages::RECAPTCHA));
    assert!(first.has_stage(stages::EMAIL_IDENTITY));
    assert_eq!(flows.session().as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_register_forbidden() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/_matrix/client/v3/register")
        .with_status(403)
        .with_body(r#"{"errcode":"M_FORBIDDEN","error":"Registration has been disabled"}"#)
        .create_async()
        .await;

    let err = client().register(&server.url()).await.unwrap_err();
    assert!(err.is_forbidden());
}

#[tokio::test]
async fn test_register_server_error_is_not_classified() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/_matrix/client/v3/register")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let err = client().register(&server.url()).await.unwrap_err();
    assert!(matches!(err.kind(), ProbeErrorKind::Http { status: 502, .. }));
}

#[tokio::test]
async fn test_auth_metadata_supported() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock(
            "GET",
            "/_matrix/client/unstable/org.matrix.msc2965/auth_metadata",
        )
        .with_status(200)
        .with_body(r#"{"issuer":"https://auth.example.org/"}"#)
        .create_async()
        .await;

    assert!(client().auth_metadata(&server.url()).await.is_ok());
}

#[tokio::test]
async fn test_auth_metadata_unrecognized() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock(
            "GET",
            "/_matrix/client/unstable/org.matrix.msc2965/auth_metadata",
        )
        .with_status(404)
        .with_body(r#"{"errcode":"M_UNRECOGNIZED","error":"Unrecognized request"}"#)
        .create_async()
        .await;

    let err = client().auth_metadata(&server.url()).await.unwrap_err();
    assert!(err.is_unrecognized());
}

#[tokio::test]
async fn test_transport_error_when_nothing_listens() {
    let err = client()
        .register("http://127.0.0.1:9")
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), ProbeErrorKind::Transport(_)));
}
