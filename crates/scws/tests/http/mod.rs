use scws::ScwsError;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::{common::client, AssertWrapper};

#[tokio::test]
async fn test_added_cookies_are_sent() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("cookie", "session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client();
    client.add_cookies(vec!["session=abc".to_string()], server.uri())?;
    let body = client
        .get_text(format!("{}/search", server.uri()))
        .await
        .assert_success();
    assert_eq!(body, "ok");

    Ok(())
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let result = client().get_bytes(format!("{}/seg", server.uri())).await;
    assert!(matches!(
        result,
        Err(ScwsError::HttpError(reqwest::StatusCode::FORBIDDEN))
    ));
}
