#![allow(clippy::unwrap_used)]
// Integration tests for `ClassicClient` using wiremock.

use std::io::Write as _;

use serde_json::json;
use url::Url;
use wiremock::matchers::{basic_auth, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jamf_api::{ClassicClient, Error, XmlElement, parse_id};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ClassicClient) {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).unwrap();
    let client = ClassicClient::with_client(
        reqwest::Client::new(),
        &base,
        "api-user".into(),
        "s3cret".to_string().into(),
    )
    .unwrap();
    (server, client)
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_json_sends_basic_auth_and_accept() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/JSSResource/buildings"))
        .and(basic_auth("api-user", "s3cret"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "buildings": [{ "id": 1, "name": "HQ" }]
        })))
        .mount(&server)
        .await;

    let value = client.get_json("buildings").await.unwrap();
    assert_eq!(value["buildings"][0]["name"], "HQ");
}

#[tokio::test]
async fn test_not_found_maps_to_typed_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/JSSResource/computers/id/99"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>Not Found</html>"))
        .mount(&server)
        .await;

    let err = client.get_json("computers/id/99").await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
    assert!(matches!(err, Error::NotFound { ref resource } if resource == "computers/id/99"));
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/JSSResource/jssuser"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            "<html><body><p>Unauthorized</p><p>Error: The request requires user authentication</p></body></html>",
        ))
        .mount(&server)
        .await;

    let err = client.get_json("jssuser").await.unwrap_err();
    match err {
        Error::Authentication { message } => {
            assert_eq!(message, "The request requires user authentication");
        }
        other => panic!("expected Authentication, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_json_keeps_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/JSSResource/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = client.get_json("sites").await.unwrap_err();
    assert!(
        matches!(err, Error::Deserialization { ref body, .. } if body == "{not json"),
        "got {err:?}"
    );
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_post_xml_returns_new_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/JSSResource/buildings/id/0"))
        .and(header("content-type", "text/xml"))
        .and(body_string_contains("<name>Annex</name>"))
        .respond_with(
            ResponseTemplate::new(201).set_body_string("<building><id>12</id></building>"),
        )
        .mount(&server)
        .await;

    let xml = XmlElement::new("building").text_child("name", "Annex");
    let body = client
        .post_xml("buildings/id/0", xml.to_document())
        .await
        .unwrap();
    assert_eq!(parse_id(&body), Some(12));
}

#[tokio::test]
async fn test_conflict_carries_server_message() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/JSSResource/categories/id/3"))
        .respond_with(ResponseTemplate::new(409).set_body_string(
            "<html><body><p>Conflict</p><p>Error: Duplicate name</p></body></html>",
        ))
        .mount(&server)
        .await;

    let err = client
        .put_xml("categories/id/3", "<category/>".into())
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Conflict { ref message } if message == "Duplicate name"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_delete_success_and_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/JSSResource/scripts/id/5"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<script><id>5</id></script>"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/JSSResource/scripts/id/6"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    client.delete("scripts/id/5").await.unwrap();

    let err = client.delete("scripts/id/6").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_upload_posts_multipart() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/JSSResource/fileuploads/policies/id/8"))
        .and(body_string_contains("filename=\"icon.png\""))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("icon.png");
    let mut file = std::fs::File::create(&file_path).unwrap();
    file.write_all(b"PNG fake icon bytes").unwrap();

    client
        .upload("fileuploads/policies/id/8", &file_path)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_server_with_path_prefix() {
    let server = MockServer::start().await;
    let base = Url::parse(&format!("{}/jamf", server.uri())).unwrap();
    let client =
        ClassicClient::with_client(reqwest::Client::new(), &base, "u".into(), "p".to_string().into())
            .unwrap();

    assert!(client.api_url().as_str().ends_with("/jamf/JSSResource/"));

    Mock::given(method("GET"))
        .and(path("/jamf/JSSResource/departments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "departments": [] })))
        .mount(&server)
        .await;

    let value = client.get_json("departments").await.unwrap();
    assert!(value["departments"].as_array().unwrap().is_empty());
}
