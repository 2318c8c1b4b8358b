//! API-gateway adapter integration tests.
//!
//! Run with: `cargo test -p filedrive-api --test gateway_test`

mod helpers;

use filedrive_api::{dispatch, GatewayEvent, GatewayResponse};
use helpers::{base64_encode, multipart_body, multipart_content_type, setup_test_app, TestApp};
use serde_json::{json, Value};

fn event(value: Value) -> GatewayEvent {
    serde_json::from_value(value).expect("valid gateway event")
}

fn body(response: &GatewayResponse) -> Value {
    serde_json::from_str(&response.body).expect("JSON response body")
}

fn assert_cors_headers(response: &GatewayResponse) {
    assert_eq!(response.headers["Content-Type"], "application/json");
    assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
    assert_eq!(
        response.headers["Access-Control-Allow-Methods"],
        "GET, POST, PUT, DELETE, OPTIONS"
    );
    assert_eq!(
        response.headers["Access-Control-Allow-Headers"],
        "Content-Type, Authorization, X-Requested-With"
    );
    assert_eq!(response.headers["Access-Control-Allow-Credentials"], "true");
    assert!(!response.is_base64_encoded);
}

fn file_event(app: &TestApp, method: &str, file_id: &str) -> GatewayEvent {
    event(json!({
        "routeKey": format!("{} /files/{{fileId}}", method),
        "rawPath": format!("/files/{}", file_id),
        "requestContext": {"http": {"method": method, "path": format!("/files/{}", file_id)}},
        "headers": {"Authorization": app.bearer("alice")},
        "pathParameters": {"fileId": file_id},
        "isBase64Encoded": false
    }))
}

async fn upload(app: &TestApp) -> String {
    let raw = multipart_body("report.pdf", "application/pdf", b"%PDF-1.4\x00\xff");
    let response = dispatch(
        &app.state,
        event(json!({
            "routeKey": "POST /files",
            "rawPath": "/files",
            "requestContext": {"http": {"method": "POST", "path": "/files"}},
            "headers": {
                "authorization": app.bearer("alice"),
                "Content-Type": multipart_content_type()
            },
            "body": base64_encode(&raw),
            "isBase64Encoded": true
        })),
    )
    .await;
    assert_eq!(response.status_code, 200, "{}", response.body);
    body(&response)["fileId"]
        .as_str()
        .expect("fileId")
        .to_string()
}

#[tokio::test]
async fn test_options_preflight() {
    let app = setup_test_app().await;
    let response = dispatch(
        &app.state,
        event(json!({
            "routeKey": "OPTIONS /files",
            "requestContext": {"http": {"method": "OPTIONS", "path": "/files"}}
        })),
    )
    .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "{}");
    assert_cors_headers(&response);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = setup_test_app().await;
    let response = dispatch(
        &app.state,
        event(json!({
            "routeKey": "PUT /files",
            "requestContext": {"http": {"method": "PUT", "path": "/files"}}
        })),
    )
    .await;

    assert_eq!(response.status_code, 404);
    assert_eq!(
        body(&response),
        json!({"error": "Not Found", "details": "No route for PUT /files"})
    );
    assert_cors_headers(&response);
}

#[tokio::test]
async fn test_auth_event() {
    let app = setup_test_app().await;
    let auth_event = |body: Value| {
        event(json!({
            "routeKey": "POST /auth",
            "requestContext": {"http": {"method": "POST", "path": "/auth"}},
            "body": body.to_string(),
            "isBase64Encoded": false
        }))
    };

    let ok = dispatch(&app.state, auth_event(json!({"token": app.token_for("alice")}))).await;
    assert_eq!(ok.status_code, 200);
    assert_eq!(body(&ok)["uid"], "alice");

    let missing = dispatch(&app.state, auth_event(json!({}))).await;
    assert_eq!(missing.status_code, 400);
    assert_eq!(body(&missing)["error"], "Token is required");

    let bad = dispatch(&app.state, auth_event(json!({"token": "nope"}))).await;
    assert_eq!(bad.status_code, 401);
    assert_eq!(body(&bad)["error"], "Authentication failed");
    assert_cors_headers(&bad);
}

#[tokio::test]
async fn test_upload_list_get_delete_events() {
    let app = setup_test_app().await;
    let file_id = upload(&app).await;

    let list = dispatch(
        &app.state,
        event(json!({
            "routeKey": "GET /files",
            "requestContext": {"http": {"method": "GET", "path": "/files"}},
            "headers": {"Authorization": app.bearer("alice")}
        })),
    )
    .await;
    assert_eq!(list.status_code, 200);
    let files = body(&list);
    assert_eq!(files.as_array().map(Vec::len), Some(1));
    assert_eq!(files[0]["fileName"], "report.pdf");
    assert_eq!(files[0]["fileType"], "application/pdf");
    assert_eq!(files[0]["fileSize"], 10);

    let get = dispatch(&app.state, file_event(&app, "GET", &file_id)).await;
    assert_eq!(get.status_code, 200);
    let detail = body(&get);
    assert_eq!(detail["fileId"], file_id.as_str());
    assert!(detail["downloadUrl"]
        .as_str()
        .expect("downloadUrl")
        .starts_with("http://localhost/storage/alice/"));

    let delete = dispatch(&app.state, file_event(&app, "DELETE", &file_id)).await;
    assert_eq!(delete.status_code, 200);
    assert_eq!(body(&delete), json!({"message": "File deleted successfully"}));

    let get = dispatch(&app.state, file_event(&app, "GET", &file_id)).await;
    assert_eq!(get.status_code, 404);
    assert_cors_headers(&get);
}

#[tokio::test]
async fn test_events_without_token_are_unauthorized() {
    let app = setup_test_app().await;
    let response = dispatch(
        &app.state,
        event(json!({
            "routeKey": "GET /files",
            "requestContext": {"http": {"method": "GET", "path": "/files"}}
        })),
    )
    .await;

    assert_eq!(response.status_code, 401);
    assert_cors_headers(&response);
}

#[tokio::test]
async fn test_upload_event_with_bad_base64_is_rejected() {
    let app = setup_test_app().await;
    let response = dispatch(
        &app.state,
        event(json!({
            "routeKey": "POST /files",
            "requestContext": {"http": {"method": "POST", "path": "/files"}},
            "headers": {
                "Authorization": app.bearer("alice"),
                "content-type": multipart_content_type()
            },
            "body": "@@not base64@@",
            "isBase64Encoded": true
        })),
    )
    .await;

    assert_eq!(response.status_code, 400, "{}", response.body);
    assert!(app.state.files.list("alice").await.unwrap().is_empty());
}
