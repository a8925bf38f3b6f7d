//! HTTP transport tests against a local axum backend
//!
//! Each test binds its own backend on an ephemeral port; the handlers echo
//! what they received so the tests can check method, path, auth and body.

use academy::config::BackendConfig;
use academy::prelude::*;
use axum::Router;
use axum::extract::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{patch, post};
use std::net::SocketAddr;

async fn spawn_backend(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn bearer(headers: &HeaderMap) -> Value {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map_or(Value::Null, |value| json!(value))
}

fn course_backend() -> Router {
    Router::new()
        .route(
            "/api/course/find-many",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                Json(json!({
                    "data": [{"id": "c1", "titleUz": "Rust", "price": 100000}],
                    "totalCount": 1,
                    "echo": body,
                    "auth": bearer(&headers),
                }))
            }),
        )
        .route(
            "/api/course/update",
            patch(|Json(body): Json<Value>| async move { Json(json!({"id": body["where"]["id"], "patched": body["data"]})) }),
        )
        .route(
            "/api/course/create",
            post(|| async { (StatusCode::BAD_REQUEST, Json(json!({"message": "titleUz is required"}))) }),
        )
        .route(
            "/api/course/delete-all",
            post(|body: String| async move { Json(json!({"count": 3, "bodyLength": body.len()})) }),
        )
        .route(
            "/api/course/count",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
        )
}

fn context(service: HttpService) -> (ApiContext, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let client = QueryClient::with_config(QueryClientConfig {
        retry: RetryPolicy::never(),
        ..QueryClientConfig::default()
    });
    (ApiContext::new(Arc::new(service), client, notifier.clone()), notifier)
}

// =============================================================================
// Raw Transport
// =============================================================================

#[tokio::test]
async fn test_find_many_posts_json_with_bearer_token() {
    let addr = spawn_backend(course_backend()).await;
    let service = HttpService::from_config(&BackendConfig {
        base_url: format!("http://{addr}"),
        token: Some("secret".to_string()),
        ..BackendConfig::default()
    })
    .unwrap();

    let response = service
        .call(Course::model(), CrudOp::FindMany, Some(json!({"take": 10})))
        .await
        .unwrap();

    assert_eq!(response["echo"], json!({"take": 10}));
    assert_eq!(response["auth"], json!("Bearer secret"));
}

#[tokio::test]
async fn test_update_uses_patch() {
    let addr = spawn_backend(course_backend()).await;
    let service = HttpService::new(&format!("http://{addr}")).unwrap();

    let response = service
        .call(
            Course::model(),
            CrudOp::UpdateOne,
            Some(json!({"data": {"price": 1}, "where": {"id": "c1"}})),
        )
        .await
        .unwrap();

    assert_eq!(response, json!({"id": "c1", "patched": {"price": 1}}));
}

#[tokio::test]
async fn test_delete_all_sends_no_body() {
    let addr = spawn_backend(course_backend()).await;
    let service = HttpService::new(&format!("http://{addr}")).unwrap();

    let response = service.call(Course::model(), CrudOp::DeleteAll, None).await.unwrap();

    assert_eq!(response, json!({"count": 3, "bodyLength": 0}));
}

#[tokio::test]
async fn test_error_status_carries_backend_message() {
    let addr = spawn_backend(course_backend()).await;
    let service = HttpService::new(&format!("http://{addr}")).unwrap();

    let error = service
        .call(Course::model(), CrudOp::CreateOne, Some(json!({"data": {}})))
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(400));
    assert_eq!(error.user_message(), "titleUz is required");
}

#[tokio::test]
async fn test_plain_text_error_body_is_kept() {
    let addr = spawn_backend(course_backend()).await;
    let service = HttpService::new(&format!("http://{addr}")).unwrap();

    let error = service.call(Course::model(), CrudOp::Count, Some(json!({}))).await.unwrap_err();

    assert_eq!(error.status(), Some(500));
    assert_eq!(error.user_message(), "upstream exploded");
}

#[tokio::test]
async fn test_unknown_route_is_backend_404() {
    let addr = spawn_backend(course_backend()).await;
    let service = HttpService::new(&format!("http://{addr}")).unwrap();

    let error = service.call(Mentor::model(), CrudOp::FindMany, Some(json!({}))).await.unwrap_err();

    assert_eq!(error.status(), Some(404));
    assert_eq!(error.error_code(), "BACKEND_NOT_FOUND");
}

#[tokio::test]
async fn test_closed_port_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let service = HttpService::new(&format!("http://{addr}")).unwrap();

    let error = service.call(Course::model(), CrudOp::FindMany, None).await.unwrap_err();

    assert!(matches!(error, AdminError::Transport { .. }));
    assert_eq!(error.status(), None);
}

// =============================================================================
// Through the Hooks
// =============================================================================

#[tokio::test]
async fn test_hooks_decode_http_responses() {
    let addr = spawn_backend(course_backend()).await;
    let (ctx, _) = context(HttpService::new(&format!("http://{addr}")).unwrap());

    let mut list = ctx
        .entity::<Course>()
        .use_courses(FindArgs::new().take(10), ReadOptions::default());
    let result = list.settled().await;

    let page = result.courses_data().unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.data[0].title_uz, "Rust");
}

#[tokio::test]
async fn test_rejected_write_toasts_backend_message() {
    let addr = spawn_backend(course_backend()).await;
    let (ctx, notifier) = context(HttpService::new(&format!("http://{addr}")).unwrap());

    let create = ctx
        .entity::<Course>()
        .use_create_course::<Value>(MutationOptions::new(), None);
    let result = create.mutate_async(json!({"price": 1})).await;

    assert!(result.is_err());
    assert_eq!(notifier.messages(NotificationLevel::Error), vec!["titleUz is required"]);
}
