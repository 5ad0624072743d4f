use super::*;
use axum::{body, body::Body, http::Request};
use control_tree::layouts::Layout;
use shared::domain::{ControlId, ControlKind};
use tower::ServiceExt;

fn test_app() -> (Router, Registry) {
    let registry = Registry::new();
    Layout::EyeButton
        .build(&mut GuiBuilder::new(registry.clone()))
        .expect("layout");
    let app = build_router(Arc::new(AppState::new(registry.clone())));
    (app, registry)
}

fn id_of(registry: &Registry, kind: ControlKind) -> ControlId {
    registry
        .tree()
        .into_iter()
        .find(|control| control.kind == kind)
        .map(|control| control.id)
        .expect("control of kind")
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (app, _registry) = test_app();
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn list_returns_tree_depth_first() {
    let (app, registry) = test_app();
    let request = Request::get("/controls")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let controls: Vec<ControlSnapshot> = json_body(response).await;
    assert_eq!(controls.len(), 8);
    assert_eq!(controls[0].kind, ControlKind::FolderTree);
    assert_eq!(controls, registry.tree());
}

#[tokio::test]
async fn get_unknown_or_bad_id_maps_to_status() {
    let (app, _registry) = test_app();

    let request = Request::get(format!("/controls/{}", ControlId::new_v4()))
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ApiError = json_body(response).await;
    assert_eq!(error.code, ErrorCode::NotFound);

    let request = Request::get("/controls/not-a-uuid")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn posting_updates_applies_and_reports() {
    let (app, registry) = test_app();
    let button = id_of(&registry, ControlKind::Button);

    let request = Request::post(format!("/controls/{button}/updates?client_id=3"))
        .body(Body::from(r#"{"visible": false, "disabled": true, "label": "x"}"#))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let receipt: UpdateReceipt = json_body(response).await;
    assert_eq!(receipt.target_id, button);
    assert_eq!(receipt.applied.len(), 2);
    assert_eq!(receipt.rejected.len(), 1);
    assert_eq!(receipt.rejected[0].code, ErrorCode::MalformedMessage);

    let control = registry.resolve(button).expect("button");
    assert!(!control.visible());
    assert_eq!(control.disabled(), Some(true));
}

#[tokio::test]
async fn non_numeric_client_id_gets_json_error() {
    let (app, registry) = test_app();
    let button = id_of(&registry, ControlKind::Button);
    let before = registry.snapshot(button).expect("button");

    let request = Request::post(format!("/controls/{button}/updates?client_id=abc"))
        .body(Body::from(r#"{"visible": false}"#))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ApiError = json_body(response).await;
    assert_eq!(error.code, ErrorCode::MalformedMessage);
    assert!(error.message.contains("abc"));
    assert_eq!(registry.snapshot(button).expect("button"), before);
}

#[tokio::test]
async fn posting_to_unknown_control_is_not_found() {
    let (app, _registry) = test_app();
    let request = Request::post(format!("/controls/{}/updates", ControlId::new_v4()))
        .body(Body::from(r#"{"visible": false}"#))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (app, registry) = test_app();
    let tree = id_of(&registry, ControlKind::FolderTree);

    for _ in 0..2 {
        let request = Request::delete(format!("/controls/{tree}"))
            .body(Body::empty())
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
    assert!(registry.is_empty());
}

#[tokio::test]
async fn outbound_stream_carries_replies_and_registry_events() {
    use futures::StreamExt;

    let (_app, registry) = test_app();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();
    let mut outbound = std::pin::pin!(outbound_events(registry.subscribe(), reply_rx));

    reply_tx
        .send(ServerEvent::Error(ApiError::new(ErrorCode::Internal, "reply")))
        .expect("send");
    registry.remove(id_of(&registry, ControlKind::Markdown));

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(outbound.next().await.expect("event"));
    }
    assert!(seen.iter().any(|e| matches!(e, ServerEvent::Error(_))));
    assert!(seen
        .iter()
        .any(|e| matches!(e, ServerEvent::ControlRemoved { .. })));
    assert!(seen
        .iter()
        .any(|e| matches!(e, ServerEvent::ControlUpdated { control } if control.kind == ControlKind::FolderTree)));
}
