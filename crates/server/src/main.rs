use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use control_tree::{GuiBuilder, Registry};
use futures::Stream;
use serde::Deserialize;
use shared::{
    domain::ClientId,
    error::{ApiError, ErrorCode},
    protocol::{ControlSnapshot, ServerEvent, UpdateReceipt},
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

mod api;
mod app_state;
mod config;

use app_state::AppState;
use config::load_settings;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Deserialize)]
struct ClientQuery {
    client_id: Option<String>,
}

impl ClientQuery {
    fn resolve(&self, state: &AppState) -> Result<ClientId, ApiError> {
        match self.client_id.as_deref() {
            Some(raw) => raw.trim().parse().map(ClientId).map_err(|_| {
                ApiError::new(
                    ErrorCode::MalformedMessage,
                    format!("`{raw}` is not a client id"),
                )
            }),
            None => Ok(state.allocate_client_id()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    let registry = Registry::with_event_capacity(settings.event_buffer);
    let mut gui = GuiBuilder::new(registry.clone());
    settings.layout.build(&mut gui)?;
    info!(layout = %settings.layout, controls = registry.len(), "layout built");

    let app = build_router(Arc::new(AppState::new(registry)));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/controls", get(http_list_controls))
        .route(
            "/controls/:control_id",
            get(http_get_control).delete(http_remove_control),
        )
        .route("/controls/:control_id/updates", post(http_post_updates))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

fn error_response(error: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match error.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::UnsupportedAttribute => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::MalformedMessage | ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(error))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_controls(State(state): State<Arc<AppState>>) -> Json<Vec<ControlSnapshot>> {
    Json(api::list_controls(&state))
}

async fn http_get_control(
    State(state): State<Arc<AppState>>,
    Path(control_id): Path<String>,
) -> ApiResult<Json<ControlSnapshot>> {
    let id = api::parse_control_id(&control_id).map_err(error_response)?;
    let control = api::get_control(&state, id).map_err(error_response)?;
    Ok(Json(control))
}

async fn http_post_updates(
    State(state): State<Arc<AppState>>,
    Path(control_id): Path<String>,
    Query(q): Query<ClientQuery>,
    body: String,
) -> ApiResult<Json<UpdateReceipt>> {
    let id = api::parse_control_id(&control_id).map_err(error_response)?;
    let client_id = q.resolve(&state).map_err(error_response)?;
    let receipt = api::apply_updates(&state, client_id, id, &body).map_err(error_response)?;
    Ok(Json(receipt))
}

async fn http_remove_control(
    State(state): State<Arc<AppState>>,
    Path(control_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = api::parse_control_id(&control_id).map_err(error_response)?;
    api::remove_control(&state, id);
    Ok(StatusCode::NO_CONTENT)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(q): Query<ClientQuery>,
) -> ApiResult<impl IntoResponse> {
    let client_id = q.resolve(&state).map_err(error_response)?;
    Ok(ws.on_upgrade(move |socket| ws_connection(state, socket, client_id)))
}

/// Registry events for everyone, merged with replies addressed to this
/// connection. Lagged receivers skip the missed events and carry on.
fn outbound_events(
    events: broadcast::Receiver<ServerEvent>,
    replies: mpsc::UnboundedReceiver<ServerEvent>,
) -> impl Stream<Item = ServerEvent> {
    use tokio_stream::{
        wrappers::{BroadcastStream, UnboundedReceiverStream},
        StreamExt,
    };

    let broadcast = BroadcastStream::new(events).filter_map(|event| match event {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "websocket subscriber lagged");
            None
        }
    });
    UnboundedReceiverStream::new(replies).merge(broadcast)
}

async fn ws_connection(state: Arc<AppState>, socket: WebSocket, client_id: ClientId) {
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let events_rx = state.registry.subscribe();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();
    info!(%client_id, "websocket connected");

    let snapshot = ServerEvent::Snapshot {
        controls: state.registry.tree(),
    };
    if let Ok(text) = serde_json::to_string(&snapshot) {
        if sender.send(Message::Text(text)).await.is_err() {
            return;
        }
    }

    let send_task = tokio::spawn(async move {
        let mut outbound = std::pin::pin!(outbound_events(events_rx, reply_rx));
        while let Some(event) = outbound.next().await {
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(err) => {
                    warn!(error = %err, "failed to encode server event");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => {
                for reply in api::process_client_text(&state, client_id, &text) {
                    let _ = reply_tx.send(reply);
                }
            }
            Message::Close(_) => break,
            _ => debug!(%client_id, "ignoring non-text frame"),
        }
    }

    send_task.abort();
    info!(%client_id, "websocket disconnected");
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
