use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::compression::CompressionLayer;

use crate::slot::{ReadError, SlotSnapshot};
use crate::web::page::render_index;
use crate::QrFlashEngine;

#[derive(Serialize)]
pub struct StatusResponse {
    pub uptime_secs: u64,
    pub slot: SlotSnapshot,
}

pub fn router(engine: QrFlashEngine) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/artifact", get(get_artifact))
        .route("/api/status", get(get_status))
        .layer(CompressionLayer::new())
        .with_state(engine)
}

pub async fn start_http_server(
    engine: QrFlashEngine,
    addr: &str,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = router(engine);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🌐 QR page available at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn index(State(engine): State<QrFlashEngine>) -> Html<String> {
    Html(render_index(engine.slots.is_available()))
}

async fn get_artifact(State(engine): State<QrFlashEngine>) -> Response {
    let slots = engine.slots.clone();
    // Encoding is CPU work; keep it off the async workers.
    let result = match tokio::task::spawn_blocking(move || slots.artifact()).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Artifact task failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match result {
        Ok(artifact) => (
            [
                (header::CONTENT_TYPE, artifact.content_type),
                (header::CACHE_CONTROL, "no-store"),
            ],
            Body::from(artifact.bytes),
        )
            .into_response(),
        Err(ReadError::NoCurrentPayload) => StatusCode::NOT_FOUND.into_response(),
        Err(ReadError::Artifact(e)) => {
            tracing::warn!("Could not render artifact: {}", e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn get_status(State(engine): State<QrFlashEngine>) -> Json<StatusResponse> {
    Json(StatusResponse {
        uptime_secs: engine.start_time.elapsed().as_secs(),
        slot: engine.slots.snapshot(),
    })
}
