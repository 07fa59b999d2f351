use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Json, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::client::Worldscribe;
use crate::error::{Result, WorldscribeError};

#[derive(Clone)]
pub struct AppState {
    pub scribe: Arc<Worldscribe>,
    pub token: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn default_chapter_number() -> i64 {
    1
}

#[derive(Deserialize)]
struct ChapterQuery {
    #[serde(default = "default_chapter_number")]
    chapter_number: i64,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chapter_flow", get(chapter_flow))
        .route("/chapter_prompt", get(chapter_prompt))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

fn bad_query(rejection: QueryRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: rejection.body_text(),
        }),
    )
        .into_response()
}

fn error_response(err: WorldscribeError) -> Response {
    let status = match &err {
        WorldscribeError::ChapterNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

async fn chapter_flow(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: std::result::Result<Query<ChapterQuery>, QueryRejection>,
) -> impl IntoResponse {
    if let Err(err) = authorize(&headers, &state.token) {
        return err.into_response();
    }
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_query(rejection),
    };

    let chapter_number = query.chapter_number;
    tracing::info!(chapter = chapter_number, "chapter flow requested");
    let prepared = match state.scribe.prepare_chapter(chapter_number) {
        Ok(prepared) => prepared,
        Err(err) => {
            tracing::warn!(chapter = chapter_number, "cannot prepare chapter: {err}");
            return error_response(err);
        }
    };

    let mut stream = state.scribe.stream_chapter(prepared);
    let body = Body::from_stream(async_stream::stream! {
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    if !chunk.is_empty() {
                        yield Ok::<Bytes, std::convert::Infallible>(Bytes::from(chunk));
                    }
                }
                Err(err) => {
                    tracing::warn!(chapter = chapter_number, "chapter stream failed: {err}");
                    let message = format!("\n[error] {}", err);
                    yield Ok(Bytes::from(message));
                    break;
                }
            }
        }
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

async fn chapter_prompt(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: std::result::Result<Query<ChapterQuery>, QueryRejection>,
) -> impl IntoResponse {
    if let Err(err) = authorize(&headers, &state.token) {
        return err.into_response();
    }
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_query(rejection),
    };

    match state.scribe.prepare_chapter(query.chapter_number) {
        Ok(prepared) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            prepared.text,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn authorize(
    headers: &HeaderMap,
    token: &str,
) -> std::result::Result<(), (StatusCode, Json<ErrorResponse>)> {
    let header = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let api_key = headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let bearer = header.strip_prefix("Bearer ").unwrap_or("");

    if token.is_empty() || bearer == token || api_key == token {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Unauthorized".to_string(),
            }),
        ))
    }
}

pub async fn run(host: &str, port: u16, scribe: Worldscribe, token: &str) -> Result<()> {
    run_with_shutdown(host, port, scribe, token, futures::future::pending::<()>()).await
}

pub async fn run_with_shutdown<F>(
    host: &str,
    port: u16,
    scribe: Worldscribe,
    token: &str,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState {
        scribe: Arc::new(scribe),
        token: token.to_string(),
    };
    let app = build_router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WorldscribeError::Runtime(e.to_string()))?;
    tracing::info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| WorldscribeError::Runtime(e.to_string()))?;

    Ok(())
}
