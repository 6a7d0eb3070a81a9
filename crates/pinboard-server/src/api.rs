use std::any::Any;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Path, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use pinboard_shared::constants::NOTES_PATH;
use pinboard_shared::protocol::{
    CreateNoteRequest, CreateNoteResponse, DeleteNoteRequest, DeleteNoteResponse,
    UpdateNoteRequest, UpdateNoteResponse,
};
use pinboard_shared::{NoteId, NoteView};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::repository::NoteRepository;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<NoteRepository>,
    pub config: Arc<ServerConfig>,
}

/// Routes:
/// - `/api/notes`: method dispatch, id and token in the JSON body
/// - `/api/notes/{id}`: same verbs with the id taken from the path
///
/// OPTIONS on any route is answered by the CORS layer and rewritten to an
/// empty 204.
pub fn build_router(state: AppState) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(cors::Any);

    let collection = get(list_notes)
        .post(create_note)
        .put(update_note)
        .delete(delete_note)
        .fallback(method_not_allowed);

    let item = get(get_note)
        .put(update_note_at)
        .delete(delete_note_at)
        .fallback(method_not_allowed);

    Router::new()
        .route("/health", get(health_check))
        .route(NOTES_PATH, collection)
        .route(&format!("{NOTES_PATH}/:id"), item)
        .fallback(unknown_route)
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(middleware::map_response(payload_too_large_as_json))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer)
        .layer(middleware::from_fn(preflight_no_content))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_notes(State(state): State<AppState>) -> Json<Vec<NoteView>> {
    Json(state.repository.list().await)
}

async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NoteView>, ServerError> {
    let note = state.repository.get(&NoteId::from(id)).await?;
    Ok(Json(note))
}

async fn create_note(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CreateNoteResponse>, ServerError> {
    let req: CreateNoteRequest = parse_body(&body);

    let (note, token) = state
        .repository
        .create(req.content.as_deref(), req.image_data_url.as_deref())
        .await?;

    Ok(Json(CreateNoteResponse {
        ok: true,
        note,
        token: token.into_inner(),
    }))
}

async fn update_note(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UpdateNoteResponse>, ServerError> {
    let req: UpdateNoteRequest = parse_body(&body);
    let id = resolve_id(None, req.id.as_deref())?;
    apply_update(&state, id, req).await
}

async fn update_note_at(
    State(state): State<AppState>,
    Path(path_id): Path<String>,
    body: Bytes,
) -> Result<Json<UpdateNoteResponse>, ServerError> {
    let req: UpdateNoteRequest = parse_body(&body);
    let id = resolve_id(Some(&path_id), req.id.as_deref())?;
    apply_update(&state, id, req).await
}

async fn apply_update(
    state: &AppState,
    id: NoteId,
    req: UpdateNoteRequest,
) -> Result<Json<UpdateNoteResponse>, ServerError> {
    let token = presented_token(req.token.as_deref())?;

    let note = state
        .repository
        .update(
            &id,
            token,
            req.content.as_deref(),
            req.image_data_url.as_deref(),
        )
        .await?;

    Ok(Json(UpdateNoteResponse { ok: true, note }))
}

async fn delete_note(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DeleteNoteResponse>, ServerError> {
    let req: DeleteNoteRequest = parse_body(&body);
    let id = resolve_id(None, req.id.as_deref())?;
    apply_delete(&state, id, req).await
}

async fn delete_note_at(
    State(state): State<AppState>,
    Path(path_id): Path<String>,
    body: Bytes,
) -> Result<Json<DeleteNoteResponse>, ServerError> {
    let req: DeleteNoteRequest = parse_body(&body);
    let id = resolve_id(Some(&path_id), req.id.as_deref())?;
    apply_delete(&state, id, req).await
}

async fn apply_delete(
    state: &AppState,
    id: NoteId,
    req: DeleteNoteRequest,
) -> Result<Json<DeleteNoteResponse>, ServerError> {
    let token = presented_token(req.token.as_deref())?;
    state.repository.delete(&id, token).await?;
    Ok(Json(DeleteNoteResponse { ok: true }))
}

async fn preflight_no_content(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if is_options && response.status().is_success() {
        *response.status_mut() = StatusCode::NO_CONTENT;
        *response.body_mut() = Body::empty();
    }
    response
}

// Body extractor rejections over the size limit come back as plain text.
async fn payload_too_large_as_json(response: Response) -> Response {
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ServerError::PayloadTooLarge.into_response();
    }
    response
}

async fn method_not_allowed() -> ServerError {
    ServerError::MethodNotAllowed
}

async fn unknown_route() -> ServerError {
    ServerError::NotFound("no such route".into())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "Request handler panicked");
    ServerError::Internal(detail.to_string()).into_response()
}

/// Malformed or non-JSON bodies are treated as an empty object so that
/// validation reports the usual "missing field" or "empty note" error.
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> T {
    if body.iter().all(u8::is_ascii_whitespace) {
        return T::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!(error = %e, "Unparseable request body, treating as empty");
        T::default()
    })
}

/// A field that is absent or blank is missing.
fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ServerError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::BadRequest(format!("missing {name}")))
}

/// Tokens are compared byte for byte, so unlike other fields they are not
/// trimmed.
fn presented_token(value: Option<&str>) -> Result<&str, ServerError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::BadRequest("missing token".into()))
}

/// Pick the note id from the path or the body; both present must agree.
fn resolve_id(path: Option<&str>, body: Option<&str>) -> Result<NoteId, ServerError> {
    let body = body.map(str::trim).filter(|v| !v.is_empty());
    match (path.map(str::trim), body) {
        (Some(path), Some(body)) if path != body => Err(ServerError::BadRequest(
            "note id in body does not match path".into(),
        )),
        (Some(path), _) => Ok(NoteId::from(required(Some(path), "id")?)),
        (None, body) => Ok(NoteId::from(required(body, "id")?)),
    }
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_on(listener, state).await
}

/// Serve on an already-bound listener (lets callers bind port 0).
pub async fn serve_on(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %listener.local_addr()?, "Starting HTTP API server");

    axum::serve(listener, app).await?;

    Ok(())
}
