//! HTTP surface - translates extension requests into router and tracker calls

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use libvidask_api::{
    AnswerResponse, ErrorBody, EventAccepted, HealthResponse, SessionStatus, ASK_PATH, CLEAR_CACHE_PATH,
    EVENTS_PATH, HEALTH_PATH, SESSION_PATH,
};
use libvidask_core::session::{BrowserEvent, DispatchStats, SessionEvent, TrackerClosed, TrackerHandle};
use libvidask_core::types::{AskPayload, ClearCachePayload};
use libvidask_core::{ErrorKind, RagRequest, RequestRouter, VidaskError};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub router: RequestRouter,
    pub tracker: TrackerHandle,
    pub stats: Arc<DispatchStats>,
    pub credential_configured: bool,
}

/// Build the axum router
pub fn app(state: AppState, cors_origins: Vec<String>) -> Router {
    Router::new()
        .route(ASK_PATH, post(ask_rag))
        .route(CLEAR_CACHE_PATH, post(clear_cache))
        .route(EVENTS_PATH, post(post_event))
        .route(SESSION_PATH, get(session))
        .route(HEALTH_PATH, get(health))
        .layer(middleware::from_fn_with_state(Arc::new(cors_origins), cors))
        .with_state(state)
}

/// Error response: status plus `{error, details?, code}`
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    body: ErrorBody,
}

impl From<VidaskError> for ApiFailure {
    fn from(err: VidaskError) -> Self {
        Self {
            status: status_for(err.kind()),
            body: ErrorBody::from_error(&err),
        }
    }
}

impl From<TrackerClosed> for ApiFailure {
    fn from(err: TrackerClosed) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: ErrorBody {
                error: "The daemon is shutting down.".to_string(),
                details: Some(err.to_string()),
                code: None,
            },
        }
    }
}

impl From<JsonRejection> for ApiFailure {
    fn from(rejection: JsonRejection) -> Self {
        VidaskError::InvalidArgument(rejection.body_text()).into()
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::NetworkFailure => StatusCode::BAD_GATEWAY,
        ErrorKind::Configuration | ErrorKind::LaunchFailure | ErrorKind::EngineFailure => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// POST /api/ask-rag
async fn ask_rag(
    State(state): State<AppState>,
    payload: Result<Json<AskPayload>, JsonRejection>,
) -> Result<Json<AnswerResponse>, ApiFailure> {
    let request_id = Uuid::new_v4();
    let Json(payload) = payload?;

    let request = RequestRouter::validate_ask(&payload).map_err(|e| {
        warn!(%request_id, "Rejected ask request: {}", e);
        e
    })?;

    if let RagRequest::Ask { video, .. } = &request {
        if let Err(e) = state
            .tracker
            .notify(SessionEvent::VideoDetected(video.video_id.clone()))
            .await
        {
            warn!(%request_id, "Could not report asked-about video: {}", e);
        }
    }

    let response = run(&state.router, &request, request_id).await?;
    Ok(Json(AnswerResponse { response }))
}

/// POST /api/clear-cache
async fn clear_cache(
    State(state): State<AppState>,
    payload: Result<Json<ClearCachePayload>, JsonRejection>,
) -> Result<Json<AnswerResponse>, ApiFailure> {
    let request_id = Uuid::new_v4();
    let Json(payload) = payload?;

    let request = RequestRouter::validate_clear(&payload).map_err(|e| {
        warn!(%request_id, "Rejected clear-cache request: {}", e);
        e
    })?;

    let response = run(&state.router, &request, request_id).await?;
    Ok(Json(AnswerResponse { response }))
}

async fn run(router: &RequestRouter, request: &RagRequest, request_id: Uuid) -> Result<String, VidaskError> {
    let started = Instant::now();
    let span = info_span!("request", %request_id, kind = %request.kind());
    let result = router.submit(request).instrument(span).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match &result {
        Ok(_) => info!(%request_id, elapsed_ms, "Request completed"),
        Err(e) => warn!(%request_id, elapsed_ms, code = e.error_code(), "Request failed: {}", e),
    }
    result
}

/// POST /api/events
async fn post_event(
    State(state): State<AppState>,
    payload: Result<Json<BrowserEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<EventAccepted>), ApiFailure> {
    let Json(event) = payload?;

    let name = match event.to_session_event()? {
        Some(session_event) => {
            let name = session_event.name();
            state.tracker.notify(session_event).await?;
            Some(name.to_string())
        }
        None => None,
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(EventAccepted {
            accepted: true,
            event: name,
        }),
    ))
}

/// GET /api/session
async fn session(State(state): State<AppState>) -> Result<Json<SessionStatus>, ApiFailure> {
    let session = state.tracker.snapshot().await?;
    Ok(Json(SessionStatus {
        session,
        invalidations: state.stats.counters(),
    }))
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        credential_configured: state.credential_configured,
    })
}

/// Echo allow-listed origins. Preflights are answered here without routing.
async fn cors(State(origins): State<Arc<Vec<String>>>, request: Request, next: Next) -> Response {
    let allowed = request
        .headers()
        .get(header::ORIGIN)
        .filter(|origin| origins.iter().any(|o| origin.as_bytes() == o.as_bytes()))
        .cloned();

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    if let Some(origin) = allowed {
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, POST, OPTIONS"));
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("content-type"));
        headers.insert(header::VARY, HeaderValue::from_static("origin"));
    }
    response
}
