use std::sync::Arc;
use axum::{routing::{get, post}, Router, Json};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use tower_http::cors::{CorsLayer, Any};
use serde::{Deserialize, Serialize};
use serde_json::json;
use axum::http::{Method, StatusCode};
use tracing::{info, warn};
use crate::corpus::VerseRecord;
use crate::error::{Result, ShlokaError};
use crate::interface::{StudyInterface, StudyRequest, DEFAULT_LANGUAGE};
use crate::persist::{SessionRecord, UserProfile, UserUpdate};
use crate::study::StudyResponse;

type Shared = State<Arc<StudyInterface>>;

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

#[derive(Deserialize)]
pub struct TextRequest {
    pub text: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Serialize)]
pub struct TranslateResponse {
    pub status: String,
    pub translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Serialize)]
pub struct ExplainResponse {
    pub explanation: String,
}

#[derive(Deserialize)]
pub struct NewUser {
    pub name: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub scripture: Option<String>,
}

#[derive(Deserialize)]
pub struct CorpusQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
}

impl IntoResponse for ShlokaError {
    fn into_response(self) -> Response {
        let status = match &self {
            ShlokaError::InvalidMode(_) => StatusCode::BAD_REQUEST,
            ShlokaError::UnknownUser(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let msg = format!("{self}");
        warn!(%msg, code=%status.as_u16(), "request error");
        (status, Json(ErrorResponse { status: "error".into(), error: msg })).into_response()
    }
}

// The interface is synchronous and its providers block, so it runs off the async workers.
async fn blocking<T, F>(interface: Arc<StudyInterface>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&StudyInterface) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&interface))
        .await
        .map_err(|e| {
            warn!(error=%e, "Join error");
            ShlokaError::Server(e.to_string())
        })?
}

async fn study(State(iface): Shared, Json(req): Json<StudyRequest>) -> Result<Json<StudyResponse>> {
    let started = std::time::Instant::now();
    let response = blocking(iface, move |i| i.study(&req)).await?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(ms=elapsed_ms, direct=response.found_local.len(), heuristic=response.heuristic_matches.len(), session=?response.session_id, "study complete");
    Ok(Json(response))
}

async fn translate(State(iface): Shared, Json(req): Json<TextRequest>) -> Result<Json<TranslateResponse>> {
    let result = blocking(iface, move |i| i.translate(&req.text, &req.language, req.mode.as_deref())).await?;
    let status = if result.is_success() { "ok" } else { "failed" };
    Ok(Json(TranslateResponse {
        status: status.into(),
        translation: result.text().to_string(),
        reason: result.reason().map(|r| r.to_string()),
        detail: result.detail().map(str::to_string),
    }))
}

async fn explain(State(iface): Shared, Json(req): Json<TextRequest>) -> Result<Json<ExplainResponse>> {
    let explanation = blocking(iface, move |i| i.explain(&req.text, &req.language, req.mode.as_deref())).await?;
    Ok(Json(ExplainResponse { explanation }))
}

async fn corpus(State(iface): Shared, Query(query): Query<CorpusQuery>) -> Json<Vec<VerseRecord>> {
    let records: Vec<VerseRecord> = match query.q.as_deref() {
        Some(q) => iface.corpus().search(q).into_iter().cloned().collect(),
        None => iface.corpus().records().to_vec(),
    };
    Json(records)
}

async fn health(State(iface): Shared) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "corpus": iface.corpus().len(),
        "paid_available": iface.paid_available(),
    }))
}

async fn list_users(State(iface): Shared) -> Result<Json<Vec<UserProfile>>> {
    Ok(Json(blocking(iface, |i| i.users()).await?))
}

async fn create_user(State(iface): Shared, Json(req): Json<NewUser>) -> Result<(StatusCode, Json<UserProfile>)> {
    let user = blocking(iface, move |i| i.create_user(&req.name, &req.language, req.scripture.as_deref())).await?;
    info!(id=user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(State(iface): Shared, Path(id): Path<i64>) -> Result<Json<UserProfile>> {
    Ok(Json(blocking(iface, move |i| i.user(id)).await?))
}

async fn update_user(State(iface): Shared, Path(id): Path<i64>, Json(update): Json<UserUpdate>) -> Result<Json<UserProfile>> {
    Ok(Json(blocking(iface, move |i| i.update_user(id, &update)).await?))
}

async fn delete_user(State(iface): Shared, Path(id): Path<i64>) -> Result<StatusCode> {
    blocking(iface, move |i| i.delete_user(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn user_sessions(State(iface): Shared, Path(id): Path<i64>) -> Result<Json<Vec<SessionRecord>>> {
    Ok(Json(blocking(iface, move |i| i.sessions(id)).await?))
}

pub fn router(interface: Arc<StudyInterface>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    Router::new()
        .route("/health", get(health))
        .route("/v1/study", post(study))
        .route("/v1/translate", post(translate))
        .route("/v1/explain", post(explain))
        .route("/v1/corpus", get(corpus))
        .route("/v1/users", get(list_users).post(create_user))
        .route("/v1/users/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/v1/users/:id/sessions", get(user_sessions))
        .layer(cors)
        .with_state(interface)
}

pub async fn serve(interface: Arc<StudyInterface>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(%bind, "listening");
    axum::serve(listener, router(interface)).await?;
    Ok(())
}
