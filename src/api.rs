//! HTTP surface for the dashboard UI.
//!
//! Every user action (load, analyze, filter, chat) is one request against one session.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::ai_bootstrap::AiRuntime;
use crate::analyze::ai_adapter::DynProvider;
use crate::analyze::{analyze_dataset, AnalysisReport, Origin, RemoteStatus, SentimentClassifier};
use crate::category::{classify_category, Category};
use crate::chat::{ChatAssistant, ChatReply, ChatTurn};
use crate::config::{AnalysisMethod, DashboardConfig};
use crate::error::DashboardError;
use crate::filter::{apply_filters, date_bounds, DateRange, Filters, StatusFilter, ALL};
use crate::ingest::Dataset;
use crate::sentiment::Polarity;
use crate::session::{Session, SessionStore, SharedSession};
use crate::summary::{summarize, Summary};

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub classifier: Arc<SentimentClassifier>,
    pub assistant: Arc<ChatAssistant>,
    pub config: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(config: DashboardConfig, provider: DynProvider, timeout: Duration) -> Self {
        let assistant = ChatAssistant::new(provider.clone(), config.chat.clone(), timeout);
        Self {
            sessions: SessionStore::new(),
            classifier: Arc::new(SentimentClassifier::new(provider, timeout)),
            assistant: Arc::new(assistant),
            config: Arc::new(config),
        }
    }

    /// Config files + env, the way the binary boots.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = DashboardConfig::load_default()?;
        let ai = AiRuntime::from_default()?;
        let timeout = ai.timeout();
        Ok(Self::new(config, ai.provider, timeout))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(session_status).delete(delete_session))
        .route("/sessions/{id}/load", post(load_dataset))
        .route("/sessions/{id}/analyze", post(analyze))
        .route("/sessions/{id}/classify", post(classify))
        .route("/sessions/{id}/filters", get(filter_options))
        .route("/sessions/{id}/view", get(view))
        .route("/sessions/{id}/summary", get(summary))
        .route("/sessions/{id}/chat", get(chat_history).post(chat))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// ------------------------------------------------------------
// Errors
// ------------------------------------------------------------

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            DashboardError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            DashboardError::Parse { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "parse"),
            DashboardError::MissingColumn(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "missing_column")
            }
            DashboardError::NoDataset => (StatusCode::CONFLICT, "no_dataset"),
            DashboardError::UnknownSession(_) => (StatusCode::NOT_FOUND, "unknown_session"),
            DashboardError::RemoteUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "remote_unavailable")
            }
        };
        (status, Json(json!({ "error": self.to_string(), "kind": kind }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, DashboardError>;

fn lookup(state: &AppState, id: &str) -> Result<SharedSession, DashboardError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| DashboardError::UnknownSession(id.to_string()))
}

// ------------------------------------------------------------
// Filter query
// ------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl FilterQuery {
    /// A half-open range is completed with the dataset's own date bounds.
    pub fn to_filters(&self, ds: Option<&Dataset>) -> Filters {
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != ALL)
            .map(str::to_string);
        let date_range = match (self.start, self.end) {
            (None, None) => None,
            (Some(s), Some(e)) => Some(DateRange::new(s, e)),
            (s, e) => ds.and_then(date_bounds).map(|(_, lo, hi)| {
                DateRange::new(s.unwrap_or(lo), e.unwrap_or(hi))
            }),
        };
        Filters {
            category,
            status: self
                .status
                .as_deref()
                .map(StatusFilter::parse)
                .unwrap_or_default(),
            keyword: self.keyword.clone().unwrap_or_default(),
            date_range,
        }
    }
}

// ------------------------------------------------------------
// Sessions
// ------------------------------------------------------------

#[derive(Serialize)]
struct Created {
    session_id: String,
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<Created>) {
    let session_id = state.sessions.create();
    (StatusCode::CREATED, Json(Created { session_id }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, DashboardError> {
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(DashboardError::UnknownSession(id))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatus {
    pub dataset_loaded: bool,
    pub rows: usize,
    pub columns: Vec<String>,
    pub analyzed: bool,
    pub remote_status: RemoteStatus,
    pub remote_unavailable: bool,
    pub memoized: usize,
    pub transcript_len: usize,
}

fn status_of(s: &Session) -> SessionStatus {
    let ds = s.dataset.as_ref();
    SessionStatus {
        dataset_loaded: ds.is_some(),
        rows: ds.map_or(0, Dataset::len),
        columns: ds.map(|d| d.columns().to_vec()).unwrap_or_default(),
        analyzed: ds.is_some_and(|d| d.has_column(crate::ingest::COL_SENTIMENT)),
        remote_status: s.classifier.status(),
        remote_unavailable: s.classifier.remote_unavailable(),
        memoized: s.classifier.memo_len(),
        transcript_len: s.transcript.len(),
    }
}

async fn session_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SessionStatus> {
    let sess = lookup(&state, &id)?;
    let g = sess.lock().await;
    Ok(Json(status_of(&g)))
}

// ------------------------------------------------------------
// Load / analyze / classify
// ------------------------------------------------------------

async fn load_dataset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SessionStatus> {
    let sess = lookup(&state, &id)?;
    let mut g = sess.lock().await;
    if let Err(e) = g.load_dataset(&state.config.dataset.path) {
        warn!(session = %id, error = %e, "dataset load failed");
        return Err(e);
    }
    Ok(Json(status_of(&g)))
}

#[derive(Debug, Default, Deserialize)]
struct AnalyzeReq {
    #[serde(default)]
    method: Option<AnalysisMethod>,
}

async fn analyze(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AnalyzeReq>,
) -> ApiResult<AnalysisReport> {
    let method = body
        .method
        .unwrap_or(state.config.analysis.default_method);
    let sess = lookup(&state, &id)?;
    let mut g = sess.lock().await;
    let Session {
        dataset,
        classifier,
        ..
    } = &mut *g;
    let ds = dataset.as_mut().ok_or(DashboardError::NoDataset)?;
    let report = analyze_dataset(&state.classifier, classifier, ds, method).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct ClassifyReq {
    text: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    method: Option<AnalysisMethod>,
}

#[derive(Debug, Serialize)]
struct ClassifyResp {
    category: Category,
    sentiment: Polarity,
    origin: Origin,
    remote_status: RemoteStatus,
}

async fn classify(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ClassifyReq>,
) -> ApiResult<ClassifyResp> {
    let method = body
        .method
        .unwrap_or(state.config.analysis.default_method);
    let sess = lookup(&state, &id)?;
    let mut g = sess.lock().await;
    let c = state
        .classifier
        .classify_with(&mut g.classifier, method, Some(&body.text))
        .await;
    Ok(Json(ClassifyResp {
        category: classify_category(Some(&body.text), body.category.as_deref()),
        sentiment: c.label,
        origin: c.origin,
        remote_status: g.classifier.status(),
    }))
}

// ------------------------------------------------------------
// Filters / view / summary
// ------------------------------------------------------------

#[derive(Debug, Serialize)]
struct FilterOptions {
    categories: Vec<String>,
    statuses: Vec<&'static str>,
    date_column: Option<String>,
    min_date: Option<NaiveDate>,
    max_date: Option<NaiveDate>,
}

async fn filter_options(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<FilterOptions> {
    let sess = lookup(&state, &id)?;
    let g = sess.lock().await;
    let ds = g.dataset.as_ref().ok_or(DashboardError::NoDataset)?;

    let mut categories = vec![ALL.to_string()];
    if let Some(idx) = ds.column_index(crate::ingest::COL_CATEGORY) {
        let mut present: Vec<String> = (0..ds.len())
            .filter_map(|r| ds.value(r, idx))
            .map(str::to_string)
            .collect();
        present.sort();
        present.dedup();
        categories.extend(present);
    }
    let bounds = date_bounds(ds);
    Ok(Json(FilterOptions {
        categories,
        statuses: StatusFilter::OPTIONS.iter().map(|s| s.as_str()).collect(),
        date_column: bounds.as_ref().map(|b| b.0.clone()),
        min_date: bounds.as_ref().map(|b| b.1),
        max_date: bounds.as_ref().map(|b| b.2),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewResp {
    pub rows_total: usize,
    pub rows_in_view: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

async fn view(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<FilterQuery>,
) -> ApiResult<ViewResp> {
    let sess = lookup(&state, &id)?;
    let g = sess.lock().await;
    let ds = g.dataset.as_ref().ok_or(DashboardError::NoDataset)?;
    let v = apply_filters(ds, &q.to_filters(Some(ds)));
    Ok(Json(ViewResp {
        rows_total: ds.len(),
        rows_in_view: v.len(),
        columns: ds.columns().to_vec(),
        rows: v.to_rows(),
    }))
}

async fn summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<FilterQuery>,
) -> ApiResult<Summary> {
    let sess = lookup(&state, &id)?;
    let g = sess.lock().await;
    let ds = g.dataset.as_ref().ok_or(DashboardError::NoDataset)?;
    let v = apply_filters(ds, &q.to_filters(Some(ds)));
    Ok(Json(summarize(&v)))
}

// ------------------------------------------------------------
// Chat
// ------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatReq {
    message: String,
    #[serde(flatten)]
    filters: FilterQuery,
}

async fn chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ChatReq>,
) -> ApiResult<ChatReply> {
    let sess = lookup(&state, &id)?;
    let mut g = sess.lock().await;
    let Session {
        dataset,
        transcript,
        ..
    } = &mut *g;
    let filters = body.filters.to_filters(dataset.as_ref());
    let view = dataset.as_ref().map(|d| apply_filters(d, &filters));
    let reply = state
        .assistant
        .respond(transcript, &body.message, view.as_ref(), &filters)
        .await;
    Ok(Json(reply))
}

async fn chat_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<ChatTurn>> {
    let sess = lookup(&state, &id)?;
    let g = sess.lock().await;
    Ok(Json(g.transcript.clone()))
}
