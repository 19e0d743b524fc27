//! HTTP surface: the three form pages, prediction, and /health.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::FormRejection, Form, State},
    response::{Html, Json as AxumJson},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use house_price::{FormFields, Page, Predictor};

use crate::config::ServerConfig;
use crate::pages::{render_page, render_result, SESSION_FIELD};
use crate::session::FormSessionStore;
use crate::types::{ServerError, ServerResult};
use crate::wizard::{advance, merge_submission};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Predictor,
    pub sessions: Arc<Mutex<FormSessionStore>>,
}

impl AppState {
    pub fn new(predictor: Predictor, session_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            predictor,
            sessions: Arc::new(Mutex::new(FormSessionStore::new(session_ttl, max_sessions))),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/page2", post(handle_page2))
        .route("/page3", post(handle_page3))
        .route("/predict", post(handle_predict))
        .route("/health", get(handle_health))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Load the model, bind the listener, and serve until the process exits.
pub async fn serve(config: ServerConfig) -> ServerResult<()> {
    let predictor = Predictor::load(&config.model_path);
    if predictor.has_model() {
        tracing::info!("Model: {}", config.model_path.display());
    } else {
        tracing::warn!("Serving without a model; /predict will return 500");
    }

    let state = AppState::new(predictor, config.session_ttl, config.max_sessions);
    spawn_session_sweeper(state.sessions.clone(), config.session_ttl);

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    tracing::info!("House price form listening on http://{}", config.addr);

    axum::serve(listener, router(state))
        .await
        .map_err(|e| ServerError::Transport(e.to_string()))?;

    Ok(())
}

/// Periodically drop idle sessions so abandoned forms do not pile up.
fn spawn_session_sweeper(sessions: Arc<Mutex<FormSessionStore>>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            sessions.lock().await.purge_expired(Utc::now());
        }
    });
}

async fn handle_index(State(state): State<AppState>) -> Html<String> {
    let session_id = state.sessions.lock().await.create(Utc::now());
    Html(render_page(Page::Basics, &FormFields::new(), Some(&session_id)))
}

/// Raw form body as submitted, repeated keys included.
type FormPairs = Vec<(String, String)>;

/// Decode a form body, keeping the first value of any repeated key.
///
/// A body that cannot be read as a form decodes as an empty form, so the
/// handler still answers with its usual missing-field or model errors.
fn first_values(form: Result<Form<FormPairs>, FormRejection>) -> FormFields {
    let pairs = match form {
        Ok(Form(pairs)) => pairs,
        Err(rejection) => {
            tracing::warn!("Unreadable form body: {rejection}");
            Vec::new()
        }
    };

    let mut fields = FormFields::new();
    for (key, value) in pairs {
        fields.entry(key).or_insert(value);
    }
    fields
}

async fn handle_page2(
    State(state): State<AppState>,
    form: Result<Form<FormPairs>, FormRejection>,
) -> ServerResult<Html<String>> {
    advance_page(&state, Page::Basics, Page::Condition, first_values(form)).await
}

async fn handle_page3(
    State(state): State<AppState>,
    form: Result<Form<FormPairs>, FormRejection>,
) -> ServerResult<Html<String>> {
    advance_page(&state, Page::Condition, Page::Location, first_values(form)).await
}

/// Validate the page just submitted and render the one after it.
async fn advance_page(
    state: &AppState,
    submitted: Page,
    next: Page,
    form: FormFields,
) -> ServerResult<Html<String>> {
    let now = Utc::now();
    let session_id = form.get(SESSION_FIELD).cloned();

    let mut sessions = state.sessions.lock().await;
    let stored = session_id
        .as_deref()
        .and_then(|id| sessions.get(id, now))
        .map(|s| s.fields().clone());

    let merged = merge_submission(submitted, &form, stored.as_ref());
    let carried = advance(submitted, &merged).map_err(|e| {
        tracing::warn!("Rejected page {} submission: {e}", submitted.number());
        e
    })?;

    let live_session = session_id
        .as_deref()
        .filter(|id| sessions.record(id, submitted, &merged, now));
    let html = render_page(next, &carried, live_session);
    drop(sessions);

    Ok(Html(html))
}

async fn handle_predict(
    State(state): State<AppState>,
    form: Result<Form<FormPairs>, FormRejection>,
) -> ServerResult<Html<String>> {
    if !state.predictor.has_model() {
        tracing::error!("Prediction requested but no model is loaded");
        return Err(ServerError::ModelUnavailable("no model loaded".to_string()));
    }
    let form = first_values(form);

    let session_id = form.get(SESSION_FIELD).cloned();
    let stored = match session_id.as_deref() {
        Some(id) => state
            .sessions
            .lock()
            .await
            .get(id, Utc::now())
            .map(|s| s.fields().clone()),
        None => None,
    };
    let merged = merge_submission(Page::Location, &form, stored.as_ref());

    let predictor = state.predictor.clone();
    let result = tokio::task::spawn_blocking(move || predictor.estimate(&merged))
        .await
        .map_err(|e| {
            tracing::error!("Prediction task failed: {e}");
            ServerError::PredictionFailed(e.to_string())
        })?;

    match result {
        Ok(estimate) => {
            if let Some(id) = session_id.as_deref() {
                state.sessions.lock().await.remove(id);
            }
            tracing::info!("Estimated {}", estimate.formatted);
            Ok(Html(render_result(&estimate)))
        }
        Err(e) => {
            tracing::error!("Prediction failed: {e}");
            Err(e.into())
        }
    }
}

/// Health check endpoint.
async fn handle_health(State(state): State<AppState>) -> AxumJson<serde_json::Value> {
    let sessions = state.sessions.lock().await.count();

    AxumJson(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model_loaded": state.predictor.has_model(),
        "model": state.predictor.model_name(),
        "sessions": sessions,
    }))
}
