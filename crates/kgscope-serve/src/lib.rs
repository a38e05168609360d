//! Web front end for a pretrained KGE model.
//!
//! # Endpoints
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | GET | `/` | | HTML form |
//! | POST | `/predict` | form: subject, predicate, object, random | HTML form + results |
//! | POST | `/api/predict` | JSON [`PredictRequest`] | JSON [`Answer`] |
//!
//! An unknown name is not a server error: the page shows
//! `Failed at mapping the <role>` and an empty table, with status 200.
//! Only oracle failures produce a 500.
//!
//! # Example
//!
//! ```rust,ignore
//! use kgscope_infer::{DeployConfig, Experiment};
//! use kgscope_serve::{bind_address, serve, AppState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let experiment = Experiment::load("Experiments/run", DeployConfig::default())?;
//!     let state = AppState::new(experiment.predictor.clone(), experiment.title());
//!     serve(state, bind_address(&experiment.deploy)).await?;
//!     Ok(())
//! }
//! ```

mod html;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use kgscope_infer::{DeployConfig, Error as InferError, LinkPrediction, PredictRequest, Predictor};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

pub use html::{escape, page, results_table, FormValues};

/// Errors that can occur while running the server.
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared by every request; read-only.
#[derive(Clone)]
pub struct AppState {
    predictor: Arc<Predictor>,
    title: Arc<str>,
}

impl AppState {
    pub fn new(predictor: Arc<Predictor>, title: impl Into<String>) -> Self {
        Self {
            predictor,
            title: Arc::from(title.into()),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// What a submission produced, for both the HTML and the JSON endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    /// `( s, p, ? )`, `( s, p, o )`, or `Failed at mapping the <role>`.
    pub triple: String,
    pub results: Vec<LinkPrediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run one request through the predictor.
///
/// Lookup misses become an [`Answer`] carrying the message; every other
/// failure is returned.
pub fn answer(predictor: &Predictor, request: &PredictRequest) -> Result<Answer, InferError> {
    let mut rng = rand::thread_rng();
    match predictor.predict(request, &mut rng) {
        Ok(prediction) => Ok(Answer {
            triple: prediction.label(),
            results: prediction.results,
            error: None,
        }),
        Err(err) => match err.unresolved_role() {
            Some(role) => {
                warn!(error = %err, "unresolved name");
                Ok(Answer {
                    triple: format!("Failed at mapping the {role}"),
                    results: Vec::new(),
                    error: Some(err.to_string()),
                })
            }
            None => Err(err),
        },
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/predict", post(predict_json))
        .with_state(state)
}

/// Loopback unless `share` is set.
pub fn bind_address(config: &DeployConfig) -> SocketAddr {
    let ip = if config.share {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    } else {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    };
    SocketAddr::new(ip, config.port)
}

/// Serve until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), ServeError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    info!("{} listening on http://{}", state.title(), addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PredictForm {
    subject: String,
    predicate: String,
    object: String,
    /// Present (any value) when the box is checked.
    random: Option<String>,
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(page(state.title(), &FormValues::default(), None, &[]))
}

async fn predict_form(State(state): State<AppState>, Form(form): Form<PredictForm>) -> Response {
    let values = FormValues {
        subject: form.subject,
        predicate: form.predicate,
        object: form.object,
        random: form.random.is_some(),
    };
    let request = PredictRequest {
        subject: values.subject.clone(),
        predicate: values.predicate.clone(),
        object: values.object.clone(),
        random: values.random,
        top_k: None,
    };

    match answer(&state.predictor, &request) {
        Ok(answer) => Html(page(
            state.title(),
            &values,
            Some(&answer.triple),
            &answer.results,
        ))
        .into_response(),
        Err(err) => {
            error!(error = %err, "prediction failed");
            let message = format!("Error: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(page(state.title(), &values, Some(&message), &[])),
            )
                .into_response()
        }
    }
}

async fn predict_json(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Response {
    match answer(&state.predictor, &request) {
        Ok(answer) => Json(answer).into_response(),
        Err(err) => {
            error!(error = %err, "prediction failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}
