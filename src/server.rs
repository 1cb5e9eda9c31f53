use std::{net::Ipv4Addr, sync::Arc};

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    serve,
};
use eyre::Result;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, signal};

use crate::{
    config::Config,
    context::RoverContext,
    dispatcher::{Command, CommandPayload, Dispatcher},
    hardware::{MotionStatus, MoveOutcome},
    misc::serde::deserialise_lenient_string,
    speech::Emotion,
};

const READY_MESSAGE: &str = "StoryRover Pi is ready!";
const TEST_SPEECH: &str = "Testing speech synthesis";
const TEST_ZONE: &str = "center";

/// Brings up the peripherals and serves the HTTP API until Ctrl-C.
pub async fn launch(config: Config) -> Result<()> {
    let port = config.server.port;
    tracing::info!("\n{config}");

    let context = RoverContext::connect(&config).await;
    let app = create_router(Dispatcher::new(&config, context));

    let socket = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await?;

    tracing::info!("Listening on http://0.0.0.0:{port}");
    serve(socket, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutting down");
}

/* === Router === */

pub struct AppState {
    pub dispatcher: Dispatcher,
}

pub fn create_router(dispatcher: Dispatcher) -> Router {
    let state = Arc::new(AppState { dispatcher });

    Router::new()
        .route("/health", get(health))
        .route("/command", post(command))
        .route("/test-movement", post(test_movement))
        .route("/test-speech", post(test_speech))
        .route("/motion", get(motion))
        .with_state(state)
}

/* == Health == */

#[derive(Serialize)]
struct HealthResponse {
    message: &'static str,
    arduino_connected: bool,
    elevenlabs_enabled: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> StandardResponse<HealthResponse> {
    let health = state.dispatcher.health();

    StandardResponse::Ok(HealthResponse {
        message: READY_MESSAGE,
        arduino_connected: health.hardware_connected,
        elevenlabs_enabled: health.speech_enabled,
    })
}

/* == Command == */

#[derive(Serialize)]
struct CommandResponse {
    message: String,
    moved: bool,
    spoke: bool,
}

#[tracing::instrument(skip_all)]
async fn command(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CommandPayload>, JsonRejection>,
) -> StandardResponse<CommandResponse> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection.into(),
    };

    let outcome = state.dispatcher.handle(Command::from(payload)).await;

    StandardResponse::Success(CommandResponse {
        message: format!("Executed command for {} zone", outcome.zone),
        moved: outcome.moved,
        spoke: outcome.spoke,
    })
}

/* == Manual triggers == */

#[derive(Deserialize)]
struct TestMovementPayload {
    #[serde(default, deserialize_with = "deserialise_lenient_string")]
    zone: Option<String>,
}

#[derive(Serialize)]
struct TestMovementResponse {
    zone: String,
    outcome: MoveOutcome,
}

#[tracing::instrument(skip_all)]
async fn test_movement(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TestMovementPayload>, JsonRejection>,
) -> StandardResponse<TestMovementResponse> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection.into(),
    };

    let zone = payload.zone.unwrap_or_else(|| TEST_ZONE.to_owned());
    let outcome = state.dispatcher.move_to_zone(&zone).await;

    StandardResponse::Success(TestMovementResponse { zone, outcome })
}

#[derive(Deserialize)]
struct TestSpeechPayload {
    #[serde(default, deserialize_with = "deserialise_lenient_string")]
    text: Option<String>,
}

#[derive(Serialize)]
struct TestSpeechResponse {
    spoke: bool,
}

#[tracing::instrument(skip_all)]
async fn test_speech(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TestSpeechPayload>, JsonRejection>,
) -> StandardResponse<TestSpeechResponse> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection.into(),
    };

    let text = payload.text.unwrap_or_else(|| TEST_SPEECH.to_owned());
    let spoke = state.dispatcher.speak(&text, Emotion::Neutral).await;

    StandardResponse::Success(TestSpeechResponse { spoke })
}

/* == Motion == */

async fn motion(State(state): State<Arc<AppState>>) -> Json<MotionStatus> {
    Json(state.dispatcher.motion_status())
}

/* == Types == */

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum StandardResponse<T = ()> {
    Ok(T),
    Success(T),
    Error { message: String },
}

impl<T> From<JsonRejection> for StandardResponse<T> {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        tracing::warn!("Rejected request: {message}");

        StandardResponse::Error { message }
    }
}

impl<T: Serialize> IntoResponse for StandardResponse<T> {
    fn into_response(self) -> axum::response::Response {
        match self {
            StandardResponse::Error { .. } => (StatusCode::INTERNAL_SERVER_ERROR, Json(self)),
            _ => (StatusCode::OK, Json(self)),
        }
        .into_response()
    }
}
