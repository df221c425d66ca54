//! voicegate server library logic.

pub mod api;
pub mod api_stt;
pub mod api_tts;
pub mod api_voices;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use config::Config;
use middleware::RateLimiter;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use voicegate_voice::{VoiceEngine, MAX_STT_INPUT_BYTES};

/// Application state shared across all request handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Voice registry, prompt cache and model runtimes.
    pub engine: Arc<VoiceEngine>,
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Rate limiter state.
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Builds state with a rate limiter sized from `config.rate_limit`.
    pub fn new(engine: Arc<VoiceEngine>, config: Config) -> Self {
        let rate_limiter =
            RateLimiter::new(config.rate_limit.requests, config.rate_limit.window());
        Self {
            engine,
            config: Arc::new(config),
            rate_limiter,
        }
    }
}

/// Maximum JSON request body size (1 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Body ceiling for transcription uploads: the audio limit plus room for
/// the multipart framing and text fields.
const MAX_TRANSCRIPTION_BODY_BYTES: usize = MAX_STT_INPUT_BYTES + 64 * 1024;

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let transcription_routes = Router::new()
        .route(
            "/v1/audio/transcriptions",
            post(api_stt::transcription_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_TRANSCRIPTION_BODY_BYTES));

    let routes = Router::new()
        .route("/", get(api::root_handler))
        .route("/health", get(api::health_handler))
        .route("/v1/audio/speech", post(api_tts::speech_handler))
        .route(
            "/v1/voices",
            get(api_voices::list_voices_handler).post(api_voices::create_voice_handler),
        )
        .route("/v1/voices/reload", post(api_voices::reload_voices_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .merge(transcription_routes);

    // Outermost first: state injection, tracing, CORS, auth, then rate limiting.
    routes.layer(
        ServiceBuilder::new()
            .layer(Extension(Arc::new(state)))
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(axum::middleware::from_fn(middleware::auth_middleware))
            .layer(axum::middleware::from_fn(middleware::rate_limit_middleware)),
    )
}
