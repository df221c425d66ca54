//! voicegate server binary: the OpenAI-compatible speech gateway.
//!
//! Starts an axum HTTP server with structured logging, loads the voice
//! manifest, warms the voice prompt cache, and shuts down gracefully on
//! SIGTERM/SIGINT.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use voicegate_server::{app, config, AppState};
use voicegate_voice::{EngineOptions, SttService, TtsService, VoiceEngine, VoiceRegistry};

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("VOICEGATE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("voicegate.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration; the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Voice registry and model runtimes
    let registry = VoiceRegistry::load(&config.voices.directory)
        .expect("failed to load voice manifest; check voices.directory in config");

    let speech = TtsService::from_config(&config.tts);
    let transcriber = SttService::from_config(&config.stt);
    let options = EngineOptions {
        language: config.tts.language.clone(),
        decoding: config.stt.decoding(),
    };
    let engine = Arc::new(VoiceEngine::new(
        registry,
        Arc::new(speech),
        Arc::new(transcriber),
        options,
    ));

    let status = engine.status();
    if !status.tts_base || !status.tts_voice_design {
        tracing::warn!(
            tts_base = status.tts_base,
            tts_voice_design = status.tts_voice_design,
            "TTS model path does not exist; synthesis requests will fail"
        );
    }

    let cached = engine.precompute_prompts().await;
    tracing::info!(
        cached,
        registered = status.voices_registered,
        "voice prompts ready"
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);
    if config.server.api_key().is_none() {
        tracing::warn!("no API key configured; all endpoints are unauthenticated");
    }

    // Build application
    let app = app(AppState::new(engine, config));

    tracing::info!(%addr, "starting voicegate server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    // Serve with graceful shutdown; peer addresses feed the rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");

    tracing::info!("voicegate server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
