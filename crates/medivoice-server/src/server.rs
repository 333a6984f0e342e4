//! Axum HTTP surface for the two orchestrator entry points.
//!
//! `POST /api/consult` runs transcription + analysis; `POST /api/speak` is
//! the dependent follow-up that synthesizes voice once the advisory text
//! has been rendered. Uploaded and generated files are transient,
//! per-request, and served from the data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use medivoice_core::config::Config;
use medivoice_core::types::{AudioClip, ImageAsset};
use medivoice_pipeline::Orchestrator;

use crate::state::AppState;

/// Phone photos and voice clips routinely exceed axum's 2 MiB default.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Transient files older than this are swept from the data directory.
const MAX_FILE_AGE: Duration = Duration::from_secs(24 * 60 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Start the HTTP server.
pub async fn start_server(config: Config, port: u16) -> anyhow::Result<()> {
    let bind_addr = config.server_bind();

    let data_dir = config.data_dir();
    let uploads_dir = data_dir.join("uploads");
    let audio_dir = data_dir.join("audio");
    tokio::fs::create_dir_all(&uploads_dir).await?;
    tokio::fs::create_dir_all(&audio_dir).await?;

    let state = Arc::new(AppState {
        orchestrator: Orchestrator::from_config(&config, audio_dir.clone()),
        uploads_dir: uploads_dir.clone(),
    });

    spawn_cleanup(vec![uploads_dir.clone(), audio_dir.clone()]);

    let app = Router::new()
        .route("/api/consult", post(consult_handler))
        .route("/api/speak", post(speak_handler))
        .route("/health", get(health_handler))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .nest_service("/audio", ServeDir::new(audio_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    let addr = format!("{bind_addr}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("MediVoice listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Debug, Serialize)]
struct ConsultResponse {
    transcript: String,
    advisory: String,
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpeakRequest {
    advisory: String,
}

#[derive(Debug, Serialize)]
struct SpeakResponse {
    audio_url: Option<String>,
}

/// First entry point: accepts optional `audio` and `image` multipart file
/// fields, returns the consultation triple.
async fn consult_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ConsultResponse>, (StatusCode, String)> {
    let mut audio: Option<AudioClip> = None;
    let mut image: Option<ImageAsset> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(|f| f.to_string());
        let bytes = field.bytes().await.map_err(multipart_error)?;

        match name.as_str() {
            // An empty audio part is still saved: the transcription
            // adapter owes the zero-byte clip its own fallback message.
            "audio" => {
                let path = save_upload(&state.uploads_dir, file_name.as_deref(), "wav", &bytes)
                    .await
                    .map_err(internal_error)?;
                audio = Some(AudioClip::new(path));
            }
            "image" => {
                if bytes.is_empty() {
                    continue;
                }
                let path = save_upload(&state.uploads_dir, file_name.as_deref(), "jpg", &bytes)
                    .await
                    .map_err(internal_error)?;
                image = Some(ImageAsset::new(path));
            }
            other => {
                warn!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let consultation = state.orchestrator.process_inputs(audio, image).await;

    let image_url = consultation
        .image_path()
        .and_then(|p| p.file_name())
        .map(|n| format!("/uploads/{}", n.to_string_lossy()));

    Ok(Json(ConsultResponse {
        transcript: consultation.transcript,
        advisory: consultation.advisory,
        image_url,
    }))
}

/// Second entry point: synthesize voice for an already-rendered advisory.
async fn speak_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeakRequest>,
) -> Json<SpeakResponse> {
    let audio_url = state
        .orchestrator
        .generate_voice(&req.advisory)
        .await
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .map(|n| format!("/audio/{n}"));

    Json(SpeakResponse { audio_url })
}

async fn health_handler() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    Json(json!({
        "status": "ok",
        "version": version,
    }))
}

/// Persist one uploaded field to a per-request unique file, preserving the
/// declared extension — the image deny-list checks it before any decode.
async fn save_upload(
    dir: &Path,
    original_name: Option<&str>,
    default_ext: &str,
    bytes: &[u8],
) -> anyhow::Result<PathBuf> {
    let ext = original_name
        .and_then(|n| Path::new(n).extension().map(|e| e.to_string_lossy().to_lowercase()))
        .unwrap_or_else(|| default_ext.to_string());

    let ts = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let id = uuid::Uuid::new_v4().simple().to_string();
    let path = dir.join(format!("upload_{ts}_{}.{ext}", &id[..8]));

    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

fn internal_error(e: anyhow::Error) -> (StatusCode, String) {
    warn!(%e, "Upload handling failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "upload failed".into())
}

/// The parse error is logged; the client gets a fixed non-technical body.
fn multipart_error(e: MultipartError) -> (StatusCode, String) {
    warn!(status = %e.status(), detail = %e.body_text(), "Multipart upload rejected");
    (
        e.status(),
        "Unable to read your upload. Please try again with a smaller audio or image file.".into(),
    )
}

/// Periodic sweep of the transient upload/audio directories. Without it
/// every submission leaks its files into the data dir for good.
fn spawn_cleanup(dirs: Vec<PathBuf>) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tick.tick().await;
            for dir in &dirs {
                match sweep_stale_files(dir, MAX_FILE_AGE).await {
                    Ok(0) => {}
                    Ok(removed) => info!(removed, dir = %dir.display(), "Swept stale files"),
                    Err(e) => warn!(%e, dir = %dir.display(), "Sweep failed"),
                }
            }
        }
    });
}

/// Remove regular files older than `max_age`, returning how many went.
async fn sweep_stale_files(dir: &Path, max_age: Duration) -> anyhow::Result<usize> {
    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        let stale = meta
            .modified()
            .ok()
            .and_then(|m| m.elapsed().ok())
            .is_some_and(|age| age >= max_age);
        if stale && tokio::fs::remove_file(entry.path()).await.is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("Failed to install CTRL+C handler");
        return;
    }
    info!("Shutdown signal received");
}
