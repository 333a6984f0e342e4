//! Shared server state.

use std::path::PathBuf;

use medivoice_pipeline::Orchestrator;

pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Where uploaded audio/image files land, one unique file per request.
    pub uploads_dir: PathBuf,
}
