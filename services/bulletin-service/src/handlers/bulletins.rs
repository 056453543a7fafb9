use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use std::path::PathBuf;

use super::{collect_files, take_file};
use crate::error::ApiError;
use crate::pipeline::{self, ImportFailure};
use crate::AppState;

pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub message: String,
    pub layout: String,
    pub output_dir: String,
    pub bulletins: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateAndImportResponse {
    pub message: String,
    pub layout: String,
    pub bulletins: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ImportFailure>,
}

fn display_paths(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

/// Export → one PDF report per student
pub async fn generate_bulletins(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<GenerateResponse>, ApiError> {
    let mut files = collect_files(&mut multipart).await?;
    let upload = take_file(&mut files, UPLOAD_FIELD)?;

    let generated = pipeline::generate(&state, upload).await?;

    Ok(Json(GenerateResponse {
        message: "Bulletins PDF générés avec succès".to_string(),
        layout: generated.layout,
        output_dir: generated.output_dir.display().to_string(),
        bulletins: display_paths(&generated.pdfs),
    }))
}

/// Same as generation, then every PDF is imported into Yparéo.
/// Answers 207 when some imports failed.
pub async fn generate_and_import_bulletins(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<GenerateAndImportResponse>), ApiError> {
    let mut files = collect_files(&mut multipart).await?;
    let upload = take_file(&mut files, UPLOAD_FIELD)?;

    let report = pipeline::generate_and_import(&state, upload).await?;

    let (status, message) = if report.failures.is_empty() {
        (StatusCode::OK, "Bulletins PDF generated and imported successfully")
    } else {
        (
            StatusCode::MULTI_STATUS,
            "Bulletins PDF generated, but some failed to import",
        )
    };

    Ok((
        status,
        Json(GenerateAndImportResponse {
            message: message.to_string(),
            layout: report.generated.layout,
            bulletins: display_paths(&report.generated.pdfs),
            errors: report.failures,
        }),
    ))
}
