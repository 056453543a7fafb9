use axum::{
    extract::{Multipart, State},
    response::Json,
};
use serde::Serialize;

use super::{collect_files, take_file};
use crate::error::ApiError;
use crate::merge::MergeSummary;
use crate::pipeline;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MergeResponse {
    pub message: String,
    pub layout: String,
    pub file: String,
    pub summary: MergeSummary,
}

pub async fn merge_spreadsheet(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MergeResponse>, ApiError> {
    let mut files = collect_files(&mut multipart).await?;
    let excel = take_file(&mut files, "excel_file")?;
    let word = take_file(&mut files, "word_file")?;

    let merged = pipeline::merge(&state, excel, word).await?;

    Ok(Json(MergeResponse {
        message: "Fichier fusionné avec succès".to_string(),
        layout: merged.layout,
        file: merged.path.display().to_string(),
        summary: merged.summary,
    }))
}
