use axum::{
    extract::{Path, State},
    response::Json,
};
use bulletin_models::{ImportDocumentRequest, SisDocument};
use bulletin_utils::{validate_model, BulletinError};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::AppState;

/// Forwards a client-supplied document to a learner's Yparéo file.
pub async fn import_document(
    State(state): State<AppState>,
    Path(code_apprenant): Path<String>,
    Json(request): Json<ImportDocumentRequest>,
) -> Result<Json<Value>, ApiError> {
    if code_apprenant.is_empty() || !code_apprenant.chars().all(|c| c.is_ascii_digit()) {
        return Err(BulletinError::validation("code_apprenant", "must be numeric").into());
    }
    validate_model(&request)?;

    let document = SisDocument::from(request);
    match state.ypareo.import_document(&code_apprenant, &document).await {
        Ok(()) => state.metrics.imports_succeeded.inc(),
        Err(e) => {
            state.metrics.imports_failed.inc();
            return Err(e.into());
        }
    }

    Ok(Json(json!({ "message": "Document imported successfully." })))
}
