use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers::*, AppState};

pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/health/detailed", get(detailed_health_check))
        .nest("/bulletins", bulletin_routes())
        .route("/documents/import/:code_apprenant", post(import_document))
}

fn bulletin_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate_bulletins))
        .route("/generate-and-import", post(generate_and_import_bulletins))
        .route("/merge", post(merge_spreadsheet))
}
