use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn detailed_health_check(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    let mut health_status = json!({
        "status": "healthy",
        "service": "bulletin-service",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {}
    });

    let layouts_status = if state.layouts.is_empty() { "unhealthy" } else { "healthy" };
    health_status["checks"]["layouts"] = json!({
        "status": layouts_status,
        "count": state.layouts.len(),
    });

    health_status["checks"]["templates"] = path_check(&config.storage.templates_dir);
    health_status["checks"]["credits"] = path_check(&config.grading.credits_path);

    health_status["checks"]["ypareo"] = if config.ypareo.api_token.is_empty() {
        json!({"status": "unhealthy", "message": "No API token configured"})
    } else {
        json!({"status": "healthy", "message": config.ypareo.base_url})
    };

    let all_healthy = health_status["checks"]
        .as_object()
        .map_or(true, |checks| checks.values().all(|check| check["status"] == "healthy"));

    if !all_healthy {
        health_status["status"] = json!("degraded");
    }

    Json(health_status)
}

fn path_check(path: &std::path::Path) -> Value {
    if path.exists() {
        json!({"status": "healthy", "message": path.display().to_string()})
    } else {
        json!({"status": "unhealthy", "message": format!("{} not found", path.display())})
    }
}
