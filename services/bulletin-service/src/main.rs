//! Bulletin Service
//!
//! HTTP front of the report-card workflows: generation of PDF reports from a
//! grade export, their import into Yparéo, and the spreadsheet merge.

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, Method},
    response::Json,
    routing::get,
    serve, Router,
};
use bulletin_utils::{init_logging, AppConfig, BulletinError, BulletinResult, LayoutRegistry};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

mod converter;
mod error;
mod handlers;
mod merge;
mod metrics;
mod middleware;
mod pdf_processor;
mod pipeline;
mod remarks;
mod renderer;
mod routes;
mod ypareo_client;

use converter::DocumentConverter;
use metrics::Metrics;
use middleware::*;
use renderer::DocxRenderer;
use ypareo_client::YpareoClient;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({}), using defaults", e);
        AppConfig::default()
    });

    init_logging(&config.logging)?;
    info!("Starting bulletin service");

    let layouts = LayoutRegistry::load(&config.grading.layouts_path)?;
    let state = AppState::new(config.clone(), layouts)?;
    let app = create_app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Bulletin service listening on {}", addr);

    serve(listener, app).await?;

    Ok(())
}

fn create_app(state: AppState) -> Router {
    let body_limit = state.config.server.max_request_size;

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest("/api/v1", routes::create_api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST])
                        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
                )
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(axum::middleware::from_fn(error_handling_middleware)),
        )
        .with_state(state)
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub layouts: Arc<LayoutRegistry>,
    pub renderer: Arc<DocxRenderer>,
    pub converter: Arc<DocumentConverter>,
    pub ypareo: Arc<YpareoClient>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: AppConfig, layouts: LayoutRegistry) -> BulletinResult<Self> {
        let metrics = Metrics::new()
            .map_err(|e| BulletinError::internal(format!("Metrics registry: {}", e)))?;

        Ok(Self {
            layouts: Arc::new(layouts),
            renderer: Arc::new(DocxRenderer::new()?),
            converter: Arc::new(DocumentConverter::new(&config.converter)),
            ypareo: Arc::new(YpareoClient::new(&config.ypareo)?),
            metrics,
            config,
        })
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "bulletin-service",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.encode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    const YAML: &str = r#"
layouts:
  - key: M1_S1_MAPI
    program: MAPI
    semester: S1
    filenames: [M1_S1_MAPI.xlsx]
    report_template: M1_S1_MAPI.docx
    export_titles: ["UE 1 – Economie & Gestion", "Finance Immobilière"]
    units: [{ name: UE1, header: 0, subjects: [1] }]
    subjects: [{ header: 1, column: 3 }]
"#;
    const BOUNDARY: &str = "bulletin-test-boundary";

    fn test_app(dir: &std::path::Path) -> Router {
        let mut config = AppConfig::default();
        config.storage.upload_dir = dir.join("uploads");
        config.storage.output_dir = dir.join("output");
        config.storage.templates_dir = dir.join("templates");
        config.grading.credits_path = dir.join("credits.json");
        config.ypareo.base_url = "http://127.0.0.1:9".to_string();
        std::fs::write(&config.grading.credits_path, r#"{"ECTS1": 3}"#).unwrap();

        let layouts = LayoutRegistry::from_yaml_str(YAML).unwrap();
        create_app(AppState::new(config, layouts).unwrap())
    }

    fn multipart(field: &str, filename: &str, data: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"{n}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            b = BOUNDARY,
            f = field,
            n = filename
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/bulletins/generate")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "bulletin-service");
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(REQUEST_ID_HEADER, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "abc-123");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("bulletins_rendered_total"));
    }

    #[tokio::test]
    async fn test_generate_requires_file_field() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(multipart("other", "export.xlsx", b"x"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_generate_rejects_unreadable_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(multipart("file", "export.xlsx", b"not a workbook"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "SPREADSHEET_ERROR");
        assert!(dir.path().join("uploads/export.xlsx").exists());
    }

    #[tokio::test]
    async fn test_merge_requires_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = multipart("excel_file", "export.xlsx", b"x");
        *request.uri_mut() = "/api/v1/bulletins/merge".parse().unwrap();

        let response = test_app(dir.path()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["message"].as_str().unwrap().contains("word_file"));
    }

    #[tokio::test]
    async fn test_import_validates_input() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let request = |code: &str, body: Value| {
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/documents/import/{}", code))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        };
        let valid = json!({
            "contenu": "JVBERi0=",
            "nomDocument": "bulletin.pdf",
            "mimeType": "application/pdf",
            "extension": "pdf"
        });

        let response = app.clone().oneshot(request("abc", valid.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut empty = valid;
        empty["contenu"] = json!("");
        let response = app.oneshot(request("69992", empty)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
