use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub grading: GradingConfig,
    pub ypareo: YpareoConfig,
    pub converter: ConverterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Report (DOCX) and merge (XLSX) templates named by the layouts file.
    pub templates_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingConfig {
    pub layouts_path: PathBuf,
    /// JSON object mapping `ECTS{i}` to a credit value.
    pub credits_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YpareoConfig {
    pub base_url: String,
    pub api_token: String,
    pub period_code: String,
    /// Absence window, `dd-mm-YYYY`.
    pub absences_from: String,
    pub absences_to: String,
    /// Target folder (`codeRepertoire`) of imported documents.
    pub document_directory: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    pub program: String,
    /// Arguments placed before `--outdir <dir> <file>`.
    pub args: Vec<String>,
    pub timeout_seconds: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("BULLETIN").separator("__"));

        config.build()?.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                max_request_size: 64 * 1024 * 1024, // 64MB
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
                file_path: None,
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("uploads"),
                output_dir: PathBuf::from("output"),
                templates_dir: PathBuf::from("templates"),
            },
            grading: GradingConfig {
                layouts_path: PathBuf::from("config/layouts.yaml"),
                credits_path: PathBuf::from("config/credits.json"),
            },
            ypareo: YpareoConfig {
                base_url: "https://espi.ymag.cloud/index.php".to_string(),
                api_token: String::new(),
                period_code: "2".to_string(),
                absences_from: "01-01-2023".to_string(),
                absences_to: "31-12-2024".to_string(),
                document_directory: "1000011".to_string(),
                timeout_seconds: 60,
            },
            converter: ConverterConfig {
                program: "soffice".to_string(),
                args: vec![
                    "--headless".to_string(),
                    "--convert-to".to_string(),
                    "pdf".to_string(),
                ],
                timeout_seconds: 120,
            },
        }
    }
}
