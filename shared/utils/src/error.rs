use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum BulletinError {
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("No matching template found")]
    NoMatchingTemplate { signal: String },

    #[error("Unexpected API response format: {message}")]
    UnexpectedResponse { message: String },

    #[error("Spreadsheet error: {message}")]
    Spreadsheet { message: String },

    #[error("Template rendering error: {message}")]
    Template { message: String },

    #[error("Document conversion error: {message}")]
    Conversion { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("External service error: {service} - {message}")]
    ExternalService {
        service: String,
        status: Option<u16>,
        message: String,
    },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl BulletinError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn no_matching_template(signal: impl Into<String>) -> Self {
        Self::NoMatchingTemplate {
            signal: signal.into(),
        }
    }

    pub fn unexpected_response(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }

    pub fn spreadsheet(message: impl Into<String>) -> Self {
        Self::Spreadsheet {
            message: message.into(),
        }
    }

    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn external_service(
        service: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::ExternalService {
            service: service.into(),
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NoMatchingTemplate { .. } => "NO_MATCHING_TEMPLATE",
            Self::UnexpectedResponse { .. } => "UNEXPECTED_RESPONSE",
            Self::Spreadsheet { .. } => "SPREADSHEET_ERROR",
            Self::Template { .. } => "TEMPLATE_ERROR",
            Self::Conversion { .. } => "CONVERSION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Input errors abort the batch with 400, everything unexpected is a 500.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NoMatchingTemplate { .. } => 400,
            Self::UnexpectedResponse { .. } => 400,
            Self::Spreadsheet { .. } => 400,
            Self::Template { .. } => 500,
            Self::Conversion { .. } => 500,
            Self::Configuration { .. } => 500,
            Self::ExternalService { .. } => 502,
            Self::Io { .. } => 500,
            Self::Internal { .. } => 500,
        }
    }
}

pub type BulletinResult<T> = Result<T, BulletinError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<BulletinError> for ErrorResponse {
    fn from(error: BulletinError) -> Self {
        let details = match &error {
            BulletinError::NoMatchingTemplate { signal } => {
                Some(serde_json::json!({ "signal": signal }))
            }
            BulletinError::ExternalService {
                status: Some(status),
                ..
            } => Some(serde_json::json!({ "status": status })),
            _ => None,
        };
        Self {
            error: error.error_code().to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
            details,
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for BulletinError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

impl From<reqwest::Error> for BulletinError {
    fn from(error: reqwest::Error) -> Self {
        Self::external_service("Yparéo", error.status().map(|s| s.as_u16()), error.to_string())
    }
}

impl From<serde_yaml::Error> for BulletinError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::configuration(error.to_string())
    }
}

impl From<zip::result::ZipError> for BulletinError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::template(error.to_string())
    }
}
