use crate::domain::model::{ErrorKind, ScanStage};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Camera or image access was denied: {message}")]
    PermissionDenied { message: String },

    #[error("Image acquisition was cancelled by the user")]
    UserCancelled,

    #[error("Network request failed: {message}")]
    Network { message: String },

    #[error("Remote service error {code}: {message}")]
    Service { code: u16, message: String },

    #[error("{stage} did not finish within {timeout:?}")]
    Timeout { stage: ScanStage, timeout: Duration },

    #[error("A scan is already in progress")]
    Busy,

    #[error("Image '{source_ref}' cannot be used: {reason}")]
    InvalidImage { source_ref: String, reason: String },

    #[error("No allergy profile stored for user '{user_id}'")]
    ProfileNotFound { user_id: String },

    #[error("Invalid user id '{user_id}'")]
    InvalidUserId { user_id: String },

    #[error("Unknown allergen '{name}'")]
    UnknownAllergen { name: String },

    #[error("Configuration validation error in field '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid configuration value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    RemoteService,
    Storage,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScanError {
    /// The request URL carries the API key, so it is stripped from the message.
    pub fn network(err: reqwest::Error) -> Self {
        ScanError::Network {
            message: err.without_url().to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::ConfigValidationError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ScanError::PermissionDenied { .. }
            | ScanError::UserCancelled
            | ScanError::InvalidImage { .. }
            | ScanError::InvalidUserId { .. }
            | ScanError::UnknownAllergen { .. } => ErrorCategory::Input,
            ScanError::Network { .. } | ScanError::Timeout { .. } => ErrorCategory::Network,
            ScanError::Service { .. } => ErrorCategory::RemoteService,
            ScanError::ProfileNotFound { .. } | ScanError::IoError(_) => ErrorCategory::Storage,
            ScanError::Busy | ScanError::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ScanError::UserCancelled => ErrorSeverity::Low,
            ScanError::Network { .. }
            | ScanError::Timeout { .. }
            | ScanError::Service { .. }
            | ScanError::Busy => ErrorSeverity::Medium,
            ScanError::PermissionDenied { .. }
            | ScanError::InvalidImage { .. }
            | ScanError::ProfileNotFound { .. }
            | ScanError::InvalidUserId { .. }
            | ScanError::UnknownAllergen { .. }
            | ScanError::ConfigValidationError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::MissingConfigError { .. } => ErrorSeverity::High,
            ScanError::IoError(_) | ScanError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    /// Collapses the error into the kind reported by the scan state machine.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            ScanError::UserCancelled => ErrorKind::UserCancelled,
            ScanError::Network { .. } => ErrorKind::NetworkError,
            ScanError::Service { code, message } => ErrorKind::ServiceError {
                code: *code,
                message: message.clone(),
            },
            ScanError::Timeout { stage, .. } => ErrorKind::TimeoutError { stage: *stage },
            other => ErrorKind::Internal {
                message: other.to_string(),
            },
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScanError::ProfileNotFound { user_id } => {
                format!("No allergy profile found for '{}'.", user_id)
            }
            ScanError::UnknownAllergen { name } => format!(
                "'{}' is not a tracked allergen (milk, peanuts, gluten, eggs, soy).",
                name
            ),
            ScanError::ConfigValidationError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::MissingConfigError { .. } => {
                format!("The configuration is invalid: {}", self)
            }
            ScanError::Busy => "Another scan is still running.".to_string(),
            other => other.kind().user_message(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the configuration file and the environment variables it references"
            }
            ErrorCategory::Input => "Check the image path, user id and allergen names",
            ErrorCategory::Network => "Check your internet connection and try again",
            ErrorCategory::RemoteService => {
                "The recognition service rejected the request; verify the API key and quota"
            }
            ErrorCategory::Storage => "Check that the profile directory exists and is readable",
            ErrorCategory::Internal => "Wait for the running scan to finish and retry",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
