use crate::domain::model::{DependencyViolations, ValidationIssue};
use crate::domain::stage::UninstallStage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UninstallError {
    #[error("You cannot run this command because the application is not installed.")]
    ApplicationNotInstalled,

    #[error("{}", render_issues(.0))]
    InvalidModules(Vec<ValidationIssue>),

    #[error("{}", .0.messages().join("\n"))]
    DependencyViolation(DependencyViolations),

    #[error("Code backup failed: {message}")]
    BackupFailure { message: String },

    #[error("Invalid uninstall transition from '{from}' to '{to}'")]
    InvalidTransition {
        from: UninstallStage,
        to: UninstallStage,
    },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Installation,
    Validation,
    Dependency,
    Backup,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl UninstallError {
    pub fn backup(message: impl Into<String>) -> Self {
        Self::BackupFailure {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApplicationNotInstalled => ErrorCategory::Installation,
            Self::InvalidModules(_) => ErrorCategory::Validation,
            Self::DependencyViolation(_) => ErrorCategory::Dependency,
            Self::BackupFailure { .. } | Self::ZipError(_) => ErrorCategory::Backup,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::InvalidTransition { .. } | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Installation | ErrorCategory::Validation => ErrorSeverity::Medium,
            ErrorCategory::Dependency | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Backup | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for the binary.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Installation | ErrorCategory::Validation => 1,
            ErrorCategory::Dependency => 2,
            ErrorCategory::Configuration => 1,
            ErrorCategory::Backup | ErrorCategory::System => 3,
        }
    }

    /// Whether the orchestrator already wrote this error to the transcript.
    pub fn is_reported(&self) -> bool {
        matches!(
            self,
            Self::ApplicationNotInstalled | Self::InvalidModules(_) | Self::DependencyViolation(_)
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::IoError(e) => format!("File system operation failed: {}", e),
            Self::SerializationError(e) => format!("Stored data could not be parsed: {}", e),
            Self::ZipError(e) => format!("Code backup failed: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Installation => "Install the application before uninstalling modules",
            ErrorCategory::Validation => {
                "Check the module names and make sure each one is required in the root composer.json"
            }
            ErrorCategory::Dependency => {
                "Uninstall the dependent modules first, or uninstall them together in one run"
            }
            ErrorCategory::Backup => {
                "Check free disk space and write permissions of the backups directory"
            }
            ErrorCategory::Configuration => "Fix the layout configuration file and try again",
            ErrorCategory::System => "Re-run with --verbose and inspect the log output",
        }
    }
}

pub type Result<T> = std::result::Result<T, UninstallError>;
