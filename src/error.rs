//! Unified error hierarchy for pilothealth
//!
//! Service operations return [`PilotHealthError`]. The metrics engine itself
//! never fails; everything here belongs to the storage and request layers.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all pilothealth operations
#[derive(Debug, Error)]
pub enum PilotHealthError {
    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested record does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    /// Caller lacks the role or ownership required
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Payload serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Export errors
    #[error("Export failed to {path}: {reason}")]
    Export { path: PathBuf, reason: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Kinds of records a lookup can miss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Complaint,
    Notification,
    Base,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::User => write!(f, "User"),
            Entity::Complaint => write!(f, "Complaint"),
            Entity::Notification => write!(f, "Notification"),
            Entity::Base => write!(f, "Base"),
        }
    }
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Underlying SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection could not be opened
    #[error("Database connection failed: {reason}")]
    ConnectionFailed { reason: String },

    /// A stored value could not be decoded
    #[error("Corrupt value in {column}: {value}")]
    CorruptValue { column: String, value: String },

    /// Unique constraint hit
    #[error("Duplicate entry: {table}.{key}")]
    Duplicate { table: String, key: String },
}

/// Result type alias for pilothealth operations
pub type Result<T> = std::result::Result<T, PilotHealthError>;

impl From<rusqlite::Error> for PilotHealthError {
    fn from(err: rusqlite::Error) -> Self {
        PilotHealthError::Database(DatabaseError::Sqlite(err))
    }
}

impl PilotHealthError {
    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        PilotHealthError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            PilotHealthError::Database(DatabaseError::ConnectionFailed { .. }) => true,
            PilotHealthError::Database(DatabaseError::Sqlite(err)) => matches!(
                err.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
            ),
            PilotHealthError::Io(_) => true,
            _ => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PilotHealthError::NotFound { .. } => ErrorSeverity::Warning,
            PilotHealthError::Validation(_) => ErrorSeverity::Warning,
            PilotHealthError::Forbidden(_) => ErrorSeverity::Warning,
            PilotHealthError::Database(DatabaseError::Duplicate { .. }) => ErrorSeverity::Warning,
            PilotHealthError::Database(_) => ErrorSeverity::Error,
            PilotHealthError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Message suitable for showing to the end user
    pub fn user_message(&self) -> String {
        match self {
            PilotHealthError::NotFound {
                entity: Entity::Complaint,
                ..
            } => "Queixa não encontrada.".to_string(),
            PilotHealthError::NotFound {
                entity: Entity::User,
                ..
            } => "Usuário não encontrado.".to_string(),
            PilotHealthError::NotFound {
                entity: Entity::Notification,
                ..
            } => "Notificação não encontrada.".to_string(),
            PilotHealthError::NotFound {
                entity: Entity::Base,
                ..
            } => "Base não encontrada.".to_string(),
            PilotHealthError::Forbidden(_) => "Acesso negado.".to_string(),
            PilotHealthError::Validation(reason) => reason.clone(),
            PilotHealthError::Database(DatabaseError::ConnectionFailed { .. }) => {
                "Não foi possível conectar ao banco de dados.".to_string()
            }
            _ => "Erro interno do servidor.".to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
