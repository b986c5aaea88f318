use miette::Diagnostic;
use thiserror::Error;

/// Main error type for arbiter operations
#[derive(Error, Diagnostic, Debug)]
pub enum ArbiterError {
    #[error("IO error: {0}")]
    #[diagnostic(code(arbiter::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(arbiter::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(arbiter::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(arbiter::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Archive error: {0}")]
    #[diagnostic(code(arbiter::archive))]
    Archive(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    #[diagnostic(code(arbiter::json))]
    Json(#[from] serde_json::Error),

    #[error("Export error: {message}")]
    #[diagnostic(code(arbiter::export))]
    Export {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl ArbiterError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<std::path::PathBuf>, context: &str, err: std::io::Error) -> Self {
        ArbiterError::Io {
            path: path.into(),
            message: format!("{}: {}", context, err),
        }
    }
}

pub type Result<T> = std::result::Result<T, ArbiterError>;
