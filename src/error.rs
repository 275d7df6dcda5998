use std::path::PathBuf;

use crate::config::ConfigError;

/// 分析流程的错误类型
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Solver did not converge after {iterations} iterations (max residual {residual:e}): {reason}")]
    SolverDidNotConverge {
        iterations: usize,
        residual: f64,
        reason: String,
    },
    #[error("Insufficient tag data for window {window}: need {required} tags, have {available}")]
    InsufficientTagData {
        window: usize,
        required: usize,
        available: usize,
    },
    #[error("Failed to read recording {path:?} (line {line}): {reason}")]
    SourceReadError {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
