use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootError {
    #[error("home directory not found: set HOME or YOLOBOOT_HOME")]
    HomeNotFound,

    #[error("template directory not found: {}", .0.display())]
    TemplatesMissing(PathBuf),

    #[error("git config {key} failed: {detail}")]
    GitConfig { key: String, detail: String },

    #[error("git not found on PATH")]
    GitNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BootError>;
