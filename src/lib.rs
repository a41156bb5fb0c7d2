use thiserror::Error;

pub type Result<T> = std::result::Result<T, HbkError>;

#[derive(Error, Debug)]
pub enum HbkError {
    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Failed to load input data: {0}")]
    Load(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod archive;
pub mod commands;
pub mod config;
pub mod context;
pub mod corpus;
pub mod export;
pub mod extractor;
pub mod selector;
pub mod validate;
