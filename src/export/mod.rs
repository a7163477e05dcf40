use serde_json::Error as SerdeJsonError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

pub mod file;

pub use file::{
    load_config_from_json, load_report_from_json, save_config_to_json, save_report_to_csv,
    save_report_to_json,
};
