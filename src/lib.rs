pub mod config;
pub mod document;
pub mod duration;
pub mod export;
pub mod facts;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod portfolio;
pub mod scoring;
pub mod task;

pub use config::{AuditConfig, ConfigError, CostProjection, EmptyDocumentPolicy, StatusPolicy};
pub use document::{ParseError, ScheduleDocument};
pub use duration::{DurationError, work_days};
pub use export::{
    ExportError, load_config_from_json, load_report_from_json, save_config_to_json,
    save_report_to_csv, save_report_to_json,
};
pub use facts::{ExtractionWarning, ProjectFacts};
pub use portfolio::{
    PortfolioReport, PortfolioRow, PortfolioSummary, ProjectDocument, ProjectStatus,
    RejectedDocument, audit_portfolio, label_from_file_name,
};
pub use scoring::IntegrityScore;
pub use task::{RawEstimate, TaskRecord};
