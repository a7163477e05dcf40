use super::{ExportError, ExportResult};
use crate::{AuditConfig, PortfolioReport, PortfolioRow};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

pub fn save_report_to_json<P: AsRef<Path>>(report: &PortfolioReport, path: P) -> ExportResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

pub fn load_report_from_json<P: AsRef<Path>>(path: P) -> ExportResult<PortfolioReport> {
    let file = File::open(path)?;
    let report: PortfolioReport = serde_json::from_reader(file)?;
    if report.summary.project_count != report.rows.len() {
        return Err(ExportError::InvalidData(format!(
            "summary counts {} projects but report holds {} rows",
            report.summary.project_count,
            report.rows.len()
        )));
    }
    Ok(report)
}

pub fn save_config_to_json<P: AsRef<Path>>(config: &AuditConfig, path: P) -> ExportResult<()> {
    config
        .validate()
        .map_err(|err| ExportError::InvalidData(err.to_string()))?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;
    Ok(())
}

pub fn load_config_from_json<P: AsRef<Path>>(path: P) -> ExportResult<AuditConfig> {
    let file = File::open(path)?;
    let config: AuditConfig = serde_json::from_reader(file)?;
    config
        .validate()
        .map_err(|err| ExportError::InvalidData(err.to_string()))?;
    Ok(config)
}

const CSV_HEADER: [&str; 16] = [
    "project",
    "manager",
    "spi",
    "cpi",
    "recoverable_investment",
    "score",
    "replanned",
    "percent_complete",
    "status",
    "task_count",
    "pert_error_count",
    "low_confidence",
    "warnings",
    "expected_days",
    "fixed_cost",
    "projected_cost",
];

#[derive(Serialize)]
struct RowCsvRecord {
    project: String,
    manager: String,
    spi: String,
    cpi: String,
    recoverable_investment: String,
    score: String,
    replanned: String,
    percent_complete: String,
    status: String,
    task_count: usize,
    pert_error_count: usize,
    low_confidence: bool,
    warnings: String,
    expected_days: String,
    fixed_cost: String,
    projected_cost: String,
}

impl From<&PortfolioRow> for RowCsvRecord {
    fn from(row: &PortfolioRow) -> Self {
        RowCsvRecord {
            project: row.name.clone(),
            manager: row.manager.clone(),
            spi: format!("{:.2}", row.spi),
            cpi: format!("{:.2}", row.cpi),
            recoverable_investment: format!("{:.2}", row.recoverable_investment),
            score: row.score.to_string(),
            replanned: row.replan_label(),
            percent_complete: format!("{:.1}", row.percent_complete),
            status: row.status.as_str().to_string(),
            task_count: row.task_count,
            pert_error_count: row.pert_error_count,
            low_confidence: row.low_confidence,
            warnings: join_strings(&row.warnings),
            expected_days: format!("{:.2}", row.expected_duration_days),
            fixed_cost: format!("{:.2}", row.total_fixed_cost),
            projected_cost: row
                .projected_cost
                .map(|cost| format!("{cost:.2}"))
                .unwrap_or_default(),
        }
    }
}

/// One line per project, indices rounded to two decimals as shown in the
/// consolidated table.
pub fn save_report_to_csv<P: AsRef<Path>>(report: &PortfolioReport, path: P) -> ExportResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    if report.rows.is_empty() {
        writer.write_record(CSV_HEADER)?;
    }
    for row in &report.rows {
        writer.serialize(RowCsvRecord::from(row))?;
    }
    writer.flush()?;
    Ok(())
}

fn join_strings(values: &[String]) -> String {
    values.join(";")
}
