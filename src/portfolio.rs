use crate::config::{AuditConfig, EmptyDocumentPolicy, StatusPolicy};
use crate::facts::ProjectFacts;
use crate::scoring::IntegrityScore;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

pub const CRITICAL_SPI: f64 = 0.8;
pub const ALERT_SPI: f64 = 0.9;
pub const CRITICAL_SCORE: u8 = 5;
pub const ALERT_SCORE: u8 = 8;

/// One uploaded schedule export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ProjectDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Builds a document whose display name is derived from `file_name`.
    pub fn from_upload(file_name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(label_from_file_name(file_name), bytes)
    }

    pub fn read<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_upload(&file_name, bytes))
    }
}

/// Display label for a report row: extension stripped, upper-cased.
pub fn label_from_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    stem.to_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    Completed,
    Critical,
    Alert,
    Healthy,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Critical => "Critical",
            ProjectStatus::Alert => "Alert",
            ProjectStatus::Healthy => "Healthy",
        }
    }

    pub fn classify(
        policy: StatusPolicy,
        spi: f64,
        cpi: f64,
        percent_complete: f64,
        score: IntegrityScore,
    ) -> Self {
        if spi >= 1.0 && cpi >= 1.0 && percent_complete == 100.0 {
            return ProjectStatus::Completed;
        }
        let (critical, alert) = match policy {
            StatusPolicy::SpiOnly => (spi < CRITICAL_SPI, spi < ALERT_SPI),
            StatusPolicy::SpiAndIntegrity => (
                spi < CRITICAL_SPI || score.value() < CRITICAL_SCORE,
                spi < ALERT_SPI || score.value() < ALERT_SCORE,
            ),
        };
        if critical {
            ProjectStatus::Critical
        } else if alert {
            ProjectStatus::Alert
        } else {
            ProjectStatus::Healthy
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schedule performance index. Without planned value, a finished project is
/// on schedule and anything else is not.
pub fn schedule_performance_index(facts: &ProjectFacts) -> f64 {
    if facts.planned_value > 0.0 {
        facts.earned_value / facts.planned_value
    } else if facts.percent_complete == 100.0 {
        1.0
    } else {
        0.0
    }
}

pub fn cost_performance_index(facts: &ProjectFacts) -> f64 {
    if facts.actual_cost > 0.0 {
        facts.earned_value / facts.actual_cost
    } else {
        1.0
    }
}

pub fn recoverable_investment(facts: &ProjectFacts) -> f64 {
    (facts.planned_value - facts.earned_value).max(0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRow {
    pub name: String,
    pub manager: String,
    pub spi: f64,
    pub cpi: f64,
    pub recoverable_investment: f64,
    pub score: IntegrityScore,
    pub baselines: usize,
    pub baseline_replanned: bool,
    pub percent_complete: f64,
    pub status: ProjectStatus,
    pub task_count: usize,
    pub pert_error_count: usize,
    /// Sum of PERT expected task durations, in work days.
    #[serde(default)]
    pub expected_duration_days: f64,
    #[serde(default)]
    pub total_fixed_cost: f64,
    /// Burn at the configured daily rate over `expected_duration_days`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected_cost: Option<f64>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub low_confidence: bool,
}

impl PortfolioRow {
    pub fn from_facts(name: impl Into<String>, facts: &ProjectFacts, config: &AuditConfig) -> Self {
        let spi = schedule_performance_index(facts);
        let cpi = cost_performance_index(facts);
        let score = IntegrityScore::of(facts);
        let expected_duration_days = facts.expected_duration_days();
        Self {
            name: name.into(),
            manager: facts.manager.clone(),
            spi,
            cpi,
            recoverable_investment: recoverable_investment(facts),
            score,
            baselines: facts.baseline_count,
            baseline_replanned: facts.baseline_count > 1,
            percent_complete: facts.percent_complete,
            status: ProjectStatus::classify(
                config.status_policy,
                spi,
                cpi,
                facts.percent_complete,
                score,
            ),
            task_count: facts.task_count(),
            pert_error_count: facts.pert_error_count,
            expected_duration_days,
            total_fixed_cost: facts.total_fixed_cost(),
            projected_cost: config
                .cost_projection
                .map(|projection| projection.projected_cost(expected_duration_days)),
            warnings: facts.warnings.iter().map(ToString::to_string).collect(),
            low_confidence: facts.tasks.is_empty() || !facts.warnings.is_empty(),
        }
    }

    /// `"Yes (N)"` when the project was re-baselined, otherwise `"No"`.
    pub fn replan_label(&self) -> String {
        if self.baseline_replanned {
            format!("Yes ({})", self.baselines)
        } else {
            "No".to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedDocument {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub completed: usize,
    pub critical: usize,
    pub alert: usize,
    pub healthy: usize,
}

impl StatusCounts {
    fn record(&mut self, status: ProjectStatus) {
        match status {
            ProjectStatus::Completed => self.completed += 1,
            ProjectStatus::Critical => self.critical += 1,
            ProjectStatus::Alert => self.alert += 1,
            ProjectStatus::Healthy => self.healthy += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub project_count: usize,
    pub total_recoverable_investment: f64,
    pub mean_spi: f64,
    pub mean_cpi: f64,
    pub low_integrity_count: usize,
    pub status_counts: StatusCounts,
    pub rejected_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_daily_rate: Option<f64>,
}

impl PortfolioSummary {
    pub fn from_rows(rows: &[PortfolioRow], rejected_count: usize, config: &AuditConfig) -> Self {
        let mut summary = PortfolioSummary {
            project_count: rows.len(),
            rejected_count,
            effective_daily_rate: config.cost_projection.map(|p| p.effective_rate()),
            ..PortfolioSummary::default()
        };
        for row in rows {
            summary.total_recoverable_investment += row.recoverable_investment;
            summary.mean_spi += row.spi;
            summary.mean_cpi += row.cpi;
            if row.score.value() < config.low_integrity_threshold {
                summary.low_integrity_count += 1;
            }
            summary.status_counts.record(row.status);
        }
        if !rows.is_empty() {
            summary.mean_spi /= rows.len() as f64;
            summary.mean_cpi /= rows.len() as f64;
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub generated_at: DateTime<Utc>,
    pub policy: StatusPolicy,
    pub rows: Vec<PortfolioRow>,
    pub summary: PortfolioSummary,
    #[serde(default)]
    pub rejected: Vec<RejectedDocument>,
}

impl PortfolioReport {
    /// Rows by SPI, highest first. Ties keep upload order.
    pub fn ranked_by_spi(&self) -> Vec<&PortfolioRow> {
        let mut ranked: Vec<&PortfolioRow> = self.rows.iter().collect();
        ranked.sort_by(|a, b| b.spi.total_cmp(&a.spi));
        ranked
    }

    /// Rows by integrity score, highest first. Ties keep upload order.
    pub fn ranked_by_score(&self) -> Vec<&PortfolioRow> {
        let mut ranked: Vec<&PortfolioRow> = self.rows.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let rows = &self.rows;
        df!(
            "project" => rows.iter().map(|r| r.name.clone()).collect::<Vec<_>>(),
            "manager" => rows.iter().map(|r| r.manager.clone()).collect::<Vec<_>>(),
            "spi" => rows.iter().map(|r| r.spi).collect::<Vec<_>>(),
            "cpi" => rows.iter().map(|r| r.cpi).collect::<Vec<_>>(),
            "recoverable_investment" => rows.iter().map(|r| r.recoverable_investment).collect::<Vec<_>>(),
            "score" => rows.iter().map(|r| r.score.to_string()).collect::<Vec<_>>(),
            "replanned" => rows.iter().map(PortfolioRow::replan_label).collect::<Vec<_>>(),
            "status" => rows.iter().map(|r| r.status.as_str()).collect::<Vec<_>>(),
            "expected_days" => rows.iter().map(|r| r.expected_duration_days).collect::<Vec<_>>(),
            "projected_cost" => rows.iter().map(|r| r.projected_cost).collect::<Vec<_>>(),
            "low_confidence" => rows.iter().map(|r| r.low_confidence).collect::<Vec<_>>()
        )
    }
}

enum DocumentOutcome {
    Row(PortfolioRow),
    Rejected(RejectedDocument),
}

fn audit_document(config: &AuditConfig, document: &ProjectDocument) -> DocumentOutcome {
    let facts = match ProjectFacts::from_bytes(&document.bytes) {
        Ok(facts) => facts,
        Err(err) => {
            warn!(document = %document.name, error = %err, "rejecting schedule document");
            return DocumentOutcome::Rejected(RejectedDocument {
                name: document.name.clone(),
                reason: err.to_string(),
            });
        }
    };
    if facts.tasks.is_empty() && config.empty_document_policy == EmptyDocumentPolicy::Drop {
        warn!(document = %document.name, "dropping schedule with no qualifying tasks");
        return DocumentOutcome::Rejected(RejectedDocument {
            name: document.name.clone(),
            reason: "no qualifying tasks".to_string(),
        });
    }
    DocumentOutcome::Row(PortfolioRow::from_facts(
        document.name.clone(),
        &facts,
        config,
    ))
}

/// Audits every document independently and in parallel. Rows come back in
/// upload order.
pub fn audit_portfolio(config: &AuditConfig, documents: &[ProjectDocument]) -> PortfolioReport {
    let outcomes: Vec<DocumentOutcome> = documents
        .par_iter()
        .map(|document| audit_document(config, document))
        .collect();

    let mut rows = Vec::with_capacity(outcomes.len());
    let mut rejected = Vec::new();
    for outcome in outcomes {
        match outcome {
            DocumentOutcome::Row(row) => rows.push(row),
            DocumentOutcome::Rejected(doc) => rejected.push(doc),
        }
    }

    let summary = PortfolioSummary::from_rows(&rows, rejected.len(), config);
    info!(
        projects = summary.project_count,
        rejected = summary.rejected_count,
        policy = %config.status_policy,
        "portfolio audit complete"
    );
    PortfolioReport {
        generated_at: Utc::now(),
        policy: config.status_policy,
        rows,
        summary,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(pv: f64, ev: f64, ac: f64, pct: f64) -> ProjectFacts {
        ProjectFacts {
            manager: "M".into(),
            baseline_count: 0,
            planned_value: pv,
            earned_value: ev,
            actual_cost: ac,
            percent_complete: pct,
            tasks: Vec::new(),
            pert_error_count: 0,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn spi_defaults_without_planned_value() {
        assert_eq!(schedule_performance_index(&facts(0.0, 0.0, 0.0, 100.0)), 1.0);
        assert_eq!(schedule_performance_index(&facts(0.0, 0.0, 0.0, 99.0)), 0.0);
        assert_eq!(schedule_performance_index(&facts(200.0, 50.0, 0.0, 0.0)), 0.25);
    }

    #[test]
    fn cpi_defaults_without_actual_cost() {
        assert_eq!(cost_performance_index(&facts(0.0, 10.0, 0.0, 0.0)), 1.0);
        assert_eq!(cost_performance_index(&facts(0.0, 10.0, 20.0, 0.0)), 0.5);
    }

    #[test]
    fn recoverable_investment_never_negative() {
        assert_eq!(recoverable_investment(&facts(100.0, 150.0, 0.0, 0.0)), 0.0);
        assert_eq!(recoverable_investment(&facts(100.0, 40.0, 0.0, 0.0)), 60.0);
    }

    #[test]
    fn classify_thresholds() {
        let low = IntegrityScore::of(&facts(0.0, 0.0, 0.0, 0.0));
        let spi_only = StatusPolicy::SpiOnly;
        assert_eq!(
            ProjectStatus::classify(spi_only, 1.0, 1.0, 100.0, low),
            ProjectStatus::Completed
        );
        assert_eq!(
            ProjectStatus::classify(spi_only, 0.79, 1.0, 50.0, low),
            ProjectStatus::Critical
        );
        assert_eq!(
            ProjectStatus::classify(spi_only, 0.8, 1.0, 50.0, low),
            ProjectStatus::Alert
        );
        assert_eq!(
            ProjectStatus::classify(spi_only, 0.9, 1.0, 50.0, low),
            ProjectStatus::Healthy
        );
        assert_eq!(
            ProjectStatus::classify(StatusPolicy::SpiAndIntegrity, 0.95, 1.0, 50.0, low),
            ProjectStatus::Critical
        );
        assert_eq!(
            ProjectStatus::classify(StatusPolicy::SpiAndIntegrity, 1.0, 1.0, 100.0, low),
            ProjectStatus::Completed
        );
    }

    #[test]
    fn labels_strip_extension_and_uppercase() {
        assert_eq!(label_from_file_name("obra_norte.xml"), "OBRA_NORTE");
        assert_eq!(label_from_file_name("plan.v2.xml"), "PLAN.V2");
        assert_eq!(label_from_file_name("noext"), "NOEXT");
    }

    #[test]
    fn empty_batch_has_zeroed_summary() {
        let report = audit_portfolio(&AuditConfig::default(), &[]);
        assert!(report.rows.is_empty());
        assert_eq!(report.summary.project_count, 0);
        assert_eq!(report.summary.mean_spi, 0.0);
        assert_eq!(report.summary.total_recoverable_investment, 0.0);
        assert!(report.ranked_by_spi().is_empty());
        assert_eq!(report.to_dataframe().unwrap().height(), 0);
    }
}
