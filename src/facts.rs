use crate::document::{ParseResult, ScheduleDocument};
use crate::task::{TaskRecord, extract_tasks};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

pub const MANAGER_NOT_INFORMED: &str = "Not Informed";

/// A default substituted, or a malformed value met, while reading a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionWarning {
    MissingField { field: String },
    InvalidNumber { field: String, value: String },
    OutOfRange { field: String, value: f64, clamped: f64 },
    MissingManager,
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionWarning::MissingField { field } => {
                write!(f, "{field} missing, defaulted to 0")
            }
            ExtractionWarning::InvalidNumber { field, value } => {
                write!(f, "{field} has invalid value '{value}', defaulted to 0")
            }
            ExtractionWarning::OutOfRange {
                field,
                value,
                clamped,
            } => write!(f, "{field} value {value} out of range, clamped to {clamped}"),
            ExtractionWarning::MissingManager => {
                write!(f, "no assignment owner, manager '{MANAGER_NOT_INFORMED}'")
            }
        }
    }
}

/// Project-level facts pulled from one schedule export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFacts {
    pub manager: String,
    pub baseline_count: usize,
    pub planned_value: f64,
    pub earned_value: f64,
    pub actual_cost: f64,
    pub percent_complete: f64,
    pub tasks: Vec<TaskRecord>,
    /// Tasks whose raw optimistic and pessimistic estimates were equal.
    pub pert_error_count: usize,
    #[serde(default)]
    pub warnings: Vec<ExtractionWarning>,
}

impl ProjectFacts {
    pub fn from_bytes(bytes: &[u8]) -> ParseResult<Self> {
        let text = ScheduleDocument::decode(bytes)?;
        let document = ScheduleDocument::parse(text)?;
        Ok(Self::from_document(&document))
    }

    pub fn from_document(document: &ScheduleDocument<'_>) -> Self {
        let mut warnings = Vec::new();

        let manager = document
            .descendants("AssnOwner")
            .filter_map(|node| node.text().map(str::trim))
            .filter(|owner| !owner.is_empty())
            .last()
            .map(str::to_string)
            .unwrap_or_else(|| {
                warnings.push(ExtractionWarning::MissingManager);
                MANAGER_NOT_INFORMED.to_string()
            });

        let baseline_count = document.descendants("Baseline").count();
        let planned_value = read_amount(document, "BCWS", 0.0, f64::INFINITY, &mut warnings);
        let earned_value = read_amount(document, "BCWP", 0.0, f64::INFINITY, &mut warnings);
        let actual_cost = read_amount(document, "ACWP", 0.0, f64::INFINITY, &mut warnings);
        let percent_complete = read_amount(document, "PercentComplete", 0.0, 100.0, &mut warnings);

        let mut pert_error_count = 0;
        let tasks: Vec<TaskRecord> = extract_tasks(document)
            .map(|raw| {
                if raw.is_degenerate() {
                    pert_error_count += 1;
                }
                raw.sanitize()
            })
            .collect();

        for warning in &warnings {
            warn!(%warning, "substituted default while reading schedule");
        }
        debug!(
            manager = %manager,
            baseline_count,
            task_count = tasks.len(),
            pert_error_count,
            "extracted project facts"
        );

        Self {
            manager,
            baseline_count,
            planned_value,
            earned_value,
            actual_cost,
            percent_complete,
            tasks,
            pert_error_count,
            warnings,
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn pert_error_ratio(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        self.pert_error_count as f64 / self.tasks.len() as f64
    }

    /// Sum of the PERT expected durations of every task, in work days.
    pub fn expected_duration_days(&self) -> f64 {
        self.tasks.iter().map(TaskRecord::expected_duration).sum()
    }

    pub fn total_fixed_cost(&self) -> f64 {
        self.tasks.iter().map(|t| t.fixed_cost).sum()
    }
}

// First match wins; anything unusable becomes 0 with a warning.
fn read_amount(
    document: &ScheduleDocument<'_>,
    field: &str,
    min: f64,
    max: f64,
    warnings: &mut Vec<ExtractionWarning>,
) -> f64 {
    let Some(text) = document.first_text(field) else {
        warnings.push(ExtractionWarning::MissingField {
            field: field.to_string(),
        });
        return 0.0;
    };
    let text = text.trim();
    if text.is_empty() {
        warnings.push(ExtractionWarning::MissingField {
            field: field.to_string(),
        });
        return 0.0;
    }
    let value = match text.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            warnings.push(ExtractionWarning::InvalidNumber {
                field: field.to_string(),
                value: text.to_string(),
            });
            return 0.0;
        }
    };
    let clamped = value.clamp(min, max);
    if clamped != value {
        warnings.push(ExtractionWarning::OutOfRange {
            field: field.to_string(),
            value,
            clamped,
        });
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://schemas.microsoft.com/project";

    fn facts(body: &str) -> ProjectFacts {
        let xml = format!("<Project xmlns=\"{NS}\">{body}</Project>");
        ProjectFacts::from_bytes(xml.as_bytes()).unwrap()
    }

    #[test]
    fn manager_is_last_non_empty_owner() {
        let f = facts(
            "<Assignments>\
               <Assignment><AssnOwner>Ana</AssnOwner></Assignment>\
               <Assignment><AssnOwner>Bruno</AssnOwner></Assignment>\
               <Assignment><AssnOwner></AssnOwner></Assignment>\
             </Assignments>",
        );
        assert_eq!(f.manager, "Bruno");
        assert!(!f.warnings.contains(&ExtractionWarning::MissingManager));
    }

    #[test]
    fn missing_fields_default_to_zero_with_warnings() {
        let f = facts("");
        assert_eq!(f.manager, MANAGER_NOT_INFORMED);
        assert_eq!(f.planned_value, 0.0);
        assert_eq!(f.percent_complete, 0.0);
        assert_eq!(f.baseline_count, 0);
        assert_eq!(f.warnings.len(), 5);
    }

    #[test]
    fn first_amount_wins_and_percent_is_clamped() {
        let f = facts(
            "<BCWS>100</BCWS><BCWS>999</BCWS><BCWP>abc</BCWP>\
             <ACWP>-5</ACWP><PercentComplete>140</PercentComplete>",
        );
        assert_eq!(f.planned_value, 100.0);
        assert_eq!(f.earned_value, 0.0);
        assert_eq!(f.actual_cost, 0.0);
        assert_eq!(f.percent_complete, 100.0);
        assert!(f.warnings.contains(&ExtractionWarning::InvalidNumber {
            field: "BCWP".into(),
            value: "abc".into()
        }));
    }

    #[test]
    fn blank_amounts_are_reported_as_missing() {
        let f = facts("<BCWS></BCWS><BCWP> </BCWP><ACWP/><PercentComplete>50</PercentComplete>");
        assert_eq!(f.planned_value, 0.0);
        assert_eq!(f.earned_value, 0.0);
        for field in ["BCWS", "BCWP", "ACWP"] {
            assert!(f.warnings.contains(&ExtractionWarning::MissingField {
                field: field.into()
            }));
        }
        assert!(!f.warnings.contains(&ExtractionWarning::MissingField {
            field: "PercentComplete".into()
        }));
    }

    #[test]
    fn empty_task_list_has_zero_ratio() {
        let f = facts("<Tasks/>");
        assert_eq!(f.task_count(), 0);
        assert_eq!(f.pert_error_ratio(), 0.0);
        assert_eq!(f.expected_duration_days(), 0.0);
    }
}
