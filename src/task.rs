use crate::document::{ScheduleDocument, child_text};
use crate::duration::work_days;
use serde::{Deserialize, Serialize};

/// Added to the pessimistic bound when all three estimates coincide.
pub const DEGENERATE_SPREAD: f64 = 0.01;

/// Three-point estimate as read from the export, before any repair.
///
/// The source labels do not guarantee ordering, so `optimistic` may exceed
/// `pessimistic` here.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEstimate {
    pub name: String,
    pub optimistic: f64,
    pub most_likely: f64,
    pub pessimistic: f64,
    pub fixed_cost: f64,
}

impl RawEstimate {
    /// True when the task was never three-point estimated.
    pub fn is_degenerate(&self) -> bool {
        self.optimistic == self.pessimistic
    }

    pub fn sanitize(&self) -> TaskRecord {
        sanitize(self)
    }
}

/// A sanitized task estimate, in work days.
///
/// Always satisfies `optimistic <= most_likely <= pessimistic` and
/// `optimistic < pessimistic`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub optimistic: f64,
    pub most_likely: f64,
    pub pessimistic: f64,
    pub fixed_cost: f64,
}

impl TaskRecord {
    /// PERT mean: `(O + 4M + P) / 6`.
    pub fn expected_duration(&self) -> f64 {
        (self.optimistic + 4.0 * self.most_likely + self.pessimistic) / 6.0
    }

    /// PERT variance: `((P - O) / 6)^2`.
    pub fn variance(&self) -> f64 {
        let spread = (self.pessimistic - self.optimistic) / 6.0;
        spread * spread
    }
}

pub fn sanitize(raw: &RawEstimate) -> TaskRecord {
    let mut triple = [raw.optimistic, raw.most_likely, raw.pessimistic];
    triple.sort_by(f64::total_cmp);
    let [optimistic, most_likely, mut pessimistic] = triple;
    if optimistic == pessimistic {
        // At large magnitudes the spread rounds away; step to the next float.
        pessimistic = (pessimistic + DEGENERATE_SPREAD).max(pessimistic.next_up());
    }
    TaskRecord {
        name: raw.name.clone(),
        optimistic,
        most_likely,
        pessimistic,
        fixed_cost: raw.fixed_cost,
    }
}

/// Lazily walks every `Task` in document order, skipping unnamed and summary
/// rows. Malformed fields degrade to defaults instead of stopping the walk.
pub fn extract_tasks<'a>(
    document: &'a ScheduleDocument<'_>,
) -> impl Iterator<Item = RawEstimate> + 'a {
    document.descendants("Task").filter_map(|node| {
        let name = child_text(node, "Name").filter(|n| !n.is_empty())?;
        if child_text(node, "Summary").is_some_and(|flag| flag != "0") {
            return None;
        }
        let fixed_cost = child_text(node, "Cost")
            .and_then(|c| c.parse::<f64>().ok())
            .filter(|c| c.is_finite())
            .unwrap_or(0.0);
        Some(RawEstimate {
            name: name.to_string(),
            optimistic: work_days(child_text(node, "Duration1")),
            most_likely: work_days(child_text(node, "Duration")),
            pessimistic: work_days(child_text(node, "Duration2")),
            fixed_cost,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(o: f64, m: f64, p: f64) -> RawEstimate {
        RawEstimate {
            name: "T".into(),
            optimistic: o,
            most_likely: m,
            pessimistic: p,
            fixed_cost: 0.0,
        }
    }

    #[test]
    fn sanitize_reorders_triple() {
        let task = sanitize(&raw(9.0, 2.0, 4.0));
        assert_eq!(
            (task.optimistic, task.most_likely, task.pessimistic),
            (2.0, 4.0, 9.0)
        );
    }

    #[test]
    fn sanitize_perturbs_equal_bounds() {
        let estimate = raw(5.0, 5.0, 5.0);
        assert!(estimate.is_degenerate());
        let task = estimate.sanitize();
        assert_eq!(task.optimistic, 5.0);
        assert_eq!(task.most_likely, 5.0);
        assert_eq!(task.pessimistic, 5.0 + DEGENERATE_SPREAD);
    }

    #[test]
    fn sanitize_keeps_strict_bound_for_huge_estimates() {
        let huge = 2.5e14;
        let task = sanitize(&raw(huge, huge, huge));
        assert_eq!(task.optimistic, huge);
        assert!(task.most_likely < task.pessimistic);
    }

    #[test]
    fn degenerate_flag_uses_raw_values() {
        assert!(!raw(3.0, 1.0, 2.0).is_degenerate());
        assert!(raw(2.0, 7.0, 2.0).is_degenerate());
    }

    #[test]
    fn pert_formulas() {
        let task = sanitize(&raw(1.0, 4.0, 13.0));
        assert_eq!(task.expected_duration(), 5.0);
        assert_eq!(task.variance(), 4.0);
    }
}
