use crate::scoring::IntegrityScore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_LOW_INTEGRITY_THRESHOLD: u8 = 6;

/// How a project's status is derived from its indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Critical/alert thresholds on SPI alone.
    #[default]
    SpiOnly,
    /// Critical/alert when either SPI or the integrity score is low.
    SpiAndIntegrity,
}

impl StatusPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusPolicy::SpiOnly => "spi",
            StatusPolicy::SpiAndIntegrity => "integrity",
        }
    }
}

impl fmt::Display for StatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spi" | "spi_only" => Ok(StatusPolicy::SpiOnly),
            "integrity" | "spi_and_integrity" => Ok(StatusPolicy::SpiAndIntegrity),
            _ => Err(()),
        }
    }
}

/// What to do with a document that parsed but has no qualifying tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyDocumentPolicy {
    #[default]
    Drop,
    ZeroConfidenceRow,
}

impl FromStr for EmptyDocumentPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(EmptyDocumentPolicy::Drop),
            "keep" | "zero_confidence_row" => Ok(EmptyDocumentPolicy::ZeroConfidenceRow),
            _ => Err(()),
        }
    }
}

/// Daily burn projection scaled by an operational stress factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostProjection {
    pub base_daily_rate: f64,
    /// Fraction, so `0.15` means 15% stress.
    pub operational_stress: f64,
}

impl CostProjection {
    pub fn new(base_daily_rate: f64, operational_stress: f64) -> Self {
        Self {
            base_daily_rate,
            operational_stress,
        }
    }

    pub fn effective_rate(&self) -> f64 {
        self.base_daily_rate * (1.0 + self.operational_stress)
    }

    pub fn projected_cost(&self, days: f64) -> f64 {
        self.effective_rate() * days
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("low integrity threshold {0} exceeds the maximum score of {max}", max = IntegrityScore::MAX)]
    InvalidThreshold(u8),
    #[error("base daily rate {0} must be a finite, non-negative number")]
    InvalidRate(f64),
    #[error("operational stress {0} must be finite and at least -1")]
    InvalidStress(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub status_policy: StatusPolicy,
    pub empty_document_policy: EmptyDocumentPolicy,
    pub low_integrity_threshold: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_projection: Option<CostProjection>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            status_policy: StatusPolicy::default(),
            empty_document_policy: EmptyDocumentPolicy::default(),
            low_integrity_threshold: DEFAULT_LOW_INTEGRITY_THRESHOLD,
            cost_projection: None,
        }
    }
}

impl AuditConfig {
    pub fn with_policy(status_policy: StatusPolicy) -> Self {
        Self {
            status_policy,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.low_integrity_threshold > IntegrityScore::MAX {
            return Err(ConfigError::InvalidThreshold(self.low_integrity_threshold));
        }
        if let Some(projection) = &self.cost_projection {
            let rate = projection.base_daily_rate;
            if !rate.is_finite() || rate < 0.0 {
                return Err(ConfigError::InvalidRate(rate));
            }
            let stress = projection.operational_stress;
            if !stress.is_finite() || stress < -1.0 {
                return Err(ConfigError::InvalidStress(stress));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_rate_applies_stress() {
        let projection = CostProjection::new(1000.0, 0.15);
        assert!((projection.effective_rate() - 1150.0).abs() < 1e-9);
        assert!((projection.projected_cost(2.0) - 2300.0).abs() < 1e-9);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = AuditConfig::default();
        assert!(config.validate().is_ok());

        config.low_integrity_threshold = 11;
        assert_eq!(config.validate(), Err(ConfigError::InvalidThreshold(11)));

        config.low_integrity_threshold = 6;
        config.cost_projection = Some(CostProjection::new(-1.0, 0.0));
        assert_eq!(config.validate(), Err(ConfigError::InvalidRate(-1.0)));

        config.cost_projection = Some(CostProjection::new(10.0, -2.0));
        assert_eq!(config.validate(), Err(ConfigError::InvalidStress(-2.0)));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: AuditConfig =
            serde_json::from_str(r#"{"status_policy":"spi_and_integrity"}"#).unwrap();
        assert_eq!(config.status_policy, StatusPolicy::SpiAndIntegrity);
        assert_eq!(config.low_integrity_threshold, DEFAULT_LOW_INTEGRITY_THRESHOLD);
        assert_eq!(config.empty_document_policy, EmptyDocumentPolicy::Drop);
    }

    #[test]
    fn policies_parse_from_cli_words() {
        assert_eq!("spi".parse(), Ok(StatusPolicy::SpiOnly));
        assert_eq!("Integrity".parse(), Ok(StatusPolicy::SpiAndIntegrity));
        assert_eq!("keep".parse(), Ok(EmptyDocumentPolicy::ZeroConfidenceRow));
        assert!("bogus".parse::<StatusPolicy>().is_err());
    }
}
