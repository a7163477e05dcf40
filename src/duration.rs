use thiserror::Error;

/// Minutes in a standard 8-hour work day.
pub const MINUTES_PER_WORK_DAY: f64 = 480.0;

/// Lower bound for any parsed duration, in work days.
pub const MIN_WORK_DAYS: f64 = 0.001;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DurationError {
    #[error("duration token must start with 'PT'")]
    MissingPrefix,
    #[error("invalid number '{0}' in duration token")]
    InvalidNumber(String),
    #[error("unknown designator '{0}' in duration token")]
    UnknownDesignator(char),
    #[error("number '{0}' has no H/M/S designator")]
    DanglingNumber(String),
    #[error("duration token evaluates to a non-finite value")]
    NonFinite,
}

/// Parses a `PT<n>H<n>M<n>S` token into minutes.
///
/// Components may be absent, repeated (they are summed) or carry a sign.
/// Seconds are accepted but contribute nothing to the total.
pub fn parse_minutes(token: &str) -> Result<f64, DurationError> {
    let body = token
        .trim()
        .strip_prefix("PT")
        .ok_or(DurationError::MissingPrefix)?;

    let mut minutes = 0.0;
    let mut number = String::new();
    for ch in body.chars() {
        match ch {
            '0'..='9' | '.' | '+' | '-' => number.push(ch),
            'H' | 'M' | 'S' => {
                let value = parse_number(&number)?;
                minutes += match ch {
                    'H' => value * 60.0,
                    'M' => value,
                    _ => 0.0,
                };
                number.clear();
            }
            other => return Err(DurationError::UnknownDesignator(other)),
        }
    }
    if !number.is_empty() {
        return Err(DurationError::DanglingNumber(number));
    }
    if !minutes.is_finite() {
        return Err(DurationError::NonFinite);
    }
    Ok(minutes)
}

fn parse_number(raw: &str) -> Result<f64, DurationError> {
    // Signs are only valid in leading position.
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    if digits.is_empty() || digits.contains(['+', '-']) {
        return Err(DurationError::InvalidNumber(raw.to_string()));
    }
    raw.parse::<f64>()
        .map_err(|_| DurationError::InvalidNumber(raw.to_string()))
}

/// Converts an optional duration token into work days.
///
/// Never fails: absent or malformed tokens, and totals below the floor,
/// all yield [`MIN_WORK_DAYS`].
pub fn work_days(token: Option<&str>) -> f64 {
    let Some(token) = token else {
        return MIN_WORK_DAYS;
    };
    match parse_minutes(token) {
        Ok(minutes) => (minutes / MINUTES_PER_WORK_DAY).max(MIN_WORK_DAYS),
        Err(_) => MIN_WORK_DAYS,
    }
}
