use crate::error::{AggregateError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Week-over-week change of a single metric.
///
/// `New` means there is no prior baseline and is not the same thing as a
/// 0% change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PercentChange {
    New,
    Percent(f64),
}

impl PercentChange {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::New => None,
            Self::Percent(value) => Some(value),
        }
    }

    pub fn is_new(self) -> bool {
        matches!(self, Self::New)
    }
}

impl Serialize for PercentChange {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::New => serializer.serialize_str("New"),
            Self::Percent(value) => serializer.serialize_f64(*value),
        }
    }
}

impl<'de> Deserialize<'de> for PercentChange {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(Self::Percent(value)),
            Raw::Text(text) if text.eq_ignore_ascii_case("new") => Ok(Self::New),
            Raw::Text(text) => Err(serde::de::Error::custom(format!(
                "expected a number or \"New\", got {text:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Flat,
    Debut,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Flat => "flat",
            Self::Debut => "debut",
        }
    }
}

impl From<PercentChange> for Trend {
    fn from(change: PercentChange) -> Self {
        match change {
            PercentChange::New => Self::Debut,
            PercentChange::Percent(value) if value > 0.0 => Self::Rising,
            PercentChange::Percent(value) if value < 0.0 => Self::Falling,
            PercentChange::Percent(_) => Self::Flat,
        }
    }
}

pub fn percent_change(current: u64, previous: Option<u64>) -> PercentChange {
    match previous {
        None | Some(0) => PercentChange::New,
        Some(previous) => {
            let previous = previous as f64;
            PercentChange::Percent(round_hundredths(
                (current as f64 - previous) / previous * 100.0,
            ))
        }
    }
}

/// Same rule as [`percent_change`] for float-valued sources such as follower
/// counts. Negative or non-finite inputs are rejected rather than clamped.
pub fn checked_percent_change(
    subject: &str,
    current: f64,
    previous: Option<f64>,
) -> Result<PercentChange> {
    validate(subject, "current", current)?;
    let previous = match previous {
        Some(previous) => validate(subject, "previous", previous)?,
        None => return Ok(PercentChange::New),
    };
    if previous == 0.0 {
        return Ok(PercentChange::New);
    }
    Ok(PercentChange::Percent(round_hundredths(
        (current - previous) / previous * 100.0,
    )))
}

pub fn format_percent_change(change: PercentChange) -> String {
    match change {
        PercentChange::New => String::from("New"),
        PercentChange::Percent(value) if value > 0.0 => format!("+{value:.2}%"),
        PercentChange::Percent(value) if value < 0.0 => format!("{value:.2}%"),
        PercentChange::Percent(_) => String::from("0.00%"),
    }
}

fn validate(subject: &str, field: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(AggregateError::invalid_metric(subject, field, value));
    }
    Ok(value)
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
