use serde::{Deserialize, Serialize};
use time::Date;
use time::macros::format_description;

/// Lower bound of the `K` tier. Some views only abbreviate from 10,000 up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CompactThreshold {
    #[default]
    Thousand,
    TenThousand,
}

impl CompactThreshold {
    pub fn min_value(self) -> u64 {
        match self {
            Self::Thousand => 1_000,
            Self::TenThousand => 10_000,
        }
    }
}

pub fn format_compact(value: Option<u64>) -> String {
    format_compact_with(value, CompactThreshold::Thousand)
}

pub fn format_compact_with(value: Option<u64>, threshold: CompactThreshold) -> String {
    let Some(value) = value else {
        return String::from("0");
    };
    if value >= 1_000_000_000 {
        format!("{:.1}B", one_decimal(value, 1e9))
    } else if value >= 1_000_000 {
        format!("{:.1}M", one_decimal(value, 1e6))
    } else if value >= threshold.min_value() {
        format!("{:.1}K", one_decimal(value, 1e3))
    } else {
        group_digits(value)
    }
}

// Halves round up (1,250 -> 1.3K); `{:.1}` alone would round them to even.
fn one_decimal(value: u64, unit: f64) -> f64 {
    (value as f64 / unit * 10.0).round() / 10.0
}

pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_position(position: u32) -> String {
    format!("#{position}")
}

pub fn format_weeks(weeks: u32) -> String {
    if weeks == 1 {
        String::from("1 week")
    } else {
        format!("{weeks} weeks")
    }
}

/// Display-only; the cycle date never takes part in ranking.
pub fn format_cycle_date(date: Date) -> String {
    date.format(format_description!(
        "Week of [month repr:short] [day padding:none], [year]"
    ))
    .unwrap_or_else(|_| date.to_string())
}
