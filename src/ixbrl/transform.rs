//! Value-format transforms.
//!
//! A fact's `format` attribute names an entry in the inline XBRL
//! transformation registry. [`IxtRegistry`] implements the formats that show
//! up in practice; anything else can be plugged in through [`Transform`].

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::qname::QName;
use super::value::Value;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("unsupported format '{0}'")]
    UnsupportedFormat(String),

    #[error("format '{format}' cannot read '{input}'")]
    InvalidInput { format: String, input: String },
}

pub trait Transform {
    fn transform(&self, format: &QName, raw: &str, fact: &Value) -> Result<String, TransformError>;
}

impl<F> Transform for F
where
    F: Fn(&QName, &str, &Value) -> Result<String, TransformError>,
{
    fn transform(&self, format: &QName, raw: &str, fact: &Value) -> Result<String, TransformError> {
        self(format, raw, fact)
    }
}

/// Built-in transforms, keyed by local name so every ixt registry version
/// (and ixt-sec) dispatches the same way.
#[derive(Clone, Copy, Debug, Default)]
pub struct IxtRegistry;

#[derive(Clone, Copy)]
enum DateOrder {
    DayMonthYear,
    MonthDayYear,
    YearMonthDay,
}

static DAY_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,2})[^\d]+(\d{1,2})[^\d]+(\d{4}|\d{2})\s*$").unwrap());
static YEAR_MONTH_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{4}|\d{2})[^\d]+(\d{1,2})[^\d]+(\d{1,2})\s*$").unwrap());
static DAY_MONTHNAME_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,2})(?:st|nd|rd|th)?\s+([A-Za-z]+)\.?,?\s+(\d{4}|\d{2})\s*$").unwrap()
});
static MONTHNAME_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4}|\d{2})\s*$").unwrap()
});

impl Transform for IxtRegistry {
    fn transform(&self, format: &QName, raw: &str, _fact: &Value) -> Result<String, TransformError> {
        let name = format.local_name.as_str();
        let invalid = || TransformError::InvalidInput {
            format: name.to_string(),
            input: raw.to_string(),
        };

        let out = match name {
            "num-dot-decimal" | "numdotdecimal" | "numcommadot" | "numspacedot" => {
                number(raw, '.').ok_or_else(invalid)?
            }
            "num-comma-decimal" | "numcommadecimal" | "numdotcomma" | "numspacecomma" => {
                number(raw, ',').ok_or_else(invalid)?
            }
            "fixed-zero" | "zerodash" => "0".to_string(),
            "fixed-empty" | "nocontent" => String::new(),
            "fixed-true" | "booleantrue" => "true".to_string(),
            "fixed-false" | "booleanfalse" => "false".to_string(),
            "date-day-month-year" | "datedaymonthyear" | "dateslasheu" | "datedoteu" => {
                numeric_date(raw, DateOrder::DayMonthYear).ok_or_else(invalid)?
            }
            "date-month-day-year" | "datemonthdayyear" | "dateslashus" | "datedotus" => {
                numeric_date(raw, DateOrder::MonthDayYear).ok_or_else(invalid)?
            }
            "date-year-month-day" | "dateyearmonthday" => {
                numeric_date(raw, DateOrder::YearMonthDay).ok_or_else(invalid)?
            }
            "date-day-monthname-year-en" | "datedaymonthyearen" | "datelonguk" | "dateshortuk" => {
                named_month_date(raw, DateOrder::DayMonthYear).ok_or_else(invalid)?
            }
            "date-monthname-day-year-en" | "datemonthdayyearen" | "datelongus" | "dateshortus" => {
                named_month_date(raw, DateOrder::MonthDayYear).ok_or_else(invalid)?
            }
            _ => return Err(TransformError::UnsupportedFormat(format.to_string())),
        };

        Ok(out)
    }
}

/// Keeps digits and the decimal separator, normalising the separator to `.`.
fn number(raw: &str, decimal: char) -> Option<String> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == decimal)
        .map(|c| if c == decimal { '.' } else { c })
        .collect();

    if !kept.chars().any(|c| c.is_ascii_digit()) || kept.matches('.').count() > 1 {
        return None;
    }
    Some(kept)
}

fn numeric_date(raw: &str, order: DateOrder) -> Option<String> {
    let re = match order {
        DateOrder::YearMonthDay => &*YEAR_MONTH_DAY,
        _ => &*DAY_MONTH_YEAR,
    };
    let caps = re.captures(raw)?;
    let parts: Vec<&str> = (1..=3).map(|i| caps.get(i).map_or("", |m| m.as_str())).collect();

    let (year, month, day) = match order {
        DateOrder::DayMonthYear => (parts[2], parts[1], parts[0]),
        DateOrder::MonthDayYear => (parts[2], parts[0], parts[1]),
        DateOrder::YearMonthDay => (parts[0], parts[1], parts[2]),
    };
    iso_date(year, month.parse().ok()?, day)
}

fn named_month_date(raw: &str, order: DateOrder) -> Option<String> {
    let (year, month, day) = match order {
        DateOrder::MonthDayYear => {
            let caps = MONTHNAME_DAY_YEAR.captures(raw)?;
            (caps.get(3)?.as_str(), caps.get(1)?.as_str(), caps.get(2)?.as_str())
        }
        _ => {
            let caps = DAY_MONTHNAME_YEAR.captures(raw)?;
            (caps.get(3)?.as_str(), caps.get(2)?.as_str(), caps.get(1)?.as_str())
        }
    };
    iso_date(year, month_number(month)?, day)
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let prefix = lower.get(..3)?;
    let months = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    months
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

fn iso_date(year: &str, month: u32, day: &str) -> Option<String> {
    let mut year: i32 = year.parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day.parse().ok()?)?;
    Some(date.format("%Y-%m-%d").to_string())
}
