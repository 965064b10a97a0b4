use std::fmt;

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::primitives::{decimal_to_f64, parse_datetime_text, unix_millis_to_datetime};

/// Largest magnitude a cell may have to count as numeric.
///
/// Beyond it sums, spans and pixel positions stop being representable, so such
/// cells are treated like any other non-numeric value.
pub const MAX_NUMERIC_MAGNITUDE: f64 = 1e100;

/// One scalar cell of a data row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Null,
    Bool(bool),
    Number(f64),
    Date(DateTime<Utc>),
    Text(String),
}

impl DataValue {
    /// Numeric view of the value.
    ///
    /// Finite numbers up to `MAX_NUMERIC_MAGNITUDE`, numeric text and booleans
    /// are numeric. Everything else returns `None`; callers skip or zero such
    /// values, never abort.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Null | Self::Date(_) => return None,
            Self::Bool(flag) => return Some(if *flag { 1.0 } else { 0.0 }),
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        (value.is_finite() && value.abs() <= MAX_NUMERIC_MAGNITUDE).then_some(value)
    }

    /// Temporal view: dates, date-like text, or numbers as epoch milliseconds.
    #[must_use]
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(value) => Some(*value),
            Self::Text(text) => parse_datetime_text(text),
            Self::Number(millis) => unix_millis_to_datetime(*millis),
            Self::Null | Self::Bool(_) => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{value}")
                }
            }
            // Midnight timestamps read as plain dates; anything else keeps its time.
            Self::Date(value) if value.num_seconds_from_midnight() == 0 && value.nanosecond() == 0 => {
                write!(f, "{}", value.format("%Y-%m-%d"))
            }
            Self::Date(value) => f.write_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for DataValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl From<Decimal> for DataValue {
    fn from(value: Decimal) -> Self {
        decimal_to_f64(value, "decimal cell").map_or(Self::Null, Self::Number)
    }
}

/// Mapping from column name to scalar value; column order is preserved.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataRow(IndexMap<String, DataValue>);

impl DataRow {
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<DataValue>) {
        self.0.insert(field.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&DataValue> {
        self.0.get(field)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.get(field).is_some_and(|value| !value.is_null())
    }

    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(DataValue::as_number)
    }

    /// Numeric value with non-numeric and missing entries read as zero.
    #[must_use]
    pub fn number_or_zero(&self, field: &str) -> f64 {
        self.number(field).unwrap_or(0.0)
    }

    #[must_use]
    pub fn datetime(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get(field).and_then(DataValue::as_datetime)
    }

    /// Display text of a cell; missing cells read as an empty string.
    #[must_use]
    pub fn text(&self, field: &str) -> String {
        self.get(field).map(ToString::to_string).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<DataValue>> FromIterator<(K, V)> for DataRow {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Distinct display values of `field`, in first-appearance order.
#[must_use]
pub fn distinct_values(rows: &[DataRow], field: &str) -> Vec<String> {
    let mut seen = indexmap::IndexSet::new();
    for row in rows {
        seen.insert(row.text(field));
    }
    seen.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::{DataRow, DataValue, distinct_values};
    use rust_decimal::Decimal;

    #[test]
    fn numeric_coercion_accepts_numeric_text_only() {
        assert_eq!(DataValue::from(" 4.5 ").as_number(), Some(4.5));
        assert_eq!(DataValue::from("n/a").as_number(), None);
        assert_eq!(DataValue::Null.as_number(), None);
        assert_eq!(DataValue::Number(f64::NAN).as_number(), None);
        assert_eq!(DataValue::from(Decimal::new(125, 2)).as_number(), Some(1.25));
        assert_eq!(DataValue::Number(1e100).as_number(), Some(1e100));
        assert_eq!(DataValue::Number(-1e300).as_number(), None);
        assert_eq!(DataValue::from("1e308").as_number(), None);
    }

    #[test]
    fn timestamps_keep_their_time_of_day_as_text() {
        let row: DataRow = serde_json::from_str(
            r#"{"day":"2024-01-02T00:00:00Z","hour":"2024-01-02T09:00:00Z","ms":"2024-01-02T09:00:00.250Z"}"#,
        )
        .expect("row");
        assert_eq!(row.text("day"), "2024-01-02");
        assert_eq!(row.text("hour"), "2024-01-02T09:00:00Z");
        assert_eq!(row.text("ms"), "2024-01-02T09:00:00.250Z");
    }

    #[test]
    fn rows_deserialize_from_json_objects() {
        let row: DataRow =
            serde_json::from_str(r#"{"group":"A","value":3,"when":"2024-01-02T00:00:00Z"}"#)
                .expect("row");
        assert_eq!(row.text("group"), "A");
        assert_eq!(row.number("value"), Some(3.0));
        assert!(matches!(row.get("when"), Some(DataValue::Date(_))));
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["group", "value", "when"]);
    }

    #[test]
    fn distinct_values_keep_first_appearance() {
        let rows = vec![
            DataRow::new().with("k", "b"),
            DataRow::new().with("k", "a"),
            DataRow::new().with("k", "b"),
        ];
        assert_eq!(distinct_values(&rows, "k"), vec!["b", "a"]);
    }
}
