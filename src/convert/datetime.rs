//! Date and datetime converters backed by chrono.

use chrono::{NaiveDate, NaiveDateTime};

use super::{ConvertFailure, TypeConverter, Value, ValueKind, DATETIME_FORMAT, DATE_FORMAT};

/// Converts [`NaiveDate`] values using a chrono format string
/// (default `%Y-%m-%d`). The same format is used for writing.
#[derive(Debug)]
pub struct DateConverter {
    format: String,
}

impl DateConverter {
    pub fn new() -> Self {
        Self::with_format(DATE_FORMAT)
    }

    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl Default for DateConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeConverter for DateConverter {
    fn can_convert(&self, kind: ValueKind) -> bool {
        kind == ValueKind::Date
    }

    fn convert_from_text(&self, text: &str, _kind: ValueKind) -> Result<Value, ConvertFailure> {
        NaiveDate::parse_from_str(text.trim(), &self.format)
            .map(Value::Date)
            .map_err(|_| ConvertFailure::new(text, ValueKind::Date))
    }

    fn convert_to_text(&self, value: &Value) -> Result<String, ConvertFailure> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Date(d) => Ok(d.format(&self.format).to_string()),
            other => Err(ConvertFailure::new(format!("{other:?}"), ValueKind::Date)),
        }
    }
}

/// Converts [`NaiveDateTime`] values using a chrono format string
/// (default `%Y-%m-%dT%H:%M:%S`).
#[derive(Debug)]
pub struct DateTimeConverter {
    format: String,
}

impl DateTimeConverter {
    pub fn new() -> Self {
        Self::with_format(DATETIME_FORMAT)
    }

    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl Default for DateTimeConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeConverter for DateTimeConverter {
    fn can_convert(&self, kind: ValueKind) -> bool {
        kind == ValueKind::DateTime
    }

    fn convert_from_text(&self, text: &str, _kind: ValueKind) -> Result<Value, ConvertFailure> {
        NaiveDateTime::parse_from_str(text.trim(), &self.format)
            .map(Value::DateTime)
            .map_err(|_| ConvertFailure::new(text, ValueKind::DateTime))
    }

    fn convert_to_text(&self, value: &Value) -> Result<String, ConvertFailure> {
        match value {
            Value::Null => Ok(String::new()),
            Value::DateTime(dt) => Ok(dt.format(&self.format).to_string()),
            other => Err(ConvertFailure::new(
                format!("{other:?}"),
                ValueKind::DateTime,
            )),
        }
    }
}
