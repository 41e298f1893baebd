//! Converters for strings, booleans, numbers and UUIDs.

use uuid::Uuid;

use super::{ConvertFailure, TypeConverter, Value, ValueKind};

/// Identity converter for string properties.
#[derive(Debug, Default)]
pub struct StringConverter;

impl TypeConverter for StringConverter {
    fn can_convert(&self, kind: ValueKind) -> bool {
        kind == ValueKind::String
    }

    fn convert_from_text(&self, text: &str, _kind: ValueKind) -> Result<Value, ConvertFailure> {
        Ok(Value::String(text.to_owned()))
    }

    fn convert_to_text(&self, value: &Value) -> Result<String, ConvertFailure> {
        match value {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s.clone()),
            other => Err(ConvertFailure::new(
                format!("{other:?}"),
                ValueKind::String,
            )),
        }
    }
}

/// Converts booleans to and from text.
///
/// Parse order: canonical `true`/`false` (ASCII case-insensitive), the
/// literal tokens `1`/`0`, then the configured alias token sets compared
/// case-insensitively. The default aliases are `yes`/`y` for true and
/// `no`/`n` for false. Writes `true`/`false`.
#[derive(Debug)]
pub struct BooleanConverter {
    true_tokens: Vec<String>,
    false_tokens: Vec<String>,
}

impl BooleanConverter {
    pub fn new() -> Self {
        Self::with_tokens(["yes", "y"], ["no", "n"])
    }

    /// A converter with custom alias token sets layered on top of the
    /// canonical `true`/`false` and `1`/`0` forms.
    pub fn with_tokens<I, S>(true_tokens: I, false_tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            true_tokens: true_tokens.into_iter().map(Into::into).collect(),
            false_tokens: false_tokens.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for BooleanConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeConverter for BooleanConverter {
    fn can_convert(&self, kind: ValueKind) -> bool {
        kind == ValueKind::Bool
    }

    fn convert_from_text(&self, text: &str, _kind: ValueKind) -> Result<Value, ConvertFailure> {
        let token = text.trim();
        if token.eq_ignore_ascii_case("true") {
            return Ok(Value::Bool(true));
        }
        if token.eq_ignore_ascii_case("false") {
            return Ok(Value::Bool(false));
        }
        if token == "1" {
            return Ok(Value::Bool(true));
        }
        if token == "0" {
            return Ok(Value::Bool(false));
        }
        if self.true_tokens.iter().any(|t| t.eq_ignore_ascii_case(token)) {
            return Ok(Value::Bool(true));
        }
        if self
            .false_tokens
            .iter()
            .any(|t| t.eq_ignore_ascii_case(token))
        {
            return Ok(Value::Bool(false));
        }
        Err(ConvertFailure::new(text, ValueKind::Bool))
    }

    fn convert_to_text(&self, value: &Value) -> Result<String, ConvertFailure> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(ConvertFailure::new(format!("{other:?}"), ValueKind::Bool)),
        }
    }
}

/// Numeric parsing style, fixed at converter construction.
#[derive(Debug, Clone)]
pub struct NumberStyle {
    /// Accept a leading `+`/`-` (default: true).
    pub allow_leading_sign: bool,
    /// Grouping separator stripped before parsing, e.g. `,` in `1,234,567`
    /// (default: none).
    pub grouping_separator: Option<char>,
}

impl Default for NumberStyle {
    fn default() -> Self {
        Self {
            allow_leading_sign: true,
            grouping_separator: None,
        }
    }
}

/// Converts signed, unsigned and floating point numbers. One instance serves
/// all three numeric kinds; narrowing into the record's field width happens
/// at bind time.
#[derive(Debug, Default)]
pub struct NumberConverter {
    style: NumberStyle,
}

impl NumberConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(style: NumberStyle) -> Self {
        Self { style }
    }

    fn prepare(&self, text: &str) -> Result<String, ()> {
        let mut token = text.trim().to_owned();
        if let Some(sep) = self.style.grouping_separator {
            token.retain(|c| c != sep);
        }
        if !self.style.allow_leading_sign && (token.starts_with('+') || token.starts_with('-')) {
            return Err(());
        }
        Ok(token)
    }
}

impl TypeConverter for NumberConverter {
    fn can_convert(&self, kind: ValueKind) -> bool {
        matches!(kind, ValueKind::Int | ValueKind::UInt | ValueKind::Float)
    }

    fn convert_from_text(&self, text: &str, kind: ValueKind) -> Result<Value, ConvertFailure> {
        let fail = || ConvertFailure::new(text, kind);
        let token = self.prepare(text).map_err(|()| fail())?;
        match kind {
            ValueKind::Int => token.parse().map(Value::Int).map_err(|_| fail()),
            ValueKind::UInt => token.parse().map(Value::UInt).map_err(|_| fail()),
            ValueKind::Float => token.parse().map(Value::Float).map_err(|_| fail()),
            other => Err(ConvertFailure::new(text, other)),
        }
    }

    fn convert_to_text(&self, value: &Value) -> Result<String, ConvertFailure> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Int(i) => Ok(i.to_string()),
            Value::UInt(u) => Ok(u.to_string()),
            Value::Float(f) if f.is_finite() => Ok(f.to_string()),
            Value::Float(f) => Err(ConvertFailure::new(f.to_string(), ValueKind::Float)),
            other => Err(ConvertFailure::new(format!("{other:?}"), ValueKind::Float)),
        }
    }
}

/// Converts UUIDs to and from their hyphenated text form.
#[derive(Debug, Default)]
pub struct UuidConverter;

impl TypeConverter for UuidConverter {
    fn can_convert(&self, kind: ValueKind) -> bool {
        kind == ValueKind::Uuid
    }

    fn convert_from_text(&self, text: &str, _kind: ValueKind) -> Result<Value, ConvertFailure> {
        Uuid::parse_str(text.trim())
            .map(Value::Uuid)
            .map_err(|_| ConvertFailure::new(text, ValueKind::Uuid))
    }

    fn convert_to_text(&self, value: &Value) -> Result<String, ConvertFailure> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Uuid(u) => Ok(u.to_string()),
            other => Err(ConvertFailure::new(format!("{other:?}"), ValueKind::Uuid)),
        }
    }
}
