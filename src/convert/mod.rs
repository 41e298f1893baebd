//! Conversion between raw field text and typed values.
//!
//! Converters are strategy objects: each one declares which [`ValueKind`]s it
//! accepts and turns text into a [`Value`] and back. A [`ConverterRegistry`]
//! owns the converter set of one reader or writer instance; there is no
//! shared global registry, so independent configurations with different
//! converter sets can coexist in one process.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::error::CsvError;

pub mod datetime;
pub mod primitive;

/// Default text formats used by the fallback conversion path.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A dynamically typed field value, the bridge between raw text and the
/// typed properties of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value; binds `None` and flattens to an empty field.
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The kind of this value; `None` for [`Value::Null`].
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Int(_) => Some(ValueKind::Int),
            Value::UInt(_) => Some(ValueKind::UInt),
            Value::Float(_) => Some(ValueKind::Float),
            Value::String(_) => Some(ValueKind::String),
            Value::Date(_) => Some(ValueKind::Date),
            Value::DateTime(_) => Some(ValueKind::DateTime),
            Value::Uuid(_) => Some(ValueKind::Uuid),
        }
    }
}

/// The set of value types the conversion engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    UInt,
    Float,
    String,
    Date,
    DateTime,
    Uuid,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Date => "date",
            ValueKind::DateTime => "datetime",
            ValueKind::Uuid => "uuid",
        };
        f.write_str(name)
    }
}

/// A record field type that can travel through [`Value`].
///
/// Implemented for the primitive scalars, `String`, chrono dates and
/// [`Uuid`]. `Option<V>` is the nullable variant: an empty raw field binds
/// `None`, and `None` flattens back to an empty field.
pub trait CsvValue: Sized + 'static {
    /// The kind a converter must produce for this type.
    const KIND: ValueKind;
    /// Whether an empty raw field binds as absent instead of being converted.
    const NULLABLE: bool = false;

    /// Narrows a value of [`Self::KIND`] into this type. `None` when the
    /// value does not fit (e.g. an out-of-range integer).
    fn from_value(value: Value) -> Option<Self>;

    fn to_value(&self) -> Value;
}

impl CsvValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! signed_csv_value {
    ($($ty:ty),*) => {
        $(impl CsvValue for $ty {
            const KIND: ValueKind = ValueKind::Int;

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::Int(i) => <$ty>::try_from(i).ok(),
                    _ => None,
                }
            }

            fn to_value(&self) -> Value {
                Value::Int(*self as i64)
            }
        })*
    };
}

macro_rules! unsigned_csv_value {
    ($($ty:ty),*) => {
        $(impl CsvValue for $ty {
            const KIND: ValueKind = ValueKind::UInt;

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::UInt(u) => <$ty>::try_from(u).ok(),
                    _ => None,
                }
            }

            fn to_value(&self) -> Value {
                Value::UInt(*self as u64)
            }
        })*
    };
}

signed_csv_value!(i8, i16, i32, i64);
unsigned_csv_value!(u8, u16, u32, u64);

impl CsvValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl CsvValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(f as f32),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Float(*self as f64)
    }
}

impl CsvValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl CsvValue for NaiveDate {
    const KIND: ValueKind = ValueKind::Date;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Date(*self)
    }
}

impl CsvValue for NaiveDateTime {
    const KIND: ValueKind = ValueKind::DateTime;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl CsvValue for Uuid {
    const KIND: ValueKind = ValueKind::Uuid;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Uuid(u) => Some(u),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }
}

impl<V: CsvValue> CsvValue for Option<V> {
    const KIND: ValueKind = V::KIND;
    const NULLABLE: bool = true;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => V::from_value(other).map(Some),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

/// Failure of a single conversion, without stream position. The binder
/// enriches it with the record index and column name before surfacing it as
/// [`CsvError::Conversion`].
#[derive(Debug)]
pub struct ConvertFailure {
    /// The offending raw text (or the value's debug form on the write path).
    pub text: String,
    /// The kind the conversion was targeting.
    pub target: ValueKind,
}

impl ConvertFailure {
    pub fn new(text: impl Into<String>, target: ValueKind) -> Self {
        Self {
            text: text.into(),
            target,
        }
    }
}

/// Strategy converting between raw field text and a [`Value`].
///
/// Converters are stateless or configuration-only: any parsing style, format
/// string or alias table is fixed at construction. One converter may serve
/// several kinds; [`TypeConverter::can_convert`] declares which.
pub trait TypeConverter: std::fmt::Debug + Send + Sync {
    /// Whether this converter accepts values of the given kind.
    fn can_convert(&self, kind: ValueKind) -> bool;

    /// Converts raw text into a value of the requested kind.
    fn convert_from_text(&self, text: &str, kind: ValueKind) -> Result<Value, ConvertFailure>;

    /// Converts a value into its field text. Fails only when the value's own
    /// representation is invalid (e.g. a non-finite float).
    fn convert_to_text(&self, value: &Value) -> Result<String, ConvertFailure>;
}

/// The loud-failure fallback: canonical native parse per kind, nothing else.
#[derive(Debug, Default)]
pub struct DefaultConverter;

impl TypeConverter for DefaultConverter {
    fn can_convert(&self, _kind: ValueKind) -> bool {
        true
    }

    fn convert_from_text(&self, text: &str, kind: ValueKind) -> Result<Value, ConvertFailure> {
        let fail = || ConvertFailure::new(text, kind);
        match kind {
            ValueKind::Bool => text.parse().map(Value::Bool).map_err(|_| fail()),
            ValueKind::Int => text.parse().map(Value::Int).map_err(|_| fail()),
            ValueKind::UInt => text.parse().map(Value::UInt).map_err(|_| fail()),
            ValueKind::Float => text.parse().map(Value::Float).map_err(|_| fail()),
            ValueKind::String => Ok(Value::String(text.to_owned())),
            ValueKind::Date => NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| fail()),
            ValueKind::DateTime => NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
                .map(Value::DateTime)
                .map_err(|_| fail()),
            ValueKind::Uuid => Uuid::parse_str(text).map(Value::Uuid).map_err(|_| fail()),
        }
    }

    fn convert_to_text(&self, value: &Value) -> Result<String, ConvertFailure> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::UInt(u) => Ok(u.to_string()),
            Value::Float(f) if f.is_finite() => Ok(f.to_string()),
            Value::Float(f) => Err(ConvertFailure::new(f.to_string(), ValueKind::Float)),
            Value::String(s) => Ok(s.clone()),
            Value::Date(d) => Ok(d.format(DATE_FORMAT).to_string()),
            Value::DateTime(dt) => Ok(dt.format(DATETIME_FORMAT).to_string()),
            Value::Uuid(u) => Ok(u.to_string()),
        }
    }
}

/// Converter lookup for one reader or writer instance.
///
/// Resolution order when binding a property: the per-property override
/// converter, then the converter registered here for the property's kind,
/// then the fallback. A registry built with [`ConverterRegistry::empty`] has
/// no fallback and unregistered kinds fail with
/// [`CsvError::UnsupportedType`].
pub struct ConverterRegistry {
    converters: HashMap<ValueKind, Arc<dyn TypeConverter>>,
    fallback: Option<Arc<dyn TypeConverter>>,
}

impl ConverterRegistry {
    /// A registry with no converters and no fallback.
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
            fallback: None,
        }
    }

    /// The standard converter set: strings, booleans with the default alias
    /// tokens, numbers, dates, datetimes and UUIDs, with [`DefaultConverter`]
    /// as fallback.
    pub fn with_defaults() -> Self {
        let mut converters: HashMap<ValueKind, Arc<dyn TypeConverter>> = HashMap::new();
        converters.insert(ValueKind::String, Arc::new(primitive::StringConverter));
        converters.insert(ValueKind::Bool, Arc::new(primitive::BooleanConverter::new()));
        let numbers: Arc<dyn TypeConverter> = Arc::new(primitive::NumberConverter::new());
        converters.insert(ValueKind::Int, Arc::clone(&numbers));
        converters.insert(ValueKind::UInt, Arc::clone(&numbers));
        converters.insert(ValueKind::Float, numbers);
        converters.insert(ValueKind::Date, Arc::new(datetime::DateConverter::new()));
        converters.insert(
            ValueKind::DateTime,
            Arc::new(datetime::DateTimeConverter::new()),
        );
        converters.insert(ValueKind::Uuid, Arc::new(primitive::UuidConverter));
        Self {
            converters,
            fallback: Some(Arc::new(DefaultConverter)),
        }
    }

    /// Registers (or replaces) the converter for a kind.
    ///
    /// Fails with [`CsvError::Configuration`] when the converter does not
    /// accept the kind it is being registered for.
    pub fn register(
        &mut self,
        kind: ValueKind,
        converter: Arc<dyn TypeConverter>,
    ) -> Result<(), CsvError> {
        if !converter.can_convert(kind) {
            return Err(CsvError::Configuration(format!(
                "converter does not accept values of type {kind}"
            )));
        }
        self.converters.insert(kind, converter);
        Ok(())
    }

    /// Resolves the converter for a kind: registered converter first, then
    /// the fallback.
    pub fn resolve(&self, kind: ValueKind) -> Result<&Arc<dyn TypeConverter>, CsvError> {
        self.converters
            .get(&kind)
            .or(self.fallback.as_ref())
            .ok_or(CsvError::UnsupportedType(kind))
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
