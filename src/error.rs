use thiserror::Error;

use crate::convert::ValueKind;

#[derive(Error, Debug)]
/// Codec error
pub enum CsvError {
    /// A field violated the quoting rules. Fatal for the current row; the
    /// stream position after this error is undefined and no resynchronization
    /// is attempted.
    #[error("malformed field at record {record}, column {column}: {reason}")]
    MalformedField {
        record: u64,
        column: usize,
        reason: String,
    },

    /// Raw text could not be converted to the target property's type. Aborts
    /// the current row only; the reader stays usable for subsequent rows.
    #[error("cannot convert {text:?} to {target} (record {record}, column {column})")]
    Conversion {
        text: String,
        target: ValueKind,
        record: u64,
        column: String,
    },

    /// Invalid mapping configuration: duplicate property binding, missing
    /// class map, or a converter that does not accept its declared type.
    /// Raised when the configuration is built, never during row processing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No converter (registered or fallback) accepts the property's type.
    #[error("no converter accepts values of type {0}")]
    UnsupportedType(ValueKind),

    /// I/O failure of the underlying stream, propagated verbatim.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
