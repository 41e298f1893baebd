/// Structural options shared by readers and writers.
///
/// A configuration is assembled by a builder before the first row is
/// processed and is not mutated afterwards. Each reader or writer instance
/// owns its configuration exclusively.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Field delimiter (default: comma).
    pub delimiter: u8,
    /// Quote character (default: double quote).
    pub quote: u8,
    /// Whether the first row names the columns (default: false).
    pub has_headers: bool,
    /// Whether header-name matching ignores case (default: false).
    pub case_insensitive_headers: bool,
    /// Strict policy: a bound column that cannot be resolved in a row is an
    /// error instead of leaving the property at its default (default: false).
    pub strict: bool,
    /// Record the byte offset of every field. Off by default, it adds
    /// per-field bookkeeping on the hot path.
    pub count_bytes: bool,
    /// Trim surrounding whitespace of unquoted fields (default: false,
    /// whitespace is preserved verbatim).
    pub trim: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            has_headers: false,
            case_insensitive_headers: false,
            strict: false,
            count_bytes: false,
            trim: false,
        }
    }
}
