use std::io::{BufRead, BufReader, Read};

use crate::config::CsvConfig;
use crate::core::{Field, Row};
use crate::error::CsvError;

/// Splits a byte stream into [`Row`]s of raw fields.
///
/// The tokenizer is a single forward-only pass over a [`Read`] stream with
/// internal buffering; it never seeks and supports arbitrarily long fields
/// and rows. It knows nothing about types or column bindings.
///
/// Quoting rules: a field is quoted when its first byte is the configured
/// quote character. Inside a quoted field, delimiters and line terminators
/// are literal and a doubled quote is an escaped literal quote. An unescaped
/// closing quote followed by anything other than a delimiter, a terminator
/// or end of stream is a malformed field, as is a quote left open at end of
/// stream. Unquoted fields have no escaping.
pub struct Tokenizer<R: Read> {
    input: BufReader<R>,
    delimiter: u8,
    quote: u8,
    count_bytes: bool,
    trim: bool,
    offset: u64,
    record: u64,
}

impl<R: Read> Tokenizer<R> {
    pub fn new(input: R, config: &CsvConfig) -> Self {
        Self {
            input: BufReader::new(input),
            delimiter: config.delimiter,
            quote: config.quote,
            count_bytes: config.count_bytes,
            trim: config.trim,
            offset: 0,
            record: 0,
        }
    }

    /// Total bytes consumed from the underlying stream so far.
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Index of the next record to be read.
    pub fn record(&self) -> u64 {
        self.record
    }

    fn next_byte(&mut self) -> std::io::Result<Option<u8>> {
        let buffer = self.input.fill_buf()?;
        let Some(&byte) = buffer.first() else {
            return Ok(None);
        };
        self.input.consume(1);
        self.offset += 1;
        Ok(Some(byte))
    }

    fn peek_byte(&mut self) -> std::io::Result<Option<u8>> {
        Ok(self.input.fill_buf()?.first().copied())
    }

    /// Consumes a line terminator after `\r` has already been read: a
    /// following `\n` belongs to the same terminator.
    fn consume_lf(&mut self) -> std::io::Result<()> {
        if self.peek_byte()? == Some(b'\n') {
            self.next_byte()?;
        }
        Ok(())
    }

    fn push_field(
        &self,
        fields: &mut Vec<Field>,
        bytes: &mut Vec<u8>,
        offset: u64,
        quoted: bool,
    ) -> Result<(), CsvError> {
        let raw = std::mem::take(bytes);
        let text = String::from_utf8(raw).map_err(|_| CsvError::MalformedField {
            record: self.record,
            column: fields.len(),
            reason: "field is not valid UTF-8".to_owned(),
        })?;
        let text = if self.trim && !quoted {
            text.trim().to_owned()
        } else {
            text
        };
        let index = fields.len();
        let offset = self.count_bytes.then_some(offset);
        fields.push(Field::new(text, index, offset));
        Ok(())
    }

    fn malformed(&self, column: usize, reason: impl Into<String>) -> CsvError {
        CsvError::MalformedField {
            record: self.record,
            column,
            reason: reason.into(),
        }
    }

    /// Reads the next logical row, or `Ok(None)` at end of stream.
    ///
    /// A row is complete at the first unquoted line terminator (`\n`, `\r`
    /// or `\r\n`) or at end of stream. A terminal blank line yields no
    /// phantom row: a row is only produced when at least one byte was
    /// consumed for it.
    pub fn read_row(&mut self) -> Result<Option<Row>, CsvError> {
        let mut fields: Vec<Field> = Vec::new();
        let mut current: Vec<u8> = Vec::new();
        let mut field_offset = self.offset;
        let mut quoted = false;
        let mut in_quotes = false;
        let mut at_field_start = true;
        let mut consumed = false;

        loop {
            let Some(byte) = self.next_byte()? else {
                if in_quotes {
                    return Err(self.malformed(fields.len(), "unterminated quoted field"));
                }
                if !consumed {
                    return Ok(None);
                }
                self.push_field(&mut fields, &mut current, field_offset, quoted)?;
                break;
            };
            consumed = true;

            if in_quotes {
                if byte == self.quote {
                    match self.peek_byte()? {
                        Some(b) if b == self.quote => {
                            // Doubled quote: escaped literal quote.
                            self.next_byte()?;
                            current.push(self.quote);
                        }
                        Some(b) if b == self.delimiter => {
                            self.next_byte()?;
                            self.push_field(&mut fields, &mut current, field_offset, quoted)?;
                            quoted = false;
                            in_quotes = false;
                            at_field_start = true;
                            field_offset = self.offset;
                        }
                        Some(b'\r') => {
                            self.next_byte()?;
                            self.consume_lf()?;
                            self.push_field(&mut fields, &mut current, field_offset, quoted)?;
                            break;
                        }
                        Some(b'\n') => {
                            self.next_byte()?;
                            self.push_field(&mut fields, &mut current, field_offset, quoted)?;
                            break;
                        }
                        None => {
                            // Closing quote at end of stream; the final loop
                            // iteration emits the field.
                            in_quotes = false;
                        }
                        Some(other) => {
                            return Err(self.malformed(
                                fields.len(),
                                format!(
                                    "unexpected character {:?} after closing quote",
                                    other as char
                                ),
                            ));
                        }
                    }
                } else {
                    current.push(byte);
                }
                continue;
            }

            if at_field_start && byte == self.quote {
                quoted = true;
                in_quotes = true;
                at_field_start = false;
                continue;
            }
            if byte == self.delimiter {
                self.push_field(&mut fields, &mut current, field_offset, quoted)?;
                quoted = false;
                at_field_start = true;
                field_offset = self.offset;
                continue;
            }
            if byte == b'\r' {
                self.consume_lf()?;
                self.push_field(&mut fields, &mut current, field_offset, quoted)?;
                break;
            }
            if byte == b'\n' {
                self.push_field(&mut fields, &mut current, field_offset, quoted)?;
                break;
            }
            current.push(byte);
            at_field_start = false;
        }

        let row = Row::new(fields, self.record);
        self.record += 1;
        Ok(Some(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &str, config: &CsvConfig) -> Vec<Vec<String>> {
        let mut tokenizer = Tokenizer::new(data.as_bytes(), config);
        let mut rows = Vec::new();
        while let Some(row) = tokenizer.read_row().unwrap() {
            rows.push(row.iter().map(|f| f.text().to_owned()).collect());
        }
        rows
    }

    #[test]
    fn rows_split_on_delimiters_and_terminators() {
        let parsed = rows("a,b,c\nd,e,f\n", &CsvConfig::default());
        assert_eq!(parsed, vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]);
    }

    #[test]
    fn last_row_without_terminator_is_emitted() {
        let parsed = rows("a,b\nc,d", &CsvConfig::default());
        assert_eq!(parsed, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn terminal_blank_line_yields_no_phantom_row() {
        let parsed = rows("a,b\n", &CsvConfig::default());
        assert_eq!(parsed, vec![vec!["a", "b"]]);
    }

    #[test]
    fn interior_blank_line_is_a_single_empty_field() {
        let parsed = rows("a\n\nb\n", &CsvConfig::default());
        assert_eq!(parsed, vec![vec!["a"], vec![""], vec!["b"]]);
    }

    #[test]
    fn quoted_fields_keep_delimiters_and_line_breaks() {
        let parsed = rows("\"a,b\",\"x\ny\"\nplain,row\n", &CsvConfig::default());
        assert_eq!(parsed, vec![vec!["a,b", "x\ny"], vec!["plain", "row"]]);
    }

    #[test]
    fn doubled_quotes_collapse_to_literal_quotes() {
        let parsed = rows("\"he said \"\"hi\"\"\",x\n", &CsvConfig::default());
        assert_eq!(parsed, vec![vec!["he said \"hi\"", "x"]]);
    }

    #[test]
    fn a_field_of_one_escaped_quote_collapses() {
        let parsed = rows("\"\"\"\"\n", &CsvConfig::default());
        assert_eq!(parsed, vec![vec!["\""]]);
    }

    #[test]
    fn crlf_terminators_are_consumed_as_one() {
        let parsed = rows("a,b\r\nc,d\r\n", &CsvConfig::default());
        assert_eq!(parsed, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn empty_fields_are_preserved() {
        let parsed = rows("a,,c\n,\n", &CsvConfig::default());
        assert_eq!(parsed, vec![vec!["a", "", "c"], vec!["", ""]]);
    }

    #[test]
    fn a_quote_inside_an_unquoted_field_is_literal() {
        let parsed = rows("ab\"cd,e\n", &CsvConfig::default());
        assert_eq!(parsed, vec![vec!["ab\"cd", "e"]]);
    }

    #[test]
    fn whitespace_is_preserved_unless_trim_is_enabled() {
        let data = " a , b \n";
        assert_eq!(rows(data, &CsvConfig::default()), vec![vec![" a ", " b "]]);

        let config = CsvConfig {
            trim: true,
            ..CsvConfig::default()
        };
        assert_eq!(rows(data, &config), vec![vec!["a", "b"]]);
    }

    #[test]
    fn trim_leaves_quoted_fields_verbatim() {
        let config = CsvConfig {
            trim: true,
            ..CsvConfig::default()
        };
        assert_eq!(rows("\" a \",b\n", &config), vec![vec![" a ", "b"]]);
    }

    #[test]
    fn custom_delimiters_apply() {
        let config = CsvConfig {
            delimiter: b';',
            ..CsvConfig::default()
        };
        assert_eq!(rows("a;b,c\n", &config), vec![vec!["a", "b,c"]]);
    }

    #[test]
    fn unterminated_quote_is_malformed() {
        let mut tokenizer = Tokenizer::new("\"abc".as_bytes(), &CsvConfig::default());
        let err = tokenizer.read_row().unwrap_err();
        assert!(matches!(
            err,
            CsvError::MalformedField { record: 0, column: 0, .. }
        ));
    }

    #[test]
    fn garbage_after_closing_quote_is_malformed() {
        let mut tokenizer = Tokenizer::new("ok,\"abc\"x,y\n".as_bytes(), &CsvConfig::default());
        let err = tokenizer.read_row().unwrap_err();
        assert!(matches!(
            err,
            CsvError::MalformedField { record: 0, column: 1, .. }
        ));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let data: &[u8] = &[b'a', 0xFF, b'\n'];
        let mut tokenizer = Tokenizer::new(data, &CsvConfig::default());
        let err = tokenizer.read_row().unwrap_err();
        assert!(matches!(err, CsvError::MalformedField { .. }));
    }

    #[test]
    fn closing_quote_at_end_of_stream_completes_the_row() {
        let parsed = rows("a,\"b\"", &CsvConfig::default());
        assert_eq!(parsed, vec![vec!["a", "b"]]);
    }

    #[test]
    fn byte_offsets_track_field_starts_when_enabled() {
        let config = CsvConfig {
            count_bytes: true,
            ..CsvConfig::default()
        };
        let mut tokenizer = Tokenizer::new("ab,cd\r\nef,\"g\"\n".as_bytes(), &config);

        let row = tokenizer.read_row().unwrap().unwrap();
        assert_eq!(row.get(0).unwrap().offset(), Some(0));
        assert_eq!(row.get(1).unwrap().offset(), Some(3));

        let row = tokenizer.read_row().unwrap().unwrap();
        assert_eq!(row.get(0).unwrap().offset(), Some(7));
        assert_eq!(row.get(1).unwrap().offset(), Some(10));
        assert_eq!(tokenizer.position(), 14);
    }

    #[test]
    fn offsets_are_absent_by_default() {
        let mut tokenizer = Tokenizer::new("a,b\n".as_bytes(), &CsvConfig::default());
        let row = tokenizer.read_row().unwrap().unwrap();
        assert_eq!(row.get(0).unwrap().offset(), None);
    }

    #[test]
    fn record_indexes_increase_per_row() {
        let mut tokenizer = Tokenizer::new("a\nb\n".as_bytes(), &CsvConfig::default());
        assert_eq!(tokenizer.read_row().unwrap().unwrap().record(), 0);
        assert_eq!(tokenizer.read_row().unwrap().unwrap().record(), 1);
        assert!(tokenizer.read_row().unwrap().is_none());
    }
}
