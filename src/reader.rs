use std::fs::File;
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;

use log::{debug, error};

use crate::config::CsvConfig;
use crate::convert::ConverterRegistry;
use crate::core::binder::{self, BindContext};
use crate::core::tokenizer::Tokenizer;
use crate::core::Headers;
use crate::error::CsvError;
use crate::mapping::{ClassMap, ClassMapRegistry, Described};

/// A typed CSV reader.
///
/// The reader pulls one row at a time from the underlying stream, resolves
/// the class map registered for the requested type and materializes a typed
/// record from the row's fields. It can process CSV data from files,
/// strings, or any source implementing the `Read` trait.
///
/// # Type Parameters
///
/// - `R`: The type of reader providing the CSV data. Must implement `Read`.
///
/// # Error behavior
///
/// A conversion failure aborts the affected record only: the error is
/// returned for that row and the next call continues with the following
/// row. End of stream is terminal; further calls keep returning `Ok(None)`.
///
/// # Examples
///
/// ```
/// use csv_bind_rs::mapping::{ClassMap, Property};
/// use csv_bind_rs::reader::CsvReaderBuilder;
///
/// #[derive(Debug, Default)]
/// struct Record {
///     name: String,
///     value: i32,
/// }
///
/// let map = ClassMap::builder()
///     .property(Property::new(
///         "name",
///         |r: &Record| r.name.clone(),
///         |r: &mut Record, v| r.name = v,
///     ))
///     .property(Property::new(
///         "value",
///         |r: &Record| r.value,
///         |r: &mut Record, v| r.value = v,
///     ))
///     .build()
///     .unwrap();
///
/// let data = "\
/// name,value
/// foo,123
/// bar,456
/// ";
///
/// let mut reader = CsvReaderBuilder::new()
///     .has_headers(true)
///     .map(map)
///     .from_reader(data.as_bytes());
///
/// let record: Record = reader.read().unwrap().unwrap();
/// assert_eq!(record.name, "foo");
/// assert_eq!(record.value, 123);
///
/// let record: Record = reader.read().unwrap().unwrap();
/// assert_eq!(record.name, "bar");
///
/// assert!(reader.read::<Record>().unwrap().is_none());
/// ```
pub struct CsvReader<R: Read> {
    tokenizer: Tokenizer<R>,
    config: CsvConfig,
    maps: ClassMapRegistry,
    converters: ConverterRegistry,
    headers: Option<Headers>,
    header_read: bool,
    done: bool,
}

impl<R: Read> CsvReader<R> {
    /// Consumes the header row on first use, when configured.
    fn ensure_header(&mut self) -> Result<(), CsvError> {
        if self.header_read {
            return Ok(());
        }
        self.header_read = true;
        if self.config.has_headers {
            match self.tokenizer.read_row()? {
                Some(row) => {
                    let names: Vec<String> =
                        row.iter().map(|field| field.text().to_owned()).collect();
                    debug!("header row consumed: {names:?}");
                    self.headers =
                        Some(Headers::new(names, self.config.case_insensitive_headers));
                }
                None => self.done = true,
            }
        }
        Ok(())
    }

    /// The column names of the header row, if headers are enabled and the
    /// stream was not empty. Consumes the header row on first call.
    pub fn headers(&mut self) -> Result<Option<&Headers>, CsvError> {
        self.ensure_header()?;
        Ok(self.headers.as_ref())
    }

    /// Reads the next record as `T`, or `Ok(None)` at end of stream.
    ///
    /// A class map for `T` must have been registered on the builder;
    /// otherwise this is a [`CsvError::Configuration`] error.
    pub fn read<T: 'static>(&mut self) -> Result<Option<T>, CsvError> {
        self.ensure_header()?;
        if self.done {
            return Ok(None);
        }
        let Some(row) = self.tokenizer.read_row()? else {
            debug!("end of stream after {} records", self.tokenizer.record());
            self.done = true;
            return Ok(None);
        };
        let map = self.maps.get::<T>().ok_or_else(|| {
            CsvError::Configuration(format!(
                "no class map registered for {}",
                std::any::type_name::<T>()
            ))
        })?;
        let ctx = BindContext::new(
            self.headers.as_ref(),
            &self.converters,
            self.config.strict,
            row.record(),
        );
        match binder::materialize(&map, &row, &ctx) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                error!("record {} could not be materialized: {err}", row.record());
                Err(err)
            }
        }
    }

    /// A lazy iterator over the remaining records.
    ///
    /// Each item is one record result; erroneous rows surface as `Err`
    /// without ending the iteration, and dropping the iterator simply stops
    /// reading.
    pub fn records<T: 'static>(&mut self) -> Records<'_, R, T> {
        Records {
            reader: self,
            _marker: PhantomData,
        }
    }

    /// Total bytes consumed from the underlying stream.
    pub fn position(&self) -> u64 {
        self.tokenizer.position()
    }
}

/// Iterator returned by [`CsvReader::records`].
pub struct Records<'r, R: Read, T> {
    reader: &'r mut CsvReader<R>,
    _marker: PhantomData<T>,
}

impl<R: Read, T: 'static> Iterator for Records<'_, R, T> {
    type Item = Result<T, CsvError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read::<T>().transpose()
    }
}

/// A builder for configuring CSV reading.
///
/// # Default Configuration
///
/// - Delimiter: comma (,)
/// - Quote: double quote (")
/// - Headers: disabled
/// - Header-name matching: case sensitive
/// - Policy: lenient (unresolved bound columns keep the constructed default)
/// - Byte counting and whitespace trimming: disabled
/// - Converters: the standard set ([`ConverterRegistry::with_defaults`])
///
/// # Examples
///
/// ```
/// use csv_bind_rs::reader::CsvReaderBuilder;
///
/// let builder = CsvReaderBuilder::new()
///     .delimiter(b';')
///     .has_headers(true)
///     .case_insensitive_headers(true);
/// # let _ = builder;
/// ```
#[derive(Default)]
pub struct CsvReaderBuilder {
    config: CsvConfig,
    maps: ClassMapRegistry,
    converters: ConverterRegistry,
}

impl CsvReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field delimiter (default: comma).
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// Sets the quote character (default: double quote).
    pub fn quote(mut self, quote: u8) -> Self {
        self.config.quote = quote;
        self
    }

    /// Treats the first row as column names for by-name binding.
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.config.has_headers = yes;
        self
    }

    /// Matches header names case-insensitively.
    pub fn case_insensitive_headers(mut self, yes: bool) -> Self {
        self.config.case_insensitive_headers = yes;
        self
    }

    /// Strict policy: a bound column missing from a row is an error instead
    /// of leaving the property at its default.
    pub fn strict(mut self, yes: bool) -> Self {
        self.config.strict = yes;
        self
    }

    /// Records the byte offset of every field (off by default; adds
    /// per-field bookkeeping).
    pub fn count_bytes(mut self, yes: bool) -> Self {
        self.config.count_bytes = yes;
        self
    }

    /// Trims surrounding whitespace of unquoted fields.
    pub fn trim(mut self, yes: bool) -> Self {
        self.config.trim = yes;
        self
    }

    /// Registers a class map. Registering another map for the same type
    /// replaces the previous one.
    pub fn map<T: 'static>(mut self, map: ClassMap<T>) -> Self {
        self.maps.register(map);
        self
    }

    /// Registers the map declared by the type itself (see
    /// [`Described`]). The declarations are scanned once, here; invalid
    /// declarations fail now rather than at row time.
    pub fn auto_map<T: Described>(mut self) -> Result<Self, CsvError> {
        self.maps.register(ClassMap::<T>::from_descriptor()?);
        Ok(self)
    }

    /// Replaces the converter registry.
    pub fn converters(mut self, converters: ConverterRegistry) -> Self {
        self.converters = converters;
        self
    }

    /// Creates a `CsvReader` from a reader.
    pub fn from_reader<R: Read>(self, rdr: R) -> CsvReader<R> {
        CsvReader {
            tokenizer: Tokenizer::new(rdr, &self.config),
            config: self.config,
            maps: self.maps,
            converters: self.converters,
            headers: None,
            header_read: false,
            done: false,
        }
    }

    /// Creates a `CsvReader` reading from a file.
    ///
    /// # Panics
    /// Panics if the file cannot be opened: opening is an initialization
    /// step and fails fast, while row errors are returned as `Result`s.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> CsvReader<File> {
        let file = File::open(path).expect("Unable to open file");
        self.from_reader(file)
    }
}
