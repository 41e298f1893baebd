use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::config::CsvConfig;
use crate::convert::ConverterRegistry;
use crate::core::binder::{self, WriteContext};
use crate::error::CsvError;
use crate::mapping::property::GroupScope;
use crate::mapping::{ClassMap, ClassMapRegistry, Described};

/// A typed CSV writer.
///
/// Records are flattened through their class map into one row per record;
/// fields containing the delimiter, the quote character or a line terminator
/// are quoted, and quote characters inside quoted fields are escaped by
/// doubling. Rows are terminated with `\n`.
///
/// # Examples
///
/// ```
/// use csv_bind_rs::mapping::{ClassMap, Property};
/// use csv_bind_rs::writer::CsvWriterBuilder;
///
/// #[derive(Default)]
/// struct City {
///     name: String,
///     population: u64,
/// }
///
/// let map = ClassMap::builder()
///     .property(Property::new(
///         "city",
///         |c: &City| c.name.clone(),
///         |c: &mut City, v| c.name = v,
///     ))
///     .property(Property::new(
///         "popcount",
///         |c: &City| c.population,
///         |c: &mut City, v| c.population = v,
///     ))
///     .build()
///     .unwrap();
///
/// let mut wtr = CsvWriterBuilder::new()
///     .has_headers(true)
///     .map(map)
///     .from_writer(vec![]);
///
/// wtr.write(&City {
///     name: "Boston".to_owned(),
///     population: 4628910,
/// })
/// .unwrap();
///
/// wtr.write(&City {
///     name: "Concord".to_owned(),
///     population: 42695,
/// })
/// .unwrap();
///
/// let data = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
/// assert_eq!(data, "\
/// city,popcount
/// Boston,4628910
/// Concord,42695
/// ");
/// ```
pub struct CsvWriter<W: Write> {
    out: BufWriter<W>,
    config: CsvConfig,
    maps: ClassMapRegistry,
    converters: ConverterRegistry,
    header_written: bool,
    record: u64,
}

impl<W: Write> CsvWriter<W> {
    fn map_for<T: 'static>(&self) -> Result<std::sync::Arc<ClassMap<T>>, CsvError> {
        self.maps.get::<T>().ok_or_else(|| {
            CsvError::Configuration(format!(
                "no class map registered for {}",
                std::any::type_name::<T>()
            ))
        })
    }

    /// Writes the header row for `T`: each property's primary display name,
    /// recursing into references for nested headers.
    pub fn write_header<T: 'static>(&mut self) -> Result<(), CsvError> {
        let map = self.map_for::<T>()?;
        let mut names = Vec::new();
        map.emit_header(&mut names, GroupScope::default());
        self.write_row(&names)?;
        self.header_written = true;
        self.record += 1;
        debug!("header row written: {names:?}");
        Ok(())
    }

    /// Writes one record. When headers are enabled and none has been written
    /// yet, the header row for `T` is emitted first.
    pub fn write<T: 'static>(&mut self, record: &T) -> Result<(), CsvError> {
        if self.config.has_headers && !self.header_written {
            self.write_header::<T>()?;
        }
        let map = self.map_for::<T>()?;
        let ctx = WriteContext {
            converters: &self.converters,
            record: self.record,
        };
        let mut fields = Vec::new();
        binder::flatten(&map, record, &ctx, &mut fields)?;
        self.write_row(&fields)?;
        self.record += 1;
        Ok(())
    }

    fn write_row(&mut self, fields: &[String]) -> Result<(), CsvError> {
        for (index, field) in fields.iter().enumerate() {
            if index > 0 {
                self.out.write_all(&[self.config.delimiter])?;
            }
            self.write_field(field)?;
        }
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn write_field(&mut self, text: &str) -> Result<(), CsvError> {
        let quote = self.config.quote;
        let needs_quoting = text
            .bytes()
            .any(|b| b == self.config.delimiter || b == quote || b == b'\r' || b == b'\n');
        if !needs_quoting {
            self.out.write_all(text.as_bytes())?;
            return Ok(());
        }
        let mut escaped = Vec::with_capacity(text.len() + 2);
        escaped.push(quote);
        for byte in text.bytes() {
            if byte == quote {
                escaped.push(quote);
            }
            escaped.push(byte);
        }
        escaped.push(quote);
        self.out.write_all(&escaped)?;
        Ok(())
    }

    /// Flushes the internal buffer and the underlying sink.
    pub fn flush(&mut self) -> Result<(), CsvError> {
        self.out.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying sink.
    pub fn into_inner(self) -> Result<W, CsvError> {
        self.out
            .into_inner()
            .map_err(|err| CsvError::Io(err.into_error()))
    }
}

/// A builder for configuring CSV writing.
///
/// # Default Configuration
///
/// - Delimiter: comma (,)
/// - Quote: double quote (")
/// - Headers: disabled
/// - Converters: the standard set ([`ConverterRegistry::with_defaults`])
#[derive(Default)]
pub struct CsvWriterBuilder {
    config: CsvConfig,
    maps: ClassMapRegistry,
    converters: ConverterRegistry,
}

impl CsvWriterBuilder {
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

    /// Emits a header row before the first record.
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.config.has_headers = yes;
        self
    }

    /// Registers a class map. Registering another map for the same type
    /// replaces the previous one.
    pub fn map<T: 'static>(mut self, map: ClassMap<T>) -> Self {
        self.maps.register(map);
        self
    }

    /// Registers the map declared by the type itself (see [`Described`]).
    pub fn auto_map<T: Described>(mut self) -> Result<Self, CsvError> {
        self.maps.register(ClassMap::<T>::from_descriptor()?);
        Ok(self)
    }

    /// Replaces the converter registry.
    pub fn converters(mut self, converters: ConverterRegistry) -> Self {
        self.converters = converters;
        self
    }

    /// Creates a `CsvWriter` writing to the given sink.
    pub fn from_writer<W: Write>(self, wtr: W) -> CsvWriter<W> {
        CsvWriter {
            out: BufWriter::new(wtr),
            config: self.config,
            maps: self.maps,
            converters: self.converters,
            header_written: false,
            record: 0,
        }
    }

    /// Creates a `CsvWriter` writing to a file.
    ///
    /// # Panics
    /// Panics if the file cannot be created: opening is an initialization
    /// step and fails fast, while row errors are returned as `Result`s.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> CsvWriter<File> {
        let file = File::create(path).expect("Unable to create file");
        self.from_writer(file)
    }
}
