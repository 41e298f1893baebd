/*!
 # CSV Bind for Rust

 **csv-bind-rs** is a typed CSV codec: it reads delimited text into typed
 records and writes typed records back into delimited text, driven by a
 declarative mapping between CSV columns and record properties. No derive
 macro and no runtime reflection: the mapping is an explicit, inspectable
 object built once and shared by every row.

 ## Core Concepts

 Understanding these core components will help you get started:

 - **Tokenizer:** Splits the raw byte stream into rows of string fields
   under RFC-4180-like quoting rules. Quoted fields may embed delimiters and
   line breaks; doubled quotes are literal quotes.
 - **Class Map:** Describes, for one target type, how each property
   corresponds to a column — by header name, by fixed index, or through a
   nested *reference* map (optionally a collection populated from repeating
   column groups).
 - **Type Converter:** A strategy object converting raw field text to a
   typed value and back. Converters are looked up per property in a
   registry owned by each reader or writer; per-property overrides are
   supported.
 - **Reader / Writer:** Pull-based, synchronous front-ends. The reader
   materializes one record per row on demand; the writer flattens records
   into quoted, escaped rows.

 ## Getting Started

```rust
use csv_bind_rs::error::CsvError;
use csv_bind_rs::mapping::{ClassMap, Property};
use csv_bind_rs::reader::CsvReaderBuilder;
use csv_bind_rs::writer::CsvWriterBuilder;

#[derive(Debug, Default, Clone, PartialEq)]
struct Car {
    year: u16,
    make: String,
    model: String,
}

fn car_map() -> Result<ClassMap<Car>, CsvError> {
    ClassMap::builder()
        .property(Property::new("year", |c: &Car| c.year, |c: &mut Car, v| c.year = v))
        .property(Property::new(
            "make",
            |c: &Car| c.make.clone(),
            |c: &mut Car, v| c.make = v,
        ))
        .property(Property::new(
            "model",
            |c: &Car| c.model.clone(),
            |c: &mut Car, v| c.model = v,
        ))
        .build()
}

fn main() -> Result<(), CsvError> {
    let csv = "year,make,model
1948,Porsche,356
2021,Mazda,CX-30
";

    let mut reader = CsvReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .map(car_map()?)
        .from_reader(csv.as_bytes());

    let mut cars = Vec::new();
    for car in reader.records::<Car>() {
        cars.push(car?);
    }
    assert_eq!(cars.len(), 2);
    assert_eq!(cars[0].make, "Porsche");

    let mut writer = CsvWriterBuilder::new()
        .has_headers(true)
        .map(car_map()?)
        .from_writer(vec![]);
    for car in &cars {
        writer.write(car)?;
    }

    let out = String::from_utf8(writer.into_inner()?).unwrap();
    assert_eq!(out, csv);

    Ok(())
}
```

 ## Configuration

 | **Option**                 | **Default** | **Description**                                   |
 |----------------------------|-------------|---------------------------------------------------|
 | `delimiter`                | `,`         | Field delimiter                                   |
 | `quote`                    | `"`         | Quote character                                   |
 | `has_headers`              | off         | First row names the columns                       |
 | `case_insensitive_headers` | off         | Header-name matching ignores case                 |
 | `strict`                   | off         | Unresolved bound columns error instead of default |
 | `count_bytes`              | off         | Record the byte offset of every field             |
 | `trim`                     | off         | Trim whitespace of unquoted fields                |

 Converters accept their own configuration at construction: numeric parse
 style, date format strings, and boolean alias token sets. See the
 [`convert`] module.
*/

/// Core row model, tokenizer and record binder
pub mod core;

/// Structural configuration shared by readers and writers
pub mod config;

/// Conversion between raw field text and typed values
pub mod convert;

/// Error types for the codec
pub mod error;

/// Declarative bindings between target types and CSV columns
pub mod mapping;

/// The typed CSV reader
pub mod reader;

/// The typed CSV writer
pub mod writer;

#[doc(inline)]
pub use error::*;
