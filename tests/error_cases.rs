mod common;

use std::io::{self, ErrorKind};

use anyhow::Result;
use common::mocks::MockStream;
use csv_bind_rs::convert::{ConverterRegistry, ValueKind};
use csv_bind_rs::error::CsvError;
use csv_bind_rs::mapping::{ClassMap, Property};
use csv_bind_rs::reader::CsvReaderBuilder;
use csv_bind_rs::writer::CsvWriterBuilder;

#[derive(Debug, Default, Clone, PartialEq)]
struct Entry {
    n: i64,
    text: String,
}

fn entry_map() -> Result<ClassMap<Entry>> {
    let map = ClassMap::builder()
        .property(Property::new("n", |e: &Entry| e.n, |e: &mut Entry, v| e.n = v).index(0))
        .property(
            Property::new("text", |e: &Entry| e.text.clone(), |e: &mut Entry, v| e.text = v)
                .index(1),
        )
        .build()?;
    Ok(map)
}

#[test]
fn conversion_errors_carry_text_and_position() -> Result<()> {
    let mut reader = CsvReaderBuilder::new()
        .map(entry_map()?)
        .from_reader("abc,first\n".as_bytes());

    let err = reader.read::<Entry>().unwrap_err();
    match err {
        CsvError::Conversion {
            text,
            target,
            record,
            column,
        } => {
            assert_eq!(text, "abc");
            assert_eq!(target, ValueKind::Int);
            assert_eq!(record, 0);
            assert_eq!(column, "#0");
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn the_stream_stays_readable_after_a_row_error() -> Result<()> {
    let mut reader = CsvReaderBuilder::new()
        .map(entry_map()?)
        .from_reader("1,ok\nbad,skipped\n3,resumed\n".as_bytes());

    assert_eq!(reader.read::<Entry>()?.unwrap().n, 1);
    assert!(reader.read::<Entry>().is_err());
    assert_eq!(reader.read::<Entry>()?.unwrap().text, "resumed");
    assert!(reader.read::<Entry>()?.is_none());
    Ok(())
}

#[test]
fn malformed_fields_report_record_and_column() -> Result<()> {
    let mut reader = CsvReaderBuilder::new()
        .map(entry_map()?)
        .from_reader("1,ok\n2,\"bad\"x\n".as_bytes());

    assert!(reader.read::<Entry>()?.is_some());
    let err = reader.read::<Entry>().unwrap_err();
    match err {
        CsvError::MalformedField { record, column, .. } => {
            assert_eq!(record, 1);
            assert_eq!(column, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn an_empty_converter_registry_rejects_every_kind() -> Result<()> {
    let mut reader = CsvReaderBuilder::new()
        .converters(ConverterRegistry::empty())
        .map(entry_map()?)
        .from_reader("1,x\n".as_bytes());

    let err = reader.read::<Entry>().unwrap_err();
    assert!(matches!(err, CsvError::UnsupportedType(ValueKind::Int)));
    Ok(())
}

#[test]
fn read_errors_from_the_underlying_stream_are_propagated() -> Result<()> {
    let mut stream = MockStream::new();
    stream
        .expect_read()
        .returning(|_| Err(io::Error::new(ErrorKind::BrokenPipe, "stream failed")));

    let mut reader = CsvReaderBuilder::new().map(entry_map()?).from_reader(stream);
    let err = reader.read::<Entry>().unwrap_err();
    match err {
        CsvError::Io(io_err) => assert_eq!(io_err.kind(), ErrorKind::BrokenPipe),
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn write_errors_from_the_underlying_sink_are_propagated() -> Result<()> {
    let mut stream = MockStream::new();
    stream
        .expect_write()
        .returning(|_| Err(io::Error::new(ErrorKind::WriteZero, "sink failed")));
    stream.expect_flush().returning(|| Ok(()));

    let mut writer = CsvWriterBuilder::new().map(entry_map()?).from_writer(stream);
    writer.write(&Entry {
        n: 1,
        text: "x".to_owned(),
    })?;

    let err = writer.flush().unwrap_err();
    assert!(matches!(err, CsvError::Io(_)));
    Ok(())
}

#[test]
fn values_too_large_for_the_record_field_fail_to_bind() -> Result<()> {
    #[derive(Debug, Default)]
    struct Tiny {
        n: u8,
    }

    let map = ClassMap::<Tiny>::builder()
        .property(Property::new("n", |t: &Tiny| t.n, |t: &mut Tiny, v| t.n = v).index(0))
        .build()?;

    let mut reader = CsvReaderBuilder::new().map(map).from_reader("300\n".as_bytes());
    let err = reader.read::<Tiny>().unwrap_err();
    match err {
        CsvError::Conversion { text, .. } => assert_eq!(text, "300"),
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}
