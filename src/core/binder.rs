//! The record binder: materializes typed records from rows and flattens
//! records back into field sequences, walking a class map in declaration
//! order and delegating text conversion to the converter registry.

use crate::convert::{ConverterRegistry, Value};
use crate::core::{Headers, Row};
use crate::error::CsvError;
use crate::mapping::property::{GroupScope, Property};
use crate::mapping::{ClassMap, Entry};

/// Everything a read-side binding needs besides the row itself.
#[derive(Clone, Copy)]
pub(crate) struct BindContext<'a> {
    pub headers: Option<&'a Headers>,
    pub converters: &'a ConverterRegistry,
    pub strict: bool,
    pub record: u64,
    pub scope: GroupScope,
}

impl<'a> BindContext<'a> {
    pub(crate) fn new(
        headers: Option<&'a Headers>,
        converters: &'a ConverterRegistry,
        strict: bool,
        record: u64,
    ) -> Self {
        Self {
            headers,
            converters,
            strict,
            record,
            scope: GroupScope::default(),
        }
    }

    pub(crate) fn with_scope(self, scope: GroupScope) -> Self {
        Self { scope, ..self }
    }
}

/// Write-side counterpart of [`BindContext`].
#[derive(Clone, Copy)]
pub(crate) struct WriteContext<'a> {
    pub converters: &'a ConverterRegistry,
    pub record: u64,
}

/// Builds one record of `T` from a row.
///
/// Properties that do not resolve to a field of the row are left at the
/// value the construction strategy gave them, unless the strict policy is
/// active. A conversion failure aborts this record only.
pub(crate) fn materialize<T: 'static>(
    map: &ClassMap<T>,
    row: &Row,
    ctx: &BindContext<'_>,
) -> Result<T, CsvError> {
    let mut target = map.construct();
    for entry in map.entries() {
        match entry {
            Entry::Property(property) => bind_property(property, row, ctx, &mut target)?,
            Entry::Reference(reference) => reference.materialize_into(&mut target, row, ctx)?,
        }
    }
    Ok(target)
}

fn bind_property<T>(
    property: &Property<T>,
    row: &Row,
    ctx: &BindContext<'_>,
    target: &mut T,
) -> Result<(), CsvError> {
    if property.is_ignored() {
        return Ok(());
    }
    let field = property
        .resolve(ctx.headers, ctx.scope)
        .and_then(|index| row.get(index));
    let Some(field) = field else {
        if ctx.strict {
            return Err(CsvError::Conversion {
                text: String::new(),
                target: property.kind(),
                record: ctx.record,
                column: property.display_column(ctx.scope),
            });
        }
        // Lenient policy: the property keeps its constructed default.
        return Ok(());
    };

    let value = if field.text().is_empty() && property.nullable() {
        Value::Null
    } else {
        let converter = match property.converter_override() {
            Some(converter) => converter,
            None => ctx.converters.resolve(property.kind())?,
        };
        converter
            .convert_from_text(field.text(), property.kind())
            .map_err(|failure| CsvError::Conversion {
                text: failure.text,
                target: failure.target,
                record: ctx.record,
                column: property.display_column(ctx.scope),
            })?
    };

    if !property.set_value(target, value) {
        // The converter produced the declared kind but the record field is
        // narrower than the parsed value.
        return Err(CsvError::Conversion {
            text: field.text().to_owned(),
            target: property.kind(),
            record: ctx.record,
            column: property.display_column(ctx.scope),
        });
    }
    Ok(())
}

/// Flattens one record into field texts, in declaration order. Reference
/// entries splice their nested fields at their declared position.
pub(crate) fn flatten<T: 'static>(
    map: &ClassMap<T>,
    source: &T,
    ctx: &WriteContext<'_>,
    out: &mut Vec<String>,
) -> Result<(), CsvError> {
    for entry in map.entries() {
        match entry {
            Entry::Property(property) => {
                if property.is_ignored() {
                    continue;
                }
                let value = property.get_value(source);
                let text = if value.is_null() {
                    String::new()
                } else {
                    let converter = match property.converter_override() {
                        Some(converter) => converter,
                        None => ctx.converters.resolve(property.kind())?,
                    };
                    converter
                        .convert_to_text(&value)
                        .map_err(|failure| CsvError::Conversion {
                            text: failure.text,
                            target: failure.target,
                            record: ctx.record,
                            column: property.display_column(GroupScope::default()),
                        })?
                };
                out.push(text);
            }
            Entry::Reference(reference) => reference.flatten_into(source, out, ctx)?,
        }
    }
    Ok(())
}
