use std::sync::Arc;

use crate::convert::{CsvValue, TypeConverter, Value, ValueKind};
use crate::core::Headers;

/// Column-resolution scope for repeating reference groups: a name suffix for
/// name-bound columns and an index shift for index-bound ones.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct GroupScope {
    pub suffix: Option<usize>,
    pub shift: usize,
}

impl GroupScope {
    pub(crate) fn decorate(&self, name: &str) -> String {
        match self.suffix {
            Some(k) => format!("{name}{k}"),
            None => name.to_owned(),
        }
    }
}

/// Binds one property of the target type to a CSV column.
///
/// A property resolves its column either by a fixed index or by the first
/// matching entry of its acceptable-name list; when no names are configured
/// the property name itself is the acceptable name. Index binding wins over
/// name binding when both are configured.
///
/// ```
/// use csv_bind_rs::mapping::Property;
///
/// #[derive(Default)]
/// struct Car {
///     year: u16,
/// }
///
/// let property = Property::new("year", |c: &Car| c.year, |c: &mut Car, v| c.year = v)
///     .name("Year Column")
///     .index(0);
/// # let _ = property;
/// ```
pub struct Property<T> {
    name: String,
    names: Vec<String>,
    index: Option<usize>,
    ignore: bool,
    converter: Option<Arc<dyn TypeConverter>>,
    kind: ValueKind,
    nullable: bool,
    get: Box<dyn Fn(&T) -> Value + Send + Sync>,
    set: Box<dyn Fn(&mut T, Value) -> bool + Send + Sync>,
}

impl<T> Property<T> {
    /// Binds `name` to the given accessor pair. The value type of the
    /// accessors determines the conversion kind.
    pub fn new<V: CsvValue>(
        name: &str,
        get: impl Fn(&T) -> V + Send + Sync + 'static,
        set: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_owned(),
            names: Vec::new(),
            index: None,
            ignore: false,
            converter: None,
            kind: V::KIND,
            nullable: V::NULLABLE,
            get: Box::new(move |target| get(target).to_value()),
            set: Box::new(move |target, value| match V::from_value(value) {
                Some(v) => {
                    set(target, v);
                    true
                }
                None => false,
            }),
        }
    }

    /// Adds an acceptable column name. Names are tried in the order they
    /// were added; the first one present in the header wins.
    pub fn name(mut self, name: &str) -> Self {
        self.names.push(name.to_owned());
        self
    }

    /// Adds several acceptable column names at once.
    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Binds the property to a fixed column index. Index binding wins over
    /// name binding when both are configured.
    pub fn index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Excludes the property from reading and writing entirely.
    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Overrides the registry converter for this property.
    pub fn converter(mut self, converter: Arc<dyn TypeConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub(crate) fn property_name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_ignored(&self) -> bool {
        self.ignore
    }

    pub(crate) fn kind(&self) -> ValueKind {
        self.kind
    }

    pub(crate) fn nullable(&self) -> bool {
        self.nullable
    }

    pub(crate) fn converter_override(&self) -> Option<&Arc<dyn TypeConverter>> {
        self.converter.as_ref()
    }

    pub(crate) fn get_value(&self, target: &T) -> Value {
        (self.get)(target)
    }

    pub(crate) fn set_value(&self, target: &mut T, value: Value) -> bool {
        (self.set)(target, value)
    }

    /// Acceptable names in priority order; the property name when none were
    /// configured.
    fn candidate_names(&self) -> &[String] {
        if self.names.is_empty() {
            std::slice::from_ref(&self.name)
        } else {
            &self.names
        }
    }

    /// The primary display name used for header emission.
    pub(crate) fn header_name(&self) -> &str {
        self.candidate_names()
            .first()
            .map(String::as_str)
            .unwrap_or(&self.name)
    }

    /// Resolves the column for this property within the given scope: fixed
    /// index first, then acceptable names against the header.
    pub(crate) fn resolve(&self, headers: Option<&Headers>, scope: GroupScope) -> Option<usize> {
        if let Some(index) = self.index {
            return Some(index + scope.shift);
        }
        let headers = headers?;
        self.candidate_names()
            .iter()
            .find_map(|name| headers.position(&scope.decorate(name)))
    }

    /// Column description used in error positions: the primary name, or
    /// `#index` for index-bound properties.
    pub(crate) fn display_column(&self, scope: GroupScope) -> String {
        match self.index {
            Some(index) => format!("#{}", index + scope.shift),
            None => scope.decorate(self.header_name()),
        }
    }
}
