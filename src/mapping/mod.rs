//! Declarative bindings between target types and CSV columns.
//!
//! A [`ClassMap`] describes, for one target type, how each property
//! corresponds to a column ([`Property`]) or to a nested type
//! ([`Reference`]). Maps are built once, either explicitly through
//! [`ClassMapBuilder`] or from the per-property declarations of a
//! [`Described`] type, and are immutable afterwards, so one map can be
//! shared across any number of reader and writer instances.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::core::binder::BindContext;
use crate::core::Row;
use crate::error::CsvError;

pub mod descriptor;
pub mod property;
pub mod reference;

pub use descriptor::{Described, TypeDescriptor};
pub use property::Property;
pub use reference::Reference;

use property::GroupScope;

/// One binding of a class map, in declaration order.
pub(crate) enum Entry<T> {
    Property(Property<T>),
    Reference(Reference<T>),
}

impl<T: 'static> Entry<T> {
    fn bound_name(&self) -> &str {
        match self {
            Entry::Property(p) => p.property_name(),
            Entry::Reference(r) => r.property_name(),
        }
    }
}

/// Column bindings for one target type.
///
/// Declaration order is significant: it fixes the order in which fields are
/// written and headers are emitted.
pub struct ClassMap<T> {
    entries: Vec<Entry<T>>,
    construct: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T> std::fmt::Debug for ClassMap<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassMap")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl<T: Default + 'static> ClassMap<T> {
    /// A builder constructing instances with `T::default()`.
    pub fn builder() -> ClassMapBuilder<T> {
        ClassMapBuilder::new()
    }
}

impl<T: 'static> ClassMap<T> {
    /// Builds the map declared by the type itself (see [`Described`]).
    pub fn from_descriptor() -> Result<Self, CsvError>
    where
        T: Described,
    {
        let mut builder = ClassMapBuilder::new();
        for property in T::type_descriptor().into_properties() {
            builder = builder.property(property);
        }
        builder.build()
    }

    pub(crate) fn construct(&self) -> T {
        (self.construct)()
    }

    pub(crate) fn entries(&self) -> &[Entry<T>] {
        &self.entries
    }

    /// Number of header columns one instance of this map spans. Collection
    /// references count their configured group cap (one group when uncapped).
    pub(crate) fn header_width(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry {
                Entry::Property(p) => usize::from(!p.is_ignored()),
                Entry::Reference(r) => r.width(),
            })
            .sum()
    }

    pub(crate) fn emit_header(&self, out: &mut Vec<String>, scope: GroupScope) {
        for entry in &self.entries {
            match entry {
                Entry::Property(p) => {
                    if !p.is_ignored() {
                        out.push(scope.decorate(p.header_name()));
                    }
                }
                Entry::Reference(r) => r.header_into(out),
            }
        }
    }

    /// Whether any bound column of this map (or of its nested maps) resolves
    /// to a field present in the row. Used to detect absent repeating groups.
    pub(crate) fn any_column_present(&self, row: &Row, ctx: &BindContext<'_>) -> bool {
        self.entries.iter().any(|entry| match entry {
            Entry::Property(p) => !p.is_ignored()
                && p.resolve(ctx.headers, ctx.scope)
                    .is_some_and(|index| index < row.len()),
            Entry::Reference(r) => r.any_present(row, ctx),
        })
    }
}

/// Builder for [`ClassMap`].
///
/// Duplicate property bindings and converter capability violations are
/// configuration errors raised by [`ClassMapBuilder::build`], never during
/// row processing.
///
/// ```
/// use csv_bind_rs::mapping::{ClassMap, Property};
///
/// #[derive(Default)]
/// struct Car {
///     year: u16,
///     make: String,
/// }
///
/// let map: ClassMap<Car> = ClassMap::builder()
///     .property(Property::new("year", |c: &Car| c.year, |c: &mut Car, v| c.year = v))
///     .property(Property::new("make", |c: &Car| c.make.clone(), |c: &mut Car, v| c.make = v))
///     .build()
///     .unwrap();
/// # let _ = map;
/// ```
pub struct ClassMapBuilder<T> {
    entries: Vec<Entry<T>>,
    construct: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T: Default + 'static> ClassMapBuilder<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            construct: Box::new(T::default),
        }
    }
}

impl<T: Default + 'static> Default for ClassMapBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> ClassMapBuilder<T> {
    /// A builder for types without `Default`, constructed by the given
    /// strategy.
    pub fn with_constructor(construct: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            entries: Vec::new(),
            construct: Box::new(construct),
        }
    }

    /// Replaces the construction strategy.
    pub fn constructor(mut self, construct: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.construct = Box::new(construct);
        self
    }

    pub fn property(mut self, property: Property<T>) -> Self {
        self.entries.push(Entry::Property(property));
        self
    }

    pub fn reference(mut self, reference: Reference<T>) -> Self {
        self.entries.push(Entry::Reference(reference));
        self
    }

    pub fn build(self) -> Result<ClassMap<T>, CsvError> {
        let mut seen = HashSet::new();
        for entry in &self.entries {
            let name = entry.bound_name();
            if !seen.insert(name.to_owned()) {
                return Err(CsvError::Configuration(format!(
                    "property {name:?} is bound more than once"
                )));
            }
            if let Entry::Property(p) = entry {
                if let Some(converter) = p.converter_override() {
                    if !converter.can_convert(p.kind()) {
                        return Err(CsvError::Configuration(format!(
                            "converter for property {name:?} does not accept values of type {}",
                            p.kind()
                        )));
                    }
                }
            }
        }
        Ok(ClassMap {
            entries: self.entries,
            construct: self.construct,
        })
    }
}

/// Type-to-map registry owned by one reader or writer instance.
///
/// Maps are stored behind [`Arc`] so a registered map is shared, not copied,
/// across every row processed by the instance. Registering a map for an
/// already registered type replaces the previous map.
#[derive(Default, Clone)]
pub struct ClassMapRegistry {
    maps: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ClassMapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: 'static>(&mut self, map: ClassMap<T>) {
        self.maps
            .insert(TypeId::of::<T>(), Arc::new(map) as Arc<dyn Any + Send + Sync>);
    }

    pub fn get<T: 'static>(&self) -> Option<Arc<ClassMap<T>>> {
        self.maps
            .get(&TypeId::of::<T>())
            .and_then(|map| Arc::clone(map).downcast::<ClassMap<T>>().ok())
    }
}
