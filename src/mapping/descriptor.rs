use crate::mapping::Property;

/// The injected type-descriptor capability: a type that can enumerate its
/// own properties together with their column declarations.
///
/// This is the declarative counterpart of
/// [`ClassMap::builder`](crate::mapping::ClassMap::builder): instead of
/// assembling the map at the configuration site, the target type carries its
/// column declarations (acceptable names, fixed index, ignore flag,
/// converter override) next to its definition, and the mapping engine scans
/// them once when the type is registered. The engine never inspects the type
/// beyond this capability.
///
/// ```
/// use csv_bind_rs::mapping::{Described, Property, TypeDescriptor};
///
/// #[derive(Default)]
/// struct Person {
///     id: i64,
///     name: String,
/// }
///
/// impl Described for Person {
///     fn type_descriptor() -> TypeDescriptor<Self> {
///         TypeDescriptor::new()
///             .property(
///                 Property::new("id", |p: &Person| p.id, |p: &mut Person, v| p.id = v)
///                     .names(["Id1", "Id2"]),
///             )
///             .property(
///                 Property::new(
///                     "name",
///                     |p: &Person| p.name.clone(),
///                     |p: &mut Person, v| p.name = v,
///                 )
///                 .name("Name1"),
///             )
///     }
/// }
/// ```
pub trait Described: Default + Sized + 'static {
    /// Lists the type's properties with their column declarations. Called
    /// once per registration; the built map is cached by the registry.
    fn type_descriptor() -> TypeDescriptor<Self>;
}

/// The property list a [`Described`] type exposes.
pub struct TypeDescriptor<T> {
    properties: Vec<Property<T>>,
}

impl<T: 'static> TypeDescriptor<T> {
    pub fn new() -> Self {
        Self {
            properties: Vec::new(),
        }
    }

    /// Declares one property. Declaration order fixes write and header
    /// order, exactly as with the explicit builder.
    pub fn property(mut self, property: Property<T>) -> Self {
        self.properties.push(property);
        self
    }

    pub(crate) fn into_properties(self) -> Vec<Property<T>> {
        self.properties
    }
}

impl<T: 'static> Default for TypeDescriptor<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Headers;
    use crate::mapping::property::GroupScope;
    use crate::mapping::{ClassMap, Entry};

    #[derive(Debug, Default, PartialEq)]
    struct Annotated {
        id: i64,
        code: String,
        skipped: String,
    }

    impl Described for Annotated {
        fn type_descriptor() -> TypeDescriptor<Self> {
            TypeDescriptor::new()
                .property(
                    Property::new("id", |a: &Annotated| a.id, |a: &mut Annotated, v| a.id = v)
                        .names(["Id1", "Id2"]),
                )
                .property(
                    Property::new(
                        "code",
                        |a: &Annotated| a.code.clone(),
                        |a: &mut Annotated, v| a.code = v,
                    )
                    .index(2),
                )
                .property(
                    Property::new(
                        "skipped",
                        |a: &Annotated| a.skipped.clone(),
                        |a: &mut Annotated, v| a.skipped = v,
                    )
                    .ignore(),
                )
        }
    }

    #[test]
    fn descriptor_declarations_become_a_class_map() {
        let map = ClassMap::<Annotated>::from_descriptor().unwrap();
        assert_eq!(map.entries().len(), 3);

        let headers = Headers::new(vec!["Id2".to_owned(), "x".to_owned()], false);
        let scope = GroupScope::default();
        match &map.entries()[0] {
            Entry::Property(p) => {
                // Second acceptable name matches the header.
                assert_eq!(p.resolve(Some(&headers), scope), Some(0));
            }
            Entry::Reference(_) => panic!("expected a property"),
        }
        match &map.entries()[1] {
            Entry::Property(p) => {
                // Index binding resolves without consulting the header.
                assert_eq!(p.resolve(None, scope), Some(2));
            }
            Entry::Reference(_) => panic!("expected a property"),
        }
        match &map.entries()[2] {
            Entry::Property(p) => assert!(p.is_ignored()),
            Entry::Reference(_) => panic!("expected a property"),
        }
    }

    #[test]
    fn duplicate_descriptor_declarations_fail_to_build() {
        #[derive(Default)]
        struct Twice {
            id: i64,
        }
        impl Described for Twice {
            fn type_descriptor() -> TypeDescriptor<Self> {
                TypeDescriptor::new()
                    .property(Property::new("id", |t: &Twice| t.id, |t: &mut Twice, v| t.id = v))
                    .property(Property::new("id", |t: &Twice| t.id, |t: &mut Twice, v| t.id = v))
            }
        }

        let err = ClassMap::<Twice>::from_descriptor().unwrap_err();
        assert!(matches!(err, crate::error::CsvError::Configuration(_)));
    }
}
