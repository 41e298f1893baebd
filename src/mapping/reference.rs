use std::sync::Arc;

use crate::core::binder::{self, BindContext, WriteContext};
use crate::core::Row;
use crate::error::CsvError;
use crate::mapping::property::GroupScope;
use crate::mapping::ClassMap;

/// Binds a property to an entire nested class map.
///
/// A plain reference resolves its nested map against the same row: columns
/// are a flat namespace, the nested map simply claims a subset of them. A
/// collection reference repeats nested-map resolution against numbered
/// column groups (`Phone1`, `Phone2`, ... for name-bound columns, or an
/// index shift of one stride per group) and pushes one nested instance per
/// group into a growable collection. The scan stops at the configured group
/// cap, or at the first group with no resolvable column.
pub struct Reference<T> {
    name: String,
    max_groups: Option<usize>,
    stride: Option<usize>,
    ops: Box<dyn ReferenceOps<T> + Send + Sync>,
}

impl<T: 'static> Reference<T> {
    /// Binds `name` to a single nested instance described by `nested`.
    pub fn new<U: 'static>(
        name: &str,
        nested: ClassMap<U>,
        get: impl Fn(&T) -> U + Send + Sync + 'static,
        set: impl Fn(&mut T, U) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_owned(),
            max_groups: None,
            stride: None,
            ops: Box::new(SingleOps {
                nested: Arc::new(nested),
                get: Box::new(get),
                set: Box::new(set),
            }),
        }
    }

    /// Binds `name` to a collection populated from repeating column groups.
    pub fn collection<U: 'static>(
        name: &str,
        nested: ClassMap<U>,
        get: impl Fn(&T) -> Vec<U> + Send + Sync + 'static,
        push: impl Fn(&mut T, U) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_owned(),
            max_groups: None,
            stride: None,
            ops: Box::new(CollectionOps {
                nested: Arc::new(nested),
                get: Box::new(get),
                push: Box::new(push),
            }),
        }
    }

    /// Caps the number of repeating groups scanned for a collection.
    pub fn max_groups(mut self, max_groups: usize) -> Self {
        self.max_groups = Some(max_groups);
        self
    }

    /// Columns consumed by one repeating group of index-bound nested
    /// properties. Defaults to the nested map's header width.
    pub fn stride(mut self, stride: usize) -> Self {
        self.stride = Some(stride);
        self
    }

    fn scan(&self) -> GroupScan {
        GroupScan {
            max_groups: self.max_groups,
            stride: self.stride,
        }
    }

    pub(crate) fn property_name(&self) -> &str {
        &self.name
    }

    pub(crate) fn materialize_into(
        &self,
        target: &mut T,
        row: &Row,
        ctx: &BindContext<'_>,
    ) -> Result<(), CsvError> {
        self.ops.materialize_into(target, row, ctx, self.scan())
    }

    pub(crate) fn flatten_into(
        &self,
        source: &T,
        out: &mut Vec<String>,
        ctx: &WriteContext<'_>,
    ) -> Result<(), CsvError> {
        self.ops.flatten_into(source, out, ctx)
    }

    pub(crate) fn header_into(&self, out: &mut Vec<String>) {
        self.ops.header_into(out, self.scan());
    }

    pub(crate) fn any_present(&self, row: &Row, ctx: &BindContext<'_>) -> bool {
        self.ops.any_present(row, ctx)
    }

    pub(crate) fn width(&self) -> usize {
        self.ops.width(self.scan())
    }
}

/// Group-scan bounds of a collection reference.
#[derive(Clone, Copy)]
struct GroupScan {
    max_groups: Option<usize>,
    stride: Option<usize>,
}

/// Type-erased operations over the nested map; the concrete nested type
/// lives only inside the implementations.
trait ReferenceOps<T>: Send + Sync {
    fn materialize_into(
        &self,
        target: &mut T,
        row: &Row,
        ctx: &BindContext<'_>,
        scan: GroupScan,
    ) -> Result<(), CsvError>;

    fn flatten_into(
        &self,
        source: &T,
        out: &mut Vec<String>,
        ctx: &WriteContext<'_>,
    ) -> Result<(), CsvError>;

    fn header_into(&self, out: &mut Vec<String>, scan: GroupScan);

    fn any_present(&self, row: &Row, ctx: &BindContext<'_>) -> bool;

    fn width(&self, scan: GroupScan) -> usize;
}

struct SingleOps<T, U> {
    nested: Arc<ClassMap<U>>,
    get: Box<dyn Fn(&T) -> U + Send + Sync>,
    set: Box<dyn Fn(&mut T, U) + Send + Sync>,
}

impl<T, U: 'static> ReferenceOps<T> for SingleOps<T, U> {
    fn materialize_into(
        &self,
        target: &mut T,
        row: &Row,
        ctx: &BindContext<'_>,
        _scan: GroupScan,
    ) -> Result<(), CsvError> {
        let nested = binder::materialize(&self.nested, row, ctx)?;
        (self.set)(target, nested);
        Ok(())
    }

    fn flatten_into(
        &self,
        source: &T,
        out: &mut Vec<String>,
        ctx: &WriteContext<'_>,
    ) -> Result<(), CsvError> {
        let nested = (self.get)(source);
        binder::flatten(&self.nested, &nested, ctx, out)
    }

    fn header_into(&self, out: &mut Vec<String>, _scan: GroupScan) {
        self.nested.emit_header(out, GroupScope::default());
    }

    fn any_present(&self, row: &Row, ctx: &BindContext<'_>) -> bool {
        self.nested.any_column_present(row, ctx)
    }

    fn width(&self, _scan: GroupScan) -> usize {
        self.nested.header_width()
    }
}

struct CollectionOps<T, U> {
    nested: Arc<ClassMap<U>>,
    get: Box<dyn Fn(&T) -> Vec<U> + Send + Sync>,
    push: Box<dyn Fn(&mut T, U) + Send + Sync>,
}

impl<T, U: 'static> CollectionOps<T, U> {
    fn group_scope(&self, base: GroupScope, group: usize, stride: usize) -> GroupScope {
        GroupScope {
            suffix: Some(group + 1),
            shift: base.shift + group * stride,
        }
    }
}

impl<T, U: 'static> ReferenceOps<T> for CollectionOps<T, U> {
    fn materialize_into(
        &self,
        target: &mut T,
        row: &Row,
        ctx: &BindContext<'_>,
        scan: GroupScan,
    ) -> Result<(), CsvError> {
        let stride = scan.stride.unwrap_or_else(|| self.nested.header_width());
        if stride == 0 {
            return Ok(());
        }
        let mut group = 0;
        loop {
            if scan.max_groups.is_some_and(|max| group >= max) {
                break;
            }
            let scoped = ctx.with_scope(self.group_scope(ctx.scope, group, stride));
            if !self.nested.any_column_present(row, &scoped) {
                break;
            }
            let item = binder::materialize(&self.nested, row, &scoped)?;
            (self.push)(target, item);
            group += 1;
        }
        Ok(())
    }

    fn flatten_into(
        &self,
        source: &T,
        out: &mut Vec<String>,
        ctx: &WriteContext<'_>,
    ) -> Result<(), CsvError> {
        for item in (self.get)(source) {
            binder::flatten(&self.nested, &item, ctx, out)?;
        }
        Ok(())
    }

    fn header_into(&self, out: &mut Vec<String>, scan: GroupScan) {
        // Without an instance the group count is unknowable; emit the
        // configured cap, or a single group.
        let groups = scan.max_groups.unwrap_or(1);
        for group in 0..groups {
            let scope = GroupScope {
                suffix: Some(group + 1),
                shift: 0,
            };
            self.nested.emit_header(out, scope);
        }
    }

    fn any_present(&self, row: &Row, ctx: &BindContext<'_>) -> bool {
        let stride = self.nested.header_width().max(1);
        let scoped = ctx.with_scope(self.group_scope(ctx.scope, 0, stride));
        self.nested.any_column_present(row, &scoped)
    }

    fn width(&self, scan: GroupScan) -> usize {
        self.nested.header_width() * scan.max_groups.unwrap_or(1)
    }
}
