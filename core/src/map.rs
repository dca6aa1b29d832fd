//! The per-type map: fields, SQL fragments, row conversion and binding.
//!
//! A [`Map`] is built once per entity type from its descriptor and a
//! [`MapperConfiguration`]. Fragments and statements are rendered on first
//! access and cached; every reconfiguration call drops the cache before it
//! returns.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use tracing::{debug, trace, warn};

use crate::classify::{FieldKind, classify};
use crate::config::{Dialect, MapperConfiguration};
use crate::descriptor::Entity;
use crate::error::{MapError, Result};
use crate::field::{Field, FieldMapping};
use crate::source::{AsyncRowSource, CommandSink, Row, RowSource};
use crate::statement::{StatementKind, StatementOverrides, quote_identifier};
use crate::value::Value;

#[derive(Debug, Default)]
struct FragmentCache {
    select_columns: OnceLock<String>,
    insert_columns: OnceLock<String>,
    insert_parameters: OnceLock<String>,
    update_set: OnceLock<String>,
    key_where: OnceLock<String>,
    select: OnceLock<String>,
    count: OnceLock<String>,
    insert: OnceLock<String>,
    update: OnceLock<String>,
    delete: OnceLock<String>,
}

/// Mapping between an entity type and a table.
///
/// # Examples
///
/// ```
/// use tablemap_core::{Entity, Map};
///
/// #[derive(Debug, Default, PartialEq, Entity)]
/// #[map(table = "Users")]
/// struct User {
///     #[map(key)]
///     id: i64,
///     email: String,
///     #[map(calculated)]
///     created: Option<chrono::NaiveDateTime>,
/// }
///
/// let map = Map::<User>::build();
/// assert_eq!(map.select_column_list(), "[id], [email], [created]");
/// assert_eq!(map.insert_column_list(), "[email]");
/// assert_eq!(map.update_set_clause(), "[email] = @email");
/// assert_eq!(map.key_name().unwrap(), "id");
/// assert_eq!(map.update_statement().unwrap(),
///     "UPDATE [Users] SET [email] = @email OUTPUT INSERTED.* WHERE [id] = @id");
/// ```
pub struct Map<T> {
    type_name: &'static str,
    table: String,
    fields: Vec<Field<T>>,
    dialect: Dialect,
    cache: FragmentCache,
    overrides: StatementOverrides,
}

impl<T: Entity> Map<T> {
    /// Builds a map with the default configuration.
    pub fn build() -> Self {
        Self::with_configuration(&MapperConfiguration::default())
    }

    /// Builds a map, classifying and naming every described member.
    pub fn with_configuration(config: &MapperConfiguration) -> Self {
        let (type_name, declared_table, members) = T::describe().into_parts();
        let table = declared_table.unwrap_or_else(|| config.table_name(type_name));

        let fields: Vec<Field<T>> = members
            .into_iter()
            .map(|member| {
                let name = member.name();
                let value_type = *member.value_type();
                let declared = member.declared();
                let kind = classify(name, &value_type, declared, config);
                let column = declared
                    .column
                    .clone()
                    .unwrap_or_else(|| config.column_name(name));
                Field::new(name, column, kind, value_type, member.get, member.set)
            })
            .collect();

        debug!(
            entity = type_name,
            table = %table,
            fields = fields.len(),
            "Built map"
        );

        Self {
            type_name,
            table,
            fields,
            dialect: config.dialect,
            cache: FragmentCache::default(),
            overrides: StatementOverrides::default(),
        }
    }

    /// Creates an entity from the row a source is positioned on.
    ///
    /// Columns are matched to fields by name. Unmatched columns are skipped
    /// and unmatched fields keep their zero value.
    pub fn create<R: Row + ?Sized>(&self, row: &R) -> Result<T> {
        let binding = self.resolve(row);
        self.apply(&binding, row)
    }

    /// Lazily creates one entity per row, in source order.
    pub fn create_iter<S: RowSource>(&self, source: S) -> Entities<'_, T, S> {
        Entities {
            map: self,
            source,
            binding: None,
            done: false,
        }
    }

    /// Creates an entity for every remaining row.
    pub fn create_all<S: RowSource>(&self, source: S) -> Result<Vec<T>> {
        self.create_iter(source).collect()
    }

    /// Creates an entity for every remaining row of an asynchronous source.
    pub async fn create_all_async<S: AsyncRowSource>(&self, mut source: S) -> Result<Vec<T>> {
        let mut entities = Vec::new();
        let mut binding: Option<Binding> = None;
        while source.advance().await? {
            if binding.as_ref().is_some_and(|b| !b.fits(&source)) {
                binding = None;
            }
            let binding = binding.get_or_insert_with(|| self.resolve(&source));
            entities.push(self.apply(binding, &source)?);
        }
        Ok(entities)
    }
}

impl<T> Map<T> {
    /// Name of the mapped entity type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Table the map reads and writes.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Dialect the statements are rendered in.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Fields in member declaration order.
    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    /// Field of the named member.
    pub fn field(&self, member: &str) -> Option<&Field<T>> {
        self.fields.iter().find(|f| f.member() == member)
    }

    /// Field currently bound to `column`.
    pub fn field_by_column(&self, column: &str) -> Option<&Field<T>> {
        self.fields.iter().find(|f| f.column == column)
    }

    fn of_kind(&self, kind: FieldKind) -> impl Iterator<Item = &Field<T>> {
        self.fields.iter().filter(move |f| f.kind == kind)
    }

    fn key_fields(&self) -> Vec<&Field<T>> {
        self.of_kind(FieldKind::Key).collect()
    }

    fn single_key(&self) -> Result<&Field<T>> {
        match self.key_fields().as_slice() {
            [] => Err(MapError::MissingKey {
                table: self.table.clone(),
            }),
            [key] => Ok(*key),
            keys => Err(MapError::CompositeKey {
                table: self.table.clone(),
                keys: keys.iter().map(|f| f.column.clone()).collect(),
            }),
        }
    }

    fn require_key(&self) -> Result<()> {
        if self.of_kind(FieldKind::Key).next().is_none() {
            return Err(MapError::MissingKey {
                table: self.table.clone(),
            });
        }
        Ok(())
    }

    /// `[col], [col]` over every field that is not ignored.
    pub fn select_column_list(&self) -> &str {
        self.cache.select_columns.get_or_init(|| {
            join(
                self.fields.iter().filter(|f| f.kind != FieldKind::Ignore),
                |f| quote_identifier(&f.column),
            )
        })
    }

    /// `alias.[col], ...` over every field that is not ignored.
    pub fn select_column_list_with_alias(&self, alias: &str) -> String {
        join(
            self.fields.iter().filter(|f| f.kind != FieldKind::Ignore),
            |f| format!("{alias}.{}", quote_identifier(&f.column)),
        )
    }

    /// `[col], ...` over the written (`Map`) fields.
    pub fn insert_column_list(&self) -> &str {
        self.cache
            .insert_columns
            .get_or_init(|| join(self.of_kind(FieldKind::Map), |f| quote_identifier(&f.column)))
    }

    /// `@col, ...` over the written (`Map`) fields.
    pub fn insert_parameter_list(&self) -> &str {
        self.cache
            .insert_parameters
            .get_or_init(|| join(self.of_kind(FieldKind::Map), |f| format!("@{}", f.column)))
    }

    /// `[col] = @col, ...` over the written (`Map`) fields.
    pub fn update_set_clause(&self) -> &str {
        self.cache
            .update_set
            .get_or_init(|| join(self.of_kind(FieldKind::Map), assignment))
    }

    /// Column of the single key field.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MissingKey`] when no field is a key, and
    /// [`MapError::CompositeKey`] when more than one is.
    pub fn key_name(&self) -> Result<&str> {
        self.single_key().map(Field::column)
    }

    /// `[a] = @a AND [b] = @b` over all key fields.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MissingKey`] when no field is a key.
    pub fn key_where(&self) -> Result<&str> {
        self.require_key()?;
        let clause = self.cache.key_where.get_or_init(|| {
            self.of_kind(FieldKind::Key)
                .map(assignment)
                .collect::<Vec<_>>()
                .join(" AND ")
        });
        Ok(clause.as_str())
    }

    /// `SELECT` of every non-ignored column, or its override.
    pub fn select_statement(&self) -> &str {
        if let Some(sql) = self.overrides.get(StatementKind::Select) {
            return sql;
        }
        self.cache
            .select
            .get_or_init(|| self.dialect.select(&self.table, self.select_column_list()))
    }

    /// `SELECT COUNT(*)` over the table, or its override.
    pub fn count_statement(&self) -> &str {
        if let Some(sql) = self.overrides.get(StatementKind::Count) {
            return sql;
        }
        self.cache
            .count
            .get_or_init(|| self.dialect.count(&self.table))
    }

    /// `INSERT` of the written fields returning the stored row, or its
    /// override.
    pub fn insert_statement(&self) -> &str {
        if let Some(sql) = self.overrides.get(StatementKind::Insert) {
            return sql;
        }
        self.cache.insert.get_or_init(|| {
            self.dialect.insert(
                &self.table,
                self.insert_column_list(),
                self.insert_parameter_list(),
            )
        })
    }

    /// `UPDATE` of the written fields by key, returning the stored row, or
    /// its override.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MissingKey`] when no field is a key and no
    /// override is set.
    pub fn update_statement(&self) -> Result<&str> {
        if let Some(sql) = self.overrides.get(StatementKind::Update) {
            return Ok(sql);
        }
        let key_where = self.key_where()?;
        let sql = self.cache.update.get_or_init(|| {
            self.dialect
                .update(&self.table, self.update_set_clause(), key_where)
        });
        Ok(sql.as_str())
    }

    /// `DELETE` by key, or its override.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MissingKey`] when no field is a key and no
    /// override is set.
    pub fn delete_statement(&self) -> Result<&str> {
        if let Some(sql) = self.overrides.get(StatementKind::Delete) {
            return Ok(sql);
        }
        let key_where = self.key_where()?;
        let sql = self
            .cache
            .delete
            .get_or_init(|| self.dialect.delete(&self.table, key_where));
        Ok(sql.as_str())
    }

    /// Renders any statement kind.
    ///
    /// # Errors
    ///
    /// Fails like [`update_statement`](Self::update_statement) for the keyed
    /// kinds.
    pub fn statement(&self, kind: StatementKind) -> Result<&str> {
        match kind {
            StatementKind::Select => Ok(self.select_statement()),
            StatementKind::Count => Ok(self.count_statement()),
            StatementKind::Insert => Ok(self.insert_statement()),
            StatementKind::Update => self.update_statement(),
            StatementKind::Delete => self.delete_statement(),
        }
    }

    /// Replaces a statement verbatim. Overrides outlive reconfiguration.
    pub fn set_statement(&mut self, kind: StatementKind, sql: impl Into<String>) -> &mut Self {
        self.overrides.set(kind, sql.into());
        self
    }

    /// Drops an override, returning to the rendered template.
    pub fn reset_statement(&mut self, kind: StatementKind) -> &mut Self {
        self.overrides.clear(kind);
        self
    }

    /// Overrides the `SELECT` statement.
    pub fn set_select_statement(&mut self, sql: impl Into<String>) -> &mut Self {
        self.set_statement(StatementKind::Select, sql)
    }

    /// Overrides the `COUNT` statement.
    pub fn set_count_statement(&mut self, sql: impl Into<String>) -> &mut Self {
        self.set_statement(StatementKind::Count, sql)
    }

    /// Overrides the `INSERT` statement.
    pub fn set_insert_statement(&mut self, sql: impl Into<String>) -> &mut Self {
        self.set_statement(StatementKind::Insert, sql)
    }

    /// Overrides the `UPDATE` statement.
    pub fn set_update_statement(&mut self, sql: impl Into<String>) -> &mut Self {
        self.set_statement(StatementKind::Update, sql)
    }

    /// Overrides the `DELETE` statement.
    pub fn set_delete_statement(&mut self, sql: impl Into<String>) -> &mut Self {
        self.set_statement(StatementKind::Delete, sql)
    }

    fn invalidate(&mut self) {
        trace!(table = %self.table, "Invalidating cached fragments");
        self.cache = FragmentCache::default();
    }

    fn reclassify(&mut self, members: &[&str], kind: FieldKind) -> &mut Self {
        let table = &self.table;
        for field in self
            .fields
            .iter_mut()
            .filter(|f| members.contains(&f.member()))
        {
            field.kind = checked_kind(table, field, kind);
        }
        self.invalidate();
        self
    }

    /// Excludes members from mapping. Unknown names are skipped.
    pub fn ignore(&mut self, members: &[&str]) -> &mut Self {
        self.reclassify(members, FieldKind::Ignore)
    }

    /// Marks members as read-only. Unmappable members stay ignored.
    pub fn calculated(&mut self, members: &[&str]) -> &mut Self {
        self.reclassify(members, FieldKind::Calculated)
    }

    /// Marks members as key fields. Unmappable members stay ignored.
    pub fn key(&mut self, members: &[&str]) -> &mut Self {
        self.reclassify(members, FieldKind::Key)
    }

    /// Replaces column name and classification of the named members.
    ///
    /// Members whose type cannot be mapped stay [`FieldKind::Ignore`].
    pub fn mapping(&mut self, mappings: &[FieldMapping]) -> &mut Self {
        let table = &self.table;
        for mapping in mappings {
            if let Some(field) = self.fields.iter_mut().find(|f| f.member() == mapping.member) {
                field.column = mapping.column.clone();
                field.kind = checked_kind(table, field, mapping.kind);
            }
        }
        self.invalidate();
        self
    }

    /// Renames the column of one member. Unknown members are skipped.
    pub fn set_column(&mut self, member: &str, column: impl Into<String>) -> &mut Self {
        if let Some(field) = self.fields.iter_mut().find(|f| f.member() == member) {
            field.column = column.into();
        }
        self.invalidate();
        self
    }

    /// Renames the table every statement targets.
    pub fn set_table_name(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = table.into();
        self.invalidate();
        self
    }

    /// Switches the dialect statements are rendered in.
    pub fn set_dialect(&mut self, dialect: Dialect) -> &mut Self {
        self.dialect = dialect;
        self.invalidate();
        self
    }

    /// Value of the single key field.
    ///
    /// # Errors
    ///
    /// Fails like [`key_name`](Self::key_name).
    pub fn key_value(&self, entity: &T) -> Result<Value> {
        self.single_key().map(|f| f.value(entity))
    }

    /// Values of all key fields, in field order.
    pub fn key_values(&self, entity: &T) -> Vec<Value> {
        self.of_kind(FieldKind::Key).map(|f| f.value(entity)).collect()
    }

    /// Binds the written fields, plus key fields when `include_keys` is set.
    pub fn bind_parameters<S>(&self, entity: &T, sink: &mut S, include_keys: bool)
    where
        S: CommandSink + ?Sized,
    {
        let fields = self.fields.iter().filter(|f| {
            f.kind == FieldKind::Map || (include_keys && f.kind == FieldKind::Key)
        });
        bind(fields, entity, sink);
    }

    /// Binds the key fields.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MissingKey`] when no field is a key.
    pub fn bind_key_parameters<S>(&self, entity: &T, sink: &mut S) -> Result<()>
    where
        S: CommandSink + ?Sized,
    {
        self.require_key()?;
        bind(self.of_kind(FieldKind::Key), entity, sink);
        Ok(())
    }

    /// Binds the named members regardless of classification.
    pub fn bind_named_parameters<S>(&self, entity: &T, sink: &mut S, members: &[&str])
    where
        S: CommandSink + ?Sized,
    {
        let fields = self
            .fields
            .iter()
            .filter(|f| members.contains(&f.member()));
        bind(fields, entity, sink);
    }

    fn resolve<R: Row + ?Sized>(&self, row: &R) -> Binding {
        let count = row.field_count();
        let mut seen = HashSet::with_capacity(count);
        let slots = (0..count)
            .map(|index| {
                let name = row.field_name(index);
                if !seen.insert(name) {
                    warn!(table = %self.table, column = name, "Row carries a duplicate column");
                }
                self.fields
                    .iter()
                    .position(|f| f.column == name && f.value_type().is_mappable())
            })
            .collect::<Vec<_>>();
        trace!(
            table = %self.table,
            columns = count,
            bound = slots.iter().flatten().count(),
            "Resolved row binding"
        );
        Binding { slots }
    }
}

impl<T: Default> Map<T> {
    fn apply<R: Row + ?Sized>(&self, binding: &Binding, row: &R) -> Result<T> {
        let mut entity = T::default();
        for (index, slot) in binding.slots.iter().enumerate() {
            if let Some(field) = slot.map(|i| &self.fields[i]) {
                field.assign(&mut entity, row.value(index)?)?;
            }
        }
        Ok(entity)
    }
}

impl<T> fmt::Debug for Map<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("type_name", &self.type_name)
            .field("table", &self.table)
            .field("dialect", &self.dialect)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

fn checked_kind<T>(table: &str, field: &Field<T>, kind: FieldKind) -> FieldKind {
    if kind == FieldKind::Ignore || field.value_type().is_mappable() {
        return kind;
    }
    warn!(
        table,
        member = field.member(),
        requested = ?kind,
        "Member type cannot be mapped; keeping it ignored"
    );
    FieldKind::Ignore
}

fn join<'a, T: 'a>(
    fields: impl Iterator<Item = &'a Field<T>>,
    render: impl Fn(&Field<T>) -> String,
) -> String {
    fields.map(render).collect::<Vec<_>>().join(", ")
}

fn assignment<T>(field: &Field<T>) -> String {
    format!("{} = @{}", quote_identifier(&field.column), field.column)
}

fn bind<'a, T: 'a, S>(fields: impl Iterator<Item = &'a Field<T>>, entity: &T, sink: &mut S)
where
    S: CommandSink + ?Sized,
{
    for field in fields {
        sink.add_parameter(&field.column, field.storage_type(), field.value(entity));
    }
}

/// Row column index to field index, resolved once per row shape.
#[derive(Debug)]
struct Binding {
    slots: Vec<Option<usize>>,
}

impl Binding {
    fn fits<R: Row + ?Sized>(&self, row: &R) -> bool {
        self.slots.len() == row.field_count()
    }
}

/// Lazy entity iterator returned by [`Map::create_iter`].
///
/// Stops after the source is exhausted or after the first error.
pub struct Entities<'m, T, S> {
    map: &'m Map<T>,
    source: S,
    binding: Option<Binding>,
    done: bool,
}

impl<T: Default, S: RowSource> Iterator for Entities<'_, T, S> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.source.advance() {
            Ok(true) => {}
            Ok(false) => {
                self.done = true;
                return None;
            }
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        }
        if self.binding.as_ref().is_some_and(|b| !b.fits(&self.source)) {
            self.binding = None;
        }
        let binding = self
            .binding
            .get_or_insert_with(|| self.map.resolve(&self.source));
        let entity = self.map.apply(binding, &self.source);
        if entity.is_err() {
            self.done = true;
        }
        Some(entity)
    }
}

/// Type-erased access to a [`Map`], for callers that only hold `&dyn Any`.
pub trait AnyMap: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn table_name(&self) -> &str;

    /// Creates a boxed entity from the current row.
    fn create_any(&self, row: &dyn Row) -> Result<Box<dyn Any + Send>>;

    fn bind_parameters(
        &self,
        entity: &dyn Any,
        sink: &mut dyn CommandSink,
        include_keys: bool,
    ) -> Result<()>;

    fn bind_key_parameters(&self, entity: &dyn Any, sink: &mut dyn CommandSink) -> Result<()>;

    fn bind_named_parameters(
        &self,
        entity: &dyn Any,
        sink: &mut dyn CommandSink,
        members: &[&str],
    ) -> Result<()>;

    fn key_value(&self, entity: &dyn Any) -> Result<Value>;
}

impl<T: Entity> Map<T> {
    fn downcast<'e>(&self, entity: &'e dyn Any) -> Result<&'e T> {
        entity
            .downcast_ref::<T>()
            .ok_or(MapError::EntityTypeMismatch {
                expected: self.type_name,
            })
    }
}

impl<T: Entity> AnyMap for Map<T> {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn table_name(&self) -> &str {
        &self.table
    }

    fn create_any(&self, row: &dyn Row) -> Result<Box<dyn Any + Send>> {
        Ok(Box::new(self.create(row)?))
    }

    fn bind_parameters(
        &self,
        entity: &dyn Any,
        sink: &mut dyn CommandSink,
        include_keys: bool,
    ) -> Result<()> {
        Map::bind_parameters(self, self.downcast(entity)?, sink, include_keys);
        Ok(())
    }

    fn bind_key_parameters(&self, entity: &dyn Any, sink: &mut dyn CommandSink) -> Result<()> {
        Map::bind_key_parameters(self, self.downcast(entity)?, sink)
    }

    fn bind_named_parameters(
        &self,
        entity: &dyn Any,
        sink: &mut dyn CommandSink,
        members: &[&str],
    ) -> Result<()> {
        Map::bind_named_parameters(self, self.downcast(entity)?, sink, members);
        Ok(())
    }

    fn key_value(&self, entity: &dyn Any) -> Result<Value> {
        Map::key_value(self, self.downcast(entity)?)
    }
}
