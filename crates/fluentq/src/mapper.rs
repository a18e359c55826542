//! Fluent builder surface and operation dispatch.
//!
//! A [`Mapper`] is a single-use value: one logical operation's worth of
//! chained predicate calls, then one terminal call that consumes it. The
//! terminal call compiles the accumulated condition once (lazily, cached for
//! the remainder of that dispatch), applies the logical-delete protocol, and
//! invokes exactly one operation on the execution collaborator.

use crate::condition::{ComparisonKind, ConditionSet};
use crate::error::{MapperError, MapperResult};
use crate::executor::Executor;
use crate::page::Page;
use crate::schema::SchemaResolver;
use crate::sql::{self, CompiledCondition};
use serde_json::Value;
use std::marker::PhantomData;
use tracing::debug;

/// Dispatcher configuration, passed explicitly at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapperConfig {
    /// Rewrite deletes into soft-delete updates and guard reads/writes with
    /// an implicit "not already deleted" predicate.
    pub logic_delete: bool,
}

/// One logical data-access operation, matched exhaustively by the
/// dispatcher. Carrying the operation as a sum type removes the
/// "unrecognized kind" failure mode outright.
enum Operation<'e, T> {
    Insert(&'e T),
    BatchInsert(&'e [T]),
    FindOne(Option<&'e T>),
    List(Option<&'e T>),
    Count(Option<&'e T>),
    SelectPage {
        offset: u64,
        limit: u64,
        entity: Option<&'e T>,
    },
    Update {
        set: &'e T,
        where_entity: Option<&'e T>,
        set_null: bool,
    },
    UpdateByKey {
        entity: &'e T,
        set_null: bool,
    },
    Delete(Option<&'e T>),
}

impl<'e, T> Operation<'e, T> {
    fn tag(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::BatchInsert(_) => "batch_insert",
            Self::FindOne(_) => "find_one",
            Self::List(_) => "list",
            Self::Count(_) => "count",
            Self::SelectPage { .. } => "select_page",
            Self::Update { .. } => "update",
            Self::UpdateByKey { .. } => "update_by_key",
            Self::Delete(_) => "delete",
        }
    }

    /// The by-example entity governing WHERE compilation, if any.
    fn example(&self) -> Option<&'e T> {
        match self {
            Self::FindOne(entity)
            | Self::List(entity)
            | Self::Count(entity)
            | Self::SelectPage { entity, .. }
            | Self::Delete(entity) => *entity,
            Self::Update { where_entity, .. } => *where_entity,
            Self::Insert(_) | Self::BatchInsert(_) | Self::UpdateByKey { .. } => None,
        }
    }

    /// Whether the logical-delete guard predicate applies to this operation.
    fn guarded(&self) -> bool {
        !matches!(
            self,
            Self::Insert(_) | Self::BatchInsert(_) | Self::UpdateByKey { .. }
        )
    }
}

/// Result of one dispatch, shaped per operation kind.
enum Dispatched<T> {
    Affected(u64),
    One(Option<T>),
    Many(Vec<T>),
    Total(u64),
}

impl<T> Dispatched<T> {
    fn affected(self) -> MapperResult<u64> {
        match self {
            Self::Affected(count) => Ok(count),
            _ => Err(mismatch("affected-row count")),
        }
    }

    fn one(self) -> MapperResult<Option<T>> {
        match self {
            Self::One(entity) => Ok(entity),
            _ => Err(mismatch("single entity")),
        }
    }

    fn many(self) -> MapperResult<Vec<T>> {
        match self {
            Self::Many(entities) => Ok(entities),
            _ => Err(mismatch("entity list")),
        }
    }

    fn total(self) -> MapperResult<u64> {
        match self {
            Self::Total(count) => Ok(count),
            _ => Err(mismatch("row count")),
        }
    }
}

fn mismatch(expected: &str) -> MapperError {
    MapperError::execution(format!("dispatch returned a mismatched result, expected {expected}"))
}

/// Single-use condition builder and operation dispatcher.
pub struct Mapper<'a, T, X, R> {
    executor: &'a X,
    resolver: &'a R,
    config: MapperConfig,
    conditions: ConditionSet,
    compiled: Option<CompiledCondition>,
    _entity: PhantomData<fn() -> T>,
}

impl<T, X, R> std::fmt::Debug for Mapper<'_, T, X, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("config", &self.config)
            .field("conditions", &self.conditions)
            .finish_non_exhaustive()
    }
}

/// Create a fresh [`Mapper`] for one logical operation.
pub fn mapper<'a, T, X, R>(executor: &'a X, resolver: &'a R, config: MapperConfig) -> Mapper<'a, T, X, R>
where
    X: Executor<T>,
    R: SchemaResolver<T>,
{
    Mapper::new(executor, resolver, config)
}

impl<'a, T, X, R> Mapper<'a, T, X, R>
where
    X: Executor<T>,
    R: SchemaResolver<T>,
{
    /// Create a fresh mapper for one logical operation.
    pub fn new(executor: &'a X, resolver: &'a R, config: MapperConfig) -> Self {
        Self {
            executor,
            resolver,
            config,
            conditions: ConditionSet::new(),
            compiled: None,
            _entity: PhantomData,
        }
    }

    // ==================== Chained predicate methods ====================

    /// Add WHERE: column = value
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions = self.conditions.eq(column, value);
        self
    }

    /// Add WHERE: column != value
    pub fn ne(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions = self.conditions.ne(column, value);
        self
    }

    /// Add WHERE: column < value
    pub fn lt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions = self.conditions.lt(column, value);
        self
    }

    /// Add WHERE: column > value
    pub fn gt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions = self.conditions.gt(column, value);
        self
    }

    /// Add WHERE: column <= value
    pub fn lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions = self.conditions.lte(column, value);
        self
    }

    /// Add WHERE: column >= value
    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions = self.conditions.gte(column, value);
        self
    }

    /// Add WHERE: column LIKE pattern (wildcard-wrapped at compile time)
    pub fn like(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions = self.conditions.like(column, value);
        self
    }

    /// Add a trailing disjunctive predicate: OR column = value
    pub fn or_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions = self.conditions.or_eq(column, value);
        self
    }

    /// Add WHERE: column IS NULL
    pub fn is_null(mut self, column: &str) -> Self {
        self.conditions = self.conditions.is_null(column);
        self
    }

    /// Add WHERE: column IN (values...)
    pub fn in_list<V: Into<Value>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.conditions = self.conditions.in_list(column, values);
        self
    }

    /// Add WHERE: column NOT IN (values...)
    pub fn not_in<V: Into<Value>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.conditions = self.conditions.not_in(column, values);
        self
    }

    /// Add WHERE: column IN (values...) from a comma-separated string.
    pub fn in_str(mut self, column: &str, raw: &str) -> MapperResult<Self> {
        self.conditions = self.conditions.in_str(column, raw)?;
        Ok(self)
    }

    /// Add WHERE: column NOT IN (values...) from a comma-separated string.
    pub fn not_in_str(mut self, column: &str, raw: &str) -> MapperResult<Self> {
        self.conditions = self.conditions.not_in_str(column, raw)?;
        Ok(self)
    }

    /// Add WHERE: column BETWEEN low AND high (as gte + lte)
    pub fn between(
        mut self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.conditions = self.conditions.between(column, low, high);
        self
    }

    /// Add one output column to the projection.
    pub fn field(mut self, column: &str) -> MapperResult<Self> {
        self.conditions = self.conditions.field(column)?;
        Ok(self)
    }

    /// Add multiple output columns to the projection.
    pub fn fields<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.conditions = self.conditions.fields(columns);
        self
    }

    /// Set the ordering directive, replacing any prior one.
    pub fn order_by(mut self, expression: &str) -> Self {
        self.conditions = self.conditions.order_by(expression);
        self
    }

    // ==================== Terminal operations ====================

    /// Insert one entity.
    pub async fn insert(mut self, entity: &T) -> MapperResult<u64> {
        self.dispatch(Operation::Insert(entity)).await?.affected()
    }

    /// Insert a batch of entities.
    pub async fn batch_insert(mut self, entities: &[T]) -> MapperResult<u64> {
        self.dispatch(Operation::BatchInsert(entities)).await?.affected()
    }

    /// Insert the entity when its primary key is absent, otherwise update it
    /// by key as a partial update (null fields are not written).
    pub async fn save(mut self, entity: &T) -> MapperResult<u64> {
        let operation = match self.resolver.key_value(entity)? {
            None => Operation::Insert(entity),
            Some(_) => Operation::UpdateByKey {
                entity,
                set_null: false,
            },
        };
        self.dispatch(operation).await?.affected()
    }

    /// Fetch at most one entity matching the accumulated condition and the
    /// optional by-example entity.
    pub async fn find_one(mut self, entity: Option<&T>) -> MapperResult<Option<T>> {
        self.dispatch(Operation::FindOne(entity)).await?.one()
    }

    /// Fetch all entities matching the accumulated condition.
    pub async fn list(mut self, entity: Option<&T>) -> MapperResult<Vec<T>> {
        self.dispatch(Operation::List(entity)).await?.many()
    }

    /// Count entities matching the accumulated condition.
    pub async fn count(mut self, entity: Option<&T>) -> MapperResult<u64> {
        self.dispatch(Operation::Count(entity)).await?.total()
    }

    /// Paginated select: count first, short-circuit on zero, then fetch the
    /// requested window with the ordering directive re-attached.
    pub async fn select_page(
        mut self,
        mut page: Page<T>,
        entity: Option<&T>,
    ) -> MapperResult<Page<T>> {
        // The count round trip must not carry the ordering directive.
        let ordering = self.conditions.take_ordering();
        let total = self.dispatch(Operation::Count(entity)).await?.total()?;
        if total == 0 {
            return Ok(page);
        }
        self.conditions.restore_ordering(ordering);
        let rows = self
            .dispatch(Operation::SelectPage {
                offset: page.offset(),
                limit: page.limit(),
                entity,
            })
            .await?
            .many()?;
        page.set_total(total);
        page.set_data(rows);
        Ok(page)
    }

    /// Update rows matched by the accumulated condition and optional WHERE
    /// entity, from the SET entity's fields.
    pub async fn update(
        mut self,
        set_entity: &T,
        where_entity: Option<&T>,
        set_null: bool,
    ) -> MapperResult<u64> {
        self.dispatch(Operation::Update {
            set: set_entity,
            where_entity,
            set_null,
        })
        .await?
        .affected()
    }

    /// Update one row addressed by the entity's primary key.
    pub async fn update_by_key(mut self, entity: &T, set_null: bool) -> MapperResult<u64> {
        self.dispatch(Operation::UpdateByKey { entity, set_null })
            .await?
            .affected()
    }

    /// Delete rows matched by the accumulated condition and optional
    /// by-example entity.
    ///
    /// When logical deletes govern the entity (configuration flag on and a
    /// soft-delete column in the schema), the delete is rewritten into an
    /// update applying the resolver's deletion marker; no physical delete is
    /// issued.
    pub async fn delete(mut self, entity: Option<&T>) -> MapperResult<u64> {
        if self.config.logic_delete && self.resolver.describe()?.soft_delete.is_some() {
            let marker = self.resolver.deletion_marker()?;
            return self
                .dispatch(Operation::Update {
                    set: &marker,
                    where_entity: entity,
                    set_null: false,
                })
                .await?
                .affected();
        }
        self.dispatch(Operation::Delete(entity)).await?.affected()
    }

    /// Soft-delete rows matched by the WHERE entity: an update setting the
    /// soft-delete flag to its "deleted" value.
    ///
    /// Fails with [`MapperError::Configuration`] when logical delete is
    /// disabled; it must never fall back to a physical delete.
    pub async fn logic_delete(mut self, where_entity: &T) -> MapperResult<u64> {
        if !self.config.logic_delete {
            return Err(MapperError::configuration(
                "logical delete is disabled; enable MapperConfig::logic_delete",
            ));
        }
        let marker = self.resolver.deletion_marker()?;
        self.dispatch(Operation::Update {
            set: &marker,
            where_entity: Some(where_entity),
            set_null: false,
        })
        .await?
        .affected()
    }

    // ==================== Dispatch internals ====================

    /// Inject the implicit "not already deleted" predicate when the
    /// logical-delete protocol governs this operation and the caller has not
    /// already constrained the soft-delete column.
    fn guard_soft_delete(&mut self, operation: &Operation<'_, T>) -> MapperResult<()> {
        if !self.config.logic_delete || !operation.guarded() {
            return Ok(());
        }
        let schema = self.resolver.describe()?;
        if let Some(soft_delete) = &schema.soft_delete {
            if !self.conditions.has_column(&soft_delete.column) {
                self.conditions.push(
                    ComparisonKind::Ne,
                    &soft_delete.column,
                    soft_delete.deleted.clone(),
                );
            }
        }
        Ok(())
    }

    /// Compile the accumulated condition, lazily and at most once per
    /// dispatch; the ordering directive is re-attached from live accumulator
    /// state so the paginate protocol can detach it for the count round trip.
    fn compile_condition(&mut self, example: Option<&T>) -> MapperResult<CompiledCondition> {
        if self.compiled.is_none() {
            let example_values = match example {
                Some(entity) => self.resolver.example_values(entity)?,
                None => Vec::new(),
            };
            self.compiled = Some(sql::compile(&self.conditions, &example_values));
        }
        let mut current = self.compiled.clone().unwrap_or_default();
        current.order_by = self.conditions.ordering().map(str::to_string);
        Ok(current)
    }

    async fn dispatch(&mut self, operation: Operation<'_, T>) -> MapperResult<Dispatched<T>> {
        self.guard_soft_delete(&operation)?;
        let condition = self.compile_condition(operation.example())?;
        let columns: Vec<String> = self.conditions.projection().map(str::to_string).collect();
        debug!(
            operation = operation.tag(),
            where_sql = %condition.where_sql,
            "dispatching"
        );
        match operation {
            Operation::Insert(entity) => {
                Ok(Dispatched::Affected(self.executor.insert(entity).await?))
            }
            Operation::BatchInsert(entities) => Ok(Dispatched::Affected(
                self.executor.batch_insert(entities).await?,
            )),
            Operation::FindOne(entity) => Ok(Dispatched::One(
                self.executor.find_one(&columns, &condition, entity).await?,
            )),
            Operation::List(entity) => Ok(Dispatched::Many(
                self.executor.list(&columns, &condition, entity).await?,
            )),
            Operation::Count(entity) => Ok(Dispatched::Total(
                self.executor.count(&condition, entity).await?,
            )),
            Operation::SelectPage {
                offset,
                limit,
                entity,
            } => Ok(Dispatched::Many(
                self.executor
                    .select_page(&columns, &condition, offset, limit, entity)
                    .await?,
            )),
            Operation::Update {
                set,
                where_entity,
                set_null,
            } => Ok(Dispatched::Affected(
                self.executor
                    .update(&columns, &condition, where_entity, set, set_null)
                    .await?,
            )),
            Operation::UpdateByKey { entity, set_null } => Ok(Dispatched::Affected(
                self.executor.update_by_key(entity, set_null).await?,
            )),
            Operation::Delete(entity) => Ok(Dispatched::Affected(
                self.executor.delete(&condition, entity).await?,
            )),
        }
    }
}
