//! Execution collaborator trait.

use crate::error::MapperResult;
use crate::sql::CompiledCondition;

/// The narrow interface the dispatcher drives: one operation per dispatch
/// kind. Implementations own SQL templating, execution, and row mapping;
/// the dispatcher hands them the compiled WHERE body, the named-parameter
/// bindings, the projection, and (where relevant) the governing entity.
///
/// The compiled `where_sql` keeps a leading AND/OR keyword on every fragment;
/// implementations strip or keep the first keyword as their SQL template
/// requires. An empty `where_sql` means "match all rows".
pub trait Executor<T>: Send + Sync {
    /// Insert one entity, returning the affected-row count.
    fn insert(&self, entity: &T) -> impl Future<Output = MapperResult<u64>> + Send;

    /// Insert a batch of entities, returning the affected-row count.
    fn batch_insert(&self, entities: &[T]) -> impl Future<Output = MapperResult<u64>> + Send;

    /// Fetch at most one entity matching the condition.
    fn find_one(
        &self,
        columns: &[String],
        condition: &CompiledCondition,
        example: Option<&T>,
    ) -> impl Future<Output = MapperResult<Option<T>>> + Send;

    /// Fetch all entities matching the condition.
    fn list(
        &self,
        columns: &[String],
        condition: &CompiledCondition,
        example: Option<&T>,
    ) -> impl Future<Output = MapperResult<Vec<T>>> + Send;

    /// Fetch one page window of entities matching the condition.
    fn select_page(
        &self,
        columns: &[String],
        condition: &CompiledCondition,
        offset: u64,
        limit: u64,
        example: Option<&T>,
    ) -> impl Future<Output = MapperResult<Vec<T>>> + Send;

    /// Count entities matching the condition.
    fn count(
        &self,
        condition: &CompiledCondition,
        example: Option<&T>,
    ) -> impl Future<Output = MapperResult<u64>> + Send;

    /// Update rows matching the condition from the SET entity's fields.
    ///
    /// With `set_null` disabled, null fields of `set_entity` are not written
    /// (partial update); enabled, they overwrite columns with NULL.
    fn update(
        &self,
        columns: &[String],
        condition: &CompiledCondition,
        where_entity: Option<&T>,
        set_entity: &T,
        set_null: bool,
    ) -> impl Future<Output = MapperResult<u64>> + Send;

    /// Update one row addressed by the entity's primary key.
    fn update_by_key(
        &self,
        entity: &T,
        set_null: bool,
    ) -> impl Future<Output = MapperResult<u64>> + Send;

    /// Physically delete rows matching the condition.
    fn delete(
        &self,
        condition: &CompiledCondition,
        example: Option<&T>,
    ) -> impl Future<Output = MapperResult<u64>> + Send;
}
