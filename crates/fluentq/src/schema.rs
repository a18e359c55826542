//! Schema description and entity-to-value resolution.
//!
//! The dispatcher and compiler consume entity metadata as plain data: a
//! [`TableSchema`] names the physical table, maps in-memory field names to
//! column names, marks the primary key, and optionally designates a
//! soft-delete column. The [`SchemaResolver`] trait is the narrow collaborator
//! interface; [`SerdeResolver`] is the provided implementation, extracting
//! by-example values through `serde_json` instead of runtime field reflection.

use crate::error::{MapperError, MapperResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::marker::PhantomData;

/// One column of a table schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    /// In-memory field name (serde field name for [`SerdeResolver`]).
    pub field: String,
    /// Physical column name.
    pub column: String,
    /// Whether this column is the primary key.
    pub primary_key: bool,
}

/// Designated soft-delete column and its sentinel values.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftDelete {
    /// In-memory field name.
    pub field: String,
    /// Physical column name.
    pub column: String,
    /// Value marking a live row.
    pub active: Value,
    /// Value marking a deleted row.
    pub deleted: Value,
}

/// Static schema description for one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    /// Physical table name.
    pub table: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnMeta>,
    /// Soft-delete designation, if the table uses logical deletes.
    pub soft_delete: Option<SoftDelete>,
}

impl TableSchema {
    /// Create a schema for the given table with no columns.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            soft_delete: None,
        }
    }

    /// Append a (field, column) mapping.
    pub fn column(mut self, field: &str, column: &str) -> Self {
        self.columns.push(ColumnMeta {
            field: field.to_string(),
            column: column.to_string(),
            primary_key: false,
        });
        self
    }

    /// Mark the column mapped from `field` as the primary key.
    pub fn with_primary_key(mut self, field: &str) -> Self {
        for column in &mut self.columns {
            column.primary_key = column.field == field;
        }
        self
    }

    /// Designate a soft-delete column with its active/deleted values.
    pub fn with_soft_delete(
        mut self,
        field: &str,
        column: &str,
        active: Value,
        deleted: Value,
    ) -> Self {
        self.soft_delete = Some(SoftDelete {
            field: field.to_string(),
            column: column.to_string(),
            active,
            deleted,
        });
        self
    }

    /// The primary-key column, if one is marked.
    pub fn primary_key(&self) -> Option<&ColumnMeta> {
        self.columns.iter().find(|column| column.primary_key)
    }

    /// Physical column name for an in-memory field name.
    pub fn column_for(&self, field: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|column| column.field == field)
            .map(|column| column.column.as_str())
    }
}

/// Entity metadata collaborator consumed by the dispatcher.
///
/// Implementations must be deterministic: the dispatcher calls them once per
/// operation and treats the answers as plain data.
pub trait SchemaResolver<T>: Send + Sync {
    /// Schema description for the entity type.
    fn describe(&self) -> MapperResult<&TableSchema>;

    /// Non-null schema-mapped field values of an entity as (column, value)
    /// pairs, in schema declaration order. Null fields never contribute;
    /// the explicit is-null predicate is the only way to express IS NULL.
    fn example_values(&self, entity: &T) -> MapperResult<Vec<(String, Value)>>;

    /// The entity's primary-key value, or `None` when absent.
    fn key_value(&self, entity: &T) -> MapperResult<Option<Value>>;

    /// An entity whose only non-null field is the soft-delete flag set to its
    /// "deleted" value, used as the SET source when a delete is rewritten
    /// into an update.
    fn deletion_marker(&self) -> MapperResult<T>;
}

/// [`SchemaResolver`] backed by serde serialization.
///
/// The entity type serializes to a JSON object whose keys are the schema's
/// field names. `deletion_marker` requires the type to deserialize from an
/// object containing only the soft-delete field, so every other field must be
/// optional or defaulted.
pub struct SerdeResolver<T> {
    schema: TableSchema,
    _entity: PhantomData<fn() -> T>,
}

impl<T> SerdeResolver<T> {
    /// Create a resolver around a schema description.
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            _entity: PhantomData,
        }
    }

    fn to_object(&self, entity: &T) -> MapperResult<Map<String, Value>>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(entity).map_err(|err| {
            MapperError::schema(format!(
                "failed to serialize entity for table '{}': {err}",
                self.schema.table
            ))
        })?;
        match value {
            Value::Object(object) => Ok(object),
            other => Err(MapperError::schema(format!(
                "entity for table '{}' serialized to {other:?}, expected an object",
                self.schema.table
            ))),
        }
    }
}

impl<T> SchemaResolver<T> for SerdeResolver<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn describe(&self) -> MapperResult<&TableSchema> {
        Ok(&self.schema)
    }

    fn example_values(&self, entity: &T) -> MapperResult<Vec<(String, Value)>> {
        let object = self.to_object(entity)?;
        let mut values = Vec::new();
        for meta in &self.schema.columns {
            match object.get(&meta.field) {
                None | Some(Value::Null) => {}
                Some(value) => values.push((meta.column.clone(), value.clone())),
            }
        }
        Ok(values)
    }

    fn key_value(&self, entity: &T) -> MapperResult<Option<Value>> {
        let key = self.schema.primary_key().ok_or_else(|| {
            MapperError::schema(format!(
                "table '{}' declares no primary key",
                self.schema.table
            ))
        })?;
        let object = self.to_object(entity)?;
        Ok(match object.get(&key.field) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.clone()),
        })
    }

    fn deletion_marker(&self) -> MapperResult<T> {
        let soft_delete = self.schema.soft_delete.as_ref().ok_or_else(|| {
            MapperError::schema(format!(
                "table '{}' designates no soft-delete column",
                self.schema.table
            ))
        })?;
        let mut object = Map::new();
        object.insert(soft_delete.field.clone(), soft_delete.deleted.clone());
        serde_json::from_value(Value::Object(object)).map_err(|err| {
            MapperError::schema(format!(
                "failed to build deletion marker for table '{}': {err}",
                self.schema.table
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize, Default)]
    struct User {
        id: Option<i64>,
        user_name: Option<String>,
        age: Option<i32>,
        deleted: Option<i32>,
    }

    fn schema() -> TableSchema {
        TableSchema::new("user")
            .column("id", "id")
            .column("user_name", "user_name")
            .column("age", "age")
            .column("deleted", "deleted")
            .with_primary_key("id")
            .with_soft_delete("deleted", "deleted", json!(0), json!(1))
    }

    #[test]
    fn test_example_values_skip_null_fields() {
        let resolver = SerdeResolver::<User>::new(schema());
        let user = User {
            user_name: Some("alice".to_string()),
            ..User::default()
        };
        let values = resolver.example_values(&user).unwrap();
        assert_eq!(values, vec![("user_name".to_string(), json!("alice"))]);
    }

    #[test]
    fn test_key_value_presence() {
        let resolver = SerdeResolver::<User>::new(schema());
        let fresh = User::default();
        assert_eq!(resolver.key_value(&fresh).unwrap(), None);
        let stored = User {
            id: Some(7),
            ..User::default()
        };
        assert_eq!(resolver.key_value(&stored).unwrap(), Some(json!(7)));
    }

    #[test]
    fn test_key_value_requires_declared_primary_key() {
        let resolver =
            SerdeResolver::<User>::new(TableSchema::new("user").column("id", "id"));
        let err = resolver.key_value(&User::default()).unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn test_deletion_marker_sets_only_the_flag() {
        let resolver = SerdeResolver::<User>::new(schema());
        let marker = resolver.deletion_marker().unwrap();
        assert_eq!(
            marker,
            User {
                deleted: Some(1),
                ..User::default()
            }
        );
    }

    #[test]
    fn test_deletion_marker_requires_soft_delete_column() {
        let resolver = SerdeResolver::<User>::new(
            TableSchema::new("user").column("id", "id").with_primary_key("id"),
        );
        let err = resolver.deletion_marker().unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn test_column_lookup() {
        let schema = schema();
        assert_eq!(schema.column_for("user_name"), Some("user_name"));
        assert_eq!(schema.column_for("missing"), None);
        assert_eq!(schema.primary_key().map(|c| c.column.as_str()), Some("id"));
    }
}
