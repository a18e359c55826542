//! Dispatch-protocol tests against a recording mock executor.

use fluentq::{
    CompiledCondition, Executor, MapperConfig, MapperResult, Page, SerdeResolver, TableSchema,
    mapper,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
struct User {
    id: Option<i64>,
    name: Option<String>,
    status: Option<String>,
    age: Option<i32>,
    deleted: Option<i32>,
}

fn schema() -> TableSchema {
    TableSchema::new("user")
        .column("id", "id")
        .column("name", "name")
        .column("status", "status")
        .column("age", "age")
        .column("deleted", "deleted")
        .with_primary_key("id")
        .with_soft_delete("deleted", "deleted", json!(0), json!(1))
}

fn resolver() -> SerdeResolver<User> {
    SerdeResolver::new(schema())
}

fn logic_config() -> MapperConfig {
    MapperConfig { logic_delete: true }
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Insert(User),
    BatchInsert(usize),
    FindOne(CompiledCondition),
    List {
        columns: Vec<String>,
        condition: CompiledCondition,
    },
    SelectPage {
        condition: CompiledCondition,
        offset: u64,
        limit: u64,
    },
    Count(CompiledCondition),
    Update {
        condition: CompiledCondition,
        set: User,
        set_null: bool,
    },
    UpdateByKey {
        id: Option<i64>,
        set_null: bool,
    },
    Delete(CompiledCondition),
}

#[derive(Default)]
struct MockExecutor {
    calls: Mutex<Vec<Call>>,
    count_result: u64,
}

impl MockExecutor {
    fn with_count(count_result: u64) -> Self {
        Self {
            count_result,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Executor<User> for MockExecutor {
    fn insert(&self, entity: &User) -> impl Future<Output = MapperResult<u64>> + Send {
        self.record(Call::Insert(entity.clone()));
        async { Ok(1) }
    }

    fn batch_insert(&self, entities: &[User]) -> impl Future<Output = MapperResult<u64>> + Send {
        self.record(Call::BatchInsert(entities.len()));
        let affected = entities.len() as u64;
        async move { Ok(affected) }
    }

    fn find_one(
        &self,
        _columns: &[String],
        condition: &CompiledCondition,
        _example: Option<&User>,
    ) -> impl Future<Output = MapperResult<Option<User>>> + Send {
        self.record(Call::FindOne(condition.clone()));
        async { Ok(None) }
    }

    fn list(
        &self,
        columns: &[String],
        condition: &CompiledCondition,
        _example: Option<&User>,
    ) -> impl Future<Output = MapperResult<Vec<User>>> + Send {
        self.record(Call::List {
            columns: columns.to_vec(),
            condition: condition.clone(),
        });
        async { Ok(Vec::new()) }
    }

    fn select_page(
        &self,
        _columns: &[String],
        condition: &CompiledCondition,
        offset: u64,
        limit: u64,
        _example: Option<&User>,
    ) -> impl Future<Output = MapperResult<Vec<User>>> + Send {
        self.record(Call::SelectPage {
            condition: condition.clone(),
            offset,
            limit,
        });
        async { Ok(vec![User::default()]) }
    }

    fn count(
        &self,
        condition: &CompiledCondition,
        _example: Option<&User>,
    ) -> impl Future<Output = MapperResult<u64>> + Send {
        self.record(Call::Count(condition.clone()));
        let total = self.count_result;
        async move { Ok(total) }
    }

    fn update(
        &self,
        _columns: &[String],
        condition: &CompiledCondition,
        _where_entity: Option<&User>,
        set_entity: &User,
        set_null: bool,
    ) -> impl Future<Output = MapperResult<u64>> + Send {
        self.record(Call::Update {
            condition: condition.clone(),
            set: set_entity.clone(),
            set_null,
        });
        async { Ok(1) }
    }

    fn update_by_key(
        &self,
        entity: &User,
        set_null: bool,
    ) -> impl Future<Output = MapperResult<u64>> + Send {
        self.record(Call::UpdateByKey {
            id: entity.id,
            set_null,
        });
        async { Ok(1) }
    }

    fn delete(
        &self,
        condition: &CompiledCondition,
        _example: Option<&User>,
    ) -> impl Future<Output = MapperResult<u64>> + Send {
        self.record(Call::Delete(condition.clone()));
        async { Ok(1) }
    }
}

#[tokio::test]
async fn insert_dispatches_to_executor() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    let user = User {
        name: Some("alice".to_string()),
        ..User::default()
    };
    let affected = mapper(&executor, &resolver, MapperConfig::default())
        .insert(&user)
        .await
        .unwrap();
    assert_eq!(affected, 1);
    assert_eq!(executor.calls(), vec![Call::Insert(user)]);
}

#[tokio::test]
async fn batch_insert_dispatches_the_whole_batch() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    let batch = vec![User::default(), User::default()];
    let affected = mapper(&executor, &resolver, MapperConfig::default())
        .batch_insert(&batch)
        .await
        .unwrap();
    assert_eq!(affected, 2);
    assert_eq!(executor.calls(), vec![Call::BatchInsert(2)]);
}

#[tokio::test]
async fn save_inserts_when_key_is_absent() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    let user = User {
        name: Some("alice".to_string()),
        ..User::default()
    };
    mapper(&executor, &resolver, MapperConfig::default())
        .save(&user)
        .await
        .unwrap();
    assert_eq!(executor.calls(), vec![Call::Insert(user)]);
}

#[tokio::test]
async fn save_updates_by_key_as_partial_update_when_key_is_present() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    let user = User {
        id: Some(7),
        name: Some("alice".to_string()),
        ..User::default()
    };
    mapper(&executor, &resolver, MapperConfig::default())
        .save(&user)
        .await
        .unwrap();
    assert_eq!(
        executor.calls(),
        vec![Call::UpdateByKey {
            id: Some(7),
            set_null: false,
        }]
    );
}

#[tokio::test]
async fn find_one_folds_example_entity_into_condition() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    let example = User {
        status: Some("active".to_string()),
        ..User::default()
    };
    mapper(&executor, &resolver, MapperConfig::default())
        .find_one(Some(&example))
        .await
        .unwrap();
    match &executor.calls()[..] {
        [Call::FindOne(condition)] => {
            assert_eq!(condition.where_sql, "AND status = :EQ_status");
            assert_eq!(condition.bindings.get("EQ_status"), Some(&json!("active")));
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }
}

#[tokio::test]
async fn list_passes_projection_and_condition() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    mapper(&executor, &resolver, MapperConfig::default())
        .fields(["id", "name"])
        .gt("age", 18)
        .list(None)
        .await
        .unwrap();
    match &executor.calls()[..] {
        [Call::List { columns, condition }] => {
            assert_eq!(columns, &vec!["id".to_string(), "name".to_string()]);
            assert_eq!(condition.where_sql, "AND age > :GT_age");
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }
}

#[tokio::test]
async fn count_returns_the_executor_total() {
    let executor = MockExecutor::with_count(42);
    let resolver = resolver();
    let total = mapper(&executor, &resolver, MapperConfig::default())
        .eq("status", "active")
        .count(None)
        .await
        .unwrap();
    assert_eq!(total, 42);
}

#[tokio::test]
async fn select_page_short_circuits_on_zero_count() {
    let executor = MockExecutor::with_count(0);
    let resolver = resolver();
    let page = mapper(&executor, &resolver, MapperConfig::default())
        .eq("status", "active")
        .order_by("id desc")
        .select_page(Page::new(2, 10), None)
        .await
        .unwrap();
    assert_eq!(page.total(), 0);
    assert!(page.data().is_empty());
    // Only the count round trip happened, no fetch.
    assert!(matches!(&executor.calls()[..], [Call::Count(_)]));
}

#[tokio::test]
async fn select_page_detaches_ordering_for_the_count_round_trip() {
    let executor = MockExecutor::with_count(3);
    let resolver = resolver();
    let page = mapper(&executor, &resolver, MapperConfig::default())
        .eq("status", "active")
        .order_by("id desc")
        .select_page(Page::new(2, 10), None)
        .await
        .unwrap();
    match &executor.calls()[..] {
        [
            Call::Count(count_condition),
            Call::SelectPage {
                condition,
                offset,
                limit,
            },
        ] => {
            assert_eq!(count_condition.order_by, None);
            assert_eq!(condition.order_by.as_deref(), Some("id desc"));
            assert_eq!(count_condition.where_sql, condition.where_sql);
            assert_eq!(*offset, 10);
            assert_eq!(*limit, 10);
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }
    assert_eq!(page.total(), 3);
    assert_eq!(page.data().len(), 1);
}

#[tokio::test]
async fn soft_delete_guard_is_injected_on_reads() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    mapper(&executor, &resolver, logic_config())
        .eq("status", "active")
        .list(None)
        .await
        .unwrap();
    match &executor.calls()[..] {
        [Call::List { condition, .. }] => {
            assert_eq!(
                condition.where_sql,
                "AND status = :EQ_status AND deleted != :NE_deleted"
            );
            assert_eq!(condition.bindings.get("NE_deleted"), Some(&json!(1)));
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }
}

#[tokio::test]
async fn explicit_predicate_on_the_flag_suppresses_the_guard() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    mapper(&executor, &resolver, logic_config())
        .eq("deleted", 0)
        .list(None)
        .await
        .unwrap();
    match &executor.calls()[..] {
        [Call::List { condition, .. }] => {
            assert_eq!(condition.where_sql, "AND deleted = :EQ_deleted");
            assert_eq!(condition.bindings.get("NE_deleted"), None);
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }
}

#[tokio::test]
async fn soft_delete_guard_does_not_apply_to_inserts() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    let user = User::default();
    mapper(&executor, &resolver, logic_config())
        .insert(&user)
        .await
        .unwrap();
    assert_eq!(executor.calls(), vec![Call::Insert(user)]);
}

#[tokio::test]
async fn logic_delete_fails_when_disabled_without_touching_the_executor() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    let err = mapper(&executor, &resolver, MapperConfig::default())
        .logic_delete(&User::default())
        .await
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn logic_delete_updates_with_the_deletion_marker() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    let target = User {
        id: Some(7),
        ..User::default()
    };
    mapper(&executor, &resolver, logic_config())
        .logic_delete(&target)
        .await
        .unwrap();
    match &executor.calls()[..] {
        [Call::Update {
            condition,
            set,
            set_null,
        }] => {
            assert_eq!(
                set,
                &User {
                    deleted: Some(1),
                    ..User::default()
                }
            );
            assert!(!*set_null);
            // WHERE carries the by-example key and the injected guard.
            assert_eq!(
                condition.where_sql,
                "AND id = :EQ_id AND deleted != :NE_deleted"
            );
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }
}

#[tokio::test]
async fn delete_is_physical_when_logic_delete_is_off() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    mapper(&executor, &resolver, MapperConfig::default())
        .eq("id", 7)
        .delete(None)
        .await
        .unwrap();
    assert!(matches!(&executor.calls()[..], [Call::Delete(_)]));
}

#[tokio::test]
async fn delete_is_rewritten_into_an_update_under_logic_mode() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    mapper(&executor, &resolver, logic_config())
        .eq("id", 7)
        .delete(None)
        .await
        .unwrap();
    match &executor.calls()[..] {
        [Call::Update { set, .. }] => {
            assert_eq!(set.deleted, Some(1));
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }
}

#[tokio::test]
async fn update_separates_set_and_where_sources() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    let set = User {
        status: Some("inactive".to_string()),
        ..User::default()
    };
    let where_entity = User {
        age: Some(30),
        ..User::default()
    };
    mapper(&executor, &resolver, MapperConfig::default())
        .update(&set, Some(&where_entity), true)
        .await
        .unwrap();
    match &executor.calls()[..] {
        [Call::Update {
            condition,
            set: recorded,
            set_null,
        }] => {
            assert_eq!(recorded, &set);
            assert!(*set_null);
            assert_eq!(condition.where_sql, "AND age = :EQ_age");
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }
}

#[tokio::test]
async fn invalid_in_string_fails_at_the_call_site() {
    let executor = MockExecutor::default();
    let resolver = resolver();
    let err = mapper(&executor, &resolver, MapperConfig::default())
        .in_str("id", "")
        .unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(executor.calls().is_empty());
}
