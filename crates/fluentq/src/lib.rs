//! # fluentq
//!
//! A fluent condition-builder and query-dispatch layer for SQL data access.
//!
//! ## Features
//!
//! - **Fluent conditions**: chained predicate calls per comparison kind
//!   (eq, ne, in, not-in, lt, gt, lte, gte, like, is-null, or-eq, between)
//! - **By-example queries**: an entity's non-null fields become implicit
//!   equals-predicates through a schema resolver (explicit calls win)
//! - **Deterministic compilation**: a parameterized WHERE fragment plus a
//!   named-parameter bindings map with kind-prefixed, collision-free aliases
//! - **Operation dispatch**: insert, batch-insert, find-one, list, count,
//!   paginated select, update, update-by-key, and delete against a narrow
//!   execution collaborator trait
//! - **Logical deletes**: delete rewritten into a flag update, with an
//!   implicit "not already deleted" predicate on every guarded operation
//!
//! ## Usage
//!
//! ```ignore
//! use fluentq::{mapper, MapperConfig, Page};
//!
//! let users = mapper(&executor, &resolver, MapperConfig::default())
//!     .eq("status", "active")
//!     .in_list("id", [1, 2, 3])
//!     .like("name", "jo")
//!     .order_by("id desc")
//!     .list(None)
//!     .await?;
//!
//! let page = mapper(&executor, &resolver, MapperConfig::default())
//!     .gte("age", 18)
//!     .order_by("created_at desc")
//!     .select_page(Page::new(1, 20), None)
//!     .await?;
//! ```
//!
//! A `Mapper` is single-use: construct a fresh one per logical operation.

pub mod condition;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod page;
pub mod schema;
pub mod sql;

pub use condition::{ComparisonKind, ConditionSet, LIST_SEPARATOR};
pub use error::{MapperError, MapperResult};
pub use executor::Executor;
pub use mapper::{Mapper, MapperConfig, mapper};
pub use page::Page;
pub use schema::{ColumnMeta, SchemaResolver, SerdeResolver, SoftDelete, TableSchema};
pub use sql::{Bindings, CompiledCondition, compile};
