//! Convention-driven mapping between record types and relational tables.
//!
//! This crate builds, once per entity type, a [`Map`] describing how the
//! type's members correspond to table columns:
//!
//! - [`Entity`] — a type that describes its members as a
//!   [`TypeDescriptor`]; usually derived with `#[derive(Entity)]`.
//! - [`MapperConfiguration`] — naming conventions and key / calculated /
//!   ignore predicates applied when maps are built.
//! - [`Map`] — ordered [`Field`]s plus cached SQL fragments and statements,
//!   row-to-entity conversion and entity-to-parameter binding.
//! - [`Registry`] — a thread-safe cache of maps keyed by type.
//! - [`Conditions`] — typed column/value filters rendered as `WHERE`
//!   clauses.
//!
//! Databases are reached only through the [`RowSource`] /
//! [`AsyncRowSource`] and [`CommandSink`] traits.
//!
//! # Example
//!
//! ```
//! use tablemap_core::*;
//!
//! #[derive(Debug, Default, PartialEq, Entity)]
//! struct TestUser {
//!     #[map(key)]
//!     id: uuid::Uuid,
//!     email: String,
//!     #[map(calculated)]
//!     created: chrono::NaiveDateTime,
//! }
//!
//! let config = MapperConfiguration::new().with_table_convention(NameConvention::SplitCaseLower);
//! let map = Map::<TestUser>::with_configuration(&config);
//!
//! assert_eq!(map.table_name(), "test_user");
//! assert_eq!(map.select_statement(), "SELECT [id], [email], [created] FROM [test_user]");
//! assert_eq!(map.insert_parameter_list(), "@email");
//!
//! let user = TestUser { email: "a@example.com".into(), ..TestUser::default() };
//! let mut params = ParameterList::new();
//! map.bind_parameters(&user, &mut params, true);
//! assert_eq!(params.names(), ["id", "email"]);
//!
//! let mut rows = params.into_rows();
//! RowSource::advance(&mut rows).unwrap();
//! assert_eq!(map.create(&rows).unwrap(), user);
//! ```

extern crate self as tablemap_core;

mod classify;
mod condition;
mod config;
mod convert;
mod descriptor;
mod error;
mod field;
mod map;
mod naming;
mod registry;
mod source;
mod statement;
mod types;
mod value;

pub use classify::{FieldKind, classify};
pub use condition::Conditions;
pub use config::{Dialect, MapperConfiguration, MappingSettings, MemberPredicate, NameConverter};
pub use convert::{
    Discriminant, FieldValue, MappedEnum, enum_from_value, enum_semantic_type, enum_to_value,
};
pub use descriptor::{Declared, Entity, Member, TypeDescriptor};
pub use error::{MapError, Result};
pub use field::{Field, FieldMapping};
pub use map::{AnyMap, Entities, Map};
pub use naming::{NameConvention, convert_name};
pub use registry::Registry;
pub use source::{
    AsyncRowSource, CommandSink, MemoryRows, Parameter, ParameterList, Row, RowError, RowSource,
};
pub use statement::{StatementKind, quote_identifier};
pub use types::{IntegralRepr, SemanticType, StorageType, ValueKind, storage_type};
pub use value::{Value, ValueError};

#[cfg(feature = "derive")]
pub use tablemap_derive::{Entity, MapEnum};
