//! Compile-time type descriptors.
//!
//! An [`Entity`] describes its members once, as a [`TypeDescriptor`]: each
//! [`Member`] carries its name, semantic type, declared overrides and a
//! typed getter/setter pair. `#[derive(Entity)]` generates the descriptor;
//! it can also be written by hand with builder calls.
//!
//! # Examples
//!
//! ```
//! use tablemap_core::{Entity, Member, TypeDescriptor};
//! use uuid::Uuid;
//!
//! #[derive(Default)]
//! struct Account {
//!     id: Uuid,
//!     email: String,
//! }
//!
//! impl Entity for Account {
//!     fn describe() -> TypeDescriptor<Self> {
//!         TypeDescriptor::new("Account")
//!             .table("accounts")
//!             .member(Member::new("Id", |a: &Account| &a.id, |a| &mut a.id).key())
//!             .member(Member::new("Email", |a: &Account| &a.email, |a| &mut a.email))
//!     }
//! }
//!
//! let descriptor = Account::describe();
//! assert_eq!(descriptor.members().len(), 2);
//! assert!(descriptor.members()[0].declared().key);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::convert::FieldValue;
use crate::types::{SemanticType, ValueKind};
use crate::value::{Value, ValueError};

/// A record type that can be mapped to a table.
pub trait Entity: Default + Send + Sync + 'static {
    /// Describes the type's mappable members in declaration order.
    fn describe() -> TypeDescriptor<Self>;
}

pub(crate) type Getter<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
pub(crate) type Setter<T> = Arc<dyn Fn(&mut T, Value) -> Result<(), ValueError> + Send + Sync>;

/// Overrides declared on a member, ahead of any configured predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declared {
    pub ignored: bool,
    pub key: bool,
    pub calculated: bool,
    pub column: Option<String>,
}

/// One member of an entity.
pub struct Member<T> {
    name: &'static str,
    value_type: SemanticType,
    declared: Declared,
    pub(crate) get: Getter<T>,
    pub(crate) set: Setter<T>,
}

impl<T: 'static> Member<T> {
    /// Describes a member through a pair of field accessors.
    pub fn new<V: FieldValue + 'static>(
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        Self {
            name,
            value_type: V::semantic_type(),
            declared: Declared::default(),
            get: Arc::new(move |entity| get(entity).to_value()),
            set: Arc::new(move |entity, value| {
                *get_mut(entity) = V::from_value(value)?;
                Ok(())
            }),
        }
    }

    /// Describes a member the engine can neither read nor write.
    ///
    /// It reports [`ValueKind::Object`], binds as `Null` and ignores
    /// assignments, and is declared ignored.
    pub fn opaque(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            value_type: SemanticType::required(ValueKind::Object(type_name)),
            declared: Declared {
                ignored: true,
                ..Declared::default()
            },
            get: Arc::new(|_| Value::Null),
            set: Arc::new(|_, _| Ok(())),
        }
    }
}

impl<T> Member<T> {
    pub fn key(mut self) -> Self {
        self.declared.key = true;
        self
    }

    pub fn ignored(mut self) -> Self {
        self.declared.ignored = true;
        self
    }

    pub fn calculated(mut self) -> Self {
        self.declared.calculated = true;
        self
    }

    /// Declares an explicit column name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.declared.column = Some(column.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value_type(&self) -> &SemanticType {
        &self.value_type
    }

    pub fn declared(&self) -> &Declared {
        &self.declared
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("declared", &self.declared)
            .finish_non_exhaustive()
    }
}

/// The members and declared table of an entity type.
#[derive(Debug)]
pub struct TypeDescriptor<T> {
    type_name: &'static str,
    table: Option<String>,
    members: Vec<Member<T>>,
}

impl<T> TypeDescriptor<T> {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            table: None,
            members: Vec::new(),
        }
    }

    /// Declares an explicit table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn member(mut self, member: Member<T>) -> Self {
        self.members.push(member);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn declared_table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn members(&self) -> &[Member<T>] {
        &self.members
    }

    pub(crate) fn into_parts(self) -> (&'static str, Option<String>, Vec<Member<T>>) {
        (self.type_name, self.table, self.members)
    }
}
