//! Mapped fields.

use std::fmt;

use crate::classify::FieldKind;
use crate::descriptor::{Getter, Setter};
use crate::error::{MapError, Result};
use crate::types::{SemanticType, StorageType};
use crate::value::Value;

/// Mapping metadata for one member of an entity.
///
/// The member name never changes; the column name and classification can be
/// reconfigured through [`Map`](crate::Map).
pub struct Field<T> {
    member: &'static str,
    pub(crate) column: String,
    pub(crate) kind: FieldKind,
    value_type: SemanticType,
    storage_type: StorageType,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> Field<T> {
    pub(crate) fn new(
        member: &'static str,
        column: String,
        kind: FieldKind,
        value_type: SemanticType,
        get: Getter<T>,
        set: Setter<T>,
    ) -> Self {
        Self {
            member,
            column,
            kind,
            storage_type: value_type.storage_type(),
            value_type,
            get,
            set,
        }
    }

    pub fn member(&self) -> &'static str {
        self.member
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn value_type(&self) -> &SemanticType {
        &self.value_type
    }

    pub fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    /// Reads the member's current value from an entity.
    pub fn value(&self, entity: &T) -> Value {
        (self.get)(entity)
    }

    /// Coerces a raw value into the member and assigns it.
    pub fn assign(&self, entity: &mut T, value: Value) -> Result<()> {
        (self.set)(entity, value).map_err(|source| MapError::Value {
            member: self.member.to_string(),
            source,
        })
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("member", &self.member)
            .field("column", &self.column)
            .field("kind", &self.kind)
            .field("value_type", &self.value_type)
            .field("storage_type", &self.storage_type)
            .finish_non_exhaustive()
    }
}

/// Replacement column name and classification for a member, applied in bulk
/// by [`Map::mapping`](crate::Map::mapping).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub member: String,
    pub column: String,
    pub kind: FieldKind,
}

impl FieldMapping {
    pub fn new(member: impl Into<String>, column: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            member: member.into(),
            column: column.into(),
            kind,
        }
    }
}
