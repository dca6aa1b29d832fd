//! Semantic member types and the type-to-storage-type table.
//!
//! Every mapped member reports a [`SemanticType`]: the kind of value it
//! holds plus whether it is nullable. [`storage_type`] resolves that into the
//! normalized [`StorageType`] tag used when binding parameters. Required and
//! optional forms of a kind share one tag, enumerations resolve through their
//! integral representation, and anything the table does not know becomes
//! [`StorageType::Object`].

use serde::{Deserialize, Serialize};

/// Normalized storage type tag attached to bound parameters.
///
/// # Examples
///
/// ```
/// use tablemap_core::{SemanticType, StorageType, ValueKind, storage_type};
///
/// let ty = SemanticType::optional(ValueKind::Uuid);
/// assert_eq!(storage_type(&ty), StorageType::Guid);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    Boolean,
    Byte,
    String,
    DateTime,
    Int16,
    Int32,
    Int64,
    Decimal,
    Double,
    Single,
    /// Time interval.
    Time,
    /// Unique identifier (UUID/GUID).
    Guid,
    /// Binary blob.
    Binary,
    /// Opaque value with no dedicated tag.
    Object,
}

/// Integral representation of a mapped enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegralRepr {
    U8,
    I16,
    I32,
    I64,
}

impl IntegralRepr {
    /// The plain value kind this representation stores as.
    pub fn kind(self) -> ValueKind {
        match self {
            IntegralRepr::U8 => ValueKind::Byte,
            IntegralRepr::I16 => ValueKind::Int16,
            IntegralRepr::I32 => ValueKind::Int32,
            IntegralRepr::I64 => ValueKind::Int64,
        }
    }
}

/// Kind of value a member holds, independent of nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Byte,
    String,
    DateTime,
    Int16,
    Int32,
    Int64,
    Decimal,
    Double,
    Single,
    Interval,
    Uuid,
    Binary,
    /// Character array, stored as a string.
    Chars,
    /// Fieldless enumeration stored through its integral representation.
    Enum {
        name: &'static str,
        repr: IntegralRepr,
    },
    /// Anything not directly representable (nested entities, collections).
    Object(&'static str),
}

/// Semantic type of a member: its kind and whether it may be absent.
///
/// # Examples
///
/// ```
/// use tablemap_core::{FieldValue, SemanticType, ValueKind};
///
/// assert_eq!(SemanticType::of::<Option<i32>>(), SemanticType::optional(ValueKind::Int32));
/// assert!(SemanticType::of::<String>().is_mappable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SemanticType {
    pub kind: ValueKind,
    pub nullable: bool,
}

impl SemanticType {
    pub const fn required(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    pub const fn optional(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    /// Semantic type of a [`FieldValue`](crate::FieldValue) implementor.
    pub fn of<V: crate::FieldValue>() -> Self {
        V::semantic_type()
    }

    /// Returns the nullable form of this type.
    pub const fn into_nullable(self) -> Self {
        Self {
            kind: self.kind,
            nullable: true,
        }
    }

    /// Whether the storage table can represent this type directly.
    pub fn is_mappable(&self) -> bool {
        !matches!(self.kind, ValueKind::Object(_))
    }

    /// Integral representation if this is an enumeration.
    pub fn enum_repr(&self) -> Option<IntegralRepr> {
        match self.kind {
            ValueKind::Enum { repr, .. } => Some(repr),
            _ => None,
        }
    }

    pub fn storage_type(&self) -> StorageType {
        storage_type(self)
    }
}

/// Resolves a semantic type to its storage type tag.
pub fn storage_type(ty: &SemanticType) -> StorageType {
    kind_storage_type(ty.kind)
}

fn kind_storage_type(kind: ValueKind) -> StorageType {
    match kind {
        ValueKind::Bool => StorageType::Boolean,
        ValueKind::Byte => StorageType::Byte,
        ValueKind::String | ValueKind::Chars => StorageType::String,
        ValueKind::DateTime => StorageType::DateTime,
        ValueKind::Int16 => StorageType::Int16,
        ValueKind::Int32 => StorageType::Int32,
        ValueKind::Int64 => StorageType::Int64,
        ValueKind::Decimal => StorageType::Decimal,
        ValueKind::Double => StorageType::Double,
        ValueKind::Single => StorageType::Single,
        ValueKind::Interval => StorageType::Time,
        ValueKind::Uuid => StorageType::Guid,
        ValueKind::Binary => StorageType::Binary,
        ValueKind::Enum { repr, .. } => kind_storage_type(repr.kind()),
        ValueKind::Object(_) => StorageType::Object,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[(ValueKind, StorageType)] = &[
        (ValueKind::Bool, StorageType::Boolean),
        (ValueKind::Byte, StorageType::Byte),
        (ValueKind::String, StorageType::String),
        (ValueKind::DateTime, StorageType::DateTime),
        (ValueKind::Int16, StorageType::Int16),
        (ValueKind::Int32, StorageType::Int32),
        (ValueKind::Int64, StorageType::Int64),
        (ValueKind::Decimal, StorageType::Decimal),
        (ValueKind::Double, StorageType::Double),
        (ValueKind::Single, StorageType::Single),
        (ValueKind::Interval, StorageType::Time),
        (ValueKind::Uuid, StorageType::Guid),
        (ValueKind::Binary, StorageType::Binary),
        (ValueKind::Chars, StorageType::String),
    ];

    #[test]
    fn test_required_and_optional_share_tags() {
        for (kind, expected) in TABLE {
            assert_eq!(storage_type(&SemanticType::required(*kind)), *expected);
            assert_eq!(storage_type(&SemanticType::optional(*kind)), *expected);
        }
    }

    #[test]
    fn test_enum_resolves_through_repr() {
        let ty = SemanticType::required(ValueKind::Enum {
            name: "Status",
            repr: IntegralRepr::I16,
        });
        assert_eq!(storage_type(&ty), StorageType::Int16);
        assert_eq!(storage_type(&ty.into_nullable()), StorageType::Int16);
        assert_eq!(ty.enum_repr(), Some(IntegralRepr::I16));
    }

    #[test]
    fn test_object_is_unmapped() {
        let ty = SemanticType::required(ValueKind::Object("Vec<Group>"));
        assert_eq!(storage_type(&ty), StorageType::Object);
        assert!(!ty.is_mappable());
    }
}
