//! Field classification.
//!
//! Declared overrides beat configured predicates, which beat the default
//! derived from the member's type shape:
//!
//! 1. declared ignore → [`FieldKind::Ignore`]
//! 2. declared key → [`FieldKind::Key`]
//! 3. declared calculated → [`FieldKind::Calculated`]
//! 4. key predicate → [`FieldKind::Key`]
//! 5. calculated predicate → [`FieldKind::Calculated`]
//! 6. ignore predicate → [`FieldKind::Ignore`]
//! 7. [`FieldKind::Map`] if the storage table represents the type, else
//!    [`FieldKind::Ignore`]

use serde::{Deserialize, Serialize};

use crate::config::MapperConfiguration;
use crate::descriptor::Declared;
use crate::types::SemanticType;

/// How a field takes part in mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Read and written.
    Map,
    /// Read only; derived by the server.
    Calculated,
    /// Identity; read, and written only when keys are requested.
    Key,
    /// Excluded from mapping.
    Ignore,
}

/// Classifies a member.
///
/// # Examples
///
/// ```
/// use tablemap_core::{Declared, FieldKind, MapperConfiguration, SemanticType, ValueKind, classify};
///
/// let config = MapperConfiguration::new().with_key_match(|name, _| name == "Id");
/// let ty = SemanticType::required(ValueKind::Int32);
///
/// assert_eq!(classify("Id", &ty, &Declared::default(), &config), FieldKind::Key);
/// let declared = Declared { ignored: true, ..Declared::default() };
/// assert_eq!(classify("Id", &ty, &declared, &config), FieldKind::Ignore);
/// ```
pub fn classify(
    member: &str,
    ty: &SemanticType,
    declared: &Declared,
    config: &MapperConfiguration,
) -> FieldKind {
    if declared.ignored {
        FieldKind::Ignore
    } else if declared.key {
        FieldKind::Key
    } else if declared.calculated {
        FieldKind::Calculated
    } else if config.is_key(member, ty) {
        FieldKind::Key
    } else if config.is_calculated(member, ty) {
        FieldKind::Calculated
    } else if config.is_ignored(member, ty) {
        FieldKind::Ignore
    } else if ty.is_mappable() {
        FieldKind::Map
    } else {
        FieldKind::Ignore
    }
}
