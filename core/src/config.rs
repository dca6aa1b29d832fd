//! Mapping policy: naming conventions, classification predicates and the
//! statement dialect.
//!
//! [`MapperConfiguration`] is the programmatic form and may carry closures.
//! [`MappingSettings`] is its serializable subset, loaded from YAML so a
//! deployment can pick conventions without recompiling.
//!
//! # Example YAML
//!
//! ```yaml
//! table_convention: split_case_lower
//! column_convention: split_case_lower
//! dialect: sqlite
//! ```

use std::fmt;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::naming::{NameConvention, convert_name};
use crate::types::SemanticType;

/// Custom name conversion replacing a convention.
pub type NameConverter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Classification predicate over a member's name and semantic type.
pub type MemberPredicate = Arc<dyn Fn(&str, &SemanticType) -> bool + Send + Sync>;

/// SQL flavour used by the full statement templates.
///
/// Fragments are the same for every dialect (bracket-quoted identifiers and
/// `@name` parameters); only the way inserted/updated rows are returned
/// differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// `OUTPUT INSERTED.*` clauses.
    #[default]
    SqlServer,
    /// `RETURNING *` clauses.
    Sqlite,
}

/// Policy applied when building maps.
///
/// Custom converters, when set, are tried before the conventions and fully
/// replace them for their name class. Predicates are only consulted for
/// members without a declared override.
///
/// # Examples
///
/// ```
/// use tablemap_core::{MapperConfiguration, NameConvention, ValueKind};
///
/// let config = MapperConfiguration::new()
///     .with_column_convention(NameConvention::SplitCaseLower)
///     .with_key_match(|name, ty| name == "Id" && ty.kind == ValueKind::Uuid);
///
/// assert_eq!(config.column_name("FirstName"), "first_name");
/// assert_eq!(config.table_name("TestUser"), "TestUser");
/// ```
#[derive(Clone, Default)]
pub struct MapperConfiguration {
    pub table_convention: NameConvention,
    pub table_converter: Option<NameConverter>,
    pub column_convention: NameConvention,
    pub column_converter: Option<NameConverter>,
    pub ignore_match: Option<MemberPredicate>,
    pub calculated_match: Option<MemberPredicate>,
    pub key_match: Option<MemberPredicate>,
    pub dialect: Dialect,
}

impl MapperConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_convention(mut self, convention: NameConvention) -> Self {
        self.table_convention = convention;
        self
    }

    pub fn with_column_convention(mut self, convention: NameConvention) -> Self {
        self.column_convention = convention;
        self
    }

    pub fn with_table_converter(
        mut self,
        converter: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.table_converter = Some(Arc::new(converter));
        self
    }

    pub fn with_column_converter(
        mut self,
        converter: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.column_converter = Some(Arc::new(converter));
        self
    }

    pub fn with_ignore_match(
        mut self,
        predicate: impl Fn(&str, &SemanticType) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.ignore_match = Some(Arc::new(predicate));
        self
    }

    pub fn with_calculated_match(
        mut self,
        predicate: impl Fn(&str, &SemanticType) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.calculated_match = Some(Arc::new(predicate));
        self
    }

    pub fn with_key_match(
        mut self,
        predicate: impl Fn(&str, &SemanticType) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.key_match = Some(Arc::new(predicate));
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Table name for a type name.
    pub fn table_name(&self, type_name: &str) -> String {
        match &self.table_converter {
            Some(convert) => convert(type_name),
            None => convert_name(type_name, self.table_convention),
        }
    }

    /// Column name for a member name.
    pub fn column_name(&self, member: &str) -> String {
        match &self.column_converter {
            Some(convert) => convert(member),
            None => convert_name(member, self.column_convention),
        }
    }

    pub(crate) fn is_ignored(&self, member: &str, ty: &SemanticType) -> bool {
        self.ignore_match.as_ref().is_some_and(|p| p(member, ty))
    }

    pub(crate) fn is_calculated(&self, member: &str, ty: &SemanticType) -> bool {
        self.calculated_match.as_ref().is_some_and(|p| p(member, ty))
    }

    pub(crate) fn is_key(&self, member: &str, ty: &SemanticType) -> bool {
        self.key_match.as_ref().is_some_and(|p| p(member, ty))
    }
}

impl fmt::Debug for MapperConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperConfiguration")
            .field("table_convention", &self.table_convention)
            .field("table_converter", &self.table_converter.is_some())
            .field("column_convention", &self.column_convention)
            .field("column_converter", &self.column_converter.is_some())
            .field("ignore_match", &self.ignore_match.is_some())
            .field("calculated_match", &self.calculated_match.is_some())
            .field("key_match", &self.key_match.is_some())
            .field("dialect", &self.dialect)
            .finish()
    }
}

/// Serializable mapping settings.
///
/// Missing keys fall back to their defaults (`exact` conventions,
/// `sql_server` dialect).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingSettings {
    pub table_convention: NameConvention,
    pub column_convention: NameConvention,
    pub dialect: Dialect,
}

impl MappingSettings {
    /// Loads settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::MapError::IoError) if the file cannot be
    /// read, or [`YamlError`](crate::MapError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let settings = serde_yaml::from_reader(reader)?;
        Ok(settings)
    }

    /// Saves the settings as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::MapError::IoError) if the file cannot be
    /// written, or [`YamlError`](crate::MapError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

impl From<MappingSettings> for MapperConfiguration {
    fn from(settings: MappingSettings) -> Self {
        MapperConfiguration::new()
            .with_table_convention(settings.table_convention)
            .with_column_convention(settings.column_convention)
            .with_dialect(settings.dialect)
    }
}

#[cfg(test)]
mod tests {
    use crate::types::ValueKind;

    use super::*;

    #[test]
    fn test_converter_replaces_convention() {
        let config = MapperConfiguration::new()
            .with_table_convention(NameConvention::Uppercase)
            .with_table_converter(|name| format!("tbl_{name}"));
        assert_eq!(config.table_name("User"), "tbl_User");
        assert_eq!(config.column_name("User"), "User");
    }

    #[test]
    fn test_predicates_default_to_false() {
        let config = MapperConfiguration::new();
        let ty = SemanticType::required(ValueKind::Int32);
        assert!(!config.is_key("Id", &ty));
        assert!(!config.is_calculated("Id", &ty));
        assert!(!config.is_ignored("Id", &ty));
    }

    #[test]
    fn test_settings_from_yaml() {
        let settings = MappingSettings::from_yaml_str(
            "table_convention: split_case_lower\ndialect: sqlite\n",
        )
        .unwrap();
        assert_eq!(settings.table_convention, NameConvention::SplitCaseLower);
        assert_eq!(settings.column_convention, NameConvention::Exact);
        assert_eq!(settings.dialect, Dialect::Sqlite);

        let config = MapperConfiguration::from(settings);
        assert_eq!(config.table_name("OrderLine"), "order_line");
    }

    #[test]
    fn test_settings_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.yml");
        let settings = MappingSettings {
            table_convention: NameConvention::SplitCaseUpper,
            column_convention: NameConvention::Lowercase,
            dialect: Dialect::SqlServer,
        };
        settings.save(&path).unwrap();
        assert_eq!(MappingSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = MappingSettings::load("/nonexistent/mapping.yml").unwrap_err();
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn test_invalid_yaml_fails() {
        assert!(MappingSettings::from_yaml_str("dialect: oracle").is_err());
    }
}
