//! Naming conventions for deriving table and column names.
//!
//! Conversion is purely syntactic: splitting inserts `_` before every
//! uppercase letter that directly follows a lowercase letter, so runs of
//! capitals such as `ID` stay together.
//!
//! # Examples
//!
//! ```
//! use tablemap_core::{NameConvention, convert_name};
//!
//! assert_eq!(convert_name("FirstName", NameConvention::SplitCaseLower), "first_name");
//! assert_eq!(convert_name("UserID", NameConvention::SplitCase), "User_ID");
//! assert_eq!(convert_name("ID", NameConvention::SplitCaseLower), "id");
//! ```

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static CASE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("static regex must compile"));

/// Basic naming conventions applied to type and member identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameConvention {
    /// Names are used as written.
    #[default]
    Exact,
    Lowercase,
    Uppercase,
    /// Words split with underscores, case preserved.
    SplitCase,
    SplitCaseLower,
    SplitCaseUpper,
}

fn split_case(name: &str) -> Cow<'_, str> {
    CASE_BOUNDARY.replace_all(name, "${1}_${2}")
}

/// Converts an identifier under the given convention.
pub fn convert_name(name: &str, convention: NameConvention) -> String {
    match convention {
        NameConvention::Exact => name.to_string(),
        NameConvention::Lowercase => name.to_lowercase(),
        NameConvention::Uppercase => name.to_uppercase(),
        NameConvention::SplitCase => split_case(name).into_owned(),
        NameConvention::SplitCaseLower => split_case(name).to_lowercase(),
        NameConvention::SplitCaseUpper => split_case(name).to_uppercase(),
    }
}
