//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};
use serde_json::Value;

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// The document or configuration text is not valid YAML/JSON.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// A value could not be (de)serialized as JSON.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// Two `allOf` branches declare different concrete types.
    #[from(ignore)]
    #[display("allOf type conflict at '{location}': {existing} vs {incoming}")]
    TypeConflict {
        /// Pointer of the schema whose branches disagree.
        location: String,
        /// Type already accumulated from earlier branches.
        existing: Value,
        /// Type declared by the offending branch.
        incoming: Value,
    },

    /// A value that must be concrete (e.g. a required parameter) could not be synthesized.
    #[from(ignore)]
    #[display("No value could be resolved for '{name}' at '{location}'")]
    UnresolvedValue {
        /// Parameter, header or property name.
        name: String,
        /// Pointer of the definition.
        location: String,
    },

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_type_conflict_names_location() {
        let err = AppError::TypeConflict {
            location: "#/components/schemas/Pet".into(),
            existing: json!("object"),
            incoming: json!("string"),
        };
        assert_eq!(
            err.to_string(),
            "allOf type conflict at '#/components/schemas/Pet': \"object\" vs \"string\""
        );
    }
}
