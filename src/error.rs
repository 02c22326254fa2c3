//! Errors raised while defining, parsing and validating options.

use std::fmt;

use crate::update::UpdateRule;

/// Which half of a map entry failed to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapSide {
    Key,
    Value,
    /// The converted pair was rejected as a whole.
    Entry,
}

impl fmt::Display for MapSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MapSide::Key => "key",
            MapSide::Value => "value",
            MapSide::Entry => "entry",
        })
    }
}

/// Every failure the library reports. All of them are synchronous and
/// non-retryable; mutations applied before the failure are kept.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    // -- definition errors (construction time) --
    #[error("Option name '{name}' in class '{class}' is invalid. {reason}")]
    InvalidName {
        name: String,
        class: String,
        reason: String,
    },

    #[error("Option field with name '{name}' is defined more than once in class '{class}'")]
    DuplicateOption { name: String, class: String },

    #[error(
        "Option field with name '{name}' in class '{class}' is defined with a different type \
         than same option in class '{other_class}'"
    )]
    TypeMismatch {
        name: String,
        class: String,
        other_class: String,
    },

    #[error(
        "Option '{name}' in class '{class}' attempts to use updateRule {rule} with non-ordered \
         type '{type_name}'"
    )]
    UnorderedUpdateRule {
        name: String,
        class: String,
        rule: UpdateRule,
        type_name: String,
    },

    #[error("Option '{name}' in class '{class}' has unsupported type '{type_name}': {reason}")]
    UnsupportedType {
        name: String,
        class: String,
        type_name: String,
        reason: String,
    },

    // -- lookup --
    #[error("Could not find option with name {name}")]
    UnknownOption { name: String },

    // -- conversion --
    #[error("Couldn't convert value '{value}' to a {expected} for option '{name}'")]
    Conversion {
        name: String,
        expected: String,
        value: String,
    },

    #[error("Couldn't convert {side} '{text}' to a {expected} for option '{name}'")]
    MapConversion {
        name: String,
        side: MapSide,
        expected: String,
        text: String,
    },

    // -- argument stream --
    #[error("option '{name}' requires a '{expected}' argument")]
    MissingArgument { name: String, expected: String },

    #[error("map option '{name}' requires a key and a value, found no key")]
    MissingMapKey { name: String },

    #[error("map option '{name}' requires a value for key '{key}'")]
    MissingMapValue { name: String, key: String },

    // -- update rules --
    #[error("Attempted to update immutable value for option '{name}'")]
    ImmutableUpdate { name: String },

    // -- post validation --
    #[error("Found missing mandatory options: {}", names.join(", "))]
    UnsetMandatory { names: Vec<String> },

    // -- key store --
    #[error("Could not resolve key store value '{key}' for option '{name}': {reason}")]
    KeyStore {
        name: String,
        key: String,
        reason: String,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ConfigError {
    /// The option name this error is about, when there is one.
    pub fn option_name(&self) -> Option<&str> {
        match self {
            ConfigError::InvalidName { name, .. }
            | ConfigError::DuplicateOption { name, .. }
            | ConfigError::TypeMismatch { name, .. }
            | ConfigError::UnorderedUpdateRule { name, .. }
            | ConfigError::UnsupportedType { name, .. }
            | ConfigError::UnknownOption { name }
            | ConfigError::Conversion { name, .. }
            | ConfigError::MapConversion { name, .. }
            | ConfigError::MissingArgument { name, .. }
            | ConfigError::MissingMapKey { name }
            | ConfigError::MissingMapValue { name, .. }
            | ConfigError::ImmutableUpdate { name }
            | ConfigError::KeyStore { name, .. } => Some(name),
            ConfigError::UnsetMandatory { .. } | ConfigError::Internal(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_conversion_names_the_side() {
        let err = ConfigError::MapConversion {
            name: "my_option".into(),
            side: MapSide::Key,
            expected: "int".into(),
            text: "abc".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("key"), "{}", msg);
        assert!(msg.contains("abc"), "{}", msg);
    }

    #[test]
    fn unset_mandatory_lists_every_name() {
        let err = ConfigError::UnsetMandatory {
            names: vec!["--a".into(), "--b".into()],
        };
        assert_eq!(err.to_string(), "Found missing mandatory options: --a, --b");
        assert_eq!(err.option_name(), None);
    }

    #[test]
    fn unknown_option_carries_name() {
        let err = ConfigError::UnknownOption {
            name: "unknown-flag".into(),
        };
        assert_eq!(err.option_name(), Some("unknown-flag"));
        assert!(err.to_string().contains("unknown-flag"));
    }
}
