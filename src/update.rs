//! Update rules: what happens when a scalar option that already holds a
//! value is set again.

use std::cmp::Ordering;
use std::fmt;

use crate::error::ConfigError;
use crate::value::Value;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateRule {
    /// Keep the first value seen.
    First,
    /// Always take the newest value.
    #[default]
    Last,
    /// Keep the greater of the current and new values.
    Greatest,
    /// Keep the lesser of the current and new values.
    Least,
    /// Accept one value; any later update is an error.
    Immutable,
}

impl UpdateRule {
    /// Decide whether `new` replaces `current`. A `current` of `None` means
    /// the field is unset, which every rule accepts.
    pub fn should_update(
        self,
        option_name: &str,
        current: Option<&Value>,
        new: &Value,
    ) -> Result<bool> {
        let Some(current) = current else {
            return Ok(true);
        };
        match self {
            UpdateRule::First => Ok(false),
            UpdateRule::Last => Ok(true),
            UpdateRule::Greatest => Ok(ordering(option_name, current, new)? == Ordering::Less),
            UpdateRule::Least => Ok(ordering(option_name, current, new)? == Ordering::Greater),
            UpdateRule::Immutable => Err(ConfigError::ImmutableUpdate {
                name: option_name.to_string(),
            }),
        }
    }

    pub fn requires_ordering(self) -> bool {
        matches!(self, UpdateRule::Greatest | UpdateRule::Least)
    }
}

fn ordering(option_name: &str, current: &Value, new: &Value) -> Result<Ordering> {
    current.compare(new).ok_or_else(|| {
        ConfigError::Internal(format!(
            "cannot compare values '{}' and '{}' for option '{}'",
            current, new, option_name
        ))
    })
}

impl fmt::Display for UpdateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UpdateRule::First => "FIRST",
            UpdateRule::Last => "LAST",
            UpdateRule::Greatest => "GREATEST",
            UpdateRule::Least => "LEAST",
            UpdateRule::Immutable => "IMMUTABLE",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    #[test]
    fn every_rule_accepts_unset() {
        for rule in [
            UpdateRule::First,
            UpdateRule::Last,
            UpdateRule::Greatest,
            UpdateRule::Least,
            UpdateRule::Immutable,
        ] {
            assert!(rule.should_update("opt", None, &s("x")).unwrap(), "{}", rule);
        }
    }

    #[test]
    fn first_and_last() {
        assert!(!UpdateRule::First.should_update("opt", Some(&s("1")), &s("2")).unwrap());
        assert!(UpdateRule::Last.should_update("opt", Some(&s("1")), &s("2")).unwrap());
    }

    #[test]
    fn greatest_and_least_compare() {
        let current = s("5 default");
        let big = s("9 bigger");
        let small = s("0 smaller");
        assert!(UpdateRule::Greatest.should_update("g", Some(&current), &big).unwrap());
        assert!(!UpdateRule::Greatest.should_update("g", Some(&current), &small).unwrap());
        assert!(UpdateRule::Least.should_update("l", Some(&current), &small).unwrap());
        assert!(!UpdateRule::Least.should_update("l", Some(&current), &big).unwrap());
        assert!(!UpdateRule::Greatest.should_update("g", Some(&current), &current).unwrap());
    }

    #[test]
    fn immutable_rejects_second_value() {
        let err = UpdateRule::Immutable
            .should_update("immutable", Some(&s("a")), &s("b"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ImmutableUpdate { ref name } if name == "immutable"));
    }

    #[test]
    fn mixed_kinds_are_internal_errors() {
        let err = UpdateRule::Greatest
            .should_update("g", Some(&Value::Int(1)), &s("2"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Internal(_)));
    }

    #[test]
    fn default_is_last() {
        assert_eq!(UpdateRule::default(), UpdateRule::Last);
        assert!(UpdateRule::Least.requires_ordering());
        assert!(!UpdateRule::Immutable.requires_ordering());
    }
}
