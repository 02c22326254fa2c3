//! Option metadata and the [`OptionSource`] registration trait.

use crate::field::Field;
use crate::update::UpdateRule;
use crate::value::FieldShape;

/// Separates namespaces from option names, e.g. `alias:2:name`.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Prefix selecting `false` for boolean options.
pub const BOOL_FALSE_PREFIX: &str = "no-";

/// How prominently an option shows up in filtered help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Importance {
    #[default]
    Never,
    /// Shown only while the option has no value.
    IfUnset,
    Always,
}

/// Declared metadata of one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: String,
    pub short_name: Option<char>,
    pub description: String,
    pub mandatory: bool,
    pub update_rule: UpdateRule,
    pub importance: Importance,
    /// Parse the value as a time value (`1h30m`). Long fields receive
    /// milliseconds.
    pub time_val: bool,
}

impl OptionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        OptionSpec {
            name: name.into(),
            short_name: None,
            description: String::new(),
            mandatory: false,
            update_rule: UpdateRule::default(),
            importance: Importance::default(),
            time_val: false,
        }
    }
}

/// An option bound to caller-owned storage.
pub struct OptionField<'a> {
    spec: OptionSpec,
    slot: &'a mut dyn Field,
}

impl<'a> OptionField<'a> {
    pub fn new<F: Field>(name: impl Into<String>, slot: &'a mut F) -> Self {
        OptionField {
            spec: OptionSpec::new(name),
            slot,
        }
    }

    pub fn short(mut self, short_name: char) -> Self {
        self.spec.short_name = Some(short_name);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.spec.description = description.into();
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.spec.mandatory = true;
        self
    }

    pub fn update_rule(mut self, rule: UpdateRule) -> Self {
        self.spec.update_rule = rule;
        self
    }

    pub fn importance(mut self, importance: Importance) -> Self {
        self.spec.importance = importance;
        self
    }

    pub fn time_val(mut self) -> Self {
        self.spec.time_val = true;
        self
    }

    pub fn spec(&self) -> &OptionSpec {
        &self.spec
    }

    pub fn shape(&self) -> FieldShape {
        self.slot.shape()
    }

    pub(crate) fn slot(&self) -> &(dyn Field + 'a) {
        &*self.slot
    }

    pub(crate) fn slot_mut(&mut self) -> &mut (dyn Field + 'a) {
        &mut *self.slot
    }
}

impl std::fmt::Debug for OptionField<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionField")
            .field("spec", &self.spec)
            .field("shape", &self.slot.shape())
            .finish()
    }
}

/// Per-source namespace settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionClass {
    pub alias: Option<String>,
    /// When false the options are only reachable through a namespaced name.
    pub global_namespace: bool,
}

impl Default for OptionClass {
    fn default() -> Self {
        OptionClass {
            alias: None,
            global_namespace: true,
        }
    }
}

impl OptionClass {
    pub fn alias(alias: impl Into<String>) -> Self {
        OptionClass {
            alias: Some(alias.into()),
            ..OptionClass::default()
        }
    }

    pub fn global_namespace(mut self, global: bool) -> Self {
        self.global_namespace = global;
        self
    }
}

/// A type whose fields can be set from options.
///
/// ```
/// use optbind::{OptionField, OptionSource};
///
/// #[derive(Default)]
/// struct Server {
///     port: i32,
///     verbose: bool,
/// }
///
/// impl OptionSource for Server {
///     fn options(&mut self) -> Vec<OptionField<'_>> {
///         vec![
///             OptionField::new("port", &mut self.port).short('p'),
///             OptionField::new("verbose", &mut self.verbose).short('v'),
///         ]
///     }
/// }
/// ```
pub trait OptionSource {
    /// Fully qualified, `.`-separated class name used for namespacing.
    /// Defaults to the Rust type path.
    fn class_name(&self) -> String {
        std::any::type_name::<Self>().replace("::", ".")
    }

    fn option_class(&self) -> OptionClass {
        OptionClass::default()
    }

    /// Bind every option of this source to its storage.
    fn options(&mut self) -> Vec<OptionField<'_>>;
}
