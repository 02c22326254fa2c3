//! The option index and value application.
//!
//! [`OptionSetter`] borrows every registered [`OptionSource`] mutably, builds
//! a name index once, and then converts and writes option values into the
//! bound fields. A name can resolve to fields in several sources; setting it
//! fans out to all of them.
//!
//! Every option is indexed under its plain name (unless its source opted out
//! of the global namespace) and under namespaced forms:
//!
//! ```text
//! name  alias:name  alias:N:name  some.Class:name  some.Class:N:name
//! ```
//!
//! `N` is the 1-based occurrence of the class among the registered sources.
//! The same forms are registered for the short name and, for booleans, for
//! `no-<name>`.

use std::collections::{BTreeSet, HashMap};

use crate::error::{ConfigError, MapSide};
use crate::keystore::{self, KeyStoreClient};
use crate::option::{OptionClass, OptionField, OptionSource, OptionSpec};
use crate::option::{BOOL_FALSE_PREFIX, NAMESPACE_SEPARATOR};
use crate::value::{FieldShape, TimeVal, Value, ValueKind};
use crate::Result;

/// Identifies a field changed by a set call.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Position of the source in registration order.
    pub source: usize,
    pub class_name: String,
    /// Declared option name of the field.
    pub option: String,
    /// Converted key, for map fields.
    pub key: Option<Value>,
}

struct SourceEntry<'a> {
    class_name: String,
    option_class: OptionClass,
    fields: Vec<OptionField<'a>>,
}

/// (source, field) positions.
type Target = (usize, usize);

pub struct OptionSetter<'a> {
    sources: Vec<SourceEntry<'a>>,
    index: HashMap<String, Vec<Target>>,
    key_store: Option<Box<dyn KeyStoreClient + 'a>>,
}

impl<'a> OptionSetter<'a> {
    /// Index `sources` in the given order. Fails on the first definition
    /// error.
    pub fn new(sources: Vec<&'a mut dyn OptionSource>) -> Result<Self> {
        let sources: Vec<SourceEntry<'a>> = sources
            .into_iter()
            .map(|source| {
                let class_name = source.class_name();
                let option_class = source.option_class();
                SourceEntry {
                    class_name,
                    option_class,
                    fields: source.options(),
                }
            })
            .collect();
        let index = build_index(&sources)?;
        log::debug!(
            "indexed {} option names across {} sources",
            index.len(),
            sources.len()
        );
        Ok(OptionSetter {
            sources,
            index,
            key_store: None,
        })
    }

    pub fn builder() -> OptionSetterBuilder<'a> {
        OptionSetterBuilder::default()
    }

    pub fn set_key_store<K: KeyStoreClient + 'a>(&mut self, key_store: K) {
        self.key_store = Some(Box::new(key_store));
    }

    pub fn key_store(&self) -> Option<&(dyn KeyStoreClient + 'a)> {
        self.key_store.as_deref()
    }

    // -- Lookup -----------------------------------------------------------------

    fn targets(&self, name: &str) -> Result<Vec<Target>> {
        self.index
            .get(name)
            .filter(|targets| !targets.is_empty())
            .cloned()
            .ok_or_else(|| ConfigError::UnknownOption {
                name: name.to_string(),
            })
    }

    fn first_field(&self, name: &str) -> Result<&OptionField<'a>> {
        let (s, f) = self.targets(name)?[0];
        Ok(&self.sources[s].fields[f])
    }

    /// Whether `name` is known to any source.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn shape_for_option(&self, name: &str) -> Result<FieldShape> {
        Ok(self.first_field(name)?.shape())
    }

    pub fn is_boolean_option(&self, name: &str) -> Result<bool> {
        Ok(self.shape_for_option(name)?.is_boolean())
    }

    pub fn is_map_option(&self, name: &str) -> Result<bool> {
        Ok(self.shape_for_option(name)?.is_map())
    }

    /// Lowercase type name used in "requires a ... argument" messages.
    pub fn type_for_option(&self, name: &str) -> Result<String> {
        Ok(self.shape_for_option(name)?.type_name())
    }

    // -- Setting values -----------------------------------------------------------

    /// Convert `text` for every field registered under `name` and apply it.
    /// Scalars go through their update rule; collections get the value
    /// appended. Returns the fields that actually changed.
    ///
    /// Sources updated before a failure keep their new values.
    pub fn set_option_value(&mut self, name: &str, text: &str) -> Result<Vec<FieldDef>> {
        let targets = self.targets(name)?;
        let text = keystore::resolve(self.key_store(), name, text)?;
        let mut changed = Vec::new();
        for (s, f) in targets {
            let source = &mut self.sources[s];
            let field = &mut source.fields[f];
            let applied = match field.shape() {
                FieldShape::Scalar(kind) => {
                    let value = convert(field.spec(), kind, name, &text)?;
                    let rule = field.spec().update_rule;
                    let current = field.slot().current();
                    if rule.should_update(name, current.as_ref(), &value)? {
                        if !field.slot_mut().assign(value) {
                            return Err(rejected(name, &source.class_name));
                        }
                        true
                    } else {
                        false
                    }
                }
                FieldShape::Collection(kind) => {
                    let value = convert(field.spec(), kind, name, &text)?;
                    if !field.slot_mut().add(value) {
                        return Err(rejected(name, &source.class_name));
                    }
                    true
                }
                FieldShape::Map(..) => {
                    return Err(ConfigError::Internal(format!(
                        "map option '{}' needs a key",
                        name
                    )));
                }
            };
            if applied {
                log::debug!("{}: set '{}' to '{}'", source.class_name, field.spec().name, text);
                changed.push(FieldDef {
                    source: s,
                    class_name: source.class_name.clone(),
                    option: field.spec().name.clone(),
                    key: None,
                });
            }
        }
        Ok(changed)
    }

    /// Insert `key` -> `value` into every map field registered under `name`.
    /// The value is converted before the key.
    pub fn set_option_map_value(
        &mut self,
        name: &str,
        key_text: &str,
        value_text: &str,
    ) -> Result<Vec<FieldDef>> {
        let targets = self.targets(name)?;
        let value_text = keystore::resolve(self.key_store(), name, value_text)?;
        let mut changed = Vec::new();
        for (s, f) in targets {
            let source = &mut self.sources[s];
            let field = &mut source.fields[f];
            let FieldShape::Map(key_kind, value_kind) = field.shape() else {
                return Err(ConfigError::Internal(format!(
                    "key not applicable for non-map option '{}'",
                    name
                )));
            };
            let value = value_kind
                .translate(&value_text)
                .ok_or_else(|| map_error(name, MapSide::Value, value_kind, &value_text))?;
            let key = key_kind
                .translate(key_text)
                .ok_or_else(|| map_error(name, MapSide::Key, key_kind, key_text))?;
            if !field.slot_mut().insert(key.clone(), value) {
                return Err(map_error(
                    name,
                    MapSide::Entry,
                    value_kind,
                    &format!("{}={}", key_text, value_text),
                ));
            }
            log::debug!(
                "{}: put '{}' = '{}' into '{}'",
                source.class_name,
                key_text,
                value_text,
                field.spec().name
            );
            changed.push(FieldDef {
                source: s,
                class_name: source.class_name.clone(),
                option: field.spec().name.clone(),
                key: Some(key),
            });
        }
        Ok(changed)
    }

    // -- Mandatory options --------------------------------------------------------

    /// `--name` of every mandatory option that is still unset. Only
    /// unqualified index entries are inspected, so each field is reported
    /// once however many aliases it has.
    pub fn unset_mandatory_options(&self) -> BTreeSet<String> {
        let mut unset = BTreeSet::new();
        for (name, targets) in &self.index {
            if name.contains(NAMESPACE_SEPARATOR) {
                continue;
            }
            for &(s, f) in targets {
                let field = &self.sources[s].fields[f];
                if field.spec().mandatory && field.slot().is_unset() {
                    unset.insert(format!("--{}", field.spec().name));
                }
            }
        }
        unset
    }

    pub fn validate_mandatory_options(&self) -> Result<()> {
        let unset = self.unset_mandatory_options();
        if unset.is_empty() {
            return Ok(());
        }
        Err(ConfigError::UnsetMandatory {
            names: unset.into_iter().collect(),
        })
    }

    /// Registered sources as (class name, fields), in registration order.
    pub(crate) fn sources(&self) -> impl Iterator<Item = (&str, &[OptionField<'a>])> {
        self.sources
            .iter()
            .map(|source| (source.class_name.as_str(), source.fields.as_slice()))
    }
}

impl std::fmt::Debug for OptionSetter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionSetter")
            .field(
                "sources",
                &self.sources.iter().map(|s| &s.class_name).collect::<Vec<_>>(),
            )
            .field("names", &self.index.len())
            .field("key_store", &self.key_store.is_some())
            .finish()
    }
}

/// Collects sources for an [`OptionSetter`].
#[derive(Default)]
pub struct OptionSetterBuilder<'a> {
    sources: Vec<&'a mut dyn OptionSource>,
    key_store: Option<Box<dyn KeyStoreClient + 'a>>,
}

impl<'a> OptionSetterBuilder<'a> {
    pub fn source<S: OptionSource>(mut self, source: &'a mut S) -> Self {
        self.sources.push(source);
        self
    }

    pub fn key_store<K: KeyStoreClient + 'a>(mut self, key_store: K) -> Self {
        self.key_store = Some(Box::new(key_store));
        self
    }

    pub fn build(self) -> Result<OptionSetter<'a>> {
        let mut setter = OptionSetter::new(self.sources)?;
        setter.key_store = self.key_store;
        Ok(setter)
    }
}

// -- Index construction -----------------------------------------------------------

fn build_index(sources: &[SourceEntry<'_>]) -> Result<HashMap<String, Vec<Target>>> {
    let mut index: HashMap<String, Vec<Target>> = HashMap::new();
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for (s, source) in sources.iter().enumerate() {
        check_namespace(source)?;
        let occurrence = occurrences.entry(source.class_name.as_str()).or_insert(0);
        *occurrence += 1;
        let occurrence = *occurrence;

        let mut prefixes = Vec::new();
        if let Some(alias) = &source.option_class.alias {
            prefixes.push(format!("{}{}", alias, NAMESPACE_SEPARATOR));
            prefixes.push(format!(
                "{}{}{}{}",
                alias, NAMESPACE_SEPARATOR, occurrence, NAMESPACE_SEPARATOR
            ));
        }
        prefixes.push(format!("{}{}", source.class_name, NAMESPACE_SEPARATOR));
        prefixes.push(format!(
            "{}{}{}{}",
            source.class_name, NAMESPACE_SEPARATOR, occurrence, NAMESPACE_SEPARATOR
        ));

        for (f, field) in source.fields.iter().enumerate() {
            check_definition(&source.class_name, field)?;
            let spec = field.spec();
            let mut names = vec![spec.name.clone()];
            if let Some(short) = spec.short_name {
                names.push(short.to_string());
            }
            if field.shape().is_boolean() {
                names.push(format!("{}{}", BOOL_FALSE_PREFIX, spec.name));
            }
            for name in names {
                if source.option_class.global_namespace {
                    add_name(&mut index, sources, name.clone(), (s, f))?;
                }
                for prefix in &prefixes {
                    add_name(&mut index, sources, format!("{}{}", prefix, name), (s, f))?;
                }
            }
        }
    }
    Ok(index)
}

/// Class names and aliases become index prefixes, so they must be non-empty
/// and free of the separator.
fn check_namespace(source: &SourceEntry<'_>) -> Result<()> {
    let names = std::iter::once(&source.class_name).chain(source.option_class.alias.as_ref());
    for name in names {
        let reason = if name.is_empty() {
            "Namespaces cannot be empty".to_string()
        } else if name.contains(NAMESPACE_SEPARATOR) {
            format!(
                "Namespaces cannot contain the namespace separator character '{}'",
                NAMESPACE_SEPARATOR
            )
        } else {
            continue;
        };
        return Err(ConfigError::InvalidName {
            name: name.clone(),
            class: source.class_name.clone(),
            reason,
        });
    }
    Ok(())
}

fn check_definition(class: &str, field: &OptionField<'_>) -> Result<()> {
    let spec = field.spec();
    let shape = field.shape();
    let invalid = |reason: String| ConfigError::InvalidName {
        name: spec.name.clone(),
        class: class.to_string(),
        reason,
    };
    if spec.name.is_empty() {
        return Err(invalid("Option names cannot be empty".to_string()));
    }
    if spec.name.contains(NAMESPACE_SEPARATOR) || spec.short_name == Some(NAMESPACE_SEPARATOR) {
        return Err(invalid(format!(
            "Option names cannot contain the namespace separator character '{}'",
            NAMESPACE_SEPARATOR
        )));
    }
    if spec.update_rule.requires_ordering() && !shape.is_ordered() {
        return Err(ConfigError::UnorderedUpdateRule {
            name: spec.name.clone(),
            class: class.to_string(),
            rule: spec.update_rule,
            type_name: shape.to_string(),
        });
    }
    if spec.time_val
        && !matches!(
            shape,
            FieldShape::Scalar(ValueKind::Long) | FieldShape::Scalar(ValueKind::TimeVal)
        )
    {
        return Err(ConfigError::UnsupportedType {
            name: spec.name.clone(),
            class: class.to_string(),
            type_name: shape.to_string(),
            reason: "time values need a long or timeval field".to_string(),
        });
    }
    Ok(())
}

fn add_name(
    index: &mut HashMap<String, Vec<Target>>,
    sources: &[SourceEntry<'_>],
    name: String,
    target: Target,
) -> Result<()> {
    let (s, f) = target;
    let class = &sources[s].class_name;
    let entry = index.entry(name).or_default();
    if entry.iter().any(|&(other, _)| other == s) {
        return Err(ConfigError::DuplicateOption {
            name: sources[s].fields[f].spec().name.clone(),
            class: class.clone(),
        });
    }
    if let Some(&(first_s, first_f)) = entry.first() {
        let existing = sources[first_s].fields[first_f].shape();
        if existing != sources[s].fields[f].shape() {
            return Err(ConfigError::TypeMismatch {
                name: sources[s].fields[f].spec().name.clone(),
                class: class.clone(),
                other_class: sources[first_s].class_name.clone(),
            });
        }
    }
    entry.push(target);
    Ok(())
}

// -- Conversion -------------------------------------------------------------------

fn convert(spec: &OptionSpec, kind: ValueKind, name: &str, text: &str) -> Result<Value> {
    let conversion = |expected: &str| ConfigError::Conversion {
        name: name.to_string(),
        expected: expected.to_string(),
        value: text.to_string(),
    };
    if spec.time_val {
        let time: TimeVal = text.parse().map_err(|_| conversion("timeval"))?;
        return match kind {
            ValueKind::Long => i64::try_from(time.as_millis())
                .map(Value::Long)
                .map_err(|_| conversion("long")),
            _ => Ok(Value::TimeVal(time)),
        };
    }
    kind.translate(text)
        .ok_or_else(|| conversion(kind.simple_name()))
}

fn map_error(name: &str, side: MapSide, kind: ValueKind, text: &str) -> ConfigError {
    ConfigError::MapConversion {
        name: name.to_string(),
        side,
        expected: kind.simple_name().to_string(),
        text: text.to_string(),
    }
}

fn rejected(name: &str, class: &str) -> ConfigError {
    ConfigError::Internal(format!(
        "field for option '{}' in class '{}' rejected a converted value",
        name, class
    ))
}
