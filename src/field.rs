//! Typed storage behind options.
//!
//! An option is bound to a `&mut` reference to a caller-owned struct member.
//! The member's type decides the option's [`FieldShape`]:
//!
//! | Rust type                         | shape        | "unset" when |
//! |-----------------------------------|--------------|--------------|
//! | scalar (`i32`, `String`, ...)     | `Scalar`     | never        |
//! | `Option<T>`                       | `Scalar`     | `None`       |
//! | `Vec<T>`, `HashSet<T>`, `BTreeSet<T>` | `Collection` | empty    |
//! | `HashMap<K, V>`, `BTreeMap<K, V>` | `Map`        | empty        |

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::path::PathBuf;

use crate::value::{FieldShape, TimeVal, Value, ValueKind};

/// A scalar type that round-trips through [`Value`].
pub trait OptionValue: Sized {
    fn kind() -> ValueKind;
    fn from_value(value: Value) -> Option<Self>;
    fn to_value(&self) -> Value;
}

/// Storage an option writes into. Methods that do not apply to the shape
/// return `false`, which the setter reports as an internal error.
pub trait Field {
    fn shape(&self) -> FieldShape;

    /// Current scalar value; `None` while unset.
    fn current(&self) -> Option<Value> {
        None
    }

    /// Replace a scalar value.
    fn assign(&mut self, _value: Value) -> bool {
        false
    }

    /// Append one element to a collection.
    fn add(&mut self, _value: Value) -> bool {
        false
    }

    /// Insert one entry into a map.
    fn insert(&mut self, _key: Value, _value: Value) -> bool {
        false
    }

    /// Null scalar, or empty collection / map.
    fn is_unset(&self) -> bool;

    /// Display form for help text; `None` while unset.
    fn render(&self) -> Option<String>;
}

// -- Scalars --------------------------------------------------------------------

#[doc(hidden)]
#[macro_export]
macro_rules! __scalar_field {
    ($ty:ty) => {
        impl $crate::Field for $ty {
            fn shape(&self) -> $crate::FieldShape {
                $crate::FieldShape::Scalar(<$ty as $crate::OptionValue>::kind())
            }

            fn current(&self) -> Option<$crate::Value> {
                Some($crate::OptionValue::to_value(self))
            }

            fn assign(&mut self, value: $crate::Value) -> bool {
                match <$ty as $crate::OptionValue>::from_value(value) {
                    Some(v) => {
                        *self = v;
                        true
                    }
                    None => false,
                }
            }

            fn is_unset(&self) -> bool {
                false
            }

            fn render(&self) -> Option<String> {
                Some($crate::OptionValue::to_value(self).to_string())
            }
        }
    };
}

macro_rules! option_value {
    ($ty:ty, $kind:ident) => {
        impl OptionValue for $ty {
            fn kind() -> ValueKind {
                ValueKind::$kind
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$kind(v) => Some(v),
                    _ => None,
                }
            }

            fn to_value(&self) -> Value {
                Value::$kind(self.clone())
            }
        }

        crate::__scalar_field!($ty);
    };
}

option_value!(bool, Bool);
option_value!(i8, Byte);
option_value!(i16, Short);
option_value!(i32, Int);
option_value!(i64, Long);
option_value!(f32, Float);
option_value!(f64, Double);
option_value!(String, Str);
option_value!(PathBuf, File);
option_value!(TimeVal, TimeVal);

/// Declare a fieldless enum usable as an option value.
///
/// Variants match their own name unless given a label:
///
/// ```
/// optbind::option_enum! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
///     pub enum Color {
///         Red = "RED",
///         Green = "GREEN",
///         Blue = "BLUE",
///     }
/// }
/// ```
///
/// Parsing tries the text as given, then uppercased, so `--color blue`
/// selects `Color::Blue` above.
#[macro_export]
macro_rules! option_enum {
    (@label $variant:ident) => {
        stringify!($variant)
    };
    (@label $variant:ident $label:literal) => {
        $label
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident $(= $label:literal)?),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            #[doc(hidden)]
            const __OPTION_LABELS: &'static [&'static str] =
                &[$($crate::option_enum!(@label $variant $($label)?)),+];
        }

        impl $crate::OptionValue for $name {
            fn kind() -> $crate::ValueKind {
                $crate::ValueKind::Enum($crate::EnumKind::new(
                    stringify!($name),
                    Self::__OPTION_LABELS,
                ))
            }

            fn from_value(value: $crate::Value) -> Option<Self> {
                match value {
                    $crate::Value::Enum(v) => {
                        $(
                            if v.variant == $crate::option_enum!(@label $variant $($label)?) {
                                return Some($name::$variant);
                            }
                        )+
                        None
                    }
                    _ => None,
                }
            }

            fn to_value(&self) -> $crate::Value {
                let variant = match self {
                    $($name::$variant => $crate::option_enum!(@label $variant $($label)?),)+
                };
                let ordinal = Self::__OPTION_LABELS
                    .iter()
                    .position(|label| *label == variant)
                    .unwrap_or_default();
                $crate::Value::Enum($crate::EnumValue { variant, ordinal })
            }
        }

        $crate::__scalar_field!($name);
    };
}

// -- Nullable scalars -------------------------------------------------------------

impl<T: OptionValue> Field for Option<T> {
    fn shape(&self) -> FieldShape {
        FieldShape::Scalar(T::kind())
    }

    fn current(&self) -> Option<Value> {
        self.as_ref().map(OptionValue::to_value)
    }

    fn assign(&mut self, value: Value) -> bool {
        match T::from_value(value) {
            Some(v) => {
                *self = Some(v);
                true
            }
            None => false,
        }
    }

    fn is_unset(&self) -> bool {
        self.is_none()
    }

    fn render(&self) -> Option<String> {
        self.as_ref().map(|v| v.to_value().to_string())
    }
}

// -- Collections ------------------------------------------------------------------

/// `[a, b]`, or `None` for an empty collection. Unordered containers are
/// sorted so help output is stable.
fn render_items(items: impl Iterator<Item = String>, sort: bool) -> Option<String> {
    let mut items: Vec<String> = items.collect();
    if items.is_empty() {
        return None;
    }
    if sort {
        items.sort();
    }
    Some(format!("[{}]", items.join(", ")))
}

fn render_entries(entries: impl Iterator<Item = (String, String)>, sort: bool) -> Option<String> {
    let mut entries: Vec<String> = entries.map(|(k, v)| format!("{}={}", k, v)).collect();
    if entries.is_empty() {
        return None;
    }
    if sort {
        entries.sort();
    }
    Some(format!("{{{}}}", entries.join(", ")))
}

impl<T: OptionValue> Field for Vec<T> {
    fn shape(&self) -> FieldShape {
        FieldShape::Collection(T::kind())
    }

    fn add(&mut self, value: Value) -> bool {
        match T::from_value(value) {
            Some(v) => {
                self.push(v);
                true
            }
            None => false,
        }
    }

    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn render(&self) -> Option<String> {
        render_items(self.iter().map(|v| v.to_value().to_string()), false)
    }
}

impl<T: OptionValue + Eq + Hash> Field for HashSet<T> {
    fn shape(&self) -> FieldShape {
        FieldShape::Collection(T::kind())
    }

    fn add(&mut self, value: Value) -> bool {
        match T::from_value(value) {
            Some(v) => {
                self.insert(v);
                true
            }
            None => false,
        }
    }

    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn render(&self) -> Option<String> {
        render_items(self.iter().map(|v| v.to_value().to_string()), true)
    }
}

impl<T: OptionValue + Ord> Field for BTreeSet<T> {
    fn shape(&self) -> FieldShape {
        FieldShape::Collection(T::kind())
    }

    fn add(&mut self, value: Value) -> bool {
        match T::from_value(value) {
            Some(v) => {
                self.insert(v);
                true
            }
            None => false,
        }
    }

    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn render(&self) -> Option<String> {
        render_items(self.iter().map(|v| v.to_value().to_string()), false)
    }
}

// -- Maps -------------------------------------------------------------------------

impl<K: OptionValue + Eq + Hash, V: OptionValue> Field for HashMap<K, V> {
    fn shape(&self) -> FieldShape {
        FieldShape::Map(K::kind(), V::kind())
    }

    fn insert(&mut self, key: Value, value: Value) -> bool {
        match (K::from_value(key), V::from_value(value)) {
            (Some(k), Some(v)) => {
                HashMap::insert(self, k, v);
                true
            }
            _ => false,
        }
    }

    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn render(&self) -> Option<String> {
        render_entries(
            self.iter()
                .map(|(k, v)| (k.to_value().to_string(), v.to_value().to_string())),
            true,
        )
    }
}

impl<K: OptionValue + Ord, V: OptionValue> Field for BTreeMap<K, V> {
    fn shape(&self) -> FieldShape {
        FieldShape::Map(K::kind(), V::kind())
    }

    fn insert(&mut self, key: Value, value: Value) -> bool {
        match (K::from_value(key), V::from_value(value)) {
            (Some(k), Some(v)) => {
                BTreeMap::insert(self, k, v);
                true
            }
            _ => false,
        }
    }

    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn render(&self) -> Option<String> {
        render_entries(
            self.iter()
                .map(|(k, v)| (k.to_value().to_string(), v.to_value().to_string())),
            false,
        )
    }
}
