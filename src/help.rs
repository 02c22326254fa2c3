//! Help text for registered options.

use crate::option::{Importance, OptionField, OptionSource, BOOL_FALSE_PREFIX};
use crate::value::{FieldShape, ValueKind};

/// Column where descriptions start.
const HELP_COLUMN: usize = 30;

/// Help for every option of `source`, one line per option.
///
/// With `important_only`, options of [`Importance::Never`] are left out and
/// [`Importance::IfUnset`] options are shown only while they have no value.
pub fn option_help<S: OptionSource + ?Sized>(important_only: bool, source: &mut S) -> String {
    let fields = source.options();
    render_fields(important_only, &fields)
}

pub(crate) fn render_fields(important_only: bool, fields: &[OptionField<'_>]) -> String {
    let mut out = String::new();
    for field in fields {
        if important_only && !is_important(field) {
            continue;
        }
        render_field(&mut out, field);
    }
    out
}

fn is_important(field: &OptionField<'_>) -> bool {
    match field.spec().importance {
        Importance::Never => false,
        Importance::Always => true,
        Importance::IfUnset => field.slot().is_unset(),
    }
}

fn render_field(out: &mut String, field: &OptionField<'_>) {
    let spec = field.spec();
    let shape = field.shape();

    let mut label = String::from("    ");
    if let Some(short) = spec.short_name {
        label.push('-');
        label.push(short);
        label.push_str(", ");
    }
    label.push_str("--");
    if shape.is_boolean() {
        label.push('[');
        label.push_str(BOOL_FALSE_PREFIX);
        label.push(']');
    }
    label.push_str(&spec.name);

    out.push_str(&label);
    let width = label.chars().count();
    if width < HELP_COLUMN {
        out.push_str(&" ".repeat(HELP_COLUMN - width));
    } else {
        out.push('\n');
        out.push_str(&" ".repeat(HELP_COLUMN));
    }

    out.push_str(&spec.description);
    if let Some(default) = field.slot().render() {
        out.push_str(&format!(" Default: {}.", default));
    }
    if let FieldShape::Scalar(ValueKind::Enum(kind)) = shape {
        out.push_str(&format!(" Valid values: [{}]", kind.variants().join(", ")));
    }
    out.push('\n');
}
