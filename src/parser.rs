//! Command-line style argument parsing on top of [`OptionSetter`].
//!
//! Grammar:
//!
//! ```text
//! --name value   --name=value   --flag   --no-flag   --flag=false
//! --map key value   --map key=value   --map=key=value
//! -c value   -cvalue   -abc (boolean cluster)   --
//! ```
//!
//! Parsing stops at a bare `--` (dropped) or at the first token that does
//! not start with `-` (kept); everything from there on is returned.

use crate::error::ConfigError;
use crate::help;
use crate::keystore::KeyStoreClient;
use crate::option::{OptionSource, NAMESPACE_SEPARATOR};
use crate::option::BOOL_FALSE_PREFIX;
use crate::setter::{OptionSetter, OptionSetterBuilder};
use crate::Result;

const END_OF_OPTIONS: &str = "--";

pub struct ArgsOptionParser<'a> {
    setter: OptionSetter<'a>,
}

impl<'a> ArgsOptionParser<'a> {
    pub fn new(sources: Vec<&'a mut dyn OptionSource>) -> Result<Self> {
        Ok(ArgsOptionParser {
            setter: OptionSetter::new(sources)?,
        })
    }

    pub fn builder() -> ParserBuilder<'a> {
        ParserBuilder {
            inner: OptionSetter::builder(),
        }
    }

    /// Parse `args`, applying every option to the registered sources.
    /// Returns the positional arguments.
    pub fn parse<S: AsRef<str>>(&mut self, args: &[S]) -> Result<Vec<String>> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        self.run(&args).map_err(|(_, err)| err)
    }

    /// Like [`parse`](Self::parse), but stop at the first option that cannot
    /// be applied and return it, with everything after it, as leftovers.
    /// Options applied before the failure stay applied.
    pub fn parse_best_effort<S: AsRef<str>>(&mut self, args: &[S]) -> Vec<String> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        match self.run(&args) {
            Ok(positional) => positional,
            Err((start, err)) => {
                log::debug!("stopped parsing at '{}': {}", args[start], err);
                owned(&args[start..])
            }
        }
    }

    /// On failure, returns the position of the token that started the
    /// failing option.
    fn run(&mut self, args: &[&str]) -> std::result::Result<Vec<String>, (usize, ConfigError)> {
        let mut pos = 0;
        while pos < args.len() {
            let arg = args[pos];
            if arg == END_OF_OPTIONS {
                pos += 1;
                break;
            }
            if !arg.starts_with('-') || arg == "-" {
                break;
            }
            let start = pos;
            pos += 1;
            let applied = match arg.strip_prefix("--") {
                Some(long) => self.handle_long(long, args, &mut pos),
                None => self.handle_short(&arg[1..], args, &mut pos),
            };
            applied.map_err(|err| (start, err))?;
        }
        Ok(owned(&args[pos..]))
    }

    fn handle_long(&mut self, body: &str, args: &[&str], pos: &mut usize) -> Result<()> {
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        if self.setter.is_map_option(name)? {
            return self.handle_map(name, inline, args, pos);
        }
        let value = match inline {
            Some(value) => value.to_string(),
            None => {
                if self.setter.is_boolean_option(name)? {
                    boolean_text(name).to_string()
                } else {
                    self.grab_next(name, args, pos)?
                }
            }
        };
        self.setter.set_option_value(name, &value)?;
        Ok(())
    }

    fn handle_short(&mut self, cluster: &str, args: &[&str], pos: &mut usize) -> Result<()> {
        for (i, c) in cluster.char_indices() {
            let name = c.to_string();
            let rest = &cluster[i + c.len_utf8()..];
            let inline = (!rest.is_empty()).then_some(rest);
            if self.setter.is_map_option(&name)? {
                return self.handle_map(&name, inline, args, pos);
            }
            if self.setter.is_boolean_option(&name)? {
                self.setter.set_option_value(&name, "true")?;
                continue;
            }
            let value = match inline {
                Some(value) => value.to_string(),
                None => self.grab_next(&name, args, pos)?,
            };
            self.setter.set_option_value(&name, &value)?;
            return Ok(());
        }
        Ok(())
    }

    /// A map entry is either one `key=value` token, split at the first
    /// unescaped `=`, or a key token followed by a value token. `\=` stands
    /// for a literal `=` in both forms.
    fn handle_map(
        &mut self,
        name: &str,
        inline: Option<&str>,
        args: &[&str],
        pos: &mut usize,
    ) -> Result<()> {
        let first = match inline {
            Some(text) => text,
            None => next_token(args, pos).ok_or_else(|| ConfigError::MissingMapKey {
                name: name.to_string(),
            })?,
        };
        let (key, value) = match split_entry(first) {
            Some((key, value)) => (key, value),
            None => {
                let value = next_token(args, pos).ok_or_else(|| ConfigError::MissingMapValue {
                    name: name.to_string(),
                    key: unescape(first),
                })?;
                (first, value)
            }
        };
        self.setter
            .set_option_map_value(name, &unescape(key), &unescape(value))?;
        Ok(())
    }

    fn grab_next(&self, name: &str, args: &[&str], pos: &mut usize) -> Result<String> {
        match next_token(args, pos) {
            Some(value) => Ok(value.to_string()),
            None => Err(ConfigError::MissingArgument {
                name: name.to_string(),
                expected: self.setter.type_for_option(name)?,
            }),
        }
    }

    // -- Delegates ------------------------------------------------------------------

    pub fn validate_mandatory_options(&self) -> Result<()> {
        self.setter.validate_mandatory_options()
    }

    pub fn unset_mandatory_options(&self) -> std::collections::BTreeSet<String> {
        self.setter.unset_mandatory_options()
    }

    /// Help for every registered source, in registration order.
    pub fn option_help(&self, important_only: bool) -> String {
        self.setter
            .sources()
            .map(|(_, fields)| help::render_fields(important_only, fields))
            .collect()
    }

    pub fn set_key_store<K: KeyStoreClient + 'a>(&mut self, key_store: K) {
        self.setter.set_key_store(key_store);
    }

    pub fn setter(&self) -> &OptionSetter<'a> {
        &self.setter
    }

    pub fn setter_mut(&mut self) -> &mut OptionSetter<'a> {
        &mut self.setter
    }
}

impl<'a> From<OptionSetter<'a>> for ArgsOptionParser<'a> {
    fn from(setter: OptionSetter<'a>) -> Self {
        ArgsOptionParser { setter }
    }
}

impl std::fmt::Debug for ArgsOptionParser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgsOptionParser")
            .field("setter", &self.setter)
            .finish()
    }
}

/// Collects sources for an [`ArgsOptionParser`].
#[derive(Default)]
pub struct ParserBuilder<'a> {
    inner: OptionSetterBuilder<'a>,
}

impl<'a> ParserBuilder<'a> {
    pub fn source<S: OptionSource>(self, source: &'a mut S) -> Self {
        ParserBuilder {
            inner: self.inner.source(source),
        }
    }

    pub fn key_store<K: KeyStoreClient + 'a>(self, key_store: K) -> Self {
        ParserBuilder {
            inner: self.inner.key_store(key_store),
        }
    }

    pub fn build(self) -> Result<ArgsOptionParser<'a>> {
        Ok(self.inner.build()?.into())
    }
}

// -- Token helpers ------------------------------------------------------------------

fn next_token<'s>(args: &[&'s str], pos: &mut usize) -> Option<&'s str> {
    let token = args.get(*pos).copied()?;
    *pos += 1;
    Some(token)
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

/// `false` when the last namespace segment carries the `no-` prefix.
fn boolean_text(name: &str) -> &'static str {
    let last = name
        .rsplit_once(NAMESPACE_SEPARATOR)
        .map_or(name, |(_, last)| last);
    if last.starts_with(BOOL_FALSE_PREFIX) {
        "false"
    } else {
        "true"
    }
}

fn split_entry(token: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in token.char_indices() {
        match c {
            '\\' => escaped = !escaped,
            '=' if !escaped => return Some((&token[..i], &token[i + 1..])),
            _ => escaped = false,
        }
    }
    None
}

fn unescape(text: &str) -> String {
    text.replace("\\=", "=")
}
