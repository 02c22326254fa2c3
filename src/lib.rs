//! optbind: bind command-line style options onto typed fields.
//!
//! Types opt in by implementing [`OptionSource`], which hands out `&mut`
//! references to the fields that options write to. An [`ArgsOptionParser`]
//! borrows one or more sources, parses an argument list into them and
//! returns the positional arguments.
//!
//! ```
//! use optbind::{ArgsOptionParser, OptionField, OptionSource};
//!
//! struct Server {
//!     port: i32,
//!     verbose: bool,
//! }
//!
//! impl OptionSource for Server {
//!     fn options(&mut self) -> Vec<OptionField<'_>> {
//!         vec![
//!             OptionField::new("port", &mut self.port).short('p'),
//!             OptionField::new("verbose", &mut self.verbose).short('v'),
//!         ]
//!     }
//! }
//!
//! let mut server = Server { port: 8888, verbose: false };
//! let mut parser = ArgsOptionParser::builder().source(&mut server).build()?;
//! let rest = parser.parse(&["-p", "9999", "-v", "extra"])?;
//! drop(parser);
//!
//! assert_eq!(rest, ["extra"]);
//! assert_eq!(server.port, 9999);
//! assert!(server.verbose);
//! # Ok::<(), optbind::ConfigError>(())
//! ```

pub mod error;
pub mod field;
pub mod help;
pub mod keystore;
pub mod option;
pub mod parser;
pub mod setter;
pub mod update;
pub mod value;

pub use error::{ConfigError, MapSide};
pub use field::{Field, OptionValue};
pub use help::option_help;
pub use keystore::{KeyStoreClient, StubKeyStoreClient};
pub use option::{Importance, OptionClass, OptionField, OptionSource, OptionSpec};
pub use option::{BOOL_FALSE_PREFIX, NAMESPACE_SEPARATOR};
pub use parser::{ArgsOptionParser, ParserBuilder};
pub use setter::{FieldDef, OptionSetter, OptionSetterBuilder};
pub use update::UpdateRule;
pub use value::{EnumKind, EnumValue, FieldShape, TimeVal, TimeValParseError, Value, ValueKind};

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
