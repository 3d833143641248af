//! Schema-driven, layered configuration for Rust applications. Declare a
//! schema, load a file, override from the command line, and go.
//!
//! Structfig validates and coerces configuration against a typed,
//! hierarchical schema built at runtime. The same schema drives loading from
//! JSON, YAML or TOML files, programmatic `get`/`set`, serialization back to
//! disk, and a generated command-line surface with one dotted flag per field.
//!
//! ```ignore
//! let dataset = Schema::builder("Dataset")
//!     .field(Field::array("paths", ValueType::String))
//!     .field(Field::int("batch_size").default(64))
//!     .build()?;
//! let schema = Schema::builder("Training")
//!     .field(Field::float("learning_rate").default(0.001))
//!     .field(Field::int("epochs").optional())
//!     .field(Field::nested("training_dataset", &dataset))
//!     .build()?;
//!
//! let mut config = schema.instantiate();
//! CliParser::new(&schema)?.parse(&mut config)?;
//! let batch = config.int("training_dataset.batch_size")?;
//! ```
//!
//! # Design: schema and instance are separate
//!
//! A [`Schema`] is the *declaration*: an ordered list of [`Field`]
//! descriptors, validated once by [`SchemaBuilder::build`] and shared behind
//! an `Arc`. A [`Config`] is an *instance*: a tree of live values bound to a
//! schema. Many configs can share one schema, and a schema can nest inside
//! another through [`Field::nested`].
//!
//! Field descriptors carry everything the rest of the crate needs:
//!
//! - **kind**: a scalar (`int`, `float`, `bool`, `string`), an array of one
//!   scalar type, or a nested struct.
//! - **default**: checked against the field's type when the schema is built,
//!   so a bad default fails at startup, not at load time.
//! - **optional**: an optional field without a default starts absent, and
//!   omitting it everywhere is valid. A field that is neither optional nor
//!   defaulted is *required*: some layer must supply it.
//! - **description**: becomes the CLI help text.
//!
//! # Coercion
//!
//! Every assignment, whatever its source, is coerced to the declared type:
//!
//! | Declared | Accepts |
//! |----------|---------|
//! | `bool`   | `true`/`false`, and the strings `"true"`/`"false"` in any case |
//! | `int`    | integers, whole floats, numeric strings; never with precision loss |
//! | `float`  | any finite number, numeric strings |
//! | `string` | strings, plus numbers and bools via their text form |
//!
//! Arrays coerce element by element and are all-or-nothing: the first bad
//! element aborts the assignment and is reported as `path[i]`. Assigning
//! null resets a field to its default, or to absent when it is optional.
//!
//! # Layer precedence
//!
//! ```text
//! Compiled defaults     Field::int("epochs").default(10)
//!        ↑ overridden by
//! Config file           --config train.yaml, Config::read_file
//!        ↑ overridden by
//! CLI flags             --epochs 20
//! ```
//!
//! Every layer is **sparse**. A merge only touches the keys it mentions;
//! everything else keeps its current value. Required fields are checked once
//! all layers are in, so a required value can come from any of them.
//!
//! # Atomic updates
//!
//! Operations on a [`Config`] either apply completely or not at all. A type
//! error halfway through a file leaves the config exactly as it was before
//! the call.
//!
//! # Strict mode
//!
//! Strict mode is **on by default**: a key that does not name a field fails
//! with [`ConfigError::UnknownField`] and its dotted path. Turn it off with
//! [`Config::strict(false)`](Config::strict) to skip (and log) unknown keys
//! instead.
//!
//! # File formats
//!
//! [`Format`] picks JSON, YAML or TOML from the file extension. Written files
//! contain every field in declaration order, so reading a written file back
//! reproduces the same config. TOML has no null, so absent values are left
//! out of TOML output.
//!
//! # Core library: no CLI framework required
//!
//! The [`flags`] module derives the command-line surface as plain
//! [`FlagSpec`] values and applies supplied `(name, RawArg)` pairs, so any
//! argument parser can drive it. The `cli` module (behind the `clap` Cargo
//! feature, on by default) wires that surface to clap as [`CliParser`]. To
//! use structfig without clap:
//!
//! ```toml
//! structfig = { version = "...", default-features = false }
//! ```
//!
//! # Logging
//!
//! Structfig emits [`tracing`] events (file loads, skipped unknown keys,
//! overwritten files) and never installs a subscriber itself.
//!
//! # Error handling
//!
//! All fallible operations return [`ConfigError`]. Validation errors carry
//! the dotted path of the offending field; see [`ConfigError::path`].

pub mod error;
pub mod flags;
pub mod format;
pub mod types;

#[cfg(feature = "clap")]
mod cli;
mod config;
mod field;
mod file;
pub(crate) mod merge;
mod node;
mod overrides;
mod project;
mod resolve;
mod schema;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "clap")]
pub use cli::CliParser;
pub use config::Config;
pub use error::ConfigError;
pub use field::{DefaultValue, Field, FieldSpec, Kind};
pub use flags::{Arity, CliOutcome, FlagSpec, RawArg};
pub use format::{Format, FormatError};
pub use merge::MergeOptions;
pub use overrides::overrides_to_map;
pub use resolve::{ResolveInput, resolve};
pub use schema::{Schema, SchemaBuilder};
pub use types::{Scalar, ValueType};
