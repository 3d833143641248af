//! Command-line surface derived from a schema, independent of any parser.
//!
//! [`build_flags`] walks a schema and emits one [`FlagSpec`] per leaf field,
//! named by its dotted path (`--training_dataset.batch_size`), after the two
//! reserved flags `--config` and `--print_config`. A parser backend registers
//! those specs, and hands back only the flags the user actually passed as
//! `(name, RawArg)` pairs. [`apply_supplied`] layers them onto a config:
//! compiled defaults < `--config` file < flags.
//!
//! Values stay raw strings until they reach the merge engine, so type errors
//! from the command line carry the same dotted path and expected type as any
//! other assignment.

use std::path::PathBuf;

use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::ConfigError;
use crate::field::{DefaultValue, Kind};
use crate::file;
use crate::overrides::join;
use crate::project::format_value;
use crate::resolve::{ResolveInput, resolve};
use crate::schema::Schema;
use crate::types::ValueType;

/// Loads a config file before any other flag is applied.
pub const CONFIG_FLAG: &str = "config";
/// Print the resolved configuration after parsing.
pub const PRINT_CONFIG_FLAG: &str = "print_config";
/// Taken by the parser backend for usage output.
pub const HELP_FLAG: &str = "help";

const RESERVED_FLAGS: [&str; 3] = [CONFIG_FLAG, PRINT_CONFIG_FLAG, HELP_FLAG];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one value.
    One,
    /// One or more values (array fields).
    OneOrMore,
    /// No value; presence is the signal.
    Switch,
}

/// One flag to register with a parser backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    /// Dotted field path, or a reserved name. The long flag is `--{name}`.
    pub name: String,
    pub arity: Arity,
    /// Scalar or element type; informational, values are coerced on merge.
    pub ty: ValueType,
    pub help: String,
    /// The field has no default and is not optional. Not enforced by the
    /// backend, since a `--config` file may supply the value.
    pub required: bool,
}

impl FlagSpec {
    pub fn is_reserved(&self) -> bool {
        RESERVED_FLAGS.contains(&self.name.as_str())
    }
}

/// A value the parser backend saw on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawArg {
    Value(String),
    Values(Vec<String>),
    Present,
}

impl RawArg {
    fn describe(&self) -> String {
        match self {
            RawArg::Value(s) => format!("{s:?}"),
            RawArg::Values(items) => format!("{} values", items.len()),
            RawArg::Present => "no value".to_string(),
        }
    }

    fn into_value(self) -> Value {
        match self {
            RawArg::Value(s) => Value::String(s),
            RawArg::Values(items) => Value::Array(items.into_iter().map(Value::String).collect()),
            RawArg::Present => Value::Bool(true),
        }
    }
}

/// What the caller still has to act on after the flags were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CliOutcome {
    pub print_config: bool,
}

/// Derive the flag set for a schema, reserved flags first, then fields in
/// declaration order.
///
/// Fails with a schema error if a top-level leaf would shadow a reserved flag
/// (`config`, `print_config` or `help`).
pub fn build_flags(schema: &Schema) -> Result<Vec<FlagSpec>, ConfigError> {
    let mut flags = vec![
        FlagSpec {
            name: CONFIG_FLAG.to_string(),
            arity: Arity::One,
            ty: ValueType::String,
            help: "Configuration file (.json, .yaml, .yml or .toml).".to_string(),
            required: false,
        },
        FlagSpec {
            name: PRINT_CONFIG_FLAG.to_string(),
            arity: Arity::Switch,
            ty: ValueType::Bool,
            help: "Print the configuration.".to_string(),
            required: false,
        },
    ];
    collect(schema, "", &mut flags)?;
    Ok(flags)
}

fn collect(schema: &Schema, prefix: &str, out: &mut Vec<FlagSpec>) -> Result<(), ConfigError> {
    for field in schema.fields() {
        let name = join(prefix, field.name());
        let (arity, ty) = match field.kind() {
            Kind::Struct(nested) => {
                collect(nested, &name, out)?;
                continue;
            }
            Kind::Scalar(ty) => (Arity::One, *ty),
            Kind::Array(ty) => (Arity::OneOrMore, *ty),
        };
        if RESERVED_FLAGS.contains(&name.as_str()) {
            return Err(ConfigError::Schema(format!(
                "field '{name}' collides with the reserved --{name} flag"
            )));
        }

        let mut help = field.description().unwrap_or_default().to_string();
        if let Some(default) = field.default() {
            push_note(&mut help, &format!("(default: {})", render_default(default)));
        }
        if field.is_required() {
            push_note(&mut help, "[required]");
        }

        out.push(FlagSpec {
            name,
            arity,
            ty,
            help,
            required: field.is_required(),
        });
    }
    Ok(())
}

fn push_note(help: &mut String, note: &str) {
    if !help.is_empty() {
        help.push(' ');
    }
    help.push_str(note);
}

fn render_default(default: &DefaultValue) -> String {
    match default {
        DefaultValue::Scalar(s) => s.to_string(),
        DefaultValue::Array(_) => format_value(&default.to_value()),
    }
}

/// Apply the flags the user supplied.
///
/// `--config` is read first, then every other flag is overlaid as a dotted
/// override, then required fields are checked once. On error the config is
/// left untouched.
pub fn apply_supplied<I>(config: &mut Config, supplied: I) -> Result<CliOutcome, ConfigError>
where
    I: IntoIterator<Item = (String, RawArg)>,
{
    let mut outcome = CliOutcome::default();
    let mut input = ResolveInput::default();

    for (name, raw) in supplied {
        if name == PRINT_CONFIG_FLAG {
            outcome.print_config = true;
            continue;
        }
        if name == CONFIG_FLAG {
            let path = match raw {
                RawArg::Value(path) => PathBuf::from(path),
                other => {
                    return Err(ConfigError::TypeMismatch {
                        path: CONFIG_FLAG.to_string(),
                        expected: "a single file path".to_string(),
                        received: other.describe(),
                    });
                }
            };
            file::format_for(&path)?;
            let content = file::read(&path)?;
            debug!(event = "structfig.cli.config_file", path = %path.display());
            input.files.push((path, content));
            continue;
        }
        input.overrides.push((name, raw.into_value()));
    }

    debug!(
        event = "structfig.cli.overrides_applied",
        files = input.files.len(),
        overrides = input.overrides.len()
    );
    resolve(config, input)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::training_schema;
    use crate::field::Field;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn names(flags: &[FlagSpec]) -> Vec<&str> {
        flags.iter().map(|f| f.name.as_str()).collect()
    }

    fn arg(name: &str, raw: RawArg) -> (String, RawArg) {
        (name.to_string(), raw)
    }

    #[test]
    fn flags_follow_declaration_order() {
        let flags = build_flags(&training_schema()).unwrap();
        assert_eq!(
            names(&flags),
            vec![
                "config",
                "print_config",
                "learning_rate",
                "epochs",
                "verbose",
                "training_dataset.paths",
                "training_dataset.batch_size"
            ]
        );
    }

    #[test]
    fn nested_flag_uses_dotted_name() {
        let flags = build_flags(&training_schema()).unwrap();
        let batch = flags
            .iter()
            .find(|f| f.name == "training_dataset.batch_size")
            .unwrap();
        assert_eq!(batch.arity, Arity::One);
        assert_eq!(batch.ty, ValueType::Int);
        assert_eq!(batch.help, "Samples per batch. (default: 64)");
        assert!(!batch.required);
    }

    #[test]
    fn array_flag_takes_many_and_marks_required() {
        let flags = build_flags(&training_schema()).unwrap();
        let paths = flags
            .iter()
            .find(|f| f.name == "training_dataset.paths")
            .unwrap();
        assert_eq!(paths.arity, Arity::OneOrMore);
        assert_eq!(paths.ty, ValueType::String);
        assert!(paths.required);
        assert!(paths.help.ends_with("[required]"));
    }

    #[test]
    fn reserved_flags_come_first() {
        let flags = build_flags(&training_schema()).unwrap();
        assert!(flags[0].is_reserved());
        assert_eq!(flags[1].arity, Arity::Switch);
        assert!(!flags[2].is_reserved());
    }

    #[test]
    fn reserved_name_collision_fails() {
        let schema = Schema::builder("S")
            .field(Field::string("config"))
            .build()
            .unwrap();
        let err = build_flags(&schema).unwrap_err();
        assert!(matches!(err, ConfigError::Schema(msg) if msg.contains("--config")));
    }

    #[test]
    fn help_is_reserved() {
        let schema = Schema::builder("S")
            .field(Field::string("help").default("x"))
            .build()
            .unwrap();
        let err = build_flags(&schema).unwrap_err();
        assert!(matches!(err, ConfigError::Schema(msg) if msg.contains("--help")));
    }

    #[test]
    fn config_flag_needs_one_path() {
        let mut config = training_schema().instantiate();
        let err = apply_supplied(
            &mut config,
            vec![arg("config", RawArg::Values(vec!["a.json".into(), "b.json".into()]))],
        )
        .unwrap_err();
        match err {
            ConfigError::TypeMismatch { path, expected, received } => {
                assert_eq!(path, "config");
                assert_eq!(expected, "a single file path");
                assert_eq!(received, "2 values");
            }
            other => panic!("Expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn nested_reserved_name_is_fine() {
        let inner = Schema::builder("Inner")
            .field(Field::string("config").optional())
            .build()
            .unwrap();
        let schema = Schema::builder("S")
            .field(Field::nested("model", &inner))
            .build()
            .unwrap();
        let flags = build_flags(&schema).unwrap();
        assert!(names(&flags).contains(&"model.config"));
    }

    #[test]
    fn supplied_flags_overlay_defaults() {
        let mut config = training_schema().instantiate();
        let outcome = apply_supplied(
            &mut config,
            vec![
                arg("training_dataset.paths", RawArg::Values(vec!["/a".into(), "/b".into()])),
                arg("epochs", RawArg::Value("7".into())),
            ],
        )
        .unwrap();
        assert!(!outcome.print_config);
        assert_eq!(config.int("epochs").unwrap(), Some(7));
        assert_eq!(config.get("training_dataset.paths").unwrap(), json!(["/a", "/b"]));
        assert_eq!(config.float("learning_rate").unwrap(), Some(0.001));
    }

    #[test]
    fn flags_win_over_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("train.yaml");
        fs::write(
            &path,
            "learning_rate: 0.1\nepochs: 3\ntraining_dataset:\n  paths: [/f]\n",
        )
        .unwrap();

        let mut config = training_schema().instantiate();
        // Flag order on the command line does not matter: the file goes first.
        apply_supplied(
            &mut config,
            vec![
                arg("learning_rate", RawArg::Value("0.5".into())),
                arg("config", RawArg::Value(path.to_string_lossy().into_owned())),
            ],
        )
        .unwrap();
        assert_eq!(config.float("learning_rate").unwrap(), Some(0.5));
        assert_eq!(config.int("epochs").unwrap(), Some(3));
        assert_eq!(config.get("training_dataset.paths").unwrap(), json!(["/f"]));
    }

    #[test]
    fn print_config_is_reported() {
        let mut config = training_schema().instantiate();
        let outcome = apply_supplied(
            &mut config,
            vec![
                arg("print_config", RawArg::Present),
                arg("training_dataset.paths", RawArg::Values(vec!["/a".into()])),
            ],
        )
        .unwrap();
        assert!(outcome.print_config);
    }

    #[test]
    fn bad_flag_value_reports_path_and_type() {
        let mut config = training_schema().instantiate();
        let err = apply_supplied(
            &mut config,
            vec![arg("training_dataset.batch_size", RawArg::Value("big".into()))],
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("training_dataset.batch_size"));
        assert!(msg.contains("expected int"));
    }

    #[test]
    fn missing_required_after_flags() {
        let mut config = training_schema().instantiate();
        let err = apply_supplied(&mut config, vec![arg("epochs", RawArg::Value("1".into()))])
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequiredField(p) if p == "training_dataset.paths"));
        assert_eq!(config.int("epochs").unwrap(), None);
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.json");
        let mut config = training_schema().instantiate();
        let err = apply_supplied(
            &mut config,
            vec![arg("config", RawArg::Value(path.to_string_lossy().into_owned()))],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }
}
