//! The merge engine: partial overlay of a mapping onto a struct node, and the
//! deferred required-field pass.
//!
//! An overlay only touches the keys it mentions. Fields missing from the source
//! keep whatever value they already had, so layers compose: compiled defaults,
//! then a file, then CLI flags. Required fields are checked separately by
//! [`check_required`], after all layers had a chance to fill them.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ConfigError;
use crate::node::{Node, StructNode};
use crate::overrides::join;

/// How strictly incoming keys are matched against the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Reject keys that do not name a field. When `false`, they are skipped
    /// and logged.
    pub strict: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self { strict: true }
    }
}

/// Overlay `source` onto `target`, assigning each mentioned field in turn.
///
/// `path` is the dotted path of `target` (empty for the root) and prefixes every
/// error. Stops at the first error; callers that need all-or-nothing semantics
/// overlay onto a copy.
pub(crate) fn overlay(
    target: &mut StructNode,
    source: &Map<String, Value>,
    path: &str,
    options: MergeOptions,
) -> Result<(), ConfigError> {
    for (key, raw) in source {
        let child_path = join(path, key);
        match target.child_mut(key) {
            Some((field, node)) => node.assign(field, raw, &child_path, options)?,
            None if options.strict => {
                return Err(ConfigError::UnknownField {
                    path: child_path,
                    key: key.clone(),
                });
            }
            None => {
                debug!(
                    event = "structfig.merge.unknown_field_skipped",
                    path = %child_path,
                    schema = target.schema().name()
                );
            }
        }
    }
    target.touched = true;
    Ok(())
}

/// Confirm every required field under `node` holds a value.
///
/// Optional structs that were never assigned into are skipped as a whole.
pub(crate) fn check_required(node: &StructNode, path: &str) -> Result<(), ConfigError> {
    for (field, child) in node.entries() {
        let child_path = join(path, field.name());
        match child {
            Node::Struct(inner) => {
                if !field.is_optional() || inner.touched {
                    check_required(inner, &child_path)?;
                }
            }
            leaf => {
                if leaf.is_absent() && field.is_required() {
                    return Err(ConfigError::MissingRequiredField(child_path));
                }
            }
        }
    }
    Ok(())
}

/// Run the required-field pass on the subtree at a dotted `path` only.
pub(crate) fn check_required_at(root: &StructNode, path: &str) -> Result<(), ConfigError> {
    let Some((field, node)) = root.lookup(path) else {
        return Ok(());
    };
    match node {
        Node::Struct(inner) => check_required(inner, path),
        leaf if leaf.is_absent() && field.is_required() => {
            Err(ConfigError::MissingRequiredField(path.to_string()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{required_schema, training_schema};
    use crate::project::project;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            other => panic!("Expected object, got {other:?}"),
        }
    }

    #[test]
    fn overlay_is_partial() {
        let schema = training_schema();
        let mut node = StructNode::new(&schema);
        overlay(
            &mut node,
            &map(json!({"learning_rate": 0.01, "training_dataset": {"paths": ["/a", "/b"]}})),
            "",
            MergeOptions::default(),
        )
        .unwrap();
        assert_eq!(
            project(&node),
            json!({
                "learning_rate": 0.01,
                "epochs": null,
                "verbose": false,
                "training_dataset": {"paths": ["/a", "/b"], "batch_size": 64}
            })
        );
    }

    #[test]
    fn overlay_never_resets_unmentioned_fields() {
        let schema = training_schema();
        let mut node = StructNode::new(&schema);
        let opts = MergeOptions::default();
        overlay(&mut node, &map(json!({"epochs": 3})), "", opts).unwrap();
        overlay(&mut node, &map(json!({"learning_rate": 0.5})), "", opts).unwrap();
        let projected = project(&node);
        assert_eq!(projected["epochs"], json!(3));
        assert_eq!(projected["learning_rate"], json!(0.5));
    }

    #[test]
    fn unknown_key_is_rejected_with_its_path() {
        let schema = training_schema();
        let mut node = StructNode::new(&schema);
        let err = overlay(&mut node, &map(json!({"bogus": 1})), "", MergeOptions::default())
            .unwrap_err();
        match err {
            ConfigError::UnknownField { path, key } => {
                assert_eq!(path, "bogus");
                assert_eq!(key, "bogus");
            }
            other => panic!("Expected UnknownField, got {other:?}"),
        }
    }

    #[test]
    fn nested_unknown_key_uses_dotted_path() {
        let schema = training_schema();
        let mut node = StructNode::new(&schema);
        let err = overlay(
            &mut node,
            &map(json!({"training_dataset": {"shuffle": true}})),
            "",
            MergeOptions::default(),
        )
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::UnknownField { ref path, .. } if path == "training_dataset.shuffle")
        );
    }

    #[test]
    fn lenient_skips_unknown_keys() {
        let schema = training_schema();
        let mut node = StructNode::new(&schema);
        overlay(
            &mut node,
            &map(json!({"bogus": 1, "epochs": 2})),
            "",
            MergeOptions { strict: false },
        )
        .unwrap();
        assert_eq!(project(&node)["epochs"], json!(2));
    }

    #[test]
    fn type_mismatch_reports_expected_type() {
        let schema = training_schema();
        let mut node = StructNode::new(&schema);
        let err = overlay(
            &mut node,
            &map(json!({"training_dataset": {"batch_size": "not-a-number"}})),
            "",
            MergeOptions::default(),
        )
        .unwrap_err();
        match err {
            ConfigError::TypeMismatch { path, expected, .. } => {
                assert_eq!(path, "training_dataset.batch_size");
                assert_eq!(expected, "int");
            }
            other => panic!("Expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn struct_field_requires_mapping() {
        let schema = training_schema();
        let mut node = StructNode::new(&schema);
        let err = overlay(
            &mut node,
            &map(json!({"training_dataset": 5})),
            "",
            MergeOptions::default(),
        )
        .unwrap_err();
        match err {
            ConfigError::TypeMismatch { expected, .. } => {
                assert_eq!(expected, "struct Dataset");
            }
            other => panic!("Expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn overlay_is_idempotent() {
        let schema = training_schema();
        let source = map(json!({"epochs": 4, "training_dataset": {"paths": ["/x"]}}));
        let mut once = StructNode::new(&schema);
        overlay(&mut once, &source, "", MergeOptions::default()).unwrap();
        let mut twice = once.clone();
        overlay(&mut twice, &source, "", MergeOptions::default()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_required_field_detected() {
        let schema = required_schema();
        let mut node = StructNode::new(&schema);
        overlay(&mut node, &Map::new(), "", MergeOptions::default()).unwrap();
        let err = check_required(&node, "").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequiredField(p) if p == "epochs"));
    }

    #[test]
    fn missing_nested_required_field_detected() {
        let schema = training_schema();
        let node = StructNode::new(&schema);
        let err = check_required(&node, "").unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingRequiredField(p) if p == "training_dataset.paths")
        );
    }

    #[test]
    fn untouched_optional_struct_is_exempt() {
        let schema = required_schema();
        let mut node = StructNode::new(&schema);
        overlay(&mut node, &map(json!({"epochs": 1})), "", MergeOptions::default()).unwrap();
        check_required(&node, "").unwrap();

        overlay(
            &mut node,
            &map(json!({"checkpoint": {"every": 5}})),
            "",
            MergeOptions::default(),
        )
        .unwrap();
        let err = check_required(&node, "").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequiredField(p) if p == "checkpoint.dir"));
    }

    #[test]
    fn check_required_at_scopes_to_subtree() {
        let schema = required_schema();
        let node = StructNode::new(&schema);
        // `epochs` is missing at the root, but the optional subtree is fine.
        check_required_at(&node, "checkpoint.every").unwrap();
        let err = check_required_at(&node, "epochs").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequiredField(p) if p == "epochs"));
    }
}
