//! Structural validation of a parsed configuration [`Value`] tree.
//!
//! The validator is pure - no I/O - and aggregates every defect it finds
//! instead of stopping at the first one, so `--validate` can report
//! everything wrong with a document in a single run.

use serde_json::Value;
use thiserror::Error;

use super::node::is_reserved;

/// A single structural defect found somewhere in a configuration tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defect {
	/// Dotted path to the node the defect was found in, empty for the root.
	pub path: String,
	/// Human-readable description of the defect.
	pub message: String,
}

impl std::fmt::Display for Defect {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.path.is_empty() {
			write!(f, "{}", self.message)
		} else {
			write!(f, "{}: {}", self.path, self.message)
		}
	}
}

/// The configuration failed validation. Carries every [`Defect`] found, not
/// just the first.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("configuration is invalid ({} defect(s)): {}", .0.len(), .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ValidationError(pub Vec<Defect>);

/// Validate a parsed configuration tree, returning every defect found.
///
/// Note: because the underlying YAML parser silently collapses duplicate
/// sibling keys before this function ever sees the tree, duplicate-key
/// defects can't be detected here - see the "Open question" in the crate's
/// design notes.
///
/// # Errors
/// Returns [`ValidationError`] (carrying every defect found) if the tree is
/// not well-formed.
pub fn validate(root: &Value) -> Result<(), ValidationError> {
	let mut defects = Vec::new();
	validate_node(root, "", &mut defects);

	if defects.is_empty() {
		Ok(())
	} else {
		Err(ValidationError(defects))
	}
}

fn validate_node(value: &Value, path: &str, defects: &mut Vec<Defect>) {
	let Some(map) = value.as_object() else {
		defects.push(Defect {
			path: path.to_string(),
			message: format!("expected a mapping, found {}", type_name(value)),
		});
		return;
	};

	for (key, val) in map {
		if is_reserved(key) {
			validate_reserved(key, val, path, defects);
		} else if val.is_string() {
			defects.push(Defect {
				path: path.to_string(),
				message: format!("unexpected string value under key '{key}'"),
			});
		} else {
			let child_path = if path.is_empty() {
				key.clone()
			} else {
				format!("{path}.{key}")
			};
			validate_node(val, &child_path, defects);
		}
	}
}

/// Type-check a single reserved key's value. `key` must be one `is_reserved`
/// accepts - both this function and the engine's own dispatch consult the
/// same [`super::node::RESERVED_KEYS`] table, so a key added there without a
/// matching arm here panics immediately instead of silently validating (or
/// failing to validate) the new key the wrong way.
fn validate_reserved(key: &str, val: &Value, path: &str, defects: &mut Vec<Defect>) {
	match key {
		"expand" => {
			if !(val.is_string() || val.is_number()) {
				defects.push(Defect {
					path: path.to_string(),
					message: format!(
						"expected string or number value for 'expand' key, got {}",
						type_name(val)
					),
				});
			}
		}
		"query" => {
			if !val.is_string() {
				defects.push(Defect {
					path: path.to_string(),
					message: format!("expected string value for 'query' key, got {}", type_name(val)),
				});
			}
		}
		"schema" => {
			if !val.is_string() {
				defects.push(Defect {
					path: path.to_string(),
					message: format!("expected string value for 'schema' key, got {}", type_name(val)),
				});
			}
		}
		"port" => {
			if !val.is_number() {
				defects.push(Defect {
					path: path.to_string(),
					message: format!("expected number value for 'port' key, got {}", type_name(val)),
				});
			}
		}
		"ssl_off" => {
			if !val.is_boolean() {
				defects.push(Defect {
					path: path.to_string(),
					message: format!(
						"expected boolean value for 'ssl_off' key, got {}",
						type_name(val)
					),
				});
			}
		}
		"*" => {
			// The wildcard marker names a subtree, not a typed leaf attribute:
			// it gets the same "string is unexpected, otherwise recurse"
			// treatment as an ordinary child key.
			if val.is_string() {
				defects.push(Defect {
					path: path.to_string(),
					message: format!("unexpected string value under key '{key}'"),
				});
			} else {
				let child_path = if path.is_empty() {
					key.to_string()
				} else {
					format!("{path}.{key}")
				};
				validate_node(val, &child_path, defects);
			}
		}
		other => unreachable!("RESERVED_KEYS grew a key ('{other}') with no validation arm"),
	}
}

fn type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "mapping",
	}
}
