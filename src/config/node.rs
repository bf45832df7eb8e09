//! The typed tree the [expansion engine][crate::engine] walks.
//!
//! A [`Node`] is built from the dynamically-typed [`serde_json::Value`] tree
//! produced by the parser, once that tree has passed [validation][super::validator].
//! Building a `Node` does not re-validate anything: it trusts that the
//! `Value` it's given already has the right shapes in the right places.

use std::collections::HashMap;

use serde_json::Value;

/// Keys that control engine behaviour rather than naming a child node to
/// match against a path token. Both the [validator][super::validator] and the
/// [engine][crate::engine] consult this table, so that adding a new reserved
/// key only needs to happen in one place.
pub const RESERVED_KEYS: &[&str] = &["expand", "query", "port", "schema", "ssl_off", "*"];

/// Whether `key` is a reserved key rather than a matchable path segment.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
	RESERVED_KEYS.contains(&key)
}

/// The action a matched node prescribes, in the priority order the engine
/// consults them: `expand`, then `query`, then `port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
	/// Emit the literal, possibly preceded by a separating slash.
	Expand(String),
	/// Emit the literal, possibly preceded by a separating slash, and
	/// suppress the slash before the next emission.
	Query(String),
	/// Emit `:<port>`, never preceded by a slash.
	Port(i64),
}

/// A node in the configuration tree.
///
/// A node is always a mapping of child keys to child nodes; additionally it
/// may carry at most one [`Action`] (consulted in priority order if more than
/// one of `expand`/`query`/`port` was present in the source), and, if it's a
/// host node, `ssl_off`/`schema`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
	/// Named children, keyed by path segment. Never contains the reserved
	/// action keys; may contain `*` (the wildcard passthrough child).
	pub children: HashMap<String, Node>,
	/// This node's action, if any. `None` means a request path that matches
	/// this node by name has nowhere to go - a configuration error the
	/// engine surfaces at request time rather than at load time.
	pub action: Option<Action>,
	/// Host-level: use `http` instead of `https`. Meaningless on non-host
	/// nodes.
	pub ssl_off: bool,
	/// Host-level: use this URI scheme and skip the host token when
	/// expanding. Meaningless on non-host nodes.
	pub schema: Option<String>,
}

impl Node {
	/// The wildcard passthrough child (`*`), if this node has one.
	#[must_use]
	pub fn wildcard(&self) -> Option<&Node> {
		self.children.get("*")
	}

	/// Build a `Node` tree from an already-validated [`Value`].
	///
	/// Never panics. Callers must still validate first: this function trusts
	/// the shapes [`validate`][super::validator::validate] checks for and
	/// doesn't re-check them, so a value that skipped validation is rendered
	/// rather than rejected - e.g. a non-string, non-number `expand` falls
	/// through to an empty string (see [`render_expand`]) instead of being
	/// caught here.
	#[must_use]
	pub fn build(value: &Value) -> Node {
		let Value::Object(map) = value else {
			return Node::default();
		};

		let mut node = Node::default();
		let mut expand = None;
		let mut query = None;
		let mut port = None;

		for (key, val) in map {
			match key.as_str() {
				"expand" => expand = Some(render_expand(val)),
				"query" => query = val.as_str().map(ToString::to_string),
				"port" => port = parse_port(val),
				"ssl_off" => node.ssl_off = val.as_bool().unwrap_or(false),
				"schema" => node.schema = val.as_str().map(ToString::to_string),
				_ => {
					node.children.insert(key.clone(), Node::build(val));
				}
			}
		}

		node.action = expand
			.map(Action::Expand)
			.or_else(|| query.map(Action::Query))
			.or_else(|| port.map(Action::Port));

		node
	}
}

/// Parse a `port` value into the integer the engine renders. Tries the
/// integer fast path first; falls back to rounding a float-backed number
/// (e.g. `8080.0`) so that any number the validator accepts also renders,
/// rather than silently dropping the node's action.
fn parse_port(value: &Value) -> Option<i64> {
	value
		.as_i64()
		.or_else(|| value.as_u64().and_then(|n| i64::try_from(n).ok()))
		.or_else(|| value.as_f64().map(|f| f.round() as i64))
}

/// Render an `expand` value the way the engine emits it: strings verbatim,
/// numbers as integers without fractional digits.
fn render_expand(value: &Value) -> String {
	match value {
		Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
		Value::Number(n) => format!("{:.0}", n.as_f64().unwrap_or(0.0)),
		other => other.as_str().unwrap_or_default().to_string(),
	}
}
