//! The path-expansion engine - the core of zapper.
//!
//! A deterministic tree walk: at each step it consumes one token from the
//! request path, consults the corresponding [`Node`] in the configuration
//! tree, and emits either an expansion, a verbatim wildcard passthrough, or
//! (once the tree runs out of matches) the untranslated tail of the request.
//!
//! This module has no knowledge of HTTP; it's a pure function from
//! `(tree, tokens)` to `String`, callable with arbitrary token slices, which
//! is what makes it exhaustively unit-testable without a running server.

use thiserror::Error;

use crate::config::{is_reserved, Action, Node};

/// An error encountered while walking the configuration tree.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExpandError {
	/// A path token matched a node by name, but that node carries none of
	/// `expand`/`query`/`port` - there's nothing to emit for it.
	#[error("configuration node matched by the request path has no expand/query/port action")]
	NoAction,
}

/// Walk `node` against `tokens` starting at `index`, appending the expansion
/// to `out`. `prepend_slash` controls whether the very next emission (if any)
/// is preceded by a `/` - the caller seeds this as `true` for a normal
/// request, matching the leading slash every request path has.
///
/// # Errors
/// Returns [`ExpandError::NoAction`] if the walk reaches a node matched by
/// name that has no action attribute.
pub fn expand(
	node: &Node,
	tokens: &[&str],
	index: usize,
	out: &mut String,
	prepend_slash: bool,
) -> Result<(), ExpandError> {
	let Some(&token) = tokens.get(index) else {
		return Ok(());
	};

	if !is_reserved(token) {
		if let Some(child) = node.children.get(token) {
			return match &child.action {
				Some(Action::Expand(literal)) => {
					if prepend_slash {
						out.push('/');
					}
					out.push_str(literal);
					expand(child, tokens, index + 1, out, true)
				}
				Some(Action::Query(literal)) => {
					if prepend_slash {
						out.push('/');
					}
					out.push_str(literal);
					expand(child, tokens, index + 1, out, false)
				}
				Some(Action::Port(port)) => {
					out.push(':');
					out.push_str(&port.to_string());
					expand(child, tokens, index + 1, out, true)
				}
				None => Err(ExpandError::NoAction),
			};
		}
	}

	if let Some(wildcard) = node.wildcard() {
		if prepend_slash {
			out.push('/');
		}
		out.push_str(token);
		return expand(wildcard, tokens, index + 1, out, true);
	}

	copy_tail(tokens, index, out, prepend_slash);
	Ok(())
}

/// No match and no wildcard: emit every remaining token verbatim, each
/// preceded by `/` except the first one, whose slash is gated by
/// `prepend_slash`.
fn copy_tail(tokens: &[&str], index: usize, out: &mut String, mut prepend_slash: bool) {
	for &token in &tokens[index..] {
		if prepend_slash {
			out.push('/');
		} else {
			prepend_slash = true;
		}
		out.push_str(token);
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::config::Node;

	fn tree() -> Node {
		Node::build(&json!({
			"e": {"expand": "example.com", "a": {"expand": "apples"}, "b": {"expand": "bananas"}},
			"g": {
				"expand": "github.com",
				"z": {"expand": "issmirnov/zap"},
				"s": {
					"query": "search?q=",
					"me": {"expand": "issmirnov", "z": {"expand": "zap"}},
					"ak": {"query": "apache/kafka", "c": {"query": "+connect"}},
				},
			},
			"z": {"expand": "zero.com", "ssl_off": true},
			"zz": {"expand": "zero.ssl.on.com", "ssl_off": false},
			"l": {"expand": "localhost", "ssl_off": true, "a": {"port": 8080, "s": {"expand": "service"}}},
			"wc": {"expand": "wildcard.com", "*": {"*": {"*": {"four": {"expand": "4"}}}}},
			"ch": {"schema": "chrome", "v": {"expand": "version"}, "n": {"expand": "net-internals", "d": {"expand": "#dns"}}},
		}))
	}

	fn run(node: &Node, tokens: &[&str]) -> String {
		let mut out = String::new();
		expand(node, tokens, 0, &mut out, true).unwrap();
		out
	}

	#[test]
	fn named_expand_chain() {
		assert_eq!(run(&tree(), &["g", "z"]), "/github.com/issmirnov/zap");
	}

	#[test]
	fn trailing_slash_falls_through_to_tail() {
		assert_eq!(run(&tree(), &["g", "z", ""]), "/github.com/issmirnov/zap/");
	}

	#[test]
	fn query_suppresses_next_slash_then_tail_copies() {
		assert_eq!(
			run(&tree(), &["g", "s", "foo", "bar"]),
			"/github.com/search?q=foo/bar"
		);
	}

	#[test]
	fn query_then_nested_named_match() {
		assert_eq!(
			run(&tree(), &["g", "s", "me", "z"]),
			"/github.com/search?q=issmirnov/zap"
		);
	}

	#[test]
	fn nested_query_glues_without_slash() {
		assert_eq!(
			run(&tree(), &["g", "s", "ak", "c"]),
			"/github.com/search?q=apache/kafka+connect"
		);
	}

	#[test]
	fn wildcard_passthrough_three_levels_deep() {
		assert_eq!(
			run(&tree(), &["wc", "1", "2", "3", "four"]),
			"/wildcard.com/1/2/3/4"
		);
	}

	#[test]
	fn port_has_no_leading_slash() {
		assert_eq!(run(&tree(), &["l", "a"]), "/localhost:8080");
	}

	#[test]
	fn port_then_expand_child_has_slash() {
		assert_eq!(run(&tree(), &["l", "a", "s"]), "/localhost:8080/service");
	}

	#[test]
	fn unknown_token_falls_through_whole_tail() {
		assert_eq!(run(&tree(), &["e", "c"]), "/example.com/c");
	}

	#[test]
	fn empty_token_sequence_emits_nothing() {
		let mut out = String::new();
		expand(&tree(), &[], 0, &mut out, true).unwrap();
		assert_eq!(out, "");
	}

	#[test]
	fn reserved_literal_segment_falls_through_rather_than_matching() {
		// A config node can't have a child literally named "expand", since
		// `Node::build` treats that key as the action, not a child - so a
		// request path containing "expand" as a literal segment always
		// falls through to the tail-copy branch.
		let node = Node::build(&json!({"g": {"expand": "x"}}));
		let mut out = String::new();
		expand(&node, &["g", "expand"], 0, &mut out, true).unwrap();
		assert_eq!(out, "/x/expand");
	}

	#[test]
	fn literal_star_segment_does_not_match_named_but_hits_wildcard() {
		// The node's own "*" key is both the reserved wildcard marker and
		// (coincidentally) the literal token below. Since "*" is reserved it
		// can never be a named match; it's instead fed to the wildcard
		// passthrough as an ordinary token and emitted verbatim.
		let node = Node::build(&json!({"*": {"four": {"expand": "4"}}}));
		let mut out = String::new();
		expand(&node, &["*"], 0, &mut out, true).unwrap();
		assert_eq!(out, "/*");
	}

	#[test]
	fn matched_node_without_action_is_an_error() {
		let node = Node::build(&json!({"g": {"sub": {"expand": "x"}}}));
		let mut out = String::new();
		let err = expand(&node, &["g"], 0, &mut out, true).unwrap_err();
		assert_eq!(err, ExpandError::NoAction);
	}

	#[test]
	fn schema_host_skips_host_token_before_recursing() {
		// Mirrors how the dispatcher invokes the engine for schema hosts:
		// starting at the host subtree with the host token already consumed.
		let t = tree();
		let ch = t.children.get("ch").unwrap();
		assert_eq!(run(ch, &["v"]), "/version");
		assert_eq!(run(ch, &["n", "d"]), "/net-internals/#dns");
	}

	#[test]
	fn unknown_path_under_schema_host_falls_through() {
		let t = tree();
		let ch = t.children.get("ch").unwrap();
		assert_eq!(run(ch, &["foobar"]), "/foobar");
	}
}
