//! Configuration tree handling.
//!
//! A zapper config document describes a tree of shortcut hosts. Each node in
//! the tree is either a branch (a mapping of further keys to child nodes) or
//! carries leaf attributes alongside its children:
//!
//! - `expand` - literal string or number to emit when this node is matched.
//! - `query` - literal string to emit; suppresses the separating slash before
//!   the next emitted token.
//! - `port` - numeric port to emit as `:<port>`, never preceded by a slash.
//! - `ssl_off` - (host nodes only) use `http` instead of `https`.
//! - `schema` - (host nodes only) use a custom URI scheme and skip the host
//!   token during expansion.
//!
//! See [`node`] for the tree representation, [`parser`] for turning a YAML
//! document into a tree, and [`validator`] for checking a tree is
//! well-formed before it's allowed to go live. [`load`] composes all three
//! into the one entry point the rest of the crate uses.

mod node;
mod parser;
mod validator;

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

pub use self::{
	node::{is_reserved, Action, Node, RESERVED_KEYS},
	parser::{parse_file, parse_str, ParseError},
	validator::{validate, Defect, ValidationError},
};

/// A fully loaded, validated configuration tree: the typed [`Node`] the
/// engine walks, alongside the raw [`Value`] it was built from (kept around
/// for `/varz`, which echoes the source document back as JSON).
#[derive(Debug, Clone)]
pub struct ConfigTree {
	/// The typed tree the expansion engine walks.
	pub root: Node,
	/// The raw parsed document, used verbatim for `/varz`.
	pub raw: Value,
}

/// Either stage of loading a configuration document can fail; this error
/// composes both into the one type [`load`] returns.
#[derive(Debug, Error)]
pub enum LoadError {
	/// The document could not be parsed.
	#[error(transparent)]
	Parse(#[from] ParseError),
	/// The document parsed but failed validation.
	#[error(transparent)]
	Validation(#[from] ValidationError),
}

/// Load, parse, and validate the configuration document at `path`, producing
/// a ready-to-serve [`ConfigTree`].
///
/// # Errors
/// Returns an error if the document can't be read or parsed, or if it fails
/// validation.
pub fn load(path: impl AsRef<Path>) -> Result<ConfigTree, LoadError> {
	let raw = parse_file(path)?;
	validate(&raw)?;
	let root = Node::build(&raw);

	Ok(ConfigTree { root, raw })
}
