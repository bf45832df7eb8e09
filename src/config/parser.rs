//! Turns a YAML source document into the dynamically-typed [`Value`] tree
//! that the [validator][super::validator] and [`Node::build`][super::Node::build]
//! consume.
//!
//! Internally the tree is treated as equivalent to a decoded JSON object:
//! parsing goes straight from YAML text to [`serde_json::Value`], the same
//! type `/varz` later serializes back out.

use std::{fmt, io, path::Path};

use serde_json::Value;
use thiserror::Error;

/// An error encountered while loading a configuration document.
#[derive(Debug, Error)]
pub enum ParseError {
	/// The configuration file does not exist.
	#[error("configuration file \"{path}\" not found")]
	Missing {
		/// The path that was read.
		path: DisplayPath,
	},
	/// The configuration file exists but could not be read (permissions,
	/// I/O error, etc).
	#[error("failed to read configuration file \"{path}\"")]
	Io {
		/// The path that was read.
		path: DisplayPath,
		/// The underlying I/O error.
		#[source]
		source: io::Error,
	},
	/// The configuration file is empty.
	#[error("configuration file \"{path}\" is empty")]
	Empty {
		/// The path that was read.
		path: DisplayPath,
	},
	/// The configuration file's contents are not well-formed YAML.
	#[error("configuration file \"{path}\" contains malformed YAML")]
	Yaml {
		/// The path that was read.
		path: DisplayPath,
		/// The underlying deserializer error.
		#[source]
		source: serde_yaml::Error,
	},
	/// The document parsed, but its root is not a mapping (e.g. it's a bare
	/// scalar or a list), so it can't be a configuration tree.
	#[error("configuration file \"{path}\" does not contain a mapping at its root")]
	Structure {
		/// The path that was read.
		path: DisplayPath,
	},
}

/// A path that's only used for display in error messages, so that
/// [`ParseError`] doesn't need a lifetime parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPath(String);

impl fmt::Display for DisplayPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl<P: AsRef<Path>> From<P> for DisplayPath {
	fn from(path: P) -> Self {
		Self(path.as_ref().to_string_lossy().into_owned())
	}
}

/// Load and parse the configuration document at `path`.
///
/// # Errors
/// Returns an error if the file is missing, unreadable, empty, not
/// well-formed YAML, or does not decode to a mapping at its root.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Value, ParseError> {
	let path = path.as_ref();

	let contents = std::fs::read_to_string(path).map_err(|source| {
		if source.kind() == io::ErrorKind::NotFound {
			ParseError::Missing { path: path.into() }
		} else {
			ParseError::Io {
				path: path.into(),
				source,
			}
		}
	})?;

	parse_str(&contents).map_err(|err| match err {
		ParseError::Empty { .. } => ParseError::Empty { path: path.into() },
		ParseError::Yaml { source, .. } => ParseError::Yaml {
			path: path.into(),
			source,
		},
		ParseError::Structure { .. } => ParseError::Structure { path: path.into() },
		other => other,
	})
}

/// Parse a configuration document already in memory. Used directly by unit
/// tests, and internally by [`parse_file`] after reading the file from disk;
/// errors produced here carry a placeholder path, which [`parse_file`]
/// rewrites to the real one.
///
/// # Errors
/// Returns an error if `input` is empty, not well-formed YAML, or does not
/// decode to a mapping at its root.
pub fn parse_str(input: &str) -> Result<Value, ParseError> {
	if input.trim().is_empty() {
		return Err(ParseError::Empty {
			path: "<string>".into(),
		});
	}

	let value: Value = serde_yaml::from_str(input).map_err(|source| ParseError::Yaml {
		path: "<string>".into(),
		source,
	})?;

	if !value.is_object() {
		return Err(ParseError::Structure {
			path: "<string>".into(),
		});
	}

	Ok(value)
}
