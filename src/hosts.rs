//! `/etc/hosts` synchronization.
//!
//! Writes a delimited block of `<advertise> <host>` lines into the system
//! hosts file, one per configured shortcut host, so that the short host names
//! resolve locally to this service. This is best-effort: failures here are
//! logged and never affect the redirect service itself.

use std::{io, net::IpAddr, path::Path};

use regex::Regex;
use thiserror::Error;

const SENTINEL_START: &str = "### Zap Shortcuts :start ##";
const SENTINEL_END: &str = "### Zap Shortcuts :end ##";

/// An error encountered while syncing the hosts file. Always non-fatal to
/// the caller: log it and move on.
#[derive(Debug, Error)]
pub enum HostsSyncError {
	/// The hosts file could not be read.
	#[error("failed to read hosts file \"{path}\"")]
	Read {
		/// The path that was read.
		path: String,
		/// The underlying I/O error.
		#[source]
		source: io::Error,
	},
	/// The hosts file could not be written back.
	#[error("failed to write hosts file \"{path}\"")]
	Write {
		/// The path that was written.
		path: String,
		/// The underlying I/O error.
		#[source]
		source: io::Error,
	},
}

/// Replace (or append) the sentinel-delimited block in the hosts file at
/// `path` with one line per host in `hosts`, each pointing at `advertise`.
///
/// If the sentinels aren't present in the file, the block is appended. If
/// they are, the region between and including them is replaced; content
/// outside the block, including content added by other tools, is preserved.
///
/// # Errors
/// Returns an error if the file can't be read or written. Callers should log
/// this and continue serving with the previous hosts file state - this sync
/// is best-effort.
pub fn sync(path: impl AsRef<Path>, advertise: IpAddr, hosts: &[String]) -> Result<(), HostsSyncError> {
	let path = path.as_ref();
	let path_str = path.to_string_lossy().into_owned();

	let existing = std::fs::read_to_string(path).map_err(|source| HostsSyncError::Read {
		path: path_str.clone(),
		source,
	})?;

	let block = build_block(advertise, hosts);
	let updated = splice(&existing, &block);

	std::fs::write(path, updated).map_err(|source| HostsSyncError::Write {
		path: path_str,
		source,
	})
}

fn build_block(advertise: IpAddr, hosts: &[String]) -> String {
	let mut block = format!("{SENTINEL_START}\n");
	for host in hosts {
		block += &format!("{advertise} {host}\n");
	}
	block += &format!("{SENTINEL_END}\n");
	block
}

fn splice(existing: &str, block: &str) -> String {
	if !existing.contains(SENTINEL_START) {
		let mut updated = existing.to_string();
		if !updated.is_empty() && !updated.ends_with('\n') {
			updated.push('\n');
		}
		updated.push_str(block);
		return updated;
	}

	let pattern = format!(
		r"(?s){}.*?{}\n?",
		regex::escape(SENTINEL_START),
		regex::escape(SENTINEL_END)
	);
	let re = Regex::new(&pattern).expect("sentinel replacement regex is valid");
	re.replace(existing, block.as_str()).into_owned()
}
