//! Watches the configuration document for changes and atomically swaps in a
//! freshly parsed and validated tree when it changes.
//!
//! Grounded in the same shape as this crate's TLS certificate watcher used
//! to be: a background thread draining an `mpsc` channel fed by a `notify`
//! watcher, storing the live value behind an [`ArcSwap`] so readers never
//! block on the reloader and the reloader never blocks on readers.
//!
//! The directory containing the configuration file is watched, not the file
//! itself - common editors replace files atomically via rename-on-save,
//! which would otherwise silently detach a watch bound to the old inode.

use std::{
	net::IpAddr,
	path::{Path, PathBuf},
	sync::{
		atomic::{AtomicBool, Ordering},
		mpsc::{self, RecvTimeoutError},
		Arc,
	},
	thread,
	time::Duration,
};

use arc_swap::ArcSwap;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::{
	config::{self, ConfigTree, LoadError},
	hosts,
};

/// How long the watcher thread waits for a filesystem event before checking
/// whether it's been asked to terminate.
const WATCHER_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the live [`ConfigTree`] and the background thread that keeps it up
/// to date. Dropping this stops the watcher thread.
pub struct Reloader {
	terminator: Arc<AtomicBool>,
	current: Arc<ArcSwap<ConfigTree>>,
	/// Kept alive only so the watcher isn't dropped (and stopped) early; the
	/// watcher's events are consumed via the channel it was built with.
	_watcher: RecommendedWatcher,
}

impl Reloader {
	/// Load the configuration at `config_path`, sync `/etc/hosts` once
	/// immediately (so a server started against a changed configuration
	/// doesn't serve stale entries until the first file-change event), then
	/// start watching for changes.
	///
	/// # Errors
	/// Returns an error if the initial load fails (fatal at startup, per the
	/// crate's error handling design) or the file watcher can't be set up.
	pub fn new(config_path: PathBuf, hosts_path: PathBuf, advertise: IpAddr) -> anyhow::Result<Self> {
		let tree = config::load(&config_path)?;
		info!(hosts = tree.root.children.len(), "configuration loaded");

		sync_hosts(&hosts_path, advertise, &tree);

		let current = Arc::new(ArcSwap::from_pointee(tree));

		let watch_dir = config_path
			.parent()
			.filter(|p| !p.as_os_str().is_empty())
			.map_or_else(|| PathBuf::from("."), Path::to_path_buf);
		let watch_target = config_path
			.canonicalize()
			.unwrap_or_else(|_| config_path.clone());

		let (tx, rx) = mpsc::channel();
		let mut watcher = notify::recommended_watcher(move |res| {
			if let Err(err) = tx.send(res) {
				error!(?err, "file watcher channel closed");
			}
		})?;
		watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

		let terminator = Arc::new(AtomicBool::new(false));
		let terminate = Arc::clone(&terminator);
		let reload_current = Arc::clone(&current);

		thread::spawn(move || {
			info!(path = %watch_dir.display(), "configuration file watcher starting");

			while !terminate.load(Ordering::Relaxed) {
				match rx.recv_timeout(WATCHER_TIMEOUT) {
					Ok(Ok(event)) => {
						if !is_relevant(&event.kind) {
							continue;
						}

						let touches_config = event
							.paths
							.iter()
							.any(|p| p.canonicalize().map(|p| p == watch_target).unwrap_or(false));

						if touches_config {
							reload(&config_path, &hosts_path, advertise, &reload_current);
						}
					}
					Ok(Err(err)) => error!(?err, "file watcher error"),
					Err(RecvTimeoutError::Timeout) => debug!("still watching configuration file for changes"),
					Err(RecvTimeoutError::Disconnected) => {
						error!("file watcher channel disconnected, stopping watcher thread");
						break;
					}
				}
			}

			info!("configuration file watcher stopping");
		});

		Ok(Self {
			terminator,
			current,
			_watcher: watcher,
		})
	}

	/// The currently live configuration tree.
	#[must_use]
	pub fn current(&self) -> Arc<ConfigTree> {
		self.current.load_full()
	}
}

impl Drop for Reloader {
	fn drop(&mut self) {
		self.terminator.store(true, Ordering::Relaxed);
	}
}

fn is_relevant(kind: &EventKind) -> bool {
	matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

/// Re-parse and re-validate the configuration file; on success, swap it in
/// and re-sync the hosts file. On failure, log and retain the current tree -
/// the service keeps serving with the old configuration.
fn reload(config_path: &Path, hosts_path: &Path, advertise: IpAddr, current: &Arc<ArcSwap<ConfigTree>>) {
	info!(path = %config_path.display(), "configuration file changed, reloading");

	let tree = match config::load(config_path) {
		Ok(tree) => tree,
		Err(LoadError::Parse(err)) => {
			warn!(%err, "failed to parse reloaded configuration, keeping previous configuration");
			return;
		}
		Err(LoadError::Validation(err)) => {
			warn!(%err, "reloaded configuration failed validation, keeping previous configuration");
			return;
		}
	};

	sync_hosts(hosts_path, advertise, &tree);
	current.store(Arc::new(tree));
	info!("configuration reloaded successfully");
}

fn sync_hosts(hosts_path: &Path, advertise: IpAddr, tree: &ConfigTree) {
	let mut hosts: Vec<String> = tree.root.children.keys().cloned().collect();
	hosts.sort();

	if let Err(err) = hosts::sync(hosts_path, advertise, &hosts) {
		warn!(%err, "failed to sync /etc/hosts, continuing to serve");
	}
}
