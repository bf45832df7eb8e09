//! The zapper server binary.
//!
//! Sets up logging, parses the `--log-level` (or `ZAPPER_LOG`) option, builds
//! a multi-threaded tokio runtime, and hands everything else off to
//! [`zapper::server::run`].

use std::sync::atomic::{AtomicUsize, Ordering};

use pico_args::Arguments;
use tokio::runtime::Builder;
use tracing::Level;
use tracing_subscriber::{filter::FilterFn, prelude::*, FmtSubscriber};

fn main() -> Result<(), anyhow::Error> {
	// Temporary subscriber so anything logged before the real log level is
	// known still reaches the console.
	let tracing_subscriber = FmtSubscriber::builder()
		.with_level(true)
		.with_max_level(if cfg!(debug_assertions) {
			Level::DEBUG
		} else {
			Level::INFO
		})
		.finish();
	let subscriber_guard = tracing::subscriber::set_default(tracing_subscriber);

	let mut args = Arguments::from_env();
	let log_level = log_level(&mut args)?;

	let tracing_filter = FilterFn::new(move |metadata| metadata.level() <= &log_level);
	let tracing_subscriber = FmtSubscriber::builder()
		.with_level(true)
		.with_max_level(Level::TRACE)
		.finish()
		.with(tracing_filter);

	drop(subscriber_guard);
	tracing::subscriber::set_global_default(tracing_subscriber)
		.expect("setting tracing default subscriber failed");

	let rt = Builder::new_multi_thread()
		.enable_all()
		.thread_name_fn(|| {
			static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
			let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
			format!("zapper-worker-{id:#04x}")
		})
		.build()
		.expect("async runtime initialization");

	rt.block_on(zapper::server::run(args, log_level))
}

/// Resolve the log level from `--log-level`, falling back to the
/// `ZAPPER_LOG` environment variable, then `info`.
fn log_level(args: &mut Arguments) -> Result<Level, anyhow::Error> {
	let raw: Option<String> = args.opt_value_from_str("--log-level")?;
	let raw = raw.or_else(|| std::env::var("ZAPPER_LOG").ok());

	Ok(match raw.as_deref() {
		None => Level::INFO,
		Some(level) => level.parse()?,
	})
}
