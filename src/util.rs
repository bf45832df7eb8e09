//! Miscellaneous statics and CLI help text used throughout zapper.

use lazy_static::lazy_static;

lazy_static! {
	/// A string representation of this crate's version. In debug builds, this
	/// is in the form of `[full semver crate version]+debug`. In release
	/// builds this gets shortened to `MAJOR.MINOR`.
	pub static ref VERSION: String = if cfg!(debug_assertions) {
		env!("CARGO_PKG_VERSION").to_string() + "+debug"
	} else {
		env!("CARGO_PKG_VERSION_MAJOR").to_string() + "." + env!("CARGO_PKG_VERSION_MINOR")
	};

	/// The name of the HTTP server implemented by this crate. Used in the
	/// `Server` HTTP header.
	pub static ref SERVER_NAME: String = format!("zapper/{}", &*VERSION);
}

/// Help string for the server CLI
pub const SERVER_HELP: &str = r#"zapper

USAGE:
    zapper [FLAGS] [OPTIONS]

FLAGS (all default off):
 -h --help                   Print this and exit
 -v                          Print version and exit
    --validate               Load and validate the config, print the result, and exit

OPTIONS:
    --config PATH             Path to the config file (default "c.yml")
    --port PORT               Port to bind (default 8927)
    --host ADDRESS            Address to bind (default "127.0.0.1")
    --advertise ADDRESS       Address written into /etc/hosts for each shortcut host (default "127.0.0.1")
    --log-level LEVEL         Log level ("trace" / "debug" / "info" * / "warn" / "error"), also settable via ZAPPER_LOG

* Default value for this option
"#;
