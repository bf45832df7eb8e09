//! Utilities for end-to-end tests of the zapper server.

use std::sync::atomic::{AtomicU16, Ordering};

use pico_args::Arguments;
use tokio::task::JoinHandle;
use tracing::Level;

/// Ports handed out to test servers, starting well above any well-known port
/// so tests can run concurrently without colliding.
static NEXT_PORT: AtomicU16 = AtomicU16::new(18_900);

/// Claim a port unique to this test process run.
#[allow(dead_code)]
pub fn next_port() -> u16 {
	NEXT_PORT.fetch_add(1, Ordering::SeqCst)
}

/// Write `config` to a fresh temp file and start the zapper server against
/// it, bound to `127.0.0.1:<port>`. Returns the port and a `JoinHandle`;
/// abort the handle to stop the server.
///
/// `/etc/hosts` is never touched: each call points `ZAPPER_HOSTS_FILE` at its
/// own temp file.
#[allow(dead_code)]
pub fn start_server(config: &str) -> (u16, JoinHandle<()>) {
	let port = next_port();

	let config_path = std::env::temp_dir().join(format!("zapper_test_config_{port}.yml"));
	let hosts_path = std::env::temp_dir().join(format!("zapper_test_hosts_{port}"));
	std::fs::write(&config_path, config).unwrap();
	std::fs::write(&hosts_path, "127.0.0.1 localhost\n").unwrap();
	std::env::set_var("ZAPPER_HOSTS_FILE", &hosts_path);

	let args = vec![
		"--config".into(),
		config_path.to_string_lossy().into_owned(),
		"--port".into(),
		port.to_string(),
		"--host".into(),
		"127.0.0.1".into(),
	];

	let handle = tokio::spawn(async move {
		zapper::server::run(Arguments::from_vec(args), Level::INFO)
			.await
			.unwrap();
	});

	(port, handle)
}

/// Give a freshly spawned server a moment to bind its listener before the
/// first request is sent.
#[allow(dead_code)]
pub async fn settle() {
	tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}
