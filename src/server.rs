//! The zapper HTTP server.
//!
//! Accepts plaintext HTTP connections and spawns one task per connection, the
//! same shape this project's server has always used - just without the TLS
//! and RPC machinery a single-purpose redirector doesn't need. Every request
//! is routed to one of three places: the health check, the config dump, or
//! the [dispatcher][crate::dispatcher].

use std::{
	net::{IpAddr, Ipv4Addr, SocketAddr},
	path::{Path, PathBuf},
	sync::Arc,
};

use hyper::{
	body,
	server::conn::Http,
	service::service_fn,
	Body, Method, Request, Response, StatusCode,
};
use pico_args::Arguments;
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument, Level};

use crate::{
	config::{self, LoadError},
	dispatcher,
	reload::Reloader,
	util::{SERVER_HELP, SERVER_NAME, VERSION},
};

const DEFAULT_CONFIG: &str = "c.yml";
const DEFAULT_PORT: u16 = 8927;
const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));

/// Run the zapper server using configuration from the provided command line
/// arguments (with the executable name already removed) and log level. This
/// is essentially the entire server binary, but exposed here to aid
/// integration tests, which build an [`Arguments`] directly rather than
/// spawning a subprocess.
///
/// # What this function *doesn't* do
/// - Set up a default tracing subscriber; that would interfere with
///   integration tests that install their own.
/// - Parse CLI arguments from `std::env::args()`; the caller does that so
///   tests can supply arguments directly.
///
/// # Errors
/// Returns an error if the configuration can't be loaded (fatal at startup)
/// or the HTTP listener can't be bound.
pub async fn run(mut args: Arguments, log_level: Level) -> Result<(), anyhow::Error> {
	if args.contains(["-h", "--help"]) {
		print!("{SERVER_HELP}");
		std::process::exit(0);
	}

	if args.contains("-v") {
		println!("{}", &*VERSION);
		std::process::exit(0);
	}

	let config_path: PathBuf = args
		.opt_value_from_str("--config")?
		.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

	if args.contains("--validate") {
		validate_and_report(&config_path);
	}

	let port: u16 = args.opt_value_from_str("--port")?.unwrap_or(DEFAULT_PORT);
	let host: IpAddr = args.opt_value_from_str("--host")?.unwrap_or(LOCALHOST);
	let advertise: IpAddr = args.opt_value_from_str("--advertise")?.unwrap_or(LOCALHOST);
	let hosts_path = std::env::var("ZAPPER_HOSTS_FILE")
		.map(PathBuf::from)
		.unwrap_or_else(|_| PathBuf::from("/etc/hosts"));

	let server = &*SERVER_NAME;
	info!(%server, %log_level, config = %config_path.display(), %port, %host, %advertise, "starting zapper");

	let reloader = Arc::new(Reloader::new(config_path, hosts_path, advertise)?);

	let addr = SocketAddr::new(host, port);
	serve(addr, reloader).await
}

/// Load and validate the configuration file at `path`, print the outcome,
/// and exit: `0` if it's valid, `1` if it isn't. Never returns.
fn validate_and_report(path: &Path) -> ! {
	match config::load(path) {
		Ok(tree) => {
			println!(
				"configuration is valid ({} shortcut host(s))",
				tree.root.children.len()
			);
			std::process::exit(0);
		}
		Err(LoadError::Parse(err)) => {
			eprintln!("error: {err}");
			std::process::exit(1);
		}
		Err(LoadError::Validation(err)) => {
			for defect in &err.0 {
				eprintln!("error: {defect}");
			}
			std::process::exit(1);
		}
	}
}

/// Bind `addr` and serve requests against the [`Reloader`]'s live
/// configuration until the process is terminated.
///
/// # Errors
/// Returns an error if the address can't be bound.
pub async fn serve(addr: SocketAddr, reloader: Arc<Reloader>) -> Result<(), anyhow::Error> {
	let listener = TcpListener::bind(addr).await?;
	info!(%addr, "zapper listening");

	loop {
		let (tcp_stream, peer) = match listener.accept().await {
			Ok(accepted) => accepted,
			Err(err) => {
				error!(?err, "error accepting connection");
				continue;
			}
		};

		let reloader = Arc::clone(&reloader);

		tokio::spawn(async move {
			let service = service_fn(move |req| handle(req, Arc::clone(&reloader)));

			if let Err(err) = Http::new().serve_connection(tcp_stream, service).await {
				debug!(?err, %peer, "error serving connection");
			}
		});
	}
}

#[instrument(level = "debug", skip_all, fields(method = %req.method(), path = %req.uri().path()))]
async fn handle(req: Request<Body>, reloader: Arc<Reloader>) -> Result<Response<Body>, anyhow::Error> {
	let response = match (req.method(), req.uri().path()) {
		(&Method::GET, "/healthz") => healthz(),
		(&Method::GET, "/varz") => varz(&reloader),
		_ => dispatcher::dispatch(&req, &reloader.current()),
	};

	Ok(response)
}

fn healthz() -> Response<Body> {
	Response::new(Body::from("OK"))
}

fn varz(reloader: &Reloader) -> Response<Body> {
	let tree = reloader.current();
	let body = serde_json::to_string_pretty(&tree.raw).unwrap_or_else(|_| "{}".to_string());

	let mut res = Response::new(Body::from(body));
	res.headers_mut().insert(
		hyper::header::CONTENT_TYPE,
		hyper::header::HeaderValue::from_static("application/json"),
	);
	*res.status_mut() = StatusCode::OK;
	res
}

/// Read a response body fully into a `String`, for tests and diagnostics.
#[allow(dead_code)]
pub(crate) async fn body_to_string(payload: Body) -> Result<String, hyper::Error> {
	let bytes = body::to_bytes(payload).await?;
	Ok(String::from_utf8_lossy(&bytes).into_owned())
}
