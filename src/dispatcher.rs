//! The request dispatcher - per-request policy around the expansion engine.
//!
//! Resolves the effective host, looks it up as a direct child of the
//! configuration root, picks the URL scheme prefix that host calls for, and
//! hands off to [`engine::expand`] to do the actual path rewriting.

use hyper::{header::HeaderValue, Body, Request, Response, StatusCode};
use tracing::{instrument, trace, warn};

use crate::{
	config::{ConfigTree, Node},
	engine::{self, ExpandError},
	util::SERVER_NAME,
};

/// Dispatch a single request against `config`, producing the redirect (or
/// error) response.
///
/// This never panics: an unknown host becomes a 404, and a matched-but-
/// actionless configuration node becomes a 500, both with a descriptive
/// body, per the crate's error handling design.
#[instrument(level = "info", skip_all, fields(http.host, http.path = %req.uri().path()))]
pub fn dispatch(req: &Request<Body>, config: &ConfigTree) -> Response<Body> {
	let host = effective_host(req);
	tracing::Span::current().record("http.host", &host);

	let Some(host_node) = config.root.children.get(host) else {
		warn!(%host, "shortcut not found");
		return not_found(host);
	};

	let full_path = format!("{host}{}", req.uri().path());
	let tokens: Vec<&str> = full_path.split('/').collect();

	let (prefix, start_node, start_index) = if host_node.ssl_off {
		("http:/".to_string(), &config.root, 0)
	} else if let Some(schema) = host_node.schema.as_deref().filter(|s| !s.is_empty()) {
		(format!("{schema}:/"), host_node, 1)
	} else {
		("https:/".to_string(), &config.root, 0)
	};

	let mut location = prefix;
	trace!(?tokens, start_index, "expanding request path");

	match engine::expand(start_node, &tokens, start_index, &mut location, true) {
		Ok(()) => redirect(&location),
		Err(ExpandError::NoAction) => {
			warn!(%host, "configuration node matched mid-expansion has no action");
			internal_error()
		}
	}
}

/// `X-Forwarded-Host` overrides the `Host` header when present.
fn effective_host(req: &Request<Body>) -> &str {
	req.headers()
		.get("x-forwarded-host")
		.and_then(|h| h.to_str().ok())
		.or_else(|| req.headers().get(hyper::header::HOST).and_then(|h| h.to_str().ok()))
		.unwrap_or_default()
}

fn redirect(location: &str) -> Response<Body> {
	let mut res = Response::new(Body::empty());
	*res.status_mut() = StatusCode::FOUND;
	set_common_headers(&mut res);
	res.headers_mut()
		.insert("Location", HeaderValue::from_str(location).unwrap_or_else(|_| HeaderValue::from_static("/")));
	res
}

fn not_found(host: &str) -> Response<Body> {
	let mut res = Response::new(Body::from(format!("shortcut '{host}' not found")));
	*res.status_mut() = StatusCode::NOT_FOUND;
	set_common_headers(&mut res);
	res
}

fn internal_error() -> Response<Body> {
	let mut res = Response::new(Body::from(
		"configuration error: matched node has no expand/query/port action",
	));
	*res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
	set_common_headers(&mut res);
	res
}

/// Every response - redirect, 404, or 500 - carries the same hardening and
/// identification headers, set here rather than by whichever branch produced
/// the response.
fn set_common_headers(res: &mut Response<Body>) {
	res.headers_mut().insert(
		"Server",
		HeaderValue::from_str(&SERVER_NAME).unwrap_or_else(|_| HeaderValue::from_static("zapper")),
	);
	res.headers_mut()
		.insert("Content-Security-Policy", HeaderValue::from_static("default-src 'none'"));
	res.headers_mut()
		.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
}
