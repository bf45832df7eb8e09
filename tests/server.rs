//! Black-box tests of the zapper HTTP server: every scenario is driven
//! through a real TCP connection against a server spawned with a temp
//! configuration file, never by calling internal functions directly.

mod util;

use reqwest::{redirect::Policy, StatusCode};

const SCENARIO_CONFIG: &str = r#"
e: {expand: example.com, a: {expand: apples}, b: {expand: bananas}}
g:
  expand: github.com
  z: {expand: issmirnov/zap}
  s:
    query: "search?q="
    me: {expand: issmirnov, z: {expand: zap}}
    ak: {query: "apache/kafka", c: {query: "+connect"}}
z: {expand: zero.com, ssl_off: true}
zz: {expand: zero.ssl.on.com, ssl_off: false}
l: {expand: localhost, ssl_off: true, a: {port: 8080, s: {expand: service}}}
wc: {expand: wildcard.com, "*": {"*": {"*": {four: {expand: "4"}}}}}
ch: {schema: chrome, v: {expand: version}, n: {expand: net-internals, d: {expand: "#dns"}}}
"#;

fn client() -> reqwest::Client {
	reqwest::Client::builder().redirect(Policy::none()).build().unwrap()
}

async fn location(base: &str, host: &str, path: &str) -> (StatusCode, Option<String>) {
	let res = client()
		.get(format!("{base}{path}"))
		.header("Host", host)
		.send()
		.await
		.unwrap();
	let status = res.status();
	let location = res
		.headers()
		.get("Location")
		.map(|h| h.to_str().unwrap().to_string());
	(status, location)
}

#[tokio::test]
#[serial_test::serial]
async fn scenario_table_from_the_design_notes() {
	let (port, server) = util::start_server(SCENARIO_CONFIG);
	util::settle().await;
	let base = format!("http://127.0.0.1:{port}");

	let cases: &[(&str, &str, &str)] = &[
		("g", "/z", "https://github.com/issmirnov/zap"),
		("g", "/z/", "https://github.com/issmirnov/zap/"),
		("g", "/s/foo/bar", "https://github.com/search?q=foo/bar"),
		("g", "/s/me/z", "https://github.com/search?q=issmirnov/zap"),
		("g", "/s/ak/c", "https://github.com/search?q=apache/kafka+connect"),
		("z", "/", "http://zero.com/"),
		("zz", "/", "https://zero.ssl.on.com/"),
		("l", "/a", "http://localhost:8080"),
		("l", "/a/s", "http://localhost:8080/service"),
		("wc", "/1/2/3/four", "https://wildcard.com/1/2/3/4"),
		("ch", "/", "chrome://"),
		("ch", "/v", "chrome://version"),
		("ch", "/n/d", "chrome://net-internals/#dns"),
	];

	for (host, path, expected) in cases {
		let (status, loc) = location(&base, host, path).await;
		assert_eq!(status, StatusCode::FOUND, "host={host} path={path}");
		assert_eq!(loc.as_deref(), Some(*expected), "host={host} path={path}");
	}

	let (status, _) = location(&base, "fake", "/path").await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	server.abort();
}

#[tokio::test]
#[serial_test::serial]
async fn x_forwarded_host_overrides_the_host_header() {
	let (port, server) = util::start_server(SCENARIO_CONFIG);
	util::settle().await;

	let res = client()
		.get(format!("http://127.0.0.1:{port}/z"))
		.header("Host", "fake")
		.header("X-Forwarded-Host", "g")
		.send()
		.await
		.unwrap();

	assert_eq!(res.status(), StatusCode::FOUND);
	assert_eq!(
		res.headers().get("Location").unwrap().to_str().unwrap(),
		"https://github.com/issmirnov/zap"
	);

	server.abort();
}

#[tokio::test]
#[serial_test::serial]
async fn healthz_and_varz() {
	let (port, server) = util::start_server("g: {expand: github.com}");
	util::settle().await;
	let base = format!("http://127.0.0.1:{port}");

	let health = reqwest::get(format!("{base}/healthz")).await.unwrap();
	assert_eq!(health.status(), StatusCode::OK);
	assert_eq!(health.text().await.unwrap(), "OK");

	let varz = reqwest::get(format!("{base}/varz")).await.unwrap();
	assert_eq!(varz.status(), StatusCode::OK);
	let body: serde_json::Value = serde_json::from_str(&varz.text().await.unwrap()).unwrap();
	assert_eq!(body["g"]["expand"], "github.com");

	server.abort();
}

#[tokio::test]
#[serial_test::serial]
async fn config_reload_picks_up_a_rewritten_file() {
	let port = util::next_port();
	let config_path = std::env::temp_dir().join(format!("zapper_test_reload_config_{port}.yml"));
	let hosts_path = std::env::temp_dir().join(format!("zapper_test_reload_hosts_{port}"));
	std::fs::write(&config_path, "g: {expand: github.com}").unwrap();
	std::fs::write(&hosts_path, "127.0.0.1 localhost\n").unwrap();
	std::env::set_var("ZAPPER_HOSTS_FILE", &hosts_path);

	let args = vec![
		"--config".to_string(),
		config_path.to_string_lossy().into_owned(),
		"--port".to_string(),
		port.to_string(),
		"--host".to_string(),
		"127.0.0.1".to_string(),
	];
	let server = tokio::spawn(async move {
		zapper::server::run(pico_args::Arguments::from_vec(args), tracing::Level::INFO)
			.await
			.unwrap();
	});
	util::settle().await;

	let base = format!("http://127.0.0.1:{port}");
	let (status, loc) = location(&base, "g", "/").await;
	assert_eq!(status, StatusCode::FOUND);
	assert_eq!(loc.as_deref(), Some("https://github.com/"));

	std::fs::write(&config_path, "g: {expand: gitlab.com}").unwrap();
	// The watcher polls on a multi-second timeout; give it room to notice.
	tokio::time::sleep(std::time::Duration::from_secs(6)).await;

	let (status, loc) = location(&base, "g", "/").await;
	assert_eq!(status, StatusCode::FOUND);
	assert_eq!(loc.as_deref(), Some("https://gitlab.com/"));

	server.abort();
}
