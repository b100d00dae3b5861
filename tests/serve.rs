//! End-to-end checks against a live server on an ephemeral port

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use verify_devserver::{
    AccessLogEntry, CaseInsensitiveResolver, Config, DevServer, RequestLogger, ServerError,
};

const NO_CACHE: &str = "no-store, no-cache, must-revalidate, max-age=0";

struct RawResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<AccessLogEntry>>);

impl RequestLogger for Recorder {
    fn on_request_logged(&self, entry: &AccessLogEntry) {
        self.0.lock().unwrap().push(entry.clone());
    }
}

fn test_config(root: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.server.host = "127.0.0.1".to_string();
    cfg.server.port = 0;
    cfg.site.root = root.to_string_lossy().into_owned();
    cfg.logging.access_log = false;
    cfg
}

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<h1>verify25</h1>").unwrap();
    fs::write(dir.path().join("style.css"), "#name-element { font-size: 62.0px; }").unwrap();
    fs::create_dir(dir.path().join("hfestJ")).unwrap();
    fs::write(dir.path().join("hfestJ").join("index.html"), "<h1>hfestJ</h1>").unwrap();
    fs::write(dir.path().join("hfestJ").join("data.json"), r#"{"HF-1":"Ada"}"#).unwrap();
    dir
}

async fn send(addr: SocketAddr, request: &str) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();

    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has a header block");
    let head = String::from_utf8_lossy(&raw[..split]).into_owned();
    let body = raw[split + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .expect("status line");
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();

    RawResponse {
        status,
        headers,
        body,
    }
}

fn get(path: &str) -> String {
    format!("GET {path} HTTP/1.0\r\nHost: localhost\r\n\r\n")
}

/// Run `server` while the given requests are sent one after another
async fn exchange<R, L>(server: DevServer<R, L>, requests: &[String]) -> Vec<RawResponse>
where
    R: verify_devserver::PathResolver + 'static,
    L: RequestLogger + 'static,
{
    let addr = server.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let client = async move {
        let mut responses = Vec::new();
        for request in requests {
            responses.push(send(addr, request).await);
        }
        let _ = stop_tx.send(());
        responses
    };
    let serve = server.run_until(async {
        let _ = stop_rx.await;
    });

    let (served, responses) = tokio::join!(serve, client);
    served.unwrap();
    responses
}

#[tokio::test]
async fn exact_match_served_without_caching() {
    let dir = site();
    let server = DevServer::bind(&test_config(dir.path())).unwrap();
    let responses = exchange(server, &[get("/index.html")]).await;

    let response = &responses[0];
    assert_eq!(response.status, 200);
    assert_eq!(response.text(), "<h1>verify25</h1>");
    assert_eq!(response.header("cache-control"), Some(NO_CACHE));
    assert_eq!(response.header("content-type"), Some("text/html; charset=utf-8"));
}

#[tokio::test]
async fn case_mismatch_served_from_disk_name() {
    let dir = site();
    let server = DevServer::bind(&test_config(dir.path())).unwrap();
    let responses = exchange(server, &[get("/Style.CSS"), get("/hfestJ/DATA.JSON")]).await;

    assert_eq!(responses[0].status, 200);
    assert_eq!(responses[0].text(), "#name-element { font-size: 62.0px; }");
    assert_eq!(responses[1].status, 200);
    assert_eq!(responses[1].text(), r#"{"HF-1":"Ada"}"#);
    assert_eq!(responses[1].header("content-type"), Some("application/json"));
}

#[tokio::test]
async fn missing_files_are_404() {
    let dir = site();
    let server = DevServer::bind(&test_config(dir.path())).unwrap();
    let responses = exchange(server, &[get("/missing.html"), get("/nope/asset.png")]).await;

    for response in &responses {
        assert_eq!(response.status, 404);
        assert_eq!(response.header("cache-control"), Some(NO_CACHE));
    }
}

#[tokio::test]
async fn traversal_stays_inside_root() {
    let outer = tempfile::tempdir().unwrap();
    fs::write(outer.path().join("secret.txt"), "top secret").unwrap();
    let root = outer.path().join("docs");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("index.html"), "home").unwrap();

    let server = DevServer::bind(&test_config(&root)).unwrap();
    let responses = exchange(
        server,
        &[get("/../secret.txt"), get("/%2e%2e/secret.txt"), get("/..%2fsecret.txt")],
    )
    .await;

    for response in &responses {
        assert_eq!(response.status, 404);
        assert!(!response.text().contains("top secret"));
    }
}

#[tokio::test]
async fn event_folder_redirects_then_serves_index() {
    let dir = site();
    let server = DevServer::bind(&test_config(dir.path())).unwrap();
    let responses = exchange(
        server,
        &[get("/hfestJ?id=HF-1"), get("/hfestJ/?id=HF-1")],
    )
    .await;

    assert_eq!(responses[0].status, 301);
    assert_eq!(responses[0].header("location"), Some("/hfestJ/?id=HF-1"));
    assert_eq!(responses[0].header("cache-control"), Some(NO_CACHE));
    assert_eq!(responses[1].status, 200);
    assert_eq!(responses[1].text(), "<h1>hfestJ</h1>");
}

#[tokio::test]
async fn head_and_unsupported_methods() {
    let dir = site();
    let server = DevServer::bind(&test_config(dir.path())).unwrap();
    let responses = exchange(
        server,
        &[
            "HEAD /index.html HTTP/1.0\r\n\r\n".to_string(),
            "DELETE /index.html HTTP/1.0\r\n\r\n".to_string(),
        ],
    )
    .await;

    assert_eq!(responses[0].status, 200);
    assert!(responses[0].body.is_empty());
    assert_eq!(responses[0].header("cache-control"), Some(NO_CACHE));
    assert_eq!(responses[1].status, 405);
    assert_eq!(responses[1].header("allow"), Some("GET, HEAD"));
    assert!(dir.path().join("index.html").exists());
}

#[tokio::test]
async fn every_request_reaches_the_logger() {
    let dir = site();
    let cfg = test_config(dir.path());
    let recorder = Arc::new(Recorder::default());
    let server = DevServer::with_components(
        &cfg,
        CaseInsensitiveResolver::new(dir.path()),
        Arc::clone(&recorder),
    )
    .unwrap();
    exchange(server, &[get("/index.html"), get("/missing.html")]).await;

    let entries = recorder.0.lock().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!((entries[0].status, entries[0].uri.as_str()), (200, "/index.html"));
    assert_eq!(entries[0].http_version, "1.0");
    assert_eq!((entries[1].status, entries[1].uri.as_str()), (404, "/missing.html"));
}

#[tokio::test]
async fn independently_configured_servers() {
    let first = site();
    let second = tempfile::tempdir().unwrap();
    fs::write(second.path().join("index.html"), "other site").unwrap();

    let a = DevServer::bind(&test_config(first.path())).unwrap();
    let b = DevServer::bind(&test_config(second.path())).unwrap();
    assert_ne!(a.local_addr().unwrap(), b.local_addr().unwrap());

    let from_a = exchange(a, &[get("/")]).await;
    let from_b = exchange(b, &[get("/")]).await;
    assert_eq!(from_a[0].text(), "<h1>verify25</h1>");
    assert_eq!(from_b[0].text(), "other site");
}

#[tokio::test]
async fn port_in_use_is_reported() {
    let dir = site();
    let first = DevServer::bind(&test_config(dir.path())).unwrap();
    let addr = first.local_addr().unwrap();

    let mut cfg = test_config(dir.path());
    cfg.server.port = addr.port();
    let err = DevServer::bind(&cfg).err().expect("second bind must fail");

    assert!(matches!(err, ServerError::AddrInUse { .. }));
    assert!(err.to_string().contains("already in use"));
    assert!(err.hint().unwrap().contains(&addr.port().to_string()));

    // The failed attempt leaves nothing behind; the first server still answers
    let responses = exchange(first, &[get("/index.html")]).await;
    assert_eq!(responses[0].status, 200);
}

#[tokio::test]
async fn shutdown_releases_the_port() {
    let dir = site();
    let server = DevServer::bind(&test_config(dir.path())).unwrap();
    let addr = server.local_addr().unwrap();
    server.run_until(async {}).await.unwrap();

    let mut cfg = test_config(dir.path());
    cfg.server.port = addr.port();
    assert!(DevServer::bind(&cfg).is_ok());
}
