//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: matches the request path against
//! the mount table and walks the matching middleware chains in order.

use crate::config::{AppState, MountConfig};
use crate::error::{Error, Result};
use crate::http::{self, Body};
use crate::logger::{self, AccessLogEntry};
use crate::middleware::Middleware;
use hyper::body::Incoming;
use hyper::header::CONTENT_LENGTH;
use hyper::{Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Middleware chain bound to a path prefix
struct Mount {
    prefix: String,
    chain: Vec<Arc<dyn Middleware>>,
}

/// Ordered mount table
#[derive(Default)]
pub struct Router {
    mounts: Vec<Mount>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chain under `prefix`; mounts are tried in insertion order
    #[must_use]
    pub fn mount(mut self, prefix: &str, chain: Vec<Arc<dyn Middleware>>) -> Self {
        self.mounts.push(Mount {
            prefix: normalize_prefix(prefix),
            chain,
        });
        self
    }

    /// Build every configured file middleware up front
    pub fn from_config(mounts: &[MountConfig]) -> Result<Self> {
        mounts.iter().try_fold(Self::new(), |router, mount| {
            let chain = mount
                .files
                .iter()
                .map(|file| Ok(Arc::new(file.build()?) as Arc<dyn Middleware>))
                .collect::<Result<Vec<_>>>()?;
            Ok(router.mount(&mount.route, chain))
        })
    }

    /// Number of mounted chains
    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Walk the matching chains until a middleware answers or fails
    pub async fn dispatch(&self, request: &Request<()>) -> Result<Option<Response<Body>>> {
        let path = request.uri().path();
        let chain = self
            .mounts
            .iter()
            .filter(|mount| matches_prefix(&mount.prefix, path))
            .flat_map(|mount| mount.chain.iter());

        for middleware in chain {
            if let Some(response) = middleware.handle(request).await.map_err(|e| {
                log_failure(middleware.name(), path, &e);
                e
            })? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    /// Final response: 404 when every middleware declines, the error's status when one fails
    pub async fn handle(&self, request: &Request<()>) -> Response<Body> {
        match self.dispatch(request).await {
            Ok(Some(response)) => response,
            Ok(None) => http::build_404_response(),
            Err(e) => http::build_error_response(&e),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Body>, Infallible> {
    let started = Instant::now();

    // Middlewares only look at the request head
    let (parts, _body) = req.into_parts();
    let entry = state
        .access_log_enabled()
        .then(|| AccessLogEntry::from_parts(peer_addr.ip().to_string(), &parts));
    let request = Request::from_parts(parts, ());

    let response = state.router.handle(&request).await;

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, state.access_log_format());
    }

    Ok(response)
}

fn log_failure(name: &str, path: &str, error: &Error) {
    let message = format!("{name} failed for {path}: {error}");
    if error.status().is_server_error() {
        logger::log_error(&message);
    } else {
        logger::log_warning(&message);
    }
}

/// `/` and the empty prefix match everything, other prefixes lose their trailing slash
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Prefix match on whole path segments
fn matches_prefix(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SendError;
    use crate::middleware::{StaticFile, StaticFileOptions};
    use async_trait::async_trait;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use http_body_util::BodyExt;
    use hyper::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE};
    use hyper::StatusCode;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct Fixtures {
        dir: TempDir,
    }

    impl Fixtures {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("foo.jpg"), vec![0xAB; 4096]).unwrap();

            let mut gz = GzEncoder::new(Vec::new(), Compression::default());
            gz.write_all(b"hello gzip").unwrap();
            std::fs::write(dir.path().join("foo.txt.gz"), gz.finish().unwrap()).unwrap();

            std::fs::create_dir(dir.path().join("subdir")).unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn serve(&self, name: &str, options: StaticFileOptions) -> Arc<dyn Middleware> {
            Arc::new(StaticFile::new(self.path(name), options).unwrap())
        }
    }

    /// Counts calls and always declines
    #[derive(Default)]
    struct Spy {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Middleware for Spy {
        async fn handle(&self, _request: &Request<()>) -> Result<Option<Response<Body>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    /// Always fails with a permission error
    struct Broken;

    #[async_trait]
    impl Middleware for Broken {
        async fn handle(&self, _request: &Request<()>) -> Result<Option<Response<Body>>> {
            Err(SendError::Io {
                path: PathBuf::from("/broken"),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            }
            .into())
        }
    }

    fn get(path: &str, accept_encoding: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri(path);
        if let Some(value) = accept_encoding {
            builder = builder.header(ACCEPT_ENCODING, value);
        }
        builder.body(()).unwrap()
    }

    async fn body_len(response: Response<Body>) -> usize {
        response.into_body().collect().await.unwrap().to_bytes().len()
    }

    #[test]
    fn test_matches_prefix() {
        assert!(matches_prefix("/", "/anything/at/all"));
        assert!(matches_prefix("/static", "/static"));
        assert!(matches_prefix("/static", "/static/app.js"));
        assert!(!matches_prefix("/static", "/staticfoo"));
        assert!(!matches_prefix("/static", "/"));
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix(""), "/");
        assert_eq!(normalize_prefix("/"), "/");
        assert_eq!(normalize_prefix("/static/"), "/static");
        assert_eq!(normalize_prefix("static"), "/static");
    }

    #[tokio::test]
    async fn test_nothing_mounted_is_404() {
        let response = Router::new().handle(&get("/", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_encoded_without_support_falls_through() {
        let fx = Fixtures::new();
        let router = Router::new().mount(
            "/",
            vec![
                fx.serve("foo.txt.gz", StaticFileOptions::default().encoded("gzip")),
                fx.serve("foo.jpg", StaticFileOptions::default()),
            ],
        );

        let response = router.handle(&get("/", Some(""))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "image/jpeg");
        assert!(response.headers().get(CONTENT_ENCODING).is_none());
        assert_eq!(body_len(response).await, 4096);

        let response = router.handle(&get("/", Some("gzip, deflate"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_ENCODING], "gzip");
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=UTF-8");
    }

    #[tokio::test]
    async fn test_encoded_without_support_alone_is_404() {
        let fx = Fixtures::new();
        let router = Router::new().mount(
            "/",
            vec![fx.serve("foo.txt.gz", StaticFileOptions::default().encoded("gzip"))],
        );

        let response = router.handle(&get("/", Some(""))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_file_falls_through() {
        let fx = Fixtures::new();
        let spy = Arc::new(Spy::default());
        let router = Router::new().mount(
            "/",
            vec![
                fx.serve("nope.txt", StaticFileOptions::default()),
                Arc::clone(&spy) as Arc<dyn Middleware>,
                fx.serve("foo.jpg", StaticFileOptions::default()),
            ],
        );

        let response = router.handle(&get("/", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(spy.calls.load(Ordering::SeqCst), 1);

        let router = Router::new().mount("/", vec![fx.serve("nope.txt", StaticFileOptions::default())]);
        let response = router.handle(&get("/", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_directory_is_404() {
        let fx = Fixtures::new();
        let router = Router::new().mount("/", vec![fx.serve("subdir", StaticFileOptions::default())]);

        let response = router.handle(&get("/", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_len(response).await, "404 Not Found".len());
    }

    #[tokio::test]
    async fn test_error_stops_the_chain() {
        let fx = Fixtures::new();
        let spy = Arc::new(Spy::default());
        let router = Router::new().mount(
            "/",
            vec![
                Arc::new(Broken),
                Arc::clone(&spy) as Arc<dyn Middleware>,
                fx.serve("foo.jpg", StaticFileOptions::default()),
            ],
        );

        assert!(router.dispatch(&get("/", None)).await.is_err());
        let response = router.handle(&get("/", None)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_file_stops_the_chain() {
        let fx = Fixtures::new();
        std::os::unix::fs::symlink(fx.path("loop-b"), fx.path("loop-a")).unwrap();
        std::os::unix::fs::symlink(fx.path("loop-a"), fx.path("loop-b")).unwrap();
        let spy = Arc::new(Spy::default());
        let router = Router::new().mount(
            "/",
            vec![
                fx.serve("loop-a", StaticFileOptions::default()),
                Arc::clone(&spy) as Arc<dyn Middleware>,
                fx.serve("foo.jpg", StaticFileOptions::default()),
            ],
        );

        let response = router.handle(&get("/", None)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_path_through_file_is_404_without_fallback() {
        let fx = Fixtures::new();
        let spy = Arc::new(Spy::default());
        let router = Router::new().mount(
            "/",
            vec![
                fx.serve("foo.jpg/child", StaticFileOptions::default()),
                Arc::clone(&spy) as Arc<dyn Middleware>,
            ],
        );

        let response = router.handle(&get("/", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_prefix_selects_mount() {
        let fx = Fixtures::new();
        let router = Router::new()
            .mount("/img", vec![fx.serve("foo.jpg", StaticFileOptions::default())])
            .mount(
                "/text",
                vec![fx.serve("foo.txt.gz", StaticFileOptions::default().encoded("gzip"))],
            );

        let response = router.handle(&get("/img/any/thing", None)).await;
        assert_eq!(response.headers()[CONTENT_TYPE], "image/jpeg");

        let response = router.handle(&get("/text", Some("gzip"))).await;
        assert_eq!(response.headers()[CONTENT_ENCODING], "gzip");

        let response = router.handle(&get("/imgs", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_later_mounts_are_fallbacks() {
        let fx = Fixtures::new();
        let router = Router::new()
            .mount("/assets", vec![fx.serve("missing.css", StaticFileOptions::default())])
            .mount("/", vec![fx.serve("foo.jpg", StaticFileOptions::default())]);

        let response = router.handle(&get("/assets/site.css", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "image/jpeg");
    }

    #[tokio::test]
    async fn test_failed_precondition_uses_error_status() {
        let fx = Fixtures::new();
        let router = Router::new().mount("/", vec![fx.serve("foo.jpg", StaticFileOptions::default())]);

        let request = Request::builder()
            .uri("/")
            .header("if-match", "\"nope\"")
            .body(())
            .unwrap();
        let response = router.handle(&request).await;
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    }

    #[test]
    fn test_from_config() {
        let fx = Fixtures::new();
        let toml = format!(
            "[[mounts]]\nroute = \"/\"\n[[mounts.files]]\npath = {:?}\nencoded = \"gzip\"\n[[mounts.files]]\npath = {:?}\n",
            fx.path("foo.txt.gz").display().to_string(),
            fx.path("foo.jpg").display().to_string(),
        );
        let config = crate::config::Config::from_toml_str(&toml).unwrap();
        let router = Router::from_config(&config.mounts).unwrap();
        assert_eq!(router.len(), 1);
        assert!(!router.is_empty());
    }
}
