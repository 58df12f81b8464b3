//! File streaming primitive
//!
//! Resolves a path on disk, evaluates conditional and range headers and
//! streams the file into a response. Callers observe the outcome through the
//! returned `Result` and may adjust headers through [`SendHooks`].

use crate::error::SendError;
use crate::http::response::{self, Body};
use crate::http::{cache, mime, range};
use hyper::header::{
    HeaderMap, HeaderValue, ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_LOCATION,
    CONTENT_RANGE, CONTENT_TYPE, ETAG, LAST_MODIFIED, RANGE,
};
use hyper::{Method, Request, Response, StatusCode};
use std::ffi::{OsStr, OsString};
use std::fs::Metadata;
use std::io::{self, SeekFrom};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// What to do with files whose name starts with a dot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dotfiles {
    /// Serve them like any other file
    Allow,
    /// Answer 403
    Deny,
    /// Pretend they do not exist
    #[default]
    Ignore,
}

/// Options of a single [`send`] call
#[derive(Debug, Clone)]
pub struct SendOptions {
    /// Advertise and honour byte ranges
    pub accept_ranges: bool,
    /// Emit a `Cache-Control` header
    pub cache_control: bool,
    /// Emit a weak `ETag`
    pub etag: bool,
    /// Emit `Last-Modified`
    pub last_modified: bool,
    /// Add `immutable` to `Cache-Control`
    pub immutable: bool,
    /// `max-age` of `Cache-Control`, capped at one year
    pub max_age: Duration,
    /// Extensions tried in order when the exact path is missing
    pub extensions: Vec<String>,
    /// Index files tried when the path is a directory
    pub index: Vec<String>,
    /// Directory the served path is relative to.
    ///
    /// The dotfile policy only looks at components below it, so without a
    /// root the path is taken as is.
    pub root: Option<PathBuf>,
    pub dotfiles: Dotfiles,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            accept_ranges: true,
            cache_control: true,
            etag: true,
            last_modified: true,
            immutable: false,
            max_age: Duration::ZERO,
            extensions: Vec::new(),
            index: Vec::new(),
            root: None,
            dotfiles: Dotfiles::default(),
        }
    }
}

/// Callbacks fired while a response is prepared
pub trait SendHooks {
    /// Called once the file is known to exist, before any default header is set.
    ///
    /// Headers inserted here take precedence: defaults only fill what is absent.
    fn on_headers(&self, _headers: &mut HeaderMap, _path: &Path, _metadata: &Metadata) {}
}

impl SendHooks for () {}

/// Serve the file at `path` for `request`
pub async fn send<B>(
    request: &Request<B>,
    path: &Path,
    options: &SendOptions,
    hooks: &impl SendHooks,
) -> Result<Response<Body>, SendError> {
    let target = target_path(path, options)?;
    let (path, metadata) = resolve(&target, options).await?;

    let mut file = File::open(&path).await.map_err(|e| io_error(&path, e))?;

    let mut headers = HeaderMap::new();
    hooks.on_headers(&mut headers, &path, &metadata);
    set_default_headers(&mut headers, &path, &metadata, options);

    let request_headers = request.headers();
    if cache::is_conditional(request_headers) {
        if cache::is_precondition_failure(request_headers, &headers) {
            return Err(SendError::PreconditionFailed);
        }
        if cache::is_fresh(request_headers, &headers) {
            return Ok(not_modified(headers));
        }
    }

    let size = metadata.len();
    let mut status = StatusCode::OK;
    let mut offset = 0;
    let mut length = size;

    let range_header = request_headers.get(RANGE).and_then(|v| v.to_str().ok());
    if options.accept_ranges && range_header.is_some() {
        if range::is_range_fresh(request_headers, &headers) {
            match range::parse_range_header(range_header, size) {
                range::RangeParseResult::Valid(r) => {
                    let end = r.end_position(size);
                    offset = r.start;
                    length = r.content_length(size);
                    status = StatusCode::PARTIAL_CONTENT;
                    insert_header(
                        &mut headers,
                        CONTENT_RANGE,
                        &format!("bytes {offset}-{end}/{size}"),
                    );
                }
                range::RangeParseResult::NotSatisfiable => {
                    return Err(SendError::RangeNotSatisfiable { size });
                }
                range::RangeParseResult::None => {}
            }
        }
    }

    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));

    let body = if request.method() == Method::HEAD {
        response::empty()
    } else {
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))
                .await
                .map_err(|e| io_error(&path, e))?;
        }
        response::stream(file.take(length))
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

/// Join `path` under the root, applying the dotfile policy to each component
fn target_path(path: &Path, options: &SendOptions) -> Result<PathBuf, SendError> {
    let Some(root) = &options.root else {
        return Ok(path.to_path_buf());
    };

    let mut target = root.clone();
    for component in path.components() {
        match component {
            Component::Normal(name) => {
                if is_dotfile(name) {
                    match options.dotfiles {
                        Dotfiles::Allow => {}
                        Dotfiles::Deny => return Err(SendError::Forbidden(path.to_path_buf())),
                        Dotfiles::Ignore => return Err(SendError::NotFound(path.to_path_buf())),
                    }
                }
                target.push(name);
            }
            // no escaping the root
            Component::ParentDir => return Err(SendError::Forbidden(path.to_path_buf())),
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    Ok(target)
}

fn is_dotfile(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|n| n.starts_with('.') && n.len() > 1)
}

/// Find the file to serve: extensions, index files
async fn resolve(path: &Path, options: &SendOptions) -> Result<(PathBuf, Metadata), SendError> {
    match fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => resolve_index(path, options).await,
        Ok(metadata) => Ok((path.to_path_buf(), metadata)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => resolve_extensions(path, options).await,
        Err(e) => Err(io_error(path, e)),
    }
}

async fn resolve_extensions(
    path: &Path,
    options: &SendOptions,
) -> Result<(PathBuf, Metadata), SendError> {
    let has_trailing_slash = path.as_os_str().to_string_lossy().ends_with('/');
    if !has_trailing_slash {
        for extension in &options.extensions {
            let mut candidate = OsString::from(path.as_os_str());
            candidate.push(".");
            candidate.push(extension.trim_start_matches('.'));
            let candidate = PathBuf::from(candidate);

            if let Ok(metadata) = fs::metadata(&candidate).await {
                if metadata.is_file() {
                    return Ok((candidate, metadata));
                }
            }
        }
    }
    Err(SendError::NotFound(path.to_path_buf()))
}

async fn resolve_index(path: &Path, options: &SendOptions) -> Result<(PathBuf, Metadata), SendError> {
    for index in &options.index {
        let candidate = path.join(index);
        if let Ok(metadata) = fs::metadata(&candidate).await {
            if metadata.is_file() {
                return Ok((candidate, metadata));
            }
        }
    }
    Err(SendError::Directory(path.to_path_buf()))
}

/// Fill in the headers the hooks left unset
fn set_default_headers(headers: &mut HeaderMap, path: &Path, metadata: &Metadata, options: &SendOptions) {
    if options.accept_ranges && !headers.contains_key(ACCEPT_RANGES) {
        headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    }

    if options.cache_control && !headers.contains_key(CACHE_CONTROL) {
        insert_header(
            headers,
            CACHE_CONTROL,
            &cache::cache_control(options.max_age, options.immutable),
        );
    }

    if options.last_modified && !headers.contains_key(LAST_MODIFIED) {
        if let Some(modified) = cache::last_modified(metadata) {
            insert_header(headers, LAST_MODIFIED, &modified);
        }
    }

    if options.etag && !headers.contains_key(ETAG) {
        insert_header(headers, ETAG, &cache::generate_etag(metadata));
    }

    if !headers.contains_key(CONTENT_TYPE) {
        insert_header(headers, CONTENT_TYPE, &mime::content_type(path));
    }
}

/// 304 response: cache validators stay, content headers go
fn not_modified(mut headers: HeaderMap) -> Response<Body> {
    let content_headers: Vec<_> = headers
        .keys()
        .filter(|name| name.as_str().starts_with("content-") && **name != CONTENT_LOCATION)
        .cloned()
        .collect();
    for name in content_headers {
        headers.remove(name);
    }

    let mut response = Response::new(response::empty());
    *response.status_mut() = StatusCode::NOT_MODIFIED;
    *response.headers_mut() = headers;
    response
}

fn insert_header(headers: &mut HeaderMap, name: hyper::header::HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

fn io_error(path: &Path, source: io::Error) -> SendError {
    match source.kind() {
        io::ErrorKind::NotFound => SendError::NotFound(path.to_path_buf()),
        io::ErrorKind::NotADirectory | io::ErrorKind::InvalidFilename => SendError::InvalidPath {
            path: path.to_path_buf(),
            source,
        },
        _ => SendError::Io {
            path: path.to_path_buf(),
            source,
        },
    }
}
