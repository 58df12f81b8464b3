//! Single static file middleware
//!
//! Serves one fixed file for every request routed to it, optionally as a
//! pre-compressed variant when the client accepts that content-coding.

use super::Middleware;
use crate::error::{Error, Result, SendError};
use crate::http::encoding::AcceptEncoding;
use crate::http::send::{self, Dotfiles, SendHooks, SendOptions};
use crate::http::{mime, Body};
use async_trait::async_trait;
use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE,
};
use hyper::{Request, Response};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Options of a [`StaticFile`]
///
/// Everything besides `encoded` and `headers` is handed to the streaming
/// primitive unchanged.
#[derive(Debug, Clone)]
pub struct StaticFileOptions {
    /// Content-coding the file on disk is stored in, e.g. `gzip`
    pub encoded: Option<String>,
    /// Extra response headers, applied in order
    pub headers: Vec<(String, String)>,
    pub etag: bool,
    pub last_modified: bool,
    pub max_age: Duration,
    pub extensions: Vec<String>,
    pub accept_ranges: bool,
    pub cache_control: bool,
    pub immutable: bool,
}

impl Default for StaticFileOptions {
    fn default() -> Self {
        let defaults = SendOptions::default();
        Self {
            encoded: None,
            headers: Vec::new(),
            etag: defaults.etag,
            last_modified: defaults.last_modified,
            max_age: defaults.max_age,
            extensions: defaults.extensions,
            accept_ranges: defaults.accept_ranges,
            cache_control: defaults.cache_control,
            immutable: defaults.immutable,
        }
    }
}

impl StaticFileOptions {
    /// Serve the file as stored in `coding`
    #[must_use]
    pub fn encoded(mut self, coding: impl Into<String>) -> Self {
        self.encoded = Some(coding.into());
        self
    }

    /// Append a response header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Content-coding of the stored file, kept both as token and header value
#[derive(Debug, Clone)]
struct Encoding {
    token: String,
    value: HeaderValue,
}

/// Middleware serving exactly one file
#[derive(Debug, Clone)]
pub struct StaticFile {
    path: PathBuf,
    encoding: Option<Encoding>,
    headers: Vec<(HeaderName, HeaderValue)>,
    send_options: SendOptions,
}

impl StaticFile {
    /// Create the middleware for `path`
    ///
    /// The file is not touched here; whether it exists is decided per request.
    /// Fails only when a header name/value or the encoding token is not valid
    /// in an HTTP header.
    pub fn new(path: impl Into<PathBuf>, options: StaticFileOptions) -> Result<Self> {
        let encoding = options
            .encoded
            .map(|token| {
                let value = parse_value(CONTENT_ENCODING.as_str(), &token)?;
                Ok::<_, Error>(Encoding { token, value })
            })
            .transpose()?;

        let headers = options
            .headers
            .iter()
            .map(|(name, value)| -> Result<(HeaderName, HeaderValue)> {
                let header_name =
                    HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidHeader {
                        name: name.clone(),
                        reason: e.to_string(),
                    })?;
                Ok((header_name, parse_value(name, value)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let send_options = SendOptions {
            accept_ranges: options.accept_ranges,
            cache_control: options.cache_control,
            etag: options.etag,
            last_modified: options.last_modified,
            immutable: options.immutable,
            max_age: options.max_age,
            extensions: options.extensions,
            index: Vec::new(),
            root: None,
            dotfiles: Dotfiles::Allow,
        };

        Ok(Self {
            path: path.into(),
            encoding,
            headers,
            send_options,
        })
    }

    /// Path of the served file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content-coding token, if the file is stored encoded
    pub fn encoded(&self) -> Option<&str> {
        self.encoding.as_ref().map(|e| e.token.as_str())
    }

    /// Whether the client behind `request` can decode the stored file
    fn is_acceptable(&self, request: &Request<()>) -> bool {
        let Some(encoding) = &self.encoding else {
            return true;
        };
        // repeated field lines form one list
        let lines: Vec<&str> = request
            .headers()
            .get_all(ACCEPT_ENCODING)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        let header = (!lines.is_empty()).then(|| lines.join(", "));
        AcceptEncoding::parse(header.as_deref()).accepts(&encoding.token)
    }
}

impl SendHooks for StaticFile {
    fn on_headers(&self, headers: &mut HeaderMap, path: &Path, _metadata: &Metadata) {
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }

        let Some(encoding) = &self.encoding else {
            return;
        };
        headers.insert(CONTENT_ENCODING, encoding.value.clone());

        // foo.css.gz -> foo.css
        if !headers.contains_key(CONTENT_TYPE) {
            let content_type = mime::content_type(mime::strip_encoding_suffix(path));
            if let Ok(value) = HeaderValue::from_str(&content_type) {
                headers.insert(CONTENT_TYPE, value);
            }
        }
    }
}

#[async_trait]
impl Middleware for StaticFile {
    async fn handle(&self, request: &Request<()>) -> Result<Option<Response<Body>>> {
        if !self.is_acceptable(request) {
            return Ok(None);
        }

        match send::send(request, &self.path, &self.send_options, self).await {
            Ok(response) => Ok(Some(response)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(SendError::Directory(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "static_file"
    }
}

fn parse_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
