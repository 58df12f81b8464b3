//! HTTP response building module
//!
//! Body constructors and builders for the responses the host produces itself.

use crate::error::{Error, SendError};
use futures_util::TryStreamExt;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::header::{CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Response body used across the crate
pub type Body = BoxBody<Bytes, std::io::Error>;

/// Body with no bytes
pub fn empty() -> Body {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

/// Body from an in-memory buffer
pub fn full(data: impl Into<Bytes>) -> Body {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Body streamed from an async reader, chunk by chunk
pub fn stream<R>(reader: R) -> Body
where
    R: AsyncRead + Send + Sync + 'static,
{
    StreamBody::new(ReaderStream::new(reader).map_ok(Frame::data)).boxed()
}

/// Build a plain-text response for a status code
fn build_text_response(status: StatusCode, text: &str) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, text.len())
        .body(full(text.to_owned()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(empty())
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Body> {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> Response<Body> {
    let mut response = build_text_response(StatusCode::RANGE_NOT_SATISFIABLE, "Range Not Satisfiable");
    if let Ok(value) = format!("bytes */{file_size}").parse() {
        response.headers_mut().insert(CONTENT_RANGE, value);
    }
    response
}

/// Build the response for an error a middleware propagated
pub fn build_error_response(error: &Error) -> Response<Body> {
    if let Error::Send(SendError::RangeNotSatisfiable { size }) = error {
        return build_416_response(*size);
    }

    let status = error.status();
    let text = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    build_text_response(status, &text)
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    async fn body_bytes(body: Body) -> Bytes {
        body.collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_404() {
        let response = build_404_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_LENGTH], "13");
        assert_eq!(body_bytes(response.into_body()).await, "404 Not Found");
    }

    #[tokio::test]
    async fn test_error_response() {
        let error = Error::from(SendError::Io {
            path: PathBuf::from("/secret"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        });
        let response = build_error_response(&error);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_bytes(response.into_body()).await,
            "500 Internal Server Error"
        );

        let response = build_error_response(&Error::from(SendError::RangeNotSatisfiable { size: 42 }));
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[CONTENT_RANGE], "bytes */42");
    }

    #[tokio::test]
    async fn test_stream_body() {
        let reader = std::io::Cursor::new(b"streamed bytes".to_vec());
        assert_eq!(body_bytes(stream(reader)).await, "streamed bytes");
        assert!(body_bytes(empty()).await.is_empty());
    }
}
