//! HTTP response building module
//!
//! Builders for the status codes the dev server emits. Cache-busting headers
//! are not set here; [`apply_common_headers`] adds them to every response on
//! its way out.

use super::cache;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};

pub type HttpResponse = Response<Full<Bytes>>;

/// Build 200 response for a whole file
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    last_modified: Option<&str>,
    is_head: bool,
) -> HttpResponse {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, content_length)
        .header(header::ACCEPT_RANGES, "bytes");
    if let Some(modified) = last_modified {
        builder = builder.header(header::LAST_MODIFIED, modified);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 206 Partial Content response; `data` holds only the requested span
pub fn build_partial_response(
    data: Bytes,
    content_type: &str,
    (start, end): (u64, u64),
    total_size: u64,
    is_head: bool,
) -> HttpResponse {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, content_length)
        .header(header::CONTENT_RANGE, format!("bytes {start}-{end}/{total_size}"))
        .header(header::ACCEPT_RANGES, "bytes")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> HttpResponse {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .header(header::CONTENT_LENGTH, content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 301 redirect, used to add the trailing slash to directory URLs
pub fn build_moved_permanently(location: &str) -> HttpResponse {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(header::LOCATION, location)
        .header(header::CONTENT_LENGTH, 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(last_modified: Option<&str>) -> HttpResponse {
    let mut builder = Response::builder().status(StatusCode::NOT_MODIFIED);
    if let Some(modified) = last_modified {
        builder = builder.header(header::LAST_MODIFIED, modified);
    }
    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("304", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 404 Not Found response
pub fn build_404_response(is_head: bool) -> HttpResponse {
    build_plain_error(StatusCode::NOT_FOUND, "404 Not Found", is_head)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> HttpResponse {
    let mut response =
        build_plain_error(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed", false);
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
    response
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> HttpResponse {
    let mut response = build_plain_error(
        StatusCode::RANGE_NOT_SATISFIABLE,
        "416 Range Not Satisfiable",
        false,
    );
    if let Ok(value) = HeaderValue::from_str(&format!("bytes */{file_size}")) {
        response.headers_mut().insert(header::CONTENT_RANGE, value);
    }
    response
}

fn build_plain_error(status: StatusCode, message: &'static str, is_head: bool) -> HttpResponse {
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from_static(message.as_bytes())
    };

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CONTENT_LENGTH, message.len())
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            let mut fallback = Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = status;
            fallback
        })
}

/// Attach the headers every response carries: cache busting and `Server`
pub fn apply_common_headers(response: &mut HttpResponse, server_name: &str) {
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache::NO_CACHE));
    headers.insert(header::PRAGMA, HeaderValue::from_static(cache::PRAGMA));
    headers.insert(header::EXPIRES, HeaderValue::from_static(cache::EXPIRES));
    if let Ok(value) = HeaderValue::from_str(server_name) {
        headers.insert(header::SERVER, value);
    }
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
