//! Request handler module
//!
//! Serves one request: method check, path resolution through the injected
//! [`PathResolver`], file or directory response, cache-busting headers, and an
//! access log entry handed to the injected [`RequestLogger`].

mod listing;
pub mod static_files;

use crate::config::HttpConfig;
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry, LogFormat};
use crate::resolver::PathResolver;
use hyper::body::Body;
use hyper::header::{self, HeaderMap};
use hyper::{Method, Request, Version};
use static_files::RequestContext;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Receives one entry per handled request
pub trait RequestLogger: Send + Sync {
    fn on_request_logged(&self, entry: &AccessLogEntry);
}

impl<T: RequestLogger + ?Sized> RequestLogger for Arc<T> {
    fn on_request_logged(&self, entry: &AccessLogEntry) {
        (**self).on_request_logged(entry);
    }
}

impl<T: PathResolver + ?Sized> PathResolver for Arc<T> {
    fn resolve(&self, request_path: &str) -> std::path::PathBuf {
        (**self).resolve(request_path)
    }

    fn root(&self) -> &std::path::Path {
        (**self).root()
    }
}

/// Default [`RequestLogger`]: one line per request through the logger module
#[derive(Debug, Clone, Copy)]
pub struct AccessLog {
    format: LogFormat,
    enabled: bool,
}

impl AccessLog {
    pub const fn new(format: LogFormat) -> Self {
        Self {
            format,
            enabled: true,
        }
    }

    pub const fn disabled() -> Self {
        Self {
            format: LogFormat::Dev,
            enabled: false,
        }
    }
}

impl RequestLogger for AccessLog {
    fn on_request_logged(&self, entry: &AccessLogEntry) {
        if self.enabled {
            logger::log_access(entry, self.format);
        }
    }
}

/// Static file service shared by every connection of a server
pub struct StaticService<R, L> {
    resolver: R,
    request_logger: L,
    http: HttpConfig,
}

impl<R: PathResolver, L: RequestLogger> StaticService<R, L> {
    pub const fn new(resolver: R, request_logger: L, http: HttpConfig) -> Self {
        Self {
            resolver,
            request_logger,
            http,
        }
    }

    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Handle a request. Never fails: problems become HTTP status codes.
    pub async fn handle<B>(&self, req: Request<B>, peer_addr: SocketAddr) -> HttpResponse {
        let started = Instant::now();
        let mut entry = AccessLogEntry::new(
            peer_addr.to_string(),
            req.method().to_string(),
            req.uri().to_string(),
        );
        entry.http_version = version_label(req.version()).to_string();
        entry.referer = header_string(req.headers(), &header::REFERER);
        entry.user_agent = header_string(req.headers(), &header::USER_AGENT);

        let mut response = self.respond(&req).await;
        http::apply_common_headers(&mut response, &self.http.server_name);

        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.request_logger.on_request_logged(&entry);

        response
    }

    async fn respond<B>(&self, req: &Request<B>) -> HttpResponse {
        let method = req.method();
        if method != Method::GET && method != Method::HEAD {
            logger::log_warning(&format!("Method not allowed: {method}"));
            return http::build_405_response();
        }

        let ctx = RequestContext {
            path: req.uri().path(),
            query: req.uri().query(),
            is_head: method == Method::HEAD,
            if_modified_since: header_str(req.headers(), &header::IF_MODIFIED_SINCE),
            range: header_str(req.headers(), &header::RANGE),
        };

        let resolved = self.resolver.resolve(ctx.path);
        static_files::serve_path(&ctx, &resolved, self.resolver.root(), &self.http).await
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn header_string(headers: &HeaderMap, name: &header::HeaderName) -> Option<String> {
    header_str(headers, name).map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
