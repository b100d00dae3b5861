//! Local development server for the certificate verification site.
//!
//! Serves a document root over HTTP with a case-insensitive fallback for the
//! last path segment and cache-busting headers on every response.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod resolver;
pub mod server;

pub use crate::config::{Config, Overrides};
pub use error::ServerError;
pub use handler::{AccessLog, RequestLogger, StaticService};
pub use logger::{AccessLogEntry, LogFormat};
pub use resolver::{CaseInsensitiveResolver, PathResolver};
pub use server::DevServer;
