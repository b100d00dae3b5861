//! Logger module
//!
//! Provides logging utilities for the dev server:
//! - Server lifecycle logging (banner, shutdown)
//! - Access logging in several formats
//! - Error and warning logging
//! - Optional file targets

mod format;
pub mod writer;

pub use format::{AccessLogEntry, LogFormat};

use crate::config::Config;
use chrono::Local;
use std::net::SocketAddr;
use std::path::Path;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

fn timestamp() -> String {
    Local::now().format("%d/%b/%Y %H:%M:%S").to_string()
}

pub fn log_info(message: &str) {
    write_info(message);
}

pub fn log_warning(message: &str) {
    write_error(&format!("[{}] [WARN] {message}", timestamp()));
}

pub fn log_error(message: &str) {
    write_error(&format!("[{}] [ERROR] {message}", timestamp()));
}

pub fn log_connection_error(peer_addr: &SocketAddr, err: &impl std::fmt::Display) {
    log_warning(&format!("Connection from {peer_addr} failed: {err}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: LogFormat) {
    write_info(&entry.format(format));
}

/// Startup banner with the test URL of every event folder
pub fn log_server_start(addr: &SocketAddr, root: &Path, events: &[String]) {
    let port = addr.port();
    write_info("============================================================");
    write_info("Local verification server started");
    write_info("============================================================");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Browse to:    http://localhost:{port}/"));
    write_info(&format!("Serving:      {}", root.display()));
    if !root.is_dir() {
        log_warning(&format!(
            "Document root {} does not exist; every request will 404",
            root.display()
        ));
    }
    if !events.is_empty() {
        write_info("");
        write_info("Test URLs for event folders:");
        for event in events {
            write_info(&format!("  - {event}: http://localhost:{port}/{event}/?id=<CODE>"));
        }
        write_info("");
        write_info("Replace <CODE> with an actual ID from data.json");
    }
    write_info("Press Ctrl+C to stop the server");
    write_info("============================================================");
}

pub fn log_server_stopped() {
    write_info("\nServer stopped.");
}
