//! Static file serving module
//!
//! Turns a resolved filesystem path into a response: files, directory index
//! files, directory listings, or 404.

use super::listing;
use crate::config::HttpConfig;
use crate::http::{self, cache, mime, response, HttpResponse, RangeOutcome};
use crate::logger;
use hyper::body::Bytes;
use std::fs::Metadata;
use std::path::Path;
use tokio::fs;

/// Request details needed while serving
pub struct RequestContext<'a> {
    /// Request path as sent by the client (still percent-encoded)
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_modified_since: Option<&'a str>,
    pub range: Option<&'a str>,
}

/// Serve whatever `resolved` points at
pub async fn serve_path(
    ctx: &RequestContext<'_>,
    resolved: &Path,
    root: &Path,
    http_config: &HttpConfig,
) -> HttpResponse {
    let Ok(metadata) = fs::metadata(resolved).await else {
        return http::build_404_response(ctx.is_head);
    };

    if !metadata.is_dir() {
        return serve_file(ctx, resolved, root, &metadata).await;
    }

    // Relative links in the page only work once the URL ends with a slash
    // Leading slashes collapse to one so `//host` never becomes a network path
    if !ctx.path.ends_with('/') {
        let path = ctx.path.trim_start_matches(['/', '\\']);
        let location = match ctx.query {
            Some(query) => format!("/{path}/?{query}"),
            None => format!("/{path}/"),
        };
        return http::build_moved_permanently(&location);
    }

    for index_file in &http_config.index_files {
        let index_path = resolved.join(index_file);
        if let Ok(index_meta) = fs::metadata(&index_path).await {
            if index_meta.is_file() {
                return serve_file(ctx, &index_path, root, &index_meta).await;
            }
        }
    }

    if http_config.directory_listing && is_within_root(root, resolved).await {
        if let Some(html) = listing::render(resolved, ctx.path).await {
            return response::build_html_response(html, ctx.is_head);
        }
    }

    http::build_404_response(ctx.is_head)
}

async fn serve_file(
    ctx: &RequestContext<'_>,
    file_path: &Path,
    root: &Path,
    metadata: &Metadata,
) -> HttpResponse {
    if !is_within_root(root, file_path).await {
        return http::build_404_response(ctx.is_head);
    }

    let modified = metadata.modified().ok();
    let last_modified = modified.map(cache::format_http_date);
    if let Some(modified) = modified {
        if cache::not_modified_since(ctx.if_modified_since, modified) {
            return http::build_304_response(last_modified.as_deref());
        }
    }

    let data = match fs::read(file_path).await {
        Ok(data) => Bytes::from(data),
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path.display()
            ));
            return http::build_404_response(ctx.is_head);
        }
    };

    let content_type = mime::content_type_for(file_path);
    let total_size = u64::try_from(data.len()).unwrap_or(u64::MAX);

    match http::parse_range(ctx.range, total_size) {
        RangeOutcome::Full => {
            response::build_file_response(data, content_type, last_modified.as_deref(), ctx.is_head)
        }
        RangeOutcome::Partial { start, end } => {
            let (Ok(first), Ok(last)) = (usize::try_from(start), usize::try_from(end)) else {
                return http::build_416_response(total_size);
            };
            response::build_partial_response(
                data.slice(first..=last),
                content_type,
                (start, end),
                total_size,
                ctx.is_head,
            )
        }
        RangeOutcome::Unsatisfiable => http::build_416_response(total_size),
    }
}

/// Security: the canonical target must stay under the canonical root
async fn is_within_root(root: &Path, target: &Path) -> bool {
    let Ok(root_canonical) = fs::canonicalize(root).await else {
        logger::log_warning(&format!(
            "Document root not found or inaccessible: {}",
            root.display()
        ));
        return false;
    };
    let Ok(target_canonical) = fs::canonicalize(target).await else {
        return false;
    };

    if target_canonical.starts_with(&root_canonical) {
        true
    } else {
        logger::log_warning(&format!(
            "Path outside document root blocked: {}",
            target_canonical.display()
        ));
        false
    }
}
