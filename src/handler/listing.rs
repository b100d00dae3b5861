//! Directory listing page for folders without an index file

use crate::logger;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt::Write as _;
use std::path::Path;
use tokio::fs;

/// Characters escaped in a single href path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'\'')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

struct Item {
    name: String,
    is_dir: bool,
    is_symlink: bool,
}

/// Render the listing page; `None` when the directory cannot be read
pub async fn render(dir: &Path, request_path: &str) -> Option<String> {
    let mut entries = fs::read_dir(dir).await.ok()?;
    let mut items = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                logger::log_warning(&format!(
                    "Skipping unreadable entry in {}: {e}",
                    dir.display()
                ));
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_symlink = entry
            .file_type()
            .await
            .is_ok_and(|file_type| file_type.is_symlink());
        // Follows symlinks, so a link to a folder is listed as one
        let is_dir = fs::metadata(entry.path())
            .await
            .is_ok_and(|meta| meta.is_dir());
        items.push(Item {
            name,
            is_dir,
            is_symlink,
        });
    }
    items.sort_by_cached_key(|item| item.name.to_lowercase());

    let display_path = escape_html(&percent_decode_str(request_path).decode_utf8_lossy());
    let mut html = format!(
        "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Directory listing for {display_path}</title>\n</head>\n<body>\n\
         <h1>Directory listing for {display_path}</h1>\n<hr>\n<ul>\n"
    );
    for item in &items {
        let mut href = utf8_percent_encode(&item.name, SEGMENT).to_string();
        let mut label = item.name.clone();
        if item.is_dir {
            href.push('/');
            label.push('/');
        }
        if item.is_symlink {
            label.push('@');
        }
        let _ = writeln!(html, "<li><a href=\"{href}\">{}</a></li>", escape_html(&label));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");

    Some(html)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
