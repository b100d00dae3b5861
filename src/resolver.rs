//! Request path resolution
//!
//! Maps URL paths onto the document root. When the exact file is missing, the
//! final path segment is matched against its siblings ignoring letter case, so
//! links authored on a case-insensitive filesystem keep working when the site
//! is served from a case-sensitive one.

use percent_encoding::percent_decode_str;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Translates a request path into a filesystem path
pub trait PathResolver: Send + Sync {
    /// Resolve `request_path` (e.g. `/hfestJ/style.css`) to a filesystem path.
    ///
    /// The returned path is not guaranteed to exist.
    fn resolve(&self, request_path: &str) -> PathBuf;

    /// Directory every resolved path lives under
    fn root(&self) -> &Path;
}

/// Resolver with a case-insensitive fallback on the last path segment
#[derive(Debug, Clone)]
pub struct CaseInsensitiveResolver {
    root: PathBuf,
}

impl CaseInsensitiveResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PathResolver for CaseInsensitiveResolver {
    fn resolve(&self, request_path: &str) -> PathBuf {
        let candidate = join_normalized(&self.root, request_path);

        // Common case: a single existence check, no listing
        if candidate.exists() {
            return candidate;
        }

        case_insensitive_match(&candidate).unwrap_or(candidate)
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

/// Join a URL path onto `root`, dropping anything that could climb out of it.
///
/// Query and fragment are stripped and percent-escapes decoded. Only plain
/// file names are pushed: empty, `.`, `..`, drive prefixes such as `C:`, and
/// words holding a backslash or NUL are skipped. A trailing slash on the
/// request survives on the result.
pub fn join_normalized(root: &Path, request_path: &str) -> PathBuf {
    let path = request_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let trailing_slash = decoded.ends_with('/');

    let mut joined = root.to_path_buf();
    for word in decoded.split('/') {
        if is_plain_name(word) {
            joined.push(word);
        }
    }

    if trailing_slash && joined != root {
        joined.as_mut_os_string().push("/");
    }
    joined
}

/// True when pushing `word` appends exactly one normal component
fn is_plain_name(word: &str) -> bool {
    if word.contains(['\\', '\0']) {
        return false;
    }
    let mut components = Path::new(word).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Look for a sibling of `candidate` whose name matches its final component
/// ignoring case. When several entries match, the smallest name wins so the
/// answer does not depend on directory enumeration order.
fn case_insensitive_match(candidate: &Path) -> Option<PathBuf> {
    let wanted = candidate.file_name()?.to_str()?.to_lowercase();
    let parent = candidate.parent()?;

    // Listing failures mean "no match", never an error
    let entries = fs::read_dir(parent).ok()?;
    let found = entries
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.to_lowercase() == wanted)
        .min()?;

    let mut resolved = parent.join(found);
    if candidate.as_os_str().to_string_lossy().ends_with('/') {
        resolved.as_mut_os_string().push("/");
    }
    Some(resolved)
}
