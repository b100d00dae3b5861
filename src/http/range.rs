//! HTTP Range request parsing module
//!
//! Single `bytes=` ranges only; multi-range and other units fall back to the
//! full body.

/// What to send for a request given its Range header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No usable Range header, send the whole file
    Full,
    /// Inclusive byte span to send with 206
    Partial { start: u64, end: u64 },
    /// Range lies outside the file, answer 416
    Unsatisfiable,
}

/// Parse a Range header against a file of `file_size` bytes
///
/// Supported forms: `bytes=start-end`, `bytes=start-`, `bytes=-suffix`.
///
/// # Examples
/// ```
/// use verify_devserver::http::range::{parse_range, RangeOutcome};
///
/// assert_eq!(parse_range(Some("bytes=0-99"), 1000), RangeOutcome::Partial { start: 0, end: 99 });
/// assert_eq!(parse_range(None, 1000), RangeOutcome::Full);
/// assert_eq!(parse_range(Some("bytes=2000-"), 1000), RangeOutcome::Unsatisfiable);
/// ```
pub fn parse_range(range_header: Option<&str>, file_size: u64) -> RangeOutcome {
    let Some(spec) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeOutcome::Full;
    };
    if spec.contains(',') {
        return RangeOutcome::Full;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return RangeOutcome::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        // Suffix form: the final N bytes
        let Ok(suffix) = last.parse::<u64>() else {
            return RangeOutcome::Full;
        };
        if suffix == 0 || file_size == 0 {
            return RangeOutcome::Unsatisfiable;
        }
        return RangeOutcome::Partial {
            start: file_size.saturating_sub(suffix),
            end: file_size - 1,
        };
    }

    let Ok(start) = first.parse::<u64>() else {
        return RangeOutcome::Full;
    };
    if start >= file_size {
        return RangeOutcome::Unsatisfiable;
    }

    let end = if last.is_empty() {
        file_size - 1
    } else {
        match last.parse::<u64>() {
            Ok(end) if end < start => return RangeOutcome::Full,
            Ok(end) => end.min(file_size - 1),
            Err(_) => return RangeOutcome::Full,
        }
    };

    RangeOutcome::Partial { start, end }
}
