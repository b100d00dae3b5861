//! HTTP protocol layer module
//!
//! Protocol helpers shared by the request handler: MIME detection, Range
//! parsing, HTTP dates and cache directives, and response builders.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range, RangeOutcome};
pub use response::{
    apply_common_headers, build_304_response, build_404_response, build_405_response,
    build_416_response, build_moved_permanently, HttpResponse,
};
