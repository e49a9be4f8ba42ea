//! Heuristic source-language detection for editor panes.
//!
//! A file name with a known extension decides the language outright.
//! Otherwise the text is scored against an ordered list of weighted regex
//! signals and the best-scoring language wins.
//!
//! ```
//! let detection = codelang_detect::detect("fn main() -> i32 { let mut x = 5; x }", None);
//! assert_eq!(detection.language, "rust");
//! assert_eq!(detection.name, "Rust");
//! ```

pub mod classifier;
pub mod config;
pub mod detector;
pub mod error;
pub mod lang;
pub mod routes;
pub mod server;
pub mod signals;
pub mod state;

pub use detector::{classify, detect, resolve, CatalogOverlay, Detection, Detector};
pub use error::DetectError;
pub use lang::{Catalog, LanguageEntry};
pub use signals::{Signal, SignalSpec};
