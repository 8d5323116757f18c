//! Content-driven CSS reduction.
//!
//! Content sources are scanned for the identifiers they use, then every
//! stylesheet rule whose selectors cannot match any of them is dropped,
//! together with the `@keyframes` and `@font-face` blocks only those rules
//! referenced. CSS parsing and printing are delegated to LightningCSS and
//! HTML tokenizing to html5ever.

pub mod dom;
pub mod error;
pub mod options;
pub mod parser;
pub mod purge;
pub mod style;

pub use error::PurgeError;
pub use options::PurgeOptions;
pub use parser::content::{extract_tokens, load_content_sources, ContentSource, Dialect};
pub use parser::token_set::ExtractedTokenSet;
pub use purge::{purge, purge_inline_style, purge_site, purge_with_tokens, PurgedStylesheet};
pub use style::filter::{filter_stylesheet, FilterReport};
pub use style::selector::is_selector_used;
pub use style::stylesheet::{parse_stylesheet, serialize_stylesheet};
