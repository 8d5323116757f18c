use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to callers of the purge front-ends.
///
/// Malformed content and unclassifiable selectors are never errors; they
/// degrade to "no tokens" and "selector used" respectively.
#[derive(Debug, Error)]
pub enum PurgeError {
    /// The stylesheet text is not valid CSS.
    #[error("failed to parse stylesheet: {message}{}", Location(.line, .column))]
    StylesheetParse {
        message: String,
        line: Option<u32>,
        column: Option<u32>,
    },
    /// lightningcss could not print the filtered stylesheet.
    #[error("failed to serialize stylesheet: {0}")]
    Serialize(String),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid safelist pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("no <style> element found in html document")]
    MissingStyleElement,
    /// One or more pages of a site purge failed.
    #[error("failed to purge {} page(s): {}", .0.len(), PageList(.0))]
    Pages(Vec<(String, PurgeError)>),
}

struct Location<'a>(&'a Option<u32>, &'a Option<u32>);

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (*self.0, *self.1) {
            (Some(line), Some(column)) => write!(f, " at line {}, column {}", line, column),
            (Some(line), None) => write!(f, " at line {}", line),
            _ => Ok(()),
        }
    }
}

struct PageList<'a>(&'a [(String, PurgeError)]);

impl fmt::Display for PageList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (page, err)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", page, err)?;
        }
        Ok(())
    }
}
