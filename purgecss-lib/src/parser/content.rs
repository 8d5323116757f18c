use crate::error::PurgeError;
use crate::parser::html::extract_html_tokens;
use crate::parser::token_set::ExtractedTokenSet;
use log::{debug, warn};
use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Word-ish runs, the classic purge extractor.
static WORD_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_-]+").expect("static regex"));

/// Longer runs that keep utility-class punctuation together (`sm:flex`, `w-1/2`).
static UTILITY_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_:/.%@!\[\]-]+").expect("static regex"));

/// How a content source should be tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialect {
    /// Markup, parsed with html5ever.
    Html,
    /// Anything else that is scanned as plain text.
    Text,
    /// A dialect nobody knows how to read. Extracts nothing.
    Unsupported(String),
}

impl Dialect {
    /// Map a file extension (without the dot) to a dialect.
    pub fn from_extension(ext: &str) -> Dialect {
        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" | "xhtml" => Dialect::Html,
            "js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" | "vue" | "svelte" | "txt" | "md"
            | "json" | "php" | "erb" | "hbs" | "liquid" | "njk" => Dialect::Text,
            other => Dialect::Unsupported(other.to_string()),
        }
    }

    pub fn from_path(path: &Path) -> Dialect {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => Dialect::from_extension(ext),
            None => Dialect::Unsupported(String::new()),
        }
    }
}

/// Raw content plus the dialect it is written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSource {
    text: String,
    dialect: Dialect,
}

impl ContentSource {
    pub fn new(text: impl Into<String>, dialect: Dialect) -> Self {
        ContentSource {
            text: text.into(),
            dialect,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self::new(text, Dialect::Html)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, Dialect::Text)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Read a file, picking the dialect from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PurgeError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PurgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(text, Dialect::from_path(path)))
    }

    /// Identifiers found in this source alone.
    pub fn tokens(&self) -> ExtractedTokenSet {
        match &self.dialect {
            Dialect::Html => {
                let mut tokens = extract_html_tokens(&self.text);
                tokens.merge(extract_text_tokens(&self.text));
                tokens
            }
            Dialect::Text => extract_text_tokens(&self.text),
            Dialect::Unsupported(name) => {
                warn!("unsupported content dialect `{}`, no tokens extracted", name);
                ExtractedTokenSet::new()
            }
        }
    }
}

/// Scan plain text for anything that looks like an identifier.
pub fn extract_text_tokens(text: &str) -> ExtractedTokenSet {
    let mut tokens = ExtractedTokenSet::new();
    for m in WORD_TOKENS.find_iter(text) {
        tokens.insert_undetermined(m.as_str());
    }
    for m in UTILITY_TOKENS.find_iter(text) {
        let token = m.as_str().trim_end_matches(['.', ':', '!']);
        tokens.insert_undetermined(token);
    }
    tokens
}

/// Union of the identifiers found in every source.
pub fn extract_tokens(sources: &[ContentSource]) -> ExtractedTokenSet {
    let mut tokens = ExtractedTokenSet::new();
    for source in sources {
        tokens.merge(source.tokens());
    }
    debug!(
        "extracted {} tokens from {} content source(s)",
        tokens.len(),
        sources.len()
    );
    tokens
}

/// Read every path in parallel. Order of the result follows `paths`.
pub fn load_content_sources(paths: &[PathBuf]) -> Result<Vec<ContentSource>, PurgeError> {
    paths.par_iter().map(ContentSource::from_path).collect()
}
