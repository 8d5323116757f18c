use crate::error::PurgeError;
use crate::options::PurgeOptions;
use crate::parser::content::{extract_tokens, ContentSource};
use crate::parser::html::first_style_text;
use crate::parser::token_set::ExtractedTokenSet;
use crate::style::filter::filter_stylesheet;
use crate::style::stylesheet::{parse_stylesheet, serialize_stylesheet};
use log::info;
use rayon::prelude::*;
use regex::Regex;
use std::sync::LazyLock;

/// `<style>` elements in raw markup. Comments and raw text elements are
/// matched too so that a `<style>` written inside them is stepped over.
static STYLE_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    let mut pattern = String::from(r"(?is)<!--.*?(?:-->|\z)");
    for tag in ["script", "noscript", "textarea", "title", "xmp", "iframe", "noembed", "noframes"] {
        pattern.push_str(&format!(r"|<{tag}\b[^>]*>.*?(?:</{tag}\s*>|\z)"));
    }
    pattern.push_str(r"|<style\b[^>]*>(?P<css>.*?)</style\s*>");
    Regex::new(&pattern).expect("static regex")
});

/// Result of purging one stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgedStylesheet {
    pub css: String,
    /// Selectors and at-rules that were removed.
    pub rejected: Vec<String>,
}

impl PurgedStylesheet {
    pub fn is_empty(&self) -> bool {
        self.css.trim().is_empty()
    }
}

/// Purge each stylesheet against the union of `sources`.
///
/// With no content at all every stylesheet is validated and handed back
/// untouched; with no stylesheets the result is empty.
pub fn purge(
    sources: &[ContentSource],
    stylesheets: &[&str],
    options: &PurgeOptions,
) -> Result<Vec<PurgedStylesheet>, PurgeError> {
    if sources.is_empty() {
        return stylesheets
            .iter()
            .map(|css| {
                parse_stylesheet(css)?;
                Ok(PurgedStylesheet {
                    css: css.to_string(),
                    rejected: Vec::new(),
                })
            })
            .collect();
    }

    let mut tokens = extract_tokens(sources);
    for name in &options.safelist {
        tokens.insert_undetermined(name);
    }
    stylesheets
        .iter()
        .map(|css| purge_with_tokens(css, &tokens, options))
        .collect()
}

/// Parse, filter and print one stylesheet against an existing token set.
pub fn purge_with_tokens(
    css_text: &str,
    tokens: &ExtractedTokenSet,
    options: &PurgeOptions,
) -> Result<PurgedStylesheet, PurgeError> {
    let mut sheet = parse_stylesheet(css_text)?;
    let before = sheet.rules.0.len();
    let report = filter_stylesheet(&mut sheet, tokens, options);
    let css = serialize_stylesheet(&sheet, options.minify)?;
    info!(
        "kept {} of {} top-level rules, removed {} selector(s)",
        sheet.rules.0.len(),
        before,
        report.rejected.len()
    );
    Ok(PurgedStylesheet {
        css,
        rejected: report.rejected,
    })
}

/// Purge one stylesheet separately for every page, in parallel.
///
/// Every failing page is reported, not just the first one. Results follow
/// the order of `pages`.
pub fn purge_site(
    css_text: &str,
    pages: &[(String, ContentSource)],
    options: &PurgeOptions,
) -> Result<Vec<(String, PurgedStylesheet)>, PurgeError> {
    let results: Vec<(String, Result<PurgedStylesheet, PurgeError>)> = pages
        .par_iter()
        .map(|(name, source)| {
            let purged = purge(std::slice::from_ref(source), &[css_text], options)
                .map(|mut sheets| sheets.pop().unwrap_or_default());
            (name.clone(), purged)
        })
        .collect();

    let mut purged = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for (name, result) in results {
        match result {
            Ok(sheet) => purged.push((name, sheet)),
            Err(e) => errors.push((name, e)),
        }
    }
    if errors.is_empty() {
        Ok(purged)
    } else {
        Err(PurgeError::Pages(errors))
    }
}

/// Purge the first `<style>` element of an HTML document against the rest
/// of the document, and splice the result back in.
pub fn purge_inline_style(html: &str, options: &PurgeOptions) -> Result<String, PurgeError> {
    let css_text = first_style_text(html).ok_or(PurgeError::MissingStyleElement)?;
    // html5ever folds CR LF into LF, so compare on that form.
    let inner = STYLE_ELEMENT
        .captures_iter(html)
        .filter_map(|caps| caps.name("css"))
        .find(|css| css.as_str().replace("\r\n", "\n").replace('\r', "\n") == css_text)
        .ok_or(PurgeError::MissingStyleElement)?;

    let mut without_css = String::with_capacity(html.len());
    without_css.push_str(&html[..inner.start()]);
    without_css.push_str(&html[inner.end()..]);

    let purged = purge(
        &[ContentSource::html(without_css)],
        &[inner.as_str()],
        options,
    )?
    .pop()
    .unwrap_or_default();

    let mut out = String::with_capacity(html.len());
    out.push_str(&html[..inner.start()]);
    if !purged.is_empty() {
        out.push('\n');
        out.push_str(purged.css.trim_end());
        out.push('\n');
    }
    out.push_str(&html[inner.end()..]);
    Ok(out)
}
