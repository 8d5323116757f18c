//! Parse / serialize glue around LightningCSS, plus helpers that copy the
//! parts of a rule the usage policy needs into owned strings.

use crate::error::PurgeError;
use lightningcss::error::{Error as LcssError, ParserError};
use lightningcss::printer::PrinterOptions;
use lightningcss::rules::font_face::{FontFaceProperty, FontFaceRule};
use lightningcss::rules::keyframes::KeyframesRule;
use lightningcss::rules::style::StyleRule;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use lightningcss::traits::ToCss;

/// One declaration of a style rule, e.g. `animation` => `spin 1s`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedDeclaration {
    pub property: String,
    pub value: String,
}

/// Parse a raw CSS string with LightningCSS.
///
/// Unbalanced braces are rejected up front: the parser itself closes any
/// block left open at end of input without complaint.
pub fn parse_stylesheet(css_text: &str) -> Result<StyleSheet<'_, 'static>, PurgeError> {
    check_balanced(css_text)?;
    StyleSheet::parse(css_text, ParserOptions::default()).map_err(
        |e: LcssError<ParserError<'_>>| PurgeError::StylesheetParse {
            message: e.kind.to_string(),
            line: e.loc.as_ref().map(|loc| loc.line + 1),
            column: e.loc.as_ref().map(|loc| loc.column),
        },
    )
}

/// Print a stylesheet back to text.
pub fn serialize_stylesheet(sheet: &StyleSheet<'_, '_>, minify: bool) -> Result<String, PurgeError> {
    let printer_opts = PrinterOptions {
        minify,
        ..PrinterOptions::default()
    };
    sheet
        .to_css(printer_opts)
        .map(|res| res.code)
        .map_err(|e| PurgeError::Serialize(e.to_string()))
}

/// Fail on a `}` without an opener or a `{` that is never closed. Strings,
/// comments and escapes are skipped.
pub fn check_balanced(css_text: &str) -> Result<(), PurgeError> {
    let mut open: Vec<(u32, u32)> = Vec::new();
    let mut chars = css_text.chars().peekable();
    let (mut line, mut column) = (1u32, 0u32);
    let mut quote: Option<char> = None;
    let mut in_comment = false;

    while let Some(ch) = chars.next() {
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }

        if in_comment {
            if ch == '*' && chars.peek() == Some(&'/') {
                chars.next();
                column += 1;
                in_comment = false;
            }
            continue;
        }
        match (quote, ch) {
            (_, '\\') => {
                if let Some(next) = chars.next() {
                    if next == '\n' {
                        line += 1;
                        column = 0;
                    } else {
                        column += 1;
                    }
                }
            }
            (Some(q), c) if c == q => quote = None,
            // An unescaped newline ends a string (it is a bad-string token).
            (Some(_), '\n') => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '/') if chars.peek() == Some(&'*') => {
                chars.next();
                column += 1;
                in_comment = true;
            }
            (None, '{') => open.push((line, column)),
            (None, '}') => {
                if open.pop().is_none() {
                    return Err(PurgeError::StylesheetParse {
                        message: "unexpected `}`".to_string(),
                        line: Some(line),
                        column: Some(column),
                    });
                }
            }
            _ => {}
        }
    }

    match open.pop() {
        Some((line, column)) => Err(PurgeError::StylesheetParse {
            message: "unclosed `{`".to_string(),
            line: Some(line),
            column: Some(column),
        }),
        None => Ok(()),
    }
}

/// Each alternative of a rule's selector list, as text.
pub fn selector_strings(style_rule: &StyleRule<'_>) -> Vec<String> {
    let mut selectors_vec = Vec::new();
    for selector in &style_rule.selectors.0 {
        if let Ok(sel_str) = selector.to_css_string(PrinterOptions::default()) {
            selectors_vec.push(sel_str);
        }
    }
    selectors_vec
}

/// Normal and `!important` declarations of a rule, in that order.
pub fn declarations(style_rule: &StyleRule<'_>) -> Vec<OwnedDeclaration> {
    let block = &style_rule.declarations;
    block
        .declarations
        .iter()
        .chain(block.important_declarations.iter())
        .filter_map(|property| {
            let value = property
                .value_to_css_string(PrinterOptions::default())
                .ok()?;
            Some(OwnedDeclaration {
                property: property.property_id().name().to_string(),
                value,
            })
        })
        .collect()
}

pub fn keyframes_name(rule: &KeyframesRule<'_>) -> Option<String> {
    rule.name
        .to_css_string(PrinterOptions::default())
        .ok()
        .map(|name| unquote(&name).to_string())
}

/// Family names declared by a `@font-face` block.
pub fn font_face_families(rule: &FontFaceRule<'_>) -> Vec<String> {
    rule.properties
        .iter()
        .filter_map(|property| match property {
            FontFaceProperty::FontFamily(family) => {
                family.to_css_string(PrinterOptions::default()).ok()
            }
            _ => None,
        })
        .map(|family| unquote(&family).to_string())
        .collect()
}

pub fn unquote(value: &str) -> &str {
    let value = value.trim();
    for q in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(q).and_then(|v| v.strip_suffix(q)) {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightningcss::rules::CssRule;

    #[test]
    fn test_unclosed_block_is_a_parse_error() {
        let err = check_balanced(".a{color:red}\n.b{color:blue").unwrap_err();
        match err {
            PurgeError::StylesheetParse { line, column, .. } => {
                assert_eq!(line, Some(2));
                assert_eq!(column, Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_stray_closing_brace_is_a_parse_error() {
        assert!(parse_stylesheet(".a{color:red}}").is_err());
    }

    #[test]
    fn test_braces_in_strings_and_comments_are_ignored() {
        check_balanced(r#".a::before{content:"{"} /* } */ .b{content:'\}'}"#).unwrap();
    }

    #[test]
    fn test_selectors_and_declarations_are_copied() {
        let sheet = parse_stylesheet(".a, .b:hover { animation: spin 1s; color: red !important }").unwrap();
        let CssRule::Style(rule) = &sheet.rules.0[0] else {
            panic!("expected a style rule");
        };
        assert_eq!(selector_strings(rule), vec![".a", ".b:hover"]);
        let props: Vec<_> = declarations(rule).into_iter().map(|d| d.property).collect();
        assert_eq!(props, vec!["animation", "color"]);
    }

    #[test]
    fn test_font_face_and_keyframes_names() {
        let sheet = parse_stylesheet(
            r#"@font-face { font-family: "Open Sans"; src: url(a.woff2) } @keyframes spin { to { opacity: 0 } }"#,
        )
        .unwrap();
        match &sheet.rules.0[0] {
            CssRule::FontFace(rule) => assert_eq!(font_face_families(rule), vec!["Open Sans"]),
            _ => panic!("expected @font-face"),
        }
        match &sheet.rules.0[1] {
            CssRule::Keyframes(rule) => assert_eq!(keyframes_name(rule).as_deref(), Some("spin")),
            _ => panic!("expected @keyframes"),
        }
    }

    #[test]
    fn test_serialize_minified() {
        let sheet = parse_stylesheet(".box { color: red }").unwrap();
        assert_eq!(serialize_stylesheet(&sheet, true).unwrap(), ".box{color:red}");
    }
}
