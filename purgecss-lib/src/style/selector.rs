use crate::parser::token_set::ExtractedTokenSet;
use log::debug;
use std::borrow::Cow;
use std::iter::Peekable;
use std::str::Chars;

/// ------------------------------
/// 1. Selector Decomposition
/// ------------------------------

/// Supported attribute selector operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr="value"]
    Exact,
    /// [attr~="value"]
    Includes,
    /// [attr|="value"]
    DashMatch,
    /// [attr^="value"]
    Prefix,
    /// [attr$="value"]
    Suffix,
    /// [attr*="value"]
    Substring,
}

/// Represents one attribute condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub operator: Option<AttributeOperator>, // None means only existence check
    pub value: Option<String>,
    /// Set by the `i` flag: values compare ASCII-case-insensitively.
    pub case_insensitive: bool,
}

/// The gating parts of one compound selector, e.g. `div.red#header[disabled]`.
/// Pseudo-classes, pseudo-elements and `*` never gate, so they are not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
    /// Selector-list arguments of `:is()`, `:where()`, `:has()` and friends.
    /// Each list needs at least one used alternative.
    pub alternatives: Vec<Vec<ComplexSelector>>,
}

/// A complex selector composed of a key compound selector and a list of ancestor parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub key: CompoundSelector,
    /// Ancestors with their combinators, in right-to-left order.
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Supported combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (a space).
    Descendant,
    /// Child combinator (`>`).
    Child,
    /// Adjacent sibling combinator (`+`).
    AdjacentSibling,
    /// General sibling combinator (`~`).
    GeneralSibling,
}

/// Pseudo-classes whose argument is a selector list that must match.
const GATING_PSEUDOS: &[&str] = &["is", "where", "matches", "-webkit-any", "-moz-any", "has"];

impl CompoundSelector {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.ids.is_empty()
            && self.classes.is_empty()
            && self.attributes.is_empty()
            && self.alternatives.is_empty()
    }
}

impl ComplexSelector {
    /// Compounds from left to right.
    pub fn compounds(&self) -> impl Iterator<Item = &CompoundSelector> {
        self.ancestors
            .iter()
            .rev()
            .map(|(_, compound)| compound)
            .chain(std::iter::once(&self.key))
    }

    /// True if nothing in the chain can gate usage (`*`, `:root`, `::selection`).
    pub fn has_no_simple_selectors(&self) -> bool {
        self.compounds().all(CompoundSelector::is_empty)
    }
}

/// Parse a full selector list (comma separated). `None` if any alternative
/// cannot be classified.
pub fn parse_selector_list(selector: &str) -> Option<Vec<ComplexSelector>> {
    split_top_level(selector, ',')
        .into_iter()
        .map(|alt| parse_complex_selector(alt.trim()))
        .collect()
}

/// Parse a complex selector string (e.g. `div.red > p#header + span.foo`).
/// Returns `None` when some part cannot be classified.
pub fn parse_complex_selector(selector: &str) -> Option<ComplexSelector> {
    let mut chars = selector.chars().peekable();
    let mut parts: Vec<(Option<Combinator>, CompoundSelector)> = Vec::new();
    let mut pending: Option<Combinator> = None;

    loop {
        let saw_space = skip_whitespace(&mut chars);
        let Some(&ch) = chars.peek() else { break };
        let explicit = match ch {
            '>' => Some(Combinator::Child),
            '+' => Some(Combinator::AdjacentSibling),
            '~' => Some(Combinator::GeneralSibling),
            _ => None,
        };
        if let Some(combinator) = explicit {
            chars.next();
            pending = Some(combinator);
            continue;
        }
        if saw_space && !parts.is_empty() && pending.is_none() {
            pending = Some(Combinator::Descendant);
        }
        let compound = parse_compound_selector(&mut chars)?;
        parts.push((pending.take(), compound));
    }

    let mut parts = parts.into_iter();
    // A leading combinator (relative selector inside `:has()`) is dropped.
    let (_, first) = parts.next()?;
    let mut key = first;
    let mut ancestors = Vec::new();
    for (combinator, compound) in parts {
        ancestors.push((combinator.unwrap_or(Combinator::Descendant), key));
        key = compound;
    }
    ancestors.reverse();
    Some(ComplexSelector { key, ancestors })
}

/// Parse one compound selector, stopping at whitespace, a combinator or
/// the end of input. Returns `None` on anything unrecognised.
fn parse_compound_selector(chars: &mut Peekable<Chars<'_>>) -> Option<CompoundSelector> {
    let mut compound = CompoundSelector::default();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() || c == '>' || c == '+' || c == '~' => break,
            '*' | '&' => {
                chars.next();
                if chars.peek() == Some(&'|') {
                    chars.next();
                }
            }
            '|' => {
                // Namespace separator with an empty prefix.
                chars.next();
            }
            '#' => {
                chars.next();
                let id = read_ident(chars);
                if id.is_empty() {
                    return None;
                }
                compound.ids.push(id);
            }
            '.' => {
                chars.next();
                let class = read_ident(chars);
                if class.is_empty() {
                    return None;
                }
                compound.classes.push(class);
            }
            '[' => {
                chars.next();
                let attr = parse_attribute_selector(chars)?;
                compound.attributes.push(attr);
            }
            ':' => {
                chars.next();
                if chars.peek() == Some(&':') {
                    chars.next();
                }
                let name = read_ident(chars).to_ascii_lowercase();
                if name.is_empty() {
                    return None;
                }
                if chars.peek() == Some(&'(') {
                    chars.next();
                    let args = read_balanced(chars)?;
                    if GATING_PSEUDOS.contains(&name.as_str()) {
                        // Unclassifiable arguments fall back to "used" by
                        // simply not gating on them.
                        if let Some(list) = parse_selector_list(&args) {
                            compound.alternatives.push(list);
                        }
                    }
                }
            }
            c if is_ident_start(c) => {
                let name = read_ident(chars);
                if chars.peek() == Some(&'|') {
                    // `svg|a`: the prefix is a namespace, the tag follows.
                    chars.next();
                    continue;
                }
                if name.is_empty() {
                    return None;
                }
                compound.tag = Some(name.to_ascii_lowercase());
            }
            _ => return None,
        }
    }

    Some(compound)
}

/// Parse the inside of `[...]`; the opening bracket is already consumed.
fn parse_attribute_selector(chars: &mut Peekable<Chars<'_>>) -> Option<AttributeSelector> {
    skip_whitespace(chars);
    let mut name = read_ident(chars);
    if chars.peek() == Some(&'|') {
        // `[ns|attr]` or `[|attr]`; only `|=` is an operator.
        let mut lookahead = chars.clone();
        lookahead.next();
        if lookahead.peek() != Some(&'=') {
            chars.next();
            name = read_ident(chars);
        }
    }
    if name.is_empty() {
        return None;
    }
    skip_whitespace(chars);

    let mut operator = None;
    let mut value = None;
    match chars.next()? {
        ']' => {
            return Some(AttributeSelector {
                name,
                operator,
                value,
                case_insensitive: false,
            })
        }
        '=' => operator = Some(AttributeOperator::Exact),
        op @ ('~' | '|' | '^' | '$' | '*') => {
            if chars.next()? != '=' {
                return None;
            }
            operator = Some(match op {
                '~' => AttributeOperator::Includes,
                '|' => AttributeOperator::DashMatch,
                '^' => AttributeOperator::Prefix,
                '$' => AttributeOperator::Suffix,
                _ => AttributeOperator::Substring,
            });
        }
        _ => return None,
    }

    skip_whitespace(chars);
    match chars.peek() {
        Some(&q) if q == '"' || q == '\'' => {
            chars.next();
            let mut buf = String::new();
            loop {
                match chars.next()? {
                    '\\' => buf.push(read_escape(chars)?),
                    c if c == q => break,
                    c => buf.push(c),
                }
            }
            value = Some(buf);
        }
        _ => {
            let buf = read_ident(chars);
            if buf.is_empty() {
                return None;
            }
            value = Some(buf);
        }
    }

    // Optional case-sensitivity flag (`i` / `s`), then `]`.
    skip_whitespace(chars);
    let mut case_insensitive = false;
    if let Some(flag) = chars
        .peek()
        .copied()
        .filter(|c| matches!(c, 'i' | 'I' | 's' | 'S'))
    {
        case_insensitive = flag.eq_ignore_ascii_case(&'i');
        chars.next();
        skip_whitespace(chars);
    }
    if chars.next()? != ']' {
        return None;
    }
    Some(AttributeSelector {
        name,
        operator,
        value,
        case_insensitive,
    })
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

/// Read a CSS identifier, decoding escapes (`sm\:flex` => `sm:flex`).
fn read_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut buf = String::new();
    while let Some(&ch) = chars.peek() {
        if ch == '\\' {
            chars.next();
            match read_escape(chars) {
                Some(c) => buf.push(c),
                None => break,
            }
        } else if is_ident_char(ch) {
            buf.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    buf
}

/// Decode the escape after a backslash: up to six hex digits plus one
/// optional whitespace, or any single character.
fn read_escape(chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    let first = *chars.peek()?;
    if !first.is_ascii_hexdigit() {
        chars.next();
        return Some(first);
    }
    let mut hex = String::new();
    while let Some(&c) = chars.peek() {
        if hex.len() == 6 || !c.is_ascii_hexdigit() {
            break;
        }
        hex.push(c);
        chars.next();
    }
    if matches!(chars.peek(), Some(c) if c.is_whitespace()) {
        chars.next();
    }
    let code = u32::from_str_radix(&hex, 16).ok()?;
    Some(char::from_u32(code).filter(|&c| c != '\0').unwrap_or('\u{FFFD}'))
}

/// Consume up to the `)` matching an already consumed `(` and return the
/// text in between.
fn read_balanced(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut depth = 1usize;
    let mut buf = String::new();
    let mut quote: Option<char> = None;
    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (_, '\\') => {
                buf.push(ch);
                buf.push(chars.next()?);
                continue;
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth -= 1;
                if depth == 0 {
                    return Some(buf);
                }
            }
            _ => {}
        }
        buf.push(ch);
    }
    None
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) -> bool {
    let mut skipped = false;
    while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
        chars.next();
        skipped = true;
    }
    skipped
}

/// Split on `sep` outside of brackets, parentheses and strings.
pub fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth -= 1,
            (None, c) if c == sep && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// ------------------------------
/// 2. Usage Policy
/// ------------------------------

/// Decide whether one selector (a single alternative, or a whole list) could
/// match something in the content.
///
/// Anything the decomposer cannot classify counts as used.
pub fn is_selector_used(selector: &str, tokens: &ExtractedTokenSet) -> bool {
    match parse_selector_list(selector) {
        Some(list) => list.iter().any(|complex| is_complex_used(complex, tokens)),
        None => {
            debug!("keeping unclassifiable selector `{}`", selector);
            true
        }
    }
}

/// Every compound in the chain must be used; combinators do not matter.
pub fn is_complex_used(complex: &ComplexSelector, tokens: &ExtractedTokenSet) -> bool {
    complex.compounds().all(|compound| is_compound_used(compound, tokens))
}

/// Returns true if every gating simple selector of the compound is present.
pub fn is_compound_used(compound: &CompoundSelector, tokens: &ExtractedTokenSet) -> bool {
    if let Some(ref tag) = compound.tag {
        if !tokens.has_tag(tag) {
            return false;
        }
    }
    if !compound.ids.iter().all(|id| tokens.has_id(id)) {
        return false;
    }
    if !compound.classes.iter().all(|class| tokens.has_class(class)) {
        return false;
    }
    if !compound
        .attributes
        .iter()
        .all(|attr| is_attribute_used(attr, tokens))
    {
        return false;
    }
    compound
        .alternatives
        .iter()
        .all(|list| list.iter().any(|complex| is_complex_used(complex, tokens)))
}

fn is_attribute_used(attr: &AttributeSelector, tokens: &ExtractedTokenSet) -> bool {
    if !tokens.has_attribute(&attr.name) {
        return false;
    }
    let (Some(op), Some(expected)) = (&attr.operator, &attr.value) else {
        return true;
    };
    let fold = attr.case_insensitive;
    let expected = fold_case(expected, fold);
    let expected = expected.as_ref();
    tokens.any_attribute_value(&attr.name, |v| {
        let v = fold_case(v, fold);
        let v = v.as_ref();
        match op {
            AttributeOperator::Exact => v == expected,
            AttributeOperator::Includes => v.split_whitespace().any(|word| word == expected),
            AttributeOperator::DashMatch => {
                v == expected
                    || v.strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttributeOperator::Prefix => v.starts_with(expected),
            AttributeOperator::Suffix => v.ends_with(expected),
            AttributeOperator::Substring => v.contains(expected),
        }
    })
}

fn fold_case(value: &str, fold: bool) -> Cow<'_, str> {
    if fold {
        Cow::Owned(value.to_ascii_lowercase())
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html_tokens(html: &str) -> ExtractedTokenSet {
        crate::parser::html::extract_html_tokens(html)
    }

    fn text_tokens(words: &[&str]) -> ExtractedTokenSet {
        let mut tokens = ExtractedTokenSet::new();
        for w in words {
            tokens.insert_undetermined(w);
        }
        tokens
    }

    #[test]
    fn test_parse_compound_parts() {
        let complex = parse_complex_selector(r#"div.red#header[data-type~="main"]:hover"#).unwrap();
        assert!(complex.ancestors.is_empty());
        let key = complex.key;
        assert_eq!(key.tag.as_deref(), Some("div"));
        assert_eq!(key.ids, vec!["header"]);
        assert_eq!(key.classes, vec!["red"]);
        assert_eq!(
            key.attributes,
            vec![AttributeSelector {
                name: "data-type".into(),
                operator: Some(AttributeOperator::Includes),
                value: Some("main".into()),
                case_insensitive: false,
            }]
        );
    }

    #[test]
    fn test_parse_combinators_right_to_left() {
        let complex = parse_complex_selector("ul.nav > li+a ~ span em").unwrap();
        assert_eq!(complex.key.tag.as_deref(), Some("em"));
        let combinators: Vec<_> = complex.ancestors.iter().map(|(c, _)| c.clone()).collect();
        assert_eq!(
            combinators,
            vec![
                Combinator::Descendant,
                Combinator::GeneralSibling,
                Combinator::AdjacentSibling,
                Combinator::Child,
            ]
        );
        assert_eq!(complex.ancestors[3].1.classes, vec!["nav"]);
    }

    #[test]
    fn test_escaped_class_is_decoded() {
        let complex = parse_complex_selector(r".sm\:flex.\31 0").unwrap();
        assert_eq!(complex.key.classes, vec!["sm:flex", "10"]);
    }

    #[test]
    fn test_namespace_prefix_is_ignored() {
        let complex = parse_complex_selector("svg|circle").unwrap();
        assert_eq!(complex.key.tag.as_deref(), Some("circle"));
    }

    #[test]
    fn test_class_requires_token() {
        let tokens = html_tokens(r#"<div class="box"></div>"#);
        assert!(is_selector_used(".box", &tokens));
        assert!(!is_selector_used(".unused", &tokens));
        assert!(is_selector_used("div.box", &tokens));
        assert!(!is_selector_used("span.box", &tokens));
    }

    #[test]
    fn test_every_compound_must_be_used() {
        let tokens = html_tokens(r#"<ul class="nav"><li>x</li></ul>"#);
        assert!(is_selector_used(".nav > li", &tokens));
        assert!(!is_selector_used(".nav > li .missing", &tokens));
    }

    #[test]
    fn test_pseudos_and_universal_do_not_gate() {
        let tokens = html_tokens(r#"<a class="link"></a>"#);
        assert!(is_selector_used("a.link:hover::before", &tokens));
        assert!(is_selector_used("*", &tokens));
        assert!(is_selector_used(":root", &tokens));
        assert!(is_selector_used("::selection", &tokens));
        assert!(is_selector_used(".link:not(.active)", &tokens));
        assert!(!is_selector_used(".missing:hover", &tokens));
    }

    #[test]
    fn test_is_and_has_gate_on_their_arguments() {
        let tokens = html_tokens(r#"<section class="card"><h2>t</h2></section>"#);
        assert!(is_selector_used(":is(.card, .panel) h2", &tokens));
        assert!(!is_selector_used(":is(.panel, .box) h2", &tokens));
        assert!(is_selector_used(".card:has(> h2)", &tokens));
        assert!(!is_selector_used(".card:has(> h3)", &tokens));
        assert!(is_selector_used(":where(.card)", &tokens));
    }

    #[test]
    fn test_attribute_selectors() {
        let tokens = html_tokens(r#"<button data-state="open closed" lang="en-US" disabled></button>"#);
        assert!(is_selector_used("[disabled]", &tokens));
        assert!(is_selector_used(r#"[data-state="open closed"]"#, &tokens));
        assert!(!is_selector_used(r#"[data-state="open"]"#, &tokens));
        assert!(is_selector_used(r#"[data-state~="open"]"#, &tokens));
        assert!(is_selector_used("[lang|=en]", &tokens));
        assert!(is_selector_used("[lang^=en]", &tokens));
        assert!(is_selector_used("[lang$=US]", &tokens));
        assert!(is_selector_used(r#"[lang*="n-u" i]"#, &tokens));
        assert!(!is_selector_used(r#"[lang*="n-u"]"#, &tokens));
        assert!(!is_selector_used("[hidden]", &tokens));
    }

    #[test]
    fn test_case_insensitive_attribute_flag() {
        let tokens = html_tokens(r#"<input type="text" lang="en-US">"#);
        assert!(is_selector_used(r#"[type="TEXT" i]"#, &tokens));
        assert!(is_selector_used("[type=Text I]", &tokens));
        assert!(is_selector_used("[lang|=EN i]", &tokens));
        assert!(!is_selector_used(r#"[type="TEXT"]"#, &tokens));
        assert!(!is_selector_used(r#"[type="TEXT" s]"#, &tokens));

        let attr = parse_complex_selector(r#"[type="TEXT" i]"#).unwrap().key.attributes;
        assert!(attr[0].case_insensitive);
        assert_eq!(attr[0].value.as_deref(), Some("TEXT"));
    }

    #[test]
    fn test_undetermined_tokens_cover_attribute_pairs() {
        let tokens = text_tokens(&["data-x", "val"]);
        assert!(is_selector_used("[data-x=val]", &tokens));
        assert!(!is_selector_used("[data-x=other]", &tokens));
    }

    #[test]
    fn test_unclassifiable_selector_is_kept() {
        let tokens = ExtractedTokenSet::new();
        assert!(is_selector_used("div[unterminated", &tokens));
        assert!(is_selector_used(".a %% .b", &tokens));
    }

    #[test]
    fn test_split_top_level_respects_nesting() {
        assert_eq!(
            split_top_level(r#":is(.a, .b), [title="x,y"], .c"#, ','),
            vec![":is(.a, .b)", r#" [title="x,y"]"#, " .c"]
        );
    }
}
