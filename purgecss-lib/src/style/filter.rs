use crate::options::PurgeOptions;
use crate::parser::token_set::ExtractedTokenSet;
use crate::style::selector::is_selector_used;
use crate::style::stylesheet::{
    declarations, font_face_families, keyframes_name, selector_strings, unquote, OwnedDeclaration,
};
use lightningcss::rules::style::StyleRule;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::StyleSheet;
use log::debug;
use std::collections::HashSet;

/// What a filtering pass removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterReport {
    /// Selector lists of removed style rules, then `@keyframes` /
    /// `@font-face` preludes of removed at-rules, each group in input order.
    pub rejected: Vec<String>,
}

/// Animation names and font families used by surviving style rules.
#[derive(Debug, Default)]
struct References {
    animations: HashSet<String>,
    /// Lowercased, unquoted comma-separated parts of `font` / `font-family` values.
    fonts: HashSet<String>,
    /// A `var()` made an animation reference unknowable.
    animations_unresolved: bool,
    fonts_unresolved: bool,
}

impl References {
    fn record(&mut self, decl: &OwnedDeclaration) {
        let property = decl.property.as_str();
        if property.ends_with("animation") || property.ends_with("animation-name") {
            if decl.value.contains("var(") {
                self.animations_unresolved = true;
            }
            for word in decl.value.split(|c: char| c == ',' || c.is_whitespace()) {
                let word = unquote(word);
                if !word.is_empty() {
                    self.animations.insert(word.to_string());
                }
            }
        } else if property == "font-family" || property == "font" {
            if decl.value.contains("var(") {
                self.fonts_unresolved = true;
            }
            for part in decl.value.split(',') {
                let part = part.replace(['"', '\''], "");
                self.fonts.insert(part.trim().to_lowercase());
            }
        }
    }

    fn uses_font(&self, family: &str) -> bool {
        let family = family.to_lowercase();
        let suffix = format!(" {}", family);
        self.fonts
            .iter()
            .any(|part| *part == family || part.ends_with(&suffix))
    }
}

/// Remove every rule the content cannot reach. Rule order is preserved and
/// a kept rule keeps its whole selector list.
pub fn filter_stylesheet(
    sheet: &mut StyleSheet<'_, '_>,
    tokens: &ExtractedTokenSet,
    options: &PurgeOptions,
) -> FilterReport {
    let mut report = FilterReport::default();
    let mut refs = References::default();
    filter_style_rules(&mut sheet.rules.0, tokens, options, &mut refs, &mut report);
    prune_at_rules(&mut sheet.rules.0, &refs, options, &mut report);
    report
}

/// First pass: decide style rules, recursing into grouping at-rules and
/// nested rules, and remember what the survivors reference.
fn filter_style_rules(
    rules: &mut Vec<CssRule<'_>>,
    tokens: &ExtractedTokenSet,
    options: &PurgeOptions,
    refs: &mut References,
    report: &mut FilterReport,
) {
    rules.retain_mut(|rule| match rule {
        CssRule::Style(style_rule) => keep_style_rule(style_rule, tokens, options, refs, report),
        CssRule::Nesting(nesting) => {
            keep_style_rule(&mut nesting.style, tokens, options, refs, report)
        }
        CssRule::Media(media) => {
            filter_style_rules(&mut media.rules.0, tokens, options, refs, report);
            true
        }
        CssRule::Supports(supports) => {
            filter_style_rules(&mut supports.rules.0, tokens, options, refs, report);
            true
        }
        CssRule::LayerBlock(layer) => {
            filter_style_rules(&mut layer.rules.0, tokens, options, refs, report);
            true
        }
        CssRule::Container(container) => {
            filter_style_rules(&mut container.rules.0, tokens, options, refs, report);
            true
        }
        _ => true,
    });
}

/// Decide one style rule. Nested rules of a survivor go through the same
/// policy; nested rules of a removed rule go with it unrecorded.
fn keep_style_rule(
    style_rule: &mut StyleRule<'_>,
    tokens: &ExtractedTokenSet,
    options: &PurgeOptions,
    refs: &mut References,
    report: &mut FilterReport,
) -> bool {
    let selectors = selector_strings(style_rule);
    let used = selectors.is_empty()
        || selectors
            .iter()
            .any(|s| options.is_safelisted(s) || is_selector_used(s, tokens));
    if used {
        for decl in declarations(style_rule) {
            refs.record(&decl);
        }
        filter_style_rules(&mut style_rule.rules.0, tokens, options, refs, report);
    } else {
        let joined = selectors.join(", ");
        debug!("removing `{}`", joined);
        report.rejected.push(joined);
    }
    used
}

/// Second pass: drop unreferenced `@keyframes` / `@font-face` and grouping
/// at-rules left without children.
fn prune_at_rules(
    rules: &mut Vec<CssRule<'_>>,
    refs: &References,
    options: &PurgeOptions,
    report: &mut FilterReport,
) {
    rules.retain_mut(|rule| match rule {
        CssRule::Keyframes(keyframes) => {
            if !options.keyframes || refs.animations_unresolved {
                return true;
            }
            let Some(name) = keyframes_name(keyframes) else {
                return true;
            };
            let used = refs.animations.contains(&name);
            if !used {
                debug!("removing unused @keyframes {}", name);
                report.rejected.push(format!("@keyframes {}", name));
            }
            used
        }
        CssRule::FontFace(font_face) => {
            if !options.font_face || refs.fonts_unresolved {
                return true;
            }
            let families = font_face_families(font_face);
            let used = families.is_empty() || families.iter().any(|f| refs.uses_font(f));
            if !used {
                debug!("removing unused @font-face {}", families.join(", "));
                report
                    .rejected
                    .push(format!("@font-face {}", families.join(", ")));
            }
            used
        }
        CssRule::Style(style_rule) => {
            prune_at_rules(&mut style_rule.rules.0, refs, options, report);
            true
        }
        CssRule::Nesting(nesting) => {
            prune_at_rules(&mut nesting.style.rules.0, refs, options, report);
            true
        }
        CssRule::Media(media) => {
            prune_at_rules(&mut media.rules.0, refs, options, report);
            !media.rules.0.is_empty()
        }
        CssRule::Supports(supports) => {
            prune_at_rules(&mut supports.rules.0, refs, options, report);
            !supports.rules.0.is_empty()
        }
        CssRule::LayerBlock(layer) => {
            prune_at_rules(&mut layer.rules.0, refs, options, report);
            !layer.rules.0.is_empty()
        }
        CssRule::Container(container) => {
            prune_at_rules(&mut container.rules.0, refs, options, report);
            !container.rules.0.is_empty()
        }
        _ => true,
    });
}
