use crate::error::PurgeError;
use regex::Regex;

/// Knobs for a purge run. `Default` gives the conservative behaviour the
/// CLI uses when no flags are passed.
#[derive(Debug, Clone)]
pub struct PurgeOptions {
    /// Print the result with lightningcss' minifying printer.
    pub minify: bool,
    /// Remove `@keyframes` blocks no surviving rule animates with.
    pub keyframes: bool,
    /// Remove `@font-face` blocks no surviving rule uses.
    pub font_face: bool,
    /// Identifiers (class, id, tag or attribute names) that always count as used.
    pub safelist: Vec<String>,
    /// Selectors matching any of these are always kept.
    pub safelist_patterns: Vec<Regex>,
}

impl Default for PurgeOptions {
    fn default() -> Self {
        PurgeOptions {
            minify: false,
            keyframes: true,
            font_face: true,
            safelist: Vec::new(),
            safelist_patterns: Vec::new(),
        }
    }
}

impl PurgeOptions {
    /// Compile `patterns` and append them to the safelist patterns.
    pub fn with_safelist_patterns<I, S>(mut self, patterns: I) -> Result<Self, PurgeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let re = Regex::new(pattern).map_err(|source| PurgeError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
            self.safelist_patterns.push(re);
        }
        Ok(self)
    }

    pub(crate) fn is_safelisted(&self, selector: &str) -> bool {
        self.safelist_patterns.iter().any(|re| re.is_match(selector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = PurgeOptions::default()
            .with_safelist_patterns(["^btn-(", "ok"])
            .unwrap_err();
        match err {
            PurgeError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "^btn-("),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_safelist_pattern_matches_selector_text() {
        let opts = PurgeOptions::default()
            .with_safelist_patterns([r"^\.js-"])
            .unwrap();
        assert!(opts.is_safelisted(".js-toggle"));
        assert!(!opts.is_safelisted(".toggle"));
    }
}
