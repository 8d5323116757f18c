use purgecss_lib::{
    extract_tokens, filter_stylesheet, parse_stylesheet, purge, serialize_stylesheet,
    ContentSource, PurgeError, PurgeOptions,
};

#[cfg(test)]
pub mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn minified() -> PurgeOptions {
        PurgeOptions {
            minify: true,
            ..PurgeOptions::default()
        }
    }

    fn purge_one(sources: &[ContentSource], css: &str) -> String {
        let mut out = purge(sources, &[css], &minified()).unwrap();
        out.remove(0).css
    }

    const SITE_CSS: &str = r#"
        html { font-size: 16px }
        .nav > li { display: inline-block }
        .nav .active:hover { color: red }
        #hero::before { content: "" }
        .card, .panel { padding: 0 }
        .sm\:flex { display: flex }
        [data-state="open"] { display: block }
        @media (max-width: 600px) { .nav { display: none } .sidebar { display: none } }
        @keyframes fade { from { opacity: 0 } to { opacity: 1 } }
        .toast { animation: fade 1s }
        @font-face { font-family: Brand; src: url(brand.woff2) }
        .logo { font-family: Brand, sans-serif }
        .unused { color: red }
    "#;

    fn site_content() -> Vec<ContentSource> {
        vec![
            ContentSource::html(
                r#"<html><body>
                    <ul class="nav"><li class="active">Home</li></ul>
                    <div id="hero" class="card" data-state="open"></div>
                </body></html>"#,
            ),
            ContentSource::text(r#"el.classList.add("sm:flex")"#),
        ]
    }

    #[test]
    fn test_scenario_class_match() {
        let out = purge_one(
            &[ContentSource::html(r#"<div class="box"></div>"#)],
            ".box{color:red} .unused{color:blue}",
        );
        assert_eq!(out, ".box{color:red}");
    }

    #[test]
    fn test_scenario_keyframes_removed_with_their_rule() {
        let out = purge_one(
            &[ContentSource::html("<div></div>")],
            "@keyframes spin{from{}to{}} .a{animation:spin 1s}",
        );
        assert_eq!(out, "");
    }

    #[test]
    fn test_scenario_empty_content_drops_everything() {
        let out = purge_one(&[ContentSource::text("")], ".x{color:red}");
        assert_eq!(out, "");
    }

    #[test]
    fn test_scenario_unbalanced_brace_fails() {
        let err = purge(
            &[ContentSource::html("<div></div>")],
            &[".box{color:red"],
            &minified(),
        )
        .unwrap_err();
        assert!(matches!(err, PurgeError::StylesheetParse { .. }));
    }

    #[test]
    fn test_body_rule_survives_for_html_page() {
        let out = purge(
            &[ContentSource::html(
                r#"<html><body><div class="app"></div></body></html>"#,
            )],
            &["body { margin: 0; }\n.foo { color: red; }"],
            &PurgeOptions::default(),
        )
        .unwrap();
        assert!(out[0].css.contains("body"));
        assert!(!out[0].css.contains(".foo"));
        assert_eq!(out[0].rejected, vec![".foo".to_string()]);
    }

    #[test]
    fn test_site_stylesheet() {
        let out = purge_one(&site_content(), SITE_CSS);
        for kept in [
            "html{",
            ".nav>li",
            ".nav .active:hover",
            "#hero",
            ".card,.panel",
            r".sm\:flex",
            "[data-state=",
            "@media",
            ".nav{display:none}",
        ] {
            assert!(out.contains(kept), "expected `{kept}` in {out}");
        }
        for dropped in [".sidebar", ".unused", ".toast", "@keyframes", "@font-face", ".logo"] {
            assert!(!out.contains(dropped), "did not expect `{dropped}` in {out}");
        }
    }

    #[test]
    fn test_idempotent() {
        let sources = site_content();
        let once = purge_one(&sources, SITE_CSS);
        let twice = purge_one(&sources, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_deterministic() {
        let sources = site_content();
        assert_eq!(purge_one(&sources, SITE_CSS), purge_one(&sources, SITE_CSS));
    }

    #[test]
    fn test_order_preserved() {
        let out = purge_one(
            &[ContentSource::text("c a b")],
            ".c{color:red}.x{color:red}.a{color:red}.y{color:red}.b{color:red}",
        );
        assert_eq!(out, ".c{color:red}.a{color:red}.b{color:red}");
    }

    #[test]
    fn test_monotonic_in_content() {
        let css = ".a{color:red}.b{color:red}.c{color:red}";
        let small = purge(&[ContentSource::text("a")], &[css], &minified()).unwrap();
        let large = purge(
            &[ContentSource::text("a"), ContentSource::html(r#"<i class="b"></i>"#)],
            &[css],
            &minified(),
        )
        .unwrap();
        assert_eq!(small[0].rejected, vec![".b", ".c"]);
        assert_eq!(large[0].rejected, vec![".c"]);
    }

    #[test]
    fn test_literal_tokens_are_never_false_negatives() {
        let out = purge_one(
            &[ContentSource::text("section hero big")],
            "section.hero .big{color:red}",
        );
        assert_eq!(out, "section.hero .big{color:red}");
    }

    #[test]
    fn test_low_level_pipeline() {
        let tokens = extract_tokens(&[ContentSource::html(r#"<b class="x"></b>"#)]);
        let mut sheet = parse_stylesheet(".x{color:red}.y{color:red}").unwrap();
        let report = filter_stylesheet(&mut sheet, &tokens, &PurgeOptions::default());
        assert_eq!(report.rejected, vec![".y"]);
        assert_eq!(serialize_stylesheet(&sheet, true).unwrap(), ".x{color:red}");
    }

    #[test]
    fn test_keyframes_used_by_nested_rule_survive() {
        let out = purge_one(
            &[ContentSource::html(r#"<div class="a"></div>"#)],
            "@keyframes spin{to{opacity:0}} .a{color:red; &:hover{animation:spin 1s}}",
        );
        assert!(out.contains("@keyframes spin"));
        assert!(out.contains(".a{color:red;&:hover{animation:"));
    }

    #[test]
    fn test_case_insensitive_attribute_is_kept() {
        let out = purge_one(
            &[ContentSource::html(r#"<input type="text">"#)],
            r#"[type="TEXT" i]{color:red}"#,
        );
        assert!(!out.is_empty());
        assert!(out.contains("color:red"));
    }
}
