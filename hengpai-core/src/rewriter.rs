//! Text rewrites that turn a vertical layout into a horizontal one
//!
//! These operate on raw markup text with regular expressions rather than on a
//! parsed DOM, so everything outside a match keeps its exact formatting.
//! Every transform is idempotent and returns the input unchanged (borrowed)
//! when there is nothing to rewrite.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

pub use crate::punctuation::remap_punctuation;

/// `writing-mode: vertical-rl|vertical-lr`, optionally `-epub-` or `-webkit-` prefixed
static VERTICAL_WRITING_MODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(-(?:epub|webkit)-)?writing-mode\s*:\s*vertical-(?:rl|lr)")
        .expect("writing-mode pattern is valid")
});

static RTL_SPINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"page-progression-direction\s*=\s*["']rtl["']"#)
        .expect("spine direction pattern is valid")
});

/// The spine attribute together with the whitespace separating it from the
/// previous token, so removal leaves no double spaces behind.
static RTL_SPINE_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s+page-progression-direction\s*=\s*["']rtl["']"#)
        .expect("spine attribute pattern is valid")
});

/// Whether `text` declares a vertical writing mode
pub fn has_vertical_writing_mode(text: &str) -> bool {
    VERTICAL_WRITING_MODE.is_match(text)
}

/// Whether `text` carries `page-progression-direction="rtl"`
pub fn has_rtl_spine(text: &str) -> bool {
    RTL_SPINE.is_match(text)
}

/// Replace vertical writing-mode declarations with `horizontal-tb`.
///
/// The vendor prefix of each occurrence is kept. `vertical-rl` and
/// `vertical-lr` both become `horizontal-tb`.
pub fn rewrite_writing_mode(text: &str) -> Cow<'_, str> {
    VERTICAL_WRITING_MODE.replace_all(text, |caps: &Captures| {
        let prefix = caps.get(1).map_or("", |m| m.as_str());
        format!("{prefix}writing-mode: horizontal-tb")
    })
}

/// Remove `page-progression-direction="rtl"` (either quote style)
pub fn strip_spine_direction(text: &str) -> Cow<'_, str> {
    let mut stripped = RTL_SPINE_ATTRIBUTE.replace_all(text, "");
    // Removing one attribute can splice its neighbours into a new one.
    while RTL_SPINE_ATTRIBUTE.is_match(&stripped) {
        stripped = Cow::Owned(RTL_SPINE_ATTRIBUTE.replace_all(&stripped, "").into_owned());
    }
    stripped
}

/// Apply the content rewrites in conversion order: writing mode, then punctuation
pub fn rewrite_content(text: &str) -> Cow<'_, str> {
    match rewrite_writing_mode(text) {
        Cow::Borrowed(unchanged) => remap_punctuation(unchanged),
        Cow::Owned(rewritten) => match remap_punctuation(&rewritten) {
            Cow::Borrowed(_) => Cow::Owned(rewritten),
            Cow::Owned(remapped) => Cow::Owned(remapped),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rewrite_standard() {
        assert_eq!(
            rewrite_writing_mode("writing-mode: vertical-rl"),
            "writing-mode: horizontal-tb"
        );
    }

    #[test]
    fn test_rewrite_vendor_prefixes() {
        assert_eq!(
            rewrite_writing_mode("-epub-writing-mode: vertical-rl"),
            "-epub-writing-mode: horizontal-tb"
        );
        assert_eq!(
            rewrite_writing_mode("-webkit-writing-mode: vertical-lr"),
            "-webkit-writing-mode: horizontal-tb"
        );
    }

    #[test]
    fn test_rewrite_vertical_lr() {
        assert_eq!(
            rewrite_writing_mode("writing-mode:vertical-lr"),
            "writing-mode: horizontal-tb"
        );
    }

    #[test]
    fn test_rewrite_every_occurrence() {
        let css = "html { -epub-writing-mode: vertical-rl; -webkit-writing-mode: vertical-rl; writing-mode: vertical-rl; }";
        assert_eq!(
            rewrite_writing_mode(css),
            "html { -epub-writing-mode: horizontal-tb; -webkit-writing-mode: horizontal-tb; writing-mode: horizontal-tb; }"
        );
    }

    #[test]
    fn test_rewrite_inline_style() {
        let html = r#"<div style="writing-mode :  vertical-rl; color: red">"#;
        assert_eq!(
            rewrite_writing_mode(html),
            r#"<div style="writing-mode: horizontal-tb; color: red">"#
        );
    }

    #[test]
    fn test_rewrite_no_match_is_borrowed() {
        let css = "writing-mode: horizontal-tb";
        assert!(matches!(rewrite_writing_mode(css), Cow::Borrowed(_)));
        assert!(!has_vertical_writing_mode(css));
    }

    #[test]
    fn test_strip_double_quotes() {
        assert_eq!(
            strip_spine_direction(r#"<spine page-progression-direction="rtl" toc="ncx">"#),
            r#"<spine toc="ncx">"#
        );
    }

    #[test]
    fn test_strip_single_quotes() {
        assert_eq!(
            strip_spine_direction("<spine page-progression-direction='rtl' toc='ncx'>"),
            "<spine toc='ncx'>"
        );
    }

    #[test]
    fn test_strip_extra_whitespace() {
        let result =
            strip_spine_direction(r#"<spine  page-progression-direction = "rtl"  toc="ncx">"#);
        assert!(!result.contains("page-progression-direction"));
        assert!(result.contains(r#"toc="ncx""#));
    }

    #[test]
    fn test_strip_spliced_attribute() {
        let opf = r#"<spine page-progression-direction=" page-progression-direction="rtl"rtl">"#;
        let once = strip_spine_direction(opf);
        assert_eq!(once, "<spine>");
        assert_eq!(strip_spine_direction(&once), once);
    }

    #[test]
    fn test_strip_leaves_ltr_alone() {
        let opf = r#"<spine page-progression-direction="ltr" toc="ncx">"#;
        assert_eq!(strip_spine_direction(opf), opf);
        assert!(!has_rtl_spine(opf));
    }

    #[test]
    fn test_rtl_is_case_sensitive() {
        assert!(has_rtl_spine(r#"<spine page-progression-direction = 'rtl'>"#));
        assert!(!has_rtl_spine(r#"<spine page-progression-direction="RTL">"#));
    }

    #[test]
    fn test_rewrite_content_applies_both() {
        let html = r#"<p style="writing-mode: vertical-rl">測試︒</p>"#;
        assert_eq!(
            rewrite_content(html),
            r#"<p style="writing-mode: horizontal-tb">測試。</p>"#
        );
        assert!(matches!(rewrite_content("<p>plain</p>"), Cow::Borrowed(_)));
    }

    proptest! {
        #[test]
        fn prop_rewrite_writing_mode_idempotent(
            text in r"[ a-z;:{}\-]{0,20}(-(epub|webkit)-)?writing-mode\s{0,2}:\s{0,2}vertical-(rl|lr)[ a-z;:{}\-]{0,20}"
        ) {
            let once = rewrite_writing_mode(&text).into_owned();
            prop_assert!(!has_vertical_writing_mode(&once));
            prop_assert_eq!(rewrite_writing_mode(&once), once.as_str());
        }

        #[test]
        fn prop_strip_spine_direction_idempotent(
            text in r#"<spine[ a-z="']{0,12}\s{1,2}page-progression-direction\s{0,2}=\s{0,2}["']rtl["'][ a-z="']{0,12}>"#
        ) {
            let once = strip_spine_direction(&text).into_owned();
            prop_assert!(!has_rtl_spine(&once));
            prop_assert_eq!(strip_spine_direction(&once), once.as_str());
        }

        #[test]
        fn prop_remap_punctuation_idempotent(text in "\\PC{0,40}") {
            let once = remap_punctuation(&text).into_owned();
            prop_assert_eq!(remap_punctuation(&once), once.as_str());
        }

        #[test]
        fn prop_rewrites_are_total(text in "\\PC{0,60}") {
            let once = rewrite_content(&text).into_owned();
            prop_assert_eq!(rewrite_content(&once), once.as_str());
            let stripped = strip_spine_direction(&text).into_owned();
            prop_assert_eq!(strip_spine_direction(&stripped), stripped.as_str());
        }
    }
}
