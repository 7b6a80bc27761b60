//! Vertical-form punctuation table
//!
//! Books typeset for vertical reading often use the CJK vertical presentation
//! forms (U+FE10..U+FE19, U+FE30..U+FE4F). Laid out horizontally these render
//! rotated, so each is replaced with its ordinary full-width counterpart.

use std::borrow::Cow;

/// Vertical-form characters paired with their horizontal equivalents.
///
/// No horizontal form appears on the vertical side.
pub const PUNCTUATION_MAP: [(char, char); 19] = [
    ('\u{FE12}', '。'),
    ('\u{FE11}', '、'),
    ('\u{FE10}', '，'),
    ('\u{FE14}', '；'),
    ('\u{FE13}', '：'),
    ('\u{FE15}', '！'),
    ('\u{FE16}', '？'),
    ('\u{FE41}', '「'),
    ('\u{FE42}', '」'),
    ('\u{FE43}', '『'),
    ('\u{FE44}', '』'),
    ('\u{FE3D}', '《'),
    ('\u{FE3E}', '》'),
    ('\u{FE35}', '（'),
    ('\u{FE36}', '）'),
    ('\u{FE37}', '｛'),
    ('\u{FE38}', '｝'),
    ('\u{FE47}', '［'),
    ('\u{FE48}', '］'),
];

/// Horizontal form of a vertical punctuation character, if it has one
pub fn horizontal_form(c: char) -> Option<char> {
    PUNCTUATION_MAP
        .iter()
        .find(|(vertical, _)| *vertical == c)
        .map(|(_, horizontal)| *horizontal)
}

/// Replace every vertical-form punctuation character with its horizontal form
pub fn remap_punctuation(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| horizontal_form(c).is_some()) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| horizontal_form(c).unwrap_or(c))
            .collect(),
    )
}
