//! Japanese review text cleanup applied before tokenization.
//!
//! Keeps hiragana, katakana, CJK unified ideographs (plus extension A),
//! ASCII alphanumerics and basic punctuation; strips URLs, emoji and
//! decorative symbols; collapses runs of whitespace.

use regex::Regex;
use std::sync::OnceLock;

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s　]+").expect("static regex"))
}

fn keep_char(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'   // hiragana
        | '\u{30A0}'..='\u{30FF}' // katakana
        | '\u{4E00}'..='\u{9FAF}' // CJK unified
        | '\u{3400}'..='\u{4DBF}' // CJK ext A
        | 'a'..='z' | 'A'..='Z' | '0'..='9'
        | '。' | '、' | '！' | '？' | '（' | '）' | 'ー'
        | '.' | ',' | '!' | '?' | '(' | ')' | '-'
    ) || c.is_whitespace()
}

/// Normalize a raw review for scoring. Returns an empty string when
/// nothing survives the cleanup, which callers treat as "no signal".
pub fn clean_review_text(raw: &str) -> String {
    let without_urls = url_re().replace_all(raw, "");
    let filtered: String = without_urls.chars().filter(|&c| keep_char(c)).collect();

    // Collapse whitespace runs (including full-width spaces) to one space.
    let mut out = String::with_capacity(filtered.len());
    let mut last_was_space = true; // also trims leading whitespace
    for c in filtered.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_urls() {
        let cleaned = clean_review_text("詳細は https://example.com/pets?id=3 を見て");
        assert_eq!(cleaned, "詳細は を見て");
    }

    #[test]
    fn strips_emoji_keeps_japanese_punctuation() {
        let cleaned = clean_review_text("先生が優しい🐶！また行きます。");
        assert_eq!(cleaned, "先生が優しい！また行きます。");
    }

    #[test]
    fn collapses_whitespace() {
        let cleaned = clean_review_text("  良い　　病院   です  ");
        assert_eq!(cleaned, "良い 病院 です");
    }

    #[test]
    fn emoji_only_text_becomes_empty() {
        assert_eq!(clean_review_text("🐶🐱✨"), "");
    }
}
