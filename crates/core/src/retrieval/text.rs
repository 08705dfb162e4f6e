use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Default maximum chunk size in characters.
pub const DEFAULT_CHUNK_CHARS: usize = 1000;

/// Clean up text extracted from a corpus document.
///
/// Applies NFC normalization, ligature replacement, hyphenation repair,
/// replacement character removal and whitespace normalization.
pub fn cleanup_text(text: &str) -> String {
    let mut result: String = text.nfc().collect();

    for (ligature, replacement) in [
        ("\u{FB00}", "ff"),
        ("\u{FB01}", "fi"),
        ("\u{FB02}", "fl"),
        ("\u{FB03}", "ffi"),
        ("\u{FB04}", "ffl"),
    ] {
        result = result.replace(ligature, replacement);
    }

    result = result.replace('\u{FFFD}', "").replace("\r\n", "\n");

    static RE_HYPHEN: OnceLock<Regex> = OnceLock::new();
    let re_hyphen =
        RE_HYPHEN.get_or_init(|| Regex::new(r"([a-zA-Z])-[ \t]*\n[ \t]*([a-z])").unwrap());
    result = re_hyphen.replace_all(&result, "$1$2").to_string();

    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"[ \t]{2,}").unwrap());
    result = re_spaces.replace_all(&result, " ").to_string();

    static RE_BLANK: OnceLock<Regex> = OnceLock::new();
    let re_blank = RE_BLANK.get_or_init(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").unwrap());
    result = re_blank.replace_all(&result, "\n\n").to_string();

    result.trim().to_string()
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Paragraphs are packed together while they fit. A paragraph that is too
/// long on its own is split on lines, and a line that is still too long is
/// split on whitespace (or hard-cut if it has none).
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let pieces = text
        .split("\n\n")
        .flat_map(|paragraph| split_to_fit(paragraph.trim(), max_chars));
    pack(pieces, "\n\n", max_chars)
}

fn split_to_fit(paragraph: &str, max_chars: usize) -> Vec<String> {
    if paragraph.chars().count() <= max_chars {
        return vec![paragraph.to_string()];
    }

    let lines = paragraph
        .lines()
        .flat_map(|line| split_line(line.trim(), max_chars));
    pack(lines, "\n", max_chars)
}

fn split_line(line: &str, max_chars: usize) -> Vec<String> {
    if line.chars().count() <= max_chars {
        return vec![line.to_string()];
    }

    let words = line
        .split_whitespace()
        .flat_map(|word| hard_split(word, max_chars));
    pack(words, " ", max_chars)
}

/// Join `pieces` with `separator` into runs of at most `max_chars` characters.
fn pack(
    pieces: impl IntoIterator<Item = String>,
    separator: &str,
    max_chars: usize,
) -> Vec<String> {
    let separator_len = separator.chars().count();
    let mut packed = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in pieces {
        if piece.is_empty() {
            continue;
        }
        let piece_len = piece.chars().count();
        if current_len > 0 && current_len + separator_len + piece_len > max_chars {
            packed.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push_str(separator);
            current_len += separator_len;
        }
        current.push_str(&piece);
        current_len += piece_len;
    }

    if !current.is_empty() {
        packed.push(current);
    }
    packed
}

fn hard_split(word: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_chars)
        .map(|part| part.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_ligatures_and_hyphenation() {
        let text = "e\u{FB03}cient brand-\nidentity";
        assert_eq!(cleanup_text(text), "efficient brandidentity");
    }

    #[test]
    fn test_cleanup_whitespace() {
        let text = "  warm    colors\r\n\r\n\r\n\r\nsell   coffee  ";
        assert_eq!(cleanup_text(text), "warm colors\n\nsell coffee");
    }

    #[test]
    fn test_cleanup_removes_replacement_character() {
        assert_eq!(cleanup_text("logo\u{FFFD} mark"), "logo mark");
    }

    #[test]
    fn test_chunk_short_text_is_single_chunk() {
        assert_eq!(chunk_text("one\n\ntwo", 100), vec!["one\n\ntwo"]);
    }

    #[test]
    fn test_chunk_packs_paragraphs() {
        let text = "aaaa\n\nbbbb\n\ncccc";
        assert_eq!(chunk_text(text, 10), vec!["aaaa\n\nbbbb", "cccc"]);
    }

    #[test]
    fn test_chunk_splits_long_paragraph_on_words() {
        let text = "alpha beta gamma delta";
        let chunks = chunk_text(text, 11);
        assert_eq!(chunks, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn test_chunk_splits_long_paragraph_on_lines() {
        let text = "warm tones\nsell coffee\nand tea";
        let chunks = chunk_text(text, 20);
        assert_eq!(chunks, vec!["warm tones", "sell coffee\nand tea"]);
    }

    #[test]
    fn test_chunk_splits_long_line_on_words() {
        let text = "short line\nthis line is much too long";
        let chunks = chunk_text(text, 12);
        assert_eq!(
            chunks,
            vec!["short line", "this line is", "much too", "long"]
        );
    }

    #[test]
    fn test_chunk_never_exceeds_limit() {
        let text = format!("{}\n\nshort\n\n{}", "x".repeat(25), "word ".repeat(30));
        let chunks = chunk_text(&text, 10);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert!(chunks.iter().any(|c| c.contains("short")));
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_text("\n\n  \n\n", 100).is_empty());
    }
}
