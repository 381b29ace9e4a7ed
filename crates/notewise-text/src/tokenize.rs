//! Word, sentence, and paragraph segmentation shared by the analyzers.
//!
//! Every splitter discards empty tokens. Offsets are byte offsets into the
//! original text so callers can slice it back.

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentence terminators.
static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?…]+").expect("sentence pattern is valid"));

/// Sentence-like unit boundaries: terminators plus line breaks.
static SEGMENT_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?…;]+|\n+").expect("segment pattern is valid"));

/// Paragraph breaks: a blank line, possibly holding whitespace.
static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t\r]*\n").expect("paragraph pattern is valid"));

/// A slice of the source text together with its byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub offset: usize,
    pub text: &'a str,
}

/// Whitespace-separated words, as written.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

/// Lowercased words with leading and trailing punctuation stripped.
///
/// Inner apostrophes and hyphens survive (`don't`, `e-mail`).
pub fn normalized_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Sentences split at `. ! ? …`; trailing text without a terminator counts.
pub fn sentences(text: &str) -> Vec<Segment<'_>> {
    split_trimmed(text, &SENTENCE_END)
}

/// Sentence-like units split at terminators, semicolons and line breaks.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    split_trimmed(text, &SEGMENT_END)
}

/// Paragraphs split at blank lines.
pub fn paragraphs(text: &str) -> Vec<Segment<'_>> {
    split_trimmed(text, &PARAGRAPH_BREAK)
}

/// Distinct lowercase character trigrams of every word, padded with spaces.
///
/// `"the"` yields `" th"`, `"the"`, `"he "`.
pub fn trigrams(words: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for word in words {
        let padded: Vec<char> = std::iter::once(' ')
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        for window in padded.windows(3) {
            let gram: String = window.iter().collect();
            if !out.contains(&gram) {
                out.push(gram);
            }
        }
    }
    out
}

fn split_trimmed<'a>(text: &'a str, boundary: &Regex) -> Vec<Segment<'a>> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in boundary.find_iter(text) {
        push_trimmed(&mut out, text, start, m.start());
        start = m.end();
    }
    push_trimmed(&mut out, text, start, text.len());
    out
}

fn push_trimmed<'a>(out: &mut Vec<Segment<'a>>, text: &'a str, start: usize, end: usize) {
    let raw = &text[start..end];
    let trimmed = raw.trim_start();
    let offset = start + (raw.len() - trimmed.len());
    let trimmed = trimmed.trim_end();
    if !trimmed.is_empty() {
        out.push(Segment {
            offset,
            text: trimmed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_words_strip_punctuation() {
        let words = normalized_words("Hello, World! Don't \"stop\" -- now.");
        assert_eq!(words, vec!["hello", "world", "don't", "stop", "now"]);
    }

    #[test]
    fn test_sentences_keep_unterminated_tail() {
        let s = sentences("One. Two! Three");
        let texts: Vec<&str> = s.iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["One", "Two", "Three"]);
    }

    #[test]
    fn test_sentences_collapse_repeated_terminators() {
        assert_eq!(sentences("Wait... what?! Really…").len(), 3);
        assert!(sentences("...").is_empty());
    }

    #[test]
    fn test_segment_offsets_slice_back() {
        let text = "Hello there.  Guten Tag!\nBonjour";
        for seg in segments(text) {
            assert_eq!(&text[seg.offset..seg.offset + seg.text.len()], seg.text);
        }
        let offsets: Vec<usize> = segments(text).iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 14, 25]);
    }

    #[test]
    fn test_offsets_are_bytes_with_multibyte_text() {
        let text = "Grüße. Ciao";
        let segs = segments(text);
        assert_eq!(segs[1].text, "Ciao");
        assert_eq!(segs[1].offset, text.find("Ciao").unwrap());
    }

    #[test]
    fn test_paragraphs() {
        let text = "First para\nstill first.\n\nSecond.\n  \n\nThird";
        assert_eq!(paragraphs(text).len(), 3);
        assert_eq!(paragraphs("single").len(), 1);
        assert!(paragraphs("\n\n\n").is_empty());
    }

    #[test]
    fn test_trigrams_distinct_and_padded() {
        let grams = trigrams(&["the".to_string(), "the".to_string()]);
        assert_eq!(grams, vec![" th", "the", "he "]);
    }

    #[test]
    fn test_trigrams_short_word() {
        let grams = trigrams(&["a".to_string()]);
        assert_eq!(grams, vec![" a "]);
    }
}
