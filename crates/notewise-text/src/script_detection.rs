//! Unicode script detection for language hypotheses.
//!
//! The detector performs a single O(n) pass through the input text and
//! classifies it into one or more script categories. Confidence is the
//! proportion of classified characters belonging to the primary script.
//!
//! Script alone cannot tell English from German, but it settles the
//! question for most non-Latin writing systems before any statistical
//! scoring happens.

use unicode_script::{Script, UnicodeScript};

/// Detected script category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DetectedScript {
    /// Latin alphabet (English, French, German, etc.)
    Latin,
    /// Han ideographs (Chinese, also used in Japanese)
    Han,
    /// Hiragana and Katakana (Japanese)
    Kana,
    /// Hangul (Korean)
    Hangul,
    /// Arabic script
    Arabic,
    /// Cyrillic script (Russian, Ukrainian, etc.)
    Cyrillic,
    /// Greek script
    Greek,
    /// Hebrew script
    Hebrew,
    /// Devanagari script (Hindi, Sanskrit, etc.)
    Devanagari,
    /// Thai script
    Thai,
    /// Emoji characters
    Emoji,
    /// Multiple scripts detected with significant presence
    Mixed,
    /// Unknown or unclassified script
    Unknown,
}

impl DetectedScript {
    /// Counted categories, in tie-break order.
    const COUNTED: [DetectedScript; 12] = [
        DetectedScript::Latin,
        DetectedScript::Han,
        DetectedScript::Kana,
        DetectedScript::Hangul,
        DetectedScript::Arabic,
        DetectedScript::Cyrillic,
        DetectedScript::Greek,
        DetectedScript::Hebrew,
        DetectedScript::Devanagari,
        DetectedScript::Thai,
        DetectedScript::Emoji,
        DetectedScript::Unknown,
    ];

    fn slot(self) -> usize {
        Self::COUNTED
            .iter()
            .position(|s| *s == self)
            .unwrap_or(Self::COUNTED.len() - 1)
    }

    /// Whether this is one of the East Asian scripts.
    pub fn is_cjk(&self) -> bool {
        matches!(
            self,
            DetectedScript::Han | DetectedScript::Kana | DetectedScript::Hangul
        )
    }
}

/// Result of script detection analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptDetection {
    /// Primary (most common) script detected
    pub primary: DetectedScript,
    /// Proportion of classified characters in the most common script (0.0 - 1.0)
    pub confidence: f32,
    /// All scripts found with significant presence (>5% of characters)
    pub scripts_found: Vec<DetectedScript>,
    /// Per-script share of classified characters, most common first
    pub shares: Vec<(DetectedScript, f32)>,
}

impl ScriptDetection {
    fn empty() -> Self {
        Self {
            primary: DetectedScript::Unknown,
            confidence: 0.0,
            scripts_found: vec![],
            shares: vec![],
        }
    }
}

/// Maps a Unicode script to our DetectedScript categories.
fn map_unicode_script(script: Script) -> DetectedScript {
    match script {
        Script::Latin => DetectedScript::Latin,
        Script::Han => DetectedScript::Han,
        Script::Hiragana | Script::Katakana => DetectedScript::Kana,
        Script::Hangul => DetectedScript::Hangul,
        Script::Arabic => DetectedScript::Arabic,
        Script::Cyrillic => DetectedScript::Cyrillic,
        Script::Greek => DetectedScript::Greek,
        Script::Hebrew => DetectedScript::Hebrew,
        Script::Devanagari => DetectedScript::Devanagari,
        Script::Thai => DetectedScript::Thai,
        _ => DetectedScript::Unknown,
    }
}

/// Detects the script(s) used in the input text.
///
/// Skips whitespace, punctuation and digits. Returns the primary script,
/// confidence level, all scripts found with significant presence (>5%),
/// and the share of each script. Ties on the primary script resolve to
/// the category listed first in [`DetectedScript`].
///
/// # Examples
///
/// ```
/// use notewise_text::script_detection::{detect_script, DetectedScript};
///
/// let result = detect_script("Hello world");
/// assert_eq!(result.primary, DetectedScript::Latin);
/// assert!(result.confidence > 0.9);
///
/// let result = detect_script("Привет мир");
/// assert_eq!(result.primary, DetectedScript::Cyrillic);
/// ```
pub fn detect_script(text: &str) -> ScriptDetection {
    if text.is_empty() {
        return ScriptDetection::empty();
    }

    let mut counts = [0usize; DetectedScript::COUNTED.len()];
    let mut total_count = 0usize;

    for ch in text.chars() {
        if ch.is_whitespace() || ch.is_ascii_punctuation() || ch.is_numeric() {
            continue;
        }

        // Emoji first: some carry script properties
        let detected = if is_emoji(ch) {
            DetectedScript::Emoji
        } else {
            let mapped = map_unicode_script(ch.script());
            if mapped == DetectedScript::Unknown && !ch.is_alphabetic() {
                // General punctuation and symbols outside ASCII
                continue;
            }
            mapped
        };

        counts[detected.slot()] += 1;
        total_count += 1;
    }

    if total_count == 0 {
        return ScriptDetection::empty();
    }

    // First maximum in fixed order keeps the result deterministic
    let mut primary_script = DetectedScript::Unknown;
    let mut primary_count = 0usize;
    for (script, count) in DetectedScript::COUNTED.iter().zip(counts.iter()) {
        if *count > primary_count {
            primary_script = *script;
            primary_count = *count;
        }
    }

    let confidence = primary_count as f32 / total_count as f32;

    let threshold = (total_count as f32 * 0.05).ceil() as usize;
    let scripts_found: Vec<DetectedScript> = DetectedScript::COUNTED
        .iter()
        .zip(counts.iter())
        .filter(|(script, count)| **count >= threshold && **count > 0 && **script != DetectedScript::Unknown)
        .map(|(script, _)| *script)
        .collect();

    // Mixed when more than one script holds at least 20%
    let mixed_threshold = (total_count as f32 * 0.20).ceil() as usize;
    let significant = DetectedScript::COUNTED
        .iter()
        .zip(counts.iter())
        .filter(|(script, count)| {
            **count >= mixed_threshold && **count > 0 && **script != DetectedScript::Unknown
        })
        .count();

    let mut shares: Vec<(DetectedScript, f32)> = DetectedScript::COUNTED
        .iter()
        .zip(counts.iter())
        .filter(|(_, count)| **count > 0)
        .map(|(script, count)| (*script, *count as f32 / total_count as f32))
        .collect();
    // Stable sort keeps the fixed order among equal shares
    shares.sort_by(|a, b| b.1.total_cmp(&a.1));

    ScriptDetection {
        primary: if significant > 1 {
            DetectedScript::Mixed
        } else {
            primary_script
        },
        confidence,
        scripts_found,
        shares,
    }
}

/// Checks if the text contains CJK characters.
///
/// # Examples
///
/// ```
/// use notewise_text::script_detection::has_cjk;
///
/// assert!(has_cjk("日本語"));
/// assert!(has_cjk("Hello 世界"));
/// assert!(!has_cjk("Hello world"));
/// ```
pub fn has_cjk(text: &str) -> bool {
    text.chars()
        .any(|ch| map_unicode_script(ch.script()).is_cjk())
}

/// Checks if the text contains emoji characters.
///
/// # Examples
///
/// ```
/// use notewise_text::script_detection::has_emoji;
///
/// assert!(has_emoji("Hello 👋"));
/// assert!(has_emoji("🎉"));
/// assert!(!has_emoji("Hello world"));
/// ```
pub fn has_emoji(text: &str) -> bool {
    text.chars().any(is_emoji)
}

/// Determines if a character falls in one of the common emoji blocks.
fn is_emoji(ch: char) -> bool {
    matches!(ch as u32,
        0x1F600..=0x1F64F | // Emoticons
        0x1F300..=0x1F5FF | // Misc Symbols and Pictographs
        0x1F680..=0x1F6FF | // Transport and Map
        0x1F1E6..=0x1F1FF | // Regional indicator symbols
        0x2600..=0x26FF |   // Misc symbols
        0x2700..=0x27BF |   // Dingbats
        0xFE00..=0xFE0F |   // Variation selectors
        0x1F900..=0x1F9FF | // Supplemental Symbols and Pictographs
        0x1F780..=0x1F7FF | // Geometric Shapes Extended
        0x1F800..=0x1F8FF   // Supplemental Arrows-C
    )
}
