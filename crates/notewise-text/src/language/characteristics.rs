//! Static reference data for the statistical language scorer.
//!
//! Built once on first use and read-only afterwards. [`candidates`] returns
//! the languages in their fixed tie-break order.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::Serialize;

/// Dominant constituent order of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentenceStructure {
    Svo,
    Sov,
    Vso,
    Osv,
    Vos,
    /// Verb-second (German, Dutch)
    V2,
}

/// Word lists and character profile for one candidate language.
#[derive(Debug)]
pub struct LanguageCharacteristics {
    /// ISO 639-1 code.
    pub code: &'static str,
    /// Name of the language in the language itself.
    pub endonym: &'static str,
    pub common_words: HashSet<&'static str>,
    pub stop_words: HashSet<&'static str>,
    pub special_chars: HashSet<char>,
    /// Space-padded character trigrams, e.g. `" th"`.
    pub trigrams: HashSet<&'static str>,
    pub sentence_structure: SentenceStructure,
}

impl LanguageCharacteristics {
    fn build(
        code: &'static str,
        endonym: &'static str,
        common_words: &[&'static str],
        stop_words: &[&'static str],
        special_chars: &str,
        trigrams: &[&'static str],
        sentence_structure: SentenceStructure,
    ) -> Self {
        Self {
            code,
            endonym,
            common_words: common_words.iter().copied().collect(),
            stop_words: stop_words.iter().copied().collect(),
            special_chars: special_chars.chars().collect(),
            trigrams: trigrams.iter().copied().collect(),
            sentence_structure,
        }
    }
}

static CANDIDATES: Lazy<Vec<LanguageCharacteristics>> = Lazy::new(|| {
    vec![
        LanguageCharacteristics::build(
            "en",
            "English",
            &[
                "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for",
                "not", "on", "with", "he", "as", "you", "do", "at", "this", "but", "his", "by",
                "from", "they", "we", "say", "her", "she", "or", "an", "will", "my", "one",
                "all", "would", "there", "their", "what", "so", "up", "out", "if", "about",
                "who", "get", "which", "go", "me", "when", "make", "can", "like", "time", "no",
                "just", "him", "know", "take", "people", "into", "year", "your", "good", "some",
                "could", "them", "see", "other", "than", "then", "now", "look", "only", "come",
                "its", "over", "think", "also", "back", "after", "use", "two", "how", "our",
                "work", "first", "well", "way", "even", "new", "want", "because", "any",
                "these", "give", "day", "most", "us", "is", "are", "was", "were", "been", "has",
                "had",
            ],
            &[
                "a", "an", "the", "and", "or", "but", "is", "are", "was", "were", "of", "to",
                "in", "on", "at", "for", "with", "by", "from", "this", "that", "it", "as", "be",
            ],
            "",
            &[
                " th", "the", "he ", "and", " an", "nd ", "ing", "ng ", " to", "to ", " of",
                "of ", "ion", "tio", " in", "er ", "ent", "is ", " is", "ed ", "hat", "tha",
                " wa", "was", "for", " fo", "ou ", "es ", "re ", " co",
            ],
            SentenceStructure::Svo,
        ),
        LanguageCharacteristics::build(
            "de",
            "Deutsch",
            &[
                "der", "die", "das", "und", "ist", "nicht", "ich", "sie", "es", "ein", "eine",
                "zu", "den", "von", "mit", "sich", "des", "auf", "für", "im", "dem", "auch",
                "an", "als", "wie", "wir", "aber", "noch", "nach", "bei", "was", "so", "nur",
                "wenn", "kann", "dass", "er", "sein", "werden", "hat", "haben", "wird", "sind",
                "war", "oder", "schon", "mehr", "sehr", "gut", "heute", "immer", "hier",
                "mein", "dich", "mich", "diese", "einen", "uns",
            ],
            &[
                "der", "die", "das", "und", "ist", "ein", "eine", "einen", "zu", "den", "dem",
                "des", "von", "mit", "auf", "für", "im", "in", "an", "als", "nicht", "sich",
                "es", "sie", "ich",
            ],
            "äöüß",
            &[
                " de", "der", "er ", " di", "die", "ie ", " da", "das", "as ", " un", "und",
                "nd ", "ein", " ei", "ich", "ch ", "sch", "cht", "en ", " ge", "ung", "ng ",
                "ist", " is", "st ", "den", "nic", "ht ", "ier",
            ],
            SentenceStructure::V2,
        ),
        LanguageCharacteristics::build(
            "fr",
            "Français",
            &[
                "le", "la", "les", "de", "des", "du", "un", "une", "et", "est", "en", "que",
                "qui", "pas", "pour", "dans", "sur", "avec", "ce", "il", "elle", "je", "nous",
                "vous", "ils", "sont", "mais", "ou", "au", "aux", "son", "sa", "ses", "plus",
                "tout", "bien", "être", "avoir", "fait", "comme", "très", "aussi", "cette",
                "leur", "c'est", "j'ai",
            ],
            &[
                "le", "la", "les", "de", "des", "du", "un", "une", "et", "est", "en", "que",
                "qui", "au", "aux", "ce", "il", "je", "pas", "pour",
            ],
            "éèêàçùâîôûëïœ",
            &[
                " le", "les", "es ", " de", "de ", "ent", "nt ", " la", "la ", "ion", "tio",
                "on ", " et", "et ", "que", "ue ", " qu", "re ", " pa", "our", " po", "est",
                " es", "ans", "dan", " da", "eme", "men", " un", "une",
            ],
            SentenceStructure::Svo,
        ),
        LanguageCharacteristics::build(
            "es",
            "Español",
            &[
                "el", "la", "los", "las", "de", "del", "que", "y", "en", "un", "una", "es",
                "por", "con", "no", "se", "para", "su", "al", "lo", "como", "más", "pero",
                "sus", "le", "ya", "o", "este", "sí", "porque", "esta", "entre", "cuando",
                "muy", "sin", "sobre", "también", "me", "hasta", "hay", "donde", "quien",
                "desde", "todo", "nos", "todos", "uno", "les", "ni", "otros", "ese", "eso",
                "ellos", "está", "estoy", "hola", "gracias",
            ],
            &[
                "el", "la", "los", "las", "de", "del", "que", "y", "en", "un", "una", "es",
                "por", "con", "se", "para", "su", "al", "lo", "como",
            ],
            "ñáéíóúü¿¡",
            &[
                " de", "de ", " la", "la ", "os ", " el", "el ", "que", " qu", "ue ", "es ",
                " en", "en ", "ent", "as ", "ado", "ión", "ien", " co", "con", " es", "est",
                "ara", "par", " pa", "los", " lo", "del", "nte", " un",
            ],
            SentenceStructure::Svo,
        ),
        LanguageCharacteristics::build(
            "it",
            "Italiano",
            &[
                "il", "lo", "la", "i", "gli", "le", "di", "da", "in", "con", "su", "per",
                "tra", "fra", "un", "una", "uno", "e", "è", "che", "non", "si", "sono", "ma",
                "come", "anche", "più", "questo", "questa", "molto", "essere", "ha", "hanno",
                "mi", "ti", "ci", "del", "della", "dei", "delle", "al", "alla", "nel",
                "nella", "sul", "tutto", "ancora", "già", "sempre", "bene", "cosa", "perché",
                "ciao", "grazie",
            ],
            &[
                "il", "lo", "la", "i", "gli", "le", "di", "da", "in", "con", "su", "per", "un",
                "una", "uno", "e", "che", "non", "si", "del", "della",
            ],
            "àèéìòù",
            &[
                " di", "di ", "che", " ch", "he ", " la", "la ", "re ", "to ", " il", "il ",
                "ell", "lla", "del", " de", "one", "ne ", " co", "con", "ent", "nte", "zio",
                "ion", "per", " pe", "are", "ato", "no ", " no", "non",
            ],
            SentenceStructure::Svo,
        ),
        LanguageCharacteristics::build(
            "pt",
            "Português",
            &[
                "o", "a", "os", "as", "de", "do", "da", "dos", "das", "em", "no", "na", "nos",
                "nas", "um", "uma", "e", "é", "que", "não", "se", "por", "para", "com", "mais",
                "mas", "como", "ao", "à", "seu", "sua", "ele", "ela", "eu", "você", "muito",
                "também", "já", "está", "foi", "ser", "ter", "isso", "este", "esta",
                "quando", "sem", "sobre", "bem", "obrigado",
            ],
            &[
                "o", "a", "os", "as", "de", "do", "da", "dos", "das", "em", "no", "na", "um",
                "uma", "e", "que", "se", "por", "para", "com",
            ],
            "ãõçáéíóúâêôà",
            &[
                " de", "de ", " qu", "que", "ue ", "os ", " a ", "do ", " do", " da", "da ",
                "ent", "ção", "ão ", " co", "com", "nte", "as ", " e ", "ara", " pa", "par",
                "em ", " em", "est", " es", "men", "ado", "não", " nã",
            ],
            SentenceStructure::Svo,
        ),
        LanguageCharacteristics::build(
            "nl",
            "Nederlands",
            &[
                "de", "het", "een", "en", "van", "in", "is", "dat", "op", "te", "zijn", "voor",
                "met", "die", "niet", "aan", "er", "om", "ook", "als", "bij", "maar", "of",
                "dan", "nog", "wel", "naar", "worden", "kan", "door", "ik", "je", "wij", "zij",
                "hij", "heeft", "hebben", "was", "wat", "geen", "zo", "veel", "goed", "deze",
                "moet", "nu", "mijn", "heel",
            ],
            &[
                "de", "het", "een", "en", "van", "in", "is", "dat", "op", "te", "voor", "met",
                "die", "niet", "aan", "er", "om", "ook", "als", "bij",
            ],
            "ëïéĳ",
            &[
                " de", "de ", "en ", " he", "het", "et ", " ee", "een", " va", "van", "an ",
                "ing", "ng ", "ver", " ve", "der", "er ", " en", "and", " in", "ijk", "jk ",
                " ge", "gen", "oor", " vo", "voo", "aar", "sch", " zi",
            ],
            SentenceStructure::V2,
        ),
    ]
});

/// Endonyms for languages only reachable through script hypotheses.
const SCRIPT_LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("ru", "Русский"),
    ("el", "Ελληνικά"),
    ("ar", "العربية"),
    ("he", "עברית"),
    ("hi", "हिन्दी"),
    ("th", "ไทย"),
    ("ko", "한국어"),
    ("ja", "日本語"),
    ("zh", "中文"),
];

/// Candidate languages in tie-break order: en, de, fr, es, it, pt, nl.
pub fn candidates() -> &'static [LanguageCharacteristics] {
    &CANDIDATES
}

/// Reference data for `code`, if it is a candidate.
pub fn characteristics(code: &str) -> Option<&'static LanguageCharacteristics> {
    CANDIDATES.iter().find(|c| c.code == code)
}

/// Endonym for `code`; unknown codes map to themselves.
///
/// ```
/// use notewise_text::language::localized_name;
///
/// assert_eq!(localized_name("de"), "Deutsch");
/// assert_eq!(localized_name("xx"), "xx");
/// ```
pub fn localized_name(code: &str) -> String {
    if let Some(c) = characteristics(code) {
        return c.endonym.to_string();
    }
    SCRIPT_LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_order_is_fixed() {
        let codes: Vec<&str> = candidates().iter().map(|c| c.code).collect();
        assert_eq!(codes, vec!["en", "de", "fr", "es", "it", "pt", "nl"]);
    }

    #[test]
    fn test_stop_words_are_lowercase() {
        for lang in candidates() {
            for word in lang.stop_words.iter().chain(lang.common_words.iter()) {
                assert_eq!(*word, word.to_lowercase(), "{} in {}", word, lang.code);
            }
        }
    }

    #[test]
    fn test_trigrams_are_three_chars() {
        for lang in candidates() {
            assert!(!lang.trigrams.is_empty());
            for gram in &lang.trigrams {
                assert_eq!(gram.chars().count(), 3, "{:?} in {}", gram, lang.code);
            }
        }
    }

    #[test]
    fn test_sentence_structures() {
        assert_eq!(
            characteristics("de").map(|c| c.sentence_structure),
            Some(SentenceStructure::V2)
        );
        assert_eq!(
            characteristics("en").map(|c| c.sentence_structure),
            Some(SentenceStructure::Svo)
        );
        assert!(characteristics("ru").is_none());
    }

    #[test]
    fn test_localized_names() {
        assert_eq!(localized_name("en"), "English");
        assert_eq!(localized_name("fr"), "Français");
        assert_eq!(localized_name("ja"), "日本語");
        assert_eq!(localized_name("tlh"), "tlh");
    }

    #[test]
    fn test_english_has_no_special_chars() {
        assert!(characteristics("en").map_or(false, |c| c.special_chars.is_empty()));
        assert!(characteristics("de").map_or(false, |c| c.special_chars.contains(&'ß')));
    }
}
