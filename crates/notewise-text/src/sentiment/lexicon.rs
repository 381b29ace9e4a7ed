//! Word lists for the lexicon-based sentiment scorer.
//!
//! Lexicons exist for English and German; other languages use English.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use notewise_core::EmotionType;

/// Polarity and intensifier word sets for one language.
#[derive(Debug)]
pub struct Lexicon {
    pub code: &'static str,
    pub positive: HashSet<&'static str>,
    pub negative: HashSet<&'static str>,
    pub intensifiers: HashSet<&'static str>,
}

impl Lexicon {
    fn build(
        code: &'static str,
        positive: &[&'static str],
        negative: &[&'static str],
        intensifiers: &[&'static str],
    ) -> Self {
        Self {
            code,
            positive: positive.iter().copied().collect(),
            negative: negative.iter().copied().collect(),
            intensifiers: intensifiers.iter().copied().collect(),
        }
    }
}

static ENGLISH: Lazy<Lexicon> = Lazy::new(|| {
    Lexicon::build(
        "en",
        &[
            "good", "great", "excellent", "amazing", "wonderful", "fantastic", "awesome",
            "love", "loved", "lovely", "happy", "glad", "joy", "joyful", "beautiful", "best",
            "better", "nice", "brilliant", "perfect", "delighted", "pleased", "enjoy",
            "enjoyed", "exciting", "excited", "grateful", "thankful", "success", "successful",
            "win", "won", "fun", "calm", "proud", "hope", "hopeful", "like", "superb",
            "positive", "easy", "helpful", "kind", "fine", "cheerful", "impressive",
        ],
        &[
            "bad", "terrible", "awful", "horrible", "hate", "hated", "sad", "angry", "upset",
            "worst", "worse", "poor", "ugly", "boring", "annoying", "annoyed", "disappointed",
            "disappointing", "fail", "failed", "failure", "wrong", "problem", "pain",
            "painful", "afraid", "scared", "worried", "stress", "stressed", "tired", "sick",
            "lonely", "miserable", "frustrated", "frustrating", "broken", "lost", "difficult",
            "hard", "negative", "useless", "disgusting", "cry", "cried",
        ],
        &[
            "very", "really", "extremely", "incredibly", "absolutely", "totally", "so",
            "completely", "truly", "highly", "deeply", "super", "quite", "too",
        ],
    )
});

static GERMAN: Lazy<Lexicon> = Lazy::new(|| {
    Lexicon::build(
        "de",
        &[
            "gut", "toll", "super", "fantastisch", "großartig", "wunderbar", "wunderschön",
            "schön", "liebe", "lieben", "glücklich", "froh", "freude", "perfekt", "prima",
            "klasse", "herrlich", "ausgezeichnet", "hervorragend", "erfolgreich", "erfolg",
            "dankbar", "begeistert", "spaß", "zufrieden", "besser", "beste", "nett",
            "angenehm", "hoffnung", "stolz", "ruhig", "genial", "spannend",
        ],
        &[
            "schlecht", "schrecklich", "furchtbar", "hasse", "hassen", "traurig", "wütend",
            "böse", "ärgerlich", "langweilig", "enttäuscht", "enttäuschend", "problem",
            "probleme", "schmerz", "schmerzen", "angst", "müde", "krank", "einsam",
            "schlimm", "schlimmer", "schlimmste", "falsch", "kaputt", "verloren", "schwierig",
            "stress", "gestresst", "nervig", "frustriert", "ekelhaft", "weinen", "leider",
        ],
        &[
            "sehr", "wirklich", "extrem", "unglaublich", "absolut", "total", "so", "völlig",
            "echt", "äußerst", "ziemlich", "zu", "besonders", "richtig",
        ],
    )
});

/// Keyword to emotion table, matched by substring against lowercased text.
pub static EMOTION_KEYWORDS: &[(&str, EmotionType)] = &[
    // joy
    ("happy", EmotionType::Joy),
    ("joy", EmotionType::Joy),
    ("delight", EmotionType::Joy),
    ("glad", EmotionType::Joy),
    ("cheerful", EmotionType::Joy),
    ("glücklich", EmotionType::Joy),
    ("freude", EmotionType::Joy),
    ("froh", EmotionType::Joy),
    // sadness
    ("sad", EmotionType::Sadness),
    ("unhappy", EmotionType::Sadness),
    ("cry", EmotionType::Sadness),
    ("lonely", EmotionType::Sadness),
    ("grief", EmotionType::Sadness),
    ("traurig", EmotionType::Sadness),
    ("einsam", EmotionType::Sadness),
    ("weinen", EmotionType::Sadness),
    // anger
    ("angry", EmotionType::Anger),
    ("furious", EmotionType::Anger),
    ("rage", EmotionType::Anger),
    ("annoyed", EmotionType::Anger),
    ("hate", EmotionType::Anger),
    ("wütend", EmotionType::Anger),
    ("ärger", EmotionType::Anger),
    ("hasse", EmotionType::Anger),
    // fear
    ("afraid", EmotionType::Fear),
    ("scared", EmotionType::Fear),
    ("fear", EmotionType::Fear),
    ("anxious", EmotionType::Fear),
    ("worried", EmotionType::Fear),
    ("angst", EmotionType::Fear),
    ("besorgt", EmotionType::Fear),
    // surprise
    ("surprise", EmotionType::Surprise),
    ("amazed", EmotionType::Surprise),
    ("astonished", EmotionType::Surprise),
    ("unexpected", EmotionType::Surprise),
    ("überrascht", EmotionType::Surprise),
    ("erstaunt", EmotionType::Surprise),
    // disgust
    ("disgust", EmotionType::Disgust),
    ("gross", EmotionType::Disgust),
    ("revolting", EmotionType::Disgust),
    ("ekel", EmotionType::Disgust),
    ("widerlich", EmotionType::Disgust),
    // trust
    ("trust", EmotionType::Trust),
    ("reliable", EmotionType::Trust),
    ("faith", EmotionType::Trust),
    ("confident", EmotionType::Trust),
    ("vertrauen", EmotionType::Trust),
    ("zuverlässig", EmotionType::Trust),
    // anticipation
    ("excited", EmotionType::Anticipation),
    ("looking forward", EmotionType::Anticipation),
    ("eager", EmotionType::Anticipation),
    ("can't wait", EmotionType::Anticipation),
    ("vorfreude", EmotionType::Anticipation),
    ("gespannt", EmotionType::Anticipation),
];

/// Phrases that suggest a sarcastic reading.
pub static SARCASM_INDICATORS: &[&str] = &[
    "oh great",
    "oh wonderful",
    "yeah right",
    "just what i needed",
    "just perfect",
    "thanks a lot",
    "how lovely",
    "as if",
    "big surprise",
    "what a surprise",
    "sure, because",
    "i just love",
    "na toll",
    "ja klar",
    "na super",
    "wie schön",
    "vielen dank auch",
    "genau das, was ich brauche",
    "was für eine überraschung",
];

/// Lexicon for `language`, falling back to English.
pub fn lexicon(language: &str) -> &'static Lexicon {
    match language {
        "de" => &GERMAN,
        _ => &ENGLISH,
    }
}
