//! Script-based language hypotheses.

use notewise_core::{HypothesisSource, LanguageHypothesis};

use crate::script_detection::{detect_script, DetectedScript};

/// Default [`HypothesisSource`]: maps non-Latin scripts onto languages.
///
/// Text whose primary script is Latin gets no hypothesis, so the statistical
/// scorer decides between the Latin-script candidates on its own and a
/// stray non-Latin word does not pull the blended confidence down. When
/// Kana is present, Han characters count toward Japanese instead of Chinese.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptHypothesisSource;

impl ScriptHypothesisSource {
    fn language_for(script: DetectedScript) -> Option<&'static str> {
        match script {
            DetectedScript::Cyrillic => Some("ru"),
            DetectedScript::Greek => Some("el"),
            DetectedScript::Arabic => Some("ar"),
            DetectedScript::Hebrew => Some("he"),
            DetectedScript::Devanagari => Some("hi"),
            DetectedScript::Thai => Some("th"),
            DetectedScript::Hangul => Some("ko"),
            DetectedScript::Kana => Some("ja"),
            DetectedScript::Han => Some("zh"),
            _ => None,
        }
    }
}

impl HypothesisSource for ScriptHypothesisSource {
    fn rank(&self, text: &str, max: usize) -> Vec<LanguageHypothesis> {
        let detection = detect_script(text);
        if detection.primary == DetectedScript::Latin {
            return Vec::new();
        }
        let has_kana = detection
            .shares
            .iter()
            .any(|(script, _)| *script == DetectedScript::Kana);

        let mut ranked: Vec<LanguageHypothesis> = Vec::new();
        for (script, share) in &detection.shares {
            let code = match (script, has_kana) {
                (DetectedScript::Han, true) => "ja",
                _ => match Self::language_for(*script) {
                    Some(code) => code,
                    None => continue,
                },
            };
            match ranked.iter_mut().find(|h| h.code == code) {
                Some(existing) => {
                    existing.probability = (existing.probability + *share as f64).min(1.0)
                }
                None => ranked.push(LanguageHypothesis::new(code, *share as f64)),
            }
        }

        ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        ranked.truncate(max);
        ranked
    }

    fn name(&self) -> &str {
        "script"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin_has_no_hypothesis() {
        assert!(ScriptHypothesisSource.rank("Hello world", 3).is_empty());
        assert!(ScriptHypothesisSource.rank("Guten Tag", 3).is_empty());
    }

    #[test]
    fn test_stray_non_latin_word_in_latin_text_has_no_hypothesis() {
        let text = "Meeting notes for the quarterly review, spasibo привет to the team";
        assert!(ScriptHypothesisSource.rank(text, 3).is_empty());
    }

    #[test]
    fn test_cyrillic_maps_to_russian() {
        let ranked = ScriptHypothesisSource.rank("Привет мир", 3);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].code, "ru");
        assert!((ranked[0].probability - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_han_with_kana_is_japanese() {
        let ranked = ScriptHypothesisSource.rank("日本語です", 3);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].code, "ja");
        assert!((ranked[0].probability - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_han_alone_is_chinese() {
        let ranked = ScriptHypothesisSource.rank("你好世界", 3);
        assert_eq!(ranked[0].code, "zh");
    }

    #[test]
    fn test_mixed_scripts_ranked_by_share() {
        let ranked = ScriptHypothesisSource.rank("Привет мир Γειά", 3);
        assert_eq!(ranked[0].code, "ru");
        assert_eq!(ranked[1].code, "el");
        assert!(ranked[0].probability > ranked[1].probability);
    }

    #[test]
    fn test_respects_max() {
        let ranked = ScriptHypothesisSource.rank("Привет Γειά שלום", 1);
        assert_eq!(ranked.len(), 1);
        assert!(ScriptHypothesisSource.rank("Привет", 0).is_empty());
    }
}
