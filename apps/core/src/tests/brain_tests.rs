//! Brain and Scoring Tests
//!
//! Property-style checks over the risk classifier and questionnaire scoring.

use crate::brain::{CrisisType, RiskClassifier, RiskLevel, SupportTopic, TopicClassifier};
use crate::screening::engine::score;
use crate::screening::{Instrument, Severity};

#[cfg(test)]
mod risk_tests {
    use super::*;

    #[test]
    fn test_reference_messages() {
        let classifier = RiskClassifier::default();
        let cases = [
            (
                "I want to kill myself tonight, I have the pills",
                RiskLevel::Imminent,
                CrisisType::SuicidePlan,
            ),
            ("I want to kill myself", RiskLevel::High, CrisisType::SuicideIdeation),
            ("I cut myself sometimes", RiskLevel::Moderate, CrisisType::SelfHarm),
            ("I'm stressed about exams", RiskLevel::Low, CrisisType::NoCrisis),
        ];

        for (text, level, crisis_type) in cases {
            let result = classifier.classify(text);
            assert_eq!(result.level, level, "level for '{}'", text);
            assert_eq!(result.crisis_type, crisis_type, "crisis type for '{}'", text);
            assert_eq!(result.immediate_action_required, level == RiskLevel::Imminent);
        }
    }

    #[test]
    fn test_adding_timing_never_lowers_level() {
        let classifier = RiskClassifier::default();
        let bases = [
            "I want to die",
            "I cut myself",
            "I feel fine",
            "I want to end my life",
        ];
        for base in bases {
            let before = classifier.classify(base).level;
            let after = classifier.classify(&format!("{} tonight", base)).level;
            assert!(after >= before, "'{}' dropped from {} to {}", base, before, after);
        }
    }

    #[test]
    fn test_every_lethality_phrase_is_at_least_high() {
        let classifier = RiskClassifier::default();
        for phrase in &classifier.lexicon().lethality_intent {
            let text = format!("Honestly {} sometimes", phrase.to_uppercase());
            assert!(
                classifier.classify(&text).level.is_crisis(),
                "'{}' not treated as crisis",
                phrase
            );
        }
    }

    #[test]
    fn test_every_timing_phrase_escalates_intent() {
        let classifier = RiskClassifier::default();
        for phrase in &classifier.lexicon().temporal_method {
            let text = format!("I want to kill myself {}", phrase);
            assert_eq!(classifier.classify(&text).level, RiskLevel::Imminent, "'{}'", phrase);
        }
    }

    #[test]
    fn test_everyday_words_stay_low() {
        let classifier = RiskClassifier::default();
        let texts = [
            "I studied all night for my maths test",
            "Can you help me spend it wisely?",
            "My team got killed in the match lol",
            "The movie was about a bridge",
        ];
        for text in texts {
            let result = classifier.classify(text);
            assert!(!result.level.is_crisis(), "'{}' classified {}", text, result.level);
        }
    }

    #[test]
    fn test_overlapping_phrases_both_recorded() {
        let classifier = RiskClassifier::default();
        let result = classifier.classify("I keep thinking about suicide, I'm suicidal");
        assert_eq!(result.level, RiskLevel::High);
        assert!(result.risk_factors.contains("suicide"));
        assert!(result.risk_factors.contains("suicidal"));
    }
}

#[cfg(test)]
mod topic_tests {
    use super::*;

    #[test]
    fn test_topic_priority() {
        let classifier = TopicClassifier::new();
        assert_eq!(classifier.classify("hi, I'm so worried"), SupportTopic::Anxiety);
        assert_eq!(classifier.classify("hello, I feel hopeless"), SupportTopic::Depression);
        assert_eq!(classifier.classify("good morning!"), SupportTopic::Greeting);
    }
}

#[cfg(test)]
mod scoring_tests {
    use super::*;

    /// Decodes `index` into `len` base-4 digits.
    fn answers(mut index: u32, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push((index % 4) as u8);
            index /= 4;
        }
        out
    }

    #[test]
    fn test_every_gad7_sequence_sums_and_bands() {
        for index in 0..4u32.pow(7) {
            let responses = answers(index, 7);
            let expected: u8 = responses.iter().sum();
            let result = score(Instrument::Gad7, &responses);
            assert_eq!(result.total_score, expected);
            assert_eq!(result.escalate, expected >= 15);
            let band = Instrument::Gad7.band_for(expected);
            assert!(band.min <= expected && expected <= band.max);
        }
    }

    #[test]
    fn test_phq9_sum_property() {
        let mut seen = [false; 28];
        for index in 0..4u32.pow(9) {
            let responses = answers(index, 9);
            let expected: u8 = responses.iter().sum();
            let result = score(Instrument::Phq9, &responses);
            assert_eq!(result.total_score, expected);
            seen[expected as usize] = true;
        }
        assert!(seen.iter().all(|s| *s), "not every total was produced");
    }

    #[test]
    fn test_phq9_band_edges() {
        let edges = [
            (4, Severity::Minimal),
            (5, Severity::Mild),
            (14, Severity::Moderate),
            (15, Severity::ModeratelySevere),
            (19, Severity::ModeratelySevere),
            (20, Severity::Severe),
        ];
        for (total, severity) in edges {
            assert_eq!(Instrument::Phq9.band_for(total).severity, severity, "total {}", total);
        }
    }

    #[test]
    fn test_gad7_has_no_moderately_severe_band() {
        for total in 0..=21 {
            assert_ne!(
                Instrument::Gad7.band_for(total).severity,
                Severity::ModeratelySevere
            );
        }
        assert_eq!(Instrument::Gad7.band_for(15).severity, Severity::Severe);
    }
}
