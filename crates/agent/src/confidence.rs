//! Parsing the evaluator's self-assessment.
//!
//! The evaluation prompt asks for exactly two lines:
//!
//! ```text
//! CONFIDENCE: 73
//! EXPLANATION: The results name the city directly.
//! ```
//!
//! Small models drift from that format, so anything unparsable falls back
//! to [`Evaluation::DEFAULT_CONFIDENCE`].

use std::sync::LazyLock;

use regex::Regex;

static CONFIDENCE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)CONFIDENCE:\s*(\d+)").ok());

static EXPLANATION_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)EXPLANATION:\s*(.*)").ok());

/// The outcome of parsing an evaluation response.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// A `CONFIDENCE:` value was found.
    Parsed { confidence: f32, explanation: String },

    /// No usable confidence value; the raw text is kept for the trace.
    Unparsed { raw: String },
}

impl Evaluation {
    /// Confidence assumed when the evaluator's answer can't be read.
    pub const DEFAULT_CONFIDENCE: f32 = 0.5;

    pub fn parse(text: &str) -> Self {
        match extract_percent(text) {
            Some(percent) => Self::Parsed {
                confidence: (percent as f32 / 100.0).clamp(0.0, 1.0),
                explanation: extract_explanation(text),
            },
            None => Self::Unparsed {
                raw: text.to_string(),
            },
        }
    }

    /// Confidence in `[0, 1]`, defaulting for unparsed responses.
    pub fn confidence(&self) -> f32 {
        match self {
            Self::Parsed { confidence, .. } => *confidence,
            Self::Unparsed { .. } => Self::DEFAULT_CONFIDENCE,
        }
    }
}

/// Confidence in `[0, 1]` read from an evaluation response.
pub fn parse_confidence(text: &str) -> f32 {
    Evaluation::parse(text).confidence()
}

fn extract_percent(text: &str) -> Option<u32> {
    let caps = CONFIDENCE_RE.as_ref()?.captures(text)?;
    // Digit runs too long for u32 are treated as unreadable
    caps.get(1)?.as_str().parse().ok()
}

fn extract_explanation(text: &str) -> String {
    EXPLANATION_RE
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_percentage() {
        assert!((parse_confidence("CONFIDENCE: 73\nEXPLANATION: x") - 0.73).abs() < 1e-6);
    }

    #[test]
    fn garbage_defaults_to_half() {
        assert_eq!(parse_confidence("I think it's fine"), 0.5);
        assert_eq!(parse_confidence(""), 0.5);
    }

    #[test]
    fn case_insensitive_and_spacing() {
        assert_eq!(parse_confidence("confidence:90"), 0.9);
        assert_eq!(parse_confidence("Confidence:   100"), 1.0);
    }

    #[test]
    fn clamps_above_hundred() {
        assert_eq!(parse_confidence("CONFIDENCE: 250"), 1.0);
    }

    #[test]
    fn overflowing_number_is_unparsed() {
        let eval = Evaluation::parse("CONFIDENCE: 99999999999999999999");
        assert!(matches!(eval, Evaluation::Unparsed { .. }));
        assert_eq!(eval.confidence(), 0.5);
    }

    #[test]
    fn negative_sign_is_not_a_number() {
        // "-5" has no digits directly after the colon and whitespace
        assert_eq!(parse_confidence("CONFIDENCE: -5"), 0.5);
    }

    #[test]
    fn explanation_extracted() {
        let eval = Evaluation::parse("CONFIDENCE: 85\nEXPLANATION: Paris is named.\n");
        assert_eq!(
            eval,
            Evaluation::Parsed {
                confidence: 0.85,
                explanation: "Paris is named.".into()
            }
        );
    }

    #[test]
    fn missing_explanation_is_empty() {
        match Evaluation::parse("CONFIDENCE: 10") {
            Evaluation::Parsed { explanation, .. } => assert!(explanation.is_empty()),
            other => panic!("expected parsed, got {other:?}"),
        }
    }

    #[test]
    fn unparsed_keeps_raw_text() {
        match Evaluation::parse("no idea") {
            Evaluation::Unparsed { raw } => assert_eq!(raw, "no idea"),
            other => panic!("expected unparsed, got {other:?}"),
        }
    }
}
