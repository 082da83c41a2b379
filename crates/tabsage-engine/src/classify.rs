use regex::Regex;
use std::sync::OnceLock;
use tabsage_frame::parse_markdown;

/// Result of classifying one attempt's rendered outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Ok,
    Empty,
    Error,
}

/// Known failure signatures matched (case-insensitively) against the
/// combined reasoning+result text of an attempt.
///
/// Pattern matching over free-form text is approximate by nature; the
/// default set is a starting point and callers can extend it, trading
/// retry cost against detection coverage.
#[derive(Debug, Clone)]
pub struct ErrorSignatures {
    substrings: Vec<String>,
}

impl Default for ErrorSignatures {
    fn default() -> Self {
        Self {
            substrings: [
                "unable to answer",
                "index out of range",
                "out of bounds",
                "out-of-bounds",
                "division by zero",
                "divide by zero",
                "no such column",
                "no such table",
                "syntax error",
                "datatype mismatch",
                "type mismatch",
                "cannot convert",
                "could not convert",
                "invalid literal",
                "overflow",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl ErrorSignatures {
    pub fn with_signature(mut self, substring: &str) -> Self {
        self.substrings.push(substring.to_lowercase());
        self
    }

    fn matches(&self, text_lower: &str) -> bool {
        self.substrings.iter().any(|s| text_lower.contains(s.as_str()))
    }
}

/// Classify one attempt from its reasoning and rendered result text.
///
/// Error wins over empty, matching the retry driver's check order; with
/// `require_table_shape` (the code-execution variant) a non-empty result
/// that carries no table line at all is also an error.
pub fn classify(
    reasoning: &str,
    rendered: &str,
    require_table_shape: bool,
    signatures: &ErrorSignatures,
) -> Classification {
    if has_error_content(reasoning, rendered, require_table_shape, signatures) {
        return Classification::Error;
    }
    if is_empty_markdown(rendered) {
        return Classification::Empty;
    }
    Classification::Ok
}

fn has_error_content(
    reasoning: &str,
    rendered: &str,
    require_table_shape: bool,
    signatures: &ErrorSignatures,
) -> bool {
    let blob = format!("{}\n\n{}", reasoning, rendered).to_lowercase();
    if signatures.matches(&blob) {
        return true;
    }
    require_table_shape && !rendered.trim().is_empty() && !looks_like_table(rendered)
}

/// Whether any line of the text has the minimal `| cell |` row shape.
pub fn looks_like_table(text: &str) -> bool {
    text.lines().any(|line| {
        let t = line.trim();
        t.len() >= 3
            && t.starts_with('|')
            && t[1..].contains('|')
            && t.trim_matches('|').chars().any(|c| !c.is_whitespace())
    })
}

/// Whether a rendered result is semantically contentless: blank text, an
/// explicit no-rows marker, or a table whose only data row is the
/// two-column empty-result sentinel.
pub fn is_empty_markdown(text: &str) -> bool {
    static EMPTY_MARKER: OnceLock<Regex> = OnceLock::new();
    let marker = EMPTY_MARKER.get_or_init(|| Regex::new(r"(?i)\bempty\b|no\s*rows").unwrap());

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return true;
    }
    if marker.is_match(trimmed) {
        return true;
    }
    if let Ok(frame) = parse_markdown(trimmed)
        && frame.len() == 1
        && frame.width() == 2
    {
        let row: Vec<String> = frame.rows()[0]
            .iter()
            .map(|v| v.render().to_lowercase())
            .collect();
        if row == ["empty", "no rows"] {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig() -> ErrorSignatures {
        ErrorSignatures::default()
    }

    #[test]
    fn test_ok_table_classifies_ok() {
        let md = "| a | b |\n|---|---|\n| 1 | 2 |";
        assert_eq!(classify("fine", md, true, &sig()), Classification::Ok);
    }

    #[test]
    fn test_blank_is_empty() {
        assert_eq!(classify("", "   ", false, &sig()), Classification::Empty);
    }

    #[test]
    fn test_sentinel_table_is_empty() {
        let md = "| (empty) |\n|---|\n| (no rows) |";
        assert_eq!(classify("", md, false, &sig()), Classification::Empty);
    }

    #[test]
    fn test_two_column_sentinel_is_empty() {
        let md = "| metric | value |\n|---|---|\n| empty | no rows |";
        assert_eq!(classify("", md, false, &sig()), Classification::Empty);
    }

    #[test]
    fn test_signature_in_reasoning_is_error() {
        let md = "| a |\n|---|\n| 1 |";
        assert_eq!(
            classify("hit a division by zero while aggregating", md, false, &sig()),
            Classification::Error
        );
    }

    #[test]
    fn test_signature_in_rendered_text_is_error() {
        assert_eq!(
            classify("", "Runtime failure: no such column: qty", false, &sig()),
            Classification::Error
        );
    }

    #[test]
    fn test_error_wins_over_empty() {
        assert_eq!(
            classify("unable to answer", "| (empty) |\n|---|\n| (no rows) |", false, &sig()),
            Classification::Error
        );
    }

    #[test]
    fn test_shapeless_text_is_error_only_when_required() {
        let prose = "The average is 42.";
        assert_eq!(classify("", prose, true, &sig()), Classification::Error);
        assert_eq!(classify("", prose, false, &sig()), Classification::Ok);
    }

    #[test]
    fn test_custom_signature_extends_detection() {
        let sig = ErrorSignatures::default().with_signature("quota exceeded");
        assert_eq!(
            classify("", "Quota Exceeded for project", false, &sig),
            Classification::Error
        );
    }

    #[test]
    fn test_looks_like_table() {
        assert!(looks_like_table("| a | b |"));
        assert!(looks_like_table("prose\n| 1 |\nmore"));
        assert!(!looks_like_table("no pipes here"));
        assert!(!looks_like_table("|  |"));
    }
}
