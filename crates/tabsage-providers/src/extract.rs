use regex::Regex;
use std::sync::OnceLock;

/// Result of tolerant JSON extraction from model output.
///
/// Malformed output is never an error at this layer: the caller decides
/// what a raw fallback means for its contract.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Structured(serde_json::Value),
    Raw(String),
}

impl Parsed {
    /// String field of the structured payload, if both exist.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        match self {
            Parsed::Structured(v) => v.get(key).and_then(|x| x.as_str()),
            Parsed::Raw(_) => None,
        }
    }

    pub fn bool_field(&self, key: &str) -> Option<bool> {
        match self {
            Parsed::Structured(v) => v.get(key).and_then(|x| x.as_bool()),
            Parsed::Raw(_) => None,
        }
    }

    /// String-array field of the structured payload, dropping non-string
    /// elements.
    pub fn str_list_field(&self, key: &str) -> Vec<String> {
        match self {
            Parsed::Structured(v) => v
                .get(key)
                .and_then(|x| x.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|i| i.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
            Parsed::Raw(_) => Vec::new(),
        }
    }
}

/// Extract a JSON object from model output, tolerating code fences and
/// surrounding prose.
///
/// Tries the fence-stripped text first, then the widest `{...}` window.
/// Never fails: anything unparsable comes back as `Parsed::Raw`.
pub fn parse_or_fallback(text: &str) -> Parsed {
    let stripped = strip_code_fence(text);
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(&stripped) {
        return Parsed::Structured(v);
    }
    if let (Some(head), Some(tail)) = (stripped.find('{'), stripped.rfind('}'))
        && head < tail
        && let Ok(v) = serde_json::from_str::<serde_json::Value>(&stripped[head..=tail])
    {
        return Parsed::Structured(v);
    }
    Parsed::Raw(stripped)
}

/// Remove a surrounding markdown code fence (with optional language tag)
/// and trim.
pub fn strip_code_fence(text: &str) -> String {
    static OPEN: OnceLock<Regex> = OnceLock::new();
    static CLOSE: OnceLock<Regex> = OnceLock::new();
    let open = OPEN.get_or_init(|| Regex::new(r"^```[A-Za-z0-9_+-]*[ \t]*\r?\n?").unwrap());
    let close = CLOSE.get_or_init(|| Regex::new(r"\r?\n?```\s*$").unwrap());

    let t = text.trim();
    let t = open.replace(t, "");
    let t = close.replace(&t, "");
    t.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let p = parse_or_fallback(r#"{"sql": "SELECT 1", "reasoning": "trivial"}"#);
        assert_eq!(p.str_field("sql"), Some("SELECT 1"));
    }

    #[test]
    fn test_fenced_json() {
        let p = parse_or_fallback("```json\n{\"is_related\": true}\n```");
        assert_eq!(p.bool_field("is_related"), Some(true));
    }

    #[test]
    fn test_json_inside_prose() {
        let p = parse_or_fallback("Sure! Here you go: {\"fields\": [\"a\", \"b\"]} Hope it helps.");
        assert_eq!(p.str_list_field("fields"), vec!["a", "b"]);
    }

    #[test]
    fn test_malformed_falls_back_to_raw() {
        let p = parse_or_fallback("SELECT * FROM t");
        assert_eq!(p, Parsed::Raw("SELECT * FROM t".to_string()));
    }

    #[test]
    fn test_strip_code_fence_with_language() {
        assert_eq!(strip_code_fence("```sql\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_code_fence("no fence"), "no fence");
    }
}
