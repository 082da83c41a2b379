use regex::Regex;
use std::sync::OnceLock;
use tabsage_providers::strip_code_fence;

/// Read-only execution contract for generated statements.
///
/// The guard is the last line of defense against a generator emitting a
/// destructive or unbounded statement, applied identically no matter how
/// the statement was produced. Anything ambiguous is rejected, never
/// optimistically executed.
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    /// Hard ceiling injected/enforced as the statement's LIMIT.
    pub max_rows: u64,
    /// Schema- and data-mutating verbs rejected anywhere in the statement.
    pub denylist: Vec<String>,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            max_rows: 500,
            denylist: [
                "attach", "detach", "create", "alter", "drop", "insert", "update", "delete",
                "replace", "copy", "export", "import", "pragma", "transaction", "grant", "revoke",
                "truncate", "vacuum",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl GuardPolicy {
    fn deny_regex(&self) -> Regex {
        let alternation = self
            .denylist
            .iter()
            .map(|kw| regex::escape(kw))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("denylist terms are escaped")
    }
}

/// Remove surrounding code-fence markup, line and block comments, and one
/// trailing statement terminator.
pub fn strip_noise(sql: &str) -> String {
    static LINE_COMMENT: OnceLock<Regex> = OnceLock::new();
    static BLOCK_COMMENT: OnceLock<Regex> = OnceLock::new();
    let line = LINE_COMMENT.get_or_init(|| Regex::new(r"(?m)--.*$").unwrap());
    let block = BLOCK_COMMENT.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

    let s = strip_code_fence(sql);
    let s = line.replace_all(&s, "");
    let s = block.replace_all(&s, "");
    s.trim().trim_end_matches(';').trim().to_string()
}

/// Whether a statement is a single read-only query.
///
/// After noise-stripping: no statement separator may remain, the leading
/// keyword must be SELECT or WITH, and no denylisted keyword may appear
/// anywhere in the text.
pub fn is_select_only(sql: &str, policy: &GuardPolicy) -> bool {
    let s = strip_noise(sql);
    if s.is_empty() || s.contains(';') {
        return false;
    }
    let lower = s.trim_start().to_lowercase();
    if !(lower.starts_with("select") || lower.starts_with("with")) {
        return false;
    }
    !policy.deny_regex().is_match(&s)
}

/// Enforce the row ceiling on a statement's LIMIT clause.
///
/// No LIMIT: append one. A LIMIT larger than `max_rows` (or one whose bound
/// does not parse): rewrite to `max_rows`. A LIMIT at or under the ceiling:
/// left alone.
pub fn cap_limit(sql: &str, max_rows: u64) -> String {
    static LIMIT: OnceLock<Regex> = OnceLock::new();
    let limit = LIMIT.get_or_init(|| Regex::new(r"(?i)\blimit\s+(\d+)\b").unwrap());

    let s = strip_noise(sql);
    match limit.captures(&s) {
        None => format!("{}\nLIMIT {}", s, max_rows),
        Some(caps) => {
            let within = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .is_some_and(|n| n <= max_rows);
            if within {
                s
            } else {
                limit
                    .replace_all(&s, format!("LIMIT {}", max_rows).as_str())
                    .into_owned()
            }
        }
    }
}
