use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One question/answer exchange plus its metadata.
///
/// Turns are append-only and ordered; they are committed to the history
/// window only after an attempt reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub rewritten: String,
    /// Rendered answer (markdown table text).
    pub answer: String,
    pub used_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_sql: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(question: &str, rewritten: &str, answer: &str, used_fields: Vec<String>) -> Self {
        Self {
            question: question.trim().to_string(),
            rewritten: rewritten.trim().to_string(),
            answer: answer.trim().to_string(),
            used_fields,
            generated_code: None,
            generated_sql: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_sql(mut self, sql: &str) -> Self {
        self.generated_sql = Some(sql.to_string());
        self
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.generated_code = Some(code.to_string());
        self
    }

    /// Whether two turns carry the same comparable content.
    ///
    /// Used by the relational variant to suppress consecutive duplicates so
    /// retry loops cannot inflate the history with identical turns.
    pub fn same_content(&self, other: &Turn) -> bool {
        self.question == other.question
            && self.rewritten == other.rewritten
            && self.answer == other.answer
            && self.generated_sql == other.generated_sql
    }
}

/// Terminal status of one logical question after 1..N attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStatus {
    Ok,
    /// Every attempt produced a contentless result.
    EmptyFinal,
    /// Every attempt raised a generator/executor error.
    ErrorFinal,
    /// Every attempt produced text matching a known failure signature.
    ErrorFinalText,
}

impl fmt::Display for RetryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RetryStatus::Ok => "ok",
            RetryStatus::EmptyFinal => "empty_final",
            RetryStatus::ErrorFinal => "error_final",
            RetryStatus::ErrorFinalText => "error_final_text",
        };
        f.write_str(s)
    }
}

/// Attempt summary attached to every terminal outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryInfo {
    pub attempts: u32,
    pub status: RetryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RetryInfo {
    pub fn ok(attempts: u32) -> Self {
        Self {
            attempts,
            status: RetryStatus::Ok,
            error: None,
        }
    }
}

/// One line of `query_log.jsonl`, appended per successfully committed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogRecord {
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub rewritten: String,
    /// Generated code or SQL, whichever the variant produced.
    pub generated: String,
    pub answer: String,
}
