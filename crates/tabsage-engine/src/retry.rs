use crate::classify::{Classification, ErrorSignatures, classify};
use crate::Result;
use std::time::Duration;
use tabsage_types::{RetryInfo, RetryStatus};

/// Retry configuration for one orchestrator instance.
///
/// Passed in explicitly by the owning process; the core reads no ambient
/// configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first, so a question runs at most
    /// `max_retries + 1` times.
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub retry_on_empty: bool,
    pub retry_on_error: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base: Duration::from_millis(500),
            retry_on_empty: true,
            retry_on_error: true,
        }
    }
}

/// What one attempt hands back to the retry driver.
#[derive(Debug, Clone, Default)]
pub struct AttemptOutput {
    /// Rendered answer (markdown table text).
    pub rendered: String,
    pub reasoning: String,
    pub rewritten: String,
    pub used_fields: Vec<String>,
    pub generated_sql: Option<String>,
    pub generated_code: Option<String>,
    /// The attempt was stopped before execution (guard rejection, empty
    /// statement); classified ERROR regardless of rendered content and
    /// never committed as a success.
    pub forced_error: bool,
}

/// Terminal result of one logical question after 1..N attempts.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub rendered: String,
    pub reasoning: String,
    pub rewritten: String,
    pub used_fields: Vec<String>,
    pub generated_sql: Option<String>,
    pub generated_code: Option<String>,
    pub retry_info: RetryInfo,
}

impl QueryOutcome {
    pub fn is_ok(&self) -> bool {
        self.retry_info.status == RetryStatus::Ok
    }

    fn from_attempt(out: AttemptOutput, retry_info: RetryInfo) -> Self {
        Self {
            rendered: out.rendered,
            reasoning: out.reasoning,
            rewritten: out.rewritten,
            used_fields: out.used_fields,
            generated_sql: out.generated_sql,
            generated_code: out.generated_code,
            retry_info,
        }
    }
}

/// Reinforced restatement used for every attempt after the first.
pub(crate) fn augment_question(question: &str) -> String {
    format!(
        "{} (re-asking: interpret the figures and conditions precisely so the result is not empty)",
        question
    )
}

/// Drive one logical question through up to `max_retries + 1` attempts.
///
/// The state machine is ATTEMPTING -> (OK | EMPTY | ERROR): OK commits,
/// EMPTY and ERROR back off exponentially and retry with the augmented
/// question, and exhaustion surfaces the last outcome tagged with its
/// terminal status. An attempt error is classified, not propagated, unless
/// error retries are disabled by configuration.
pub fn run_with_retry<F>(
    question: &str,
    policy: &RetryPolicy,
    signatures: &ErrorSignatures,
    require_table_shape: bool,
    mut attempt: F,
) -> Result<QueryOutcome>
where
    F: FnMut(&str) -> Result<AttemptOutput>,
{
    let mut attempts = 0u32;

    loop {
        let question_for_attempt = if attempts == 0 {
            question.to_string()
        } else {
            augment_question(question)
        };

        match attempt(&question_for_attempt) {
            Ok(out) => {
                let class = if out.forced_error {
                    Classification::Error
                } else {
                    classify(&out.reasoning, &out.rendered, require_table_shape, signatures)
                };

                match class {
                    Classification::Ok => {
                        return Ok(QueryOutcome::from_attempt(out, RetryInfo::ok(attempts + 1)));
                    }
                    Classification::Empty => {
                        // Detection disabled: the contentless result passes
                        // through as a committed answer.
                        if !policy.retry_on_empty {
                            return Ok(QueryOutcome::from_attempt(out, RetryInfo::ok(attempts + 1)));
                        }
                        attempts += 1;
                        if attempts > policy.max_retries {
                            let info = RetryInfo {
                                attempts,
                                status: RetryStatus::EmptyFinal,
                                error: None,
                            };
                            return Ok(QueryOutcome::from_attempt(out, info));
                        }
                        backoff(policy, attempts);
                    }
                    Classification::Error => {
                        if !policy.retry_on_error {
                            if out.forced_error {
                                // A guard rejection is never a success even
                                // with content detection switched off.
                                let info = RetryInfo {
                                    attempts: attempts + 1,
                                    status: RetryStatus::ErrorFinalText,
                                    error: None,
                                };
                                return Ok(QueryOutcome::from_attempt(out, info));
                            }
                            return Ok(QueryOutcome::from_attempt(out, RetryInfo::ok(attempts + 1)));
                        }
                        attempts += 1;
                        if attempts > policy.max_retries {
                            let info = RetryInfo {
                                attempts,
                                status: RetryStatus::ErrorFinalText,
                                error: None,
                            };
                            return Ok(QueryOutcome::from_attempt(out, info));
                        }
                        backoff(policy, attempts);
                    }
                }
            }
            Err(err) => {
                if !policy.retry_on_error {
                    return Err(err);
                }
                attempts += 1;
                if attempts > policy.max_retries {
                    let text = err.to_string();
                    return Ok(QueryOutcome {
                        rendered: format!("| error |\n|---|\n| {} |", text),
                        reasoning: String::new(),
                        rewritten: question.to_string(),
                        used_fields: Vec::new(),
                        generated_sql: None,
                        generated_code: None,
                        retry_info: RetryInfo {
                            attempts,
                            status: RetryStatus::ErrorFinal,
                            error: Some(text),
                        },
                    });
                }
                backoff(policy, attempts);
            }
        }
    }
}

fn backoff(policy: &RetryPolicy, attempt: u32) {
    let multiplier = 1u32 << (attempt.saturating_sub(1)).min(16);
    std::thread::sleep(policy.backoff_base * multiplier);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            backoff_base: Duration::ZERO,
            ..RetryPolicy::default()
        }
    }

    fn table_output() -> AttemptOutput {
        AttemptOutput {
            rendered: "| a |\n|---|\n| 1 |".to_string(),
            rewritten: "q".to_string(),
            ..AttemptOutput::default()
        }
    }

    #[test]
    fn test_first_attempt_success() {
        let out = run_with_retry("q", &fast_policy(), &ErrorSignatures::default(), false, |_| {
            Ok(table_output())
        })
        .unwrap();
        assert!(out.is_ok());
        assert_eq!(out.retry_info.attempts, 1);
    }

    #[test]
    fn test_augmented_question_after_first_attempt() {
        let mut seen = Vec::new();
        let _ = run_with_retry("base q", &fast_policy(), &ErrorSignatures::default(), false, |q| {
            seen.push(q.to_string());
            Ok(AttemptOutput::default()) // blank renders as empty
        })
        .unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], "base q");
        assert!(seen[1].starts_with("base q ("));
        assert_eq!(seen[1], seen[2]);
    }

    #[test]
    fn test_exhausted_empty_is_empty_final() {
        let out = run_with_retry("q", &fast_policy(), &ErrorSignatures::default(), false, |_| {
            Ok(AttemptOutput::default())
        })
        .unwrap();
        assert_eq!(out.retry_info.status, RetryStatus::EmptyFinal);
        assert_eq!(out.retry_info.attempts, 3);
    }

    #[test]
    fn test_attempt_errors_do_not_propagate() {
        let out = run_with_retry("q", &fast_policy(), &ErrorSignatures::default(), false, |_| {
            Err(Error::Execution("boom".to_string()))
        })
        .unwrap();
        assert_eq!(out.retry_info.status, RetryStatus::ErrorFinal);
        assert_eq!(out.retry_info.attempts, 3);
        assert!(out.rendered.contains("boom"));
        assert_eq!(out.retry_info.error.as_deref(), Some("Execution error: boom"));
    }

    #[test]
    fn test_error_propagates_when_retries_disabled() {
        let policy = RetryPolicy {
            retry_on_error: false,
            ..fast_policy()
        };
        let result = run_with_retry("q", &policy, &ErrorSignatures::default(), false, |_| {
            Err(Error::Execution("boom".to_string()))
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_detection_disabled_commits_result() {
        let policy = RetryPolicy {
            retry_on_empty: false,
            ..fast_policy()
        };
        let out = run_with_retry("q", &policy, &ErrorSignatures::default(), false, |_| {
            Ok(AttemptOutput::default())
        })
        .unwrap();
        assert!(out.is_ok());
        assert_eq!(out.retry_info.attempts, 1);
    }

    #[test]
    fn test_forced_error_never_commits_even_without_error_retries() {
        let policy = RetryPolicy {
            retry_on_error: false,
            ..fast_policy()
        };
        let out = run_with_retry("q", &policy, &ErrorSignatures::default(), false, |_| {
            Ok(AttemptOutput {
                forced_error: true,
                rendered: "| error |\n|---|\n| guard violation |".to_string(),
                ..AttemptOutput::default()
            })
        })
        .unwrap();
        assert_eq!(out.retry_info.status, RetryStatus::ErrorFinalText);
    }

    #[test]
    fn test_recovery_on_second_attempt() {
        let mut calls = 0;
        let out = run_with_retry("q", &fast_policy(), &ErrorSignatures::default(), false, |_| {
            calls += 1;
            if calls == 1 {
                Ok(AttemptOutput::default())
            } else {
                Ok(table_output())
            }
        })
        .unwrap();
        assert!(out.is_ok());
        assert_eq!(out.retry_info.attempts, 2);
    }
}
