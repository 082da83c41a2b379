use crate::classify::ErrorSignatures;
use crate::guard::GuardPolicy;
use crate::history::HistoryWindow;
use crate::retry::{AttemptOutput, QueryOutcome, RetryPolicy, run_with_retry};
use crate::sql::{SqlOutcome, execute_guarded, introspect_table};
use crate::{Error, Result};
use chrono::Utc;
use rusqlite::Connection;
use std::path::PathBuf;
use tabsage_frame::{
    Frame, coerce_numeric, expand_to_full_rows, inject_row_identity, subset_markdown, to_markdown,
};
use tabsage_providers::{GenerationKind, GenerationRequest, Generator};
use tabsage_store::append_query_log;
use tabsage_types::{QueryLogRecord, ROW_IDENTITY_FIELD, RetryStatus, TableSchema, Turn};

/// External capability that runs generated table-computation code against a
/// frame. The orchestrator never interprets the code itself; whatever the
/// executor returns flows into normalization and classification.
pub trait CodeExecutor {
    fn execute(&mut self, code: &str, frame: &Frame) -> anyhow::Result<Frame>;
}

fn error_table(message: &str) -> String {
    format!("| error |\n|---|\n| {} |", message)
}

fn commit(
    history: &mut HistoryWindow,
    query_log_dir: Option<&PathBuf>,
    question: &str,
    outcome: &QueryOutcome,
) {
    match outcome.retry_info.status {
        RetryStatus::Ok | RetryStatus::EmptyFinal => {
            let mut turn = Turn::new(
                question,
                &outcome.rewritten,
                &outcome.rendered,
                outcome.used_fields.clone(),
            );
            if let Some(sql) = &outcome.generated_sql {
                turn = turn.with_sql(sql);
            }
            if let Some(code) = &outcome.generated_code {
                turn = turn.with_code(code);
            }
            history.add(turn);
        }
        RetryStatus::ErrorFinal | RetryStatus::ErrorFinalText => return,
    }

    if outcome.retry_info.status == RetryStatus::Ok
        && let Some(dir) = query_log_dir
    {
        let record = QueryLogRecord {
            timestamp: Utc::now(),
            question: question.to_string(),
            rewritten: outcome.rewritten.clone(),
            generated: outcome
                .generated_sql
                .clone()
                .or_else(|| outcome.generated_code.clone())
                .unwrap_or_default(),
            answer: outcome.rendered.clone(),
        };
        append_query_log(dir, &record);
    }
}

/// Options for the relational-variant driver.
#[derive(Debug, Clone)]
pub struct SqlAgentOptions {
    pub policy: RetryPolicy,
    pub guard: GuardPolicy,
    pub signatures: ErrorSignatures,
    pub history_budget: usize,
    /// Feed the rewritten question (not the raw one) to generation.
    pub use_rewritten_for_all: bool,
    /// DISTINCT sample values collected per column during introspection.
    pub sample_per_col: usize,
    /// Cache directory that receives `query_log.jsonl` records.
    pub query_log_dir: Option<PathBuf>,
}

impl Default for SqlAgentOptions {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            guard: GuardPolicy::default(),
            signatures: ErrorSignatures::default(),
            history_budget: 3000,
            use_rewritten_for_all: true,
            sample_per_col: 5,
            query_log_dir: None,
        }
    }
}

/// One-table question driver over a relational engine: rewrite, generate
/// SQL, guard, execute, render, classify, retry, commit.
pub struct SqlAgent<'a> {
    conn: &'a Connection,
    generator: &'a dyn Generator,
    table: String,
    schema: TableSchema,
    history: HistoryWindow,
    options: SqlAgentOptions,
}

impl<'a> SqlAgent<'a> {
    /// Introspect the target table once and set up the conversation state.
    pub fn new(
        conn: &'a Connection,
        generator: &'a dyn Generator,
        table: &str,
        options: SqlAgentOptions,
    ) -> Result<Self> {
        let schema = introspect_table(conn, table, options.sample_per_col)?;
        Ok(Self::with_schema(conn, generator, table, schema, options))
    }

    /// Set up the driver over an already-derived schema, e.g. one projected
    /// from the cache into the conversation's session.
    pub fn with_schema(
        conn: &'a Connection,
        generator: &'a dyn Generator,
        table: &str,
        schema: TableSchema,
        options: SqlAgentOptions,
    ) -> Self {
        let history = HistoryWindow::with_dedup(options.history_budget);
        Self {
            conn,
            generator,
            table: table.to_string(),
            schema,
            history,
            options,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    /// Process one user question to a terminal outcome, including all
    /// retries, then commit it to history and the query log.
    pub fn ask(&mut self, question: &str) -> Result<QueryOutcome> {
        let hist = self.history.render();
        let field_names = self.schema.field_names();
        let context = self.schema.descriptions_block();
        let conn = self.conn;
        let generator = self.generator;
        let guard = &self.options.guard;
        let use_rewritten = self.options.use_rewritten_for_all;

        let outcome = run_with_retry(
            question,
            &self.options.policy,
            &self.options.signatures,
            false,
            |q| {
                let rw = generator.rewrite(&hist, q)?;
                let q_eff = if use_rewritten {
                    rw.rewritten.clone()
                } else {
                    q.to_string()
                };

                let request = GenerationRequest {
                    question: &q_eff,
                    allowed_fields: &field_names,
                    context: &context,
                    history: &hist,
                    kind: GenerationKind::Sql,
                };
                let generated = generator.generate(&request)?;
                let sql = generated.statement.text().trim().to_string();
                if sql.is_empty() {
                    return Ok(AttemptOutput {
                        rendered: error_table("empty statement from generator"),
                        rewritten: q_eff,
                        used_fields: field_names.clone(),
                        forced_error: true,
                        ..AttemptOutput::default()
                    });
                }

                let execution = execute_guarded(conn, &sql, guard);
                match execution.outcome {
                    SqlOutcome::GuardViolation(msg) => Ok(AttemptOutput {
                        rendered: error_table(&msg),
                        reasoning: generated.reasoning,
                        rewritten: q_eff,
                        used_fields: field_names.clone(),
                        generated_sql: Some(sql),
                        forced_error: true,
                        ..AttemptOutput::default()
                    }),
                    SqlOutcome::ExecError(msg) => Err(Error::Execution(msg)),
                    SqlOutcome::Rows(frame) => Ok(AttemptOutput {
                        rendered: to_markdown(&frame),
                        reasoning: generated.reasoning,
                        rewritten: q_eff,
                        used_fields: field_names.clone(),
                        generated_sql: Some(execution.executed_sql),
                        ..AttemptOutput::default()
                    }),
                }
            },
        )?;

        commit(
            &mut self.history,
            self.options.query_log_dir.as_ref(),
            question,
            &outcome,
        );
        Ok(outcome)
    }
}

/// Options for the dataframe-variant driver.
#[derive(Debug, Clone)]
pub struct FrameAgentOptions {
    pub policy: RetryPolicy,
    pub signatures: ErrorSignatures,
    pub history_budget: usize,
    /// Rows of the preview table included as generation context; `None`
    /// skips the partial table entirely.
    pub head_rows: Option<usize>,
    /// Largest row-identity set that still expands to full source rows.
    pub expansion_ceiling: usize,
    pub use_rewritten_for_all: bool,
    pub query_log_dir: Option<PathBuf>,
}

impl Default for FrameAgentOptions {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            signatures: ErrorSignatures::default(),
            history_budget: 3000,
            head_rows: None,
            expansion_ceiling: tabsage_frame::DEFAULT_EXPANSION_CEILING,
            use_rewritten_for_all: true,
            query_log_dir: None,
        }
    }
}

/// One-table question driver over an in-memory frame and an external code
/// executor: rewrite, select fields, generate code, execute, expand partial
/// results to full rows, render, classify, retry, commit.
pub struct FrameAgent<'a> {
    source: Frame,
    schema: TableSchema,
    preview: String,
    generator: &'a dyn Generator,
    executor: &'a mut dyn CodeExecutor,
    history: HistoryWindow,
    options: FrameAgentOptions,
}

impl<'a> FrameAgent<'a> {
    pub fn new(
        source: Frame,
        schema: TableSchema,
        preview_markdown: String,
        generator: &'a dyn Generator,
        executor: &'a mut dyn CodeExecutor,
        options: FrameAgentOptions,
    ) -> Self {
        let history = HistoryWindow::new(options.history_budget);
        Self {
            source,
            schema,
            preview: preview_markdown,
            generator,
            executor,
            history,
            options,
        }
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    /// Process one user question to a terminal outcome, including all
    /// retries, then commit it to history and the query log.
    pub fn ask(&mut self, question: &str) -> Result<QueryOutcome> {
        let hist = self.history.render();
        let all_fields = self.schema.field_names();
        let numeric_fields = self.schema.numeric_fields();
        let descriptions = self.schema.descriptions_block();
        let generator = self.generator;
        let source = &self.source;
        let schema = &self.schema;
        let preview = &self.preview;
        let head_rows = self.options.head_rows;
        let ceiling = self.options.expansion_ceiling;
        let use_rewritten = self.options.use_rewritten_for_all;
        let executor = &mut *self.executor;

        let outcome = run_with_retry(
            question,
            &self.options.policy,
            &self.options.signatures,
            true,
            |q| {
                let rw = generator.rewrite(&hist, q)?;
                let q_eff = if use_rewritten {
                    rw.rewritten.clone()
                } else {
                    q.to_string()
                };

                let selection = generator.select_fields(&q_eff, &all_fields, &descriptions, &hist)?;

                // Selection union rewrite hints, filtered back into schema
                // order; nothing usable means every field stays in play.
                let mut selected: Vec<String> = all_fields
                    .iter()
                    .filter(|name| {
                        selection.fields.contains(*name) || rw.field_hints.contains(*name)
                    })
                    .cloned()
                    .collect();
                if selected.is_empty() {
                    selected = all_fields.clone();
                }

                let mut context = String::new();
                for name in &selected {
                    if let Some(field) = schema.field(name) {
                        context.push_str(&format!("- {}: {}\n", name, field.definition.join(" ")));
                    }
                }
                if let Some(head) = head_rows
                    && let Ok(partial) = subset_markdown(preview, &selected, Some(head))
                {
                    context.push_str("\nPreview:\n");
                    context.push_str(&partial);
                }

                let mut calc = inject_row_identity(&source.select(&selected));
                coerce_numeric(&mut calc, &numeric_fields);

                let mut allowed = vec![ROW_IDENTITY_FIELD.to_string()];
                allowed.extend(selected.iter().cloned());

                let request = GenerationRequest {
                    question: &q_eff,
                    allowed_fields: &allowed,
                    context: &context,
                    history: &hist,
                    kind: GenerationKind::Code,
                };
                let generated = generator.generate(&request)?;
                let code = generated.statement.text().trim().to_string();
                if code.is_empty() {
                    return Ok(AttemptOutput {
                        rendered: error_table("empty code from generator"),
                        rewritten: q_eff,
                        used_fields: allowed,
                        forced_error: true,
                        ..AttemptOutput::default()
                    });
                }

                let result = executor
                    .execute(&code, &calc)
                    .map_err(|e| Error::Execution(e.to_string()))?;

                // A small row-identity set promotes the partial result to
                // the matching full source rows.
                let rendered = match expand_to_full_rows(source, &result, ceiling) {
                    Some(full) if !full.is_empty() => to_markdown(&full),
                    _ => to_markdown(&result),
                };

                Ok(AttemptOutput {
                    rendered,
                    reasoning: generated.reasoning,
                    rewritten: q_eff,
                    used_fields: allowed,
                    generated_code: Some(code),
                    ..AttemptOutput::default()
                })
            },
        )?;

        commit(
            &mut self.history,
            self.options.query_log_dir.as_ref(),
            question,
            &outcome,
        );
        Ok(outcome)
    }
}
