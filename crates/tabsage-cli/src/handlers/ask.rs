use crate::config::Config;
use crate::context::bind_source;
use crate::handlers::status_line;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabsage_engine::{GuardPolicy, RetryPolicy, SqlAgent, SqlAgentOptions};
use tabsage_providers::{OpenAiConfig, OpenAiGenerator};
use tabsage_store::Store;
use tabsage_types::TableSchema;
use uuid::Uuid;

pub struct AskArgs {
    pub source: PathBuf,
    pub table: Option<String>,
    pub thread: Option<String>,
    pub max_retries: Option<u32>,
    pub no_rewrite: bool,
    pub question: String,
}

/// One question against a source: bind, project into the thread's session,
/// and drive the SQL agent to a terminal outcome.
pub fn run(workspace: &Path, args: AskArgs) -> Result<()> {
    let store = Store::open(workspace)?;
    let config = Config::load_from(&Config::path(workspace))?;
    let api_key = std::env::var(&config.generator.api_key_env).with_context(|| {
        format!(
            "{} is not set; the generator backend needs an API key",
            config.generator.api_key_env
        )
    })?;

    let bound = bind_source(
        &store,
        &args.source,
        args.table.as_deref(),
        config.limits.preview_rows,
    )?;
    let thread = args.thread.unwrap_or_else(|| Uuid::new_v4().to_string());
    let session = store.project_into_session(&thread, &bound.entry)?;

    // Generation runs off the projected artifacts, never an unproved schema.
    let schema: TableSchema =
        serde_json::from_str(&std::fs::read_to_string(session.schema_path())?)?;

    let generator = OpenAiGenerator::new(OpenAiConfig {
        base_url: config.generator.base_url.clone(),
        api_key,
        rewrite_model: config.generator.rewrite_model.clone(),
        generate_model: config.generator.generate_model.clone(),
    });

    let options = SqlAgentOptions {
        policy: RetryPolicy {
            max_retries: args.max_retries.unwrap_or(config.limits.max_retries),
            backoff_base: Duration::from_millis(config.limits.backoff_ms),
            retry_on_empty: config.limits.retry_on_empty,
            retry_on_error: config.limits.retry_on_error,
        },
        guard: GuardPolicy {
            max_rows: config.limits.max_rows,
            ..GuardPolicy::default()
        },
        history_budget: config.limits.history_budget,
        use_rewritten_for_all: !args.no_rewrite,
        query_log_dir: Some(bound.entry.dir().to_path_buf()),
        ..SqlAgentOptions::default()
    };

    let mut agent = SqlAgent::with_schema(&bound.conn, &generator, &bound.table, schema, options);
    let outcome = agent.ask(&args.question)?;

    println!("{}", outcome.rendered);
    println!();
    println!(
        "{}",
        status_line(&format!(
            "thread {} | attempts {} | status {}",
            thread, outcome.retry_info.attempts, outcome.retry_info.status
        ))
    );
    if let Some(sql) = &outcome.generated_sql {
        println!("{}", status_line(&format!("sql: {}", sql.replace('\n', " "))));
    }
    Ok(())
}
