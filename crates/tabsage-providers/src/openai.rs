use crate::extract::{Parsed, parse_or_fallback};
use crate::traits::{
    GeneratedStatement, GenerationKind, GenerationRequest, GenerationResult, Generator,
    RewriteResult, SelectionResult,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Connection settings for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL without the `/chat/completions` suffix.
    pub base_url: String,
    pub api_key: String,
    /// Model for rewriting and field selection.
    pub rewrite_model: String,
    /// Model for statement generation.
    pub generate_model: String,
}

impl OpenAiConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: api_key.to_string(),
            rewrite_model: "gpt-4o".to_string(),
            generate_model: "gpt-4o".to_string(),
        }
    }
}

/// Blocking chat backend implementing the [`Generator`] capability against
/// any OpenAI-compatible endpoint.
pub struct OpenAiGenerator {
    config: OpenAiConfig,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: reqwest::blocking::Client::new(),
        }
    }

    fn chat(&self, model: &str, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
            max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json()?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| Error::EmptyResponse(model.to_string()))
    }
}

const REWRITE_SYSTEM: &str = "You rewrite data questions. Read the prior \
conversation in <history> and the current <question>, decide whether the \
question refers back to earlier turns, resolve pronouns and references like \
'those rows' or 'the value above' against the most recent answer, and output \
JSON only.";

const SELECT_SYSTEM: &str = "You pick the table fields a question needs. \
Given the field list with definitions, the question, and the conversation \
history, answer with JSON only.";

const SQL_SYSTEM: &str = "You translate questions into SQLite SQL. \
Generate SELECT-only queries: no DDL, no DML, a single statement, only the \
given table and fields, ORDER BY before LIMIT, guard numeric comparisons \
with IS NOT NULL and CAST where needed. Answer with JSON only: \
{\"sql\": \"SELECT ...\", \"reasoning\": \"one line\"}.";

const CODE_SYSTEM: &str = "You translate questions into table-computation \
code over a dataframe named df. Use only the allowed fields, keep the hidden \
__row_idx field when the user asks for whole rows, and store the final table \
in a variable named result. Answer with JSON only: \
{\"code\": \"...\", \"reasoning\": \"one line\"}.";

impl Generator for OpenAiGenerator {
    fn rewrite(&self, history: &str, question: &str) -> Result<RewriteResult> {
        let user = format!(
            "Output format:\n{{\n  \"is_related\": true|false,\n  \"reason\": \"one line\",\n  \
             \"rewritten\": \"self-contained question\",\n  \"field_hints\": [\"field\", ...]\n}}\n\n\
             <history>\n{}\n</history>\n\n<question>\n{}\n</question>",
            if history.is_empty() { "(none)" } else { history },
            question
        );
        let raw = self.chat(&self.config.rewrite_model, REWRITE_SYSTEM, &user, 400)?;
        let parsed = parse_or_fallback(&raw);
        if matches!(parsed, Parsed::Raw(_)) {
            tracing::warn!("rewrite returned malformed JSON; passing question through");
            return Ok(RewriteResult::passthrough(question));
        }
        Ok(RewriteResult {
            is_related: parsed.bool_field("is_related").unwrap_or(false),
            reason: parsed.str_field("reason").unwrap_or_default().to_string(),
            rewritten: parsed
                .str_field("rewritten")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(question)
                .to_string(),
            field_hints: parsed.str_list_field("field_hints"),
        })
    }

    fn select_fields(
        &self,
        question: &str,
        field_names: &[String],
        field_descriptions: &str,
        history: &str,
    ) -> Result<SelectionResult> {
        let user = format!(
            "Output format: {{\"fields\": [\"name\", ...]}} using only names from the list.\n\n\
             <fields>\n{}\n</fields>\n\n<definitions>\n{}\n</definitions>\n\n\
             <history>\n{}\n</history>\n\n<question>\n{}\n</question>",
            field_names.join(", "),
            field_descriptions,
            if history.is_empty() { "(none)" } else { history },
            question
        );
        let raw = self.chat(&self.config.rewrite_model, SELECT_SYSTEM, &user, 400)?;
        let parsed = parse_or_fallback(&raw);
        Ok(SelectionResult {
            fields: parsed.str_list_field("fields"),
        })
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GenerationResult> {
        let (system, key) = match request.kind {
            GenerationKind::Sql => (SQL_SYSTEM, "sql"),
            GenerationKind::Code => (CODE_SYSTEM, "code"),
        };
        let user = format!(
            "<allowed_fields>\n{}\n</allowed_fields>\n\n<context>\n{}\n</context>\n\n\
             <history>\n{}\n</history>\n\n<question>\n{}\n</question>",
            request.allowed_fields.join(", "),
            if request.context.is_empty() {
                "(no field definitions)"
            } else {
                request.context
            },
            if request.history.is_empty() {
                "(none)"
            } else {
                request.history
            },
            request.question
        );
        let raw = self.chat(&self.config.generate_model, system, &user, 600)?;
        let parsed = parse_or_fallback(&raw);

        // A backend that ignores the JSON contract still usually returns a
        // bare statement; take the raw text in that case.
        let text = match &parsed {
            Parsed::Structured(_) => parsed.str_field(key).unwrap_or_default().to_string(),
            Parsed::Raw(raw) => raw.clone(),
        };
        let statement = match request.kind {
            GenerationKind::Sql => GeneratedStatement::Sql(text),
            GenerationKind::Code => GeneratedStatement::Code(text),
        };
        Ok(GenerationResult {
            statement,
            reasoning: parsed.str_field("reasoning").unwrap_or_default().to_string(),
        })
    }
}
