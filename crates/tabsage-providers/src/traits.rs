use crate::Result;

/// Natural-language understanding capability consumed by the orchestrator.
///
/// Responsibilities:
/// - Rewrite a follow-up question into a self-contained one using history
/// - Select the field subset a question needs
/// - Turn a question plus schema context into an executable statement
///
/// All three are potentially-failing, potentially-slow remote calls; the
/// orchestrator treats them as black boxes and classifies their failures.
pub trait Generator: Send + Sync {
    fn rewrite(&self, history: &str, question: &str) -> Result<RewriteResult>;

    fn select_fields(
        &self,
        question: &str,
        field_names: &[String],
        field_descriptions: &str,
        history: &str,
    ) -> Result<SelectionResult>;

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GenerationResult>;
}

/// Outcome of a rewrite call.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteResult {
    /// Whether the question refers back to earlier turns.
    pub is_related: bool,
    pub reason: String,
    /// Self-contained restatement of the question.
    pub rewritten: String,
    /// Field names the rewriter believes the question touches.
    pub field_hints: Vec<String>,
}

impl RewriteResult {
    /// Fallback when the backend returns malformed content: treat the
    /// question as unrelated and pass it through unchanged.
    pub fn passthrough(question: &str) -> Self {
        Self {
            is_related: false,
            reason: String::new(),
            rewritten: question.to_string(),
            field_hints: Vec::new(),
        }
    }
}

/// Outcome of a field-selection call.
///
/// An empty selection is a valid answer; callers fall back to the full
/// field list when nothing usable remains after intersection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionResult {
    pub fields: Vec<String>,
}

/// Which kind of executable artifact the generator should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Sql,
    Code,
}

/// Everything a generation call needs, assembled by the orchestrator.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub question: &'a str,
    /// Field names the generated statement may reference, including the
    /// hidden row-identity field.
    pub allowed_fields: &'a [String],
    /// Field definition block plus any partial preview table.
    pub context: &'a str,
    pub history: &'a str,
    pub kind: GenerationKind,
}

/// Generated statement plus the backend's one-line rationale.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub statement: GeneratedStatement,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedStatement {
    Sql(String),
    Code(String),
}

impl GeneratedStatement {
    pub fn text(&self) -> &str {
        match self {
            GeneratedStatement::Sql(s) | GeneratedStatement::Code(s) => s,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text().trim().is_empty()
    }
}
