use std::collections::VecDeque;
use std::sync::Mutex;
use tabsage_frame::Frame;
use tabsage_providers::{
    GeneratedStatement, GenerationKind, GenerationRequest, GenerationResult, Generator,
    RewriteResult, SelectionResult,
};

/// Generator whose `generate` answers come from a scripted queue.
///
/// `rewrite` passes the question through (echoing it as the rewritten form)
/// and `select_fields` returns every offered field, so tests exercise the
/// orchestrator rather than language understanding. When the queue runs
/// dry the last statement repeats, which is what retry loops need.
pub struct ScriptedGenerator {
    statements: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    questions_seen: Mutex<Vec<String>>,
    generate_calls: Mutex<u32>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            statements: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            questions_seen: Mutex::new(Vec::new()),
            generate_calls: Mutex::new(0),
        }
    }

    /// Queue the next statement `generate` hands back.
    pub fn push_statement(self, statement: &str) -> Self {
        self.statements
            .lock()
            .unwrap()
            .push_back(statement.to_string());
        self
    }

    /// Number of times `generate` was invoked.
    pub fn generate_calls(&self) -> u32 {
        *self.generate_calls.lock().unwrap()
    }

    /// Questions as they arrived at `generate`, attempt by attempt.
    pub fn questions_seen(&self) -> Vec<String> {
        self.questions_seen.lock().unwrap().clone()
    }
}

impl Generator for ScriptedGenerator {
    fn rewrite(&self, _history: &str, question: &str) -> tabsage_providers::Result<RewriteResult> {
        Ok(RewriteResult {
            is_related: false,
            reason: "scripted".to_string(),
            rewritten: question.to_string(),
            field_hints: Vec::new(),
        })
    }

    fn select_fields(
        &self,
        _question: &str,
        field_names: &[String],
        _field_descriptions: &str,
        _history: &str,
    ) -> tabsage_providers::Result<SelectionResult> {
        Ok(SelectionResult {
            fields: field_names.to_vec(),
        })
    }

    fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> tabsage_providers::Result<GenerationResult> {
        *self.generate_calls.lock().unwrap() += 1;
        self.questions_seen
            .lock()
            .unwrap()
            .push(request.question.to_string());

        let mut last = self.last.lock().unwrap();
        let text = match self.statements.lock().unwrap().pop_front() {
            Some(next) => {
                *last = Some(next.clone());
                next
            }
            None => last.clone().unwrap_or_default(),
        };

        let statement = match request.kind {
            GenerationKind::Sql => GeneratedStatement::Sql(text),
            GenerationKind::Code => GeneratedStatement::Code(text),
        };
        Ok(GenerationResult {
            statement,
            reasoning: "scripted".to_string(),
        })
    }
}

/// Code executor whose outcomes come from a scripted queue; the last
/// outcome repeats once the queue runs dry.
pub struct ScriptedCodeExecutor {
    outcomes: VecDeque<Result<Frame, String>>,
    last_error: Option<String>,
    last_frame: Option<Frame>,
    pub codes_seen: Vec<String>,
}

impl Default for ScriptedCodeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedCodeExecutor {
    pub fn new() -> Self {
        Self {
            outcomes: VecDeque::new(),
            last_error: None,
            last_frame: None,
            codes_seen: Vec::new(),
        }
    }

    pub fn push_frame(mut self, frame: Frame) -> Self {
        self.outcomes.push_back(Ok(frame));
        self
    }

    pub fn push_error(mut self, message: &str) -> Self {
        self.outcomes.push_back(Err(message.to_string()));
        self
    }

    /// Record the code and hand back the next scripted outcome. Signature
    /// matches the engine's executor seam so tests can delegate to it.
    pub fn execute(&mut self, code: &str, _frame: &Frame) -> anyhow::Result<Frame> {
        self.codes_seen.push(code.to_string());
        match self.outcomes.pop_front() {
            Some(Ok(frame)) => {
                self.last_frame = Some(frame.clone());
                self.last_error = None;
                Ok(frame)
            }
            Some(Err(msg)) => {
                self.last_error = Some(msg.clone());
                self.last_frame = None;
                Err(anyhow::anyhow!(msg))
            }
            None => {
                if let Some(msg) = &self.last_error {
                    Err(anyhow::anyhow!(msg.clone()))
                } else {
                    Ok(self.last_frame.clone().unwrap_or_default())
                }
            }
        }
    }
}
