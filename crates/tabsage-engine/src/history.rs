use tabsage_types::Turn;

/// Token cost model for history rendering.
///
/// Must be monotonic and deterministic: the budget check depends on the
/// same text always costing the same amount.
pub trait TokenEstimator: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Length-based fallback estimator: one token per four characters, rounded
/// up, never less than one. Used when no real tokenizer is wired in; it
/// never under-counts relative to itself, so a window sized with it cannot
/// overflow a prompt sized with it.
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4).max(1)
    }
}

/// Token-budgeted conversation memory.
///
/// Turns accumulate append-only; `render` serializes whole turns from most
/// recent backward while the running cost stays within the budget fixed at
/// construction, then emits the kept turns in chronological order.
pub struct HistoryWindow {
    turns: Vec<Turn>,
    max_tokens: usize,
    dedup_consecutive: bool,
    estimator: Box<dyn TokenEstimator>,
}

impl HistoryWindow {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_tokens,
            dedup_consecutive: false,
            estimator: Box::new(HeuristicEstimator),
        }
    }

    /// Window that suppresses consecutive duplicate turns, used by the
    /// relational variant so retry loops cannot inflate history.
    pub fn with_dedup(max_tokens: usize) -> Self {
        Self {
            dedup_consecutive: true,
            ..Self::new(max_tokens)
        }
    }

    pub fn with_estimator(mut self, estimator: Box<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn add(&mut self, turn: Turn) {
        if self.dedup_consecutive
            && let Some(last) = self.turns.last()
            && last.same_content(&turn)
        {
            return;
        }
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Serialize the most recent turns that fit the token budget, oldest
    /// kept turn first.
    pub fn render(&self) -> String {
        if self.turns.is_empty() {
            return String::new();
        }

        let mut kept: Vec<String> = Vec::new();
        let mut total = 0usize;
        for turn in self.turns.iter().rev() {
            let block = format_turn(turn);
            // The joining newline is charged to its block so the rendered
            // total can never land over budget.
            let cost = self.estimator.count(&block) + 1;
            if total + cost > self.max_tokens {
                break;
            }
            total += cost;
            kept.push(block);
        }
        kept.reverse();
        kept.join("\n")
    }
}

fn format_turn(turn: &Turn) -> String {
    let used = serde_json::to_string(&turn.used_fields).unwrap_or_else(|_| "[]".to_string());
    let mut block = format!(
        "<turn>\n<question>{}</question>\n<rewritten>{}</rewritten>\n<answer>{}</answer>\n<used_fields>{}</used_fields>",
        turn.question, turn.rewritten, turn.answer, used
    );
    if let Some(sql) = &turn.generated_sql {
        block.push_str(&format!("\n<sql>{}</sql>", sql));
    }
    if let Some(code) = &turn.generated_code {
        block.push_str(&format!("\n<code>{}</code>", code));
    }
    block.push_str("\n</turn>");
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(n: usize) -> Turn {
        Turn::new(
            &format!("question {}", n),
            &format!("rewritten {}", n),
            &format!("| answer {} |", n),
            vec!["f".to_string()],
        )
    }

    #[test]
    fn test_render_is_chronological() {
        let mut h = HistoryWindow::new(10_000);
        h.add(turn(1));
        h.add(turn(2));
        let text = h.render();
        let first = text.find("question 1").unwrap();
        let second = text.find("question 2").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_budget_never_exceeded() {
        let mut h = HistoryWindow::new(60);
        for n in 0..20 {
            h.add(turn(n));
        }
        let text = h.render();
        let est = HeuristicEstimator;
        assert!(est.count(&text) <= 60);
        // Most recent turn survives when it alone fits.
        assert!(text.contains("question 19"));
        assert!(!text.contains("question 0"));
    }

    #[test]
    fn test_single_oversized_turn_renders_nothing() {
        let mut h = HistoryWindow::new(2);
        h.add(turn(1));
        assert_eq!(h.render(), "");
    }

    #[test]
    fn test_empty_window_renders_empty() {
        let h = HistoryWindow::new(100);
        assert_eq!(h.render(), "");
    }

    #[test]
    fn test_dedup_suppresses_consecutive_duplicates() {
        let mut h = HistoryWindow::with_dedup(10_000);
        let t = turn(1);
        h.add(t.clone());
        h.add(t.clone());
        assert_eq!(h.len(), 1);
        h.add(turn(2));
        h.add(t);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn test_no_dedup_without_flag() {
        let mut h = HistoryWindow::new(10_000);
        let t = turn(1);
        h.add(t.clone());
        h.add(t);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_sql_and_code_blocks_present_only_when_set() {
        let mut h = HistoryWindow::new(10_000);
        h.add(turn(1));
        assert!(!h.render().contains("<sql>"));

        let mut h = HistoryWindow::new(10_000);
        h.add(turn(1).with_sql("SELECT 1"));
        let text = h.render();
        assert!(text.contains("<sql>SELECT 1</sql>"));
        assert!(!text.contains("<code>"));
    }

    #[test]
    fn test_heuristic_rounds_up() {
        let est = HeuristicEstimator;
        assert_eq!(est.count(""), 1);
        assert_eq!(est.count("abcd"), 1);
        assert_eq!(est.count("abcde"), 2);
    }
}
