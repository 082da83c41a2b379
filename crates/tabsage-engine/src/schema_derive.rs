use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tabsage_frame::{Frame, to_markdown};
use tabsage_types::{FieldSchema, FieldSummary, FieldType, TableSchema};

const NUMERIC_EXAMPLES: usize = 8;
const TEXT_EXAMPLES: usize = 10;

fn numeric_like() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+(?:\.\d+)?$").unwrap())
}

/// Derive a schema description from a loaded frame: per-field type hints,
/// summary statistics, and a two-line natural-language definition.
///
/// A field counts as numeric when any of its non-blank cells parse as a
/// number; stray garbage in a numeric column is handled later by coercion,
/// not here.
pub fn derive_schema(frame: &Frame) -> TableSchema {
    let fields = frame
        .header()
        .iter()
        .enumerate()
        .map(|(i, name)| derive_field(frame, i, name))
        .collect();
    TableSchema { fields }
}

/// Render the preview artifact: the first `head` rows as a markdown table.
pub fn render_preview(frame: &Frame, head: usize) -> String {
    to_markdown(&frame.head(head))
}

fn derive_field(frame: &Frame, index: usize, name: &str) -> FieldSchema {
    let cells: Vec<String> = frame
        .rows()
        .iter()
        .map(|r| r[index].render().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let numeric: Vec<f64> = cells
        .iter()
        .filter(|s| numeric_like().is_match(s))
        .filter_map(|s| s.parse::<f64>().ok())
        .collect();

    if numeric.is_empty() {
        text_field(name, &cells)
    } else {
        numeric_field(name, &numeric)
    }
}

fn numeric_field(name: &str, values: &[f64]) -> FieldSchema {
    let count = values.len();
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / count as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    let std = variance.sqrt();

    let mut examples = Vec::new();
    for &v in values {
        if !examples.iter().any(|&e: &f64| e.to_bits() == v.to_bits()) {
            examples.push(v);
        }
        if examples.len() == NUMERIC_EXAMPLES {
            break;
        }
    }

    FieldSchema {
        name: name.to_string(),
        dtype: FieldType::Float,
        definition: vec![
            format!(
                "[info] Numeric field '{}': used for comparison, sorting, and extrema search.",
                name
            ),
            format!("[format] float; value range \u{2248} [{}, {}].", min, max),
        ],
        summary: Some(FieldSummary::Numeric {
            count,
            min,
            max,
            mean,
            std,
            examples,
        }),
        samples: vec![],
        sql_type: None,
    }
}

fn text_field(name: &str, cells: &[String]) -> FieldSchema {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for cell in cells {
        let entry = counts.entry(cell.as_str()).or_insert(0);
        if *entry == 0 {
            first_seen.push(cell.as_str());
        }
        *entry += 1;
    }

    // Most frequent first; first-seen order breaks ties deterministically.
    let mut ranked: Vec<&str> = first_seen.clone();
    ranked.sort_by_key(|v| std::cmp::Reverse(counts[v]));
    let examples: Vec<String> = ranked
        .iter()
        .take(TEXT_EXAMPLES)
        .map(|s| s.to_string())
        .collect();

    let shown = examples
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    FieldSchema {
        name: name.to_string(),
        dtype: FieldType::Text,
        definition: vec![
            format!(
                "[info] Text field '{}': used for filtering, equality matching, and group extraction.",
                name
            ),
            format!("[format] string; representative values: {}.", shown),
        ],
        summary: Some(FieldSummary::Text {
            count: cells.len(),
            unique_count: first_seen.len(),
            examples,
        }),
        samples: vec![],
        sql_type: None,
    }
}
