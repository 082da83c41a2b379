use crate::frame::{Frame, Value};
use crate::{Error, Result};

/// Fixed rendering of an empty result: one header, one data row.
pub const EMPTY_SENTINEL: &str = "| (empty) |\n|---|\n| (no rows) |";

/// Render a frame as a pipe-delimited markdown table.
///
/// This is the single user-facing table contract: header row, dash
/// separator, one row per record. Round-tripping the output through
/// [`parse_markdown`] recovers the same header and cell strings.
pub fn to_markdown(frame: &Frame) -> String {
    if frame.is_empty() || frame.width() == 0 {
        return EMPTY_SENTINEL.to_string();
    }
    let header = format!("| {} |", frame.header().join(" | "));
    let sep = format!("|{}|", vec!["---"; frame.width()].join("|"));
    let mut lines = vec![header, sep];
    for row in frame.rows() {
        let cells: Vec<String> = row.iter().map(Value::render).collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    lines.join("\n")
}

/// Parse the first pipe-delimited table block out of `text`.
///
/// Cells come back as text values with surrounding whitespace trimmed,
/// exactly inverting [`to_markdown`]. Lines outside the first contiguous
/// block of `|`-prefixed lines are ignored.
pub fn parse_markdown(text: &str) -> Result<Frame> {
    let block: Vec<&str> = text
        .lines()
        .map(str::trim)
        .skip_while(|l| !l.starts_with('|'))
        .take_while(|l| l.starts_with('|'))
        .collect();
    if block.is_empty() {
        return Err(Error::NoTable);
    }

    let header = split_row(block[0]);
    let mut frame = Frame::new(header);
    for line in &block[1..] {
        if is_separator(line) {
            continue;
        }
        let mut cells = split_row(line);
        // Tolerate ragged rows the way a lenient table reader does: pad or
        // truncate to the header width rather than refusing the whole block.
        cells.resize(frame.width(), String::new());
        let row = cells.into_iter().map(Value::Text).collect();
        frame.push_row(row)?;
    }
    Ok(frame)
}

/// Parse `text`, keep the named fields (in their order within the request),
/// cap to `head` rows when given, and re-render.
///
/// Unknown fields are dropped; if nothing matches, the full table is kept.
pub fn subset_markdown(text: &str, fields: &[String], head: Option<usize>) -> Result<String> {
    let frame = parse_markdown(text)?;
    let mut subset = frame.select(fields);
    if let Some(n) = head {
        subset = subset.head(n);
    }
    Ok(to_markdown(&subset))
}

fn split_row(line: &str) -> Vec<String> {
    line.trim()
        .trim_start_matches('|')
        .trim_end_matches('|')
        .split('|')
        .map(|c| c.trim().to_string())
        .collect()
}

fn is_separator(line: &str) -> bool {
    let inner = line.trim().trim_start_matches('|').trim_end_matches('|');
    !inner.is_empty()
        && inner
            .chars()
            .all(|c| matches!(c, '-' | ':' | '|' | ' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        let mut f = Frame::new(vec!["name".to_string(), "score".to_string()]);
        f.push_row(vec![Value::Text("alpha".to_string()), Value::Float(12.5)])
            .unwrap();
        f.push_row(vec![Value::Text("beta".to_string()), Value::Null])
            .unwrap();
        f
    }

    #[test]
    fn test_render_shape() {
        let md = to_markdown(&sample());
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines[0], "| name | score |");
        assert_eq!(lines[1], "|---|---|");
        assert_eq!(lines[2], "| alpha | 12.5 |");
        assert_eq!(lines[3], "| beta |  |");
    }

    #[test]
    fn test_empty_frame_renders_sentinel() {
        let f = Frame::new(vec!["a".to_string()]);
        assert_eq!(to_markdown(&f), EMPTY_SENTINEL);
    }

    #[test]
    fn test_round_trip_recovers_header_and_cells() {
        let md = to_markdown(&sample());
        let back = parse_markdown(&md).unwrap();
        assert_eq!(back.header(), sample().header());
        assert_eq!(back.rows()[0][0], Value::Text("alpha".to_string()));
        assert_eq!(back.rows()[0][1], Value::Text("12.5".to_string()));
        assert_eq!(back.rows()[1][1], Value::Text(String::new()));
    }

    #[test]
    fn test_parse_skips_prose_before_table() {
        let text = "Here is the result:\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\ntrailing";
        let frame = parse_markdown(text).unwrap();
        assert_eq!(frame.header(), &["a".to_string(), "b".to_string()]);
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn test_parse_no_table_errors() {
        assert!(parse_markdown("nothing tabular here").is_err());
    }

    #[test]
    fn test_subset_markdown_keeps_requested_fields() {
        let md = to_markdown(&sample());
        let out = subset_markdown(&md, &["score".to_string()], Some(1)).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "| score |");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_subset_markdown_unknown_fields_keep_all() {
        let md = to_markdown(&sample());
        let out = subset_markdown(&md, &["nope".to_string()], None).unwrap();
        assert!(out.starts_with("| name | score |"));
    }
}
