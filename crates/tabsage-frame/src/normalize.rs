use crate::frame::{Frame, Value};
use tabsage_types::ROW_IDENTITY_FIELD;

/// Row-expansion only fires for a handful of rows; anything larger reads as
/// a bulk export and falls back to the partial result.
pub const DEFAULT_EXPANSION_CEILING: usize = 10;

/// Produce the computation-time copy of `source` with a leading
/// `__row_idx` field counting `0..N-1` in source row order.
pub fn inject_row_identity(source: &Frame) -> Frame {
    let mut header = Vec::with_capacity(source.width() + 1);
    header.push(ROW_IDENTITY_FIELD.to_string());
    header.extend(source.header().iter().cloned());

    let mut out = Frame::new(header);
    for (i, row) in source.rows().iter().enumerate() {
        let mut cells = Vec::with_capacity(row.len() + 1);
        cells.push(Value::Int(i as i64));
        cells.extend(row.iter().cloned());
        // Width is header+1 by construction.
        out.push_row(cells).expect("row width tracks header");
    }
    out
}

/// Coerce the named fields to floats in place.
///
/// Thousands separators are stripped before parsing; a cell that still does
/// not parse becomes null so downstream comparison and aggregation never
/// fail outright on one malformed value.
pub fn coerce_numeric(frame: &mut Frame, numeric_fields: &[String]) {
    let indices: Vec<usize> = numeric_fields
        .iter()
        .filter_map(|f| frame.column_index(f))
        .collect();
    if indices.is_empty() {
        return;
    }
    for row in frame.rows_mut() {
        for &i in &indices {
            row[i] = match row[i].as_f64() {
                Some(x) => Value::Float(x),
                None => Value::Null,
            };
        }
    }
}

/// Map a possibly-partial result back onto full source rows through the
/// hidden row-identity column.
///
/// Returns the corresponding full rows when the partial result carries
/// `__row_idx`, the parsed positions are a non-empty, in-range set, and the
/// deduplicated cardinality is at most `ceiling`. Otherwise returns `None`
/// and the caller renders the partial result as-is.
pub fn expand_to_full_rows(source: &Frame, partial: &Frame, ceiling: usize) -> Option<Frame> {
    let idx_col = partial.column(ROW_IDENTITY_FIELD)?;

    // Unparsable cells are dropped rather than failing the expansion, then
    // the list is deduplicated preserving first-seen order.
    let mut seen = Vec::new();
    for cell in idx_col {
        let Some(x) = cell.as_f64() else { continue };
        if !x.is_finite() || x < 0.0 {
            continue;
        }
        let pos = x as usize;
        if !seen.contains(&pos) {
            seen.push(pos);
        }
    }

    if seen.is_empty() || seen.len() > ceiling {
        return None;
    }
    if seen.iter().any(|&pos| pos >= source.len()) {
        return None;
    }

    let mut out = Frame::new(source.header().to_vec());
    for &pos in &seen {
        out.push_row(source.rows()[pos].clone())
            .expect("source rows match source header");
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Frame {
        let mut f = Frame::new(vec!["name".to_string(), "qty".to_string()]);
        for (name, qty) in [("a", "1,000"), ("b", "250"), ("c", "n/a"), ("d", "75")] {
            f.push_row(vec![
                Value::Text(name.to_string()),
                Value::Text(qty.to_string()),
            ])
            .unwrap();
        }
        f
    }

    #[test]
    fn test_inject_row_identity_counts_from_zero() {
        let calc = inject_row_identity(&source());
        assert_eq!(calc.header()[0], ROW_IDENTITY_FIELD);
        assert_eq!(calc.rows()[0][0], Value::Int(0));
        assert_eq!(calc.rows()[3][0], Value::Int(3));
        assert_eq!(calc.width(), source().width() + 1);
    }

    #[test]
    fn test_coerce_numeric_handles_separators_and_garbage() {
        let mut f = source();
        coerce_numeric(&mut f, &["qty".to_string()]);
        assert_eq!(f.rows()[0][1], Value::Float(1000.0));
        assert_eq!(f.rows()[2][1], Value::Null);
        // untouched column keeps its text
        assert_eq!(f.rows()[0][0], Value::Text("a".to_string()));
    }

    #[test]
    fn test_expand_returns_rows_in_first_seen_order() {
        let src = source();
        let mut partial = Frame::new(vec![ROW_IDENTITY_FIELD.to_string(), "qty".to_string()]);
        for idx in ["3", "1", "3"] {
            partial
                .push_row(vec![Value::Text(idx.to_string()), Value::Null])
                .unwrap();
        }
        let full = expand_to_full_rows(&src, &partial, DEFAULT_EXPANSION_CEILING).unwrap();
        assert_eq!(full.header(), src.header());
        assert_eq!(full.len(), 2);
        assert_eq!(full.rows()[0][0], Value::Text("d".to_string()));
        assert_eq!(full.rows()[1][0], Value::Text("b".to_string()));
    }

    #[test]
    fn test_expand_respects_ceiling() {
        let src = source();
        let mut partial = Frame::new(vec![ROW_IDENTITY_FIELD.to_string()]);
        for i in 0..4 {
            partial.push_row(vec![Value::Int(i)]).unwrap();
        }
        assert!(expand_to_full_rows(&src, &partial, 3).is_none());
        assert!(expand_to_full_rows(&src, &partial, 4).is_some());
    }

    #[test]
    fn test_expand_without_identity_column_is_none() {
        let src = source();
        let mut partial = Frame::new(vec!["qty".to_string()]);
        partial.push_row(vec![Value::Int(1)]).unwrap();
        assert!(expand_to_full_rows(&src, &partial, 10).is_none());
    }

    #[test]
    fn test_expand_out_of_range_is_none() {
        let src = source();
        let mut partial = Frame::new(vec![ROW_IDENTITY_FIELD.to_string()]);
        partial.push_row(vec![Value::Int(99)]).unwrap();
        assert!(expand_to_full_rows(&src, &partial, 10).is_none());
    }

    #[test]
    fn test_expand_unparsable_cells_are_dropped() {
        let src = source();
        let mut partial = Frame::new(vec![ROW_IDENTITY_FIELD.to_string()]);
        partial
            .push_row(vec![Value::Text("oops".to_string())])
            .unwrap();
        partial.push_row(vec![Value::Int(2)]).unwrap();
        let full = expand_to_full_rows(&src, &partial, 10).unwrap();
        assert_eq!(full.len(), 1);
        assert_eq!(full.rows()[0][0], Value::Text("c".to_string()));
    }
}
