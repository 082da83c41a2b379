use crate::{Error, Result};

/// One cell of a [`Frame`].
///
/// Null covers SQL NULL, coerced-away garbage, and NaN; nested structures
/// ride along as JSON and are rendered inline by the markdown codec.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
}

impl Value {
    /// Canonical cell text used by the markdown renderer.
    ///
    /// Null and NaN render as the empty string so that missing data never
    /// leaks engine-specific spellings into the user-facing table.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(n) => n.to_string(),
            Value::Float(x) if x.is_nan() => String::new(),
            Value::Float(x) => format_float(*x),
            Value::Text(s) => s.clone(),
            Value::Json(v) => v.to_string(),
        }
    }

    /// Best-effort numeric reading of the cell, tolerant of thousands
    /// separators in text cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) if !x.is_nan() => Some(*x),
            Value::Text(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            _ => None,
        }
    }
}

fn format_float(x: f64) -> String {
    if x == x.trunc() && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{}", x)
    }
}

/// A small owned table: header plus row-major cells.
///
/// This is the shape results travel in between the executor, the
/// normalizer, and the markdown renderer. It is not a query engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    header: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<Value>] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.header.len() {
            return Err(Error::RowWidth {
                expected: self.header.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Values of the named column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Project onto the named fields, keeping only those that exist, in the
    /// order given. An empty intersection yields a copy of the full frame,
    /// matching the tolerant subset behavior expected by callers that pass
    /// generator-selected field lists.
    pub fn select(&self, fields: &[String]) -> Frame {
        let indices: Vec<usize> = fields
            .iter()
            .filter_map(|f| self.column_index(f))
            .collect();
        if indices.is_empty() {
            return self.clone();
        }
        let header = indices.iter().map(|&i| self.header[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Frame { header, rows }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Frame {
        Frame {
            header: self.header.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}
