use crate::guard::{GuardPolicy, cap_limit, is_select_only, strip_noise};
use crate::{Error, Result};
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use tabsage_frame::{Frame, Value};
use tabsage_types::{FieldSchema, FieldType, TableSchema};

/// Explicit result states of a guarded execution: rows, a statement the
/// guard refused to run, or an engine error. Guard refusal is a value, not
/// a panic, so the retry driver can count it against the error budget
/// while reporting it distinctly.
#[derive(Debug, Clone)]
pub enum SqlOutcome {
    Rows(Frame),
    GuardViolation(String),
    ExecError(String),
}

#[derive(Debug, Clone)]
pub struct SqlExecution {
    /// What actually ran (after noise-stripping and LIMIT capping), or the
    /// original statement when the guard refused it.
    pub executed_sql: String,
    pub outcome: SqlOutcome,
}

/// Validate and execute a generated statement under the read-only contract.
pub fn execute_guarded(conn: &Connection, sql: &str, policy: &GuardPolicy) -> SqlExecution {
    if !is_select_only(sql, policy) {
        return SqlExecution {
            executed_sql: strip_noise(sql),
            outcome: SqlOutcome::GuardViolation(
                "only single-statement SELECT queries are allowed".to_string(),
            ),
        };
    }

    let capped = cap_limit(sql, policy.max_rows);
    let outcome = match query_frame(conn, &capped) {
        Ok(frame) => SqlOutcome::Rows(frame),
        Err(err) => SqlOutcome::ExecError(err.to_string()),
    };
    SqlExecution {
        executed_sql: capped,
        outcome,
    }
}

fn query_frame(conn: &Connection, sql: &str) -> rusqlite::Result<Frame> {
    let mut stmt = conn.prepare(sql)?;
    let header: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let width = header.len();

    let mut frame = Frame::new(header);
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            cells.push(cell_value(row.get_ref(i)?));
        }
        frame
            .push_row(cells)
            .expect("cell count matches column count");
    }
    Ok(frame)
}

fn cell_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Int(n),
        ValueRef::Real(x) => Value::Float(x),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Text(format!("<{} bytes>", b.len())),
    }
}

/// Tables and views visible on the connection.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') \
         AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

/// Derive a [`TableSchema`] from the engine's own metadata: declared column
/// types plus a handful of DISTINCT sample values per column.
pub fn introspect_table(
    conn: &Connection,
    table: &str,
    sample_per_col: usize,
) -> Result<TableSchema> {
    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if columns.is_empty() {
        return Err(Error::Source(format!("table not found: {}", table)));
    }

    let mut fields = Vec::with_capacity(columns.len());
    for (name, sql_type) in columns {
        let samples = sample_values(conn, table, &name, sample_per_col).unwrap_or_default();
        let dtype = if is_numeric_type(&sql_type) {
            FieldType::Float
        } else {
            FieldType::Text
        };
        let definition = match dtype {
            FieldType::Float => vec![
                format!(
                    "[info] Numeric field '{}': used for comparison, sorting, and aggregation.",
                    name
                ),
                format!("[format] float (declared {}).", sql_type),
            ],
            FieldType::Text => vec![
                format!(
                    "[info] Text field '{}': used for filtering, equality tests, and grouping.",
                    name
                ),
                format!("[format] string (declared {}).", sql_type),
            ],
        };
        fields.push(FieldSchema {
            name,
            dtype,
            definition,
            summary: None,
            samples,
            sql_type: Some(sql_type),
        });
    }
    Ok(TableSchema { fields })
}

fn sample_values(
    conn: &Connection,
    table: &str,
    column: &str,
    limit: usize,
) -> rusqlite::Result<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT {col} FROM {table} WHERE {col} IS NOT NULL LIMIT {limit}",
        col = quote_ident(column),
        table = quote_ident(table),
        limit = limit,
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut samples = Vec::new();
    while let Some(row) = rows.next()? {
        match cell_value(row.get_ref(0)?) {
            Value::Null => {}
            v => samples.push(v.render()),
        }
    }
    Ok(samples)
}

/// First `head` rows of a table, for preview rendering.
pub fn table_preview(conn: &Connection, table: &str, head: usize) -> Result<Frame> {
    let sql = format!("SELECT * FROM {} LIMIT {}", quote_ident(table), head);
    Ok(query_frame(conn, &sql)?)
}

/// Load a frame into a fresh table so a spreadsheet can be queried through
/// the SQL path. All columns are TEXT; numeric work is left to CAST in
/// generated queries.
pub fn ingest_frame(conn: &mut Connection, table: &str, frame: &Frame) -> Result<()> {
    if frame.width() == 0 {
        return Err(Error::Source("cannot ingest a frame with no columns".to_string()));
    }

    let columns = frame
        .header()
        .iter()
        .map(|h| format!("{} TEXT", quote_ident(h)))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute(
        &format!("CREATE TABLE {} ({})", quote_ident(table), columns),
        [],
    )?;

    let placeholders = (1..=frame.width())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let insert_sql = format!(
        "INSERT INTO {} VALUES ({})",
        quote_ident(table),
        placeholders
    );

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&insert_sql)?;
        for row in frame.rows() {
            let params = rusqlite::params_from_iter(row.iter().map(sql_param));
            stmt.execute(params)?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn sql_param(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Int(n) => rusqlite::types::Value::Integer(*n),
        Value::Float(x) => rusqlite::types::Value::Real(*x),
        Value::Text(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Json(v) => rusqlite::types::Value::Text(v.to_string()),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn is_numeric_type(sql_type: &str) -> bool {
    let t = sql_type.to_uppercase();
    ["INT", "REAL", "FLOA", "DOUB", "NUM", "DEC"]
        .iter()
        .any(|k| t.contains(k))
}
