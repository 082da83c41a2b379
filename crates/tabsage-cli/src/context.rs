use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use std::path::Path;
use tabsage_engine::{derive_schema, ingest_frame, introspect_table, list_tables, read_csv,
    render_preview, table_preview};
use tabsage_frame::to_markdown;
use tabsage_store::{CacheArtifacts, CacheEntry, Store};
use tabsage_types::SourceIdentity;

/// A data source bound for questioning: an open connection with the target
/// table loaded, plus the cache entry carrying its derived artifacts.
pub struct BoundSource {
    pub identity: SourceIdentity,
    pub entry: CacheEntry,
    pub conn: Connection,
    pub table: String,
}

/// Resolve a source path into a queryable table and its cache entry.
///
/// CSV files are ingested into an in-memory database under their file stem;
/// SQLite files are opened in place. Schema derivation runs at most once
/// per identity thanks to the cache.
pub fn bind_source(
    store: &Store,
    path: &Path,
    table: Option<&str>,
    preview_rows: usize,
) -> Result<BoundSource> {
    if !path.exists() {
        bail!("source not found: {}", path.display());
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => bind_csv(store, path, preview_rows),
        "db" | "sqlite" | "sqlite3" => bind_sqlite(store, path, table, preview_rows),
        other => bail!("unsupported source format: .{}", other),
    }
}

fn bind_csv(store: &Store, path: &Path, preview_rows: usize) -> Result<BoundSource> {
    let frame = read_csv(path).with_context(|| format!("Failed to load {}", path.display()))?;
    let identity = SourceIdentity::new(path, None);
    let table = identity.stem();

    let entry = store.get_or_create_cache(&identity, || {
        Ok(CacheArtifacts {
            schema: derive_schema(&frame),
            preview_markdown: render_preview(&frame, preview_rows),
        })
    })?;

    let mut conn = Connection::open_in_memory()?;
    ingest_frame(&mut conn, &table, &frame)?;

    Ok(BoundSource {
        identity,
        entry,
        conn,
        table,
    })
}

fn bind_sqlite(
    store: &Store,
    path: &Path,
    table: Option<&str>,
    preview_rows: usize,
) -> Result<BoundSource> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database: {}", path.display()))?;

    let table = match table {
        Some(t) => t.to_string(),
        None => list_tables(&conn)?
            .into_iter()
            .next()
            .with_context(|| format!("no tables in {}", path.display()))?,
    };

    let identity = SourceIdentity::new(path, Some(&table));
    let entry = store.get_or_create_cache(&identity, || {
        let schema = introspect_table(&conn, &table, 5)?;
        let preview = table_preview(&conn, &table, preview_rows)?;
        Ok(CacheArtifacts {
            schema,
            preview_markdown: to_markdown(&preview),
        })
    })?;

    Ok(BoundSource {
        identity,
        entry,
        conn,
        table,
    })
}
