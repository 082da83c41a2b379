use crate::session::Session;
use crate::{Error, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tabsage_types::{SourceIdentity, TableSchema};

/// What a cache producer must hand back: the derived schema description and
/// the rendered preview table for one source identity.
pub struct CacheArtifacts {
    pub schema: TableSchema,
    pub preview_markdown: String,
}

/// Return type of a producer callback. Producers run caller-side derivation
/// (statistics, engine introspection, generator calls), so their failures
/// arrive as whatever error the caller's stack produces.
pub type ProducerResult =
    std::result::Result<CacheArtifacts, Box<dyn std::error::Error + Send + Sync>>;

/// A cache directory for one source identity, holding `schema.json` and a
/// preview table. Written at most once; read by any number of sessions.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    dir: PathBuf,
    schema_path: PathBuf,
    preview_path: PathBuf,
}

impl CacheEntry {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn schema_path(&self) -> &Path {
        &self.schema_path
    }

    pub fn preview_path(&self) -> &Path {
        &self.preview_path
    }

    pub fn is_complete(&self) -> bool {
        self.schema_path.exists() && self.preview_path.exists()
    }

    pub fn load_schema(&self) -> Result<TableSchema> {
        let content = fs::read_to_string(&self.schema_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn preview_markdown(&self) -> Result<String> {
        Ok(fs::read_to_string(&self.preview_path)?)
    }
}

/// Filesystem store rooted at a workspace directory:
/// `cache/{date}__{digest}/` for derived artifacts and
/// `sessions/{thread_id}/` for per-conversation projections.
pub struct Store {
    cache_root: PathBuf,
    sessions_root: PathBuf,
}

impl Store {
    /// Open (and create if needed) the cache and session roots under
    /// `workspace_root`.
    pub fn open(workspace_root: &Path) -> Result<Self> {
        let cache_root = workspace_root.join("cache");
        let sessions_root = workspace_root.join("sessions");
        fs::create_dir_all(&cache_root)?;
        fs::create_dir_all(&sessions_root)?;
        Ok(Self {
            cache_root,
            sessions_root,
        })
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn sessions_root(&self) -> &Path {
        &self.sessions_root
    }

    /// Cache entry paths for an identity, using today's date bucket.
    pub fn cache_entry(&self, identity: &SourceIdentity) -> CacheEntry {
        let date = Local::now().format("%Y%m%d");
        let dir = self
            .cache_root
            .join(format!("{}__{}", date, identity.digest()));
        let preview_name = format!(
            "{}__{}.md",
            identity.stem(),
            safe_selector(identity.selector())
        );
        CacheEntry {
            schema_path: dir.join("schema.json"),
            preview_path: dir.join(preview_name),
            dir,
        }
    }

    /// Return the cache entry for `identity`, invoking `producer` only when
    /// artifact files are absent.
    ///
    /// Artifacts are written to their final paths; existence of a file is
    /// the publication signal, so a completed file is never rewritten.
    pub fn get_or_create_cache<F>(&self, identity: &SourceIdentity, producer: F) -> Result<CacheEntry>
    where
        F: FnOnce() -> ProducerResult,
    {
        let entry = self.cache_entry(identity);
        fs::create_dir_all(entry.dir())?;

        if entry.is_complete() {
            return Ok(entry);
        }

        let artifacts = producer().map_err(Error::Producer)?;
        if !entry.schema_path.exists() {
            let json = serde_json::to_string_pretty(&artifacts.schema)?;
            fs::write(&entry.schema_path, json)?;
        }
        if !entry.preview_path.exists() {
            fs::write(&entry.preview_path, &artifacts.preview_markdown)?;
        }
        Ok(entry)
    }

    /// Project a cache entry's artifacts into the thread's session
    /// directory as byte copies.
    ///
    /// A missing source artifact or a copy that leaves an empty file behind
    /// is fatal for the session: callers must not proceed to generation
    /// with an unproved schema.
    pub fn project_into_session(&self, thread_id: &str, entry: &CacheEntry) -> Result<Session> {
        let session_dir = self.sessions_root.join(thread_id);
        fs::create_dir_all(&session_dir)?;

        let schema_dst = session_dir.join("schema.json");
        let preview_dst = session_dir.join(
            entry
                .preview_path
                .file_name()
                .ok_or_else(|| Error::MissingArtifact(entry.preview_path.clone()))?,
        );

        copy_artifact(&entry.schema_path, &schema_dst)?;
        copy_artifact(&entry.preview_path, &preview_dst)?;

        Ok(Session::new(thread_id, session_dir, schema_dst, preview_dst))
    }

    /// Remove a thread's session directory. Tolerant of a directory that
    /// does not exist; failures are logged, never surfaced.
    pub fn reset_session(&self, thread_id: &str) {
        let session_dir = self.sessions_root.join(thread_id);
        if session_dir.exists()
            && let Err(err) = fs::remove_dir_all(&session_dir)
        {
            tracing::warn!(thread_id, error = %err, "failed to remove session directory");
        }
    }

    /// Remove and recreate the sessions root.
    ///
    /// Invoked once at process start so no stale session state survives a
    /// restart.
    pub fn reset_all_sessions(&self) {
        if self.sessions_root.exists()
            && let Err(err) = fs::remove_dir_all(&self.sessions_root)
        {
            tracing::warn!(error = %err, "failed to sweep sessions root");
        }
        if let Err(err) = fs::create_dir_all(&self.sessions_root) {
            tracing::warn!(error = %err, "failed to recreate sessions root");
        }
    }
}

fn copy_artifact(src: &Path, dst: &Path) -> Result<()> {
    if !src.exists() {
        return Err(Error::MissingArtifact(src.to_path_buf()));
    }
    if dst.exists() {
        let _ = fs::remove_file(dst);
    }
    fs::copy(src, dst)?;

    // A silently failed copy must raise, not leave a half-initialized
    // session behind.
    let ok = fs::metadata(dst).map(|m| m.len() > 0).unwrap_or(false);
    if !ok {
        return Err(Error::CopyFailed(dst.to_path_buf()));
    }
    Ok(())
}

/// Sanitize a selector for use in artifact file names.
///
/// No selector means a single-table source (CSV), mirroring the artifact
/// naming of the original layout.
fn safe_selector(selector: Option<&str>) -> String {
    match selector {
        None => "CSV".to_string(),
        Some(s) => {
            let cleaned: String = s
                .chars()
                .map(|c| if matches!(c, '/' | '\\' | ' ') { '_' } else { c })
                .collect();
            if cleaned.is_empty() {
                "SHEET".to_string()
            } else {
                cleaned
            }
        }
    }
}
