use std::path::{Path, PathBuf};

/// A per-thread projection of one cache entry's artifacts.
///
/// Session artifacts are byte copies made at projection time; the directory
/// is exclusively owned by its conversation thread and swept on reset or
/// process start.
#[derive(Debug, Clone)]
pub struct Session {
    thread_id: String,
    dir: PathBuf,
    schema_path: PathBuf,
    preview_path: PathBuf,
}

impl Session {
    pub(crate) fn new(
        thread_id: &str,
        dir: PathBuf,
        schema_path: PathBuf,
        preview_path: PathBuf,
    ) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            dir,
            schema_path,
            preview_path,
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn schema_path(&self) -> &Path {
        &self.schema_path
    }

    pub fn preview_path(&self) -> &Path {
        &self.preview_path
    }
}
