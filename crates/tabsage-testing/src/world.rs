use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated filesystem environment for integration tests: a workspace root
/// plus a data directory for sample sources.
pub struct TestWorld {
    _temp_dir: TempDir,
    workspace: PathBuf,
    data_dir: PathBuf,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let workspace = temp_dir.path().join("workspace");
        let data_dir = temp_dir.path().join("data");
        fs::create_dir_all(&workspace).expect("Failed to create workspace dir");
        fs::create_dir_all(&data_dir).expect("Failed to create data dir");
        Self {
            _temp_dir: temp_dir,
            workspace,
            data_dir,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Write a CSV sample and return its path.
    pub fn write_csv(&self, name: &str, content: &str) -> PathBuf {
        let path = self.data_dir.join(name);
        fs::write(&path, content).expect("Failed to write sample csv");
        path
    }

    /// Create a SQLite database file from a DDL/DML batch and return its
    /// path.
    pub fn write_sqlite(&self, name: &str, batch: &str) -> PathBuf {
        let path = self.data_dir.join(name);
        let conn = rusqlite::Connection::open(&path).expect("Failed to create sqlite db");
        conn.execute_batch(batch).expect("Failed to run DDL batch");
        path
    }

    /// A small manufacturing-flavored table, mirroring the sample data the
    /// drivers are typically pointed at.
    pub fn sample_plants_db(&self) -> PathBuf {
        self.write_sqlite(
            "plants.db",
            r#"
            CREATE TABLE plants (
                factory TEXT NOT NULL,
                line TEXT NOT NULL,
                output_qty REAL,
                grade TEXT
            );
            INSERT INTO plants VALUES
                ('AC25', 'AAA157', 1200.0, 'U 1st'),
                ('AB25', 'AAA130', 900.5, 'S 2nd'),
                ('AC25', 'AAA201', 450.0, 'S 3rd'),
                ('AA24', 'AAA007', NULL, 'U 2nd');
            "#,
        )
    }
}
