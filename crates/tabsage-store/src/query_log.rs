use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tabsage_types::QueryLogRecord;

/// Append one committed turn to `query_log.jsonl` in the cache directory.
///
/// The log is best-effort: a failure to serialize or write is reported as a
/// warning and never aborts the turn that produced the record.
pub fn append_query_log(cache_dir: &Path, record: &QueryLogRecord) {
    let path = cache_dir.join("query_log.jsonl");
    let result = serde_json::to_string(record).map_err(std::io::Error::other).and_then(|line| {
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", line)
    });
    if let Err(err) = result {
        tracing::warn!(path = %path.display(), error = %err, "failed to save query log");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_appends_one_line_per_record() {
        let tmp = tempfile::tempdir().unwrap();
        let record = QueryLogRecord {
            timestamp: Utc::now(),
            question: "q".to_string(),
            rewritten: "q'".to_string(),
            generated: "SELECT 1".to_string(),
            answer: "| a |".to_string(),
        };
        append_query_log(tmp.path(), &record);
        append_query_log(tmp.path(), &record);

        let content = std::fs::read_to_string(tmp.path().join("query_log.jsonl")).unwrap();
        assert_eq!(content.lines().count(), 2);
        let parsed: QueryLogRecord = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.question, "q");
    }

    #[test]
    fn test_missing_directory_does_not_panic() {
        let record = QueryLogRecord {
            timestamp: Utc::now(),
            question: "q".to_string(),
            rewritten: "q".to_string(),
            generated: String::new(),
            answer: String::new(),
        };
        append_query_log(Path::new("/nonexistent/tabsage-test"), &record);
    }
}
