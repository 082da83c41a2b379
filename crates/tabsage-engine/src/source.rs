use crate::{Error, Result};
use std::path::Path;
use tabsage_frame::{Frame, Value};

/// Load a CSV file into a frame, all cells as text.
///
/// Type inference is deliberately left to schema derivation and numeric
/// coercion downstream; loading never guesses.
pub fn read_csv(path: &Path) -> Result<Frame> {
    let mut reader = csv::Reader::from_path(path)?;
    let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    if header.is_empty() {
        return Err(Error::Source(format!(
            "no header row in {}",
            path.display()
        )));
    }

    let mut frame = Frame::new(header);
    for record in reader.records() {
        let record = record?;
        let row = record.iter().map(|c| Value::Text(c.to_string())).collect();
        frame.push_row(row)?;
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,qty\nalpha,10\nbeta,").unwrap();
        let frame = read_csv(file.path()).unwrap();
        assert_eq!(frame.header(), &["name".to_string(), "qty".to_string()]);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.rows()[1][1], Value::Text(String::new()));
    }

    #[test]
    fn test_read_csv_missing_file() {
        assert!(read_csv(Path::new("/nonexistent/x.csv")).is_err());
    }
}
